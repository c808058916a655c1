//! Autonomous bot state: role, behavior, alert, memory and timers

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, Millis, Vec2};
use crate::entity::archetype::{BotRole, RoleProfile};
use crate::entity::memory::EntityMemory;
use crate::entity::status::StatusEffects;

/// Current action mode of a bot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum BehaviorState {
    #[default]
    Wandering,
    Chasing,
    Fleeing,
    Hunting,
    Guarding,
    Investigating,
    Stunned,
}

impl BehaviorState {
    pub fn label(self) -> &'static str {
        match self {
            Self::Wandering => "wandering",
            Self::Chasing => "chasing",
            Self::Fleeing => "fleeing",
            Self::Hunting => "hunting",
            Self::Guarding => "guarding",
            Self::Investigating => "investigating",
            Self::Stunned => "stunned",
        }
    }

    /// States that pursue `primary_target`
    pub fn is_pursuit(self) -> bool {
        matches!(self, Self::Chasing | Self::Hunting)
    }
}

/// Coarse danger awareness; amplifies threat perception
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum AlertLevel {
    #[default]
    Calm,
    Alert,
    Aggressive,
    Panic,
}

impl AlertLevel {
    pub fn reaction_multiplier(self) -> f32 {
        match self {
            Self::Calm => 0.3,
            Self::Alert => 0.6,
            Self::Aggressive => 0.9,
            Self::Panic => 1.0,
        }
    }

    /// Alert level implied by the strongest threat score this tick
    pub fn from_max_threat(max_threat: f32) -> Self {
        if max_threat > 80.0 {
            Self::Panic
        } else if max_threat > 50.0 {
            Self::Aggressive
        } else if max_threat > 20.0 {
            Self::Alert
        } else {
            Self::Calm
        }
    }
}

/// A movement goal with its own lifetime (wander point, patrol point)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Waypoint {
    pub position: Vec2,
    /// Retarget once the behavior timer passes this
    pub expires_at_ms: Millis,
}

/// Running decision counters, exposed for statistics collaborators
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionStats {
    pub decisions_made: u64,
    pub behavior_changes: u64,
}

#[derive(Debug, Clone)]
pub struct Agent {
    pub role: BotRole,
    pub behavior: BehaviorState,
    pub alert: AlertLevel,
    pub decision_cooldown_ms: Millis,
    /// None until the first decision, so a fresh agent decides immediately
    pub last_decision_ms: Option<Millis>,
    /// Time spent in the current behavior
    pub behavior_timer_ms: Millis,
    pub primary_target: Option<EntityId>,
    pub current_threat: Option<EntityId>,
    pub memory: EntityMemory,
    pub status: StatusEffects,
    pub waypoint: Option<Waypoint>,
    /// Anchor recorded at spawn for guard-type roles
    pub territory: Option<Vec2>,
    pub last_guard_check_ms: Millis,
    pub stats: DecisionStats,
    rng: ChaCha8Rng,
}

impl Agent {
    /// Each agent draws from its own stream so agents can be updated in any order
    pub fn new(role: BotRole, spawn: Vec2, base_cooldown_ms: Millis, seed: u64) -> Self {
        let profile = role.profile();
        Self {
            role,
            behavior: BehaviorState::Wandering,
            alert: AlertLevel::Calm,
            decision_cooldown_ms: base_cooldown_ms / profile.intelligence_multiplier as f64,
            last_decision_ms: None,
            behavior_timer_ms: 0.0,
            primary_target: None,
            current_threat: None,
            memory: EntityMemory::new(),
            status: StatusEffects::default(),
            waypoint: None,
            territory: role.is_guard().then_some(spawn),
            last_guard_check_ms: 0.0,
            stats: DecisionStats::default(),
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn profile(&self) -> RoleProfile {
        self.role.profile()
    }

    pub fn has_territory(&self) -> bool {
        self.territory.is_some()
    }

    pub fn rng(&mut self) -> &mut ChaCha8Rng {
        &mut self.rng
    }

    pub fn decision_due(&self, now: Millis) -> bool {
        self.last_decision_ms
            .map_or(true, |last| now - last >= self.decision_cooldown_ms)
    }

    /// Make the next tick run a decision regardless of cooldown
    pub fn force_decision(&mut self) {
        self.last_decision_ms = None;
    }

    /// Switch behavior; returns the previous state when it actually changed
    pub fn set_behavior(&mut self, next: BehaviorState) -> Option<BehaviorState> {
        if self.behavior == next {
            return None;
        }
        let previous = self.behavior;
        self.behavior = next;
        self.behavior_timer_ms = 0.0;
        self.waypoint = None;
        self.stats.behavior_changes += 1;
        Some(previous)
    }
}
