//! Action selection - pick the next behavior from scored perception
//!
//! Priority order: flee, chase, guard, keep wandering, investigate, wander.
//! The first rule whose condition holds wins.

use crate::core::config::{BehaviorConfig, ScoringConfig};
use crate::core::types::{EntityId, Millis};
use crate::entity::agent::BehaviorState;
use crate::entity::archetype::BotRole;
use crate::simulation::scoring::Assessment;

/// Outcome of one decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Flee(EntityId),
    Chase(EntityId),
    Guard,
    /// Stay in the current wander
    KeepWandering,
    Investigate,
    Wander,
}

impl Decision {
    /// Behavior this decision moves the agent into
    pub fn behavior(self, current: BehaviorState) -> BehaviorState {
        match self {
            Self::Flee(_) => BehaviorState::Fleeing,
            Self::Chase(_) => BehaviorState::Chasing,
            Self::Guard => BehaviorState::Guarding,
            Self::KeepWandering => current,
            Self::Investigate => BehaviorState::Investigating,
            Self::Wander => BehaviorState::Wandering,
        }
    }
}

/// Everything the decision rules look at
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext<'a> {
    pub role: BotRole,
    pub size: f32,
    pub behavior: BehaviorState,
    pub behavior_timer_ms: Millis,
    pub stunned: bool,
    pub scared: bool,
    pub has_territory: bool,
    /// A player was seen within the investigation window
    pub player_recently_seen: bool,
    pub top_threat: Option<&'a Assessment>,
    pub top_opportunity: Option<&'a Assessment>,
}

pub fn select_action(
    ctx: &SelectionContext<'_>,
    scoring: &ScoringConfig,
    behavior: &BehaviorConfig,
) -> Decision {
    let profile = ctx.role.profile();

    if let Some(threat) = ctx.top_threat {
        let outsized = ctx.size < threat.size * scoring.flee_size_ratio;
        let overwhelming =
            threat.threat > scoring.flee_threshold_base * profile.intelligence_multiplier;
        if ctx.stunned || ctx.scared || outsized || overwhelming {
            return Decision::Flee(threat.id);
        }
    }

    if let Some(prey) = ctx.top_opportunity {
        if prey.opportunity > scoring.chase_threshold_base / profile.aggression_multiplier {
            return Decision::Chase(prey.id);
        }
    }

    if ctx.role.is_guard() && ctx.has_territory {
        return Decision::Guard;
    }

    let min_wander = behavior.min_wander_ms * profile.intelligence_multiplier as f64;
    if ctx.behavior == BehaviorState::Wandering && ctx.behavior_timer_ms < min_wander {
        return Decision::KeepWandering;
    }

    if ctx.role.favors_investigation() || ctx.player_recently_seen {
        Decision::Investigate
    } else {
        Decision::Wander
    }
}
