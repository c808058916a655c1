//! Arena entities: kinematic body plus the kind-specific state

pub mod agent;
pub mod archetype;
pub mod body;
pub mod memory;
pub mod status;

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{EntityId, Millis, Vec2};
use agent::{Agent, AlertLevel, BehaviorState};
use archetype::{Ability, BotRole, FoodType, PlayerClass};
use body::Body;

/// One registered entity
#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub body: Body,
    pub kind: EntityKind,
}

#[derive(Debug, Clone)]
pub enum EntityKind {
    Player(PlayerState),
    /// Boxed: agent state dwarfs the other variants
    Bot(Box<Agent>),
    Food(FoodState),
}

/// Discriminant of `EntityKind`, cheap to copy into snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityClass {
    Player,
    Bot,
    Food,
}

impl EntityKind {
    pub fn class(&self) -> EntityClass {
        match self {
            Self::Player(_) => EntityClass::Player,
            Self::Bot(_) => EntityClass::Bot,
            Self::Food(_) => EntityClass::Food,
        }
    }
}

impl Entity {
    pub fn is_active(&self) -> bool {
        self.body.active
    }

    pub fn agent(&self) -> Option<&Agent> {
        match &self.kind {
            EntityKind::Bot(agent) => Some(agent),
            _ => None,
        }
    }

    pub fn agent_mut(&mut self) -> Option<&mut Agent> {
        match &mut self.kind {
            EntityKind::Bot(agent) => Some(agent),
            _ => None,
        }
    }

    pub fn player(&self) -> Option<&PlayerState> {
        match &self.kind {
            EntityKind::Player(player) => Some(player),
            _ => None,
        }
    }

    pub fn player_mut(&mut self) -> Option<&mut PlayerState> {
        match &mut self.kind {
            EntityKind::Player(player) => Some(player),
            _ => None,
        }
    }

    /// Read-only copy handed to agents and external collaborators
    pub fn snapshot(&self) -> EntitySnapshot {
        let agent = self.agent();
        EntitySnapshot {
            id: self.id,
            position: self.body.position,
            velocity: self.body.velocity,
            size: self.body.diameter(),
            active: self.body.active,
            visible: self.body.visible,
            kind: self.kind.class(),
            behavior: agent.map(|a| a.behavior),
            alert: agent.map(|a| a.alert),
            role: agent.map(|a| a.role),
            ability_active: self
                .player()
                .is_some_and(|p| p.active_ability.is_some()),
        }
    }
}

/// Frozen view of one entity at the start of a tick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    pub id: EntityId,
    pub position: Vec2,
    pub velocity: Vec2,
    /// Diameter (`max(width, height)`)
    pub size: f32,
    pub active: bool,
    pub visible: bool,
    pub kind: EntityClass,
    pub behavior: Option<BehaviorState>,
    pub alert: Option<AlertLevel>,
    pub role: Option<BotRole>,
    pub ability_active: bool,
}

impl EntitySnapshot {
    pub fn is_player(&self) -> bool {
        self.kind == EntityClass::Player
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveAbility {
    pub ability: Ability,
    pub remaining_ms: Millis,
}

/// Player-controlled cell
#[derive(Debug, Clone, Default)]
pub struct PlayerState {
    pub class: PlayerClass,
    /// Steering goal pushed by the input collaborator
    pub steer_target: Option<Vec2>,
    pub active_ability: Option<ActiveAbility>,
    /// World time at which each ability becomes usable again
    pub ready_at: AHashMap<Ability, Millis>,
    pub score: u64,
    pub food_eaten: u32,
    pub cells_eaten: u32,
}

impl PlayerState {
    pub fn new(class: PlayerClass) -> Self {
        Self {
            class,
            ..Self::default()
        }
    }

    pub fn has_active(&self, ability: Ability) -> bool {
        self.active_ability.is_some_and(|a| a.ability == ability)
    }

    pub fn cooldown_remaining(&self, ability: Ability, now: Millis) -> Millis {
        self.ready_at
            .get(&ability)
            .map_or(0.0, |ready| (ready - now).max(0.0))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FoodState {
    pub food_type: FoodType,
}

impl FoodState {
    pub fn nutrition(&self) -> i32 {
        self.food_type.nutrition()
    }
}
