//! Fixed archetypes: bot roles, player classes, food types and abilities
//!
//! All per-archetype numbers live in `match` tables so that lookups are total
//! and cannot miss a key.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Bot archetype defining sensing ranges and scoring multipliers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BotRole {
    /// Large and slow, very aggressive, slow to decide
    Tank,
    /// Small and fast, decides often
    Assassin,
    /// Holds ground and patrols
    Guardian,
    /// Sees furthest, favors investigating
    Scout,
    /// Average at everything
    Hybrid,
    /// Short-sighted drifter
    Wanderer,
}

/// Static numbers attached to a `BotRole`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RoleProfile {
    pub size_multiplier: f32,
    pub speed_multiplier: f32,
    pub aggression_multiplier: f32,
    pub intelligence_multiplier: f32,
    /// Radius within which entities are perceived
    pub detection_radius: f32,
    /// Radius used for proximity threat and flee disengagement
    pub threat_detection_radius: f32,
    /// Chasers escalate to hunting inside this range
    pub aggro_range: f32,
}

impl BotRole {
    pub const ALL: [BotRole; 6] = [
        BotRole::Tank,
        BotRole::Assassin,
        BotRole::Guardian,
        BotRole::Scout,
        BotRole::Hybrid,
        BotRole::Wanderer,
    ];

    pub fn profile(self) -> RoleProfile {
        let (size, speed, aggression, intelligence, detect, threat, aggro) = match self {
            Self::Tank => (1.4, 0.6, 1.8, 0.4, 200.0, 300.0, 150.0),
            Self::Assassin => (0.7, 1.6, 0.8, 1.2, 250.0, 400.0, 200.0),
            Self::Guardian => (1.1, 1.0, 1.3, 0.8, 350.0, 450.0, 250.0),
            Self::Scout => (1.5, 1.4, 0.6, 1.0, 400.0, 500.0, 300.0),
            Self::Hybrid => (1.0, 1.1, 1.0, 0.9, 300.0, 400.0, 225.0),
            Self::Wanderer => (1.0, 0.8, 0.8, 0.6, 150.0, 200.0, 100.0),
        };
        RoleProfile {
            size_multiplier: size,
            speed_multiplier: speed,
            aggression_multiplier: aggression,
            intelligence_multiplier: intelligence,
            detection_radius: detect,
            threat_detection_radius: threat,
            aggro_range: aggro,
        }
    }

    /// Guard-type roles patrol instead of idling when they hold territory
    pub fn is_guard(self) -> bool {
        matches!(self, Self::Guardian | Self::Tank)
    }

    /// Roles that investigate even without a recent player sighting
    pub fn favors_investigation(self) -> bool {
        matches!(self, Self::Scout)
    }
}

/// Combat class of a player cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PlayerClass {
    Tank,
    Assassin,
    Mage,
    #[default]
    Support,
}

impl PlayerClass {
    fn index(self) -> usize {
        match self {
            Self::Tank => 0,
            Self::Assassin => 1,
            Self::Mage => 2,
            Self::Support => 3,
        }
    }
}

/// Attacker-by-defender modifiers, rows and columns in `PlayerClass::index` order
const MATCHUP_TABLE: [[f32; 4]; 4] = [
    // Tank   Assassin Mage  Support
    [1.0, 1.5, 0.7, 1.0],  // Tank
    [0.8, 1.0, 1.4, 1.0],  // Assassin
    [1.1, 0.75, 1.0, 1.3], // Mage
    [1.2, 1.0, 0.85, 1.0], // Support
];

/// Growth modifier when `attacker` consumes `defender`
pub fn matchup_modifier(attacker: PlayerClass, defender: PlayerClass) -> f32 {
    MATCHUP_TABLE[attacker.index()][defender.index()]
}

/// Food variety; nutrition can be negative
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FoodType {
    #[default]
    Basic,
    Premium,
    Rare,
    Legendary,
    Poisonous,
    Mystical,
    Cosmic,
}

impl FoodType {
    pub fn nutrition(self) -> i32 {
        match self {
            Self::Basic => 10,
            Self::Premium => 25,
            Self::Rare => 50,
            Self::Legendary => 100,
            Self::Poisonous => -20,
            Self::Mystical => 75,
            Self::Cosmic => 150,
        }
    }

    /// Draw a food type: 50% basic, 25% premium, 15% rare, 7% mystical,
    /// 2.5% legendary, 0.4% cosmic, 0.1% poisonous
    pub fn roll(rng: &mut impl Rng) -> Self {
        let roll: f64 = rng.gen();
        if roll < 0.50 {
            Self::Basic
        } else if roll < 0.75 {
            Self::Premium
        } else if roll < 0.90 {
            Self::Rare
        } else if roll < 0.97 {
            Self::Mystical
        } else if roll < 0.995 {
            Self::Legendary
        } else if roll < 0.999 {
            Self::Cosmic
        } else {
            Self::Poisonous
        }
    }
}

/// Player special abilities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Ability {
    SpeedBoost,
    MassSplit,
    Teleport,
    Shield,
    Camouflage,
}

impl Ability {
    pub fn cooldown_ms(self) -> f64 {
        match self {
            Self::SpeedBoost => 15_000.0,
            Self::MassSplit => 20_000.0,
            Self::Teleport => 30_000.0,
            Self::Shield => 12_000.0,
            Self::Camouflage => 18_000.0,
        }
    }
}
