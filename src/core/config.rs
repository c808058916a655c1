//! Simulation configuration with documented constants
//!
//! All tuning numbers are collected here. Every section is optional in TOML;
//! missing fields fall back to the defaults below, which reproduce the
//! reference arena behavior.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::{ArenaError, Result};

/// Configuration for the whole arena simulation
///
/// Owned by the `World`; there is no process-wide config.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed for the world RNG (food spawning) and per-agent RNG streams
    pub seed: u64,
    pub arena: ArenaConfig,
    pub timing: TimingConfig,
    pub memory: MemoryConfig,
    pub scoring: ScoringConfig,
    pub behavior: BehaviorConfig,
    pub perception: PerceptionConfig,
    pub food: FoodConfig,
    pub player: PlayerConfig,

    /// Minimum bot count before the agent phase runs on the rayon pool
    ///
    /// Below this threshold, thread overhead exceeds benefits. Results are
    /// identical either way because every agent owns its RNG and memory.
    pub parallel_threshold: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            arena: ArenaConfig::default(),
            timing: TimingConfig::default(),
            memory: MemoryConfig::default(),
            scoring: ScoringConfig::default(),
            behavior: BehaviorConfig::default(),
            perception: PerceptionConfig::default(),
            food: FoodConfig::default(),
            player: PlayerConfig::default(),
            parallel_threshold: 1000,
        }
    }
}

/// Playfield dimensions (world units)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ArenaConfig {
    pub width: f32,
    pub height: f32,
    /// Bots are kept at least this far from the arena edge
    pub margin: f32,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            height: 1400.0,
            margin: 50.0,
        }
    }
}

/// Clock and decision pacing
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    /// Milliseconds covered by one kinematic step
    ///
    /// Velocities are expressed in world units per step, so a tick of
    /// `dt_ms` integrates `dt_ms / frame_ms` steps.
    pub frame_ms: f64,

    /// Decision cooldown before the role's intelligence divisor is applied
    pub base_decision_cooldown_ms: f64,

    /// Longer frames are clamped to this to avoid tunnelling after stalls
    pub max_dt_ms: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            frame_ms: 16.0,
            base_decision_cooldown_ms: 1000.0,
            max_dt_ms: 100.0,
        }
    }
}

/// Agent memory tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Entries not refreshed within this window are forgotten
    pub decay_window_ms: f64,
    /// Fraction of the current threat score added to a remembered threat
    pub threat_gain: f32,
    /// Upper bound on accumulated threat
    pub threat_cap: f32,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            decay_window_ms: 30_000.0,
            threat_gain: 0.1,
            threat_cap: 100.0,
        }
    }
}

/// Threat/opportunity scoring constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Threat score above which an entity is classified as a threat
    pub threat_threshold: f32,
    /// Opportunity score above which an entity is classified as prey
    pub opportunity_threshold: f32,
    /// Fixed opportunity value of any food item
    pub food_opportunity: f32,
    /// Size ratio a bot needs over another bot before it counts as prey
    pub bot_size_advantage: f32,
    pub bot_opportunity_scale: f32,
    /// Size ratio a bot needs over a player before it counts as prey
    pub player_size_advantage: f32,
    pub player_opportunity_scale: f32,
    /// Flee when threat score exceeds this times the role intelligence
    pub flee_threshold_base: f32,
    /// Flee when own size is below this fraction of the threat's size
    pub flee_size_ratio: f32,
    /// Chase when opportunity exceeds this divided by role aggression
    pub chase_threshold_base: f32,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            threat_threshold: 20.0,
            opportunity_threshold: 15.0,
            food_opportunity: 20.0,
            bot_size_advantage: 1.5,
            bot_opportunity_scale: 25.0,
            player_size_advantage: 1.3,
            player_opportunity_scale: 30.0,
            flee_threshold_base: 30.0,
            flee_size_ratio: 0.8,
            chase_threshold_base: 20.0,
        }
    }
}

/// Behavior executor constants
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    /// Bot diameter before the role size multiplier
    pub base_bot_size: f32,
    /// Bot max speed before the role speed multiplier
    pub base_speed: f32,

    /// Minimum time a wandering bot keeps wandering, times intelligence
    pub min_wander_ms: f64,
    pub wander_radius: f32,
    /// Each wander target lives for a random duration in this range
    pub wander_duration_min_ms: f64,
    pub wander_duration_max_ms: f64,
    /// Distance at which a wander, patrol or investigation point counts as reached
    pub arrival_distance: f32,
    pub wander_speed_factor: f32,

    pub flee_speed_factor: f32,

    pub guard_speed_factor: f32,
    pub patrol_radius: f32,
    pub patrol_retarget_ms: f64,
    /// Guards force a fresh decision this often
    pub guard_reevaluate_ms: f64,

    /// How many steps ahead chasers lead a moving target
    pub chase_prediction_steps: f32,
    /// Chase/flee give up beyond this multiple of the relevant radius
    pub abandon_range_factor: f32,
    pub hunt_slowdown_range: f32,
    pub hunt_slowdown: f32,

    /// A player seen within this window can be investigated
    pub investigate_window_ms: f64,
    pub investigate_timeout_ms: f64,
    pub investigate_speed_factor: f32,

    /// Velocity multiplier per tick while stunned
    pub stun_friction: f32,
    /// Full width of the random velocity kick applied while confused
    pub confusion_jitter: f32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            base_bot_size: 30.0,
            base_speed: 5.0,
            min_wander_ms: 3000.0,
            wander_radius: 200.0,
            wander_duration_min_ms: 2000.0,
            wander_duration_max_ms: 6000.0,
            arrival_distance: 50.0,
            wander_speed_factor: 0.5,
            flee_speed_factor: 1.2,
            guard_speed_factor: 0.7,
            patrol_radius: 150.0,
            patrol_retarget_ms: 5000.0,
            guard_reevaluate_ms: 2000.0,
            chase_prediction_steps: 18.0,
            abandon_range_factor: 1.5,
            hunt_slowdown_range: 100.0,
            hunt_slowdown: 0.9,
            investigate_window_ms: 10_000.0,
            investigate_timeout_ms: 4000.0,
            investigate_speed_factor: 0.8,
            stun_friction: 0.95,
            confusion_jitter: 0.5,
        }
    }
}

/// Perception backend selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerceptionConfig {
    /// Use the sparse hash grid instead of the linear scan
    ///
    /// Both produce the same detection sets.
    pub use_spatial_hash: bool,
    /// Cell size of the hash grid (world units)
    pub grid_cell_size: f32,
}

impl Default for PerceptionConfig {
    fn default() -> Self {
        Self {
            use_spatial_hash: false,
            grid_cell_size: 100.0,
        }
    }
}

/// Food spawning and growth
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FoodConfig {
    /// One food item is spawned per interval while below `max_food`
    pub spawn_interval_ms: f64,
    /// Zero disables automatic spawning
    pub max_food: usize,
    pub food_size: f32,
    /// Keeps spawned food away from the arena edge
    pub spawn_inset: f32,
    /// Diameter gained per point of nutrition
    pub food_growth: f32,
    /// Diameter gained per unit of consumed cell diameter
    pub cell_growth: f32,
    /// A cell must be this much larger than another to eat it
    pub eat_ratio: f32,
}

impl Default for FoodConfig {
    fn default() -> Self {
        Self {
            spawn_interval_ms: 1000.0,
            max_food: 50,
            food_size: 10.0,
            spawn_inset: 20.0,
            food_growth: 0.1,
            cell_growth: 0.5,
            eat_ratio: 1.1,
        }
    }
}

/// Player cell tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub base_size: f32,
    pub base_speed: f32,
    pub ability_duration_ms: f64,
    /// Steering speed multiplier while Speed Boost is active
    pub speed_boost: f32,
    /// Steering stops within this distance of the target
    pub arrival_distance: f32,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            base_size: 30.0,
            base_speed: 5.0,
            ability_duration_ms: 3000.0,
            speed_boost: 2.0,
            arrival_distance: 5.0,
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config from TOML; absent fields keep their defaults
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: SimulationConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        let arena = &self.arena;
        if arena.width <= 2.0 * arena.margin || arena.height <= 2.0 * arena.margin {
            return Err(ArenaError::InvalidConfig(format!(
                "arena {}x{} leaves no room inside margin {}",
                arena.width, arena.height, arena.margin
            )));
        }

        if self.timing.frame_ms <= 0.0 || self.timing.max_dt_ms <= 0.0 {
            return Err(ArenaError::InvalidConfig(
                "frame_ms and max_dt_ms must be positive".into(),
            ));
        }

        if self.memory.decay_window_ms <= 0.0 {
            return Err(ArenaError::InvalidConfig(
                "memory decay window must be positive".into(),
            ));
        }

        let behavior = &self.behavior;
        if behavior.wander_duration_min_ms > behavior.wander_duration_max_ms {
            return Err(ArenaError::InvalidConfig(format!(
                "wander_duration_min_ms ({}) should be <= wander_duration_max_ms ({})",
                behavior.wander_duration_min_ms, behavior.wander_duration_max_ms
            )));
        }

        if behavior.base_bot_size <= 0.0 || self.player.base_size <= 0.0 || self.food.food_size <= 0.0 {
            return Err(ArenaError::InvalidConfig("base sizes must be positive".into()));
        }

        let non_negative = [
            ("behavior.wander_radius", behavior.wander_radius),
            ("behavior.patrol_radius", behavior.patrol_radius),
            ("behavior.arrival_distance", behavior.arrival_distance),
            ("behavior.base_speed", behavior.base_speed),
            ("behavior.wander_speed_factor", behavior.wander_speed_factor),
            ("behavior.flee_speed_factor", behavior.flee_speed_factor),
            ("behavior.guard_speed_factor", behavior.guard_speed_factor),
            ("behavior.investigate_speed_factor", behavior.investigate_speed_factor),
            ("behavior.confusion_jitter", behavior.confusion_jitter),
            ("player.base_speed", self.player.base_speed),
            ("player.speed_boost", self.player.speed_boost),
            ("player.arrival_distance", self.player.arrival_distance),
            ("food.spawn_inset", self.food.spawn_inset),
        ];
        if let Some((name, value)) = non_negative.iter().find(|(_, v)| v.is_nan() || *v < 0.0) {
            return Err(ArenaError::InvalidConfig(format!(
                "{} must be non-negative, got {}",
                name, value
            )));
        }

        if behavior.wander_duration_min_ms < 0.0 {
            return Err(ArenaError::InvalidConfig(
                "wander durations must be non-negative".into(),
            ));
        }

        // One spawn per frame at most
        if self.food.spawn_interval_ms < self.timing.frame_ms {
            return Err(ArenaError::InvalidConfig(format!(
                "food.spawn_interval_ms ({}) must be at least frame_ms ({})",
                self.food.spawn_interval_ms, self.timing.frame_ms
            )));
        }

        if self.perception.grid_cell_size <= 0.0 {
            return Err(ArenaError::InvalidConfig(
                "grid_cell_size must be positive".into(),
            ));
        }

        if self.food.eat_ratio < 1.0 {
            return Err(ArenaError::InvalidConfig(format!(
                "eat_ratio ({}) below 1.0 would let smaller cells eat larger ones",
                self.food.eat_ratio
            )));
        }

        Ok(())
    }
}
