//! World - the single mutation point for the arena
//!
//! Owns the registry, the clock, the config and the event queue. External
//! collaborators spawn, dispose and push commands through here, then call
//! `tick` and read snapshots.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, warn};

use crate::core::config::SimulationConfig;
use crate::core::error::{ArenaError, Result};
use crate::core::types::{EntityId, Millis, Tick, Vec2};
use crate::ecs::registry::Registry;
use crate::entity::agent::{Agent, AlertLevel, BehaviorState};
use crate::entity::archetype::{Ability, BotRole, FoodType, PlayerClass};
use crate::entity::body::Body;
use crate::entity::status::StatusEffect;
use crate::entity::{ActiveAbility, Entity, EntityKind, EntitySnapshot, FoodState, PlayerState};
use crate::simulation::events::{EventQueue, SimulationEvent};
use crate::simulation::tick::run_simulation_tick;

/// What to create with `World::spawn`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnKind {
    Player(PlayerClass),
    Bot(BotRole),
    Food(FoodType),
}

/// Diameter shrink applied by Mass Split (halves the mass)
const MASS_SPLIT_SCALE: f32 = std::f32::consts::FRAC_1_SQRT_2;

pub struct World {
    pub(crate) registry: Registry,
    pub(crate) config: SimulationConfig,
    pub(crate) clock_ms: Millis,
    pub(crate) tick: Tick,
    pub(crate) events: EventQueue,
    rng: ChaCha8Rng,
    food_timer_ms: Millis,
}

impl World {
    /// Build a world from a config that is already known to be valid
    ///
    /// Configs from `SimulationConfig::from_toml`/`from_file` and the defaults
    /// qualify. Use [`World::try_new`] for anything assembled by hand.
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            registry: Registry::new(),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            clock_ms: 0.0,
            tick: 0,
            events: EventQueue::new(),
            food_timer_ms: 0.0,
        }
    }

    /// Validate `config`, then build the world
    pub fn try_new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(config))
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn clock_ms(&self) -> Millis {
        self.clock_ms
    }

    pub fn tick_count(&self) -> Tick {
        self.tick
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.registry.get(id)
    }

    pub fn entity_count(&self) -> usize {
        self.registry.len()
    }

    /// Advance the simulation by `dt_ms` and return this tick's events
    pub fn tick(&mut self, dt_ms: Millis) -> Vec<SimulationEvent> {
        run_simulation_tick(self, dt_ms)
    }

    /// Copy of every active entity
    pub fn snapshot(&self) -> Vec<EntitySnapshot> {
        self.registry.active_entities()
    }

    /// Events queued by commands since the last tick
    pub fn drain_events(&mut self) -> Vec<SimulationEvent> {
        self.events.drain()
    }

    pub fn spawn(&mut self, kind: SpawnKind, position: Vec2) -> EntityId {
        let (body, entity_kind) = match kind {
            SpawnKind::Player(class) => {
                let player = &self.config.player;
                (
                    Body::circle(position, player.base_size).with_max_speed(player.base_speed),
                    EntityKind::Player(PlayerState::new(class)),
                )
            }
            SpawnKind::Bot(role) => {
                let behavior = &self.config.behavior;
                let profile = role.profile();
                let seed = self.config.seed ^ self.registry.next_id().0;
                let agent = Agent::new(
                    role,
                    position,
                    self.config.timing.base_decision_cooldown_ms,
                    seed,
                );
                (
                    Body::circle(position, behavior.base_bot_size * profile.size_multiplier)
                        .with_max_speed(behavior.base_speed * profile.speed_multiplier),
                    EntityKind::Bot(Box::new(agent)),
                )
            }
            SpawnKind::Food(food_type) => (
                Body::circle(position, self.config.food.food_size).with_max_speed(0.0),
                EntityKind::Food(FoodState { food_type }),
            ),
        };

        let class = entity_kind.class();
        let id = self.registry.spawn(body, entity_kind);
        debug!(entity = %id, ?kind, x = position.x, y = position.y, "spawned");
        self.events.push(SimulationEvent::Spawned { entity: id, class });
        id
    }

    /// Mark an entity inactive; false when unknown or already inactive
    pub fn dispose(&mut self, id: EntityId) -> bool {
        let disposed = self.registry.dispose(id);
        if disposed {
            debug!(entity = %id, "disposed");
            self.events.push(SimulationEvent::Disposed { entity: id });
        } else {
            warn!(entity = %id, "dispose ignored: unknown or inactive entity");
        }
        disposed
    }

    fn active_entity_mut(&mut self, id: EntityId) -> Result<&mut Entity> {
        self.registry
            .get_mut(id)
            .filter(|e| e.is_active())
            .ok_or(ArenaError::EntityNotFound(id))
    }

    /// Push a timed status effect onto a bot
    ///
    /// Stun takes effect immediately. Fear raises the alert to Panic and
    /// forces a decision on the next tick.
    pub fn apply_status_effect(
        &mut self,
        id: EntityId,
        effect: StatusEffect,
        duration_ms: Millis,
    ) -> Result<()> {
        let entity = self.active_entity_mut(id)?;
        let agent = entity.agent_mut().ok_or(ArenaError::NotAnAgent(id))?;

        agent.status.apply(effect, duration_ms);
        let mut events = vec![SimulationEvent::StatusApplied {
            entity: id,
            effect,
            duration_ms,
        }];

        match effect {
            StatusEffect::Stun if agent.status.is_stunned() => {
                if let Some(from) = agent.set_behavior(BehaviorState::Stunned) {
                    events.push(SimulationEvent::BehaviorChanged {
                        entity: id,
                        from,
                        to: BehaviorState::Stunned,
                    });
                }
            }
            StatusEffect::Fear if agent.status.is_scared() => {
                let from = agent.alert;
                agent.alert = AlertLevel::Panic;
                agent.force_decision();
                if from != AlertLevel::Panic {
                    events.push(SimulationEvent::AlertChanged {
                        entity: id,
                        from,
                        to: AlertLevel::Panic,
                    });
                }
            }
            _ => {}
        }

        debug!(entity = %id, ?effect, duration_ms, "status applied");
        self.events.extend(events);
        Ok(())
    }

    /// Point a player at a world position; it moves there on following ticks
    pub fn steer(&mut self, id: EntityId, target: Vec2) -> Result<()> {
        let entity = self.active_entity_mut(id)?;
        let player = entity.player_mut().ok_or(ArenaError::NotAPlayer(id))?;
        player.steer_target = Some(target);
        Ok(())
    }

    /// Trigger a player's special ability
    ///
    /// Fails while another ability is active or this one is cooling down.
    pub fn activate_ability(&mut self, id: EntityId, ability: Ability) -> Result<()> {
        let now = self.clock_ms;
        let duration = self.config.player.ability_duration_ms;
        let (width, height) = (self.config.arena.width, self.config.arena.height);

        let entity = self.active_entity_mut(id)?;
        let Entity { body, kind, .. } = entity;
        let EntityKind::Player(player) = kind else {
            return Err(ArenaError::NotAPlayer(id));
        };

        if let Some(active) = player.active_ability {
            return Err(ArenaError::AbilityUnavailable {
                entity: id,
                ability,
                reason: format!("{:?} is still active", active.ability),
            });
        }
        let remaining = player.cooldown_remaining(ability, now);
        if remaining > 0.0 {
            return Err(ArenaError::AbilityUnavailable {
                entity: id,
                ability,
                reason: format!("cooling down for {:.0}ms", remaining),
            });
        }

        match ability {
            Ability::Teleport => {
                if let Some(target) = player.steer_target.take() {
                    body.set_position(target);
                    body.bounce_in_bounds(width, height);
                    body.velocity = Vec2::ZERO;
                }
            }
            Ability::Camouflage => body.visible = false,
            Ability::MassSplit => {
                let diameter = body.diameter() * MASS_SPLIT_SCALE;
                body.set_size(diameter, diameter);
            }
            Ability::SpeedBoost | Ability::Shield => {}
        }

        player.active_ability = Some(ActiveAbility {
            ability,
            remaining_ms: duration,
        });
        player.ready_at.insert(ability, now + ability.cooldown_ms());

        debug!(entity = %id, ?ability, "ability activated");
        self.events
            .push(SimulationEvent::AbilityActivated { entity: id, ability });
        Ok(())
    }

    /// Spawn one food item per elapsed interval while below the cap
    pub(crate) fn spawn_food_if_due(&mut self, dt: Millis) {
        let food = &self.config.food;
        if food.max_food == 0 || food.spawn_interval_ms <= 0.0 {
            return;
        }

        self.food_timer_ms += dt;
        while self.food_timer_ms >= self.config.food.spawn_interval_ms {
            self.food_timer_ms -= self.config.food.spawn_interval_ms;

            let food_count = self
                .registry
                .iter()
                .filter(|e| e.is_active() && matches!(e.kind, EntityKind::Food(_)))
                .count();
            if food_count >= self.config.food.max_food {
                continue;
            }

            let inset = self.config.food.spawn_inset;
            let (width, height) = (self.config.arena.width, self.config.arena.height);
            let position = Vec2::new(
                self.rng.gen_range(inset..=(width - inset).max(inset)),
                self.rng.gen_range(inset..=(height - inset).max(inset)),
            );
            let food_type = FoodType::roll(&mut self.rng);
            self.spawn(SpawnKind::Food(food_type), position);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(SimulationConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.food.max_food = 0;
        config
    }

    #[test]
    fn test_spawn_bot_uses_role_profile() {
        let mut world = World::new(quiet_config());
        let id = world.spawn(SpawnKind::Bot(BotRole::Tank), Vec2::new(400.0, 700.0));
        let entity = world.get(id).unwrap();
        assert!((entity.body.diameter() - 42.0).abs() < 1e-4);
        assert!((entity.body.max_speed - 3.0).abs() < 1e-4);
        assert_eq!(entity.agent().unwrap().territory, Some(Vec2::new(400.0, 700.0)));

        let events = world.drain_events();
        assert_eq!(events.len(), 1);
        assert!(world.drain_events().is_empty());
    }

    #[test]
    fn test_status_effect_errors() {
        let mut world = World::new(quiet_config());
        let player = world.spawn(SpawnKind::Player(PlayerClass::Mage), Vec2::new(100.0, 100.0));
        assert!(matches!(
            world.apply_status_effect(player, StatusEffect::Stun, 100.0),
            Err(ArenaError::NotAnAgent(_))
        ));
        assert!(matches!(
            world.apply_status_effect(EntityId(77), StatusEffect::Stun, 100.0),
            Err(ArenaError::EntityNotFound(_))
        ));
    }

    #[test]
    fn test_stun_is_immediate_and_fear_panics() {
        let mut world = World::new(quiet_config());
        let bot = world.spawn(SpawnKind::Bot(BotRole::Scout), Vec2::new(100.0, 100.0));

        world.apply_status_effect(bot, StatusEffect::Stun, 500.0).unwrap();
        assert_eq!(world.get(bot).unwrap().agent().unwrap().behavior, BehaviorState::Stunned);

        world.apply_status_effect(bot, StatusEffect::Fear, 500.0).unwrap();
        let agent = world.get(bot).unwrap().agent().unwrap();
        assert_eq!(agent.alert, AlertLevel::Panic);
        assert!(agent.decision_due(world.clock_ms()));
    }

    #[test]
    fn test_ability_cooldown_and_exclusivity() {
        let mut world = World::new(quiet_config());
        let player = world.spawn(SpawnKind::Player(PlayerClass::Tank), Vec2::new(400.0, 700.0));

        world.activate_ability(player, Ability::Shield).unwrap();
        assert!(matches!(
            world.activate_ability(player, Ability::SpeedBoost),
            Err(ArenaError::AbilityUnavailable { .. })
        ));

        // Expires after 3s; Shield still cooling down until 12s
        for _ in 0..40 {
            world.tick(100.0);
        }
        assert!(matches!(
            world.activate_ability(player, Ability::Shield),
            Err(ArenaError::AbilityUnavailable { .. })
        ));
        assert!(world.activate_ability(player, Ability::SpeedBoost).is_ok());
    }

    #[test]
    fn test_teleport_jumps_to_steer_target() {
        let mut world = World::new(quiet_config());
        let player = world.spawn(SpawnKind::Player(PlayerClass::Mage), Vec2::new(100.0, 100.0));
        world.steer(player, Vec2::new(600.0, 900.0)).unwrap();
        world.activate_ability(player, Ability::Teleport).unwrap();
        assert_eq!(world.get(player).unwrap().body.position, Vec2::new(600.0, 900.0));
    }

    #[test]
    fn test_try_new_rejects_hand_built_config() {
        let mut config = quiet_config();
        config.behavior.wander_radius = -10.0;
        assert!(matches!(World::try_new(config), Err(ArenaError::InvalidConfig(_))));

        let mut config = quiet_config();
        config.timing.frame_ms = 0.0;
        assert!(matches!(World::try_new(config), Err(ArenaError::InvalidConfig(_))));

        let mut world = World::try_new(quiet_config()).unwrap();
        world.spawn(SpawnKind::Bot(BotRole::Wanderer), Vec2::new(400.0, 700.0));
        world.tick(16.0);
        assert_eq!(world.tick_count(), 1);
    }

    #[test]
    fn test_steer_rejects_bots() {
        let mut world = World::new(quiet_config());
        let bot = world.spawn(SpawnKind::Bot(BotRole::Hybrid), Vec2::new(100.0, 100.0));
        assert!(matches!(
            world.steer(bot, Vec2::ZERO),
            Err(ArenaError::NotAPlayer(_))
        ));
    }

    #[test]
    fn test_food_spawns_up_to_cap() {
        let mut config = SimulationConfig::default();
        config.food.max_food = 3;
        let mut world = World::new(config);
        for _ in 0..100 {
            world.tick(100.0);
        }
        let food = world
            .snapshot()
            .iter()
            .filter(|s| s.kind == crate::entity::EntityClass::Food)
            .count();
        assert_eq!(food, 3);
    }
}
