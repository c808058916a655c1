//! End-to-end arena runs: determinism, lifecycle, consumption and event fan-out

use std::cell::RefCell;
use std::rc::Rc;

use agar_arena::core::types::Tick;
use agar_arena::entity::agent::BehaviorState;
use agar_arena::entity::archetype::{Ability, BotRole, FoodType, PlayerClass};
use agar_arena::entity::{EntityClass, EntitySnapshot};
use agar_arena::simulation::events::{EventDispatcher, EventHandler, HandlerError};
use agar_arena::{ArenaError, SimulationConfig, SimulationEvent, SpawnKind, Vec2, World};

fn populated_world(config: SimulationConfig) -> World {
    let mut world = World::new(config);
    for i in 0..36 {
        let role = BotRole::ALL[i % BotRole::ALL.len()];
        let x = 80.0 + (i % 6) as f32 * 120.0;
        let y = 100.0 + (i / 6) as f32 * 200.0;
        world.spawn(SpawnKind::Bot(role), Vec2::new(x, y));
    }
    world.spawn(SpawnKind::Player(PlayerClass::Assassin), Vec2::new(400.0, 700.0));
    world
}

fn run(world: &mut World, ticks: usize) -> Vec<SimulationEvent> {
    let mut all = Vec::new();
    for _ in 0..ticks {
        all.extend(world.tick(16.0));
    }
    all
}

#[test]
fn test_same_seed_same_outcome() {
    let mut a = populated_world(SimulationConfig::default());
    let mut b = populated_world(SimulationConfig::default());

    let events_a = run(&mut a, 300);
    let events_b = run(&mut b, 300);

    assert_eq!(a.snapshot(), b.snapshot());
    assert_eq!(events_a, events_b);
}

#[test]
fn test_parallel_agent_phase_matches_sequential() {
    let mut sequential_config = SimulationConfig::default();
    sequential_config.parallel_threshold = usize::MAX;
    let mut parallel_config = SimulationConfig::default();
    parallel_config.parallel_threshold = 0;

    let mut sequential = populated_world(sequential_config);
    let mut parallel = populated_world(parallel_config);
    run(&mut sequential, 200);
    run(&mut parallel, 200);

    assert_eq!(sequential.snapshot(), parallel.snapshot());
}

#[test]
fn test_spatial_hash_matches_linear_scan() {
    let mut linear = populated_world(SimulationConfig::default());
    let mut config = SimulationConfig::default();
    config.perception.use_spatial_hash = true;
    let mut hashed = populated_world(config);

    run(&mut linear, 200);
    run(&mut hashed, 200);

    assert_eq!(linear.snapshot(), hashed.snapshot());
}

#[test]
fn test_bots_stay_inside_margins() {
    let mut world = populated_world(SimulationConfig::default());
    let arena = world.config().arena.clone();

    for _ in 0..500 {
        world.tick(16.0);
        for entity in world.snapshot().iter().filter(|s| s.kind == EntityClass::Bot) {
            assert!(entity.position.x >= arena.margin && entity.position.x <= arena.width - arena.margin);
            assert!(entity.position.y >= arena.margin && entity.position.y <= arena.height - arena.margin);
        }
    }
}

#[test]
fn test_disposed_entity_gone_after_next_tick() {
    let mut world = populated_world(SimulationConfig::default());
    run(&mut world, 10);

    let victim = world.snapshot()[3].id;
    assert!(world.dispose(victim));
    assert!(!world.dispose(victim));
    assert!(world.snapshot().iter().all(|s| s.id != victim));

    let events = world.tick(16.0);
    assert!(events.contains(&SimulationEvent::Disposed { entity: victim }));
    assert!(events.contains(&SimulationEvent::Removed { entity: victim }));
    assert!(world.get(victim).is_none());
    assert!(world.snapshot().iter().all(|s| s.id != victim));
}

#[test]
fn test_ids_are_never_reused() {
    let mut world = World::default();
    let first = world.spawn(SpawnKind::Bot(BotRole::Scout), Vec2::new(100.0, 100.0));
    world.dispose(first);
    world.tick(16.0);
    let second = world.spawn(SpawnKind::Bot(BotRole::Scout), Vec2::new(100.0, 100.0));
    assert!(second > first);
}

#[test]
fn test_player_eats_overlapping_food() {
    let mut config = SimulationConfig::default();
    config.food.max_food = 0;
    config.player.base_size = 60.0;
    let mut world = World::new(config);

    let player = world.spawn(SpawnKind::Player(PlayerClass::Support), Vec2::new(400.0, 700.0));
    let food = world.spawn(SpawnKind::Food(FoodType::Basic), Vec2::new(405.0, 700.0));

    let events = world.tick(16.0);

    assert!(world.get(food).is_none());
    assert!(events.iter().any(|e| matches!(
        e,
        SimulationEvent::Consumed { eater, prey, prey_class: EntityClass::Food, .. }
            if *eater == player && *prey == food
    )));
    let state = world.get(player).unwrap().player().unwrap();
    assert_eq!(state.food_eaten, 1);
    assert!(world.get(player).unwrap().body.diameter() > 60.0);
}

#[test]
fn test_shield_blocks_being_eaten() {
    let mut config = SimulationConfig::default();
    config.food.max_food = 0;
    config.player.base_size = 20.0;
    let mut world = World::new(config);

    let player = world.spawn(SpawnKind::Player(PlayerClass::Tank), Vec2::new(400.0, 700.0));
    // Tank bot diameter 42 overlaps the 20 wide player
    let bot = world.spawn(SpawnKind::Bot(BotRole::Tank), Vec2::new(410.0, 700.0));
    world.activate_ability(player, Ability::Shield).unwrap();

    world.tick(16.0);
    assert!(world.get(player).is_some());
    assert!(world.get(bot).is_some());
}

#[test]
fn test_steered_player_reaches_target() {
    let mut config = SimulationConfig::default();
    config.food.max_food = 0;
    let mut world = World::new(config);
    let player = world.spawn(SpawnKind::Player(PlayerClass::Mage), Vec2::new(100.0, 100.0));
    world.steer(player, Vec2::new(300.0, 100.0)).unwrap();

    run(&mut world, 200);

    let entity = world.get(player).unwrap();
    assert!(entity.body.position.distance(&Vec2::new(300.0, 100.0)) < 10.0);
    assert!(entity.player().unwrap().steer_target.is_none());
}

#[test]
fn test_camouflaged_player_is_ignored_by_bots() {
    let mut config = SimulationConfig::default();
    config.food.max_food = 0;
    config.player.base_size = 84.0;
    let mut world = World::new(config);

    let player = world.spawn(SpawnKind::Player(PlayerClass::Mage), Vec2::new(400.0, 600.0));
    world.activate_ability(player, Ability::Camouflage).unwrap();
    let tank = world.spawn(SpawnKind::Bot(BotRole::Tank), Vec2::new(400.0, 700.0));

    world.tick(16.0);
    let agent = world.get(tank).unwrap().agent().unwrap();
    assert!(agent.current_threat.is_none());
    assert!(agent.memory.is_empty());
}

#[test]
fn test_camouflage_mid_chase_loses_the_chaser() {
    let mut config = SimulationConfig::default();
    config.food.max_food = 0;
    config.player.base_size = 20.0;
    let mut world = World::new(config);

    let tank = world.spawn(SpawnKind::Bot(BotRole::Tank), Vec2::new(400.0, 700.0));
    let player = world.spawn(SpawnKind::Player(PlayerClass::Mage), Vec2::new(400.0, 880.0));

    world.tick(16.0);
    let agent = world.get(tank).unwrap().agent().unwrap();
    assert_eq!(agent.behavior, BehaviorState::Chasing);
    assert_eq!(agent.primary_target, Some(player));

    world.activate_ability(player, Ability::Camouflage).unwrap();
    run(&mut world, 10);

    let agent = world.get(tank).unwrap().agent().unwrap();
    assert!(!agent.behavior.is_pursuit());
    assert!(agent.primary_target.is_none());
}

#[test]
fn test_commands_on_missing_entities_fail() {
    let mut world = World::default();
    let ghost = agar_arena::EntityId(999);
    assert!(matches!(world.steer(ghost, Vec2::ZERO), Err(ArenaError::EntityNotFound(_))));
    assert!(matches!(
        world.activate_ability(ghost, Ability::Teleport),
        Err(ArenaError::EntityNotFound(_))
    ));
    assert!(!world.dispose(ghost));
}

#[test]
fn test_shipped_config_loads() {
    let config = SimulationConfig::from_file("data/arena.toml").expect("shipped config parses");
    assert_eq!(config.arena.width, 800.0);
    assert_eq!(config.seed, 42);
}

#[test]
fn test_snapshot_serializes_to_json() {
    let mut world = populated_world(SimulationConfig::default());
    run(&mut world, 5);
    let json = serde_json::to_string(&world.snapshot()).unwrap();
    let back: Vec<EntitySnapshot> = serde_json::from_str(&json).unwrap();
    assert_eq!(back.len(), world.snapshot().len());
}

// ---------------------------------------------------------------------------
// Event fan-out
// ---------------------------------------------------------------------------

struct Recorder {
    seen: Rc<RefCell<Vec<(Tick, SimulationEvent)>>>,
}

impl EventHandler for Recorder {
    fn name(&self) -> &str {
        "recorder"
    }

    fn handle(&mut self, tick: Tick, event: &SimulationEvent) -> Result<(), HandlerError> {
        self.seen.borrow_mut().push((tick, event.clone()));
        Ok(())
    }
}

struct Grumpy;

impl EventHandler for Grumpy {
    fn name(&self) -> &str {
        "grumpy"
    }

    fn handle(&mut self, _tick: Tick, event: &SimulationEvent) -> Result<(), HandlerError> {
        match event {
            SimulationEvent::Spawned { .. } => panic!("spawn events upset this handler"),
            _ => Err("refusing".into()),
        }
    }
}

#[test]
fn test_failing_handlers_do_not_affect_others_or_the_world() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(Box::new(Grumpy));
    dispatcher.register(Box::new(Recorder { seen: Rc::clone(&seen) }));

    let mut world = populated_world(SimulationConfig::default());
    let mut reference = populated_world(SimulationConfig::default());

    let mut total = 0;
    for _ in 0..50 {
        let events = world.tick(16.0);
        reference.tick(16.0);
        total += events.len();
        let report = dispatcher.dispatch(world.tick_count(), &events);
        assert_eq!(report.errors + report.panics, events.len());
    }

    assert_eq!(seen.borrow().len(), total);
    assert_eq!(seen.borrow()[0].0, 1);
    assert_eq!(dispatcher.failures(), total);
    assert_eq!(world.snapshot(), reference.snapshot());
}
