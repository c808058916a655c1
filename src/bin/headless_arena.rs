//! Headless Arena Runner
//!
//! Runs the arena without rendering and prints a summary (or the final
//! snapshot) for tuning and regression checks.

use std::collections::BTreeMap;

use agar_arena::core::types::Tick;
use agar_arena::entity::archetype::{BotRole, PlayerClass};
use agar_arena::simulation::events::{EventDispatcher, EventHandler, HandlerError};
use agar_arena::{SimulationConfig, SimulationEvent, SpawnKind, Vec2, World};
use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::info;

/// Headless Arena Runner - bots, food and one idle player
#[derive(Parser, Debug)]
#[command(name = "headless_arena")]
#[command(about = "Run the arena simulation without rendering and report the outcome")]
struct Args {
    /// TOML config file (missing fields use defaults)
    #[arg(long)]
    config: Option<String>,

    /// Number of ticks to run
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Milliseconds per tick
    #[arg(long, default_value_t = 16.0)]
    dt: f64,

    /// Bots to spawn, cycling through every role
    #[arg(long, default_value_t = 30)]
    bots: usize,

    /// Food items to spawn up front
    #[arg(long, default_value_t = 40)]
    food: usize,

    /// Spawn a stationary player in the arena center
    #[arg(long)]
    player: bool,

    /// Random seed for deterministic runs (overrides the config)
    #[arg(long)]
    seed: Option<u64>,

    /// Output format: json, snapshot or text
    #[arg(long, default_value = "text")]
    format: String,
}

/// Counts every event kind it sees
#[derive(Default)]
struct EventTally {
    counts: std::rc::Rc<std::cell::RefCell<BTreeMap<&'static str, usize>>>,
}

impl EventHandler for EventTally {
    fn name(&self) -> &str {
        "tally"
    }

    fn handle(&mut self, _tick: Tick, event: &SimulationEvent) -> Result<(), HandlerError> {
        let key = match event {
            SimulationEvent::Spawned { .. } => "spawned",
            SimulationEvent::Disposed { .. } => "disposed",
            SimulationEvent::BehaviorChanged { .. } => "behavior_changed",
            SimulationEvent::AlertChanged { .. } => "alert_changed",
            SimulationEvent::Consumed { .. } => "consumed",
            SimulationEvent::StatusApplied { .. } => "status_applied",
            SimulationEvent::AbilityActivated { .. } => "ability_activated",
            SimulationEvent::AbilityExpired { .. } => "ability_expired",
            SimulationEvent::Removed { .. } => "removed",
        };
        *self.counts.borrow_mut().entry(key).or_default() += 1;
        Ok(())
    }
}

#[derive(Serialize)]
struct RunSummary {
    seed: u64,
    ticks: u64,
    clock_ms: f64,
    entities: usize,
    behaviors: BTreeMap<String, usize>,
    roles: BTreeMap<String, usize>,
    events: BTreeMap<&'static str, usize>,
    handler_failures: usize,
}

fn main() -> agar_arena::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("agar_arena=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    let seed = config.seed;
    let (width, height, margin) = (config.arena.width, config.arena.height, config.arena.margin);

    info!(seed, bots = args.bots, food = args.food, ticks = args.ticks, "starting headless arena");

    let mut world = World::try_new(config)?;
    let mut placement = ChaCha8Rng::seed_from_u64(seed);
    let random_point = |rng: &mut ChaCha8Rng| {
        Vec2::new(
            rng.gen_range(margin..width - margin),
            rng.gen_range(margin..height - margin),
        )
    };

    for i in 0..args.bots {
        let role = BotRole::ALL[i % BotRole::ALL.len()];
        let position = random_point(&mut placement);
        world.spawn(SpawnKind::Bot(role), position);
    }
    for _ in 0..args.food {
        let position = random_point(&mut placement);
        let food_type = agar_arena::entity::archetype::FoodType::roll(&mut placement);
        world.spawn(SpawnKind::Food(food_type), position);
    }
    if args.player {
        world.spawn(
            SpawnKind::Player(PlayerClass::default()),
            Vec2::new(width / 2.0, height / 2.0),
        );
    }

    let tally = EventTally::default();
    let counts = std::rc::Rc::clone(&tally.counts);
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(Box::new(tally));

    for _ in 0..args.ticks {
        let events = world.tick(args.dt);
        dispatcher.dispatch(world.tick_count(), &events);
    }

    let snapshot = world.snapshot();
    info!(
        entities = snapshot.len(),
        clock_ms = world.clock_ms(),
        "run complete"
    );

    match args.format.as_str() {
        "snapshot" => println!("{}", serde_json::to_string_pretty(&snapshot)?),
        format => {
            let mut behaviors = BTreeMap::new();
            let mut roles = BTreeMap::new();
            for entity in &snapshot {
                if let Some(behavior) = entity.behavior {
                    *behaviors.entry(behavior.label().to_string()).or_insert(0) += 1;
                }
                if let Some(role) = entity.role {
                    *roles.entry(format!("{:?}", role)).or_insert(0) += 1;
                }
            }

            let summary = RunSummary {
                seed,
                ticks: world.tick_count(),
                clock_ms: world.clock_ms(),
                entities: snapshot.len(),
                behaviors,
                roles,
                events: counts.borrow().clone(),
                handler_failures: dispatcher.failures(),
            };

            if format == "json" {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                println!("Arena after {} ticks ({:.0}ms), seed {}", summary.ticks, summary.clock_ms, summary.seed);
                println!("  entities: {}", summary.entities);
                println!("  surviving bots by role:");
                for (role, count) in &summary.roles {
                    println!("    {:<10} {}", role, count);
                }
                println!("  behaviors:");
                for (behavior, count) in &summary.behaviors {
                    println!("    {:<14} {}", behavior, count);
                }
                println!("  events:");
                for (kind, count) in &summary.events {
                    println!("    {:<18} {}", kind, count);
                }
            }
        }
    }

    Ok(())
}
