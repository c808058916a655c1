//! Tick system - orchestrates simulation updates
//!
//! This is the core loop that ties together:
//! snapshot -> perception -> scoring + memory -> decision -> behavior ->
//! integration -> consumption -> food spawning -> cleanup -> events
//!
//! Agents read only the frozen snapshot plus their own state, so the agent
//! phase can run on rayon without changing results.

use rand::Rng;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::core::config::SimulationConfig;
use crate::core::types::{EntityId, Millis, Vec2};
use crate::ecs::world::World;
use crate::entity::agent::{Agent, AlertLevel, BehaviorState};
use crate::entity::archetype::Ability;
use crate::entity::body::Body;
use crate::entity::{Entity, EntityKind};
use crate::simulation::action_select::{select_action, Decision, SelectionContext};
use crate::simulation::behavior::{self, BehaviorContext};
use crate::simulation::consumption::resolve_consumption;
use crate::simulation::events::SimulationEvent;
use crate::simulation::perception::WorldView;
use crate::simulation::scoring::{self, ScoringSelf};

/// Run a single simulation tick
///
/// 1. Advance the clock (`dt_ms` clamped to `timing.max_dt_ms`)
/// 2. Freeze a snapshot of every active entity
/// 3. Players: ability timers and steering
/// 4. Bots: status timers, perception, scoring, memory, alert, decision, behavior
/// 5. Integrate every body and keep it inside the arena
/// 6. Resolve consumption
/// 7. Spawn food when due
/// 8. Remove inactive entities
///
/// Returns every event queued since the previous tick, including those
/// produced by world commands in between.
pub fn run_simulation_tick(world: &mut World, dt_ms: Millis) -> Vec<SimulationEvent> {
    let dt = dt_ms.clamp(0.0, world.config.timing.max_dt_ms);
    world.clock_ms += dt;
    world.tick += 1;
    let now = world.clock_ms;

    let snapshot = world.registry.active_entities();
    let view = WorldView::new(&snapshot, &world.config.perception);
    let config = &world.config;

    // Players
    for entity in world.registry.iter_mut() {
        let events = update_player(entity, config, dt);
        world.events.extend(events);
    }

    // Bots
    let bot_count = snapshot.iter().filter(|s| s.role.is_some()).count();
    let agent_events: Vec<Vec<SimulationEvent>> = if bot_count >= config.parallel_threshold {
        world
            .registry
            .as_mut_slice()
            .par_iter_mut()
            .map(|entity| update_agent(entity, &view, config, now, dt))
            .collect()
    } else {
        world
            .registry
            .iter_mut()
            .map(|entity| update_agent(entity, &view, config, now, dt))
            .collect()
    };
    world.events.extend(agent_events.into_iter().flatten());

    // Kinematics
    let steps = (dt / config.timing.frame_ms) as f32;
    let arena = &config.arena;
    for entity in world.registry.iter_mut().filter(|e| e.is_active()) {
        entity.body.integrate(steps);
        match entity.kind {
            EntityKind::Bot(_) => entity.body.clamp_to_arena(arena.width, arena.height, arena.margin),
            EntityKind::Player(_) => entity.body.bounce_in_bounds(arena.width, arena.height),
            EntityKind::Food(_) => {}
        }
    }

    let consumed = resolve_consumption(world.registry.as_mut_slice(), &config.food);
    world.events.extend(consumed);

    world.spawn_food_if_due(dt);

    for id in world.registry.cleanup_inactive() {
        trace!(entity = %id, "removed");
        world.events.push(SimulationEvent::Removed { entity: id });
    }

    world.events.drain()
}

/// Ability timers and steering for one player; no-op for other kinds
pub fn update_player(entity: &mut Entity, config: &SimulationConfig, dt: Millis) -> Vec<SimulationEvent> {
    let id = entity.id;
    let Entity { body, kind, .. } = entity;
    let EntityKind::Player(player) = kind else {
        return Vec::new();
    };
    if !body.active {
        return Vec::new();
    }

    let mut events = Vec::new();

    if let Some(active) = player.active_ability.as_mut() {
        active.remaining_ms -= dt;
        if active.remaining_ms <= 0.0 {
            let ability = active.ability;
            player.active_ability = None;
            if ability == Ability::Camouflage {
                body.visible = true;
            }
            debug!(entity = %id, ?ability, "ability expired");
            events.push(SimulationEvent::AbilityExpired { entity: id, ability });
        }
    }

    if let Some(target) = player.steer_target {
        if body.position.distance(&target) < config.player.arrival_distance {
            body.velocity = Vec2::ZERO;
            player.steer_target = None;
        } else {
            let boosted =
                player.has_active(Ability::SpeedBoost) || player.has_active(Ability::MassSplit);
            let factor = if boosted { config.player.speed_boost } else { 1.0 };
            body.move_towards(target, body.max_speed * factor);
        }
    }

    events
}

/// One bot's full think-and-steer step; no-op for other kinds
pub fn update_agent(
    entity: &mut Entity,
    view: &WorldView<'_>,
    config: &SimulationConfig,
    now: Millis,
    dt: Millis,
) -> Vec<SimulationEvent> {
    let id = entity.id;
    let Entity { body, kind, .. } = entity;
    let EntityKind::Bot(agent) = kind else {
        return Vec::new();
    };
    if !body.active {
        return Vec::new();
    }

    let before_behavior = agent.behavior;
    let before_alert = agent.alert;

    agent.status.advance(dt);
    agent.behavior_timer_ms += dt;

    let ctx = BehaviorContext {
        view,
        behavior: &config.behavior,
        arena: &config.arena,
        now,
    };

    if agent.status.is_stunned() {
        agent.set_behavior(BehaviorState::Stunned);
        behavior::execute(agent, body, &ctx);
    } else {
        if agent.behavior == BehaviorState::Stunned {
            agent.set_behavior(BehaviorState::Wandering);
            agent.force_decision();
        }
        think(id, agent, body, view, config, now);
        behavior::execute(agent, body, &ctx);

        if agent.status.is_confused() {
            let half = config.behavior.confusion_jitter / 2.0;
            if half > 0.0 {
                let rng = agent.rng();
                body.velocity.x += rng.gen_range(-half..=half);
                body.velocity.y += rng.gen_range(-half..=half);
            }
        }
    }

    let mut events = Vec::new();
    if agent.behavior != before_behavior {
        debug!(entity = %id, from = before_behavior.label(), to = agent.behavior.label(), "behavior changed");
        events.push(SimulationEvent::BehaviorChanged {
            entity: id,
            from: before_behavior,
            to: agent.behavior,
        });
    }
    if agent.alert != before_alert {
        debug!(entity = %id, from = ?before_alert, to = ?agent.alert, "alert changed");
        events.push(SimulationEvent::AlertChanged {
            entity: id,
            from: before_alert,
            to: agent.alert,
        });
    }
    events
}

/// Perception, scoring, memory, alert and (when due) a decision
fn think(
    id: EntityId,
    agent: &mut Agent,
    body: &Body,
    view: &WorldView<'_>,
    config: &SimulationConfig,
    now: Millis,
) {
    let profile = agent.profile();
    let perceived = view.detect(id, body.position, profile.detection_radius);

    let me = ScoringSelf {
        size: body.diameter(),
        profile,
        alert: agent.alert,
    };
    let evaluation = scoring::evaluate(&me, &perceived, &agent.memory, &config.scoring);
    agent.memory.update(now, &evaluation.sightings, &config.memory);

    agent.alert = if agent.status.is_scared() {
        AlertLevel::Panic
    } else {
        AlertLevel::from_max_threat(evaluation.max_threat)
    };
    if let Some(threat) = evaluation.top_threat() {
        agent.current_threat = Some(threat.id);
    }

    if agent.behavior == BehaviorState::Guarding
        && now - agent.last_guard_check_ms >= config.behavior.guard_reevaluate_ms
    {
        agent.last_guard_check_ms = now;
        agent.force_decision();
    }

    if !agent.decision_due(now) {
        return;
    }

    let ctx = SelectionContext {
        role: agent.role,
        size: body.diameter(),
        behavior: agent.behavior,
        behavior_timer_ms: agent.behavior_timer_ms,
        stunned: agent.status.is_stunned(),
        scared: agent.status.is_scared(),
        has_territory: agent.has_territory(),
        player_recently_seen: agent
            .memory
            .player_seen_within(now, config.behavior.investigate_window_ms),
        top_threat: evaluation.top_threat(),
        top_opportunity: evaluation.top_opportunity(),
    };
    let decision = select_action(&ctx, &config.scoring, &config.behavior);
    trace!(entity = %id, ?decision, "decision");

    apply_decision(agent, decision, now);
    agent.last_decision_ms = Some(now);
    agent.stats.decisions_made += 1;
}

fn apply_decision(agent: &mut Agent, decision: Decision, now: Millis) {
    match decision {
        Decision::Flee(threat) => {
            agent.current_threat = Some(threat);
            agent.set_behavior(BehaviorState::Fleeing);
        }
        Decision::Chase(target) => {
            let already_hunting =
                agent.behavior == BehaviorState::Hunting && agent.primary_target == Some(target);
            agent.primary_target = Some(target);
            if !already_hunting {
                agent.set_behavior(BehaviorState::Chasing);
            }
        }
        other => {
            let next = other.behavior(agent.behavior);
            if agent.set_behavior(next).is_some() && next == BehaviorState::Guarding {
                agent.last_guard_check_ms = now;
            }
        }
    }
}
