//! Behavior executor - per-state steering for one agent tick
//!
//! Steering only sets velocity. Integration, bound keeping and consumption
//! happen afterwards in the tick, for every entity at once. Exit transitions
//! (target lost, timeout) are applied here; entry transitions come from
//! action selection.

use rand::Rng;

use crate::core::config::{ArenaConfig, BehaviorConfig};
use crate::core::types::{Millis, Vec2};
use crate::entity::agent::{Agent, BehaviorState, Waypoint};
use crate::entity::body::Body;
use crate::simulation::perception::WorldView;

pub struct BehaviorContext<'v, 'a> {
    pub view: &'v WorldView<'a>,
    pub behavior: &'v BehaviorConfig,
    pub arena: &'v ArenaConfig,
    pub now: Millis,
}

/// Steer `body` according to the agent's current behavior
pub fn execute(agent: &mut Agent, body: &mut Body, ctx: &BehaviorContext<'_, '_>) {
    match agent.behavior {
        BehaviorState::Wandering => wander(agent, body, ctx),
        BehaviorState::Chasing | BehaviorState::Hunting => pursue(agent, body, ctx),
        BehaviorState::Fleeing => flee(agent, body, ctx),
        BehaviorState::Guarding => guard(agent, body, ctx),
        BehaviorState::Investigating => investigate(agent, body, ctx),
        BehaviorState::Stunned => body.apply_friction(ctx.behavior.stun_friction),
    }
}

fn clamp_to_margins(point: Vec2, arena: &ArenaConfig) -> Vec2 {
    Vec2::new(
        point.x.clamp(arena.margin, arena.width - arena.margin),
        point.y.clamp(arena.margin, arena.height - arena.margin),
    )
}

fn waypoint_expired(agent: &Agent) -> bool {
    agent
        .waypoint
        .map_or(true, |w| agent.behavior_timer_ms >= w.expires_at_ms)
}

fn wander(agent: &mut Agent, body: &mut Body, ctx: &BehaviorContext<'_, '_>) {
    let cfg = ctx.behavior;

    let arrived = agent
        .waypoint
        .is_some_and(|w| body.position.distance(&w.position) < cfg.arrival_distance);
    if arrived {
        agent.waypoint = None;
    }

    if waypoint_expired(agent) {
        let rng = agent.rng();
        let angle = rng.gen_range(0.0..std::f32::consts::TAU);
        let reach = rng.gen_range(0.0..=cfg.wander_radius);
        let duration = rng.gen_range(cfg.wander_duration_min_ms..=cfg.wander_duration_max_ms);

        let target = body.position + Vec2::from_angle(angle) * reach;
        agent.waypoint = Some(Waypoint {
            position: clamp_to_margins(target, ctx.arena),
            expires_at_ms: agent.behavior_timer_ms + duration,
        });
    }

    if let Some(waypoint) = agent.waypoint {
        body.move_towards(waypoint.position, body.max_speed * cfg.wander_speed_factor);
    }
}

/// Shared by Chasing and Hunting
fn pursue(agent: &mut Agent, body: &mut Body, ctx: &BehaviorContext<'_, '_>) {
    let cfg = ctx.behavior;
    let profile = agent.profile();

    let target = agent.primary_target.and_then(|id| ctx.view.get(id));
    let Some(target) = target else {
        agent.primary_target = None;
        agent.set_behavior(BehaviorState::Wandering);
        return;
    };

    let distance = body.position.distance(&target.position);
    if distance > profile.detection_radius * cfg.abandon_range_factor {
        agent.primary_target = None;
        agent.set_behavior(BehaviorState::Wandering);
        return;
    }

    if agent.behavior == BehaviorState::Chasing && distance <= profile.aggro_range {
        agent.set_behavior(BehaviorState::Hunting);
    }

    let predicted = target.position + target.velocity * cfg.chase_prediction_steps;
    body.move_towards(predicted, body.max_speed);

    if agent.behavior == BehaviorState::Hunting && distance < cfg.hunt_slowdown_range {
        body.apply_friction(cfg.hunt_slowdown);
    }
}

fn flee(agent: &mut Agent, body: &mut Body, ctx: &BehaviorContext<'_, '_>) {
    let cfg = ctx.behavior;
    let profile = agent.profile();

    let threat = agent.current_threat.and_then(|id| ctx.view.get(id));
    let Some(threat) = threat else {
        agent.current_threat = None;
        agent.set_behavior(BehaviorState::Wandering);
        return;
    };

    let distance = body.position.distance(&threat.position);
    if distance > profile.threat_detection_radius * cfg.abandon_range_factor {
        agent.current_threat = None;
        agent.set_behavior(BehaviorState::Wandering);
        return;
    }

    let mut away = (body.position - threat.position).normalize();
    if away == Vec2::ZERO {
        // Exactly on top of the threat: any direction will do
        away = Vec2::from_angle(agent.rng().gen_range(0.0..std::f32::consts::TAU));
    }
    let escape = body.position + away * (profile.aggro_range * 2.0);
    body.move_towards(escape, body.max_speed * cfg.flee_speed_factor);
}

fn guard(agent: &mut Agent, body: &mut Body, ctx: &BehaviorContext<'_, '_>) {
    let cfg = ctx.behavior;

    let arrived = agent
        .waypoint
        .is_some_and(|w| body.position.distance(&w.position) < cfg.arrival_distance);

    if arrived || waypoint_expired(agent) {
        let angle = agent.rng().gen_range(0.0..std::f32::consts::TAU);
        let point = body.position + Vec2::from_angle(angle) * cfg.patrol_radius;
        agent.waypoint = Some(Waypoint {
            position: clamp_to_margins(point, ctx.arena),
            expires_at_ms: agent.behavior_timer_ms + cfg.patrol_retarget_ms,
        });
    }

    if let Some(waypoint) = agent.waypoint {
        body.move_towards(waypoint.position, body.max_speed * cfg.guard_speed_factor);
    }
}

fn investigate(agent: &mut Agent, body: &mut Body, ctx: &BehaviorContext<'_, '_>) {
    let cfg = ctx.behavior;

    if agent.behavior_timer_ms >= cfg.investigate_timeout_ms {
        agent.set_behavior(BehaviorState::Wandering);
        return;
    }

    let lead = agent
        .memory
        .last_seen_player()
        .filter(|&(_, seen)| ctx.now - seen <= cfg.investigate_window_ms)
        .and_then(|(player, _)| agent.memory.last_known_position(player));

    match lead {
        Some(position) => {
            if body.position.distance(&position) >= cfg.arrival_distance {
                body.move_towards(position, body.max_speed * cfg.investigate_speed_factor);
            }
        }
        // Nothing to follow up on: roam until the timeout
        None => wander(agent, body, ctx),
    }
}
