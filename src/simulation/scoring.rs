//! Threat and opportunity scoring of perceived entities

use std::cmp::Reverse;

use ordered_float::OrderedFloat;

use crate::core::config::ScoringConfig;
use crate::core::types::{EntityId, Vec2};
use crate::entity::agent::AlertLevel;
use crate::entity::archetype::RoleProfile;
use crate::entity::memory::{EntityMemory, Sighting};
use crate::entity::{EntityClass, EntitySnapshot};
use crate::simulation::perception::Perceived;

const SIZE_THREAT_SCALE: f32 = 50.0;
const PROXIMITY_THREAT_SCALE: f32 = 30.0;
const ABILITY_THREAT: f32 = 20.0;
const MEMORY_THREAT_WEIGHT: f32 = 0.5;

/// The scoring agent's own numbers
#[derive(Debug, Clone, Copy)]
pub struct ScoringSelf {
    pub size: f32,
    pub profile: RoleProfile,
    pub alert: AlertLevel,
}

/// Threat posed by a perceived entity; only players are potential threats
pub fn threat_score(
    me: &ScoringSelf,
    other: &EntitySnapshot,
    distance: f32,
    remembered_threat: f32,
) -> f32 {
    if other.kind != EntityClass::Player {
        return 0.0;
    }

    let size_threat = ((other.size / me.size - 1.0) * SIZE_THREAT_SCALE).max(0.0);

    let radius = me.profile.threat_detection_radius;
    let proximity_threat = if radius > 0.0 {
        ((radius - distance) / radius * PROXIMITY_THREAT_SCALE).max(0.0)
    } else {
        0.0
    };

    let state_threat = if other.ability_active { ABILITY_THREAT } else { 0.0 };
    let memory_threat = MEMORY_THREAT_WEIGHT * remembered_threat;

    let role_mod = me.profile.aggression_multiplier * me.alert.reaction_multiplier();
    (size_threat + proximity_threat + state_threat + memory_threat) * role_mod
}

/// Value of eating a perceived entity
pub fn opportunity_score(my_size: f32, other: &EntitySnapshot, config: &ScoringConfig) -> f32 {
    let ratio = my_size / other.size;
    match other.kind {
        EntityClass::Food => config.food_opportunity,
        EntityClass::Bot if ratio > config.bot_size_advantage => {
            config.bot_opportunity_scale * ratio
        }
        EntityClass::Player if ratio > config.player_size_advantage => {
            config.player_opportunity_scale * ratio
        }
        _ => 0.0,
    }
}

/// One perceived entity with both scores
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub id: EntityId,
    pub position: Vec2,
    pub size: f32,
    pub distance: f32,
    pub class: EntityClass,
    pub threat: f32,
    pub opportunity: f32,
}

impl Assessment {
    fn priority(&self) -> OrderedFloat<f32> {
        OrderedFloat(self.threat.max(self.opportunity))
    }
}

/// Scored and classified perception for one agent tick
#[derive(Debug, Clone, Default)]
pub struct Evaluation {
    /// Descending by score
    pub threats: Vec<Assessment>,
    /// Descending by score
    pub opportunities: Vec<Assessment>,
    /// Highest threat score among everything perceived
    pub max_threat: f32,
    /// Memory input; players carry their threat score
    pub sightings: Vec<Sighting>,
}

impl Evaluation {
    pub fn top_threat(&self) -> Option<&Assessment> {
        self.threats.first()
    }

    pub fn top_opportunity(&self) -> Option<&Assessment> {
        self.opportunities.first()
    }
}

/// Score every perceived entity and split into threats and opportunities
///
/// An entity is a threat when its threat score exceeds the threshold,
/// otherwise an opportunity when its opportunity score does.
pub fn evaluate(
    me: &ScoringSelf,
    perceived: &[Perceived<'_>],
    memory: &EntityMemory,
    config: &ScoringConfig,
) -> Evaluation {
    let mut evaluation = Evaluation::default();

    for p in perceived {
        let other = p.entity;
        let assessment = Assessment {
            id: other.id,
            position: other.position,
            size: other.size,
            distance: p.distance,
            class: other.kind,
            threat: threat_score(me, other, p.distance, memory.threat_level(other.id)),
            opportunity: opportunity_score(me.size, other, config),
        };

        evaluation.max_threat = evaluation.max_threat.max(assessment.threat);
        let is_player = other.is_player();
        evaluation.sightings.push(Sighting {
            entity: other.id,
            position: other.position,
            is_player,
            threat_score: is_player.then_some(assessment.threat),
        });

        if assessment.threat > config.threat_threshold {
            evaluation.threats.push(assessment);
        } else if assessment.opportunity > config.opportunity_threshold {
            evaluation.opportunities.push(assessment);
        }
    }

    evaluation.threats.sort_by_key(|a| Reverse(a.priority()));
    evaluation.opportunities.sort_by_key(|a| Reverse(a.priority()));
    evaluation
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::archetype::BotRole;

    fn snapshot(id: u64, kind: EntityClass, size: f32) -> EntitySnapshot {
        EntitySnapshot {
            id: EntityId(id),
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            size,
            active: true,
            visible: true,
            kind,
            behavior: None,
            alert: None,
            role: None,
            ability_active: false,
        }
    }

    fn tank(size: f32) -> ScoringSelf {
        ScoringSelf {
            size,
            profile: BotRole::Tank.profile(),
            alert: AlertLevel::Calm,
        }
    }

    #[test]
    fn test_tank_threat_reference_value() {
        let player = snapshot(1, EntityClass::Player, 84.0);
        let score = threat_score(&tank(42.0), &player, 100.0, 0.0);
        assert!((score - 37.8).abs() < 1e-3, "score {}", score);
    }

    #[test]
    fn test_state_and_memory_threat_add_up() {
        let mut player = snapshot(1, EntityClass::Player, 42.0);
        player.ability_active = true;
        // (0 + 0 + 20 + 0.5 * 10) * 0.54
        let score = threat_score(&tank(42.0), &player, 300.0, 10.0);
        assert!((score - 13.5).abs() < 1e-3, "score {}", score);
    }

    #[test]
    fn test_non_players_pose_no_threat() {
        let bot = snapshot(1, EntityClass::Bot, 500.0);
        assert_eq!(threat_score(&tank(10.0), &bot, 1.0, 50.0), 0.0);
    }

    #[test]
    fn test_opportunity_gating() {
        let config = ScoringConfig::default();
        let prey = snapshot(1, EntityClass::Bot, 20.0);
        assert!((opportunity_score(40.0, &prey, &config) - 50.0).abs() < 1e-4);
        assert_eq!(opportunity_score(24.0, &prey, &config), 0.0);

        let food = snapshot(2, EntityClass::Food, 10.0);
        assert_eq!(opportunity_score(5.0, &food, &config), 20.0);

        let player = snapshot(3, EntityClass::Player, 20.0);
        assert!((opportunity_score(28.0, &player, &config) - 42.0).abs() < 1e-4);
    }

    #[test]
    fn test_evaluate_classifies_and_sorts() {
        let config = ScoringConfig::default();
        let entities = vec![
            snapshot(1, EntityClass::Food, 10.0),
            snapshot(2, EntityClass::Bot, 10.0),
            snapshot(3, EntityClass::Bot, 35.0),
            snapshot(4, EntityClass::Player, 84.0),
        ];
        let perceived: Vec<_> = entities
            .iter()
            .map(|e| Perceived {
                entity: e,
                distance: 100.0,
            })
            .collect();

        let evaluation = evaluate(&tank(42.0), &perceived, &EntityMemory::new(), &config);

        assert_eq!(evaluation.threats.len(), 1);
        assert_eq!(evaluation.threats[0].id, EntityId(4));
        assert!((evaluation.max_threat - 37.8).abs() < 1e-3);
        assert_eq!(evaluation.sightings.len(), 4);
        assert!(evaluation.sightings[3].threat_score.is_some());
        assert!(evaluation.sightings[0].threat_score.is_none());

        // bot 42/10 = 4.2 -> 105 ranks above food 20; bot at 1.2x is ignored
        let ids: Vec<_> = evaluation.opportunities.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![EntityId(2), EntityId(1)]);
    }
}
