//! Consumption - larger cells eat smaller overlapping entities

use tracing::trace;

use crate::core::config::FoodConfig;
use crate::entity::archetype::{matchup_modifier, Ability, PlayerClass};
use crate::entity::{Entity, EntityClass, EntityKind};
use crate::simulation::events::SimulationEvent;

/// What the eater needs to know about its prey
#[derive(Debug, Clone, Copy)]
struct Prey {
    class: EntityClass,
    diameter: f32,
    nutrition: Option<i32>,
    player_class: Option<PlayerClass>,
    shielded: bool,
}

impl Prey {
    fn of(entity: &Entity) -> Self {
        let (nutrition, player_class, shielded) = match &entity.kind {
            EntityKind::Food(food) => (Some(food.nutrition()), None, false),
            EntityKind::Player(player) => {
                (None, Some(player.class), player.has_active(Ability::Shield))
            }
            EntityKind::Bot(_) => (None, None, false),
        };
        Self {
            class: entity.kind.class(),
            diameter: entity.body.diameter(),
            nutrition,
            player_class,
            shielded,
        }
    }
}

/// Diameter change for `eater` consuming `prey`
fn growth_for(eater: &Entity, prey: &Prey, config: &FoodConfig) -> f32 {
    if let Some(nutrition) = prey.nutrition {
        return nutrition as f32 * config.food_growth;
    }
    let base = prey.diameter * config.cell_growth;
    match (eater.player().map(|p| p.class), prey.player_class) {
        (Some(attacker), Some(defender)) => base * matchup_modifier(attacker, defender),
        _ => base,
    }
}

fn can_eat(eater: &Entity, prey: &Entity, prey_info: &Prey, config: &FoodConfig) -> bool {
    prey.is_active()
        && !prey_info.shielded
        && eater.body.diameter() > prey_info.diameter * config.eat_ratio
        && eater.body.collides_with_rect(&prey.body)
        && eater.body.collides_with_circle(&prey.body)
}

/// Resolve every eat in slot order
///
/// Eaten entities are killed immediately, so each entity is consumed at most
/// once per tick and a consumed cell eats nothing afterwards.
pub fn resolve_consumption(entities: &mut [Entity], config: &FoodConfig) -> Vec<SimulationEvent> {
    let mut events = Vec::new();

    for i in 0..entities.len() {
        if !entities[i].is_active() || matches!(entities[i].kind, EntityKind::Food(_)) {
            continue;
        }

        for j in 0..entities.len() {
            if i == j {
                continue;
            }

            let prey = Prey::of(&entities[j]);
            if !entities[i].is_active() || !can_eat(&entities[i], &entities[j], &prey, config) {
                continue;
            }

            let growth = growth_for(&entities[i], &prey, config);
            let prey_id = entities[j].id;
            entities[j].body.kill();

            let eater = &mut entities[i];
            eater.body.increase_size(growth);
            if let Some(player) = eater.player_mut() {
                match prey.nutrition {
                    Some(nutrition) => {
                        player.food_eaten += 1;
                        player.score += nutrition.max(0) as u64;
                    }
                    None => {
                        player.cells_eaten += 1;
                        player.score += prey.diameter.round() as u64;
                    }
                }
            }

            trace!(eater = %eater.id, prey = %prey_id, growth, "consumed");
            events.push(SimulationEvent::Consumed {
                eater: eater.id,
                prey: prey_id,
                prey_class: prey.class,
                growth,
            });
        }
    }

    events
}
