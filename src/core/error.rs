use thiserror::Error;

use crate::core::types::EntityId;
use crate::entity::archetype::Ability;

#[derive(Error, Debug)]
pub enum ArenaError {
    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Entity {0} is not an autonomous agent")]
    NotAnAgent(EntityId),

    #[error("Entity {0} is not a player")]
    NotAPlayer(EntityId),

    #[error("Ability {ability:?} unavailable for {entity}: {reason}")]
    AbilityUnavailable {
        entity: EntityId,
        ability: Ability,
        reason: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Serialization error: {0}")]
    SerdeError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ArenaError>;
