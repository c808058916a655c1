//! Agar Arena - real-time arena of growing cells and autonomous bots
//!
//! The crate covers the entity kinematic model and the bot decision engine
//! (perception, memory, threat/opportunity scoring and the behavior state
//! machine). Rendering, input and persistence are left to collaborators that
//! read snapshots and push commands through [`ecs::World`].

pub mod core;
pub mod ecs;
pub mod entity;
pub mod simulation;
pub mod spatial;

pub use crate::core::{ArenaError, EntityId, Result, SimulationConfig, Vec2};
pub use crate::ecs::{SpawnKind, World};
pub use crate::simulation::SimulationEvent;
