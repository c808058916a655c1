//! Entity storage and the world that owns it

pub mod registry;
pub mod world;

pub use registry::Registry;
pub use world::{SpawnKind, World};
