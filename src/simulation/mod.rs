//! Simulation systems run once per tick

pub mod action_select;
pub mod behavior;
pub mod consumption;
pub mod events;
pub mod perception;
pub mod scoring;
pub mod tick;

pub use events::{EventDispatcher, EventHandler, EventQueue, SimulationEvent};
pub use tick::run_simulation_tick;
