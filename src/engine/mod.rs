//! Simulation driver and Bevy integration.
//!
//! [`Simulation`] is plain Rust and can be ticked directly (tests, replays,
//! benches). [`FightPlugin`] wraps it as a Bevy resource and connects it to
//! rapier bodies.

pub mod config;
pub mod plugin;
pub mod simulation;

pub use config::SimulationConfig;
pub use plugin::{
    spawn_fighter, FightEvent, FightPlugin, FightSet, FightSimulation, Fighter, FighterInput,
    GroundContact, TimeScale,
};
pub use simulation::{Simulation, TimeStep};
