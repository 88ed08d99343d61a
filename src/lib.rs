//! Stickfight - Combat Core Library
//!
//! Deterministic combat logic for a 2D stick-figure fighter:
//! - Input buffering and motion command matching
//! - Move catalogs (per-character frame data, overrides, RON/JSON loading)
//! - Actor state machine (startup/active/recovery, cancels, hitstun)
//! - Hit resolution with hitstop, combos and meter
//! - Bevy plugin wiring to rapier bodies
//! - Replays and a sparring bot

pub mod actor;
pub mod ai;
pub mod combat;
pub mod constants;
pub mod engine;
pub mod events;
pub mod input;
pub mod logging;
pub mod moves;
pub mod replay;

pub use actor::ActorId;
pub use engine::{Simulation, SimulationConfig, TimeStep};
pub use events::CombatEvent;
