use serde::{Deserialize, Serialize};

use crate::constants::frames_to_ms;
use crate::input::buffer::{DEFAULT_CAPACITY, DEFAULT_MAX_AGE_MS};

/// Per-match tuning for the simulation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub tick_rate: u32,
    /// Meter a victim gains per point of raw damage taken
    pub damage_taken_meter_rate: f32,
    /// Minimum meter before costed moves are considered
    pub super_threshold: u32,
    pub hitstop_frames: u32,
    /// Frames after hitstun before input is read again
    pub wakeup_lock_frames: u32,
    /// Per-second exponential decay of horizontal velocity without input
    pub velocity_decay_rate: f32,
    pub auto_face: bool,
    pub buffer_capacity: usize,
    pub buffer_max_age_ms: f64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60,
            damage_taken_meter_rate: 0.5,
            super_threshold: 100,
            hitstop_frames: 6,
            wakeup_lock_frames: 0,
            velocity_decay_rate: 10.0,
            auto_face: true,
            buffer_capacity: DEFAULT_CAPACITY,
            buffer_max_age_ms: DEFAULT_MAX_AGE_MS,
        }
    }
}

impl SimulationConfig {
    pub fn hitstop_ms(&self) -> f32 {
        frames_to_ms(self.hitstop_frames)
    }

    pub fn wakeup_lock_ms(&self) -> f32 {
        frames_to_ms(self.wakeup_lock_frames)
    }

    /// Nominal tick length in milliseconds
    pub fn tick_ms(&self) -> f32 {
        1000.0 / self.tick_rate.max(1) as f32
    }

    /// Meter a victim earns for taking `raw_damage`
    pub fn damage_taken_meter(&self, raw_damage: u32) -> u32 {
        (raw_damage as f32 * self.damage_taken_meter_rate.max(0.0)).floor() as u32
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
