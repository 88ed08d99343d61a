//! Centralized combat constants for the fight core.
//!
//! Rules that are fixed by the game design live here. Values a host may want
//! to tune per match (hitstop length, meter rates, buffer sizes) live in
//! [`crate::engine::SimulationConfig`] instead.

// =====================================================
// Timing
// =====================================================

/// Duration of one animation frame in milliseconds (60 fps).
pub const FRAME_MS: f32 = 1000.0 / 60.0;

/// Convert a frame count into milliseconds.
pub fn frames_to_ms(frames: u32) -> f32 {
    frames as f32 * FRAME_MS
}

/// Slack for comparing accumulated tick deltas against frame boundaries.
pub const TIME_EPSILON_MS: f32 = 1e-3;

// =====================================================
// Combo scaling
// =====================================================

/// Damage reduction per combo hit, in percent: scale = 100 - count * STEP
pub const COMBO_SCALE_STEP_PCT: u32 = 5;

/// Floor of the combo damage scale, in percent of raw damage
pub const COMBO_SCALE_FLOOR_PCT: u32 = 10;

/// Hit counts that raise a combo milestone
pub const COMBO_MILESTONES: [u32; 5] = [3, 5, 10, 15, 20];

/// Lower bound (inclusive) of the Great combo band
pub const COMBO_GREAT_MIN: u32 = 5;

/// Lower bound (inclusive) of the Awesome combo band
pub const COMBO_AWESOME_MIN: u32 = 10;

/// Lower bound (inclusive) of the Legendary combo band
pub const COMBO_LEGENDARY_MIN: u32 = 15;

/// Camera shake intensity at a milestone: min(BASE + count * STEP, MAX)
pub const MILESTONE_SHAKE_BASE: f32 = 0.05;
pub const MILESTONE_SHAKE_STEP: f32 = 0.01;
pub const MILESTONE_SHAKE_MAX: f32 = 0.2;

// =====================================================
// Super meter
// =====================================================

/// Number of discrete meter levels
pub const METER_LEVELS: u32 = 3;

/// Default meter capacity
pub const DEFAULT_MAX_METER: u32 = 300;

// =====================================================
// Moves
// =====================================================

/// Cancel window used when a move is flagged cancelable without a window
pub const DEFAULT_CANCEL_WINDOW_FRAMES: u32 = 6;

/// Horizontal speeds below this snap to zero while decaying
pub const VELOCITY_SNAP_EPSILON: f32 = 1.0;

// =====================================================
// Projectiles
// =====================================================

pub const PROJECTILE_SPEED: f32 = 600.0;
pub const PROJECTILE_LIFETIME_MS: f32 = 2000.0;
pub const PROJECTILE_SIZE: [f32; 2] = [20.0, 20.0];
pub const SUPER_PROJECTILE_SIZE: [f32; 2] = [48.0, 48.0];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frames_to_ms() {
        assert_eq!(frames_to_ms(0), 0.0);
        assert!((frames_to_ms(60) - 1000.0).abs() < 1e-3);
        assert!((frames_to_ms(3) - 50.0).abs() < 1e-3);
    }
}
