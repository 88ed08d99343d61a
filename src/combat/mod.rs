use serde::{Deserialize, Serialize};

pub mod combo;
pub mod hitbox;
pub mod hitstop;
pub mod meter;
pub mod projectile;

pub use combo::{ComboQuality, ComboRecord, ComboSummary, ComboTracker, HitOutcome};
pub use hitbox::{Aabb, AttackWindow, HitPayload, WindowId};
pub use hitstop::HitstopController;
pub use meter::ResourceMeter;
pub use projectile::Projectile;

/// Phase of a committed move's timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovePhase {
    Startup,  // no hitbox yet, cancels here never produce an effect
    Active,   // attack window open / projectile launched
    Recovery, // vulnerable, cancelable only inside the cancel window
}

impl MovePhase {
    /// Phase for an elapsed time, given the phase boundaries in ms
    pub fn at(elapsed_ms: f32, startup_ms: f32, active_end_ms: f32) -> Self {
        if elapsed_ms < startup_ms {
            Self::Startup
        } else if elapsed_ms < active_end_ms {
            Self::Active
        } else {
            Self::Recovery
        }
    }
}
