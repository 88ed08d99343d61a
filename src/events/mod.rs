//! Observable combat events.
//!
//! The simulation returns the events of each tick in the order they happened.
//! Rendering, audio and UI consume them; the core never reads them back.

use serde::{Deserialize, Serialize};

use crate::actor::ActorId;
use crate::combat::ComboQuality;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CombatEvent {
    /// A move was committed (`cancel` when it interrupted a previous move)
    MoveStarted {
        actor: ActorId,
        move_id: String,
        cancel: bool,
    },
    /// Startup elapsed: the move's effect fired
    AttackStarted { actor: ActorId, move_id: String },
    ProjectileSpawned {
        actor: ActorId,
        move_id: String,
        projectile: u64,
    },
    HitLanded {
        attacker: ActorId,
        victim: ActorId,
        move_id: String,
        damage: u32,
        combo_count: u32,
        scale: f32,
        total_damage: u32,
        air_combo: bool,
    },
    ComboMilestone {
        actor: ActorId,
        count: u32,
        shake_intensity: f32,
    },
    ComboEnded {
        actor: ActorId,
        count: u32,
        total_damage: u32,
        quality: ComboQuality,
        air_combo: bool,
    },
    /// Hitstun ended
    ActorRecovered { actor: ActorId },
    /// Health reached zero
    ActorDefeated { actor: ActorId, by: Option<ActorId> },
}

impl CombatEvent {
    /// Actor the event is primarily about
    pub fn actor(&self) -> ActorId {
        match self {
            Self::MoveStarted { actor, .. }
            | Self::AttackStarted { actor, .. }
            | Self::ProjectileSpawned { actor, .. }
            | Self::ComboMilestone { actor, .. }
            | Self::ComboEnded { actor, .. }
            | Self::ActorRecovered { actor }
            | Self::ActorDefeated { actor, .. } => *actor,
            Self::HitLanded { attacker, .. } => *attacker,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::MoveStarted { .. } => "move_started",
            Self::AttackStarted { .. } => "attack_started",
            Self::ProjectileSpawned { .. } => "projectile_spawned",
            Self::HitLanded { .. } => "hit_landed",
            Self::ComboMilestone { .. } => "combo_milestone",
            Self::ComboEnded { .. } => "combo_ended",
            Self::ActorRecovered { .. } => "actor_recovered",
            Self::ActorDefeated { .. } => "actor_defeated",
        }
    }
}
