//! Attack windows and the axis-aligned boxes they are tested with.
//!
//! A window is opened when a melee move reaches its active phase. It follows
//! its owner every tick, can land at most one hit, and retires when it hits,
//! when its active duration runs out, or when the owning move is interrupted.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::actor::ActorId;
use crate::constants::TIME_EPSILON_MS;
use crate::moves::{HitboxSpec, MoveDefinition};

/// Axis-aligned box stored as center + half extents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub center: Vec2,
    pub half: Vec2,
}

impl Aabb {
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        Self {
            center,
            half: size.abs() * 0.5,
        }
    }

    pub fn min(&self) -> Vec2 {
        self.center - self.half
    }

    pub fn max(&self) -> Vec2 {
        self.center + self.half
    }

    /// Strict overlap; boxes that only touch along an edge do not overlap.
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let d = (self.center - other.center).abs();
        d.x < self.half.x + other.half.x && d.y < self.half.y + other.half.y
    }
}

/// What a connecting hit delivers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HitPayload {
    pub move_id: String,
    pub damage: u32,
    pub stun_frames: u32,
    /// Knockback with x pointing along the attacker's facing
    pub knockback: [f32; 2],
    pub meter_gain: u32,
}

impl HitPayload {
    pub fn from_move(def: &MoveDefinition) -> Self {
        Self {
            move_id: def.id.clone(),
            damage: def.damage,
            stun_frames: def.stun,
            knockback: def.knockback,
            meter_gain: def.meter_gain,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct WindowId(pub u64);

/// Melee hit window attached to its owner
#[derive(Debug, Clone)]
pub struct AttackWindow {
    pub id: WindowId,
    pub owner: ActorId,
    /// Move instance that opened the window; a cancel or hitstun changes the
    /// owner's instance and retires the window
    pub move_instance: u64,
    pub payload: HitPayload,
    pub spec: HitboxSpec,
    pub bounds: Aabb,
    pub remaining_ms: f32,
    pub retired: bool,
}

impl AttackWindow {
    pub fn open(
        id: WindowId,
        owner: ActorId,
        move_instance: u64,
        def: &MoveDefinition,
        owner_position: Vec2,
        facing_right: bool,
    ) -> Self {
        let mut window = Self {
            id,
            owner,
            move_instance,
            payload: HitPayload::from_move(def),
            spec: def.hitbox,
            bounds: Aabb::from_center_size(owner_position, Vec2::ZERO),
            remaining_ms: def.active_ms(),
            retired: false,
        };
        window.track(owner_position, facing_right);
        window
    }

    /// Re-anchor on the owner, mirroring the offset for facing.
    pub fn track(&mut self, owner_position: Vec2, facing_right: bool) {
        let sign = if facing_right { 1.0 } else { -1.0 };
        let offset = Vec2::new(self.spec.offset[0] * sign, self.spec.offset[1]);
        self.bounds = Aabb::from_center_size(
            owner_position + offset,
            Vec2::from_array(self.spec.size),
        );
    }

    /// Advance the lifetime. Returns true once the window has expired.
    pub fn tick(&mut self, dt_ms: f32) -> bool {
        self.remaining_ms -= dt_ms;
        if self.remaining_ms <= TIME_EPSILON_MS {
            self.retired = true;
        }
        self.retired
    }
}
