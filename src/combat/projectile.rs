//! Projectiles spawned by projectile moves at their active transition.
//!
//! Projectiles fly in a straight line without gravity, never hit their owner,
//! and retire after one hit or when their lifetime runs out.

use bevy::math::Vec2;

use crate::actor::ActorId;
use crate::constants::TIME_EPSILON_MS;
use crate::moves::{MoveDefinition, MoveKind};

use super::hitbox::{Aabb, HitPayload};

#[derive(Debug, Clone)]
pub struct Projectile {
    pub id: u64,
    pub owner: ActorId,
    pub kind: MoveKind,
    pub payload: HitPayload,
    pub position: Vec2,
    /// Units per second
    pub velocity: Vec2,
    pub size: Vec2,
    pub remaining_ms: f32,
    pub retired: bool,
}

impl Projectile {
    pub fn spawn(
        id: u64,
        owner: ActorId,
        def: &MoveDefinition,
        owner_position: Vec2,
        facing_right: bool,
    ) -> Self {
        let spec = def.projectile_spec();
        let sign = if facing_right { 1.0 } else { -1.0 };
        let offset = Vec2::new(def.hitbox.offset[0] * sign, def.hitbox.offset[1]);
        Self {
            id,
            owner,
            kind: def.kind,
            payload: HitPayload::from_move(def),
            position: owner_position + offset,
            velocity: Vec2::new(spec.speed * sign, 0.0),
            size: Vec2::from_array(spec.size),
            remaining_ms: spec.lifetime_ms,
            retired: false,
        }
    }

    /// Move along the flight path and age. Returns true once expired.
    pub fn advance(&mut self, dt_ms: f32) -> bool {
        self.position += self.velocity * (dt_ms / 1000.0);
        self.remaining_ms -= dt_ms;
        if self.remaining_ms <= TIME_EPSILON_MS {
            self.retired = true;
        }
        self.retired
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_center_size(self.position, self.size)
    }

    /// Horizontal travel direction, if moving
    pub fn direction(&self) -> Option<f32> {
        if self.velocity.x == 0.0 {
            None
        } else {
            Some(self.velocity.x.signum())
        }
    }
}
