//! Fighters and their combat state.
//!
//! An [`Actor`] owns its logical state only: health, meter, move timeline,
//! stun and its command buffer. Position, velocity and ground contact are a
//! mirror of the physics body ([`BodyState`]) pushed in by the host each tick.
//! The actor answers with a [`VelocityIntent`] and never writes a position.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};

use crate::combat::hitbox::Aabb;
use crate::combat::{MovePhase, ResourceMeter};
use crate::input::CommandBuffer;
use crate::moves::{
    CharacterDefinition, CharacterStats, MoveCatalog, MoveDefinition, MoveOverrides, SpecialInput,
};

mod movement;
pub mod state_machine;

pub use state_machine::{ActorEffect, Rejection, StepContext, StepOutput};

/// Non-owning handle to an actor inside a simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ActorId(pub u32);

/// Observable lifecycle state. Airborne is not a state; see [`BodyState::grounded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LifecycleState {
    Idle,
    Moving,
    Attacking(MovePhase),
    Hitstun,
    /// Dummy actor: no input processed, still hittable
    Inactive,
}

/// Whether an actor reads its input snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ControlMode {
    #[default]
    Player,
    Dummy,
}

/// Physics body mirror, refreshed by the host before each tick
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BodyState {
    pub position: Vec2,
    pub velocity: Vec2,
    pub grounded: bool,
}

/// Desired velocity per axis; `None` leaves the axis to the physics integrator
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct VelocityIntent {
    pub x: Option<f32>,
    pub y: Option<f32>,
}

impl VelocityIntent {
    pub const HOLD: Self = Self {
        x: Some(0.0),
        y: Some(0.0),
    };

    pub fn is_empty(&self) -> bool {
        self.x.is_none() && self.y.is_none()
    }
}

/// The committed move and where it is on its timeline
#[derive(Debug, Clone)]
pub struct ActiveMove {
    pub def: MoveDefinition,
    pub instance: u64,
    pub elapsed_ms: f32,
    pub phase: MovePhase,
    pub effect_fired: bool,
}

#[derive(Debug, Clone)]
pub struct Actor {
    pub(crate) id: ActorId,
    pub(crate) name: String,
    pub(crate) facing_right: bool,
    pub(crate) health: u32,
    pub(crate) stats: CharacterStats,
    pub(crate) meter: ResourceMeter,
    pub(crate) catalog: MoveCatalog,
    pub(crate) specials: Vec<SpecialInput>,
    pub(crate) neutral_special: Option<String>,
    pub(crate) buffer: CommandBuffer,
    pub(crate) state: LifecycleState,
    pub(crate) control: ControlMode,
    pub(crate) current: Option<ActiveMove>,
    pub(crate) stun_remaining_ms: f32,
    pub(crate) recovery_lock_ms: f32,
    pub(crate) last_attacker: Option<ActorId>,
    pub(crate) control_factor: f32,
    pub(crate) body: BodyState,
    pub(crate) intent: VelocityIntent,
    pub(crate) frozen_velocity: Option<Vec2>,
    pub(crate) next_instance: u64,
    pub(crate) defeated: bool,
}

impl Actor {
    /// Build an actor with its own normalized copy of the character's moves.
    pub fn new(
        id: ActorId,
        def: &CharacterDefinition,
        overrides: &MoveOverrides,
        buffer: CommandBuffer,
    ) -> Self {
        let mut catalog = def.catalog().normalized();
        catalog.apply_overrides(overrides);
        Self {
            id,
            name: def.name.clone(),
            facing_right: true,
            health: def.stats.max_health,
            stats: def.stats,
            meter: ResourceMeter::new(def.stats.max_meter),
            catalog,
            specials: def.specials.clone(),
            neutral_special: def.neutral_special.clone(),
            buffer,
            state: LifecycleState::Idle,
            control: ControlMode::Player,
            current: None,
            stun_remaining_ms: 0.0,
            recovery_lock_ms: 0.0,
            last_attacker: None,
            control_factor: 1.0,
            body: BodyState {
                grounded: true,
                ..Default::default()
            },
            intent: VelocityIntent::default(),
            frozen_velocity: None,
            next_instance: 1,
            defeated: false,
        }
    }

    pub fn id(&self) -> ActorId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn facing_right(&self) -> bool {
        self.facing_right
    }

    pub fn facing_sign(&self) -> f32 {
        if self.facing_right {
            1.0
        } else {
            -1.0
        }
    }

    pub fn health(&self) -> u32 {
        self.health
    }

    pub fn max_health(&self) -> u32 {
        self.stats.max_health
    }

    pub fn stats(&self) -> &CharacterStats {
        &self.stats
    }

    pub fn meter(&self) -> &ResourceMeter {
        &self.meter
    }

    pub fn catalog(&self) -> &MoveCatalog {
        &self.catalog
    }

    /// Motion specials this actor can perform, in priority order
    pub fn specials(&self) -> &[SpecialInput] {
        &self.specials
    }

    pub fn buffer(&self) -> &CommandBuffer {
        &self.buffer
    }

    pub fn control_mode(&self) -> ControlMode {
        self.control
    }

    /// Lifecycle state as seen from outside; dummies report `Inactive` unless stunned
    pub fn state(&self) -> LifecycleState {
        match (self.control, self.state) {
            (ControlMode::Dummy, LifecycleState::Idle | LifecycleState::Moving) => {
                LifecycleState::Inactive
            }
            (_, state) => state,
        }
    }

    pub fn current_move(&self) -> Option<&ActiveMove> {
        self.current.as_ref()
    }

    pub fn current_move_id(&self) -> Option<&str> {
        self.current.as_ref().map(|m| m.def.id.as_str())
    }

    /// Instance number of the committed move, used to tie hit windows to it
    pub fn move_instance(&self) -> Option<u64> {
        self.current.as_ref().map(|m| m.instance)
    }

    pub fn is_stunned(&self) -> bool {
        self.state == LifecycleState::Hitstun
    }

    pub fn stun_remaining_ms(&self) -> f32 {
        self.stun_remaining_ms
    }

    pub fn recovery_lock_ms(&self) -> f32 {
        self.recovery_lock_ms
    }

    pub fn last_attacker(&self) -> Option<ActorId> {
        self.last_attacker
    }

    pub fn control_factor(&self) -> f32 {
        self.control_factor
    }

    pub fn body(&self) -> &BodyState {
        &self.body
    }

    pub fn position(&self) -> Vec2 {
        self.body.position
    }

    pub fn is_airborne(&self) -> bool {
        !self.body.grounded
    }

    pub fn intent(&self) -> VelocityIntent {
        self.intent
    }

    pub fn is_defeated(&self) -> bool {
        self.defeated
    }

    pub fn hurtbox(&self) -> Aabb {
        Aabb::from_center_size(self.body.position, Vec2::from_array(self.stats.hurtbox))
    }

    pub fn set_facing(&mut self, facing_right: bool) {
        self.facing_right = facing_right;
    }

    pub fn set_control_mode(&mut self, mode: ControlMode) {
        self.control = mode;
    }

    /// Refresh the physics mirror. Called by the host before each tick.
    pub fn sync_body(&mut self, body: BodyState) {
        self.body = body;
    }

    /// Meter gain from outside the hit pipeline (round start bonuses, training mode)
    pub fn gain_meter(&mut self, amount: u32) {
        self.meter.gain(amount);
    }

    pub(crate) fn begin_freeze(&mut self) {
        if self.frozen_velocity.is_none() {
            self.frozen_velocity = Some(self.body.velocity);
        }
        self.body.velocity = Vec2::ZERO;
        self.intent = VelocityIntent::HOLD;
    }

    pub(crate) fn hold_frozen(&mut self) {
        self.body.velocity = Vec2::ZERO;
        self.intent = VelocityIntent::HOLD;
    }

    /// Restore the stashed velocity to the body mirror and hand it back so
    /// the host can re-issue it after this tick's step.
    pub(crate) fn end_freeze(&mut self) -> Option<Vec2> {
        let v = self.frozen_velocity.take()?;
        self.body.velocity = v;
        Some(v)
    }

    /// Re-issue a released velocity on every axis the step left uncommanded.
    pub(crate) fn resume_velocity(&mut self, v: Vec2) {
        self.intent.x.get_or_insert(v.x);
        self.intent.y.get_or_insert(v.y);
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen_velocity.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::roster;

    fn alpha() -> Actor {
        Actor::new(
            ActorId(1),
            &roster::alpha(),
            &MoveOverrides::default(),
            CommandBuffer::default(),
        )
    }

    #[test]
    fn test_new_actor_defaults() {
        let actor = alpha();
        assert_eq!(actor.health(), 1000);
        assert_eq!(actor.meter().value(), 0);
        assert_eq!(actor.state(), LifecycleState::Idle);
        assert!(actor.current_move().is_none());
        assert!(!actor.is_airborne());
        assert_eq!(actor.catalog().get("light").unwrap().cancelable, Some(true));
    }

    #[test]
    fn test_dummy_reports_inactive() {
        let mut actor = alpha();
        actor.set_control_mode(ControlMode::Dummy);
        assert_eq!(actor.state(), LifecycleState::Inactive);
        actor.state = LifecycleState::Hitstun;
        assert_eq!(actor.state(), LifecycleState::Hitstun);
    }

    #[test]
    fn test_freeze_stashes_velocity() {
        let mut actor = alpha();
        actor.body.velocity = Vec2::new(200.0, 50.0);
        actor.begin_freeze();
        assert!(actor.is_frozen());
        assert_eq!(actor.intent(), VelocityIntent::HOLD);
        actor.begin_freeze();
        let released = actor.end_freeze();
        assert_eq!(released, Some(Vec2::new(200.0, 50.0)));
        assert!(!actor.is_frozen());
        assert_eq!(actor.body().velocity, Vec2::new(200.0, 50.0));

        actor.intent = VelocityIntent {
            x: Some(10.0),
            y: None,
        };
        actor.resume_velocity(Vec2::new(200.0, 50.0));
        assert_eq!(actor.intent().x, Some(10.0));
        assert_eq!(actor.intent().y, Some(50.0));
        assert_eq!(actor.end_freeze(), None);
    }

    #[test]
    fn test_overrides_apply_to_copy_only() {
        let def = roster::alpha();
        let actor = Actor::new(
            ActorId(1),
            &def,
            &MoveOverrides {
                move_control_factor: Some(0.6),
                force_lock_movement: false,
            },
            CommandBuffer::default(),
        );
        assert_eq!(actor.catalog().get("light").unwrap().control_factor(), 0.6);
        assert_eq!(def.moves[0].move_control_factor, Some(0.5));
    }

    #[test]
    fn test_hurtbox_centered_on_body() {
        let mut actor = alpha();
        actor.sync_body(BodyState {
            position: Vec2::new(100.0, 50.0),
            velocity: Vec2::ZERO,
            grounded: true,
        });
        let hurtbox = actor.hurtbox();
        assert_eq!(hurtbox.min(), Vec2::new(75.0, 0.0));
        assert_eq!(hurtbox.max(), Vec2::new(125.0, 100.0));
    }
}
