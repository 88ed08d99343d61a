//! Horizontal control, jumping and facing.
//!
//! Idle actors walk at full speed. A committed move scales walking by its
//! control factor; locked moves issue no horizontal command at all, so the
//! physics body keeps whatever velocity the move gave it.

use crate::constants::VELOCITY_SNAP_EPSILON;
use crate::input::InputSnapshot;

use super::{Actor, LifecycleState, StepContext};

impl Actor {
    pub(super) fn apply_movement(&mut self, input: &InputSnapshot, ctx: &StepContext<'_>) {
        let axis = input.horizontal() as f32;
        let walk = self.stats.walk_speed;

        match &self.current {
            Some(current) => {
                if !current.def.lock_movement {
                    if axis != 0.0 {
                        self.command_x(axis * walk * self.control_factor);
                    } else {
                        self.decay_x(ctx);
                    }
                }
            }
            None => {
                self.command_x(axis * walk);
                self.state = if axis != 0.0 {
                    LifecycleState::Moving
                } else {
                    LifecycleState::Idle
                };
            }
        }

        let jump_ok = self
            .current
            .as_ref()
            .map_or(true, |current| current.def.jump_allowed());
        if input.up && self.body.grounded && jump_ok {
            self.intent.y = Some(self.stats.jump_force);
            self.body.velocity.y = self.stats.jump_force;
            self.body.grounded = false;
        }
    }

    /// Turn toward the nearest opponent while free and grounded; without an
    /// opponent, face the held direction.
    pub(super) fn update_facing(&mut self, input: &InputSnapshot, ctx: &StepContext<'_>) {
        if !ctx.config.auto_face || self.current.is_some() || !self.body.grounded {
            return;
        }
        match ctx.opponent_x {
            Some(x) if (x - self.body.position.x).abs() > f32::EPSILON => {
                self.facing_right = x > self.body.position.x;
            }
            Some(_) => {}
            None => match input.horizontal() {
                1 => self.facing_right = true,
                -1 => self.facing_right = false,
                _ => {}
            },
        }
    }

    fn command_x(&mut self, vx: f32) {
        self.intent.x = Some(vx);
        self.body.velocity.x = vx;
    }

    /// Exponential slide toward rest, snapping to zero near it
    fn decay_x(&mut self, ctx: &StepContext<'_>) {
        let vx = self.body.velocity.x;
        if vx == 0.0 {
            return;
        }
        let decayed = vx * (-ctx.config.velocity_decay_rate * ctx.dt_ms / 1000.0).exp();
        if decayed.abs() < VELOCITY_SNAP_EPSILON {
            self.command_x(0.0);
        } else {
            self.command_x(decayed);
        }
    }
}

#[cfg(test)]
mod tests {
    use bevy::math::Vec2;

    use crate::actor::{ActorId, BodyState, StepOutput};
    use crate::constants::FRAME_MS;
    use crate::engine::SimulationConfig;
    use crate::input::{Button, CommandBuffer, CommandRegistry};
    use crate::moves::{roster, MoveOverrides};

    use super::*;

    fn actor(overrides: MoveOverrides) -> Actor {
        Actor::new(ActorId(1), &roster::alpha(), &overrides, CommandBuffer::default())
    }

    fn step(actor: &mut Actor, input: InputSnapshot, opponent_x: Option<f32>) -> StepOutput {
        let registry = CommandRegistry::standard();
        let config = SimulationConfig::default();
        let ctx = StepContext {
            dt_ms: FRAME_MS,
            now_ms: 0.0,
            registry: &registry,
            config: &config,
            opponent_x,
        };
        let mut out = StepOutput::default();
        actor.step(&input, &ctx, &mut out);
        out
    }

    fn right() -> InputSnapshot {
        InputSnapshot {
            right: true,
            ..Default::default()
        }
    }

    #[test]
    fn test_walk_full_speed_when_idle() {
        let mut a = actor(MoveOverrides::default());
        step(&mut a, right(), None);
        assert_eq!(a.intent().x, Some(300.0));
        assert_eq!(a.state(), LifecycleState::Moving);

        step(&mut a, InputSnapshot::default(), None);
        assert_eq!(a.intent().x, Some(0.0));
        assert_eq!(a.state(), LifecycleState::Idle);
    }

    #[test]
    fn test_partial_control_during_move() {
        let mut a = actor(MoveOverrides::default());
        step(&mut a, InputSnapshot::default().with_button(Button::Light), None);
        step(&mut a, right(), None);
        // light carries a 0.5 control factor
        assert_eq!(a.intent().x, Some(300.0 * 0.5));
    }

    #[test]
    fn test_locked_move_issues_no_horizontal_command() {
        let mut a = actor(MoveOverrides {
            move_control_factor: None,
            force_lock_movement: true,
        });
        a.sync_body(BodyState {
            position: Vec2::ZERO,
            velocity: Vec2::new(123.0, 0.0),
            grounded: true,
        });
        step(&mut a, InputSnapshot::default().with_button(Button::Light), None);
        step(&mut a, right(), None);
        assert_eq!(a.intent().x, None);
        assert_eq!(a.body().velocity.x, 123.0);
    }

    #[test]
    fn test_velocity_decays_without_input() {
        let mut a = actor(MoveOverrides::default());
        step(&mut a, InputSnapshot::default().with_button(Button::Heavy), None);
        a.body.velocity.x = 200.0;
        step(&mut a, InputSnapshot::default(), None);
        let vx = a.intent().x.unwrap();
        assert!(vx > 0.0 && vx < 200.0);
    }

    #[test]
    fn test_decay_snaps_to_zero() {
        let mut a = actor(MoveOverrides::default());
        step(&mut a, InputSnapshot::default().with_button(Button::Heavy), None);
        a.body.velocity.x = 0.5;
        step(&mut a, InputSnapshot::default(), None);
        assert_eq!(a.intent().x, Some(0.0));
    }

    #[test]
    fn test_jump_only_when_grounded() {
        let mut a = actor(MoveOverrides::default());
        let up = InputSnapshot {
            up: true,
            ..Default::default()
        };
        step(&mut a, up, None);
        assert_eq!(a.intent().y, Some(600.0));
        assert!(a.is_airborne());
        step(&mut a, up, None);
        assert_eq!(a.intent().y, None);
    }

    #[test]
    fn test_auto_face_opponent() {
        let mut a = actor(MoveOverrides::default());
        assert!(a.facing_right());
        step(&mut a, InputSnapshot::default(), Some(-200.0));
        assert!(!a.facing_right());
        step(&mut a, right(), Some(-200.0));
        assert!(!a.facing_right(), "walking away keeps facing the opponent");
    }
}
