//! Per-tick decision making and the committed move's timeline.
//!
//! `Actor::step` runs once per unfrozen tick in this order:
//! stun countdown, recovery lock, timeline advance, input recording, move
//! selection, movement. Side effects that need the rest of the world (hit
//! windows, projectiles) are handed back as [`ActorEffect`]s.

use tracing::{debug, trace};

use crate::combat::MovePhase;
use crate::constants::TIME_EPSILON_MS;
use crate::engine::SimulationConfig;
use crate::events::CombatEvent;
use crate::input::{Button, CommandRegistry, InputSnapshot};
use crate::moves::{normal_move_key, MoveDefinition};

use super::{ActiveMove, Actor, ActorId, ControlMode, LifecycleState};

/// Everything an actor may read about the world during its step
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    /// Scaled tick delta
    pub dt_ms: f32,
    /// Simulation clock after this tick's advance
    pub now_ms: f64,
    pub registry: &'a CommandRegistry,
    pub config: &'a SimulationConfig,
    /// X position of the nearest other actor, for auto-facing
    pub opponent_x: Option<f32>,
}

/// Work the simulation must carry out on behalf of an actor
#[derive(Debug, Clone, PartialEq)]
pub enum ActorEffect {
    OpenWindow { instance: u64, def: MoveDefinition },
    SpawnProjectile { def: MoveDefinition },
}

#[derive(Debug, Clone, Default)]
pub struct StepOutput {
    pub events: Vec<CombatEvent>,
    pub effects: Vec<ActorEffect>,
    /// Set when hitstun ended this tick: the attacker whose combo must close
    pub recovered_from: Option<ActorId>,
}

/// Why a move request was turned down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    UnknownMove,
    NoControl,
    Stunned,
    InsufficientMeter,
    Busy,
}

impl Actor {
    /// Whether the actor currently processes input at all.
    pub fn can_act(&self) -> bool {
        self.control == ControlMode::Player
            && self.state != LifecycleState::Hitstun
            && self.recovery_lock_ms <= 0.0
            && !self.defeated
    }

    /// Try to commit a move by id.
    ///
    /// Succeeds when idle, or when the current move is cancelable and its
    /// elapsed time has reached the cancel window. Costed moves spend meter.
    pub fn request_move(&mut self, move_id: &str, out: &mut StepOutput) -> Result<(), Rejection> {
        let def = self
            .catalog
            .get(move_id)
            .cloned()
            .ok_or(Rejection::UnknownMove)?;
        if self.control != ControlMode::Player || self.defeated {
            return Err(Rejection::NoControl);
        }
        if self.state == LifecycleState::Hitstun || self.recovery_lock_ms > 0.0 {
            return Err(Rejection::Stunned);
        }
        if def.cost > 0 && !self.meter.can_afford(def.cost) {
            return Err(Rejection::InsufficientMeter);
        }

        let cancel = match &self.current {
            None => false,
            Some(current)
                if current.def.is_cancelable()
                    && current.elapsed_ms + TIME_EPSILON_MS >= current.def.cancel_window_start_ms() =>
            {
                true
            }
            Some(current) => {
                trace!(
                    actor = self.id.0,
                    current = %current.def.id,
                    requested = %def.id,
                    "move request dropped"
                );
                return Err(Rejection::Busy);
            }
        };

        if def.cost > 0 {
            self.meter.spend(def.cost);
        }
        let instance = self.next_instance;
        self.next_instance += 1;
        debug!(actor = self.id.0, move_id = %def.id, cancel, instance, "move started");

        out.events.push(CombatEvent::MoveStarted {
            actor: self.id,
            move_id: def.id.clone(),
            cancel,
        });
        self.control_factor = def.control_factor();
        self.state = LifecycleState::Attacking(MovePhase::Startup);
        self.current = Some(ActiveMove {
            def,
            instance,
            elapsed_ms: 0.0,
            phase: MovePhase::Startup,
            effect_fired: false,
        });
        // Zero-startup moves fire on the tick they start
        self.check_transitions(out);
        Ok(())
    }

    /// One simulation tick for an unfrozen actor.
    pub fn step(&mut self, input: &InputSnapshot, ctx: &StepContext<'_>, out: &mut StepOutput) {
        self.intent = Default::default();

        if self.state == LifecycleState::Hitstun {
            self.tick_stun(ctx, out);
            return;
        }
        if self.recovery_lock_ms > 0.0 {
            self.recovery_lock_ms -= ctx.dt_ms;
            if self.recovery_lock_ms <= TIME_EPSILON_MS {
                self.recovery_lock_ms = 0.0;
            }
            return;
        }

        self.advance_timeline(ctx.dt_ms, out);

        if !self.can_act() {
            return;
        }

        self.update_facing(input, ctx);
        let direction = input.direction(self.facing_right);
        self.buffer.record(direction, ctx.now_ms);

        if let Some((move_id, from_pattern)) = self.select_move(input, ctx) {
            if self.request_move(&move_id, out).is_ok() && from_pattern {
                self.buffer.clear();
            }
        }

        self.apply_movement(input, ctx);
    }

    /// Pick the move this tick's input asks for, if any.
    ///
    /// Returns the move id and whether it was chosen through a command
    /// pattern (the buffer is cleared only then).
    fn select_move(&mut self, input: &InputSnapshot, ctx: &StepContext<'_>) -> Option<(String, bool)> {
        if !input.any_button() {
            return None;
        }
        let direction = input.direction(self.facing_right);

        // Meter-gated moves, first eligible in catalog order
        if self.meter.value() >= ctx.config.super_threshold {
            for def in self.catalog.iter().filter(|d| d.cost > 0) {
                let Some(button) = def.button else {
                    continue;
                };
                if !input.pressed(button) || !self.meter.can_afford(def.cost) {
                    continue;
                }
                match &def.command {
                    None => return Some((def.id.clone(), false)),
                    Some(name) => {
                        let Some(pattern) = ctx.registry.get(name) else {
                            continue;
                        };
                        if self.buffer.matches(pattern, ctx.now_ms) {
                            return Some((def.id.clone(), true));
                        }
                    }
                }
            }
        }

        for button in [Button::Light, Button::Heavy] {
            if !input.pressed(button) {
                continue;
            }
            let key = normal_move_key(button, direction);
            if self.catalog.contains(&key) {
                return Some((key, false));
            }
            if self.catalog.contains(button.as_str()) {
                return Some((button.as_str().to_string(), false));
            }
        }

        // Character motion specials, then the neutral fallback
        for special in &self.specials {
            if !input.pressed(special.button) || !self.catalog.contains(&special.move_id) {
                continue;
            }
            let Some(pattern) = ctx.registry.get(&special.command) else {
                continue;
            };
            if self.buffer.matches(pattern, ctx.now_ms) {
                return Some((special.move_id.clone(), true));
            }
        }

        if input.special {
            if let Some(id) = &self.neutral_special {
                if self.catalog.contains(id) {
                    return Some((id.clone(), false));
                }
            }
        }
        None
    }

    fn advance_timeline(&mut self, dt_ms: f32, out: &mut StepOutput) {
        let Some(current) = self.current.as_mut() else {
            return;
        };
        current.elapsed_ms += dt_ms;
        self.check_transitions(out);
    }

    /// Fire the active effect once startup has elapsed, update the phase and
    /// finish the move at the end of recovery.
    fn check_transitions(&mut self, out: &mut StepOutput) {
        let sign = self.facing_sign();
        let Some(current) = self.current.as_mut() else {
            return;
        };

        // Accumulated deltas may land a hair short of a frame boundary
        let elapsed = current.elapsed_ms + TIME_EPSILON_MS;
        if !current.effect_fired && elapsed >= current.def.startup_ms() {
            current.effect_fired = true;
            let def = &current.def;
            out.events.push(CombatEvent::AttackStarted {
                actor: self.id,
                move_id: def.id.clone(),
            });
            if def.kind.is_projectile() {
                out.effects
                    .push(ActorEffect::SpawnProjectile { def: def.clone() });
            } else {
                out.effects.push(ActorEffect::OpenWindow {
                    instance: current.instance,
                    def: def.clone(),
                });
            }
            if let Some([vx, vy]) = def.velocity {
                self.intent.x = Some(vx * sign);
                self.body.velocity.x = vx * sign;
                if vy != 0.0 {
                    self.intent.y = Some(vy);
                    self.body.velocity.y = vy;
                    self.body.grounded = false;
                }
            }
        }

        current.phase = MovePhase::at(
            elapsed,
            current.def.startup_ms(),
            current.def.active_end_ms(),
        );

        if elapsed >= current.def.total_ms() {
            let hold = current.def.hold_velocity;
            trace!(actor = self.id.0, move_id = %current.def.id, "move complete");
            self.current = None;
            self.state = LifecycleState::Idle;
            self.control_factor = 1.0;
            if !hold {
                self.intent.x = Some(0.0);
                self.body.velocity.x = 0.0;
            }
        } else {
            self.state = LifecycleState::Attacking(current.phase);
        }
    }

    /// Apply a landed hit: damage, interrupt, stun and knockback.
    /// Returns true when this hit defeated the actor.
    pub(crate) fn take_hit(
        &mut self,
        damage: u32,
        stun_ms: f32,
        attacker: ActorId,
        knockback: bevy::math::Vec2,
    ) -> bool {
        self.health = self.health.saturating_sub(damage);
        if let Some(interrupted) = self.current.take() {
            debug!(actor = self.id.0, move_id = %interrupted.def.id, "move interrupted");
        }
        self.control_factor = 1.0;
        self.state = LifecycleState::Hitstun;
        self.stun_remaining_ms = stun_ms;
        self.recovery_lock_ms = 0.0;
        self.last_attacker = Some(attacker);
        self.body.velocity = knockback;
        self.intent.x = Some(knockback.x);
        self.intent.y = Some(knockback.y);
        if knockback.y > 0.0 {
            self.body.grounded = false;
        }

        if self.health == 0 && !self.defeated {
            self.defeated = true;
            return true;
        }
        false
    }

    fn tick_stun(&mut self, ctx: &StepContext<'_>, out: &mut StepOutput) {
        self.stun_remaining_ms -= ctx.dt_ms;
        if self.stun_remaining_ms > TIME_EPSILON_MS {
            return;
        }
        self.stun_remaining_ms = 0.0;
        self.state = LifecycleState::Idle;
        self.recovery_lock_ms = ctx.config.wakeup_lock_ms();
        self.buffer.clear();
        debug!(actor = self.id.0, "recovered from hitstun");
        out.events.push(CombatEvent::ActorRecovered { actor: self.id });
        out.recovered_from = self.last_attacker.take();
    }
}
