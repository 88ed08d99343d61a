//! Sparring bot: produces input snapshots for a CPU-controlled actor.
//!
//! The bot only ever talks to the simulation through [`InputSnapshot`]s, the
//! same path a human player uses, so motion specials have to be typed out
//! one direction per tick. Decisions come from a seeded xoshiro stream and
//! are reproducible for a given seed and match.

use std::collections::VecDeque;

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::actor::ActorId;
use crate::engine::Simulation;
use crate::input::{Button, Direction, InputSnapshot};

/// Tuning for a bot personality
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BotProfile {
    /// Chance to walk in instead of zoning when far away (0..1)
    pub aggression: f32,
    /// Distance at which normals are thrown
    pub attack_range: f32,
    /// Distance beyond which the bot considers projectiles
    pub zoning_range: f32,
    /// Ticks to wait after committing to an attack
    pub reaction_ticks: u32,
}

impl Default for BotProfile {
    fn default() -> Self {
        Self {
            aggression: 0.6,
            attack_range: 90.0,
            zoning_range: 250.0,
            reaction_ticks: 8,
        }
    }
}

/// What the bot is doing right now
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BotIntent {
    Idle,
    Approach,
    Poke,
    Motion,
    Recover,
}

#[derive(Debug, Clone)]
pub struct SparringBot {
    actor: ActorId,
    profile: BotProfile,
    rng: Xoshiro256PlusPlus,
    intent: BotIntent,
    cooldown: u32,
    motion: VecDeque<Direction>,
    motion_button: Option<Button>,
}

impl SparringBot {
    pub fn new(actor: ActorId, profile: BotProfile, seed: u64) -> Self {
        Self {
            actor,
            profile,
            rng: Xoshiro256PlusPlus::seed_from_u64(seed),
            intent: BotIntent::Idle,
            cooldown: 0,
            motion: VecDeque::new(),
            motion_button: None,
        }
    }

    pub fn actor(&self) -> ActorId {
        self.actor
    }

    pub fn intent(&self) -> BotIntent {
        self.intent
    }

    /// Input for the next tick.
    pub fn decide(&mut self, sim: &Simulation) -> InputSnapshot {
        let Some(me) = sim.actor(self.actor) else {
            return InputSnapshot::default();
        };
        let facing = me.facing_right();

        // Finish typing a motion before anything else
        if let Some(direction) = self.motion.pop_front() {
            let input = InputSnapshot::holding(direction, facing);
            if self.motion.is_empty() {
                if let Some(button) = self.motion_button.take() {
                    self.cooldown = self.profile.reaction_ticks;
                    return input.with_button(button);
                }
            }
            return input;
        }

        if !me.can_act() || me.current_move().is_some() {
            self.intent = BotIntent::Recover;
            return InputSnapshot::default();
        }
        if self.cooldown > 0 {
            self.cooldown -= 1;
            self.intent = BotIntent::Idle;
            return InputSnapshot::default();
        }

        let Some(opponent_x) = sim
            .actors()
            .iter()
            .filter(|a| a.id() != self.actor && !a.is_defeated())
            .map(|a| a.position().x)
            .min_by(|a, b| (a - me.position().x).abs().total_cmp(&(b - me.position().x).abs()))
        else {
            self.intent = BotIntent::Idle;
            return InputSnapshot::default();
        };
        let distance = (opponent_x - me.position().x).abs();

        if distance <= self.profile.attack_range {
            self.intent = BotIntent::Poke;
            self.cooldown = self.profile.reaction_ticks;
            let (direction, button) = match self.rng.gen_range(0..4) {
                0 => (Direction::Neutral, Button::Light),
                1 => (Direction::Down, Button::Light),
                2 => (Direction::Neutral, Button::Heavy),
                _ => (Direction::Forward, Button::Heavy),
            };
            trace!(actor = self.actor.0, ?button, ?direction, "bot poke");
            return InputSnapshot::holding(direction, facing).with_button(button);
        }

        let wants_motion = distance > self.profile.zoning_range
            && !self.rng.gen_bool(self.profile.aggression.clamp(0.0, 1.0) as f64);
        if wants_motion {
            if let Some(special) = me.specials().first() {
                if let Some(pattern) = sim.registry().get(&special.command) {
                    trace!(actor = self.actor.0, command = %special.command, "bot motion");
                    self.intent = BotIntent::Motion;
                    self.motion.extend(pattern.steps().iter().copied());
                    self.motion_button = Some(special.button);
                    return self.decide(sim);
                }
            }
        }

        self.intent = BotIntent::Approach;
        InputSnapshot::holding(Direction::Forward, facing)
    }
}
