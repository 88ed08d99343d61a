//! Hitstop: a short freeze of both participants when a hit lands.
//!
//! Each hit files one freeze request with its own countdown. An actor stays
//! frozen while any request names it, so overlapping hits extend the freeze
//! without one request cutting another short. Countdowns use the unscaled
//! tick delta, so slow motion cannot starve them.

use crate::actor::ActorId;
use crate::constants::TIME_EPSILON_MS;

#[derive(Debug, Clone, PartialEq)]
struct FreezeRequest {
    actors: Vec<ActorId>,
    remaining_ms: f32,
}

#[derive(Debug, Clone, Default)]
pub struct HitstopController {
    requests: Vec<FreezeRequest>,
}

impl HitstopController {
    pub fn new() -> Self {
        Self::default()
    }

    /// File a freeze for the given actors. Zero-length freezes are ignored.
    pub fn freeze(&mut self, actors: &[ActorId], duration_ms: f32) {
        if duration_ms <= 0.0 || actors.is_empty() {
            return;
        }
        self.requests.push(FreezeRequest {
            actors: actors.to_vec(),
            remaining_ms: duration_ms,
        });
    }

    /// Number of live requests naming this actor
    pub fn freeze_count(&self, actor: ActorId) -> usize {
        self.requests
            .iter()
            .filter(|r| r.actors.contains(&actor))
            .count()
    }

    pub fn is_frozen(&self, actor: ActorId) -> bool {
        self.requests.iter().any(|r| r.actors.contains(&actor))
    }

    pub fn is_idle(&self) -> bool {
        self.requests.is_empty()
    }

    /// Count down with the raw (unscaled) delta and return the actors whose
    /// last request expired on this call.
    pub fn tick(&mut self, raw_dt_ms: f32) -> Vec<ActorId> {
        if self.requests.is_empty() {
            return Vec::new();
        }
        let mut candidates: Vec<ActorId> = Vec::new();
        for request in &mut self.requests {
            request.remaining_ms -= raw_dt_ms;
            if request.remaining_ms <= TIME_EPSILON_MS {
                candidates.extend(request.actors.iter().copied());
            }
        }
        self.requests.retain(|r| r.remaining_ms > TIME_EPSILON_MS);

        candidates.sort_unstable();
        candidates.dedup();
        candidates.retain(|id| !self.is_frozen(*id));
        candidates
    }

    /// Drop every request naming this actor (actor removed from the match)
    pub fn release(&mut self, actor: ActorId) {
        for request in &mut self.requests {
            request.actors.retain(|id| *id != actor);
        }
        self.requests.retain(|r| !r.actors.is_empty());
    }
}
