//! Per-attacker combo tracking and damage scaling.
//!
//! A record is created on the first hit of a combo and deleted when the
//! victim recovers from hitstun. Scaling is computed in whole percent so
//! `floor(raw * scale)` is exact.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::actor::ActorId;
use crate::constants::*;

/// Damage scale for the n-th hit of a combo, in percent
pub fn damage_scale_pct(count: u32) -> u32 {
    100u32
        .saturating_sub(count.saturating_mul(COMBO_SCALE_STEP_PCT))
        .max(COMBO_SCALE_FLOOR_PCT)
}

/// Damage scale for the n-th hit of a combo (0.1..=1.0)
pub fn damage_scale(count: u32) -> f32 {
    damage_scale_pct(count) as f32 / 100.0
}

/// `floor(raw * scale(count))`
pub fn scaled_damage(raw: u32, count: u32) -> u32 {
    (raw as u64 * damage_scale_pct(count) as u64 / 100) as u32
}

pub fn is_milestone(count: u32) -> bool {
    COMBO_MILESTONES.contains(&count)
}

/// Camera shake strength for a milestone
pub fn milestone_intensity(count: u32) -> f32 {
    (MILESTONE_SHAKE_BASE + count as f32 * MILESTONE_SHAKE_STEP).min(MILESTONE_SHAKE_MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComboQuality {
    Normal,
    Great,
    Awesome,
    Legendary,
}

impl ComboQuality {
    pub fn from_count(count: u32) -> Self {
        if count >= COMBO_LEGENDARY_MIN {
            Self::Legendary
        } else if count >= COMBO_AWESOME_MIN {
            Self::Awesome
        } else if count >= COMBO_GREAT_MIN {
            Self::Great
        } else {
            Self::Normal
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "Normal",
            Self::Great => "Great",
            Self::Awesome => "Awesome",
            Self::Legendary => "Legendary",
        }
    }
}

/// Running state of one attacker's combo
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComboRecord {
    pub count: u32,
    pub total_damage: u32,
    pub air_combo: bool,
    pub max_reach: u32,
}

impl ComboRecord {
    /// Scale applied to the most recent hit
    pub fn damage_scale(&self) -> f32 {
        damage_scale(self.count)
    }
}

/// Result of registering one hit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitOutcome {
    pub scaled_damage: u32,
    pub count: u32,
    pub scale: f32,
    pub total_damage: u32,
    pub air_combo: bool,
    /// Set when `count` is one of the milestone counts
    pub milestone: Option<u32>,
}

/// End-of-combo summary, produced only for combos of two hits or more
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ComboSummary {
    pub attacker: ActorId,
    pub count: u32,
    pub total_damage: u32,
    pub quality: ComboQuality,
    pub air_combo: bool,
}

impl ComboSummary {
    pub fn message(&self) -> String {
        format!(
            "{} Combo! {} hits, {} damage{}",
            self.quality.as_str(),
            self.count,
            self.total_damage,
            if self.air_combo { " (AIR COMBO!)" } else { "" }
        )
    }
}

/// Combo records keyed by attacker
#[derive(Debug, Clone, Default)]
pub struct ComboTracker {
    records: HashMap<ActorId, ComboRecord>,
}

impl ComboTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a hit and return the scaled damage to apply.
    pub fn register_hit(
        &mut self,
        attacker: ActorId,
        raw_damage: u32,
        attacker_airborne: bool,
        victim_airborne: bool,
    ) -> HitOutcome {
        let record = self.records.entry(attacker).or_default();
        record.count += 1;
        if attacker_airborne && victim_airborne && record.count > 1 {
            record.air_combo = true;
        }
        record.max_reach = record.max_reach.max(record.count);

        let scaled = scaled_damage(raw_damage, record.count);
        record.total_damage = record.total_damage.saturating_add(scaled);

        HitOutcome {
            scaled_damage: scaled,
            count: record.count,
            scale: record.damage_scale(),
            total_damage: record.total_damage,
            air_combo: record.air_combo,
            milestone: is_milestone(record.count).then_some(record.count),
        }
    }

    /// Close the attacker's combo. The record is always deleted; a summary is
    /// returned only when the combo had more than one hit.
    pub fn reset_combo(&mut self, attacker: ActorId) -> Option<ComboSummary> {
        let record = self.records.remove(&attacker)?;
        if record.count <= 1 {
            return None;
        }
        let summary = ComboSummary {
            attacker,
            count: record.count,
            total_damage: record.total_damage,
            quality: ComboQuality::from_count(record.count),
            air_combo: record.air_combo,
        };
        tracing::info!(attacker = attacker.0, "{}", summary.message());
        Some(summary)
    }

    /// Current record, or an empty one when the attacker has no combo
    pub fn combo_data(&self, attacker: ActorId) -> ComboRecord {
        self.records.get(&attacker).copied().unwrap_or_default()
    }

    pub fn combo_count(&self, attacker: ActorId) -> u32 {
        self.records.get(&attacker).map_or(0, |r| r.count)
    }

    pub fn is_in_combo(&self, attacker: ActorId) -> bool {
        self.combo_count(attacker) > 0
    }

    pub fn active_combos(&self) -> usize {
        self.records.len()
    }
}
