//! Move definitions and per-character move catalogs.
//!
//! A [`MoveDefinition`] is immutable character data loaded by the host. Every
//! actor receives its own normalized deep copy of its character's
//! [`MoveCatalog`], so runtime defaults and tuning overrides never leak into
//! shared data.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::input::{Button, Direction};

pub mod loader;
pub mod roster;

pub use loader::CatalogError;
pub use roster::{CharacterDefinition, CharacterStats, SpecialInput};

/// How a move delivers its hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MoveKind {
    #[default]
    Melee,
    Projectile,
    SuperProjectile,
}

impl MoveKind {
    pub fn is_projectile(&self) -> bool {
        matches!(self, Self::Projectile | Self::SuperProjectile)
    }
}

/// Attack box relative to the attacker, in units facing +x
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HitboxSpec {
    pub offset: [f32; 2],
    pub size: [f32; 2],
}

impl Default for HitboxSpec {
    fn default() -> Self {
        Self {
            offset: [45.0, 10.0],
            size: [50.0, 30.0],
        }
    }
}

/// Flight parameters for projectile moves
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSpec {
    pub speed: f32,
    pub lifetime_ms: f32,
    pub size: [f32; 2],
}

impl ProjectileSpec {
    pub fn for_kind(kind: MoveKind) -> Self {
        let size = match kind {
            MoveKind::SuperProjectile => SUPER_PROJECTILE_SIZE,
            _ => PROJECTILE_SIZE,
        };
        Self {
            speed: PROJECTILE_SPEED,
            lifetime_ms: PROJECTILE_LIFETIME_MS,
            size,
        }
    }
}

/// Frame data and effects of a single move
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MoveDefinition {
    pub id: String,
    pub startup: u32,
    pub active: u32,
    pub recovery: u32,
    #[serde(default)]
    pub damage: u32,
    /// Hitstun inflicted on the victim, in frames
    #[serde(default)]
    pub stun: u32,
    /// Knockback applied to the victim, x along the attacker's facing
    #[serde(default)]
    pub knockback: [f32; 2],
    /// Meter spent to perform the move (0 for non-specials)
    #[serde(default)]
    pub cost: u32,
    /// Meter the attacker gains when the move hits
    #[serde(default)]
    pub meter_gain: u32,
    /// Velocity burst applied at the start of the active phase
    #[serde(default)]
    pub velocity: Option<[f32; 2]>,
    #[serde(default)]
    pub hold_velocity: bool,
    #[serde(default)]
    pub cancelable: Option<bool>,
    /// Trailing frames before the end of the active phase in which a cancel is accepted
    #[serde(default)]
    pub cancel_window: Option<u32>,
    #[serde(default)]
    pub lock_movement: bool,
    #[serde(default)]
    pub move_control_factor: Option<f32>,
    #[serde(default)]
    pub allow_jump: Option<bool>,
    #[serde(default)]
    pub kind: MoveKind,
    /// Button that triggers the move from the meter-gated scan
    #[serde(default)]
    pub button: Option<Button>,
    /// Named motion from the command registry
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub hitbox: HitboxSpec,
    #[serde(default)]
    pub projectile: Option<ProjectileSpec>,
}

impl Default for MoveDefinition {
    fn default() -> Self {
        Self::new("", 0, 0, 0)
    }
}

impl MoveDefinition {
    /// Minimal definition with the given frame data; everything else defaulted.
    pub fn new(id: &str, startup: u32, active: u32, recovery: u32) -> Self {
        Self {
            id: id.to_string(),
            startup,
            active,
            recovery,
            damage: 0,
            stun: 0,
            knockback: [0.0, 0.0],
            cost: 0,
            meter_gain: 0,
            velocity: None,
            hold_velocity: false,
            cancelable: None,
            cancel_window: None,
            lock_movement: false,
            move_control_factor: None,
            allow_jump: None,
            kind: MoveKind::Melee,
            button: None,
            command: None,
            hitbox: HitboxSpec::default(),
            projectile: None,
        }
    }

    pub fn total_frames(&self) -> u32 {
        self.startup + self.active + self.recovery
    }

    pub fn startup_ms(&self) -> f32 {
        frames_to_ms(self.startup)
    }

    pub fn active_ms(&self) -> f32 {
        frames_to_ms(self.active)
    }

    /// Elapsed time at which the active phase ends
    pub fn active_end_ms(&self) -> f32 {
        frames_to_ms(self.startup + self.active)
    }

    pub fn total_ms(&self) -> f32 {
        frames_to_ms(self.total_frames())
    }

    pub fn stun_ms(&self) -> f32 {
        frames_to_ms(self.stun)
    }

    pub fn is_cancelable(&self) -> bool {
        self.cancelable
            .unwrap_or(self.cancel_window.is_some_and(|w| w > 0))
    }

    pub fn cancel_window_frames(&self) -> u32 {
        match self.cancel_window {
            Some(frames) => frames,
            None if self.is_cancelable() => DEFAULT_CANCEL_WINDOW_FRAMES,
            None => 0,
        }
    }

    /// Earliest elapsed time at which this move may be cancelled
    pub fn cancel_window_start_ms(&self) -> f32 {
        (self.active_end_ms() - frames_to_ms(self.cancel_window_frames())).max(0.0)
    }

    /// Fraction of walk speed available while the move runs
    pub fn control_factor(&self) -> f32 {
        if self.lock_movement {
            return 0.0;
        }
        self.move_control_factor.unwrap_or(1.0).clamp(0.0, 1.0)
    }

    pub fn jump_allowed(&self) -> bool {
        self.allow_jump.unwrap_or(!self.lock_movement)
    }

    pub fn projectile_spec(&self) -> ProjectileSpec {
        self.projectile
            .unwrap_or_else(|| ProjectileSpec::for_kind(self.kind))
    }

    /// Fill every defaulted runtime flag with its concrete value.
    pub fn normalize(&mut self) {
        let cancelable = self.is_cancelable();
        self.cancel_window = Some(self.cancel_window_frames());
        self.cancelable = Some(cancelable);
        self.move_control_factor = Some(self.control_factor());
        self.allow_jump = Some(self.jump_allowed());
        if self.kind.is_projectile() && self.projectile.is_none() {
            self.projectile = Some(ProjectileSpec::for_kind(self.kind));
        }
    }
}

/// Tuning applied to an actor's catalog copy (debug panel sliders)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MoveOverrides {
    pub move_control_factor: Option<f32>,
    pub force_lock_movement: bool,
}

/// Ordered move table of one character.
///
/// Iteration follows declaration order; the meter-gated scan picks the first
/// eligible entry, so order is significant.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MoveCatalog {
    moves: Vec<MoveDefinition>,
    index: HashMap<String, usize>,
}

impl MoveCatalog {
    pub fn new(moves: impl IntoIterator<Item = MoveDefinition>) -> Self {
        let mut catalog = Self::default();
        for def in moves {
            catalog.insert(def);
        }
        catalog
    }

    /// Insert a move, replacing any existing entry with the same id in place.
    pub fn insert(&mut self, def: MoveDefinition) {
        match self.index.get(&def.id) {
            Some(&i) => self.moves[i] = def,
            None => {
                self.index.insert(def.id.clone(), self.moves.len());
                self.moves.push(def);
            }
        }
    }

    pub fn get(&self, id: &str) -> Option<&MoveDefinition> {
        self.index.get(id).map(|&i| &self.moves[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MoveDefinition> {
        self.moves.iter()
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Deep copy with every move normalized
    pub fn normalized(&self) -> Self {
        let mut copy = self.clone();
        for def in &mut copy.moves {
            def.normalize();
        }
        copy
    }

    pub fn apply_overrides(&mut self, overrides: &MoveOverrides) {
        for def in &mut self.moves {
            if let Some(factor) = overrides.move_control_factor {
                def.move_control_factor = Some(factor.clamp(0.0, 1.0));
            }
            if overrides.force_lock_movement {
                def.lock_movement = true;
                def.move_control_factor = Some(0.0);
                def.allow_jump = Some(false);
            }
        }
    }
}

/// Catalog key of the normal attack for a button held in a direction.
///
/// Down wins over up, up over forward; everything else is the neutral
/// variant.
pub fn normal_move_key(button: Button, direction: Direction) -> String {
    let base = button.as_str();
    let suffix = if direction.is_down() {
        Some("down")
    } else if direction.is_up() {
        Some("up")
    } else if direction == Direction::Forward {
        Some("forward")
    } else {
        None
    };
    match suffix {
        Some(suffix) => format!("{base}_{suffix}"),
        None => base.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_math() {
        let def = MoveDefinition::new("jab", 3, 2, 6);
        assert_eq!(def.total_frames(), 11);
        assert!((def.active_end_ms() - 5.0 * FRAME_MS).abs() < 1e-3);
    }

    #[test]
    fn test_cancel_defaults() {
        let mut def = MoveDefinition::new("jab", 3, 2, 6);
        assert!(!def.is_cancelable());
        assert_eq!(def.cancel_window_frames(), 0);

        def.cancel_window = Some(4);
        assert!(def.is_cancelable());

        def.cancel_window = None;
        def.cancelable = Some(true);
        assert_eq!(def.cancel_window_frames(), DEFAULT_CANCEL_WINDOW_FRAMES);

        def.cancelable = Some(false);
        def.cancel_window = Some(4);
        assert!(!def.is_cancelable());
    }

    #[test]
    fn test_cancel_window_start_clamped() {
        let mut def = MoveDefinition::new("jab", 3, 2, 6);
        def.cancel_window = Some(5);
        assert_eq!(def.cancel_window_start_ms(), 0.0);
        def.cancel_window = Some(2);
        assert!((def.cancel_window_start_ms() - 3.0 * FRAME_MS).abs() < 1e-3);
    }

    #[test]
    fn test_control_factor() {
        let mut def = MoveDefinition::new("jab", 3, 2, 6);
        assert_eq!(def.control_factor(), 1.0);
        def.move_control_factor = Some(1.7);
        assert_eq!(def.control_factor(), 1.0);
        def.move_control_factor = Some(0.4);
        assert!((def.control_factor() - 0.4).abs() < f32::EPSILON);
        def.lock_movement = true;
        assert_eq!(def.control_factor(), 0.0);
        assert!(!def.jump_allowed());
        def.allow_jump = Some(true);
        assert!(def.jump_allowed());
    }

    #[test]
    fn test_normalize_fills_defaults() {
        let mut def = MoveDefinition::new("fireball", 9, 2, 18);
        def.kind = MoveKind::Projectile;
        def.normalize();
        assert_eq!(def.cancelable, Some(false));
        assert_eq!(def.cancel_window, Some(0));
        assert_eq!(def.move_control_factor, Some(1.0));
        assert_eq!(def.allow_jump, Some(true));
        assert_eq!(def.projectile.unwrap().speed, PROJECTILE_SPEED);
    }

    #[test]
    fn test_catalog_order_and_replace() {
        let mut catalog = MoveCatalog::new(vec![
            MoveDefinition::new("b", 1, 1, 1),
            MoveDefinition::new("a", 1, 1, 1),
        ]);
        catalog.insert(MoveDefinition::new("b", 2, 2, 2));
        let ids: Vec<&str> = catalog.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
        assert_eq!(catalog.get("b").unwrap().startup, 2);
        assert!(catalog.get("zzz").is_none());
    }

    #[test]
    fn test_overrides_do_not_touch_source() {
        let source = MoveCatalog::new(vec![MoveDefinition::new("jab", 3, 2, 6)]);
        let mut copy = source.normalized();
        copy.apply_overrides(&MoveOverrides {
            move_control_factor: Some(0.25),
            force_lock_movement: false,
        });
        assert_eq!(copy.get("jab").unwrap().control_factor(), 0.25);
        assert_eq!(source.get("jab").unwrap().move_control_factor, None);

        copy.apply_overrides(&MoveOverrides {
            move_control_factor: None,
            force_lock_movement: true,
        });
        assert!(copy.get("jab").unwrap().lock_movement);
        assert_eq!(copy.get("jab").unwrap().control_factor(), 0.0);
        // normalize() already resolved allow_jump to true; the lock still wins
        assert!(!copy.get("jab").unwrap().jump_allowed());
    }

    #[test]
    fn test_normal_move_keys() {
        assert_eq!(normal_move_key(Button::Light, Direction::Neutral), "light");
        assert_eq!(normal_move_key(Button::Light, Direction::Forward), "light_forward");
        assert_eq!(normal_move_key(Button::Heavy, Direction::DownBack), "heavy_down");
        assert_eq!(normal_move_key(Button::Heavy, Direction::UpForward), "heavy_up");
        assert_eq!(normal_move_key(Button::Light, Direction::Back), "light");
    }
}
