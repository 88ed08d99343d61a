//! Character definitions and the built-in roster.
//!
//! A character declares its own special-input table (command + button ->
//! move id). The state machine never branches on character names.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MAX_METER;
use crate::input::Button;

use super::{HitboxSpec, MoveCatalog, MoveDefinition, MoveKind};

/// Base stats of a character
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CharacterStats {
    pub walk_speed: f32,
    pub jump_force: f32,
    pub max_health: u32,
    #[serde(default = "default_max_meter")]
    pub max_meter: u32,
    /// Width and height of the body used as the hurtbox
    #[serde(default = "default_hurtbox")]
    pub hurtbox: [f32; 2],
}

fn default_max_meter() -> u32 {
    DEFAULT_MAX_METER
}

fn default_hurtbox() -> [f32; 2] {
    [50.0, 100.0]
}

impl Default for CharacterStats {
    fn default() -> Self {
        Self {
            walk_speed: 300.0,
            jump_force: 600.0,
            max_health: 1000,
            max_meter: DEFAULT_MAX_METER,
            hurtbox: default_hurtbox(),
        }
    }
}

/// A motion special: command pattern name + button -> move id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecialInput {
    pub command: String,
    pub button: Button,
    pub move_id: String,
}

impl SpecialInput {
    pub fn new(command: &str, button: Button, move_id: &str) -> Self {
        Self {
            command: command.to_string(),
            button,
            move_id: move_id.to_string(),
        }
    }
}

/// Full character data as loaded from disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterDefinition {
    pub name: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub stats: CharacterStats,
    pub moves: Vec<MoveDefinition>,
    #[serde(default)]
    pub specials: Vec<SpecialInput>,
    /// Move used when special is pressed without a recognized motion
    #[serde(default)]
    pub neutral_special: Option<String>,
}

impl CharacterDefinition {
    pub fn catalog(&self) -> MoveCatalog {
        MoveCatalog::new(self.moves.iter().cloned())
    }
}

/// Balanced shoto: fireball, dragon punch, projectile super
pub fn alpha() -> CharacterDefinition {
    CharacterDefinition {
        name: "Alpha".into(),
        color: "0x3366ff".into(),
        stats: CharacterStats::default(),
        moves: vec![
            MoveDefinition {
                id: "light".into(),
                startup: 3,
                active: 2,
                recovery: 6,
                damage: 30,
                stun: 12,
                knockback: [120.0, 0.0],
                meter_gain: 10,
                cancel_window: Some(5),
                move_control_factor: Some(0.5),
                ..Default::default()
            },
            MoveDefinition {
                id: "light_forward".into(),
                startup: 4,
                active: 3,
                recovery: 8,
                damage: 40,
                stun: 14,
                knockback: [160.0, 0.0],
                meter_gain: 12,
                velocity: Some([150.0, 0.0]),
                cancel_window: Some(4),
                move_control_factor: Some(0.3),
                hitbox: HitboxSpec {
                    offset: [50.0, 10.0],
                    size: [60.0, 30.0],
                },
                ..Default::default()
            },
            MoveDefinition {
                id: "light_down".into(),
                startup: 3,
                active: 2,
                recovery: 7,
                damage: 25,
                stun: 10,
                knockback: [80.0, 0.0],
                meter_gain: 8,
                cancel_window: Some(5),
                lock_movement: true,
                hitbox: HitboxSpec {
                    offset: [45.0, -35.0],
                    size: [55.0, 20.0],
                },
                ..Default::default()
            },
            MoveDefinition {
                id: "light_up".into(),
                startup: 4,
                active: 3,
                recovery: 9,
                damage: 35,
                stun: 14,
                knockback: [60.0, 300.0],
                meter_gain: 10,
                move_control_factor: Some(0.4),
                hitbox: HitboxSpec {
                    offset: [30.0, 50.0],
                    size: [40.0, 50.0],
                },
                ..Default::default()
            },
            MoveDefinition {
                id: "heavy".into(),
                startup: 8,
                active: 4,
                recovery: 16,
                damage: 80,
                stun: 20,
                knockback: [320.0, 120.0],
                meter_gain: 20,
                cancel_window: Some(6),
                move_control_factor: Some(0.3),
                hitbox: HitboxSpec {
                    offset: [55.0, 10.0],
                    size: [70.0, 40.0],
                },
                ..Default::default()
            },
            MoveDefinition {
                id: "heavy_forward".into(),
                startup: 10,
                active: 4,
                recovery: 18,
                damage: 90,
                stun: 22,
                knockback: [380.0, 80.0],
                meter_gain: 22,
                velocity: Some([260.0, 0.0]),
                lock_movement: true,
                hitbox: HitboxSpec {
                    offset: [60.0, 10.0],
                    size: [70.0, 40.0],
                },
                ..Default::default()
            },
            MoveDefinition {
                id: "heavy_down".into(),
                startup: 9,
                active: 4,
                recovery: 20,
                damage: 70,
                stun: 24,
                knockback: [200.0, 250.0],
                meter_gain: 18,
                lock_movement: true,
                hitbox: HitboxSpec {
                    offset: [60.0, -40.0],
                    size: [80.0, 20.0],
                },
                ..Default::default()
            },
            MoveDefinition {
                id: "heavy_up".into(),
                startup: 7,
                active: 5,
                recovery: 18,
                damage: 75,
                stun: 20,
                knockback: [100.0, 450.0],
                meter_gain: 18,
                move_control_factor: Some(0.2),
                hitbox: HitboxSpec {
                    offset: [25.0, 60.0],
                    size: [50.0, 60.0],
                },
                ..Default::default()
            },
            MoveDefinition {
                id: "special".into(),
                startup: 12,
                active: 3,
                recovery: 20,
                damage: 50,
                stun: 16,
                knockback: [200.0, 0.0],
                meter_gain: 15,
                kind: MoveKind::Projectile,
                move_control_factor: Some(0.0),
                ..Default::default()
            },
            MoveDefinition {
                id: "fireball".into(),
                startup: 9,
                active: 2,
                recovery: 18,
                damage: 70,
                stun: 18,
                knockback: [240.0, 0.0],
                meter_gain: 20,
                kind: MoveKind::Projectile,
                lock_movement: true,
                ..Default::default()
            },
            MoveDefinition {
                id: "rising_dragon".into(),
                startup: 3,
                active: 8,
                recovery: 24,
                damage: 110,
                stun: 26,
                knockback: [150.0, 550.0],
                meter_gain: 25,
                velocity: Some([120.0, 700.0]),
                lock_movement: true,
                hitbox: HitboxSpec {
                    offset: [30.0, 40.0],
                    size: [50.0, 90.0],
                },
                ..Default::default()
            },
            MoveDefinition {
                id: "shinku_wave".into(),
                startup: 12,
                active: 4,
                recovery: 30,
                damage: 220,
                stun: 40,
                knockback: [420.0, 150.0],
                cost: 100,
                kind: MoveKind::SuperProjectile,
                lock_movement: true,
                button: Some(Button::Special),
                command: Some("QCF".into()),
                ..Default::default()
            },
            MoveDefinition {
                id: "raging_demon".into(),
                startup: 6,
                active: 6,
                recovery: 40,
                damage: 350,
                stun: 60,
                knockback: [500.0, 300.0],
                cost: 300,
                velocity: Some([450.0, 0.0]),
                lock_movement: true,
                button: Some(Button::Heavy),
                command: Some("SGS".into()),
                hitbox: HitboxSpec {
                    offset: [40.0, 0.0],
                    size: [80.0, 100.0],
                },
                ..Default::default()
            },
        ],
        specials: vec![
            SpecialInput::new("QCF", Button::Special, "fireball"),
            SpecialInput::new("DP", Button::Special, "rising_dragon"),
        ],
        neutral_special: Some("special".into()),
    }
}

/// Heavy grappler: slower, sturdier, reverse motions
pub fn beta() -> CharacterDefinition {
    CharacterDefinition {
        name: "Beta".into(),
        color: "0xff3344".into(),
        stats: CharacterStats {
            walk_speed: 240.0,
            jump_force: 540.0,
            max_health: 1200,
            ..Default::default()
        },
        moves: vec![
            MoveDefinition {
                id: "light".into(),
                startup: 4,
                active: 2,
                recovery: 8,
                damage: 35,
                stun: 12,
                knockback: [140.0, 0.0],
                meter_gain: 10,
                cancel_window: Some(4),
                move_control_factor: Some(0.4),
                ..Default::default()
            },
            MoveDefinition {
                id: "light_down".into(),
                startup: 4,
                active: 2,
                recovery: 8,
                damage: 30,
                stun: 10,
                knockback: [90.0, 0.0],
                meter_gain: 8,
                lock_movement: true,
                hitbox: HitboxSpec {
                    offset: [45.0, -35.0],
                    size: [55.0, 20.0],
                },
                ..Default::default()
            },
            MoveDefinition {
                id: "heavy".into(),
                startup: 10,
                active: 5,
                recovery: 20,
                damage: 100,
                stun: 22,
                knockback: [360.0, 140.0],
                meter_gain: 25,
                cancel_window: Some(5),
                move_control_factor: Some(0.2),
                hitbox: HitboxSpec {
                    offset: [60.0, 10.0],
                    size: [80.0, 45.0],
                },
                ..Default::default()
            },
            MoveDefinition {
                id: "heavy_forward".into(),
                startup: 12,
                active: 4,
                recovery: 22,
                damage: 115,
                stun: 24,
                knockback: [420.0, 60.0],
                meter_gain: 28,
                velocity: Some([300.0, 0.0]),
                lock_movement: true,
                hitbox: HitboxSpec {
                    offset: [65.0, 10.0],
                    size: [80.0, 45.0],
                },
                ..Default::default()
            },
            MoveDefinition {
                id: "special".into(),
                startup: 8,
                active: 6,
                recovery: 22,
                damage: 80,
                stun: 20,
                knockback: [260.0, 200.0],
                meter_gain: 20,
                lock_movement: true,
                hitbox: HitboxSpec {
                    offset: [40.0, 0.0],
                    size: [60.0, 80.0],
                },
                ..Default::default()
            },
            MoveDefinition {
                id: "spinning_lariat".into(),
                startup: 6,
                active: 10,
                recovery: 20,
                damage: 120,
                stun: 24,
                knockback: [300.0, 200.0],
                meter_gain: 25,
                move_control_factor: Some(0.6),
                hitbox: HitboxSpec {
                    offset: [0.0, 10.0],
                    size: [140.0, 40.0],
                },
                ..Default::default()
            },
            MoveDefinition {
                id: "skull_crusher".into(),
                startup: 5,
                active: 6,
                recovery: 26,
                damage: 130,
                stun: 28,
                knockback: [120.0, 600.0],
                meter_gain: 30,
                velocity: Some([80.0, 650.0]),
                lock_movement: true,
                hitbox: HitboxSpec {
                    offset: [25.0, 50.0],
                    size: [60.0, 90.0],
                },
                ..Default::default()
            },
            MoveDefinition {
                id: "titan_buster".into(),
                startup: 8,
                active: 6,
                recovery: 36,
                damage: 280,
                stun: 50,
                knockback: [480.0, 400.0],
                cost: 100,
                velocity: Some([350.0, 0.0]),
                lock_movement: true,
                button: Some(Button::Heavy),
                command: Some("HCB".into()),
                hitbox: HitboxSpec {
                    offset: [50.0, 0.0],
                    size: [90.0, 100.0],
                },
                ..Default::default()
            },
        ],
        specials: vec![
            SpecialInput::new("QCB", Button::Special, "spinning_lariat"),
            SpecialInput::new("RDP", Button::Special, "skull_crusher"),
        ],
        neutral_special: Some("special".into()),
    }
}

/// All built-in characters
pub fn roster() -> Vec<CharacterDefinition> {
    vec![alpha(), beta()]
}
