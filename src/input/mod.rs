//! Per-tick input snapshot and the facing-relative direction model.
//!
//! Hosts sample their devices once per tick into an [`InputSnapshot`]. The
//! core never reads devices itself. Directions are facing-relative: a held
//! "right" is `Forward` for an actor facing +x and `Back` for one facing -x,
//! so command patterns work from both sides of the stage.

use serde::{Deserialize, Serialize};

pub mod buffer;
pub mod commands;

pub use buffer::{BufferedDirection, CommandBuffer};
pub use commands::{CommandPattern, CommandRegistry};

/// Discrete 9-way direction, relative to the actor's facing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    #[default]
    Neutral,
    Up,
    Down,
    Forward,
    Back,
    UpForward,
    UpBack,
    DownForward,
    DownBack,
}

impl Direction {
    /// Build a direction from a horizontal axis (+1 = forward) and a vertical
    /// axis (+1 = up).
    pub fn from_axes(forward: i8, up: i8) -> Self {
        match (forward.signum(), up.signum()) {
            (0, 0) => Self::Neutral,
            (0, 1) => Self::Up,
            (0, _) => Self::Down,
            (1, 0) => Self::Forward,
            (1, 1) => Self::UpForward,
            (1, _) => Self::DownForward,
            (_, 0) => Self::Back,
            (_, 1) => Self::UpBack,
            _ => Self::DownBack,
        }
    }

    pub fn is_down(&self) -> bool {
        matches!(self, Self::Down | Self::DownForward | Self::DownBack)
    }

    pub fn is_up(&self) -> bool {
        matches!(self, Self::Up | Self::UpForward | Self::UpBack)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::Up => "up",
            Self::Down => "down",
            Self::Forward => "forward",
            Self::Back => "back",
            Self::UpForward => "up-forward",
            Self::UpBack => "up-back",
            Self::DownForward => "down-forward",
            Self::DownBack => "down-back",
        }
    }
}

/// Attack buttons
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    Light,
    Heavy,
    Special,
}

impl Button {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Heavy => "heavy",
            Self::Special => "special",
        }
    }
}

/// One tick of sampled input for a single actor.
///
/// Held directions are absolute (screen space). Buttons are "just pressed"
/// edges; a button held across ticks reports `true` only on the first one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct InputSnapshot {
    pub up: bool,
    pub down: bool,
    pub left: bool,
    pub right: bool,
    pub light: bool,
    pub heavy: bool,
    pub special: bool,
}

impl InputSnapshot {
    /// Absolute horizontal axis: -1 (left), 0, +1 (right). Opposing keys cancel.
    pub fn horizontal(&self) -> i8 {
        self.right as i8 - self.left as i8
    }

    /// Vertical axis: -1 (down), 0, +1 (up).
    pub fn vertical(&self) -> i8 {
        self.up as i8 - self.down as i8
    }

    /// The held direction as seen by an actor with the given facing.
    pub fn direction(&self, facing_right: bool) -> Direction {
        let forward = if facing_right {
            self.horizontal()
        } else {
            -self.horizontal()
        };
        Direction::from_axes(forward, self.vertical())
    }

    pub fn pressed(&self, button: Button) -> bool {
        match button {
            Button::Light => self.light,
            Button::Heavy => self.heavy,
            Button::Special => self.special,
        }
    }

    pub fn any_button(&self) -> bool {
        self.light || self.heavy || self.special
    }

    pub fn with_button(mut self, button: Button) -> Self {
        match button {
            Button::Light => self.light = true,
            Button::Heavy => self.heavy = true,
            Button::Special => self.special = true,
        }
        self
    }

    /// Snapshot holding the given facing-relative direction.
    pub fn holding(direction: Direction, facing_right: bool) -> Self {
        let (forward, back) = match direction {
            Direction::Forward | Direction::UpForward | Direction::DownForward => (true, false),
            Direction::Back | Direction::UpBack | Direction::DownBack => (false, true),
            _ => (false, false),
        };
        let (right, left) = if facing_right {
            (forward, back)
        } else {
            (back, forward)
        };
        Self {
            up: direction.is_up(),
            down: direction.is_down(),
            left,
            right,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direction_from_axes() {
        assert_eq!(Direction::from_axes(0, 0), Direction::Neutral);
        assert_eq!(Direction::from_axes(1, -1), Direction::DownForward);
        assert_eq!(Direction::from_axes(-1, 1), Direction::UpBack);
        assert_eq!(Direction::from_axes(0, -1), Direction::Down);
    }

    #[test]
    fn test_direction_is_facing_relative() {
        let input = InputSnapshot {
            right: true,
            down: true,
            ..Default::default()
        };
        assert_eq!(input.direction(true), Direction::DownForward);
        assert_eq!(input.direction(false), Direction::DownBack);
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let input = InputSnapshot {
            left: true,
            right: true,
            ..Default::default()
        };
        assert_eq!(input.horizontal(), 0);
        assert_eq!(input.direction(true), Direction::Neutral);
    }

    #[test]
    fn test_holding_roundtrips_direction() {
        for facing in [true, false] {
            for dir in [
                Direction::Neutral,
                Direction::Forward,
                Direction::DownBack,
                Direction::UpForward,
            ] {
                assert_eq!(InputSnapshot::holding(dir, facing).direction(facing), dir);
            }
        }
    }

    #[test]
    fn test_direction_serde_names() {
        let json = serde_json::to_string(&Direction::DownForward).unwrap();
        assert_eq!(json, "\"down-forward\"");
    }
}
