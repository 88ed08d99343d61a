//! Super meter: a bounded accumulator with a derived discrete level.

use serde::{Deserialize, Serialize};

use crate::constants::METER_LEVELS;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceMeter {
    value: u32,
    max: u32,
    level: u32,
}

impl ResourceMeter {
    pub fn new(max: u32) -> Self {
        Self {
            value: 0,
            max,
            level: 0,
        }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// `clamp(floor(value / (max / 3)), 0, 3)`
    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn fraction(&self) -> f32 {
        if self.max == 0 {
            0.0
        } else {
            self.value as f32 / self.max as f32
        }
    }

    pub fn can_afford(&self, amount: u32) -> bool {
        self.value >= amount
    }

    pub fn gain(&mut self, amount: u32) {
        self.value = self.value.saturating_add(amount).min(self.max);
        self.recompute_level();
    }

    /// Spend meter. Callers check [`Self::can_afford`] first; an overdraw is
    /// a logic error and is clamped at zero.
    pub fn spend(&mut self, amount: u32) {
        debug_assert!(self.value >= amount, "spend without enough meter");
        self.value = self.value.saturating_sub(amount);
        self.recompute_level();
    }

    fn recompute_level(&mut self) {
        self.level = if self.max == 0 {
            0
        } else {
            // floor(value / (max / 3)) == floor(3 * value / max)
            ((self.value as u64 * METER_LEVELS as u64) / self.max as u64).min(METER_LEVELS as u64)
                as u32
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gain_saturates() {
        let mut meter = ResourceMeter::new(300);
        for _ in 0..10 {
            meter.gain(70);
            assert!(meter.value() <= 300);
        }
        assert_eq!(meter.value(), 300);
        assert_eq!(meter.level(), 3);
        meter.gain(u32::MAX);
        assert_eq!(meter.value(), 300);
    }

    #[test]
    fn test_level_boundaries() {
        let mut meter = ResourceMeter::new(300);
        meter.gain(99);
        assert_eq!(meter.level(), 0);
        meter.gain(1);
        assert_eq!(meter.level(), 1);
        meter.gain(100);
        assert_eq!(meter.level(), 2);
        meter.gain(99);
        assert_eq!(meter.level(), 2);
        meter.gain(1);
        assert_eq!(meter.level(), 3);
    }

    #[test]
    fn test_spend_recomputes_level() {
        let mut meter = ResourceMeter::new(300);
        meter.gain(250);
        assert_eq!(meter.level(), 2);
        assert!(meter.can_afford(100));
        meter.spend(100);
        assert_eq!(meter.value(), 150);
        assert_eq!(meter.level(), 1);
        assert!(!meter.can_afford(200));
    }

    #[test]
    fn test_two_hits_reach_level_one() {
        let mut meter = ResourceMeter::new(300);
        meter.gain(50);
        assert_eq!((meter.value(), meter.level()), (50, 0));
        meter.gain(50);
        assert_eq!((meter.value(), meter.level()), (100, 1));
    }

    #[test]
    fn test_zero_max() {
        let mut meter = ResourceMeter::new(0);
        meter.gain(10);
        assert_eq!(meter.value(), 0);
        assert_eq!(meter.level(), 0);
        assert_eq!(meter.fraction(), 0.0);
    }
}
