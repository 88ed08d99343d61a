//! Time-stamped directional history used for motion input recognition.

use std::collections::VecDeque;

use super::commands::CommandPattern;
use super::Direction;

/// Default number of directional entries kept
pub const DEFAULT_CAPACITY: usize = 20;

/// Default max age of an entry in milliseconds
pub const DEFAULT_MAX_AGE_MS: f64 = 1000.0;

/// A single recorded direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BufferedDirection {
    pub direction: Direction,
    pub time_ms: f64,
}

/// Rolling buffer of held directions, owned by one actor.
///
/// Neutral is never recorded, so a motion like down, down-forward, forward
/// matches even with brief neutral gaps between the presses.
#[derive(Debug, Clone)]
pub struct CommandBuffer {
    entries: VecDeque<BufferedDirection>,
    capacity: usize,
    max_age_ms: f64,
}

impl Default for CommandBuffer {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, DEFAULT_MAX_AGE_MS)
    }
}

impl CommandBuffer {
    pub fn new(capacity: usize, max_age_ms: f64) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity + 1),
            capacity: capacity.max(1),
            max_age_ms,
        }
    }

    /// Append a direction. Neutral is ignored.
    pub fn record(&mut self, direction: Direction, now_ms: f64) {
        if direction == Direction::Neutral {
            return;
        }
        self.entries.push_back(BufferedDirection {
            direction,
            time_ms: now_ms,
        });
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.prune(now_ms);
    }

    /// Drop entries that are `max_age_ms` old or older.
    fn prune(&mut self, now_ms: f64) {
        let max_age = self.max_age_ms;
        self.entries.retain(|e| now_ms - e.time_ms < max_age);
    }

    /// True if `pattern` appears as a contiguous run in the recent history.
    ///
    /// Scans from the most recent possible start offset backwards and stops at
    /// the first match. Nothing is consumed.
    pub fn matches(&mut self, pattern: &CommandPattern, now_ms: f64) -> bool {
        let steps = pattern.steps();
        if steps.is_empty() {
            return false;
        }
        self.prune(now_ms);
        if steps.len() > self.entries.len() {
            return false;
        }

        let last_start = self.entries.len() - steps.len();
        let found = (0..=last_start).rev().any(|start| {
            steps
                .iter()
                .enumerate()
                .all(|(j, step)| self.entries[start + j].direction == *step)
        });
        if found {
            tracing::trace!(pattern = %pattern, history = %self.recent(steps.len() + 2), "command matched");
        }
        found
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Last `count` directions rendered as "down -> down-forward -> forward".
    pub fn recent(&self, count: usize) -> String {
        let skip = self.entries.len().saturating_sub(count);
        self.entries
            .iter()
            .skip(skip)
            .map(|e| e.direction.as_str())
            .collect::<Vec<_>>()
            .join(" -> ")
    }

    pub fn iter(&self) -> impl Iterator<Item = &BufferedDirection> {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use Direction::*;

    fn qcf() -> CommandPattern {
        CommandPattern::new(vec![Down, DownForward, Forward])
    }

    #[test]
    fn test_neutral_not_recorded() {
        let mut buf = CommandBuffer::default();
        buf.record(Neutral, 0.0);
        assert!(buf.is_empty());
        buf.record(Down, 10.0);
        assert_eq!(buf.len(), 1);
    }

    #[test]
    fn test_capacity_drops_oldest() {
        let mut buf = CommandBuffer::new(3, 1000.0);
        for (i, dir) in [Up, Down, Forward, Back].into_iter().enumerate() {
            buf.record(dir, i as f64);
        }
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.recent(3), "down -> forward -> back");
    }

    #[test]
    fn test_qcf_within_window() {
        let mut buf = CommandBuffer::default();
        buf.record(Down, 0.0);
        buf.record(DownForward, 50.0);
        buf.record(Forward, 100.0);
        assert!(buf.matches(&qcf(), 100.0));
        // Matching does not consume
        assert!(buf.matches(&qcf(), 120.0));
    }

    #[test]
    fn test_qcf_expires() {
        let mut buf = CommandBuffer::default();
        buf.record(Down, 0.0);
        buf.record(DownForward, 50.0);
        buf.record(Forward, 100.0);
        assert!(!buf.matches(&qcf(), 1300.0));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_pattern_must_be_contiguous() {
        let mut buf = CommandBuffer::default();
        buf.record(Down, 0.0);
        buf.record(Up, 20.0);
        buf.record(DownForward, 40.0);
        buf.record(Forward, 60.0);
        assert!(!buf.matches(&qcf(), 60.0));
    }

    #[test]
    fn test_match_found_earlier_in_history() {
        let mut buf = CommandBuffer::default();
        buf.record(Down, 0.0);
        buf.record(DownForward, 10.0);
        buf.record(Forward, 20.0);
        buf.record(Up, 30.0);
        buf.record(Back, 40.0);
        assert!(buf.matches(&qcf(), 40.0));
    }

    #[test]
    fn test_empty_pattern_never_matches() {
        let mut buf = CommandBuffer::default();
        buf.record(Down, 0.0);
        assert!(!buf.matches(&CommandPattern::new(vec![]), 0.0));
    }

    #[test]
    fn test_clear() {
        let mut buf = CommandBuffer::default();
        buf.record(Down, 0.0);
        buf.record(DownForward, 1.0);
        buf.record(Forward, 2.0);
        buf.clear();
        assert!(!buf.matches(&qcf(), 3.0));
        assert_eq!(buf.recent(5), "");
    }
}
