//! Named motion patterns (QCF, DP, ...) and their direction sequences.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Direction;

/// Ordered sequence of directions recognized as a motion input
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandPattern(Vec<Direction>);

impl CommandPattern {
    pub fn new(steps: Vec<Direction>) -> Self {
        Self(steps)
    }

    pub fn steps(&self) -> &[Direction] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CommandPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.0.iter().map(Direction::as_str).collect();
        write!(f, "[{}]", names.join(", "))
    }
}

/// Lookup table from command name to pattern.
///
/// Unknown names resolve to `None`; callers treat that as "no such move".
#[derive(Debug, Clone)]
pub struct CommandRegistry {
    commands: HashMap<String, CommandPattern>,
}

impl Default for CommandRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl CommandRegistry {
    pub fn empty() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// The standard fighting game motions, facing-relative.
    pub fn standard() -> Self {
        use Direction::*;

        let mut registry = Self::empty();
        // Quarter circle forward / back
        registry.register("QCF", vec![Down, DownForward, Forward]);
        registry.register("QCB", vec![Down, DownBack, Back]);
        // Half circle forward / back
        registry.register("HCF", vec![Back, DownBack, Down, DownForward, Forward]);
        registry.register("HCB", vec![Forward, DownForward, Down, DownBack, Back]);
        // Dragon punch and its reverse
        registry.register("DP", vec![Forward, Down, DownForward]);
        registry.register("RDP", vec![Back, Down, DownBack]);
        registry.register("SGS", vec![Back, Back, Down, Forward]);
        registry
    }

    pub fn get(&self, name: &str) -> Option<&CommandPattern> {
        self.commands.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.commands.contains_key(name)
    }

    /// Add or replace a named pattern
    pub fn register(&mut self, name: &str, steps: Vec<Direction>) {
        self.commands
            .insert(name.to_string(), CommandPattern::new(steps));
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}
