//! Structured logging for the fight core.
//!
//! Everything logs through `tracing`. Hosts either install their own
//! subscriber (Bevy's `LogPlugin` does) or call [`init_logging`] once;
//! repeated calls are harmless. Combat events get one line each under the
//! `fight_core::events` target, so they can be silenced or raised on their
//! own.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Once;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::span::EnteredSpan;
use tracing_subscriber::EnvFilter;

use crate::events::CombatEvent;

pub const EVENTS_TARGET: &str = "fight_core::events";

/// Installs the fmt subscriber when the app is built
#[derive(Default)]
pub struct LoggingPlugin {
    pub settings: LogSettings,
}

impl Plugin for LoggingPlugin {
    fn build(&self, _app: &mut App) {
        init_logging(&self.settings);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Verbosity {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl fmt::Display for Verbosity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verbosity::Off => "off",
            Verbosity::Error => "error",
            Verbosity::Warn => "warn",
            Verbosity::Info => "info",
            Verbosity::Debug => "debug",
            Verbosity::Trace => "trace",
        })
    }
}

/// Subscriber settings. Loadable from JSON next to the match config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    pub base: Verbosity,
    /// Per-target overrides keyed by module path
    pub targets: BTreeMap<String, Verbosity>,
    pub show_targets: bool,
    pub source_locations: bool,
    pub ansi: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        let targets = [
            ("fight_core::input", Verbosity::Info),
            ("fight_core::actor", Verbosity::Info),
            ("fight_core::combat", Verbosity::Debug),
            ("fight_core::engine", Verbosity::Info),
            ("fight_core::moves", Verbosity::Warn),
            (EVENTS_TARGET, Verbosity::Info),
        ]
        .into_iter()
        .map(|(target, level)| (target.to_string(), level))
        .collect();
        Self {
            base: Verbosity::Info,
            targets,
            show_targets: true,
            source_locations: false,
            ansi: true,
        }
    }
}

impl LogSettings {
    /// Settings with every fight target at the same verbosity
    pub fn uniform(level: Verbosity) -> Self {
        let mut settings = Self::default();
        settings.base = level;
        for value in settings.targets.values_mut() {
            *value = level;
        }
        settings
    }

    /// `RUST_LOG`-style directives, e.g. `info,fight_core::combat=debug`
    pub fn directives(&self) -> String {
        std::iter::once(self.base.to_string())
            .chain(
                self.targets
                    .iter()
                    .map(|(target, level)| format!("{target}={level}")),
            )
            .collect::<Vec<_>>()
            .join(",")
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

static LOGGING_INIT: Once = Once::new();

pub fn init_logging_default() {
    init_logging(&LogSettings::default());
}

/// Install a compact fmt subscriber. First call wins; `RUST_LOG` overrides
/// the configured directives.
pub fn init_logging(settings: &LogSettings) {
    let settings = settings.clone();
    LOGGING_INIT.call_once(move || {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(settings.directives()));
        let installed = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(settings.show_targets)
            .with_file(settings.source_locations)
            .with_line_number(settings.source_locations)
            .with_ansi(settings.ansi)
            .compact()
            .try_init();
        // A host subscriber may already be installed
        if installed.is_err() {
            tracing::debug!("global subscriber already set");
        }
    });
}

/// Span wrapping one simulation tick
pub fn tick_span(tick: u64) -> EnteredSpan {
    tracing::debug_span!("tick", tick).entered()
}

/// Emit one structured line for a combat event.
pub fn log_event(event: &CombatEvent) {
    match event {
        CombatEvent::HitLanded {
            attacker,
            victim,
            move_id,
            damage,
            combo_count,
            ..
        } => tracing::info!(
            target: EVENTS_TARGET,
            attacker = attacker.0,
            victim = victim.0,
            move_id = %move_id,
            damage,
            combo = combo_count,
            "hit"
        ),
        CombatEvent::ComboEnded {
            actor,
            count,
            total_damage,
            quality,
            ..
        } => tracing::info!(
            target: EVENTS_TARGET,
            actor = actor.0,
            count,
            total_damage,
            quality = quality.as_str(),
            "combo ended"
        ),
        CombatEvent::ActorDefeated { actor, by } => tracing::info!(
            target: EVENTS_TARGET,
            actor = actor.0,
            by = ?by.map(|id| id.0),
            "defeated"
        ),
        other => tracing::debug!(
            target: EVENTS_TARGET,
            actor = other.actor().0,
            "{}",
            other.name()
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actor::ActorId;

    #[test]
    fn test_default_directives() {
        let directives = LogSettings::default().directives();
        assert!(directives.starts_with("info,"));
        assert!(directives.contains("fight_core::combat=debug"));
        assert!(directives.contains("fight_core::moves=warn"));
        assert!(directives.contains("fight_core::events=info"));
    }

    #[test]
    fn test_uniform_settings() {
        let settings = LogSettings::uniform(Verbosity::Trace);
        assert!(settings.targets.values().all(|v| *v == Verbosity::Trace));
        assert!(settings.directives().starts_with("trace,"));

        let quiet = LogSettings {
            base: Verbosity::Warn,
            targets: BTreeMap::from([(EVENTS_TARGET.to_string(), Verbosity::Off)]),
            ..Default::default()
        };
        assert_eq!(quiet.directives(), "warn,fight_core::events=off");
    }

    #[test]
    fn test_settings_json() {
        let settings = LogSettings::default();
        let json = settings.to_json().unwrap();
        assert_eq!(LogSettings::from_json(&json).unwrap(), settings);

        let partial = LogSettings::from_json(r#"{"base":"warn","ansi":false}"#).unwrap();
        assert_eq!(partial.base, Verbosity::Warn);
        assert!(!partial.ansi);
        assert!(!partial.targets.is_empty());
        assert!(LogSettings::from_json(r#"{"base":"loud"}"#).is_err());
    }

    #[test]
    fn test_verbosity_order() {
        assert!(Verbosity::Trace > Verbosity::Info);
        assert!(Verbosity::Off < Verbosity::Error);
    }

    #[test]
    fn test_init_is_idempotent() {
        init_logging_default();
        init_logging(&LogSettings::uniform(Verbosity::Debug));
        let _span = tick_span(1);
        log_event(&CombatEvent::ActorRecovered { actor: ActorId(1) });
        log_event(&CombatEvent::ActorDefeated {
            actor: ActorId(2),
            by: Some(ActorId(1)),
        });
    }
}
