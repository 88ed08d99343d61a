//! Character catalog loading (RON or JSON) with load-time validation.
//!
//! The core assumes validated data, so every structural problem is rejected
//! here. Frame counts are required fields; a file missing `startup`,
//! `active`, or `recovery` fails to parse.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, warn};

use crate::input::CommandRegistry;

use super::CharacterDefinition;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid RON: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("failed to write RON: {0}")]
    RonWrite(#[from] ron::Error),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported catalog format `{0}` (expected .ron or .json)")]
    UnsupportedFormat(String),
    #[error("character `{0}` has no moves")]
    NoMoves(String),
    #[error("duplicate move id `{0}`")]
    DuplicateMove(String),
    #[error("move `{move_id}` has no frames")]
    EmptyTimeline { move_id: String },
    #[error("move `{move_id}` has move_control_factor {value} outside 0..=1")]
    ControlFactorOutOfRange { move_id: String, value: f32 },
    #[error("move `{move_id}` has a non-finite {field}")]
    NonFinite { move_id: String, field: &'static str },
    #[error("`{source_entry}` references unknown move `{move_id}`")]
    UnknownMove {
        source_entry: String,
        move_id: String,
    },
}

/// Parse a character from RON text and validate it.
pub fn load_character_ron(
    text: &str,
    registry: &CommandRegistry,
) -> Result<CharacterDefinition, CatalogError> {
    let def: CharacterDefinition = ron::from_str(text)?;
    validate(&def, registry)?;
    Ok(def)
}

/// Parse a character from JSON text and validate it.
pub fn load_character_json(
    text: &str,
    registry: &CommandRegistry,
) -> Result<CharacterDefinition, CatalogError> {
    let def: CharacterDefinition = serde_json::from_str(text)?;
    validate(&def, registry)?;
    Ok(def)
}

/// Load a character file, picking the format from the extension.
pub fn load_character_file(
    path: &Path,
    registry: &CommandRegistry,
) -> Result<CharacterDefinition, CatalogError> {
    let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let def = match ext.as_str() {
        "ron" => load_character_ron(&text, registry)?,
        "json" => load_character_json(&text, registry)?,
        other => return Err(CatalogError::UnsupportedFormat(other.to_string())),
    };
    debug!(path = %path.display(), character = %def.name, moves = def.moves.len(), "loaded character");
    Ok(def)
}

/// Serialize a character as pretty RON.
pub fn to_ron(def: &CharacterDefinition) -> Result<String, CatalogError> {
    Ok(ron::ser::to_string_pretty(
        def,
        ron::ser::PrettyConfig::default(),
    )?)
}

/// Reject malformed data. Unknown command names are only logged: a special
/// whose motion is missing from the registry can never fire, which is the
/// same outcome the core produces at runtime.
pub fn validate(def: &CharacterDefinition, registry: &CommandRegistry) -> Result<(), CatalogError> {
    if def.moves.is_empty() {
        return Err(CatalogError::NoMoves(def.name.clone()));
    }

    let mut seen = HashSet::new();
    for m in &def.moves {
        if !seen.insert(m.id.as_str()) {
            return Err(CatalogError::DuplicateMove(m.id.clone()));
        }
        if m.total_frames() == 0 {
            return Err(CatalogError::EmptyTimeline {
                move_id: m.id.clone(),
            });
        }
        if let Some(value) = m.move_control_factor {
            if !(0.0..=1.0).contains(&value) {
                return Err(CatalogError::ControlFactorOutOfRange {
                    move_id: m.id.clone(),
                    value,
                });
            }
        }
        let finite = |v: &[f32]| v.iter().all(|x| x.is_finite());
        if !finite(&m.knockback) {
            return Err(CatalogError::NonFinite {
                move_id: m.id.clone(),
                field: "knockback",
            });
        }
        if m.velocity.is_some_and(|v| !finite(&v)) {
            return Err(CatalogError::NonFinite {
                move_id: m.id.clone(),
                field: "velocity",
            });
        }
        if !finite(&m.hitbox.offset) || !finite(&m.hitbox.size) {
            return Err(CatalogError::NonFinite {
                move_id: m.id.clone(),
                field: "hitbox",
            });
        }
        if let Some(command) = &m.command {
            if !registry.contains(command) {
                warn!(character = %def.name, move_id = %m.id, command = %command, "unknown command pattern");
            }
        }
    }

    for special in &def.specials {
        if !seen.contains(special.move_id.as_str()) {
            return Err(CatalogError::UnknownMove {
                source_entry: format!("special {}", special.command),
                move_id: special.move_id.clone(),
            });
        }
        if !registry.contains(&special.command) {
            warn!(character = %def.name, command = %special.command, "unknown command pattern");
        }
    }

    if let Some(neutral) = &def.neutral_special {
        if !seen.contains(neutral.as_str()) {
            return Err(CatalogError::UnknownMove {
                source_entry: "neutral_special".into(),
                move_id: neutral.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::moves::roster;
    use std::io::Write;

    const MINIMAL_RON: &str = r#"(
        name: "Gamma",
        moves: [
            (id: "light", startup: 3, active: 2, recovery: 6, damage: 30, move_control_factor: Some(0.5)),
            (id: "special", startup: 10, active: 2, recovery: 12, kind: projectile),
        ],
        specials: [(command: "QCF", button: special, move_id: "special")],
        neutral_special: Some("special"),
    )"#;

    #[test]
    fn test_load_minimal_ron() {
        let def = load_character_ron(MINIMAL_RON, &CommandRegistry::standard()).unwrap();
        assert_eq!(def.name, "Gamma");
        assert_eq!(def.moves.len(), 2);
        assert_eq!(def.stats.walk_speed, 300.0);
        assert!(def.moves[1].kind.is_projectile());
    }

    #[test]
    fn test_missing_frame_field_is_fatal() {
        let text = r#"(name: "Bad", moves: [(id: "light", startup: 3, active: 2)])"#;
        let err = load_character_ron(text, &CommandRegistry::standard()).unwrap_err();
        assert!(matches!(err, CatalogError::Ron(_)));
    }

    #[test]
    fn test_control_factor_out_of_range() {
        let mut def = roster::alpha();
        def.moves[0].move_control_factor = Some(1.5);
        let err = validate(&def, &CommandRegistry::standard()).unwrap_err();
        assert!(matches!(err, CatalogError::ControlFactorOutOfRange { .. }));
    }

    #[test]
    fn test_duplicate_and_unknown_references() {
        let registry = CommandRegistry::standard();
        let mut def = roster::alpha();
        let dup = def.moves[0].clone();
        def.moves.push(dup);
        assert!(matches!(
            validate(&def, &registry),
            Err(CatalogError::DuplicateMove(_))
        ));

        let mut def = roster::alpha();
        def.specials[0].move_id = "nope".into();
        assert!(matches!(
            validate(&def, &registry),
            Err(CatalogError::UnknownMove { .. })
        ));
    }

    #[test]
    fn test_unknown_command_only_warns() {
        let mut def = roster::alpha();
        def.specials[0].command = "PRETZEL".into();
        assert!(validate(&def, &CommandRegistry::standard()).is_ok());
    }

    #[test]
    fn test_empty_timeline_rejected() {
        let mut def = roster::beta();
        def.moves[0].startup = 0;
        def.moves[0].active = 0;
        def.moves[0].recovery = 0;
        assert!(matches!(
            validate(&def, &CommandRegistry::standard()),
            Err(CatalogError::EmptyTimeline { .. })
        ));
    }

    #[test]
    fn test_file_roundtrip_ron_and_json() {
        let registry = CommandRegistry::standard();
        let dir = tempfile::tempdir().unwrap();

        let ron_path = dir.path().join("alpha.ron");
        let mut file = std::fs::File::create(&ron_path).unwrap();
        file.write_all(to_ron(&roster::alpha()).unwrap().as_bytes())
            .unwrap();
        let loaded = load_character_file(&ron_path, &registry).unwrap();
        assert_eq!(loaded, roster::alpha());

        let json_path = dir.path().join("beta.json");
        std::fs::write(&json_path, serde_json::to_string(&roster::beta()).unwrap()).unwrap();
        let loaded = load_character_file(&json_path, &registry).unwrap();
        assert_eq!(loaded.name, "Beta");
    }

    #[test]
    fn test_unsupported_extension_and_missing_file() {
        let registry = CommandRegistry::standard();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("alpha.yaml");
        std::fs::write(&path, "name: Alpha").unwrap();
        assert!(matches!(
            load_character_file(&path, &registry),
            Err(CatalogError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            load_character_file(&dir.path().join("missing.ron"), &registry),
            Err(CatalogError::Io { .. })
        ));
    }
}
