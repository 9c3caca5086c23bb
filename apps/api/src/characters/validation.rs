use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::NewCharacter;

pub const MIN_SPELL_LEVEL: i64 = 1;
pub const MAX_SPELL_LEVEL: i64 = 9;

/// One rule violation. `field` is a dotted path into the submitted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Re-roots the error under `prefix` (`level` -> `characters[2].level`).
    pub fn nested(self, prefix: &str) -> Self {
        Self {
            field: format!("{prefix}.{}", self.field),
            message: self.message,
        }
    }
}

/// Collapses violations into a single 400 response.
pub fn into_app_error(errors: Vec<FieldError>) -> AppError {
    let summary = errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ");
    AppError::Validation(summary)
}

pub fn check(errors: Vec<FieldError>) -> Result<(), AppError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(into_app_error(errors))
    }
}

/// Checks a creation form. Returns every violation, not just the first.
pub fn validate_new_character(character: &NewCharacter) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if character.name.trim().is_empty() {
        errors.push(FieldError::new("name", "must not be empty"));
    }
    if character.level < 1 {
        errors.push(FieldError::new(
            "level",
            format!("must be at least 1, got {}", character.level),
        ));
    }
    errors
}

pub fn validate_skill(name: &str) -> Vec<FieldError> {
    if name.trim().is_empty() {
        vec![FieldError::new("name", "must not be empty")]
    } else {
        vec![]
    }
}

pub fn validate_spell(name: &str, level_spell: i64) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if name.trim().is_empty() {
        errors.push(FieldError::new("name", "must not be empty"));
    }
    if !(MIN_SPELL_LEVEL..=MAX_SPELL_LEVEL).contains(&level_spell) {
        errors.push(FieldError::new(
            "level_spell",
            format!("must be between {MIN_SPELL_LEVEL} and {MAX_SPELL_LEVEL}, got {level_spell}"),
        ));
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(name: &str, level: i64) -> NewCharacter {
        serde_json::from_value(serde_json::json!({
            "name": name, "race": "dwarf", "class": "fighter", "level": level,
            "strength": 16, "dexterity": 12, "constitution": 15,
            "intelligence": 10, "wisdom": 11, "charisma": 8,
            "hit_points": 28, "armor_class": 18, "initiative": 1, "speed": 25
        }))
        .unwrap()
    }

    #[test]
    fn test_valid_character_passes() {
        assert!(validate_new_character(&form("Thrain", 3)).is_empty());
    }

    #[test]
    fn test_reports_every_violation() {
        let errors = validate_new_character(&form("   ", 0));
        let fields: Vec<&str> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "level"]);
    }

    #[test]
    fn test_spell_level_bounds() {
        assert!(validate_spell("Shield", 1).is_empty());
        assert!(validate_spell("Wish", 9).is_empty());
        assert_eq!(validate_spell("Cantrip", 0)[0].field, "level_spell");
        assert_eq!(validate_spell("Beyond", 10)[0].field, "level_spell");
        assert_eq!(validate_spell("", 3)[0].field, "name");
    }

    #[test]
    fn test_skill_name_required() {
        assert!(validate_skill("Athletics").is_empty());
        assert_eq!(validate_skill(" \t").len(), 1);
    }

    #[test]
    fn test_nested_paths_and_summary() {
        let err = FieldError::new("level", "must be at least 1").nested("characters[2]");
        assert_eq!(err.field, "characters[2].level");
        match into_app_error(vec![err]) {
            AppError::Validation(msg) => assert_eq!(msg, "characters[2].level: must be at least 1"),
            other => panic!("expected Validation, got {other:?}"),
        }
    }
}
