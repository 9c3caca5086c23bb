//! Bulk character import from a JSON document.
//!
//! The document is either `{"characters": [...]}` or a bare array. Each
//! entry is a character creation form with optional `skills` and `spells`
//! lists. The whole document is parsed and validated before the first
//! backend write; a single bad record rejects the import. If the backend
//! fails partway through, characters created by the same import are
//! deleted again before the error is returned.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};

use crate::backend::CharacterBackend;
use crate::characters::validation::{
    validate_new_character, validate_skill, validate_spell, FieldError,
};
use crate::errors::AppError;
use crate::models::{NewCharacter, RecordId, Skill, Spell};

pub const MAX_IMPORT_CHARACTERS: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct SkillInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub level: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SpellInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub level_spell: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ImportedCharacter {
    #[serde(flatten)]
    pub character: NewCharacter,
    #[serde(default)]
    pub skills: Vec<SkillInput>,
    #[serde(default)]
    pub spells: Vec<SpellInput>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImportSummary {
    pub id: Option<RecordId>,
    pub name: Option<String>,
    pub skills: usize,
    pub spells: usize,
}

/// Parses and validates an import document without touching the backend.
pub fn parse_import(text: &str) -> Result<Vec<ImportedCharacter>, Vec<FieldError>> {
    let root: Value = serde_json::from_str(text).map_err(|e| {
        vec![FieldError {
            field: format!("line {} column {}", e.line(), e.column()),
            message: e.to_string(),
        }]
    })?;

    let entries = match root {
        Value::Array(items) => items,
        Value::Object(mut map) => match map.remove("characters") {
            Some(Value::Array(items)) => items,
            _ => return Err(vec![error("characters", "expected an array of characters")]),
        },
        _ => {
            return Err(vec![error(
                "$",
                "expected an array or an object with a 'characters' array",
            )])
        }
    };

    if entries.is_empty() {
        return Err(vec![error("characters", "no characters to import")]);
    }
    if entries.len() > MAX_IMPORT_CHARACTERS {
        return Err(vec![error(
            "characters",
            format!("at most {MAX_IMPORT_CHARACTERS} characters per import, got {}", entries.len()),
        )]);
    }

    let mut parsed = Vec::with_capacity(entries.len());
    let mut errors = Vec::new();
    for (i, entry) in entries.into_iter().enumerate() {
        let path = format!("characters[{i}]");
        match serde_json::from_value::<ImportedCharacter>(entry) {
            Ok(record) => {
                errors.extend(validate_record(&record, &path));
                parsed.push(record);
            }
            Err(e) => errors.push(error(&path, e.to_string())),
        }
    }

    if errors.is_empty() {
        Ok(parsed)
    } else {
        Err(errors)
    }
}

fn error(field: &str, message: impl Into<String>) -> FieldError {
    FieldError {
        field: field.to_string(),
        message: message.into(),
    }
}

fn validate_record(record: &ImportedCharacter, path: &str) -> Vec<FieldError> {
    let mut errors: Vec<FieldError> = validate_new_character(&record.character)
        .into_iter()
        .map(|e| e.nested(path))
        .collect();
    for (j, skill) in record.skills.iter().enumerate() {
        let prefix = format!("{path}.skills[{j}]");
        errors.extend(validate_skill(&skill.name).into_iter().map(|e| e.nested(&prefix)));
    }
    for (j, spell) in record.spells.iter().enumerate() {
        let prefix = format!("{path}.spells[{j}]");
        errors.extend(
            validate_spell(&spell.name, spell.level_spell)
                .into_iter()
                .map(|e| e.nested(&prefix)),
        );
    }
    errors
}

/// Writes validated records for `owner`, in document order. Either every
/// record is written or none of the created characters remain.
pub async fn import_characters(
    backend: &dyn CharacterBackend,
    owner: &RecordId,
    records: Vec<ImportedCharacter>,
) -> Result<Vec<ImportSummary>, AppError> {
    let mut created = Vec::new();
    match write_records(backend, owner, records, &mut created).await {
        Ok(summaries) => Ok(summaries),
        Err(err) => {
            roll_back(backend, &created).await;
            Err(err)
        }
    }
}

async fn write_records(
    backend: &dyn CharacterBackend,
    owner: &RecordId,
    records: Vec<ImportedCharacter>,
    created: &mut Vec<RecordId>,
) -> Result<Vec<ImportSummary>, AppError> {
    let mut summaries = Vec::with_capacity(records.len());

    for record in records {
        let mut form = record.character;
        form.id_user = Some(owner.clone());
        let character = backend.create_character(&form).await?;
        let character_id = character
            .id
            .clone()
            .ok_or_else(|| anyhow::anyhow!("backend created a character without an id"))?;
        created.push(character_id.clone());

        for skill in &record.skills {
            backend
                .create_skill(&Skill {
                    id: None,
                    id_character: character_id.clone(),
                    name: skill.name.trim().to_string(),
                    description: skill.description.clone(),
                    level: skill.level,
                })
                .await?;
        }
        for spell in &record.spells {
            backend
                .create_spell(&Spell {
                    id: None,
                    id_character: character_id.clone(),
                    name: spell.name.trim().to_string(),
                    description: spell.description.clone(),
                    level_spell: Some(spell.level_spell),
                })
                .await?;
        }

        info!(
            character_id = %character_id,
            skills = record.skills.len(),
            spells = record.spells.len(),
            "Imported character"
        );
        summaries.push(ImportSummary {
            id: Some(character_id),
            name: character.name,
            skills: record.skills.len(),
            spells: record.spells.len(),
        });
    }

    Ok(summaries)
}

/// Deletes characters written by a failed import. Best effort: a failed
/// delete is logged and the rest are still attempted.
async fn roll_back(backend: &dyn CharacterBackend, created: &[RecordId]) {
    if created.is_empty() {
        return;
    }
    warn!(count = created.len(), "Import failed, removing created characters");
    for id in created {
        if let Err(e) = backend.delete_character(id).await {
            warn!(character_id = %id, error = %e, "Could not remove imported character");
        }
    }
}
