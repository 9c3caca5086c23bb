use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use tracing::info;

use crate::auth::AuthSession;
use crate::characters::import::{import_characters, parse_import, ImportSummary, SkillInput, SpellInput};
use crate::characters::owned_character;
use crate::characters::validation::{
    check, into_app_error, validate_new_character, validate_skill, validate_spell,
};
use crate::errors::AppError;
use crate::models::{Character, NewCharacter, RecordId, Skill, Spell};
use crate::state::AppState;

#[derive(Serialize)]
pub struct ImportResponse {
    pub imported: Vec<ImportSummary>,
}

/// GET /api/v1/characters
pub async fn handle_list_characters(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> Result<Json<Vec<Character>>, AppError> {
    let characters = state.backend.list_characters(&session.user.id).await?;
    Ok(Json(characters))
}

/// POST /api/v1/characters
pub async fn handle_create_character(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Json(mut form): Json<NewCharacter>,
) -> Result<(StatusCode, Json<Character>), AppError> {
    check(validate_new_character(&form))?;
    form.name = form.name.trim().to_string();
    form.id_user = Some(session.user.id.clone());

    let created = state.backend.create_character(&form).await?;
    info!(user_id = %session.user.id, character_id = ?created.id, "Character created");
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/characters/:id
pub async fn handle_get_character(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> Result<Json<Character>, AppError> {
    let id = RecordId(id);
    let character = owned_character(state.backend.as_ref(), &session, &id).await?;
    Ok(Json(character))
}

/// DELETE /api/v1/characters/:id
pub async fn handle_delete_character(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    let id = RecordId(id);
    owned_character(state.backend.as_ref(), &session, &id).await?;
    state.backend.delete_character(&id).await?;
    state.sheets.invalidate(&id);
    info!(user_id = %session.user.id, character_id = %id, "Character deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/characters/:id/skills
pub async fn handle_list_skills(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> Result<Json<Vec<Skill>>, AppError> {
    let id = RecordId(id);
    owned_character(state.backend.as_ref(), &session, &id).await?;
    Ok(Json(state.backend.list_skills(&id).await?))
}

/// POST /api/v1/characters/:id/skills
pub async fn handle_create_skill(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
    Json(input): Json<SkillInput>,
) -> Result<(StatusCode, Json<Skill>), AppError> {
    check(validate_skill(&input.name))?;
    let id = RecordId(id);
    owned_character(state.backend.as_ref(), &session, &id).await?;

    let created = state
        .backend
        .create_skill(&Skill {
            id: None,
            id_character: id.clone(),
            name: input.name.trim().to_string(),
            description: input.description,
            level: input.level,
        })
        .await?;
    state.sheets.invalidate(&id);
    Ok((StatusCode::CREATED, Json(created)))
}

/// GET /api/v1/characters/:id/spells
pub async fn handle_list_spells(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
) -> Result<Json<Vec<Spell>>, AppError> {
    let id = RecordId(id);
    owned_character(state.backend.as_ref(), &session, &id).await?;
    Ok(Json(state.backend.list_spells(&id).await?))
}

/// POST /api/v1/characters/:id/spells
pub async fn handle_create_spell(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    Path(id): Path<String>,
    Json(input): Json<SpellInput>,
) -> Result<(StatusCode, Json<Spell>), AppError> {
    check(validate_spell(&input.name, input.level_spell))?;
    let id = RecordId(id);
    owned_character(state.backend.as_ref(), &session, &id).await?;

    let created = state
        .backend
        .create_spell(&Spell {
            id: None,
            id_character: id.clone(),
            name: input.name.trim().to_string(),
            description: input.description,
            level_spell: Some(input.level_spell),
        })
        .await?;
    state.sheets.invalidate(&id);
    Ok((StatusCode::CREATED, Json(created)))
}

/// POST /api/v1/characters/import
/// Body is the raw JSON document; nothing is written unless all of it is valid.
pub async fn handle_import(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
    body: String,
) -> Result<(StatusCode, Json<ImportResponse>), AppError> {
    let records = parse_import(&body).map_err(into_app_error)?;
    let imported = import_characters(state.backend.as_ref(), &session.user.id, records).await?;
    info!(user_id = %session.user.id, count = imported.len(), "Import finished");
    Ok((StatusCode::CREATED, Json(ImportResponse { imported })))
}
