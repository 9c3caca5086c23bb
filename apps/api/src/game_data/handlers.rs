use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use crate::errors::AppError;
use crate::game_data::creation::{creation_hints, CreationHints};
use crate::game_data::{ReferenceCategory, ReferenceDetail, ResourceList};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct HintsQuery {
    pub race: String,
    pub class: String,
    pub constitution: Option<i64>,
}

/// GET /api/v1/reference/:category
pub async fn handle_list_reference(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Json<ResourceList>, AppError> {
    let category: ReferenceCategory = category.parse()?;
    Ok(Json(state.game_data.list(category).await?))
}

/// GET /api/v1/reference/:category/:slug
pub async fn handle_get_reference(
    State(state): State<AppState>,
    Path((category, slug)): Path<(String, String)>,
) -> Result<Json<ReferenceDetail>, AppError> {
    let category: ReferenceCategory = category.parse()?;
    Ok(Json(state.game_data.get(category, &slug).await?))
}

/// GET /api/v1/reference/creation-hints?race=&class=&constitution=
pub async fn handle_creation_hints(
    State(state): State<AppState>,
    Query(query): Query<HintsQuery>,
) -> Result<Json<CreationHints>, AppError> {
    let hints = creation_hints(&state.game_data, &query.race, &query.class, query.constitution).await?;
    Ok(Json(hints))
}
