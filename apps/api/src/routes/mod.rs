pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::auth::handlers as session;
use crate::characters::handlers as characters;
use crate::game_data::handlers as reference;
use crate::sheet::handlers as sheet;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Sessions
        .route(
            "/api/v1/session",
            post(session::handle_sign_in)
                .get(session::handle_get_session)
                .delete(session::handle_sign_out),
        )
        // Characters
        .route(
            "/api/v1/characters",
            get(characters::handle_list_characters).post(characters::handle_create_character),
        )
        .route("/api/v1/characters/import", post(characters::handle_import))
        .route(
            "/api/v1/characters/:id",
            get(characters::handle_get_character).delete(characters::handle_delete_character),
        )
        .route(
            "/api/v1/characters/:id/skills",
            get(characters::handle_list_skills).post(characters::handle_create_skill),
        )
        .route(
            "/api/v1/characters/:id/spells",
            get(characters::handle_list_spells).post(characters::handle_create_spell),
        )
        // Sheets
        .route("/api/v1/characters/:id/sheet", get(sheet::handle_sheet_preview))
        .route(
            "/api/v1/characters/:id/sheet/download",
            get(sheet::handle_sheet_download),
        )
        // Reference data
        .route(
            "/api/v1/reference/creation-hints",
            get(reference::handle_creation_hints),
        )
        .route("/api/v1/reference/:category", get(reference::handle_list_reference))
        .route(
            "/api/v1/reference/:category/:slug",
            get(reference::handle_get_reference),
        )
        .with_state(state)
}
