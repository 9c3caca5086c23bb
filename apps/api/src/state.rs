use std::sync::Arc;

use crate::auth::SessionStore;
use crate::backend::CharacterBackend;
use crate::game_data::GameDataClient;
use crate::sheet::SheetService;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    /// Record store. `BackendClient` in production, in-memory in tests.
    pub backend: Arc<dyn CharacterBackend>,
    pub game_data: GameDataClient,
    /// Sheet renderer and its per-character cache, shared by preview and download.
    pub sheets: SheetService,
    pub sessions: Arc<SessionStore>,
}
