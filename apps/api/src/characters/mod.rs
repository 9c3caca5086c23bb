pub mod handlers;
pub mod import;
pub mod validation;

use tracing::warn;

use crate::auth::Session;
use crate::backend::CharacterBackend;
use crate::errors::AppError;
use crate::models::{Character, RecordId};

/// Rejects access to a character owned by someone else.
pub fn ensure_owner(character: &Character, session: &Session) -> Result<(), AppError> {
    if character.is_owned_by(&session.user.id) {
        Ok(())
    } else {
        warn!(
            user_id = %session.user.id,
            character_id = ?character.id,
            "Rejected access to a character of another user"
        );
        Err(AppError::Forbidden)
    }
}

/// Loads a character and checks it belongs to the session user.
pub async fn owned_character(
    backend: &dyn CharacterBackend,
    session: &Session,
    id: &RecordId,
) -> Result<Character, AppError> {
    let character = backend
        .get_character(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("character {id}")))?;
    ensure_owner(&character, session)?;
    Ok(character)
}
