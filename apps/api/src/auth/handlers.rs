use axum::{extract::State, http::StatusCode, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::auth::{AuthSession, Session};
use crate::errors::AppError;
use crate::models::{NewUser, User};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub token: Uuid,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

impl From<Session> for SessionResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.token,
            expires_at: session.expires_at,
            user: session.user,
        }
    }
}

fn validate_profile(profile: &NewUser) -> Result<NewUser, AppError> {
    let name = profile.name.trim();
    let email = profile.email.trim().to_lowercase();
    if name.is_empty() {
        return Err(AppError::Validation("name must not be empty".into()));
    }
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
        _ => return Err(AppError::Validation(format!("'{email}' is not an email address"))),
    }
    Ok(NewUser {
        name: name.to_string(),
        email,
    })
}

/// POST /api/v1/session
/// Signs in with the identity provider profile, registering the user on
/// first sight.
pub async fn handle_sign_in(
    State(state): State<AppState>,
    Json(profile): Json<NewUser>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let profile = validate_profile(&profile)?;

    let user = match state.backend.find_user_by_email(&profile.email).await? {
        Some(user) => user,
        None => {
            let user = state.backend.register_user(&profile).await?;
            info!(user_id = %user.id, "Registered new user");
            user
        }
    };

    let session = state.sessions.create(user).await;
    info!(user_id = %session.user.id, expires_at = %session.expires_at, "Session created");
    Ok((StatusCode::CREATED, Json(session.into())))
}

/// GET /api/v1/session
pub async fn handle_get_session(AuthSession(session): AuthSession) -> Json<SessionResponse> {
    Json(session.into())
}

/// DELETE /api/v1/session
pub async fn handle_sign_out(
    State(state): State<AppState>,
    AuthSession(session): AuthSession,
) -> StatusCode {
    state.sessions.revoke(&session.token).await;
    info!(user_id = %session.user.id, "Session closed");
    StatusCode::NO_CONTENT
}
