//! Server-side sessions.
//!
//! Signing in exchanges the identity provider's profile for an opaque bearer
//! token. Tokens expire after a fixed TTL, and every authenticated request
//! re-checks the user against the backend.

pub mod handlers;

use std::collections::HashMap;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::User;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Session {
    pub token: Uuid,
    pub user: User,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[derive(Debug)]
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Session>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    pub async fn create(&self, user: User) -> Session {
        self.create_at(user, Utc::now()).await
    }

    pub async fn create_at(&self, user: User, now: DateTime<Utc>) -> Session {
        let session = Session {
            token: Uuid::new_v4(),
            user,
            created_at: now,
            expires_at: now + self.ttl,
        };
        self.sessions
            .write()
            .await
            .insert(session.token, session.clone());
        session
    }

    pub async fn get(&self, token: &Uuid) -> Option<Session> {
        self.sessions.read().await.get(token).cloned()
    }

    /// Returns whether a session was removed.
    pub async fn revoke(&self, token: &Uuid) -> bool {
        self.sessions.write().await.remove(token).is_some()
    }

    /// Drops every session expired at `now`; returns how many were dropped.
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        before - sessions.len()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

/// Parses `Authorization: Bearer <uuid>`.
pub fn bearer_token(parts: &Parts) -> Option<Uuid> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?;
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?;
    Uuid::parse_str(token.trim()).ok()
}

/// Extractor for handlers that need a signed-in user.
pub struct AuthSession(pub Session);

#[async_trait]
impl FromRequestParts<AppState> for AuthSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;
        let session = state
            .sessions
            .get(&token)
            .await
            .ok_or(AppError::Unauthorized)?;

        if session.is_expired(Utc::now()) {
            state.sessions.revoke(&token).await;
            debug!(user_id = %session.user.id, "Session expired");
            return Err(AppError::Unauthorized);
        }

        // Backend failures surface as 502 and keep the session; only a
        // definitive "user is gone" revokes it.
        match state.backend.find_user_by_email(&session.user.email).await? {
            Some(user) if user.id == session.user.id => Ok(AuthSession(session)),
            _ => {
                state.sessions.revoke(&token).await;
                warn!(user_id = %session.user.id, "Session user no longer valid, revoked");
                Err(AppError::Unauthorized)
            }
        }
    }
}

/// Periodically drops expired sessions so the store does not grow unbounded.
pub async fn run_session_sweeper(store: std::sync::Arc<SessionStore>, every: std::time::Duration) {
    let mut interval = tokio::time::interval(every);
    loop {
        interval.tick().await;
        let dropped = store.purge_expired(Utc::now()).await;
        if dropped > 0 {
            info!(dropped, "Purged expired sessions");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordId;
    use axum::http::Request;

    fn user() -> User {
        User {
            id: RecordId::from("u1"),
            name: "Thrain".into(),
            email: "thrain@erebor.example".into(),
        }
    }

    #[tokio::test]
    async fn test_session_expires_after_ttl() {
        let store = SessionStore::new(Duration::minutes(30));
        let start = Utc::now();
        let session = store.create_at(user(), start).await;

        assert!(!session.is_expired(start + Duration::minutes(29)));
        assert!(session.is_expired(start + Duration::minutes(30)));
    }

    #[tokio::test]
    async fn test_purge_drops_only_expired() {
        let store = SessionStore::new(Duration::minutes(10));
        let now = Utc::now();
        store.create_at(user(), now - Duration::minutes(20)).await;
        let live = store.create_at(user(), now).await;

        assert_eq!(store.purge_expired(now).await, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.get(&live.token).await.is_some());
    }

    #[tokio::test]
    async fn test_revoke() {
        let store = SessionStore::new(Duration::minutes(10));
        let session = store.create(user()).await;
        assert!(store.revoke(&session.token).await);
        assert!(!store.revoke(&session.token).await);
        assert!(store.get(&session.token).await.is_none());
    }

    #[test]
    fn test_bearer_token_parsing() {
        let token = Uuid::new_v4();
        let (parts, _) = Request::builder()
            .header(AUTHORIZATION, format!("Bearer {token}"))
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts), Some(token));

        let (parts, _) = Request::builder()
            .header(AUTHORIZATION, "Basic dXNlcjpwYXNz")
            .body(())
            .unwrap()
            .into_parts();
        assert_eq!(bearer_token(&parts), None);

        let (parts, _) = Request::builder().body(()).unwrap().into_parts();
        assert_eq!(bearer_token(&parts), None);
    }
}
