//! Client for the character backend.
//!
//! The backend is a plain JSON CRUD service that owns every record. Calls
//! are made exactly once: a transport failure or a non-success status is
//! terminal for the request that triggered it.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{Character, NewCharacter, NewUser, RecordId, Skill, Spell, User};

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected backend response: {0}")]
    Decode(String),
}

/// Persistence operations the API needs. Implemented over HTTP by
/// [`BackendClient`]; tests swap in an in-memory store.
#[async_trait]
pub trait CharacterBackend: Send + Sync {
    async fn list_characters(&self, user_id: &RecordId) -> Result<Vec<Character>, BackendError>;

    /// `None` when the backend has no such character.
    async fn get_character(&self, id: &RecordId) -> Result<Option<Character>, BackendError>;

    async fn create_character(&self, character: &NewCharacter) -> Result<Character, BackendError>;

    async fn delete_character(&self, id: &RecordId) -> Result<(), BackendError>;

    async fn list_skills(&self, character_id: &RecordId) -> Result<Vec<Skill>, BackendError>;

    async fn create_skill(&self, skill: &Skill) -> Result<Skill, BackendError>;

    async fn list_spells(&self, character_id: &RecordId) -> Result<Vec<Spell>, BackendError>;

    async fn create_spell(&self, spell: &Spell) -> Result<Spell, BackendError>;

    async fn register_user(&self, user: &NewUser) -> Result<User, BackendError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, BackendError>;
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, BackendError> {
        let response = self.client.get(self.url(path)).send().await.map_err(log_transport)?;
        decode(path, response).await
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, BackendError>
    where
        B: serde::Serialize + Sync + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(log_transport)?;
        decode(path, response).await
    }
}

fn log_transport(err: reqwest::Error) -> BackendError {
    warn!("Backend request failed: {err}");
    BackendError::Http(err)
}

async fn ensure_success(path: &str, response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    warn!(path, status = status.as_u16(), "Backend returned an error: {message}");
    Err(BackendError::Status {
        status: status.as_u16(),
        message,
    })
}

async fn decode<T: DeserializeOwned>(path: &str, response: Response) -> Result<T, BackendError> {
    let response = ensure_success(path, response).await?;
    let body = response.bytes().await?;
    debug!(path, size_bytes = body.len(), "Backend response received");
    serde_json::from_slice(&body).map_err(|e| {
        warn!(path, "Backend response did not parse: {e}");
        BackendError::Decode(e.to_string())
    })
}

#[async_trait]
impl CharacterBackend for BackendClient {
    async fn list_characters(&self, user_id: &RecordId) -> Result<Vec<Character>, BackendError> {
        self.get_json(&format!("/characters/{user_id}")).await
    }

    async fn get_character(&self, id: &RecordId) -> Result<Option<Character>, BackendError> {
        let path = format!("/characters/by-id/{id}");
        let response = self
            .client
            .get(self.url(&path))
            .send()
            .await
            .map_err(log_transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        decode(&path, response).await.map(Some)
    }

    async fn create_character(&self, character: &NewCharacter) -> Result<Character, BackendError> {
        self.post_json("/characters", character).await
    }

    async fn delete_character(&self, id: &RecordId) -> Result<(), BackendError> {
        let path = format!("/characters/{id}");
        let response = self
            .client
            .delete(self.url(&path))
            .send()
            .await
            .map_err(log_transport)?;
        ensure_success(&path, response).await?;
        Ok(())
    }

    async fn list_skills(&self, character_id: &RecordId) -> Result<Vec<Skill>, BackendError> {
        self.get_json(&format!("/skills/{character_id}")).await
    }

    async fn create_skill(&self, skill: &Skill) -> Result<Skill, BackendError> {
        self.post_json("/skills", skill).await
    }

    async fn list_spells(&self, character_id: &RecordId) -> Result<Vec<Spell>, BackendError> {
        self.get_json(&format!("/spells/{character_id}")).await
    }

    async fn create_spell(&self, spell: &Spell) -> Result<Spell, BackendError> {
        self.post_json("/spells", spell).await
    }

    async fn register_user(&self, user: &NewUser) -> Result<User, BackendError> {
        self.post_json("/users", user).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, BackendError> {
        let path = "/users_cavern";
        let response = self
            .client
            .get(self.url(path))
            .query(&[("email", email)])
            .send()
            .await
            .map_err(log_transport)?;
        let users: Vec<User> = decode(path, response).await?;
        Ok(users.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::{Path, Query},
        http::StatusCode as AxumStatus,
        routing::{get, post},
        Json, Router,
    };
    use serde_json::{json, Value};
    use std::collections::HashMap;

    /// Serves `router` on an ephemeral port and returns a client pointed at it.
    async fn client_for(router: Router) -> BackendClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        BackendClient::new(&format!("http://{addr}/"), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_get_character_maps_404_to_none() {
        let router = Router::new().route(
            "/characters/by-id/:id",
            get(|Path(id): Path<String>| async move {
                if id == "7" {
                    Ok(Json(json!({ "id": 7, "id_user": "u1", "name": "Thrain", "level": 3 })))
                } else {
                    Err(AxumStatus::NOT_FOUND)
                }
            }),
        );
        let client = client_for(router).await;

        let found = client.get_character(&RecordId::from("7")).await.unwrap().unwrap();
        assert_eq!(found.name.as_deref(), Some("Thrain"));
        assert_eq!(found.id, Some(RecordId::from("7")));

        assert!(client.get_character(&RecordId::from("8")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_server_error_is_terminal() {
        let router = Router::new().route(
            "/skills/:id",
            get(|| async { (AxumStatus::INTERNAL_SERVER_ERROR, "boom") }),
        );
        let client = client_for(router).await;

        let err = client.list_skills(&RecordId::from("7")).await.unwrap_err();
        match err {
            BackendError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("expected Status, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_find_user_by_email_takes_first_match() {
        let router = Router::new().route(
            "/users_cavern",
            get(|Query(q): Query<HashMap<String, String>>| async move {
                let email = q.get("email").cloned().unwrap_or_default();
                if email == "thrain@erebor.example" {
                    Json(json!([
                        { "id": 1, "name": "Thrain", "email": email },
                        { "id": 2, "name": "Duplicate", "email": email }
                    ]))
                } else {
                    Json(json!([]))
                }
            }),
        );
        let client = client_for(router).await;

        let user = client
            .find_user_by_email("thrain@erebor.example")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(user.id, RecordId::from("1"));
        assert!(client.find_user_by_email("nobody@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_spell_posts_json() {
        let router = Router::new().route(
            "/spells",
            post(|Json(body): Json<Value>| async move {
                let mut created = body;
                created["id"] = json!(99);
                Json(created)
            }),
        );
        let client = client_for(router).await;

        let spell = Spell {
            id: None,
            id_character: RecordId::from("7"),
            name: "Shield".to_string(),
            description: "+5 AC".to_string(),
            level_spell: Some(1),
        };
        let created = client.create_spell(&spell).await.unwrap();
        assert_eq!(created.id, Some(RecordId::from("99")));
        assert_eq!(created.level_spell, Some(1));
    }

    #[tokio::test]
    async fn test_malformed_body_is_decode_error() {
        let router = Router::new().route("/spells/:id", get(|| async { "not json" }));
        let client = client_for(router).await;
        let err = client.list_spells(&RecordId::from("7")).await.unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }
}
