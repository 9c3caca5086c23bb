//! Read-only client for the public D&D 5e reference API.
//!
//! Resources are addressed by category and slug (`/api/classes/fighter`).
//! Responses are passed through mostly untouched; only the fields the
//! creation hints need are typed.

pub mod creation;
pub mod handlers;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_GAME_DATA_URL: &str = "https://www.dnd5eapi.co";

#[derive(Debug, Error)]
pub enum GameDataError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{category}/{slug} not found")]
    NotFound { category: String, slug: String },

    #[error("game-data API returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("unexpected game-data response: {0}")]
    Decode(String),

    #[error("unknown reference category '{0}'")]
    UnknownCategory(String),

    #[error("invalid slug '{0}': use lowercase letters, digits and '-'")]
    InvalidSlug(String),
}

/// Reference categories exposed by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReferenceCategory {
    Races,
    Classes,
    Spells,
    Equipment,
    Monsters,
    RuleSections,
}

impl ReferenceCategory {
    pub const ALL: [ReferenceCategory; 6] = [
        ReferenceCategory::Races,
        ReferenceCategory::Classes,
        ReferenceCategory::Spells,
        ReferenceCategory::Equipment,
        ReferenceCategory::Monsters,
        ReferenceCategory::RuleSections,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceCategory::Races => "races",
            ReferenceCategory::Classes => "classes",
            ReferenceCategory::Spells => "spells",
            ReferenceCategory::Equipment => "equipment",
            ReferenceCategory::Monsters => "monsters",
            ReferenceCategory::RuleSections => "rule-sections",
        }
    }
}

impl fmt::Display for ReferenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReferenceCategory {
    type Err = GameDataError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| GameDataError::UnknownCategory(s.to_string()))
    }
}

/// `{index, name, url}` link to another resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiReference {
    pub index: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceList {
    pub count: u64,
    pub results: Vec<ApiReference>,
}

/// A single resource. Fields beyond the common three are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceDetail {
    pub index: String,
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

/// Checks a resource slug before it is spliced into a URL.
pub fn validate_slug(slug: &str) -> Result<(), GameDataError> {
    let valid = !slug.is_empty()
        && slug.len() <= 64
        && slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(GameDataError::InvalidSlug(slug.to_string()))
    }
}

#[derive(Clone)]
pub struct GameDataClient {
    client: Client,
    base_url: String,
}

impl GameDataClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, GameDataError> {
        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn list(&self, category: ReferenceCategory) -> Result<ResourceList, GameDataError> {
        let url = format!("{}/api/{}", self.base_url, category);
        self.fetch(&url, category, "").await
    }

    pub async fn get(
        &self,
        category: ReferenceCategory,
        slug: &str,
    ) -> Result<ReferenceDetail, GameDataError> {
        self.get_typed(category, slug).await
    }

    /// Fetches one resource into a caller-chosen shape.
    pub async fn get_typed<T: DeserializeOwned>(
        &self,
        category: ReferenceCategory,
        slug: &str,
    ) -> Result<T, GameDataError> {
        validate_slug(slug)?;
        let url = format!("{}/api/{}/{}", self.base_url, category, slug);
        self.fetch(&url, category, slug).await
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        url: &str,
        category: ReferenceCategory,
        slug: &str,
    ) -> Result<T, GameDataError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            warn!(url, "Game-data request failed: {e}");
            GameDataError::Http(e)
        })?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(GameDataError::NotFound {
                category: category.to_string(),
                slug: slug.to_string(),
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            warn!(url, status = status.as_u16(), "Game-data API returned an error");
            return Err(GameDataError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.bytes().await?;
        debug!(url, size_bytes = body.len(), "Game-data response received");
        serde_json::from_slice(&body).map_err(|e| GameDataError::Decode(e.to_string()))
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use axum::{extract::Path, http::StatusCode, routing::get, Json, Router};
    use serde_json::{json, Value};
    use std::time::Duration;

    use super::GameDataClient;

    fn detail(category: &str, slug: &str) -> Option<Value> {
        match (category, slug) {
            ("races", "dwarf") => Some(json!({
                "index": "dwarf",
                "name": "Dwarf",
                "url": "/api/races/dwarf",
                "speed": 25,
                "ability_bonuses": [
                    { "ability_score": { "index": "con", "name": "CON", "url": "/api/ability-scores/con" }, "bonus": 2 }
                ],
                "size": "Medium"
            })),
            ("classes", "fighter") => Some(json!({
                "index": "fighter",
                "name": "Fighter",
                "url": "/api/classes/fighter",
                "hit_die": 10,
                "saving_throws": [
                    { "index": "str", "name": "STR", "url": "/api/ability-scores/str" },
                    { "index": "con", "name": "CON", "url": "/api/ability-scores/con" }
                ]
            })),
            _ => None,
        }
    }

    /// A reference API stand-in knowing one race and one class.
    pub async fn client() -> GameDataClient {
        let router = Router::new()
            .route(
                "/api/:category",
                get(|Path(category): Path<String>| async move {
                    match category.as_str() {
                        "races" => Ok(Json(json!({
                            "count": 1,
                            "results": [{ "index": "dwarf", "name": "Dwarf", "url": "/api/races/dwarf" }]
                        }))),
                        "monsters" => Err(StatusCode::SERVICE_UNAVAILABLE),
                        _ => Ok(Json(json!({ "count": 0, "results": [] }))),
                    }
                }),
            )
            .route(
                "/api/:category/:slug",
                get(|Path((category, slug)): Path<(String, String)>| async move {
                    detail(&category, &slug).map(Json).ok_or(StatusCode::NOT_FOUND)
                }),
            );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        GameDataClient::new(&format!("http://{addr}"), Duration::from_secs(5)).unwrap()
    }
}
