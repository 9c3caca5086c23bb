use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

use crate::game_data::DEFAULT_GAME_DATA_URL;
use crate::sheet::font_metrics::FontFamily;
use crate::sheet::OverflowPolicy;

/// Longest accepted session lifetime: one year.
pub const MAX_SESSION_TTL_MINUTES: i64 = 365 * 24 * 60;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    pub game_data_url: String,
    pub sheet_assets_dir: PathBuf,
    pub sheet_overflow: OverflowPolicy,
    pub sheet_font: FontFamily,
    pub session_ttl_minutes: i64,
    pub http_timeout_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let session_ttl_minutes = var("SESSION_TTL_MINUTES", "720")
            .parse::<i64>()
            .context("SESSION_TTL_MINUTES must be a whole number of minutes")?;
        if !(1..=MAX_SESSION_TTL_MINUTES).contains(&session_ttl_minutes) {
            return Err(anyhow!(
                "SESSION_TTL_MINUTES must be between 1 and {MAX_SESSION_TTL_MINUTES}"
            ));
        }

        Ok(Config {
            backend_url: lookup("BACKEND_URL")
                .filter(|v| !v.trim().is_empty())
                .context("Required environment variable 'BACKEND_URL' is not set")?,
            game_data_url: var("GAME_DATA_URL", DEFAULT_GAME_DATA_URL),
            sheet_assets_dir: PathBuf::from(var("SHEET_ASSETS_DIR", "assets/sheet")),
            sheet_overflow: var("SHEET_OVERFLOW", "truncate")
                .parse()
                .map_err(|e: String| anyhow!(e))
                .context("SHEET_OVERFLOW must be 'truncate' or 'continue'")?,
            sheet_font: var("SHEET_FONT", "helvetica")
                .parse()
                .map_err(|e: String| anyhow!(e))
                .context("SHEET_FONT must be 'helvetica', 'times' or 'courier'")?,
            session_ttl_minutes,
            http_timeout_secs: var("HTTP_TIMEOUT_SECS", "15")
                .parse::<u64>()
                .context("HTTP_TIMEOUT_SECS must be a whole number of seconds")?,
            port: var("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: var("RUST_LOG", "info"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(pairs: &[(&str, &str)]) -> Result<Config> {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let c = config(&[("BACKEND_URL", "http://localhost:3000")]).unwrap();
        assert_eq!(c.game_data_url, DEFAULT_GAME_DATA_URL);
        assert_eq!(c.sheet_overflow, OverflowPolicy::Truncate);
        assert_eq!(c.sheet_font, FontFamily::Helvetica);
        assert_eq!(c.session_ttl_minutes, 720);
        assert_eq!(c.port, 8080);
    }

    #[test]
    fn test_backend_url_is_required() {
        let err = config(&[]).unwrap_err();
        assert!(err.to_string().contains("BACKEND_URL"));
    }

    #[test]
    fn test_overrides_are_parsed() {
        let c = config(&[
            ("BACKEND_URL", "http://backend"),
            ("SHEET_OVERFLOW", "continue"),
            ("SHEET_FONT", "times"),
            ("SESSION_TTL_MINUTES", "30"),
            ("PORT", "9000"),
        ])
        .unwrap();
        assert_eq!(c.sheet_overflow, OverflowPolicy::Continue);
        assert_eq!(c.sheet_font, FontFamily::Times);
        assert_eq!(c.session_ttl_minutes, 30);
        assert_eq!(c.port, 9000);
    }

    #[test]
    fn test_bad_values_are_rejected() {
        assert!(config(&[("BACKEND_URL", "x"), ("SHEET_OVERFLOW", "shrink")]).is_err());
        assert!(config(&[("BACKEND_URL", "x"), ("SESSION_TTL_MINUTES", "0")]).is_err());
        assert!(config(&[("BACKEND_URL", "x"), ("PORT", "http")]).is_err());
    }

    #[test]
    fn test_session_ttl_is_capped_at_one_year() {
        let year = MAX_SESSION_TTL_MINUTES.to_string();
        let c = config(&[("BACKEND_URL", "x"), ("SESSION_TTL_MINUTES", &year)]).unwrap();
        assert_eq!(c.session_ttl_minutes, 525_600);

        let over = (MAX_SESSION_TTL_MINUTES + 1).to_string();
        assert!(config(&[("BACKEND_URL", "x"), ("SESSION_TTL_MINUTES", &over)]).is_err());
        let huge = i64::MAX.to_string();
        assert!(config(&[("BACKEND_URL", "x"), ("SESSION_TTL_MINUTES", &huge)]).is_err());
    }
}
