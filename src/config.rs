//! Configuration types.

use std::path::PathBuf;

use url::Url;

use crate::error::ConfigError;

/// Backend address used when `CRANKD_BACKEND_URL` is unset.
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Location the client starts at when no return URL is supplied.
pub const DEFAULT_APP_URL: &str = "http://localhost:3000/";

/// Client configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the coaching backend.
    pub backend_url: Url,
    /// Strava OAuth client ID. Only the authorization linker requires it.
    pub strava_client_id: Option<String>,
    /// Location the session starts at.
    pub app_url: Url,
    /// Path of the durable key-value file.
    pub store_path: PathBuf,
}

impl ClientConfig {
    /// Build config from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend_url = parse_url(
            "CRANKD_BACKEND_URL",
            lookup("CRANKD_BACKEND_URL").as_deref(),
            DEFAULT_BACKEND_URL,
        )?;
        let app_url = parse_url(
            "CRANKD_APP_URL",
            lookup("CRANKD_APP_URL").as_deref(),
            DEFAULT_APP_URL,
        )?;

        let strava_client_id = lookup("STRAVA_CLIENT_ID")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        let store_path = lookup("CRANKD_STORE_PATH")
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| {
                let home = lookup("HOME").unwrap_or_else(|| ".".to_string());
                PathBuf::from(home).join(".crankd/store.json")
            });

        Ok(Self {
            backend_url,
            strava_client_id,
            app_url,
            store_path,
        })
    }

    /// Resolve a route against the backend base URL, keeping any path prefix.
    pub fn backend_route(&self, route: &str) -> Result<Url, ConfigError> {
        let joined = format!(
            "{}/{}",
            self.backend_url.as_str().trim_end_matches('/'),
            route.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| ConfigError::InvalidValue {
            key: "CRANKD_BACKEND_URL".to_string(),
            message: e.to_string(),
        })
    }
}

fn parse_url(key: &str, value: Option<&str>, default: &str) -> Result<Url, ConfigError> {
    let raw = value.map(str::trim).filter(|s| !s.is_empty()).unwrap_or(default);
    Url::parse(raw).map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("{raw}: {e}"),
    })
}
