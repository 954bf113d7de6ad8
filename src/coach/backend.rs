//! Coaching backend wire types and HTTP transport.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ConfigError, ExchangeError};

/// Body of `POST /coach`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachRequest {
    pub user_id: String,
    pub voice_transcript: String,
}

/// Reply of `POST /coach`. Only `advice` is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoachReply {
    pub advice: String,
}

/// Reply of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// The remote coaching service.
#[async_trait]
pub trait CoachBackend: Send + Sync {
    /// Send one transcript and return the coach's advice.
    async fn advise(&self, request: &CoachRequest) -> Result<CoachReply, ExchangeError>;

    /// Check that the backend is up.
    async fn health(&self) -> Result<HealthStatus, ExchangeError>;
}

/// JSON-over-HTTP backend.
pub struct HttpCoachBackend {
    client: reqwest::Client,
    coach_url: Url,
    health_url: Url,
}

impl HttpCoachBackend {
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            client: reqwest::Client::new(),
            coach_url: config.backend_route("coach")?,
            health_url: config.backend_route("health")?,
        })
    }

    pub fn coach_url(&self) -> &Url {
        &self.coach_url
    }
}

#[async_trait]
impl CoachBackend for HttpCoachBackend {
    async fn advise(&self, request: &CoachRequest) -> Result<CoachReply, ExchangeError> {
        let resp = self
            .client
            .post(self.coach_url.clone())
            .json(request)
            .send()
            .await
            .map_err(|e| ExchangeError::Transport {
                url: self.coach_url.to_string(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::debug!(status = %status, body = %body, "Coach endpoint returned an error");
            return Err(ExchangeError::Status {
                status: status.as_u16(),
            });
        }

        resp.json::<CoachReply>()
            .await
            .map_err(|e| ExchangeError::InvalidReply {
                reason: e.to_string(),
            })
    }

    async fn health(&self) -> Result<HealthStatus, ExchangeError> {
        let resp = self
            .client
            .get(self.health_url.clone())
            .send()
            .await
            .map_err(|e| ExchangeError::Transport {
                url: self.health_url.to_string(),
                reason: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(ExchangeError::Status {
                status: resp.status().as_u16(),
            });
        }

        resp.json::<HealthStatus>()
            .await
            .map_err(|e| ExchangeError::InvalidReply {
                reason: e.to_string(),
            })
    }
}
