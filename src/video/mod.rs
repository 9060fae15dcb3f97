//! Telehealth video provider integration (Twilio-compatible REST API and
//! access tokens). Media transport is handled entirely by the provider.

mod token;

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use crate::config::VideoConfig;

pub use token::{mint_access_token, VideoGrantClaims};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum VideoError {
    #[error("Video provider is not configured")]
    NotConfigured,

    #[error("Video provider request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Video provider returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Failed to sign video token: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VideoRoom {
    pub sid: String,
    pub unique_name: String,
    pub status: String,
}

#[async_trait]
pub trait VideoProvider: Send + Sync {
    /// Creates a group room with the given unique name
    async fn create_room(&self, unique_name: &str) -> Result<VideoRoom, VideoError>;

    /// Ends the room for every participant
    async fn complete_room(&self, room_sid: &str) -> Result<VideoRoom, VideoError>;
}

#[derive(Serialize)]
struct CreateRoomForm<'a> {
    #[serde(rename = "UniqueName")]
    unique_name: &'a str,
    #[serde(rename = "Type")]
    room_type: &'a str,
}

#[derive(Serialize)]
struct UpdateRoomForm<'a> {
    #[serde(rename = "Status")]
    status: &'a str,
}

/// REST client for the Twilio Video Rooms API
#[derive(Clone)]
pub struct TwilioVideoClient {
    http: reqwest::Client,
    config: VideoConfig,
}

impl TwilioVideoClient {
    pub fn new(config: VideoConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    fn ensure_configured(&self) -> Result<(), VideoError> {
        if self.config.api_key_sid.is_empty() || self.config.api_key_secret.is_empty() {
            return Err(VideoError::NotConfigured);
        }
        Ok(())
    }

    async fn send_form<F: Serialize + ?Sized>(&self, path: &str, form: &F) -> Result<VideoRoom, VideoError> {
        self.ensure_configured()?;
        let url = format!("{}/v1/{}", self.config.api_base_url.trim_end_matches('/'), path);

        let response = self
            .http
            .post(&url)
            .basic_auth(&self.config.api_key_sid, Some(&self.config.api_key_secret))
            .form(form)
            .timeout(REQUEST_TIMEOUT)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!("Video provider call to {} failed with {}: {}", path, status, body);
            return Err(VideoError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        Ok(response.json::<VideoRoom>().await?)
    }
}

#[async_trait]
impl VideoProvider for TwilioVideoClient {
    async fn create_room(&self, unique_name: &str) -> Result<VideoRoom, VideoError> {
        self.send_form(
            "Rooms",
            &CreateRoomForm {
                unique_name,
                room_type: "group",
            },
        )
        .await
    }

    async fn complete_room(&self, room_sid: &str) -> Result<VideoRoom, VideoError> {
        self.send_form(&format!("Rooms/{}", room_sid), &UpdateRoomForm { status: "completed" })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unconfigured_client_fails_without_network() {
        let client = TwilioVideoClient::new(VideoConfig {
            account_sid: String::new(),
            api_key_sid: String::new(),
            api_key_secret: String::new(),
            api_base_url: "http://127.0.0.1:9".into(),
            token_ttl_secs: 3600,
        });

        let err = client.create_room("session-1").await.unwrap_err();
        assert!(matches!(err, VideoError::NotConfigured));
    }
}
