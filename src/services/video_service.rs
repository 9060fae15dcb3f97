use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::VideoConfig;
use crate::database::models::{Session, SessionType};
use crate::database::ClinicalStore;
use crate::services::error::{ServiceError, ServiceResult};
use crate::video::{mint_access_token, VideoError, VideoProvider};
use crate::types::TenantContext;

impl From<VideoError> for ServiceError {
    fn from(err: VideoError) -> Self {
        match err {
            VideoError::NotConfigured => ServiceError::Upstream("Video is not configured for this deployment".into()),
            other => {
                warn!("Video provider error: {}", other);
                ServiceError::Upstream("Video provider request failed".into())
            }
        }
    }
}

/// Access token handed to a participant's video client
#[derive(Debug, Clone, Serialize)]
pub struct VideoToken {
    pub token: String,
    pub identity: String,
    pub room_name: String,
    pub expires_at: DateTime<Utc>,
}

pub fn room_name(session_id: Uuid) -> String {
    format!("session-{}", session_id)
}

#[derive(Clone)]
pub struct VideoService {
    records: Arc<dyn ClinicalStore>,
    provider: Arc<dyn VideoProvider>,
    config: VideoConfig,
}

impl VideoService {
    pub fn new(records: Arc<dyn ClinicalStore>, provider: Arc<dyn VideoProvider>, config: VideoConfig) -> Self {
        Self {
            records,
            provider,
            config,
        }
    }

    async fn telehealth_session(&self, ctx: &TenantContext, session_id: Uuid) -> ServiceResult<Session> {
        let session = self
            .records
            .get_session(ctx.tenant_id, session_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Session not found"))?;
        if session.session_type != SessionType::Telehealth {
            return Err(ServiceError::validation("Session is not a telehealth session"));
        }
        Ok(session)
    }

    /// Opens a provider room for the session, reusing an existing one
    pub async fn create_room(&self, ctx: &TenantContext, session_id: Uuid) -> ServiceResult<Session> {
        let session = self.telehealth_session(ctx, session_id).await?;
        if session.video_room_sid.is_some() {
            return Ok(session);
        }

        let room = self.provider.create_room(&room_name(session.id)).await?;
        info!("Opened video room {} for session {}", room.sid, session.id);

        Ok(self
            .records
            .set_session_room(ctx.tenant_id, session.id, Some(room.sid), ctx.user_id)
            .await?)
    }

    pub async fn end_room(&self, ctx: &TenantContext, session_id: Uuid) -> ServiceResult<Session> {
        let session = self.telehealth_session(ctx, session_id).await?;
        let sid = session
            .video_room_sid
            .ok_or_else(|| ServiceError::validation("Session has no active video room"))?;

        self.provider.complete_room(&sid).await?;
        info!("Closed video room {} for session {}", sid, session.id);

        Ok(self
            .records
            .set_session_room(ctx.tenant_id, session.id, None, ctx.user_id)
            .await?)
    }

    pub async fn issue_token(&self, ctx: &TenantContext, session_id: Uuid) -> ServiceResult<VideoToken> {
        let session = self.telehealth_session(ctx, session_id).await?;
        if session.video_room_sid.is_none() {
            return Err(ServiceError::validation("Session has no active video room"));
        }

        let identity = format!("{}-{}", ctx.role, ctx.user_id);
        let room_name = room_name(session.id);
        let (token, exp) = mint_access_token(&self.config, &identity, &room_name)?;
        let expires_at = Utc
            .timestamp_opt(exp, 0)
            .single()
            .ok_or_else(|| ServiceError::Unknown("Token expiry out of range".into()))?;

        Ok(VideoToken {
            token,
            identity,
            room_name,
            expires_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::NewSession;
    use crate::database::MemoryDatabase;
    use crate::video::VideoRoom;
    use async_trait::async_trait;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct RecordingProvider {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl VideoProvider for RecordingProvider {
        async fn create_room(&self, unique_name: &str) -> Result<VideoRoom, VideoError> {
            self.calls.lock().await.push(format!("create:{}", unique_name));
            Ok(VideoRoom {
                sid: "RM001".into(),
                unique_name: unique_name.into(),
                status: "in-progress".into(),
            })
        }

        async fn complete_room(&self, room_sid: &str) -> Result<VideoRoom, VideoError> {
            self.calls.lock().await.push(format!("complete:{}", room_sid));
            Ok(VideoRoom {
                sid: room_sid.into(),
                unique_name: String::new(),
                status: "completed".into(),
            })
        }
    }

    struct DownProvider;

    #[async_trait]
    impl VideoProvider for DownProvider {
        async fn create_room(&self, _: &str) -> Result<VideoRoom, VideoError> {
            Err(VideoError::Rejected {
                status: 503,
                body: "unavailable".into(),
            })
        }

        async fn complete_room(&self, _: &str) -> Result<VideoRoom, VideoError> {
            Err(VideoError::NotConfigured)
        }
    }

    fn video_config() -> VideoConfig {
        VideoConfig {
            account_sid: "AC1".into(),
            api_key_sid: "SK1".into(),
            api_key_secret: "secret".into(),
            api_base_url: "http://localhost".into(),
            token_ttl_secs: 3600,
        }
    }

    async fn session(db: &MemoryDatabase, ctx: &TenantContext, session_type: SessionType) -> Session {
        db.insert_session(NewSession {
            tenant_id: ctx.tenant_id,
            client_id: Uuid::new_v4(),
            scheduled_at: Utc::now(),
            duration_minutes: 50,
            session_type,
            created_by: ctx.user_id,
        })
        .await
        .unwrap()
    }

    fn ctx() -> TenantContext {
        TenantContext::new(Uuid::new_v4(), Uuid::new_v4(), "p@clinic.test", "practitioner")
    }

    #[tokio::test]
    async fn room_lifecycle_and_token() {
        let db = Arc::new(MemoryDatabase::new());
        let provider = Arc::new(RecordingProvider::default());
        let service = VideoService::new(db.clone(), provider.clone(), video_config());
        let ctx = ctx();
        let session = session(&db, &ctx, SessionType::Telehealth).await;

        assert!(matches!(service.issue_token(&ctx, session.id).await, Err(ServiceError::Validation(_))));

        let opened = service.create_room(&ctx, session.id).await.unwrap();
        assert_eq!(opened.video_room_sid.as_deref(), Some("RM001"));

        // second call reuses the room
        service.create_room(&ctx, session.id).await.unwrap();

        let token = service.issue_token(&ctx, session.id).await.unwrap();
        assert_eq!(token.identity, format!("practitioner-{}", ctx.user_id));
        assert_eq!(token.room_name, room_name(session.id));
        assert!(token.expires_at > Utc::now());

        let closed = service.end_room(&ctx, session.id).await.unwrap();
        assert!(closed.video_room_sid.is_none());

        let calls = provider.calls.lock().await.clone();
        assert_eq!(calls, vec![format!("create:session-{}", session.id), "complete:RM001".to_string()]);
    }

    #[tokio::test]
    async fn in_person_sessions_have_no_room() {
        let db = Arc::new(MemoryDatabase::new());
        let service = VideoService::new(db.clone(), Arc::new(RecordingProvider::default()), video_config());
        let ctx = ctx();
        let session = session(&db, &ctx, SessionType::InPerson).await;

        assert!(matches!(service.create_room(&ctx, session.id).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn provider_failures_are_upstream_errors() {
        let db = Arc::new(MemoryDatabase::new());
        let service = VideoService::new(db.clone(), Arc::new(DownProvider), video_config());
        let ctx = ctx();
        let session = session(&db, &ctx, SessionType::Telehealth).await;

        assert!(matches!(service.create_room(&ctx, session.id).await, Err(ServiceError::Upstream(_))));
        let stored = db.get_session(ctx.tenant_id, session.id).await.unwrap().unwrap();
        assert!(stored.video_room_sid.is_none());
    }
}
