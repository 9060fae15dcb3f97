//! Sessions, session notes, homework and goals for a client.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::database::models::{
    Goal, GoalInput, Homework, HomeworkStatus, NewHomework, NewSession, NewSessionNote, NoteContent, Session,
    SessionNote, SessionStatus, SessionType, TemplateSettings, TemplateType,
};
use crate::database::{ClientStore, ClinicalStore, SettingsStore};
use crate::services::error::{ServiceError, ServiceResult};
use crate::types::TenantContext;

const MAX_SESSION_MINUTES: i32 = 480;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateSessionInput {
    pub scheduled_at: DateTime<Utc>,
    pub duration_minutes: i32,
    pub session_type: SessionType,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateNoteInput {
    #[serde(default)]
    pub session_id: Option<Uuid>,
    #[serde(default)]
    pub template_type: Option<TemplateType>,
    #[serde(default)]
    pub content: NoteContent,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HomeworkInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// Fits `content` to the template's fields: unknown fields are rejected and
/// missing ones become empty strings.
pub fn normalize_note_content(template: TemplateType, content: NoteContent) -> ServiceResult<NoteContent> {
    let fields = template.fields();
    if let Some(unknown) = content.keys().find(|k| !fields.contains(k)) {
        return Err(ServiceError::validation(format!(
            "Field '{}' is not part of the {} template",
            unknown, template
        )));
    }

    Ok(fields
        .iter()
        .map(|field| (*field, content.get(field).unwrap_or_default()))
        .collect())
}

#[derive(Clone)]
pub struct ClinicalService {
    records: Arc<dyn ClinicalStore>,
    clients: Arc<dyn ClientStore>,
    settings: Arc<dyn SettingsStore>,
}

impl ClinicalService {
    pub fn new(
        records: Arc<dyn ClinicalStore>,
        clients: Arc<dyn ClientStore>,
        settings: Arc<dyn SettingsStore>,
    ) -> Self {
        Self {
            records,
            clients,
            settings,
        }
    }

    async fn ensure_client(&self, ctx: &TenantContext, client_id: Uuid) -> ServiceResult<()> {
        match self.clients.get_client(ctx.tenant_id, client_id).await? {
            Some(_) => Ok(()),
            None => Err(ServiceError::not_found("Client not found")),
        }
    }

    async fn template_settings(&self, ctx: &TenantContext) -> ServiceResult<TemplateSettings> {
        Ok(self
            .settings
            .get_template_settings(ctx.tenant_id)
            .await?
            .unwrap_or_else(|| TemplateSettings::default_for(ctx.tenant_id)))
    }

    // Sessions

    pub async fn create_session(
        &self,
        ctx: &TenantContext,
        client_id: Uuid,
        input: CreateSessionInput,
    ) -> ServiceResult<Session> {
        if !(1..=MAX_SESSION_MINUTES).contains(&input.duration_minutes) {
            return Err(ServiceError::validation(format!(
                "Duration must be between 1 and {} minutes",
                MAX_SESSION_MINUTES
            )));
        }
        self.ensure_client(ctx, client_id).await?;

        let session = self
            .records
            .insert_session(NewSession {
                tenant_id: ctx.tenant_id,
                client_id,
                scheduled_at: input.scheduled_at,
                duration_minutes: input.duration_minutes,
                session_type: input.session_type,
                created_by: ctx.user_id,
            })
            .await?;

        info!("Scheduled {} session {} for client {}", session.session_type, session.id, client_id);
        Ok(session)
    }

    pub async fn list_sessions(&self, ctx: &TenantContext, client_id: Uuid) -> ServiceResult<Vec<Session>> {
        Ok(self.records.list_sessions(ctx.tenant_id, client_id).await?)
    }

    pub async fn get_session(&self, ctx: &TenantContext, id: Uuid) -> ServiceResult<Session> {
        self.records
            .get_session(ctx.tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Session not found"))
    }

    pub async fn update_session_status(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        status: SessionStatus,
    ) -> ServiceResult<Session> {
        Ok(self
            .records
            .update_session_status(ctx.tenant_id, id, status, ctx.user_id)
            .await?)
    }

    // Notes

    /// Uses the tenant's default template when none is given
    pub async fn create_note(
        &self,
        ctx: &TenantContext,
        client_id: Uuid,
        input: CreateNoteInput,
    ) -> ServiceResult<SessionNote> {
        let settings = self.template_settings(ctx).await?;
        let template = input.template_type.unwrap_or(settings.default_template);
        if !settings.enabled_templates.contains(&template) {
            return Err(ServiceError::validation(format!("The {} template is not enabled", template)));
        }
        let content = normalize_note_content(template, input.content)?;

        self.ensure_client(ctx, client_id).await?;
        if let Some(session_id) = input.session_id {
            let session = self.get_session(ctx, session_id).await?;
            if session.client_id != client_id {
                return Err(ServiceError::validation("Session belongs to a different client"));
            }
        }

        let note = self
            .records
            .insert_note(NewSessionNote {
                tenant_id: ctx.tenant_id,
                client_id,
                session_id: input.session_id,
                template_type: template,
                content,
                created_by: ctx.user_id,
            })
            .await?;

        info!("Created {} note {} for client {}", template, note.id, client_id);
        Ok(note)
    }

    pub async fn list_notes(&self, ctx: &TenantContext, client_id: Uuid) -> ServiceResult<Vec<SessionNote>> {
        Ok(self.records.list_notes(ctx.tenant_id, client_id).await?)
    }

    pub async fn update_note(&self, ctx: &TenantContext, id: Uuid, content: NoteContent) -> ServiceResult<SessionNote> {
        let note = self
            .records
            .get_note(ctx.tenant_id, id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Note not found"))?;
        let content = normalize_note_content(note.template_type, content)?;

        Ok(self.records.update_note(ctx.tenant_id, id, content, ctx.user_id).await?)
    }

    pub async fn delete_note(&self, ctx: &TenantContext, id: Uuid) -> ServiceResult<()> {
        self.records.delete_note(ctx.tenant_id, id).await?;
        Ok(())
    }

    // Homework

    pub async fn assign_homework(
        &self,
        ctx: &TenantContext,
        client_id: Uuid,
        input: HomeworkInput,
    ) -> ServiceResult<Homework> {
        let title = input.title.trim().to_string();
        if title.is_empty() {
            return Err(ServiceError::validation("Homework title is required"));
        }
        self.ensure_client(ctx, client_id).await?;

        Ok(self
            .records
            .insert_homework(NewHomework {
                tenant_id: ctx.tenant_id,
                client_id,
                title,
                description: input.description.map(|d| d.trim().to_string()).filter(|d| !d.is_empty()),
                due_date: input.due_date,
                created_by: ctx.user_id,
            })
            .await?)
    }

    /// Earliest due date first
    pub async fn list_homework(&self, ctx: &TenantContext, client_id: Uuid) -> ServiceResult<Vec<Homework>> {
        Ok(self.records.list_homework(ctx.tenant_id, client_id).await?)
    }

    pub async fn set_homework_status(
        &self,
        ctx: &TenantContext,
        id: Uuid,
        status: HomeworkStatus,
    ) -> ServiceResult<Homework> {
        Ok(self
            .records
            .set_homework_status(ctx.tenant_id, id, status, ctx.user_id)
            .await?)
    }

    pub async fn delete_homework(&self, ctx: &TenantContext, id: Uuid) -> ServiceResult<()> {
        self.records.delete_homework(ctx.tenant_id, id).await?;
        Ok(())
    }

    // Goals

    pub async fn list_goals(&self, ctx: &TenantContext, client_id: Uuid) -> ServiceResult<Vec<Goal>> {
        Ok(self.records.list_goals(ctx.tenant_id, client_id).await?)
    }

    /// Replaces the client's whole goal list in submitted order
    pub async fn upsert_client_goals(
        &self,
        ctx: &TenantContext,
        client_id: Uuid,
        goals: Vec<GoalInput>,
    ) -> ServiceResult<Vec<Goal>> {
        let mut cleaned = Vec::with_capacity(goals.len());
        for goal in goals {
            let description = goal.description.trim().to_string();
            if description.is_empty() {
                return Err(ServiceError::validation("Goal description is required"));
            }
            cleaned.push(GoalInput { description, ..goal });
        }
        self.ensure_client(ctx, client_id).await?;

        let saved = self
            .records
            .replace_goals(ctx.tenant_id, client_id, cleaned, ctx.user_id)
            .await?;
        info!("Saved {} goals for client {}", saved.len(), client_id);
        Ok(saved)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::ClientInput;
    use crate::database::MemoryDatabase;

    async fn setup() -> (ClinicalService, Arc<MemoryDatabase>, TenantContext, Uuid) {
        let db = Arc::new(MemoryDatabase::new());
        let ctx = TenantContext::new(Uuid::new_v4(), Uuid::new_v4(), "p@clinic.test", "practitioner");
        let client = db
            .insert_client(ctx.tenant_id, ClientInput { name: "Riley".into(), ..Default::default() }, ctx.user_id)
            .await
            .unwrap();
        let service = ClinicalService::new(db.clone(), db.clone(), db.clone());
        (service, db, ctx, client.id)
    }

    fn content(pairs: &[(&str, &str)]) -> NoteContent {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn missing_fields_become_empty() {
        let normalized = normalize_note_content(TemplateType::Soap, content(&[("plan", "follow up")])).unwrap();
        assert_eq!(normalized.len(), 4);
        assert_eq!(normalized.get("plan"), Some("follow up"));
        assert_eq!(normalized.get("subjective"), Some(""));
    }

    #[test]
    fn normalized_fields_follow_template_order() {
        let soap = normalize_note_content(
            TemplateType::Soap,
            content(&[("plan", "p"), ("assessment", "a"), ("subjective", "s")]),
        )
        .unwrap();
        assert_eq!(soap.keys().collect::<Vec<_>>(), vec!["subjective", "objective", "assessment", "plan"]);

        let birp = normalize_note_content(TemplateType::Birp, NoteContent::new()).unwrap();
        assert_eq!(birp.keys().collect::<Vec<_>>(), TemplateType::Birp.fields().to_vec());

        let body = serde_json::to_string(&soap).unwrap();
        assert!(body.find("subjective").unwrap() < body.find("plan").unwrap());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = normalize_note_content(TemplateType::Dap, content(&[("subjective", "x")])).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let free = normalize_note_content(TemplateType::FreeForm, content(&[("content", "hello")])).unwrap();
        assert_eq!(free, content(&[("content", "hello")]));
    }

    #[tokio::test]
    async fn notes_use_the_tenant_default_template() {
        let (service, db, ctx, client_id) = setup().await;
        let mut settings = TemplateSettings::default_for(ctx.tenant_id);
        settings.default_template = TemplateType::Birp;
        db.upsert_template_settings(settings).await.unwrap();

        let note = service
            .create_note(
                &ctx,
                client_id,
                CreateNoteInput {
                    session_id: None,
                    template_type: None,
                    content: content(&[("behavior", "calm")]),
                },
            )
            .await
            .unwrap();

        assert_eq!(note.template_type, TemplateType::Birp);
        assert_eq!(note.content.get("behavior"), Some("calm"));
        assert_eq!(note.content.get("response"), Some(""));
    }

    #[tokio::test]
    async fn disabled_templates_are_refused() {
        let (service, db, ctx, client_id) = setup().await;
        let mut settings = TemplateSettings::default_for(ctx.tenant_id);
        settings.enabled_templates = vec![TemplateType::FreeForm];
        db.upsert_template_settings(settings).await.unwrap();

        let err = service
            .create_note(
                &ctx,
                client_id,
                CreateNoteInput {
                    session_id: None,
                    template_type: Some(TemplateType::Soap),
                    content: NoteContent::new(),
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let (service, _, ctx, client_id) = setup().await;
        let session = service
            .create_session(
                &ctx,
                client_id,
                CreateSessionInput {
                    scheduled_at: Utc::now(),
                    duration_minutes: 50,
                    session_type: SessionType::Telehealth,
                },
            )
            .await
            .unwrap();
        assert_eq!(session.status, SessionStatus::Scheduled);

        let done = service
            .update_session_status(&ctx, session.id, SessionStatus::Completed)
            .await
            .unwrap();
        assert_eq!(done.status, SessionStatus::Completed);

        let too_long = CreateSessionInput {
            scheduled_at: Utc::now(),
            duration_minutes: 0,
            session_type: SessionType::InPerson,
        };
        assert!(service.create_session(&ctx, client_id, too_long).await.is_err());
    }

    #[tokio::test]
    async fn homework_is_ordered_by_due_date() {
        let (service, _, ctx, client_id) = setup().await;
        let due = |d: Option<(i32, u32, u32)>| d.and_then(|(y, m, day)| NaiveDate::from_ymd_opt(y, m, day));

        for (title, date) in [("later", Some((2026, 3, 1))), ("undated", None), ("sooner", Some((2026, 1, 15)))] {
            service
                .assign_homework(
                    &ctx,
                    client_id,
                    HomeworkInput {
                        title: title.into(),
                        description: None,
                        due_date: due(date),
                    },
                )
                .await
                .unwrap();
        }

        let titles: Vec<String> = service
            .list_homework(&ctx, client_id)
            .await
            .unwrap()
            .into_iter()
            .map(|h| h.title)
            .collect();
        assert_eq!(titles, vec!["sooner", "later", "undated"]);
    }

    #[tokio::test]
    async fn goal_lists_are_replaced_whole() {
        let (service, _, ctx, client_id) = setup().await;
        let goal = |d: &str| GoalInput {
            description: d.into(),
            target_date: None,
            status: Default::default(),
        };

        service
            .upsert_client_goals(&ctx, client_id, vec![goal("sleep 7h"), goal("walk daily")])
            .await
            .unwrap();
        let saved = service
            .upsert_client_goals(&ctx, client_id, vec![goal("walk daily")])
            .await
            .unwrap();

        assert_eq!(saved.len(), 1);
        assert_eq!(service.list_goals(&ctx, client_id).await.unwrap().len(), 1);

        let blank = service.upsert_client_goals(&ctx, client_id, vec![goal(" ")]).await;
        assert!(matches!(blank, Err(ServiceError::Validation(_))));
        assert_eq!(service.list_goals(&ctx, client_id).await.unwrap().len(), 1);
    }
}
