use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

use super::{missing, parse_text, PgDatabase};
use crate::database::manager::DatabaseError;
use crate::database::models::{
    Goal, GoalInput, Homework, HomeworkStatus, NewHomework, NewSession, NewSessionNote, NoteContent,
    Session, SessionNote, SessionStatus, TemplateType,
};
use crate::database::repository::{ClinicalStore, StoreResult};

#[derive(FromRow)]
struct SessionRow {
    id: Uuid,
    tenant_id: Uuid,
    client_id: Uuid,
    scheduled_at: DateTime<Utc>,
    duration_minutes: i32,
    session_type: String,
    status: String,
    video_room_sid: Option<String>,
    created_by: Uuid,
    updated_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SessionRow> for Session {
    type Error = DatabaseError;

    fn try_from(row: SessionRow) -> Result<Self, Self::Error> {
        Ok(Session {
            id: row.id,
            tenant_id: row.tenant_id,
            client_id: row.client_id,
            scheduled_at: row.scheduled_at,
            duration_minutes: row.duration_minutes,
            session_type: parse_text(&row.session_type)?,
            status: parse_text(&row.status)?,
            video_room_sid: row.video_room_sid,
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SESSION_COLUMNS: &str = "id, tenant_id, client_id, scheduled_at, duration_minutes, session_type, \
     status, video_room_sid, created_by, updated_by, created_at, updated_at";

#[derive(FromRow)]
struct NoteRow {
    id: Uuid,
    tenant_id: Uuid,
    client_id: Uuid,
    session_id: Option<Uuid>,
    template_type: String,
    content: Json<NoteContent>,
    created_by: Uuid,
    updated_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<NoteRow> for SessionNote {
    type Error = DatabaseError;

    fn try_from(row: NoteRow) -> Result<Self, Self::Error> {
        let template_type: TemplateType = parse_text(&row.template_type)?;
        Ok(SessionNote {
            id: row.id,
            tenant_id: row.tenant_id,
            client_id: row.client_id,
            session_id: row.session_id,
            template_type,
            content: row.content.0.in_template_order(template_type),
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const NOTE_COLUMNS: &str = "id, tenant_id, client_id, session_id, template_type, content, \
     created_by, updated_by, created_at, updated_at";

#[derive(FromRow)]
struct HomeworkRow {
    id: Uuid,
    tenant_id: Uuid,
    client_id: Uuid,
    title: String,
    description: Option<String>,
    due_date: Option<NaiveDate>,
    status: String,
    created_by: Uuid,
    updated_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<HomeworkRow> for Homework {
    type Error = DatabaseError;

    fn try_from(row: HomeworkRow) -> Result<Self, Self::Error> {
        Ok(Homework {
            id: row.id,
            tenant_id: row.tenant_id,
            client_id: row.client_id,
            title: row.title,
            description: row.description,
            due_date: row.due_date,
            status: parse_text(&row.status)?,
            created_by: row.created_by,
            updated_by: row.updated_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const HOMEWORK_COLUMNS: &str = "id, tenant_id, client_id, title, description, due_date, status, \
     created_by, updated_by, created_at, updated_at";

#[derive(FromRow)]
struct GoalRow {
    id: Uuid,
    tenant_id: Uuid,
    client_id: Uuid,
    description: String,
    target_date: Option<NaiveDate>,
    status: String,
    position: i32,
    created_by: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<GoalRow> for Goal {
    type Error = DatabaseError;

    fn try_from(row: GoalRow) -> Result<Self, Self::Error> {
        Ok(Goal {
            id: row.id,
            tenant_id: row.tenant_id,
            client_id: row.client_id,
            description: row.description,
            target_date: row.target_date,
            status: parse_text(&row.status)?,
            position: row.position,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const GOAL_COLUMNS: &str =
    "id, tenant_id, client_id, description, target_date, status, position, created_by, created_at, updated_at";

#[async_trait]
impl ClinicalStore for PgDatabase {
    async fn insert_session(&self, session: NewSession) -> StoreResult<Session> {
        let mut tx = self.manager.tenant_tx(session.tenant_id).await?;
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "INSERT INTO sessions (id, tenant_id, client_id, scheduled_at, duration_minutes,
                                   session_type, status, created_by, updated_by)
             VALUES ($1, $2, $3, $4, $5, $6, 'scheduled', $7, $7) RETURNING {}",
            SESSION_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(session.tenant_id)
        .bind(session.client_id)
        .bind(session.scheduled_at)
        .bind(session.duration_minutes)
        .bind(session.session_type.as_str())
        .bind(session.created_by)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Session::try_from(row)
    }

    async fn list_sessions(&self, tenant_id: Uuid, client_id: Uuid) -> StoreResult<Vec<Session>> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let rows = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {} FROM sessions WHERE tenant_id = $1 AND client_id = $2 ORDER BY scheduled_at DESC",
            SESSION_COLUMNS
        ))
        .bind(tenant_id)
        .bind(client_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        rows.into_iter().map(Session::try_from).collect()
    }

    async fn get_session(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<Session>> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "SELECT {} FROM sessions WHERE tenant_id = $1 AND id = $2",
            SESSION_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;

        row.map(Session::try_from).transpose()
    }

    async fn update_session_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        status: SessionStatus,
        acting_user: Uuid,
    ) -> StoreResult<Session> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "UPDATE sessions SET status = $3, updated_by = $4, updated_at = now()
             WHERE tenant_id = $1 AND id = $2 RETURNING {}",
            SESSION_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(status.as_str())
        .bind(acting_user)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| missing("session", id))?;
        tx.commit().await?;

        Session::try_from(row)
    }

    async fn set_session_room(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        room_sid: Option<String>,
        acting_user: Uuid,
    ) -> StoreResult<Session> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "UPDATE sessions SET video_room_sid = $3, updated_by = $4, updated_at = now()
             WHERE tenant_id = $1 AND id = $2 RETURNING {}",
            SESSION_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(room_sid)
        .bind(acting_user)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| missing("session", id))?;
        tx.commit().await?;

        Session::try_from(row)
    }

    async fn insert_note(&self, note: NewSessionNote) -> StoreResult<SessionNote> {
        let mut tx = self.manager.tenant_tx(note.tenant_id).await?;
        let row = sqlx::query_as::<_, NoteRow>(&format!(
            "INSERT INTO session_notes (id, tenant_id, client_id, session_id, template_type, content,
                                        created_by, updated_by)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7) RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(note.tenant_id)
        .bind(note.client_id)
        .bind(note.session_id)
        .bind(note.template_type.as_str())
        .bind(Json(&note.content))
        .bind(note.created_by)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        SessionNote::try_from(row)
    }

    async fn list_notes(&self, tenant_id: Uuid, client_id: Uuid) -> StoreResult<Vec<SessionNote>> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let rows = sqlx::query_as::<_, NoteRow>(&format!(
            "SELECT {} FROM session_notes WHERE tenant_id = $1 AND client_id = $2 ORDER BY created_at DESC",
            NOTE_COLUMNS
        ))
        .bind(tenant_id)
        .bind(client_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        rows.into_iter().map(SessionNote::try_from).collect()
    }

    async fn get_note(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<Option<SessionNote>> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let row = sqlx::query_as::<_, NoteRow>(&format!(
            "SELECT {} FROM session_notes WHERE tenant_id = $1 AND id = $2",
            NOTE_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
        tx.commit().await?;

        row.map(SessionNote::try_from).transpose()
    }

    async fn update_note(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        content: NoteContent,
        acting_user: Uuid,
    ) -> StoreResult<SessionNote> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let row = sqlx::query_as::<_, NoteRow>(&format!(
            "UPDATE session_notes SET content = $3, updated_by = $4, updated_at = now()
             WHERE tenant_id = $1 AND id = $2 RETURNING {}",
            NOTE_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(Json(&content))
        .bind(acting_user)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| missing("note", id))?;
        tx.commit().await?;

        SessionNote::try_from(row)
    }

    async fn delete_note(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<()> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let result = sqlx::query("DELETE FROM session_notes WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        if result.rows_affected() == 0 {
            return Err(missing("note", id));
        }
        Ok(())
    }

    async fn insert_homework(&self, homework: NewHomework) -> StoreResult<Homework> {
        let mut tx = self.manager.tenant_tx(homework.tenant_id).await?;
        let row = sqlx::query_as::<_, HomeworkRow>(&format!(
            "INSERT INTO homework (id, tenant_id, client_id, title, description, due_date, status,
                                   created_by, updated_by)
             VALUES ($1, $2, $3, $4, $5, $6, 'assigned', $7, $7) RETURNING {}",
            HOMEWORK_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(homework.tenant_id)
        .bind(homework.client_id)
        .bind(&homework.title)
        .bind(&homework.description)
        .bind(homework.due_date)
        .bind(homework.created_by)
        .fetch_one(&mut *tx)
        .await?;
        tx.commit().await?;

        Homework::try_from(row)
    }

    async fn list_homework(&self, tenant_id: Uuid, client_id: Uuid) -> StoreResult<Vec<Homework>> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let rows = sqlx::query_as::<_, HomeworkRow>(&format!(
            "SELECT {} FROM homework WHERE tenant_id = $1 AND client_id = $2
             ORDER BY due_date ASC NULLS LAST",
            HOMEWORK_COLUMNS
        ))
        .bind(tenant_id)
        .bind(client_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        rows.into_iter().map(Homework::try_from).collect()
    }

    async fn set_homework_status(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        status: HomeworkStatus,
        acting_user: Uuid,
    ) -> StoreResult<Homework> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let row = sqlx::query_as::<_, HomeworkRow>(&format!(
            "UPDATE homework SET status = $3, updated_by = $4, updated_at = now()
             WHERE tenant_id = $1 AND id = $2 RETURNING {}",
            HOMEWORK_COLUMNS
        ))
        .bind(tenant_id)
        .bind(id)
        .bind(status.as_str())
        .bind(acting_user)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| missing("homework", id))?;
        tx.commit().await?;

        Homework::try_from(row)
    }

    async fn delete_homework(&self, tenant_id: Uuid, id: Uuid) -> StoreResult<()> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let result = sqlx::query("DELETE FROM homework WHERE tenant_id = $1 AND id = $2")
            .bind(tenant_id)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        if result.rows_affected() == 0 {
            return Err(missing("homework", id));
        }
        Ok(())
    }

    async fn list_goals(&self, tenant_id: Uuid, client_id: Uuid) -> StoreResult<Vec<Goal>> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        let rows = sqlx::query_as::<_, GoalRow>(&format!(
            "SELECT {} FROM goals WHERE tenant_id = $1 AND client_id = $2 ORDER BY position",
            GOAL_COLUMNS
        ))
        .bind(tenant_id)
        .bind(client_id)
        .fetch_all(&mut *tx)
        .await?;
        tx.commit().await?;

        rows.into_iter().map(Goal::try_from).collect()
    }

    async fn replace_goals(
        &self,
        tenant_id: Uuid,
        client_id: Uuid,
        goals: Vec<GoalInput>,
        acting_user: Uuid,
    ) -> StoreResult<Vec<Goal>> {
        let mut tx = self.manager.tenant_tx(tenant_id).await?;
        sqlx::query("DELETE FROM goals WHERE tenant_id = $1 AND client_id = $2")
            .bind(tenant_id)
            .bind(client_id)
            .execute(&mut *tx)
            .await?;

        let mut saved = Vec::with_capacity(goals.len());
        for (position, goal) in goals.into_iter().enumerate() {
            let row = sqlx::query_as::<_, GoalRow>(&format!(
                "INSERT INTO goals (id, tenant_id, client_id, description, target_date, status, position, created_by)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {}",
                GOAL_COLUMNS
            ))
            .bind(Uuid::new_v4())
            .bind(tenant_id)
            .bind(client_id)
            .bind(&goal.description)
            .bind(goal.target_date)
            .bind(goal.status.as_str())
            .bind(position as i32)
            .bind(acting_user)
            .fetch_one(&mut *tx)
            .await?;
            saved.push(Goal::try_from(row)?);
        }
        tx.commit().await?;

        Ok(saved)
    }
}
