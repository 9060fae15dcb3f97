use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::text_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HomeworkStatus {
    Assigned,
    Completed,
}

text_enum!(HomeworkStatus, "homework status", {
    Assigned => "assigned",
    Completed => "completed",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Homework {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: HomeworkStatus,
    pub created_by: Uuid,
    pub updated_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewHomework {
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub created_by: Uuid,
}
