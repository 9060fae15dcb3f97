use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::text_enum;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    Active,
    Achieved,
    Discontinued,
}

text_enum!(GoalStatus, "goal status", {
    Active => "active",
    Achieved => "achieved",
    Discontinued => "discontinued",
});

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub client_id: Uuid,
    pub description: String,
    pub target_date: Option<NaiveDate>,
    pub status: GoalStatus,
    pub position: i32,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One entry of a client's goal list as submitted by the caller
#[derive(Debug, Clone, Deserialize)]
pub struct GoalInput {
    pub description: String,
    pub target_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: GoalStatus,
}
