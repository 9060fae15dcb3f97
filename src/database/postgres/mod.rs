//! PostgreSQL store. Tenant tables are read and written inside
//! [`DatabaseManager::tenant_tx`] so row-level security applies to every query.

mod clients;
mod clinical;
mod identity;
mod permissions;
mod settings;

use std::str::FromStr;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::types::UnknownVariant;

#[derive(Clone)]
pub struct PgDatabase {
    manager: DatabaseManager,
}

impl PgDatabase {
    pub fn new(manager: DatabaseManager) -> Self {
        Self { manager }
    }

    pub fn manager(&self) -> &DatabaseManager {
        &self.manager
    }
}

/// Text columns holding enum values
fn parse_text<T>(value: &str) -> Result<T, DatabaseError>
where
    T: FromStr<Err = UnknownVariant>,
{
    value.parse().map_err(|e: UnknownVariant| DatabaseError::QueryError(e.to_string()))
}

fn missing(what: &str, id: uuid::Uuid) -> DatabaseError {
    DatabaseError::NotFound(format!("{} {} not found", what, id))
}
