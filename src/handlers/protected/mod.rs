// handlers/protected/mod.rs - Protected handlers
//
// Every route here runs behind the JWT and tenant validation middleware, so
// handlers receive a `TenantContext` extension for the caller's practice.

pub mod auth;
pub mod clients;
pub mod documents;
pub mod goals;
pub mod homework;
pub mod notes;
pub mod page_permissions;
pub mod resources;
pub mod roles;
pub mod sessions;
pub mod settings;
pub mod users;
pub mod utils;
pub mod video;
