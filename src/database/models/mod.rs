pub mod client;
pub mod document;
pub mod goal;
pub mod homework;
pub mod page_permission;
pub mod resource;
pub mod role;
pub mod session;
pub mod settings;
pub mod tenant;
pub mod user;

pub use client::{Client, ClientInput};
pub use document::{Document, NewDocument};
pub use goal::{Goal, GoalInput, GoalStatus};
pub use homework::{Homework, HomeworkStatus, NewHomework};
pub use page_permission::{NewPagePermission, PagePermission};
pub use resource::{NewResource, Resource, ResourceType};
pub use role::{BaseRole, NewRole, Role, RoleEntry};
pub use session::{
    NewSession, NewSessionNote, NoteContent, Session, SessionNote, SessionStatus, SessionType,
    TemplateType,
};
pub use settings::{Branding, TemplateSettings};
pub use tenant::{NewTenant, Tenant, TenantStatus};
pub use user::{Membership, NewUser, TenantUser, User};
