//! Application state and router assembly.
//!
//! Routes are grouped by access tier: public (no token), protected (Bearer
//! JWT plus an active tenant) and root (JWT carrying the `root` claim).

use std::sync::Arc;

use axum::{
    extract::DefaultBodyLimit,
    middleware::from_fn_with_state,
    routing::{get, post, put},
    Router,
};
use tokio::sync::broadcast;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::AppConfig;
use crate::database::{Database, DatabaseManager};
use crate::events::{TemplateSettingsBus, TemplateSettingsChanged};
use crate::handlers::{elevated, protected, public};
use crate::middleware::{jwt_auth_middleware, root_access_middleware, validate_tenant_middleware};
use crate::services::{
    ClientService, ClinicalService, DocumentService, ResourceService, RoleService, SettingsService, TenantService,
    UserService, VideoService,
};
use crate::storage::ObjectStore;
use crate::video::VideoProvider;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Present when backed by PostgreSQL; used by `/health`
    pub database: Option<DatabaseManager>,
    pub tenants: TenantService,
    pub users: UserService,
    pub roles: RoleService,
    pub clients: ClientService,
    pub resources: ResourceService,
    pub documents: DocumentService,
    pub clinical: ClinicalService,
    pub settings: SettingsService,
    pub video: VideoService,
}

impl AppState {
    pub fn new<D: Database + 'static>(
        config: AppConfig,
        db: Arc<D>,
        resource_objects: Arc<dyn ObjectStore>,
        document_objects: Arc<dyn ObjectStore>,
        video: Arc<dyn VideoProvider>,
    ) -> Self {
        let max_upload = config.storage.max_upload_bytes;

        Self {
            tenants: TenantService::new(db.clone(), db.clone()),
            users: UserService::new(db.clone(), db.clone()),
            roles: RoleService::new(db.clone(), db.clone(), config.permissions.default_page_policy),
            clients: ClientService::new(db.clone()),
            resources: ResourceService::new(db.clone(), db.clone(), resource_objects, max_upload),
            documents: DocumentService::new(db.clone(), db.clone(), document_objects, max_upload),
            clinical: ClinicalService::new(db.clone(), db.clone(), db.clone()),
            settings: SettingsService::new(db.clone(), TemplateSettingsBus::new()),
            video: VideoService::new(db, video, config.video.clone()),
            database: None,
            config: Arc::new(config),
        }
    }

    pub fn with_database_manager(mut self, manager: DatabaseManager) -> Self {
        self.database = Some(manager);
        self
    }

    /// Receiver for note-template changes across all tenants
    pub fn template_settings_events(&self) -> broadcast::Receiver<TemplateSettingsChanged> {
        self.settings.bus().subscribe()
    }

    pub fn jwt_secret(&self) -> &str {
        &self.config.security.jwt_secret
    }

    pub fn is_root_email(&self, email: &str) -> bool {
        self.config
            .security
            .root_emails
            .iter()
            .any(|root| root.eq_ignore_ascii_case(email))
    }
}

/// Multipart overhead allowed on top of the configured upload limit
const BODY_LIMIT_SLACK: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);
    let body_limit = state.config.storage.max_upload_bytes + BODY_LIMIT_SLACK;
    let request_logging = state.config.api.enable_request_logging;

    let router = Router::new()
        .merge(public_routes())
        .merge(protected_routes(state.clone()))
        .merge(root_routes(state.clone()))
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors);

    if request_logging {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    if !config.security.enable_cors {
        return CorsLayer::new();
    }

    let origins: Vec<_> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(tower_http::cors::Any)
            .allow_headers(tower_http::cors::Any)
    }
}

fn public_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(public::root))
        .route("/health", get(public::health))
        .route("/auth/register", post(public::auth::register))
        .route("/auth/login", post(public::auth::login))
}

fn protected_routes(state: AppState) -> Router<AppState> {
    use protected::*;

    Router::new()
        .route("/auth/whoami", get(auth::whoami))
        // Administration
        .route("/users", get(users::list).post(users::add))
        .route("/roles", get(roles::list).post(roles::create))
        .route("/roles/available", get(roles::available))
        .route("/roles/assignable", get(roles::assignable))
        .route("/roles/:id", put(roles::update).delete(roles::delete))
        .route("/page-permissions", get(page_permissions::list).post(page_permissions::create))
        .route("/page-permissions/check", get(page_permissions::check))
        .route("/page-permissions/:id/toggle", post(page_permissions::toggle))
        // Clients
        .route("/clients", get(clients::list).post(clients::create))
        .route(
            "/clients/:id",
            get(clients::show).put(clients::update).delete(clients::delete),
        )
        // Uploads
        .route("/clients/:id/resources", get(resources::list).post(resources::create))
        .route("/resources/:id", get(resources::show).delete(resources::delete))
        .route("/resources/:id/download", get(resources::download))
        .route("/documents", get(documents::list).post(documents::create))
        .route("/documents/:id", get(documents::show).delete(documents::delete))
        .route("/documents/:id/download", get(documents::download))
        // Clinical records
        .route("/clients/:id/sessions", get(sessions::list).post(sessions::create))
        .route("/sessions/:id", get(sessions::show).patch(sessions::update_status))
        .route("/clients/:id/notes", get(notes::list).post(notes::create))
        .route("/notes/:id", put(notes::update).delete(notes::delete))
        .route("/clients/:id/homework", get(homework::list).post(homework::assign))
        .route("/homework/:id", put(homework::set_status).delete(homework::delete))
        .route("/clients/:id/goals", get(goals::list).put(goals::replace))
        // Settings
        .route("/branding", get(settings::branding).put(settings::update_branding))
        .route(
            "/settings/templates",
            get(settings::templates).put(settings::update_templates),
        )
        // Telehealth
        .route("/video/rooms", post(video::create_room))
        .route("/video/rooms/:session_id", axum::routing::delete(video::end_room))
        .route("/video/token", post(video::token))
        // Layers run bottom-up: JWT first, then tenant validation
        .route_layer(from_fn_with_state(state.clone(), validate_tenant_middleware))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}

fn root_routes(state: AppState) -> Router<AppState> {
    use elevated::root::tenant;

    Router::new()
        .route("/root/tenants", get(tenant::list))
        .route("/root/tenants/:id/status", put(tenant::update_status))
        .route_layer(axum::middleware::from_fn(root_access_middleware))
        .route_layer(from_fn_with_state(state, jwt_auth_middleware))
}
