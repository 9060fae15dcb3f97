// handlers/public/mod.rs - Public handlers (no authentication required)
//
// Service discovery, health and token acquisition.

pub mod auth;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::app::AppState;

/// GET / - service discovery
pub async fn root() -> Json<Value> {
    Json(json!({
        "success": true,
        "data": {
            "name": "Practice API",
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Multi-tenant practice management backend",
            "endpoints": {
                "home": "/ (public)",
                "health": "/health (public)",
                "auth": "/auth/register, /auth/login (public), /auth/whoami (protected)",
                "administration": "/users, /roles, /page-permissions (protected)",
                "clients": "/clients[/:id] (protected)",
                "uploads": "/clients/:id/resources, /resources/:id, /documents[/:id] (protected)",
                "records": "/clients/:id/{sessions,notes,homework,goals} (protected)",
                "settings": "/branding, /settings/templates (protected)",
                "video": "/video/rooms, /video/token (protected)",
                "root": "/root/tenants (root token)",
            }
        }
    }))
}

/// GET /health - liveness plus database reachability when PostgreSQL backs the store
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let Some(database) = &state.database else {
        return (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "memory" }
            })),
        );
    };

    match database.health_check().await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "code": "SERVICE_UNAVAILABLE",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}
