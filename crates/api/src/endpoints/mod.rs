//! API endpoints.

mod health;
mod service_messages;
mod sofie_instances;

use axum::Router;

use crate::state::AppState;

/// Create the API router, to be nested under `/api`.
pub fn router() -> Router<AppState> {
    Router::new()
        .nest("/serviceMessages", service_messages::router())
        .nest("/sofieInstances", sofie_instances::router())
}

/// Create the health check router, served at the root.
pub fn health_router() -> Router<AppState> {
    health::router()
}
