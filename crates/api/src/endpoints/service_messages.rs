//! Service message endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use monitor_common::AppResult;
use monitor_core::{CreateServiceMessageInput, UpdateServiceMessageInput};
use monitor_db::ServiceMessage;
use tracing::info;

use crate::{response::ApiResponse, state::AppState};

/// Create service message router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_messages).post(create_message))
        .route(
            "/{id}",
            get(get_message).post(update_message).delete(deactivate_message),
        )
        .route("/refreshPublishStates/{id}", post(refresh_publish_states))
}

/// List all messages, active or not.
async fn list_messages(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<ServiceMessage>>> {
    let messages = state.message_service.list().await?;
    Ok(ApiResponse::ok(messages))
}

/// Create a message and start publishing it.
async fn create_message(
    State(state): State<AppState>,
    Json(input): Json<CreateServiceMessageInput>,
) -> AppResult<ApiResponse<ServiceMessage>> {
    let created = state.message_service.create(input).await?;
    info!(message_id = ?created.id, "Service message created via API");
    Ok(ApiResponse::created(created))
}

/// Get a single message.
async fn get_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ServiceMessage>> {
    let message = state.message_service.get(&id).await?;
    Ok(ApiResponse::ok(message))
}

/// Replace criticality and text of a message.
async fn update_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(input): Json<UpdateServiceMessageInput>,
) -> AppResult<ApiResponse<ServiceMessage>> {
    let updated = state.message_service.update(&id, input).await?;
    Ok(ApiResponse::ok(updated))
}

/// Deactivate a message and recall it from its targets.
async fn deactivate_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ServiceMessage>> {
    let deactivated = state.message_service.deactivate(&id).await?;
    info!(message_id = %id, "Service message deactivated via API");
    Ok(ApiResponse::ok(deactivated))
}

/// Re-read the publish state of a message from its targets.
async fn refresh_publish_states(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ServiceMessage>> {
    let refreshed = state.message_service.refresh_publish_states(&id).await?;
    Ok(ApiResponse::ok(refreshed))
}
