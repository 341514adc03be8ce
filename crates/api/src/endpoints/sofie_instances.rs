//! Sofie instance endpoints.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use monitor_common::AppResult;
use monitor_core::AddInstanceInput;
use monitor_db::SofieInstance;

use crate::{response::ApiResponse, state::AppState};

/// Create Sofie instance router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_instances).post(add_instance))
        .route("/{id}", get(get_instance).delete(remove_instance))
}

async fn list_instances(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<SofieInstance>>> {
    let instances = state.instance_service.list().await?;
    Ok(ApiResponse::ok(instances))
}

async fn add_instance(
    State(state): State<AppState>,
    Json(input): Json<AddInstanceInput>,
) -> AppResult<ApiResponse<SofieInstance>> {
    let added = state.instance_service.add(input).await?;
    Ok(ApiResponse::ok(added))
}

async fn get_instance(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<SofieInstance>> {
    let instance = state.instance_service.get(&id).await?;
    Ok(ApiResponse::ok(instance))
}

async fn remove_instance(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<SofieInstance>> {
    let removed = state.instance_service.remove(&id).await?;
    Ok(ApiResponse::ok(removed))
}
