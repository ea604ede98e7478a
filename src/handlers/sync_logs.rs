use axum::{Json, extract::State, http::StatusCode};
use sea_orm::{EntityTrait, QueryOrder, QuerySelect};
use serde::Serialize;

use crate::{
    AppState,
    entities::{prelude::*, sync_logs},
};

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Handler for GET /api/sync-logs
/// Returns the most recent sync runs, newest first, for operational dashboards.
pub async fn list_sync_logs(
    State(state): State<AppState>,
) -> Result<Json<Vec<sync_logs::Model>>, (StatusCode, Json<ErrorResponse>)> {
    let logs = SyncLogs::find()
        .order_by_desc(sync_logs::Column::StartedAt)
        .limit(50)
        .all(&state.db)
        .await
        .map_err(|e| {
            tracing::error!("Failed to query sync logs: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: format!("Database error: {}", e),
                }),
            )
        })?;

    Ok(Json(logs))
}
