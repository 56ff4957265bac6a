use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::error::ApiError;
use crate::sync::responses::SyncResponse;
use crate::AppState;

/// Run one marketplace sync to completion and report its summary.
///
/// The run continues on its own task if the client disconnects.
pub async fn run_amazon_sync(State(state): State<AppState>) -> Result<Json<SyncResponse>, ApiError> {
    let syncer = Arc::clone(&state.marketplace.get()?.syncer);
    let summary = syncer.run_detached().await?;
    Ok(Json(SyncResponse {
        success: true,
        summary,
    }))
}
