use super::calculator::Calculator;
use super::protocol::*;
use super::WorkerCallError;

use axum::{http::StatusCode, Extension, Json};
use std::sync::Arc;

pub async fn handle_execute(
    Extension(calculator): Extension<Arc<Calculator>>,
    Json(req): Json<ExecuteRequest>,
) -> (StatusCode, Json<Option<ExecuteResponse>>) {
    match calculator.run(&req.tasks) {
        Ok(result) => {
            tracing::debug!("Executed batch of {} tasks -> {}", req.tasks.len(), result);
            (StatusCode::OK, Json(Some(ExecuteResponse { result })))
        }
        Err(WorkerCallError::Overloaded) => {
            tracing::info!("Refused batch of {} tasks: occupied", req.tasks.len());
            (StatusCode::TOO_MANY_REQUESTS, Json(None))
        }
        Err(e) => {
            // A local run has no transport to fail on; kept for completeness.
            tracing::error!("Batch execution failed: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, Json(None))
        }
    }
}

pub async fn handle_capacity(
    Extension(calculator): Extension<Arc<Calculator>>,
) -> Json<CapacityResponse> {
    Json(CapacityResponse {
        capacity: calculator.capacity(),
    })
}
