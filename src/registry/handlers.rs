use super::protocol::*;
use super::service::{NameRegistry, ServiceEntry};

use axum::{extract::Path, http::StatusCode, Extension, Json};
use std::sync::Arc;

pub async fn handle_register(
    Extension(registry): Extension<Arc<NameRegistry>>,
    Json(req): Json<RegisterRequest>,
) -> StatusCode {
    let entry = ServiceEntry {
        addr: req.addr,
        kind: req.kind,
    };

    match registry.register(&req.name, entry) {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!("Registration refused for {}: {}", req.name, e);
            StatusCode::CONFLICT
        }
    }
}

pub async fn handle_unregister(
    Extension(registry): Extension<Arc<NameRegistry>>,
    Json(req): Json<UnregisterRequest>,
) -> StatusCode {
    match registry.unregister(&req.name) {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::NOT_FOUND,
    }
}

pub async fn handle_list(
    Extension(registry): Extension<Arc<NameRegistry>>,
) -> Json<ListResponse> {
    Json(ListResponse {
        names: registry.list(),
    })
}

pub async fn handle_lookup(
    Extension(registry): Extension<Arc<NameRegistry>>,
    Path(name): Path<String>,
) -> (StatusCode, Json<LookupResponse>) {
    match registry.lookup(&name) {
        Some(entry) => (StatusCode::OK, Json(LookupResponse { entry: Some(entry) })),
        None => (StatusCode::NOT_FOUND, Json(LookupResponse { entry: None })),
    }
}
