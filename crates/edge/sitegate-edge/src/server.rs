//! axum adapter: every request runs through the gate except the health check.

use crate::gate::{Gate, GateAction};
use crate::origin::{OriginClient, OriginError};
use crate::request::EdgeRequest;
use crate::response::{error_page, redirect};
use axum::Router;
use axum::extract::{Request, State};
use axum::response::Response;
use axum::routing::get;
use http::StatusCode;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::warn;

pub const HEALTH_PATH: &str = "/_sitegate/health";

#[derive(Clone)]
pub struct EdgeState {
    pub gate: Arc<Gate>,
    pub origin: Arc<OriginClient>,
}

impl EdgeState {
    pub fn new(gate: Gate, origin: OriginClient) -> Self {
        Self {
            gate: Arc::new(gate),
            origin: Arc::new(origin),
        }
    }
}

pub fn build_router(state: EdgeState) -> Router {
    Router::new()
        .route(HEALTH_PATH, get(health))
        .fallback(gate_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

async fn gate_handler(State(state): State<EdgeState>, request: Request) -> Response {
    let (parts, _body) = request.into_parts();
    let edge_request = EdgeRequest::from_parts(&parts);

    match state.gate.handle(&edge_request).await {
        GateAction::Forward { path, query } => {
            relay(&state, &edge_request, &path, query.as_deref(), None).await
        }
        GateAction::NotFound { path } => {
            relay(&state, &edge_request, &path, None, Some(StatusCode::NOT_FOUND)).await
        }
        GateAction::Redirect {
            location,
            set_cookie,
        } => redirect(&location, set_cookie.as_deref()),
        GateAction::Failure { kind } => error_page(StatusCode::INTERNAL_SERVER_ERROR, kind),
    }
}

async fn relay(
    state: &EdgeState,
    request: &EdgeRequest,
    path: &str,
    query: Option<&str>,
    status: Option<StatusCode>,
) -> Response {
    match state
        .origin
        .relay(request.method(), path, query, status)
        .await
    {
        Ok(response) => response,
        Err(OriginError::PathEscape(path)) => {
            warn!(%path, "Refusing origin path outside its directory");
            error_page(StatusCode::NOT_FOUND, "NotFound")
        }
        Err(e) => {
            warn!(error = %e, path, "Origin fetch failed");
            error_page(StatusCode::BAD_GATEWAY, "OriginUnavailable")
        }
    }
}
