// Copyright (c) 2026 MXP contributors
//
// SPDX-License-Identifier: MIT
//! The gateway's HTTP surface (§4.11): a JSON-RPC POST endpoint and the
//! AgentCard discovery document, following this workspace's `axum` +
//! `tower-http` convention for HTTP-facing crates.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use mxp_a2a::AgentCard;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::dispatch::{dispatch, FrameCaller};
use crate::rpc::JsonRpcRequest;

/// Shared state behind every route.
pub struct GatewayState {
    pub caller: Arc<dyn FrameCaller>,
    pub agent_card: AgentCard,
}

/// Build the gateway's router. The caller owns binding the listener; this
/// crate only builds the `Router`, matching the rest of this workspace's
/// HTTP crates.
pub fn router(state: Arc<GatewayState>) -> Router {
    Router::new()
        .route("/rpc", post(handle_rpc))
        .route("/.well-known/agent.json", get(handle_agent_card))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn handle_rpc(State(state): State<Arc<GatewayState>>, Json(request): Json<JsonRpcRequest>) -> impl IntoResponse {
    if request.jsonrpc != "2.0" {
        return (StatusCode::BAD_REQUEST, Json(serde_json::json!({
            "jsonrpc": "2.0",
            "id": request.id,
            "error": { "code": crate::rpc::INVALID_REQUEST, "message": "jsonrpc must be \"2.0\"" }
        })));
    }
    info!(method = %request.method, "dispatching JSON-RPC request");
    let response = dispatch(request, state.caller.as_ref()).await;
    (StatusCode::OK, Json(serde_json::to_value(response).expect("JsonRpcResponse always serializes")))
}

async fn handle_agent_card(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    match state.agent_card.to_json() {
        Ok(value) => (StatusCode::OK, Json(value)),
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, Json(serde_json::json!({ "error": "agent card serialization failed" }))),
    }
}
