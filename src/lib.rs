// Public API for the host binary, the guest client and integration tests

pub mod api;
pub mod auth;
pub mod broadcast;
pub mod client;
pub mod config;
pub mod llm;
pub mod oracle;
pub mod protocol;
pub mod replica;
pub mod state;
pub mod types;
pub mod ws;

use axum::{middleware, routing::get, Router};
use std::sync::Arc;

/// All host routes: guest sockets, the authenticated control socket and the HTTP API
pub fn router(state: Arc<state::AppState>, auth_config: Arc<auth::AuthConfig>) -> Router {
    let host_routes = Router::new()
        .route("/host/ws", get(ws::host_ws_handler))
        .layer(middleware::from_fn_with_state(
            auth_config,
            auth::host_ws_auth_middleware,
        ));

    Router::new()
        .route("/room/{code}", get(ws::guest_ws_handler))
        .route("/api/room", get(api::room_info))
        .merge(host_routes)
        .with_state(state)
}
