//! HTTP API endpoints.
//!
//! Lets a guest check a room code before opening a socket.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::sync::Arc;

use crate::protocol::RoomInfo;
use crate::state::AppState;

/// Summary of the room this host owns.
///
/// GET /api/room
pub async fn room_info(State(state): State<Arc<AppState>>) -> Response {
    match state.get_session().await {
        Some(session) => Json(RoomInfo {
            room_id: session.config.room_id.clone(),
            phase: session.phase,
            player_count: session.guest_count(),
        })
        .into_response(),
        None => (StatusCode::NOT_FOUND, "No active room").into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::GamePhase;

    #[tokio::test]
    async fn test_room_info() {
        let state = Arc::new(AppState::new());
        let session = state.create_room(5).await;
        state.join_player("p1", "Alex").await.unwrap();

        let response = room_info(State(state)).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let info: RoomInfo = serde_json::from_slice(&body).unwrap();
        assert_eq!(info.room_id, session.config.room_id);
        assert_eq!(info.phase, GamePhase::SetupRoom);
        assert_eq!(info.player_count, 1);
    }

    #[tokio::test]
    async fn test_no_room_is_404() {
        let state = Arc::new(AppState::new());
        let response = room_info(State(state)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
