//! Guest message handlers

use crate::protocol::{HostMessage, JoinInfo};
use crate::state::AppState;
use crate::types::*;
use std::sync::Arc;

pub async fn handle_join(state: &Arc<AppState>, player: JoinInfo) -> Option<HostMessage> {
    match state.join_player(&player.id, &player.name).await {
        Ok(true) => {
            tracing::info!("Player {} joined as {}", player.id, player.name);
            None
        }
        Ok(false) => {
            tracing::info!("Player {} rejoined", player.id);
            None
        }
        Err(e) => {
            tracing::warn!("Join rejected: {}", e);
            Some(e.into())
        }
    }
}

pub async fn handle_choice(
    state: &Arc<AppState>,
    player_id: PlayerId,
    choice: String,
) -> Option<HostMessage> {
    match state.submit_choice(&player_id, &choice).await {
        Ok(_) => None,
        Err(e) => Some(e.into()),
    }
}

/// The reported effect is taken as-is
pub async fn handle_luck_break(
    state: &Arc<AppState>,
    player_id: PlayerId,
    effect: PlayerEffect,
) -> Option<HostMessage> {
    match state.apply_luck_break(&player_id, effect).await {
        Ok(()) => None,
        Err(e) => Some(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn join(id: &str, name: &str) -> JoinInfo {
        JoinInfo {
            id: id.to_string(),
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_join_and_rejoin() {
        let state = Arc::new(AppState::new());
        state.create_room(4).await;

        assert!(handle_join(&state, join("p1", "Alex")).await.is_none());
        assert!(handle_join(&state, join("p1", "Alex")).await.is_none());

        let session = state.get_session().await.unwrap();
        assert_eq!(session.guest_count(), 1);
        assert_eq!(session.player("p1").unwrap().lives, 4);
    }

    #[tokio::test]
    async fn test_join_empty_name_is_error() {
        let state = Arc::new(AppState::new());
        state.create_room(4).await;

        match handle_join(&state, join("p1", "   ")).await {
            Some(HostMessage::Error { code, .. }) => assert_eq!(code, "INVALID_JOIN"),
            other => panic!("Expected error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_choice_outside_round_is_error() {
        let state = Arc::new(AppState::new());
        state.create_room(4).await;
        handle_join(&state, join("p1", "Alex")).await;

        match handle_choice(&state, "p1".to_string(), "torch".to_string()).await {
            Some(HostMessage::Error { code, .. }) => assert_eq!(code, "NOT_ACCEPTING_CHOICES"),
            other => panic!("Expected error, got {:?}", other),
        }
    }
}
