//! Host command handlers
//!
//! Everything here arrives over the authenticated control socket. The host
//! playing along (choice, luck block) is applied directly under its own id.

use crate::protocol::HostMessage;
use crate::state::{AppState, SessionError};
use crate::types::*;
use std::sync::Arc;

fn reply<T>(result: Result<T, SessionError>) -> Option<HostMessage> {
    match result {
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("Host command rejected: {}", e);
            Some(e.into())
        }
    }
}

pub async fn handle_set_initial_lives(state: &Arc<AppState>, lives: u32) -> Option<HostMessage> {
    reply(state.set_initial_lives(lives).await)
}

pub async fn handle_transition_phase(
    state: &Arc<AppState>,
    phase: GamePhase,
) -> Option<HostMessage> {
    tracing::info!("Host transitioning to phase: {:?}", phase);
    reply(state.transition_phase(phase).await)
}

/// Rounds need at least one guest besides the host
pub async fn handle_start_round(state: &Arc<AppState>) -> Option<HostMessage> {
    let guests = state
        .get_session()
        .await
        .map(|s| s.guest_count())
        .unwrap_or(0);
    if guests == 0 {
        return Some(SessionError::NotEnoughPlayers.into());
    }

    reply(state.start_round().await)
}

pub async fn handle_submit_choice(state: &Arc<AppState>, choice: String) -> Option<HostMessage> {
    reply(state.submit_choice(HOST_PLAYER_ID, &choice).await)
}

pub async fn handle_break_luck_block(state: &Arc<AppState>) -> Option<HostMessage> {
    reply(state.break_luck_block(HOST_PLAYER_ID).await)
}

pub async fn handle_reveal_player(
    state: &Arc<AppState>,
    player_id: PlayerId,
) -> Option<HostMessage> {
    reply(state.reveal_player(&player_id).await)
}

pub async fn handle_adjust_life(
    state: &Arc<AppState>,
    player_id: PlayerId,
    delta: i32,
) -> Option<HostMessage> {
    reply(state.adjust_life(&player_id, delta).await)
}

pub async fn handle_remove_effect(
    state: &Arc<AppState>,
    player_id: PlayerId,
    effect_id: EffectId,
) -> Option<HostMessage> {
    reply(state.remove_effect(&player_id, &effect_id).await)
}
