//! WebSocket message dispatch
//!
//! The connection's role decides which message set is accepted: guests speak
//! `GuestMessage`, the host control socket speaks `HostCommand`.

use crate::protocol::{GuestMessage, HostCommand, HostMessage};
use crate::state::AppState;
use crate::types::Role;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::{guest, host};

fn parse_error(e: serde_json::Error) -> HostMessage {
    tracing::error!("Failed to parse client message: {}", e);
    HostMessage::error("PARSE_ERROR", format!("Invalid message format: {}", e))
}

/// Handle one text frame and return an optional reply for this connection only.
///
/// Successful mutations reply with nothing; everyone learns about them
/// through the broadcast SYNC.
pub async fn handle_text(text: &str, role: Role, state: &Arc<AppState>) -> Option<HostMessage> {
    match role {
        Role::Guest => match serde_json::from_str::<GuestMessage>(text) {
            Ok(msg) => handle_guest_message(msg, state).await,
            Err(e) => Some(parse_error(e)),
        },
        Role::Host => match serde_json::from_str::<HostCommand>(text) {
            Ok(cmd) => handle_host_command(cmd, state).await,
            Err(e) => Some(parse_error(e)),
        },
    }
}

/// Frames going in and replies coming out of a connection's worker task
pub struct Dispatcher {
    pub frames: mpsc::UnboundedSender<String>,
    pub replies: mpsc::UnboundedReceiver<HostMessage>,
}

/// Handle a connection's frames on their own task, one at a time in arrival
/// order. A round start can wait on the oracle for a long time and the socket
/// loop has to keep relaying SYNCs meanwhile.
///
/// The worker ends once `frames` is dropped and the frame in progress is done,
/// so a disconnect never abandons a half-applied command.
pub fn spawn_dispatcher(role: Role, state: Arc<AppState>) -> Dispatcher {
    let (frames, mut frame_rx) = mpsc::unbounded_channel::<String>();
    let (reply_tx, replies) = mpsc::unbounded_channel();

    tokio::spawn(async move {
        while let Some(text) = frame_rx.recv().await {
            if let Some(reply) = handle_text(&text, role, &state).await {
                // Connection already gone; nothing left to tell
                let _ = reply_tx.send(reply);
            }
        }
        tracing::debug!("{:?} dispatcher finished", role);
    });

    Dispatcher { frames, replies }
}

pub async fn handle_guest_message(msg: GuestMessage, state: &Arc<AppState>) -> Option<HostMessage> {
    match msg {
        GuestMessage::Join { player } => guest::handle_join(state, player).await,
        GuestMessage::Choice { player_id, choice } => {
            guest::handle_choice(state, player_id, choice).await
        }
        GuestMessage::LuckBreak { player_id, effect } => {
            guest::handle_luck_break(state, player_id, effect).await
        }
    }
}

pub async fn handle_host_command(cmd: HostCommand, state: &Arc<AppState>) -> Option<HostMessage> {
    match cmd {
        HostCommand::SetInitialLives { lives } => {
            host::handle_set_initial_lives(state, lives).await
        }
        HostCommand::TransitionPhase { phase } => {
            host::handle_transition_phase(state, phase).await
        }
        HostCommand::StartRound => host::handle_start_round(state).await,
        HostCommand::SubmitChoice { choice } => host::handle_submit_choice(state, choice).await,
        HostCommand::BreakLuckBlock => host::handle_break_luck_block(state).await,
        HostCommand::RevealPlayer { player_id } => {
            host::handle_reveal_player(state, player_id).await
        }
        HostCommand::AdjustLife { player_id, delta } => {
            host::handle_adjust_life(state, player_id, delta).await
        }
        HostCommand::RemoveEffect {
            player_id,
            effect_id,
        } => host::handle_remove_effect(state, player_id, effect_id).await,
    }
}
