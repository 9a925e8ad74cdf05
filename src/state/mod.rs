mod game;
mod player;
mod room;
mod round;
mod session;

pub use room::{generate_room_code, normalize_room_code, CODE_LENGTH};
pub use session::Session;

use crate::oracle::{OracleGenerator, RoundGenerator};
use crate::protocol::HostMessage;
use crate::types::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};

/// Pacing delay before a broken luck block shows its effect
pub const DEFAULT_LUCK_BREAK_DELAY: Duration = Duration::from_secs(1);

/// Errors raised by session mutations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("No active room")]
    NoRoom,

    #[error("Invalid phase transition from {from:?} to {to:?}")]
    InvalidTransition { from: GamePhase, to: GamePhase },

    #[error("Room settings can only be changed during setup")]
    ConfigLocked,

    #[error("Invalid join request: {0}")]
    InvalidJoin(String),

    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    #[error("Effect not found: {0}")]
    EffectNotFound(EffectId),

    #[error("At least one other player must join before a round can start")]
    NotEnoughPlayers,

    #[error("Submissions are only accepted while players are choosing")]
    NotAcceptingChoices,

    #[error("Submission must not be empty")]
    EmptyChoice,

    #[error("No round is active")]
    NoActiveRound,

    #[error("The current round is not a luck block round")]
    NotLuckRound,

    #[error("No luck outcome assigned to player {0}")]
    NoLuckOutcome(PlayerId),

    #[error("Player {0} already broke the luck block this round")]
    AlreadyRevealed(PlayerId),

    #[error("Round generation failed: {0}")]
    RoundGeneration(String),
}

impl SessionError {
    /// Stable code sent to clients in ERROR messages
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::NoRoom => "NO_ROOM",
            SessionError::InvalidTransition { .. } => "INVALID_TRANSITION",
            SessionError::ConfigLocked => "CONFIG_LOCKED",
            SessionError::InvalidJoin(_) => "INVALID_JOIN",
            SessionError::PlayerNotFound(_) => "PLAYER_NOT_FOUND",
            SessionError::EffectNotFound(_) => "EFFECT_NOT_FOUND",
            SessionError::NotEnoughPlayers => "NOT_ENOUGH_PLAYERS",
            SessionError::NotAcceptingChoices => "NOT_ACCEPTING_CHOICES",
            SessionError::EmptyChoice => "EMPTY_CHOICE",
            SessionError::NoActiveRound => "NO_ACTIVE_ROUND",
            SessionError::NotLuckRound => "NOT_LUCK_ROUND",
            SessionError::NoLuckOutcome(_) => "NO_LUCK_OUTCOME",
            SessionError::AlreadyRevealed(_) => "ALREADY_REVEALED",
            SessionError::RoundGeneration(_) => "ROUND_GENERATION_FAILED",
        }
    }
}

impl From<SessionError> for HostMessage {
    fn from(e: SessionError) -> Self {
        HostMessage::error(e.code(), e.to_string())
    }
}

/// Shared host state: the one authoritative session plus its fan-out channel
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<RwLock<Option<Session>>>,
    /// Broadcast channel every connected peer subscribes to
    pub broadcast: broadcast::Sender<HostMessage>,
    pub generator: Arc<dyn RoundGenerator>,
    pub luck_break_delay: Duration,
}

impl AppState {
    /// State backed by an oracle without any LLM provider (fallback rounds only)
    pub fn new() -> Self {
        Self::with_generator(Arc::new(OracleGenerator::new(None)))
    }

    pub fn with_generator(generator: Arc<dyn RoundGenerator>) -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self {
            session: Arc::new(RwLock::new(None)),
            broadcast: tx,
            generator,
            luck_break_delay: DEFAULT_LUCK_BREAK_DELAY,
        }
    }

    pub fn with_luck_break_delay(mut self, delay: Duration) -> Self {
        self.luck_break_delay = delay;
        self
    }

    /// Get a copy of the current session
    pub async fn get_session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    /// Run a mutation against the session, then broadcast the new state.
    /// Nothing is broadcast when the mutation fails.
    pub(crate) async fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Session) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let result = {
            let mut guard = self.session.write().await;
            let session = guard.as_mut().ok_or(SessionError::NoRoom)?;
            f(session)?
        };
        self.broadcast_sync().await;
        Ok(result)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mutate_without_room() {
        let state = AppState::new();
        let result = state.mutate(|s| s.adjust_life("p1", 1)).await;
        assert_eq!(result, Err(SessionError::NoRoom));
    }

    #[tokio::test]
    async fn test_failed_mutation_does_not_broadcast() {
        let state = AppState::new();
        state.create_room(5).await;
        let mut rx = state.broadcast.subscribe();

        let result = state.mutate(|s| s.adjust_life("nobody", 1)).await;
        assert!(matches!(result, Err(SessionError::PlayerNotFound(_))));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_error_codes() {
        let msg: HostMessage = SessionError::EmptyChoice.into();
        match msg {
            HostMessage::Error { code, msg } => {
                assert_eq!(code, "EMPTY_CHOICE");
                assert_eq!(msg, "Submission must not be empty");
            }
            _ => panic!("Expected Error message"),
        }
    }
}
