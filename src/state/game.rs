use super::{AppState, SessionError};
use crate::types::*;

impl AppState {
    /// Host-driven phase change for the transitions that carry no payload.
    ///
    /// AI_THINKING and PLAYERS_INPUT are owned by [`AppState::start_round`].
    pub async fn transition_phase(&self, phase: GamePhase) -> Result<GamePhase, SessionError> {
        if matches!(phase, GamePhase::AiThinking | GamePhase::PlayersInput) {
            let from = self
                .get_session()
                .await
                .map(|s| s.phase)
                .ok_or(SessionError::NoRoom)?;
            return Err(SessionError::InvalidTransition { from, to: phase });
        }

        self.mutate(|session| {
            session.transition(phase)?;
            Ok(session.phase)
        })
        .await?;

        tracing::info!("Phase changed to {:?}", phase);
        Ok(phase)
    }

    /// Set the lives new guests start with (setup only, minimum 1)
    pub async fn set_initial_lives(&self, lives: u32) -> Result<u32, SessionError> {
        self.mutate(|session| session.set_initial_lives(lives)).await
    }

    /// Derived ready gate for the reveal: every non-host player has locked in
    pub async fn all_players_ready(&self) -> bool {
        self.session
            .read()
            .await
            .as_ref()
            .is_some_and(|s| s.all_players_ready())
    }
}
