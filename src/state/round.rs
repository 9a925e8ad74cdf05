use super::{AppState, SessionError};
use crate::oracle::RoundRequest;
use crate::types::*;

impl AppState {
    /// Start a new round: AI_THINKING, ask the generator, then PLAYERS_INPUT.
    ///
    /// The session lock is not held while the generator runs. If generation
    /// fails the phase falls back to LOBBY and the previous round is kept.
    pub async fn start_round(&self) -> Result<RoundData, SessionError> {
        let request = {
            let mut guard = self.session.write().await;
            let session = guard.as_mut().ok_or(SessionError::NoRoom)?;
            session.begin_round()?;
            RoundRequest {
                used_prompts: session.used_prompts.clone(),
                luck_block_appeared: session.config.luck_block_appeared,
                players: session.players.clone(),
            }
        };
        self.broadcast_sync().await;
        tracing::info!("Round requested from oracle");

        match self.generator.generate(request).await {
            Ok(round) => {
                let installed = round.clone();
                self.mutate(move |session| session.apply_round(installed))
                    .await?;
                tracing::info!(
                    "Round started: {} ({:?}, {} items)",
                    round.theme,
                    round.mode,
                    round.items.len()
                );
                Ok(round)
            }
            Err(e) => {
                tracing::warn!("Round generation failed, back to lobby: {}", e);
                self.mutate(|session| session.abort_round()).await?;
                Err(SessionError::RoundGeneration(e.to_string()))
            }
        }
    }

    /// Break the luck block for a player whose outcome lives on this host.
    ///
    /// Waits the pacing delay, then applies a fresh copy of the assigned effect.
    pub async fn break_luck_block(&self, player_id: &str) -> Result<PlayerEffect, SessionError> {
        let effect = {
            let guard = self.session.read().await;
            let session = guard.as_ref().ok_or(SessionError::NoRoom)?;
            if session.phase != GamePhase::PlayersInput {
                return Err(SessionError::NotAcceptingChoices);
            }
            session.luck_outcome(player_id)?.reissue()
        };

        tokio::time::sleep(self.luck_break_delay).await;

        self.apply_luck_break(player_id, effect.clone()).await?;
        Ok(effect)
    }

    /// Apply a reported luck block result. The effect is not re-derived.
    pub async fn apply_luck_break(
        &self,
        player_id: &str,
        effect: PlayerEffect,
    ) -> Result<(), SessionError> {
        let name = effect.name.clone();
        self.mutate(|session| session.apply_luck_break(player_id, effect))
            .await?;
        tracing::info!("Player {} broke the luck block: {}", player_id, name);
        Ok(())
    }
}
