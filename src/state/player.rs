use super::{AppState, SessionError};
use crate::types::*;

impl AppState {
    /// Register a guest. Re-joining with a known id leaves the roster as is.
    pub async fn join_player(&self, id: &str, name: &str) -> Result<bool, SessionError> {
        let added = self.mutate(|session| session.join(id, name)).await?;
        if added {
            tracing::info!("Player joined: {} ({})", name.trim(), id);
        } else {
            tracing::debug!("Player {} re-sent JOIN", id);
        }
        Ok(added)
    }

    /// Record a player's submission for the current round
    pub async fn submit_choice(
        &self,
        player_id: &str,
        choice: &str,
    ) -> Result<String, SessionError> {
        let choice = self
            .mutate(|session| session.submit_choice(player_id, choice))
            .await?;
        tracing::info!("Player {} submitted {}", player_id, choice);
        Ok(choice)
    }

    /// Make one player's submission visible to everyone
    pub async fn reveal_player(&self, player_id: &str) -> Result<(), SessionError> {
        self.mutate(|session| session.reveal_player(player_id))
            .await?;
        tracing::info!("Revealed player {}", player_id);
        Ok(())
    }

    /// Adjust a player's lives by a signed delta, clamped at zero
    pub async fn adjust_life(&self, player_id: &str, delta: i32) -> Result<u32, SessionError> {
        let lives = self
            .mutate(|session| session.adjust_life(player_id, delta))
            .await?;
        tracing::info!(
            "Adjusted lives of {} by {} (now {})",
            player_id,
            delta,
            lives
        );
        Ok(lives)
    }

    pub async fn remove_effect(
        &self,
        player_id: &str,
        effect_id: &str,
    ) -> Result<PlayerEffect, SessionError> {
        let effect = self
            .mutate(|session| session.remove_effect(player_id, effect_id))
            .await?;
        tracing::info!("Removed effect '{}' from {}", effect.name, player_id);
        Ok(effect)
    }

    pub async fn get_player(&self, player_id: &str) -> Option<Player> {
        self.session
            .read()
            .await
            .as_ref()
            .and_then(|s| s.player(player_id).cloned())
    }
}
