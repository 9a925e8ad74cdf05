//! A guest's local mirror of the host session.

use crate::protocol::SyncPayload;
use crate::types::*;

/// Read-only copy of the host's state, overwritten by every SYNC.
///
/// Guests never mutate this directly; they send an intent and wait for the
/// next snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct GuestReplica {
    pub phase: GamePhase,
    pub players: Vec<Player>,
    pub round: Option<RoundData>,
    pub config: GameConfig,
    pub used_prompts: Vec<String>,
}

impl Default for GuestReplica {
    fn default() -> Self {
        Self::new()
    }
}

impl GuestReplica {
    pub fn new() -> Self {
        Self {
            phase: GamePhase::RoleSelect,
            players: Vec::new(),
            round: None,
            config: GameConfig::default(),
            used_prompts: Vec::new(),
        }
    }

    /// Replace everything with the snapshot. Applying the same snapshot twice
    /// leaves the replica unchanged.
    pub fn apply_sync(&mut self, sync: SyncPayload) {
        self.phase = sync.game_state;
        self.players = sync.players;
        self.round = sync.ai_data;
        self.config = sync.config;
        self.used_prompts = sync.used_items;
    }

    pub fn me(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn all_players_ready(&self) -> bool {
        all_players_ready(&self.players)
    }

    pub fn luck_outcome_for(&self, player_id: &str) -> Option<&PlayerEffect> {
        self.round.as_ref()?.luck_outcome_for(player_id)
    }
}
