//! The authoritative session record and its synchronous mutations.
//!
//! Everything here is plain data manipulation; locking and broadcasting live
//! on [`super::AppState`].

use super::SessionError;
use crate::protocol::SyncPayload;
use crate::types::*;
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub phase: GamePhase,
    pub config: GameConfig,
    /// Join order
    pub players: Vec<Player>,
    pub round: Option<RoundData>,
    /// Prompt values already played, oldest first, no duplicates
    pub used_prompts: Vec<String>,
    /// Players who broke the luck block this round
    luck_breaks: HashSet<PlayerId>,
}

impl Session {
    /// Fresh room owned by the host, waiting for configuration
    pub fn new(room_id: RoomCode, initial_lives: u32) -> Self {
        let config = GameConfig {
            room_id,
            initial_lives: initial_lives.max(1),
            ..GameConfig::default()
        };

        Self {
            phase: GamePhase::SetupRoom,
            config,
            players: vec![Player::host()],
            round: None,
            used_prompts: Vec::new(),
            luck_breaks: HashSet::new(),
        }
    }

    /// Check if a phase transition is valid
    pub fn is_valid_transition(from: GamePhase, to: GamePhase) -> bool {
        use GamePhase::*;

        matches!(
            (from, to),
            (RoleSelect, SetupRoom)
                | (SetupRoom, Lobby)
                | (Lobby, AiThinking)
                | (RoundResult, AiThinking)
                | (AiThinking, PlayersInput)
                | (AiThinking, Lobby)
                | (PlayersInput, RevealSequence)
                | (RevealSequence, RoundResult)
                | (RoundResult, Lobby)
        )
    }

    /// Get valid transitions from a given phase
    pub fn valid_transitions(from: GamePhase) -> Vec<GamePhase> {
        use GamePhase::*;

        [
            RoleSelect,
            SetupRoom,
            Lobby,
            AiThinking,
            PlayersInput,
            RevealSequence,
            RoundResult,
            GameOver,
        ]
        .into_iter()
        .filter(|to| Self::is_valid_transition(from, *to))
        .collect()
    }

    pub fn transition(&mut self, to: GamePhase) -> Result<(), SessionError> {
        if !Self::is_valid_transition(self.phase, to) {
            return Err(SessionError::InvalidTransition {
                from: self.phase,
                to,
            });
        }
        self.phase = to;
        Ok(())
    }

    pub fn set_initial_lives(&mut self, lives: u32) -> Result<u32, SessionError> {
        if self.phase != GamePhase::SetupRoom {
            return Err(SessionError::ConfigLocked);
        }
        self.config.initial_lives = lives.max(1);
        Ok(self.config.initial_lives)
    }

    pub fn player(&self, player_id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    fn player_mut(&mut self, player_id: &str) -> Result<&mut Player, SessionError> {
        self.players
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or_else(|| SessionError::PlayerNotFound(player_id.to_string()))
    }

    pub fn guest_count(&self) -> usize {
        self.players.iter().filter(|p| !p.is_host).count()
    }

    /// Add a guest to the roster. Returns false when the id was already known.
    pub fn join(&mut self, id: &str, name: &str) -> Result<bool, SessionError> {
        let id = id.trim();
        let name = name.trim();
        if id.is_empty() || name.is_empty() {
            return Err(SessionError::InvalidJoin(
                "player id and name are required".to_string(),
            ));
        }
        if id == HOST_PLAYER_ID {
            return Err(SessionError::InvalidJoin(format!("'{}' is reserved", id)));
        }
        if self.player(id).is_some() {
            return Ok(false);
        }

        self.players.push(Player::guest(
            id.to_string(),
            name.to_string(),
            self.config.initial_lives,
        ));
        Ok(true)
    }

    /// Enter AI_THINKING ahead of the generator call
    pub fn begin_round(&mut self) -> Result<(), SessionError> {
        self.transition(GamePhase::AiThinking)
    }

    /// Install a freshly generated round and reset per-round player state
    pub fn apply_round(&mut self, round: RoundData) -> Result<(), SessionError> {
        self.transition(GamePhase::PlayersInput)?;

        for player in &mut self.players {
            player.current_choice.clear();
            player.is_revealed = false;
            player.is_ready = player.is_host;
        }

        self.record_prompts(round.prompt_values());
        self.luck_breaks.clear();
        if round.is_luck_block() {
            self.config.luck_block_appeared = true;
        }
        self.round = Some(round);
        Ok(())
    }

    fn record_prompts(&mut self, values: impl IntoIterator<Item = String>) {
        for value in values {
            if !self.used_prompts.contains(&value) {
                self.used_prompts.push(value);
            }
        }
    }

    /// Generator failed: back to the lobby, previous round data untouched
    pub fn abort_round(&mut self) -> Result<(), SessionError> {
        self.transition(GamePhase::Lobby)
    }

    /// Trimmed, upper-cased submission text
    pub fn normalize_choice(raw: &str) -> String {
        raw.trim().to_uppercase()
    }

    pub fn submit_choice(&mut self, player_id: &str, raw: &str) -> Result<String, SessionError> {
        if self.phase != GamePhase::PlayersInput {
            return Err(SessionError::NotAcceptingChoices);
        }
        let choice = Self::normalize_choice(raw);
        if choice.is_empty() {
            return Err(SessionError::EmptyChoice);
        }

        let player = self.player_mut(player_id)?;
        player.current_choice = choice.clone();
        player.is_ready = true;
        Ok(choice)
    }

    /// Precomputed luck block outcome for a player in the active round
    pub fn luck_outcome(&self, player_id: &str) -> Result<&PlayerEffect, SessionError> {
        let round = self.round.as_ref().ok_or(SessionError::NoActiveRound)?;
        if !round.is_luck_block() {
            return Err(SessionError::NotLuckRound);
        }
        round
            .luck_outcome_for(player_id)
            .ok_or_else(|| SessionError::NoLuckOutcome(player_id.to_string()))
    }

    /// Record a broken luck block. The effect is taken as reported.
    pub fn apply_luck_break(
        &mut self,
        player_id: &str,
        effect: PlayerEffect,
    ) -> Result<(), SessionError> {
        if self.phase != GamePhase::PlayersInput {
            return Err(SessionError::NotAcceptingChoices);
        }
        let round = self.round.as_ref().ok_or(SessionError::NoActiveRound)?;
        if !round.is_luck_block() {
            return Err(SessionError::NotLuckRound);
        }

        match round.luck_outcome_for(player_id) {
            Some(expected) if expected.same_outcome(&effect) => {}
            Some(expected) => tracing::warn!(
                "Player {} reported luck effect '{}' but was assigned '{}'; accepting report",
                player_id,
                effect.name,
                expected.name
            ),
            None => tracing::warn!(
                "Player {} reported luck effect '{}' without an assigned outcome; accepting report",
                player_id,
                effect.name
            ),
        }

        if self.luck_breaks.contains(player_id) {
            return Err(SessionError::AlreadyRevealed(player_id.to_string()));
        }
        let player = self.player_mut(player_id)?;
        player.is_revealed = true;
        player.is_ready = true;
        player.effects.push(effect);
        self.luck_breaks.insert(player_id.to_string());
        Ok(())
    }

    pub fn reveal_player(&mut self, player_id: &str) -> Result<(), SessionError> {
        self.player_mut(player_id)?.is_revealed = true;
        Ok(())
    }

    /// Apply a signed life delta, clamped at zero. Returns the new count.
    pub fn adjust_life(&mut self, player_id: &str, delta: i32) -> Result<u32, SessionError> {
        let player = self.player_mut(player_id)?;
        let lives = (i64::from(player.lives) + i64::from(delta)).clamp(0, i64::from(u32::MAX));
        player.lives = lives as u32;
        Ok(player.lives)
    }

    pub fn remove_effect(
        &mut self,
        player_id: &str,
        effect_id: &str,
    ) -> Result<PlayerEffect, SessionError> {
        let player = self.player_mut(player_id)?;
        let index = player
            .effects
            .iter()
            .position(|e| e.id == effect_id)
            .ok_or_else(|| SessionError::EffectNotFound(effect_id.to_string()))?;
        Ok(player.effects.remove(index))
    }

    pub fn all_players_ready(&self) -> bool {
        all_players_ready(&self.players)
    }

    pub fn snapshot(&self) -> SyncPayload {
        SyncPayload {
            game_state: self.phase,
            players: self.players.clone(),
            ai_data: self.round.clone(),
            config: self.config.clone(),
            used_items: self.used_prompts.clone(),
        }
    }
}
