use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque ID types for type safety
pub type PlayerId = String;
pub type EffectId = String;
pub type RoomCode = String;

/// Reserved id of the host's own roster entry
pub const HOST_PLAYER_ID: &str = "host";
pub const HOST_DISPLAY_NAME: &str = "ORACLE";
/// The host cannot lose; this is the "unlimited" sentinel shown in its slot
pub const HOST_LIVES: u32 = 100;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GamePhase {
    RoleSelect,
    SetupRoom,
    Lobby,
    AiThinking,
    PlayersInput,
    RevealSequence,
    RoundResult,
    GameOver,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub player_count: u32,
    pub initial_lives: u32,
    pub room_id: RoomCode,
    pub luck_block_appeared: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            player_count: 3,
            initial_lives: 5,
            room_id: String::new(),
            luck_block_appeared: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EffectKind {
    #[serde(alias = "Benefício")]
    Beneficial,
    #[serde(alias = "Maléfício")]
    Detrimental,
    #[serde(alias = "Caos")]
    Chaotic,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PlayerEffect {
    pub id: EffectId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EffectKind,
    pub description: String,
}

impl PlayerEffect {
    /// Same effect under a freshly minted id
    pub fn reissue(&self) -> Self {
        Self {
            id: ulid::Ulid::new().to_string(),
            ..self.clone()
        }
    }

    /// Compare everything except the id
    pub fn same_outcome(&self, other: &PlayerEffect) -> bool {
        self.name == other.name && self.kind == other.kind && self.description == other.description
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub lives: u32,
    pub current_choice: String,
    pub is_revealed: bool,
    pub is_ready: bool,
    pub is_host: bool,
    #[serde(default)]
    pub effects: Vec<PlayerEffect>,
}

impl Player {
    pub fn host() -> Self {
        Self {
            id: HOST_PLAYER_ID.to_string(),
            name: HOST_DISPLAY_NAME.to_string(),
            lives: HOST_LIVES,
            current_choice: String::new(),
            is_revealed: false,
            is_ready: true,
            is_host: true,
            effects: Vec::new(),
        }
    }

    pub fn guest(id: PlayerId, name: String, lives: u32) -> Self {
        Self {
            id,
            name,
            lives,
            current_choice: String::new(),
            is_revealed: false,
            is_ready: true,
            is_host: false,
            effects: Vec::new(),
        }
    }

    pub fn is_alive(&self) -> bool {
        self.lives > 0
    }
}

/// Every non-host player has locked in for this round.
pub fn all_players_ready(players: &[Player]) -> bool {
    players.iter().filter(|p| !p.is_host).all(|p| p.is_ready)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameMode {
    LuckyTheme,
    MysteryMob,
    BiomeOfFate,
    DeathDrop,
    PropheticFurnace,
    OraclesLie,
    FatalCraft,
    CursedVein,
    CursedTool,
    OraclesTouch,
    LuckBlock,
}

impl GameMode {
    /// Modes the oracle picks from on a regular round
    pub const STANDARD: [GameMode; 10] = [
        GameMode::LuckyTheme,
        GameMode::MysteryMob,
        GameMode::BiomeOfFate,
        GameMode::DeathDrop,
        GameMode::PropheticFurnace,
        GameMode::OraclesLie,
        GameMode::FatalCraft,
        GameMode::CursedVein,
        GameMode::CursedTool,
        GameMode::OraclesTouch,
    ];

    /// Players type an answer instead of picking one of four items
    pub fn is_free_text(self) -> bool {
        self == GameMode::LuckyTheme
    }

    pub fn label(self) -> &'static str {
        match self {
            GameMode::LuckyTheme => "Lucky Theme",
            GameMode::MysteryMob => "Mystery Mob",
            GameMode::BiomeOfFate => "Biome of Fate",
            GameMode::DeathDrop => "Death Drop",
            GameMode::PropheticFurnace => "Prophetic Furnace",
            GameMode::OraclesLie => "Oracle's Lie",
            GameMode::FatalCraft => "Fatal Craft",
            GameMode::CursedVein => "Cursed Vein",
            GameMode::CursedTool => "Cursed Tool",
            GameMode::OraclesTouch => "Oracle's Touch",
            GameMode::LuckBlock => "Luck Block",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[serde(alias = "fácil", alias = "facil")]
    Easy,
    #[default]
    #[serde(alias = "médio", alias = "medio")]
    Medium,
    #[serde(alias = "difícil", alias = "dificil")]
    Hard,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RoundData {
    pub mode: GameMode,
    pub items: Vec<String>,
    #[serde(default)]
    pub item_ids: Vec<String>,
    pub theme: String,
    pub description: String,
    pub difficulty: Difficulty,
    /// Only present for luck block rounds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub luck_outcomes: Option<HashMap<PlayerId, PlayerEffect>>,
}

impl RoundData {
    pub fn is_luck_block(&self) -> bool {
        self.mode == GameMode::LuckBlock
    }

    /// Values this round contributes to the "already used" list
    pub fn prompt_values(&self) -> Vec<String> {
        if self.items.is_empty() {
            if self.is_luck_block() {
                Vec::new()
            } else {
                vec![self.theme.clone()]
            }
        } else {
            self.items.clone()
        }
    }

    pub fn luck_outcome_for(&self, player_id: &str) -> Option<&PlayerEffect> {
        self.luck_outcomes.as_ref()?.get(player_id)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Guest,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_players_ready_ignores_host() {
        let mut host = Player::host();
        host.is_ready = false;
        let mut alice = Player::guest("a".to_string(), "Alice".to_string(), 3);
        alice.is_ready = true;

        assert!(all_players_ready(&[host.clone(), alice.clone()]));

        alice.is_ready = false;
        assert!(!all_players_ready(&[host, alice]));
    }

    #[test]
    fn test_effect_wire_format() {
        let json = r#"{"id":"e1","name":"Extra Heart","type":"beneficial","description":"Gain a life"}"#;
        let effect: PlayerEffect = serde_json::from_str(json).unwrap();
        assert_eq!(effect.kind, EffectKind::Beneficial);

        let legacy = r#"{"id":"e2","name":"Domino","type":"Caos","description":"x"}"#;
        let effect: PlayerEffect = serde_json::from_str(legacy).unwrap();
        assert_eq!(effect.kind, EffectKind::Chaotic);
    }

    #[test]
    fn test_difficulty_aliases() {
        let d: Difficulty = serde_json::from_str("\"médio\"").unwrap();
        assert_eq!(d, Difficulty::Medium);
        let d: Difficulty = serde_json::from_str("\"hard\"").unwrap();
        assert_eq!(d, Difficulty::Hard);
    }

    #[test]
    fn test_prompt_values() {
        let mut round = RoundData {
            mode: GameMode::LuckyTheme,
            items: vec![],
            item_ids: vec![],
            theme: "Something that burns".to_string(),
            description: "Name it".to_string(),
            difficulty: Difficulty::Medium,
            luck_outcomes: None,
        };
        assert_eq!(round.prompt_values(), vec!["Something that burns".to_string()]);

        round.mode = GameMode::LuckBlock;
        assert!(round.prompt_values().is_empty());

        round.mode = GameMode::DeathDrop;
        round.items = vec!["Bow".to_string(), "Torch".to_string()];
        assert_eq!(round.prompt_values().len(), 2);
    }

    #[test]
    fn test_reissue_keeps_outcome() {
        let effect = PlayerEffect {
            id: "old".to_string(),
            name: "Ghost Shield".to_string(),
            kind: EffectKind::Beneficial,
            description: "First miss ignored".to_string(),
        };
        let fresh = effect.reissue();
        assert_ne!(fresh.id, effect.id);
        assert!(fresh.same_outcome(&effect));
    }
}
