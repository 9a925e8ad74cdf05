use crate::types::*;
use serde::{Deserialize, Serialize};

/// Identity a guest announces when it connects
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JoinInfo {
    pub id: PlayerId,
    pub name: String,
}

/// Messages a guest sends to the host
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum GuestMessage {
    Join {
        player: JoinInfo,
    },
    Choice {
        player_id: PlayerId,
        choice: String,
    },
    /// Result of breaking the luck block, reported by the guest itself
    LuckBreak {
        player_id: PlayerId,
        effect: PlayerEffect,
    },
}

/// Full replicated state; guests overwrite their copy with this on every sync
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncPayload {
    pub game_state: GamePhase,
    pub players: Vec<Player>,
    pub ai_data: Option<RoundData>,
    pub config: GameConfig,
    #[serde(default)]
    pub used_items: Vec<String>,
}

/// Messages the host sends out
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HostMessage {
    Sync(SyncPayload),
    /// Sent only to the connection whose message was rejected
    Error { code: String, msg: String },
}

impl HostMessage {
    pub fn error(code: &str, msg: impl Into<String>) -> Self {
        HostMessage::Error {
            code: code.to_string(),
            msg: msg.into(),
        }
    }
}

/// Intents issued by the host's own UI over the control socket
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(
    tag = "type",
    rename_all = "SCREAMING_SNAKE_CASE",
    rename_all_fields = "camelCase"
)]
pub enum HostCommand {
    SetInitialLives {
        lives: u32,
    },
    TransitionPhase {
        phase: GamePhase,
    },
    StartRound,
    /// The host playing along: applied locally, no round-trip
    SubmitChoice {
        choice: String,
    },
    BreakLuckBlock,
    RevealPlayer {
        player_id: PlayerId,
    },
    AdjustLife {
        player_id: PlayerId,
        delta: i32,
    },
    RemoveEffect {
        player_id: PlayerId,
        effect_id: EffectId,
    },
}

/// Room summary served over HTTP
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub room_id: RoomCode,
    pub phase: GamePhase,
    pub player_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_wire_format() {
        let json = r#"{"type":"JOIN","player":{"id":"p1","name":"Steve"}}"#;
        let msg: GuestMessage = serde_json::from_str(json).unwrap();
        assert_eq!(
            msg,
            GuestMessage::Join {
                player: JoinInfo {
                    id: "p1".to_string(),
                    name: "Steve".to_string()
                }
            }
        );
    }

    #[test]
    fn test_choice_uses_camel_case_fields() {
        let msg = GuestMessage::Choice {
            player_id: "p1".to_string(),
            choice: "TORCH".to_string(),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "CHOICE");
        assert_eq!(json["playerId"], "p1");
        assert_eq!(json["choice"], "TORCH");
    }

    #[test]
    fn test_luck_break_parses() {
        let json = r#"{"type":"LUCK_BREAK","playerId":"p1","effect":{"id":"e","name":"Extra Heart","type":"beneficial","description":"+1"}}"#;
        let msg: GuestMessage = serde_json::from_str(json).unwrap();
        assert!(matches!(msg, GuestMessage::LuckBreak { .. }));
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        let json = r#"{"type":"KICK","playerId":"p1"}"#;
        assert!(serde_json::from_str::<GuestMessage>(json).is_err());

        // Missing required field fails too instead of being half-accepted
        let json = r#"{"type":"CHOICE","playerId":"p1"}"#;
        assert!(serde_json::from_str::<GuestMessage>(json).is_err());
    }

    #[test]
    fn test_sync_wire_format() {
        let msg = HostMessage::Sync(SyncPayload {
            game_state: GamePhase::Lobby,
            players: vec![Player::host()],
            ai_data: None,
            config: GameConfig::default(),
            used_items: vec![],
        });
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "SYNC");
        assert_eq!(json["gameState"], "LOBBY");
        assert_eq!(json["players"][0]["isHost"], true);
        assert_eq!(json["config"]["initialLives"], 5);
        assert!(json["aiData"].is_null());
    }

    #[test]
    fn test_host_command_parses() {
        let json = r#"{"type":"ADJUST_LIFE","playerId":"p1","delta":-2}"#;
        let cmd: HostCommand = serde_json::from_str(json).unwrap();
        assert_eq!(
            cmd,
            HostCommand::AdjustLife {
                player_id: "p1".to_string(),
                delta: -2
            }
        );

        let json = r#"{"type":"START_ROUND"}"#;
        assert_eq!(
            serde_json::from_str::<HostCommand>(json).unwrap(),
            HostCommand::StartRound
        );
    }
}
