use super::session::Session;
use super::AppState;
use crate::types::*;
use rand::Rng;

/// Safe character set for room codes (excludes 0/O, 1/I/L to avoid confusion)
const CODE_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
pub const CODE_LENGTH: usize = 5;

/// Generate a random room code (5 characters)
pub fn generate_room_code() -> RoomCode {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

/// Room codes are typed by people; compare them case-insensitively
pub fn normalize_room_code(code: &str) -> RoomCode {
    code.trim().to_uppercase()
}

impl AppState {
    /// Create the room this host process owns and seed it with the host entry
    pub async fn create_room(&self, initial_lives: u32) -> Session {
        let session = Session::new(generate_room_code(), initial_lives);
        tracing::info!(
            "Created room {} with {} initial lives",
            session.config.room_id,
            session.config.initial_lives
        );

        *self.session.write().await = Some(session.clone());
        session
    }

    /// Current room code, if a room exists
    pub async fn room_code(&self) -> Option<RoomCode> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.config.room_id.clone())
    }

    /// Whether `code` addresses this host's room
    pub async fn is_room(&self, code: &str) -> bool {
        self.room_code()
            .await
            .is_some_and(|room| room == normalize_room_code(code))
    }
}
