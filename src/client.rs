//! Guest side of the game: dial a host by room code, mirror its state, send intents.

use crate::protocol::{GuestMessage, HostMessage, JoinInfo};
use crate::replica::GuestReplica;
use crate::state::{normalize_room_code, Session, DEFAULT_LUCK_BREAK_DELAY};
use crate::types::*;
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite, tungstenite::Message};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("No room with code {0}")]
    RoomNotFound(RoomCode),

    #[error("Could not connect to host: {0}")]
    Connect(String),

    #[error("Connection to host lost")]
    Disconnected,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No luck block outcome for this player")]
    NoLuckOutcome,
}

/// An ERROR the host sent back to this connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostError {
    pub code: String,
    pub msg: String,
}

/// Accept `ws://`, `wss://`, `http://` and `https://` base URLs
fn socket_url(base_url: &str, room_code: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let base = if let Some(rest) = base.strip_prefix("http://") {
        format!("ws://{}", rest)
    } else if let Some(rest) = base.strip_prefix("https://") {
        format!("wss://{}", rest)
    } else if base.starts_with("ws://") || base.starts_with("wss://") {
        base.to_string()
    } else {
        format!("ws://{}", base)
    };
    format!("{}/room/{}", base, room_code)
}

/// A joined guest connection.
///
/// Every SYNC from the host replaces the local replica; intents go out over
/// the socket and take effect once the host broadcasts the next snapshot.
pub struct GuestClient {
    player_id: PlayerId,
    room_code: RoomCode,
    outgoing: mpsc::Sender<GuestMessage>,
    replica: watch::Receiver<GuestReplica>,
    errors: mpsc::UnboundedReceiver<HostError>,
    luck_break_delay: Duration,
    reader: JoinHandle<()>,
    writer: JoinHandle<()>,
}

impl GuestClient {
    /// Connect to the host's room and announce ourselves with a fresh id
    pub async fn join(base_url: &str, room_code: &str, name: &str) -> Result<Self, ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::InvalidInput("name is required".to_string()));
        }
        let room_code = normalize_room_code(room_code);
        if room_code.is_empty() {
            return Err(ClientError::InvalidInput("room code is required".to_string()));
        }

        let url = socket_url(base_url, &room_code);
        tracing::info!("Connecting to {}...", url);

        let (ws_stream, _) = connect_async(url.as_str()).await.map_err(|e| match e {
            tungstenite::Error::Http(response)
                if response.status() == tungstenite::http::StatusCode::NOT_FOUND =>
            {
                ClientError::RoomNotFound(room_code.clone())
            }
            other => ClientError::Connect(other.to_string()),
        })?;
        tracing::info!("Connected to room {}", room_code);

        let (mut write, mut read) = ws_stream.split();
        let (outgoing_tx, mut outgoing_rx) = mpsc::channel::<GuestMessage>(100);
        let (replica_tx, replica_rx) = watch::channel(GuestReplica::new());
        let (error_tx, error_rx) = mpsc::unbounded_channel();

        let reader = tokio::spawn(async move {
            while let Some(msg) = read.next().await {
                match msg {
                    Ok(Message::Text(text)) => {
                        match serde_json::from_str::<HostMessage>(text.as_str()) {
                            Ok(HostMessage::Sync(payload)) => {
                                replica_tx.send_modify(|replica| replica.apply_sync(payload));
                            }
                            Ok(HostMessage::Error { code, msg }) => {
                                tracing::warn!("Host rejected a message: {} ({})", msg, code);
                                let _ = error_tx.send(HostError { code, msg });
                            }
                            Err(e) => {
                                tracing::warn!("Failed to parse host message: {} - {}", e, text.as_str());
                            }
                        }
                    }
                    Ok(Message::Close(_)) => {
                        tracing::info!("Host closed connection");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::error!("WebSocket read error: {}", e);
                        break;
                    }
                }
            }
            tracing::debug!("Reader task ended");
        });

        let writer = tokio::spawn(async move {
            while let Some(msg) = outgoing_rx.recv().await {
                let json = match serde_json::to_string(&msg) {
                    Ok(json) => json,
                    Err(e) => {
                        tracing::error!("Failed to encode message: {}", e);
                        continue;
                    }
                };
                if let Err(e) = write.send(Message::Text(json.into())).await {
                    tracing::error!("Failed to send message: {}", e);
                    break;
                }
            }
            let _ = write.close().await;
            tracing::debug!("Writer task ended");
        });

        let client = Self {
            player_id: ulid::Ulid::new().to_string(),
            room_code,
            outgoing: outgoing_tx,
            replica: replica_rx,
            errors: error_rx,
            luck_break_delay: DEFAULT_LUCK_BREAK_DELAY,
            reader,
            writer,
        };

        client
            .send(GuestMessage::Join {
                player: JoinInfo {
                    id: client.player_id.clone(),
                    name: name.to_string(),
                },
            })
            .await?;
        Ok(client)
    }

    pub fn with_luck_break_delay(mut self, delay: Duration) -> Self {
        self.luck_break_delay = delay;
        self
    }

    pub fn player_id(&self) -> &str {
        &self.player_id
    }

    pub fn room_code(&self) -> &str {
        &self.room_code
    }

    async fn send(&self, msg: GuestMessage) -> Result<(), ClientError> {
        self.outgoing
            .send(msg)
            .await
            .map_err(|_| ClientError::Disconnected)
    }

    /// Send this round's answer. The host stores it trimmed and upper-cased.
    pub async fn submit_choice(&self, text: &str) -> Result<(), ClientError> {
        let choice = Session::normalize_choice(text);
        if choice.is_empty() {
            return Err(ClientError::InvalidInput("choice must not be empty".to_string()));
        }
        self.send(GuestMessage::Choice {
            player_id: self.player_id.clone(),
            choice,
        })
        .await
    }

    /// Break the luck block: look up the outcome assigned to us in the last
    /// sync, wait the pacing delay, then report it.
    pub async fn break_luck_block(&self) -> Result<PlayerEffect, ClientError> {
        let effect = self
            .replica
            .borrow()
            .luck_outcome_for(&self.player_id)
            .map(PlayerEffect::reissue)
            .ok_or(ClientError::NoLuckOutcome)?;

        tokio::time::sleep(self.luck_break_delay).await;

        self.send(GuestMessage::LuckBreak {
            player_id: self.player_id.clone(),
            effect: effect.clone(),
        })
        .await?;
        Ok(effect)
    }

    /// Latest mirrored state
    pub fn snapshot(&self) -> GuestReplica {
        self.replica.borrow().clone()
    }

    /// Wait until a sync satisfies `predicate` (checked against the current state first)
    pub async fn wait_for(
        &self,
        predicate: impl FnMut(&GuestReplica) -> bool,
    ) -> Result<GuestReplica, ClientError> {
        let mut rx = self.replica.clone();
        let replica = rx
            .wait_for(predicate)
            .await
            .map_err(|_| ClientError::Disconnected)?;
        Ok((*replica).clone())
    }

    /// Next ERROR the host sent to this connection
    pub async fn next_error(&mut self) -> Option<HostError> {
        self.errors.recv().await
    }

    /// Close the socket. Dropping the client closes it as well once the
    /// writer task notices every sender is gone.
    pub async fn leave(self) {
        let Self {
            outgoing,
            reader,
            writer,
            ..
        } = self;
        drop(outgoing);
        let _ = writer.await;
        reader.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_url_schemes() {
        assert_eq!(
            socket_url("http://localhost:6573/", "ABCDE"),
            "ws://localhost:6573/room/ABCDE"
        );
        assert_eq!(
            socket_url("https://party.example", "ABCDE"),
            "wss://party.example/room/ABCDE"
        );
        assert_eq!(
            socket_url("ws://127.0.0.1:9000", "ABCDE"),
            "ws://127.0.0.1:9000/room/ABCDE"
        );
        assert_eq!(
            socket_url("127.0.0.1:9000", "ABCDE"),
            "ws://127.0.0.1:9000/room/ABCDE"
        );
    }

    #[tokio::test]
    async fn test_join_validates_input() {
        assert!(matches!(
            GuestClient::join("ws://127.0.0.1:1", "ABCDE", "  ").await,
            Err(ClientError::InvalidInput(_))
        ));
        assert!(matches!(
            GuestClient::join("ws://127.0.0.1:1", " ", "Alex").await,
            Err(ClientError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_connect_error() {
        // Port 1 is never listening in the test environment
        assert!(matches!(
            GuestClient::join("ws://127.0.0.1:1", "ABCDE", "Alex").await,
            Err(ClientError::Connect(_))
        ));
    }
}
