use crate::protocol::HostMessage;
use crate::state::AppState;

impl AppState {
    /// Current full-state SYNC message, if a room exists
    pub async fn sync_message(&self) -> Option<HostMessage> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| HostMessage::Sync(s.snapshot()))
    }

    /// Push the full session to every connected peer.
    ///
    /// Fire-and-forget: no acknowledgement, no retry.
    pub async fn broadcast_sync(&self) {
        if let Some(msg) = self.sync_message().await {
            // Ignore send errors (no receivers connected is fine)
            let _ = self.broadcast.send(msg);
        }
    }
}
