//! Typing indicator kept alive while a backend call is in flight.

use std::sync::Arc;
use std::time::Duration;

use serenity::http::Http;
use serenity::model::id::ChannelId;

/// The indicator expires after ~10s on the platform side; refresh under that.
const REFRESH_INTERVAL: Duration = Duration::from_secs(7);

/// Broadcasts "typing" to a channel every few seconds until dropped.
pub struct TypingGuard {
    handle: tokio::task::JoinHandle<()>,
}

impl TypingGuard {
    pub fn start(http: Arc<Http>, channel_id: ChannelId) -> Self {
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval(REFRESH_INTERVAL);
            loop {
                interval.tick().await;
                let _ = channel_id.broadcast_typing(&http).await;
            }
        });
        Self { handle }
    }
}

impl Drop for TypingGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
