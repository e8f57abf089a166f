use std::sync::Arc;
use std::time::Duration;

use crate::ws::registry::UserHub;

/// Interval between keepalive pings (in seconds).
const KEEPALIVE_INTERVAL_SECS: u64 = 30;

/// Spawn a background task that sends periodic Ping frames to all connected
/// bridge clients.
///
/// Chat sockets are chatty enough to keep intermediaries happy on their
/// own; the bridge channel can sit idle for hours and needs the nudge.
/// The returned `JoinHandle` is used to abort the task during shutdown.
pub fn start_keepalive(user_hub: Arc<UserHub>) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(KEEPALIVE_INTERVAL_SECS));

        loop {
            interval.tick().await;
            let count = user_hub.connection_count().await;
            tracing::debug!(count, "Bridge keepalive ping");
            user_hub.ping_all().await;
        }
    })
}
