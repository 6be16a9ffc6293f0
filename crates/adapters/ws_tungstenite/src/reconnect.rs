//! Reconnect supervisor shared by both hub channels.
//!
//! A session that reaches the hub resets the backoff; a session that never
//! connected doubles it, up to the configured ceiling.

use std::future::Future;
use std::time::Duration;

use serde::Deserialize;

use crate::error::WsError;

/// How a session that did not fail came to an end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The hub closed the socket or the stream ended.
    Closed,
    /// Local shutdown was requested; do not reconnect.
    Shutdown,
}

/// Backoff bounds, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ReconnectPolicy {
    pub initial_backoff_secs: u64,
    pub max_backoff_secs: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            initial_backoff_secs: 1,
            max_backoff_secs: 60,
        }
    }
}

/// Re-runs a channel session until it ends with [`SessionEnd::Shutdown`].
#[derive(Debug, Clone)]
pub struct Reconnect {
    channel: &'static str,
    policy: ReconnectPolicy,
}

impl Reconnect {
    #[must_use]
    pub fn new(channel: &'static str, policy: ReconnectPolicy) -> Self {
        Self { channel, policy }
    }

    /// Drive `session` forever, sleeping between attempts.
    pub async fn run<F, Fut>(&self, mut session: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<SessionEnd, WsError>>,
    {
        let initial = self.policy.initial_backoff_secs.max(1);
        let ceiling = self.policy.max_backoff_secs.max(initial);
        let mut backoff_secs = initial;

        loop {
            match session().await {
                Ok(SessionEnd::Shutdown) => {
                    tracing::info!(channel = self.channel, "channel shut down");
                    return;
                }
                Ok(SessionEnd::Closed) => {
                    backoff_secs = initial;
                    tracing::info!(channel = self.channel, backoff_secs, "channel closed by hub, reconnecting");
                }
                Err(err) if err.is_connect_failure() => {
                    tracing::warn!(channel = self.channel, error = %err, backoff_secs, "failed to connect, retrying");
                }
                Err(err) => {
                    backoff_secs = initial;
                    tracing::warn!(channel = self.channel, error = %err, backoff_secs, "channel session failed, reconnecting");
                }
            }

            tokio::time::sleep(Duration::from_secs(backoff_secs)).await;
            backoff_secs = (backoff_secs * 2).min(ceiling);
        }
    }
}
