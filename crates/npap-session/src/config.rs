use std::time::Duration;

use npap_transport::MAX_DATAGRAM_SIZE;

/// What the receive loop does when the socket reports an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReceiveErrorPolicy {
    /// Log the error, back off for one poll interval, keep receiving.
    #[default]
    Skip,
    /// Return the error from the loop.
    Stop,
}

/// Session behavior knobs, fixed for the lifetime of a client.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long every command waits for its Response.
    pub response_timeout: Duration,
    /// How often the receive loop wakes up to observe cancellation.
    pub poll_interval: Duration,
    /// Receive-loop error policy.
    pub receive_errors: ReceiveErrorPolicy,
    /// Send a best-effort unsubscribe when the client is dropped without `close`.
    pub unsubscribe_on_drop: bool,
    /// Receive buffer size.
    pub max_datagram_size: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            response_timeout: Duration::from_secs(5),
            poll_interval: Duration::from_millis(250),
            receive_errors: ReceiveErrorPolicy::Skip,
            unsubscribe_on_drop: true,
            max_datagram_size: MAX_DATAGRAM_SIZE,
        }
    }
}
