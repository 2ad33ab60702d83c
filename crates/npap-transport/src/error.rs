use std::net::SocketAddr;

/// Errors that can occur in NPAP transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The printer address could not be parsed or resolved to any endpoint.
    #[error("invalid printer address '{address}': {reason}")]
    InvalidAddress { address: String, reason: String },

    /// Name resolution failed.
    #[error("failed to resolve {address}: {source}")]
    Resolve {
        address: String,
        source: std::io::Error,
    },

    /// Failed to bind the local socket.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },

    /// An I/O error occurred while sending or receiving.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
