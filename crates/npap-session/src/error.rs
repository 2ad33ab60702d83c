use std::time::Duration;

use npap_frame::{FrameKind, ObjectId};

/// Errors that can occur in session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Transport-level error.
    #[error("transport error: {0}")]
    Transport(#[from] npap_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] npap_frame::FrameError),

    /// Nothing arrived before the response timeout.
    #[error("no response to packet {packet_id} within {timeout:?}")]
    NoResponse { packet_id: u32, timeout: Duration },

    /// A frame other than a Response arrived while waiting for one.
    #[error("expected a response frame, got {0}")]
    UnexpectedKind(FrameKind),

    /// A Response arrived for a different command.
    #[error("response carries packet id {got} (expected {expected})")]
    UnexpectedPacketId { expected: u32, got: u32 },

    /// The subscribe response is too short to carry the echoed object id.
    #[error("subscribe response too short ({len} bytes, need at least {min})")]
    ShortResponse { len: usize, min: usize },

    /// The subscribe response echoes a different object id.
    #[error("subscribe response echoes object {got} (expected {expected})")]
    DescriptorMismatch { expected: ObjectId, got: ObjectId },
}

impl SessionError {
    /// True for the outcomes an exchange reports as "no response":
    /// timeouts and replies that do not answer the command just sent.
    pub fn is_no_response(&self) -> bool {
        matches!(
            self,
            SessionError::NoResponse { .. }
                | SessionError::UnexpectedKind(_)
                | SessionError::UnexpectedPacketId { .. }
                | SessionError::Frame(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
