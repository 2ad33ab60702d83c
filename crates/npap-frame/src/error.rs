use crate::kind::FrameKind;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The datagram is shorter than the header of its frame kind.
    #[error("truncated {kind} frame ({len} bytes, need at least {min})")]
    Truncated {
        kind: FrameKind,
        len: usize,
        min: usize,
    },

    /// The datagram carries a type tag this client does not handle.
    #[error("unknown frame tag {0:02x?}")]
    UnknownTag([u8; 2]),

    /// The datagram is too short to carry a type tag at all.
    #[error("datagram too short for a type tag ({0} bytes)")]
    MissingTag(usize),

    /// A request body does not fit the 16-bit length field.
    #[error("request too large ({size} bytes, max {max})")]
    RequestTooLarge { size: usize, max: usize },
}

pub type Result<T> = std::result::Result<T, FrameError>;
