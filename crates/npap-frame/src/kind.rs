//! Frame kinds and their 2-byte type tags.

use std::fmt;

/// Client to printer request.
pub const COMMAND_TAG: [u8; 2] = [0x01, 0x00];

/// Printer reply to a command.
pub const RESPONSE_TAG: [u8; 2] = [0x01, 0x01];

/// Unsolicited printer notification.
pub const ALERT_TAG: [u8; 2] = [0x01, 0x02];

/// Acknowledgment of a response or alert.
pub const ACK_TAG: [u8; 2] = [0x01, 0x03];

/// The four frame kinds of the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Command,
    Response,
    Alert,
    Ack,
}

impl FrameKind {
    /// The type tag written at the start of the frame.
    pub fn tag(self) -> [u8; 2] {
        match self {
            FrameKind::Command => COMMAND_TAG,
            FrameKind::Response => RESPONSE_TAG,
            FrameKind::Alert => ALERT_TAG,
            FrameKind::Ack => ACK_TAG,
        }
    }

    /// Classify a type tag. Unknown tags yield `None`.
    pub fn from_tag(tag: [u8; 2]) -> Option<Self> {
        match tag {
            COMMAND_TAG => Some(FrameKind::Command),
            RESPONSE_TAG => Some(FrameKind::Response),
            ALERT_TAG => Some(FrameKind::Alert),
            ACK_TAG => Some(FrameKind::Ack),
            _ => None,
        }
    }

    /// Human-readable name.
    pub fn name(self) -> &'static str {
        match self {
            FrameKind::Command => "command",
            FrameKind::Response => "response",
            FrameKind::Alert => "alert",
            FrameKind::Ack => "ack",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
