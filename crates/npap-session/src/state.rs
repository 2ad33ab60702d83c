//! Packet-id and acknowledgment-number bookkeeping for one session.
//!
//! [`LinkState`] is transport-free: it builds the datagrams to send and
//! validates the datagrams received, and the client moves bytes in between.

use bytes::{Bytes, BytesMut};
use npap_frame::{
    decode_frame, encode_ack, encode_command, FrameKind, ACK_HEADER_SIZE, INITIAL_ACK_NUMBER,
};
use tracing::{debug, trace};

use crate::error::{Result, SessionError};
use crate::protocol::is_job_alert;

/// A Response that answered the last command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accepted {
    /// Sequence number the printer assigned to the response.
    pub sequence: u16,
    /// Ack datagram to send back immediately.
    pub ack: Bytes,
    /// Response payload (bytes after the 12-byte header).
    pub payload: Bytes,
}

/// An inbound Alert frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundAlert {
    /// Sequence number of the alert.
    pub sequence: u16,
    /// Ack datagram to send back immediately.
    pub ack: Bytes,
    /// Alert payload, present only when it passes the job-alert allow-list.
    pub payload: Option<Bytes>,
}

/// Mutable framing state of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkState {
    next_packet_id: u32,
    ack_number: u16,
}

impl Default for LinkState {
    fn default() -> Self {
        Self {
            next_packet_id: 1,
            ack_number: INITIAL_ACK_NUMBER,
        }
    }
}

impl LinkState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acknowledgment number learned from the last accepted Response.
    pub fn ack_number(&self) -> u16 {
        self.ack_number
    }

    /// Packet id the next command will carry.
    pub fn next_packet_id(&self) -> u32 {
        self.next_packet_id
    }

    /// Packet id of the most recently built command (0 before the first).
    pub fn last_packet_id(&self) -> u32 {
        self.next_packet_id.wrapping_sub(1)
    }

    /// Build a Command frame around `payload`, consuming one packet id.
    pub fn build_command(&mut self, payload: &[u8]) -> (u32, Bytes) {
        let packet_id = self.next_packet_id;
        self.next_packet_id = packet_id.wrapping_add(1);

        let mut buf = BytesMut::new();
        encode_command(self.ack_number, packet_id, payload, &mut buf);
        (packet_id, buf.freeze())
    }

    /// Validate `datagram` as the Response to the last command.
    ///
    /// On success the stored acknowledgment number takes the response's
    /// value and the returned ack echoes it with the response sequence.
    /// On any mismatch the state is left untouched.
    pub fn accept_response(&mut self, datagram: &[u8]) -> Result<Accepted> {
        let frame = decode_frame(datagram)?;
        if frame.kind != FrameKind::Response {
            return Err(SessionError::UnexpectedKind(frame.kind));
        }

        let expected = self.last_packet_id();
        let got = frame.packet_id.unwrap_or_default();
        if got != expected {
            return Err(SessionError::UnexpectedPacketId { expected, got });
        }

        self.ack_number = frame.ack_number;
        let sequence = frame.sequence.unwrap_or_default();

        let mut ack = BytesMut::new();
        encode_ack(self.ack_number, sequence, &mut ack);

        Ok(Accepted {
            sequence,
            ack: ack.freeze(),
            payload: frame.payload,
        })
    }

    /// Classify a datagram for the receive loop.
    ///
    /// Any datagram tagged as an Alert that carries a sequence number is
    /// acknowledged, even when its header is cut short; such an alert has no
    /// payload to report. Everything else yields `None`. The ack carries the
    /// *stored* acknowledgment number, not the one in the alert.
    pub fn accept_alert(&self, datagram: &[u8]) -> Option<InboundAlert> {
        let tag = datagram.get(..2)?;
        if tag != FrameKind::Alert.tag() {
            trace!(tag = ?tag, "ignoring non-alert datagram");
            return None;
        }
        let Some(&[hi, lo]) = datagram.get(4..ACK_HEADER_SIZE) else {
            trace!(len = datagram.len(), "alert too short for a sequence number");
            return None;
        };
        let sequence = u16::from_be_bytes([hi, lo]);

        let mut ack = BytesMut::new();
        encode_ack(self.ack_number, sequence, &mut ack);

        let payload = match decode_frame(datagram) {
            Ok(frame) => is_job_alert(&frame.payload).then_some(frame.payload),
            Err(err) => {
                debug!(%err, sequence, "truncated alert, acknowledging only");
                None
            }
        };

        Some(InboundAlert {
            sequence,
            ack: ack.freeze(),
            payload,
        })
    }
}
