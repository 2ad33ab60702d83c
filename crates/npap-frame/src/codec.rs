use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::kind::FrameKind;

/// Command header: tag (2) + ack (2) + packet id (4) = 8 bytes.
pub const COMMAND_HEADER_SIZE: usize = 8;

/// Response/Alert header: tag (2) + ack (2) + sequence (2) + 6 more = 12 bytes.
pub const RESPONSE_HEADER_SIZE: usize = 12;

/// Ack frame: tag (2) + ack (2) + sequence (2) = 6 bytes.
pub const ACK_HEADER_SIZE: usize = 6;

/// Acknowledgment number a fresh session starts with.
pub const INITIAL_ACK_NUMBER: u16 = 0x0031;

/// A decoded datagram.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Which of the four frame kinds this is.
    pub kind: FrameKind,
    /// Acknowledgment number carried after the type tag.
    pub ack_number: u16,
    /// Sequence number (Response, Alert and Ack frames).
    pub sequence: Option<u16>,
    /// Packet id (Command and Response frames).
    pub packet_id: Option<u32>,
    /// Bytes after the header.
    pub payload: Bytes,
}

impl Frame {
    /// The total wire size of this frame (header + payload).
    pub fn wire_size(&self) -> usize {
        header_size(self.kind) + self.payload.len()
    }
}

/// Header length of a frame kind.
pub fn header_size(kind: FrameKind) -> usize {
    match kind {
        FrameKind::Command => COMMAND_HEADER_SIZE,
        FrameKind::Response | FrameKind::Alert => RESPONSE_HEADER_SIZE,
        FrameKind::Ack => ACK_HEADER_SIZE,
    }
}

/// Encode a Command frame.
///
/// Wire format:
/// ```text
/// ┌───────────┬──────────┬───────────────┬──────────────┐
/// │ Tag (2B)  │ Ack (2B) │ Packet id     │ Payload      │
/// │ 0x01 0x00 │ BE       │ (4B BE)       │              │
/// └───────────┴──────────┴───────────────┴──────────────┘
/// ```
pub fn encode_command(ack_number: u16, packet_id: u32, payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(COMMAND_HEADER_SIZE + payload.len());
    dst.put_slice(&FrameKind::Command.tag());
    dst.put_u16(ack_number);
    dst.put_u32(packet_id);
    dst.put_slice(payload);
}

/// Encode an Ack frame echoing `ack_number` and `sequence`.
pub fn encode_ack(ack_number: u16, sequence: u16, dst: &mut BytesMut) {
    dst.reserve(ACK_HEADER_SIZE);
    dst.put_slice(&FrameKind::Ack.tag());
    dst.put_u16(ack_number);
    dst.put_u16(sequence);
}

/// Encode a Response frame, as a printer would send it.
///
/// ```text
/// ┌───────────┬──────────┬──────────┬──────────┬───────────┬─────────┐
/// │ Tag (2B)  │ Ack (2B) │ Seq (2B) │ 0x0000   │ Packet id │ Payload │
/// │ 0x01 0x01 │          │          │          │ (4B BE)   │         │
/// └───────────┴──────────┴──────────┴──────────┴───────────┴─────────┘
/// ```
pub fn encode_response(
    ack_number: u16,
    sequence: u16,
    packet_id: u32,
    payload: &[u8],
    dst: &mut BytesMut,
) {
    dst.reserve(RESPONSE_HEADER_SIZE + payload.len());
    dst.put_slice(&FrameKind::Response.tag());
    dst.put_u16(ack_number);
    dst.put_u16(sequence);
    dst.put_u16(0);
    dst.put_u32(packet_id);
    dst.put_slice(payload);
}

/// Encode an Alert frame, as a printer would send it.
pub fn encode_alert(ack_number: u16, sequence: u16, payload: &[u8], dst: &mut BytesMut) {
    dst.reserve(RESPONSE_HEADER_SIZE + payload.len());
    dst.put_slice(&FrameKind::Alert.tag());
    dst.put_u16(ack_number);
    dst.put_u16(sequence);
    dst.put_bytes(0, RESPONSE_HEADER_SIZE - 6);
    dst.put_slice(payload);
}

/// Decode one datagram.
///
/// UDP preserves datagram boundaries, so a frame is always the whole
/// datagram; a short datagram is an error rather than "need more data".
pub fn decode_frame(datagram: &[u8]) -> Result<Frame> {
    if datagram.len() < 2 {
        return Err(FrameError::MissingTag(datagram.len()));
    }

    let tag = [datagram[0], datagram[1]];
    let kind = FrameKind::from_tag(tag).ok_or(FrameError::UnknownTag(tag))?;

    let min = header_size(kind);
    if datagram.len() < min {
        return Err(FrameError::Truncated {
            kind,
            len: datagram.len(),
            min,
        });
    }

    let ack_number = be_u16(datagram, 2);
    let (sequence, packet_id) = match kind {
        FrameKind::Command => (None, Some(be_u32(datagram, 4))),
        FrameKind::Response => (Some(be_u16(datagram, 4)), Some(be_u32(datagram, 8))),
        FrameKind::Alert | FrameKind::Ack => (Some(be_u16(datagram, 4)), None),
    };

    Ok(Frame {
        kind,
        ack_number,
        sequence,
        packet_id,
        payload: Bytes::copy_from_slice(&datagram[min..]),
    })
}

fn be_u16(src: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([src[at], src[at + 1]])
}

fn be_u32(src: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([src[at], src[at + 1], src[at + 2], src[at + 3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_layout_and_decode() {
        let payload = [0xA5, 0x00, 0x04, 0x50, 0xE0, 0x73, 0x04];
        let mut buf = BytesMut::new();
        encode_command(INITIAL_ACK_NUMBER, 1, &payload, &mut buf);

        assert_eq!(
            &buf[..COMMAND_HEADER_SIZE],
            &[0x01, 0x00, 0x00, 0x31, 0x00, 0x00, 0x00, 0x01]
        );

        let frame = decode_frame(&buf).unwrap();
        assert_eq!(frame.kind, FrameKind::Command);
        assert_eq!(frame.ack_number, INITIAL_ACK_NUMBER);
        assert_eq!(frame.packet_id, Some(1));
        assert_eq!(frame.sequence, None);
        assert_eq!(frame.payload.as_ref(), &payload);
        assert_eq!(frame.wire_size(), buf.len());
    }

    #[test]
    fn response_fields_are_extracted() {
        let mut buf = BytesMut::new();
        encode_response(0x1234, 0x0007, 42, b"\xA5\x00\x01", &mut buf);

        let frame = decode_frame(&buf).unwrap();
        assert_eq!(frame.kind, FrameKind::Response);
        assert_eq!(frame.ack_number, 0x1234);
        assert_eq!(frame.sequence, Some(7));
        assert_eq!(frame.packet_id, Some(42));
        assert_eq!(frame.payload.as_ref(), b"\xA5\x00\x01");
    }

    #[test]
    fn alert_payload_starts_after_twelve_bytes() {
        let mut buf = BytesMut::new();
        encode_alert(0x0031, 0x0102, b"body", &mut buf);
        assert_eq!(buf.len(), RESPONSE_HEADER_SIZE + 4);

        let frame = decode_frame(&buf).unwrap();
        assert_eq!(frame.kind, FrameKind::Alert);
        assert_eq!(frame.sequence, Some(0x0102));
        assert_eq!(frame.packet_id, None);
        assert_eq!(frame.payload.as_ref(), b"body");
    }

    #[test]
    fn ack_is_six_bytes() {
        let mut buf = BytesMut::new();
        encode_ack(0xBEEF, 0x0009, &mut buf);
        assert_eq!(buf.as_ref(), &[0x01, 0x03, 0xBE, 0xEF, 0x00, 0x09]);

        let frame = decode_frame(&buf).unwrap();
        assert_eq!(frame.kind, FrameKind::Ack);
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn truncated_response_is_rejected() {
        let datagram = [0x01, 0x01, 0x00, 0x31, 0x00, 0x01, 0x00];
        let err = decode_frame(&datagram).unwrap_err();
        assert!(matches!(
            err,
            FrameError::Truncated {
                kind: FrameKind::Response,
                len: 7,
                min: RESPONSE_HEADER_SIZE
            }
        ));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        let err = decode_frame(&[0x02, 0x00, 0x00, 0x00]).unwrap_err();
        assert!(matches!(err, FrameError::UnknownTag([0x02, 0x00])));
    }

    #[test]
    fn empty_datagram_has_no_tag() {
        assert!(matches!(decode_frame(&[]), Err(FrameError::MissingTag(0))));
    }
}
