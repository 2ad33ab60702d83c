//! Request payloads carried inside Command frames.
//!
//! ```text
//! ┌──────┬─────────────┬────────┬─────────────┬──────────┐
//! │ 0xA5 │ Length (2B) │ Opcode │ Object (3B) │ Data     │
//! │      │ BE          │        │             │          │
//! └──────┴─────────────┴────────┴─────────────┴──────────┘
//! ```
//!
//! `Length` counts the opcode, object and data bytes. Responses echo the
//! object id at the same offsets, and alerts carry theirs there too.

use std::fmt;

use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};

/// First byte of every request payload.
pub const REQUEST_MAGIC: u8 = 0xA5;

/// Turn the addressed object (feature, notification family) on.
pub const OP_ENABLE: u8 = 0x50;

/// Turn the addressed object off.
pub const OP_DISABLE: u8 = 0x40;

/// Offset of the object id within a request, response or alert payload.
pub const OBJECT_OFFSET: usize = 4;

/// Largest value the length field can carry.
const MAX_REQUEST_LEN: usize = u16::MAX as usize;

/// Three-byte identifier of the object a request, response or alert refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(pub [u8; 3]);

impl ObjectId {
    pub const fn new(b0: u8, b1: u8, b2: u8) -> Self {
        Self([b0, b1, b2])
    }

    /// The object id embedded at payload bytes 4..7, if the payload is long enough.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        let bytes = payload.get(OBJECT_OFFSET..OBJECT_OFFSET + 3)?;
        Some(Self([bytes[0], bytes[1], bytes[2]]))
    }

    pub fn bytes(self) -> [u8; 3] {
        self.0
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}.{:02x}.{:02x}", self.0[0], self.0[1], self.0[2])
    }
}

/// A request payload: opcode, target object, and opaque data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    opcode: u8,
    object: ObjectId,
    data: Bytes,
}

impl Request {
    pub fn new(opcode: u8, object: ObjectId, data: impl Into<Bytes>) -> Self {
        Self {
            opcode,
            object,
            data: data.into(),
        }
    }

    pub fn opcode(&self) -> u8 {
        self.opcode
    }

    pub fn object(&self) -> ObjectId {
        self.object
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Append the encoded request to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        let len = 1 + 3 + self.data.len();
        if len > MAX_REQUEST_LEN {
            return Err(FrameError::RequestTooLarge {
                size: len,
                max: MAX_REQUEST_LEN,
            });
        }
        dst.reserve(3 + len);
        dst.put_u8(REQUEST_MAGIC);
        dst.put_u16(len as u16);
        dst.put_u8(self.opcode);
        dst.put_slice(&self.object.0);
        dst.put_slice(&self.data);
        Ok(())
    }

    /// Encode into a fresh buffer.
    pub fn to_bytes(&self) -> Result<Bytes> {
        let mut buf = BytesMut::new();
        self.encode(&mut buf)?;
        Ok(buf.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_request_bytes() {
        let request = Request::new(OP_ENABLE, ObjectId::new(0xE0, 0x73, 0x04), Bytes::new());
        assert_eq!(
            request.to_bytes().unwrap().as_ref(),
            &[0xA5, 0x00, 0x04, 0x50, 0xE0, 0x73, 0x04]
        );
    }

    #[test]
    fn length_counts_opcode_object_and_data() {
        let data = vec![0x08, 0x00, 0x11, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00];
        let request = Request::new(OP_ENABLE, ObjectId::new(0xE0, 0x73, 0x01), data);
        let bytes = request.to_bytes().unwrap();

        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[..3], &[0xA5, 0x00, 0x0D]);
        assert_eq!(bytes[9], 0x11);
    }

    #[test]
    fn object_id_round_trips_through_payload() {
        let request = Request::new(OP_DISABLE, ObjectId::new(0xE0, 0x73, 0x01), vec![0x08]);
        let bytes = request.to_bytes().unwrap();
        assert_eq!(
            ObjectId::from_payload(&bytes),
            Some(ObjectId::new(0xE0, 0x73, 0x01))
        );
        assert_eq!(request.object().to_string(), "e0.73.01");
    }

    #[test]
    fn short_payload_has_no_object() {
        assert_eq!(ObjectId::from_payload(&[0xA5, 0x00, 0x04, 0x50, 0xE0]), None);
    }

    #[test]
    fn oversized_request_is_rejected() {
        let request = Request::new(OP_ENABLE, ObjectId::new(0, 0, 0), vec![0u8; u16::MAX as usize]);
        assert!(matches!(
            request.to_bytes(),
            Err(FrameError::RequestTooLarge { .. })
        ));
    }
}
