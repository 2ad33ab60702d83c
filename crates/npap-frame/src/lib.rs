//! Wire codec for the NPAP printer alerting protocol.
//!
//! Every datagram starts with a 2-byte type tag followed by a 2-byte
//! acknowledgment number:
//! - Command frames carry a 4-byte packet id
//! - Response and Alert frames carry a 2-byte sequence number
//! - Ack frames echo an acknowledgment and a sequence number back
//!
//! Request payloads ([`Request`]) and the recursive parameter tree carried by
//! alerts ([`decode_parameters`]) are encoded and decoded here as well.

pub mod codec;
pub mod cursor;
pub mod error;
pub mod kind;
pub mod request;
pub mod tlv;

pub use codec::{
    decode_frame, encode_ack, encode_alert, encode_command, encode_response, Frame,
    ACK_HEADER_SIZE, COMMAND_HEADER_SIZE, INITIAL_ACK_NUMBER, RESPONSE_HEADER_SIZE,
};
pub use cursor::ByteCursor;
pub use error::{FrameError, Result};
pub use kind::FrameKind;
pub use request::{ObjectId, Request, OP_DISABLE, OP_ENABLE, REQUEST_MAGIC};
pub use tlv::{decode_parameters, ParameterMap, ParameterType, MAX_DEPTH, UNKNOWN_DATA_TYPE};
