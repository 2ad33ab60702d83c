//! Job-completion alerts from NPAP network printers.
//!
//! npap subscribes to a printer's job alerts over UDP, acknowledges every
//! alert it receives and turns the job-completion ones into [`AlertJob`]
//! records (job id, duration, pages, user, service, tray).
//!
//! # Crate Structure
//!
//! - [`transport`]: UDP socket towards the printer, address resolution
//! - [`frame`]: datagram codec, request payloads, parameter-tree decoder
//! - [`session`]: subscription, receive loop, alert interpretation (behind `session` feature)
//!
//! [`AlertJob`]: session::AlertJob

/// Re-export transport types.
pub mod transport {
    pub use npap_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use npap_frame::*;
}

/// Re-export session types (requires `session` feature).
#[cfg(feature = "session")]
pub mod session {
    pub use npap_session::*;
}
