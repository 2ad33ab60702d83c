//! UDP datagram transport for the NPAP printer alerting protocol.
//!
//! This is the lowest layer of npap. It owns the socket, resolves the
//! printer endpoint (fixed port 9300), and turns receive timeouts into
//! `Ok(None)` so the layers above can treat "nothing arrived" as an
//! ordinary outcome rather than an error.

pub mod error;
pub mod udp;

pub use error::{Result, TransportError};
pub use udp::{resolve, PrinterSocket, Received, MAX_DATAGRAM_SIZE, PRINTER_PORT};
