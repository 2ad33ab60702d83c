use std::fmt;
use std::io;

use npap_frame::FrameError;
use npap_session::SessionError;
use npap_transport::TransportError;

// Process exit codes. TIMEOUT (124) matches timeout(1).
pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn io_error(context: &str, err: io::Error) -> CliError {
    let code = match err.kind() {
        io::ErrorKind::PermissionDenied => PERMISSION_DENIED,
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => TIMEOUT,
        io::ErrorKind::NotFound | io::ErrorKind::InvalidData => DATA_INVALID,
        io::ErrorKind::ConnectionRefused => FAILURE,
        _ => TRANSPORT_ERROR,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn transport_error(context: &str, err: TransportError) -> CliError {
    match err {
        TransportError::InvalidAddress { .. } => CliError::new(USAGE, format!("{context}: {err}")),
        TransportError::Bind { source, .. } | TransportError::Io(source) => {
            io_error(context, source)
        }
        other => CliError::new(TRANSPORT_ERROR, format!("{context}: {other}")),
    }
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::RequestTooLarge { .. } => CliError::new(INTERNAL, format!("{context}: {err}")),
        other => CliError::new(DATA_INVALID, format!("{context}: {other}")),
    }
}

pub fn session_error(context: &str, err: SessionError) -> CliError {
    match err {
        SessionError::Transport(err) => transport_error(context, err),
        SessionError::Frame(err) => frame_error(context, err),
        SessionError::NoResponse { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
        SessionError::ShortResponse { .. } | SessionError::DescriptorMismatch { .. } => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        other => CliError::new(FAILURE, format!("{context}: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn no_response_maps_to_timeout() {
        let err = session_error(
            "subscribe failed",
            SessionError::NoResponse {
                packet_id: 1,
                timeout: Duration::from_secs(5),
            },
        );
        assert_eq!(err.code, TIMEOUT);
        assert!(err.message.starts_with("subscribe failed: "));
    }

    #[test]
    fn bad_address_is_a_usage_error() {
        let err = transport_error(
            "connect failed",
            TransportError::InvalidAddress {
                address: String::new(),
                reason: "address is empty".to_string(),
            },
        );
        assert_eq!(err.code, USAGE);
    }

    #[test]
    fn malformed_frames_are_invalid_data() {
        let err = session_error("decode failed", SessionError::Frame(FrameError::MissingTag(1)));
        assert_eq!(err.code, DATA_INVALID);
    }
}
