use npap_frame::{decode_frame, decode_parameters, FrameKind, ObjectId};
use npap_session::interpret;
use npap_session::protocol::is_job_alert;

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, io_error, CliError, CliResult, DATA_INVALID, SUCCESS, USAGE};
use crate::output::{print_decode, DecodeOutput, OutputFormat};

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let raw = std::fs::read(&args.file)
        .map_err(|err| io_error(&format!("read {}", args.file.display()), err))?;
    let bytes = if args.hex {
        parse_hex(&String::from_utf8_lossy(&raw))?
    } else {
        raw
    };

    let payload = if args.datagram {
        alert_payload(&bytes)?
    } else {
        bytes
    };

    let parameters = decode_parameters(&payload);
    let out = DecodeOutput {
        object: ObjectId::from_payload(&payload).map(|object| object.to_string()),
        job_alert: is_job_alert(&payload),
        parameters: parameters.iter().collect(),
        job: interpret(&parameters),
    };

    print_decode(&out, format);
    Ok(SUCCESS)
}

fn alert_payload(datagram: &[u8]) -> CliResult<Vec<u8>> {
    let frame = decode_frame(datagram).map_err(|err| frame_error("decode failed", err))?;
    if frame.kind != FrameKind::Alert {
        return Err(CliError::new(
            DATA_INVALID,
            format!("decode failed: expected an alert datagram, got {}", frame.kind),
        ));
    }
    Ok(frame.payload.to_vec())
}

/// Parse hex text, ignoring whitespace and an optional `0x` prefix.
fn parse_hex(text: &str) -> CliResult<Vec<u8>> {
    let digits: String = text
        .trim()
        .trim_start_matches("0x")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect();

    hex::decode(&digits).map_err(|err| CliError::new(USAGE, format!("invalid hex input: {err}")))
}
