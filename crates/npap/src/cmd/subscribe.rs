use npap_session::SessionConfig;

use crate::cmd::{open_client, parse_duration, PrinterArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_subscribe, OutputFormat};

pub fn run(args: PrinterArgs, format: OutputFormat) -> CliResult<i32> {
    let config = SessionConfig {
        response_timeout: parse_duration(&args.timeout)?,
        // The subscription must outlive this process.
        unsubscribe_on_drop: false,
        ..SessionConfig::default()
    };
    let client = open_client(&args, config)?;

    let report = client
        .try_subscribe()
        .map_err(|err| session_error("subscribe failed", err))?;

    print_subscribe(&report, client.printer(), format);
    Ok(SUCCESS)
}
