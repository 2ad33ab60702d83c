use npap_session::SessionConfig;

use crate::cmd::{open_client, parse_duration, PrinterArgs};
use crate::exit::{session_error, CliResult, SUCCESS};
use crate::output::{print_unsubscribe, OutputFormat};

pub fn run(args: PrinterArgs, format: OutputFormat) -> CliResult<i32> {
    let config = SessionConfig {
        response_timeout: parse_duration(&args.timeout)?,
        unsubscribe_on_drop: false,
        ..SessionConfig::default()
    };
    let client = open_client(&args, config)?;

    client
        .try_unsubscribe()
        .map_err(|err| session_error("unsubscribe failed", err))?;

    print_unsubscribe(client.printer(), format);
    Ok(SUCCESS)
}
