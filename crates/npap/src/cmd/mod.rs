use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use npap_session::{NpapClient, SessionConfig};

use crate::exit::{session_error, transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod decode;
pub mod subscribe;
pub mod unsubscribe;
pub mod version;
pub mod watch;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Subscribe and print job alerts until interrupted.
    Watch(WatchArgs),
    /// Subscribe a printer to job alerts and exit.
    Subscribe(PrinterArgs),
    /// Disable job alerts on a printer.
    Unsubscribe(PrinterArgs),
    /// Decode a captured alert offline.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Watch(args) => watch::run(args, format),
        Command::Subscribe(args) => subscribe::run(args, format),
        Command::Unsubscribe(args) => unsubscribe::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct PrinterArgs {
    /// Printer IP address or host name.
    pub printer: String,
    /// Override the printer port (default 9300).
    #[arg(long)]
    pub port: Option<u16>,
    /// Time to wait for each response (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
}

#[derive(Args, Debug)]
pub struct WatchArgs {
    #[command(flatten)]
    pub target: PrinterArgs,
    /// Exit after printing N alerts.
    #[arg(long)]
    pub count: Option<usize>,
    /// How often the receive loop checks for shutdown (e.g. 250ms).
    #[arg(long, default_value = "250ms")]
    pub poll_interval: String,
    /// Stop on the first receive error instead of retrying.
    #[arg(long)]
    pub stop_on_error: bool,
    /// Leave the printer subscribed on exit.
    #[arg(long)]
    pub keep_subscription: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// File holding the captured alert.
    pub file: PathBuf,
    /// The file holds hex text rather than raw bytes.
    #[arg(long)]
    pub hex: bool,
    /// The capture includes the 12-byte alert header.
    #[arg(long)]
    pub datagram: bool,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

/// Open a session for a one-shot or watch command.
pub(crate) fn open_client(target: &PrinterArgs, config: SessionConfig) -> CliResult<NpapClient> {
    let printer = npap_transport::resolve(&target.printer)
        .map_err(|err| transport_error("invalid printer", err))?;
    let printer = match target.port {
        Some(port) => SocketAddr::new(printer.ip(), port),
        None => printer,
    };

    NpapClient::connect_addr(printer, config).map_err(|err| session_error("connect failed", err))
}

pub(crate) fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}
