use npap_session::{AlertJob, CancelToken, ReceiveErrorPolicy, SessionConfig};
use tracing::{info, warn};

use crate::cmd::{open_client, parse_duration, WatchArgs};
use crate::exit::{session_error, CliError, CliResult, INTERNAL, SUCCESS};
use crate::output::{print_job, OutputFormat};

pub fn run(args: WatchArgs, format: OutputFormat) -> CliResult<i32> {
    let config = SessionConfig {
        response_timeout: parse_duration(&args.target.timeout)?,
        poll_interval: parse_duration(&args.poll_interval)?,
        receive_errors: if args.stop_on_error {
            ReceiveErrorPolicy::Stop
        } else {
            ReceiveErrorPolicy::Skip
        },
        unsubscribe_on_drop: !args.keep_subscription,
        ..SessionConfig::default()
    };
    let client = open_client(&args.target, config)?;
    let printer = client.printer();

    client
        .try_subscribe()
        .map_err(|err| session_error("subscribe failed", err))?;

    let cancel = CancelToken::new();
    install_ctrlc_handler(cancel.clone())?;

    let limit = args.count;
    let stop = cancel.clone();
    let mut printed = 0usize;
    let mut sink = |job: AlertJob| {
        print_job(&job, printer, format);
        printed = printed.saturating_add(1);
        if limit.is_some_and(|count| printed >= count) {
            stop.cancel();
        }
    };

    let summary = client
        .run_receive_loop(&mut sink, &cancel)
        .map_err(|err| session_error("receive failed", err))?;
    info!(
        datagrams = summary.datagrams,
        acknowledged = summary.acknowledged,
        emitted = summary.emitted,
        filtered = summary.filtered,
        discarded = summary.discarded,
        errors = summary.errors,
        "watch finished"
    );

    if args.keep_subscription {
        info!(%printer, "leaving printer subscribed");
    } else if !client.close() {
        warn!(%printer, "printer did not confirm unsubscribe");
    }
    Ok(SUCCESS)
}

fn install_ctrlc_handler(cancel: CancelToken) -> CliResult<()> {
    ctrlc::set_handler(move || cancel.cancel())
        .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
