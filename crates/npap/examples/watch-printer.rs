//! Subscribe to a printer and print completed jobs for a while.
//!
//! Run with:
//!   cargo run --example watch-printer -- 192.168.1.3 60

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use npap::session::{CancelToken, ChannelSink, NpapClient};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let printer = args.next().unwrap_or_else(|| "127.0.0.1".to_string());
    let seconds: u64 = args.next().map(|s| s.parse()).transpose()?.unwrap_or(30);

    let client = NpapClient::connect(&printer)?;
    let report = client.try_subscribe()?;
    println!(
        "subscribed to {} (features 0x{:02x}, {}/{} commands acknowledged)",
        client.printer(),
        report.feature_flag,
        report.commands_acknowledged,
        report.commands_sent
    );

    let cancel = CancelToken::new();
    let (tx, rx) = mpsc::channel();

    let summary = thread::scope(|s| {
        let receiver = s.spawn(|| client.run_receive_loop(&mut ChannelSink::new(tx), &cancel));

        let deadline = Instant::now() + Duration::from_secs(seconds);
        while let Some(remaining) = deadline.checked_duration_since(Instant::now()) {
            match rx.recv_timeout(remaining) {
                Ok(job) => println!(
                    "job {} finished: {} pages in {} ms (user {}, service {})",
                    job.job_id(),
                    job.pages(),
                    job.duration_ms(),
                    job.user().unwrap_or("-"),
                    job.service().unwrap_or("-")
                ),
                Err(mpsc::RecvTimeoutError::Timeout) => break,
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            }
        }

        cancel.cancel();
        receiver.join().expect("receive loop panicked")
    })?;

    println!(
        "{} datagrams, {} jobs reported",
        summary.datagrams, summary.emitted
    );
    if !client.close() {
        eprintln!("printer did not confirm unsubscribe");
    }
    Ok(())
}
