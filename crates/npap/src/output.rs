use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::net::SocketAddr;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use npap_session::{AlertJob, SubscribeReport};
use serde::Serialize;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct JobOutput<'a> {
    event: &'static str,
    printer: String,
    #[serde(flatten)]
    job: &'a AlertJob,
    timestamp: String,
}

pub fn print_job(job: &AlertJob, printer: SocketAddr, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            let out = JobOutput {
                event: "job-completed",
                printer: printer.to_string(),
                job,
                timestamp: now_unix_seconds(),
            };
            print_json(&out);
        }
        OutputFormat::Table => {
            let mut table = new_table();
            table
                .set_header(vec!["JOB", "DURATION MS", "PAGES", "USER", "SERVICE", "TRAY"])
                .add_row(vec![
                    job.job_id().to_string(),
                    job.duration_ms().to_string(),
                    job.pages().to_string(),
                    or_dash(job.user()),
                    or_dash(job.service()),
                    or_dash(job.tray()),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "job={} duration_ms={} pages={} user={} service={} tray={}",
                job.job_id(),
                job.duration_ms(),
                job.pages(),
                or_dash(job.user()),
                or_dash(job.service()),
                or_dash(job.tray())
            );
        }
    }
}

#[derive(Serialize)]
struct SubscribeOutput<'a> {
    event: &'static str,
    printer: String,
    #[serde(flatten)]
    report: &'a SubscribeReport,
}

pub fn print_subscribe(report: &SubscribeReport, printer: SocketAddr, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&SubscribeOutput {
            event: "subscribed",
            printer: printer.to_string(),
            report,
        }),
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(vec!["STEP", "ACKNOWLEDGED"]);
            table.add_row(vec!["discovery".to_string(), "true".to_string()]);
            for step in &report.steps {
                table.add_row(vec![step.name.to_string(), step.acknowledged.to_string()]);
            }
            println!("Subscribed to {printer} (features 0x{:02x})", report.feature_flag);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "subscribed printer={} features=0x{:02x} acknowledged={}/{}",
                printer, report.feature_flag, report.commands_acknowledged, report.commands_sent
            );
        }
    }
}

#[derive(Serialize)]
struct UnsubscribeOutput {
    event: &'static str,
    printer: String,
}

pub fn print_unsubscribe(printer: SocketAddr, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(&UnsubscribeOutput {
            event: "unsubscribed",
            printer: printer.to_string(),
        }),
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("unsubscribed printer={printer}");
        }
    }
}

/// Offline decode result of one captured alert.
#[derive(Serialize)]
pub struct DecodeOutput<'a> {
    pub object: Option<String>,
    pub job_alert: bool,
    pub parameters: BTreeMap<&'a str, &'a str>,
    pub job: Option<AlertJob>,
}

pub fn print_decode(out: &DecodeOutput<'_>, format: OutputFormat) {
    match format {
        OutputFormat::Json => print_json(out),
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(vec!["PATH", "VALUE"]);
            for (path, value) in &out.parameters {
                table.add_row(vec![path.to_string(), value.to_string()]);
            }
            println!(
                "Object: {} (job alert: {})",
                out.object.as_deref().unwrap_or("-"),
                out.job_alert
            );
            println!("{table}");
            match &out.job {
                Some(job) => println!(
                    "Job: {} ({} pages, {} ms, user {}, service {})",
                    job.job_id(),
                    job.pages(),
                    job.duration_ms(),
                    or_dash(job.user()),
                    or_dash(job.service())
                ),
                None => println!("Job: not reportable"),
            }
        }
        OutputFormat::Pretty => {
            for (path, value) in &out.parameters {
                println!("{path} = {value}");
            }
            if let Some(job) = &out.job {
                println!(
                    "job={} duration_ms={} pages={} user={} service={}",
                    job.job_id(),
                    job.duration_ms(),
                    job.pages(),
                    or_dash(job.user()),
                    or_dash(job.service())
                );
            }
        }
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) {
    println!(
        "{}",
        serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string())
    );
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
