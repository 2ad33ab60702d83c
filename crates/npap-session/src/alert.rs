//! Interpretation of decoded alert parameters into job-completion records.

use std::sync::LazyLock;

use npap_frame::ParameterMap;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

/// Job identifier.
pub const JOB_ID_PATH: &str = ".1.1.1.2";
/// Free-text annotation carrying `UR:` (user) and `HT:` (service) tags.
pub const ANNOTATION_PATH: &str = ".1.1.1.4";
/// Job duration in milliseconds.
pub const DURATION_PATH: &str = ".1.1.1.7";
/// Input tray of the first media category.
pub const TRAY_PATH: &str = ".1.1.2.1.1.5";

/// Media categories and how many page counters each carries.
const PAGE_FAMILIES: [(&str, u32); 3] = [(".1.1.2.1", 5), (".1.1.2.2", 2), (".1.1.2.3", 3)];

/// Jobs with no pages and a shorter duration than this are not reported.
pub const MIN_DURATION_MS: i32 = 1000;

/// A completed print job, as reported by the printer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertJob {
    job_id: String,
    duration_ms: i32,
    pages: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    service: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tray: Option<String>,
}

impl AlertJob {
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Job duration in milliseconds.
    pub fn duration_ms(&self) -> i32 {
        self.duration_ms
    }

    /// Pages summed over every media category.
    pub fn pages(&self) -> i32 {
        self.pages
    }

    pub fn user(&self) -> Option<&str> {
        self.user.as_deref()
    }

    /// Service or host the job came from.
    pub fn service(&self) -> Option<&str> {
        self.service.as_deref()
    }

    pub fn tray(&self) -> Option<&str> {
        self.tray.as_deref()
    }
}

/// `UR:` / `HT:` values found in an annotation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotation {
    pub user: Option<String>,
    pub service: Option<String>,
}

/// Turn a decoded parameter map into a job record.
///
/// Returns `None` when the map is not a reportable job: no job id, no
/// annotation, or zero pages with a duration under one second.
pub fn interpret(map: &ParameterMap) -> Option<AlertJob> {
    let Some(job_id) = map.get(JOB_ID_PATH) else {
        debug!("alert without job id, discarding");
        return None;
    };

    let duration_ms = integer_or_zero(map, DURATION_PATH);
    let pages = count_pages(map);

    if pages == 0 && duration_ms < MIN_DURATION_MS {
        debug!(job_id, duration_ms, "empty short job, discarding");
        return None;
    }

    let tray = map.get(TRAY_PATH).map(str::to_string);

    let Some(annotation) = map.get(ANNOTATION_PATH) else {
        debug!(job_id, "alert without annotation, discarding");
        return None;
    };
    let Annotation { user, service } = parse_annotation(annotation);

    Some(AlertJob {
        job_id: job_id.to_string(),
        duration_ms,
        pages,
        user,
        service,
        tray,
    })
}

fn count_pages(map: &ParameterMap) -> i32 {
    PAGE_FAMILIES
        .iter()
        .flat_map(|&(family, counters)| {
            (1..=counters).map(move |i| format!("{family}.{i}.2.2"))
        })
        .filter(|path| map.contains(path))
        .map(|path| integer_or_zero(map, &path))
        .fold(0i32, i32::saturating_add)
}

fn integer_or_zero(map: &ParameterMap, path: &str) -> i32 {
    match map.get(path) {
        None => 0,
        Some(raw) => map.integer(path).unwrap_or_else(|| {
            debug!(path, raw, "non-numeric parameter, counting as 0");
            0
        }),
    }
}

static TAG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(UR|HT):").expect("tag pattern is a valid regex"));

/// Extract the user (`UR:`) and service (`HT:`) tags from an annotation.
///
/// A tag's value is the run of word characters and whitespace after it,
/// up to the next tag, trimmed. When a tag repeats, the last one wins.
pub fn parse_annotation(text: &str) -> Annotation {
    let mut annotation = Annotation::default();
    let tags: Vec<_> = TAG_PATTERN.captures_iter(text).collect();
    for (i, caps) in tags.iter().enumerate() {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let end = tags
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |next| next.start());

        let Some(value) = tag_value(&text[whole.end()..end]) else {
            continue;
        };
        match name.as_str() {
            "UR" => annotation.user = Some(value),
            "HT" => annotation.service = Some(value),
            _ => {}
        }
    }

    annotation
}

fn tag_value(rest: &str) -> Option<String> {
    let run = rest
        .char_indices()
        .find(|&(_, c)| !(c.is_alphanumeric() || c == '_' || c.is_whitespace()))
        .map_or(rest, |(at, _)| &rest[..at]);
    let value = run.trim();
    (!value.is_empty()).then(|| value.to_string())
}
