//! Enrich-loop progress reporting.
//!
//! Reports observable progress while divisions are processed so a long run
//! shows what is being worked on and which geoshapes are being fetched.
//! Lines go to **stdout**; the `json` mode emits one object per event for
//! scripting.

use std::io::Write;

/// A single progress event from the enrich loop.
#[derive(Clone, Debug)]
pub enum CombineEvent {
    /// A division is being processed: n of total.
    Division {
        n: usize,
        total: usize,
        name: String,
    },
    /// The current division has no geoshape source.
    NoGeoshape,
    /// The current division's geoshape is absent from the cache and will be fetched.
    Fetching { url: String },
}

/// Reports enrich progress. Implementations write to stdout (human or JSON).
pub trait CombineReporter {
    fn report(&self, event: CombineEvent);
}

/// Human-friendly lines: `[3/128] Alpha`.
pub struct StdoutProgress;

impl CombineReporter for StdoutProgress {
    fn report(&self, event: CombineEvent) {
        let line = match &event {
            CombineEvent::Division { n, total, name } => format!("[{}/{}] {}", n, total, name),
            CombineEvent::NoGeoshape => "No geoshape, skipping...".to_string(),
            CombineEvent::Fetching { .. } => "Fetching".to_string(),
        };
        let mut out = std::io::stdout().lock();
        let _ = writeln!(out, "{}", line);
        let _ = out.flush();
    }
}

/// Machine-readable progress: one JSON object per line.
pub struct JsonProgress;

impl CombineReporter for JsonProgress {
    fn report(&self, event: CombineEvent) {
        let obj = match &event {
            CombineEvent::Division { n, total, name } => serde_json::json!({
                "event": "division",
                "n": n,
                "total": total,
                "name": name
            }),
            CombineEvent::NoGeoshape => serde_json::json!({
                "event": "no_geoshape"
            }),
            CombineEvent::Fetching { url } => serde_json::json!({
                "event": "fetching",
                "url": url
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let mut out = std::io::stdout().lock();
            let _ = writeln!(out, "{}", line);
            let _ = out.flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl CombineReporter for NoProgress {
    fn report(&self, _event: CombineEvent) {}
}

/// Progress mode for the CLI: off, human, or JSON.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        match s {
            "off" => Ok(ProgressMode::Off),
            "human" => Ok(ProgressMode::Human),
            "json" => Ok(ProgressMode::Json),
            other => anyhow::bail!(
                "Unknown progress mode: '{}'. Must be off, human, or json.",
                other
            ),
        }
    }

    /// Build a reporter for this mode. Caller passes it to the pipeline.
    pub fn reporter(&self) -> Box<dyn CombineReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StdoutProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
