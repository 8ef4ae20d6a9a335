//! Console report printed after an upload.

use std::fmt;

use colored::Colorize;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::SyncJob;

/// Job counters shown by default.
pub const REPORT_COUNTERS: &[&str] = &["numEntitiesUploaded", "numRelationshipsUploaded"];

const COUNTER_PREFIX: &str = "num";

static CAMEL_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([a-z])([A-Z])").expect("valid regex"));

/// Turns a job counter name into a label: `numEntitiesUploaded` → `Entities Uploaded`.
///
/// Returns `None` for names without the `num` prefix.
pub fn pretty_counter_name(name: &str) -> Option<String> {
    let rest = name.strip_prefix(COUNTER_PREFIX)?;
    let spaced = CAMEL_BOUNDARY.replace_all(rest, "$1 $2");
    Some(spaced.trim().to_string())
}

/// One `label = value` line of the report.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub label: String,
    pub value: String,
}

/// Upload counters selected from a finalized job.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncReport {
    pub lines: Vec<ReportLine>,
}

impl SyncReport {
    /// Selects `names` from the job, keeping only `num*` counters the job reports.
    pub fn from_job(job: &SyncJob, names: &[&str]) -> Self {
        let lines = names
            .iter()
            .filter_map(|name| {
                let label = pretty_counter_name(name)?;
                let value = job.property(name)?;
                Some(ReportLine {
                    label,
                    value: match value {
                        serde_json::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    },
                })
            })
            .collect();
        Self { lines }
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nJ1 UPLOAD REPORT:\n")?;
        for line in &self.lines {
            writeln!(f, "  {} = {}", line.label.bold(), line.value)?;
        }
        writeln!(f)
    }
}

/// Renders the skipped hostnames, or nothing when none were skipped.
pub fn render_skipped(skipped: &[String]) -> String {
    if skipped.is_empty() {
        return String::new();
    }
    let mut out = String::from("The following records were skipped:\n");
    for hostname in skipped {
        out.push_str("  ");
        out.push_str(hostname);
        out.push('\n');
    }
    out
}
