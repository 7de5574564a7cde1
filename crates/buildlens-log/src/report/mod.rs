//! Report rendering.
//!
//! Two forms exist: the full report lists every entry with its context, stack
//! trace and diagnosis; the bug report condenses the first entry into four
//! fixed fields. Both render [`NO_ERRORS_MESSAGE`] when there is nothing to
//! report.

pub mod bug;
pub mod diagnosis;

use chrono::{DateTime, Local};
use std::path::Path;

use crate::config::ReportStyle;
use crate::encoding::DetectedEncoding;
use crate::error::{LogError, Result};
use crate::ir::ErrorEntry;

pub use bug::render_bug_report;

pub const NO_ERRORS_MESSAGE: &str = "[OK] No errors found!";

/// Context lines shown per entry in the full report.
const FULL_REPORT_CONTEXT: usize = 10;

/// Text inspected by report rules, with a lowercase copy for
/// case-insensitive checks.
pub(crate) struct Haystack {
    pub text: String,
    pub lower: String,
}

impl Haystack {
    pub fn new(entry: &ErrorEntry) -> Self {
        let text = entry.haystack();
        let lower = text.to_lowercase();
        Self { text, lower }
    }
}

/// Metadata printed at the top of the full report.
#[derive(Debug, Clone)]
pub struct ReportHeader<'a> {
    pub log_path: &'a Path,
    pub encoding: Option<DetectedEncoding>,
    pub generated_at: DateTime<Local>,
}

pub fn render_full_report(header: &ReportHeader<'_>, entries: &[ErrorEntry]) -> String {
    if entries.is_empty() {
        return NO_ERRORS_MESSAGE.to_string();
    }
    let heavy = "=".repeat(80);
    let light = "-".repeat(80);
    let encoding = header
        .encoding
        .map_or_else(|| "not detected".to_string(), |e| e.to_string());

    let mut out = vec![
        heavy.clone(),
        "Build Log Analysis Report".to_string(),
        format!("Log file: {}", header.log_path.display()),
        format!("Encoding: {encoding}"),
        format!(
            "Analyzed at: {}",
            header.generated_at.format("%Y-%m-%d %H:%M:%S")
        ),
        format!("Errors found: {}", entries.len()),
        heavy.clone(),
        String::new(),
    ];

    for (idx, entry) in entries.iter().enumerate() {
        out.push(format!("## Error #{}: {}", idx + 1, entry.error_type));
        out.push(format!("Line: {}", entry.line_number));
        out.push(light.clone());
        out.push("### Content:".to_string());
        out.push(entry.content.clone());
        out.push(String::new());

        if !entry.stack_trace.is_empty() {
            out.push("### Stack trace:".to_string());
            out.extend(entry.stack_trace.iter().cloned());
            out.push(String::new());
        }

        if !entry.context_lines.is_empty() {
            out.push(format!(
                "### Context (next {} lines):",
                entry.context_lines.len()
            ));
            out.extend(
                entry
                    .context_lines
                    .iter()
                    .take(FULL_REPORT_CONTEXT)
                    .cloned(),
            );
            out.push(String::new());
        }

        let diagnosis = diagnosis::diagnose(entry);
        if !diagnosis.is_empty() {
            out.push("### Diagnosis:".to_string());
            out.extend(diagnosis);
            out.push(String::new());
        }

        out.push(heavy.clone());
        out.push(String::new());
    }

    out.join("\n")
}

pub fn render(style: ReportStyle, header: &ReportHeader<'_>, entries: &[ErrorEntry]) -> String {
    match style {
        ReportStyle::Bug => render_bug_report(entries),
        ReportStyle::Full => render_full_report(header, entries),
    }
}

/// Writes `report` as UTF-8, creating parent directories.
pub fn save_report(path: &Path, report: &str) -> Result<()> {
    let report_err = |source| LogError::Report {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(report_err)?;
    }
    std::fs::write(path, report).map_err(report_err)?;
    log::info!("Report saved to {}", path.display());
    Ok(())
}
