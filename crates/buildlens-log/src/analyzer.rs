use chrono::Local;
use std::path::PathBuf;

use crate::config::AnalyzerConfig;
use crate::encoding::EncodingDetector;
use crate::error::Result;
use crate::grep::{self, GrepOutcome};
use crate::ir::ErrorEntry;
use crate::reader::LogSource;
use crate::report::{self, ReportHeader};
use crate::scanner::Scanner;

/// One log file, its settings and the entries found by the last scan.
pub struct LogAnalyzer {
    source: LogSource,
    config: AnalyzerConfig,
    errors: Vec<ErrorEntry>,
}

impl LogAnalyzer {
    pub fn new(path: impl Into<PathBuf>, config: AnalyzerConfig) -> Result<Self> {
        let source = LogSource::open(path, config.encoding.as_deref())?;
        Ok(Self {
            source,
            config,
            errors: Vec::new(),
        })
    }

    pub fn with_detector(mut self, detector: EncodingDetector) -> Self {
        self.source = self.source.with_detector(detector);
        self
    }

    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    pub fn source(&self) -> &LogSource {
        &self.source
    }

    pub fn errors(&self) -> &[ErrorEntry] {
        &self.errors
    }

    /// Reads and scans the log, replacing the results of any earlier run.
    pub fn analyze(&mut self) -> Result<&[ErrorEntry]> {
        let lines = self.source.read_lines()?;
        self.errors = Scanner::from_config(&self.config).scan(&lines);
        log::info!(
            "Scanned {} lines of {}, {} error(s) found",
            lines.len(),
            self.source.path().display(),
            self.errors.len()
        );
        Ok(&self.errors)
    }

    /// Keyword search over the same decoded lines.
    pub fn grep(&mut self, keyword: &str) -> Result<GrepOutcome> {
        let lines = self.source.read_lines()?;
        Ok(grep::grep(
            &lines,
            keyword,
            self.config.context_lines,
            self.config.max_matches,
        ))
    }

    /// Last `n` lines, decoded with the cached encoding.
    pub fn tail(&mut self, n: usize) -> Result<Vec<String>> {
        self.source.tail(n)
    }

    fn header(&self) -> ReportHeader<'_> {
        ReportHeader {
            log_path: self.source.path(),
            encoding: self.source.detected_encoding(),
            generated_at: Local::now(),
        }
    }

    pub fn full_report(&self) -> String {
        report::render_full_report(&self.header(), &self.errors)
    }

    pub fn bug_report(&self) -> String {
        report::render_bug_report(&self.errors)
    }

    /// Report in the configured style.
    pub fn report(&self) -> String {
        report::render(self.config.report_style, &self.header(), &self.errors)
    }
}
