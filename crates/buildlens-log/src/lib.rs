//! # buildlens log scanner
//!
//! Finds errors in Maven/Java build and test logs and turns them into reports.
//!
//! ## Overview
//!
//! Build logs are read once, decoded, and scanned from top to bottom:
//!
//! - **Encoding detection**: logs written by Windows consoles are often GBK, not
//!   UTF-8. A statistical guess is accepted above 0.7 confidence, otherwise a
//!   fixed list of encodings is tried ([`encoding`]).
//! - **Line reading**: CRLF and bare CR (progress redraws) are normalized to LF
//!   before splitting ([`reader`]).
//! - **Matching**: each line is classified as `ERROR`, `FAILURE` or `EXCEPTION`
//!   by fixed-priority rules ([`matcher`]).
//! - **Scanning**: every trigger captures a bounded context window, with stack
//!   frames tagged separately ([`scanner`]).
//! - **Reporting**: a full per-entry report with diagnosis hints, or a condensed
//!   bug report for the first entry ([`report`]).
//! - **Grep mode**: keyword search printing non-overlapping context windows
//!   ([`grep`]).
//!
//! ## Data flow
//!
//! ```text
//! raw bytes ──► detect encoding ──► normalize + decode ──► Vec<String>
//!                                                             │
//!                         ┌───────────── Scanner::scan ◄──────┤
//!                         ▼                                   │
//!                  Vec<ErrorEntry> ──► report::render     grep::grep
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use buildlens_log::{AnalyzerConfig, LogAnalyzer};
//!
//! let mut analyzer = LogAnalyzer::new("target/build.log", AnalyzerConfig::default())?;
//! let errors = analyzer.analyze()?;
//! println!("{} error(s)", errors.len());
//! println!("{}", analyzer.bug_report());
//! # Ok::<(), buildlens_log::LogError>(())
//! ```
//!
//! Scanning in-memory lines needs no file at all:
//!
//! ```
//! use buildlens_log::Scanner;
//!
//! let lines = ["[INFO] Compiling 12 source files", "[ERROR] Bar.java:[3,1] ';' expected"];
//! let entries = Scanner::default().scan(&lines);
//! assert_eq!(entries[0].line_number, 2);
//! ```

pub mod analyzer;
pub mod config;
pub mod encoding;
pub mod error;
pub mod grep;
/// Entry and report types.
pub mod ir;
pub mod matcher;
pub mod reader;
pub mod report;
pub mod scanner;

pub use analyzer::LogAnalyzer;
pub use config::{AnalyzerConfig, ReportStyle};
pub use error::LogError;
pub use ir::{ErrorEntry, ErrorKind, FailureType};
pub use reader::LogSource;
pub use report::NO_ERRORS_MESSAGE;
pub use scanner::Scanner;
