use serde::{Deserialize, Serialize};
use std::fmt;

/// Which error rule a trigger line satisfied.
///
/// Rules are checked in declaration order; the first one that matches wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ErrorKind {
    /// Explicit build-tool marker (`[ERROR]`).
    Error,
    /// Generic failure or failed-test banner.
    Failure,
    /// Exception-chain marker (`Caused by:`).
    Exception,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Error => "ERROR",
            ErrorKind::Failure => "FAILURE",
            ErrorKind::Exception => "EXCEPTION",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected error occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEntry {
    /// 1-based line of the trigger in the source log.
    pub line_number: usize,
    pub error_type: ErrorKind,
    /// Right-trimmed text of the trigger line.
    pub content: String,
    /// Right-trimmed lines following the trigger, bounded by the context window.
    pub context_lines: Vec<String>,
    /// Lines of `context_lines` that look like stack frames or cause-chain markers.
    pub stack_trace: Vec<String>,
}

impl ErrorEntry {
    /// Trigger line and context joined with `\n`, the text the report rules inspect.
    pub fn haystack(&self) -> String {
        let mut text = self.content.clone();
        text.push('\n');
        text.push_str(&self.context_lines.join("\n"));
        text
    }
}

/// Failure category of the condensed bug report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FailureType {
    SymbolNotFound,
    PackageNotFound,
    CompilationError,
    RuntimeException,
    Unknown,
}

impl FailureType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureType::SymbolNotFound => "SymbolNotFound",
            FailureType::PackageNotFound => "PackageNotFound",
            FailureType::CompilationError => "CompilationError",
            FailureType::RuntimeException => "RuntimeException",
            FailureType::Unknown => "Unknown",
        }
    }

    /// Short root-cause phrase attached to the bug report.
    pub fn root_cause(&self) -> &'static str {
        match self {
            FailureType::SymbolNotFound => "Missing class/package import or a misspelled name",
            FailureType::PackageNotFound => "Maven dependency missing or misconfigured",
            FailureType::CompilationError => "Syntax error or type mismatch in the source",
            FailureType::RuntimeException => "Exception raised at runtime; inspect the key trace",
            FailureType::Unknown => "Needs further analysis",
        }
    }
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source position reported by the compiler, e.g. `Bar.java:[10,5]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// Path exactly as printed in the log.
    pub path: String,
    pub line: u32,
    pub column: u32,
}

impl SourceLocation {
    /// Final path component; both `/` and `\` count as separators.
    pub fn file_name(&self) -> &str {
        self.path
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or(self.path.as_str())
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:[{},{}]", self.file_name(), self.line, self.column)
    }
}
