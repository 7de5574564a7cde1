use lazy_static::lazy_static;
use regex::Regex;

use super::{Haystack, NO_ERRORS_MESSAGE};
use crate::ir::{ErrorEntry, FailureType, SourceLocation};

lazy_static! {
    static ref LOCATION: Regex =
        Regex::new(r"\[(ERROR|WARNING)\]\s+([^\s\[]+\.java):\[(\d+)[,:](\d+)\]").unwrap();
}

/// Context lines quoted under "Key Trace".
const KEY_TRACE_CONTEXT: usize = 5;

type FailureRule = (fn(&Haystack) -> bool, FailureType);

/// Evaluated top to bottom; first match wins.
static FAILURE_RULES: &[FailureRule] = &[
    (mentions_missing_symbol, FailureType::SymbolNotFound),
    (mentions_missing_package, FailureType::PackageNotFound),
    (mentions_compilation_failure, FailureType::CompilationError),
    (mentions_exception, FailureType::RuntimeException),
];

fn mentions_missing_symbol(h: &Haystack) -> bool {
    h.text.contains("cannot find symbol")
}

fn mentions_missing_package(h: &Haystack) -> bool {
    h.text.contains("package") && h.text.contains("does not exist")
}

fn mentions_compilation_failure(h: &Haystack) -> bool {
    h.lower.contains("compilation failure")
}

fn mentions_exception(h: &Haystack) -> bool {
    h.text.contains("Exception")
}

pub fn classify_failure(entry: &ErrorEntry) -> FailureType {
    let haystack = Haystack::new(entry);
    FAILURE_RULES
        .iter()
        .find(|(applies, _)| applies(&haystack))
        .map_or(FailureType::Unknown, |(_, failure)| *failure)
}

/// First `[ERROR] <path>.java:[line,col]` style location in `text`.
pub fn find_location(text: &str) -> Option<SourceLocation> {
    let caps = LOCATION.captures(text)?;
    Some(SourceLocation {
        path: caps[2].to_string(),
        line: caps[3].parse().ok()?,
        column: caps[4].parse().ok()?,
    })
}

fn key_trace(entry: &ErrorEntry) -> String {
    let mut trace = entry.content.clone();
    for line in entry.context_lines.iter().take(KEY_TRACE_CONTEXT) {
        trace.push('\n');
        trace.push_str(line);
    }
    trace
}

/// Condensed report for the first entry only.
pub fn render_bug_report(entries: &[ErrorEntry]) -> String {
    let Some(entry) = entries.first() else {
        return NO_ERRORS_MESSAGE.to_string();
    };
    let failure = classify_failure(entry);
    let location = find_location(&entry.haystack())
        .map_or_else(|| "Unknown".to_string(), |loc| loc.to_string());

    format!(
        "\n> **[Bug Report]**\n\
         > * **Failure Type**: {failure}\n\
         > * **Location**: {location}\n\
         > * **Key Trace**:\n\
         > ```text\n\
         {trace}\n\
         > ```\n\
         > * **Root Cause**: {cause}\n",
        trace = key_trace(entry),
        cause = failure.root_cause(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ErrorKind;

    fn entry(content: &str, context: &[&str]) -> ErrorEntry {
        ErrorEntry {
            line_number: 1,
            error_type: ErrorKind::Error,
            content: content.to_string(),
            context_lines: context.iter().map(|s| s.to_string()).collect(),
            stack_trace: vec![],
        }
    }

    #[test]
    fn rules_are_first_match_wins() {
        let both = entry(
            "[ERROR] cannot find symbol",
            &["[ERROR] package com.acme does not exist"],
        );
        assert_eq!(classify_failure(&both), FailureType::SymbolNotFound);

        let package = entry("[ERROR] package org.slf4j does not exist", &[]);
        assert_eq!(classify_failure(&package), FailureType::PackageNotFound);

        let compile = entry("[ERROR] COMPILATION FAILURE", &["java.lang.Exception"]);
        assert_eq!(classify_failure(&compile), FailureType::CompilationError);

        let runtime = entry("Caused by: java.lang.IllegalStateException", &[]);
        assert_eq!(classify_failure(&runtime), FailureType::RuntimeException);

        let other = entry("BUILD FAILURE", &[]);
        assert_eq!(classify_failure(&other), FailureType::Unknown);
    }

    #[test]
    fn location_accepts_relative_and_windows_paths() {
        let loc = find_location("[ERROR] foo/Bar.java:[10,5] cannot find symbol").unwrap();
        assert_eq!(loc.to_string(), "Bar.java:[10,5]");

        let loc =
            find_location(r"[WARNING] C:\proj\src\main\java\Svc.java:[7:3] unchecked").unwrap();
        assert_eq!(loc.path, r"C:\proj\src\main\java\Svc.java");
        assert_eq!((loc.line, loc.column), (7, 3));

        assert!(find_location("[INFO] Bar.java:[1,1]").is_none());
    }

    #[test]
    fn location_path_is_a_single_token() {
        assert!(find_location("[ERROR] see Foo.java and Bar.java:[1,2]").is_none());

        let loc = find_location("[ERROR] src/Foo.java:[4,2] see Bar.java:[1,2]").unwrap();
        assert_eq!(loc.path, "src/Foo.java");
        assert_eq!(loc.to_string(), "Foo.java:[4,2]");
    }

    #[test]
    fn bug_report_layout() {
        let e = entry(
            "[ERROR] foo/Bar.java:[10,5] cannot find symbol",
            &["  symbol:   class Baz", "  location: class Bar"],
        );
        let report = render_bug_report(&[e]);
        let expected = "\n> **[Bug Report]**\n\
                        > * **Failure Type**: SymbolNotFound\n\
                        > * **Location**: Bar.java:[10,5]\n\
                        > * **Key Trace**:\n\
                        > ```text\n\
                        [ERROR] foo/Bar.java:[10,5] cannot find symbol\n  symbol:   class Baz\n  location: class Bar\n\
                        > ```\n\
                        > * **Root Cause**: Missing class/package import or a misspelled name\n";
        assert_eq!(report, expected);
    }

    #[test]
    fn key_trace_keeps_five_context_lines() {
        let context: Vec<String> = (0..8).map(|i| format!("ctx {i}")).collect();
        let refs: Vec<&str> = context.iter().map(String::as_str).collect();
        let trace = key_trace(&entry("BUILD FAILURE", &refs));
        assert_eq!(trace.lines().count(), 6);
        assert!(trace.ends_with("ctx 4"));
    }

    #[test]
    fn empty_input_renders_fixed_message() {
        assert_eq!(render_bug_report(&[]), NO_ERRORS_MESSAGE);
    }
}
