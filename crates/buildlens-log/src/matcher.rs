use lazy_static::lazy_static;
use regex::Regex;

use crate::ir::ErrorKind;

lazy_static! {
    static ref BUILD_TOOL_ERROR: Regex = Regex::new(r"\[ERROR\]").unwrap();
    static ref FAILURE: Regex = Regex::new(r"FAILURE|BUILD FAILURE|Test.*FAILED").unwrap();
    static ref CAUSED_BY: Regex = Regex::new(r"^Caused by:").unwrap();
    static ref STACK_FRAME: Regex = Regex::new(r"^\s+at\s+[\w.$]+").unwrap();
}

/// Classifies one line.
///
/// A line can satisfy several rules (a `[ERROR]` line that also says
/// `BUILD FAILURE`); the order here is the tie-break.
pub fn classify(line: &str) -> Option<ErrorKind> {
    if BUILD_TOOL_ERROR.is_match(line) {
        Some(ErrorKind::Error)
    } else if FAILURE.is_match(line) {
        Some(ErrorKind::Failure)
    } else if CAUSED_BY.is_match(line) {
        Some(ErrorKind::Exception)
    } else {
        None
    }
}

/// True for `\tat com.acme.Foo.bar(Foo.java:12)` frames and `Caused by:` lines.
pub fn is_stack_line(line: &str) -> bool {
    STACK_FRAME.is_match(line) || CAUSED_BY.is_match(line)
}
