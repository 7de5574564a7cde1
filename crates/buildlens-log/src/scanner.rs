use crate::config::AnalyzerConfig;
use crate::ir::ErrorEntry;
use crate::matcher::{classify, is_stack_line};

/// Single-pass scanner turning log lines into [`ErrorEntry`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scanner {
    max_errors: usize,
    context_lines: usize,
}

impl Default for Scanner {
    fn default() -> Self {
        Self::from_config(&AnalyzerConfig::default())
    }
}

impl Scanner {
    pub fn new(max_errors: usize, context_lines: usize) -> Self {
        Self {
            max_errors,
            context_lines,
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        Self::new(config.max_errors, config.context_lines)
    }

    /// Scans `lines` from the top.
    ///
    /// After an entry is emitted the cursor skips the trigger line and its
    /// whole context window, so one exception block yields one entry. Stops
    /// at the end of input or after `max_errors` entries.
    pub fn scan<S: AsRef<str>>(&self, lines: &[S]) -> Vec<ErrorEntry> {
        let mut entries = Vec::new();
        let mut cursor = 0;

        while cursor < lines.len() && entries.len() < self.max_errors {
            let line = lines[cursor].as_ref();
            let Some(error_type) = classify(line) else {
                cursor += 1;
                continue;
            };

            let (context_lines, stack_trace) = self.extract_context(lines, cursor);
            log::debug!(
                "{} at line {} ({} context lines, {} stack lines)",
                error_type,
                cursor + 1,
                context_lines.len(),
                stack_trace.len()
            );
            let consumed = context_lines.len() + 1;
            entries.push(ErrorEntry {
                line_number: cursor + 1,
                error_type,
                content: line.trim_end().to_string(),
                context_lines,
                stack_trace,
            });
            cursor += consumed;
        }

        entries
    }

    /// Collects the context window after the trigger at `start`.
    ///
    /// The window ends early at a blank line, or at a line that is itself an
    /// error trigger unless it directly follows `start` (two-line banners stay
    /// together). The terminating line is not part of the window.
    pub fn extract_context<S: AsRef<str>>(
        &self,
        lines: &[S],
        start: usize,
    ) -> (Vec<String>, Vec<String>) {
        let mut context = Vec::new();
        let mut stack_trace = Vec::new();
        let end = start
            .saturating_add(1)
            .saturating_add(self.context_lines)
            .min(lines.len());

        for idx in start + 1..end {
            let line = lines[idx].as_ref().trim_end();
            if line.trim().is_empty() {
                break;
            }
            if idx > start + 1 && classify(line).is_some() {
                break;
            }
            if is_stack_line(line) {
                stack_trace.push(line.to_string());
            }
            context.push(line.to_string());
        }

        (context, stack_trace)
    }
}
