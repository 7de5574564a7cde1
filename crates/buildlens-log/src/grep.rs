//! Keyword search with symmetric context windows.
//!
//! Each line index is printed at most once across all windows, and the cursor
//! jumps past a printed window before looking for the next match. Output is
//! capped at a maximum match count so terminals that truncate long output still
//! show every window in full.

use std::collections::HashSet;
use std::io::{self, Write};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrepLine {
    /// 0-based index into the log lines.
    pub index: usize,
    pub text: String,
    pub is_match: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrepWindow {
    /// 1-based match counter.
    pub ordinal: usize,
    pub match_index: usize,
    pub lines: Vec<GrepLine>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GrepOutcome {
    pub keyword: String,
    pub total_lines: usize,
    pub context_lines: usize,
    pub max_matches: usize,
    pub windows: Vec<GrepWindow>,
}

impl GrepOutcome {
    pub fn match_count(&self) -> usize {
        self.windows.len()
    }
}

/// Finds literal occurrences of `keyword`.
pub fn grep<S: AsRef<str>>(
    lines: &[S],
    keyword: &str,
    context_lines: usize,
    max_matches: usize,
) -> GrepOutcome {
    let total = lines.len();
    let mut printed: HashSet<usize> = HashSet::new();
    let mut windows = Vec::new();
    let mut i = 0;

    while i < total && windows.len() < max_matches {
        if !lines[i].as_ref().contains(keyword) || printed.contains(&i) {
            i += 1;
            continue;
        }

        let start = i.saturating_sub(context_lines);
        let end = i.saturating_add(context_lines).saturating_add(1).min(total);
        let mut window_lines = Vec::with_capacity(end - start);

        for j in start..end {
            if j != i && printed.contains(&j) {
                continue;
            }
            printed.insert(j);
            window_lines.push(GrepLine {
                index: j,
                text: lines[j].as_ref().trim_end().to_string(),
                is_match: j == i,
            });
        }

        windows.push(GrepWindow {
            ordinal: windows.len() + 1,
            match_index: i,
            lines: window_lines,
        });
        i = end;
    }

    GrepOutcome {
        keyword: keyword.to_string(),
        total_lines: total,
        context_lines,
        max_matches,
        windows,
    }
}

/// Writes the console rendering of a grep run.
pub fn render<W: Write>(outcome: &GrepOutcome, out: &mut W) -> io::Result<()> {
    let rule = "=".repeat(70);
    writeln!(
        out,
        "[*] Searching for '{}' (context: {} lines before/after, max matches: {})",
        outcome.keyword, outcome.context_lines, outcome.max_matches
    )?;
    writeln!(out, "[*] Log file has {} lines", outcome.total_lines)?;
    writeln!(out)?;

    for window in &outcome.windows {
        writeln!(out, "{rule}")?;
        writeln!(out, "Match #{} @ line {}", window.ordinal, window.match_index + 1)?;
        writeln!(out, "{}", "-".repeat(70))?;
        for line in &window.lines {
            let marker = if line.is_match { '>' } else { ' ' };
            writeln!(out, "{} {:5} | {}", marker, line.index + 1, line.text)?;
        }
        writeln!(out)?;
    }

    if outcome.windows.is_empty() {
        writeln!(out, "[!] No matches found")?;
    } else {
        writeln!(out, "{rule}")?;
        writeln!(
            out,
            "[*] Search finished, {} match(es) found",
            outcome.match_count()
        )?;
    }
    Ok(())
}
