#![no_main]
use buildlens_log::grep;
use buildlens_log::reader::split_lines;
use buildlens_log::report::{self, ReportHeader};
use buildlens_log::Scanner;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes, decoded lossily, must never panic the scan or the renderers.
    let text = String::from_utf8_lossy(data);
    let lines = split_lines(&text);

    let entries = Scanner::new(5, 20).scan(&lines);
    let header = ReportHeader {
        log_path: std::path::Path::new("fuzz.log"),
        encoding: None,
        generated_at: chrono::Local::now(),
    };
    let _ = report::render_full_report(&header, &entries);
    let _ = report::render_bug_report(&entries);

    let outcome = grep::grep(&lines, "ERROR", 3, 10);
    let _ = grep::render(&outcome, &mut std::io::sink());
});
