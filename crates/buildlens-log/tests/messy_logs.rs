use buildlens_log::encoding::{CharsetGuess, CharsetGuesser, EncodingDetector, EncodingOrigin};
use buildlens_log::{AnalyzerConfig, ErrorKind, LogAnalyzer};
use std::path::PathBuf;

/// Always unsure, so detection has to go through the fallback list.
struct Unsure;

impl CharsetGuesser for Unsure {
    fn guess(&self, _sample: &[u8]) -> Option<CharsetGuess> {
        Some(CharsetGuess {
            label: "windows-1252".into(),
            confidence: 0.4,
        })
    }
}

fn write_log(dir: &tempfile::TempDir, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join("build.log");
    std::fs::write(&path, bytes).unwrap();
    path
}

#[test]
fn progress_redraws_do_not_shift_line_numbers() {
    // Download progress is redrawn with bare CRs; each redraw is its own line.
    let log = b"[INFO] Downloading\r\n\
                Progress (1): 12 kB\rProgress (1): 48 kB\rProgress (1): 96 kB\r\n\
                [ERROR] Failed to read artifact descriptor\r\n\
                \r\n";
    let dir = tempfile::tempdir().unwrap();
    let mut analyzer = LogAnalyzer::new(write_log(&dir, log), AnalyzerConfig::default()).unwrap();
    let errors = analyzer.analyze().unwrap();

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].line_number, 5);
    assert_eq!(errors[0].content, "[ERROR] Failed to read artifact descriptor");
}

#[test]
fn gbk_log_without_bom_uses_fallback() {
    let text = concat!(
        "[INFO] 正在构建 order-service\n",
        "[ERROR] D:\\work\\order\\src\\main\\java\\Order.java:[3,8] 找不到符号\n",
        "  符号:   类 Money\n",
        "\n",
    );
    let (bytes, _, _) = encoding_rs::GBK.encode(text);
    let dir = tempfile::tempdir().unwrap();
    let mut analyzer = LogAnalyzer::new(write_log(&dir, &bytes), AnalyzerConfig::default())
        .unwrap()
        .with_detector(EncodingDetector::new(Box::new(Unsure)));

    let errors = analyzer.analyze().unwrap().to_vec();
    let detected = analyzer.source().detected_encoding().unwrap();
    assert_eq!(detected.encoding, encoding_rs::GBK);
    assert_eq!(detected.origin, EncodingOrigin::Fallback);

    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].error_type, ErrorKind::Error);
    assert!(errors[0].content.ends_with("找不到符号"));
    assert_eq!(errors[0].context_lines, vec!["  符号:   类 Money"]);
    assert!(analyzer.bug_report().contains("> * **Location**: Order.java:[3,8]"));
}

#[test]
fn invalid_bytes_are_replaced_not_fatal() {
    let mut log = b"[ERROR] bad byte: ".to_vec();
    log.extend_from_slice(&[0xFF, 0xFE, 0xFD]);
    log.extend_from_slice(b"\nnext\n");
    let dir = tempfile::tempdir().unwrap();
    let config = AnalyzerConfig {
        encoding: Some("utf-8".into()),
        ..AnalyzerConfig::default()
    };
    let mut analyzer = LogAnalyzer::new(write_log(&dir, &log), config).unwrap();
    let errors = analyzer.analyze().unwrap();
    assert_eq!(errors.len(), 1);
    assert!(errors[0].content.contains('\u{FFFD}'));
    assert_eq!(errors[0].context_lines, vec!["next"]);
}

#[test]
fn utf16le_log_without_bom_is_scanned() {
    let bytes: Vec<u8> = "[INFO] x\r\n[ERROR] boom\r\n"
        .encode_utf16()
        .flat_map(|unit| unit.to_le_bytes())
        .collect();
    let dir = tempfile::tempdir().unwrap();
    let path = write_log(&dir, &bytes);
    let mut analyzer = LogAnalyzer::new(path, AnalyzerConfig::default()).unwrap();

    let errors = analyzer.analyze().unwrap().to_vec();
    let detected = analyzer.source().detected_encoding().unwrap();
    assert_eq!(detected.encoding, encoding_rs::UTF_16LE);
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0].line_number, 2);
    assert_eq!(errors[0].content, "[ERROR] boom");
}
