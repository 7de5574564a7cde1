//! Text encoding detection and decoding.
//!
//! Detection runs once per log file on a leading sample of the raw bytes:
//!
//! 1. A statistical guesser reports a charset and a confidence. Guesses above
//!    [`CONFIDENCE_THRESHOLD`] are accepted.
//! 2. Otherwise each of [`fallback_encodings`] is tried as a strict decode of
//!    the sample; the first clean decode wins. A sample with NUL bytes never
//!    resolves to an ASCII-compatible encoding, so BOM-less UTF-16 reaches
//!    the UTF-16LE entry.
//! 3. If nothing decodes, UTF-8 is returned with [`EncodingOrigin::Default`]
//!    and callers must decode lossily.

use encoding_rs::{DecoderResult, Encoding, GB18030, GBK, UTF_16LE, UTF_8};
use std::borrow::Cow;
use std::fmt;

use crate::error::{LogError, Result};

/// Number of leading bytes handed to the detector.
pub const SAMPLE_SIZE: usize = 10_000;

/// Guesses at or below this confidence fall through to the fallback list.
pub const CONFIDENCE_THRESHOLD: f32 = 0.7;

/// Encodings tried, in order, when the guesser is not confident.
pub fn fallback_encodings() -> [&'static Encoding; 4] {
    [UTF_8, GBK, GB18030, UTF_16LE]
}

/// A charset guess from a statistical detector.
#[derive(Debug, Clone, PartialEq)]
pub struct CharsetGuess {
    pub label: String,
    pub confidence: f32,
}

/// Statistical charset detection over a byte sample.
pub trait CharsetGuesser {
    /// Returns `None` when the detector has no opinion at all.
    fn guess(&self, sample: &[u8]) -> Option<CharsetGuess>;
}

/// [`CharsetGuesser`] backed by the `chardet` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct ChardetGuesser;

impl CharsetGuesser for ChardetGuesser {
    fn guess(&self, sample: &[u8]) -> Option<CharsetGuess> {
        if sample.is_empty() {
            return None;
        }
        let (label, confidence, _language) = chardet::detect(&sample.to_vec());
        if label.is_empty() {
            return None;
        }
        Some(CharsetGuess { label, confidence })
    }
}

/// How an encoding was chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EncodingOrigin {
    /// Supplied by the caller; no detection ran.
    Forced,
    /// Accepted from the statistical guesser.
    Detected { confidence: f32 },
    /// First entry of the fallback list that decoded the sample.
    Fallback,
    /// Nothing decoded cleanly; decode lossily.
    Default,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectedEncoding {
    pub encoding: &'static Encoding,
    pub origin: EncodingOrigin,
}

impl DetectedEncoding {
    pub fn forced(encoding: &'static Encoding) -> Self {
        Self {
            encoding,
            origin: EncodingOrigin::Forced,
        }
    }

    pub fn name(&self) -> &'static str {
        self.encoding.name()
    }

    /// True when no encoding decoded the sample cleanly.
    pub fn is_lossy(&self) -> bool {
        self.origin == EncodingOrigin::Default
    }
}

impl fmt::Display for DetectedEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.origin {
            EncodingOrigin::Forced => write!(f, "{} (forced)", self.name()),
            EncodingOrigin::Detected { confidence } => {
                write!(f, "{} (confidence {:.0}%)", self.name(), confidence * 100.0)
            }
            EncodingOrigin::Fallback => write!(f, "{} (fallback)", self.name()),
            EncodingOrigin::Default => write!(f, "{} (lossy)", self.name()),
        }
    }
}

/// Resolves a user-supplied label such as `utf-8`, `gbk` or `gb2312`.
pub fn resolve_label(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| LogError::UnknownEncoding {
        label: label.to_string(),
    })
}

/// Maps a detector label onto the encoding used for decoding.
///
/// `GB2312` and `GB18030` collapse onto `GBK`; `ascii` is read as UTF-8.
fn canonical_encoding(label: &str) -> Option<&'static Encoding> {
    match label.to_ascii_uppercase().as_str() {
        "GB2312" | "GB18030" => Some(GBK),
        "ASCII" | "US-ASCII" => Some(UTF_8),
        _ => Encoding::for_label(label.as_bytes()),
    }
}

/// Runs detection steps 2 to 4 on a byte sample.
pub struct EncodingDetector {
    guesser: Box<dyn CharsetGuesser>,
}

impl Default for EncodingDetector {
    fn default() -> Self {
        Self::new(Box::new(ChardetGuesser))
    }
}

impl EncodingDetector {
    pub fn new(guesser: Box<dyn CharsetGuesser>) -> Self {
        Self { guesser }
    }

    /// Picks an encoding for `sample`.
    ///
    /// `complete` is false when the sample was cut from a longer file, in
    /// which case a multibyte sequence split at the end is not a decode error.
    pub fn detect(&self, sample: &[u8], complete: bool) -> DetectedEncoding {
        if let Some(guess) = self.guesser.guess(sample) {
            if guess.confidence > CONFIDENCE_THRESHOLD {
                match canonical_encoding(&guess.label) {
                    Some(encoding) if !fits_sample(encoding, sample) => {
                        log::debug!("Sample has NUL bytes, not accepting {} guess", guess.label);
                    }
                    Some(encoding) => {
                        log::info!(
                            "Detected encoding {} (reported as {}, confidence {:.2})",
                            encoding.name(),
                            guess.label,
                            guess.confidence
                        );
                        return DetectedEncoding {
                            encoding,
                            origin: EncodingOrigin::Detected {
                                confidence: guess.confidence,
                            },
                        };
                    }
                    None => {
                        log::debug!("Detector label {:?} has no decoder, ignoring", guess.label);
                    }
                }
            } else {
                log::debug!(
                    "Low-confidence guess {} ({:.2}), trying fallbacks",
                    guess.label,
                    guess.confidence
                );
            }
        }

        for encoding in fallback_encodings() {
            if fits_sample(encoding, sample) && decodes_cleanly(encoding, sample, complete) {
                log::info!("Using fallback encoding {}", encoding.name());
                return DetectedEncoding {
                    encoding,
                    origin: EncodingOrigin::Fallback,
                };
            }
        }

        log::warn!("Could not determine encoding, decoding as UTF-8 with replacement");
        DetectedEncoding {
            encoding: UTF_8,
            origin: EncodingOrigin::Default,
        }
    }
}

/// NUL bytes decode cleanly in every ASCII-compatible encoding but only show
/// up in text logs as the high half of UTF-16 code units.
fn fits_sample(encoding: &'static Encoding, sample: &[u8]) -> bool {
    !(encoding.is_ascii_compatible() && sample.contains(&0))
}

/// Strict decode check: true if `sample` contains no malformed sequence.
pub fn decodes_cleanly(encoding: &'static Encoding, sample: &[u8], complete: bool) -> bool {
    let mut decoder = encoding.new_decoder_without_bom_handling();
    let Some(capacity) = decoder.max_utf8_buffer_length_without_replacement(sample.len()) else {
        return false;
    };
    let mut out = String::with_capacity(capacity);
    let (result, _) = decoder.decode_to_string_without_replacement(sample, &mut out, complete);
    matches!(result, DecoderResult::InputEmpty)
}

/// Collapses CRLF and bare CR into LF. Borrows when there is nothing to do.
pub fn normalize_line_endings(bytes: &[u8]) -> Cow<'_, [u8]> {
    if !bytes.contains(&b'\r') {
        return Cow::Borrowed(bytes);
    }
    let mut out = Vec::with_capacity(bytes.len());
    let mut iter = bytes.iter().copied().peekable();
    while let Some(b) = iter.next() {
        if b == b'\r' {
            out.push(b'\n');
            if iter.peek() == Some(&b'\n') {
                iter.next();
            }
        } else {
            out.push(b);
        }
    }
    Cow::Owned(out)
}

/// Text counterpart of [`normalize_line_endings`], for encodings whose code
/// units are wider than a byte.
pub fn normalize_text_line_endings(text: &str) -> Cow<'_, str> {
    if !text.contains('\r') {
        return Cow::Borrowed(text);
    }
    Cow::Owned(text.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Normalizes line endings and decodes, replacing malformed sequences.
pub fn decode_normalized(encoding: &'static Encoding, bytes: &[u8]) -> String {
    if encoding.is_ascii_compatible() {
        let normalized = normalize_line_endings(bytes);
        let (text, actual, had_errors) = encoding.decode(&normalized);
        if had_errors {
            log::debug!("Replaced malformed sequences while decoding as {}", actual.name());
        }
        text.into_owned()
    } else {
        let (text, _, _) = encoding.decode(bytes);
        normalize_text_line_endings(&text).into_owned()
    }
}

/// Decodes as UTF-8, dropping invalid byte sequences instead of replacing them.
pub fn decode_utf8_skipping_invalid(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        out.push_str(chunk.valid());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedGuess(&'static str, f32);

    impl CharsetGuesser for FixedGuess {
        fn guess(&self, _sample: &[u8]) -> Option<CharsetGuess> {
            Some(CharsetGuess {
                label: self.0.to_string(),
                confidence: self.1,
            })
        }
    }

    fn detector(label: &'static str, confidence: f32) -> EncodingDetector {
        EncodingDetector::new(Box::new(FixedGuess(label, confidence)))
    }

    #[test]
    fn confident_guess_is_accepted() {
        let (bytes, _, _) = encoding_rs::SHIFT_JIS.encode("ビルド失敗");
        let detected = detector("SHIFT_JIS", 0.99).detect(&bytes, true);
        assert_eq!(detected.encoding, encoding_rs::SHIFT_JIS);
        assert_eq!(detected.origin, EncodingOrigin::Detected { confidence: 0.99 });
    }

    #[test]
    fn gb_aliases_collapse_to_gbk() {
        for label in ["GB2312", "gb18030"] {
            let detected = detector(label, 0.9).detect(b"plain", true);
            assert_eq!(detected.encoding, GBK, "label {label}");
        }
    }

    #[test]
    fn ascii_guess_reads_as_utf8() {
        let detected = detector("ascii", 1.0).detect(b"[INFO] ok", true);
        assert_eq!(detected.encoding, UTF_8);
    }

    #[test]
    fn low_confidence_cjk_falls_back_to_gbk() {
        let (bytes, _, had_errors) = GBK.encode("[ERROR] 编译失败：找不到符号");
        assert!(!had_errors);
        assert!(std::str::from_utf8(&bytes).is_err());

        let detected = detector("windows-1252", 0.3).detect(&bytes, true);
        assert_eq!(detected.encoding, GBK);
        assert_eq!(detected.origin, EncodingOrigin::Fallback);
    }

    #[test]
    fn unknown_confident_label_falls_back() {
        let detected = detector("x-no-such-charset", 0.95).detect(b"hello", true);
        assert_eq!(detected.encoding, UTF_8);
        assert_eq!(detected.origin, EncodingOrigin::Fallback);
    }

    fn utf16le(text: &str) -> Vec<u8> {
        text.encode_utf16().flat_map(|unit| unit.to_le_bytes()).collect()
    }

    #[test]
    fn bomless_utf16_is_not_taken_for_ascii() {
        let bytes = utf16le("[INFO] x\r\n[ERROR] boom\r\n");
        let detected = detector("ascii", 1.0).detect(&bytes, true);
        assert_eq!(detected.encoding, UTF_16LE);
        assert_eq!(detected.origin, EncodingOrigin::Fallback);
    }

    #[test]
    fn ascii_guess_accepted_without_nuls() {
        let detected = detector("ascii", 1.0).detect(b"[INFO] x\n", true);
        assert_eq!(detected.origin, EncodingOrigin::Detected { confidence: 1.0 });
    }

    #[test]
    fn truncated_sample_split_inside_utf8_char_is_clean() {
        let text = "构建失败".as_bytes();
        let cut = &text[..text.len() - 1];
        assert!(decodes_cleanly(UTF_8, cut, false));
        assert!(!decodes_cleanly(UTF_8, cut, true));
    }

    #[test]
    fn undecodable_sample_defaults_to_lossy_utf8() {
        // 0xFF is invalid in UTF-8 and GBK; 0xDCFF is an unpaired UTF-16 surrogate.
        let detected = detector("windows-1252", 0.1).detect(&[0xFF, 0xDC], true);
        assert_eq!(detected.encoding, UTF_8);
        assert!(detected.is_lossy());
    }

    #[test]
    fn chardet_on_ascii_yields_utf8() {
        let detected = EncodingDetector::default().detect(b"[INFO] BUILD SUCCESS\n", true);
        assert_eq!(detected.encoding, UTF_8);
    }

    #[test]
    fn resolve_label_rejects_unknown() {
        assert_eq!(resolve_label("gb2312").unwrap(), GBK);
        assert!(matches!(
            resolve_label("klingon"),
            Err(LogError::UnknownEncoding { .. })
        ));
    }

    #[test]
    fn line_ending_normalization_is_idempotent() {
        let raw = b"a\r\nb\rc\n\r\nd\r";
        let once = normalize_line_endings(raw).into_owned();
        assert_eq!(once, b"a\nb\nc\n\nd\n");
        let twice = normalize_line_endings(&once);
        assert!(matches!(twice, Cow::Borrowed(_)));
        assert_eq!(twice.as_ref(), once.as_slice());
    }

    #[test]
    fn utf16_is_normalized_after_decoding() {
        assert_eq!(decode_normalized(UTF_16LE, &utf16le("x\r\ny\rz")), "x\ny\nz");
    }

    #[test]
    fn skipping_decode_drops_invalid_bytes() {
        assert_eq!(decode_utf8_skipping_invalid(b"ok\xFF\xFEfine"), "okfine");
    }
}
