use encoding_rs::{Encoding, UTF_8};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use crate::encoding::{self, DetectedEncoding, EncodingDetector, EncodingOrigin, SAMPLE_SIZE};
use crate::error::{LogError, Result};

/// A log file on disk together with its (lazily detected) encoding.
///
/// Detection runs at most once per instance; [`read_lines`](Self::read_lines)
/// and [`tail`](Self::tail) share the cached result.
pub struct LogSource {
    path: PathBuf,
    forced: Option<&'static Encoding>,
    detector: EncodingDetector,
    detected: Option<DetectedEncoding>,
}

impl LogSource {
    /// Creates a source for `path`. An explicit `encoding` label skips detection.
    pub fn open(path: impl Into<PathBuf>, encoding: Option<&str>) -> Result<Self> {
        let forced = encoding.map(encoding::resolve_label).transpose()?;
        Ok(Self {
            path: path.into(),
            forced,
            detector: EncodingDetector::default(),
            detected: None,
        })
    }

    /// Replaces the statistical detector.
    pub fn with_detector(mut self, detector: EncodingDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The cached detection result, if detection has run.
    pub fn detected_encoding(&self) -> Option<DetectedEncoding> {
        self.detected
    }

    /// Returns the file encoding, detecting it on first use.
    pub fn encoding(&mut self) -> Result<DetectedEncoding> {
        if let Some(detected) = self.detected {
            return Ok(detected);
        }
        let detected = match self.forced {
            Some(encoding) => {
                log::info!("Using encoding {} (forced)", encoding.name());
                DetectedEncoding::forced(encoding)
            }
            None => match self.read_sample() {
                Ok((sample, complete)) => self.detector.detect(&sample, complete),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    return Err(self.read_error(e));
                }
                Err(e) => {
                    log::warn!("Encoding detection failed ({}), using UTF-8", e);
                    DetectedEncoding {
                        encoding: UTF_8,
                        origin: EncodingOrigin::Default,
                    }
                }
            },
        };
        self.detected = Some(detected);
        Ok(detected)
    }

    /// Reads the whole file as lines, each ending with `\n`.
    ///
    /// Line endings are normalized before splitting and a trailing newline does
    /// not produce an extra empty line. Undecodable bytes are replaced.
    pub fn read_lines(&mut self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Err(LogError::NotFound {
                path: self.path.clone(),
            });
        }
        let detected = self.encoding()?;
        let first = std::fs::read(&self.path);
        self.lines_from(detected, first, || std::fs::read(&self.path))
    }

    /// Decodes the first read, or falls back to one more read decoded as
    /// UTF-8 with invalid bytes dropped.
    ///
    /// A failed read yields no bytes, so the retry reads the file again and
    /// only recovers from transient failures (an interrupted read, a file
    /// briefly locked by the build that writes it).
    fn lines_from(
        &self,
        detected: DetectedEncoding,
        first: io::Result<Vec<u8>>,
        retry: impl FnOnce() -> io::Result<Vec<u8>>,
    ) -> Result<Vec<String>> {
        match first {
            Ok(bytes) => Ok(split_lines(&encoding::decode_normalized(
                detected.encoding,
                &bytes,
            ))),
            Err(e) => {
                log::warn!(
                    "Reading {} as {} failed ({}), retrying as UTF-8",
                    self.path.display(),
                    detected.name(),
                    e
                );
                let bytes = retry().map_err(|e| self.read_error(e))?;
                let text = encoding::decode_utf8_skipping_invalid(&bytes);
                Ok(split_lines(&encoding::normalize_text_line_endings(&text)))
            }
        }
    }

    /// The last `n` lines of the file.
    pub fn tail(&mut self, n: usize) -> Result<Vec<String>> {
        let mut lines = self.read_lines()?;
        let start = lines.len().saturating_sub(n);
        Ok(lines.split_off(start))
    }

    /// First [`SAMPLE_SIZE`] bytes, and whether they are the whole file.
    fn read_sample(&self) -> io::Result<(Vec<u8>, bool)> {
        let file = File::open(&self.path)?;
        let mut sample = Vec::with_capacity(SAMPLE_SIZE + 1);
        file.take(SAMPLE_SIZE as u64 + 1).read_to_end(&mut sample)?;
        let complete = sample.len() <= SAMPLE_SIZE;
        sample.truncate(SAMPLE_SIZE);
        Ok((sample, complete))
    }

    fn read_error(&self, source: io::Error) -> LogError {
        if source.kind() == io::ErrorKind::NotFound {
            LogError::NotFound {
                path: self.path.clone(),
            }
        } else {
            LogError::Io {
                path: self.path.clone(),
                source,
            }
        }
    }
}

/// Splits normalized text into lines that keep their `\n` marker.
pub fn split_lines(text: &str) -> Vec<String> {
    let mut parts: Vec<&str> = text.split('\n').collect();
    if parts.last() == Some(&"") {
        parts.pop();
    }
    parts.into_iter().map(|line| format!("{line}\n")).collect()
}
