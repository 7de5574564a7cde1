use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{ConfigSource, LogError, Result};

/// Which report the analyzer renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportStyle {
    /// Condensed single-error bug report.
    #[default]
    Bug,
    /// Per-entry report with context, stack trace and diagnosis.
    Full,
}

/// Analyzer settings. Every field has a default, so a config file only needs
/// the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyzerConfig {
    /// Scanning stops once this many entries are collected.
    pub max_errors: usize,
    /// Context window after a trigger line; also the half-window in grep mode.
    pub context_lines: usize,
    /// Grep mode stops after this many matches.
    pub max_matches: usize,
    /// Encoding label that bypasses detection.
    pub encoding: Option<String>,
    pub report_style: ReportStyle,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            max_errors: 5,
            context_lines: 20,
            max_matches: 10,
            encoding: None,
            report_style: ReportStyle::default(),
        }
    }
}

impl AnalyzerConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config_err = |source: ConfigSource| LogError::Config {
            path: path.to_path_buf(),
            source,
        };
        let content = std::fs::read_to_string(path).map_err(|e| config_err(e.into()))?;
        let config = serde_json::from_str(&content).map_err(|e| config_err(e.into()))?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let config: AnalyzerConfig =
            serde_json::from_str(r#"{ "context_lines": 8, "report_style": "full" }"#).unwrap();
        assert_eq!(config.context_lines, 8);
        assert_eq!(config.report_style, ReportStyle::Full);
        assert_eq!(config.max_errors, 5);
        assert_eq!(config.max_matches, 10);
        assert_eq!(config.encoding, None);
    }

    #[test]
    fn load_reports_bad_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buildlens.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = AnalyzerConfig::load(&path).unwrap_err();
        assert!(matches!(
            err,
            LogError::Config {
                source: ConfigSource::Json(_),
                ..
            }
        ));
    }

    #[test]
    fn load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buildlens.json");
        std::fs::write(&path, r#"{ "encoding": "gbk", "max_errors": 2 }"#).unwrap();
        let config = AnalyzerConfig::load(&path).unwrap();
        assert_eq!(config.encoding.as_deref(), Some("gbk"));
        assert_eq!(config.max_errors, 2);
    }
}
