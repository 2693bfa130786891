//! Configuration schema (docshape.toml)

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use crate::diagnostic::{DiagnosticCode, Severity};

/// Default config file name, looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "docshape.toml";

/// Output produced for a successfully validated document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmitFormat {
    /// Canonically formatted record declarations
    #[default]
    Canonical,

    /// Rust structs with serde derives
    Rust,
}

impl std::fmt::Display for EmitFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Canonical => write!(f, "canonical"),
            Self::Rust => write!(f, "rust"),
        }
    }
}

/// Severity threshold overrides for specific diagnostic codes
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SeverityThreshold {
    /// Map of diagnostic code to severity override
    #[serde(default)]
    pub overrides: HashMap<String, Severity>,
}

impl SeverityThreshold {
    /// Get severity for a diagnostic code, or default
    pub fn get_severity(&self, code: DiagnosticCode, default: Severity) -> Severity {
        self.overrides
            .get(code.as_str())
            .copied()
            .unwrap_or(default)
    }

    /// Set severity override for a code
    pub fn set_override(&mut self, code: DiagnosticCode, severity: Severity) {
        self.overrides.insert(code.as_str().to_string(), severity);
    }
}

/// Settings for the Rust emitter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RustConfig {
    /// Derives placed on every generated struct
    #[serde(default = "default_derives")]
    pub derives: Vec<String>,
}

fn default_derives() -> Vec<String> {
    ["Debug", "Clone", "PartialEq", "Serialize", "Deserialize"]
        .iter()
        .map(|d| d.to_string())
        .collect()
}

impl Default for RustConfig {
    fn default() -> Self {
        Self {
            derives: default_derives(),
        }
    }
}

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Output format
    #[serde(default)]
    pub emit: EmitFormat,

    /// Name given to an anonymous root shape by the Rust emitter
    #[serde(default = "default_root_name")]
    pub root_name: String,

    /// Indent with this many spaces instead of tabs
    #[serde(default)]
    pub indent_width: Option<usize>,

    /// Fail the run when any error diagnostic is produced
    #[serde(default)]
    pub strict: bool,

    /// Rust emitter settings
    #[serde(default)]
    pub rust: RustConfig,

    /// Severity thresholds
    #[serde(default)]
    pub severity: SeverityThreshold,
}

fn default_root_name() -> String {
    "Response".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            emit: EmitFormat::default(),
            root_name: default_root_name(),
            indent_width: None,
            strict: false,
            rust: RustConfig::default(),
            severity: SeverityThreshold::default(),
        }
    }
}

impl Config {
    /// Load config from TOML file
    pub fn from_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;

        Self::from_toml(&contents)
    }

    /// Load config from TOML string
    pub fn from_toml(toml: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(toml)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Indentation unit for one nesting level
    pub fn indent_unit(&self) -> String {
        match self.indent_width {
            Some(width) => " ".repeat(width),
            None => "\t".to_string(),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let valid_root = self
            .root_name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_uppercase())
            && self.root_name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
        if !valid_root {
            return Err(ConfigError::InvalidValue(format!(
                "root_name '{}' must be an UpperCamelCase identifier",
                self.root_name
            )));
        }

        if self.indent_width == Some(0) {
            return Err(ConfigError::InvalidValue(
                "indent_width must be at least 1".to_string(),
            ));
        }

        Ok(())
    }
}

/// Config error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.emit, EmitFormat::Canonical);
        assert_eq!(config.root_name, "Response");
        assert_eq!(config.indent_unit(), "\t");
    }

    #[test]
    fn severity_override() {
        let mut threshold = SeverityThreshold::default();
        threshold.set_override(DiagnosticCode::ResidualNotation, Severity::Error);

        assert_eq!(
            threshold.get_severity(DiagnosticCode::ResidualNotation, Severity::Warn),
            Severity::Error
        );
        assert_eq!(
            threshold.get_severity(DiagnosticCode::DeclParseError, Severity::Error),
            Severity::Error
        );
    }

    #[test]
    fn parse_full_config() {
        let config = Config::from_toml(
            r#"
            emit = "rust"
            root_name = "StatsResponse"
            indent_width = 4
            strict = true

            [rust]
            derives = ["Debug", "Deserialize"]

            [severity.overrides]
            RESIDUAL_NOTATION = "error"
            "#,
        )
        .unwrap();

        assert_eq!(config.emit, EmitFormat::Rust);
        assert_eq!(config.root_name, "StatsResponse");
        assert_eq!(config.indent_unit(), "    ");
        assert!(config.strict);
        assert_eq!(config.rust.derives, vec!["Debug", "Deserialize"]);
        assert_eq!(
            config.severity.get_severity(DiagnosticCode::ResidualNotation, Severity::Warn),
            Severity::Error
        );
    }

    #[test]
    fn rejects_invalid_root_name() {
        let err = Config::from_toml(r#"root_name = "stats response""#).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(_)));
    }

    #[test]
    fn rejects_zero_indent() {
        assert!(Config::from_toml("indent_width = 0").is_err());
    }

    #[test]
    fn config_toml_roundtrip() {
        let config = Config::default();
        let toml = toml::to_string(&config).unwrap();
        let parsed = Config::from_toml(&toml).unwrap();
        assert_eq!(config.emit, parsed.emit);
        assert_eq!(config.rust, parsed.rust);
    }
}
