//! Structural validation of canonical record text
//!
//! The validator never blocks output: on failure it hands back the text it
//! was given together with a diagnostic explaining why it did not parse.

use docshape_core::{Config, Diagnostic, Document};
use docshape_decl::{DeclParser, Formatter};

/// Result of validating canonical text
#[derive(Debug, Clone)]
pub struct Validation {
    /// Formatted declarations, or the input unchanged when validation failed
    pub output: String,

    /// Parsed document (only when validation succeeded)
    pub document: Option<Document>,

    /// Diagnostics produced by validation
    pub diagnostics: Vec<Diagnostic>,
}

impl Validation {
    pub fn is_valid(&self) -> bool {
        self.document.is_some()
    }
}

/// Parses and reformats canonical text
#[derive(Debug, Clone)]
pub struct Validator {
    parser: DeclParser,
    formatter: Formatter,
}

impl Validator {
    pub fn new(config: &Config) -> Self {
        Self {
            parser: DeclParser::new(),
            formatter: Formatter::from_config(config),
        }
    }

    /// Validate canonical text, falling back to it unchanged on failure
    pub fn validate(&self, canonical: &str, file: &str) -> Validation {
        match self.parser.parse(canonical, Some(file)) {
            Ok(parsed) => Validation {
                output: self.formatter.format(&parsed.document),
                document: Some(parsed.document),
                diagnostics: Vec::new(),
            },
            Err(err) => {
                tracing::warn!(file, error = %err, "validation failed, emitting unformatted text");
                Validation {
                    output: canonical.to_string(),
                    document: None,
                    diagnostics: vec![err.to_diagnostic()],
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docshape_core::DiagnosticCode;

    #[test]
    fn valid_text_is_formatted() {
        let validator = Validator::new(&Config::default());
        let result = validator.validate("struct {\n  A string\n  Bee i32\n}\n", "a.txt");

        assert!(result.is_valid());
        assert!(result.diagnostics.is_empty());
        assert_eq!(result.output, "struct {\n\tA   string\n\tBee i32\n}\n");
    }

    #[test]
    fn invalid_text_passes_through() {
        let validator = Validator::new(&Config::default());
        let text = "Page i32?\n";
        let result = validator.validate(text, "a.txt");

        assert!(!result.is_valid());
        assert_eq!(result.output, text);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].code, DiagnosticCode::DeclParseError);
    }
}
