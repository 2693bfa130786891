//! End-to-end translation of one document
//!
//! Runs the rewrite passes, scans for residue, validates, then emits in the
//! configured format. Only an internal-invariant violation from the rule
//! table stops a translation; everything else becomes a diagnostic.

use docshape_core::{input_digest, Config, Diagnostic, DiagnosticCode, EmitFormat, Report, Severity};
use docshape_decl::RustEmitter;
use docshape_rules::{ResidueScanner, RuleError, RuleSet};

use crate::validator::Validator;

/// Label used for documents read from standard input
pub const STDIN_LABEL: &str = "<stdin>";

/// Fatal translation errors
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    #[error(transparent)]
    Rule(#[from] RuleError),
}

impl TranslateError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            Self::Rule(err) => err.to_diagnostic(),
        }
    }
}

/// Result of translating one document
#[derive(Debug, Clone)]
pub struct Translation {
    /// Source label (`<stdin>` for standard input)
    pub file: String,

    /// SHA-256 of the input text
    pub input_sha256: String,

    /// Text after the rewrite passes
    pub canonical: String,

    /// Text to write out
    pub output: String,

    /// Format of `output`; canonical when the requested format failed
    pub format: EmitFormat,

    /// Whether the canonical text passed structural validation
    pub validated: bool,

    /// Rules that changed the text
    pub applied: Vec<&'static str>,

    /// Diagnostics with severity overrides applied
    pub diagnostics: Vec<Diagnostic>,
}

impl Translation {
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }

    /// Build a report for this translation
    pub fn report(&self) -> Report {
        let mut report = Report::from_diagnostics(self.diagnostics.clone());
        report.record_document(self.validated);
        report.with_metadata(serde_json::json!({
            "file": self.file,
            "input_sha256": self.input_sha256,
            "format": self.format.to_string(),
            "rules_applied": self.applied,
        }))
    }
}

/// Translator holding the rule table and emitters for a run
#[derive(Debug, Clone)]
pub struct Translator {
    rules: RuleSet,
    scanner: ResidueScanner,
    validator: Validator,
    emitter: RustEmitter,
    config: Config,
}

impl Translator {
    /// Build a translator with the standard rule table
    pub fn new(config: Config) -> Result<Self, TranslateError> {
        Self::with_rules(RuleSet::standard()?, config)
    }

    /// Build a translator with a custom rule table
    pub fn with_rules(rules: RuleSet, config: Config) -> Result<Self, TranslateError> {
        Ok(Self {
            rules,
            scanner: ResidueScanner::new()?,
            validator: Validator::new(&config),
            emitter: RustEmitter::from_config(&config),
            config,
        })
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Translate one document
    pub fn translate(&self, text: &str, file: Option<&str>) -> Result<Translation, TranslateError> {
        let file = file.unwrap_or(STDIN_LABEL);
        let rewritten = self.rules.apply(text)?;

        let mut diagnostics = self.scanner.scan(&rewritten.canonical, file);
        let validation = self.validator.validate(&rewritten.canonical, file);
        diagnostics.extend(validation.diagnostics);

        let mut output = validation.output;
        let mut format = EmitFormat::Canonical;

        if let (EmitFormat::Rust, Some(document)) = (self.config.emit, &validation.document) {
            match self.emitter.emit(document) {
                Ok(rust) => {
                    output = rust;
                    format = EmitFormat::Rust;
                }
                Err(err) => {
                    tracing::warn!(
                        file,
                        error = %err,
                        "rust emission failed, emitting canonical text"
                    );
                    diagnostics.push(
                        Diagnostic::new(DiagnosticCode::EmitError, Severity::Error, err.to_string())
                            .in_file(file),
                    );
                }
            }
        }

        for diagnostic in &mut diagnostics {
            diagnostic.severity = self
                .config
                .severity
                .get_severity(diagnostic.code, diagnostic.severity);
        }

        let validated = validation.document.is_some();
        tracing::info!(
            file,
            rules = rewritten.applied.len(),
            diagnostics = diagnostics.len(),
            validated,
            "translated document"
        );

        Ok(Translation {
            file: file.to_string(),
            input_sha256: input_digest(text),
            canonical: rewritten.canonical,
            output,
            format,
            validated,
            applied: rewritten.applied,
            diagnostics,
        })
    }
}
