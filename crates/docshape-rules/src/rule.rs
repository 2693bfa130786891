//! Rewrite rule model
//!
//! A rule pairs a compiled pattern with either a substitution template or
//! a computed function over the matched span. Rules hold no mutable state
//! and can be applied to any number of documents.

use docshape_core::{Diagnostic, DiagnosticCode, Severity};
use regex::{Captures, Regex};
use std::sync::Arc;

/// Pipeline stage a rule belongs to, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Stage {
    ScalarAlias,
    ArrayForm,
    NumericWidth,
    AmbiguousNumeric,
    Temporal,
    Optionality,
    Literal,
    EmptyCollection,
    NullLiteral,
    FieldIdentifier,
    Whitespace,
}

impl Stage {
    /// All stages in pipeline order
    pub const ALL: [Stage; 11] = [
        Stage::ScalarAlias,
        Stage::ArrayForm,
        Stage::NumericWidth,
        Stage::AmbiguousNumeric,
        Stage::Temporal,
        Stage::Optionality,
        Stage::Literal,
        Stage::EmptyCollection,
        Stage::NullLiteral,
        Stage::FieldIdentifier,
        Stage::Whitespace,
    ];

    /// 1-based position in the pipeline
    pub fn number(&self) -> usize {
        *self as usize + 1
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ScalarAlias => "scalar-alias",
            Self::ArrayForm => "array-form",
            Self::NumericWidth => "numeric-width",
            Self::AmbiguousNumeric => "ambiguous-numeric",
            Self::Temporal => "temporal",
            Self::Optionality => "optionality",
            Self::Literal => "literal",
            Self::EmptyCollection => "empty-collection",
            Self::NullLiteral => "null-literal",
            Self::FieldIdentifier => "field-identifier",
            Self::Whitespace => "whitespace",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A computed rewrite rejected the span it was handed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0}")]
pub struct SpanViolation(pub String);

/// Computed rewrite over a matched span
pub type ComputeFn = Arc<dyn Fn(&str) -> Result<String, SpanViolation> + Send + Sync>;

/// How a matched span is replaced
#[derive(Clone)]
pub enum Rewrite {
    /// Substitution template; `${n}` interpolates capture group `n`
    Template(String),

    /// Function of the matched span
    Computed(ComputeFn),

    /// Function of the whole document, run when the pattern matches
    /// anywhere in it
    Document(ComputeFn),
}

impl std::fmt::Debug for Rewrite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Template(template) => f.debug_tuple("Template").field(template).finish(),
            Self::Computed(_) => f.write_str("Computed(..)"),
            Self::Document(_) => f.write_str("Document(..)"),
        }
    }
}

/// Which matches a rule may rewrite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    /// Every match
    #[default]
    Anywhere,

    /// Only matches that start before any `//` on their line
    Code,
}

/// One ordered pipeline entry
#[derive(Debug, Clone)]
pub struct RewriteRule {
    name: &'static str,
    stage: Stage,
    description: &'static str,
    pattern: Regex,
    rewrite: Rewrite,
    scope: Scope,
}

impl RewriteRule {
    /// Rule with a substitution template
    pub fn template(
        stage: Stage,
        name: &'static str,
        pattern: &str,
        template: &str,
        description: &'static str,
    ) -> Result<Self, RuleError> {
        Ok(Self {
            name,
            stage,
            description,
            pattern: compile(name, pattern)?,
            rewrite: Rewrite::Template(template.to_string()),
            scope: Scope::Anywhere,
        })
    }

    /// Rule replacing one exact piece of text with another
    pub fn literal(
        stage: Stage,
        name: &'static str,
        from: &str,
        to: &str,
        description: &'static str,
    ) -> Result<Self, RuleError> {
        Self::template(stage, name, &regex::escape(from), &to.replace('$', "$$"), description)
    }

    /// Rule whose replacement is computed from the matched span
    pub fn computed<F>(
        stage: Stage,
        name: &'static str,
        pattern: &str,
        compute: F,
        description: &'static str,
    ) -> Result<Self, RuleError>
    where
        F: Fn(&str) -> Result<String, SpanViolation> + Send + Sync + 'static,
    {
        Ok(Self {
            name,
            stage,
            description,
            pattern: compile(name, pattern)?,
            rewrite: Rewrite::Computed(Arc::new(compute)),
            scope: Scope::Anywhere,
        })
    }

    /// Rule rewriting the whole document once `trigger` matches in it
    pub fn document<F>(
        stage: Stage,
        name: &'static str,
        trigger: &str,
        compute: F,
        description: &'static str,
    ) -> Result<Self, RuleError>
    where
        F: Fn(&str) -> Result<String, SpanViolation> + Send + Sync + 'static,
    {
        Ok(Self {
            name,
            stage,
            description,
            pattern: compile(name, trigger)?,
            rewrite: Rewrite::Document(Arc::new(compute)),
            scope: Scope::Anywhere,
        })
    }

    /// Leave matches inside line comments untouched
    pub fn code_only(mut self) -> Self {
        self.scope = Scope::Code;
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn description(&self) -> &'static str {
        self.description
    }

    /// Rewrite every non-overlapping match in `text`
    pub fn apply(&self, text: &str) -> Result<String, RuleError> {
        match &self.rewrite {
            Rewrite::Template(template) => Ok(self
                .pattern
                .replace_all(text, |caps: &Captures| match caps.get(0) {
                    Some(m) if self.skips(text, m.start()) => m.as_str().to_string(),
                    _ => {
                        let mut out = String::new();
                        caps.expand(template, &mut out);
                        out
                    }
                })
                .into_owned()),
            Rewrite::Computed(compute) => {
                let mut out = String::with_capacity(text.len());
                let mut last = 0;
                for m in self.pattern.find_iter(text) {
                    out.push_str(&text[last..m.start()]);
                    last = m.end();
                    if self.skips(text, m.start()) {
                        out.push_str(m.as_str());
                        continue;
                    }
                    let replacement = compute(m.as_str())
                        .map_err(|violation| self.violation(m.as_str(), m.start(), violation))?;
                    out.push_str(&replacement);
                }
                out.push_str(&text[last..]);
                Ok(out)
            }
            Rewrite::Document(compute) => match self.pattern.find(text) {
                Some(m) => compute(text)
                    .map_err(|violation| self.violation(m.as_str(), m.start(), violation)),
                None => Ok(text.to_string()),
            },
        }
    }

    fn skips(&self, text: &str, offset: usize) -> bool {
        self.scope == Scope::Code && in_comment(text, offset)
    }

    fn violation(&self, span: &str, offset: usize, violation: SpanViolation) -> RuleError {
        RuleError::InvariantViolation {
            rule: self.name,
            span: span.to_string(),
            offset,
            reason: violation.0,
        }
    }
}

/// Whether byte `offset` lies after a `//` on its line
pub fn in_comment(text: &str, offset: usize) -> bool {
    let line_start = text[..offset].rfind('\n').map_or(0, |i| i + 1);
    text[line_start..offset].contains("//")
}

fn compile(rule: &'static str, pattern: &str) -> Result<Regex, RuleError> {
    Regex::new(pattern).map_err(|source| RuleError::InvalidPattern { rule, source })
}

/// Leading character of a bracket-sweep match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BracketKind {
    /// `[` plus any whitespace after it
    Open,

    /// `]`
    Close,
}

impl BracketKind {
    /// Classify a matched span by its first character
    ///
    /// The sweep pattern only matches brackets; any other leading character
    /// means the rule table and this match have drifted apart.
    pub fn classify(span: &str) -> Result<Self, SpanViolation> {
        match span.chars().next() {
            Some('[') => Ok(Self::Open),
            Some(']') => Ok(Self::Close),
            Some(other) => Err(SpanViolation(format!(
                "bracket sweep matched a span starting with {:?}",
                other
            ))),
            None => Err(SpanViolation("bracket sweep matched an empty span".to_string())),
        }
    }

    /// Replacement text for this bracket
    pub fn replacement(&self) -> &'static str {
        match self {
            Self::Open => "[]",
            Self::Close => "",
        }
    }
}

/// Rule table errors
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("rule '{rule}' has an invalid pattern: {source}")]
    InvalidPattern {
        rule: &'static str,
        #[source]
        source: regex::Error,
    },

    #[error("rule '{rule}' matched {span:?} at byte {offset}: {reason}")]
    InvariantViolation {
        rule: &'static str,
        span: String,
        offset: usize,
        reason: String,
    },
}

impl RuleError {
    /// Whether this error signals a stale rule table
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvariantViolation { .. })
    }

    /// Convert to a docshape diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        Diagnostic::new(DiagnosticCode::RuleInvariantViolation, Severity::Error, self.to_string())
    }
}
