//! Running a document through the rule table
//!
//! Converts documentation record notation into canonical record text.

use crate::catalog::standard_rules;
use crate::rule::{RewriteRule, RuleError, Stage};

/// Result of running the rewrite passes
#[derive(Debug, Clone)]
pub struct RewriteResult {
    /// Document as it was read
    pub original: String,

    /// Canonical record text
    pub canonical: String,

    /// Rules that changed the text, in the order they ran
    pub applied: Vec<&'static str>,
}

impl RewriteResult {
    /// Whether a given rule changed the text
    pub fn was_applied(&self, rule: &str) -> bool {
        self.applied.iter().any(|name| *name == rule)
    }
}

/// Immutable, ordered rule table
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<RewriteRule>,
}

impl RuleSet {
    /// Create a rule set from rules already in pipeline order
    pub fn new(rules: Vec<RewriteRule>) -> Self {
        Self { rules }
    }

    /// The standard rule table
    pub fn standard() -> Result<Self, RuleError> {
        Ok(Self::new(standard_rules()?))
    }

    /// Rules in pipeline order
    pub fn rules(&self) -> &[RewriteRule] {
        &self.rules
    }

    /// Rules of one stage
    pub fn stage(&self, stage: Stage) -> impl Iterator<Item = &RewriteRule> {
        self.rules.iter().filter(move |rule| rule.stage() == stage)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Run every rule over the whole document, in order
    ///
    /// Each pass consumes the full output of the previous one. The only
    /// failure is an internal-invariant violation from a computed rule.
    pub fn apply(&self, document: &str) -> Result<RewriteResult, RuleError> {
        let mut text = document.to_string();
        let mut applied = Vec::new();

        for rule in &self.rules {
            let next = rule.apply(&text)?;
            let changed = next != text;
            tracing::debug!(rule = rule.name(), stage = %rule.stage(), changed, "rewrite pass");
            if changed {
                applied.push(rule.name());
                text = next;
            }
        }

        Ok(RewriteResult {
            original: document.to_string(),
            canonical: text,
            applied,
        })
    }
}
