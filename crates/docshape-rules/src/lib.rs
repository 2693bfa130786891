//! Rewrite passes for documentation record notation
//!
//! This crate handles:
//! - The rewrite rule model (template and computed rewrites)
//! - The standard, ordered rule table
//! - Running a document through the rule table
//! - Scanning rewritten text for input-side notation that survived

pub mod rule;
pub mod catalog;
pub mod pipeline;
pub mod residue;

pub use rule::{BracketKind, RewriteRule, RuleError, SpanViolation, Stage};
pub use pipeline::{RewriteResult, RuleSet};
pub use residue::ResidueScanner;
