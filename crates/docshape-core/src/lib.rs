//! docshape core
//!
//! Core domain model shared by the rewrite pipeline, the declaration
//! grammar and the CLI. Never rename diagnostic codes - they are part of
//! the public API.

pub mod diagnostic;
pub mod schema;
pub mod report;
pub mod config;

pub use diagnostic::{Diagnostic, DiagnosticCode, Severity, Location};
pub use schema::{FieldType, Field, Member, Record, Item, Document};
pub use report::{Report, ReportVersion, ReportSummary, input_digest};
pub use config::{Config, ConfigError, EmitFormat, RustConfig, SeverityThreshold};
