//! docshape engine - end-to-end translation
//!
//! This crate ties the rewrite passes, the residue scan, structural
//! validation and emission together:
//! - Structural validation with best-effort fallback
//! - Translation of one document into canonical or Rust output
//! - Report generation

pub mod validator;
pub mod translator;

pub use validator::{Validation, Validator};
pub use translator::{TranslateError, Translation, Translator, STDIN_LABEL};
