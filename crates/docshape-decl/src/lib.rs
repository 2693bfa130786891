//! Record declaration grammar
//!
//! This crate handles:
//! - Tokenizing canonical record text
//! - Parsing it into the core declaration model, with positioned errors
//! - Canonical formatting of parsed declarations
//! - Lowering declarations to Rust structs with serde derives

pub mod lexer;
pub mod parser;
pub mod format;
pub mod rust;

pub use lexer::{Lexer, Token, TokenKind};
pub use parser::{DeclParser, ParsedDecl, ParseError, ParseErrorKind};
pub use format::Formatter;
pub use rust::{RustEmitter, EmitError};
