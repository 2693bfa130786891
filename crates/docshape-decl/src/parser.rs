//! Record declaration parser
//!
//! Parses canonical record text into the core declaration model and
//! provides error handling with diagnostics.

use docshape_core::{
    Diagnostic, DiagnosticCode, Document, Field, FieldType, Item, Location, Member, Record,
    Severity,
};
use std::collections::HashMap;

use crate::lexer::{LexError, Lexer, Token, TokenKind};

/// Parser for the record declaration grammar
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclParser;

impl DeclParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse declaration text into a document
    ///
    /// Returns ParsedDecl on success, or ParseError with position on failure.
    pub fn parse(&self, text: &str, file: Option<&str>) -> Result<ParsedDecl, ParseError> {
        let fail = |kind, line, column| ParseError {
            kind,
            line,
            column,
            file: file.map(str::to_string),
        };

        let tokens = Lexer::new(text).tokenize().map_err(|LexError { ch, line, column }| {
            fail(ParseErrorKind::UnexpectedChar(ch), line, column)
        })?;

        let document = Parser { tokens, pos: 0 }
            .document()
            .map_err(|(kind, line, column)| fail(kind, line, column))?;

        Ok(ParsedDecl {
            text: text.to_string(),
            document,
            file: file.map(str::to_string),
        })
    }

}

/// Successfully parsed declarations
#[derive(Debug, Clone)]
pub struct ParsedDecl {
    /// Text that was parsed
    pub text: String,

    /// Parsed document
    pub document: Document,

    /// Source label (if known)
    pub file: Option<String>,
}

impl ParsedDecl {
    /// Get the first type-bearing item
    pub fn first_declaration(&self) -> Option<&Item> {
        self.document
            .items
            .iter()
            .find(|item| !matches!(item, Item::Comment { .. }))
    }

    /// Count type-bearing items
    pub fn declaration_count(&self) -> usize {
        self.document.declaration_count()
    }
}

/// What went wrong while parsing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A character outside the grammar (`:`, `?`, an unclosed `"`, ...)
    UnexpectedChar(char),

    /// A token other than the one the grammar requires
    Unexpected { expected: String, found: String },

    /// Field names must start with an uppercase ASCII letter
    InvalidFieldName(String),

    /// A generic other than `Option`
    UnknownGeneric(String),

    /// Field declared twice in one record
    DuplicateField { name: String, first_line: usize },

    /// Named type declared twice
    DuplicateType { name: String, first_line: usize },

    /// `struct {` without a closing brace
    UnclosedRecord { opened_line: usize },
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnexpectedChar(ch) => write!(f, "unexpected character {:?}", ch),
            Self::Unexpected { expected, found } => {
                write!(f, "expected {}, found {}", expected, found)
            }
            Self::InvalidFieldName(name) => {
                write!(f, "field name '{}' must start with an uppercase letter", name)
            }
            Self::UnknownGeneric(name) => write!(f, "unknown generic type '{}'", name),
            Self::DuplicateField { name, first_line } => {
                write!(f, "field '{}' already declared on line {}", name, first_line)
            }
            Self::DuplicateType { name, first_line } => {
                write!(f, "type '{}' already declared on line {}", name, first_line)
            }
            Self::UnclosedRecord { opened_line } => {
                write!(f, "record opened on line {} is never closed", opened_line)
            }
        }
    }
}

/// Declaration parsing error with position
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} at line {line}, column {column}")]
pub struct ParseError {
    pub kind: ParseErrorKind,

    /// 1-based line
    pub line: usize,

    /// 1-based column
    pub column: usize,

    /// Source label
    pub file: Option<String>,
}

impl ParseError {
    /// Convert to a docshape diagnostic
    pub fn to_diagnostic(&self) -> Diagnostic {
        let code = match self.kind {
            ParseErrorKind::DuplicateField { .. } => DiagnosticCode::DeclDuplicateField,
            ParseErrorKind::DuplicateType { .. } => DiagnosticCode::DeclDuplicateType,
            _ => DiagnosticCode::DeclParseError,
        };

        let file = self.file.as_deref().unwrap_or("<input>");
        let message = format!("Failed to parse declarations: {}", self.kind);
        let mut diag = Diagnostic::new(code, Severity::Error, message)
            .with_location(Location::with_position(file, self.line, self.column));

        if let ParseErrorKind::Unexpected { expected, found } = &self.kind {
            diag = diag.with_comparison(expected.clone(), found.clone());
        }

        diag
    }
}

type Failure = (ParseErrorKind, usize, usize);

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> &Token {
        // The lexer always ends the stream with Eof
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn unexpected(&self, expected: &str) -> Failure {
        let token = self.peek();
        (
            ParseErrorKind::Unexpected {
                expected: expected.to_string(),
                found: token.kind.to_string(),
            },
            token.line,
            token.column,
        )
    }

    fn expect(&mut self, kind: TokenKind, expected: &str) -> Result<Token, Failure> {
        if self.peek().kind == kind {
            Ok(self.advance())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn skip_newlines(&mut self) {
        while self.peek().kind == TokenKind::Newline {
            self.advance();
        }
    }

    fn trailing_comment(&mut self) -> Option<String> {
        match &self.peek().kind {
            TokenKind::Comment(text) => {
                let text = text.clone();
                self.advance();
                Some(text)
            }
            _ => None,
        }
    }

    /// A field or item ends at a newline, at end of input, or right before
    /// the brace closing its record
    fn end_of_line(&mut self) -> Result<(), Failure> {
        match self.peek().kind {
            TokenKind::Newline => {
                self.advance();
                Ok(())
            }
            TokenKind::Eof | TokenKind::RBrace => Ok(()),
            _ => Err(self.unexpected("end of line")),
        }
    }

    fn document(mut self) -> Result<Document, Failure> {
        let mut items = Vec::new();
        let mut declared: HashMap<String, usize> = HashMap::new();

        loop {
            self.skip_newlines();
            let token = self.peek().clone();
            match &token.kind {
                TokenKind::Eof => break,
                TokenKind::Comment(text) => {
                    items.push(Item::Comment { text: text.clone() });
                    self.advance();
                    self.end_of_line()?;
                }
                TokenKind::RBrace => return Err(self.unexpected("a declaration")),
                TokenKind::Ident(keyword) if keyword == "type" => {
                    self.advance();
                    let name_token = self.peek().clone();
                    let name = match &name_token.kind {
                        TokenKind::Ident(name) if !is_keyword(name) => name.clone(),
                        _ => return Err(self.unexpected("a type name")),
                    };
                    self.advance();

                    if let Some(&first_line) = declared.get(&name) {
                        return Err((
                            ParseErrorKind::DuplicateType { name, first_line },
                            name_token.line,
                            name_token.column,
                        ));
                    }
                    declared.insert(name.clone(), name_token.line);

                    let ty = self.field_type()?;
                    let comment = self.trailing_comment();
                    self.end_of_line()?;
                    items.push(Item::Named { name, ty, comment });
                }
                _ => {
                    let ty = self.field_type()?;
                    let comment = self.trailing_comment();
                    self.end_of_line()?;
                    items.push(Item::Anonymous { ty, comment });
                }
            }
        }

        Ok(Document { items })
    }

    fn field_type(&mut self) -> Result<FieldType, Failure> {
        let token = self.peek().clone();
        match &token.kind {
            TokenKind::LBracket => {
                self.advance();
                self.expect(TokenKind::RBracket, "']'")?;
                Ok(FieldType::array_of(self.field_type()?))
            }
            TokenKind::Ident(name) if name == "struct" => {
                self.advance();
                self.expect(TokenKind::LBrace, "'{'")?;
                let record = self.record_body(token.line)?;
                Ok(FieldType::Record { record })
            }
            TokenKind::Ident(name) if self.next_is_generic() => {
                if name != "Option" {
                    let kind = ParseErrorKind::UnknownGeneric(name.clone());
                    return Err((kind, token.line, token.column));
                }
                self.advance();
                self.expect(TokenKind::LAngle, "'<'")?;
                let inner = self.field_type()?;
                self.expect(TokenKind::RAngle, "'>'")?;
                Ok(FieldType::optional(inner))
            }
            TokenKind::Ident(name) if !is_keyword(name) => {
                self.advance();
                Ok(FieldType::scalar(name)
                    .unwrap_or_else(|| FieldType::Named { name: name.clone() }))
            }
            _ => Err(self.unexpected("a type")),
        }
    }

    fn next_is_generic(&self) -> bool {
        self.tokens
            .get(self.pos + 1)
            .is_some_and(|t| t.kind == TokenKind::LAngle)
    }

    fn record_body(&mut self, opened_line: usize) -> Result<Record, Failure> {
        let mut members = Vec::new();
        let mut seen: HashMap<String, usize> = HashMap::new();

        // A comment may follow the opening brace on the same line
        if let Some(text) = self.trailing_comment() {
            members.push(Member::Comment { text });
        }

        loop {
            self.skip_newlines();
            let token = self.peek().clone();
            match &token.kind {
                TokenKind::RBrace => {
                    self.advance();
                    return Ok(Record { members });
                }
                TokenKind::Eof => {
                    let kind = ParseErrorKind::UnclosedRecord { opened_line };
                    return Err((kind, token.line, token.column));
                }
                TokenKind::Comment(text) => {
                    members.push(Member::Comment { text: text.clone() });
                    self.advance();
                    self.end_of_line()?;
                }
                TokenKind::Ident(name) if !is_keyword(name) => {
                    if !name.starts_with(|c: char| c.is_ascii_uppercase()) {
                        let kind = ParseErrorKind::InvalidFieldName(name.clone());
                        return Err((kind, token.line, token.column));
                    }
                    if let Some(&first_line) = seen.get(name) {
                        return Err((
                            ParseErrorKind::DuplicateField { name: name.clone(), first_line },
                            token.line,
                            token.column,
                        ));
                    }
                    seen.insert(name.clone(), token.line);
                    self.advance();

                    let label = match &self.peek().kind {
                        TokenKind::Str(text) => {
                            let text = text.clone();
                            self.advance();
                            Some(text)
                        }
                        _ => None,
                    };
                    let ty = self.field_type()?;
                    let comment = self.trailing_comment();
                    self.end_of_line()?;
                    members.push(Member::Field(Field {
                        name: name.clone(),
                        label,
                        ty,
                        comment,
                    }));
                }
                _ => return Err(self.unexpected("a field name or '}'")),
            }
        }
    }
}

fn is_keyword(name: &str) -> bool {
    matches!(name, "struct" | "type")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ParsedDecl, ParseError> {
        DeclParser::new().parse(text, None)
    }

    #[test]
    fn parse_anonymous_record() {
        let parsed =
            parse("struct {\n  Version string\n  Ratio Option<f32> // share\n}\n").unwrap();
        assert_eq!(parsed.declaration_count(), 1);

        let Some(Item::Anonymous { ty: FieldType::Record { record }, .. }) =
            parsed.first_declaration()
        else {
            panic!("expected an anonymous record");
        };
        assert_eq!(record.field_names(), vec!["Version", "Ratio"]);

        let ratio = record.find_field("Ratio").unwrap();
        assert_eq!(ratio.ty, FieldType::optional(FieldType::Float { bits: 32 }));
        assert_eq!(ratio.comment.as_deref(), Some("share"));
    }

    #[test]
    fn parse_named_declarations() {
        let parsed = parse(
            "// Thumbnails\ntype Thumbnail struct {\n\tUrl string\n}\n\n\
             type Feed []struct {\n\tThumbs []Thumbnail\n\tPublished Timestamp\n}\n",
        )
        .unwrap();

        assert_eq!(parsed.declaration_count(), 2);
        assert_eq!(parsed.document.items[0], Item::Comment { text: "Thumbnails".into() });

        let feed = parsed.document.find_type("Feed").unwrap();
        let record = feed.record().unwrap();
        assert_eq!(
            record.find_field("Thumbs").unwrap().ty,
            FieldType::array_of(FieldType::Named { name: "Thumbnail".into() })
        );
        assert_eq!(record.find_field("Published").unwrap().ty, FieldType::Timestamp);
    }

    #[test]
    fn nested_record_keeps_closing_comment() {
        let parsed = parse(
            "struct {\n\tSoftware struct {\n\t\tName string\n\t} // build info\n}\n",
        )
        .unwrap();
        let record = parsed.document.items[0].clone();
        let Item::Anonymous { ty, .. } = record else { panic!() };
        let software = ty.record().unwrap().find_field("Software").unwrap();
        assert_eq!(software.comment.as_deref(), Some("build info"));
    }

    #[test]
    fn field_label_tag() {
        let parsed = parse("struct {\n\tURL \"URL\" string\n\tTitle string\n}\n").unwrap();
        let Some(Item::Anonymous { ty, .. }) = parsed.first_declaration() else {
            panic!("expected an anonymous record");
        };
        let record = ty.record().unwrap();

        let url = record.find_field("URL").unwrap();
        assert_eq!(url.label.as_deref(), Some("URL"));
        assert_eq!(url.source_name(), "URL");
        assert_eq!(record.find_field("Title").unwrap().label, None);
    }

    #[test]
    fn quoted_value_is_not_a_type() {
        let err = parse("struct {\n\tKind \"a\" \"b\"\n}\n").unwrap_err();
        assert_eq!(
            err.kind,
            ParseErrorKind::Unexpected {
                expected: "a type".into(),
                found: "\"b\"".into(),
            }
        );
    }

    #[test]
    fn parse_error_has_position() {
        let err = parse("struct {\n\tvalue i64\n}\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::InvalidFieldName("value".into()));
        assert_eq!((err.line, err.column), (2, 2));
    }

    #[test]
    fn stray_character_is_reported() {
        let err = parse("struct {\n\tPage i32?\n}\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnexpectedChar('?'));
        assert_eq!(err.line, 2);
    }

    #[test]
    fn duplicate_field() {
        let err = parse("struct {\n\tA string\n\tA i32\n}\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::DuplicateField { name: "A".into(), first_line: 2 });

        let diag = err.to_diagnostic();
        assert_eq!(diag.code, DiagnosticCode::DeclDuplicateField);
    }

    #[test]
    fn duplicate_type() {
        let err = parse("type A string\ntype A i32\n").unwrap_err();
        assert!(matches!(err.kind, ParseErrorKind::DuplicateType { .. }));
    }

    #[test]
    fn unclosed_record() {
        let err = parse("struct {\n\tA string\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnclosedRecord { opened_line: 1 });
    }

    #[test]
    fn unknown_generic() {
        let err = parse("type M Map<string>\n").unwrap_err();
        assert_eq!(err.kind, ParseErrorKind::UnknownGeneric("Map".into()));
    }

    #[test]
    fn parse_invalid_text_to_diagnostic() {
        let err = DeclParser::new()
            .parse("struct {\n\tA [string\n}\n", Some("feed.txt"))
            .unwrap_err();
        let diag = err.to_diagnostic();

        assert_eq!(diag.code, DiagnosticCode::DeclParseError);
        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.expected.as_deref(), Some("']'"));
        assert_eq!(diag.location.unwrap().file, "feed.txt");
    }
}
