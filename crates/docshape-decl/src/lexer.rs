//! Tokenizer for canonical record text
//!
//! Newlines are significant: they terminate fields and items.

/// Token kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// Identifier or keyword (`struct`, `type`, `Option`)
    Ident(String),

    /// Quoted text on one line, quotes removed
    Str(String),

    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LAngle,
    RAngle,

    /// Line comment, text after `//` trimmed
    Comment(String),

    Newline,
    Eof,
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "'{}'", name),
            Self::Str(text) => write!(f, "{:?}", text),
            Self::LBrace => write!(f, "'{{'"),
            Self::RBrace => write!(f, "'}}'"),
            Self::LBracket => write!(f, "'['"),
            Self::RBracket => write!(f, "']'"),
            Self::LAngle => write!(f, "'<'"),
            Self::RAngle => write!(f, "'>'"),
            Self::Comment(_) => write!(f, "comment"),
            Self::Newline => write!(f, "end of line"),
            Self::Eof => write!(f, "end of input"),
        }
    }
}

/// A token with its 1-based position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub line: usize,
    pub column: usize,
}

/// A character the grammar has no use for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LexError {
    pub ch: char,
    pub line: usize,
    pub column: usize,
}

/// Character-level scanner
pub struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Tokenize the whole input; the last token is always `Eof`
    pub fn tokenize(mut self) -> Result<Vec<Token>, LexError> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        while let Some(&ch) = self.chars.peek() {
            if ch == '\n' || !ch.is_whitespace() {
                break;
            }
            self.bump();
        }

        let (line, column) = (self.line, self.column);
        let token = |kind| Token { kind, line, column };

        let Some(ch) = self.bump() else {
            return Ok(token(TokenKind::Eof));
        };

        let kind = match ch {
            '\n' => TokenKind::Newline,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '<' => TokenKind::LAngle,
            '>' => TokenKind::RAngle,
            '/' if self.chars.peek() == Some(&'/') => {
                self.bump();
                let mut text = String::new();
                while let Some(&next) = self.chars.peek() {
                    if next == '\n' {
                        break;
                    }
                    text.push(next);
                    self.bump();
                }
                TokenKind::Comment(text.trim().to_string())
            }
            '"' => {
                let mut text = String::new();
                loop {
                    match self.chars.peek() {
                        Some(&'"') => {
                            self.bump();
                            break;
                        }
                        Some(&next) if next != '\n' => {
                            text.push(next);
                            self.bump();
                        }
                        _ => return Err(LexError { ch: '"', line, column }),
                    }
                }
                TokenKind::Str(text)
            }
            c if c.is_alphabetic() || c == '_' => {
                let mut name = String::from(c);
                while let Some(&next) = self.chars.peek() {
                    if !(next.is_alphanumeric() || next == '_') {
                        break;
                    }
                    name.push(next);
                    self.bump();
                }
                TokenKind::Ident(name)
            }
            other => return Err(LexError { ch: other, line, column }),
        };

        Ok(token(kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<TokenKind> {
        Lexer::new(text)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn tokenizes_field_line() {
        assert_eq!(
            kinds("Items []Option<i32> // \"x\"\n"),
            vec![
                TokenKind::Ident("Items".into()),
                TokenKind::LBracket,
                TokenKind::RBracket,
                TokenKind::Ident("Option".into()),
                TokenKind::LAngle,
                TokenKind::Ident("i32".into()),
                TokenKind::RAngle,
                TokenKind::Comment("\"x\"".into()),
                TokenKind::Newline,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn tracks_positions() {
        let tokens = Lexer::new("struct {\n\tName string\n}").tokenize().unwrap();
        let name = tokens.iter().find(|t| t.kind == TokenKind::Ident("Name".into())).unwrap();
        assert_eq!((name.line, name.column), (2, 2));
    }

    #[test]
    fn quoted_text() {
        assert_eq!(
            kinds("ID \"ID\" string"),
            vec![
                TokenKind::Ident("ID".into()),
                TokenKind::Str("ID".into()),
                TokenKind::Ident("string".into()),
                TokenKind::Eof,
            ]
        );

        let err = Lexer::new("A \"open\nB").tokenize().unwrap_err();
        assert_eq!(err, LexError { ch: '"', line: 1, column: 3 });
    }

    #[test]
    fn rejects_stray_punctuation() {
        let err = Lexer::new("value: i64").tokenize().unwrap_err();
        assert_eq!(err, LexError { ch: ':', line: 1, column: 6 });
    }
}
