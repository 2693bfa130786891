//! Residue scan over canonical record text
//!
//! After the rewrite passes no input-side spelling should remain. Anything
//! that does is reported as a warning with its line, so an idiom the rule
//! table does not know about is visible instead of silently copied.

use docshape_core::{Diagnostic, DiagnosticCode, Location, Severity};
use regex::Regex;

use crate::rule::RuleError;

/// Which part of a line a residue pattern inspects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    /// Text before any `//`
    Code,

    /// Text after the first `//`
    Comment,
}

#[derive(Debug, Clone)]
struct ResiduePattern {
    scope: Scope,
    regex: Regex,
    notation: &'static str,
}

/// Finds input-side notation left in canonical text
#[derive(Debug, Clone)]
pub struct ResidueScanner {
    patterns: Vec<ResiduePattern>,
    label_tag: Regex,
}

impl ResidueScanner {
    /// Scanner for the notations the standard rules rewrite
    pub fn new() -> Result<Self, RuleError> {
        let table: [(Scope, &'static str, &'static str); 11] = [
            (Scope::Code, r"\bNumber\b", "flexible `Number` type"),
            (Scope::Code, r"\b(?:Int|Float)\d+\b", "width-suffixed numeric type"),
            (Scope::Code, r"\b(?:Boolean|Bool|String)\b", "documentation scalar alias"),
            (Scope::Code, r"\bArray\(", "call-like array type"),
            (Scope::Code, r"\?", "optional marker"),
            (Scope::Code, r#"""#, "quoted label or literal"),
            (Scope::Code, r",\s*$", "trailing comma"),
            (Scope::Comment, r"\bOne or more\b", "bracketed array comment"),
            (Scope::Comment, r"^\s*Integer\s*$", "`Integer` hint"),
            (Scope::Comment, r"\bUnix timestamp\b", "timestamp hint"),
            (Scope::Comment, r"^\s*Constant\s*$", "constant annotation"),
        ];

        let patterns = table
            .into_iter()
            .map(|(scope, pattern, notation)| {
                Regex::new(pattern)
                    .map(|regex| ResiduePattern { scope, regex, notation })
                    .map_err(|source| RuleError::InvalidPattern { rule: "residue", source })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let label_tag = Regex::new(r#"^(\s*\w+) "[^"\n]*""#)
            .map_err(|source| RuleError::InvalidPattern { rule: "residue", source })?;

        Ok(Self { patterns, label_tag })
    }

    /// Scan canonical text, reporting one warning per finding
    pub fn scan(&self, canonical: &str, file: &str) -> Vec<Diagnostic> {
        let mut diagnostics = Vec::new();

        for (index, line) in canonical.lines().enumerate() {
            let (code, comment) = match line.find("//") {
                Some(pos) => (&line[..pos], Some(&line[pos + 2..])),
                None => (line, None),
            };
            // A field's label tag is canonical
            let code = self.label_tag.replace(code, "${1}");

            for pattern in &self.patterns {
                let haystack = match pattern.scope {
                    Scope::Code => Some(&*code),
                    Scope::Comment => comment,
                };
                let Some(haystack) = haystack else {
                    continue;
                };

                if let Some(found) = pattern.regex.find(haystack) {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticCode::ResidualNotation,
                            Severity::Warn,
                            format!("{} survived rewriting: {}", pattern.notation, line.trim()),
                        )
                        .with_comparison("canonical notation", found.as_str().trim())
                        .with_location(Location::with_line(file, index + 1)),
                    );
                }
            }
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::RuleSet;

    #[test]
    fn clean_text_has_no_residue() {
        let scanner = ResidueScanner::new().unwrap();
        let text = "struct {\n\tTitle string // \"shortVideo\"\n\tViews Option<i64>\n}\n";
        assert!(scanner.scan(text, "<stdin>").is_empty());
    }

    #[test]
    fn reports_line_of_residue() {
        let scanner = ResidueScanner::new().unwrap();
        let text = "struct {\n\tCount Number\n\tRatio f32\n\tSize i32 // Unix timestamp\n}\n";
        let found = scanner.scan(text, "feed.txt");

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].location.as_ref().unwrap().line, Some(2));
        assert_eq!(found[1].location.as_ref().unwrap().line, Some(4));
        assert!(found.iter().all(|d| d.severity == Severity::Warn));
        assert!(found[0].message.contains("flexible `Number` type"));
    }

    #[test]
    fn literal_comments_are_not_residue() {
        let scanner = ResidueScanner::new().unwrap();
        assert!(scanner.scan("Kind string // \"String\"", "x").is_empty());
    }

    #[test]
    fn label_tags_are_not_residue() {
        let scanner = ResidueScanner::new().unwrap();
        assert!(scanner.scan("\tID \"ID\" string // \"x\"\n", "x").is_empty());
        assert_eq!(scanner.scan("\tID \"ID\" \"x\"\n", "x").len(), 1);
    }

    #[test]
    fn untranslated_idiom_is_flagged() {
        let rules = RuleSet::standard().unwrap();
        let scanner = ResidueScanner::new().unwrap();

        // A detached marker is not an optional type
        let canonical = rules.apply("\"page\": Int32 ?\n").unwrap().canonical;
        assert_eq!(canonical, "Page i32 ?\n");

        let found = scanner.scan(&canonical, "<stdin>");
        assert_eq!(found.len(), 1);
        assert!(found[0].message.contains("optional marker"));
    }
}
