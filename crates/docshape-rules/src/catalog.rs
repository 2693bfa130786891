//! The standard rule table
//!
//! Order matters: every stage relies on what the stages before it have
//! already normalized. Numeric comments are dropped before `Number` is
//! collapsed, arrays are unified before optional markers are read, and
//! quoted literals are typed before quoted labels become identifiers.
//!
//! Type rules anchor on the colon ending a label. `(:"? )` accepts both
//! `"name": T` and `"name:" T`, and the rewrite keeps whichever form it saw
//! for the label rules to consume.

use docshape_core::schema::label_from_identifier;

use crate::rule::{BracketKind, RewriteRule, RuleError, SpanViolation, Stage};

/// Build the standard rules in pipeline order
pub fn standard_rules() -> Result<Vec<RewriteRule>, RuleError> {
    Ok(vec![
        // 1. Scalar aliases and punctuation
        RewriteRule::literal(
            Stage::ScalarAlias,
            "line-endings",
            "\r\n",
            "\n",
            "CRLF line endings become LF",
        )?,
        RewriteRule::template(
            Stage::ScalarAlias,
            "boolean-alias",
            r"\bBoolean\b",
            "bool",
            "`Boolean` becomes `bool`",
        )?
        .code_only(),
        RewriteRule::template(
            Stage::ScalarAlias,
            "bool-alias",
            r"\bBool\b",
            "bool",
            "`Bool` becomes `bool`",
        )?
        .code_only(),
        RewriteRule::template(
            Stage::ScalarAlias,
            "string-alias",
            r"\bString\b",
            "string",
            "`String` becomes `string`",
        )?
        .code_only(),
        RewriteRule::literal(
            Stage::ScalarAlias,
            "record-open",
            "{",
            "struct {",
            "object braces open a record",
        )?
        .code_only(),
        RewriteRule::template(
            Stage::ScalarAlias,
            "trailing-comma",
            r"(?m),([ \t]*(?://[^\n]*)?)$",
            "${1}",
            "commas ending a line are dropped",
        )?,
        // 2. Array notations
        RewriteRule::template(
            Stage::ArrayForm,
            "one-or-more",
            r#"(:"? )\[\s*// One or more (\w+)\s*\]"#,
            "${1}[]${2}",
            "`[ // One or more T ]` becomes `[]T`",
        )?,
        RewriteRule::template(
            Stage::ArrayForm,
            "suffix-array",
            r#"(:"? )(\w+)\[\]"#,
            "${1}[]${2}",
            "`T[]` becomes `[]T`",
        )?,
        RewriteRule::template(
            Stage::ArrayForm,
            "array-call",
            r"\bArray\((\w+)\)",
            "[]${1}",
            "`Array(T)` becomes `[]T`",
        )?
        .code_only(),
        RewriteRule::computed(
            Stage::ArrayForm,
            "bracket-sweep",
            r"\[\s*|\]",
            sweep_bracket,
            "remaining `[` becomes the array prefix, `]` is dropped",
        )?
        .code_only(),
        // 3. Width-suffixed numerics
        RewriteRule::template(
            Stage::NumericWidth,
            "int-width",
            r"\bInt(\d+)\b",
            "i${1}",
            "`IntN` becomes `iN`",
        )?
        .code_only(),
        RewriteRule::template(
            Stage::NumericWidth,
            "float-width",
            r"\bFloat(\d+)\b",
            "f${1}",
            "`FloatN` becomes `fN`",
        )?
        .code_only(),
        // 4. Flexible numbers
        RewriteRule::template(
            Stage::AmbiguousNumeric,
            "number-integer-comment",
            r#"(:"? )Number // Integer"#,
            "${1}Number",
            "the `// Integer` hint on `Number` is dropped",
        )?,
        RewriteRule::template(
            Stage::AmbiguousNumeric,
            "number-collapse",
            r"\bNumber\b",
            "i64",
            "`Number` becomes `i64`",
        )?
        .code_only(),
        // 5. Timestamps
        RewriteRule::template(
            Stage::Temporal,
            "unix-timestamp",
            r#"(:"? )i64(\??) // Unix timestamp"#,
            "${1}Timestamp${2}",
            "`i64 // Unix timestamp` becomes `Timestamp`",
        )?,
        // 6. Optional fields
        RewriteRule::template(
            Stage::Optionality,
            "optional-marker",
            r#"(:"? )((?:\[\])*\w+)\?"#,
            "${1}Option<${2}>",
            "`T?` becomes `Option<T>`",
        )?,
        RewriteRule::document(
            Stage::Optionality,
            "optional-record",
            r"\}\?",
            |text| Ok(wrap_optional_records(text)),
            "`{ ... }?` becomes `Option<struct { ... }>`",
        )?,
        // 7. Literal values
        RewriteRule::template(
            Stage::Literal,
            "string-literal",
            r#"(:"? )"([^"\n]*)"(?: // Constant)?"#,
            r#"${1}string // "${2}""#,
            "quoted values become `string`, keeping the literal as a comment",
        )?,
        RewriteRule::template(
            Stage::Literal,
            "float-literal",
            r#"(:"? )(-?\d+\.\d+)\b"#,
            "${1}f64 // ${2}",
            "decimal values become `f64`, keeping the literal as a comment",
        )?,
        RewriteRule::template(
            Stage::Literal,
            "integer-literal",
            r#"(:"? )(-?\d+)\b"#,
            "${1}i64 // ${2}",
            "integer values become `i64`, keeping the literal as a comment",
        )?,
        RewriteRule::template(
            Stage::Literal,
            "boolean-literal",
            r#"(:"? )(true|false)\b"#,
            "${1}bool // ${2}",
            "boolean values become `bool`, keeping the literal as a comment",
        )?,
        // 8. Empty arrays
        RewriteRule::template(
            Stage::EmptyCollection,
            "empty-array",
            r#"(?m)(:"? )\[\][ \t]*(?://[^\n]*)?$"#,
            "${1}[]any",
            "`[]` with no element type becomes `[]any`",
        )?,
        // 9. Null
        RewriteRule::template(
            Stage::NullLiteral,
            "null-literal",
            r#"(:"? )null\b"#,
            "${1}any",
            "`null` becomes `any`",
        )?,
        // 10. Field labels
        RewriteRule::computed(
            Stage::FieldIdentifier,
            "quoted-label",
            r#""[^"\n]+":"#,
            |span| capitalize_label(span, 1, 2),
            "`\"name\":` becomes `Name`",
        )?,
        RewriteRule::computed(
            Stage::FieldIdentifier,
            "typo-label",
            r#""[^"\n]+:""#,
            |span| capitalize_label(span, 1, 2),
            "`\"name:\"` becomes `Name`",
        )?,
        // 11. Blank lines
        RewriteRule::template(
            Stage::Whitespace,
            "blank-lines",
            r"\n?\s*\n",
            "\n",
            "blank lines and trailing spaces collapse",
        )?,
    ])
}

fn sweep_bracket(span: &str) -> Result<String, SpanViolation> {
    Ok(BracketKind::classify(span)?.replacement().to_string())
}

/// Trim delimiter characters off a label span and uppercase its first
/// character
///
/// When lowering that character again would not give back the label, the
/// label follows the identifier as a quoted tag (`"ID":` becomes `ID "ID"`).
pub fn capitalize_label(
    span: &str,
    leading: usize,
    trailing: usize,
) -> Result<String, SpanViolation> {
    let chars: Vec<char> = span.chars().collect();
    if chars.len() <= leading + trailing {
        return Err(SpanViolation(format!(
            "label span {:?} is shorter than its delimiters",
            span
        )));
    }

    let label: String = chars[leading..chars.len() - trailing].iter().collect();
    let mut rest = label.chars();
    let mut ident = String::with_capacity(span.len());
    if let Some(first) = rest.next() {
        ident.extend(first.to_uppercase());
    }
    ident.extend(rest);

    if label_from_identifier(&ident) == label {
        Ok(ident)
    } else {
        Ok(format!("{} \"{}\"", ident, label))
    }
}

/// Wrap every record closed by `}?` in `Option<...>`
///
/// Braces are matched on the code part of each line. A `}?` whose opening
/// brace is not a `struct {` is left alone for validation to report.
fn wrap_optional_records(text: &str) -> String {
    const OPEN: &str = "struct {";

    // (byte offset, replacement, bytes replaced)
    let mut edits: Vec<(usize, &str, usize)> = Vec::new();
    let mut open = Vec::new();
    let mut in_comment = false;
    let mut prev = '\0';

    for (pos, ch) in text.char_indices() {
        match ch {
            '\n' => in_comment = false,
            '/' if prev == '/' => in_comment = true,
            '{' if !in_comment => open.push(pos),
            '}' if !in_comment => {
                let Some(brace) = open.pop() else {
                    prev = ch;
                    continue;
                };
                let record_start = (brace + 1).checked_sub(OPEN.len());
                let opens_record = record_start
                    .and_then(|start| text.get(start..))
                    .is_some_and(|rest| rest.starts_with(OPEN));
                if let (Some(start), true) = (record_start, opens_record) {
                    if text[pos + 1..].starts_with('?') {
                        edits.push((start, "Option<", 0));
                        edits.push((pos, "}>", 2));
                    }
                }
            }
            _ => {}
        }
        prev = ch;
    }

    edits.sort_unstable_by_key(|(pos, _, _)| *pos);

    let mut out = String::with_capacity(text.len() + edits.len() * 4);
    let mut last = 0;
    for (pos, replacement, replaced) in edits {
        out.push_str(&text[last..pos]);
        out.push_str(replacement);
        last = pos + replaced;
    }
    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn rule(name: &str) -> RewriteRule {
        standard_rules()
            .unwrap()
            .into_iter()
            .find(|r| r.name() == name)
            .unwrap()
    }

    #[test]
    fn rule_names_are_unique() {
        let rules = standard_rules().unwrap();
        let names: HashSet<_> = rules.iter().map(|r| r.name()).collect();
        assert_eq!(names.len(), rules.len());
    }

    #[test]
    fn stages_are_in_pipeline_order() {
        let rules = standard_rules().unwrap();
        assert!(rules.windows(2).all(|w| w[0].stage() <= w[1].stage()));
    }

    #[test]
    fn capitalize_both_label_forms() {
        assert_eq!(capitalize_label("\"authorId\":", 1, 2).unwrap(), "AuthorId");
        assert_eq!(capitalize_label("\"authorId:\"", 1, 2).unwrap(), "AuthorId");
        assert_eq!(capitalize_label("\"évent\":", 1, 2).unwrap(), "Évent");
        assert!(capitalize_label("\":", 1, 2).is_err());
    }

    #[test]
    fn uppercase_labels_keep_a_tag() {
        assert_eq!(capitalize_label("\"ID\":", 1, 2).unwrap(), "ID \"ID\"");
        assert_eq!(capitalize_label("\"URL:\"", 1, 2).unwrap(), "URL \"URL\"");
        assert_eq!(capitalize_label("\"Title\":", 1, 2).unwrap(), "Title \"Title\"");
    }

    #[test]
    fn type_rules_accept_typo_labels() {
        let rules = standard_rules().unwrap();
        let mut text = "\"published:\" i64 // Unix timestamp\n\
                        \"page:\" i32?\n\
                        \"kind:\" \"video\"\n\
                        \"extra:\" null\n"
            .to_string();
        for name in ["unix-timestamp", "optional-marker", "string-literal", "null-literal"] {
            let rule = rules.iter().find(|r| r.name() == name).unwrap();
            text = rule.apply(&text).unwrap();
        }
        assert_eq!(
            text,
            "\"published:\" Timestamp\n\
             \"page:\" Option<i32>\n\
             \"kind:\" string // \"video\"\n\
             \"extra:\" any\n"
        );
    }

    #[test]
    fn comment_prose_is_not_rewritten() {
        let out = rule("number-collapse")
            .apply("\"subCount\": i32 // Number of subscribers\n\"n\": Number\n")
            .unwrap();
        assert_eq!(out, "\"subCount\": i32 // Number of subscribers\n\"n\": i64\n");

        let out = rule("record-open").apply("\"a\": { // see {docs}\n").unwrap();
        assert_eq!(out, "\"a\": struct { // see {docs}\n");

        let out = rule("bracket-sweep").apply("\"ids\": i64 // a list [sorted]\n").unwrap();
        assert_eq!(out, "\"ids\": i64 // a list [sorted]\n");
    }

    #[test]
    fn optional_records_are_wrapped() {
        let out = wrap_optional_records(
            concat!(
                "\"replies\": struct {\n",
                "  \"count\": i32\n",
                "  \"meta\": struct {\n",
                "  }?\n",
                "}?\n",
                "\"b\": struct {\n}\n",
            ),
        );
        assert_eq!(
            out,
            concat!(
                "\"replies\": Option<struct {\n",
                "  \"count\": i32\n",
                "  \"meta\": Option<struct {\n",
                "  }>\n",
                "}>\n",
                "\"b\": struct {\n}\n",
            )
        );
    }

    #[test]
    fn unmatched_optional_brace_is_left_alone() {
        assert_eq!(wrap_optional_records("}?\n"), "}?\n");
        assert_eq!(wrap_optional_records("map {\n}?\n"), "map {\n}?\n");
        assert_eq!(wrap_optional_records("// {\n"), "// {\n");
    }

    #[test]
    fn trailing_comma_keeps_comment() {
        let out = rule("trailing-comma")
            .apply("\"a\": String, // one, two\n\"b\": Int32,\n")
            .unwrap();
        assert_eq!(out, "\"a\": String // one, two\n\"b\": Int32\n");
    }

    #[test]
    fn bracket_sweep_opens_and_closes() {
        let out = rule("bracket-sweep")
            .apply("\"items\": [\n    struct {\n    }\n  ]")
            .unwrap();
        assert_eq!(out, "\"items\": []struct {\n    }\n  ");
    }

    #[test]
    fn bracket_sweep_keeps_prefix_arrays() {
        assert_eq!(rule("bracket-sweep").apply(": []string").unwrap(), ": []string");
    }

    #[test]
    fn timestamp_keeps_optional_marker() {
        let out = rule("unix-timestamp")
            .apply(": i64? // Unix timestamp\n: i64 // Unix timestamp")
            .unwrap();
        assert_eq!(out, ": Timestamp?\n: Timestamp");
    }

    #[test]
    fn optional_wraps_array_types() {
        assert_eq!(
            rule("optional-marker").apply("\"a\": []Thumbnail?").unwrap(),
            "\"a\": Option<[]Thumbnail>"
        );
    }

    #[test]
    fn literal_rules_keep_value() {
        assert_eq!(
            rule("string-literal").apply("\"status\": \"active\" // Constant").unwrap(),
            "\"status\": string // \"active\""
        );
        assert_eq!(rule("integer-literal").apply("\"n\": -3").unwrap(), "\"n\": i64 // -3");
        assert_eq!(rule("float-literal").apply("\"r\": 0.5").unwrap(), "\"r\": f64 // 0.5");
        assert_eq!(rule("boolean-literal").apply("\"x\": false").unwrap(), "\"x\": bool // false");
        assert_eq!(rule("boolean-literal").apply("\"x\": trueish").unwrap(), "\"x\": trueish");
    }

    #[test]
    fn blank_lines_collapse() {
        assert_eq!(rule("blank-lines").apply("a  \n\n\n  b\n").unwrap(), "a\n  b\n");
    }
}
