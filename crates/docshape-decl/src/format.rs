//! Canonical formatting of parsed declarations
//!
//! Layout follows the usual record-declaration conventions: one indent unit
//! per nesting level, field names padded to a common column and trailing
//! comments aligned within a section. A section ends after any field whose
//! type spans several lines.

use docshape_core::{Config, Document, Field, FieldType, Item, Member, Record};

/// Pretty-printer for declaration documents
#[derive(Debug, Clone)]
pub struct Formatter {
    indent: String,
}

impl Default for Formatter {
    fn default() -> Self {
        Self::new("\t")
    }
}

impl Formatter {
    /// Create a formatter with the given indent unit
    pub fn new(indent: impl Into<String>) -> Self {
        Self { indent: indent.into() }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.indent_unit())
    }

    /// Format a whole document
    ///
    /// Declarations are separated by one blank line; a comment line stays
    /// attached to the declaration that follows it.
    pub fn format(&self, document: &Document) -> String {
        let mut out = String::new();
        let mut previous_was_declaration = false;

        for item in &document.items {
            if previous_was_declaration {
                out.push('\n');
            }

            match item {
                Item::Comment { text } => {
                    push_comment(&mut out, text);
                    out.push('\n');
                    previous_was_declaration = false;
                }
                Item::Named { name, ty, comment } => {
                    out.push_str("type ");
                    out.push_str(name);
                    out.push(' ');
                    out.push_str(&self.format_type(ty, 0));
                    self.push_trailing(&mut out, comment.as_deref());
                    previous_was_declaration = true;
                }
                Item::Anonymous { ty, comment } => {
                    out.push_str(&self.format_type(ty, 0));
                    self.push_trailing(&mut out, comment.as_deref());
                    previous_was_declaration = true;
                }
            }
        }

        out
    }

    fn push_trailing(&self, out: &mut String, comment: Option<&str>) {
        if let Some(text) = comment {
            out.push(' ');
            push_comment(out, text);
        }
        out.push('\n');
    }

    /// Render a type whose first line starts at the current position and
    /// whose closing brace, if any, sits at `depth`
    pub fn format_type(&self, ty: &FieldType, depth: usize) -> String {
        match ty {
            FieldType::Array { element } => format!("[]{}", self.format_type(element, depth)),
            FieldType::Optional { inner } => format!("Option<{}>", self.format_type(inner, depth)),
            FieldType::Record { record } => {
                let mut out = String::from("struct {\n");
                self.write_record_body(&mut out, record, depth + 1);
                out.push_str(&self.indent.repeat(depth));
                out.push('}');
                out
            }
            other => other.to_string(),
        }
    }

    fn write_record_body(&self, out: &mut String, record: &Record, depth: usize) {
        let indent = self.indent.repeat(depth);

        for section in sections(&record.members) {
            let name_width = section
                .iter()
                .filter_map(field_of)
                .map(|f| name_cell(f).chars().count())
                .max()
                .unwrap_or(0);

            let type_width = section
                .iter()
                .filter_map(field_of)
                .filter(|f| f.comment.is_some() && !f.ty.is_multiline())
                .map(|f| f.ty.to_string().chars().count())
                .max()
                .unwrap_or(0);

            for member in section {
                out.push_str(&indent);
                match member {
                    Member::Comment { text } => push_comment(out, text),
                    Member::Field(field) => {
                        pad(out, &name_cell(field), name_width);
                        out.push(' ');

                        let ty = self.format_type(&field.ty, depth);
                        match &field.comment {
                            Some(text) if !field.ty.is_multiline() => {
                                pad(out, &ty, type_width);
                                out.push(' ');
                                push_comment(out, text);
                            }
                            Some(text) => {
                                out.push_str(&ty);
                                out.push(' ');
                                push_comment(out, text);
                            }
                            None => out.push_str(&ty),
                        }
                    }
                }
                out.push('\n');
            }
        }
    }
}

fn field_of(member: &Member) -> Option<&Field> {
    match member {
        Member::Field(field) => Some(field),
        Member::Comment { .. } => None,
    }
}

/// Field name plus its label tag, if any
fn name_cell(field: &Field) -> String {
    match &field.label {
        Some(label) => format!("{} \"{}\"", field.name, label),
        None => field.name.clone(),
    }
}

/// Split members into alignment sections
fn sections(members: &[Member]) -> Vec<&[Member]> {
    let mut sections = Vec::new();
    let mut start = 0;

    for (i, member) in members.iter().enumerate() {
        if let Member::Field(field) = member {
            if field.ty.is_multiline() {
                sections.push(&members[start..=i]);
                start = i + 1;
            }
        }
    }
    if start < members.len() {
        sections.push(&members[start..]);
    }

    sections
}

fn pad(out: &mut String, text: &str, width: usize) {
    out.push_str(text);
    let len = text.chars().count();
    if len < width {
        out.push_str(&" ".repeat(width - len));
    }
}

fn push_comment(out: &mut String, text: &str) {
    if text.is_empty() {
        out.push_str("//");
    } else {
        out.push_str("// ");
        out.push_str(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::DeclParser;
    use pretty_assertions::assert_eq;

    fn reformat(text: &str) -> String {
        let parsed = DeclParser::new().parse(text, None).unwrap();
        Formatter::default().format(&parsed.document)
    }

    #[test]
    fn aligns_names_and_comments() {
        let input = "struct {\nVersion string\nOpenRegistrations bool // always set\n\
                     Name string // \"invidious\"\n}\n";
        let expected = "struct {\n\
\tVersion           string\n\
\tOpenRegistrations bool   // always set\n\
\tName              string // \"invidious\"\n\
}\n";
        assert_eq!(reformat(input), expected);
    }

    #[test]
    fn multiline_field_ends_section() {
        let input = "struct {\nId string\nSoftware struct {\nName string\nBranch string\n\
                     } // build\nOpenRegistrations bool\n}\n";
        let expected = "struct {\n\
\tId       string\n\
\tSoftware struct {\n\
\t\tName   string\n\
\t\tBranch string\n\
\t} // build\n\
\tOpenRegistrations bool\n\
}\n";
        assert_eq!(reformat(input), expected);
    }

    #[test]
    fn separates_declarations() {
        let input = "// Thumbnail\ntype Thumbnail struct {\nUrl string\n}\n\
                     type Feed []Thumbnail // newest first\n";
        let expected = "// Thumbnail\ntype Thumbnail struct {\n\tUrl string\n}\n\n\
                        type Feed []Thumbnail // newest first\n";
        assert_eq!(reformat(input), expected);
    }

    #[test]
    fn array_of_records_and_member_comments() {
        let input = "struct {\n// paging\nPage Option<i32>\nItems []struct {\nUrl string\n}\n}\n";
        let expected = "struct {\n\
\t// paging\n\
\tPage  Option<i32>\n\
\tItems []struct {\n\
\t\tUrl string\n\
\t}\n\
}\n";
        assert_eq!(reformat(input), expected);
    }

    #[test]
    fn label_tags_align_with_names() {
        let input =
            "struct {\nURL \"URL\" string // home\nTitle string\nVideoCount i32 // all\n}\n";
        let expected = "struct {\n\
\tURL \"URL\"  string // home\n\
\tTitle      string\n\
\tVideoCount i32    // all\n\
}\n";
        assert_eq!(reformat(input), expected);
    }

    #[test]
    fn space_indent_from_config() {
        let config = Config {
            indent_width: Some(2),
            ..Config::default()
        };
        let parsed = DeclParser::new().parse("struct {\nA i32\n}\n", None).unwrap();
        assert_eq!(
            Formatter::from_config(&config).format(&parsed.document),
            "struct {\n  A i32\n}\n"
        );
    }

    #[test]
    fn formatting_is_idempotent() {
        let input = "type Video struct {\n// main\nTitle string // \"x\"\n\
                     VideoThumbnails []struct {\nUrl string\nWidth i32 // px\n}\n\
                     Published Option<Timestamp>\n}\nstruct {\nItems []any\n}\n";
        let once = reformat(input);
        assert_eq!(reformat(&once), once);
    }
}
