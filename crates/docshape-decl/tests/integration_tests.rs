//! Integration tests for declaration parsing, formatting and emission

use docshape_core::{DiagnosticCode, FieldType, Item};
use docshape_decl::{DeclParser, Formatter, RustEmitter};
use pretty_assertions::assert_eq;

const STATS: &str = "// Instance statistics
struct {
\tVersion  string
\tSoftware struct {
\t\tName    string // \"invidious\"
\t\tVersion string
\t\tBranch  string
\t}
\tOpenRegistrations bool
\tUsage             struct {
\t\tUsers struct {
\t\t\tTotal          i64
\t\t\tActiveHalfyear i64
\t\t\tActiveMonth    i64
\t\t}
\t}
\tMetadata struct {
\t\tUpdatedAt              Timestamp
\t\tLastChannelRefreshedAt Option<Timestamp>
\t}
}
";

#[test]
fn parse_format_fixture() {
    let parsed = DeclParser::new().parse(STATS, Some("stats.txt")).unwrap();
    assert_eq!(parsed.declaration_count(), 1);

    let formatted = Formatter::default().format(&parsed.document);
    assert_eq!(formatted, STATS);
}

#[test]
fn formatted_output_parses_to_same_document() {
    let parser = DeclParser::new();
    let parsed = parser.parse(STATS, None).unwrap();
    let formatted = Formatter::new("    ").format(&parsed.document);
    let reparsed = parser.parse(&formatted, None).unwrap();

    assert_eq!(reparsed.document, parsed.document);
}

#[test]
fn emit_fixture_as_rust() {
    let parsed = DeclParser::new().parse(STATS, None).unwrap();
    let out = RustEmitter::default().emit(&parsed.document).unwrap();

    let struct_order: Vec<&str> = out
        .lines()
        .filter_map(|line| line.strip_prefix("pub struct "))
        .map(|rest| rest.trim_end_matches(" {"))
        .collect();
    assert_eq!(
        struct_order,
        vec![
            "Response",
            "ResponseSoftware",
            "ResponseUsage",
            "ResponseUsageUsers",
            "ResponseMetadata",
        ]
    );

    assert!(out.starts_with("use chrono::{DateTime, Utc};\n"));
    assert!(out.contains("// Instance statistics\n"));
    assert!(out.contains(
        "    #[serde(rename = \"activeHalfyear\")]\n    pub active_halfyear: i64,\n"
    ));
    assert!(out.contains("    pub last_channel_refreshed_at: Option<DateTime<Utc>>,\n"));
}

#[test]
fn error_positions_map_to_diagnostics() {
    let err = DeclParser::new()
        .parse("struct {\n\tTitle string\n\tTitle string\n}\n", Some("video.txt"))
        .unwrap_err();

    let diag = err.to_diagnostic();
    assert_eq!(diag.code, DiagnosticCode::DeclDuplicateField);

    let location = diag.location.unwrap();
    assert_eq!(location.file, "video.txt");
    assert_eq!(location.line, Some(3));
    assert_eq!(location.column, Some(2));
}

#[test]
fn named_reference_resolves_in_document() {
    let parsed = DeclParser::new()
        .parse(
            "type Thumbnail struct {\n\tUrl string\n}\n\n\
             type Video struct {\n\tThumbs []Thumbnail\n}\n",
            None,
        )
        .unwrap();

    let video = parsed.document.find_type("Video").unwrap().record().unwrap();
    let FieldType::Array { element } = &video.find_field("Thumbs").unwrap().ty else {
        panic!("expected an array");
    };
    let FieldType::Named { name } = element.as_ref() else {
        panic!("expected a named reference");
    };
    assert!(parsed.document.find_type(name).is_some());
    assert!(matches!(parsed.document.items[0], Item::Named { .. }));
}
