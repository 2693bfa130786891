//! Lowering declarations to Rust structs with serde derives
//!
//! Anonymous records get names from where they appear: the root takes the
//! configured root name, a nested record `{Parent}{Field}` and an array
//! element `{Parent}{Field}Item`. Structs are emitted parent first.

use docshape_core::{Config, Document, Field, FieldType, Item, Member, Record};
use std::collections::HashSet;

const TIMESTAMP_TYPE: &str = "DateTime<Utc>";

const TIMESTAMP_PLACEMENT: &str =
    "Timestamp is only supported as a field type or an optional field type";

/// Errors produced while lowering declarations
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EmitError {
    /// The declaration has no faithful Rust counterpart
    #[error("cannot emit {path}: {reason}")]
    Unsupported { path: String, reason: String },
}

/// Rust source generator
#[derive(Debug, Clone)]
pub struct RustEmitter {
    root_name: String,
    derives: Vec<String>,
}

impl Default for RustEmitter {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl RustEmitter {
    pub fn new(root_name: impl Into<String>, derives: Vec<String>) -> Self {
        Self {
            root_name: root_name.into(),
            derives,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.root_name.clone(), config.rust.derives.clone())
    }

    /// Emit Rust source for a validated document
    pub fn emit(&self, document: &Document) -> Result<String, EmitError> {
        let mut lowering = Lowering {
            emitter: self,
            blocks: Vec::new(),
            taken: HashSet::new(),
            structs: 0,
            uses_timestamp: false,
        };

        // Declared names win over generated ones
        for item in &document.items {
            if let Item::Named { name, .. } = item {
                lowering.taken.insert(name.clone());
            }
        }

        for item in &document.items {
            match item {
                Item::Comment { text } => lowering.blocks.push(format!("// {}", text)),
                Item::Named { name, ty, comment } => {
                    lowering.declaration(name, ty, comment.as_deref())?
                }
                Item::Anonymous { ty, comment } => {
                    let name = lowering.unique(&self.root_name);
                    lowering.declaration(&name, ty, comment.as_deref())?;
                }
            }
        }

        let mut header = Vec::new();
        if lowering.uses_timestamp {
            header.push("use chrono::{DateTime, Utc};".to_string());
        }
        if lowering.structs > 0 {
            let mut serde: Vec<&str> = self
                .derives
                .iter()
                .map(String::as_str)
                .filter(|d| matches!(*d, "Serialize" | "Deserialize"))
                .collect();
            serde.sort_unstable();
            match serde.as_slice() {
                [] => {}
                [one] => header.push(format!("use serde::{};", one)),
                many => header.push(format!("use serde::{{{}}};", many.join(", "))),
            }
        }

        let mut out = String::new();
        if !header.is_empty() {
            out.push_str(&header.join("\n"));
            out.push_str("\n\n");
        }
        out.push_str(&lowering.blocks.join("\n\n"));
        out.push('\n');

        tracing::debug!(structs = lowering.structs, "emitted rust declarations");
        Ok(out)
    }
}

struct Lowering<'a> {
    emitter: &'a RustEmitter,
    blocks: Vec<String>,
    taken: HashSet<String>,
    structs: usize,
    uses_timestamp: bool,
}

impl Lowering<'_> {
    /// Reserve a type name, adding a numeric suffix on collision
    fn unique(&mut self, base: &str) -> String {
        let mut name = base.to_string();
        let mut n = 2;
        while self.taken.contains(&name) {
            name = format!("{}{}", base, n);
            n += 1;
        }
        self.taken.insert(name.clone());
        name
    }

    fn declaration(
        &mut self,
        name: &str,
        ty: &FieldType,
        comment: Option<&str>,
    ) -> Result<(), EmitError> {
        if let FieldType::Record { record } = ty {
            return self.record(name, record, comment);
        }

        let slot = self.reserve();
        let target = self.lower(ty, name, name)?;
        let mut block = String::new();
        push_doc(&mut block, "", comment);
        block.push_str(&format!("pub type {} = {};", name, target));
        self.blocks[slot] = block;
        Ok(())
    }

    fn reserve(&mut self) -> usize {
        self.blocks.push(String::new());
        self.blocks.len() - 1
    }

    fn record(&mut self, name: &str, record: &Record, doc: Option<&str>) -> Result<(), EmitError> {
        let slot = self.reserve();
        self.structs += 1;

        let mut block = String::new();
        push_doc(&mut block, "", doc);
        if !self.emitter.derives.is_empty() {
            block.push_str(&format!("#[derive({})]\n", self.emitter.derives.join(", ")));
        }
        block.push_str(&format!("pub struct {} {{\n", name));

        let mut idents = HashSet::new();
        for member in &record.members {
            match member {
                Member::Comment { text } => block.push_str(&format!("    // {}\n", text)),
                Member::Field(field) => {
                    let line = self.field(name, field, &mut idents)?;
                    block.push_str(&line);
                }
            }
        }

        block.push('}');
        self.blocks[slot] = block;
        Ok(())
    }

    fn field(
        &mut self,
        parent: &str,
        field: &Field,
        idents: &mut HashSet<String>,
    ) -> Result<String, EmitError> {
        let path = format!("{}.{}", parent, field.name);

        let mut attrs = Vec::new();
        let ident = field_ident(&field.name, idents);
        let source = field.source_name();
        if ident.trim_start_matches("r#") != source {
            attrs.push(format!("rename = \"{}\"", source));
        }

        let ty = match &field.ty {
            FieldType::Timestamp => {
                self.uses_timestamp = true;
                attrs.push("with = \"chrono::serde::ts_seconds\"".to_string());
                TIMESTAMP_TYPE.to_string()
            }
            FieldType::Optional { inner } if **inner == FieldType::Timestamp => {
                self.uses_timestamp = true;
                attrs.push("default".to_string());
                attrs.push("skip_serializing_if = \"Option::is_none\"".to_string());
                attrs.push("with = \"chrono::serde::ts_seconds_option\"".to_string());
                format!("Option<{}>", TIMESTAMP_TYPE)
            }
            ty => {
                if ty.is_optional() {
                    attrs.push("default".to_string());
                    attrs.push("skip_serializing_if = \"Option::is_none\"".to_string());
                }
                self.lower(ty, &format!("{}{}", parent, field.name), &path)?
            }
        };

        let mut line = String::new();
        push_doc(&mut line, "    ", field.comment.as_deref());
        if !attrs.is_empty() {
            line.push_str(&format!("    #[serde({})]\n", attrs.join(", ")));
        }
        line.push_str(&format!("    pub {}: {},\n", ident, ty));
        Ok(line)
    }

    /// Lower a type; `base` names a record found at this position
    fn lower(&mut self, ty: &FieldType, base: &str, path: &str) -> Result<String, EmitError> {
        Ok(match ty {
            FieldType::Bool => "bool".to_string(),
            FieldType::String => "String".to_string(),
            FieldType::Int { .. } | FieldType::Float { .. } => ty.to_string(),
            FieldType::Any => "serde_json::Value".to_string(),
            FieldType::Named { name } => name.clone(),
            FieldType::Timestamp => {
                return Err(EmitError::Unsupported {
                    path: path.to_string(),
                    reason: TIMESTAMP_PLACEMENT.to_string(),
                })
            }
            FieldType::Array { element } => {
                let element = self.lower(element, &format!("{}Item", base), path)?;
                format!("Vec<{}>", element)
            }
            FieldType::Optional { inner } => format!("Option<{}>", self.lower(inner, base, path)?),
            FieldType::Record { record } => {
                let name = self.unique(base);
                self.record(&name, record, None)?;
                name
            }
        })
    }
}

fn push_doc(out: &mut String, indent: &str, doc: Option<&str>) {
    if let Some(text) = doc {
        out.push_str(indent);
        if text.is_empty() {
            out.push_str("///\n");
        } else {
            out.push_str(&format!("/// {}\n", text));
        }
    }
}

/// snake_case field identifier, unique within its struct
fn field_ident(name: &str, taken: &mut HashSet<String>) -> String {
    let snake = snake_case(name);
    let mut ident = snake.clone();
    let mut n = 2;
    while taken.contains(&ident) {
        ident = format!("{}_{}", snake, n);
        n += 1;
    }
    taken.insert(ident.clone());

    match ident.as_str() {
        "self" | "super" | "crate" => format!("{}_", ident),
        kw if is_keyword(kw) => format!("r#{}", ident),
        _ => ident,
    }
}

/// Convert an UpperCamel name to snake_case, keeping acronyms together
/// (`VideoID` becomes `video_id`, `HTTPServer` becomes `http_server`)
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if !c.is_alphanumeric() {
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            continue;
        }

        if c.is_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1);
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next.is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary && !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }

    let out = out.trim_end_matches('_').to_string();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        format!("_{}", out)
    } else {
        out
    }
}

fn is_keyword(ident: &str) -> bool {
    matches!(
        ident,
        "as" | "async" | "await" | "break" | "const" | "continue" | "dyn" | "else" | "enum"
            | "extern" | "false" | "fn" | "for" | "if" | "impl" | "in" | "let" | "loop" | "match"
            | "mod" | "move" | "mut" | "pub" | "ref" | "return" | "static" | "struct" | "trait"
            | "true" | "type" | "unsafe" | "use" | "where" | "while" | "abstract" | "become"
            | "box" | "do" | "final" | "macro" | "override" | "priv" | "try" | "typeof"
            | "unsized" | "virtual" | "yield"
    )
}
