//! Declaration model and canonical type system
//!
//! This is the parsed form of canonical record text. Every type spelling
//! the rewrite passes produce maps to exactly one variant here.

use serde::{Deserialize, Serialize};

/// Canonical field type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum FieldType {
    /// Boolean type
    Bool,

    /// String type
    String,

    /// Fixed-width integer
    Int {
        bits: u8,
        signed: bool,
    },

    /// Fixed-width float
    Float {
        bits: u8,
    },

    /// Instant encoded as Unix seconds
    Timestamp,

    /// Untyped value
    Any,

    /// Array type (`[]T`)
    Array {
        element: Box<FieldType>,
    },

    /// Optional container (`Option<T>`): absent is distinct from present
    Optional {
        inner: Box<FieldType>,
    },

    /// Inline record (`struct { ... }`)
    Record {
        record: Record,
    },

    /// Reference to a type declared elsewhere
    Named {
        name: String,
    },
}

impl FieldType {
    /// The canonical wide integer (`i64`)
    pub fn wide_int() -> Self {
        Self::Int { bits: 64, signed: true }
    }

    /// Resolve a scalar spelling (`bool`, `i32`, `Timestamp`, ...)
    ///
    /// Returns `None` for identifiers that are not canonical scalars; the
    /// parser treats those as named references.
    pub fn scalar(name: &str) -> Option<Self> {
        match name {
            "bool" => Some(Self::Bool),
            "string" => Some(Self::String),
            "Timestamp" => Some(Self::Timestamp),
            "any" => Some(Self::Any),
            "i8" | "i16" | "i32" | "i64" => Some(Self::Int {
                bits: name[1..].parse().ok()?,
                signed: true,
            }),
            "u8" | "u16" | "u32" | "u64" => Some(Self::Int {
                bits: name[1..].parse().ok()?,
                signed: false,
            }),
            "f32" | "f64" => Some(Self::Float {
                bits: name[1..].parse().ok()?,
            }),
            _ => None,
        }
    }

    /// Wrap in an array
    pub fn array_of(element: FieldType) -> Self {
        Self::Array { element: Box::new(element) }
    }

    /// Wrap in the optional container
    pub fn optional(inner: FieldType) -> Self {
        Self::Optional { inner: Box::new(inner) }
    }

    /// Whether this type is the optional container
    pub fn is_optional(&self) -> bool {
        matches!(self, Self::Optional { .. })
    }

    /// Whether printing this type takes more than one line
    pub fn is_multiline(&self) -> bool {
        match self {
            Self::Record { .. } => true,
            Self::Array { element } => element.is_multiline(),
            Self::Optional { inner } => inner.is_multiline(),
            _ => false,
        }
    }

    /// The innermost record, if this type is a record behind any number
    /// of array and optional wrappers
    pub fn record(&self) -> Option<&Record> {
        match self {
            Self::Record { record } => Some(record),
            Self::Array { element } => element.record(),
            Self::Optional { inner } => inner.record(),
            _ => None,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool => write!(f, "bool"),
            Self::String => write!(f, "string"),
            Self::Int { bits, signed: true } => write!(f, "i{}", bits),
            Self::Int { bits, signed: false } => write!(f, "u{}", bits),
            Self::Float { bits } => write!(f, "f{}", bits),
            Self::Timestamp => write!(f, "Timestamp"),
            Self::Any => write!(f, "any"),
            Self::Array { element } => write!(f, "[]{}", element),
            Self::Optional { inner } => write!(f, "Option<{}>", inner),
            Self::Record { record } => write!(f, "struct {{ {} fields }}", record.fields().count()),
            Self::Named { name } => write!(f, "{}", name),
        }
    }
}

/// A field of a record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Declaration-safe identifier (`AuthorId`)
    pub name: String,

    /// Documentation label, present when it is not the identifier with
    /// its first character lowered (`"ID"` for `ID`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,

    /// Field type
    pub ty: FieldType,

    /// Trailing comment text without the `//` marker
    pub comment: Option<String>,
}

impl Field {
    /// Create a new field without a label or comment
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            label: None,
            ty,
            comment: None,
        }
    }

    /// Name of the field in the documented payload
    pub fn source_name(&self) -> String {
        match &self.label {
            Some(label) => label.clone(),
            None => label_from_identifier(&self.name),
        }
    }
}

/// Label implied by an identifier: the identifier with its first
/// character lowered
pub fn label_from_identifier(ident: &str) -> String {
    let mut chars = ident.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// A record body entry, in document order
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "member", rename_all = "lowercase")]
pub enum Member {
    /// A typed field
    Field(Field),

    /// A comment on its own line
    Comment { text: String },
}

/// An ordered record shape
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Record {
    /// Members in document order
    pub members: Vec<Member>,
}

impl Record {
    /// Create a record from fields
    pub fn from_fields(fields: Vec<Field>) -> Self {
        Self {
            members: fields.into_iter().map(Member::Field).collect(),
        }
    }

    /// Iterate over fields, skipping comment lines
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.members.iter().filter_map(|m| match m {
            Member::Field(field) => Some(field),
            Member::Comment { .. } => None,
        })
    }

    /// Find a field by name
    pub fn find_field(&self, name: &str) -> Option<&Field> {
        self.fields().find(|f| f.name == name)
    }

    /// Get field names
    pub fn field_names(&self) -> Vec<&str> {
        self.fields().map(|f| f.name.as_str()).collect()
    }
}

/// A top-level entry of a declaration document
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "item", rename_all = "lowercase")]
pub enum Item {
    /// `type Name <type>`
    Named {
        name: String,
        ty: FieldType,
        comment: Option<String>,
    },

    /// A bare shape, as produced from an unnamed documentation snippet
    Anonymous {
        ty: FieldType,
        comment: Option<String>,
    },

    /// A comment on its own line
    Comment { text: String },
}

/// A parsed declaration document
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Document {
    /// Items in document order
    pub items: Vec<Item>,
}

impl Document {
    /// Find a named declaration
    pub fn find_type(&self, name: &str) -> Option<&FieldType> {
        self.items.iter().find_map(|item| match item {
            Item::Named { name: n, ty, .. } if n == name => Some(ty),
            _ => None,
        })
    }

    /// Number of type-bearing items
    pub fn declaration_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| !matches!(item, Item::Comment { .. }))
            .count()
    }
}
