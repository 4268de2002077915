//! Scanned intermediate representation.
//!
//! The IR is the structural, already-typed description of a host package
//! produced by an external scanner. It is immutable input for one pipeline
//! run: the transformer only ever reads it.
//!
//! # Structure
//!
//! - [`ScannedPackage`]: one module with its structs, enums and functions
//! - [`ScannedStruct`] / [`ScannedField`]: record types and their fields
//! - [`ScannedEnum`]: enumerations with ordered value names
//! - [`ScannedFunction`]: free functions and methods, some marked for exposure
//! - [`ScannedType`]: a closed set of type shapes, see [`TypeKind`]
//!
//! # Serialized Form
//!
//! Scanners hand the IR over as JSON:
//!
//! ```json
//! {
//!   "path": "shop/catalog",
//!   "structs": [{
//!     "name": "Product",
//!     "fields": [
//!       { "name": "Name", "type": { "kind": "basic", "name": "String" } },
//!       { "name": "Tags", "type": { "kind": "basic", "name": "String", "repeated": true } }
//!     ]
//!   }]
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A scanned host package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannedPackage {
    /// Module import path, e.g. `shop/catalog` or `shop::catalog`.
    pub path: String,

    #[serde(default)]
    pub structs: Vec<ScannedStruct>,

    #[serde(default)]
    pub enums: Vec<ScannedEnum>,

    #[serde(default)]
    pub functions: Vec<ScannedFunction>,
}

/// A record type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannedStruct {
    pub name: String,

    #[serde(default)]
    pub docs: Vec<String>,

    #[serde(default)]
    pub fields: Vec<ScannedField>,
}

/// A field of a record type, in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannedField {
    pub name: String,

    #[serde(rename = "type")]
    pub ty: ScannedType,

    #[serde(default)]
    pub docs: Vec<String>,
}

/// An enumeration; values are listed in declaration order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannedEnum {
    pub name: String,

    #[serde(default)]
    pub docs: Vec<String>,

    #[serde(default)]
    pub values: Vec<String>,
}

/// A free function or a method.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannedFunction {
    pub name: String,

    /// Receiver type name for methods, `None` for free functions.
    #[serde(default)]
    pub receiver: Option<String>,

    #[serde(default)]
    pub params: Vec<ScannedType>,

    /// Declared results. A trailing [`TypeKind::Error`] marks a fallible call.
    #[serde(default)]
    pub results: Vec<ScannedType>,

    /// Whether the function is marked for exposure as a remote call.
    #[serde(default)]
    pub exposed: bool,

    /// Key/value pairs attached to the exposure marker, e.g.
    /// `api_path = "/sum"` and `api_method = "get"`.
    #[serde(default)]
    pub annotations: BTreeMap<String, String>,

    #[serde(default)]
    pub docs: Vec<String>,
}

/// A scanned type: a shape plus the repeated flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScannedType {
    #[serde(flatten)]
    pub kind: TypeKind,

    #[serde(default)]
    pub repeated: bool,
}

/// The closed set of type shapes the scanner can produce.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TypeKind {
    /// A primitive, e.g. `i64` or `String`.
    Basic { name: String },

    /// A named type qualified by its module path.
    Named { path: String, name: String },

    /// An associative container.
    Map {
        key: Box<ScannedType>,
        value: Box<ScannedType>,
    },

    /// The error-like outcome of a fallible call.
    Error,

    /// Anything the scanner could not classify.
    Unsupported { description: String },
}

impl ScannedType {
    pub fn basic(name: impl Into<String>) -> Self {
        TypeKind::Basic { name: name.into() }.into()
    }

    pub fn named(path: impl Into<String>, name: impl Into<String>) -> Self {
        TypeKind::Named {
            path: path.into(),
            name: name.into(),
        }
        .into()
    }

    pub fn map(key: ScannedType, value: ScannedType) -> Self {
        TypeKind::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
        .into()
    }

    pub fn error() -> Self {
        TypeKind::Error.into()
    }

    pub fn unsupported(description: impl Into<String>) -> Self {
        TypeKind::Unsupported {
            description: description.into(),
        }
        .into()
    }

    /// Mark this type as a sequence.
    pub fn repeated(mut self) -> Self {
        self.repeated = true;
        self
    }

    /// Key used to look the type up in a mapping table.
    ///
    /// `Basic` types are keyed by their bare name, `Named` types by
    /// `path::Name` (or `Name` when the path is empty). Path segments are
    /// always joined with `::`, whichever separator the scanner used. Other
    /// shapes have no identity.
    pub fn identity(&self) -> Option<String> {
        match &self.kind {
            TypeKind::Basic { name } => Some(name.clone()),
            TypeKind::Named { path, name } => {
                let segments: Vec<&str> = path
                    .split(['/', ':'])
                    .filter(|segment| !segment.is_empty())
                    .collect();
                if segments.is_empty() {
                    Some(name.clone())
                } else {
                    Some(format!("{}::{name}", segments.join("::")))
                }
            }
            TypeKind::Map { .. } | TypeKind::Error | TypeKind::Unsupported { .. } => None,
        }
    }

    /// Whether this is a byte sequence (`Vec<u8>`, `&[u8]`).
    pub fn is_byte_sequence(&self) -> bool {
        self.repeated && matches!(&self.kind, TypeKind::Basic { name } if name == "u8")
    }

    pub fn is_error(&self) -> bool {
        matches!(self.kind, TypeKind::Error)
    }
}

impl From<TypeKind> for ScannedType {
    fn from(kind: TypeKind) -> Self {
        Self {
            kind,
            repeated: false,
        }
    }
}

impl fmt::Display for ScannedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.repeated {
            write!(f, "Vec<")?;
        }
        match &self.kind {
            TypeKind::Basic { .. } | TypeKind::Named { .. } => {
                write!(f, "{}", self.identity().unwrap_or_default())?
            }
            TypeKind::Map { key, value } => write!(f, "HashMap<{key}, {value}>")?,
            TypeKind::Error => write!(f, "error")?,
            TypeKind::Unsupported { description } => write!(f, "{description}")?,
        }
        if self.repeated {
            write!(f, ">")?;
        }
        Ok(())
    }
}

impl ScannedPackage {
    /// Parse a package from its JSON form.
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }
}

impl ScannedFunction {
    /// Whether the last declared result is an error-like outcome.
    pub fn has_error(&self) -> bool {
        self.results.last().is_some_and(ScannedType::is_error)
    }

    /// Declared results without the trailing error outcome.
    pub fn value_results(&self) -> &[ScannedType] {
        if self.has_error() {
            &self.results[..self.results.len() - 1]
        } else {
            &self.results
        }
    }
}
