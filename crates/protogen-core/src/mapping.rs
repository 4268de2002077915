//! Host type to schema type mappings.
//!
//! Lookups consult two tables in fixed priority: caller-supplied overrides
//! first, then the built-in defaults. Neither table changes once a
//! [`Transformer`](crate::Transformer) is built.
//!
//! # Default Mappings
//!
//! | Host | Schema |
//! |------|--------|
//! | `bool` | `bool` |
//! | `i8`, `i16`, `i32` | `int32` |
//! | `i64`, `isize` | `int64` |
//! | `u8`, `u16`, `u32`, `char` | `uint32` |
//! | `u64`, `usize` | `uint64` |
//! | `f32` / `f64` | `float` / `double` |
//! | `String` | `string` |
//! | `std::time::Duration` | `google.protobuf.Duration` |
//! | `std::time::SystemTime` | `google.protobuf.Timestamp` |

use crate::error::{CoreError, CoreResult};
use crate::schema::Type;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scalar type names of proto3.
pub const SCALARS: &[&str] = &[
    "double", "float", "int32", "int64", "uint32", "uint64", "sint32", "sint64", "fixed32",
    "fixed64", "sfixed32", "sfixed64", "bool", "string", "bytes",
];

/// Target of a mapping entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtoType {
    /// Schema type name, e.g. `int64` or `google.protobuf.Timestamp`.
    #[serde(default)]
    pub schema_name: String,

    /// Schema file that must be imported to use the type.
    #[serde(default)]
    pub import_path: Option<String>,
}

impl ProtoType {
    /// A scalar that needs no import.
    pub fn scalar(name: &str) -> Self {
        Self {
            schema_name: name.to_string(),
            import_path: None,
        }
    }

    /// A message type defined in `import_path`.
    pub fn message(schema_name: &str, import_path: &str) -> Self {
        Self {
            schema_name: schema_name.to_string(),
            import_path: Some(import_path.to_string()),
        }
    }

    /// Resolve to a schema type. Scalars become [`Type::Basic`], anything
    /// else is a named type split at the last dot.
    pub fn to_type(&self) -> Type {
        if SCALARS.contains(&self.schema_name.as_str()) {
            return Type::basic(&self.schema_name);
        }

        match self.schema_name.rsplit_once('.') {
            Some((package, name)) => Type::named(package, name),
            None => Type::named("", &self.schema_name),
        }
    }

    /// Check that the entry can be used for `key`.
    pub fn validate(&self, key: &str) -> CoreResult<()> {
        let invalid = |reason: &str| CoreError::InvalidMapping {
            key: key.to_string(),
            reason: reason.to_string(),
        };

        if self.schema_name.is_empty() {
            return Err(invalid("schema name is empty"));
        }

        let well_formed = self.schema_name.split('.').all(|segment| {
            segment
                .chars()
                .next()
                .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
                && segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
        });
        if !well_formed {
            return Err(invalid("schema name is not a dotted identifier"));
        }

        if self.import_path.as_deref() == Some("") {
            return Err(invalid("import path is empty"));
        }

        Ok(())
    }
}

/// A table from type identity (see [`ScannedType::identity`](crate::ScannedType::identity))
/// to schema type.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeMappings(BTreeMap<String, ProtoType>);

impl TypeMappings {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in table covering host primitives.
    pub fn defaults() -> &'static TypeMappings {
        &DEFAULT_MAPPINGS
    }

    pub fn insert(&mut self, key: impl Into<String>, ty: ProtoType) -> Option<ProtoType> {
        self.0.insert(key.into(), ty)
    }

    pub fn get(&self, key: &str) -> Option<&ProtoType> {
        self.0.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ProtoType)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Validate every entry, failing on the first malformed one.
    pub fn validate(&self) -> CoreResult<()> {
        self.0.iter().try_for_each(|(key, ty)| {
            if key.is_empty() {
                return Err(CoreError::InvalidMapping {
                    key: key.clone(),
                    reason: "type identity is empty".to_string(),
                });
            }
            ty.validate(key)
        })
    }
}

impl FromIterator<(String, ProtoType)> for TypeMappings {
    fn from_iter<I: IntoIterator<Item = (String, ProtoType)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

static DEFAULT_MAPPINGS: Lazy<TypeMappings> = Lazy::new(|| {
    let scalars = [
        ("bool", "bool"),
        ("i8", "int32"),
        ("i16", "int32"),
        ("i32", "int32"),
        ("i64", "int64"),
        ("isize", "int64"),
        ("u8", "uint32"),
        ("u16", "uint32"),
        ("u32", "uint32"),
        ("char", "uint32"),
        ("u64", "uint64"),
        ("usize", "uint64"),
        ("f32", "float"),
        ("f64", "double"),
        ("String", "string"),
    ];

    let mut mappings: TypeMappings = scalars
        .iter()
        .map(|(host, schema)| (host.to_string(), ProtoType::scalar(schema)))
        .collect();

    mappings.insert(
        "std::time::Duration",
        ProtoType::message("google.protobuf.Duration", "google/protobuf/duration.proto"),
    );
    mappings.insert(
        "std::time::SystemTime",
        ProtoType::message("google.protobuf.Timestamp", "google/protobuf/timestamp.proto"),
    );

    mappings
});

/// Custom mappings layered over the defaults.
#[derive(Debug, Clone)]
pub struct MappingTable {
    custom: TypeMappings,
    defaults: &'static TypeMappings,
}

impl MappingTable {
    /// Validate `custom` and layer it over the built-in defaults.
    pub fn new(custom: TypeMappings) -> CoreResult<Self> {
        custom.validate()?;
        Ok(Self {
            custom,
            defaults: TypeMappings::defaults(),
        })
    }

    /// First hit wins: custom entries shadow defaults.
    pub fn find(&self, key: &str) -> Option<&ProtoType> {
        self.custom.get(key).or_else(|| self.defaults.get(key))
    }

    pub fn custom(&self) -> &TypeMappings {
        &self.custom
    }
}

impl Default for MappingTable {
    fn default() -> Self {
        Self {
            custom: TypeMappings::new(),
            defaults: TypeMappings::defaults(),
        }
    }
}
