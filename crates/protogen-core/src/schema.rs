//! Protobuf schema model.
//!
//! The entity graph produced by the transformer and consumed by the schema
//! serializer and the service generator:
//!
//! ```text
//! Package
//!  ├─ imports (deduplicated by path)
//!  ├─ Message ─ Field*  (+ reserved positions)
//!  ├─ Enum ─ EnumValue*
//!  └─ Rpc (input/output: generated wrapper or external type)
//! ```
//!
//! Field positions are handed out by [`MessageBuilder`] only: they start at
//! 1, follow declaration order and are never reused, including positions
//! reserved for dropped fields.

use crate::naming::{capitalize, to_lower_snake_case, to_upper_snake_case};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Entity options, keyed by option name.
pub type Options = BTreeMap<String, OptionValue>;

/// The value of a schema option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// Rendered quoted, e.g. `"/v1/items"`.
    Str(String),
    /// Rendered verbatim, e.g. `true` or `ENUM_CONSTANT`.
    Literal(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Str(s) => write!(f, "{s:?}"),
            OptionValue::Literal(s) => write!(f, "{s}"),
        }
    }
}

/// Schema entities that carry options and documentation.
pub trait Annotated {
    fn options(&self) -> &Options;
    fn options_mut(&mut self) -> &mut Options;
    fn docs_mut(&mut self) -> &mut Vec<String>;
}

/// A resolved schema type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Type {
    /// A scalar such as `int64`, `string` or `bytes`.
    Basic(String),
    /// A message or enum, qualified by its schema package.
    Named { package: String, name: String },
    /// `map<key, value>`.
    Map { key: Box<Type>, value: Box<Type> },
}

impl Type {
    pub fn basic(name: impl Into<String>) -> Self {
        Type::Basic(name.into())
    }

    pub fn named(package: impl Into<String>, name: impl Into<String>) -> Self {
        Type::Named {
            package: package.into(),
            name: name.into(),
        }
    }

    pub fn map(key: Type, value: Type) -> Self {
        Type::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Type::Named { .. })
    }

    /// Name as written from inside `package`: local names stay unqualified.
    pub fn name_in(&self, package: &str) -> String {
        match self {
            Type::Basic(name) => name.clone(),
            Type::Named { package: pkg, name } if pkg.is_empty() || pkg == package => {
                name.clone()
            }
            Type::Named { package: pkg, name } => format!("{pkg}.{name}"),
            Type::Map { key, value } => {
                format!("map<{}, {}>", key.name_in(package), value.name_in(package))
            }
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name_in(""))
    }
}

/// A message field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    name: String,
    pos: u32,
    ty: Type,
    repeated: bool,
    docs: Vec<String>,
    options: Options,
}

impl Field {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 1-based wire position, unique within the message.
    pub fn pos(&self) -> u32 {
        self.pos
    }

    pub fn ty(&self) -> &Type {
        &self.ty
    }

    pub fn is_repeated(&self) -> bool {
        self.repeated
    }

    pub fn docs(&self) -> &[String] {
        &self.docs
    }
}

/// A message: ordered fields plus reserved positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    name: String,
    docs: Vec<String>,
    fields: Vec<Field>,
    reserved: BTreeSet<u32>,
    generated: bool,
    options: Options,
}

impl Message {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn docs(&self) -> &[String] {
        &self.docs
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn reserved(&self) -> &BTreeSet<u32> {
        &self.reserved
    }

    /// Whether the message only wraps the arguments or results of a call.
    pub fn is_generated(&self) -> bool {
        self.generated
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Builds a [`Message`], assigning positions in declaration order.
#[derive(Debug)]
pub struct MessageBuilder {
    message: Message,
    next_pos: u32,
}

impl MessageBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            message: Message {
                name: name.into(),
                docs: Vec::new(),
                fields: Vec::new(),
                reserved: BTreeSet::new(),
                generated: false,
                options: Options::new(),
            },
            next_pos: 1,
        }
    }

    pub fn docs(mut self, docs: Vec<String>) -> Self {
        self.message.docs = docs;
        self
    }

    /// Mark the message as a synthesized call wrapper.
    pub fn generated(mut self) -> Self {
        self.message.generated = true;
        self
    }

    /// Append a field at the next position. The name is lower-snake-cased.
    pub fn add_field(
        &mut self,
        name: &str,
        ty: Type,
        repeated: bool,
        docs: Vec<String>,
    ) -> &mut Field {
        let pos = self.take_pos();
        let index = self.message.fields.len();
        self.message.fields.push(Field {
            name: to_lower_snake_case(name),
            pos,
            ty,
            repeated,
            docs,
            options: Options::new(),
        });
        &mut self.message.fields[index]
    }

    /// Skip the next position and record it as reserved.
    pub fn reserve_next(&mut self) -> u32 {
        let pos = self.take_pos();
        self.message.reserved.insert(pos);
        pos
    }

    /// Fields added so far.
    pub fn fields(&self) -> &[Field] {
        &self.message.fields
    }

    pub fn name(&self) -> &str {
        &self.message.name
    }

    pub fn build(self) -> Message {
        self.message
    }

    fn take_pos(&mut self) -> u32 {
        let pos = self.next_pos;
        self.next_pos += 1;
        pos
    }
}

/// An enum value; values are numbered from 0 in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumValue {
    name: String,
    value: u32,
    docs: Vec<String>,
    options: Options,
}

impl EnumValue {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn docs(&self) -> &[String] {
        &self.docs
    }
}

/// An enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Enum {
    name: String,
    docs: Vec<String>,
    values: Vec<EnumValue>,
    options: Options,
}

impl Enum {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn docs(&self) -> &[String] {
        &self.docs
    }

    pub fn values(&self) -> &[EnumValue] {
        &self.values
    }
}

/// Builds an [`Enum`], numbering values positionally.
#[derive(Debug)]
pub struct EnumBuilder {
    inner: Enum,
}

impl EnumBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Enum {
                name: name.into(),
                docs: Vec::new(),
                values: Vec::new(),
                options: Options::new(),
            },
        }
    }

    pub fn docs(mut self, docs: Vec<String>) -> Self {
        self.inner.docs = docs;
        self
    }

    /// Append a value named after the upper snake case of `source`.
    pub fn add_value(&mut self, source: &str) -> &mut EnumValue {
        let index = self.inner.values.len();
        self.inner.values.push(EnumValue {
            name: to_upper_snake_case(source),
            value: index as u32,
            docs: Vec::new(),
            options: Options::new(),
        });
        &mut self.inner.values[index]
    }

    pub fn build(self) -> Enum {
        self.inner
    }
}

/// The input or output of a remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RpcType {
    /// A wrapper message synthesized in the same package; fields are
    /// positional (`arg1..` / `result1..`).
    Generated { name: String },
    /// A pre-existing host type used as-is.
    External {
        /// Host module path, empty for the package itself.
        path: String,
        /// Host type name.
        name: String,
        /// The schema type the host type resolves to.
        schema: Type,
    },
}

impl RpcType {
    pub fn generated(name: impl Into<String>) -> Self {
        RpcType::Generated { name: name.into() }
    }

    pub fn external(path: impl Into<String>, name: impl Into<String>, schema: Type) -> Self {
        RpcType::External {
            path: path.into(),
            name: name.into(),
            schema,
        }
    }

    pub fn is_generated(&self) -> bool {
        matches!(self, RpcType::Generated { .. })
    }

    /// Schema type name as written from inside `package`.
    pub fn schema_name_in(&self, package: &str) -> String {
        match self {
            RpcType::Generated { name } => name.clone(),
            RpcType::External { schema, .. } => schema.name_in(package),
        }
    }
}

/// Descriptor of one exposed function or method.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rpc {
    /// Dispatch name, `Recv_Method` for methods.
    pub name: String,
    /// Name invoked on the receiver or as a free function.
    pub method: String,
    /// Receiver type name, `None` for free functions.
    pub recv: Option<String>,
    /// Whether the last declared result is an error-like outcome.
    pub has_error: bool,
    pub input: RpcType,
    pub output: RpcType,
    pub docs: Vec<String>,
    /// Method options, e.g. `(google.api.http)`.
    pub options: Options,
}

/// A schema package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Package {
    name: String,
    path: String,
    docs: Vec<String>,
    imports: BTreeSet<String>,
    messages: Vec<Message>,
    enums: Vec<Enum>,
    rpcs: Vec<Rpc>,
    options: Options,
}

impl Package {
    /// Create an empty package. `name` is the schema package name, `path` the
    /// host import path it was derived from.
    pub fn new(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            docs: Vec::new(),
            imports: BTreeSet::new(),
            messages: Vec::new(),
            enums: Vec::new(),
            rpcs: Vec::new(),
            options: Options::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn docs(&self) -> &[String] {
        &self.docs
    }

    pub fn imports(&self) -> impl Iterator<Item = &str> {
        self.imports.iter().map(String::as_str)
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn enums(&self) -> &[Enum] {
        &self.enums
    }

    pub fn rpcs(&self) -> &[Rpc] {
        &self.rpcs
    }

    pub fn message(&self, name: &str) -> Option<&Message> {
        self.messages.iter().find(|m| m.name == name)
    }

    pub fn enumeration(&self, name: &str) -> Option<&Enum> {
        self.enums.iter().find(|e| e.name == name)
    }

    /// Record a required import. Empty paths are ignored, duplicates coalesce.
    pub fn import(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !path.is_empty() {
            self.imports.insert(path);
        }
    }

    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn push_enum(&mut self, e: Enum) {
        self.enums.push(e);
    }

    pub fn push_rpc(&mut self, rpc: Rpc) {
        self.rpcs.push(rpc);
    }

    /// Service name: the capitalized last segment of the package name
    /// followed by `Service`, e.g. `shop.catalog` → `CatalogService`.
    pub fn service_name(&self) -> String {
        let last = self.name.rsplit('.').next().unwrap_or_default();
        format!("{}Service", capitalize(last))
    }

    /// File that holds this package's schema, relative to the output root.
    pub fn proto_file(&self) -> String {
        proto_file_for(&self.name)
    }
}

/// Schema file path for a schema package name: `a.b` → `a/b/generated.proto`.
pub fn proto_file_for(package: &str) -> String {
    format!("{}/generated.proto", package.replace('.', "/"))
}

macro_rules! impl_annotated {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Annotated for $ty {
                fn options(&self) -> &Options {
                    &self.options
                }

                fn options_mut(&mut self) -> &mut Options {
                    &mut self.options
                }

                fn docs_mut(&mut self) -> &mut Vec<String> {
                    &mut self.docs
                }
            }
        )*
    };
}

impl_annotated!(Package, Message, Field, Enum, EnumValue, Rpc);
