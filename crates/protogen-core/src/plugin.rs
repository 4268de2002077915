//! Post-processing hooks invoked while a package is transformed.
//!
//! Each hook fires exactly once per entity, after the entity is complete and
//! before its parent is: fields before their message, values before their
//! enum, messages, enums and calls before the package. Plugins run in
//! registration order.
//!
//! Hooks never get a bare `&mut` to an entity. They get an [`Entity`]
//! handle, which reads through to the entity and only lets a plugin attach
//! options, documentation and (for packages) imports. Children can't be
//! removed or reordered through it.
//!
//! Hooks below the package level also get a [`PackageContext`] naming the
//! owning package, through which they can require imports.

use crate::ir::{ScannedEnum, ScannedField, ScannedFunction, ScannedPackage, ScannedStruct};
use crate::schema::{
    Annotated, Enum, EnumValue, Field, Message, OptionValue, Options, Package, Rpc,
};
use std::fmt;
use std::ops::Deref;

/// The package an entity belongs to, as seen from a hook that fires before
/// the package itself is complete.
#[derive(Debug)]
pub struct PackageContext<'a> {
    name: &'a str,
    path: &'a str,
    imports: Vec<String>,
}

impl<'a> PackageContext<'a> {
    pub(crate) fn new(name: &'a str, path: &'a str) -> Self {
        Self {
            name,
            path,
            imports: Vec::new(),
        }
    }

    /// Schema package name.
    pub fn name(&self) -> &str {
        self.name
    }

    /// Host import path the package was scanned from.
    pub fn path(&self) -> &str {
        self.path
    }

    /// Require a schema import in the owning package. Empty paths are ignored.
    pub fn add_import(&mut self, path: impl Into<String>) {
        let path = path.into();
        if !path.is_empty() {
            self.imports.push(path);
        }
    }

    pub(crate) fn into_imports(self) -> Vec<String> {
        self.imports
    }
}

/// Restricted mutable access to a finished schema entity.
pub struct Entity<'a, T: Annotated> {
    inner: &'a mut T,
}

impl<'a, T: Annotated> Entity<'a, T> {
    pub(crate) fn new(inner: &'a mut T) -> Self {
        Self { inner }
    }

    /// Set an option, replacing any previous value under the same name.
    pub fn set_option(&mut self, name: impl Into<String>, value: OptionValue) {
        self.inner.options_mut().insert(name.into(), value);
    }

    pub fn options_mut(&mut self) -> &mut Options {
        self.inner.options_mut()
    }

    pub fn push_doc(&mut self, line: impl Into<String>) {
        self.inner.docs_mut().push(line.into());
    }
}

impl Entity<'_, Package> {
    /// Require an extra schema import, e.g. for an option extension.
    pub fn add_import(&mut self, path: impl Into<String>) {
        self.inner.import(path);
    }
}

impl<T: Annotated> Deref for Entity<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.inner
    }
}

/// Observer of a transform run.
///
/// All callbacks default to doing nothing, so a plugin only implements the
/// ones it cares about.
///
/// # Example
///
/// ```
/// use protogen_core::{Entity, Field, OptionValue, PackageContext, Plugin, ScannedField};
///
/// struct NonNullable;
///
/// impl Plugin for NonNullable {
///     fn on_field(
///         &self,
///         package: &mut PackageContext<'_>,
///         field: &mut Entity<'_, Field>,
///         _source: &ScannedField,
///     ) {
///         if field.ty().is_named() && !field.is_repeated() {
///             package.add_import("gogoproto/gogo.proto");
///             field.set_option("(gogoproto.nullable)", OptionValue::Literal("false".into()));
///         }
///     }
/// }
/// ```
pub trait Plugin: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn on_package(&self, _package: &mut Entity<'_, Package>, _source: &ScannedPackage) {}

    fn on_message(
        &self,
        _package: &mut PackageContext<'_>,
        _message: &mut Entity<'_, Message>,
        _source: &ScannedStruct,
    ) {
    }

    fn on_field(
        &self,
        _package: &mut PackageContext<'_>,
        _field: &mut Entity<'_, Field>,
        _source: &ScannedField,
    ) {
    }

    fn on_enum(
        &self,
        _package: &mut PackageContext<'_>,
        _e: &mut Entity<'_, Enum>,
        _source: &ScannedEnum,
    ) {
    }

    fn on_enum_value(
        &self,
        _package: &mut PackageContext<'_>,
        _value: &mut Entity<'_, EnumValue>,
        _source: &str,
    ) {
    }

    /// Fires once per exposed call, after its annotations are applied.
    fn on_rpc(
        &self,
        _package: &mut PackageContext<'_>,
        _rpc: &mut Entity<'_, Rpc>,
        _source: &ScannedFunction,
    ) {
    }
}

/// Plugins in registration order.
#[derive(Default)]
pub struct PluginChain {
    plugins: Vec<Box<dyn Plugin>>,
}

impl PluginChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.push(plugin);
    }

    pub fn len(&self) -> usize {
        self.plugins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plugins.is_empty()
    }

    pub(crate) fn package(&self, package: &mut Package, source: &ScannedPackage) {
        for plugin in &self.plugins {
            plugin.on_package(&mut Entity::new(package), source);
        }
    }

    pub(crate) fn message(
        &self,
        context: &mut PackageContext<'_>,
        message: &mut Message,
        source: &ScannedStruct,
    ) {
        for plugin in &self.plugins {
            plugin.on_message(context, &mut Entity::new(message), source);
        }
    }

    pub(crate) fn field(
        &self,
        context: &mut PackageContext<'_>,
        field: &mut Field,
        source: &ScannedField,
    ) {
        for plugin in &self.plugins {
            plugin.on_field(context, &mut Entity::new(field), source);
        }
    }

    pub(crate) fn enumeration(
        &self,
        context: &mut PackageContext<'_>,
        e: &mut Enum,
        source: &ScannedEnum,
    ) {
        for plugin in &self.plugins {
            plugin.on_enum(context, &mut Entity::new(e), source);
        }
    }

    pub(crate) fn enum_value(
        &self,
        context: &mut PackageContext<'_>,
        value: &mut EnumValue,
        source: &str,
    ) {
        for plugin in &self.plugins {
            plugin.on_enum_value(context, &mut Entity::new(value), source);
        }
    }

    pub(crate) fn rpc(&self, context: &mut PackageContext<'_>, rpc: &mut Rpc, source: &ScannedFunction) {
        for plugin in &self.plugins {
            plugin.on_rpc(context, &mut Entity::new(rpc), source);
        }
    }
}

impl fmt::Debug for PluginChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.plugins.iter().map(|p| p.name()))
            .finish()
    }
}
