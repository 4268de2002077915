//! protogen-core - Scanned IR, schema model and the type/schema transformer
//!
//! This crate turns the structural description of a host package into a
//! protobuf schema model:
//! - [`ScannedPackage`] and friends: the IR handed over by a scanner
//! - [`TypeMappings`] / [`MappingTable`]: host type to schema type lookups
//! - [`Package`], [`Message`], [`Enum`], [`Rpc`]: the schema model
//! - [`Plugin`]: post-processing hooks fired while a package is built
//! - [`Transformer`]: the pipeline tying it all together
//!
//! Problems with individual types are reported to a [`DiagnosticSink`];
//! only configuration errors and duplicate names are [`CoreError`]s.

mod diagnostics;
mod error;
mod ir;
mod mapping;
pub mod naming;
mod plugin;
mod schema;
mod transform;

pub use diagnostics::{Diagnostic, DiagnosticSink, Level, Report};
pub use error::{CoreError, CoreResult};
pub use ir::{
    ScannedEnum, ScannedField, ScannedFunction, ScannedPackage, ScannedStruct, ScannedType,
    TypeKind,
};
pub use mapping::{MappingTable, ProtoType, SCALARS, TypeMappings};
pub use plugin::{Entity, PackageContext, Plugin, PluginChain};
pub use schema::{
    Annotated, Enum, EnumBuilder, EnumValue, Field, Message, MessageBuilder, OptionValue, Options,
    Package, Rpc, RpcType, Type, proto_file_for,
};
pub use transform::{API_METHOD, API_PATH, Transformer, TransformerBuilder};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        Annotated, CoreError, CoreResult, DiagnosticSink, Entity, Package, PackageContext, Plugin,
        Report, ScannedPackage, Transformer, TypeMappings,
    };
}
