//! Scanned IR to schema transformation.
//!
//! ```text
//! ScannedPackage
//!     ↓
//!  [Transformer]  ← MappingTable (custom, then defaults)
//!     ↓           ← PluginChain (hooks after each entity)
//!  Package ─→ schema serializer / service generator
//! ```
//!
//! Per package the transformer:
//!
//! 1. derives the schema package name from the import path;
//! 2. builds one message per struct, reserving the position of every field
//!    whose type can't be resolved;
//! 3. builds one enum per scanned enum;
//! 4. derives one call descriptor per exposed function, synthesizing
//!    `<Name>Request` / `<Name>Response` wrappers where needed and turning
//!    `api_path` / `api_method` annotations into an HTTP binding;
//! 5. fires the package hook.
//!
//! Unresolvable types are warnings, never errors. Only duplicate names and
//! unusable import paths abort a run.

use crate::diagnostics::DiagnosticSink;
use crate::error::{CoreError, CoreResult};
use crate::ir::{ScannedEnum, ScannedFunction, ScannedPackage, ScannedStruct, ScannedType, TypeKind};
use crate::mapping::{MappingTable, TypeMappings};
use crate::naming::to_schema_package;
use crate::plugin::{PackageContext, Plugin, PluginChain};
use crate::schema::{
    Enum, EnumBuilder, Message, MessageBuilder, OptionValue, Options, Package, Rpc, RpcType, Type,
    proto_file_for,
};
use std::collections::HashSet;

/// Annotation holding the HTTP route of an exposed call.
pub const API_PATH: &str = "api_path";
/// Annotation holding the HTTP verb of an exposed call, `get` when absent.
pub const API_METHOD: &str = "api_method";

const HTTP_OPTION: &str = "(google.api.http)";
const HTTP_IMPORT: &str = "google/api/annotations.proto";
const HTTP_METHODS: &[&str] = &["get", "put", "post", "delete", "patch"];

/// Turns scanned packages into schema packages.
///
/// A transformer is immutable once built, so one instance can serve any
/// number of concurrent runs as long as each run has its own sink.
#[derive(Debug, Default)]
pub struct Transformer {
    mappings: MappingTable,
    plugins: PluginChain,
}

/// Setup-time configuration of a [`Transformer`].
#[derive(Debug, Default)]
pub struct TransformerBuilder {
    mappings: TypeMappings,
    plugins: PluginChain,
}

impl TransformerBuilder {
    /// Custom mappings consulted before the defaults.
    pub fn mappings(mut self, mappings: TypeMappings) -> Self {
        self.mappings = mappings;
        self
    }

    /// Register a plugin; plugins run in registration order.
    pub fn plugin(mut self, plugin: impl Plugin + 'static) -> Self {
        self.plugins.push(Box::new(plugin));
        self
    }

    /// Validate the configuration and freeze it.
    pub fn build(self) -> CoreResult<Transformer> {
        let mappings = MappingTable::new(self.mappings)?;
        tracing::debug!(
            custom_mappings = mappings.custom().len(),
            plugins = self.plugins.len(),
            "transformer configured"
        );

        Ok(Transformer {
            mappings,
            plugins: self.plugins,
        })
    }
}

/// Where a type is being resolved from.
struct Scope<'a> {
    package: &'a str,
    path: &'a str,
    enums: HashSet<&'a str>,
}

impl<'a> Scope<'a> {
    fn new(package: &'a str, scanned: &'a ScannedPackage) -> Self {
        Self {
            package,
            path: &scanned.path,
            enums: scanned.enums.iter().map(|e| e.name.as_str()).collect(),
        }
    }

    /// Whether a host module path names the package being transformed,
    /// whichever separator it is written with.
    fn is_local(&self, path: &str) -> bool {
        path.is_empty() || to_schema_package(path) == self.package
    }

    fn context(&self) -> PackageContext<'a> {
        PackageContext::new(self.package, self.path)
    }
}

/// Result of resolving a field-shaped type.
struct Resolved {
    ty: Type,
    repeated: bool,
    imports: Vec<String>,
}

impl Transformer {
    /// A transformer with default mappings and no plugins.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn builder() -> TransformerBuilder {
        TransformerBuilder::default()
    }

    /// Transform one scanned package.
    ///
    /// Warnings go to `sink`; the returned package is complete and usable
    /// even when warnings were reported.
    pub fn transform(
        &self,
        scanned: &ScannedPackage,
        sink: &mut dyn DiagnosticSink,
    ) -> CoreResult<Package> {
        let name = to_schema_package(&scanned.path);
        if name.is_empty() {
            return Err(CoreError::InvalidPackagePath(scanned.path.clone()));
        }

        let _span = tracing::debug_span!("transform", package = %name).entered();
        check_declared_names(scanned)?;

        let scope = Scope::new(&name, scanned);
        let mut package = Package::new(name.clone(), &scanned.path);

        for s in &scanned.structs {
            let message = self.transform_struct(&scope, &mut package, s, sink);
            package.push_message(message);
        }

        for e in &scanned.enums {
            let e = self.transform_enum(&scope, &mut package, e);
            package.push_enum(e);
        }

        for func in scanned.functions.iter().filter(|f| f.exposed) {
            let Some((rpc, wrappers)) = self.transform_function(&scope, &mut package, func, sink)
            else {
                continue;
            };
            for wrapper in wrappers {
                if package.message(wrapper.name()).is_some()
                    || package.enumeration(wrapper.name()).is_some()
                {
                    return Err(CoreError::DuplicateName {
                        kind: "message",
                        name: wrapper.name().to_string(),
                    });
                }
                package.push_message(wrapper);
            }
            package.push_rpc(rpc);
        }

        self.plugins.package(&mut package, scanned);

        sink.info(format!(
            "package {}: {} messages, {} enums, {} rpcs",
            package.name(),
            package.messages().len(),
            package.enums().len(),
            package.rpcs().len()
        ));

        Ok(package)
    }

    fn transform_struct(
        &self,
        scope: &Scope<'_>,
        package: &mut Package,
        s: &ScannedStruct,
        sink: &mut dyn DiagnosticSink,
    ) -> Message {
        let mut builder = MessageBuilder::new(&s.name).docs(s.docs.clone());
        let mut context = scope.context();

        let mut imports = Vec::new();
        for f in &s.fields {
            match self.resolve_field(scope, &f.ty, sink) {
                Some(resolved) => {
                    imports.extend(resolved.imports);
                    let field =
                        builder.add_field(&f.name, resolved.ty, resolved.repeated, f.docs.clone());
                    self.plugins.field(&mut context, field, f);
                }
                None => {
                    let pos = builder.reserve_next();
                    sink.warn(format!(
                        "field {:?} of struct {:?} has an invalid type ({}), ignoring field but reserving position {pos}",
                        f.name, s.name, f.ty
                    ));
                }
            }
        }

        let mut message = builder.build();
        self.plugins.message(&mut context, &mut message, s);

        for import in imports.into_iter().chain(context.into_imports()) {
            package.import(import);
        }
        message
    }

    fn transform_enum(&self, scope: &Scope<'_>, package: &mut Package, source: &ScannedEnum) -> Enum {
        let mut builder = EnumBuilder::new(&source.name).docs(source.docs.clone());
        let mut context = scope.context();

        for v in &source.values {
            let value = builder.add_value(v);
            self.plugins.enum_value(&mut context, value, v);
        }

        let mut e = builder.build();
        self.plugins.enumeration(&mut context, &mut e, source);

        for import in context.into_imports() {
            package.import(import);
        }
        e
    }

    fn transform_function(
        &self,
        scope: &Scope<'_>,
        package: &mut Package,
        func: &ScannedFunction,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<(Rpc, Vec<Message>)> {
        let name = rpc_name(func);

        let mut imports = Vec::new();
        let mut wrappers = Vec::new();

        let input = self.call_type(
            scope,
            &func.params,
            &CallShape::new(&name, "Request", "Arg"),
            &mut imports,
            &mut wrappers,
            sink,
        )?;
        let output = self.call_type(
            scope,
            func.value_results(),
            &CallShape::new(&name, "Response", "Result"),
            &mut imports,
            &mut wrappers,
            sink,
        )?;

        tracing::debug!(rpc = %name, "derived call descriptor");
        let mut rpc = Rpc {
            name,
            method: func.name.clone(),
            recv: func.receiver.clone(),
            has_error: func.has_error(),
            input,
            output,
            docs: func.docs.clone(),
            options: Options::new(),
        };

        if let Some(rule) = http_rule(&rpc.name, func, sink) {
            rpc.options.insert(HTTP_OPTION.to_string(), rule);
            imports.push(HTTP_IMPORT.to_string());
        }

        let mut context = scope.context();
        self.plugins.rpc(&mut context, &mut rpc, func);

        for import in imports.into_iter().chain(context.into_imports()) {
            package.import(import);
        }
        Some((rpc, wrappers))
    }

    /// Resolve the argument or result list of a call.
    ///
    /// A lone message type of the scanned code is used as-is; anything else
    /// is wrapped in a synthesized message with positional fields.
    fn call_type(
        &self,
        scope: &Scope<'_>,
        types: &[ScannedType],
        shape: &CallShape<'_>,
        imports: &mut Vec<String>,
        wrappers: &mut Vec<Message>,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<RpcType> {
        if let [single] = types
            && self.is_host_message(scope, single)
            && let TypeKind::Named { path, name } = &single.kind
        {
            let ty = self.resolve_type(scope, single, imports, sink)?;
            return Some(RpcType::external(path.clone(), name.clone(), ty));
        }

        let message_name = shape.message_name();
        let mut builder = MessageBuilder::new(&message_name).generated();
        for (i, ty) in types.iter().enumerate() {
            let Some(resolved) = self.resolve_field(scope, ty, sink) else {
                sink.warn(format!(
                    "{} {} of {:?} has an invalid type ({ty}), skipping the call",
                    shape.prefix.to_lowercase(),
                    i + 1,
                    shape.call
                ));
                return None;
            };
            imports.extend(resolved.imports);
            builder.add_field(
                &format!("{}{}", shape.prefix, i + 1),
                resolved.ty,
                resolved.repeated,
                Vec::new(),
            );
        }

        wrappers.push(builder.build());
        Some(RpcType::generated(message_name))
    }

    /// Whether a host type is itself a schema message and so can be the
    /// whole input or output of a call.
    ///
    /// Enums of the package and mapped types (whose schema type differs
    /// from the host type) are not. Enums of other packages can't be told
    /// apart from messages and count as messages.
    fn is_host_message(&self, scope: &Scope<'_>, ty: &ScannedType) -> bool {
        let TypeKind::Named { path, name } = &ty.kind else {
            return false;
        };
        if ty.repeated {
            return false;
        }
        if ty.identity().is_some_and(|key| self.mappings.find(&key).is_some()) {
            return false;
        }
        !(scope.is_local(path) && scope.enums.contains(name.as_str()))
    }

    /// Resolve a type in field position, applying the byte sequence rule.
    fn resolve_field(
        &self,
        scope: &Scope<'_>,
        ty: &ScannedType,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<Resolved> {
        // A byte sequence is the one repeated host type that maps to a
        // non-repeated schema type.
        if ty.is_byte_sequence() {
            return Some(Resolved {
                ty: Type::basic("bytes"),
                repeated: false,
                imports: Vec::new(),
            });
        }

        if ty.repeated && matches!(ty.kind, TypeKind::Map { .. }) {
            sink.warn(format!("sequence of maps {ty} has no schema equivalent, ignoring"));
            return None;
        }

        let mut imports = Vec::new();
        let resolved = self.resolve_type(scope, ty, &mut imports, sink)?;
        Some(Resolved {
            ty: resolved,
            repeated: ty.repeated,
            imports,
        })
    }

    fn resolve_type(
        &self,
        scope: &Scope<'_>,
        ty: &ScannedType,
        imports: &mut Vec<String>,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<Type> {
        match &ty.kind {
            TypeKind::Basic { name } => {
                if let Some(mapped) = self.mappings.find(name) {
                    imports.extend(mapped.import_path.clone());
                    return Some(mapped.to_type());
                }

                sink.warn(format!(
                    "basic type {name:?} is not defined in the mappings, ignoring"
                ));
                None
            }
            TypeKind::Named { path, name } => {
                if let Some(mapped) = ty.identity().and_then(|key| self.mappings.find(&key)) {
                    imports.extend(mapped.import_path.clone());
                    return Some(mapped.to_type());
                }

                if scope.is_local(path) {
                    return Some(Type::named(scope.package, name));
                }

                let package = to_schema_package(path);
                imports.push(proto_file_for(&package));
                Some(Type::named(package, name))
            }
            TypeKind::Map { key, value } => {
                let key = self.resolve_map_part(scope, key, "key", imports, sink)?;
                let value = self.resolve_map_part(scope, value, "value", imports, sink)?;
                Some(Type::map(key, value))
            }
            TypeKind::Error => {
                sink.warn("an error outcome cannot be used as a value type, ignoring".to_string());
                None
            }
            TypeKind::Unsupported { description } => {
                sink.warn(format!(
                    "type {description:?} has no schema equivalent, ignoring"
                ));
                None
            }
        }
    }

    fn resolve_map_part(
        &self,
        scope: &Scope<'_>,
        ty: &ScannedType,
        part: &str,
        imports: &mut Vec<String>,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<Type> {
        let resolved = self.resolve_field(scope, ty, sink)?;
        if resolved.repeated {
            sink.warn(format!("map {part} {ty} cannot be repeated, ignoring"));
            return None;
        }
        imports.extend(resolved.imports);
        Some(resolved.ty)
    }
}

/// Naming of the wrapper message for one side of a call.
struct CallShape<'a> {
    call: &'a str,
    suffix: &'a str,
    prefix: &'a str,
}

impl<'a> CallShape<'a> {
    fn new(call: &'a str, suffix: &'a str, prefix: &'a str) -> Self {
        Self {
            call,
            suffix,
            prefix,
        }
    }

    fn message_name(&self) -> String {
        format!("{}{}", self.call, self.suffix)
    }
}

/// Dispatch name of a call: `Recv_Method` for methods.
fn rpc_name(func: &ScannedFunction) -> String {
    match &func.receiver {
        Some(recv) => format!("{recv}_{}", func.name),
        None => func.name.clone(),
    }
}

/// The `(google.api.http)` binding requested by a call's annotations.
fn http_rule(rpc: &str, func: &ScannedFunction, sink: &mut dyn DiagnosticSink) -> Option<OptionValue> {
    let method = func.annotations.get(API_METHOD);
    let Some(path) = func.annotations.get(API_PATH) else {
        if method.is_some() {
            sink.warn(format!(
                "call {rpc:?} has an {API_METHOD} but no {API_PATH}, ignoring its http binding"
            ));
        }
        return None;
    };

    let method = method.map_or_else(|| "get".to_string(), |m| m.to_ascii_lowercase());
    if !HTTP_METHODS.contains(&method.as_str()) {
        sink.warn(format!(
            "call {rpc:?} has an unknown {API_METHOD} {method:?}, ignoring its http binding"
        ));
        return None;
    }

    Some(OptionValue::Literal(format!("{{ {method}: {path:?} }}")))
}

/// Reject packages that declare the same type or call name twice.
fn check_declared_names(scanned: &ScannedPackage) -> CoreResult<()> {
    let mut types = HashSet::new();
    let type_names = scanned
        .structs
        .iter()
        .map(|s| &s.name)
        .chain(scanned.enums.iter().map(|e| &e.name));
    for name in type_names {
        if !types.insert(name) {
            return Err(CoreError::DuplicateName {
                kind: "type",
                name: name.clone(),
            });
        }
    }

    let mut calls = HashSet::new();
    for name in scanned.functions.iter().filter(|f| f.exposed).map(rpc_name) {
        if !calls.insert(name.clone()) {
            return Err(CoreError::DuplicateName { kind: "rpc", name });
        }
    }

    Ok(())
}
