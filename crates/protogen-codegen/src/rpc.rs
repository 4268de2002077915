//! Service glue generation.
//!
//! Turns the call descriptors of a [`Package`] into the Rust declarations of
//! a tonic-style service implementation:
//!
//! 1. an implementation struct holding one injectable field per receiver type;
//! 2. a zero-argument constructor returning a boxed default instance;
//! 3. setters for the receiver fields (only when there are receivers);
//! 4. one `impl` block per call with its async dispatch function.
//!
//! Every dispatch has the same signature,
//! `async fn(&self, Request<In>) -> Result<Response<Out>, Status>`; the
//! descriptor only decides what happens inside the body. Wrapper fields
//! are converted to native arguments, and native results back to wrapper
//! fields, with `TryFrom`; a value that doesn't fit becomes a status.

use proc_macro2::{Ident, Span, TokenStream};
use protogen_core::naming::{lower_first, to_lower_snake_case, to_schema_package};
use protogen_core::{Field, Message, Package, Rpc, RpcType, Type as SchemaType};
use quote::{ToTokens, quote};
use syn::{Expr, Item, ItemFn, ItemImpl, ItemStruct, parse_quote};

/// Names of the generated implementation type and its constructor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceNames {
    pub impl_name: String,
    pub constructor: String,
}

impl ServiceNames {
    /// `foo` → `fooServiceServer` / `NewFooServiceServer`.
    pub fn for_package(package: &Package) -> Self {
        let service = package.service_name();
        Self {
            impl_name: format!("{}Server", lower_first(&service)),
            constructor: format!("New{service}Server"),
        }
    }
}

/// The declarations generated for one service, in emission order.
#[derive(Debug, Clone)]
pub struct ServiceDecls {
    pub impl_type: ItemStruct,
    pub constructor: ItemFn,
    /// Receiver setters; `None` when no call has a receiver.
    pub injectors: Option<ItemImpl>,
    /// One block per call descriptor, in input order.
    pub dispatches: Vec<ItemImpl>,
}

impl ServiceDecls {
    pub fn into_items(self) -> Vec<Item> {
        let mut items = vec![Item::Struct(self.impl_type), Item::Fn(self.constructor)];
        items.extend(self.injectors.map(Item::Impl));
        items.extend(self.dispatches.into_iter().map(Item::Impl));
        items
    }
}

impl ToTokens for ServiceDecls {
    fn to_tokens(&self, tokens: &mut TokenStream) {
        self.impl_type.to_tokens(tokens);
        self.constructor.to_tokens(tokens);
        self.injectors.to_tokens(tokens);
        for dispatch in &self.dispatches {
            dispatch.to_tokens(tokens);
        }
    }
}

/// Generate the service declarations for `rpcs`.
///
/// Field counts of generated wrapper messages are looked up in `package`;
/// a wrapper missing from it is treated as having no fields. Never fails.
pub fn generate_service(names: &ServiceNames, rpcs: &[Rpc], package: &Package) -> ServiceDecls {
    let impl_ident = ident(&names.impl_name);
    let receivers = receivers(rpcs);

    tracing::debug!(
        service = %names.impl_name,
        rpcs = rpcs.len(),
        receivers = receivers.len(),
        "generating service glue"
    );

    ServiceDecls {
        impl_type: decl_impl_type(&impl_ident, &receivers),
        constructor: decl_constructor(&impl_ident, &ident(&names.constructor)),
        injectors: decl_injectors(&impl_ident, &receivers),
        dispatches: rpcs
            .iter()
            .map(|rpc| decl_dispatch(&impl_ident, rpc, package))
            .collect(),
    }
}

/// Render the declarations as source text for `service.rs`.
pub fn render_service(package: &Package, decls: &ServiceDecls) -> String {
    let mut out = format!(
        "// Code generated by protogen for package {}. DO NOT EDIT.\n\n",
        package.name()
    );
    for item in decls.clone().into_items() {
        out.push_str(&item.to_token_stream().to_string());
        out.push_str("\n\n");
    }
    out
}

/// Distinct receiver types in order of first use.
fn receivers(rpcs: &[Rpc]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::new();
    for recv in rpcs.iter().filter_map(|rpc| rpc.recv.as_deref()) {
        if !seen.contains(&recv) {
            seen.push(recv);
        }
    }
    seen
}

fn receiver_field(recv: &str) -> Ident {
    ident(&to_lower_snake_case(recv))
}

fn decl_impl_type(impl_ident: &Ident, receivers: &[&str]) -> ItemStruct {
    let fields = receivers.iter().map(|recv| {
        let field = receiver_field(recv);
        let ty = ident(recv);
        quote! { #field: ::std::option::Option<::std::sync::Arc<#ty>> }
    });

    parse_quote! {
        #[allow(non_camel_case_types)]
        #[derive(Default)]
        pub struct #impl_ident {
            #(#fields,)*
        }
    }
}

fn decl_constructor(impl_ident: &Ident, constructor: &Ident) -> ItemFn {
    parse_quote! {
        #[allow(non_snake_case)]
        pub fn #constructor() -> ::std::boxed::Box<#impl_ident> {
            ::std::boxed::Box::new(#impl_ident::default())
        }
    }
}

fn decl_injectors(impl_ident: &Ident, receivers: &[&str]) -> Option<ItemImpl> {
    if receivers.is_empty() {
        return None;
    }

    let setters = receivers.iter().map(|recv| {
        let field = receiver_field(recv);
        let setter = ident(&format!("set_{}", to_lower_snake_case(recv)));
        let ty = ident(recv);
        quote! {
            pub fn #setter(&mut self, #field: ::std::sync::Arc<#ty>) -> &mut Self {
                self.#field = ::std::option::Option::Some(#field);
                self
            }
        }
    });

    Some(parse_quote! {
        impl #impl_ident {
            #(#setters)*
        }
    })
}

fn decl_dispatch(impl_ident: &Ident, rpc: &Rpc, package: &Package) -> ItemImpl {
    let name = ident(&rpc.name);
    let input_ty = rpc_type_path(&rpc.input, package);
    let output_ty = rpc_type_path(&rpc.output, package);

    let (args, uses_input) = call_args(&rpc.input, package);
    let call = call_expr(rpc, &args);
    let bind_input = uses_input.then(|| quote! { let input = request.into_inner(); });
    let body = result_body(&rpc.output, &output_ty, &call, package);

    parse_quote! {
        #[allow(non_snake_case, unused_variables)]
        impl #impl_ident {
            pub async fn #name(
                &self,
                request: ::tonic::Request<#input_ty>,
            ) -> ::std::result::Result<::tonic::Response<#output_ty>, ::tonic::Status> {
                #bind_input
                #body
            }
        }
    }
}

/// Call arguments, and whether they read the decoded request.
fn call_args(input: &RpcType, package: &Package) -> (Vec<TokenStream>, bool) {
    match input {
        RpcType::External { .. } => (vec![quote!(input)], true),
        RpcType::Generated { name } => {
            let args: Vec<TokenStream> = wrapper_fields(name, package)
                .iter()
                .map(|field| {
                    let name = ident(field.name());
                    convert(quote!(input.#name), field, package, Direction::Decode)
                })
                .collect();
            let uses_input = !args.is_empty();
            (args, uses_input)
        }
    }
}

/// The native call, with the error outcome turned into a status.
fn call_expr(rpc: &Rpc, args: &[TokenStream]) -> Expr {
    let method = ident(&rpc.method);
    let call: Expr = match &rpc.recv {
        Some(recv) => {
            let field = receiver_field(recv);
            let missing = format!("receiver {recv} is not set");
            parse_quote! {
                self.#field
                    .as_deref()
                    .ok_or_else(|| ::tonic::Status::failed_precondition(#missing))?
                    .#method(#(#args),*)
            }
        }
        None => parse_quote! { #method(#(#args),*) },
    };

    if rpc.has_error {
        parse_quote! {
            #call.map_err(|err| ::tonic::Status::internal(err.to_string()))?
        }
    } else {
        call
    }
}

/// Statements storing the call's outcome, ending in the response expression.
fn result_body(output: &RpcType, output_ty: &syn::Type, call: &Expr, package: &Package) -> TokenStream {
    let fields = match output {
        RpcType::External { .. } => {
            return quote! {
                let result = #call;
                ::std::result::Result::Ok(::tonic::Response::new(result))
            };
        }
        RpcType::Generated { name } => wrapper_fields(name, package),
    };

    if fields.is_empty() {
        return quote! {
            #call;
            ::std::result::Result::Ok(::tonic::Response::new(#output_ty::default()))
        };
    }

    let bindings: Vec<Ident> = fields.iter().map(|f| ident(f.name())).collect();
    let pattern = match bindings.as_slice() {
        [single] => quote!(#single),
        _ => quote!((#(#bindings),*)),
    };
    let assigns = fields.iter().zip(&bindings).map(|(field, binding)| {
        let value = convert(quote!(#binding), field, package, Direction::Encode);
        quote! { result.#binding = #value; }
    });

    quote! {
        let #pattern = #call;
        let mut result = #output_ty::default();
        #(#assigns)*
        ::std::result::Result::Ok(::tonic::Response::new(result))
    }
}

/// Which way a value crosses between a wrapper message and the native call.
#[derive(Debug, Clone, Copy)]
enum Direction {
    /// Request field to native argument.
    Decode,
    /// Native result to response field.
    Encode,
}

impl Direction {
    fn status(self, field: &str, problem: &str) -> TokenStream {
        let message = format!("{field} {problem}");
        match self {
            Direction::Decode => quote!(::tonic::Status::invalid_argument(#message)),
            Direction::Encode => quote!(::tonic::Status::internal(#message)),
        }
    }
}

/// Convert `value` between a wrapper field and its native counterpart.
///
/// Every value goes through `TryFrom`, which is the identity where the
/// schema type is the native type and a checked conversion where the
/// schema widens it (`u8` travels as `uint32`, `SystemTime` as `Timestamp`).
/// Sequences and maps convert element by element. Singular message fields
/// are optional on the wire.
fn convert(value: TokenStream, field: &Field, package: &Package, direction: Direction) -> TokenStream {
    let out_of_range = direction.status(field.name(), "is out of range");
    let try_from = |value: TokenStream| {
        quote! {
            ::std::convert::TryFrom::try_from(#value).map_err(|_| #out_of_range)
        }
    };

    if let SchemaType::Map { .. } = field.ty() {
        let key = try_from(quote!(key));
        let entry = try_from(quote!(value));
        return quote! {
            #value
                .into_iter()
                .map(|(key, value)| -> ::std::result::Result<_, ::tonic::Status> {
                    ::std::result::Result::Ok((#key?, #entry?))
                })
                .collect::<::std::result::Result<_, ::tonic::Status>>()?
        };
    }

    if field.is_repeated() {
        let item = try_from(quote!(item));
        return quote! {
            #value
                .into_iter()
                .map(|item| #item)
                .collect::<::std::result::Result<_, ::tonic::Status>>()?
        };
    }

    if !is_message(field.ty(), package) {
        let converted = try_from(value);
        return quote!(#converted?);
    }

    match direction {
        Direction::Decode => {
            let missing = direction.status(field.name(), "is not set");
            let converted = try_from(quote!(#value.ok_or_else(|| #missing)?));
            quote!(#converted?)
        }
        Direction::Encode => {
            let converted = try_from(value);
            quote!(::std::option::Option::Some(#converted?))
        }
    }
}

/// Whether a schema type is a message. Enums declared in `package` are not;
/// named types of other packages are taken to be messages.
fn is_message(ty: &SchemaType, package: &Package) -> bool {
    match ty {
        SchemaType::Named {
            package: owner,
            name,
        } => !(owner == package.name() && package.enumeration(name).is_some()),
        SchemaType::Basic(_) | SchemaType::Map { .. } => false,
    }
}

/// Fields of a generated wrapper message, in position order.
fn wrapper_fields<'a>(name: &str, package: &'a Package) -> &'a [Field] {
    package.message(name).map(Message::fields).unwrap_or_default()
}

/// Rust path of a call's input or output type.
///
/// Generated wrappers and external types of the package itself are local.
/// Types from `crate`, `self` or `super` paths stay relative; any other
/// module path is made absolute.
fn rpc_type_path(ty: &RpcType, package: &Package) -> syn::Type {
    match ty {
        RpcType::Generated { name } => {
            let name = ident(name);
            parse_quote!(#name)
        }
        RpcType::External { path, name, .. } => {
            let name = ident(name);
            if path.is_empty() || to_schema_package(path) == package.name() {
                return parse_quote!(#name);
            }

            let segments: Vec<&str> = path
                .split(['/', ':'])
                .filter(|s| !s.is_empty())
                .collect();
            match segments.split_first() {
                Some((&first, rest)) if matches!(first, "crate" | "self" | "super") => {
                    let first = Ident::new(first, Span::call_site());
                    let rest = rest.iter().map(|s| ident(s));
                    parse_quote!(#first #(:: #rest)* :: #name)
                }
                _ => {
                    let segments = segments.iter().map(|s| ident(s));
                    parse_quote!(#(:: #segments)* :: #name)
                }
            }
        }
    }
}

const KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do",
    "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in",
    "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref",
    "return", "static", "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized",
    "use", "virtual", "where", "while", "yield",
];

/// An identifier for an arbitrary name.
///
/// Characters outside `[A-Za-z0-9_]` become `_`, a leading digit gets a `_`
/// prefix, keywords become raw identifiers and the names that can't be raw
/// get a trailing `_`.
pub(crate) fn ident(name: &str) -> Ident {
    let mut s: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if s.is_empty() || s.starts_with(|c: char| c.is_ascii_digit()) {
        s.insert(0, '_');
    }

    match s.as_str() {
        "_" | "self" | "Self" | "super" | "crate" => {
            s.push('_');
            Ident::new(&s, Span::call_site())
        }
        keyword if KEYWORDS.contains(&keyword) => Ident::new_raw(&s, Span::call_site()),
        _ => Ident::new(&s, Span::call_site()),
    }
}
