//! Proto3 schema rendering.

use protogen_core::{Annotated, Enum, Field, Message, Options, Package, Rpc};

const INDENT: &str = "  ";

/// Render a package as a proto3 schema file.
///
/// Layout: header, package, sorted imports, package options, messages in
/// declaration order, enums, then one service listing every call.
pub fn render_proto(package: &Package) -> String {
    let mut code = String::new();

    code.push_str("// Code generated by protogen. DO NOT EDIT.\n");
    code.push_str("syntax = \"proto3\";\n\n");

    push_docs(&mut code, package.docs(), "");
    code.push_str(&format!("package {};\n", package.name()));

    let imports: Vec<&str> = package.imports().collect();
    if !imports.is_empty() {
        code.push('\n');
        for import in imports {
            code.push_str(&format!("import \"{import}\";\n"));
        }
    }

    if !package.options().is_empty() {
        code.push('\n');
        push_options(&mut code, package.options(), "");
    }

    for message in package.messages() {
        code.push('\n');
        push_message(&mut code, message, package.name());
    }

    for e in package.enums() {
        code.push('\n');
        push_enum(&mut code, e);
    }

    if !package.rpcs().is_empty() {
        code.push('\n');
        code.push_str(&format!("service {} {{\n", package.service_name()));
        for rpc in package.rpcs() {
            push_rpc(&mut code, rpc, package.name());
        }
        code.push_str("}\n");
    }

    code
}

fn push_rpc(code: &mut String, rpc: &Rpc, package: &str) {
    push_docs(code, &rpc.docs, INDENT);
    code.push_str(&format!(
        "{INDENT}rpc {} ({}) returns ({})",
        rpc.name,
        rpc.input.schema_name_in(package),
        rpc.output.schema_name_in(package),
    ));

    if rpc.options.is_empty() {
        code.push_str(";\n");
        return;
    }

    code.push_str(" {\n");
    push_options(code, &rpc.options, &INDENT.repeat(2));
    code.push_str(&format!("{INDENT}}}\n"));
}

fn push_message(code: &mut String, message: &Message, package: &str) {
    push_docs(code, message.docs(), "");
    code.push_str(&format!("message {} {{\n", message.name()));

    push_options(code, message.options(), INDENT);

    if !message.reserved().is_empty() {
        let reserved: Vec<String> = message.reserved().iter().map(u32::to_string).collect();
        code.push_str(&format!("{INDENT}reserved {};\n", reserved.join(", ")));
    }

    for field in message.fields() {
        push_field(code, field, package);
    }

    code.push_str("}\n");
}

fn push_field(code: &mut String, field: &Field, package: &str) {
    push_docs(code, field.docs(), INDENT);

    let label = if field.is_repeated() { "repeated " } else { "" };
    code.push_str(&format!(
        "{INDENT}{label}{} {} = {}{};\n",
        field.ty().name_in(package),
        field.name(),
        field.pos(),
        inline_options(field.options()),
    ));
}

fn push_enum(code: &mut String, e: &Enum) {
    push_docs(code, e.docs(), "");
    code.push_str(&format!("enum {} {{\n", e.name()));

    push_options(code, e.options(), INDENT);

    for value in e.values() {
        push_docs(code, value.docs(), INDENT);
        code.push_str(&format!(
            "{INDENT}{} = {}{};\n",
            value.name(),
            value.value(),
            inline_options(value.options()),
        ));
    }

    code.push_str("}\n");
}

fn push_docs(code: &mut String, docs: &[String], indent: &str) {
    for line in docs {
        if line.is_empty() {
            code.push_str(&format!("{indent}//\n"));
        } else {
            code.push_str(&format!("{indent}// {line}\n"));
        }
    }
}

fn push_options(code: &mut String, options: &Options, indent: &str) {
    for (name, value) in options {
        code.push_str(&format!("{indent}option {name} = {value};\n"));
    }
}

/// Field and enum value options: ` [a = 1, b = "x"]`, or nothing.
fn inline_options(options: &Options) -> String {
    if options.is_empty() {
        return String::new();
    }

    let rendered: Vec<String> = options
        .iter()
        .map(|(name, value)| format!("{name} = {value}"))
        .collect();
    format!(" [{}]", rendered.join(", "))
}

#[cfg(test)]
#[path = "proto/proto_tests.rs"]
mod proto_tests;
