#![allow(non_snake_case)]

use super::*;
use protogen_core::{
    Entity, OptionValue, PackageContext, Plugin, ScannedEnum, ScannedField, ScannedFunction, ScannedPackage,
    ScannedStruct, ScannedType, Transformer,
};

fn catalog() -> ScannedPackage {
    ScannedPackage {
        path: "shop/catalog".into(),
        structs: vec![ScannedStruct {
            name: "Product".into(),
            docs: vec!["A sellable item.".into()],
            fields: vec![
                ScannedField {
                    name: "Name".into(),
                    ty: ScannedType::basic("String"),
                    docs: vec!["Display name.".into()],
                },
                ScannedField {
                    name: "Callback".into(),
                    ty: ScannedType::unsupported("fn()"),
                    docs: vec![],
                },
                ScannedField {
                    name: "Tags".into(),
                    ty: ScannedType::basic("String").repeated(),
                    docs: vec![],
                },
                ScannedField {
                    name: "AddedAt".into(),
                    ty: ScannedType::named("std::time", "SystemTime"),
                    docs: vec![],
                },
                ScannedField {
                    name: "Stock".into(),
                    ty: ScannedType::map(ScannedType::basic("String"), ScannedType::basic("u32")),
                    docs: vec![],
                },
            ],
        }],
        enums: vec![ScannedEnum {
            name: "Availability".into(),
            docs: vec![],
            values: vec!["InStock".into(), "SoldOut".into()],
        }],
        functions: vec![ScannedFunction {
            name: "Get".into(),
            receiver: Some("Catalog".into()),
            params: vec![ScannedType::basic("u64")],
            results: vec![
                ScannedType::named("shop/catalog", "Product"),
                ScannedType::error(),
            ],
            exposed: true,
            annotations: Default::default(),
            docs: vec!["Look a product up by id.".into()],
        }],
    }
}

const EXPECTED_CATALOG: &str = r#"// Code generated by protogen. DO NOT EDIT.
syntax = "proto3";

package shop.catalog;

import "google/protobuf/timestamp.proto";

// A sellable item.
message Product {
  reserved 2;
  // Display name.
  string name = 1;
  repeated string tags = 3;
  google.protobuf.Timestamp added_at = 4;
  map<string, uint32> stock = 5;
}

message Catalog_GetRequest {
  uint64 arg1 = 1;
}

enum Availability {
  IN_STOCK = 0;
  SOLD_OUT = 1;
}

service CatalogService {
  // Look a product up by id.
  rpc Catalog_Get (Catalog_GetRequest) returns (Product);
}
"#;

#[test]
fn render_proto___catalog___renders_full_schema() {
    let package = Transformer::new()
        .transform(&catalog(), &mut Vec::new())
        .unwrap();

    assert_eq!(render_proto(&package), EXPECTED_CATALOG);
}

struct GoOptions;

impl Plugin for GoOptions {
    fn on_package(&self, package: &mut Entity<'_, Package>, _source: &ScannedPackage) {
        package.set_option("go_package", OptionValue::Str("example.com/shop/catalog".into()));
        package.add_import("github.com/gogo/protobuf/gogoproto/gogo.proto");
    }

    fn on_message(
        &self,
        _package: &mut PackageContext<'_>,
        message: &mut Entity<'_, Message>,
        _source: &ScannedStruct,
    ) {
        message.set_option("(gogoproto.typedecl)", OptionValue::Literal("false".into()));
    }

    fn on_field(
        &self,
        _package: &mut PackageContext<'_>,
        field: &mut Entity<'_, Field>,
        _source: &ScannedField,
    ) {
        if field.ty().is_named() {
            field.set_option("(gogoproto.nullable)", OptionValue::Literal("false".into()));
            field.set_option("(gogoproto.stdtime)", OptionValue::Literal("true".into()));
        }
    }

    fn on_enum(
        &self,
        _package: &mut PackageContext<'_>,
        e: &mut Entity<'_, Enum>,
        _source: &ScannedEnum,
    ) {
        e.set_option("allow_alias", OptionValue::Literal("true".into()));
    }
}

#[test]
fn render_proto___options___render_on_every_entity() {
    let transformer = Transformer::builder().plugin(GoOptions).build().unwrap();
    let package = transformer.transform(&catalog(), &mut Vec::new()).unwrap();

    let proto = render_proto(&package);

    assert!(proto.contains("\nimport \"github.com/gogo/protobuf/gogoproto/gogo.proto\";\nimport \"google/protobuf/timestamp.proto\";\n"));
    assert!(proto.contains("\noption go_package = \"example.com/shop/catalog\";\n"));
    assert!(proto.contains("message Product {\n  option (gogoproto.typedecl) = false;\n  reserved 2;\n"));
    assert!(proto.contains(
        "google.protobuf.Timestamp added_at = 4 [(gogoproto.nullable) = false, (gogoproto.stdtime) = true];"
    ));
    assert!(proto.contains("enum Availability {\n  option allow_alias = true;\n"));
}

#[test]
fn render_proto___empty_package___has_no_service() {
    let package = Package::new("empty", "empty");

    let proto = render_proto(&package);

    assert_eq!(
        proto,
        "// Code generated by protogen. DO NOT EDIT.\nsyntax = \"proto3\";\n\npackage empty;\n"
    );
}

#[test]
fn render_proto___foreign_named_type___is_qualified() {
    let scanned = ScannedPackage {
        path: "shop/orders".into(),
        structs: vec![ScannedStruct {
            name: "Order".into(),
            docs: vec![],
            fields: vec![
                ScannedField {
                    name: "Buyer".into(),
                    ty: ScannedType::named("shop/users", "User"),
                    docs: vec![],
                },
                ScannedField {
                    name: "Lines".into(),
                    ty: ScannedType::named("shop/orders", "Line").repeated(),
                    docs: vec![],
                },
            ],
        }],
        enums: vec![],
        functions: vec![],
    };
    let package = Transformer::new().transform(&scanned, &mut Vec::new()).unwrap();

    let proto = render_proto(&package);

    assert!(proto.contains("import \"shop/users/generated.proto\";"));
    assert!(proto.contains("  shop.users.User buyer = 1;\n"));
    assert!(proto.contains("  repeated Line lines = 2;\n"));
}

#[test]
fn render_proto___http_annotations___render_method_option() {
    let scanned = ScannedPackage {
        path: "calc".into(),
        structs: vec![],
        enums: vec![],
        functions: vec![ScannedFunction {
            name: "Sum".into(),
            receiver: None,
            params: vec![ScannedType::basic("i64"), ScannedType::basic("i64")],
            results: vec![ScannedType::basic("i64")],
            exposed: true,
            annotations: [
                ("api_path".to_string(), "/sum/{arg1}/{arg2}".to_string()),
                ("api_method".to_string(), "get".to_string()),
            ]
            .into(),
            docs: vec![],
        }],
    };
    let package = Transformer::new().transform(&scanned, &mut Vec::new()).unwrap();

    let proto = render_proto(&package);

    assert!(proto.contains("import \"google/api/annotations.proto\";\n"));
    assert!(proto.ends_with(
        "service CalcService {\n  rpc Sum (SumRequest) returns (SumResponse) {\n    option (google.api.http) = { get: \"/sum/{arg1}/{arg2}\" };\n  }\n}\n"
    ));
}
