//! End-to-end compilation scenarios exercising the declare/resolve pipeline
//! through `Compiler::compile` rather than the individual walkers directly.

use std::fs;

use tempfile::tempdir;
use toolman::diagnostic::DiagnosticKind;
use toolman::document::Document;
use toolman::module::Compiler;
use toolman::ty::Named;

fn compile_single(src: &str) -> (Document, toolman::diagnostic::Diagnostics) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("root.tm");
    fs::write(&path, src).unwrap();
    let mut compiler = Compiler::new(dir.path());
    compiler.compile(&path).unwrap()
}

#[test]
fn forward_reference_between_structs_resolves_without_diagnostics() {
    let (doc, diagnostics) = compile_single("struct A { b: B } struct B { x: i32 }");
    assert!(!diagnostics.has_fatal());
    assert_eq!(doc.structs.iter().map(Named::name).collect::<Vec<_>>(), vec!["A", "B"]);
    let a_fields = doc.structs[0].struct_fields().unwrap();
    assert_eq!(a_fields[0].ty.name(), "B");
    assert!(a_fields[0].ty.is_struct());
}

#[test]
fn every_reachable_field_resolves_to_a_real_type() {
    let (doc, diagnostics) = compile_single(
        "struct Inner { v: i32 } struct Outer { list: [Inner], pair: {string, Inner}, single: Inner }",
    );
    assert!(!diagnostics.has_fatal());
    let outer = doc.structs.iter().find(|t| t.name() == "Outer").unwrap();
    for field in outer.struct_fields().unwrap() {
        match field.name.as_str() {
            "list" => assert_eq!(field.ty.list_elem().unwrap().name(), "Inner"),
            "pair" => {
                assert!(field.ty.map_key().unwrap().is_primitive());
                assert_eq!(field.ty.map_value().unwrap().name(), "Inner");
            }
            "single" => assert_eq!(field.ty.name(), "Inner"),
            other => panic!("unexpected field {other}"),
        }
    }
}

#[test]
fn duplicate_type_declaration_keeps_only_the_first_and_is_fatal() {
    let (doc, diagnostics) = compile_single("struct A {} enum A {}");
    assert!(diagnostics
        .iter()
        .any(|d| matches!(&d.kind, DiagnosticKind::DuplicateTypeDecl { name } if name == "struct A {...}")));
    assert_eq!(doc.structs.len(), 1);
    assert!(doc.enums.is_empty());
}

#[test]
fn map_key_must_be_primitive() {
    let (_doc, diagnostics) = compile_single("struct Foo {} struct X { m: {Foo, i32} }");
    assert!(diagnostics.iter().any(|d| matches!(
        &d.kind,
        DiagnosticKind::MapKeyNotPrimitive { found } if found.starts_with("struct Foo")
    )));
}

#[test]
fn oneof_cannot_nest_inside_itself() {
    let (doc, diagnostics) =
        compile_single("struct X { u: oneof { a: i32, b: oneof { c: i32 } } }");
    assert!(diagnostics
        .iter()
        .any(|d| matches!(d.kind, DiagnosticKind::RecursiveOneof)));
    let fields = doc.structs[0].struct_fields().unwrap();
    let inner = fields[0].ty.oneof_fields().unwrap();
    assert_eq!(inner.len(), 2);
    assert!(inner[1].ty.is_primitive());
}

#[test]
fn enum_discriminants_must_be_unique() {
    let (doc, diagnostics) = compile_single("enum Status { Ok = 1, AlsoOk = 1, Bad = 2 }");
    assert!(diagnostics
        .iter()
        .any(|d| matches!(d.kind, DiagnosticKind::DuplicateEnumFieldValue { value: 1 })));
    let members = doc.enums[0].enum_fields().unwrap();
    assert_eq!(members.iter().map(|f| f.name.as_str()).collect::<Vec<_>>(), vec!["Ok", "Bad"]);
}

#[test]
fn selective_import_with_alias_resolves_across_files() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a.tm"), "pub struct User { id: i32 }").unwrap();
    let b_path = dir.path().join("b.tm");
    fs::write(
        &b_path,
        "from \"a.tm\" import User as U\nstruct Wrap { u: U }",
    )
    .unwrap();

    let mut compiler = Compiler::new(dir.path());
    let (doc, diagnostics) = compiler.compile(&b_path).unwrap();
    assert!(!diagnostics.has_fatal());
    let fields = doc.structs[0].struct_fields().unwrap();
    assert_eq!(fields[0].ty.name(), "User");
}

#[test]
fn star_import_brings_in_every_name_without_shadowing_a_locally_declared_name() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("shapes.tm"), "pub struct Circle { r: i32 } pub struct Square { side: i32 }").unwrap();
    let main_path = dir.path().join("main.tm");
    // `Square` is declared locally before the star import reaches the same
    // name; declare-or-reject is first-writer-wins, so the local binding
    // keeps the name and the star import's `Square` is dropped on the floor.
    fs::write(
        &main_path,
        "struct Square { corner: i32 }\nfrom \"shapes.tm\" import *\nstruct Scene { c: Circle, s: Square }",
    )
    .unwrap();

    let mut compiler = Compiler::new(dir.path());
    let (doc, diagnostics) = compiler.compile(&main_path).unwrap();
    assert!(!diagnostics.has_fatal());
    let scene = doc.structs.iter().find(|t| t.name() == "Scene").unwrap();
    let fields = scene.struct_fields().unwrap();
    let square_field = fields.iter().find(|f| f.name == "s").unwrap();
    assert_eq!(square_field.ty.struct_fields().unwrap()[0].name, "corner");
    let circle_field = fields.iter().find(|f| f.name == "c").unwrap();
    assert_eq!(circle_field.ty.name(), "Circle");
}

#[test]
fn unresolved_custom_type_name_is_a_fatal_diagnostic_not_a_panic() {
    let (_doc, diagnostics) = compile_single("struct X { y: DoesNotExist }");
    assert!(diagnostics
        .iter()
        .any(|d| matches!(&d.kind, DiagnosticKind::CustomTypeNotFound { name } if name == "DoesNotExist")));
}

#[test]
fn api_group_resolves_path_params_body_and_returns() {
    let (doc, diagnostics) = compile_single(
        "struct Body {} struct Resp {} api Users { GET \"/users/{id: i32}\" -> Body returns { 200: Resp, 404: void } }",
    );
    assert!(!diagnostics.has_fatal());
    let group = &doc.api_groups[0];
    assert_eq!(group.group_name, "Users");
    let api = &group.apis[0];
    assert_eq!(api.path_params.len(), 1);
    assert_eq!(api.path_params[0].field.name, "id");
    assert_eq!(api.body_type.as_ref().unwrap().name(), "Body");
    assert_eq!(api.returns.len(), 2);
    assert!(api.returns[1].resp_type.is_none());
}

#[test]
fn option_statement_overrides_builtin_default_after_kind_check() {
    let (doc, diagnostics) = compile_single("option java_package = \"com.example\"");
    assert!(!diagnostics.has_fatal());
    let opt = doc.options.iter().find(|o| o.name == "java_package").unwrap();
    assert_eq!(opt.value, toolman::option::OptionValue::String("com.example".to_string()));
}

#[test]
fn option_statement_with_wrong_literal_kind_is_rejected() {
    let (_doc, diagnostics) = compile_single("option java_package = 5");
    assert!(diagnostics
        .iter()
        .any(|d| matches!(&d.kind, DiagnosticKind::OptionTypeMismatch { name, .. } if name == "java_package")));
}
