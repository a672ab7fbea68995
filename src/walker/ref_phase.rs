//! Second-pass listener: resolves references, populates fields, enforces
//! cross-reference invariants, and builds the final `Document`.
//!
//! Reads `module.type_scope`/`module.option_scope` (populated by
//! `DeclPhaseWalker`) but never mutates them — new values produced here
//! (option overrides, struct/enum field contents) live either in the
//! `Type` shells' own interior-mutable field lists (which the declare phase
//! deliberately leaves empty for exactly this walker to fill in) or in the
//! `Document` being assembled, never by writing back into the scopes
//! themselves.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::builder::api::ApiBuilder;
use crate::builder::custom_type::CustomTypeBuilder;
use crate::builder::field_type::{FieldTypeBuilder, Location};
use crate::diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};
use crate::document::Document;
use crate::location::StmtInfo;
use crate::module::Module;
use crate::option::{Option as ToolmanOption, OptionValue};
use crate::syntax::cst::{
    ApiDecl, Cst, EnumDecl, EnumFieldNode, FieldType, Literal, OptionStmt, ReturnsItem, SingleApi,
    StructDecl, StructField,
};
use crate::syntax::CstListener;
use crate::ty::{EnumField, Named, PrimitiveKind, Type};

pub struct RefPhaseWalker<'a> {
    module: &'a Module,
    document: Document,
    diagnostics: Diagnostics,

    /// One entry per field currently being assembled, innermost last. A
    /// struct field, oneof field, path param, or return type each get their
    /// own builder; list/map nesting within a single field is handled by
    /// that builder's own internal stack, not by pushing another entry here.
    field_type_stack: Vec<FieldTypeBuilder>,
    /// The result of the most recent `end_map_or_list` call that emptied its
    /// builder's stack — i.e. the fully-assembled type of whichever field's
    /// outermost type was itself a list or map. Consumed immediately by
    /// `finalize_field_type`.
    pending_container_result: std::option::Option<Type>,

    /// One entry per struct/oneof currently being assembled, innermost last.
    builder_stack: Vec<CustomTypeBuilder>,

    /// How many oneofs deep the traversal currently is. A value greater than
    /// one marks a disallowed nested oneof.
    oneof_depth: u32,
    /// Set to the `oneof_depth` at which nesting was first detected; while
    /// set, every hook inside that disallowed subtree is a no-op except the
    /// depth bookkeeping itself, so the already-assembled enclosing field
    /// (whose type the disallowed oneof instead collapses to `any`) is left
    /// untouched until the offending oneof's own exit event fires.
    absorb_depth: std::option::Option<u32>,

    /// Names already assigned a real (non-scratch) struct/enum shell, so a
    /// second declaration of the same name — already flagged by the declare
    /// phase as a `DuplicateTypeDecl` — builds into a throwaway `Type`
    /// instead of corrupting the one surviving declaration.
    built_type_names: HashSet<String>,
    current_struct_is_duplicate: bool,
    current_enum: std::option::Option<Type>,
    current_enum_is_duplicate: bool,

    api_builder: ApiBuilder,
}

impl<'a> RefPhaseWalker<'a> {
    pub fn new(module: &'a Module, source_path: PathBuf) -> Self {
        RefPhaseWalker {
            module,
            document: Document::new(source_path),
            diagnostics: Diagnostics::new(),
            field_type_stack: Vec::new(),
            pending_container_result: None,
            builder_stack: Vec::new(),
            oneof_depth: 0,
            absorb_depth: None,
            built_type_names: HashSet::new(),
            current_struct_is_duplicate: false,
            current_enum: None,
            current_enum_is_duplicate: false,
            api_builder: ApiBuilder::new(),
        }
    }

    pub fn walk(&mut self, cst: &Cst) -> Document {
        cst.walk(self);
        self.document.clone()
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    /// A primitive or custom type name to a `Type`. Primitives resolve
    /// without touching the scope; an unresolved custom name raises
    /// `CustomTypeNotFound` and falls back to `any` so the enclosing
    /// builder's state machine stays balanced.
    fn resolve_named_type(&mut self, name: &str, location: &StmtInfo) -> Type {
        if let Some(kind) = PrimitiveKind::from_str(name) {
            return Type::primitive(kind, location.clone());
        }
        match self.module.type_scope.get(name) {
            Some(ty) => ty.clone(),
            None => {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::CustomTypeNotFound {
                        name: name.to_string(),
                    },
                    location.clone(),
                ));
                Type::primitive(PrimitiveKind::Any, location.clone())
            }
        }
    }

    /// Hands a fully-formed type to whichever field is currently being
    /// assembled, converting a rejected non-primitive map key into a
    /// diagnostic rather than propagating the error.
    fn feed_type(&mut self, ty: Type, location: &StmtInfo) {
        if let Some(builder) = self.field_type_stack.last_mut() {
            if let Err(err) = builder.start_type(ty) {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::MapKeyNotPrimitive { found: err.found },
                    location.clone(),
                ));
            }
        }
    }

    /// Pops the builder pushed for one field's type and returns the
    /// completed `Type`, reading it back from `end_map_or_list` (outermost
    /// list/map types) or `end_single` (everything else) depending on what
    /// kind of node the field's own type was.
    fn finalize_field_type(&mut self, ty_node: &FieldType) -> Type {
        let fb = self
            .field_type_stack
            .pop()
            .expect("field type builder stack underflow");
        if matches!(ty_node, FieldType::List(..) | FieldType::Map(..)) {
            self.pending_container_result
                .take()
                .expect("list/map field type completed without a result")
        } else {
            fb.end_single()
                .expect("field type builder produced no single type")
        }
    }

    fn push_field_type_builder(&mut self) {
        let mut fb = FieldTypeBuilder::new();
        fb.set_location(Location::Top);
        self.field_type_stack.push(fb);
    }
}

impl<'a> CstListener for RefPhaseWalker<'a> {
    fn enter_option(&mut self, node: &OptionStmt) {
        let existing = match self.module.option_scope.get(&node.name) {
            Some(opt) => opt.clone(),
            None => {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::UnknownOption {
                        name: node.name.clone(),
                    },
                    node.location.clone(),
                ));
                return;
            }
        };
        let value = match &node.value {
            Literal::Bool(b) => OptionValue::Bool(*b),
            Literal::Numeric(n) => OptionValue::Numeric(*n),
            Literal::Str(s) => OptionValue::String(s.clone()),
            Literal::Int(n) => OptionValue::Numeric(*n as f64),
        };
        if !existing.value.same_kind(&value) {
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::OptionTypeMismatch {
                    expected: existing.value.type_name().to_string(),
                    name: node.name.clone(),
                },
                node.location.clone(),
            ));
            return;
        }
        self.document
            .options
            .push(ToolmanOption::new(node.name.clone(), value));
    }

    fn enter_struct(&mut self, node: &StructDecl) {
        let is_first = self.built_type_names.insert(node.name.clone());
        let shell = if is_first {
            self.module
                .type_scope
                .get(&node.name)
                .cloned()
                .unwrap_or_else(|| {
                    Type::new_struct(node.name.clone(), node.is_public, node.name_location.clone())
                })
        } else {
            Type::new_struct(node.name.clone(), node.is_public, node.name_location.clone())
        };
        self.current_struct_is_duplicate = !is_first;
        let mut builder = CustomTypeBuilder::new();
        builder.start_custom(shell);
        self.builder_stack.push(builder);
    }

    fn exit_struct(&mut self, _node: &StructDecl) {
        let built = self
            .builder_stack
            .pop()
            .expect("exit_struct with no struct builder in progress")
            .end_custom();
        if !self.current_struct_is_duplicate {
            self.document.structs.push(built);
        }
    }

    fn enter_enum(&mut self, node: &EnumDecl) {
        let is_first = self.built_type_names.insert(node.name.clone());
        let shell = if is_first {
            self.module
                .type_scope
                .get(&node.name)
                .cloned()
                .unwrap_or_else(|| {
                    Type::new_enum(node.name.clone(), node.is_public, node.name_location.clone())
                })
        } else {
            Type::new_enum(node.name.clone(), node.is_public, node.name_location.clone())
        };
        self.current_enum_is_duplicate = !is_first;
        self.current_enum = Some(shell);
    }

    fn exit_enum(&mut self, _node: &EnumDecl) {
        if let Some(ty) = self.current_enum.take() {
            if !self.current_enum_is_duplicate {
                self.document.enums.push(ty);
            }
        }
    }

    fn enter_enum_field(&mut self, node: &EnumFieldNode) {
        let enum_ty = match &self.current_enum {
            Some(ty) => ty.clone(),
            None => return,
        };
        let value = node.value as i32;
        if enum_ty.enum_has_value(value) {
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::DuplicateEnumFieldValue { value },
                node.location.clone(),
            ));
            return;
        }
        let field = EnumField {
            name: node.name.clone(),
            value,
            location: node.location.clone(),
            doc_comments: node.doc_comments.clone(),
        };
        if !enum_ty.append_enum_field(field) {
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::DuplicateFieldDecl {
                    name: node.name.clone(),
                },
                node.location.clone(),
            ));
        }
    }

    fn enter_struct_field(&mut self, node: &StructField) {
        if self.absorb_depth.is_some() {
            return;
        }
        self.push_field_type_builder();
        if let Some(builder) = self.builder_stack.last_mut() {
            builder.start_field(node.name.clone(), node.location.clone(), node.doc_comments.clone());
        }
    }

    fn exit_struct_field(&mut self, node: &StructField) {
        if self.absorb_depth.is_some() {
            return;
        }
        let ty = self.finalize_field_type(&node.ty);
        if let Some(builder) = self.builder_stack.last_mut() {
            builder.set_current_field_optional(node.optional);
            builder.set_current_field_type(ty);
            if let Err(err) = builder.end_field() {
                self.diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DuplicateFieldDecl { name: err.name },
                    node.location.clone(),
                ));
            }
        }
    }

    fn enter_field_type(&mut self, node: &FieldType) {
        if self.absorb_depth.is_some() {
            if let FieldType::Oneof(_, _) = node {
                self.oneof_depth += 1;
            }
            return;
        }
        match node {
            FieldType::Primitive(name, loc) | FieldType::Custom(name, loc) => {
                let ty = self.resolve_named_type(name, loc);
                self.feed_type(ty, loc);
            }
            FieldType::List(_, loc) => {
                self.feed_type(Type::new_list(loc.clone()), loc);
            }
            FieldType::Map(_, _, loc) => {
                self.feed_type(Type::new_map(loc.clone()), loc);
            }
            FieldType::Oneof(_, loc) => {
                self.oneof_depth += 1;
                if self.oneof_depth > 1 {
                    self.diagnostics
                        .push(Diagnostic::new(DiagnosticKind::RecursiveOneof, loc.clone()));
                    self.absorb_depth = Some(self.oneof_depth);
                } else {
                    let mut builder = CustomTypeBuilder::new();
                    builder.start_custom(Type::new_oneof(loc.clone()));
                    self.builder_stack.push(builder);
                }
            }
        }
    }

    fn exit_field_type(&mut self, node: &FieldType) {
        if self.absorb_depth.is_some() {
            if let FieldType::Oneof(_, loc) = node {
                if self.absorb_depth == Some(self.oneof_depth) {
                    self.absorb_depth = None;
                    self.oneof_depth -= 1;
                    self.feed_type(Type::primitive(PrimitiveKind::Any, loc.clone()), loc);
                } else {
                    self.oneof_depth -= 1;
                }
            }
            return;
        }
        match node {
            FieldType::List(..) | FieldType::Map(..) => {
                if let Some(builder) = self.field_type_stack.last_mut() {
                    if let Some(completed) = builder.end_map_or_list() {
                        self.pending_container_result = Some(completed);
                    }
                }
            }
            FieldType::Oneof(_, loc) => {
                let oneof_ty = self
                    .builder_stack
                    .pop()
                    .expect("exit_field_type(Oneof) with no oneof builder in progress")
                    .end_custom();
                self.oneof_depth -= 1;
                self.feed_type(oneof_ty, loc);
            }
            FieldType::Primitive(..) | FieldType::Custom(..) => {}
        }
    }

    fn enter_list_elem(&mut self) {
        if self.absorb_depth.is_some() {
            return;
        }
        if let Some(builder) = self.field_type_stack.last_mut() {
            builder.set_location(Location::ListElement);
        }
    }

    fn enter_map_key(&mut self) {
        if self.absorb_depth.is_some() {
            return;
        }
        if let Some(builder) = self.field_type_stack.last_mut() {
            builder.set_location(Location::MapKey);
        }
    }

    fn enter_map_value(&mut self) {
        if self.absorb_depth.is_some() {
            return;
        }
        if let Some(builder) = self.field_type_stack.last_mut() {
            builder.set_location(Location::MapValue);
        }
    }

    fn enter_api_group(&mut self, node: &ApiDecl) {
        self.api_builder.start_api_group(node.group_name.clone());
    }

    fn exit_api_group(&mut self, _node: &ApiDecl) {
        let group = self.api_builder.end_api_group();
        self.document.api_groups.push(group);
    }

    fn enter_api(&mut self, node: &SingleApi) {
        let method = parse_http_method(&node.method);
        let body_type = node
            .body_type
            .as_ref()
            .map(|name| self.resolve_named_type(name, &node.location));
        self.api_builder.start_api(method, body_type);
    }

    fn exit_api(&mut self, _node: &SingleApi) {
        self.api_builder.end_api();
    }

    fn append_path_literal(&mut self, piece: &str) {
        self.api_builder.append_path(piece);
    }

    fn enter_path_param(&mut self, node: &StructField) {
        self.push_field_type_builder();
        self.api_builder.start_field(node.name.clone(), node.location.clone());
    }

    fn exit_path_param(&mut self, node: &StructField) {
        let ty = self.finalize_field_type(&node.ty);
        self.api_builder.set_current_field_type(ty);
        if let Err(err) = self.api_builder.end_field() {
            self.diagnostics.push(Diagnostic::new(
                DiagnosticKind::DuplicatePathParamDecl { name: err.name },
                node.location.clone(),
            ));
        }
    }

    fn enter_returns_item(&mut self) {
        self.push_field_type_builder();
    }

    fn enter_return(&mut self, node: &ReturnsItem) {
        let resp_type = node
            .resp_type
            .as_ref()
            .map(|ty_node| self.finalize_field_type(ty_node));
        self.api_builder.insert_api_return(node.status_code, resp_type);
    }
}

fn parse_http_method(method: &str) -> crate::document::HttpMethod {
    use crate::document::HttpMethod;
    match method {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "DELETE" => HttpMethod::Delete,
        "PUT" => HttpMethod::Put,
        "PATCH" => HttpMethod::Patch,
        "HEAD" => HttpMethod::Head,
        "OPTIONS" => HttpMethod::Options,
        "TRACE" => HttpMethod::Trace,
        "CONNECT" => HttpMethod::Connect,
        other => unreachable!("parser only admits known HTTP methods, got `{other}`"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Compiler;
    use std::fs;
    use tempfile::tempdir;

    fn compile(src: &str) -> (Document, Diagnostics) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("root.tm");
        fs::write(&path, src).unwrap();
        let mut compiler = Compiler::new(dir.path());
        compiler.compile(&path).unwrap()
    }

    #[test]
    fn s1_forward_reference_resolves() {
        let (doc, diagnostics) = compile("struct A { b: B } struct B { x: i32 }");
        assert!(!diagnostics.has_fatal());
        assert_eq!(doc.structs.len(), 2);
        assert_eq!(doc.structs[0].name(), "A");
        assert_eq!(doc.structs[1].name(), "B");
        let fields = doc.structs[0].struct_fields().unwrap();
        assert_eq!(fields[0].ty.name(), "B");
        assert!(fields[0].ty.is_struct());
    }

    /// The declare phase already rejects the second `A`; this checks that
    /// the ref phase doesn't compound the mistake by reusing the first `A`'s
    /// live shell (and therefore corrupting it) when it later walks the
    /// duplicate's own field list.
    #[test]
    fn duplicate_type_decl_builds_the_second_occurrence_into_a_scratch_shell() {
        let (doc, diagnostics) = compile("struct A { x: i32 } enum A { V = 1 }");
        assert!(diagnostics.has_fatal());
        assert_eq!(doc.structs.len(), 1);
        assert!(doc.enums.is_empty());
        let fields = doc.structs[0].struct_fields().unwrap();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name, "x");
    }

    /// A nested oneof collapses to `any` without corrupting the fields the
    /// enclosing oneof already assembled before and after it.
    #[test]
    fn recursive_oneof_absorbs_without_corrupting_sibling_fields() {
        let (doc, diagnostics) =
            compile("struct X { u: oneof { a: i32, b: oneof { c: i32 }, d: string } }");
        assert!(diagnostics
            .iter()
            .any(|d| matches!(d.kind, DiagnosticKind::RecursiveOneof)));
        let fields = doc.structs[0].struct_fields().unwrap();
        let inner_fields = fields[0].ty.oneof_fields().unwrap();
        assert_eq!(inner_fields.len(), 3);
        assert_eq!(inner_fields[0].name, "a");
        assert!(inner_fields[0].ty.is_primitive());
        assert_eq!(inner_fields[1].name, "b");
        assert!(inner_fields[1].ty.is_primitive());
        assert_eq!(inner_fields[2].name, "d");
        assert_eq!(inner_fields[2].ty.as_primitive(), Some(PrimitiveKind::String));
    }
}
