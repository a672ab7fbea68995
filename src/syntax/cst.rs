//! The concrete syntax tree the parser produces and the two semantic
//! walkers traverse.
//!
//! Nodes are a plain typed tree rather than a literal token-event stream,
//! but [`Cst::walk`] drives a [`CstListener`] over it with the same
//! enter/exit call shape an ANTLR-generated listener would receive, so
//! `DeclPhaseWalker` and `RefPhaseWalker` are written against `enter_*` /
//! `exit_*` callbacks exactly as the two-phase design describes.

use std::path::PathBuf;
use std::rc::Rc;

use crate::location::StmtInfo;

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Bool(bool),
    Numeric(f64),
    Str(String),
    Int(i64),
}

#[derive(Debug, Clone)]
pub struct ImportSpec {
    pub name: String,
    pub alias: std::option::Option<String>,
}

#[derive(Debug, Clone)]
pub struct ImportStmt {
    pub file: String,
    pub names: Vec<ImportSpec>,
    pub star: bool,
    pub location: StmtInfo,
}

#[derive(Debug, Clone)]
pub struct OptionStmt {
    pub name: String,
    pub value: Literal,
    pub location: StmtInfo,
}

#[derive(Debug, Clone)]
pub struct StructField {
    pub name: String,
    pub optional: bool,
    pub ty: FieldType,
    pub doc_comments: Vec<String>,
    pub location: StmtInfo,
}

#[derive(Debug, Clone)]
pub enum FieldType {
    Primitive(String, StmtInfo),
    Custom(String, StmtInfo),
    List(Box<FieldType>, StmtInfo),
    Map(Box<FieldType>, Box<FieldType>, StmtInfo),
    Oneof(Vec<StructField>, StmtInfo),
}

impl FieldType {
    pub fn location(&self) -> &StmtInfo {
        match self {
            FieldType::Primitive(_, l)
            | FieldType::Custom(_, l)
            | FieldType::List(_, l)
            | FieldType::Map(_, _, l)
            | FieldType::Oneof(_, l) => l,
        }
    }
}

#[derive(Debug, Clone)]
pub struct StructDecl {
    pub name: String,
    pub is_public: bool,
    pub name_location: StmtInfo,
    pub fields: Vec<StructField>,
    pub location: StmtInfo,
}

#[derive(Debug, Clone)]
pub struct EnumFieldNode {
    pub name: String,
    pub value: i64,
    pub doc_comments: Vec<String>,
    pub location: StmtInfo,
}

#[derive(Debug, Clone)]
pub struct EnumDecl {
    pub name: String,
    pub is_public: bool,
    pub name_location: StmtInfo,
    pub fields: Vec<EnumFieldNode>,
    pub location: StmtInfo,
}

/// One piece of a `singleApi`'s path: a literal run of characters, or a
/// typed parameter written `{name: type}` inline in the path.
#[derive(Debug, Clone)]
pub enum PathPiece {
    Literal(String),
    Param(StructField),
}

#[derive(Debug, Clone)]
pub struct ReturnsItem {
    pub status_code: u16,
    pub resp_type: std::option::Option<FieldType>,
}

#[derive(Debug, Clone)]
pub struct SingleApi {
    pub method: String,
    pub path: Vec<PathPiece>,
    pub body_type: std::option::Option<String>,
    pub returns: Vec<ReturnsItem>,
    pub location: StmtInfo,
}

#[derive(Debug, Clone)]
pub struct ApiDecl {
    pub group_name: String,
    pub apis: Vec<SingleApi>,
    pub location: StmtInfo,
}

#[derive(Debug, Clone)]
pub enum Item {
    Import(ImportStmt),
    Option(OptionStmt),
    Struct(StructDecl),
    Enum(EnumDecl),
    Api(ApiDecl),
}

#[derive(Debug, Clone)]
pub struct Cst {
    pub source_path: Rc<PathBuf>,
    pub items: Vec<Item>,
}

/// Callbacks fired as [`Cst::walk`] traverses the tree. All methods are
/// no-ops by default; a walker overrides only the ones it cares about —
/// `DeclPhaseWalker` only needs the struct/enum/import hooks,
/// `RefPhaseWalker` needs nearly all of them.
#[allow(unused_variables)]
pub trait CstListener {
    fn enter_document(&mut self, cst: &Cst) {}
    fn exit_document(&mut self, cst: &Cst) {}

    fn enter_import(&mut self, node: &ImportStmt) {}
    fn exit_import(&mut self, node: &ImportStmt) {}

    fn enter_option(&mut self, node: &OptionStmt) {}

    fn enter_struct(&mut self, node: &StructDecl) {}
    fn exit_struct(&mut self, node: &StructDecl) {}

    fn enter_enum(&mut self, node: &EnumDecl) {}
    fn exit_enum(&mut self, node: &EnumDecl) {}

    fn enter_struct_field(&mut self, node: &StructField) {}
    fn exit_struct_field(&mut self, node: &StructField) {}

    fn enter_field_type(&mut self, node: &FieldType) {}
    fn exit_field_type(&mut self, node: &FieldType) {}

    /// Fired immediately before descending into a list's element type, a
    /// map's key type, or a map's value type — the "surrounding position
    /// node" that `FieldTypeBuilder`'s `Location` is set from.
    fn enter_list_elem(&mut self) {}
    fn enter_map_key(&mut self) {}
    fn enter_map_value(&mut self) {}

    fn enter_enum_field(&mut self, node: &EnumFieldNode) {}

    fn enter_api_group(&mut self, node: &ApiDecl) {}
    fn exit_api_group(&mut self, node: &ApiDecl) {}

    fn enter_api(&mut self, node: &SingleApi) {}
    fn exit_api(&mut self, node: &SingleApi) {}

    fn append_path_literal(&mut self, piece: &str) {}
    fn enter_path_param(&mut self, node: &StructField) {}
    fn exit_path_param(&mut self, node: &StructField) {}

    /// Fired immediately before descending into a non-void return item's
    /// response type, mirroring `enter_list_elem`/`enter_map_key`/`enter_map_value`.
    fn enter_returns_item(&mut self) {}
    fn enter_return(&mut self, node: &ReturnsItem) {}
}

impl Cst {
    pub fn walk(&self, listener: &mut impl CstListener) {
        listener.enter_document(self);
        for item in &self.items {
            match item {
                Item::Import(node) => {
                    listener.enter_import(node);
                    listener.exit_import(node);
                }
                Item::Option(node) => listener.enter_option(node),
                Item::Struct(node) => walk_struct(node, listener),
                Item::Enum(node) => walk_enum(node, listener),
                Item::Api(node) => walk_api(node, listener),
            }
        }
        listener.exit_document(self);
    }
}

fn walk_struct(node: &StructDecl, listener: &mut impl CstListener) {
    listener.enter_struct(node);
    for field in &node.fields {
        walk_struct_field(field, listener);
    }
    listener.exit_struct(node);
}

fn walk_struct_field(node: &StructField, listener: &mut impl CstListener) {
    listener.enter_struct_field(node);
    walk_field_type(&node.ty, listener);
    listener.exit_struct_field(node);
}

fn walk_field_type(node: &FieldType, listener: &mut impl CstListener) {
    listener.enter_field_type(node);
    match node {
        FieldType::Primitive(_, _) | FieldType::Custom(_, _) => {}
        FieldType::List(elem, _) => {
            listener.enter_list_elem();
            walk_field_type(elem, listener);
        }
        FieldType::Map(key, value, _) => {
            listener.enter_map_key();
            walk_field_type(key, listener);
            listener.enter_map_value();
            walk_field_type(value, listener);
        }
        FieldType::Oneof(fields, _) => {
            for field in fields {
                walk_struct_field(field, listener);
            }
        }
    }
    listener.exit_field_type(node);
}

fn walk_enum(node: &EnumDecl, listener: &mut impl CstListener) {
    listener.enter_enum(node);
    for field in &node.fields {
        listener.enter_enum_field(field);
    }
    listener.exit_enum(node);
}

fn walk_api(node: &ApiDecl, listener: &mut impl CstListener) {
    listener.enter_api_group(node);
    for api in &node.apis {
        listener.enter_api(api);
        for piece in &api.path {
            match piece {
                PathPiece::Literal(text) => listener.append_path_literal(text),
                PathPiece::Param(field) => {
                    listener.enter_path_param(field);
                    walk_field_type(&field.ty, listener);
                    listener.exit_path_param(field);
                }
            }
        }
        for ret in &api.returns {
            if let Some(ty) = &ret.resp_type {
                listener.enter_returns_item();
                walk_field_type(ty, listener);
            }
            listener.enter_return(ret);
        }
        listener.exit_api(api);
    }
    listener.exit_api_group(node);
}
