//! Recursive-descent parser turning a token stream into a [`crate::syntax::cst::Cst`].
//!
//! One function per grammar production in §6 of the source language
//! surface. Error recovery is deliberately absent: the first unexpected
//! token aborts the whole parse with a single [`ParseError`], which the
//! caller turns into a fatal `Syntax`-kind diagnostic — see the module-level
//! doc comment on `syntax::mod`.

use std::fmt;
use std::path::PathBuf;
use std::rc::Rc;

use crate::location::StmtInfo;
use crate::syntax::cst::{
    ApiDecl, Cst, EnumDecl, EnumFieldNode, FieldType, ImportSpec, ImportStmt, Item, Literal,
    OptionStmt, PathPiece, ReturnsItem, SingleApi, StructDecl, StructField,
};
use crate::syntax::lexer::{lex, Token, TokenKind};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub message: String,
    pub line: u32,
    pub column: u32,
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

const HTTP_METHODS: &[&str] = &[
    "GET", "POST", "DELETE", "PUT", "PATCH", "HEAD", "OPTIONS", "TRACE", "CONNECT",
];

pub fn parse(src: &str, source_path: Rc<PathBuf>) -> Result<Cst, ParseError> {
    let tokens = lex(src).map_err(|e| ParseError {
        message: e.message,
        line: e.line,
        column: e.column,
    })?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        source_path,
    };
    let items = parser.parse_document()?;
    Ok(Cst {
        source_path: parser.source_path,
        items,
    })
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    source_path: Rc<PathBuf>,
}

impl Parser {
    fn peek(&self) -> &Token {
        &self.tokens[self.pos]
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos].clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        tok
    }

    fn loc(&self) -> StmtInfo {
        let tok = self.peek();
        StmtInfo::at_point(tok.line, tok.column, Rc::clone(&self.source_path))
    }

    fn loc_at(&self, tok: &Token) -> StmtInfo {
        StmtInfo::at_point(tok.line, tok.column, Rc::clone(&self.source_path))
    }

    fn err(&self, message: impl Into<String>) -> ParseError {
        let tok = self.peek();
        ParseError {
            message: message.into(),
            line: tok.line,
            column: tok.column,
        }
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn peek_ident(&self) -> std::option::Option<&str> {
        match &self.peek().kind {
            TokenKind::Ident(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn peek_ident_at(&self, offset: usize) -> std::option::Option<&str> {
        match &self.tokens.get(self.pos + offset)?.kind {
            TokenKind::Ident(s) => Some(s.as_str()),
            _ => None,
        }
    }

    fn skip_doc_comments(&mut self) -> Vec<String> {
        let mut docs = Vec::new();
        while let TokenKind::DocComment(text) = &self.peek().kind {
            docs.push(text.clone());
            self.advance();
        }
        docs
    }

    fn expect_punct(&mut self, c: char) -> Result<(), ParseError> {
        match self.peek().kind {
            TokenKind::Punct(p) if p == c => {
                self.advance();
                Ok(())
            }
            _ => Err(self.err(format!("expected `{c}`"))),
        }
    }

    fn eat_punct(&mut self, c: char) -> bool {
        if matches!(self.peek().kind, TokenKind::Punct(p) if p == c) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn expect_ident(&mut self, text: &str) -> Result<Token, ParseError> {
        match &self.peek().kind {
            TokenKind::Ident(s) if s == text => Ok(self.advance()),
            _ => Err(self.err(format!("expected `{text}`"))),
        }
    }

    fn expect_any_ident(&mut self) -> Result<(String, Token), ParseError> {
        match self.peek().kind.clone() {
            TokenKind::Ident(s) => {
                let tok = self.advance();
                Ok((s, tok))
            }
            _ => Err(self.err("expected identifier")),
        }
    }

    fn parse_document(&mut self) -> Result<Vec<Item>, ParseError> {
        let mut items = Vec::new();
        loop {
            self.skip_doc_comments();
            if self.at_eof() {
                break;
            }
            match self.peek_ident() {
                Some("from") => items.push(Item::Import(self.parse_import()?)),
                Some("option") => items.push(Item::Option(self.parse_option()?)),
                Some("struct") => items.push(Item::Struct(self.parse_struct(false)?)),
                Some("enum") => items.push(Item::Enum(self.parse_enum(false)?)),
                Some("pub") => match self.peek_ident_at(1) {
                    Some("struct") => items.push(Item::Struct(self.parse_struct(true)?)),
                    Some("enum") => items.push(Item::Enum(self.parse_enum(true)?)),
                    _ => return Err(self.err("expected `struct` or `enum` after `pub`")),
                },
                Some("api") => items.push(Item::Api(self.parse_api()?)),
                _ => return Err(self.err("expected a declaration")),
            }
        }
        Ok(items)
    }

    fn parse_import(&mut self) -> Result<ImportStmt, ParseError> {
        let location = self.loc();
        self.expect_ident("from")?;
        let file = match self.peek().kind.clone() {
            TokenKind::Str(s) => {
                self.advance();
                s
            }
            _ => return Err(self.err("expected a string literal naming the imported file")),
        };
        self.expect_ident("import")?;

        let mut names = Vec::new();
        let mut star = false;
        if self.eat_punct('*') {
            star = true;
        } else {
            loop {
                let (name, _) = self.expect_any_ident()?;
                let alias = if self.peek_ident() == Some("as") {
                    self.advance();
                    Some(self.expect_any_ident()?.0)
                } else {
                    None
                };
                names.push(ImportSpec { name, alias });
                if !self.eat_punct(',') {
                    break;
                }
            }
        }

        Ok(ImportStmt {
            file,
            names,
            star,
            location,
        })
    }

    fn parse_option(&mut self) -> Result<OptionStmt, ParseError> {
        let location = self.loc();
        self.expect_ident("option")?;
        let (name, _) = self.expect_any_ident()?;
        self.expect_punct('=')?;
        let value = match self.peek().kind.clone() {
            TokenKind::Ident(s) if s == "true" => {
                self.advance();
                Literal::Bool(true)
            }
            TokenKind::Ident(s) if s == "false" => {
                self.advance();
                Literal::Bool(false)
            }
            TokenKind::Str(s) => {
                self.advance();
                Literal::Str(s)
            }
            TokenKind::Int(n) => {
                self.advance();
                Literal::Numeric(n as f64)
            }
            TokenKind::Float(n) => {
                self.advance();
                Literal::Numeric(n)
            }
            _ => return Err(self.err("expected a bool, string or numeric literal")),
        };
        Ok(OptionStmt {
            name,
            value,
            location,
        })
    }

    fn parse_struct(&mut self, is_public: bool) -> Result<StructDecl, ParseError> {
        let location = self.loc();
        if is_public {
            self.expect_ident("pub")?;
        }
        self.expect_ident("struct")?;
        let (name, name_tok) = self.expect_any_ident()?;
        let name_location = self.loc_at(&name_tok);
        self.expect_punct('{')?;
        let mut fields = Vec::new();
        while !self.eat_punct('}') {
            fields.push(self.parse_struct_field()?);
        }
        Ok(StructDecl {
            name,
            is_public,
            name_location,
            fields,
            location,
        })
    }

    fn parse_struct_field(&mut self) -> Result<StructField, ParseError> {
        let doc_comments = self.skip_doc_comments();
        let location = self.loc();
        let (name, _) = self.expect_any_ident()?;
        let optional = self.eat_punct('?');
        self.expect_punct(':')?;
        let ty = self.parse_field_type()?;
        Ok(StructField {
            name,
            optional,
            ty,
            doc_comments,
            location,
        })
    }

    fn parse_field_type(&mut self) -> Result<FieldType, ParseError> {
        let location = self.loc();
        if self.eat_punct('[') {
            let elem = self.parse_field_type()?;
            self.expect_punct(']')?;
            return Ok(FieldType::List(Box::new(elem), location));
        }
        if self.eat_punct('{') {
            let key = self.parse_field_type()?;
            self.expect_punct(',')?;
            let value = self.parse_field_type()?;
            self.expect_punct('}')?;
            return Ok(FieldType::Map(Box::new(key), Box::new(value), location));
        }
        if self.peek_ident() == Some("oneof") {
            self.advance();
            self.expect_punct('{')?;
            let mut fields = Vec::new();
            while !self.eat_punct('}') {
                fields.push(self.parse_struct_field()?);
            }
            return Ok(FieldType::Oneof(fields, location));
        }
        let (name, _) = self.expect_any_ident()?;
        if is_primitive_name(&name) {
            Ok(FieldType::Primitive(name, location))
        } else {
            Ok(FieldType::Custom(name, location))
        }
    }

    fn parse_enum(&mut self, is_public: bool) -> Result<EnumDecl, ParseError> {
        let location = self.loc();
        if is_public {
            self.expect_ident("pub")?;
        }
        self.expect_ident("enum")?;
        let (name, name_tok) = self.expect_any_ident()?;
        let name_location = self.loc_at(&name_tok);
        self.expect_punct('{')?;
        let mut fields = Vec::new();
        while !self.eat_punct('}') {
            fields.push(self.parse_enum_field()?);
        }
        Ok(EnumDecl {
            name,
            is_public,
            name_location,
            fields,
            location,
        })
    }

    fn parse_enum_field(&mut self) -> Result<EnumFieldNode, ParseError> {
        let doc_comments = self.skip_doc_comments();
        let location = self.loc();
        let (name, _) = self.expect_any_ident()?;
        self.expect_punct('=')?;
        let value = match self.peek().kind.clone() {
            TokenKind::Int(n) => {
                self.advance();
                n
            }
            _ => return Err(self.err("expected an integer literal")),
        };
        Ok(EnumFieldNode {
            name,
            value,
            doc_comments,
            location,
        })
    }

    fn parse_api(&mut self) -> Result<ApiDecl, ParseError> {
        let location = self.loc();
        self.expect_ident("api")?;
        let (group_name, _) = self.expect_any_ident()?;
        self.expect_punct('{')?;
        let mut apis = Vec::new();
        while !self.eat_punct('}') {
            apis.push(self.parse_single_api()?);
        }
        Ok(ApiDecl {
            group_name,
            apis,
            location,
        })
    }

    fn parse_single_api(&mut self) -> Result<SingleApi, ParseError> {
        let location = self.loc();
        let (method, _) = self.expect_any_ident()?;
        if !HTTP_METHODS.contains(&method.as_str()) {
            return Err(ParseError {
                message: format!("unknown HTTP method `{method}`"),
                line: location.line_range.0,
                column: location.column_range.0,
            });
        }
        let path_text = match self.peek().kind.clone() {
            TokenKind::Str(s) => {
                self.advance();
                s
            }
            _ => return Err(self.err("expected a string literal naming the path")),
        };
        let path = parse_path(&path_text, &location, &self.source_path)?;

        let body_type = if matches!(self.peek().kind, TokenKind::Arrow) {
            self.advance();
            Some(self.expect_any_ident()?.0)
        } else {
            None
        };

        self.expect_ident("returns")?;
        self.expect_punct('{')?;
        let mut returns = Vec::new();
        while !self.eat_punct('}') {
            returns.push(self.parse_returns_item()?);
        }

        Ok(SingleApi {
            method,
            path,
            body_type,
            returns,
            location,
        })
    }

    fn parse_returns_item(&mut self) -> Result<ReturnsItem, ParseError> {
        let status_code = match self.peek().kind.clone() {
            TokenKind::Int(n) => {
                self.advance();
                n as u16
            }
            _ => return Err(self.err("expected a status code")),
        };
        self.expect_punct(':')?;
        let resp_type = if self.peek_ident() == Some("void") {
            self.advance();
            None
        } else {
            Some(self.parse_field_type()?)
        };
        self.eat_punct(',');
        Ok(ReturnsItem {
            status_code,
            resp_type,
        })
    }
}

fn is_primitive_name(name: &str) -> bool {
    matches!(
        name,
        "bool" | "i32" | "u32" | "i64" | "u64" | "float" | "string" | "any"
    )
}

/// Splits a path string on `{name: type}` placeholders into literal runs and
/// typed parameters, recursively re-parsing each placeholder's type text
/// with the same field-type grammar used for struct fields.
fn parse_path(raw: &str, location: &StmtInfo, source_path: &Rc<PathBuf>) -> Result<Vec<PathPiece>, ParseError> {
    let mut pieces = Vec::new();
    let mut rest = raw;
    loop {
        match rest.find('{') {
            None => {
                if !rest.is_empty() {
                    pieces.push(PathPiece::Literal(rest.to_string()));
                }
                break;
            }
            Some(start) => {
                if start > 0 {
                    pieces.push(PathPiece::Literal(rest[..start].to_string()));
                }
                let after = &rest[start + 1..];
                let end = after.find('}').ok_or_else(|| ParseError {
                    message: "unterminated path parameter".to_string(),
                    line: location.line_range.0,
                    column: location.column_range.0,
                })?;
                let inner = &after[..end];
                let mut halves = inner.splitn(2, ':');
                let name = halves.next().unwrap_or("").trim().to_string();
                let ty_text = halves.next().ok_or_else(|| ParseError {
                    message: format!("path parameter `{name}` is missing a type"),
                    line: location.line_range.0,
                    column: location.column_range.0,
                })?;
                let ty_tokens = lex(ty_text.trim()).map_err(|e| ParseError {
                    message: e.message,
                    line: location.line_range.0,
                    column: location.column_range.0,
                })?;
                let mut sub = Parser {
                    tokens: ty_tokens,
                    pos: 0,
                    source_path: Rc::clone(source_path),
                };
                let ty = sub.parse_field_type()?;
                pieces.push(PathPiece::Param(StructField {
                    name,
                    optional: false,
                    ty,
                    doc_comments: Vec::new(),
                    location: location.clone(),
                }));
                rest = &after[end + 1..];
            }
        }
    }
    Ok(pieces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn p(src: &str) -> Cst {
        parse(src, Rc::new(PathBuf::from("t.tm"))).unwrap()
    }

    #[test]
    fn parses_struct_with_two_fields() {
        let cst = p("struct A { b: B x?: i32 }");
        match &cst.items[0] {
            Item::Struct(s) => {
                assert_eq!(s.name, "A");
                assert_eq!(s.fields.len(), 2);
                assert!(!s.fields[0].optional);
                assert!(s.fields[1].optional);
            }
            _ => panic!("expected struct"),
        }
    }

    #[test]
    fn parses_nested_map_with_custom_key() {
        let cst = p("struct X { m: {Foo, i32} } struct Foo {}");
        match &cst.items[0] {
            Item::Struct(s) => match &s.fields[0].ty {
                FieldType::Map(key, value, _) => {
                    assert!(matches!(**key, FieldType::Custom(ref n, _) if n == "Foo"));
                    assert!(matches!(**value, FieldType::Primitive(ref n, _) if n == "i32"));
                }
                _ => panic!("expected map"),
            },
            _ => panic!("expected struct"),
        }
    }

    #[test]
    fn parses_recursive_oneof() {
        let cst = p("struct X { u: oneof { a: i32, b: oneof { c: i32 } } }");
        match &cst.items[0] {
            Item::Struct(s) => match &s.fields[0].ty {
                FieldType::Oneof(fields, _) => {
                    assert_eq!(fields.len(), 2);
                    assert!(matches!(fields[1].ty, FieldType::Oneof(_, _)));
                }
                _ => panic!("expected oneof"),
            },
            _ => panic!("expected struct"),
        }
    }

    #[test]
    fn parses_import_with_alias_and_star() {
        let cst = p("from \"a.tm\" import Foo, Bar as Baz\nfrom \"b.tm\" import *");
        match &cst.items[0] {
            Item::Import(i) => {
                assert_eq!(i.file, "a.tm");
                assert_eq!(i.names.len(), 2);
                assert_eq!(i.names[1].alias.as_deref(), Some("Baz"));
                assert!(!i.star);
            }
            _ => panic!("expected import"),
        }
        match &cst.items[1] {
            Item::Import(i) => assert!(i.star),
            _ => panic!("expected import"),
        }
    }

    #[test]
    fn parses_api_with_path_param_and_returns() {
        let cst = p(
            "api Users { GET \"/users/{id: i32}\" -> Body returns { 200: User, 404: void } }",
        );
        match &cst.items[0] {
            Item::Api(a) => {
                assert_eq!(a.group_name, "Users");
                let api = &a.apis[0];
                assert_eq!(api.method, "GET");
                assert_eq!(api.body_type.as_deref(), Some("Body"));
                assert_eq!(api.returns.len(), 2);
                assert!(api.returns[1].resp_type.is_none());
                assert!(matches!(api.path[1], PathPiece::Param(_)));
            }
            _ => panic!("expected api"),
        }
    }
}
