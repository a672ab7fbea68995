//! Assembles API groups: HTTP methods, incrementally-built URL paths with
//! typed path parameters, request body type, and per-status-code returns.
//!
//! Same current-item-in-progress shape as [`crate::builder::custom_type::CustomTypeBuilder`],
//! adapted for the `apiDecl` / `singleApi` grammar in §6 of the source
//! language surface rather than `structDecl`.

use crate::document::{Api, ApiGroup, ApiReturn, HttpMethod, PathParam};
use crate::location::StmtInfo;
use crate::ty::{Field, Type};

/// Raised by [`ApiBuilder::end_field`] when a path parameter shares a name
/// with one already recorded for the API currently being built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicatePathParamDecl {
    pub name: String,
}

struct PartialField {
    name: String,
    location: StmtInfo,
    ty: std::option::Option<Type>,
}

#[derive(Default)]
pub struct ApiBuilder {
    current_group_name: std::option::Option<String>,
    current_apis: Vec<Api>,

    current_method: std::option::Option<HttpMethod>,
    current_body_type: std::option::Option<Type>,
    current_path: String,
    current_path_params: Vec<PathParam>,
    current_returns: Vec<ApiReturn>,
    current_field: std::option::Option<PartialField>,
}

impl ApiBuilder {
    pub fn new() -> Self {
        ApiBuilder::default()
    }

    pub fn start_api_group(&mut self, name: impl Into<String>) {
        self.current_group_name = Some(name.into());
        self.current_apis = Vec::new();
    }

    pub fn end_api_group(&mut self) -> ApiGroup {
        ApiGroup {
            group_name: self
                .current_group_name
                .take()
                .expect("end_api_group called with no group in progress"),
            apis: std::mem::take(&mut self.current_apis),
        }
    }

    pub fn start_api(
        &mut self,
        method: HttpMethod,
        body_type: std::option::Option<Type>,
    ) {
        self.current_method = Some(method);
        self.current_body_type = body_type;
        self.current_path = String::new();
        self.current_path_params = Vec::new();
        self.current_returns = Vec::new();
    }

    pub fn end_api(&mut self) -> Api {
        let api = Api {
            method: self
                .current_method
                .take()
                .expect("end_api called with no api in progress"),
            path: std::mem::take(&mut self.current_path),
            path_params: std::mem::take(&mut self.current_path_params),
            body_type: self.current_body_type.take(),
            returns: std::mem::take(&mut self.current_returns),
        };
        self.current_apis.push(api.clone());
        api
    }

    /// Appends a literal piece of the URL (a path segment or the text
    /// between parameters) as it's read off the CST.
    pub fn append_path(&mut self, piece: &str) {
        self.current_path.push_str(piece);
    }

    pub fn start_field(&mut self, name: impl Into<String>, location: StmtInfo) {
        self.current_field = Some(PartialField {
            name: name.into(),
            location,
            ty: None,
        });
    }

    pub fn set_current_field_type(&mut self, ty: Type) {
        if let Some(field) = &mut self.current_field {
            field.ty = Some(ty);
        }
    }

    /// Closes a path parameter field, recording its character offset in the
    /// path assembled so far. Rejects a name already used by an earlier
    /// parameter of this API.
    pub fn end_field(&mut self) -> Result<(), DuplicatePathParamDecl> {
        let field = self
            .current_field
            .take()
            .expect("end_field called with no field in progress");
        if self.current_path_params.iter().any(|p| p.field.name == field.name) {
            return Err(DuplicatePathParamDecl { name: field.name });
        }
        self.current_path_params.push(PathParam {
            field: Field {
                name: field.name,
                ty: field
                    .ty
                    .expect("end_field called before the path param's type was set"),
                optional: false,
                location: field.location,
                doc_comments: Vec::new(),
            },
            pos_in_path: self.current_path.len(),
        });
        Ok(())
    }

    pub fn insert_api_return(&mut self, status_code: u16, resp_type: std::option::Option<Type>) {
        self.current_returns.push(ApiReturn {
            status_code,
            resp_type,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::PrimitiveKind;
    use std::path::PathBuf;
    use std::rc::Rc;

    fn loc() -> StmtInfo {
        StmtInfo::at_point(1, 1, Rc::new(PathBuf::from("test.tm")))
    }

    #[test]
    fn records_path_param_offset() {
        let mut b = ApiBuilder::new();
        b.start_api_group("Users");
        b.start_api(HttpMethod::Get, None);
        b.append_path("/users/");
        b.start_field("id", loc());
        b.set_current_field_type(Type::primitive(PrimitiveKind::I32, loc()));
        b.end_field().unwrap();
        b.append_path("/profile");
        b.insert_api_return(200, Some(Type::primitive(PrimitiveKind::String, loc())));
        let api = b.end_api();
        assert_eq!(api.path_params[0].pos_in_path, "/users/".len());
        assert_eq!(api.path, "/users//profile");

        let group = b.end_api_group();
        assert_eq!(group.group_name, "Users");
        assert_eq!(group.apis.len(), 1);
    }

    #[test]
    fn duplicate_path_param_name_is_rejected() {
        let mut b = ApiBuilder::new();
        b.start_api_group("G");
        b.start_api(HttpMethod::Get, None);
        b.start_field("id", loc());
        b.set_current_field_type(Type::primitive(PrimitiveKind::I32, loc()));
        b.end_field().unwrap();

        b.start_field("id", loc());
        b.set_current_field_type(Type::primitive(PrimitiveKind::String, loc()));
        let err = b.end_field().unwrap_err();
        assert_eq!(err.name, "id");
    }
}
