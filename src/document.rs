//! The typed, resolved output of a compilation: every struct, enum, option
//! and API group declared (directly, not via import) in one source file, in
//! declaration order.

use std::fmt;
use std::path::PathBuf;

use crate::option::Option as ToolmanOption;
use crate::ty::{Field, Type};

/// An HTTP method, as the `apiDecl` grammar's `method` token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
    Put,
    Patch,
    Head,
    Options,
    Trace,
    Connect,
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Put => "PUT",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
            HttpMethod::Trace => "TRACE",
            HttpMethod::Connect => "CONNECT",
        };
        f.write_str(s)
    }
}

/// A named path parameter together with where it sits in the fully
/// assembled URL (the character offset the path had reached when the
/// parameter's field-end event fired).
#[derive(Debug, Clone)]
pub struct PathParam {
    pub field: Field,
    pub pos_in_path: usize,
}

/// One `status_code -> resp_type?` entry of a `returns { ... }` block.
#[derive(Debug, Clone)]
pub struct ApiReturn {
    pub status_code: u16,
    pub resp_type: std::option::Option<Type>,
}

/// A single `method path (-> body)? returns { ... }` declaration.
#[derive(Debug, Clone)]
pub struct Api {
    pub method: HttpMethod,
    pub path: String,
    pub path_params: Vec<PathParam>,
    pub body_type: std::option::Option<Type>,
    pub returns: Vec<ApiReturn>,
}

/// A named group of APIs, as declared by one `api <name> { ... }` block.
#[derive(Debug, Clone)]
pub struct ApiGroup {
    pub group_name: String,
    pub apis: Vec<Api>,
}

/// The resolved output of compiling one source file: every struct, enum,
/// option and API group it declares directly (imported symbols are not
/// re-exported here; they only ever live in the importing module's type
/// scope), in declaration order.
#[derive(Debug, Clone)]
pub struct Document {
    pub source: PathBuf,
    pub structs: Vec<Type>,
    pub enums: Vec<Type>,
    pub options: Vec<ToolmanOption>,
    pub api_groups: Vec<ApiGroup>,
}

impl Document {
    pub fn new(source: PathBuf) -> Self {
        Document {
            source,
            structs: Vec::new(),
            enums: Vec::new(),
            options: Vec::new(),
            api_groups: Vec::new(),
        }
    }
}
