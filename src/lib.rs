//! Toolman schema compiler front end.
//!
//! Lexes and parses the Toolman DSL, resolves imports and type references
//! across a two-phase declare/resolve walk, and hands back a typed
//! [`document::Document`] plus the [`diagnostic::Diagnostics`] raised along
//! the way. Code generation for a specific target language is out of scope
//! for this crate; see `src/main.rs` for the CLI front door.

pub use crate::document::Document;
pub use crate::module::{CompileError, Compiler};

pub mod builder;
pub mod diagnostic;
pub mod document;
pub mod import;
pub mod location;
pub mod module;
pub mod option;
pub mod scope;
pub mod syntax;
pub mod ty;
pub mod walker;
