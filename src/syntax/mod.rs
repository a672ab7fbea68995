//! A small hand-rolled lexer/parser producing the concrete syntax tree the
//! two semantic walkers traverse.
//!
//! This stands in for the externally generated parser the design assumes
//! (see `src/lib.rs`): it exists only so the declare/resolve walkers have
//! real input to run against in tests and the CLI binary, and it carries
//! none of the semantic weight — it does not attempt error recovery beyond
//! reporting a single syntax error and stopping.

pub mod cst;
pub mod lexer;
pub mod parser;

pub use cst::{Cst, CstListener};
pub use parser::{parse, ParseError};
