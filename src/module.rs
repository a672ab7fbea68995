//! The module cache and compiler driver: path-keyed memoisation of
//! declare-phase results, and the top-level `compile` entry point.
//!
//! Grounded on `compiler.h`/`compiler.cc` for the cache-then-declare shape,
//! and on the teacher's `DocEngine` (`doc_engine/src/lib.rs`) for the
//! driver-holds-a-cache-of-shared-handles pattern and its `tracing`-based
//! logging around cache hits/misses.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use thiserror::Error;
use tracing::{debug, debug_span};

use crate::diagnostic::Diagnostics;
use crate::document::Document;
use crate::option::{self, Option as ToolmanOption};
use crate::scope::Scope;
use crate::syntax;
use crate::ty::Type;
use crate::walker::decl_phase::DeclPhaseWalker;
use crate::walker::ref_phase::RefPhaseWalker;

/// Operational failures: conditions that abort compilation outright rather
/// than being recorded as a [`crate::diagnostic::Diagnostic`]. Distinct from
/// the diagnostic channel, which carries recoverable semantic/syntactic
/// problems — see `src/diagnostic.rs`.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error("could not read source file {path}: {source}")]
    FileNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("syntax error reading {path}: {message}")]
    SyntaxError { path: PathBuf, message: String },
    #[error("internal invariant violated: {0}")]
    Internal(String),
}

/// The declare-phase result for one source file: its type and option
/// scopes, plus any diagnostics raised while declaring it (e.g. a
/// `DuplicateTypeDecl` within the same file).
#[derive(Debug)]
pub struct Module {
    pub source: Rc<PathBuf>,
    pub type_scope: Scope<Type>,
    pub option_scope: Scope<ToolmanOption>,
    pub diagnostics: Diagnostics,
}

impl Module {
    fn empty(source: Rc<PathBuf>) -> Self {
        let mut option_scope = Scope::new();
        for builtin in option::builtins() {
            option_scope.declare(builtin);
        }
        Module {
            source,
            type_scope: Scope::new(),
            option_scope,
            diagnostics: Diagnostics::new(),
        }
    }
}

/// Path-keyed memoisation of declare-phase results, plus the driver for a
/// root-file compilation.
pub struct Compiler {
    base_path: PathBuf,
    modules: HashMap<PathBuf, Rc<Module>>,
}

impl Compiler {
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Compiler {
            base_path: base_path.into(),
            modules: HashMap::new(),
        }
    }

    fn normalize(&self, path: &Path) -> PathBuf {
        let joined = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_path.join(path)
        };
        // `canonicalize` requires the file to exist; callers that need a
        // stable cache key before reading the file fall back to a plain
        // (non-canonicalized) join, which is still unique per distinct
        // relative path from a fixed base_path.
        fs::canonicalize(&joined).unwrap_or(joined)
    }

    /// Returns the cached declare-phase result for `path`, running the
    /// declare phase (and, transitively, the declare phase of everything it
    /// imports) if this is the first time `path` is seen.
    ///
    /// The module shell is inserted into the cache *before* its body runs,
    /// so a cyclic import graph terminates: re-entering `compile_module` on
    /// a path already present in `self.modules` returns immediately, even
    /// though that module's declare phase has not finished yet.
    pub fn compile_module(&mut self, path: &Path) -> Result<Rc<Module>, CompileError> {
        let normalized = self.normalize(path);
        let _span = debug_span!("compile_module", path = %normalized.display()).entered();
        if let Some(module) = self.modules.get(&normalized) {
            debug!(path = %normalized.display(), "module cache hit");
            return Ok(Rc::clone(module));
        }

        debug!(path = %normalized.display(), "module cache miss, declaring");
        let source_path = Rc::new(normalized.clone());
        let placeholder = Rc::new(Module::empty(Rc::clone(&source_path)));
        self.modules.insert(normalized.clone(), Rc::clone(&placeholder));

        let text = fs::read_to_string(&normalized).map_err(|source| CompileError::FileNotFound {
            path: normalized.clone(),
            source,
        })?;
        let cst = syntax::parse(&text, Rc::clone(&source_path)).map_err(|err| {
            CompileError::SyntaxError {
                path: normalized.clone(),
                message: err.to_string(),
            }
        })?;

        let mut module = Module::empty(Rc::clone(&source_path));
        let mut decl_walker = DeclPhaseWalker::new(self, &mut module);
        decl_walker.walk(&cst);

        let module = Rc::new(module);
        self.modules.insert(normalized, Rc::clone(&module));
        Ok(module)
    }

    /// Compiles `root_path`: runs the declare phase (which may populate the
    /// module cache transitively via import statements), then runs the ref
    /// phase over the same parse tree using the declare-phase scopes, and
    /// returns the merged diagnostics alongside the resolved `Document`.
    pub fn compile(&mut self, root_path: &Path) -> Result<(Document, Diagnostics), CompileError> {
        let _span = debug_span!("compile", root = %root_path.display()).entered();
        self.base_path = root_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));

        let normalized = self.normalize(root_path);
        let source_path = Rc::new(normalized.clone());
        let text = fs::read_to_string(&normalized).map_err(|source| CompileError::FileNotFound {
            path: normalized.clone(),
            source,
        })?;
        let cst = syntax::parse(&text, Rc::clone(&source_path)).map_err(|err| {
            CompileError::SyntaxError {
                path: normalized.clone(),
                message: err.to_string(),
            }
        })?;

        let mut root_module = Module::empty(Rc::clone(&source_path));
        let placeholder = Rc::new(Module::empty(Rc::clone(&source_path)));
        self.modules.insert(normalized.clone(), placeholder);
        let mut decl_walker = DeclPhaseWalker::new(self, &mut root_module);
        decl_walker.walk(&cst);

        let mut diagnostics = Diagnostics::new();
        diagnostics.extend(std::mem::take(&mut root_module.diagnostics));

        let mut ref_walker = RefPhaseWalker::new(&root_module, normalized.clone());
        let document = ref_walker.walk(&cst);
        diagnostics.extend(ref_walker.into_diagnostics());

        self.modules.insert(normalized, Rc::new(root_module));
        Ok((document, diagnostics))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ty::Named;
    use std::io::Write;
    use tempfile::tempdir;

    #[test]
    fn compile_module_inserts_placeholder_before_parsing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.tm");
        fs::write(&path, "struct A { x: i32 }").unwrap();

        let mut compiler = Compiler::new(dir.path());
        let module = compiler.compile_module(&path).unwrap();
        assert!(module.type_scope.contains("A"));
    }

    #[test]
    fn missing_file_is_a_compile_error_not_a_panic() {
        let dir = tempdir().unwrap();
        let mut compiler = Compiler::new(dir.path());
        let result = compiler.compile_module(&dir.path().join("missing.tm"));
        assert!(matches!(result, Err(CompileError::FileNotFound { .. })));
    }

    #[test]
    fn cyclic_star_imports_terminate() {
        let dir = tempdir().unwrap();
        let a_path = dir.path().join("a.tm");
        let b_path = dir.path().join("b.tm");
        fs::File::create(&a_path)
            .unwrap()
            .write_all(b"from \"b.tm\" import *\nstruct A { x: i32 }")
            .unwrap();
        fs::File::create(&b_path)
            .unwrap()
            .write_all(b"from \"a.tm\" import *\nstruct B { y: i32 }")
            .unwrap();

        let mut compiler = Compiler::new(dir.path());
        let (document, diagnostics) = compiler.compile(&a_path).unwrap();
        assert!(!diagnostics.has_fatal());
        assert!(document.structs.iter().any(|t| t.name() == "A"));
    }
}
