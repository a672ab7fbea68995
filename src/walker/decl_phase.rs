//! First-pass listener: declares every named type, drives import
//! resolution, and pre-populates the option scope — all before any
//! reference is resolved. This is what makes forward references within a
//! file free: by the time `RefPhaseWalker` runs, every struct/enum name in
//! the file (and everything it imports) is already in scope.

use std::path::Path;

use crate::diagnostic::{Diagnostic, DiagnosticKind};
use crate::import::{Import, ImportBuilder, ImportName};
use crate::module::{CompileError, Compiler, Module};
use crate::syntax::cst::{Cst, EnumDecl, ImportStmt, StructDecl};
use crate::syntax::CstListener;
use crate::ty::Type;

pub struct DeclPhaseWalker<'a> {
    compiler: &'a mut Compiler,
    module: &'a mut Module,
    import_builder: ImportBuilder,
}

impl<'a> DeclPhaseWalker<'a> {
    pub fn new(compiler: &'a mut Compiler, module: &'a mut Module) -> Self {
        DeclPhaseWalker {
            compiler,
            module,
            import_builder: ImportBuilder::new(),
        }
    }

    pub fn walk(&mut self, cst: &Cst) {
        cst.walk(self);
    }

    fn resolve_import(&mut self, import: Import, location: &crate::location::StmtInfo) {
        for (file, names) in &import.regular {
            let resolved = self.compiler.compile_module(Path::new(file));
            let imported = match resolved {
                Ok(module) => module,
                Err(CompileError::FileNotFound { .. }) => {
                    self.module.diagnostics.push(Diagnostic::new(
                        DiagnosticKind::UnresolvedImport { file: file.clone() },
                        location.clone(),
                    ));
                    continue;
                }
                Err(_) => continue,
            };
            for name in names {
                match imported.type_scope.get(&name.original) {
                    Some(ty) => {
                        // Collision at the declare step is silently tolerated:
                        // imports never shadow a local declaration.
                        self.module
                            .type_scope
                            .declare_as(name.local_name(), ty.clone());
                    }
                    None => {
                        self.module.diagnostics.push(Diagnostic::new(
                            DiagnosticKind::ImportNameNotFound {
                                name: name.original.clone(),
                                file: file.clone(),
                            },
                            location.clone(),
                        ));
                    }
                }
            }
        }

        for file in &import.star {
            let resolved = self.compiler.compile_module(Path::new(file));
            let imported = match resolved {
                Ok(module) => module,
                Err(CompileError::FileNotFound { .. }) => {
                    self.module.diagnostics.push(Diagnostic::new(
                        DiagnosticKind::UnresolvedImport { file: file.clone() },
                        location.clone(),
                    ));
                    continue;
                }
                Err(_) => continue,
            };
            for (name, ty) in imported.type_scope.iter() {
                self.module.type_scope.declare_as(name, ty.clone());
            }
        }
    }
}

impl<'a> CstListener for DeclPhaseWalker<'a> {
    fn enter_struct(&mut self, node: &StructDecl) {
        let ty = Type::new_struct(node.name.clone(), node.is_public, node.name_location.clone());
        if !self.module.type_scope.declare(ty) {
            // The name is already bound to whichever declaration won the
            // race; the diagnostic names *that* type, not this rejected one.
            let existing = self
                .module
                .type_scope
                .get(&node.name)
                .map(|t| t.to_string())
                .unwrap_or_else(|| node.name.clone());
            self.module.diagnostics.push(Diagnostic::new(
                DiagnosticKind::DuplicateTypeDecl { name: existing },
                node.name_location.clone(),
            ));
        }
    }

    fn enter_enum(&mut self, node: &EnumDecl) {
        let ty = Type::new_enum(node.name.clone(), node.is_public, node.name_location.clone());
        if !self.module.type_scope.declare(ty) {
            let existing = self
                .module
                .type_scope
                .get(&node.name)
                .map(|t| t.to_string())
                .unwrap_or_else(|| node.name.clone());
            self.module.diagnostics.push(Diagnostic::new(
                DiagnosticKind::DuplicateTypeDecl { name: existing },
                node.name_location.clone(),
            ));
        }
    }

    fn enter_import(&mut self, node: &ImportStmt) {
        self.import_builder.enter_import_statement(node.file.clone());
        for name in &node.names {
            let import_name = match &name.alias {
                Some(alias) => ImportName::with_alias(name.name.clone(), alias.clone()),
                None => ImportName::new(name.name.clone()),
            };
            self.import_builder.add_name(import_name);
        }
        if node.star {
            self.import_builder.mark_star();
        }
    }

    fn exit_import(&mut self, node: &ImportStmt) {
        let mut import = Import::default();
        self.import_builder.exit_import_statement(&mut import);
        self.resolve_import(import, &node.location);
    }
}

