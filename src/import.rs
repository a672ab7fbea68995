//! Accumulates `from 'file' import X [as Y]` and `from 'file' import *`
//! statements while the CST is walked, for [`crate::walker::decl_phase::DeclPhaseWalker`]
//! to resolve on statement exit.
//!
//! Grounded on `import.h`'s `ImportName`/`Import` pair; `Import::add_import`
//! and `add_import_star` were stubs there (the original's builder logic
//! lived in the walker instead), so the accumulation behaviour itself is
//! filled in here from the resolution algorithm described in the
//! specification's import section.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

/// One entry of a regular (non-star) import list: the name as declared in
/// the source module, and an optional local alias.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ImportName {
    pub original: String,
    pub alias: std::option::Option<String>,
}

impl ImportName {
    pub fn new(original: impl Into<String>) -> Self {
        ImportName {
            original: original.into(),
            alias: None,
        }
    }

    pub fn with_alias(original: impl Into<String>, alias: impl Into<String>) -> Self {
        ImportName {
            original: original.into(),
            alias: Some(alias.into()),
        }
    }

    /// The name this import lands under in the importing module's scope.
    pub fn local_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.original)
    }
}

/// The flushed result of one `from "file" import ...` statement.
#[derive(Debug, Clone, Default)]
pub struct Import {
    pub regular: BTreeMap<String, BTreeSet<ImportName>>,
    pub star: BTreeSet<String>,
}

/// Accumulates a single import statement's source file and name list while
/// the walker is inside an `importStmt` node.
#[derive(Debug, Default)]
pub struct ImportBuilder {
    current_source_string: std::option::Option<String>,
    current_names: Vec<ImportName>,
    current_star: bool,
}

impl ImportBuilder {
    pub fn new() -> Self {
        ImportBuilder::default()
    }

    pub fn enter_import_statement(&mut self, source: impl Into<String>) {
        self.current_source_string = Some(source.into());
        self.current_names.clear();
        self.current_star = false;
    }

    pub fn add_name(&mut self, name: ImportName) {
        self.current_names.push(name);
    }

    pub fn mark_star(&mut self) {
        self.current_star = true;
    }

    /// Flushes the in-progress statement into an [`Import`], merging it with
    /// whatever has been accumulated for previous statements in this module.
    pub fn exit_import_statement(&mut self, into: &mut Import) {
        let source = self
            .current_source_string
            .take()
            .expect("exit_import_statement called with no statement in progress");
        if self.current_star {
            into.star.insert(source);
        } else {
            into.regular
                .entry(source)
                .or_default()
                .extend(self.current_names.drain(..));
        }
        self.current_names.clear();
        self.current_star = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accumulates_regular_and_star_imports_separately() {
        let mut builder = ImportBuilder::new();
        let mut import = Import::default();

        builder.enter_import_statement("a.tm");
        builder.add_name(ImportName::new("Foo"));
        builder.add_name(ImportName::with_alias("Bar", "Baz"));
        builder.exit_import_statement(&mut import);

        builder.enter_import_statement("b.tm");
        builder.mark_star();
        builder.exit_import_statement(&mut import);

        assert_eq!(import.regular.get("a.tm").unwrap().len(), 2);
        assert!(import.star.contains("b.tm"));
    }

    #[test]
    fn local_name_falls_back_to_original() {
        assert_eq!(ImportName::new("Foo").local_name(), "Foo");
        assert_eq!(ImportName::with_alias("Foo", "Bar").local_name(), "Bar");
    }
}
