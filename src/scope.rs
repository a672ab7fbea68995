//! Insertion-ordered, declare-or-reject name scopes.
//!
//! Both the type scope and the option scope need the same two properties:
//! iteration in declaration order (so `Document` output and error reporting
//! is reproducible) and a "first writer wins" conflict rule (so imports can
//! never shadow a local declaration, and a second `struct Foo` is rejected
//! rather than silently overwriting the first). `indexmap::IndexMap` gives
//! us ordered iteration for free; the declare-or-reject rule sits on top.

use indexmap::IndexMap;

use crate::ty::Named;

/// A name-keyed collection of `T`, preserving insertion order and refusing
/// to overwrite an existing binding.
#[derive(Debug, Clone, Default)]
pub struct Scope<T> {
    entries: IndexMap<String, T>,
}

impl<T: Named> Scope<T> {
    pub fn new() -> Self {
        Scope {
            entries: IndexMap::new(),
        }
    }

    /// Declares `item` under its own name. Returns `false` without modifying
    /// the scope if that name is already bound.
    pub fn declare(&mut self, item: T) -> bool {
        let name = item.name().to_string();
        self.declare_as(name, item)
    }

    /// Declares `item` under `alias` rather than its own name, for
    /// `from "x" import y as z` style imports. Returns `false` without
    /// modifying the scope if `alias` is already bound.
    pub fn declare_as(&mut self, alias: impl Into<String>, item: T) -> bool {
        let alias = alias.into();
        if self.entries.contains_key(&alias) {
            return false;
        }
        self.entries.insert(alias, item);
        true
    }

    pub fn get(&self, name: &str) -> Option<&T> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::StmtInfo;
    use crate::ty::{PrimitiveKind, Type};
    use std::path::PathBuf;
    use std::rc::Rc;

    fn loc() -> StmtInfo {
        StmtInfo::at_point(1, 1, Rc::new(PathBuf::from("test.tm")))
    }

    #[test]
    fn declare_rejects_duplicate_names() {
        let mut scope: Scope<Type> = Scope::new();
        assert!(scope.declare(Type::new_struct("A", true, loc())));
        assert!(!scope.declare(Type::new_struct("A", true, loc())));
        assert_eq!(scope.len(), 1);
    }

    #[test]
    fn declare_as_lets_imports_alias_without_shadowing() {
        let mut scope: Scope<Type> = Scope::new();
        assert!(scope.declare(Type::primitive(PrimitiveKind::Bool, loc())));
        // a local `bool` already exists under that name; an aliased import
        // trying to land on the same name must lose.
        assert!(!scope.declare_as("bool", Type::new_struct("Imported", true, loc())));
        assert!(scope.declare_as("Renamed", Type::new_struct("Imported", true, loc())));
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let mut scope: Scope<Type> = Scope::new();
        scope.declare(Type::new_struct("First", true, loc()));
        scope.declare(Type::new_struct("Second", true, loc()));
        let names: Vec<&str> = scope.iter().map(|(k, _)| k).collect();
        assert_eq!(names, vec!["First", "Second"]);
    }
}
