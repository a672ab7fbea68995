//! Typed build options: `option <name> = <literal>` statements, checked
//! against a known, pre-declared set.
//!
//! Grounded on `option.h`'s `BoolOption`/`NumericOption`/`StringOption`
//! trio; collapsed here into one `Option` struct carrying a tagged
//! [`OptionValue`] rather than a class hierarchy, since Rust enums are the
//! idiomatic fit and there's no virtual dispatch to preserve.

use crate::ty::Named;

/// The value an option statement assigns, tagged by the three literal kinds
/// the grammar allows.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    Bool(bool),
    /// Toolman numeric literals are doubles regardless of whether they look
    /// integral in source.
    Numeric(f64),
    String(String),
}

impl OptionValue {
    /// The type name used in diagnostic rendering (`bool`, `numeric`, `string`).
    pub fn type_name(&self) -> &'static str {
        match self {
            OptionValue::Bool(_) => "bool",
            OptionValue::Numeric(_) => "numeric",
            OptionValue::String(_) => "string",
        }
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, OptionValue::Bool(_))
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, OptionValue::Numeric(_))
    }

    pub fn is_string(&self) -> bool {
        matches!(self, OptionValue::String(_))
    }

    /// Whether `self`'s kind matches the kind `other` already carries; used
    /// to validate an option statement's literal against the built-in's
    /// declared type before overwriting its default.
    pub fn same_kind(&self, other: &OptionValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// A declared option: its name and current value. Built-ins are seeded with
/// their default value; an `option` statement overwrites it in place after
/// a kind check.
#[derive(Debug, Clone, PartialEq)]
pub struct Option {
    pub name: String,
    pub value: OptionValue,
}

impl Option {
    pub fn new(name: impl Into<String>, value: OptionValue) -> Self {
        Option {
            name: name.into(),
            value,
        }
    }
}

impl Named for Option {
    fn name(&self) -> &str {
        &self.name
    }
}

/// The options every module starts with, before any `option` statement is
/// parsed. `enterOptionStatement` looks an option up by name in the
/// pre-seeded scope; there is no way to declare a new option from source.
pub fn builtins() -> Vec<Option> {
    vec![
        Option::new("use_java8_optional", OptionValue::Bool(false)),
        Option::new("java_package", OptionValue::String(String::new())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtins_have_expected_defaults() {
        let opts = builtins();
        let java8 = opts.iter().find(|o| o.name == "use_java8_optional").unwrap();
        assert_eq!(java8.value, OptionValue::Bool(false));
        let pkg = opts.iter().find(|o| o.name == "java_package").unwrap();
        assert_eq!(pkg.value, OptionValue::String(String::new()));
    }

    #[test]
    fn same_kind_ignores_payload() {
        assert!(OptionValue::Bool(true).same_kind(&OptionValue::Bool(false)));
        assert!(!OptionValue::Bool(true).same_kind(&OptionValue::String("x".into())));
    }
}
