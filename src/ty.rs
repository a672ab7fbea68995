//! The type model: primitive, list, map, struct, enum and tagged-union
//! (oneof) types, sharing one structural-equality / display contract.
//!
//! A [`Type`] is a cheaply-cloneable handle (`Rc`) around a tagged variant.
//! List and map types are partially built by [`crate::builder::field_type::FieldTypeBuilder`]:
//! the container is created first and its element/key/value slots are filled
//! in afterwards as the traversal descends, which is why those slots use
//! interior mutability. Once a type leaves its builder it must not be
//! mutated again; nothing in this module enforces that beyond the doc
//! comment, matching the contract the front end promises its callers.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::location::StmtInfo;

/// Implemented by anything that lives in a name-keyed collection: [`Type`]
/// (for [`crate::scope::Scope`]), [`Field`] and [`EnumField`] (for the
/// duplicate-name check in [`crate::builder::custom_type::CustomTypeBuilder`]).
pub trait Named {
    fn name(&self) -> &str;
}

/// The primitive scalar kinds Toolman understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    I32,
    U32,
    I64,
    U64,
    Float,
    String,
    Any,
}

impl PrimitiveKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::I32 => "i32",
            PrimitiveKind::U32 => "u32",
            PrimitiveKind::I64 => "i64",
            PrimitiveKind::U64 => "u64",
            PrimitiveKind::Float => "float",
            PrimitiveKind::String => "string",
            PrimitiveKind::Any => "any",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "bool" => PrimitiveKind::Bool,
            "i32" => PrimitiveKind::I32,
            "u32" => PrimitiveKind::U32,
            "i64" => PrimitiveKind::I64,
            "u64" => PrimitiveKind::U64,
            "float" => PrimitiveKind::Float,
            "string" => PrimitiveKind::String,
            "any" => PrimitiveKind::Any,
            _ => return None,
        })
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A struct or oneof field. Field names are unique within their owning
/// custom type (enforced by [`crate::builder::custom_type::CustomTypeBuilder`]).
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub ty: Type,
    pub optional: bool,
    pub location: StmtInfo,
    pub doc_comments: Vec<String>,
}

impl Named for Field {
    fn name(&self) -> &str {
        &self.name
    }
}

/// One `name = value` member of an enum. Values must be globally unique
/// within the owning enum.
#[derive(Debug, Clone)]
pub struct EnumField {
    pub name: String,
    pub value: i32,
    pub location: StmtInfo,
    pub doc_comments: Vec<String>,
}

impl Named for EnumField {
    fn name(&self) -> &str {
        &self.name
    }
}

static NEXT_ONEOF_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
enum TypeData {
    Primitive(PrimitiveKind),
    List {
        elem: RefCell<Option<Type>>,
    },
    Map {
        key: RefCell<Option<Type>>,
        value: RefCell<Option<Type>>,
    },
    Struct {
        name: String,
        is_public: bool,
        fields: RefCell<Vec<Field>>,
    },
    Enum {
        name: String,
        is_public: bool,
        fields: RefCell<Vec<EnumField>>,
    },
    /// Anonymous; `synthetic_name` is assigned once at construction so that
    /// structural equality (by name, like struct/enum) has something stable
    /// to compare, without two independently-built oneofs with identical
    /// fields being considered the same type.
    Oneof {
        synthetic_name: String,
        fields: RefCell<Vec<Field>>,
    },
}

#[derive(Debug)]
struct TypeInner {
    location: StmtInfo,
    data: TypeData,
}

/// A type: primitive, list, map, struct, enum, or oneof. Cheaply cloneable;
/// clones are handles to the same underlying data (needed since the same
/// declared struct/enum is referenced from many fields and, via imports,
/// from other modules' scopes).
#[derive(Debug, Clone)]
pub struct Type(Rc<TypeInner>);

impl Type {
    pub fn primitive(kind: PrimitiveKind, location: StmtInfo) -> Type {
        Type(Rc::new(TypeInner {
            location,
            data: TypeData::Primitive(kind),
        }))
    }

    /// Creates an empty list container; call [`Type::set_list_elem`] once the
    /// element type has been built.
    pub fn new_list(location: StmtInfo) -> Type {
        Type(Rc::new(TypeInner {
            location,
            data: TypeData::List {
                elem: RefCell::new(None),
            },
        }))
    }

    /// Creates an empty map container; call [`Type::set_map_key`] and
    /// [`Type::set_map_value`] once those have been built.
    pub fn new_map(location: StmtInfo) -> Type {
        Type(Rc::new(TypeInner {
            location,
            data: TypeData::Map {
                key: RefCell::new(None),
                value: RefCell::new(None),
            },
        }))
    }

    /// Creates an empty struct shell, as declared by [`crate::walker::decl_phase::DeclPhaseWalker`].
    pub fn new_struct(name: impl Into<String>, is_public: bool, location: StmtInfo) -> Type {
        Type(Rc::new(TypeInner {
            location,
            data: TypeData::Struct {
                name: name.into(),
                is_public,
                fields: RefCell::new(Vec::new()),
            },
        }))
    }

    /// Creates an empty enum shell, as declared by [`crate::walker::decl_phase::DeclPhaseWalker`].
    pub fn new_enum(name: impl Into<String>, is_public: bool, location: StmtInfo) -> Type {
        Type(Rc::new(TypeInner {
            location,
            data: TypeData::Enum {
                name: name.into(),
                is_public,
                fields: RefCell::new(Vec::new()),
            },
        }))
    }

    /// Creates a fresh anonymous oneof shell. Each call gets its own
    /// synthesized name, so two oneof literals are never structurally equal
    /// even with identical field lists.
    pub fn new_oneof(location: StmtInfo) -> Type {
        let id = NEXT_ONEOF_ID.fetch_add(1, Ordering::Relaxed);
        Type(Rc::new(TypeInner {
            location,
            data: TypeData::Oneof {
                synthetic_name: format!("oneof#{id}"),
                fields: RefCell::new(Vec::new()),
            },
        }))
    }

    pub fn location(&self) -> &StmtInfo {
        &self.0.location
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.0.data, TypeData::Primitive(_))
    }

    pub fn is_list(&self) -> bool {
        matches!(self.0.data, TypeData::List { .. })
    }

    pub fn is_map(&self) -> bool {
        matches!(self.0.data, TypeData::Map { .. })
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.0.data, TypeData::Struct { .. })
    }

    pub fn is_enum(&self) -> bool {
        matches!(self.0.data, TypeData::Enum { .. })
    }

    pub fn is_oneof(&self) -> bool {
        matches!(self.0.data, TypeData::Oneof { .. })
    }

    pub fn as_primitive(&self) -> Option<PrimitiveKind> {
        match &self.0.data {
            TypeData::Primitive(kind) => Some(*kind),
            _ => None,
        }
    }

    /// The element type of a list, once set.
    pub fn list_elem(&self) -> Option<Type> {
        match &self.0.data {
            TypeData::List { elem } => elem.borrow().clone(),
            _ => None,
        }
    }

    /// The key type of a map, once set.
    pub fn map_key(&self) -> Option<Type> {
        match &self.0.data {
            TypeData::Map { key, .. } => key.borrow().clone(),
            _ => None,
        }
    }

    /// The value type of a map, once set.
    pub fn map_value(&self) -> Option<Type> {
        match &self.0.data {
            TypeData::Map { value, .. } => value.borrow().clone(),
            _ => None,
        }
    }

    /// Fills in a list's element type. Panics if called on a non-list type;
    /// only [`crate::builder::field_type::FieldTypeBuilder`] calls this, and
    /// only on containers it created itself.
    pub fn set_list_elem(&self, elem: Type) {
        match &self.0.data {
            TypeData::List { elem: slot } => *slot.borrow_mut() = Some(elem),
            _ => panic!("set_list_elem called on a non-list type"),
        }
    }

    /// Fills in a map's key type. The caller is responsible for having
    /// already checked the key is primitive (see [`crate::diagnostic::DiagnosticKind::MapKeyNotPrimitive`]).
    pub fn set_map_key(&self, key: Type) {
        match &self.0.data {
            TypeData::Map { key: slot, .. } => *slot.borrow_mut() = Some(key),
            _ => panic!("set_map_key called on a non-map type"),
        }
    }

    /// Fills in a map's value type.
    pub fn set_map_value(&self, value: Type) {
        match &self.0.data {
            TypeData::Map { value: slot, .. } => *slot.borrow_mut() = Some(value),
            _ => panic!("set_map_value called on a non-map type"),
        }
    }

    pub fn struct_fields(&self) -> Option<Vec<Field>> {
        match &self.0.data {
            TypeData::Struct { fields, .. } => Some(fields.borrow().clone()),
            _ => None,
        }
    }

    pub fn enum_fields(&self) -> Option<Vec<EnumField>> {
        match &self.0.data {
            TypeData::Enum { fields, .. } => Some(fields.borrow().clone()),
            _ => None,
        }
    }

    pub fn oneof_fields(&self) -> Option<Vec<Field>> {
        match &self.0.data {
            TypeData::Oneof { fields, .. } => Some(fields.borrow().clone()),
            _ => None,
        }
    }

    pub fn is_public(&self) -> Option<bool> {
        match &self.0.data {
            TypeData::Struct { is_public, .. } => Some(*is_public),
            TypeData::Enum { is_public, .. } => Some(*is_public),
            _ => None,
        }
    }

    /// Appends a field to a struct or oneof type, rejecting duplicate names.
    /// Returns `false` (and leaves the type unchanged) if a field of the same
    /// name is already present.
    pub fn append_field(&self, field: Field) -> bool {
        let fields = match &self.0.data {
            TypeData::Struct { fields, .. } => fields,
            TypeData::Oneof { fields, .. } => fields,
            _ => panic!("append_field called on a type with no field list"),
        };
        let mut fields = fields.borrow_mut();
        if fields.iter().any(|f| f.name == field.name) {
            return false;
        }
        fields.push(field);
        true
    }

    /// Appends a member to an enum, rejecting duplicate names. Duplicate
    /// *values* are a separate check the ref-phase walker performs before
    /// calling this (see [`crate::diagnostic::DiagnosticKind::DuplicateEnumFieldValue`]).
    pub fn append_enum_field(&self, field: EnumField) -> bool {
        match &self.0.data {
            TypeData::Enum { fields, .. } => {
                let mut fields = fields.borrow_mut();
                if fields.iter().any(|f| f.name == field.name) {
                    return false;
                }
                fields.push(field);
                true
            }
            _ => panic!("append_enum_field called on a non-enum type"),
        }
    }

    /// `true` iff `value` is already used by a member of this enum.
    pub fn enum_has_value(&self, value: i32) -> bool {
        match &self.0.data {
            TypeData::Enum { fields, .. } => fields.borrow().iter().any(|f| f.value == value),
            _ => false,
        }
    }

    /// Identity comparison: are these two handles the exact same underlying
    /// type object (not merely structurally equal)? Used by the ref-phase
    /// walker to detect when a oneof is nested inside itself.
    pub fn is_same_instance(&self, other: &Type) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Named for Type {
    /// The user-visible name: the declared identifier for struct/enum, or a
    /// synthesized name for list/map/oneof. Note this is *not* the same as
    /// [`Type::to_string`] for struct/enum, whose display form includes the
    /// full field list.
    fn name(&self) -> &str {
        match &self.0.data {
            TypeData::Primitive(kind) => kind.as_str(),
            TypeData::Struct { name, .. } => name,
            TypeData::Enum { name, .. } => name,
            TypeData::Oneof { synthetic_name, .. } => synthetic_name,
            // List/Map have no cheap borrowed name (it depends on their
            // contents); `Named` callers that need it use `to_string`.
            TypeData::List { .. } | TypeData::Map { .. } => "",
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0.data {
            TypeData::Primitive(kind) => write!(f, "{kind}"),
            TypeData::List { elem } => match elem.borrow().as_ref() {
                Some(elem) => write!(f, "[{elem}]"),
                None => write!(f, "[?]"),
            },
            TypeData::Map { key, value } => {
                let key = key.borrow();
                let value = value.borrow();
                match (key.as_ref(), value.as_ref()) {
                    (Some(k), Some(v)) => write!(f, "{{{k}, {v}}}"),
                    (Some(k), None) => write!(f, "{{{k}, ?}}"),
                    _ => write!(f, "{{?, ?}}"),
                }
            }
            TypeData::Struct { name, .. } => write!(f, "struct {name} {{...}}"),
            TypeData::Enum { name, .. } => write!(f, "enum {name} {{...}}"),
            TypeData::Oneof { .. } => write!(f, "oneof(...)"),
        }
    }
}

impl PartialEq for Type {
    /// Structural equality: same variant, and either the same primitive
    /// kind, the same element type (list), the same key/value types (map),
    /// or the same user-visible name (struct/enum/oneof).
    ///
    /// This means two structurally different struct types with the same
    /// name (possible only across scopes, without aliasing) compare equal.
    /// That's inherited behaviour from the tool this was distilled from,
    /// kept deliberately: within a single scope names are unique by
    /// construction, so it never bites in practice. See DESIGN.md.
    fn eq(&self, other: &Self) -> bool {
        match (&self.0.data, &other.0.data) {
            (TypeData::Primitive(a), TypeData::Primitive(b)) => a == b,
            (TypeData::List { elem: a }, TypeData::List { elem: b }) => {
                match (a.borrow().as_ref(), b.borrow().as_ref()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                }
            }
            (
                TypeData::Map {
                    key: ak,
                    value: av,
                },
                TypeData::Map {
                    key: bk,
                    value: bv,
                },
            ) => {
                let keys_eq = match (ak.borrow().as_ref(), bk.borrow().as_ref()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                };
                let values_eq = match (av.borrow().as_ref(), bv.borrow().as_ref()) {
                    (Some(a), Some(b)) => a == b,
                    _ => false,
                };
                keys_eq && values_eq
            }
            (TypeData::Struct { name: a, .. }, TypeData::Struct { name: b, .. }) => a == b,
            (TypeData::Enum { name: a, .. }, TypeData::Enum { name: b, .. }) => a == b,
            (
                TypeData::Oneof {
                    synthetic_name: a, ..
                },
                TypeData::Oneof {
                    synthetic_name: b, ..
                },
            ) => a == b,
            _ => false,
        }
    }
}

impl Eq for Type {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn loc() -> StmtInfo {
        StmtInfo::at_point(1, 1, Rc::new(PathBuf::from("test.tm")))
    }

    #[test]
    fn kind_predicates_are_exclusive() {
        let types = vec![
            Type::primitive(PrimitiveKind::Bool, loc()),
            Type::new_list(loc()),
            Type::new_map(loc()),
            Type::new_struct("A", true, loc()),
            Type::new_enum("B", true, loc()),
            Type::new_oneof(loc()),
        ];
        for ty in types {
            let flags = [
                ty.is_primitive(),
                ty.is_list(),
                ty.is_map(),
                ty.is_struct(),
                ty.is_enum(),
                ty.is_oneof(),
            ];
            assert_eq!(flags.iter().filter(|b| **b).count(), 1);
        }
    }

    #[test]
    fn struct_equality_is_by_name() {
        let a = Type::new_struct("Foo", true, loc());
        let b = Type::new_struct("Foo", false, loc());
        assert_eq!(a, b);
        let c = Type::new_struct("Bar", true, loc());
        assert_ne!(a, c);
    }

    #[test]
    fn list_equality_is_by_element_type() {
        let a = Type::new_list(loc());
        a.set_list_elem(Type::primitive(PrimitiveKind::I32, loc()));
        let b = Type::new_list(loc());
        b.set_list_elem(Type::primitive(PrimitiveKind::I32, loc()));
        assert_eq!(a, b);
        let c = Type::new_list(loc());
        c.set_list_elem(Type::primitive(PrimitiveKind::String, loc()));
        assert_ne!(a, c);
    }

    #[test]
    fn distinct_oneofs_are_never_equal() {
        let a = Type::new_oneof(loc());
        let b = Type::new_oneof(loc());
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn display_matches_grammar_shape() {
        let list = Type::new_list(loc());
        list.set_list_elem(Type::primitive(PrimitiveKind::I32, loc()));
        assert_eq!(list.to_string(), "[i32]");

        let map = Type::new_map(loc());
        map.set_map_key(Type::primitive(PrimitiveKind::String, loc()));
        map.set_map_value(Type::primitive(PrimitiveKind::Bool, loc()));
        assert_eq!(map.to_string(), "{string, bool}");
    }

    #[test]
    fn append_field_rejects_duplicate_names() {
        let s = Type::new_struct("S", true, loc());
        let f1 = Field {
            name: "x".into(),
            ty: Type::primitive(PrimitiveKind::I32, loc()),
            optional: false,
            location: loc(),
            doc_comments: vec![],
        };
        let f2 = Field {
            name: "x".into(),
            ty: Type::primitive(PrimitiveKind::String, loc()),
            optional: false,
            location: loc(),
            doc_comments: vec![],
        };
        assert!(s.append_field(f1));
        assert!(!s.append_field(f2));
    }
}
