//! Current-field / current-custom-type holder driving struct and oneof
//! construction as the ref-phase walker traverses `structField` nodes.
//!
//! `custom_type.h`'s `CustomType<F>` template is generic over the field
//! kind so that `StructType` and `EnumType` can share one base. Here that
//! split falls out naturally from [`crate::ty::Type`] itself (its `Struct`
//! and `Enum` variants already carry their own field-list storage and
//! duplicate-name check via [`crate::ty::Type::append_field`] /
//! [`crate::ty::Type::append_enum_field`]), so this builder only needs to
//! hold the *in-progress* field for struct/oneof construction: enum members
//! are simple enough (name, value, location, doc comments — no nested type
//! to assemble) that the ref-phase walker builds them directly without an
//! intermediate builder, per the concrete `enterEnumField` handling it's
//! given.

use crate::location::StmtInfo;
use crate::ty::{Field, Type};

/// Raised by [`CustomTypeBuilder::end_field`] when the field being closed
/// shares a name with one already appended to the current custom type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicateFieldDecl {
    pub name: String,
}

struct PartialField {
    name: String,
    location: StmtInfo,
    doc_comments: Vec<String>,
    optional: bool,
    ty: std::option::Option<Type>,
}

/// Assembles fields into a struct or oneof [`Type`] shell as the walker
/// descends through its `structField` children.
#[derive(Default)]
pub struct CustomTypeBuilder {
    current_custom: std::option::Option<Type>,
    current_field: std::option::Option<PartialField>,
}

impl CustomTypeBuilder {
    pub fn new() -> Self {
        CustomTypeBuilder::default()
    }

    /// Brackets the outer struct/oneof type; `custom` is the declared shell
    /// (struct) or a freshly created anonymous shell (oneof).
    pub fn start_custom(&mut self, custom: Type) {
        self.current_custom = Some(custom);
    }

    /// Starts a new field with its name, location and doc comments already
    /// known; its type and optionality are filled in by the calls below.
    pub fn start_field(
        &mut self,
        name: impl Into<String>,
        location: StmtInfo,
        doc_comments: Vec<String>,
    ) {
        self.current_field = Some(PartialField {
            name: name.into(),
            location,
            doc_comments,
            optional: false,
            ty: None,
        });
    }

    /// Plugs the type [`crate::builder::field_type::FieldTypeBuilder`]
    /// finished assembling into the field currently being stashed.
    pub fn set_current_field_type(&mut self, ty: Type) {
        if let Some(field) = &mut self.current_field {
            field.ty = Some(ty);
        }
    }

    pub fn set_current_field_optional(&mut self, optional: bool) {
        if let Some(field) = &mut self.current_field {
            field.optional = optional;
        }
    }

    /// Closes the current field, appending it to the custom type being
    /// built. Returns `Err` without appending if a field of the same name
    /// is already present; the caller still loses the in-progress field
    /// either way (it was already consumed by `take`).
    pub fn end_field(&mut self) -> Result<(), DuplicateFieldDecl> {
        let field = self
            .current_field
            .take()
            .expect("end_field called with no field in progress");
        let custom = self
            .current_custom
            .as_ref()
            .expect("end_field called with no custom type in progress");
        let built = Field {
            name: field.name.clone(),
            ty: field
                .ty
                .expect("end_field called before the field's type was set"),
            optional: field.optional,
            location: field.location,
            doc_comments: field.doc_comments,
        };
        if custom.append_field(built) {
            Ok(())
        } else {
            Err(DuplicateFieldDecl { name: field.name })
        }
    }

    /// Closes out the custom type, handing it back to the caller for
    /// insertion into the `Document`.
    pub fn end_custom(&mut self) -> Type {
        self.current_custom
            .take()
            .expect("end_custom called with no custom type in progress")
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
    fn builds_a_struct_with_two_fields() {
        let mut b = CustomTypeBuilder::new();
        b.start_custom(Type::new_struct("Point", true, loc()));

        b.start_field("x", loc(), vec![]);
        b.set_current_field_type(Type::primitive(PrimitiveKind::I32, loc()));
        b.end_field().unwrap();

        b.start_field("y", loc(), vec![]);
        b.set_current_field_type(Type::primitive(PrimitiveKind::I32, loc()));
        b.set_current_field_optional(true);
        b.end_field().unwrap();

        let built = b.end_custom();
        assert_eq!(built.to_string(), "struct Point {...}");
        let fields = built.struct_fields().unwrap();
        assert_eq!(fields[0].name, "x");
        assert!(!fields[0].optional);
        assert_eq!(fields[1].name, "y");
        assert!(fields[1].optional);
    }

    #[test]
    fn duplicate_field_name_is_rejected() {
        let mut b = CustomTypeBuilder::new();
        b.start_custom(Type::new_struct("Point", true, loc()));
        b.start_field("x", loc(), vec![]);
        b.set_current_field_type(Type::primitive(PrimitiveKind::I32, loc()));
        b.end_field().unwrap();

        b.start_field("x", loc(), vec![]);
        b.set_current_field_type(Type::primitive(PrimitiveKind::String, loc()));
        let err = b.end_field().unwrap_err();
        assert_eq!(err.name, "x");
    }
}
