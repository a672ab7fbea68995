//! Stack-based assembly of (possibly nested) list/map field types while
//! walking a `fieldType` CST node.
//!
//! Grounded on `walker.cc`'s `FieldTypeBuilder::start_type` /
//! `end_map_or_list_type` / `end_single_type`: a single `start_type` call
//! both (a) links the incoming type into whatever composite is currently on
//! top of the stack, at whatever position the walker last announced via
//! [`FieldTypeBuilder::set_location`], and (b) if the incoming type is
//! itself a list or map, pushes it so that subsequent `start_type` calls
//! fill it in as the traversal descends into its element/key/value.

use crate::ty::Type;

/// Where, relative to the composite type on top of the stack, the next
/// `start_type` call's type belongs. Set by the walker immediately before
/// each `start_type` call, driven by which CST position node it just entered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Location {
    Top,
    ListElement,
    MapKey,
    MapValue,
}

/// Raised when a map's key type turns out not to be primitive. The walker
/// catches this at the next CST exit event and turns it into a
/// `MapKeyNotPrimitive` diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapKeyNotPrimitive {
    pub found: String,
}

#[derive(Debug, Default)]
pub struct FieldTypeBuilder {
    stack: Vec<Type>,
    current_single: std::option::Option<Type>,
    location: std::option::Option<Location>,
}

impl FieldTypeBuilder {
    pub fn new() -> Self {
        FieldTypeBuilder::default()
    }

    pub fn set_location(&mut self, location: Location) {
        self.location = Some(location);
    }

    /// Feeds one fully-formed type into the builder. `ty` may itself be an
    /// empty list/map shell (about to be filled by later calls) or a
    /// complete primitive/custom/oneof type.
    pub fn start_type(&mut self, ty: Type) -> Result<(), MapKeyNotPrimitive> {
        if let Some(top) = self.stack.last() {
            if top.is_list() {
                if self.location == Some(Location::ListElement) {
                    top.set_list_elem(ty.clone());
                }
            } else if top.is_map() {
                match self.location {
                    Some(Location::MapKey) => {
                        if !ty.is_primitive() {
                            return Err(MapKeyNotPrimitive {
                                found: ty.to_string(),
                            });
                        }
                        top.set_map_key(ty.clone());
                    }
                    Some(Location::MapValue) => {
                        top.set_map_value(ty.clone());
                    }
                    _ => {}
                }
            }
        }

        if ty.is_list() || ty.is_map() {
            self.stack.push(ty);
        } else {
            self.current_single = Some(ty);
        }
        Ok(())
    }

    /// Pops the composite on top of the stack. Returns it only once the
    /// stack has emptied out (i.e. this was the outermost list/map); nested
    /// composites return `None` because they're already linked into their
    /// parent by `start_type`.
    pub fn end_map_or_list(&mut self) -> std::option::Option<Type> {
        let top = self.stack.pop()?;
        if self.stack.is_empty() {
            Some(top)
        } else {
            None
        }
    }

    /// Returns the last single (non-composite) type seen, but only when the
    /// stack is empty — otherwise it has already been stitched into its
    /// parent composite by `start_type` and there's nothing further to hand
    /// back to the caller.
    pub fn end_single(&self) -> std::option::Option<Type> {
        if self.stack.is_empty() {
            self.current_single.clone()
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::location::StmtInfo;
    use crate::ty::PrimitiveKind;
    use std::path::PathBuf;
    use std::rc::Rc;

    fn loc() -> StmtInfo {
        StmtInfo::at_point(1, 1, Rc::new(PathBuf::from("test.tm")))
    }

    #[test]
    fn plain_primitive_round_trips_through_end_single() {
        let mut b = FieldTypeBuilder::new();
        b.set_location(Location::Top);
        b.start_type(Type::primitive(PrimitiveKind::I32, loc())).unwrap();
        assert_eq!(b.end_single().unwrap(), Type::primitive(PrimitiveKind::I32, loc()));
    }

    #[test]
    fn nested_list_of_list_links_through_stack() {
        let mut b = FieldTypeBuilder::new();
        b.set_location(Location::Top);
        let outer = Type::new_list(loc());
        b.start_type(outer.clone()).unwrap();

        b.set_location(Location::ListElement);
        let inner = Type::new_list(loc());
        b.start_type(inner.clone()).unwrap();

        b.set_location(Location::ListElement);
        b.start_type(Type::primitive(PrimitiveKind::String, loc())).unwrap();

        assert!(b.end_map_or_list().is_none()); // pops `inner`, not outermost yet
        let completed = b.end_map_or_list().unwrap(); // pops `outer`
        assert_eq!(completed.to_string(), "[[string]]");
    }

    #[test]
    fn map_with_non_primitive_key_is_rejected() {
        let mut b = FieldTypeBuilder::new();
        b.set_location(Location::Top);
        let map = Type::new_map(loc());
        b.start_type(map).unwrap();

        b.set_location(Location::MapKey);
        let err = b
            .start_type(Type::new_struct("S", true, loc()))
            .unwrap_err();
        assert_eq!(err.found, "struct S {...}");
    }

    #[test]
    fn map_of_primitive_to_string_completes() {
        let mut b = FieldTypeBuilder::new();
        b.set_location(Location::Top);
        b.start_type(Type::new_map(loc())).unwrap();

        b.set_location(Location::MapKey);
        b.start_type(Type::primitive(PrimitiveKind::String, loc())).unwrap();

        b.set_location(Location::MapValue);
        b.start_type(Type::primitive(PrimitiveKind::Bool, loc())).unwrap();

        let completed = b.end_map_or_list().unwrap();
        assert_eq!(completed.to_string(), "{string, bool}");
    }
}
