// Engine-side type descriptors handed to the synthesizer.

use std::fmt;

use indexmap::IndexMap;

use crate::registry::TypeHandle;

/// Marker a composite type name carries when the property is an array of it.
pub const ARRAY_MARKER: &str = "[]";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Boolean,
    Byte,
    Short,
    Char,
    Int,
    Long,
    Float,
    Double,
}

impl Primitive {
    pub fn name(self) -> &'static str {
        match self {
            Primitive::Boolean => "boolean",
            Primitive::Byte => "byte",
            Primitive::Short => "short",
            Primitive::Char => "char",
            Primitive::Int => "int",
            Primitive::Long => "long",
            Primitive::Float => "float",
            Primitive::Double => "double",
        }
    }

    pub fn boxed_name(self) -> &'static str {
        match self {
            Primitive::Boolean => "Boolean",
            Primitive::Byte => "Byte",
            Primitive::Short => "Short",
            Primitive::Char => "Character",
            Primitive::Int => "Integer",
            Primitive::Long => "Long",
            Primitive::Float => "Float",
            Primitive::Double => "Double",
        }
    }
}

/// A value class as the engine sees it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassRef {
    /// Unboxed primitive; never null.
    Primitive(Primitive),
    /// Boxed wrapper of a primitive; may be null.
    Boxed(Primitive),
    String,
    CharSequence,
    Array(Box<ClassRef>),
    /// A class with mapping capability.
    Map(String),
    /// Anything else, by class name.
    Other(String),
}

impl ClassRef {
    pub fn array_of(component: ClassRef) -> Self {
        ClassRef::Array(Box::new(component))
    }

    /// Boxed form of the class. Only unboxed primitives change.
    pub fn boxed(&self) -> ClassRef {
        match self {
            ClassRef::Primitive(p) => ClassRef::Boxed(*p),
            other => other.clone(),
        }
    }

    /// A class is nullable when it is already its own boxed form.
    pub fn is_nullable(&self) -> bool {
        !matches!(self, ClassRef::Primitive(_))
    }

    pub fn is_string_like(&self) -> bool {
        matches!(self, ClassRef::String | ClassRef::CharSequence)
    }
}

impl fmt::Display for ClassRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassRef::Primitive(p) => f.write_str(p.name()),
            ClassRef::Boxed(p) => f.write_str(p.boxed_name()),
            ClassRef::String => f.write_str("String"),
            ClassRef::CharSequence => f.write_str("CharSequence"),
            ClassRef::Array(component) => write!(f, "{component}{ARRAY_MARKER}"),
            ClassRef::Map(name) | ClassRef::Other(name) => f.write_str(name),
        }
    }
}

/// Declared type of one property.
#[derive(Debug, Clone)]
pub enum TypeRef {
    None,
    /// Primitive, boxed, string, array or map class.
    Class(ClassRef),
    /// Composite type by registered name, optionally suffixed with `[]`.
    Named(String),
    Composite(TypeHandle),
    /// Array of composite types. Elements share one type; the first is used.
    CompositeArray(Vec<TypeHandle>),
    /// Nested map-of-properties descriptor.
    Nested(IndexMap<String, TypeRef>),
}

impl From<ClassRef> for TypeRef {
    fn from(class: ClassRef) -> Self {
        TypeRef::Class(class)
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::None => f.write_str("null"),
            TypeRef::Class(class) => write!(f, "{class}"),
            TypeRef::Named(name) => f.write_str(name),
            TypeRef::Composite(handle) => f.write_str(&handle.name),
            TypeRef::CompositeArray(handles) => match handles.first() {
                Some(handle) => write!(f, "{}{ARRAY_MARKER}", handle.name),
                None => f.write_str(ARRAY_MARKER),
            },
            TypeRef::Nested(props) => {
                f.write_str("{")?;
                for (i, (name, ty)) in props.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{name}={ty}")?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Splits a trailing array marker off a composite type name.
pub fn strip_array_marker(name: &str) -> (&str, bool) {
    match name.strip_suffix(ARRAY_MARKER) {
        Some(bare) => (bare, true),
        None => (name, false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boxing() {
        let int = ClassRef::Primitive(Primitive::Int);
        assert_eq!(int.boxed(), ClassRef::Boxed(Primitive::Int));
        assert!(!int.is_nullable());
        assert!(ClassRef::Boxed(Primitive::Int).is_nullable());
        assert!(ClassRef::String.is_nullable());
        assert_eq!(ClassRef::String.boxed(), ClassRef::String);
    }

    #[test]
    fn display_names() {
        assert_eq!(ClassRef::array_of(ClassRef::Primitive(Primitive::Byte)).to_string(), "byte[]");
        assert_eq!(ClassRef::Boxed(Primitive::Char).to_string(), "Character");
        let mut nested = IndexMap::new();
        nested.insert("a".to_string(), TypeRef::Class(ClassRef::String));
        nested.insert("b".to_string(), TypeRef::None);
        assert_eq!(TypeRef::Nested(nested).to_string(), "{a=String, b=null}");
    }

    #[test]
    fn array_marker() {
        assert_eq!(strip_array_marker("Item[]"), ("Item", true));
        assert_eq!(strip_array_marker("Item"), ("Item", false));
    }
}
