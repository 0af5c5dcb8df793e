//! Static type hints attached to declared fields.
//!
//! A [`TypeHint`] is the declaration-time description of what a field holds.
//! It drives JSON Schema derivation only; field access never validates
//! values against it.

use std::any::{Any, TypeId};

use serde_json::Value;

/// Reference to an item class, used for nested item hints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClassRef {
    id: TypeId,
    name: &'static str,
}

impl ClassRef {
    /// Class reference for `T`.
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// `TypeId` of the referenced class.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Fully qualified name of the referenced class.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

/// Declaration-time type of a field.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeHint {
    /// No type information.
    Any,
    /// UTF-8 string.
    String,
    /// Integer number.
    Integer,
    /// Floating-point number.
    Number,
    /// Boolean.
    Boolean,
    /// Null.
    Null,
    /// Ordered collection with the given element type.
    Array(Box<TypeHint>),
    /// Unordered collection of unique elements.
    Set(Box<TypeHint>),
    /// String-keyed mapping with the given value type.
    Map(Box<TypeHint>),
    /// One of several alternative types, in declaration order.
    Union(Vec<TypeHint>),
    /// Either the inner type or null.
    Option(Box<TypeHint>),
    /// A closed set of literal values.
    Enum(Vec<Value>),
    /// A nested item class.
    Item(ClassRef),
}

impl TypeHint {
    /// Array hint with the given element type.
    pub fn array(element: TypeHint) -> Self {
        Self::Array(Box::new(element))
    }

    /// Set hint with the given element type.
    pub fn set(element: TypeHint) -> Self {
        Self::Set(Box::new(element))
    }

    /// Map hint with the given value type.
    pub fn map(value: TypeHint) -> Self {
        Self::Map(Box::new(value))
    }

    /// Optional hint: the inner type or null.
    pub fn optional(inner: TypeHint) -> Self {
        Self::Option(Box::new(inner))
    }

    /// Nested item hint for class `T`.
    pub fn item<T: Any>() -> Self {
        Self::Item(ClassRef::of::<T>())
    }

    /// JSON Schema type keyword for scalar hints; `None` for everything
    /// that needs structural expansion.
    pub(crate) fn simple_type(&self) -> Option<&'static str> {
        match self {
            Self::String => Some("string"),
            Self::Integer => Some("integer"),
            Self::Number => Some("number"),
            Self::Boolean => Some("boolean"),
            Self::Null => Some("null"),
            _ => None,
        }
    }

    /// True for plain string fields. Length constraints switch between
    /// `minLength`/`maxLength` and `minItems`/`maxItems` on this.
    pub(crate) fn is_string(&self) -> bool {
        matches!(self, Self::String)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_ref_identity() {
        assert_eq!(ClassRef::of::<String>(), ClassRef::of::<String>());
        assert_ne!(ClassRef::of::<String>().id(), ClassRef::of::<i64>().id());
    }

    #[test]
    fn test_simple_types() {
        assert_eq!(TypeHint::Integer.simple_type(), Some("integer"));
        assert_eq!(TypeHint::array(TypeHint::String).simple_type(), None);
        assert!(TypeHint::String.is_string());
        assert!(!TypeHint::optional(TypeHint::String).is_string());
    }
}
