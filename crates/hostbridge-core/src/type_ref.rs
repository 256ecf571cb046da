//! Resolved type references used in member signatures.

use std::fmt;

use crate::{PrimitiveKind, TypeHash};

const ARRAY_MARKER: u64 = 0x6a09e667f3bcc909;

/// A resolved reference to a type, as it appears in a signature or field.
///
/// Named types (classes, structs, enums, delegates) are referenced by hash;
/// the owning [`BindingModel`](crate::BindingModel) maps the hash to a
/// [`TypeDescriptor`](crate::TypeDescriptor).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// No value (only valid as a return type).
    Void,
    /// Fixed-width primitive.
    Primitive(PrimitiveKind),
    /// Length-prefixed UTF-8 string, copied on every crossing.
    String,
    /// A class, struct, enum or delegate described in the model.
    Named(TypeHash),
    /// Single-dimensional, multi-dimensional or jagged array.
    Array(Box<ArrayType>),
}

/// Array element type and rank.
///
/// A jagged array is an array whose element is itself an array.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArrayType {
    pub element: TypeRef,
    pub rank: u8,
}

impl TypeRef {
    /// Create an array reference.
    pub fn array(element: TypeRef, rank: u8) -> Self {
        TypeRef::Array(Box::new(ArrayType { element, rank }))
    }

    /// Check whether this is `void`.
    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    /// Get the named type hash, if this refers to a model type.
    pub fn named(&self) -> Option<TypeHash> {
        match self {
            TypeRef::Named(hash) => Some(*hash),
            _ => None,
        }
    }

    /// Get the array payload, if this is an array.
    pub fn as_array(&self) -> Option<&ArrayType> {
        match self {
            TypeRef::Array(array) => Some(array),
            _ => None,
        }
    }

    /// Identity hash used when hashing signatures.
    pub fn type_hash(&self) -> TypeHash {
        match self {
            TypeRef::Void => TypeHash::from_name("void"),
            TypeRef::Primitive(kind) => kind.type_hash(),
            TypeRef::String => TypeHash::from_name("string"),
            TypeRef::Named(hash) => *hash,
            TypeRef::Array(array) => TypeHash(
                array.element.type_hash().0.rotate_left(7)
                    ^ ARRAY_MARKER.wrapping_mul(u64::from(array.rank) + 1),
            ),
        }
    }

    /// Visit every named type hash reachable from this reference.
    pub fn for_each_named(&self, f: &mut impl FnMut(TypeHash)) {
        match self {
            TypeRef::Named(hash) => f(*hash),
            TypeRef::Array(array) => array.element.for_each_named(f),
            _ => {}
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => write!(f, "void"),
            TypeRef::Primitive(kind) => write!(f, "{kind}"),
            TypeRef::String => write!(f, "string"),
            TypeRef::Named(hash) => write!(f, "<{hash}>"),
            TypeRef::Array(array) => {
                write!(f, "{}[{}]", array.element, ",".repeat(array.rank.saturating_sub(1) as usize))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_hash_depends_on_rank() {
        let one = TypeRef::array(TypeRef::Primitive(PrimitiveKind::Int32), 1);
        let two = TypeRef::array(TypeRef::Primitive(PrimitiveKind::Int32), 2);
        assert_ne!(one.type_hash(), two.type_hash());
    }

    #[test]
    fn jagged_differs_from_multi() {
        let int = TypeRef::Primitive(PrimitiveKind::Int32);
        let jagged = TypeRef::array(TypeRef::array(int.clone(), 1), 1);
        let multi = TypeRef::array(int, 2);
        assert_ne!(jagged.type_hash(), multi.type_hash());
        assert_eq!(jagged.to_string(), "int[][]");
        assert_eq!(multi.to_string(), "int[,]");
    }

    #[test]
    fn for_each_named_descends_into_arrays() {
        let hash = TypeHash::from_name("Enemy");
        let ty = TypeRef::array(TypeRef::array(TypeRef::Named(hash), 1), 1);
        let mut seen = Vec::new();
        ty.for_each_named(&mut |h| seen.push(h));
        assert_eq!(seen, vec![hash]);
    }
}
