//! Primitive kinds that cross the boundary with a canonical fixed layout.

use std::fmt;

use crate::TypeHash;

/// Primitive type kinds.
///
/// Every primitive has a fixed width and a little-endian canonical
/// encoding; booleans occupy one byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Bool,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Float,
    Double,
}

impl PrimitiveKind {
    /// All primitive kinds, in canonical order.
    pub const ALL: [PrimitiveKind; 11] = [
        PrimitiveKind::Bool,
        PrimitiveKind::Int8,
        PrimitiveKind::Int16,
        PrimitiveKind::Int32,
        PrimitiveKind::Int64,
        PrimitiveKind::Uint8,
        PrimitiveKind::Uint16,
        PrimitiveKind::Uint32,
        PrimitiveKind::Uint64,
        PrimitiveKind::Float,
        PrimitiveKind::Double,
    ];

    /// Parse a host (managed) primitive name, accepting `System.*` aliases.
    pub fn from_managed_name(name: &str) -> Option<Self> {
        let kind = match name {
            "bool" | "System.Boolean" => PrimitiveKind::Bool,
            "sbyte" | "System.SByte" => PrimitiveKind::Int8,
            "short" | "System.Int16" => PrimitiveKind::Int16,
            "int" | "System.Int32" => PrimitiveKind::Int32,
            "long" | "System.Int64" => PrimitiveKind::Int64,
            "byte" | "System.Byte" => PrimitiveKind::Uint8,
            "ushort" | "System.UInt16" => PrimitiveKind::Uint16,
            "uint" | "System.UInt32" => PrimitiveKind::Uint32,
            "ulong" | "System.UInt64" => PrimitiveKind::Uint64,
            "float" | "System.Single" => PrimitiveKind::Float,
            "double" | "System.Double" => PrimitiveKind::Double,
            _ => return None,
        };
        Some(kind)
    }

    /// The managed-side spelling of this primitive.
    pub const fn managed_name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Int8 => "sbyte",
            PrimitiveKind::Int16 => "short",
            PrimitiveKind::Int32 => "int",
            PrimitiveKind::Int64 => "long",
            PrimitiveKind::Uint8 => "byte",
            PrimitiveKind::Uint16 => "ushort",
            PrimitiveKind::Uint32 => "uint",
            PrimitiveKind::Uint64 => "ulong",
            PrimitiveKind::Float => "float",
            PrimitiveKind::Double => "double",
        }
    }

    /// The native (Rust) spelling of this primitive.
    pub const fn native_name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Int8 => "i8",
            PrimitiveKind::Int16 => "i16",
            PrimitiveKind::Int32 => "i32",
            PrimitiveKind::Int64 => "i64",
            PrimitiveKind::Uint8 => "u8",
            PrimitiveKind::Uint16 => "u16",
            PrimitiveKind::Uint32 => "u32",
            PrimitiveKind::Uint64 => "u64",
            PrimitiveKind::Float => "f32",
            PrimitiveKind::Double => "f64",
        }
    }

    /// Size in bytes of the canonical encoding (and of the in-memory field).
    pub const fn size(self) -> u32 {
        match self {
            PrimitiveKind::Bool | PrimitiveKind::Int8 | PrimitiveKind::Uint8 => 1,
            PrimitiveKind::Int16 | PrimitiveKind::Uint16 => 2,
            PrimitiveKind::Int32 | PrimitiveKind::Uint32 | PrimitiveKind::Float => 4,
            PrimitiveKind::Int64 | PrimitiveKind::Uint64 | PrimitiveKind::Double => 8,
        }
    }

    /// Natural alignment; equal to the size for every primitive.
    pub const fn align(self) -> u32 {
        self.size()
    }

    /// Whether this kind is an integer usable as an enum representation.
    pub const fn is_integer(self) -> bool {
        !matches!(self, PrimitiveKind::Bool | PrimitiveKind::Float | PrimitiveKind::Double)
    }

    /// Identity hash, computed from the managed spelling.
    pub fn type_hash(self) -> TypeHash {
        TypeHash::from_name(self.managed_name())
    }
}

impl fmt::Display for PrimitiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.managed_name())
    }
}
