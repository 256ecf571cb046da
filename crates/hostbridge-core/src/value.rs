//! Runtime values exchanged at a boundary crossing.

use std::fmt;

use crate::{Handle, PrimitiveKind, TypeHash};

/// A value in transit across the boundary.
///
/// Every variant is owned: strings and arrays are copies, structs are raw
/// layout bytes, and reference types are represented only by handles.
#[derive(Clone, PartialEq)]
pub enum Value {
    /// No value.
    Void,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    /// Owned UTF-8 copy.
    String(String),
    /// Enum value widened to `i64`.
    Enum { type_hash: TypeHash, value: i64 },
    /// Flat struct as raw layout bytes.
    Struct(StructValue),
    /// Handle to a reference-type object.
    Object(Handle),
    /// Handle to a delegate.
    Delegate(Handle),
    /// Array of any rank.
    Array(ArrayValue),
    /// Null reference.
    Null,
}

/// A flat struct copied byte-for-byte in its canonical layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructValue {
    pub type_hash: TypeHash,
    pub bytes: Vec<u8>,
}

/// An array value in row-major order.
///
/// `dims` has one entry per rank; jagged arrays nest `Value::Array`
/// elements inside a rank-1 array.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    pub dims: Vec<u32>,
    pub items: Vec<Value>,
}

impl ArrayValue {
    /// Single-dimensional array.
    pub fn vector(items: Vec<Value>) -> Self {
        Self {
            dims: vec![items.len() as u32],
            items,
        }
    }

    /// Multi-dimensional array; returns `None` if `dims` does not match the
    /// number of items or has more than `u8::MAX` dimensions.
    pub fn with_dims(dims: Vec<u32>, items: Vec<Value>) -> Option<Self> {
        if dims.is_empty() || u8::try_from(dims.len()).is_err() {
            return None;
        }
        let expected = dims.iter().try_fold(1usize, |acc, d| acc.checked_mul(*d as usize))?;
        (expected == items.len()).then_some(Self { dims, items })
    }

    /// Number of dimensions, saturating at `u8::MAX`.
    pub fn rank(&self) -> u8 {
        u8::try_from(self.dims.len()).unwrap_or(u8::MAX)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl Value {
    /// Get a human-readable name for this value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Void => "void",
            Value::Bool(_) => "bool",
            Value::I8(_) => "sbyte",
            Value::I16(_) => "short",
            Value::I32(_) => "int",
            Value::I64(_) => "long",
            Value::U8(_) => "byte",
            Value::U16(_) => "ushort",
            Value::U32(_) => "uint",
            Value::U64(_) => "ulong",
            Value::F32(_) => "float",
            Value::F64(_) => "double",
            Value::String(_) => "string",
            Value::Enum { .. } => "enum",
            Value::Struct(_) => "struct",
            Value::Object(_) => "object",
            Value::Delegate(_) => "delegate",
            Value::Array(_) => "array",
            Value::Null => "null",
        }
    }

    /// Primitive kind of this value, if it is a primitive.
    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        let kind = match self {
            Value::Bool(_) => PrimitiveKind::Bool,
            Value::I8(_) => PrimitiveKind::Int8,
            Value::I16(_) => PrimitiveKind::Int16,
            Value::I32(_) => PrimitiveKind::Int32,
            Value::I64(_) => PrimitiveKind::Int64,
            Value::U8(_) => PrimitiveKind::Uint8,
            Value::U16(_) => PrimitiveKind::Uint16,
            Value::U32(_) => PrimitiveKind::Uint32,
            Value::U64(_) => PrimitiveKind::Uint64,
            Value::F32(_) => PrimitiveKind::Float,
            Value::F64(_) => PrimitiveKind::Double,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }

    /// Null references and null handles both count as null.
    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Object(h) | Value::Delegate(h) => h.is_null(),
            _ => false,
        }
    }

    /// The handle carried by an object or delegate value.
    pub fn handle(&self) -> Option<Handle> {
        match self {
            Value::Object(h) | Value::Delegate(h) => Some(*h),
            _ => None,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => write!(f, "Void"),
            Value::Bool(v) => write!(f, "Bool({v})"),
            Value::I8(v) => write!(f, "I8({v})"),
            Value::I16(v) => write!(f, "I16({v})"),
            Value::I32(v) => write!(f, "I32({v})"),
            Value::I64(v) => write!(f, "I64({v})"),
            Value::U8(v) => write!(f, "U8({v})"),
            Value::U16(v) => write!(f, "U16({v})"),
            Value::U32(v) => write!(f, "U32({v})"),
            Value::U64(v) => write!(f, "U64({v})"),
            Value::F32(v) => write!(f, "F32({v})"),
            Value::F64(v) => write!(f, "F64({v})"),
            Value::String(s) => write!(f, "String({s:?})"),
            Value::Enum { value, .. } => write!(f, "Enum({value})"),
            Value::Struct(s) => write!(f, "Struct({} bytes)", s.bytes.len()),
            Value::Object(h) => write!(f, "Object({h:?})"),
            Value::Delegate(h) => write!(f, "Delegate({h:?})"),
            Value::Array(a) => write!(f, "Array({:?}, {:?})", a.dims, a.items),
            Value::Null => write!(f, "Null"),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Void
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_owned())
    }
}
