//! Conversion traits between Rust values and [`Value`].
//!
//! - [`FromValue`]: extract a Rust value from a [`Value`]
//! - [`IntoValue`]: convert a Rust value into a [`Value`]
//!
//! Integers convert from any integer variant as long as the value fits;
//! narrowing is range-checked and reports [`MarshalError::IntegerOverflow`].
//! Generated mirror types implement [`BridgeStruct`], [`BridgeEnum`] or
//! [`HandleType`] and route their conversions through the helpers below.

use hostbridge_core::{
    ArrayValue, Handle, MarshalError, StructValue, TypeHash, TypeKind, Value,
};

/// Extract a Rust value from a [`Value`].
pub trait FromValue: Sized {
    fn from_value(value: Value) -> Result<Self, MarshalError>;
}

/// Convert a Rust value into a [`Value`].
pub trait IntoValue {
    fn into_value(self) -> Value;
}

fn mismatch(expected: &str, actual: &Value) -> MarshalError {
    MarshalError::TypeMismatch {
        expected: expected.to_string(),
        actual: actual.type_name().to_string(),
    }
}

/// Widen any integer value; `None` for non-integers.
fn as_i128(value: &Value) -> Option<i128> {
    Some(match *value {
        Value::I8(v) => v.into(),
        Value::I16(v) => v.into(),
        Value::I32(v) => v.into(),
        Value::I64(v) => v.into(),
        Value::U8(v) => v.into(),
        Value::U16(v) => v.into(),
        Value::U32(v) => v.into(),
        Value::U64(v) => v.into(),
        _ => return None,
    })
}

// ============================================================================
// Integer implementations
// ============================================================================

macro_rules! impl_value_int {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: Value) -> Result<Self, MarshalError> {
                    let Some(wide) = as_i128(&value) else {
                        return Err(mismatch(stringify!($ty), &value));
                    };
                    <$ty>::try_from(wide).map_err(|_| MarshalError::IntegerOverflow {
                        value: wide,
                        target_type: stringify!($ty),
                    })
                }
            }

            impl IntoValue for $ty {
                fn into_value(self) -> Value {
                    Value::$variant(self)
                }
            }
        )*
    };
}

impl_value_int!(
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
);

// ============================================================================
// Float implementations
// ============================================================================

impl FromValue for f32 {
    fn from_value(value: Value) -> Result<Self, MarshalError> {
        match value {
            Value::F32(v) => Ok(v),
            // Narrowing loses precision but keeps finite values finite
            Value::F64(v) if !v.is_finite() || v.abs() <= f64::from(f32::MAX) => Ok(v as f32),
            Value::F64(v) => Err(MarshalError::TypeMismatch {
                expected: "float".to_string(),
                actual: format!("double {v} out of range"),
            }),
            other => Err(mismatch("float", &other)),
        }
    }
}

impl IntoValue for f32 {
    fn into_value(self) -> Value {
        Value::F32(self)
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Result<Self, MarshalError> {
        match value {
            Value::F64(v) => Ok(v),
            Value::F32(v) => Ok(v.into()),
            other => Err(mismatch("double", &other)),
        }
    }
}

impl IntoValue for f64 {
    fn into_value(self) -> Value {
        Value::F64(self)
    }
}

// ============================================================================
// Boolean, string and unit
// ============================================================================

impl FromValue for bool {
    fn from_value(value: Value) -> Result<Self, MarshalError> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(mismatch("bool", &other)),
        }
    }
}

impl IntoValue for bool {
    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Result<Self, MarshalError> {
        match value {
            Value::String(s) => Ok(s),
            other => Err(mismatch("string", &other)),
        }
    }
}

impl IntoValue for String {
    fn into_value(self) -> Value {
        Value::String(self)
    }
}

impl IntoValue for &str {
    fn into_value(self) -> Value {
        Value::String(self.to_owned())
    }
}

impl FromValue for () {
    fn from_value(value: Value) -> Result<Self, MarshalError> {
        match value {
            Value::Void => Ok(()),
            other => Err(mismatch("void", &other)),
        }
    }
}

impl IntoValue for () {
    fn into_value(self) -> Value {
        Value::Void
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> Result<Self, MarshalError> {
        Ok(value)
    }
}

impl IntoValue for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl FromValue for Handle {
    fn from_value(value: Value) -> Result<Self, MarshalError> {
        match value {
            Value::Object(h) | Value::Delegate(h) => Ok(h),
            Value::Null => Ok(Handle::NULL),
            other => Err(mismatch("handle", &other)),
        }
    }
}

// ============================================================================
// Nullable references and arrays
// ============================================================================

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> Result<Self, MarshalError> {
        if value.is_null() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}

impl<T: IntoValue> IntoValue for Option<T> {
    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Null,
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: Value) -> Result<Self, MarshalError> {
        match value {
            Value::Array(array) if array.rank() == 1 => {
                array.items.into_iter().map(T::from_value).collect()
            }
            other => Err(mismatch("single-dimensional array", &other)),
        }
    }
}

impl<T: IntoValue> IntoValue for Vec<T> {
    fn into_value(self) -> Value {
        Value::Array(ArrayValue::vector(
            self.into_iter().map(IntoValue::into_value).collect(),
        ))
    }
}

/// Multi-dimensional arrays cross as the raw row-major value.
impl FromValue for ArrayValue {
    fn from_value(value: Value) -> Result<Self, MarshalError> {
        match value {
            Value::Array(array) => Ok(array),
            other => Err(mismatch("array", &other)),
        }
    }
}

impl IntoValue for ArrayValue {
    fn into_value(self) -> Value {
        Value::Array(self)
    }
}

// ============================================================================
// Generated mirror types
// ============================================================================

/// A flat struct mirrored byte-for-byte on both sides.
///
/// Implemented by generated `#[repr(C)]` mirrors; the layout assertions the
/// generator emits guarantee that `size_of::<Self>()` matches the
/// descriptor.
pub trait BridgeStruct: bytemuck::Pod {
    const TYPE_HASH: TypeHash;
    const TYPE_NAME: &'static str;
}

/// Convert a mirror struct into its raw layout bytes.
pub fn struct_to_value<T: BridgeStruct>(value: &T) -> Value {
    Value::Struct(StructValue {
        type_hash: T::TYPE_HASH,
        bytes: bytemuck::bytes_of(value).to_vec(),
    })
}

/// Read a mirror struct back out of its raw layout bytes.
pub fn struct_from_value<T: BridgeStruct>(value: Value) -> Result<T, MarshalError> {
    match value {
        Value::Struct(s) if s.type_hash == T::TYPE_HASH => {
            bytemuck::try_pod_read_unaligned(&s.bytes).map_err(|_| MarshalError::StructSize {
                type_name: T::TYPE_NAME.to_string(),
                expected: std::mem::size_of::<T>(),
                actual: s.bytes.len(),
            })
        }
        other => Err(mismatch(T::TYPE_NAME, &other)),
    }
}

/// An enum mirrored by its underlying integer.
pub trait BridgeEnum: Copy {
    const TYPE_HASH: TypeHash;
    const TYPE_NAME: &'static str;

    fn to_raw(self) -> i64;
    fn from_raw(raw: i64) -> Option<Self>;
}

pub fn enum_to_value<T: BridgeEnum>(value: T) -> Value {
    Value::Enum {
        type_hash: T::TYPE_HASH,
        value: value.to_raw(),
    }
}

pub fn enum_from_value<T: BridgeEnum>(value: Value) -> Result<T, MarshalError> {
    match value {
        Value::Enum { type_hash, value } if type_hash == T::TYPE_HASH => {
            T::from_raw(value).ok_or_else(|| MarshalError::TypeMismatch {
                expected: T::TYPE_NAME.to_string(),
                actual: format!("undeclared value {value}"),
            })
        }
        other => Err(mismatch(T::TYPE_NAME, &other)),
    }
}

/// A reference type (class or delegate) represented by a handle newtype.
pub trait HandleType: Copy {
    const TYPE_HASH: TypeHash;
    const TYPE_NAME: &'static str;
    /// [`TypeKind::Class`] or [`TypeKind::Delegate`].
    const KIND: TypeKind;

    fn from_handle(handle: Handle) -> Self;
    fn handle(self) -> Handle;
}

pub fn handle_to_value<T: HandleType>(value: T) -> Value {
    match T::KIND {
        TypeKind::Delegate => Value::Delegate(value.handle()),
        _ => Value::Object(value.handle()),
    }
}

/// Null is rejected; use `Option<T>` for nullable references.
pub fn handle_from_value<T: HandleType>(value: Value) -> Result<T, MarshalError> {
    match (&value, T::KIND) {
        (Value::Object(h), TypeKind::Class) | (Value::Delegate(h), TypeKind::Delegate) if !h.is_null() => {
            Ok(T::from_handle(*h))
        }
        _ => Err(mismatch(T::TYPE_NAME, &value)),
    }
}

/// Caller-supplied storage for an `out` parameter.
///
/// The callee must assign it; a crossing whose callee leaves an `out`
/// argument unassigned fails with [`MarshalError::UnassignedOut`] before
/// the slot is touched.
#[derive(Debug, Clone, PartialEq)]
pub struct OutSlot<T> {
    value: Option<T>,
}

impl<T> Default for OutSlot<T> {
    fn default() -> Self {
        Self { value: None }
    }
}

impl<T> OutSlot<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, value: T) {
        self.value = Some(value);
    }

    pub fn is_set(&self) -> bool {
        self.value.is_some()
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn take(&mut self) -> Option<T> {
        self.value.take()
    }

    pub fn into_inner(self) -> Option<T> {
        self.value
    }
}
