//! Canonical wire layout.
//!
//! Both sides of a crossing agree on this byte layout:
//!
//! | Type       | Encoding                                              |
//! |------------|-------------------------------------------------------|
//! | integers   | fixed-width little-endian                             |
//! | floats     | IEEE-754 little-endian                                |
//! | bool       | one byte, `0` or `1`; anything else is rejected       |
//! | string     | `u32` byte length + UTF-8 bytes, no terminator        |
//! | enum       | underlying integer                                    |
//! | struct     | raw layout bytes                                      |
//! | class      | handle as `u64` (`0` for null)                        |
//! | delegate   | handle as `u64` (`0` for null)                        |
//! | array      | rank byte + `u32` per dimension + row-major elements  |
//!
//! A call request carries the receiver and every `in`/`ref` argument in
//! parameter order. A response carries the return value followed by every
//! `out`/`ref` argument in parameter order.

use hostbridge_core::{
    ArrayRankError, ArrayValue, BindingModel, BridgeResult, Handle, MarshalError, ParamDescriptor,
    PrimitiveKind, StructValue, TypeKind, TypeRef, Value,
};

/// Append-only encoder.
#[derive(Debug, Default)]
pub struct WireWriter {
    buf: Vec<u8>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn put_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn put_bool(&mut self, v: bool) {
        self.buf.push(u8::from(v));
    }

    pub fn put_u32(&mut self, v: u32) {
        self.put_bytes(&v.to_le_bytes());
    }

    pub fn put_u64(&mut self, v: u64) {
        self.put_bytes(&v.to_le_bytes());
    }

    pub fn put_str(&mut self, s: &str) -> Result<(), MarshalError> {
        let len = u32::try_from(s.len()).map_err(|_| MarshalError::IntegerOverflow {
            value: s.len() as i128,
            target_type: "u32",
        })?;
        self.put_u32(len);
        self.put_bytes(s.as_bytes());
        Ok(())
    }

    pub fn put_handle(&mut self, handle: Handle) {
        self.put_u64(handle.to_bits());
    }

    /// Write an integer in the width of `kind`, checking its range.
    pub fn put_int(&mut self, kind: PrimitiveKind, v: i128) -> Result<(), MarshalError> {
        let overflow = || MarshalError::IntegerOverflow {
            value: v,
            target_type: kind.managed_name(),
        };
        match kind {
            PrimitiveKind::Int8 => self.put_bytes(&i8::try_from(v).map_err(|_| overflow())?.to_le_bytes()),
            PrimitiveKind::Int16 => self.put_bytes(&i16::try_from(v).map_err(|_| overflow())?.to_le_bytes()),
            PrimitiveKind::Int32 => self.put_bytes(&i32::try_from(v).map_err(|_| overflow())?.to_le_bytes()),
            PrimitiveKind::Int64 => self.put_bytes(&i64::try_from(v).map_err(|_| overflow())?.to_le_bytes()),
            PrimitiveKind::Uint8 => self.put_bytes(&u8::try_from(v).map_err(|_| overflow())?.to_le_bytes()),
            PrimitiveKind::Uint16 => self.put_bytes(&u16::try_from(v).map_err(|_| overflow())?.to_le_bytes()),
            PrimitiveKind::Uint32 => self.put_bytes(&u32::try_from(v).map_err(|_| overflow())?.to_le_bytes()),
            PrimitiveKind::Uint64 => self.put_bytes(&u64::try_from(v).map_err(|_| overflow())?.to_le_bytes()),
            PrimitiveKind::Bool | PrimitiveKind::Float | PrimitiveKind::Double => {
                return Err(MarshalError::TypeMismatch {
                    expected: kind.managed_name().to_string(),
                    actual: "integer".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Cursor over an encoded buffer.
#[derive(Debug)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], MarshalError> {
        if n > self.remaining() {
            return Err(MarshalError::Truncated {
                needed: n,
                remaining: self.remaining(),
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], MarshalError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn get_u8(&mut self) -> Result<u8, MarshalError> {
        Ok(self.take(1)?[0])
    }

    pub fn get_bool(&mut self) -> Result<bool, MarshalError> {
        match self.get_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(MarshalError::InvalidBool(other)),
        }
    }

    pub fn get_u32(&mut self) -> Result<u32, MarshalError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    pub fn get_u64(&mut self) -> Result<u64, MarshalError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    pub fn get_str(&mut self) -> Result<String, MarshalError> {
        let len = self.get_u32()? as usize;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| MarshalError::InvalidUtf8)
    }

    pub fn get_handle(&mut self) -> Result<Handle, MarshalError> {
        Ok(Handle::from_bits(self.get_u64()?))
    }

    /// Read an integer in the width of `kind`.
    pub fn get_int(&mut self, kind: PrimitiveKind) -> Result<i128, MarshalError> {
        Ok(match kind {
            PrimitiveKind::Int8 => i8::from_le_bytes(self.array()?).into(),
            PrimitiveKind::Int16 => i16::from_le_bytes(self.array()?).into(),
            PrimitiveKind::Int32 => i32::from_le_bytes(self.array()?).into(),
            PrimitiveKind::Int64 => i64::from_le_bytes(self.array()?).into(),
            PrimitiveKind::Uint8 => u8::from_le_bytes(self.array()?).into(),
            PrimitiveKind::Uint16 => u16::from_le_bytes(self.array()?).into(),
            PrimitiveKind::Uint32 => u32::from_le_bytes(self.array()?).into(),
            PrimitiveKind::Uint64 => u64::from_le_bytes(self.array()?).into(),
            PrimitiveKind::Bool | PrimitiveKind::Float | PrimitiveKind::Double => {
                return Err(MarshalError::TypeMismatch {
                    expected: "integer".to_string(),
                    actual: kind.managed_name().to_string(),
                });
            }
        })
    }

    /// Fail unless the whole buffer was consumed.
    pub fn finish(self) -> Result<(), MarshalError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(MarshalError::TrailingBytes(n)),
        }
    }
}

fn mismatch(model: &BindingModel, ty: &TypeRef, value: &Value) -> MarshalError {
    MarshalError::TypeMismatch {
        expected: model.display_type(ty),
        actual: value.type_name().to_string(),
    }
}

fn integer_of(value: &Value) -> Option<i128> {
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

fn int_value(kind: PrimitiveKind, v: i128) -> Value {
    // `v` was read in the width of `kind`, so the casts are exact
    match kind {
        PrimitiveKind::Int8 => Value::I8(v as i8),
        PrimitiveKind::Int16 => Value::I16(v as i16),
        PrimitiveKind::Int32 => Value::I32(v as i32),
        PrimitiveKind::Int64 => Value::I64(v as i64),
        PrimitiveKind::Uint8 => Value::U8(v as u8),
        PrimitiveKind::Uint16 => Value::U16(v as u16),
        PrimitiveKind::Uint32 => Value::U32(v as u32),
        _ => Value::U64(v as u64),
    }
}

/// Encode `value` as an instance of `ty`.
pub fn encode_value(
    w: &mut WireWriter,
    model: &BindingModel,
    ty: &TypeRef,
    value: &Value,
) -> BridgeResult<()> {
    match ty {
        TypeRef::Void => match value {
            Value::Void => Ok(()),
            other => Err(mismatch(model, ty, other).into()),
        },
        TypeRef::Primitive(kind) => encode_primitive(w, model, ty, *kind, value),
        TypeRef::String => match value {
            Value::String(s) => Ok(w.put_str(s)?),
            other => Err(mismatch(model, ty, other).into()),
        },
        TypeRef::Named(hash) => {
            let descriptor = model.get(*hash).ok_or(MarshalError::UnknownType(*hash))?;
            match (descriptor.kind(), value) {
                (TypeKind::Struct, Value::Struct(s)) if s.type_hash == *hash => {
                    let expected = descriptor.layout().map_or(0, |l| l.size as usize);
                    if s.bytes.len() != expected {
                        return Err(MarshalError::StructSize {
                            type_name: descriptor.name.clone(),
                            expected,
                            actual: s.bytes.len(),
                        }
                        .into());
                    }
                    w.put_bytes(&s.bytes);
                    Ok(())
                }
                (TypeKind::Enum, Value::Enum { type_hash, value }) if type_hash == hash => {
                    let underlying = descriptor
                        .enum_info()
                        .map_or(PrimitiveKind::Int32, |e| e.underlying);
                    Ok(w.put_int(underlying, i128::from(*value))?)
                }
                (TypeKind::Class, Value::Object(h)) | (TypeKind::Delegate, Value::Delegate(h)) => {
                    w.put_handle(*h);
                    Ok(())
                }
                (TypeKind::Class | TypeKind::Delegate, Value::Null) => {
                    w.put_u64(0);
                    Ok(())
                }
                (_, other) => Err(mismatch(model, ty, other).into()),
            }
        }
        TypeRef::Array(array) => {
            let Value::Array(av) = value else {
                return Err(mismatch(model, ty, value).into());
            };
            if av.dims.len() != usize::from(array.rank) {
                return Err(ArrayRankError {
                    context: model.display_type(ty),
                    expected: array.rank,
                    actual: av.rank(),
                }
                .into());
            }
            let count = av.dims.iter().try_fold(1usize, |acc, d| acc.checked_mul(*d as usize));
            if count != Some(av.items.len()) {
                return Err(MarshalError::ArrayShape {
                    dims: av.dims.clone(),
                    items: av.items.len(),
                }
                .into());
            }
            w.put_u8(array.rank);
            for dim in &av.dims {
                w.put_u32(*dim);
            }
            for item in &av.items {
                encode_value(w, model, &array.element, item)?;
            }
            Ok(())
        }
    }
}

fn encode_primitive(
    w: &mut WireWriter,
    model: &BindingModel,
    ty: &TypeRef,
    kind: PrimitiveKind,
    value: &Value,
) -> BridgeResult<()> {
    match (kind, value) {
        (PrimitiveKind::Bool, Value::Bool(b)) => w.put_bool(*b),
        (PrimitiveKind::Float, Value::F32(f)) => w.put_bytes(&f.to_le_bytes()),
        (PrimitiveKind::Double, Value::F64(f)) => w.put_bytes(&f.to_le_bytes()),
        (PrimitiveKind::Double, Value::F32(f)) => w.put_bytes(&f64::from(*f).to_le_bytes()),
        (kind, value) if kind.is_integer() => {
            let v = integer_of(value).ok_or_else(|| mismatch(model, ty, value))?;
            w.put_int(kind, v)?;
        }
        (_, other) => return Err(mismatch(model, ty, other).into()),
    }
    Ok(())
}

/// Decode an instance of `ty`.
pub fn decode_value(r: &mut WireReader<'_>, model: &BindingModel, ty: &TypeRef) -> BridgeResult<Value> {
    Ok(match ty {
        TypeRef::Void => Value::Void,
        TypeRef::Primitive(kind) => match kind {
            PrimitiveKind::Bool => Value::Bool(r.get_bool()?),
            PrimitiveKind::Float => Value::F32(f32::from_le_bytes(r.array()?)),
            PrimitiveKind::Double => Value::F64(f64::from_le_bytes(r.array()?)),
            kind => int_value(*kind, r.get_int(*kind)?),
        },
        TypeRef::String => Value::String(r.get_str()?),
        TypeRef::Named(hash) => {
            let descriptor = model.get(*hash).ok_or(MarshalError::UnknownType(*hash))?;
            match descriptor.kind() {
                TypeKind::Struct => {
                    let size = descriptor.layout().map_or(0, |l| l.size as usize);
                    Value::Struct(StructValue {
                        type_hash: *hash,
                        bytes: r.take(size)?.to_vec(),
                    })
                }
                TypeKind::Enum => {
                    let underlying = descriptor
                        .enum_info()
                        .map_or(PrimitiveKind::Int32, |e| e.underlying);
                    let raw = r.get_int(underlying)?;
                    Value::Enum {
                        type_hash: *hash,
                        value: i64::try_from(raw).map_err(|_| MarshalError::IntegerOverflow {
                            value: raw,
                            target_type: "i64",
                        })?,
                    }
                }
                TypeKind::Class => match r.get_handle()? {
                    h if h.is_null() => Value::Null,
                    h => Value::Object(h),
                },
                TypeKind::Delegate => match r.get_handle()? {
                    h if h.is_null() => Value::Null,
                    h => Value::Delegate(h),
                },
            }
        }
        TypeRef::Array(array) => {
            let rank = r.get_u8()?;
            if rank != array.rank {
                return Err(ArrayRankError {
                    context: model.display_type(ty),
                    expected: array.rank,
                    actual: rank,
                }
                .into());
            }
            let mut dims = Vec::with_capacity(rank as usize);
            for _ in 0..rank {
                dims.push(r.get_u32()?);
            }
            let count = dims
                .iter()
                .try_fold(1usize, |acc, d| acc.checked_mul(*d as usize))
                .ok_or_else(|| MarshalError::ArrayShape {
                    dims: dims.clone(),
                    items: usize::MAX,
                })?;
            let mut items = Vec::with_capacity(count.min(r.remaining()));
            for _ in 0..count {
                items.push(decode_value(r, model, &array.element)?);
            }
            Value::Array(ArrayValue { dims, items })
        }
    })
}

/// Encode the receiver and every `in`/`ref` argument.
pub fn encode_request(model: &BindingModel, params: &[ParamDescriptor], args: &[Value]) -> BridgeResult<Vec<u8>> {
    let mut w = WireWriter::with_capacity(params.len() * 8);
    for (param, arg) in params.iter().zip(args) {
        if param.mode.reads_in() {
            encode_value(&mut w, model, &param.ty, arg)?;
        }
    }
    Ok(w.into_bytes())
}

/// Decode a request; `out` arguments come back as [`Value::Void`].
pub fn decode_request(model: &BindingModel, params: &[ParamDescriptor], bytes: &[u8]) -> BridgeResult<Vec<Value>> {
    let mut r = WireReader::new(bytes);
    let mut args = Vec::with_capacity(params.len());
    for param in params {
        if param.mode.reads_in() {
            args.push(decode_value(&mut r, model, &param.ty)?);
        } else {
            args.push(Value::Void);
        }
    }
    r.finish()?;
    Ok(args)
}

/// Encode the return value and every `out`/`ref` argument.
pub fn encode_response(
    model: &BindingModel,
    symbol: &str,
    params: &[ParamDescriptor],
    returns: &TypeRef,
    ret: &Value,
    args: &[Value],
) -> BridgeResult<Vec<u8>> {
    let mut w = WireWriter::new();
    encode_value(&mut w, model, returns, ret)?;
    for (index, (param, arg)) in params.iter().zip(args).enumerate() {
        if !param.mode.writes_back() {
            continue;
        }
        if arg.is_void() {
            return Err(MarshalError::UnassignedOut {
                entry: symbol.to_string(),
                index,
            }
            .into());
        }
        encode_value(&mut w, model, &param.ty, arg)?;
    }
    Ok(w.into_bytes())
}

/// Decode a response into the return value and `(param index, value)`
/// pairs for every written-back argument.
pub fn decode_response(
    model: &BindingModel,
    params: &[ParamDescriptor],
    returns: &TypeRef,
    bytes: &[u8],
) -> BridgeResult<(Value, Vec<(usize, Value)>)> {
    let mut r = WireReader::new(bytes);
    let ret = decode_value(&mut r, model, returns)?;
    let mut written = Vec::new();
    for (index, param) in params.iter().enumerate() {
        if param.mode.writes_back() {
            written.push((index, decode_value(&mut r, model, &param.ty)?));
        }
    }
    r.finish()?;
    Ok((ret, written))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostbridge_core::{
        BridgeError, Direction, EnumDescriptor, FieldSlot, LayoutBuilder, ParamMode, StructLayout,
        TypeDescriptor, TypeHash, TypeShape,
    };

    fn model() -> BindingModel {
        let mut builder = LayoutBuilder::new();
        let fields = ["x", "y", "z"]
            .iter()
            .map(|name| {
                let offset = builder.push(4, 4);
                FieldSlot {
                    name: name.to_string(),
                    ty: TypeRef::Primitive(PrimitiveKind::Float),
                    offset,
                    managed_offset: offset,
                    is_public: true,
                }
            })
            .collect();
        let (size, align) = builder.finish();
        let vector = TypeDescriptor::new(
            "Vector3",
            TypeShape::Struct(StructLayout {
                size,
                align,
                managed_size: size,
                fields,
            }),
        );
        let level = TypeDescriptor::new(
            "Level",
            TypeShape::Enum(EnumDescriptor {
                underlying: PrimitiveKind::Uint8,
                values: vec![("Info".into(), 0), ("Warn".into(), 1)],
            }),
        );
        let logger = TypeDescriptor::new("Logger", TypeShape::Class);
        BindingModel::new(vec![vector, level, logger], Vec::new())
    }

    fn round_trip(model: &BindingModel, ty: &TypeRef, value: Value) -> Value {
        let mut w = WireWriter::new();
        encode_value(&mut w, model, ty, &value).unwrap();
        let bytes = w.into_bytes();
        let mut r = WireReader::new(&bytes);
        let back = decode_value(&mut r, model, ty).unwrap();
        r.finish().unwrap();
        back
    }

    #[test]
    fn primitive_layout_is_little_endian() {
        let m = model();
        let mut w = WireWriter::new();
        encode_value(&mut w, &m, &TypeRef::Primitive(PrimitiveKind::Int32), &Value::I32(0x0102_0304)).unwrap();
        encode_value(&mut w, &m, &TypeRef::Primitive(PrimitiveKind::Bool), &Value::Bool(true)).unwrap();
        assert_eq!(w.into_bytes(), vec![0x04, 0x03, 0x02, 0x01, 0x01]);
    }

    #[test]
    fn booleans_reject_other_bytes() {
        let m = model();
        let mut r = WireReader::new(&[2]);
        let err = decode_value(&mut r, &m, &TypeRef::Primitive(PrimitiveKind::Bool)).unwrap_err();
        assert_eq!(err, BridgeError::Marshal(MarshalError::InvalidBool(2)));
    }

    #[test]
    fn strings_are_length_prefixed() {
        let m = model();
        let mut w = WireWriter::new();
        encode_value(&mut w, &m, &TypeRef::String, &Value::String("héllo".into())).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(&bytes[..4], &6u32.to_le_bytes());
        assert_eq!(bytes.len(), 10);
        assert_eq!(round_trip(&m, &TypeRef::String, "".into()), Value::String(String::new()));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        let m = model();
        let bytes = [2, 0, 0, 0, 0xff, 0xfe];
        let mut r = WireReader::new(&bytes);
        assert_eq!(
            decode_value(&mut r, &m, &TypeRef::String).unwrap_err(),
            BridgeError::Marshal(MarshalError::InvalidUtf8)
        );
    }

    #[test]
    fn integers_widen_with_range_checks() {
        let m = model();
        let long = TypeRef::Primitive(PrimitiveKind::Int64);
        assert_eq!(round_trip(&m, &long, Value::I32(-5)), Value::I64(-5));

        let byte = TypeRef::Primitive(PrimitiveKind::Uint8);
        let mut w = WireWriter::new();
        let err = encode_value(&mut w, &m, &byte, &Value::I32(300)).unwrap_err();
        assert!(matches!(err, BridgeError::Marshal(MarshalError::IntegerOverflow { value: 300, .. })));
    }

    #[test]
    fn primitives_round_trip() {
        let m = model();
        let cases = [
            (PrimitiveKind::Bool, Value::Bool(false)),
            (PrimitiveKind::Int8, Value::I8(i8::MIN)),
            (PrimitiveKind::Int16, Value::I16(-300)),
            (PrimitiveKind::Uint16, Value::U16(u16::MAX)),
            (PrimitiveKind::Uint32, Value::U32(7)),
            (PrimitiveKind::Uint64, Value::U64(u64::MAX)),
            (PrimitiveKind::Float, Value::F32(-0.5)),
            (PrimitiveKind::Double, Value::F64(1e300)),
        ];
        for (kind, value) in cases {
            assert_eq!(round_trip(&m, &TypeRef::Primitive(kind), value.clone()), value);
        }
    }

    #[test]
    fn structs_enums_and_handles() {
        let m = model();
        let vector = TypeHash::from_name("Vector3");
        let mut bytes = Vec::new();
        for f in [1.0f32, 2.0, 3.0] {
            bytes.extend_from_slice(&f.to_le_bytes());
        }
        let value = Value::Struct(StructValue { type_hash: vector, bytes });
        assert_eq!(round_trip(&m, &TypeRef::Named(vector), value.clone()), value);

        let short = Value::Struct(StructValue {
            type_hash: vector,
            bytes: vec![0; 8],
        });
        let mut w = WireWriter::new();
        assert!(matches!(
            encode_value(&mut w, &m, &TypeRef::Named(vector), &short),
            Err(BridgeError::Marshal(MarshalError::StructSize { expected: 12, actual: 8, .. }))
        ));

        let level = TypeHash::from_name("Level");
        let warn = Value::Enum { type_hash: level, value: 1 };
        let mut w = WireWriter::new();
        encode_value(&mut w, &m, &TypeRef::Named(level), &warn).unwrap();
        assert_eq!(w.len(), 1);
        assert_eq!(round_trip(&m, &TypeRef::Named(level), warn.clone()), warn);

        let logger = TypeRef::Named(TypeHash::from_name("Logger"));
        let h = Handle::new(3, 9, Direction::NativeHeldManaged);
        assert_eq!(round_trip(&m, &logger, Value::Object(h)), Value::Object(h));
        assert_eq!(round_trip(&m, &logger, Value::Null), Value::Null);
    }

    #[test]
    fn arrays_carry_rank_and_dims() {
        let m = model();
        let grid = TypeRef::array(TypeRef::Primitive(PrimitiveKind::Int32), 2);
        let value = Value::Array(ArrayValue::with_dims(vec![2, 2], (0..4).map(Value::I32).collect()).unwrap());
        assert_eq!(round_trip(&m, &grid, value.clone()), value);

        let jagged = TypeRef::array(TypeRef::array(TypeRef::Primitive(PrimitiveKind::Uint8), 1), 1);
        let value = Value::Array(ArrayValue::vector(vec![
            Value::Array(ArrayValue::vector(vec![Value::U8(1)])),
            Value::Array(ArrayValue::vector(vec![])),
        ]));
        assert_eq!(round_trip(&m, &jagged, value.clone()), value);
    }

    #[test]
    fn array_rank_mismatch() {
        let m = model();
        let grid = TypeRef::array(TypeRef::Primitive(PrimitiveKind::Int32), 2);
        let flat = Value::Array(ArrayValue::vector(vec![Value::I32(1)]));
        let mut w = WireWriter::new();
        let err = encode_value(&mut w, &m, &grid, &flat).unwrap_err();
        assert!(matches!(err, BridgeError::ArrayRank(ArrayRankError { expected: 2, actual: 1, .. })));

        let bytes = [1u8, 1, 0, 0, 0, 5, 0, 0, 0];
        let mut r = WireReader::new(&bytes);
        assert!(matches!(decode_value(&mut r, &m, &grid), Err(BridgeError::ArrayRank(_))));
    }

    #[test]
    fn truncated_and_trailing_buffers() {
        let m = model();
        let mut r = WireReader::new(&[1, 2]);
        assert!(matches!(
            decode_value(&mut r, &m, &TypeRef::Primitive(PrimitiveKind::Int32)),
            Err(BridgeError::Marshal(MarshalError::Truncated { needed: 4, remaining: 2 }))
        ));
        let r = WireReader::new(&[1]);
        assert_eq!(r.finish(), Err(MarshalError::TrailingBytes(1)));
    }

    #[test]
    fn requests_skip_out_and_responses_carry_write_backs() {
        let m = model();
        let float = TypeRef::Primitive(PrimitiveKind::Float);
        let params = vec![
            ParamDescriptor::new("a", float.clone()),
            ParamDescriptor::new("b", float.clone()).with_mode(ParamMode::Out),
            ParamDescriptor::new("c", float.clone()).with_mode(ParamMode::Ref),
        ];
        let request = encode_request(&m, &params, &[Value::F32(1.0), Value::Void, Value::F32(3.0)]).unwrap();
        assert_eq!(request.len(), 8);
        let decoded = decode_request(&m, &params, &request).unwrap();
        assert_eq!(decoded, vec![Value::F32(1.0), Value::Void, Value::F32(3.0)]);

        let unassigned = encode_response(&m, "f", &params, &TypeRef::Void, &Value::Void, &decoded);
        assert!(matches!(
            unassigned,
            Err(BridgeError::Marshal(MarshalError::UnassignedOut { index: 1, .. }))
        ));

        let written = vec![Value::F32(1.0), Value::F32(2.0), Value::F32(4.0)];
        let response = encode_response(&m, "f", &params, &float, &Value::F32(9.0), &written).unwrap();
        let (ret, back) = decode_response(&m, &params, &float, &response).unwrap();
        assert_eq!(ret, Value::F32(9.0));
        assert_eq!(back, vec![(1, Value::F32(2.0)), (2, Value::F32(4.0))]);
    }
}
