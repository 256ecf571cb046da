// @generated by hostbridge-codegen. Do not edit.
// fingerprint: bc18cdde0b8c7951

#![allow(dead_code, non_camel_case_types, non_snake_case, unused_imports, unused_mut, clippy::all)]

use hostbridge_runtime::prelude::*;

/// Number of bridge entry points, which must equal the managed entry table's.
pub const ENTRY_COUNT: usize = 14;

// ============================================================================
// Game.Vector3 (struct)
// ============================================================================

/// Mirror of `Game.Vector3`, copied byte-for-byte across the boundary.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, ::bytemuck::Pod, ::bytemuck::Zeroable)]
pub struct Vector3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

const _: () = assert!(std::mem::size_of::<Vector3>() == 12);
const _: () = assert!(std::mem::align_of::<Vector3>() == 4);
const _: () = assert!(std::mem::offset_of!(Vector3, x) == 0);
const _: () = assert!(std::mem::offset_of!(Vector3, y) == 4);
const _: () = assert!(std::mem::offset_of!(Vector3, z) == 8);

impl BridgeStruct for Vector3 {
    const TYPE_HASH: TypeHash = TypeHash(0x9c2a640eaa348c4b);
    const TYPE_NAME: &'static str = "Game.Vector3";
}

impl FromValue for Vector3 {
    fn from_value(value: Value) -> Result<Self, MarshalError> {
        struct_from_value(value)
    }
}

impl IntoValue for Vector3 {
    fn into_value(self) -> Value {
        struct_to_value(&self)
    }
}

impl Vector3 {
    pub const NEW: EntryId = TypeHash(0x2816c93763c37cc0);
    pub const ADD: EntryId = TypeHash(0x2c3995ebe757b3bb);

    /// `Game.Vector3..ctor(float, float, float)`
    pub fn new(ctx: &BridgeContext, x: f32, y: f32, z: f32) -> BridgeResult<Vector3> {
        let mut args = [x.into_value(), y.into_value(), z.into_value()];
        let ret = ctx.call(Self::NEW, &mut args)?;
        Ok(FromValue::from_value(ret)?)
    }

    /// `Game.Vector3.Add(Game.Vector3)`
    pub fn add(self, ctx: &BridgeContext, other: Vector3) -> BridgeResult<Vector3> {
        let mut args = [self.into_value(), other.into_value()];
        let ret = ctx.call(Self::ADD, &mut args)?;
        Ok(FromValue::from_value(ret)?)
    }
}

// ============================================================================
// Game.Logger (class)
// ============================================================================

/// Handle to a pinned `Game.Logger`.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Logger(Handle);

impl HandleType for Logger {
    const TYPE_HASH: TypeHash = TypeHash(0xe62cedc49c55b27e);
    const TYPE_NAME: &'static str = "Game.Logger";
    const KIND: TypeKind = TypeKind::Class;

    fn from_handle(handle: Handle) -> Self {
        Self(handle)
    }

    fn handle(self) -> Handle {
        self.0
    }
}

impl FromValue for Logger {
    fn from_value(value: Value) -> Result<Self, MarshalError> {
        handle_from_value(value)
    }
}

impl IntoValue for Logger {
    fn into_value(self) -> Value {
        handle_to_value(self)
    }
}

impl Logger {
    pub const NEW: EntryId = TypeHash(0x7c53d09ab7d9f47f);
    pub const NEW_STR: EntryId = TypeHash(0x98c0b4aa8d528c40);
    pub const GET_NAME: EntryId = TypeHash(0x20907adcc4c96d39);
    pub const SET_NAME: EntryId = TypeHash(0x40a8580d85478a38);
    pub const LOG_STR: EntryId = TypeHash(0x91cc31ae765c2bd4);
    pub const LOG_LOG_LEVEL_STR: EntryId = TypeHash(0x2ac92e8486db4088);
    pub const TRY_GET_LEVEL: EntryId = TypeHash(0x28ae1bd6db2e3c1a);
    pub const RELEASE: EntryId = TypeHash(0xc180683b0c608a1e);

    /// `Game.Logger..ctor()`
    pub fn new(ctx: &BridgeContext) -> BridgeResult<Logger> {
        let ret = ctx.call(Self::NEW, &mut [])?;
        Ok(FromValue::from_value(ret)?)
    }

    /// `Game.Logger..ctor(string)`
    pub fn new_str(ctx: &BridgeContext, name: &str) -> BridgeResult<Logger> {
        let mut args = [name.into_value()];
        let ret = ctx.call(Self::NEW_STR, &mut args)?;
        Ok(FromValue::from_value(ret)?)
    }

    /// Property `Game.Logger.get_Name`.
    pub fn name(self, ctx: &BridgeContext) -> BridgeResult<String> {
        let mut args = [self.into_value()];
        let ret = ctx.call(Self::GET_NAME, &mut args)?;
        Ok(FromValue::from_value(ret)?)
    }

    /// Property `Game.Logger.set_Name`.
    pub fn set_name(self, ctx: &BridgeContext, value: &str) -> BridgeResult<()> {
        let mut args = [self.into_value(), value.into_value()];
        ctx.call(Self::SET_NAME, &mut args)?;
        Ok(())
    }

    /// `Game.Logger.Log(string)`
    pub fn log_str(self, ctx: &BridgeContext, message: &str) -> BridgeResult<()> {
        let mut args = [self.into_value(), message.into_value()];
        ctx.call(Self::LOG_STR, &mut args)?;
        Ok(())
    }

    /// `Game.Logger.Log(Game.LogLevel, string)`
    pub fn log_log_level_str(self, ctx: &BridgeContext, level: LogLevel, message: &str) -> BridgeResult<()> {
        let mut args = [self.into_value(), level.into_value(), message.into_value()];
        ctx.call(Self::LOG_LOG_LEVEL_STR, &mut args)?;
        Ok(())
    }

    /// `Game.Logger.TryGetLevel(out Game.LogLevel)`
    pub fn try_get_level(self, ctx: &BridgeContext, level: &mut OutSlot<LogLevel>) -> BridgeResult<bool> {
        let mut args = [self.into_value(), Value::Void];
        let ret = ctx.call(Self::TRY_GET_LEVEL, &mut args)?;
        level.set(FromValue::from_value(std::mem::take(&mut args[1]))?);
        Ok(FromValue::from_value(ret)?)
    }

    /// Release this handle (`Game.Logger.~Release`).
    ///
    /// The handle is stale afterwards, for every copy of it.
    pub fn release(self, ctx: &BridgeContext) -> BridgeResult<()> {
        let mut args = [self.into_value()];
        ctx.call(Self::RELEASE, &mut args)?;
        Ok(())
    }
}

// ============================================================================
// Game.Math (class)
// ============================================================================

/// Static members of `Game.Math`.
#[derive(Debug, Clone, Copy)]
pub struct Math;

impl Math {
    pub const ABS_F32: EntryId = TypeHash(0x608a570cc0ee4cf8);
    pub const ABS_I32: EntryId = TypeHash(0x9510a661cd857426);
    pub const CLAMP: EntryId = TypeHash(0x89f5e58eb2777129);

    /// `Game.Math.Abs(float)`
    pub fn abs_f32(ctx: &BridgeContext, value: f32) -> BridgeResult<f32> {
        let mut args = [value.into_value()];
        let ret = ctx.call(Self::ABS_F32, &mut args)?;
        Ok(FromValue::from_value(ret)?)
    }

    /// `Game.Math.Abs(int)`
    pub fn abs_i32(ctx: &BridgeContext, value: i32) -> BridgeResult<i32> {
        let mut args = [value.into_value()];
        let ret = ctx.call(Self::ABS_I32, &mut args)?;
        Ok(FromValue::from_value(ret)?)
    }

    /// `Game.Math.Clamp(ref float, float, float)`
    pub fn clamp(ctx: &BridgeContext, value: &mut f32, min: f32, max: f32) -> BridgeResult<()> {
        let mut args = [value.clone().into_value(), min.into_value(), max.into_value()];
        ctx.call(Self::CLAMP, &mut args)?;
        *value = FromValue::from_value(std::mem::take(&mut args[0]))?;
        Ok(())
    }
}

// ============================================================================
// Game.Clock (class)
// ============================================================================

/// Static members of `Game.Clock`.
#[derive(Debug, Clone, Copy)]
pub struct Clock;

impl Clock {
    pub const SUBSCRIBE: EntryId = TypeHash(0xca83b69e357fca83);

    /// `Game.Clock.Subscribe(Game.OnTick)`
    pub fn subscribe(ctx: &BridgeContext, handler: Option<OnTick>) -> BridgeResult<()> {
        let mut args = [handler.into_value()];
        ctx.call(Self::SUBSCRIBE, &mut args)?;
        Ok(())
    }
}

// ============================================================================
// Game.LogLevel (enum)
// ============================================================================

/// Mirror of `Game.LogLevel`.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    Info = 0,
    Warning = 1,
    Error = 2,
}

impl BridgeEnum for LogLevel {
    const TYPE_HASH: TypeHash = TypeHash(0xb99407965f96c149);
    const TYPE_NAME: &'static str = "Game.LogLevel";

    fn to_raw(self) -> i64 {
        self as i64
    }

    fn from_raw(raw: i64) -> Option<Self> {
        match raw {
            0 => Some(Self::Info),
            1 => Some(Self::Warning),
            2 => Some(Self::Error),
            _ => None,
        }
    }
}

impl FromValue for LogLevel {
    fn from_value(value: Value) -> Result<Self, MarshalError> {
        enum_from_value(value)
    }
}

impl IntoValue for LogLevel {
    fn into_value(self) -> Value {
        enum_to_value(self)
    }
}

// ============================================================================
// Game.OnTick (delegate)
// ============================================================================

/// Native callback signature of `Game.OnTick`.
pub type OnTickFn = fn(&BridgeContext, f32) -> BridgeResult<()>;

/// Handle to a `Game.OnTick` delegate.
///
/// The target is either a managed delegate or a native callback made with
/// [`wrap`](Self::wrap); [`invoke`](Self::invoke) reaches both.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OnTick(Handle);

impl HandleType for OnTick {
    const TYPE_HASH: TypeHash = TypeHash(0xf786c15e2ffa58cd);
    const TYPE_NAME: &'static str = "Game.OnTick";
    const KIND: TypeKind = TypeKind::Delegate;

    fn from_handle(handle: Handle) -> Self {
        Self(handle)
    }

    fn handle(self) -> Handle {
        self.0
    }
}

impl FromValue for OnTick {
    fn from_value(value: Value) -> Result<Self, MarshalError> {
        handle_from_value(value)
    }
}

impl IntoValue for OnTick {
    fn into_value(self) -> Value {
        handle_to_value(self)
    }
}

impl OnTick {
    /// Invoke the delegate, wherever its target lives.
    pub fn invoke(self, ctx: &BridgeContext, dt: f32) -> BridgeResult<()> {
        let mut args = [dt.into_value()];
        ctx.invoke_delegate(self.0, &mut args)?;
        Ok(())
    }

    /// Expose a native function to managed code as a `Game.OnTick`.
    pub fn wrap(ctx: &BridgeContext, f: OnTickFn) -> BridgeResult<OnTick> {
        let handle = ctx.wrap_callback(<Self as HandleType>::TYPE_HASH, move |frame| {
            let dt: f32 = frame.arg(0)?;
            f(frame.context(), dt)?;
            Ok(())
        })?;
        Ok(Self(handle))
    }
}
