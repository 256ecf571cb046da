//! Call marshaling.
//!
//! - [`wire`]: the canonical byte layout both sides agree on
//! - [`convert`]: conversions between Rust values and [`Value`](hostbridge_core::Value)

pub mod convert;
pub mod wire;

pub use convert::{
    BridgeEnum, BridgeStruct, FromValue, HandleType, IntoValue, OutSlot, enum_from_value,
    enum_to_value, handle_from_value, handle_to_value, struct_from_value, struct_to_value,
};
pub use wire::{WireReader, WireWriter, decode_request, decode_response, encode_request, encode_response};
