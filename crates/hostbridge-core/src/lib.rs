//! Core types shared by every hostbridge crate.
//!
//! ## Modules
//!
//! - [`type_hash`]: deterministic identities for types and entry points
//! - [`primitive_kind`]: primitives with a canonical fixed layout
//! - [`type_ref`]: resolved type references used in signatures
//! - [`descriptor`]: type and member descriptors
//! - [`model`]: the closed binding model and its entry points
//! - [`layout`]: `#[repr(C)]` layout computation
//! - [`handle`]: cross-boundary handles
//! - [`value`]: runtime values in transit
//! - [`error`]: generation-time and run-time error taxonomy

pub mod descriptor;
pub mod error;
pub mod handle;
pub mod layout;
pub mod model;
pub mod primitive_kind;
pub mod type_hash;
pub mod type_ref;
pub mod value;

pub use descriptor::{
    DelegateSignature, EnumDescriptor, FieldSlot, MemberDescriptor, MemberFlags, MemberKind,
    ParamDescriptor, ParamMode, StructLayout, TypeDescriptor, TypeKind, TypeShape,
};
pub use error::{
    ArrayRankError, BridgeError, BridgeResult, ConcurrencyViolation, ConfigurationError,
    CrossBoundaryException, ErrorRecord, GenerationError, GenerationErrors, HandleError,
    LayoutMismatchError, ManagedException, MarshalError, NATIVE_EXCEPTION_TYPE, ResolutionError, StatusCode,
    UnsupportedFeature, UnsupportedFeatureError,
};
pub use handle::{Direction, Handle};
pub use layout::LayoutBuilder;
pub use model::{BindingModel, EntryId, EntryKind, EntryPoint, RECEIVER_PARAM};
pub use primitive_kind::PrimitiveKind;
pub use type_hash::TypeHash;
pub use type_ref::{ArrayType, TypeRef};
pub use value::{ArrayValue, StructValue, Value};
