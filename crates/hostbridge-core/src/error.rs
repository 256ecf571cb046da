//! Error taxonomy for generation time and run time.
//!
//! ## Error Hierarchy
//!
//! ```text
//! GenerationError (generation time, collected into GenerationErrors)
//! ├── ConfigurationError     - unreadable or malformed inputs
//! ├── ResolutionError        - names that do not resolve against reflection
//! ├── UnsupportedFeatureError - constructs the bridge refuses to bind
//! ├── LayoutMismatchError    - struct layouts that differ across the boundary
//! └── ArrayRankError         - array ranks that cannot be reconciled
//!
//! BridgeError (run time)
//! ├── HandleError            - null, stale or foreign handles
//! ├── ConcurrencyViolation   - crossings that break the threading contract
//! ├── MarshalError           - values that violate the canonical layout
//! ├── ArrayRankError
//! ├── CrossBoundaryException - managed exception surfaced to native code
//! └── Native                 - native failure on a managed-initiated call
//! ```
//!
//! Generation never emits a partial artifact: every error found is
//! collected and returned together.

use std::fmt;

use num_enum::{IntoPrimitive, TryFromPrimitive};
use thiserror::Error;

use crate::{Direction, Handle, TypeHash};

// ============================================================================
// Generation-time errors
// ============================================================================

/// The configuration or reflection snapshot could not be read or parsed.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    /// An input file could not be read.
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },

    /// The exposure configuration is malformed.
    #[error("invalid configuration: {0}")]
    Parse(String),

    /// The reflection snapshot is malformed.
    #[error("invalid reflection snapshot: {0}")]
    Snapshot(String),

    /// A configuration entry has no type name.
    #[error("configuration entry {index} has an empty type name")]
    EmptyTypeName { index: usize },

    /// The same type is configured twice.
    #[error("type '{0}' is configured more than once")]
    DuplicateType(String),

    /// A member selector could not be parsed.
    #[error("invalid member selector '{selector}' on '{type_name}': {reason}")]
    InvalidSelector {
        type_name: String,
        selector: String,
        reason: String,
    },
}

/// A configured or referenced name did not resolve against host reflection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionError {
    /// The type does not exist in the reflection snapshot.
    #[error("type not found: {0}")]
    TypeNotFound(String),

    /// An explicitly listed member does not exist on the type.
    #[error("member not found: {type_name}.{member}")]
    MemberNotFound { type_name: String, member: String },

    /// A signature references a type the snapshot does not describe.
    #[error("'{location}' references unknown type '{referenced}'")]
    UnknownReference { location: String, referenced: String },

    /// A type name could not be parsed.
    #[error("malformed type name '{name}' in '{location}'")]
    MalformedTypeName { location: String, name: String },

    /// A by-value struct contains itself.
    #[error("struct '{0}' contains itself by value")]
    RecursiveValueType(String),
}

/// Language features the bridge never binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnsupportedFeature {
    /// Boxing or unboxing through `object`.
    Boxing,
    /// Generic type or method without a concrete instantiation.
    OpenGeneric,
    /// Interface types.
    Interface,
    /// Events.
    Event,
    /// Parameters with default values.
    DefaultParameter,
    /// Exposing array types and their convenience operations.
    ArrayOperations,
    /// Raw pointer types.
    RawPointer,
}

impl UnsupportedFeature {
    pub fn as_str(self) -> &'static str {
        match self {
            UnsupportedFeature::Boxing => "boxing/unboxing",
            UnsupportedFeature::OpenGeneric => "open generic",
            UnsupportedFeature::Interface => "interface",
            UnsupportedFeature::Event => "event",
            UnsupportedFeature::DefaultParameter => "default parameter",
            UnsupportedFeature::ArrayOperations => "array operation",
            UnsupportedFeature::RawPointer => "raw pointer",
        }
    }
}

impl fmt::Display for UnsupportedFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A construct that can never cross the boundary.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("unsupported {feature} in '{location}': {detail}")]
pub struct UnsupportedFeatureError {
    pub feature: UnsupportedFeature,
    /// `Type` or `Type.Member`.
    pub location: String,
    pub detail: String,
}

impl UnsupportedFeatureError {
    pub fn new(feature: UnsupportedFeature, location: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            feature,
            location: location.into(),
            detail: detail.into(),
        }
    }
}

/// A struct's native and managed layouts disagree.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("layout mismatch in '{type_name}'{}: {detail}", field.as_ref().map(|f| format!(" field '{f}'")).unwrap_or_default())]
pub struct LayoutMismatchError {
    pub type_name: String,
    pub field: Option<String>,
    pub detail: String,
}

/// An array crossed with a rank different from its declared rank.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("array rank mismatch in {context}: expected rank {expected}, got {actual}")]
pub struct ArrayRankError {
    pub context: String,
    pub expected: u8,
    pub actual: u8,
}

/// Any error that aborts generation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error(transparent)]
    Unsupported(#[from] UnsupportedFeatureError),

    #[error(transparent)]
    Layout(#[from] LayoutMismatchError),

    #[error(transparent)]
    ArrayRank(#[from] ArrayRankError),

    /// Artifacts could not be committed to disk.
    #[error("failed to write artifacts to {path}: {message}")]
    Output { path: String, message: String },
}

/// A collection of generation errors.
///
/// Resolution continues after the first failure so that one run reports
/// every problem; the presence of any error still aborts generation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationErrors {
    errors: Vec<GenerationError>,
}

impl GenerationErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn push(&mut self, error: impl Into<GenerationError>) {
        self.errors.push(error.into());
    }

    pub fn extend(&mut self, other: GenerationErrors) {
        self.errors.extend(other.errors);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GenerationError> {
        self.errors.iter()
    }

    /// `Ok(value)` if no errors were collected, otherwise `Err(self)`.
    pub fn into_result<T>(self, value: T) -> Result<T, GenerationErrors> {
        if self.errors.is_empty() { Ok(value) } else { Err(self) }
    }

    pub fn into_vec(self) -> Vec<GenerationError> {
        self.errors
    }
}

impl IntoIterator for GenerationErrors {
    type Item = GenerationError;
    type IntoIter = std::vec::IntoIter<GenerationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a GenerationErrors {
    type Item = &'a GenerationError;
    type IntoIter = std::slice::Iter<'a, GenerationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

impl<E: Into<GenerationError>> From<E> for GenerationErrors {
    fn from(error: E) -> Self {
        Self {
            errors: vec![error.into()],
        }
    }
}

impl fmt::Display for GenerationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, error) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{error}")?;
        }
        Ok(())
    }
}

impl std::error::Error for GenerationErrors {}

// ============================================================================
// Run-time errors
// ============================================================================

/// A handle did not resolve to a live entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HandleError {
    /// The null handle was used where an object is required.
    #[error("null handle")]
    Null,

    /// The slot was released (or reused) since this handle was issued.
    #[error("stale handle {handle}: object has been released")]
    Stale { handle: Handle },

    /// The id was never allocated by this table.
    #[error("unknown handle {handle}")]
    Unknown { handle: Handle },

    /// The handle belongs to the other table.
    #[error("handle {handle} is {}, expected {}", handle.direction.as_str(), expected.as_str())]
    WrongDirection { handle: Handle, expected: Direction },

    /// The handle denotes an object of a different type.
    #[error("handle {handle} denotes {actual}, expected {expected}")]
    TypeMismatch {
        handle: Handle,
        expected: String,
        actual: String,
    },

    /// The host reclaimed the object before it could be pinned.
    #[error("managed object {object} has been collected")]
    Collected { object: u64 },

    /// The table ran out of 32-bit slot ids.
    #[error("handle table exhausted")]
    Exhausted,
}

/// A crossing violated the host's threading contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{operation} called from thread {caller} but the host only accepts calls from thread {owner}")]
pub struct ConcurrencyViolation {
    pub operation: String,
    pub owner: String,
    pub caller: String,
}

/// A value violated the canonical layout or its declared type.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MarshalError {
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },

    #[error("integer overflow: {value} doesn't fit in {target_type}")]
    IntegerOverflow { value: i128, target_type: &'static str },

    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),

    #[error("invalid UTF-8 string")]
    InvalidUtf8,

    #[error("buffer truncated: needed {needed} bytes, {remaining} remaining")]
    Truncated { needed: usize, remaining: usize },

    #[error("{0} trailing bytes after decoding")]
    TrailingBytes(usize),

    #[error("{entry} expects {expected} argument(s), got {got}")]
    ArgumentCount {
        entry: String,
        expected: usize,
        got: usize,
    },

    #[error("struct '{type_name}' is {expected} bytes, got {actual}")]
    StructSize {
        type_name: String,
        expected: usize,
        actual: usize,
    },

    #[error("array dimensions {dims:?} do not match {items} elements")]
    ArrayShape { dims: Vec<u32>, items: usize },

    #[error("type {0} is not part of the binding model")]
    UnknownType(TypeHash),

    #[error("entry {0} is not part of the binding model")]
    UnknownEntry(TypeHash),

    #[error("no managed function bound for entry '{0}'")]
    UnboundEntry(String),

    #[error("{entry} never assigned out argument {index}")]
    UnassignedOut { entry: String, index: usize },
}

/// Status codes returned by managed bridge functions.
///
/// The numeric values are part of the generated calling convention and are
/// emitted verbatim into the managed artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, IntoPrimitive, TryFromPrimitive)]
#[repr(i32)]
pub enum StatusCode {
    Ok = 0,
    ManagedException = 1,
    NativeException = 2,
    HandleError = 3,
    MarshalError = 4,
    ConcurrencyViolation = 5,
    ArrayRank = 6,
}

impl StatusCode {
    pub const ALL: [StatusCode; 7] = [
        StatusCode::Ok,
        StatusCode::ManagedException,
        StatusCode::NativeException,
        StatusCode::HandleError,
        StatusCode::MarshalError,
        StatusCode::ConcurrencyViolation,
        StatusCode::ArrayRank,
    ];

    pub fn name(self) -> &'static str {
        match self {
            StatusCode::Ok => "Ok",
            StatusCode::ManagedException => "ManagedException",
            StatusCode::NativeException => "NativeException",
            StatusCode::HandleError => "HandleError",
            StatusCode::MarshalError => "MarshalError",
            StatusCode::ConcurrencyViolation => "ConcurrencyViolation",
            StatusCode::ArrayRank => "ArrayRank",
        }
    }
}

/// Native-visible record of a failure captured at the boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub status: StatusCode,
    /// Exception type name on the side that failed.
    pub type_name: String,
    pub message: String,
}

impl ErrorRecord {
    pub fn new(status: StatusCode, type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}

/// An exception raised on the managed side, as the managed side reports it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{type_name}: {message}")]
pub struct ManagedException {
    pub type_name: String,
    pub message: String,
}

impl ManagedException {
    pub fn new(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}

/// A managed failure surfaced to native code.
///
/// The managed exception never unwinds into native frames; its type and
/// message are captured into an [`ErrorRecord`] at the boundary instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cross-boundary exception ({}): {}: {}", record.status.name(), record.type_name, record.message)]
pub struct CrossBoundaryException {
    pub record: ErrorRecord,
}

impl CrossBoundaryException {
    pub fn message(&self) -> &str {
        &self.record.message
    }

    pub fn type_name(&self) -> &str {
        &self.record.type_name
    }
}

/// Exception type reported to managed code for native failures.
pub const NATIVE_EXCEPTION_TYPE: &str = "HostBridge.NativeException";

impl From<BridgeError> for ManagedException {
    /// Translate a native failure for managed code, keeping only its text.
    ///
    /// A managed exception that crossed into native code and is now going
    /// back keeps its original type name.
    fn from(e: BridgeError) -> Self {
        match e {
            BridgeError::CrossBoundary(inner) if inner.record.status == StatusCode::ManagedException => {
                ManagedException::new(inner.record.type_name, inner.record.message)
            }
            other => ManagedException::new(NATIVE_EXCEPTION_TYPE, other.to_string()),
        }
    }
}

impl From<ManagedException> for CrossBoundaryException {
    fn from(e: ManagedException) -> Self {
        Self {
            record: ErrorRecord::new(StatusCode::ManagedException, e.type_name, e.message),
        }
    }
}

/// Any error on a boundary crossing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BridgeError {
    #[error(transparent)]
    Handle(#[from] HandleError),

    #[error(transparent)]
    Concurrency(#[from] ConcurrencyViolation),

    #[error(transparent)]
    Marshal(#[from] MarshalError),

    #[error(transparent)]
    ArrayRank(#[from] ArrayRankError),

    #[error(transparent)]
    CrossBoundary(#[from] CrossBoundaryException),

    /// A native callee failed while serving a managed-initiated call.
    #[error("native failure: {0}")]
    Native(String),

    /// The context has been shut down.
    #[error("bridge is shut down")]
    ShutDown,
}

impl BridgeError {
    pub fn native(message: impl Into<String>) -> Self {
        BridgeError::Native(message.into())
    }

    pub fn is_handle(&self) -> bool {
        matches!(self, BridgeError::Handle(_))
    }

    pub fn is_cross_boundary(&self) -> bool {
        matches!(self, BridgeError::CrossBoundary(_))
    }

    pub fn is_concurrency(&self) -> bool {
        matches!(self, BridgeError::Concurrency(_))
    }

    /// Status code reported when this error crosses to the managed side.
    pub fn status(&self) -> StatusCode {
        match self {
            BridgeError::Handle(_) => StatusCode::HandleError,
            BridgeError::Concurrency(_) => StatusCode::ConcurrencyViolation,
            BridgeError::Marshal(_) => StatusCode::MarshalError,
            BridgeError::ArrayRank(_) => StatusCode::ArrayRank,
            BridgeError::CrossBoundary(e) => e.record.status,
            BridgeError::Native(_) | BridgeError::ShutDown => StatusCode::NativeException,
        }
    }
}

impl From<ManagedException> for BridgeError {
    fn from(e: ManagedException) -> Self {
        BridgeError::CrossBoundary(e.into())
    }
}

/// Result alias for boundary crossings.
pub type BridgeResult<T> = Result<T, BridgeError>;
