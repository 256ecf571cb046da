//! hostbridge: bindings between native Rust and a garbage-collected managed
//! host.
//!
//! The workspace is split by phase:
//!
//! - [`core`]: type identities, descriptors, the binding model and the
//!   error taxonomy
//! - [`registry`]: exposure configuration and reflection snapshot in,
//!   resolved [`BindingModel`](core::BindingModel) out
//! - [`codegen`]: native and managed artifacts from a binding model
//! - [`runtime`]: handle tables, call marshaling, callbacks and exception
//!   translation behind a [`BridgeContext`](runtime::BridgeContext)
//!
//! [`pipeline`] strings the generation-time phases together, as the
//! `hostbridge-gen` binary does.

pub use hostbridge_codegen as codegen;
pub use hostbridge_core as core;
pub use hostbridge_registry as registry;
pub use hostbridge_runtime as runtime;

pub mod pipeline;

pub use pipeline::{Pipeline, PipelineError, PipelineOutcome};

pub mod prelude {
    pub use crate::pipeline::{Pipeline, PipelineError, PipelineOutcome};
    pub use hostbridge_codegen::{ErrorPolicy, GeneratorOptions, generate};
    pub use hostbridge_core::{BindingModel, GenerationError, GenerationErrors};
    pub use hostbridge_registry::{ExposureConfig, ReflectionSnapshot, resolve};
    pub use hostbridge_runtime::prelude::*;
    pub use hostbridge_runtime::{BridgeOptions, InProcessHost, ManagedEntryTable, ReleasePolicy};
}
