//! Metadata model construction for hostbridge.
//!
//! Turns an exposure configuration plus the host's reflection snapshot into
//! the closed [`BindingModel`](hostbridge_core::BindingModel).
//!
//! ## Modules
//!
//! - [`config`]: TOML exposure configuration
//! - [`reflection`]: JSON reflection snapshot
//! - [`type_name`]: host type-name parsing and normalization
//! - [`resolver`]: all-or-nothing resolution into the binding model
//! - [`dependency_graph`]: reference cycles and forward declarations

pub mod config;
pub mod dependency_graph;
pub mod reflection;
pub mod resolver;
pub mod type_name;

pub use config::{ExposureConfig, MemberSelector, TypeExposure};
pub use dependency_graph::DependencyGraph;
pub use reflection::{ReflectedKind, ReflectedType, ReflectionSnapshot};
pub use resolver::{Resolver, resolve};
