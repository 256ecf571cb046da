//! Binding generation for hostbridge.
//!
//! Turns a [`BindingModel`] into two source artifacts: a native Rust module
//! with mirror types and call-throughs, and a managed C# file with the
//! matching bridge functions and entry table. Output depends only on the
//! model and the [`GeneratorOptions`], so regenerating from unchanged inputs
//! is byte-identical.
//!
//! ```ignore
//! let model = hostbridge_registry::resolve(&config, &snapshot)?;
//! let artifacts = hostbridge_codegen::generate(&model, &GeneratorOptions::default())?;
//! artifacts.write_to(Path::new("generated"))?;
//! ```

pub mod artifacts;
pub mod layout_check;
pub mod managed;
pub mod naming;
pub mod native;
pub mod options;
pub mod writer;

pub use artifacts::{Artifact, ArtifactKind, Artifacts, CheckReport, WriteReport, verified_fingerprint};
pub use layout_check::check_layouts;
pub use options::{ErrorPolicy, GeneratorOptions};

use hostbridge_core::{BindingModel, GenerationErrors};
use tracing::info;

/// Generate both artifacts for `model`.
///
/// Struct layouts are verified first; any mismatch aborts generation
/// before anything is emitted.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn generate(model: &BindingModel, options: &GeneratorOptions) -> Result<Artifacts, GenerationErrors> {
    check_layouts(model)?;

    let native = native::emit(model, options);
    let managed = managed::emit(model, options);
    let artifacts = Artifacts::new(options, native, managed);
    info!(
        target: "hostbridge::codegen",
        types = model.len(),
        entries = model.entries().len(),
        policy = options.error_policy.as_str(),
        native = format_args!("{:016x}", artifacts.native.fingerprint),
        managed = format_args!("{:016x}", artifacts.managed.fingerprint),
        "generated bindings"
    );
    Ok(artifacts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostbridge_core::{
        FieldSlot, GenerationError, MemberDescriptor, ParamDescriptor, PrimitiveKind, StructLayout, TypeDescriptor,
        TypeRef, TypeShape,
    };

    fn model(managed_offset: u32) -> BindingModel {
        let layout = StructLayout {
            size: 8,
            align: 4,
            managed_size: 8,
            fields: vec![
                FieldSlot {
                    name: "X".into(),
                    ty: TypeRef::Primitive(PrimitiveKind::Float),
                    offset: 0,
                    managed_offset: 0,
                    is_public: true,
                },
                FieldSlot {
                    name: "Y".into(),
                    ty: TypeRef::Primitive(PrimitiveKind::Float),
                    offset: 4,
                    managed_offset,
                    is_public: true,
                },
            ],
        };
        let logger = TypeDescriptor::new("Logger", TypeShape::Class).with_member(MemberDescriptor::method(
            "Log",
            vec![ParamDescriptor::new("message", TypeRef::String)],
            TypeRef::Void,
        ));
        BindingModel::new(
            vec![TypeDescriptor::new("Point", TypeShape::Struct(layout)), logger],
            Vec::new(),
        )
    }

    #[test]
    fn regeneration_is_byte_identical() {
        let options = GeneratorOptions::default();
        let first = generate(&model(4), &options).unwrap();
        let second = generate(&model(4), &options).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.native.contents(), second.native.contents());
    }

    #[test]
    fn layout_mismatch_aborts_generation() {
        let errors = generate(&model(8), &GeneratorOptions::default()).unwrap_err();
        assert!(matches!(errors.iter().next(), Some(GenerationError::Layout(_))));
    }

    #[test]
    fn error_policy_changes_only_the_native_artifact() {
        let result = generate(&model(4), &GeneratorOptions::default()).unwrap();
        let raise = generate(&model(4), &GeneratorOptions::default().with_error_policy(ErrorPolicy::Raise)).unwrap();
        assert_ne!(result.native.fingerprint, raise.native.fingerprint);
        assert_eq!(result.managed.fingerprint, raise.managed.fingerprint);
    }
}
