//! Generation-time verification of flat struct layouts.
//!
//! Structs cross by raw memory copy, so the native `#[repr(C)]` layout and
//! the layout the host reports must agree field by field. Every field must
//! also be blittable: a fixed-width primitive other than `bool`, an enum
//! (stored as its underlying integer) or another flat struct.

use hostbridge_core::{
    BindingModel, GenerationErrors, LayoutMismatchError, PrimitiveKind, StructLayout, TypeDescriptor,
    TypeKind, TypeRef,
};

/// Check every struct in `model`, collecting all mismatches.
pub fn check_layouts(model: &BindingModel) -> Result<(), GenerationErrors> {
    let mut errors = GenerationErrors::new();
    for ty in model.types() {
        if let Some(layout) = ty.layout() {
            check_struct(model, ty, layout, &mut errors);
        }
    }
    errors.into_result(())
}

fn check_struct(model: &BindingModel, ty: &TypeDescriptor, layout: &StructLayout, errors: &mut GenerationErrors) {
    let mismatch = |field: Option<&str>, detail: String| LayoutMismatchError {
        type_name: ty.name.clone(),
        field: field.map(str::to_string),
        detail,
    };

    for field in &layout.fields {
        if let Some(reason) = non_blittable(model, &field.ty) {
            errors.push(mismatch(Some(&field.name), reason));
            continue;
        }
        if field.offset != field.managed_offset {
            errors.push(mismatch(
                Some(&field.name),
                format!("native offset {}, managed offset {}", field.offset, field.managed_offset),
            ));
        }
    }
    if layout.size != layout.managed_size {
        errors.push(mismatch(
            None,
            format!("native size {}, managed size {}", layout.size, layout.managed_size),
        ));
    }
}

/// Why a field type cannot be copied byte-for-byte, if it can't.
fn non_blittable(model: &BindingModel, ty: &TypeRef) -> Option<String> {
    match ty {
        TypeRef::Primitive(PrimitiveKind::Bool) => Some("bool fields are not blittable".to_string()),
        TypeRef::Primitive(_) => None,
        TypeRef::Named(hash) => match model.kind_of(*hash) {
            Some(TypeKind::Struct | TypeKind::Enum) => None,
            Some(kind) => Some(format!(
                "{} field of type '{}' is not blittable",
                kind.as_str(),
                model.display_type(ty)
            )),
            None => Some(format!("field type '{}' is not part of the model", model.display_type(ty))),
        },
        other => Some(format!("{} fields are not blittable", model.display_type(other))),
    }
}
