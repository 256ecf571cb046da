//! Resolution of an exposure configuration against a reflection snapshot.
//!
//! Resolution is all-or-nothing. Every configured type is resolved even
//! after a failure so that one run reports every problem, but any collected
//! error means no model is produced.
//!
//! ## Ordering
//!
//! Types are emitted explicit-first in configuration order, followed by
//! transitively discovered types sorted by name. Members follow host
//! declaration order within each category (constructors, fields,
//! properties, methods). The same inputs always produce the same model.
//!
//! ## Discovered types
//!
//! A type reached only through another type's base, layout or signatures is
//! synthesized with its shape (layout, enum values, delegate signature) but
//! no callable members: classes become opaque handles that can only be
//! passed around and released.

use std::collections::{BTreeMap, VecDeque};

use hostbridge_core::{
    BindingModel, ConfigurationError, DelegateSignature, EnumDescriptor, FieldSlot, GenerationError,
    GenerationErrors, LayoutBuilder, MemberDescriptor, MemberFlags, MemberKind, ParamDescriptor, ParamMode, PrimitiveKind,
    ResolutionError, StructLayout, TypeDescriptor, TypeHash, TypeRef, TypeShape, UnsupportedFeature,
    UnsupportedFeatureError,
};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::debug;

use crate::config::{ExposureConfig, MemberSelector, TypeExposure};
use crate::dependency_graph::DependencyGraph;
use crate::reflection::{
    ReflectedConstructor, ReflectedKind, ReflectedMethod, ReflectedMode, ReflectedParameter,
    ReflectedProperty, ReflectedType, ReflectionSnapshot,
};
use crate::type_name::{self, ParsedType};

const LOG_TARGET: &str = "hostbridge::registry";

/// Size and alignment used for non-blittable struct fields.
///
/// Such fields are rejected by the generator's layout check; the placeholder
/// only keeps later offsets meaningful in the diagnostic.
const REFERENCE_SLOT: (u32, u32) = (8, 8);

/// Resolve `config` against `snapshot` into a binding model.
pub fn resolve(config: &ExposureConfig, snapshot: &ReflectionSnapshot) -> Result<BindingModel, GenerationErrors> {
    Resolver::new(snapshot).run(config)
}

/// Stateful resolver; use [`resolve`] unless you need to inspect intermediate state.
pub struct Resolver<'a> {
    index: FxHashMap<&'a str, &'a ReflectedType>,
    names: FxHashMap<TypeHash, String>,
    errors: GenerationErrors,
    explicit: Vec<TypeDescriptor>,
    explicit_names: FxHashSet<String>,
    discovered: BTreeMap<String, TypeDescriptor>,
    queued: FxHashSet<String>,
    queue: VecDeque<String>,
    layouts: FxHashMap<String, (u32, u32)>,
    failed_layouts: FxHashSet<String>,
    layout_stack: Vec<String>,
}

impl<'a> Resolver<'a> {
    pub fn new(snapshot: &'a ReflectionSnapshot) -> Self {
        Self {
            index: snapshot.types.iter().map(|t| (t.name.as_str(), t)).collect(),
            names: FxHashMap::default(),
            errors: GenerationErrors::new(),
            explicit: Vec::new(),
            explicit_names: FxHashSet::default(),
            discovered: BTreeMap::new(),
            queued: FxHashSet::default(),
            queue: VecDeque::new(),
            layouts: FxHashMap::default(),
            failed_layouts: FxHashSet::default(),
            layout_stack: Vec::new(),
        }
    }

    pub fn run(mut self, config: &ExposureConfig) -> Result<BindingModel, GenerationErrors> {
        if let Err(e) = config.validate() {
            self.errors.push(e);
            return Err(self.errors);
        }

        for entry in &config.types {
            self.explicit_names.insert(entry.name.trim().to_string());
        }
        for entry in &config.types {
            self.resolve_explicit(entry);
        }
        while let Some(name) = self.queue.pop_front() {
            self.resolve_discovered(&name);
        }

        if !self.errors.is_empty() {
            debug!(target: LOG_TARGET, errors = self.errors.len(), "resolution failed");
            return Err(self.errors);
        }

        let mut types = self.explicit;
        types.extend(self.discovered.into_values());
        let graph = DependencyGraph::build(&types);
        let forward = graph.forward_declarations(&types);
        debug!(
            target: LOG_TARGET,
            types = types.len(),
            forward_declarations = forward.len(),
            "resolved binding model"
        );
        Ok(BindingModel::new(types, forward))
    }

    fn resolve_explicit(&mut self, entry: &TypeExposure) {
        let name = entry.name.trim();

        if let Ok(ParsedType::Array { .. }) = type_name::parse(name) {
            self.errors.push(UnsupportedFeatureError::new(
                UnsupportedFeature::ArrayOperations,
                name,
                "array types cannot be exposed directly",
            ));
            return;
        }

        let Some(&reflected) = self.index.get(name) else {
            self.errors.push(ResolutionError::TypeNotFound(name.to_string()));
            return;
        };
        if !reflected.is_public {
            self.errors.push(ResolutionError::TypeNotFound(name.to_string()));
            return;
        }
        if let Err(e) = check_type_supported(reflected) {
            self.errors.push(e);
            return;
        }

        if let Some(descriptor) = self.build_type(reflected, Some(entry)) {
            self.reach(&descriptor);
            self.explicit.push(descriptor.explicit());
        }
    }

    fn resolve_discovered(&mut self, name: &str) {
        if self.explicit_names.contains(name) || self.discovered.contains_key(name) {
            return;
        }
        let Some(&reflected) = self.index.get(name) else {
            return;
        };
        if let Some(descriptor) = self.build_type(reflected, None) {
            self.reach(&descriptor);
            self.discovered.insert(name.to_string(), descriptor);
        }
    }

    /// Queue every type a descriptor references.
    fn reach(&mut self, descriptor: &TypeDescriptor) {
        for hash in descriptor.referenced_types() {
            let Some(name) = self.names.get(&hash) else {
                continue;
            };
            if !self.explicit_names.contains(name) && self.queued.insert(name.clone()) {
                self.queue.push_back(name.clone());
            }
        }
    }

    fn build_type(&mut self, reflected: &'a ReflectedType, exposure: Option<&TypeExposure>) -> Option<TypeDescriptor> {
        let shape = match reflected.kind {
            ReflectedKind::Class => TypeShape::Class,
            ReflectedKind::Struct => TypeShape::Struct(self.struct_layout(reflected).ok()?),
            ReflectedKind::Enum => match enum_descriptor(reflected) {
                Ok(info) => TypeShape::Enum(info),
                Err(e) => {
                    self.errors.push(e);
                    return None;
                }
            },
            ReflectedKind::Delegate => match self.delegate_signature(reflected) {
                Ok(sig) => TypeShape::Delegate(sig),
                Err(e) => {
                    self.errors.push(e);
                    return None;
                }
            },
            // Rejected before reaching here; interfaces never resolve.
            ReflectedKind::Interface => return None,
        };

        let mut descriptor = TypeDescriptor::new(reflected.name.clone(), shape);
        if reflected.is_static {
            descriptor = descriptor.into_static();
        }
        self.names.insert(descriptor.hash, reflected.name.clone());

        if reflected.kind == ReflectedKind::Class
            && let Some(base) = reflected.base.as_deref()
            && !matches!(type_name::parse(base), Ok(ParsedType::Object))
        {
            match self.resolve_type(base, &reflected.name) {
                Ok(TypeRef::Named(hash)) => descriptor.base = Some(hash),
                Ok(_) => {}
                Err(e) => {
                    self.errors.push(e);
                    return None;
                }
            }
        }

        descriptor.members = match (reflected.kind, exposure) {
            (ReflectedKind::Class | ReflectedKind::Struct, Some(exposure)) => {
                self.select_members(reflected, exposure)
            }
            (ReflectedKind::Struct, None) => self.implicit_fields(reflected),
            (_, Some(exposure)) => {
                if !exposure.is_implicit() {
                    debug!(
                        target: LOG_TARGET,
                        type_name = %reflected.name,
                        "member lists ignored for {} types",
                        descriptor.kind().as_str()
                    );
                }
                Vec::new()
            }
            _ => Vec::new(),
        };
        assign_overload_indices(&mut descriptor.members);
        Some(descriptor)
    }

    // ------------------------------------------------------------------
    // Member selection
    // ------------------------------------------------------------------

    fn select_members(&mut self, ty: &'a ReflectedType, exposure: &TypeExposure) -> Vec<MemberDescriptor> {
        let mut members = Vec::new();
        self.select_constructors(ty, exposure, &mut members);
        self.select_fields(ty, exposure, &mut members);
        self.select_properties(ty, exposure, &mut members);
        self.select_methods(ty, exposure, &mut members);
        self.select_events(ty, exposure);
        members
    }

    fn select_constructors(&mut self, ty: &'a ReflectedType, exposure: &TypeExposure, out: &mut Vec<MemberDescriptor>) {
        let Some(lists) = &exposure.constructors else {
            for ctor in ty.constructors.iter().filter(|c| c.is_public) {
                let result = self.build_constructor(&ty.name, ctor);
                self.accept_implicit(&ty.name, ".ctor", result, out);
            }
            return;
        };

        let mut picked = Vec::new();
        for list in lists {
            let wanted: Vec<String> = list.iter().map(|p| type_name::normalize(p)).collect();
            let found = ty.constructors.iter().enumerate().find(|(_, c)| {
                c.is_public
                    && c.parameters
                        .iter()
                        .map(ReflectedParameter::selector_text)
                        .eq(wanted.iter().cloned())
            });
            match found {
                Some((i, ctor)) => picked.push((i, ctor)),
                None => self.errors.push(ResolutionError::MemberNotFound {
                    type_name: ty.name.clone(),
                    member: format!(".ctor({})", wanted.join(", ")),
                }),
            }
        }
        for (_, ctor) in in_declaration_order(picked) {
            match self.build_constructor(&ty.name, ctor) {
                Ok(m) => out.push(m),
                Err(e) => self.errors.push(e),
            }
        }
    }

    fn select_fields(&mut self, ty: &'a ReflectedType, exposure: &TypeExposure, out: &mut Vec<MemberDescriptor>) {
        let Some(names) = &exposure.fields else {
            for field in ty.fields.iter().filter(|f| f.is_public && !f.is_static) {
                let result = self.build_field(&ty.name, &field.name, &field.type_name, field.is_readonly, false);
                self.accept_implicit(&ty.name, &field.name, result, out);
            }
            return;
        };

        let mut picked = Vec::new();
        for name in names {
            match ty.fields.iter().enumerate().find(|(_, f)| f.is_public && f.name == *name) {
                Some(found) => picked.push(found),
                None => self.errors.push(ResolutionError::MemberNotFound {
                    type_name: ty.name.clone(),
                    member: name.clone(),
                }),
            }
        }
        for (_, field) in in_declaration_order(picked) {
            match self.build_field(&ty.name, &field.name, &field.type_name, field.is_readonly, field.is_static) {
                Ok(m) => out.push(m),
                Err(e) => self.errors.push(e),
            }
        }
    }

    fn select_properties(&mut self, ty: &'a ReflectedType, exposure: &TypeExposure, out: &mut Vec<MemberDescriptor>) {
        let Some(names) = &exposure.properties else {
            for prop in ty
                .properties
                .iter()
                .filter(|p| p.is_public && !p.is_static && (p.can_read || p.can_write))
            {
                let result = self.build_property(&ty.name, prop);
                self.accept_implicit(&ty.name, &prop.name, result, out);
            }
            return;
        };

        let mut picked = Vec::new();
        for name in names {
            match ty.properties.iter().enumerate().find(|(_, p)| p.is_public && p.name == *name) {
                Some(found) => picked.push(found),
                None => self.errors.push(ResolutionError::MemberNotFound {
                    type_name: ty.name.clone(),
                    member: name.clone(),
                }),
            }
        }
        for (_, prop) in in_declaration_order(picked) {
            match self.build_property(&ty.name, prop) {
                Ok(m) => out.push(m),
                Err(e) => self.errors.push(e),
            }
        }
    }

    fn select_methods(&mut self, ty: &'a ReflectedType, exposure: &TypeExposure, out: &mut Vec<MemberDescriptor>) {
        let Some(selectors) = &exposure.methods else {
            // Static classes have nothing but static methods to offer
            for method in ty.methods.iter().filter(|m| m.is_public && (ty.is_static || !m.is_static)) {
                let result = self.build_method(&ty.name, method);
                self.accept_implicit(&ty.name, &method.name, result, out);
            }
            return;
        };

        let mut picked = Vec::new();
        for text in selectors {
            let selector = match MemberSelector::parse(&ty.name, text) {
                Ok(s) => s,
                Err(e) => {
                    self.errors.push(e);
                    continue;
                }
            };
            let before = picked.len();
            picked.extend(ty.methods.iter().enumerate().filter(|(_, m)| {
                let params: Vec<String> = m.parameters.iter().map(ReflectedParameter::selector_text).collect();
                m.is_public && selector.matches(&m.name, &params)
            }));
            if picked.len() == before {
                self.errors.push(ResolutionError::MemberNotFound {
                    type_name: ty.name.clone(),
                    member: text.trim().to_string(),
                });
            }
        }
        for (_, method) in in_declaration_order(picked) {
            match self.build_method(&ty.name, method) {
                Ok(m) => out.push(m),
                Err(e) => self.errors.push(e),
            }
        }
    }

    fn select_events(&mut self, ty: &ReflectedType, exposure: &TypeExposure) {
        match &exposure.events {
            None => {
                for event in &ty.events {
                    debug!(target: LOG_TARGET, type_name = %ty.name, member = %event.name, "skipping event");
                }
            }
            Some(names) => {
                for name in names {
                    if ty.events.iter().any(|e| e.name == *name) {
                        self.errors.push(UnsupportedFeatureError::new(
                            UnsupportedFeature::Event,
                            format!("{}.{name}", ty.name),
                            "events cannot be bound",
                        ));
                    } else {
                        self.errors.push(ResolutionError::MemberNotFound {
                            type_name: ty.name.clone(),
                            member: name.clone(),
                        });
                    }
                }
            }
        }
    }

    /// Public instance fields of a discovered struct.
    fn implicit_fields(&mut self, ty: &'a ReflectedType) -> Vec<MemberDescriptor> {
        let mut out = Vec::new();
        for field in ty.fields.iter().filter(|f| f.is_public && !f.is_static) {
            let result = self.build_field(&ty.name, &field.name, &field.type_name, field.is_readonly, false);
            self.accept_implicit(&ty.name, &field.name, result, &mut out);
        }
        out
    }

    /// Unsupported members of an implicit list are skipped; anything else is an error.
    fn accept_implicit(
        &mut self,
        type_name: &str,
        member: &str,
        result: Result<MemberDescriptor, GenerationError>,
        out: &mut Vec<MemberDescriptor>,
    ) {
        match result {
            Ok(m) => out.push(m),
            Err(GenerationError::Unsupported(e)) => {
                debug!(target: LOG_TARGET, type_name = %type_name, member = %member, "skipping unsupported member: {e}");
            }
            Err(e) => self.errors.push(e),
        }
    }

    // ------------------------------------------------------------------
    // Member construction
    // ------------------------------------------------------------------

    fn build_field(
        &mut self,
        owner: &str,
        name: &str,
        type_text: &str,
        readonly: bool,
        is_static: bool,
    ) -> Result<MemberDescriptor, GenerationError> {
        let ty = self.resolve_type(type_text, &format!("{owner}.{name}"))?;
        let mut m = MemberDescriptor::field(name, ty);
        if readonly {
            m.flags.remove(MemberFlags::WRITABLE);
        }
        if is_static {
            m = m.into_static();
        }
        Ok(m)
    }

    fn build_property(&mut self, owner: &str, prop: &ReflectedProperty) -> Result<MemberDescriptor, GenerationError> {
        let ty = self.resolve_type(&prop.type_name, &format!("{owner}.{}", prop.name))?;
        let m = MemberDescriptor::property(prop.name.clone(), ty, prop.can_read, prop.can_write);
        Ok(if prop.is_static { m.into_static() } else { m })
    }

    fn build_constructor(&mut self, owner: &str, ctor: &ReflectedConstructor) -> Result<MemberDescriptor, GenerationError> {
        let location = format!("{owner}..ctor");
        let params = self.build_params(&location, &ctor.parameters)?;
        Ok(MemberDescriptor::constructor(params))
    }

    fn build_method(&mut self, owner: &str, method: &ReflectedMethod) -> Result<MemberDescriptor, GenerationError> {
        let location = format!("{owner}.{}", method.name);
        if !method.generic_parameters.is_empty() {
            return Err(UnsupportedFeatureError::new(
                UnsupportedFeature::OpenGeneric,
                location,
                format!("generic method with parameters <{}>", method.generic_parameters.join(", ")),
            )
            .into());
        }
        let params = self.build_params(&location, &method.parameters)?;
        let returns = self.resolve_type(&method.return_type, &location)?;
        let mut m = MemberDescriptor::method(method.name.clone(), params, returns);
        if method.is_static {
            m = m.into_static();
        }
        Ok(m)
    }

    fn build_params(&mut self, location: &str, params: &[ReflectedParameter]) -> Result<Vec<ParamDescriptor>, GenerationError> {
        params
            .iter()
            .map(|p| {
                if p.has_default {
                    return Err(UnsupportedFeatureError::new(
                        UnsupportedFeature::DefaultParameter,
                        location,
                        format!("parameter '{}' has a default value", p.name),
                    )
                    .into());
                }
                let ty = self.resolve_type(&p.type_name, location)?;
                if ty.is_void() {
                    return Err(ResolutionError::MalformedTypeName {
                        location: location.to_string(),
                        name: p.type_name.clone(),
                    }
                    .into());
                }
                Ok(ParamDescriptor::new(p.name.clone(), ty).with_mode(mode_of(p.mode)))
            })
            .collect()
    }

    fn delegate_signature(&mut self, ty: &ReflectedType) -> Result<DelegateSignature, GenerationError> {
        let Some(sig) = &ty.signature else {
            return Err(ConfigurationError::Snapshot(format!("delegate '{}' has no signature", ty.name)).into());
        };
        let location = format!("{}.Invoke", ty.name);
        Ok(DelegateSignature {
            params: self.build_params(&location, &sig.parameters)?,
            return_type: self.resolve_type(&sig.return_type, &location)?,
        })
    }

    // ------------------------------------------------------------------
    // Types
    // ------------------------------------------------------------------

    /// Resolve a type name appearing at `location`.
    pub fn resolve_type(&mut self, text: &str, location: &str) -> Result<TypeRef, GenerationError> {
        let parsed = type_name::parse(text).map_err(|_| ResolutionError::MalformedTypeName {
            location: location.to_string(),
            name: text.to_string(),
        })?;
        self.type_ref(&parsed, text, location)
    }

    fn type_ref(&mut self, parsed: &ParsedType, text: &str, location: &str) -> Result<TypeRef, GenerationError> {
        let unsupported = |feature, detail: String| -> GenerationError {
            UnsupportedFeatureError::new(feature, location, detail).into()
        };
        match parsed {
            ParsedType::Void => Ok(TypeRef::Void),
            ParsedType::Primitive(kind) => Ok(TypeRef::Primitive(*kind)),
            ParsedType::String => Ok(TypeRef::String),
            ParsedType::Object => Err(unsupported(
                UnsupportedFeature::Boxing,
                format!("'{text}' requires boxing"),
            )),
            ParsedType::Pointer(_) | ParsedType::PointerSized(_) => Err(unsupported(
                UnsupportedFeature::RawPointer,
                format!("'{text}' is a raw pointer"),
            )),
            ParsedType::Array { element, rank } => {
                let element = self.type_ref(element, text, location)?;
                if element.is_void() {
                    return Err(ResolutionError::MalformedTypeName {
                        location: location.to_string(),
                        name: text.to_string(),
                    }
                    .into());
                }
                Ok(TypeRef::array(element, *rank))
            }
            ParsedType::Generic { .. } => {
                let rendered = parsed.to_string();
                if self.index.contains_key(rendered.as_str()) {
                    self.named(&rendered, location)
                } else {
                    Err(unsupported(
                        UnsupportedFeature::OpenGeneric,
                        format!("'{rendered}' has no concrete instantiation in the snapshot"),
                    ))
                }
            }
            ParsedType::Named(name) if parsed.is_generic_definition() => Err(unsupported(
                UnsupportedFeature::OpenGeneric,
                format!("'{name}' is a generic type definition"),
            )),
            ParsedType::Named(name) => self.named(name, location),
        }
    }

    fn named(&mut self, name: &str, location: &str) -> Result<TypeRef, GenerationError> {
        let Some(&reflected) = self.index.get(name) else {
            return Err(ResolutionError::UnknownReference {
                location: location.to_string(),
                referenced: name.to_string(),
            }
            .into());
        };
        if !reflected.is_public {
            return Err(ResolutionError::UnknownReference {
                location: location.to_string(),
                referenced: name.to_string(),
            }
            .into());
        }
        check_type_supported(reflected).map_err(|e| match e {
            GenerationError::Unsupported(mut inner) => {
                inner.location = location.to_string();
                GenerationError::Unsupported(inner)
            }
            other => other,
        })?;
        let hash = TypeHash::from_name(name);
        self.names.insert(hash, name.to_string());
        Ok(TypeRef::Named(hash))
    }

    // ------------------------------------------------------------------
    // Struct layouts
    // ------------------------------------------------------------------

    fn struct_layout(&mut self, ty: &'a ReflectedType) -> Result<StructLayout, ()> {
        if self.failed_layouts.contains(&ty.name) {
            return Err(());
        }
        if self.layout_stack.contains(&ty.name) {
            self.errors.push(ResolutionError::RecursiveValueType(ty.name.clone()));
            self.failed_layouts.insert(ty.name.clone());
            return Err(());
        }

        self.layout_stack.push(ty.name.clone());
        let result = self.compute_layout(ty);
        self.layout_stack.pop();

        match result {
            Ok(layout) => {
                self.layouts.insert(ty.name.clone(), (layout.size, layout.align));
                Ok(layout)
            }
            Err(()) => {
                self.failed_layouts.insert(ty.name.clone());
                Err(())
            }
        }
    }

    fn compute_layout(&mut self, ty: &'a ReflectedType) -> Result<StructLayout, ()> {
        let mut builder = LayoutBuilder::new();
        let mut fields = Vec::new();
        let mut failed = false;

        for field in ty.fields.iter().filter(|f| !f.is_static) {
            let location = format!("{}.{}", ty.name, field.name);
            let field_ty = match self.resolve_type(&field.type_name, &location) {
                Ok(t) => t,
                Err(e) => {
                    self.errors.push(e);
                    failed = true;
                    continue;
                }
            };
            let Ok((size, align)) = self.field_size_align(&field_ty) else {
                failed = true;
                continue;
            };
            let offset = builder.push(size, align);
            fields.push(FieldSlot {
                name: field.name.clone(),
                ty: field_ty,
                offset,
                managed_offset: field.offset.unwrap_or(offset),
                is_public: field.is_public,
            });
        }

        if failed {
            return Err(());
        }
        let (size, align) = builder.finish();
        Ok(StructLayout {
            size,
            align,
            managed_size: ty.size.unwrap_or(size),
            fields,
        })
    }

    fn field_size_align(&mut self, ty: &TypeRef) -> Result<(u32, u32), ()> {
        match ty {
            TypeRef::Primitive(kind) => Ok((kind.size(), kind.align())),
            TypeRef::Named(hash) => {
                let Some(name) = self.names.get(hash).cloned() else {
                    return Ok(REFERENCE_SLOT);
                };
                let Some(&reflected) = self.index.get(name.as_str()) else {
                    return Ok(REFERENCE_SLOT);
                };
                match reflected.kind {
                    ReflectedKind::Enum => {
                        let kind = enum_descriptor(reflected).map(|e| e.underlying).unwrap_or(PrimitiveKind::Int32);
                        Ok((kind.size(), kind.align()))
                    }
                    ReflectedKind::Struct => match self.layouts.get(&name) {
                        Some(&cached) => Ok(cached),
                        None => self.struct_layout(reflected).map(|l| (l.size, l.align)),
                    },
                    _ => Ok(REFERENCE_SLOT),
                }
            }
            _ => Ok(REFERENCE_SLOT),
        }
    }
}

fn check_type_supported(ty: &ReflectedType) -> Result<(), GenerationError> {
    if ty.kind == ReflectedKind::Interface {
        return Err(UnsupportedFeatureError::new(
            UnsupportedFeature::Interface,
            ty.name.as_str(),
            format!("'{}' is an interface", ty.name),
        )
        .into());
    }
    if !ty.generic_parameters.is_empty() || ty.name.contains('`') {
        return Err(UnsupportedFeatureError::new(
            UnsupportedFeature::OpenGeneric,
            ty.name.as_str(),
            format!("'{}' is a generic type definition", ty.name),
        )
        .into());
    }
    Ok(())
}

fn enum_descriptor(ty: &ReflectedType) -> Result<EnumDescriptor, GenerationError> {
    let underlying = ty.underlying.as_deref().unwrap_or("int");
    let kind = match type_name::parse(underlying) {
        Ok(ParsedType::Primitive(kind)) if kind.is_integer() => kind,
        _ => {
            return Err(ConfigurationError::Snapshot(format!(
                "enum '{}' has non-integer underlying type '{underlying}'",
                ty.name
            ))
            .into());
        }
    };
    Ok(EnumDescriptor {
        underlying: kind,
        values: ty.values.iter().map(|v| (v.name.clone(), v.value)).collect(),
    })
}

fn mode_of(mode: ReflectedMode) -> ParamMode {
    match mode {
        ReflectedMode::In => ParamMode::In,
        ReflectedMode::Out => ParamMode::Out,
        ReflectedMode::Ref => ParamMode::Ref,
    }
}

/// Deduplicate selections and restore host declaration order.
fn in_declaration_order<T>(mut picked: Vec<(usize, T)>) -> Vec<(usize, T)> {
    picked.sort_by_key(|(i, _)| *i);
    picked.dedup_by_key(|(i, _)| *i);
    picked
}

fn assign_overload_indices(members: &mut [MemberDescriptor]) {
    let mut counts: FxHashMap<(String, MemberKind), u16> = FxHashMap::default();
    for member in members.iter_mut() {
        let count = counts.entry((member.name.clone(), member.kind)).or_insert(0);
        member.overload_index = *count;
        *count += 1;
    }
}
