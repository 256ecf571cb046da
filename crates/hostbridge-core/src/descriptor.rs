//! Type and member descriptors: the closed intermediate representation.
//!
//! Descriptors are produced once at generation time by the registry crate
//! and are never mutated afterwards. The generator emits stubs from them and
//! the runtime uses them to validate and marshal calls.

use bitflags::bitflags;

use crate::type_hash::hash_constants;
use crate::{PrimitiveKind, TypeHash, TypeRef};

/// Kind of an exposed type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeKind {
    /// Reference type; crosses the boundary as a handle.
    Class,
    /// Flat value type; crosses the boundary by memory copy.
    Struct,
    /// Enumeration; crosses as its underlying integer.
    Enum,
    /// Callback type; crosses as a delegate handle.
    Delegate,
}

impl TypeKind {
    pub fn as_str(self) -> &'static str {
        match self {
            TypeKind::Class => "class",
            TypeKind::Struct => "struct",
            TypeKind::Enum => "enum",
            TypeKind::Delegate => "delegate",
        }
    }
}

/// Kind of an exposed member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemberKind {
    Field,
    Property,
    Method,
    Constructor,
}

impl MemberKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MemberKind::Field => "field",
            MemberKind::Property => "property",
            MemberKind::Method => "method",
            MemberKind::Constructor => "constructor",
        }
    }
}

bitflags! {
    /// Member modifiers relevant to stub generation.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemberFlags: u8 {
        /// No receiver.
        const STATIC = 1 << 0;
        /// Field or property can be read.
        const READABLE = 1 << 1;
        /// Field or property can be written.
        const WRITABLE = 1 << 2;
    }
}

/// How a parameter is passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ParamMode {
    /// Copied in; the callee cannot affect the caller's value.
    #[default]
    In,
    /// Callee writes into caller-supplied storage; no value goes in.
    Out,
    /// Copied in, and the callee's final value is written back.
    Ref,
}

impl ParamMode {
    /// Whether the callee writes a value back to the caller.
    pub fn writes_back(self) -> bool {
        matches!(self, ParamMode::Out | ParamMode::Ref)
    }

    /// Whether the caller supplies an input value.
    pub fn reads_in(self) -> bool {
        matches!(self, ParamMode::In | ParamMode::Ref)
    }
}

/// A single parameter of a method, constructor or delegate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParamDescriptor {
    pub name: String,
    pub ty: TypeRef,
    pub mode: ParamMode,
}

impl ParamDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            ty,
            mode: ParamMode::In,
        }
    }

    pub fn with_mode(mut self, mode: ParamMode) -> Self {
        self.mode = mode;
        self
    }

    /// Identity used in entry hashes; the passing mode is significant, so
    /// `f(out int)` and `f(ref int)` get distinct entries.
    pub fn identity(&self) -> TypeHash {
        let ty = self.ty.type_hash().0;
        match self.mode {
            ParamMode::In => TypeHash(ty),
            ParamMode::Out => TypeHash(ty.rotate_left(11) ^ hash_constants::OUT_PARAM),
            ParamMode::Ref => TypeHash(ty.rotate_left(13) ^ hash_constants::REF_PARAM),
        }
    }
}

/// A field, property, method or constructor exposed across the boundary.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDescriptor {
    /// Host-side member name (constructors use `.ctor`).
    pub name: String,
    pub kind: MemberKind,
    pub params: Vec<ParamDescriptor>,
    /// Return type for methods; value type for fields and properties.
    pub return_type: TypeRef,
    /// Position among members sharing `name` and `kind`, in declaration order.
    pub overload_index: u16,
    pub flags: MemberFlags,
}

impl MemberDescriptor {
    /// Create a method descriptor.
    pub fn method(name: impl Into<String>, params: Vec<ParamDescriptor>, return_type: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Method,
            params,
            return_type,
            overload_index: 0,
            flags: MemberFlags::empty(),
        }
    }

    /// Create a constructor descriptor.
    pub fn constructor(params: Vec<ParamDescriptor>) -> Self {
        Self {
            name: ".ctor".to_string(),
            kind: MemberKind::Constructor,
            params,
            return_type: TypeRef::Void,
            overload_index: 0,
            flags: MemberFlags::empty(),
        }
    }

    /// Create a field descriptor (readable and writable).
    pub fn field(name: impl Into<String>, ty: TypeRef) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Field,
            params: Vec::new(),
            return_type: ty,
            overload_index: 0,
            flags: MemberFlags::READABLE | MemberFlags::WRITABLE,
        }
    }

    /// Create a property descriptor.
    pub fn property(name: impl Into<String>, ty: TypeRef, readable: bool, writable: bool) -> Self {
        let mut flags = MemberFlags::empty();
        flags.set(MemberFlags::READABLE, readable);
        flags.set(MemberFlags::WRITABLE, writable);
        Self {
            name: name.into(),
            kind: MemberKind::Property,
            params: Vec::new(),
            return_type: ty,
            overload_index: 0,
            flags,
        }
    }

    /// Mark the member static.
    pub fn into_static(mut self) -> Self {
        self.flags |= MemberFlags::STATIC;
        self
    }

    pub fn is_static(&self) -> bool {
        self.flags.contains(MemberFlags::STATIC)
    }

    pub fn is_readable(&self) -> bool {
        self.flags.contains(MemberFlags::READABLE)
    }

    pub fn is_writable(&self) -> bool {
        self.flags.contains(MemberFlags::WRITABLE)
    }

    /// Parameter identities, in order.
    pub fn param_hashes(&self) -> Vec<TypeHash> {
        self.params.iter().map(ParamDescriptor::identity).collect()
    }

    /// Human-readable signature, used in diagnostics and generated comments.
    pub fn signature(&self) -> String {
        let params: Vec<String> = self
            .params
            .iter()
            .map(|p| match p.mode {
                ParamMode::In => p.ty.to_string(),
                ParamMode::Out => format!("out {}", p.ty),
                ParamMode::Ref => format!("ref {}", p.ty),
            })
            .collect();
        format!("{}({})", self.name, params.join(", "))
    }
}

/// One field slot of a flat struct.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldSlot {
    pub name: String,
    pub ty: TypeRef,
    /// Offset computed from the native `#[repr(C)]` rules.
    pub offset: u32,
    /// Offset reported by host reflection.
    pub managed_offset: u32,
    /// Whether the field is part of the public surface.
    pub is_public: bool,
}

/// Memory layout of a flat struct on both sides of the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructLayout {
    pub size: u32,
    pub align: u32,
    /// Size reported by host reflection.
    pub managed_size: u32,
    pub fields: Vec<FieldSlot>,
}

/// Underlying representation and named values of an enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    pub underlying: PrimitiveKind,
    pub values: Vec<(String, i64)>,
}

/// Parameter and return types of a delegate.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DelegateSignature {
    pub params: Vec<ParamDescriptor>,
    pub return_type: TypeRef,
}

impl DelegateSignature {
    /// Hash shared by every delegate type with this signature.
    pub fn signature_hash(&self) -> TypeHash {
        let params: Vec<TypeHash> = self.params.iter().map(ParamDescriptor::identity).collect();
        TypeHash::from_signature(&params, self.return_type.type_hash())
    }
}

/// Kind-specific payload of a type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeShape {
    Class,
    Struct(StructLayout),
    Enum(EnumDescriptor),
    Delegate(DelegateSignature),
}

/// A fully resolved exposed type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    /// Fully qualified host name.
    pub name: String,
    pub hash: TypeHash,
    pub base: Option<TypeHash>,
    pub shape: TypeShape,
    /// Ordered by declaration order, then name.
    pub members: Vec<MemberDescriptor>,
    /// Whether the type was named in configuration (as opposed to reached).
    pub explicit: bool,
    /// Static classes have no instances, so no handle type and no release entry.
    pub is_static: bool,
}

impl TypeDescriptor {
    /// Create a descriptor with no members.
    pub fn new(name: impl Into<String>, shape: TypeShape) -> Self {
        let name = name.into();
        Self {
            hash: TypeHash::from_name(&name),
            name,
            base: None,
            shape,
            members: Vec::new(),
            explicit: false,
            is_static: false,
        }
    }

    pub fn with_base(mut self, base: TypeHash) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_member(mut self, member: MemberDescriptor) -> Self {
        self.members.push(member);
        self
    }

    pub fn explicit(mut self) -> Self {
        self.explicit = true;
        self
    }

    /// Mark a class as static. Ignored for other shapes.
    pub fn into_static(mut self) -> Self {
        self.is_static = matches!(self.shape, TypeShape::Class);
        self
    }

    /// Whether instances of this type cross the boundary as handles.
    pub fn has_instances(&self) -> bool {
        matches!(self.shape, TypeShape::Class) && !self.is_static
    }

    pub fn kind(&self) -> TypeKind {
        match self.shape {
            TypeShape::Class => TypeKind::Class,
            TypeShape::Struct(_) => TypeKind::Struct,
            TypeShape::Enum(_) => TypeKind::Enum,
            TypeShape::Delegate(_) => TypeKind::Delegate,
        }
    }

    /// Unqualified name (text after the last `.`).
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn layout(&self) -> Option<&StructLayout> {
        match &self.shape {
            TypeShape::Struct(layout) => Some(layout),
            _ => None,
        }
    }

    pub fn enum_info(&self) -> Option<&EnumDescriptor> {
        match &self.shape {
            TypeShape::Enum(info) => Some(info),
            _ => None,
        }
    }

    pub fn delegate_signature(&self) -> Option<&DelegateSignature> {
        match &self.shape {
            TypeShape::Delegate(sig) => Some(sig),
            _ => None,
        }
    }

    /// Iterate over every named type this descriptor references.
    pub fn referenced_types(&self) -> Vec<TypeHash> {
        let mut out = Vec::new();
        if let Some(base) = self.base {
            out.push(base);
        }
        let mut push = |h: TypeHash| out.push(h);
        match &self.shape {
            TypeShape::Struct(layout) => {
                for field in &layout.fields {
                    field.ty.for_each_named(&mut push);
                }
            }
            TypeShape::Delegate(sig) => {
                for param in &sig.params {
                    param.ty.for_each_named(&mut push);
                }
                sig.return_type.for_each_named(&mut push);
            }
            TypeShape::Class | TypeShape::Enum(_) => {}
        }
        for member in &self.members {
            for param in &member.params {
                param.ty.for_each_named(&mut push);
            }
            member.return_type.for_each_named(&mut push);
        }
        out
    }
}
