//! The closed binding model shared by the generator and the runtime.
//!
//! A [`BindingModel`] owns every resolved [`TypeDescriptor`] plus the flat
//! list of [`EntryPoint`]s derived from them. An entry point is one bridge
//! function: a constructor overload, a method overload, one side of a field
//! or property accessor, or a class's release function. Entry ids are
//! [`TypeHash`] values computed from owner, name and parameter identities,
//! so both generated artifacts and the runtime agree on them without any
//! registration handshake.

use rustc_hash::{FxHashMap, FxHashSet};

use crate::{
    DelegateSignature, MemberDescriptor, MemberKind, ParamDescriptor, ParamMode, TypeDescriptor,
    TypeHash, TypeKind, TypeRef,
};

/// Identifier of a bridge entry point.
pub type EntryId = TypeHash;

/// What a bridge entry point does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// Allocate or acquire an instance (class) or build a value (struct).
    Construct,
    /// Call a method.
    Invoke,
    /// Read a field or property.
    Get,
    /// Write a field or property.
    Set,
    /// Release a class handle.
    Release,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Construct => "construct",
            EntryKind::Invoke => "invoke",
            EntryKind::Get => "get",
            EntryKind::Set => "set",
            EntryKind::Release => "release",
        }
    }
}

/// Name of the synthetic receiver parameter.
pub const RECEIVER_PARAM: &str = "self";

/// One bridge function.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryPoint {
    pub id: EntryId,
    pub owner: TypeHash,
    pub kind: EntryKind,
    /// Index into the owner's member list (`None` for release).
    pub member: Option<usize>,
    /// Human-readable symbol, e.g. `Logger.Log(string)`.
    pub symbol: String,
    /// Whether `params[0]` is the receiver.
    pub has_receiver: bool,
    /// Wire parameters in order, receiver first when present.
    pub params: Vec<ParamDescriptor>,
    pub returns: TypeRef,
}

impl EntryPoint {
    /// Parameters excluding the receiver.
    pub fn arguments(&self) -> &[ParamDescriptor] {
        if self.has_receiver { &self.params[1..] } else { &self.params }
    }

    /// Number of parameters the callee writes back.
    pub fn write_back_count(&self) -> usize {
        self.params.iter().filter(|p| p.mode.writes_back()).count()
    }
}

/// The resolved, validated set of exposed types and their entry points.
#[derive(Debug, Clone, Default)]
pub struct BindingModel {
    types: Vec<TypeDescriptor>,
    by_hash: FxHashMap<TypeHash, usize>,
    forward_declarations: Vec<TypeHash>,
    entries: Vec<EntryPoint>,
    entry_index: FxHashMap<EntryId, usize>,
    symbol_index: FxHashMap<String, usize>,
    signatures: Vec<(TypeHash, DelegateSignature)>,
}

impl BindingModel {
    /// Build a model from types in their final emission order.
    ///
    /// `forward_declarations` lists types that take part in a reference
    /// cycle and must be declared before any definition.
    pub fn new(types: Vec<TypeDescriptor>, forward_declarations: Vec<TypeHash>) -> Self {
        let mut model = BindingModel {
            by_hash: types.iter().enumerate().map(|(i, t)| (t.hash, i)).collect(),
            types,
            forward_declarations,
            ..Default::default()
        };

        let mut entries = Vec::new();
        for ty in &model.types {
            model.collect_entries(ty, &mut entries);
        }
        for entry in entries {
            if model.entry_index.contains_key(&entry.id) {
                continue;
            }
            let index = model.entries.len();
            model.entry_index.insert(entry.id, index);
            model.symbol_index.insert(entry.symbol.clone(), index);
            model.entries.push(entry);
        }

        let mut seen = FxHashSet::default();
        for ty in &model.types {
            if let Some(sig) = ty.delegate_signature() {
                let hash = sig.signature_hash();
                if seen.insert(hash) {
                    model.signatures.push((hash, sig.clone()));
                }
            }
        }
        model
    }

    pub fn types(&self) -> &[TypeDescriptor] {
        &self.types
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn get(&self, hash: TypeHash) -> Option<&TypeDescriptor> {
        self.by_hash.get(&hash).map(|&i| &self.types[i])
    }

    pub fn get_by_name(&self, name: &str) -> Option<&TypeDescriptor> {
        self.get(TypeHash::from_name(name))
    }

    pub fn type_name(&self, hash: TypeHash) -> Option<&str> {
        self.get(hash).map(|t| t.name.as_str())
    }

    pub fn kind_of(&self, hash: TypeHash) -> Option<TypeKind> {
        self.get(hash).map(TypeDescriptor::kind)
    }

    /// Whether `actual` is `expected` or derives from it.
    pub fn is_subtype(&self, actual: TypeHash, expected: TypeHash) -> bool {
        let mut current = Some(actual);
        let mut steps = 0;
        while let Some(hash) = current {
            if hash == expected {
                return true;
            }
            steps += 1;
            if steps > self.types.len() {
                return false;
            }
            current = self.get(hash).and_then(|t| t.base);
        }
        false
    }

    pub fn forward_declarations(&self) -> &[TypeHash] {
        &self.forward_declarations
    }

    pub fn is_forward_declared(&self, hash: TypeHash) -> bool {
        self.forward_declarations.contains(&hash)
    }

    pub fn entries(&self) -> &[EntryPoint] {
        &self.entries
    }

    pub fn entry(&self, id: EntryId) -> Option<&EntryPoint> {
        self.entry_index.get(&id).map(|&i| &self.entries[i])
    }

    pub fn entry_by_symbol(&self, symbol: &str) -> Option<&EntryPoint> {
        self.symbol_index.get(symbol).map(|&i| &self.entries[i])
    }

    /// Entry points owned by one type, in emission order.
    pub fn entries_for(&self, owner: TypeHash) -> impl Iterator<Item = &EntryPoint> {
        self.entries.iter().filter(move |e| e.owner == owner)
    }

    /// The member an entry point was derived from.
    pub fn member(&self, entry: &EntryPoint) -> Option<&MemberDescriptor> {
        let index = entry.member?;
        self.get(entry.owner)?.members.get(index)
    }

    /// Distinct delegate signatures, in first-appearance order.
    pub fn delegate_signatures(&self) -> &[(TypeHash, DelegateSignature)] {
        &self.signatures
    }

    /// Render a type reference with model names substituted for hashes.
    pub fn display_type(&self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Named(hash) => self
                .type_name(*hash)
                .map(str::to_string)
                .unwrap_or_else(|| format!("<{hash}>")),
            TypeRef::Array(array) => format!(
                "{}[{}]",
                self.display_type(&array.element),
                ",".repeat(array.rank.saturating_sub(1) as usize)
            ),
            other => other.to_string(),
        }
    }

    fn display_params(&self, params: &[ParamDescriptor]) -> String {
        params
            .iter()
            .map(|p| match p.mode {
                ParamMode::In => self.display_type(&p.ty),
                ParamMode::Out => format!("out {}", self.display_type(&p.ty)),
                ParamMode::Ref => format!("ref {}", self.display_type(&p.ty)),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn collect_entries(&self, ty: &TypeDescriptor, out: &mut Vec<EntryPoint>) {
        let kind = ty.kind();
        if matches!(kind, TypeKind::Enum | TypeKind::Delegate) {
            return;
        }
        let owner = ty.hash;
        let receiver = |mode: ParamMode| ParamDescriptor::new(RECEIVER_PARAM, TypeRef::Named(owner)).with_mode(mode);

        for (index, member) in ty.members.iter().enumerate() {
            let with_receiver = |params: Vec<ParamDescriptor>, mode: ParamMode| {
                if member.is_static() {
                    params
                } else {
                    std::iter::once(receiver(mode)).chain(params).collect()
                }
            };
            let entry = |kind, id, symbol, params: Vec<ParamDescriptor>, returns| EntryPoint {
                id,
                owner,
                kind,
                member: Some(index),
                symbol,
                has_receiver: !member.is_static() && member.kind != MemberKind::Constructor,
                params,
                returns,
            };

            match member.kind {
                MemberKind::Constructor => out.push(entry(
                    EntryKind::Construct,
                    TypeHash::from_constructor(owner, &member.param_hashes()),
                    format!("{}..ctor({})", ty.name, self.display_params(&member.params)),
                    member.params.clone(),
                    TypeRef::Named(owner),
                )),
                MemberKind::Method => out.push(entry(
                    EntryKind::Invoke,
                    TypeHash::from_method(owner, &member.name, &member.param_hashes()),
                    format!("{}.{}({})", ty.name, member.name, self.display_params(&member.params)),
                    with_receiver(member.params.clone(), ParamMode::In),
                    member.return_type.clone(),
                )),
                MemberKind::Field | MemberKind::Property => {
                    // Instance fields of flat structs are read in place.
                    if kind == TypeKind::Struct && member.kind == MemberKind::Field && !member.is_static() {
                        continue;
                    }
                    if member.is_readable() {
                        out.push(entry(
                            EntryKind::Get,
                            TypeHash::from_getter(owner, &member.name),
                            format!("{}.get_{}", ty.name, member.name),
                            with_receiver(Vec::new(), ParamMode::In),
                            member.return_type.clone(),
                        ));
                    }
                    if member.is_writable() {
                        // Struct setters write the updated receiver back.
                        let mode = if kind == TypeKind::Struct { ParamMode::Ref } else { ParamMode::In };
                        out.push(entry(
                            EntryKind::Set,
                            TypeHash::from_setter(owner, &member.name),
                            format!("{}.set_{}", ty.name, member.name),
                            with_receiver(vec![ParamDescriptor::new("value", member.return_type.clone())], mode),
                            TypeRef::Void,
                        ));
                    }
                }
            }
        }

        if ty.has_instances() {
            out.push(EntryPoint {
                id: TypeHash::from_release(owner),
                owner,
                kind: EntryKind::Release,
                member: None,
                symbol: format!("{}.~Release", ty.name),
                has_receiver: true,
                params: vec![receiver(ParamMode::In)],
                returns: TypeRef::Void,
            });
        }
    }
}
