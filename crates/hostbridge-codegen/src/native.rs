//! Native (Rust) artifact emission.
//!
//! For every type in the model the artifact carries a mirror type, its
//! conversion trait impls and an inherent impl holding one entry-id
//! constant plus one call-through per entry point:
//!
//! | Kind     | Mirror                                   | Conversions               |
//! |----------|------------------------------------------|---------------------------|
//! | struct   | `#[repr(C)]` + `Pod`, layout assertions  | `BridgeStruct`            |
//! | class    | `#[repr(transparent)]` handle newtype    | `HandleType`              |
//! | static   | unit struct                              | none                      |
//! | enum     | `#[repr(<underlying>)]` enum             | `BridgeEnum`              |
//! | delegate | handle newtype + function-pointer alias  | `HandleType`, `wrap`      |
//!
//! Call-throughs marshal their arguments into `Value`s, cross through the
//! `BridgeContext`, then convert the return value and every `out`/`ref`
//! write-back.

use hostbridge_core::{
    BindingModel, EntryKind, EntryPoint, MemberKind, ParamDescriptor, ParamMode, PrimitiveKind,
    StructLayout, TypeDescriptor, TypeHash, TypeKind, TypeRef, TypeShape,
};
use rustc_hash::FxHashMap;

use crate::naming::{self, NameAllocator, TokenStyle};
use crate::options::{ErrorPolicy, GeneratorOptions};
use crate::writer::CodeWriter;

/// Locals used by generated bodies; parameters are renamed around them.
const RESERVED_LOCALS: &[&str] = &["ctx", "args", "ret", "frame", "f", "handle", "self_"];

/// Emit the native artifact body.
pub fn emit(model: &BindingModel, options: &GeneratorOptions) -> String {
    let mut emitter = NativeEmitter::new(model, options);
    emitter.emit_all();
    emitter.w.finish()
}

/// Rust identifiers for every type in the model.
///
/// Simple names are used unless two types share one, in which case both
/// spell out their full path.
pub(crate) fn type_names(model: &BindingModel) -> FxHashMap<TypeHash, String> {
    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
    for ty in model.types() {
        *counts.entry(naming::simple_name(&ty.name)).or_default() += 1;
    }
    let mut allocator = NameAllocator::new();
    model
        .types()
        .iter()
        .map(|ty| {
            let simple = naming::simple_name(&ty.name);
            let base = if counts[simple] > 1 {
                ty.name.split(['.', '+']).collect::<String>()
            } else {
                simple.to_string()
            };
            (ty.hash, allocator.claim(&naming::rust_ident(&base)))
        })
        .collect()
}

fn hash_literal(hash: TypeHash) -> String {
    format!("TypeHash(0x{:016x})", hash.0)
}

/// Where a type appears, which decides borrowed vs owned spellings.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Position {
    Param,
    Owned,
}

/// One generated function.
struct CallThrough<'e> {
    entry: &'e EntryPoint,
    fn_name: String,
    const_name: String,
    params: Vec<(String, &'e ParamDescriptor)>,
}

struct NativeEmitter<'m> {
    model: &'m BindingModel,
    options: &'m GeneratorOptions,
    names: FxHashMap<TypeHash, String>,
    w: CodeWriter,
}

impl<'m> NativeEmitter<'m> {
    fn new(model: &'m BindingModel, options: &'m GeneratorOptions) -> Self {
        Self {
            model,
            options,
            names: type_names(model),
            w: CodeWriter::new(),
        }
    }

    fn name(&self, hash: TypeHash) -> &str {
        self.names.get(&hash).map_or("Value", String::as_str)
    }

    fn raise(&self) -> bool {
        self.options.error_policy == ErrorPolicy::Raise
    }

    fn emit_all(&mut self) {
        self.w.line("#![allow(dead_code, non_camel_case_types, non_snake_case, unused_imports, unused_mut, clippy::all)]");
        self.w.blank();
        self.w.line(format!("use {}::prelude::*;", self.options.runtime_crate));
        self.w.blank();
        self.w.comment("/// ", "Number of bridge entry points, which must equal the managed entry table's.");
        self.w.line(format!("pub const ENTRY_COUNT: usize = {};", self.model.entries().len()));

        // Types in a reference cycle come first
        let model = self.model;
        let forward = model.forward_declarations();
        let ordered = model
            .types()
            .iter()
            .filter(|t| forward.contains(&t.hash))
            .chain(model.types().iter().filter(|t| !forward.contains(&t.hash)));
        for ty in ordered {
            self.w.blank();
            self.w.line(format!("// {}", "=".repeat(76)));
            self.w.line(format!("// {} ({})", ty.name, ty.kind().as_str()));
            self.w.line(format!("// {}", "=".repeat(76)));
            self.w.blank();
            match &ty.shape {
                TypeShape::Struct(layout) => self.emit_struct(ty, layout),
                TypeShape::Class => self.emit_class(ty),
                TypeShape::Enum(_) => self.emit_enum(ty),
                TypeShape::Delegate(_) => self.emit_delegate(ty),
            }
        }
    }

    // ------------------------------------------------------------------
    // Type spellings
    // ------------------------------------------------------------------

    fn value_type(&self, ty: &TypeRef, position: Position) -> String {
        match ty {
            TypeRef::Void => "()".to_string(),
            TypeRef::Primitive(kind) => kind.native_name().to_string(),
            TypeRef::String => match position {
                Position::Param => "&str".to_string(),
                Position::Owned => "String".to_string(),
            },
            TypeRef::Named(hash) => match self.model.kind_of(*hash) {
                Some(TypeKind::Struct | TypeKind::Enum) => self.name(*hash).to_string(),
                Some(TypeKind::Class | TypeKind::Delegate) => format!("Option<{}>", self.name(*hash)),
                None => "Value".to_string(),
            },
            TypeRef::Array(array) if array.rank == 1 => {
                format!("Vec<{}>", self.value_type(&array.element, Position::Owned))
            }
            TypeRef::Array(_) => "ArrayValue".to_string(),
        }
    }

    fn param_type(&self, param: &ParamDescriptor, position: Position) -> String {
        match param.mode {
            ParamMode::In => self.value_type(&param.ty, position),
            ParamMode::Out => format!("&mut OutSlot<{}>", self.value_type(&param.ty, Position::Owned)),
            ParamMode::Ref => format!("&mut {}", self.value_type(&param.ty, Position::Owned)),
        }
    }

    fn field_type(&self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Primitive(kind) => kind.native_name().to_string(),
            TypeRef::Named(hash) => match self.model.get(*hash).map(|t| &t.shape) {
                Some(TypeShape::Enum(info)) => info.underlying.native_name().to_string(),
                Some(TypeShape::Struct(_)) => self.name(*hash).to_string(),
                _ => "u64".to_string(),
            },
            _ => "u64".to_string(),
        }
    }

    // ------------------------------------------------------------------
    // Mirrors
    // ------------------------------------------------------------------

    fn emit_struct(&mut self, ty: &TypeDescriptor, layout: &StructLayout) {
        let name = self.name(ty.hash).to_string();
        self.w.comment("/// ", &format!("Mirror of `{}`, copied byte-for-byte across the boundary.", ty.name));
        self.w.line("#[repr(C)]");
        self.w.line("#[derive(Debug, Clone, Copy, PartialEq, ::bytemuck::Pod, ::bytemuck::Zeroable)]");
        self.w.open(format!("pub struct {name}"));
        let mut cursor = 0;
        let mut pads = 0;
        let mut fields = NameAllocator::new();
        let mut idents = Vec::new();
        for field in &layout.fields {
            if field.offset > cursor {
                self.w.line(format!("pub _pad{pads}: [u8; {}],", field.offset - cursor));
                pads += 1;
            }
            let ident = fields.claim(&naming::rust_ident(&naming::snake_case(&field.name)));
            self.w.line(format!("pub {ident}: {},", self.field_type(&field.ty)));
            cursor = field.offset + self.field_size(&field.ty);
            idents.push((ident, field.offset));
        }
        if layout.size > cursor {
            self.w.line(format!("pub _pad{pads}: [u8; {}],", layout.size - cursor));
        }
        self.w.close();
        self.w.blank();

        self.w.line(format!("const _: () = assert!(std::mem::size_of::<{name}>() == {});", layout.size));
        self.w.line(format!("const _: () = assert!(std::mem::align_of::<{name}>() == {});", layout.align));
        for (ident, offset) in &idents {
            self.w.line(format!("const _: () = assert!(std::mem::offset_of!({name}, {ident}) == {offset});"));
        }
        self.w.blank();

        self.w.open(format!("impl BridgeStruct for {name}"));
        self.w.line(format!("const TYPE_HASH: TypeHash = {};", hash_literal(ty.hash)));
        self.w.line(format!("const TYPE_NAME: &'static str = {:?};", ty.name));
        self.w.close();
        self.emit_conversions(&name, "struct_from_value(value)", "struct_to_value(&self)");
        self.emit_entries(ty, &name, &["from_value", "into_value"]);
    }

    fn field_size(&self, ty: &TypeRef) -> u32 {
        match ty {
            TypeRef::Primitive(kind) => kind.size(),
            TypeRef::Named(hash) => match self.model.get(*hash).map(|t| &t.shape) {
                Some(TypeShape::Enum(info)) => info.underlying.size(),
                Some(TypeShape::Struct(layout)) => layout.size,
                _ => 8,
            },
            _ => 8,
        }
    }

    fn emit_handle_newtype(&mut self, ty: &TypeDescriptor, name: &str, kind: &str) {
        self.w.line("#[repr(transparent)]");
        self.w.line("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]");
        self.w.line(format!("pub struct {name}(Handle);"));
        self.w.blank();
        self.w.open(format!("impl HandleType for {name}"));
        self.w.line(format!("const TYPE_HASH: TypeHash = {};", hash_literal(ty.hash)));
        self.w.line(format!("const TYPE_NAME: &'static str = {:?};", ty.name));
        self.w.line(format!("const KIND: TypeKind = TypeKind::{kind};"));
        self.w.blank();
        self.w.open("fn from_handle(handle: Handle) -> Self");
        self.w.line("Self(handle)");
        self.w.close();
        self.w.blank();
        self.w.open("fn handle(self) -> Handle");
        self.w.line("self.0");
        self.w.close();
        self.w.close();
        self.emit_conversions(name, "handle_from_value(value)", "handle_to_value(self)");
    }

    fn emit_class(&mut self, ty: &TypeDescriptor) {
        let name = self.name(ty.hash).to_string();
        if ty.is_static {
            self.w.comment("/// ", &format!("Static members of `{}`.", ty.name));
            self.w.line("#[derive(Debug, Clone, Copy)]");
            self.w.line(format!("pub struct {name};"));
            self.emit_entries(ty, &name, &[]);
            return;
        }
        self.w.comment("/// ", &format!("Handle to a pinned `{}`.", ty.name));
        if self.model.entries_for(ty.hash).all(|e| e.kind == EntryKind::Release) {
            self.w.comment("/// ", "\nOpaque: it can be passed around and released, nothing more.");
        }
        self.emit_handle_newtype(ty, &name, "Class");

        // Upcasts along the base chain
        let mut base = ty.base;
        let mut guard = 0;
        while let Some(hash) = base {
            let Some(base_ty) = self.model.get(hash) else { break };
            if guard > self.model.len() {
                break;
            }
            guard += 1;
            let base_name = self.name(hash).to_string();
            self.w.blank();
            self.w.open(format!("impl From<{name}> for {base_name}"));
            self.w.open(format!("fn from(value: {name}) -> Self"));
            self.w.line("Self(value.0)");
            self.w.close();
            self.w.close();
            base = base_ty.base;
        }
        self.emit_entries(ty, &name, &["from_handle", "handle", "from_value", "into_value"]);
    }

    fn emit_enum(&mut self, ty: &TypeDescriptor) {
        let Some(info) = ty.enum_info() else { return };
        let name = self.name(ty.hash).to_string();
        let repr = info.underlying.native_name();
        let unsigned = matches!(
            info.underlying,
            PrimitiveKind::Uint8 | PrimitiveKind::Uint16 | PrimitiveKind::Uint32 | PrimitiveKind::Uint64
        );
        let literal = |value: i64| if unsigned { (value as u64).to_string() } else { value.to_string() };

        // First name wins a value; later names become aliases
        let mut variants: Vec<(String, i64)> = Vec::new();
        let mut aliases: Vec<(String, String)> = Vec::new();
        let mut idents = NameAllocator::with_reserved(&["Self"]);
        for (value_name, value) in &info.values {
            let ident = idents.claim(&naming::rust_ident(value_name));
            match variants.iter().find(|(_, v)| v == value) {
                Some((target, _)) => aliases.push((ident, target.clone())),
                None => variants.push((ident, *value)),
            }
        }

        self.w.comment("/// ", &format!("Mirror of `{}`.", ty.name));
        if variants.is_empty() {
            // Without declared values the enum is just its representation
            self.w.line("#[repr(transparent)]");
            self.w.line("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]");
            self.w.line(format!("pub struct {name}(pub {repr});"));
        } else {
            self.w.line(format!("#[repr({repr})]"));
            self.w.line("#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]");
            self.w.open(format!("pub enum {name}"));
            for (ident, value) in &variants {
                self.w.line(format!("{ident} = {},", literal(*value)));
            }
            self.w.close();
        }

        if !aliases.is_empty() {
            self.w.blank();
            self.w.open(format!("impl {name}"));
            for (alias, target) in &aliases {
                let const_name = naming::screaming_snake_case(alias.trim_start_matches("r#"));
                self.w.line(format!("pub const {const_name}: {name} = {name}::{target};"));
            }
            self.w.close();
        }

        self.w.blank();
        self.w.open(format!("impl BridgeEnum for {name}"));
        self.w.line(format!("const TYPE_HASH: TypeHash = {};", hash_literal(ty.hash)));
        self.w.line(format!("const TYPE_NAME: &'static str = {:?};", ty.name));
        self.w.blank();
        self.w.open("fn to_raw(self) -> i64");
        if variants.is_empty() {
            self.w.line("self.0 as i64");
        } else {
            self.w.line("self as i64");
        }
        self.w.close();
        self.w.blank();
        self.w.open("fn from_raw(raw: i64) -> Option<Self>");
        if variants.is_empty() {
            self.w.line(format!("{repr}::try_from(raw).ok().map(Self)"));
        } else {
            self.w.open("match raw");
            for (ident, value) in &variants {
                self.w.line(format!("{value} => Some(Self::{ident}),"));
            }
            self.w.line("_ => None,");
            self.w.close();
        }
        self.w.close();
        self.w.close();
        self.emit_conversions(&name, "enum_from_value(value)", "enum_to_value(self)");
    }

    fn emit_delegate(&mut self, ty: &TypeDescriptor) {
        let Some(signature) = ty.delegate_signature() else { return };
        let name = self.name(ty.hash).to_string();
        let fn_alias = format!("{name}Fn");

        // One function-pointer type per distinct signature; later delegates alias it
        let signature_hash = signature.signature_hash();
        let first = self
            .model
            .types()
            .iter()
            .find(|t| t.delegate_signature().is_some_and(|s| s.signature_hash() == signature_hash))
            .map(|t| t.hash);
        let params = param_names(&signature.params);
        if first == Some(ty.hash) {
            let mut types = vec!["&BridgeContext".to_string()];
            types.extend(params.iter().map(|(_, p)| self.param_type(p, Position::Owned)));
            let ret = self.value_type(&signature.return_type, Position::Owned);
            self.w.comment("/// ", &format!("Native callback signature of `{}`.", ty.name));
            self.w.line(format!("pub type {fn_alias} = fn({}) -> BridgeResult<{ret}>;", types.join(", ")));
        } else if let Some(first) = first {
            let target = format!("{}Fn", self.name(first));
            self.w.comment("/// ", &format!("`{}` shares its signature with `{target}`.", ty.name));
            self.w.line(format!("pub type {fn_alias} = {target};"));
        }
        self.w.blank();

        self.w.comment("/// ", &format!("Handle to a `{}` delegate.", ty.name));
        self.w.comment("/// ", "\nThe target is either a managed delegate or a native callback made with\n[`wrap`](Self::wrap); [`invoke`](Self::invoke) reaches both.");
        self.emit_handle_newtype(ty, &name, "Delegate");
        self.w.blank();

        let returns = self.value_type(&signature.return_type, Position::Owned);
        let raise = self.raise();
        self.w.open(format!("impl {name}"));

        // invoke
        let invoke = if raise { "try_invoke" } else { "invoke" };
        let args: Vec<String> = params
            .iter()
            .map(|(n, p)| format!("{n}: {}", self.param_type(p, Position::Param)))
            .collect();
        self.w.comment("/// ", "Invoke the delegate, wherever its target lives.");
        self.w.open(format!(
            "pub fn {invoke}(self, ctx: &BridgeContext{}) -> BridgeResult<{returns}>",
            prefixed(&args)
        ));
        self.emit_args(&params, None);
        let call = format!("ctx.invoke_delegate(self.0, {})?", args_expr(&params, None));
        self.emit_call_and_return(&call, &params, None, &signature.return_type);
        self.w.close();
        if raise {
            self.w.blank();
            let forwarded: Vec<&str> = params.iter().map(|(n, _)| n.as_str()).collect();
            self.w.open(format!("pub fn invoke(self, ctx: &BridgeContext{}){}", prefixed(&args), arrow(&returns)));
            self.w.line(format!("raise(self.try_invoke(ctx{}))", prefixed(&forwarded)));
            self.w.close();
        }
        self.w.blank();

        // wrap
        let wrap = if raise { "try_wrap" } else { "wrap" };
        self.w.comment("/// ", &format!("Expose a native function to managed code as a `{}`.", ty.name));
        self.w.open(format!("pub fn {wrap}(ctx: &BridgeContext, f: {fn_alias}) -> BridgeResult<{name}>"));
        self.w.open("let handle = ctx.wrap_callback(<Self as HandleType>::TYPE_HASH, move |frame|");
        let mut call_args = vec!["frame.context()".to_string()];
        for (i, (n, p)) in params.iter().enumerate() {
            let owned = self.value_type(&p.ty, Position::Owned);
            match p.mode {
                ParamMode::In => {
                    self.w.line(format!("let {n}: {owned} = frame.arg({i})?;"));
                    call_args.push(n.clone());
                }
                ParamMode::Out => {
                    self.w.line(format!("let mut {n}: OutSlot<{owned}> = OutSlot::new();"));
                    call_args.push(format!("&mut {n}"));
                }
                ParamMode::Ref => {
                    self.w.line(format!("let mut {n}: {owned} = frame.arg({i})?;"));
                    call_args.push(format!("&mut {n}"));
                }
            }
        }
        if signature.return_type.is_void() {
            self.w.line(format!("f({})?;", call_args.join(", ")));
        } else {
            self.w.line(format!("let ret = f({})?;", call_args.join(", ")));
            self.w.line("frame.set_return(ret);");
        }
        for (i, (n, p)) in params.iter().enumerate() {
            match p.mode {
                ParamMode::In => {}
                ParamMode::Out => {
                    self.w.open(format!("if let Some(value) = {n}.into_inner()"));
                    self.w.line(format!("frame.set_out({i}, value)?;"));
                    self.w.close();
                }
                ParamMode::Ref => self.w.line(format!("frame.set_out({i}, {n})?;")),
            }
        }
        self.w.line("Ok(())");
        self.w.close_with("})?;");
        self.w.line("Ok(Self(handle))");
        self.w.close();
        if raise {
            self.w.blank();
            self.w.open(format!("pub fn wrap(ctx: &BridgeContext, f: {fn_alias}) -> {name}"));
            self.w.line("raise(Self::try_wrap(ctx, f))");
            self.w.close();
        }
        self.w.close();
    }

    fn emit_conversions(&mut self, name: &str, from: &str, into: &str) {
        self.w.blank();
        self.w.open(format!("impl FromValue for {name}"));
        self.w.open("fn from_value(value: Value) -> Result<Self, MarshalError>");
        self.w.line(from);
        self.w.close();
        self.w.close();
        self.w.blank();
        self.w.open(format!("impl IntoValue for {name}"));
        self.w.open("fn into_value(self) -> Value");
        self.w.line(into);
        self.w.close();
        self.w.close();
    }

    // ------------------------------------------------------------------
    // Call-throughs
    // ------------------------------------------------------------------

    fn plan(&self, ty: &TypeDescriptor, reserved: &[&str]) -> Vec<CallThrough<'m>> {
        let model = self.model;
        let entries: Vec<&'m EntryPoint> = model.entries_for(ty.hash).collect();
        let bases: Vec<String> = entries
            .iter()
            .map(|e| {
                let member = model.member(e).map(|m| naming::snake_case(&m.name));
                match (e.kind, member) {
                    (EntryKind::Construct, _) => "new".to_string(),
                    (EntryKind::Release, _) => "release".to_string(),
                    (EntryKind::Set, Some(m)) => format!("set_{m}"),
                    (_, Some(m)) => m,
                    (_, None) => "entry".to_string(),
                }
            })
            .collect();

        // Overloads share a base name and come from constructors or methods
        let mut groups: FxHashMap<&str, Vec<usize>> = FxHashMap::default();
        for (i, e) in entries.iter().enumerate() {
            if matches!(e.kind, EntryKind::Construct | EntryKind::Invoke) {
                groups.entry(bases[i].as_str()).or_default().push(i);
            }
        }
        let mut resolved: Vec<String> = bases.clone();
        for (base, indices) in &groups {
            let overloads: Vec<&[ParamDescriptor]> = indices.iter().map(|&i| entries[i].arguments()).collect();
            let names = naming::overload_names(model, base, &overloads, TokenStyle::Native);
            for (&i, name) in indices.iter().zip(names) {
                resolved[i] = name;
            }
        }

        let mut fns = NameAllocator::with_reserved(reserved);
        let mut consts = NameAllocator::with_reserved(&["TYPE_HASH", "TYPE_NAME", "KIND"]);
        entries
            .into_iter()
            .zip(resolved)
            .map(|(entry, base)| {
                let fn_name = fns.claim(&naming::rust_ident(&base));
                if self.raise() {
                    fns.claim(&format!("try_{}", fn_name.trim_start_matches("r#")));
                }
                let const_base = match entry.kind {
                    EntryKind::Get => format!("GET_{}", naming::screaming_snake_case(&base)),
                    _ => naming::screaming_snake_case(&base),
                };
                CallThrough {
                    entry,
                    fn_name,
                    const_name: consts.claim(&const_base),
                    params: param_names(entry.arguments()),
                }
            })
            .collect()
    }

    fn emit_entries(&mut self, ty: &TypeDescriptor, name: &str, reserved: &[&str]) {
        let plan = self.plan(ty, reserved);
        if plan.is_empty() {
            return;
        }
        self.w.blank();
        self.w.open(format!("impl {name}"));
        for call in &plan {
            self.w.line(format!(
                "pub const {}: EntryId = {};",
                call.const_name,
                hash_literal(call.entry.id)
            ));
        }
        for call in &plan {
            self.w.blank();
            self.emit_call_through(ty, name, call);
        }
        self.w.close();
    }

    fn emit_call_through(&mut self, ty: &TypeDescriptor, owner: &str, call: &CallThrough<'_>) {
        let entry = call.entry;
        let receiver = entry.has_receiver.then(|| entry.params[0].mode);
        let self_param = match receiver {
            Some(ParamMode::Ref) => "&mut self, ",
            Some(_) => "self, ",
            None => "",
        };
        let args: Vec<String> = call
            .params
            .iter()
            .map(|(n, p)| format!("{n}: {}", self.param_type(p, Position::Param)))
            .collect();
        let returns = match entry.kind {
            EntryKind::Construct => owner.to_string(),
            _ => self.value_type(&entry.returns, Position::Owned),
        };

        let doc = match (entry.kind, self.model.member(entry)) {
            (EntryKind::Release, _) => format!("Release this handle (`{}`).", entry.symbol),
            (EntryKind::Construct, _) => format!("`{}`", entry.symbol),
            (_, Some(m)) if m.kind == MemberKind::Field => format!("Field `{}`.", entry.symbol),
            (_, Some(m)) if m.kind == MemberKind::Property => format!("Property `{}`.", entry.symbol),
            _ => format!("`{}`", entry.symbol),
        };
        self.w.comment("/// ", &doc);
        if entry.kind == EntryKind::Release && ty.kind() == TypeKind::Class {
            self.w.comment("/// ", "\nThe handle is stale afterwards, for every copy of it.");
        }

        let raise = self.raise();
        let fn_name = if raise {
            format!("try_{}", call.fn_name.trim_start_matches("r#"))
        } else {
            call.fn_name.clone()
        };
        self.w.open(format!(
            "pub fn {fn_name}({self_param}ctx: &BridgeContext{}) -> BridgeResult<{returns}>",
            prefixed(&args)
        ));
        self.emit_args(&call.params, receiver);
        let target = format!("ctx.call(Self::{}, {})?", call.const_name, args_expr(&call.params, receiver));
        let returned = match entry.kind {
            EntryKind::Construct => TypeRef::Named(ty.hash),
            _ => entry.returns.clone(),
        };
        self.emit_call_and_return(&target, &call.params, receiver, &returned);
        self.w.close();

        if raise {
            self.w.blank();
            self.w.comment("/// ", &doc);
            self.w.open(format!(
                "pub fn {}({self_param}ctx: &BridgeContext{}){}",
                call.fn_name,
                prefixed(&args),
                arrow(&returns)
            ));
            let forwarded: Vec<&str> = call.params.iter().map(|(n, _)| n.as_str()).collect();
            let callee = if receiver.is_some() { "self." } else { "Self::" };
            self.w.line(format!("raise({callee}{fn_name}(ctx{}))", prefixed(&forwarded)));
            self.w.close();
        }
    }

    /// `let mut args = [...]` for calls with at least one wire argument.
    fn emit_args(&mut self, params: &[(String, &ParamDescriptor)], receiver: Option<ParamMode>) {
        if params.is_empty() && receiver.is_none() {
            return;
        }
        let mut values = Vec::new();
        match receiver {
            Some(ParamMode::Ref) => values.push("(*self).into_value()".to_string()),
            Some(_) => values.push("self.into_value()".to_string()),
            None => {}
        }
        for (n, p) in params {
            values.push(match p.mode {
                ParamMode::In => format!("{n}.into_value()"),
                ParamMode::Out => "Value::Void".to_string(),
                ParamMode::Ref => format!("{n}.clone().into_value()"),
            });
        }
        self.w.line(format!("let mut args = [{}];", values.join(", ")));
    }

    fn emit_call_and_return(
        &mut self,
        call: &str,
        params: &[(String, &ParamDescriptor)],
        receiver: Option<ParamMode>,
        returns: &TypeRef,
    ) {
        if returns.is_void() {
            self.w.line(format!("{call};"));
        } else {
            self.w.line(format!("let ret = {call};"));
        }
        let offset = usize::from(receiver.is_some());
        if receiver == Some(ParamMode::Ref) {
            self.w.line("*self = FromValue::from_value(std::mem::take(&mut args[0]))?;");
        }
        for (i, (n, p)) in params.iter().enumerate() {
            let index = i + offset;
            match p.mode {
                ParamMode::In => {}
                ParamMode::Out => {
                    self.w.line(format!("{n}.set(FromValue::from_value(std::mem::take(&mut args[{index}]))?);"))
                }
                ParamMode::Ref => {
                    self.w.line(format!("*{n} = FromValue::from_value(std::mem::take(&mut args[{index}]))?;"))
                }
            }
        }
        if returns.is_void() {
            self.w.line("Ok(())");
        } else {
            self.w.line("Ok(FromValue::from_value(ret)?)");
        }
    }
}

/// Rust parameter names, clear of the locals generated bodies use.
fn param_names(params: &[ParamDescriptor]) -> Vec<(String, &ParamDescriptor)> {
    let mut names = NameAllocator::with_reserved(RESERVED_LOCALS);
    params
        .iter()
        .map(|p| (names.claim(&naming::rust_ident(&naming::snake_case(&p.name))), p))
        .collect()
}

/// ` -> T`, or nothing for unit.
fn arrow(returns: &str) -> String {
    if returns == "()" { String::new() } else { format!(" -> {returns}") }
}

fn prefixed<S: AsRef<str>>(items: &[S]) -> String {
    items.iter().map(|s| format!(", {}", s.as_ref())).collect()
}

fn args_expr(params: &[(String, &ParamDescriptor)], receiver: Option<ParamMode>) -> &'static str {
    if params.is_empty() && receiver.is_none() { "&mut []" } else { "&mut args" }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostbridge_core::{DelegateSignature, EnumDescriptor, FieldSlot, MemberDescriptor};

    fn float() -> TypeRef {
        TypeRef::Primitive(PrimitiveKind::Float)
    }

    fn vector3() -> TypeDescriptor {
        let hash = TypeHash::from_name("Vector3");
        let fields = ["x", "y", "z"]
            .iter()
            .enumerate()
            .map(|(i, n)| FieldSlot {
                name: n.to_string(),
                ty: float(),
                offset: i as u32 * 4,
                managed_offset: i as u32 * 4,
                is_public: true,
            })
            .collect();
        let layout = StructLayout {
            size: 12,
            align: 4,
            managed_size: 12,
            fields,
        };
        TypeDescriptor::new("Vector3", TypeShape::Struct(layout))
            .with_member(MemberDescriptor::method(
                "Add",
                vec![ParamDescriptor::new("other", TypeRef::Named(hash))],
                TypeRef::Named(hash),
            ))
            .with_member(MemberDescriptor::property("Length", float(), true, false))
    }

    fn logger() -> TypeDescriptor {
        TypeDescriptor::new("Game.Logger", TypeShape::Class)
            .with_member(MemberDescriptor::constructor(Vec::new()))
            .with_member(MemberDescriptor::method(
                "Log",
                vec![ParamDescriptor::new("message", TypeRef::String)],
                TypeRef::Void,
            ))
            .with_member(MemberDescriptor::method(
                "TryGetLevel",
                vec![ParamDescriptor::new("level", TypeRef::Primitive(PrimitiveKind::Int32)).with_mode(ParamMode::Out)],
                TypeRef::Primitive(PrimitiveKind::Bool),
            ))
            .with_member(MemberDescriptor::property("Name", TypeRef::String, true, true))
    }

    fn math() -> TypeDescriptor {
        TypeDescriptor::new("Math", TypeShape::Class)
            .into_static()
            .with_member(
                MemberDescriptor::method("Abs", vec![ParamDescriptor::new("v", float())], float()).into_static(),
            )
            .with_member(
                MemberDescriptor::method(
                    "Abs",
                    vec![ParamDescriptor::new("v", TypeRef::Primitive(PrimitiveKind::Int32))],
                    TypeRef::Primitive(PrimitiveKind::Int32),
                )
                .into_static(),
            )
    }

    fn model() -> BindingModel {
        let tick = TypeDescriptor::new(
            "OnTick",
            TypeShape::Delegate(DelegateSignature {
                params: vec![ParamDescriptor::new("dt", float())],
                return_type: TypeRef::Void,
            }),
        );
        let level = TypeDescriptor::new(
            "LogLevel",
            TypeShape::Enum(EnumDescriptor {
                underlying: PrimitiveKind::Int32,
                values: vec![("Info".into(), 0), ("Warn".into(), 1), ("Default".into(), 0)],
            }),
        );
        BindingModel::new(vec![vector3(), logger(), math(), tick, level], Vec::new())
    }

    #[test]
    fn struct_mirror_is_pod_with_assertions() {
        let out = emit(&model(), &GeneratorOptions::default());
        assert!(out.contains("#[repr(C)]"));
        assert!(out.contains("pub struct Vector3 {\n    pub x: f32,\n    pub y: f32,\n    pub z: f32,\n}"));
        assert!(out.contains("const _: () = assert!(std::mem::size_of::<Vector3>() == 12);"));
        assert!(out.contains("const _: () = assert!(std::mem::offset_of!(Vector3, z) == 8);"));
        assert!(out.contains("impl BridgeStruct for Vector3"));
        assert!(out.contains("pub fn add(self, ctx: &BridgeContext, other: Vector3) -> BridgeResult<Vector3> {"));
        assert!(out.contains("pub fn length(self, ctx: &BridgeContext) -> BridgeResult<f32> {"));
    }

    #[test]
    fn class_call_throughs() {
        let out = emit(&model(), &GeneratorOptions::default());
        assert!(out.contains("pub struct Logger(Handle);"));
        assert!(out.contains("const TYPE_NAME: &'static str = \"Game.Logger\";"));
        assert!(out.contains("pub fn new(ctx: &BridgeContext) -> BridgeResult<Logger> {"));
        assert!(out.contains("let ret = ctx.call(Self::NEW, &mut [])?;"));
        assert!(out.contains("pub fn log(self, ctx: &BridgeContext, message: &str) -> BridgeResult<()> {"));
        assert!(out.contains("pub fn name(self, ctx: &BridgeContext) -> BridgeResult<String> {"));
        assert!(out.contains("pub fn set_name(self, ctx: &BridgeContext, value: &str) -> BridgeResult<()> {"));
        assert!(out.contains("pub fn release(self, ctx: &BridgeContext) -> BridgeResult<()> {"));
    }

    #[test]
    fn out_parameters_use_out_slots() {
        let out = emit(&model(), &GeneratorOptions::default());
        assert!(out.contains(
            "pub fn try_get_level(self, ctx: &BridgeContext, level: &mut OutSlot<i32>) -> BridgeResult<bool> {"
        ));
        assert!(out.contains("level.set(FromValue::from_value(std::mem::take(&mut args[1]))?);"));
    }

    #[test]
    fn overloads_get_distinct_functions() {
        let out = emit(&model(), &GeneratorOptions::default());
        assert!(out.contains("pub fn abs_f32(ctx: &BridgeContext, v: f32) -> BridgeResult<f32> {"));
        assert!(out.contains("pub fn abs_i32(ctx: &BridgeContext, v: i32) -> BridgeResult<i32> {"));
        assert!(out.contains("pub const ABS_F32: EntryId"));
        assert!(out.contains("pub const ABS_I32: EntryId"));
    }

    #[test]
    fn static_classes_are_unit_structs() {
        let out = emit(&model(), &GeneratorOptions::default());
        assert!(out.contains("/// Static members of `Math`.\n#[derive(Debug, Clone, Copy)]\npub struct Math;\n"));
        assert!(!out.contains("impl HandleType for Math"));
        assert!(!out.contains("impl FromValue for Math"));
    }

    #[test]
    fn enums_keep_aliases_as_constants() {
        let out = emit(&model(), &GeneratorOptions::default());
        assert!(out.contains("#[repr(i32)]\n#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]\npub enum LogLevel {"));
        assert!(out.contains("    Info = 0,\n    Warn = 1,\n}"));
        assert!(out.contains("pub const DEFAULT: LogLevel = LogLevel::Info;"));
        assert!(out.contains("1 => Some(Self::Warn),"));
    }

    #[test]
    fn delegates_get_fn_pointer_and_wrap() {
        let out = emit(&model(), &GeneratorOptions::default());
        assert!(out.contains("pub type OnTickFn = fn(&BridgeContext, f32) -> BridgeResult<()>;"));
        assert!(out.contains("pub fn invoke(self, ctx: &BridgeContext, dt: f32) -> BridgeResult<()> {"));
        assert!(out.contains("pub fn wrap(ctx: &BridgeContext, f: OnTickFn) -> BridgeResult<OnTick> {"));
        assert!(out.contains("let dt: f32 = frame.arg(0)?;"));
    }

    #[test]
    fn raise_policy_adds_try_twins() {
        let options = GeneratorOptions::default().with_error_policy(ErrorPolicy::Raise);
        let out = emit(&model(), &options);
        assert!(out.contains("pub fn try_log(self, ctx: &BridgeContext, message: &str) -> BridgeResult<()> {"));
        assert!(out.contains("pub fn log(self, ctx: &BridgeContext, message: &str) {"));
        assert!(out.contains("raise(self.try_log(ctx, message))"));
        assert!(out.contains("raise(Self::try_abs_f32(ctx, v))"));
    }

    #[test]
    fn padding_is_explicit() {
        let layout = StructLayout {
            size: 8,
            align: 4,
            managed_size: 8,
            fields: vec![
                FieldSlot {
                    name: "Tag".into(),
                    ty: TypeRef::Primitive(PrimitiveKind::Uint8),
                    offset: 0,
                    managed_offset: 0,
                    is_public: true,
                },
                FieldSlot {
                    name: "Count".into(),
                    ty: TypeRef::Primitive(PrimitiveKind::Int32),
                    offset: 4,
                    managed_offset: 4,
                    is_public: true,
                },
            ],
        };
        let model = BindingModel::new(vec![TypeDescriptor::new("Packed", TypeShape::Struct(layout))], Vec::new());
        let out = emit(&model, &GeneratorOptions::default());
        assert!(out.contains("    pub tag: u8,\n    pub _pad0: [u8; 3],\n    pub count: i32,\n}"));
    }

    #[test]
    fn colliding_simple_names_use_full_paths() {
        let model = BindingModel::new(
            vec![
                TypeDescriptor::new("Game.Logger", TypeShape::Class),
                TypeDescriptor::new("Tools.Logger", TypeShape::Class),
            ],
            Vec::new(),
        );
        let names = type_names(&model);
        assert_eq!(names[&TypeHash::from_name("Game.Logger")], "GameLogger");
        assert_eq!(names[&TypeHash::from_name("Tools.Logger")], "ToolsLogger");
    }

    #[test]
    fn emission_is_deterministic() {
        let a = emit(&model(), &GeneratorOptions::default());
        let b = emit(&model(), &GeneratorOptions::default());
        assert_eq!(a, b);
    }
}
