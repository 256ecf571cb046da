//! Managed (C#) artifact emission.
//!
//! Every entry point becomes one `[UnmanagedCallersOnly]` bridge function
//! with a fixed calling convention:
//!
//! - only primitives, flat structs, enums and handles cross directly;
//!   strings and arrays cross as `BridgeString` / `BridgeArray` views;
//! - the return value is an `int` status (`BridgeStatus`);
//! - results and `out`/`ref` values are written through pointers, and a
//!   failure is captured into the caller's `ErrorRecord`.
//!
//! The emitted code depends on the `HostBridge.Runtime` support library for
//! pinning (`Handles`), string and array views (`Marshaling`) and delegate
//! plumbing (`Delegates`).

use hostbridge_core::{
    BindingModel, DelegateSignature, EntryKind, EntryPoint, ParamDescriptor, ParamMode,
    PrimitiveKind, StatusCode, TypeDescriptor, TypeHash, TypeKind, TypeRef,
};
use rustc_hash::FxHashMap;

use crate::naming::{self, NameAllocator, TokenStyle};
use crate::options::GeneratorOptions;
use crate::writer::CodeWriter;

/// Emit the managed artifact body.
pub fn emit(model: &BindingModel, options: &GeneratorOptions) -> String {
    let mut emitter = ManagedEmitter::new(model);
    emitter.emit_all(&options.managed_namespace);
    emitter.w.finish()
}

/// A bridge function and the entry id it is registered under.
struct Registered {
    id: TypeHash,
    function: String,
    pointer_type: String,
}

struct ManagedEmitter<'m> {
    model: &'m BindingModel,
    class_names: FxHashMap<TypeHash, String>,
    table: Vec<Registered>,
    invokers: Vec<Registered>,
    w: CodeWriter,
}

impl<'m> ManagedEmitter<'m> {
    fn new(model: &'m BindingModel) -> Self {
        let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
        for ty in model.types() {
            *counts.entry(naming::simple_name(&ty.name)).or_default() += 1;
        }
        let mut allocator = NameAllocator::new();
        let class_names = model
            .types()
            .iter()
            .map(|ty| {
                let simple = naming::simple_name(&ty.name);
                let base = if counts[simple] > 1 { ty.name.as_str() } else { simple };
                let ident = naming::csharp_ident(base);
                (ty.hash, allocator.claim(ident.trim_start_matches('@')))
            })
            .collect();
        Self {
            model,
            class_names,
            table: Vec::new(),
            invokers: Vec::new(),
            w: CodeWriter::new(),
        }
    }

    fn short(&self, hash: TypeHash) -> &str {
        self.class_names.get(&hash).map_or("Unknown", String::as_str)
    }

    /// Fully qualified C# spelling of a model type.
    fn qualified(&self, hash: TypeHash) -> String {
        match self.model.type_name(hash) {
            Some(name) => format!("global::{}", name.replace('+', ".")),
            None => "object".to_string(),
        }
    }

    fn emit_all(&mut self, namespace: &str) {
        let model = self.model;
        self.w.line("#nullable enable");
        self.w.blank();
        self.w.line("using System;");
        self.w.line("using System.Runtime.CompilerServices;");
        self.w.line("using System.Runtime.InteropServices;");
        self.w.line("using HostBridge.Runtime;");
        self.w.blank();
        self.w.open_own_line(format!("namespace {namespace}"));

        self.w.comment("/// ", "Status codes returned by every bridge function.");
        self.w.open_own_line("public static class BridgeStatus");
        for status in StatusCode::ALL {
            self.w.line(format!("public const int {} = {};", status.name(), i32::from(status)));
        }
        self.w.close();

        self.emit_callback_types();

        for ty in model.types() {
            match ty.kind() {
                TypeKind::Enum => {}
                TypeKind::Delegate => self.emit_delegate_invoker(ty),
                TypeKind::Class | TypeKind::Struct => self.emit_bridge_class(ty),
            }
        }

        self.emit_entry_table();
        self.w.close();
    }

    // ------------------------------------------------------------------
    // Type spellings
    // ------------------------------------------------------------------

    /// The type a value has while crossing.
    fn wire_type(&self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Void => "void".to_string(),
            TypeRef::Primitive(PrimitiveKind::Bool) => "byte".to_string(),
            TypeRef::Primitive(kind) => kind.managed_name().to_string(),
            TypeRef::String => "BridgeString".to_string(),
            TypeRef::Array(_) => "BridgeArray".to_string(),
            TypeRef::Named(hash) => match self.model.kind_of(*hash) {
                Some(TypeKind::Struct | TypeKind::Enum) => self.qualified(*hash),
                _ => "ulong".to_string(),
            },
        }
    }

    /// The type a value has in ordinary managed code.
    fn managed_type(&self, ty: &TypeRef) -> String {
        match ty {
            TypeRef::Void => "void".to_string(),
            TypeRef::Primitive(kind) => kind.managed_name().to_string(),
            TypeRef::String => "string".to_string(),
            TypeRef::Array(array) => {
                let commas = ",".repeat(usize::from(array.rank.saturating_sub(1)));
                format!("{}[{commas}]", self.managed_type(&array.element))
            }
            TypeRef::Named(hash) => match self.model.kind_of(*hash) {
                Some(TypeKind::Class | TypeKind::Delegate) => format!("{}?", self.qualified(*hash)),
                _ => self.qualified(*hash),
            },
        }
    }

    /// Convert a crossing value into its managed form.
    fn from_wire(&self, ty: &TypeRef, expr: &str) -> String {
        match ty {
            TypeRef::Primitive(PrimitiveKind::Bool) => format!("{expr} != 0"),
            TypeRef::String => format!("Marshaling.ReadString({expr})"),
            TypeRef::Array(_) => format!("Marshaling.ReadArray<{}>({expr})", self.managed_type(ty)),
            TypeRef::Named(hash) => match self.model.kind_of(*hash) {
                Some(TypeKind::Class) => format!("Handles.Get<{}>({expr})", self.qualified(*hash)),
                Some(TypeKind::Delegate) => format!("Delegates.Get<{}>({expr})", self.qualified(*hash)),
                _ => expr.to_string(),
            },
            _ => expr.to_string(),
        }
    }

    /// Convert a managed value into its crossing form.
    fn to_wire(&self, ty: &TypeRef, expr: &str) -> String {
        match ty {
            TypeRef::Primitive(PrimitiveKind::Bool) => format!("(byte)({expr} ? 1 : 0)"),
            TypeRef::String => format!("Marshaling.WriteString({expr})"),
            TypeRef::Array(_) => format!("Marshaling.WriteArray({expr})"),
            TypeRef::Named(hash) => match self.model.kind_of(*hash) {
                Some(TypeKind::Class | TypeKind::Delegate) => format!("Handles.Pin({expr})"),
                _ => expr.to_string(),
            },
            _ => expr.to_string(),
        }
    }

    // ------------------------------------------------------------------
    // Delegates
    // ------------------------------------------------------------------

    /// One callback type per distinct signature, for calling native
    /// callbacks from managed code.
    fn emit_callback_types(&mut self) {
        let model = self.model;
        for (hash, signature) in model.delegate_signatures() {
            let Some(first) = model
                .types()
                .iter()
                .find(|t| t.delegate_signature().is_some_and(|s| s.signature_hash() == *hash))
            else {
                continue;
            };
            let name = format!("{}Callback", self.short(first.hash));
            let mut params = vec!["ulong callback".to_string()];
            params.extend(self.wire_params(&signature.params));
            if !signature.return_type.is_void() {
                params.push(format!("{}* result", self.wire_type(&signature.return_type)));
            }
            params.push("ErrorRecord* error".to_string());

            self.w.blank();
            self.w.comment("/// ", &format!("Native callback with the signature of `{}`.", first.name));
            self.w.line("[UnmanagedFunctionPointer(CallingConvention.Cdecl)]");
            self.w.line(format!("public unsafe delegate int {name}({});", params.join(", ")));
            self.emit_callback_adapter(first, signature, &name);
        }
    }

    /// `Wrap` turns a native callback handle into a managed delegate.
    fn emit_callback_adapter(&mut self, ty: &TypeDescriptor, signature: &DelegateSignature, callback: &str) {
        let params = csharp_params(&signature.params);
        let declared: Vec<String> = params
            .iter()
            .map(|(n, p)| format!("{}{} {n}", mode_keyword(p.mode), self.managed_type(&p.ty)))
            .collect();

        self.w.blank();
        self.w.open_own_line(format!("public static unsafe class {callback}Adapter"));
        self.w.open_own_line(format!("public static {} Wrap(ulong callback)", self.qualified(ty.hash)));
        self.w.line(format!("var invoke = Delegates.NativeInvoker<{callback}>();"));
        self.w.open_own_line(format!("return ({}) =>", declared.join(", ")));
        let mut args = vec!["callback".to_string()];
        for (n, p) in &params {
            match p.mode {
                ParamMode::In => args.push(self.to_wire(&p.ty, n)),
                ParamMode::Out => {
                    self.w.line(format!("{} {n}_wire = default;", self.wire_type(&p.ty)));
                    args.push(format!("&{n}_wire"));
                }
                ParamMode::Ref => {
                    self.w.line(format!("var {n}_wire = {};", self.to_wire(&p.ty, n)));
                    args.push(format!("&{n}_wire"));
                }
            }
        }
        if !signature.return_type.is_void() {
            self.w.line(format!("{} result = default;", self.wire_type(&signature.return_type)));
            args.push("&result".to_string());
        }
        self.w.line("ErrorRecord error = default;");
        args.push("&error".to_string());
        self.w.line(format!("Marshaling.ThrowIfFailed(invoke({}), ref error);", args.join(", ")));
        for (n, p) in &params {
            if p.mode.writes_back() {
                self.w.line(format!("{n} = {};", self.from_wire(&p.ty, &format!("{n}_wire"))));
            }
        }
        if !signature.return_type.is_void() {
            self.w.line(format!("return {};", self.from_wire(&signature.return_type, "result")));
        }
        self.w.close_with("};");
        self.w.close();
        self.w.close();
    }

    /// Bridge function native code uses to invoke a managed delegate.
    fn emit_delegate_invoker(&mut self, ty: &TypeDescriptor) {
        let Some(signature) = ty.delegate_signature() else { return };
        let function = format!("{}_Invoke", self.short(ty.hash));
        let params = csharp_params(&signature.params);

        let mut declared = vec!["ulong self".to_string()];
        declared.extend(self.wire_params(&signature.params));
        if !signature.return_type.is_void() {
            declared.push(format!("{}* result", self.wire_type(&signature.return_type)));
        }
        declared.push("ErrorRecord* error".to_string());

        self.w.blank();
        self.w.comment("/// ", &format!("Bridge functions for `{}`.", ty.name));
        self.w.open_own_line(format!("public static unsafe class {}_Bridge", self.short(ty.hash)));
        self.w.line("[UnmanagedCallersOnly(CallConvs = new[] { typeof(CallConvCdecl) })]");
        self.w.open_own_line(format!("public static int {function}({})", declared.join(", ")));
        self.open_try();
        self.w.line(format!("var target = Delegates.Get<{}>(self)!;", self.qualified(ty.hash)));
        let call_args = self.unpack_params(&params);
        let call = format!("target({})", call_args.join(", "));
        self.finish_call(&call, &signature.return_type, &params);
        self.close_try();
        self.w.close();
        self.w.close();

        let pointer_type = self.pointer_type(&declared);
        self.invokers.push(Registered {
            id: ty.hash,
            function: format!("{}_Bridge.{function}", self.short(ty.hash)),
            pointer_type,
        });
    }

    // ------------------------------------------------------------------
    // Bridge functions
    // ------------------------------------------------------------------

    fn emit_bridge_class(&mut self, ty: &TypeDescriptor) {
        let model = self.model;
        let entries: Vec<&EntryPoint> = model.entries_for(ty.hash).collect();
        if entries.is_empty() {
            return;
        }
        let short = self.short(ty.hash).to_string();
        let names = self.function_names(&short, &entries);

        self.w.blank();
        self.w.comment("/// ", &format!("Bridge functions for `{}`.", ty.name));
        self.w.open_own_line(format!("public static unsafe class {short}_Bridge"));
        for (entry, function) in entries.iter().zip(names) {
            self.w.blank();
            self.emit_bridge_function(ty, entry, &short, &function);
        }
        self.w.close();
    }

    /// `Logger_Log`, `Math_Abs_float`, `Logger_get_Name`, `Logger_Release`.
    fn function_names(&self, short: &str, entries: &[&EntryPoint]) -> Vec<String> {
        let bases: Vec<String> = entries
            .iter()
            .map(|e| {
                let member = self.model.member(e).map(|m| m.name.clone()).unwrap_or_default();
                match e.kind {
                    EntryKind::Construct => format!("{short}_Construct"),
                    EntryKind::Release => format!("{short}_Release"),
                    EntryKind::Get => format!("{short}_get_{member}"),
                    EntryKind::Set => format!("{short}_set_{member}"),
                    EntryKind::Invoke => format!("{short}_{member}"),
                }
            })
            .collect();

        let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
        for (i, e) in entries.iter().enumerate() {
            if !matches!(e.kind, EntryKind::Construct | EntryKind::Invoke) {
                continue;
            }
            match groups.iter_mut().find(|(b, _)| *b == bases[i]) {
                Some((_, indices)) => indices.push(i),
                None => groups.push((bases[i].clone(), vec![i])),
            }
        }
        let mut resolved = bases;
        for (base, indices) in &groups {
            let overloads: Vec<&[ParamDescriptor]> = indices.iter().map(|&i| entries[i].arguments()).collect();
            for (&i, name) in indices
                .iter()
                .zip(naming::overload_names(self.model, base, &overloads, TokenStyle::Managed))
            {
                resolved[i] = name;
            }
        }
        let mut allocator = NameAllocator::new();
        resolved.iter().map(|n| allocator.claim(&naming::csharp_ident(n))).collect()
    }

    fn emit_bridge_function(&mut self, ty: &TypeDescriptor, entry: &EntryPoint, short: &str, function: &str) {
        let params = csharp_params(entry.arguments());
        let is_struct = ty.kind() == TypeKind::Struct;
        let receiver = entry.has_receiver.then(|| entry.params[0].mode);

        let mut declared = Vec::new();
        match receiver {
            Some(ParamMode::Ref) => declared.push(format!("{}* self", self.qualified(ty.hash))),
            Some(_) if is_struct => declared.push(format!("{} self", self.qualified(ty.hash))),
            Some(_) => declared.push("ulong self".to_string()),
            None => {}
        }
        declared.extend(self.wire_params(entry.arguments()));
        let returns = match entry.kind {
            EntryKind::Construct => TypeRef::Named(ty.hash),
            _ => entry.returns.clone(),
        };
        if !returns.is_void() {
            declared.push(format!("{}* result", self.wire_type(&returns)));
        }
        declared.push("ErrorRecord* error".to_string());

        self.w.comment("/// ", &format!("`{}`", entry.symbol));
        self.w.line("[UnmanagedCallersOnly(CallConvs = new[] { typeof(CallConvCdecl) })]");
        self.w.open_own_line(format!("public static int {function}({})", declared.join(", ")));

        if entry.kind == EntryKind::Release {
            self.open_try();
            self.w.line("Handles.Release(self);");
            self.w.line("return BridgeStatus.Ok;");
            self.close_try();
            self.w.close();
            self.register(entry.id, format!("{short}_Bridge.{function}"), &declared);
            return;
        }

        self.open_try();
        let target = match receiver {
            Some(ParamMode::Ref) => {
                self.w.line("var target = *self;");
                "target".to_string()
            }
            Some(_) if is_struct => "self".to_string(),
            Some(_) => {
                self.w.line(format!("var target = Handles.Get<{}>(self)!;", self.qualified(ty.hash)));
                "target".to_string()
            }
            None => self.qualified(ty.hash),
        };
        let call_args = self.unpack_params(&params);
        let model = self.model;
        let member = model.member(entry);
        let member_name = member.map(|m| m.name.as_str()).unwrap_or_default();

        match entry.kind {
            EntryKind::Construct => {
                let call = format!("new {}({})", self.qualified(ty.hash), call_args.join(", "));
                self.finish_call(&call, &returns, &params);
            }
            EntryKind::Invoke => {
                let call = format!("{target}.{member_name}({})", call_args.join(", "));
                self.finish_call(&call, &returns, &params);
            }
            EntryKind::Get => {
                let call = format!("{target}.{member_name}");
                self.finish_call(&call, &returns, &params);
            }
            EntryKind::Set => {
                let value = call_args.first().cloned().unwrap_or_default();
                self.w.line(format!("{target}.{member_name} = {value};"));
                if receiver == Some(ParamMode::Ref) {
                    self.w.line("*self = target;");
                }
                self.w.line("return BridgeStatus.Ok;");
            }
            EntryKind::Release => {}
        }
        self.close_try();
        self.w.close();
        self.register(entry.id, format!("{short}_Bridge.{function}"), &declared);
    }

    /// Local conversions for each argument; returns the call arguments.
    fn unpack_params(&mut self, params: &[(String, &ParamDescriptor)]) -> Vec<String> {
        params
            .iter()
            .map(|(n, p)| match p.mode {
                ParamMode::In => self.from_wire(&p.ty, n),
                ParamMode::Out => {
                    self.w.line(format!("{} {n}_value;", self.managed_type(&p.ty)));
                    format!("out {n}_value")
                }
                ParamMode::Ref => {
                    self.w.line(format!("var {n}_value = {};", self.from_wire(&p.ty, &format!("*{n}"))));
                    format!("ref {n}_value")
                }
            })
            .collect()
    }

    fn finish_call(&mut self, call: &str, returns: &TypeRef, params: &[(String, &ParamDescriptor)]) {
        if returns.is_void() {
            self.w.line(format!("{call};"));
        } else {
            self.w.line(format!("var value = {call};"));
        }
        for (n, p) in params {
            if p.mode.writes_back() {
                self.w.line(format!("*{n} = {};", self.to_wire(&p.ty, &format!("{n}_value"))));
            }
        }
        if !returns.is_void() {
            self.w.line(format!("*result = {};", self.to_wire(returns, "value")));
        }
        self.w.line("return BridgeStatus.Ok;");
    }

    fn open_try(&mut self) {
        self.w.open_own_line("try");
    }

    fn close_try(&mut self) {
        self.w.close();
        self.w.open_own_line("catch (Exception e)");
        self.w.line("return Marshaling.Capture(e, error);");
        self.w.close();
    }

    fn wire_params(&self, params: &[ParamDescriptor]) -> Vec<String> {
        csharp_params(params)
            .into_iter()
            .flat_map(|(n, p)| {
                let wire = self.wire_type(&p.ty);
                match p.mode {
                    ParamMode::In => vec![format!("{wire} {n}")],
                    ParamMode::Out | ParamMode::Ref => vec![format!("{wire}* {n}")],
                }
            })
            .collect()
    }

    /// `delegate* unmanaged[Cdecl]<ulong, ErrorRecord*, int>` for a
    /// declared parameter list.
    fn pointer_type(&self, declared: &[String]) -> String {
        let mut types: Vec<&str> = declared
            .iter()
            .map(|d| d.rsplit_once(' ').map_or(d.as_str(), |(ty, _)| ty))
            .collect();
        types.push("int");
        format!("delegate* unmanaged[Cdecl]<{}>", types.join(", "))
    }

    fn register(&mut self, id: TypeHash, function: String, declared: &[String]) {
        let pointer_type = self.pointer_type(declared);
        self.table.push(Registered {
            id,
            function,
            pointer_type,
        });
    }

    // ------------------------------------------------------------------
    // Entry table
    // ------------------------------------------------------------------

    fn emit_entry_table(&mut self) {
        let table = std::mem::take(&mut self.table);
        let invokers = std::mem::take(&mut self.invokers);

        self.w.blank();
        self.w.comment(
            "/// ",
            "The table handed to native code at initialization, keyed by entry id.",
        );
        self.w.open_own_line("public static unsafe class EntryTable");
        self.w.line(format!("public const int Count = {};", table.len()));
        self.w.line(format!("public const int DelegateCount = {};", invokers.len()));
        self.emit_fill("Fill", "Count", &table);
        self.emit_fill("FillDelegates", "DelegateCount", &invokers);
        self.w.close();
    }

    fn emit_fill(&mut self, method: &str, count: &str, rows: &[Registered]) {
        self.w.blank();
        self.w.open_own_line(format!("public static int {method}(EntrySlot* slots, int capacity)"));
        self.w.open_own_line(format!("if (capacity < {count})"));
        self.w.line(format!("return -{count};"));
        self.w.close();
        for (i, row) in rows.iter().enumerate() {
            self.w.line(format!(
                "slots[{i}] = new EntrySlot(0x{:016x}UL, (IntPtr)({})&{});",
                row.id.0, row.pointer_type, row.function
            ));
        }
        self.w.line(format!("return {count};"));
        self.w.close();
    }
}

/// C# parameter names, clear of the generated locals.
fn csharp_params(params: &[ParamDescriptor]) -> Vec<(String, &ParamDescriptor)> {
    let mut names = NameAllocator::with_reserved(&["self", "result", "error", "target", "value", "callback", "invoke", "e"]);
    params
        .iter()
        .map(|p| (names.claim(&naming::csharp_ident(&p.name)), p))
        .collect()
}

fn mode_keyword(mode: ParamMode) -> &'static str {
    match mode {
        ParamMode::In => "",
        ParamMode::Out => "out ",
        ParamMode::Ref => "ref ",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostbridge_core::{FieldSlot, MemberDescriptor, StructLayout, TypeShape};

    fn float() -> TypeRef {
        TypeRef::Primitive(PrimitiveKind::Float)
    }

    fn model() -> BindingModel {
        let layout = StructLayout {
            size: 8,
            align: 4,
            managed_size: 8,
            fields: vec![
                FieldSlot {
                    name: "X".into(),
                    ty: float(),
                    offset: 0,
                    managed_offset: 0,
                    is_public: true,
                },
                FieldSlot {
                    name: "Y".into(),
                    ty: float(),
                    offset: 4,
                    managed_offset: 4,
                    is_public: true,
                },
            ],
        };
        let point = TypeDescriptor::new("Game.Point", TypeShape::Struct(layout))
            .with_member(MemberDescriptor::property("Length", float(), true, false))
            .with_member(MemberDescriptor::property("Scale", float(), false, true));
        let logger = TypeDescriptor::new("Game.Logger", TypeShape::Class)
            .with_member(MemberDescriptor::constructor(Vec::new()))
            .with_member(MemberDescriptor::method(
                "Log",
                vec![ParamDescriptor::new("message", TypeRef::String)],
                TypeRef::Void,
            ))
            .with_member(MemberDescriptor::method(
                "Log",
                vec![ParamDescriptor::new("level", TypeRef::Primitive(PrimitiveKind::Int32))],
                TypeRef::Void,
            ))
            .with_member(MemberDescriptor::method(
                "TryRead",
                vec![ParamDescriptor::new("value", float()).with_mode(ParamMode::Out)],
                TypeRef::Primitive(PrimitiveKind::Bool),
            ));
        let tick = TypeDescriptor::new(
            "Game.OnTick",
            TypeShape::Delegate(DelegateSignature {
                params: vec![ParamDescriptor::new("dt", float())],
                return_type: TypeRef::Void,
            }),
        );
        let math = TypeDescriptor::new("Game.Math", TypeShape::Class).into_static().with_member(
            MemberDescriptor::method("Abs", vec![ParamDescriptor::new("v", float())], float()).into_static(),
        );
        BindingModel::new(vec![point, logger, tick, math], Vec::new())
    }

    #[test]
    fn status_codes_are_mirrored() {
        let out = emit(&model(), &GeneratorOptions::default());
        assert!(out.contains("namespace HostBridge.Generated\n{"));
        assert!(out.contains("public const int Ok = 0;"));
        assert!(out.contains("public const int ArrayRank = 6;"));
    }

    #[test]
    fn overloads_and_lifecycle_functions() {
        let out = emit(&model(), &GeneratorOptions::default());
        assert!(out.contains("public static int Logger_Construct(ulong* result, ErrorRecord* error)"));
        assert!(out.contains("public static int Logger_Log_string(ulong self, BridgeString message, ErrorRecord* error)"));
        assert!(out.contains("public static int Logger_Log_int(ulong self, int level, ErrorRecord* error)"));
        assert!(out.contains("public static int Logger_Release(ulong self, ErrorRecord* error)"));
        assert!(out.contains("target.Log(Marshaling.ReadString(message));"));
        assert!(out.contains("return Marshaling.Capture(e, error);"));
    }

    #[test]
    fn out_parameters_write_through_pointers() {
        let out = emit(&model(), &GeneratorOptions::default());
        assert!(out.contains("public static int Logger_TryRead(ulong self, float* value_2, byte* result, ErrorRecord* error)"));
        assert!(out.contains("float value_2_value;"));
        assert!(out.contains("*value_2 = value_2_value;"));
        assert!(out.contains("*result = (byte)(value ? 1 : 0);"));
    }

    #[test]
    fn struct_setters_write_the_receiver_back() {
        let out = emit(&model(), &GeneratorOptions::default());
        assert!(out.contains("public static int Point_set_Scale(global::Game.Point* self, float value_2, ErrorRecord* error)"));
        assert!(out.contains("*self = target;"));
        assert!(out.contains("public static int Point_get_Length(global::Game.Point self, float* result, ErrorRecord* error)"));
    }

    #[test]
    fn entry_table_covers_every_entry() {
        let model = model();
        let out = emit(&model, &GeneratorOptions::default());
        assert!(out.contains(&format!("public const int Count = {};", model.entries().len())));
        assert!(out.contains("public const int DelegateCount = 1;"));
        for entry in model.entries() {
            assert!(out.contains(&format!("0x{:016x}UL", entry.id.0)), "{}", entry.symbol);
        }
    }

    #[test]
    fn delegates_get_callback_types() {
        let out = emit(&model(), &GeneratorOptions::default());
        assert!(out.contains("public unsafe delegate int OnTickCallback(ulong callback, float dt, ErrorRecord* error);"));
        assert!(out.contains("public static int OnTick_Invoke(ulong self, float dt, ErrorRecord* error)"));
        assert!(out.contains("public static global::Game.OnTick Wrap(ulong callback)"));
    }

    #[test]
    fn every_bridge_class_is_documented() {
        let out = emit(&model(), &GeneratorOptions::default());
        assert!(out.contains("/// Bridge functions for `Game.OnTick`.\n    public static unsafe class OnTick_Bridge"));
        let classes = out.matches("_Bridge\n").count();
        assert_eq!(out.matches("/// Bridge functions for ").count(), classes);
    }

    #[test]
    fn static_classes_have_no_release() {
        let out = emit(&model(), &GeneratorOptions::default());
        assert!(out.contains("public static int Math_Abs("));
        assert!(!out.contains("Math_Release"));
    }

    #[test]
    fn emission_is_deterministic() {
        let options = GeneratorOptions::default().with_managed_namespace("Game.Bindings");
        assert_eq!(emit(&model(), &options), emit(&model(), &options));
    }
}
