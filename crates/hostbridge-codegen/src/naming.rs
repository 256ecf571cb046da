//! Identifier derivation for both artifacts.
//!
//! Host names are PascalCase and may be namespaced (`Game.Logger`) or
//! nested (`Game.World+Cell`). Native identifiers follow Rust casing;
//! managed identifiers keep host casing. Every rule here is a pure
//! function of its input so that regeneration is stable.

use hostbridge_core::{BindingModel, ParamDescriptor, ParamMode, TypeRef};
use rustc_hash::{FxHashMap, FxHashSet};

const RUST_KEYWORDS: &[&str] = &[
    "abstract", "as", "async", "await", "become", "box", "break", "const", "continue", "do", "dyn",
    "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if", "impl", "in", "let", "loop",
    "macro", "match", "mod", "move", "mut", "override", "priv", "pub", "ref", "return", "static",
    "struct", "trait", "true", "try", "type", "typeof", "unsafe", "unsized", "use", "virtual", "where",
    "while", "yield",
];

/// Keywords that cannot be raw identifiers.
const RUST_RESERVED: &[&str] = &["crate", "self", "Self", "super", "_"];

const CSHARP_KEYWORDS: &[&str] = &[
    "abstract", "as", "base", "bool", "break", "byte", "case", "catch", "char", "checked", "class",
    "const", "continue", "decimal", "default", "delegate", "do", "double", "else", "enum", "event",
    "explicit", "extern", "false", "finally", "fixed", "float", "for", "foreach", "goto", "if",
    "implicit", "in", "int", "interface", "internal", "is", "lock", "long", "namespace", "new", "null",
    "object", "operator", "out", "override", "params", "private", "protected", "public", "readonly",
    "ref", "return", "sbyte", "sealed", "short", "sizeof", "stackalloc", "static", "string", "struct",
    "switch", "this", "throw", "true", "try", "typeof", "uint", "ulong", "unchecked", "unsafe",
    "ushort", "using", "virtual", "void", "volatile", "while",
];

/// `HealthPoints` → `health_points`, `HTTPServer` → `http_server`.
pub fn snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, &c) in chars.iter().enumerate() {
        if !c.is_ascii_alphanumeric() {
            out.push('_');
            continue;
        }
        if c.is_ascii_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_lower = chars.get(i + 1).is_some_and(|n| n.is_ascii_lowercase());
            if prev.is_ascii_lowercase() || prev.is_ascii_digit() || (prev.is_ascii_uppercase() && next_lower) {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    collapse_underscores(&out)
}

/// `HealthPoints` → `HEALTH_POINTS`.
pub fn screaming_snake_case(name: &str) -> String {
    snake_case(name).to_ascii_uppercase()
}

fn collapse_underscores(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c == '_' && (out.is_empty() || out.ends_with('_')) {
            continue;
        }
        out.push(c);
    }
    while out.ends_with('_') {
        out.pop();
    }
    out
}

/// Last segment of a namespaced or nested host name.
pub fn simple_name(full: &str) -> &str {
    full.rsplit(['.', '+']).next().unwrap_or(full)
}

/// Make `name` usable as a Rust identifier.
pub fn rust_ident(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.is_empty() {
        return "_unnamed".to_string();
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if RUST_RESERVED.contains(&ident.as_str()) {
        ident.push('_');
    } else if RUST_KEYWORDS.contains(&ident.as_str()) {
        ident.insert_str(0, "r#");
    }
    ident
}

/// Make `name` usable as a C# identifier.
pub fn csharp_ident(name: &str) -> String {
    let mut ident: String = name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if ident.is_empty() {
        return "_unnamed".to_string();
    }
    if ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if CSHARP_KEYWORDS.contains(&ident.as_str()) {
        ident.insert(0, '@');
    }
    ident
}

/// Hands out unique identifiers within one scope.
///
/// The first claim of a name gets it unchanged; later claims get `_2`,
/// `_3` and so on.
#[derive(Debug, Default)]
pub struct NameAllocator {
    used: FxHashSet<String>,
}

impl NameAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names that are taken before anything is claimed.
    pub fn with_reserved(names: &[&str]) -> Self {
        Self {
            used: names.iter().map(|n| n.to_string()).collect(),
        }
    }

    pub fn claim(&mut self, base: &str) -> String {
        if self.used.insert(base.to_string()) {
            return base.to_string();
        }
        let mut n = 2;
        loop {
            let candidate = format!("{base}_{n}");
            if self.used.insert(candidate.clone()) {
                return candidate;
            }
            n += 1;
        }
    }
}

/// Spelling used for type tokens in overload suffixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStyle {
    /// `f32`, `str`, `vector3`
    Native,
    /// `float`, `string`, `Vector3`
    Managed,
}

/// One token naming a parameter type, e.g. `f32` or `vector3_array`.
pub fn type_token(model: &BindingModel, ty: &TypeRef, style: TokenStyle) -> String {
    match ty {
        TypeRef::Void => "void".to_string(),
        TypeRef::Primitive(kind) => match style {
            TokenStyle::Native => kind.native_name().to_string(),
            TokenStyle::Managed => kind.managed_name().to_string(),
        },
        TypeRef::String => match style {
            TokenStyle::Native => "str".to_string(),
            TokenStyle::Managed => "string".to_string(),
        },
        TypeRef::Named(hash) => {
            let name = model.type_name(*hash).map(simple_name).unwrap_or("unknown");
            match style {
                TokenStyle::Native => snake_case(name),
                TokenStyle::Managed => csharp_ident(name).trim_start_matches('@').to_string(),
            }
        }
        TypeRef::Array(array) => {
            let element = type_token(model, &array.element, style);
            let suffix = match style {
                TokenStyle::Native => "array",
                TokenStyle::Managed => "Array",
            };
            if array.rank > 1 {
                format!("{element}_{suffix}{}", array.rank)
            } else {
                format!("{element}_{suffix}")
            }
        }
    }
}

/// Names for a group of overloads sharing `base`.
///
/// A single overload keeps `base`. Otherwise each gets a suffix listing
/// its parameter types; overloads that still collide (they differ only by
/// passing mode) also get their positional index.
pub fn overload_names(
    model: &BindingModel,
    base: &str,
    overloads: &[&[ParamDescriptor]],
    style: TokenStyle,
) -> Vec<String> {
    if overloads.len() <= 1 {
        return vec![base.to_string(); overloads.len()];
    }
    let candidates: Vec<String> = overloads
        .iter()
        .map(|params| {
            if params.is_empty() {
                return base.to_string();
            }
            let tokens: Vec<String> = params
                .iter()
                .map(|p| {
                    let token = type_token(model, &p.ty, style);
                    match (p.mode, style) {
                        (ParamMode::In, _) => token,
                        (ParamMode::Out, TokenStyle::Native) => format!("out_{token}"),
                        (ParamMode::Ref, TokenStyle::Native) => format!("ref_{token}"),
                        // Managed names ignore modes and rely on the index
                        (_, TokenStyle::Managed) => token,
                    }
                })
                .collect();
            format!("{base}_{}", tokens.join("_"))
        })
        .collect();

    let mut counts: FxHashMap<&str, usize> = FxHashMap::default();
    for c in &candidates {
        *counts.entry(c.as_str()).or_default() += 1;
    }
    candidates
        .iter()
        .enumerate()
        .map(|(i, c)| if counts[c.as_str()] > 1 { format!("{c}_{i}") } else { c.clone() })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use hostbridge_core::{PrimitiveKind, TypeDescriptor, TypeHash, TypeShape};

    #[test]
    fn snake_case_handles_acronyms() {
        assert_eq!(snake_case("HealthPoints"), "health_points");
        assert_eq!(snake_case("HTTPServer"), "http_server");
        assert_eq!(snake_case("getURL"), "get_url");
        assert_eq!(snake_case("Vector3"), "vector3");
        assert_eq!(snake_case("X"), "x");
        assert_eq!(snake_case("m_Value"), "m_value");
        assert_eq!(screaming_snake_case("MaxHealth"), "MAX_HEALTH");
    }

    #[test]
    fn identifiers_are_escaped() {
        assert_eq!(rust_ident("type"), "r#type");
        assert_eq!(rust_ident("self"), "self_");
        assert_eq!(rust_ident("2d"), "_2d");
        assert_eq!(csharp_ident("object"), "@object");
        assert_eq!(csharp_ident("Game.Logger"), "Game_Logger");
    }

    #[test]
    fn simple_names() {
        assert_eq!(simple_name("Game.World+Cell"), "Cell");
        assert_eq!(simple_name("Logger"), "Logger");
    }

    #[test]
    fn allocator_suffixes_duplicates() {
        let mut names = NameAllocator::with_reserved(&["release"]);
        assert_eq!(names.claim("log"), "log");
        assert_eq!(names.claim("log"), "log_2");
        assert_eq!(names.claim("release"), "release_2");
    }

    #[test]
    fn overloads_are_disambiguated() {
        let model = BindingModel::new(vec![TypeDescriptor::new("Vector3", TypeShape::Class)], Vec::new());
        let float = ParamDescriptor::new("v", TypeRef::Primitive(PrimitiveKind::Float));
        let int = ParamDescriptor::new("v", TypeRef::Primitive(PrimitiveKind::Int32));
        let vector = ParamDescriptor::new("v", TypeRef::Named(TypeHash::from_name("Vector3")));

        let one: [&[ParamDescriptor]; 1] = [&[float.clone()]];
        let single = overload_names(&model, "abs", &one, TokenStyle::Native);
        assert_eq!(single, vec!["abs"]);

        let groups: [&[ParamDescriptor]; 3] = [&[float.clone()], &[int.clone()], &[vector]];
        assert_eq!(
            overload_names(&model, "abs", &groups, TokenStyle::Native),
            vec!["abs_f32", "abs_i32", "abs_vector3"]
        );
        assert_eq!(
            overload_names(&model, "Abs", &groups, TokenStyle::Managed),
            vec!["Abs_float", "Abs_int", "Abs_Vector3"]
        );
    }

    #[test]
    fn mode_only_overloads_get_their_index() {
        let model = BindingModel::default();
        let int = TypeRef::Primitive(PrimitiveKind::Int32);
        let by_value = [ParamDescriptor::new("v", int.clone())];
        let by_ref = [ParamDescriptor::new("v", int).with_mode(ParamMode::Ref)];
        let groups: [&[ParamDescriptor]; 2] = [&by_value, &by_ref];
        assert_eq!(
            overload_names(&model, "Bump", &groups, TokenStyle::Managed),
            vec!["Bump_int_0", "Bump_int_1"]
        );
        assert_eq!(
            overload_names(&model, "bump", &groups, TokenStyle::Native),
            vec!["bump_i32", "bump_ref_i32"]
        );
    }

    #[test]
    fn array_tokens_carry_rank() {
        let model = BindingModel::default();
        let grid = TypeRef::array(TypeRef::Primitive(PrimitiveKind::Int32), 2);
        assert_eq!(type_token(&model, &grid, TokenStyle::Native), "i32_array2");
    }
}
