//! Parsing of host type names as they appear in reflection and selectors.

use std::fmt;

use hostbridge_core::PrimitiveKind;

/// Structure of a host type name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedType {
    Void,
    Primitive(PrimitiveKind),
    String,
    /// `object`, `System.ValueType` and friends; crossing them means boxing.
    Object,
    /// `T*`.
    Pointer(Box<ParsedType>),
    /// `IntPtr` / `UIntPtr` and their keyword aliases.
    PointerSized(&'static str),
    /// A plain (possibly qualified) type name.
    Named(String),
    /// `Base<Arg, ...>`.
    Generic { base: String, args: Vec<ParsedType> },
    /// `Element[]`, `Element[,]`, ...
    Array { element: Box<ParsedType>, rank: u8 },
}

impl ParsedType {
    /// Whether this is an open generic definition such as ``List`1``.
    pub fn is_generic_definition(&self) -> bool {
        matches!(self, ParsedType::Named(name) if name.contains('`'))
    }
}

impl fmt::Display for ParsedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParsedType::Void => write!(f, "void"),
            ParsedType::Primitive(kind) => write!(f, "{}", kind.managed_name()),
            ParsedType::String => write!(f, "string"),
            ParsedType::Object => write!(f, "object"),
            ParsedType::Pointer(inner) => write!(f, "{inner}*"),
            ParsedType::PointerSized(name) => write!(f, "{name}"),
            ParsedType::Named(name) => write!(f, "{name}"),
            ParsedType::Generic { base, args } => {
                write!(f, "{base}<")?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                write!(f, ">")
            }
            ParsedType::Array { element, rank } => {
                write!(f, "{element}[{}]", ",".repeat(rank.saturating_sub(1) as usize))
            }
        }
    }
}

const MAX_RANK: usize = 32;

/// Parse a type name; the error is a human-readable reason.
pub fn parse(text: &str) -> Result<ParsedType, String> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    parse_compact(&compact)
}

fn parse_compact(s: &str) -> Result<ParsedType, String> {
    if s.is_empty() {
        return Err("empty type name".to_string());
    }

    if let Some(inner) = s.strip_suffix('*') {
        return Ok(ParsedType::Pointer(Box::new(parse_compact(inner)?)));
    }

    if let Some(body) = s.strip_suffix(']') {
        let open = body.rfind('[').ok_or("unbalanced ']'")?;
        let spec = &body[open + 1..];
        if !spec.chars().all(|c| c == ',') {
            return Err(format!("invalid array rank specifier '[{spec}]'"));
        }
        if spec.len() + 1 > MAX_RANK {
            return Err(format!("array rank exceeds {MAX_RANK}"));
        }
        return Ok(ParsedType::Array {
            element: Box::new(parse_compact(&body[..open])?),
            rank: (spec.len() + 1) as u8,
        });
    }

    if let Some(body) = s.strip_suffix('>') {
        let open = body.find('<').ok_or("unbalanced '>'")?;
        let base = &body[..open];
        check_identifier(base)?;
        let mut args = Vec::new();
        let mut depth = 0i32;
        let mut start = open + 1;
        for (i, c) in body[open + 1..].char_indices() {
            let i = i + open + 1;
            match c {
                '<' | '[' => depth += 1,
                '>' | ']' => depth -= 1,
                ',' if depth == 0 => {
                    args.push(parse_compact(&body[start..i])?);
                    start = i + 1;
                }
                _ => {}
            }
        }
        if depth != 0 {
            return Err("unbalanced generic argument list".to_string());
        }
        args.push(parse_compact(&body[start..])?);
        return Ok(ParsedType::Generic {
            base: base.to_string(),
            args,
        });
    }

    check_identifier(s)?;
    Ok(match s {
        "void" | "System.Void" => ParsedType::Void,
        "string" | "System.String" => ParsedType::String,
        "object" | "System.Object" | "System.ValueType" | "System.Enum" | "dynamic" => ParsedType::Object,
        "IntPtr" | "System.IntPtr" | "nint" => ParsedType::PointerSized("IntPtr"),
        "UIntPtr" | "System.UIntPtr" | "nuint" => ParsedType::PointerSized("UIntPtr"),
        other => match PrimitiveKind::from_managed_name(other) {
            Some(kind) => ParsedType::Primitive(kind),
            None => ParsedType::Named(other.to_string()),
        },
    })
}

fn check_identifier(s: &str) -> Result<(), String> {
    let valid = !s.is_empty()
        && !s.starts_with('.')
        && !s.ends_with('.')
        && s.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '`' | '+'));
    if valid { Ok(()) } else { Err(format!("'{s}' is not a valid type name")) }
}

/// Canonical spelling of a type name, including an `out `/`ref ` prefix.
///
/// Unparseable names are returned with whitespace removed so that they still
/// compare consistently.
pub fn normalize(text: &str) -> String {
    let text = text.trim();
    for prefix in ["out ", "ref "] {
        if let Some(rest) = text.strip_prefix(prefix) {
            return format!("{prefix}{}", normalize(rest));
        }
    }
    if let Some(rest) = text.strip_prefix("in ") {
        return normalize(rest);
    }
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    match parse_compact(&compact) {
        Ok(parsed) => parsed.to_string(),
        Err(_) => compact,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_and_aliases() {
        assert_eq!(parse("System.Int32"), Ok(ParsedType::Primitive(PrimitiveKind::Int32)));
        assert_eq!(parse("string"), Ok(ParsedType::String));
        assert_eq!(parse("System.Object"), Ok(ParsedType::Object));
        assert_eq!(parse("void"), Ok(ParsedType::Void));
    }

    #[test]
    fn arrays() {
        let jagged = parse("int[][]").unwrap();
        assert_eq!(
            jagged,
            ParsedType::Array {
                element: Box::new(ParsedType::Array {
                    element: Box::new(ParsedType::Primitive(PrimitiveKind::Int32)),
                    rank: 1
                }),
                rank: 1
            }
        );
        let multi = parse("float[ , ]").unwrap();
        assert_eq!(multi.to_string(), "float[,]");
        assert!(parse("int[x]").is_err());
    }

    #[test]
    fn generics_and_pointers() {
        let g = parse("Dictionary<System.String, List<int>>").unwrap();
        assert_eq!(g.to_string(), "Dictionary<string, List<int>>");
        assert_eq!(parse("byte*").unwrap(), ParsedType::Pointer(Box::new(ParsedType::Primitive(PrimitiveKind::Uint8))));
        assert_eq!(parse("System.IntPtr").unwrap(), ParsedType::PointerSized("IntPtr"));
        assert!(parse("List`1").unwrap().is_generic_definition());
    }

    #[test]
    fn malformed_names() {
        assert!(parse("").is_err());
        assert!(parse("Foo<int").is_err());
        assert!(parse("Foo>").is_err());
        assert!(parse("Foo Bar!").is_err());
    }

    #[test]
    fn normalize_keeps_passing_mode() {
        assert_eq!(normalize(" out  System.Single "), "out float");
        assert_eq!(normalize("ref Game.Vector3"), "ref Game.Vector3");
        assert_eq!(normalize("in int"), "int");
    }
}
