//! Exposure configuration: which host types and members to bind.
//!
//! ```toml
//! [[types]]
//! name = "Game.Logger"
//! methods = ["Log", "Format(string, int)"]
//!
//! [[types]]
//! name = "Game.Vector3"
//! constructors = [["float", "float", "float"]]
//! ```
//!
//! A missing list means "expose every supported public instance member of
//! that category"; a present list (even an empty one) exposes exactly the
//! listed members.

use std::path::Path;

use hostbridge_core::ConfigurationError;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::type_name::normalize;

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExposureConfig {
    #[serde(default)]
    pub types: Vec<TypeExposure>,
}

/// One `[[types]]` entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TypeExposure {
    pub name: String,
    /// Constructor overloads, each given as its parameter type list.
    pub constructors: Option<Vec<Vec<String>>>,
    /// Method selectors: `Name` or `Name(type, type)`.
    pub methods: Option<Vec<String>>,
    pub fields: Option<Vec<String>>,
    pub properties: Option<Vec<String>>,
    pub events: Option<Vec<String>>,
}

impl TypeExposure {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Whether no member list was given at all.
    pub fn is_implicit(&self) -> bool {
        self.constructors.is_none()
            && self.methods.is_none()
            && self.fields.is_none()
            && self.properties.is_none()
            && self.events.is_none()
    }
}

/// A parsed method selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberSelector {
    pub name: String,
    /// Normalized parameter types; `None` selects every overload.
    pub params: Option<Vec<String>>,
}

impl MemberSelector {
    /// Parse `Name` or `Name(type, type)`.
    pub fn parse(type_name: &str, text: &str) -> Result<Self, ConfigurationError> {
        let invalid = |reason: &str| ConfigurationError::InvalidSelector {
            type_name: type_name.to_string(),
            selector: text.to_string(),
            reason: reason.to_string(),
        };

        let text = text.trim();
        let (name, params) = match text.find('(') {
            None => (text, None),
            Some(open) => {
                let inner = text[open + 1..]
                    .strip_suffix(')')
                    .ok_or_else(|| invalid("missing closing parenthesis"))?;
                (&text[..open], Some(split_params(inner)))
            }
        };

        let name = name.trim();
        if name.is_empty() {
            return Err(invalid("empty member name"));
        }
        if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(invalid("member name must be an identifier"));
        }
        Ok(Self {
            name: name.to_string(),
            params,
        })
    }

    pub fn matches(&self, name: &str, params: &[String]) -> bool {
        self.name == name && self.params.as_ref().is_none_or(|p| p.as_slice() == params)
    }
}

/// Split a parameter list on top-level commas, normalizing each entry.
///
/// Commas inside `<...>` or `[...]` belong to the type.
pub fn split_params(inner: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in inner.char_indices() {
        match c {
            '<' | '[' => depth += 1,
            '>' | ']' => depth -= 1,
            ',' if depth == 0 => {
                out.push(normalize(&inner[start..i]));
                start = i + 1;
            }
            _ => {}
        }
    }
    let last = inner[start..].trim();
    if !last.is_empty() || !out.is_empty() {
        out.push(normalize(last));
    }
    out
}

impl ExposureConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigurationError> {
        let config: ExposureConfig =
            toml::from_str(text).map_err(|e| ConfigurationError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigurationError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Check for empty names, duplicates and malformed selectors.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let mut seen = FxHashSet::default();
        for (index, entry) in self.types.iter().enumerate() {
            let name = entry.name.trim();
            if name.is_empty() {
                return Err(ConfigurationError::EmptyTypeName { index });
            }
            if !seen.insert(normalize(name)) {
                return Err(ConfigurationError::DuplicateType(name.to_string()));
            }
            for selector in entry.methods.iter().flatten() {
                MemberSelector::parse(name, selector)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_types_and_member_lists() {
        let config = ExposureConfig::from_toml_str(
            r#"
            [[types]]
            name = "Logger"

            [[types]]
            name = "Vector3"
            constructors = [["float", "float", "float"], []]
            methods = ["Add"]
            "#,
        )
        .unwrap();
        assert_eq!(config.types.len(), 2);
        assert!(config.types[0].is_implicit());
        assert!(!config.types[1].is_implicit());
        assert_eq!(config.types[1].constructors.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn rejects_unknown_keys() {
        let err = ExposureConfig::from_toml_str("[[types]]\nname = \"A\"\nmethod = []\n").unwrap_err();
        assert!(matches!(err, ConfigurationError::Parse(_)));
    }

    #[test]
    fn rejects_duplicates_and_empty_names() {
        let err = ExposureConfig::from_toml_str("[[types]]\nname = \"A\"\n[[types]]\nname = \"A\"\n").unwrap_err();
        assert_eq!(err, ConfigurationError::DuplicateType("A".into()));

        let err = ExposureConfig::from_toml_str("[[types]]\nname = \" \"\n").unwrap_err();
        assert_eq!(err, ConfigurationError::EmptyTypeName { index: 0 });
    }

    #[test]
    fn selector_parsing() {
        let s = MemberSelector::parse("T", "Scale").unwrap();
        assert_eq!(s.params, None);

        let s = MemberSelector::parse("T", "Scale(System.Single, out int)").unwrap();
        assert_eq!(s.name, "Scale");
        assert_eq!(s.params, Some(vec!["float".to_string(), "out int".to_string()]));

        let s = MemberSelector::parse("T", "Reset()").unwrap();
        assert_eq!(s.params, Some(Vec::new()));

        assert!(MemberSelector::parse("T", "Scale(int").is_err());
        assert!(MemberSelector::parse("T", "(int)").is_err());
    }

    #[test]
    fn split_params_respects_nesting() {
        assert_eq!(
            split_params("Dictionary<string, int>, int[,]"),
            vec!["Dictionary<string, int>".to_string(), "int[,]".to_string()]
        );
    }

    #[test]
    fn selector_matching() {
        let any = MemberSelector::parse("T", "Log").unwrap();
        assert!(any.matches("Log", &["string".into()]));
        let exact = MemberSelector::parse("T", "Log(string)").unwrap();
        assert!(exact.matches("Log", &["string".into()]));
        assert!(!exact.matches("Log", &["int".into()]));
    }
}
