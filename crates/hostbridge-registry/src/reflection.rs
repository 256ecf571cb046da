//! Host reflection snapshot.
//!
//! The managed host exports its metadata as JSON once per build; the
//! resolver only ever reads this snapshot, never a live runtime.

use std::path::Path;

use hostbridge_core::ConfigurationError;
use serde::{Deserialize, Serialize};

fn default_true() -> bool {
    true
}

fn default_void() -> String {
    "void".to_string()
}

/// Every type the host describes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReflectionSnapshot {
    #[serde(default)]
    pub types: Vec<ReflectedType>,
}

/// Kind of a reflected type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReflectedKind {
    Class,
    Struct,
    Enum,
    Delegate,
    Interface,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectedType {
    pub name: String,
    pub kind: ReflectedKind,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default = "default_true")]
    pub is_public: bool,
    /// Static classes hold only static members and are never instantiated.
    #[serde(default)]
    pub is_static: bool,
    /// Non-empty for generic type definitions.
    #[serde(default)]
    pub generic_parameters: Vec<String>,
    #[serde(default)]
    pub fields: Vec<ReflectedField>,
    #[serde(default)]
    pub properties: Vec<ReflectedProperty>,
    #[serde(default)]
    pub methods: Vec<ReflectedMethod>,
    #[serde(default)]
    pub constructors: Vec<ReflectedConstructor>,
    #[serde(default)]
    pub events: Vec<ReflectedEvent>,
    /// Enum representation; `int` when absent.
    #[serde(default)]
    pub underlying: Option<String>,
    #[serde(default)]
    pub values: Vec<ReflectedEnumValue>,
    /// Delegate `Invoke` signature.
    #[serde(default)]
    pub signature: Option<ReflectedSignature>,
    /// Struct size as reported by the host.
    #[serde(default)]
    pub size: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectedField {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default)]
    pub is_readonly: bool,
    /// Byte offset within a struct as reported by the host.
    #[serde(default)]
    pub offset: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectedProperty {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub is_static: bool,
    #[serde(default = "default_true")]
    pub can_read: bool,
    #[serde(default)]
    pub can_write: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectedParameter {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
    /// `in` (default), `out` or `ref`.
    #[serde(default)]
    pub mode: ReflectedMode,
    #[serde(default)]
    pub has_default: bool,
}

impl ReflectedParameter {
    /// Normalized `out T` / `ref T` / `T` spelling used by selectors.
    pub fn selector_text(&self) -> String {
        let ty = crate::type_name::normalize(&self.type_name);
        match self.mode {
            ReflectedMode::In => ty,
            ReflectedMode::Out => format!("out {ty}"),
            ReflectedMode::Ref => format!("ref {ty}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReflectedMode {
    #[default]
    In,
    Out,
    Ref,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectedMethod {
    pub name: String,
    #[serde(default)]
    pub parameters: Vec<ReflectedParameter>,
    #[serde(default = "default_void")]
    pub return_type: String,
    #[serde(default = "default_true")]
    pub is_public: bool,
    #[serde(default)]
    pub is_static: bool,
    /// Non-empty for generic methods.
    #[serde(default)]
    pub generic_parameters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectedConstructor {
    #[serde(default)]
    pub parameters: Vec<ReflectedParameter>,
    #[serde(default = "default_true")]
    pub is_public: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectedEvent {
    pub name: String,
    #[serde(rename = "type")]
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectedEnumValue {
    pub name: String,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReflectedSignature {
    #[serde(default)]
    pub parameters: Vec<ReflectedParameter>,
    #[serde(default = "default_void")]
    pub return_type: String,
}

impl ReflectionSnapshot {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigurationError> {
        serde_json::from_str(text).map_err(|e| ConfigurationError::Snapshot(e.to_string()))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigurationError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json_str(&text)
    }

    pub fn find(&self, name: &str) -> Option<&ReflectedType> {
        self.types.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_with_defaults() {
        let snapshot = ReflectionSnapshot::from_json_str(
            r#"{
                "types": [
                    {
                        "name": "Logger",
                        "kind": "class",
                        "methods": [
                            { "name": "Log", "parameters": [{ "name": "message", "type": "string" }] }
                        ]
                    },
                    {
                        "name": "Level",
                        "kind": "enum",
                        "underlying": "byte",
                        "values": [{ "name": "Info", "value": 0 }, { "name": "Warn", "value": 1 }]
                    }
                ]
            }"#,
        )
        .unwrap();

        let logger = snapshot.find("Logger").unwrap();
        assert_eq!(logger.kind, ReflectedKind::Class);
        assert!(logger.is_public);
        let log = &logger.methods[0];
        assert_eq!(log.return_type, "void");
        assert!(!log.is_static);
        assert_eq!(log.parameters[0].mode, ReflectedMode::In);

        let level = snapshot.find("Level").unwrap();
        assert_eq!(level.values.len(), 2);
        assert_eq!(level.underlying.as_deref(), Some("byte"));
    }

    #[test]
    fn selector_text_includes_mode() {
        let p = ReflectedParameter {
            name: "v".into(),
            type_name: "System.Single".into(),
            mode: ReflectedMode::Out,
            has_default: false,
        };
        assert_eq!(p.selector_text(), "out float");
    }

    #[test]
    fn malformed_snapshot() {
        let err = ReflectionSnapshot::from_json_str("{\"types\": [{\"kind\": \"class\"}]}").unwrap_err();
        assert!(matches!(err, ConfigurationError::Snapshot(_)));
    }
}
