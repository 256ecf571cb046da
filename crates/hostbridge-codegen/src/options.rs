//! Generator knobs.

/// How generated native stubs report run-time errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Every stub returns `BridgeResult<T>`.
    #[default]
    ReturnResult,
    /// Every stub returns `T` and unwinds through `raise` on failure; a
    /// `try_` twin still returns the result.
    Raise,
}

impl ErrorPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorPolicy::ReturnResult => "return-result",
            ErrorPolicy::Raise => "raise",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorOptions {
    pub error_policy: ErrorPolicy,
    /// Path of the runtime crate as seen from the generated native module.
    pub runtime_crate: String,
    /// Namespace of the generated managed artifact.
    pub managed_namespace: String,
    /// File name of the native artifact.
    pub native_file: String,
    /// File name of the managed artifact.
    pub managed_file: String,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            error_policy: ErrorPolicy::default(),
            runtime_crate: "hostbridge_runtime".to_string(),
            managed_namespace: "HostBridge.Generated".to_string(),
            native_file: "bindings.rs".to_string(),
            managed_file: "Bindings.g.cs".to_string(),
        }
    }
}

impl GeneratorOptions {
    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn with_managed_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.managed_namespace = namespace.into();
        self
    }
}
