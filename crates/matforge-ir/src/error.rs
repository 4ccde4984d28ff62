//! Diagnostic codes and the per-material diagnostic record.
//!
//! No error in this core is fatal to an export run: every failure is
//! recovered locally (default material, skipped channel, degraded kind,
//! preset miss) and surfaced to the caller as a diagnostic next to the
//! possibly-degraded output.

/// Stable codes for the recoverable failure taxonomy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// C001: host shader bag missing the required structure
    MalformedShaderData,
    /// C002: a channel references a node name absent from the pool
    UnresolvedNodeReference,
    /// C003: a material kind has no native mapping in a backend
    UnsupportedKindForBackend,
    /// C004: preset store unreachable or payload corrupt
    PresetLookupFailure,
}

impl DiagnosticCode {
    /// Returns the code string (e.g., "C001").
    pub fn code(&self) -> &'static str {
        match self {
            DiagnosticCode::MalformedShaderData => "C001",
            DiagnosticCode::UnresolvedNodeReference => "C002",
            DiagnosticCode::UnsupportedKindForBackend => "C003",
            DiagnosticCode::PresetLookupFailure => "C004",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A recoverable problem encountered while converting or exporting one
/// material.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub code: DiagnosticCode,
    /// Human-readable message.
    pub message: String,
    /// Name of the material the problem belongs to, when known.
    pub material: Option<String>,
}

impl Diagnostic {
    pub fn new(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            material: None,
        }
    }

    pub fn for_material(
        code: DiagnosticCode,
        message: impl Into<String>,
        material: impl Into<String>,
    ) -> Self {
        Self {
            code,
            message: message.into(),
            material: Some(material.into()),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(ref mat) = self.material {
            write!(f, "{}: {} (material {})", self.code, self.message, mat)
        } else {
            write!(f, "{}: {}", self.code, self.message)
        }
    }
}

impl std::error::Error for Diagnostic {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(DiagnosticCode::MalformedShaderData.code(), "C001");
        assert_eq!(DiagnosticCode::UnresolvedNodeReference.code(), "C002");
        assert_eq!(DiagnosticCode::UnsupportedKindForBackend.code(), "C003");
        assert_eq!(DiagnosticCode::PresetLookupFailure.code(), "C004");
    }

    #[test]
    fn test_display_includes_material() {
        let d = Diagnostic::for_material(
            DiagnosticCode::UnresolvedNodeReference,
            "channel diffuse points at missing node",
            "Seat",
        );
        assert_eq!(
            d.to_string(),
            "C002: channel diffuse points at missing node (material Seat)"
        );
    }
}
