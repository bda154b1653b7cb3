//! Diagnostics: syntax and semantic problems found by a validation pass.
//!
//! Every diagnostic carries the exact sub-range of the offending token and,
//! for resolution failures, structured [`DiagnosticData`] a quick fix can act
//! on without re-parsing.

use std::fmt;
use std::sync::Arc;

use smol_str::SmolStr;
use text_size::TextRange;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

/// Fixed set of diagnostic kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// `{@Type alias}` names a class the provider does not know.
    UnknownType,
    UnknownNamespace,
    /// Root identifier bound nowhere.
    UndefinedObject,
    UnknownProperty,
    UnknownMethod,
    /// A method of that name exists but no overload accepts the arguments.
    InvalidMethodParameter,
    /// Iteration over a value that is not iterable.
    NotIterable,
    /// Local expression syntax problem.
    SyntaxError,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::UnknownType => "unknown-type",
            DiagnosticCode::UnknownNamespace => "unknown-namespace",
            DiagnosticCode::UndefinedObject => "undefined-object",
            DiagnosticCode::UnknownProperty => "unknown-property",
            DiagnosticCode::UnknownMethod => "unknown-method",
            DiagnosticCode::InvalidMethodParameter => "invalid-method-parameter",
            DiagnosticCode::NotIterable => "not-iterable",
            DiagnosticCode::SyntaxError => "syntax-error",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Machine-readable payload for quick fixes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DiagnosticData {
    /// The unresolved name.
    pub name: Option<SmolStr>,
    /// Type the name was looked up on.
    pub type_name: Option<SmolStr>,
    pub namespace: Option<SmolStr>,
    /// Whether the name was used where an iterable is expected.
    pub iterable: bool,
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    pub range: TextRange,
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: Arc<str>,
    pub data: Option<DiagnosticData>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(range: TextRange, code: DiagnosticCode, message: impl Into<Arc<str>>) -> Self {
        Self {
            range,
            severity: Severity::Error,
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_data(mut self, data: DiagnosticData) -> Self {
        self.data = Some(data);
        self
    }
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics during a validation pass.
#[derive(Clone, Debug, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create a new empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn unknown_type(&mut self, range: TextRange, name: &str) {
        self.add(
            Diagnostic::error(
                range,
                DiagnosticCode::UnknownType,
                format!("unknown type '{name}'"),
            )
            .with_data(DiagnosticData {
                name: Some(SmolStr::new(name)),
                ..DiagnosticData::default()
            }),
        );
    }

    pub fn unknown_namespace(&mut self, range: TextRange, namespace: &str, severity: Severity) {
        self.add(
            Diagnostic::error(
                range,
                DiagnosticCode::UnknownNamespace,
                format!("unknown namespace '{namespace}'"),
            )
            .with_severity(severity)
            .with_data(DiagnosticData {
                namespace: Some(SmolStr::new(namespace)),
                ..DiagnosticData::default()
            }),
        );
    }

    pub fn undefined_object(
        &mut self,
        range: TextRange,
        name: &str,
        namespace: Option<&str>,
        iterable: bool,
        severity: Severity,
    ) {
        let message = match namespace {
            Some(ns) => format!("'{name}' cannot be resolved in namespace '{ns}'"),
            None => format!("'{name}' cannot be resolved"),
        };
        self.add(
            Diagnostic::error(range, DiagnosticCode::UndefinedObject, message)
                .with_severity(severity)
                .with_data(DiagnosticData {
                    name: Some(SmolStr::new(name)),
                    type_name: None,
                    namespace: namespace.map(SmolStr::new),
                    iterable,
                }),
        );
    }

    /// Unknown property or method, depending on `code`.
    pub fn unknown_member(
        &mut self,
        range: TextRange,
        code: DiagnosticCode,
        name: &str,
        type_name: &str,
        iterable: bool,
    ) {
        let what = match code {
            DiagnosticCode::UnknownMethod => "method",
            _ => "property",
        };
        self.add(
            Diagnostic::error(
                range,
                code,
                format!("unknown {what} '{name}' for type '{type_name}'"),
            )
            .with_data(DiagnosticData {
                name: Some(SmolStr::new(name)),
                type_name: Some(SmolStr::new(type_name)),
                namespace: None,
                iterable,
            }),
        );
    }

    pub fn invalid_method_parameter(&mut self, range: TextRange, name: &str, type_name: &str) {
        self.add(
            Diagnostic::error(
                range,
                DiagnosticCode::InvalidMethodParameter,
                format!("method '{name}' of type '{type_name}' cannot be applied to the given arguments"),
            )
            .with_data(DiagnosticData {
                name: Some(SmolStr::new(name)),
                type_name: Some(SmolStr::new(type_name)),
                ..DiagnosticData::default()
            }),
        );
    }

    pub fn not_iterable(&mut self, range: TextRange, type_name: &str) {
        self.add(
            Diagnostic::error(
                range,
                DiagnosticCode::NotIterable,
                format!("'{type_name}' is not iterable"),
            )
            .with_data(DiagnosticData {
                type_name: Some(SmolStr::new(type_name)),
                iterable: true,
                ..DiagnosticData::default()
            }),
        );
    }

    pub fn syntax_error(&mut self, range: TextRange, message: &str) {
        self.add(Diagnostic::error(range, DiagnosticCode::SyntaxError, message));
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}
