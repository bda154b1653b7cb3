//! # stencil-base
//!
//! Core library for template parsing, expression typing and diagnostics.
//!
//! Templates mix plain text with `{expression}`, `{#section params}...{/section}`,
//! `{@Type alias}`, `{! comment !}` and `{| raw |}` constructs. Parsing never
//! fails: malformed input becomes tree shape or diagnostics.
//!
//! ## Module Structure (dependency order)
//!
//! ```text
//! ide       → AnalysisHost, diagnostics across documents, navigation, hover
//!   ↓
//! hir       → Type resolution, scopes, diagnostics, pending lookups
//!   ↓
//! parser    → Scanner state machine, tolerant tree builder
//!   ↓
//! syntax    → Node arena, section kinds, parameter and expression parsers
//!   ↓
//! base      → Primitives (TextRange, AnalysisError, identifier classes)
//! ```

// ============================================================================
// MODULES (dependency order: base → syntax → parser → hir → ide)
// ============================================================================

/// Foundation types: TextRange, AnalysisError
pub mod base;

/// Syntax: node arena, section kinds, micro-parsers
pub mod syntax;

/// Parser: scanner and tolerant tree builder
pub mod parser;

/// High-level IR: type resolution and diagnostics
pub mod hir;

/// IDE features: document host, diagnostics, navigation, hover
pub mod ide;

// Re-export foundation types
pub use base::{AnalysisError, TextRange, TextSize};

// Re-export the entry points
pub use hir::{Diagnostic, Severity, Validation, validate};
pub use ide::AnalysisHost;
pub use parser::{parse, parse_with_cancel};
pub use syntax::Template;
