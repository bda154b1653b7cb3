//! High-level IR (HIR): type resolution and diagnostics.
//!
//! One validation pass walks a parsed [`Template`](crate::syntax::Template)
//! with a scope chain and resolves every expression part against the host
//! type model.
//!
//! ## Key Types
//!
//! - [`TypeProvider`] / [`NamespaceResolver`]: host type information, possibly
//!   still loading
//! - [`TypeCache`] / [`NamespaceTable`]: shared in-memory implementations
//! - [`DataModel`]: declared parameters and globals of one document
//! - [`ResolutionContext`]: scope frames of a pass
//! - [`Validation`]: diagnostics, resolved part types and pending lookups
//!
//! ## Pass
//!
//! ```text
//! validate(template, env, cancel)
//!     │
//!     ├── {@Type alias}           → root frame
//!     ├── sections                → child frames
//!     └── expressions             → Namespace? → Object → Property | Method ...
//!             │
//!             ▼
//!     Validation { diagnostics, resolved, pending }
//! ```

mod cache;
mod check;
mod diagnostics;
mod provider;
mod scope;
mod settings;
mod types;

pub use cache::{NamespaceTable, TypeCache};
pub use check::{DATA_NAMESPACE, Validation, ValidationEnv, validate};
pub use diagnostics::{Diagnostic, DiagnosticCode, DiagnosticCollector, DiagnosticData, Severity};
pub use provider::{
    DataModel, NamespaceResolver, NoNamespaces, PendingLookup, Resolution, TypeProvider,
};
pub use scope::{Binding, ResolutionContext};
pub use settings::ValidationSettings;
pub use types::{
    BOOLEAN, INTEGER, LONG, MemberInfo, OBJECT, ResolvedType, STRING, TypeInfo, TypeRef, WILDCARD,
};

#[cfg(test)]
mod tests;
