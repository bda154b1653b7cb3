//! Collaborator contracts: type provider, namespace registry and data model.
//!
//! Lookups never block. A lookup that has not finished yet returns
//! [`Resolution::Pending`] carrying a [`PendingLookup`] the caller can await
//! before running another validation pass.

use std::sync::Arc;

use indexmap::IndexMap;
use smol_str::SmolStr;
use tokio::sync::watch;

use super::types::{MemberInfo, TypeInfo, TypeRef};

/// Three-outcome lookup result.
#[derive(Debug, Clone)]
pub enum Resolution<T> {
    Resolved(T),
    /// The name definitely does not exist.
    Unresolved,
    /// Not known yet; await the handle and validate again.
    Pending(PendingLookup),
}

impl<T> Resolution<T> {
    pub fn is_pending(&self) -> bool {
        matches!(self, Resolution::Pending(_))
    }
}

/// Completion handle for a lookup still in flight.
#[derive(Debug, Clone)]
pub struct PendingLookup {
    key: SmolStr,
    settled: watch::Receiver<bool>,
}

impl PendingLookup {
    /// `settled` flips to `true` once the lookup finishes.
    pub fn new(key: impl Into<SmolStr>, settled: watch::Receiver<bool>) -> Self {
        Self {
            key: key.into(),
            settled,
        }
    }

    /// What is being looked up, e.g. a qualified type name.
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn is_settled(&self) -> bool {
        *self.settled.borrow()
    }

    /// Wait until the lookup finishes. Returns early if the owner goes away.
    pub async fn wait(mut self) {
        loop {
            let settled = *self.settled.borrow_and_update();
            if settled {
                return;
            }
            if self.settled.changed().await.is_err() {
                return;
            }
        }
    }
}

/// Host type information source.
pub trait TypeProvider: Send + Sync {
    /// Resolve a qualified class name within `project`.
    fn resolve_type(&self, name: &str, project: Option<&str>) -> Resolution<Arc<TypeInfo>>;

    /// Resolve a property on `ty` itself; supertypes are walked by the caller.
    fn resolve_member(&self, name: &str, ty: &TypeInfo) -> Option<MemberInfo> {
        ty.find_property(name).cloned()
    }
}

/// Registry behind non-`data` namespaces such as `inject:` or `config:`.
pub trait NamespaceResolver: Send + Sync {
    fn has_namespace(&self, namespace: &str) -> bool;

    /// Type of `member` within `namespace`.
    fn resolve(&self, namespace: &str, member: &str) -> Resolution<TypeRef>;
}

/// A registry that knows no namespaces.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoNamespaces;

impl NamespaceResolver for NoNamespaces {
    fn has_namespace(&self, _namespace: &str) -> bool {
        false
    }

    fn resolve(&self, _namespace: &str, _member: &str) -> Resolution<TypeRef> {
        Resolution::Unresolved
    }
}

/// Externally declared top-level bindings of one document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataModel {
    /// Statically declared template parameters.
    pub parameters: IndexMap<SmolStr, TypeRef>,
    /// Bindings available to every template.
    pub globals: IndexMap<SmolStr, TypeRef>,
    /// Until set, unresolved objects are not reported.
    pub loaded: bool,
}

impl DataModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty model that is already complete.
    pub fn loaded() -> Self {
        Self {
            loaded: true,
            ..Self::default()
        }
    }

    pub fn with_parameter(mut self, name: impl Into<SmolStr>, ty: TypeRef) -> Self {
        self.parameters.insert(name.into(), ty);
        self
    }

    pub fn with_global(mut self, name: impl Into<SmolStr>, ty: TypeRef) -> Self {
        self.globals.insert(name.into(), ty);
        self
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Declared parameter first, then global.
    pub fn lookup(&self, name: &str) -> Option<&TypeRef> {
        self.parameters.get(name).or_else(|| self.globals.get(name))
    }
}
