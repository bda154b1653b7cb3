//! In-memory collaborators: a shared type cache and a namespace table.
//!
//! Both are read-mostly. Validation passes only take the read lock; writers
//! (the embedder's loader) mark names as loading, then publish the result,
//! which wakes every pass waiting on the matching [`PendingLookup`].

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use smol_str::SmolStr;
use tokio::sync::watch;
use tracing::trace;

use super::provider::{NamespaceResolver, PendingLookup, Resolution, TypeProvider};
use super::types::{TypeInfo, TypeRef};

#[derive(Debug)]
enum TypeEntry {
    Known(Arc<TypeInfo>),
    Missing,
    Loading(watch::Sender<bool>),
}

/// Type provider backed by a map of known classes.
#[derive(Debug, Default)]
pub struct TypeCache {
    entries: RwLock<FxHashMap<SmolStr, TypeEntry>>,
    lookups: AtomicUsize,
}

impl TypeCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a class, waking passes waiting on it.
    pub fn insert(&self, info: TypeInfo) {
        let name = info.name.clone();
        self.publish(name, TypeEntry::Known(Arc::new(info)));
    }

    /// Record that a class definitely does not exist.
    pub fn mark_missing(&self, name: &str) {
        self.publish(SmolStr::new(name), TypeEntry::Missing);
    }

    /// Mark a class as being loaded; lookups report it pending until
    /// [`insert`](Self::insert) or [`mark_missing`](Self::mark_missing).
    pub fn begin_loading(&self, name: &str) {
        let (tx, _rx) = watch::channel(false);
        self.entries
            .write()
            .insert(SmolStr::new(name), TypeEntry::Loading(tx));
    }

    pub fn contains(&self, name: &str) -> bool {
        matches!(self.entries.read().get(name), Some(TypeEntry::Known(_)))
    }

    /// Number of `resolve_type` calls served so far.
    pub fn lookup_count(&self) -> usize {
        self.lookups.load(Ordering::Relaxed)
    }

    fn publish(&self, name: SmolStr, entry: TypeEntry) {
        let previous = self.entries.write().insert(name.clone(), entry);
        if let Some(TypeEntry::Loading(tx)) = previous {
            trace!(type_name = %name, "type lookup settled");
            tx.send_replace(true);
        }
    }
}

impl TypeProvider for TypeCache {
    fn resolve_type(&self, name: &str, _project: Option<&str>) -> Resolution<Arc<TypeInfo>> {
        self.lookups.fetch_add(1, Ordering::Relaxed);
        match self.entries.read().get(name) {
            Some(TypeEntry::Known(info)) => Resolution::Resolved(Arc::clone(info)),
            Some(TypeEntry::Loading(tx)) => {
                Resolution::Pending(PendingLookup::new(name, tx.subscribe()))
            }
            Some(TypeEntry::Missing) | None => Resolution::Unresolved,
        }
    }
}

#[derive(Debug, Default)]
struct Namespace {
    members: FxHashMap<SmolStr, TypeRef>,
    loading: Option<watch::Sender<bool>>,
}

/// Namespace registry backed by a map of namespaces to typed members.
#[derive(Debug, Default)]
pub struct NamespaceTable {
    namespaces: RwLock<FxHashMap<SmolStr, Namespace>>,
}

impl NamespaceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty namespace.
    pub fn declare(&self, namespace: &str) {
        self.namespaces
            .write()
            .entry(SmolStr::new(namespace))
            .or_default();
    }

    pub fn insert(&self, namespace: &str, member: &str, ty: TypeRef) {
        self.namespaces
            .write()
            .entry(SmolStr::new(namespace))
            .or_default()
            .members
            .insert(SmolStr::new(member), ty);
    }

    /// Members of `namespace` report pending until [`finish_loading`](Self::finish_loading).
    pub fn begin_loading(&self, namespace: &str) {
        let (tx, _rx) = watch::channel(false);
        self.namespaces
            .write()
            .entry(SmolStr::new(namespace))
            .or_default()
            .loading = Some(tx);
    }

    pub fn finish_loading(&self, namespace: &str) {
        let sender = self
            .namespaces
            .write()
            .get_mut(namespace)
            .and_then(|ns| ns.loading.take());
        if let Some(tx) = sender {
            tx.send_replace(true);
        }
    }
}

impl NamespaceResolver for NamespaceTable {
    fn has_namespace(&self, namespace: &str) -> bool {
        self.namespaces.read().contains_key(namespace)
    }

    fn resolve(&self, namespace: &str, member: &str) -> Resolution<TypeRef> {
        let namespaces = self.namespaces.read();
        let Some(ns) = namespaces.get(namespace) else {
            return Resolution::Unresolved;
        };
        if let Some(tx) = &ns.loading {
            return Resolution::Pending(PendingLookup::new(
                format!("{namespace}:{member}"),
                tx.subscribe(),
            ));
        }
        match ns.members.get(member) {
            Some(ty) => Resolution::Resolved(ty.clone()),
            None => Resolution::Unresolved,
        }
    }
}
