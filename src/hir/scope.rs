//! Resolution scopes for one validation pass.
//!
//! Each scope-changing section builds a child frame that borrows its parent;
//! the frame is dropped when the section's body has been checked.

use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use super::types::ResolvedType;

/// What a name or expression resolved to during a pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
    Typed(ResolvedType),
    /// Depends on a lookup still in flight; dependent checks are skipped.
    Pending,
    /// Known to exist but not checkable (already reported, or no type info).
    Unknown,
}

/// One scope frame.
#[derive(Debug, Default)]
pub struct ResolutionContext<'p> {
    bindings: FxHashMap<SmolStr, Binding>,
    /// `with` object whose members resolve as bare names.
    ambient: Option<Binding>,
    parent: Option<&'p ResolutionContext<'p>>,
}

impl ResolutionContext<'static> {
    pub fn root() -> Self {
        Self::default()
    }
}

impl<'p> ResolutionContext<'p> {
    pub fn child<'c>(&'c self) -> ResolutionContext<'c>
    where
        'p: 'c,
    {
        ResolutionContext {
            bindings: FxHashMap::default(),
            ambient: None,
            parent: Some(self),
        }
    }

    pub fn bind(&mut self, name: impl Into<SmolStr>, binding: Binding) {
        self.bindings.insert(name.into(), binding);
    }

    pub fn set_ambient(&mut self, binding: Binding) {
        self.ambient = Some(binding);
    }

    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.get(name)
    }

    pub fn ambient(&self) -> Option<&Binding> {
        self.ambient.as_ref()
    }

    pub fn parent(&self) -> Option<&'p ResolutionContext<'p>> {
        self.parent
    }

    /// This frame, then each enclosing frame outwards.
    pub fn frames(&self) -> impl Iterator<Item = &ResolutionContext<'p>> {
        std::iter::successors(Some(self), |frame| frame.parent)
    }

    /// Outermost frame, which holds parameter declarations.
    pub fn root_frame(&self) -> &ResolutionContext<'p> {
        self.frames().last().unwrap_or(self)
    }

    pub fn depth(&self) -> usize {
        self.frames().count() - 1
    }
}
