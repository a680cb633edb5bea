//! Call frames.
//!
//! A [`Frame`] binds each local declaration visible in a function (or the
//! module top level) to the [`Slot`] holding its current value. Frames are
//! looked up outward-to-inward-most-recent-first during identifier
//! resolution, matching the lexical nesting [`tinker_core::ScopeStack`]
//! established at elaboration time — by the time evaluation runs, the
//! elaborator has already resolved every identifier to a [`DeclId`], so a
//! frame only needs name-free `DeclId -> Slot` lookup, not name lookup.

use indexmap::IndexMap;

use tinker_core::{DeclId, Slot};

#[derive(Debug, Default)]
pub struct Frame {
    bindings: IndexMap<DeclId, Slot>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind(&mut self, decl: DeclId, slot: Slot) {
        self.bindings.insert(decl, slot);
    }

    pub fn lookup(&self, decl: DeclId) -> Option<Slot> {
        self.bindings.get(&decl).copied()
    }
}
