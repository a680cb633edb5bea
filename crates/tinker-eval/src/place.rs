//! Addressable object locations.
//!
//! A [`Place`] names a storage location: a root [`Slot`] plus a
//! [`PathStep`] sequence navigating into whatever composite value lives
//! there. Every expression that can appear on the left of an assignment, be
//! bound to a reference parameter, or serve as a method-call receiver
//! evaluates to a `Place` via [`crate::Evaluator::eval_place`] rather than a
//! plain [`Value`]; reading one normally (an ordinary rvalue use) goes
//! through [`Place::get`], which navigates and clones out the target.
//!
//! A field or array element nested inside a composite value has no `Slot`
//! of its own — only top-level allocations get one. Binding such a nested
//! location to a reference parameter or a `this` receiver therefore cannot
//! truly alias it (there is nothing to alias): [`crate::Evaluator::place_to_slot`]
//! falls back to copying the current value into a fresh slot in that case,
//! so writes a callee makes through the reference are not observed by the
//! caller. Plain-identifier places (the overwhelmingly common case for
//! reference parameters and method receivers) alias exactly, since their
//! `Slot` already is the object's true storage.

use tinker_core::{PathStep, Slot, Value};

use crate::store::Store;

#[derive(Debug, Clone)]
pub struct Place {
    pub slot: Slot,
    pub steps: Vec<PathStep>,
}

impl Place {
    pub fn get(&self, store: &Store) -> Value {
        let root = store.read(self.slot);
        root.navigate(&self.steps).clone()
    }

    pub fn set(&self, store: &Store, value: Value) {
        store.with_mut(self.slot, |root| {
            *root.navigate_mut(&self.steps) = value;
        });
    }
}
