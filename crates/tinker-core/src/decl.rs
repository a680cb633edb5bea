//! Declarations.
//!
//! Declarations, unlike expressions and statements, participate in cycles:
//! a record declaration's type names the declaration itself, a method's
//! context names its enclosing record, and a module's declaration list
//! names declarations that in turn point back at the module. Rust has no
//! direct way to express that with owned trees, so declarations live in one
//! append-only [`DeclArena`] per translation and are referred to everywhere
//! else by [`DeclId`] — the same "single arena, cross-references are
//! indices" resolution the design notes call for.
//!
//! Two-phase elaboration (declare, then define) is realized with interior
//! mutability: a declaration is allocated with its phase-1 content (or none)
//! and the elaborator fills in phase-2 content (a body, a field list, a
//! base) in place once it reaches phase 2, mirroring the original's
//! "mutates AST in place" description without needing `unsafe`.

use std::cell::{Cell, RefCell};

use indexmap::IndexMap;

use crate::expr::Expr;
use crate::interner::Symbol;
use crate::stmt::Stmt;
use crate::types::{TypeData, TypeId, TypeStore};
use crate::value::PathStep;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DeclId(u32);

impl DeclId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// The specifier flags a declaration may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Specifiers {
    pub foreign: bool,
    pub is_virtual: bool,
    pub is_abstract: bool,
    pub root: bool,
}

#[derive(Debug)]
pub enum DeclKind {
    /// `init` holds the (possibly still-raw, pre-elaboration) initializer
    /// expression; phase 2 replaces it in place with the wrapped
    /// `copy_init`/`reference_init`/`default_init` node.
    Variable { init: RefCell<Option<Expr>> },
    /// `params` is fixed at phase 1 (a signature is fully known from its
    /// syntax); `body` is filled in by phase 2.
    Function {
        params: Vec<DeclId>,
        body: RefCell<Option<Stmt>>,
    },
    Parameter,
    /// `base`, `fields`, and `members` are all empty at phase 1 (so that
    /// other declarations may hold a reference to this record before its
    /// shape is known) and filled in during phase 2. `member_scope` caches
    /// name lookup over `fields` and `members` combined.
    Record {
        base: Cell<Option<DeclId>>,
        fields: RefCell<Vec<DeclId>>,
        members: RefCell<Vec<DeclId>>,
        member_scope: RefCell<IndexMap<Symbol, DeclId>>,
    },
    Field,
    /// A method is a function whose context is a record; `implicit_this` is
    /// the synthesized reference-to-record parameter, allocated alongside
    /// `params` at phase 1.
    Method {
        implicit_this: DeclId,
        params: Vec<DeclId>,
        body: RefCell<Option<Stmt>>,
    },
    Module { decls: RefCell<Vec<DeclId>> },
}

#[derive(Debug)]
pub struct Decl {
    pub specifiers: Specifiers,
    pub name: Symbol,
    ty: Cell<Option<TypeId>>,
    cxt: Cell<Option<DeclId>>,
    pub kind: DeclKind,
}

impl Decl {
    pub fn ty(&self) -> Option<TypeId> {
        self.ty.get()
    }

    pub fn set_ty(&self, ty: TypeId) {
        self.ty.set(Some(ty));
    }

    pub fn context(&self) -> Option<DeclId> {
        self.cxt.get()
    }

    pub fn set_context(&self, cxt: DeclId) {
        self.cxt.set(Some(cxt));
    }

    pub fn has_def(&self) -> bool {
        match &self.kind {
            DeclKind::Variable { init } => init.borrow().is_some(),
            DeclKind::Function { body, .. } | DeclKind::Method { body, .. } => {
                body.borrow().is_some()
            }
            DeclKind::Record { fields, .. } => !fields.borrow().is_empty(),
            DeclKind::Parameter | DeclKind::Field | DeclKind::Module { .. } => true,
        }
    }
}

/// Append-only storage for every declaration in a translation.
#[derive(Debug, Default)]
pub struct DeclArena {
    decls: Vec<Decl>,
}

impl DeclArena {
    pub fn new() -> Self {
        Self { decls: Vec::new() }
    }

    fn alloc(&mut self, specifiers: Specifiers, name: Symbol, kind: DeclKind) -> DeclId {
        let id = DeclId(self.decls.len() as u32);
        self.decls.push(Decl {
            specifiers,
            name,
            ty: Cell::new(None),
            cxt: Cell::new(None),
            kind,
        });
        id
    }

    pub fn alloc_variable(&mut self, specifiers: Specifiers, name: Symbol) -> DeclId {
        self.alloc(
            specifiers,
            name,
            DeclKind::Variable {
                init: RefCell::new(None),
            },
        )
    }

    pub fn alloc_parameter(&mut self, name: Symbol) -> DeclId {
        self.alloc(Specifiers::default(), name, DeclKind::Parameter)
    }

    pub fn alloc_function(
        &mut self,
        specifiers: Specifiers,
        name: Symbol,
        params: Vec<DeclId>,
    ) -> DeclId {
        self.alloc(
            specifiers,
            name,
            DeclKind::Function {
                params,
                body: RefCell::new(None),
            },
        )
    }

    pub fn alloc_method(
        &mut self,
        specifiers: Specifiers,
        name: Symbol,
        implicit_this: DeclId,
        params: Vec<DeclId>,
    ) -> DeclId {
        self.alloc(
            specifiers,
            name,
            DeclKind::Method {
                implicit_this,
                params,
                body: RefCell::new(None),
            },
        )
    }

    pub fn alloc_record(&mut self, specifiers: Specifiers, name: Symbol) -> DeclId {
        self.alloc(
            specifiers,
            name,
            DeclKind::Record {
                base: Cell::new(None),
                fields: RefCell::new(Vec::new()),
                members: RefCell::new(Vec::new()),
                member_scope: RefCell::new(IndexMap::new()),
            },
        )
    }

    /// Fills in a record's phase-2 shape: its base (if any), ordered field
    /// list, ordered member (method/nested-decl) list, and the name-lookup
    /// cache derived from both.
    pub fn set_record_shape(
        &self,
        id: DeclId,
        base: Option<DeclId>,
        fields: Vec<DeclId>,
        members: Vec<DeclId>,
    ) {
        let DeclKind::Record {
            base: b,
            fields: f,
            members: m,
            member_scope,
        } = &self.get(id).kind
        else {
            panic!("set_record_shape called on a non-record declaration");
        };
        b.set(base);
        let mut scope = member_scope.borrow_mut();
        for &field in &fields {
            scope.insert(self.get(field).name, field);
        }
        for &member in &members {
            scope.insert(self.get(member).name, member);
        }
        *f.borrow_mut() = fields;
        *m.borrow_mut() = members;
    }

    pub fn alloc_field(&mut self, name: Symbol) -> DeclId {
        self.alloc(Specifiers::default(), name, DeclKind::Field)
    }

    pub fn alloc_module(&mut self, name: Symbol) -> DeclId {
        self.alloc(
            Specifiers::default(),
            name,
            DeclKind::Module {
                decls: RefCell::new(Vec::new()),
            },
        )
    }

    pub fn get(&self, id: DeclId) -> &Decl {
        &self.decls[id.as_u32() as usize]
    }
}

/// True if `d` is a variable, parameter, or field — anything that denotes a
/// storage location rather than a function or a record/module.
pub fn is_object(arena: &DeclArena, d: DeclId) -> bool {
    matches!(
        arena.get(d).kind,
        DeclKind::Variable { .. } | DeclKind::Parameter | DeclKind::Field
    )
}

/// True if `d`'s declared type is a reference type.
pub fn is_reference(arena: &DeclArena, types: &TypeStore, d: DeclId) -> bool {
    match arena.get(d).ty() {
        Some(ty) => matches!(types.data(ty), TypeData::Reference(_)),
        None => false,
    }
}

/// A variable whose context is the module (as opposed to a function body).
pub fn is_global_variable(arena: &DeclArena, d: DeclId) -> bool {
    let decl = arena.get(d);
    if !matches!(decl.kind, DeclKind::Variable { .. }) {
        return false;
    }
    matches!(
        decl.context().map(|cxt| &arena.get(cxt).kind),
        Some(DeclKind::Module { .. })
    )
}

pub fn is_local_variable(arena: &DeclArena, d: DeclId) -> bool {
    let decl = arena.get(d);
    matches!(decl.kind, DeclKind::Variable { .. }) && !is_global_variable(arena, d)
}

/// Walks `a`'s base chain looking for `b`. A record is trivially derived
/// from itself is *not* implied by this query alone — callers that need
/// "same-or-derived" should check identity first, matching the original's
/// `convert_to_base`, which special-cases `goal == decl` before calling
/// this.
pub fn is_derived(arena: &DeclArena, a: DeclId, b: DeclId) -> bool {
    let mut current = a;
    loop {
        let DeclKind::Record { base, .. } = &arena.get(current).kind else {
            return false;
        };
        match base.get() {
            Some(next) if next == b => return true,
            Some(next) => current = next,
            None => return false,
        }
    }
}

/// The number of inheritance hops from `derived` up to `base`, or `None` if
/// `base` is not in `derived`'s chain (including the case `derived == base`,
/// which has zero hops).
pub fn base_distance(arena: &DeclArena, derived: DeclId, base: DeclId) -> Option<u32> {
    let mut current = derived;
    let mut hops = 0;
    loop {
        if current == base {
            return Some(hops);
        }
        let DeclKind::Record { base: next, .. } = &arena.get(current).kind else {
            return None;
        };
        current = next.get()?;
        hops += 1;
    }
}

/// Looks up `name` in `record`'s own fields/members, then, if absent,
/// follows the base chain — the record analogue of unqualified scope
/// lookup.
pub fn member_lookup(arena: &DeclArena, record: DeclId, name: Symbol) -> Option<DeclId> {
    let DeclKind::Record {
        member_scope, base, ..
    } = &arena.get(record).kind
    else {
        return None;
    };
    if let Some(&found) = member_scope.borrow().get(&name) {
        return Some(found);
    }
    member_lookup(arena, base.get()?, name)
}

/// Computes the access path from `record` to `field`: a [`PathStep::Base`]
/// hop for every inheritance step needed to reach the record that actually
/// declares `field`, followed by the field's [`PathStep::Field`] index in
/// that record's own field list.
///
/// This replaces the original `Field_decl::index()`, which left a base
/// pointer uninitialized and dereferenced it when the field was not found
/// in the starting record's own list; here, an absent field is a clean
/// `None` rather than undefined behavior.
pub fn field_access_path(arena: &DeclArena, record: DeclId, field: DeclId) -> Option<Vec<PathStep>> {
    let DeclKind::Record { fields, base, .. } = &arena.get(record).kind else {
        return None;
    };
    if let Some(index) = fields.borrow().iter().position(|&f| f == field) {
        return Some(vec![PathStep::Field(index as u32)]);
    }
    let parent = base.get()?;
    let mut path = field_access_path(arena, parent, field)?;
    path.insert(0, PathStep::Base);
    Some(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(n: u32) -> Symbol {
        Symbol::from_raw(n)
    }

    #[test]
    fn field_path_is_single_index_for_own_field() {
        let mut arena = DeclArena::new();
        let record = arena.alloc_record(Specifiers::default(), sym(0));
        let f0 = arena.alloc_field(sym(1));
        let f1 = arena.alloc_field(sym(2));
        if let DeclKind::Record { fields, .. } = &arena.get(record).kind {
            fields.borrow_mut().extend([f0, f1]);
        }
        assert_eq!(
            field_access_path(&arena, record, f1),
            Some(vec![PathStep::Field(1)])
        );
    }

    #[test]
    fn field_path_through_one_base_has_length_two() {
        let mut arena = DeclArena::new();
        let base = arena.alloc_record(Specifiers::default(), sym(0));
        let base_field = arena.alloc_field(sym(1));
        if let DeclKind::Record { fields, .. } = &arena.get(base).kind {
            fields.borrow_mut().push(base_field);
        }

        let derived = arena.alloc_record(Specifiers::default(), sym(2));
        let derived_field = arena.alloc_field(sym(3));
        if let DeclKind::Record { fields, base: b, .. } = &arena.get(derived).kind {
            fields.borrow_mut().push(derived_field);
            b.set(Some(base));
        }

        let path = field_access_path(&arena, derived, base_field).unwrap();
        assert_eq!(path.len(), 2);
        assert_eq!(path, vec![PathStep::Base, PathStep::Field(0)]);
    }

    #[test]
    fn unknown_field_yields_none_instead_of_ub() {
        let mut arena = DeclArena::new();
        let record = arena.alloc_record(Specifiers::default(), sym(0));
        let unrelated = arena.alloc_field(sym(1));
        assert_eq!(field_access_path(&arena, record, unrelated), None);
    }

    #[test]
    fn is_derived_walks_base_chain() {
        let mut arena = DeclArena::new();
        let grandparent = arena.alloc_record(Specifiers::default(), sym(0));
        let parent = arena.alloc_record(Specifiers::default(), sym(1));
        let child = arena.alloc_record(Specifiers::default(), sym(2));
        if let DeclKind::Record { base, .. } = &arena.get(parent).kind {
            base.set(Some(grandparent));
        }
        if let DeclKind::Record { base, .. } = &arena.get(child).kind {
            base.set(Some(parent));
        }
        assert!(is_derived(&arena, child, parent));
        assert!(is_derived(&arena, child, grandparent));
        assert!(!is_derived(&arena, parent, child));
        assert_eq!(base_distance(&arena, child, child), Some(0));
        assert_eq!(base_distance(&arena, child, grandparent), Some(2));
    }
}
