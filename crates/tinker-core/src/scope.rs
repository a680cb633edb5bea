//! Lexical scoping and overload admission.

use indexmap::IndexMap;

use crate::decl::{DeclArena, DeclId, DeclKind};
use crate::interner::Symbol;
use crate::types::{TypeData, TypeStore};

/// A non-empty ordered list of declarations sharing one name in one scope.
#[derive(Debug, Clone)]
pub struct OverloadSet(Vec<DeclId>);

impl OverloadSet {
    fn new(first: DeclId) -> Self {
        Self(vec![first])
    }

    pub fn is_singleton(&self) -> bool {
        self.0.len() == 1
    }

    pub fn iter(&self) -> impl Iterator<Item = DeclId> + '_ {
        self.0.iter().copied()
    }

    pub fn as_slice(&self) -> &[DeclId] {
        &self.0
    }
}

/// One nested lexical environment: a name-to-overload-set map, optionally
/// tagged with the declaration that introduced it (a function, record, or
/// module scope).
#[derive(Debug, Default)]
pub struct Scope {
    bindings: IndexMap<Symbol, OverloadSet>,
    tag: Option<DeclId>,
}

impl Scope {
    fn new(tag: Option<DeclId>) -> Self {
        Self {
            bindings: IndexMap::new(),
            tag,
        }
    }

    pub fn lookup(&self, name: Symbol) -> Option<&OverloadSet> {
        self.bindings.get(&name)
    }
}

/// Why a declaration could not be admitted into an overload set. Each
/// variant carries the existing declaration it conflicted with so the
/// elaborator can point at both sites in its diagnostic.
#[derive(Debug, Clone, Copy)]
pub enum AdmitError {
    /// Redefinition of an already-defined declaration.
    Redefinition(DeclId),
    /// The new declaration is a different kind from an existing one sharing
    /// its name (e.g. a variable and a function).
    DifferentKind(DeclId),
    /// Two function declarations differ only in their return type.
    ReturnTypeOnly(DeclId),
}

fn is_function_like(kind: &DeclKind) -> bool {
    matches!(kind, DeclKind::Function { .. } | DeclKind::Method { .. })
}

fn signature_parts<'a>(
    arena: &'a DeclArena,
    types: &'a TypeStore,
    d: DeclId,
) -> Option<(&'a [crate::types::TypeId], crate::types::TypeId)> {
    let ty = arena.get(d).ty()?;
    match types.data(ty) {
        TypeData::Function { params, ret } => Some((params.as_slice(), *ret)),
        _ => None,
    }
}

fn vary_only_in_return_type(arena: &DeclArena, types: &TypeStore, a: DeclId, b: DeclId) -> bool {
    let (Some((params_a, ret_a)), Some((params_b, ret_b))) = (
        signature_parts(arena, types, a),
        signature_parts(arena, types, b),
    ) else {
        return false;
    };
    params_a == params_b && ret_a != ret_b
}

/// The outcome of checking one existing declaration against a candidate new
/// one sharing its name.
enum Admission {
    Extend,
    Replace,
    Reject(AdmitError),
}

/// `admit(existing, new)`, per the admission rules: reject a redefinition
/// of a defined declaration, replace a forward declaration of the same
/// type, reject a different-kind redeclaration or a return-type-only
/// overload, otherwise extend.
fn admit(arena: &DeclArena, types: &TypeStore, existing: DeclId, new: DeclId) -> Admission {
    let e = arena.get(existing);
    let n = arena.get(new);
    if let (Some(et), Some(nt)) = (e.ty(), n.ty()) {
        if et == nt {
            return if e.has_def() {
                Admission::Reject(AdmitError::Redefinition(existing))
            } else {
                Admission::Replace
            };
        }
    }
    if !is_function_like(&e.kind) || !is_function_like(&n.kind) {
        return Admission::Reject(AdmitError::DifferentKind(existing));
    }
    if vary_only_in_return_type(arena, types, existing, new) {
        return Admission::Reject(AdmitError::ReturnTypeOnly(existing));
    }
    Admission::Extend
}

/// A stack of nested [`Scope`]s, bottom-most being the module scope.
#[derive(Debug, Default)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self { scopes: Vec::new() }
    }

    pub fn push(&mut self, tag: Option<DeclId>) {
        self.scopes.push(Scope::new(tag));
    }

    /// # Panics
    ///
    /// Panics if called with no scope left to pop (popping past the module
    /// scope is an internal bug, not a user-facing error).
    pub fn pop(&mut self) {
        self.scopes
            .pop()
            .expect("scope stack underflow: popped past the module scope");
    }

    /// Pushes a scope, runs `f`, and pops on every exit path (including an
    /// early `?` return inside `f`), via the pop happening in a guard's
    /// `Drop`.
    pub fn scoped<R>(&mut self, tag: Option<DeclId>, f: impl FnOnce(&mut Self) -> R) -> R {
        struct PopGuard<'a>(&'a mut ScopeStack);
        impl Drop for PopGuard<'_> {
            fn drop(&mut self) {
                self.0.pop();
            }
        }
        self.push(tag);
        let mut guard = PopGuard(self);
        f(guard.0)
    }

    fn current(&self) -> &Scope {
        self.scopes.last().expect("scope stack is empty")
    }

    fn current_mut(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("scope stack is empty")
    }

    /// Binds `d` in the current scope, running overload admission against
    /// every existing declaration sharing its name. On success, also sets
    /// `d`'s declaration context to the innermost tagged scope.
    pub fn declare(
        &mut self,
        arena: &DeclArena,
        types: &TypeStore,
        d: DeclId,
    ) -> Result<(), AdmitError> {
        let name = arena.get(d).name;
        let context = self.context();
        let scope = self.current_mut();
        match scope.bindings.get_mut(&name) {
            None => {
                scope.bindings.insert(name, OverloadSet::new(d));
            }
            Some(set) => {
                let mut replace_at = None;
                for (i, &existing) in set.0.iter().enumerate() {
                    match admit(arena, types, existing, d) {
                        Admission::Extend => {}
                        Admission::Replace => replace_at = Some(i),
                        Admission::Reject(err) => return Err(err),
                    }
                }
                match replace_at {
                    Some(i) => set.0[i] = d,
                    None => set.0.push(d),
                }
            }
        }
        if let Some(cxt) = context {
            arena.get(d).set_context(cxt);
        }
        Ok(())
    }

    pub fn unqualified_lookup(&self, name: Symbol) -> Option<&OverloadSet> {
        self.scopes.iter().rev().find_map(|s| s.lookup(name))
    }

    pub fn qualified_lookup<'a>(scope: &'a Scope, name: Symbol) -> Option<&'a OverloadSet> {
        scope.lookup(name)
    }

    /// The innermost enclosing declaration of any kind (module, function,
    /// record) tagging a scope on the stack.
    pub fn context(&self) -> Option<DeclId> {
        self.scopes.iter().rev().find_map(|s| s.tag)
    }

    /// The module scope is always the bottom of the stack.
    pub fn module(&self) -> Option<DeclId> {
        self.scopes.first().and_then(|s| s.tag)
    }

    pub fn function(&self, arena: &DeclArena) -> Option<DeclId> {
        self.scopes.iter().rev().find_map(|s| {
            s.tag
                .filter(|&d| matches!(arena.get(d).kind, DeclKind::Function { .. } | DeclKind::Method { .. }))
        })
    }

    pub fn record(&self, arena: &DeclArena) -> Option<DeclId> {
        self.scopes
            .iter()
            .rev()
            .find_map(|s| s.tag.filter(|&d| matches!(arena.get(d).kind, DeclKind::Record { .. })))
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl::Specifiers;
    use crate::types::IntPrecision;

    fn sym(n: u32) -> Symbol {
        Symbol::from_raw(n)
    }

    #[test]
    fn declare_then_lookup_roundtrips() {
        let mut arena = DeclArena::new();
        let types = TypeStore::new();
        let mut stack = ScopeStack::new();
        stack.push(None);
        let var = arena.alloc_variable(Specifiers::default(), sym(0));
        stack.declare(&arena, &types, var).unwrap();
        let found = stack.unqualified_lookup(sym(0)).unwrap();
        assert!(found.is_singleton());
    }

    #[test]
    fn redefining_a_defined_function_is_rejected() {
        let mut arena = DeclArena::new();
        let mut types = TypeStore::new();
        let mut stack = ScopeStack::new();
        stack.push(None);

        let int = types.get_integer(IntPrecision::I32, true);
        let sig = types.get_function(vec![], int);

        let f1 = arena.alloc_function(Specifiers::default(), sym(0), vec![]);
        arena.get(f1).set_ty(sig);
        if let DeclKind::Function { body, .. } = &arena.get(f1).kind {
            *body.borrow_mut() = Some(crate::stmt::Stmt::new(
                crate::stmt::StmtKind::Empty,
                crate::span::Span::synthetic(),
            ));
        }
        stack.declare(&arena, &types, f1).unwrap();

        let f2 = arena.alloc_function(Specifiers::default(), sym(0), vec![]);
        arena.get(f2).set_ty(sig);
        let err = stack.declare(&arena, &types, f2).unwrap_err();
        assert!(matches!(err, AdmitError::Redefinition(_)));
    }

    #[test]
    fn defining_a_forward_declaration_replaces_it() {
        let mut arena = DeclArena::new();
        let mut types = TypeStore::new();
        let mut stack = ScopeStack::new();
        stack.push(None);

        let int = types.get_integer(IntPrecision::I32, true);
        let sig = types.get_function(vec![], int);

        let forward = arena.alloc_function(Specifiers::default(), sym(0), vec![]);
        arena.get(forward).set_ty(sig);
        stack.declare(&arena, &types, forward).unwrap();

        let defined = arena.alloc_function(Specifiers::default(), sym(0), vec![]);
        arena.get(defined).set_ty(sig);
        stack.declare(&arena, &types, defined).unwrap();

        let set = stack.unqualified_lookup(sym(0)).unwrap();
        assert_eq!(set.as_slice(), &[defined]);
    }

    #[test]
    fn functions_differing_only_in_return_type_are_rejected() {
        let mut arena = DeclArena::new();
        let mut types = TypeStore::new();
        let mut stack = ScopeStack::new();
        stack.push(None);

        let int = types.get_integer(IntPrecision::I32, true);
        let boolean = types.get_boolean();

        let f1 = arena.alloc_function(Specifiers::default(), sym(0), vec![]);
        arena.get(f1).set_ty(types.get_function(vec![], int));
        stack.declare(&arena, &types, f1).unwrap();

        let f2 = arena.alloc_function(Specifiers::default(), sym(0), vec![]);
        arena.get(f2).set_ty(types.get_function(vec![], boolean));
        let err = stack.declare(&arena, &types, f2).unwrap_err();
        assert!(matches!(err, AdmitError::ReturnTypeOnly(_)));
    }

    #[test]
    fn distinct_functions_extend_the_overload_set() {
        let mut arena = DeclArena::new();
        let mut types = TypeStore::new();
        let mut stack = ScopeStack::new();
        stack.push(None);

        let int = types.get_integer(IntPrecision::I32, true);
        let boolean = types.get_boolean();

        let f1 = arena.alloc_function(Specifiers::default(), sym(0), vec![]);
        arena.get(f1).set_ty(types.get_function(vec![int], boolean));
        stack.declare(&arena, &types, f1).unwrap();

        let f2 = arena.alloc_function(Specifiers::default(), sym(0), vec![]);
        arena.get(f2).set_ty(types.get_function(vec![boolean], boolean));
        stack.declare(&arena, &types, f2).unwrap();

        let set = stack.unqualified_lookup(sym(0)).unwrap();
        assert_eq!(set.as_slice().len(), 2);
    }

    #[test]
    fn scoped_pops_even_when_body_short_circuits() {
        let mut stack = ScopeStack::new();
        stack.push(None);
        let result: Result<(), ()> = stack.scoped(None, |s| {
            assert_eq!(s.depth(), 2);
            Err(())
        });
        assert!(result.is_err());
        assert_eq!(stack.depth(), 1);
    }
}
