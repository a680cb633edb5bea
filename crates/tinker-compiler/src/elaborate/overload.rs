//! Call-site overload resolution.
//!
//! Distinct from [`tinker_core::scope`]'s admission rules, which decide
//! whether a *declaration* may join an overload set at all: this module
//! picks, among an already-admitted set, which single candidate a call's
//! argument types select.

use tinker_core::{DeclArena, DeclId, OverloadSet, TypeData, TypeId, TypeStore};

use super::conversion::convertible;

pub enum Resolution {
    Resolved(DeclId),
    Ambiguous(Vec<DeclId>),
    NoMatch,
}

/// Selects the candidate(s) in `candidates` whose parameter list accepts
/// `arg_types`, where "accepts" means each argument's type either already
/// matches or converts to the parameter type.
pub fn resolve_call(
    candidates: &OverloadSet,
    arg_types: &[TypeId],
    arena: &DeclArena,
    types: &TypeStore,
) -> Resolution {
    let mut matches = Vec::new();
    for decl in candidates.iter() {
        let Some(ty) = arena.get(decl).ty() else {
            continue;
        };
        let TypeData::Function { params, .. } = types.data(ty) else {
            continue;
        };
        if params.len() != arg_types.len() {
            continue;
        }
        let all_accept = params
            .iter()
            .zip(arg_types.iter())
            .all(|(&param_ty, &arg_ty)| arg_ty == param_ty || convertible(arg_ty, param_ty, types, arena));
        if all_accept {
            matches.push(decl);
        }
    }
    match matches.len() {
        0 => Resolution::NoMatch,
        1 => Resolution::Resolved(matches[0]),
        _ => Resolution::Ambiguous(matches),
    }
}

/// The return type of a resolved function-like declaration.
pub fn return_type(decl: DeclId, arena: &DeclArena, types: &TypeStore) -> Option<TypeId> {
    let ty = arena.get(decl).ty()?;
    match types.data(ty) {
        TypeData::Function { ret, .. } => Some(*ret),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinker_core::{DeclArena, IntPrecision, Specifiers, TypeStore};

    #[test]
    fn unique_match_resolves() {
        let mut arena = DeclArena::new();
        let mut types = TypeStore::new();
        let int = types.get_integer(IntPrecision::I32, true);
        let boolean = types.get_boolean();
        let f = arena.alloc_function(Specifiers::default(), tinker_core::Symbol::from_raw(0), vec![]);
        arena.get(f).set_ty(types.get_function(vec![int], boolean));

        let mut scopes = tinker_core::ScopeStack::new();
        scopes.push(None);
        scopes.declare(&arena, &types, f).unwrap();
        let set = scopes.unqualified_lookup(tinker_core::Symbol::from_raw(0)).unwrap();

        match resolve_call(set, &[int], &arena, &types) {
            Resolution::Resolved(decl) => assert_eq!(decl, f),
            _ => panic!("expected a unique match"),
        }
    }

    #[test]
    fn arity_mismatch_is_no_match() {
        let mut arena = DeclArena::new();
        let mut types = TypeStore::new();
        let int = types.get_integer(IntPrecision::I32, true);
        let boolean = types.get_boolean();
        let f = arena.alloc_function(Specifiers::default(), tinker_core::Symbol::from_raw(0), vec![]);
        arena.get(f).set_ty(types.get_function(vec![int], boolean));

        let mut scopes = tinker_core::ScopeStack::new();
        scopes.push(None);
        scopes.declare(&arena, &types, f).unwrap();
        let set = scopes.unqualified_lookup(tinker_core::Symbol::from_raw(0)).unwrap();

        assert!(matches!(
            resolve_call(set, &[], &arena, &types),
            Resolution::NoMatch
        ));
    }
}
