//! Name mangling.
//!
//! A `compile` run has no object-file backend, so mangled names exist
//! purely to give the CLI driver's report a stable external name per
//! top-level declaration, the same role a mangler plays ahead of a linker
//! stage. A foreign-linkage declaration mangles to its bare spelling,
//! matching `extern "C"`-style linkage in the source language: no
//! name-mangling scheme survives a foreign boundary.

use tinker_core::{DeclArena, DeclId, DeclKind, Interner, TypeData, TypeId, TypeStore};

/// Mangles `decl`'s external name.
pub fn mangle(interner: &Interner, arena: &DeclArena, types: &TypeStore, decl: DeclId) -> String {
    let d = arena.get(decl);
    if d.specifiers.foreign {
        return interner.resolve(d.name).to_owned();
    }

    // A record's own `ty()` is its self-referential record type (set at
    // declaration time so member lookups can resolve before the body is
    // elaborated), not a type it should be mangled by. It mangles to its
    // bare name, same as the `Tr<name>_` it contributes when some other
    // type mentions it.
    if let DeclKind::Record { .. } = &d.kind {
        return interner.resolve(d.name).to_owned();
    }

    let mut out = String::new();
    mangle_scope(interner, arena, decl, &mut out);

    if let DeclKind::Method { .. } = &d.kind {
        if let Some(record) = d.context() {
            out.push_str(interner.resolve(arena.get(record).name));
            out.push('_');
        }
    }

    out.push_str(interner.resolve(d.name));
    if let Some(ty) = d.ty() {
        out.push('_');
        mangle_type(interner, arena, types, ty, &mut out);
    }
    out
}

/// Prepends the enclosing module's name, if any, followed by `_`.
fn mangle_scope(interner: &Interner, arena: &DeclArena, decl: DeclId, out: &mut String) {
    if let Some(module) = enclosing_module(arena, decl) {
        out.push_str(interner.resolve(arena.get(module).name));
        out.push('_');
    }
}

fn enclosing_module(arena: &DeclArena, decl: DeclId) -> Option<DeclId> {
    let mut current = decl;
    loop {
        let cxt = arena.get(current).context()?;
        if matches!(arena.get(cxt).kind, DeclKind::Module { .. }) {
            return Some(cxt);
        }
        current = cxt;
    }
}

fn mangle_type(interner: &Interner, arena: &DeclArena, types: &TypeStore, ty: TypeId, out: &mut String) {
    match types.data(ty) {
        TypeData::Boolean => out.push('b'),
        TypeData::Character => out.push('c'),
        TypeData::Integer { .. } => out.push('i'),
        // Neither scalar has a counterpart in the reference mangling
        // scheme, which predates this crate's float/double enrichment;
        // `f`/`d` follow the same one-letter-per-scalar convention as
        // `b`/`c`/`i`.
        TypeData::Float => out.push('f'),
        TypeData::Double => out.push('d'),
        TypeData::Function { params, ret } => {
            out.push('F');
            for &p in params {
                mangle_type(interner, arena, types, p, out);
            }
            mangle_type(interner, arena, types, *ret, out);
        }
        TypeData::Array { elem, extent } => {
            out.push('A');
            out.push_str(&extent.to_string());
            out.push('_');
            mangle_type(interner, arena, types, *elem, out);
        }
        TypeData::Block(elem) => {
            out.push('B');
            mangle_type(interner, arena, types, *elem, out);
        }
        TypeData::Reference(referent) => {
            out.push('R');
            mangle_type(interner, arena, types, *referent, out);
        }
        TypeData::Record(decl) => {
            out.push_str("Tr");
            out.push_str(interner.resolve(arena.get(*decl).name));
            out.push('_');
        }
        TypeData::Id(_) => unreachable!("an Id placeholder type never survives elaboration"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinker_core::{IntPrecision, Specifiers, Symbol, TokenClass};

    fn sym(interner: &mut Interner, text: &str) -> Symbol {
        interner.intern(text, TokenClass::Identifier)
    }

    #[test]
    fn foreign_declarations_mangle_to_their_bare_spelling() {
        let mut interner = Interner::new();
        let mut types = TypeStore::new();
        let mut arena = DeclArena::new();
        let name = sym(&mut interner, "puts");
        let specifiers = Specifiers {
            foreign: true,
            ..Specifiers::default()
        };
        let id = arena.alloc_function(specifiers, name, vec![]);
        let int = types.get_integer(IntPrecision::I32, true);
        arena.get(id).set_ty(types.get_function(vec![], int));
        assert_eq!(mangle(&interner, &arena, &types, id), "puts");
    }

    #[test]
    fn scalar_types_mangle_to_one_letter_codes() {
        let interner = Interner::new();
        let arena = DeclArena::new();
        let mut types = TypeStore::new();
        let boolean = types.get_boolean();
        let mut out = String::new();
        mangle_type(&interner, &arena, &types, boolean, &mut out);
        assert_eq!(out, "b");
    }

    #[test]
    fn function_type_mangles_params_then_return() {
        let interner = Interner::new();
        let arena = DeclArena::new();
        let mut types = TypeStore::new();
        let int = types.get_integer(IntPrecision::I32, true);
        let boolean = types.get_boolean();
        let fn_ty = types.get_function(vec![int, boolean], int);
        let mut out = String::new();
        mangle_type(&interner, &arena, &types, fn_ty, &mut out);
        assert_eq!(out, "Fibi");
    }

    #[test]
    fn record_declaration_mangles_to_its_bare_name() {
        let mut interner = Interner::new();
        let mut types = TypeStore::new();
        let mut arena = DeclArena::new();
        let name = sym(&mut interner, "Point");
        let record = arena.alloc_record(Specifiers::default(), name);
        // A record's self-referential type is assigned before its body is
        // elaborated (see `elaborate::elaborate_module`'s pre-registration
        // pass); `mangle` must still produce the bare name despite `ty()`
        // being `Some`.
        let record_ty = types.get_record(record);
        arena.get(record).set_ty(record_ty);
        assert_eq!(mangle(&interner, &arena, &types, record), "Point");
    }

    #[test]
    fn record_type_mangles_to_tr_name() {
        let mut interner = Interner::new();
        let mut types = TypeStore::new();
        let mut arena = DeclArena::new();
        let name = sym(&mut interner, "Point");
        let specifiers = Specifiers::default();
        let record = arena.alloc_record(specifiers, name);
        let record_ty = types.get_record(record);
        let mut out = String::new();
        mangle_type(&interner, &arena, &types, record_ty, &mut out);
        assert_eq!(out, "TrPoint_");
    }
}
