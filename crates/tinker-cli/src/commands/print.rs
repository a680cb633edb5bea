//! Pretty-prints an elaborated module as an indented declaration tree.
//!
//! There is no lossless/CST representation to dump (the parser builds the
//! typed AST directly), so the translate pipeline's output artifact is
//! this tree instead: one line per declaration, its resolved type, and its
//! children, indented like a parenthesized parse-tree dump.

use std::fmt::Write;

use tinker_core::{Decl, DeclArena, DeclId, DeclKind, Interner, TypeData, TypeId, TypeStore};

/// Renders `module` and everything it declares as an indented tree.
pub fn print_module(
    arena: &DeclArena,
    types: &TypeStore,
    interner: &Interner,
    module: DeclId,
) -> String {
    let mut out = String::new();
    print_decl(arena, types, interner, module, 0, &mut out);
    out
}

fn print_decl(
    arena: &DeclArena,
    types: &TypeStore,
    interner: &Interner,
    id: DeclId,
    depth: usize,
    out: &mut String,
) {
    let decl = arena.get(id);
    let indent = "  ".repeat(depth);
    let name = interner.resolve(decl.name);
    let kind = kind_label(decl);
    let ty = decl
        .ty()
        .map(|t| format!(": {}", type_name(arena, types, interner, t)))
        .unwrap_or_default();

    writeln!(out, "{indent}({kind} {name}{ty}").expect("String write never fails");
    for child in children_of(decl) {
        print_decl(arena, types, interner, child, depth + 1, out);
    }
    let _ = out.pop();
    out.push(')');
    out.push('\n');
}

fn kind_label(decl: &Decl) -> &'static str {
    match &decl.kind {
        DeclKind::Variable { .. } => "var",
        DeclKind::Function { .. } => "def",
        DeclKind::Parameter => "param",
        DeclKind::Record { .. } => "record",
        DeclKind::Field => "field",
        DeclKind::Method { .. } => "method",
        DeclKind::Module { .. } => "module",
    }
}

fn children_of(decl: &Decl) -> Vec<DeclId> {
    match &decl.kind {
        DeclKind::Module { decls } => decls.borrow().clone(),
        DeclKind::Function { params, .. } => params.clone(),
        DeclKind::Method {
            implicit_this,
            params,
            ..
        } => std::iter::once(*implicit_this).chain(params.iter().copied()).collect(),
        DeclKind::Record { fields, members, .. } => {
            let mut all = fields.borrow().clone();
            all.extend(members.borrow().iter().copied());
            all
        }
        DeclKind::Variable { .. } | DeclKind::Parameter | DeclKind::Field => Vec::new(),
    }
}

fn type_name(arena: &DeclArena, types: &TypeStore, interner: &Interner, id: TypeId) -> String {
    match types.data(id) {
        TypeData::Boolean => "bool".to_string(),
        TypeData::Character => "char".to_string(),
        TypeData::Integer { precision, signed } => {
            format!("{}{}", if *signed { "i" } else { "u" }, precision.bits())
        }
        TypeData::Float => "float".to_string(),
        TypeData::Double => "double".to_string(),
        TypeData::Function { params, ret } => {
            let params: Vec<String> = params
                .iter()
                .map(|p| type_name(arena, types, interner, *p))
                .collect();
            format!("({}) -> {}", params.join(", "), type_name(arena, types, interner, *ret))
        }
        TypeData::Array { elem, extent } => {
            format!("{}[{}]", type_name(arena, types, interner, *elem), extent)
        }
        TypeData::Block(elem) => format!("block<{}>", type_name(arena, types, interner, *elem)),
        TypeData::Reference(referent) => {
            format!("&{}", type_name(arena, types, interner, *referent))
        }
        TypeData::Record(decl) => interner.resolve(arena.get(*decl).name).to_string(),
        TypeData::Id(sym) => interner.resolve(*sym).to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinker_core::TokenClass;

    #[test]
    fn prints_a_function_with_its_parameters_and_return_type() {
        let mut interner = tinker_core::interner::seed();
        let mut types = TypeStore::new();
        let mut arena = DeclArena::new();

        let int = types.get_integer(tinker_core::IntPrecision::I32, true);
        let x = arena.alloc_parameter(interner.intern("x", TokenClass::Identifier));
        arena.get(x).set_ty(int);
        let f = arena.alloc_function(
            Default::default(),
            interner.intern("f", TokenClass::Identifier),
            vec![x],
        );
        arena.get(f).set_ty(types.get_function(vec![int], int));

        let module_name = interner.intern("m", TokenClass::Identifier);
        let module = arena.alloc_module(module_name);
        if let DeclKind::Module { decls } = &arena.get(module).kind {
            *decls.borrow_mut() = vec![f];
        }

        let dump = print_module(&arena, &types, &interner, module);
        assert!(dump.contains("(def f: (i32) -> i32"));
        assert!(dump.contains("(param x: i32)"));
    }
}
