//! The untyped tree the parser hands to the elaborator.
//!
//! This tree intentionally does *not* use `tinker_core`'s arena-resident
//! [`tinker_core::DeclId`]s: declarations only get arena slots once the
//! elaborator's declare pass decides their final shape and type. Before
//! that, a declaration is just syntax — a name, a [`TypeExpr`], and
//! (for functions/variables) a raw body/initializer.
//!
//! [`TypeExpr`] itself lives in `tinker_core` rather than here, since a
//! local variable declaration statement (a [`tinker_core::StmtKind::VarDecl`])
//! needs the same pre-resolution type representation and statements are a
//! `tinker_core` type.

use tinker_core::{Expr, Specifiers, Stmt, Symbol, TypeExpr};

#[derive(Debug)]
pub struct RawParam {
    pub name: Symbol,
    pub ty: TypeExpr,
}

#[derive(Debug)]
pub struct RawFunction {
    pub specifiers: Specifiers,
    pub name: Symbol,
    pub params: Vec<RawParam>,
    pub ret: TypeExpr,
    pub body: Stmt,
}

#[derive(Debug)]
pub struct RawVariable {
    pub specifiers: Specifiers,
    pub name: Symbol,
    pub ty: TypeExpr,
    pub init: Option<Expr>,
}

#[derive(Debug)]
pub struct RawRecord {
    pub specifiers: Specifiers,
    pub name: Symbol,
    pub base: Option<Symbol>,
    pub fields: Vec<RawParam>,
    pub methods: Vec<RawFunction>,
}

#[derive(Debug)]
pub enum RawItem {
    Function(RawFunction),
    Variable(RawVariable),
    Record(RawRecord),
}

#[derive(Debug, Default)]
pub struct RawModule {
    pub items: Vec<RawItem>,
}
