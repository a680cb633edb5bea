//! Statement trees.
//!
//! Like expressions, statements form an ordinary owned `Box`-recursive tree;
//! they do not need an arena because a statement never needs to be named by
//! a handle that outlives its parent.

use crate::decl::{DeclId, Specifiers};
use crate::expr::Expr;
use crate::interner::Symbol;
use crate::span::Span;
use crate::types::TypeExpr;

/// A local variable declaration as parsed, before the elaborator has
/// allocated its arena entry. Distinct from [`StmtKind::Decl`], which is
/// what this variant becomes once elaborated.
#[derive(Debug)]
pub struct RawLocalVar {
    pub specifiers: Specifiers,
    pub name: Symbol,
    pub ty: TypeExpr,
    pub init: Option<Expr>,
}

#[derive(Debug)]
pub enum StmtKind {
    Empty,
    Block(Vec<Stmt>),
    Assign(Expr, Expr),
    Return(Option<Expr>),
    If(Expr, Box<Stmt>, Option<Box<Stmt>>),
    While(Expr, Box<Stmt>),
    For {
        init: Option<Box<Stmt>>,
        cond: Option<Expr>,
        step: Option<Expr>,
        body: Box<Stmt>,
    },
    Break,
    Continue,
    Expr(Expr),
    /// A local variable declaration as written in source; replaced by
    /// [`StmtKind::Decl`] once the elaborator allocates it in the arena.
    VarDecl(RawLocalVar),
    /// An elaborated local declaration statement; `DeclId` names the arena
    /// entry the elaborator allocated for it.
    Decl(DeclId),
}

#[derive(Debug)]
pub struct Stmt {
    pub kind: StmtKind,
    pub span: Span,
}

impl Stmt {
    pub fn new(kind: StmtKind, span: Span) -> Self {
        Self { kind, span }
    }
}
