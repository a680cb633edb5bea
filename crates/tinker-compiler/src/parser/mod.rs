//! Recursive-descent parsing.
//!
//! The parser builds the untyped tree in [`ast`] directly, with no
//! intermediate lossless/CST representation — the elaborator only ever
//! needs a typed tree, so there is nothing downstream for a CST to serve.
//! Syntax errors are recovered by skipping to the next statement
//! terminator, so one run can report more than one syntax error.

pub mod ast;

use tinker_core::{
    BinaryOp, Diagnostics, Expr, ExprKind, Interner, Location, RawLocalVar, Specifiers, Span,
    Stmt, StmtKind, Symbol, TypeExpr, UnaryOp,
};

use crate::lexer::{LexError, Lexer, Token, TokenKind};
use ast::{RawFunction, RawItem, RawModule, RawParam, RawRecord, RawVariable};

pub struct Parser<'s> {
    tokens: Vec<Token>,
    pos: usize,
    file: Option<String>,
    diagnostics: Diagnostics,
    source: &'s str,
}

impl<'s> Parser<'s> {
    pub fn new(source: &'s str, file: Option<String>, interner: &mut Interner) -> Self {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        let mut diagnostics = Diagnostics::new();
        loop {
            match lexer.next_token(interner) {
                Ok(Some(tok)) => {
                    let is_eof = tok.kind == TokenKind::Eof;
                    tokens.push(tok);
                    if is_eof {
                        break;
                    }
                }
                Ok(None) => break,
                Err(LexError { span, message }) => {
                    diagnostics.error(Location::new(file.clone(), span), message);
                }
            }
        }
        Self {
            tokens,
            pos: 0,
            file,
            diagnostics,
            source,
        }
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    // -- token cursor helpers -----------------------------------------

    fn peek(&self) -> &TokenKind {
        &self.tokens[self.pos.min(self.tokens.len() - 1)].kind
    }

    fn peek_span(&self) -> Span {
        self.tokens[self.pos.min(self.tokens.len() - 1)].span
    }

    fn at_eof(&self) -> bool {
        matches!(self.peek(), TokenKind::Eof)
    }

    fn bump(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }

    fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.bump();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: &TokenKind, what: &str) -> Span {
        let span = self.peek_span();
        if !self.eat(kind) {
            self.error(span, format!("expected {what}"));
        }
        span
    }

    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics
            .error(Location::new(self.file.clone(), span), message);
    }

    /// Skips tokens until the next statement terminator (`;` or `}`), so a
    /// syntax error does not stop the whole parse.
    fn recover_to_stmt_boundary(&mut self) {
        while !self.at_eof() {
            match self.peek() {
                TokenKind::Semi => {
                    self.bump();
                    return;
                }
                TokenKind::RBrace => return,
                _ => {
                    self.bump();
                }
            }
        }
    }

    // -- top level ------------------------------------------------------

    pub fn parse_module(&mut self) -> RawModule {
        let mut items = Vec::new();
        while !self.at_eof() {
            match self.parse_item() {
                Some(item) => items.push(item),
                None => self.recover_to_stmt_boundary(),
            }
        }
        RawModule { items }
    }

    fn parse_specifiers(&mut self) -> Specifiers {
        let mut specifiers = Specifiers::default();
        loop {
            match self.peek() {
                TokenKind::Foreign => {
                    self.bump();
                    specifiers.foreign = true;
                }
                TokenKind::Virtual => {
                    self.bump();
                    specifiers.is_virtual = true;
                }
                TokenKind::Abstract => {
                    self.bump();
                    specifiers.is_abstract = true;
                }
                TokenKind::Root => {
                    self.bump();
                    specifiers.root = true;
                }
                _ => return specifiers,
            }
        }
    }

    fn parse_item(&mut self) -> Option<RawItem> {
        let specifiers = self.parse_specifiers();
        match self.peek() {
            TokenKind::Def => self.parse_function(specifiers).map(RawItem::Function),
            TokenKind::Var => {
                let item = self.parse_variable(specifiers).map(RawItem::Variable);
                self.expect(&TokenKind::Semi, "';' after variable declaration");
                item
            }
            TokenKind::Record => self.parse_record(specifiers).map(RawItem::Record),
            _ => {
                let span = self.peek_span();
                self.error(span, "expected a declaration");
                None
            }
        }
    }

    fn parse_ident(&mut self) -> Option<Symbol> {
        let span = self.peek_span();
        if let TokenKind::Ident(sym) = self.peek().clone() {
            self.bump();
            Some(sym)
        } else {
            self.error(span, "expected an identifier");
            None
        }
    }

    fn parse_type(&mut self) -> TypeExpr {
        let mut ty = if self.eat(&TokenKind::Amp) {
            TypeExpr::Reference(Box::new(self.parse_base_type()))
        } else {
            self.parse_base_type()
        };
        while self.eat(&TokenKind::LBrack) {
            let extent = self.parse_expr();
            self.expect(&TokenKind::RBrack, "']' after array extent");
            ty = TypeExpr::Array(Box::new(ty), Box::new(extent));
        }
        ty
    }

    fn parse_base_type(&mut self) -> TypeExpr {
        let span = self.peek_span();
        match self.peek().clone() {
            TokenKind::BoolKw => {
                self.bump();
                TypeExpr::Bool
            }
            TokenKind::CharKw => {
                self.bump();
                TypeExpr::Char
            }
            TokenKind::IntKw => {
                self.bump();
                TypeExpr::Int
            }
            TokenKind::FloatKw => {
                self.bump();
                TypeExpr::Float
            }
            TokenKind::DoubleKw => {
                self.bump();
                TypeExpr::Double
            }
            TokenKind::Ident(sym) => {
                self.bump();
                TypeExpr::Named(sym)
            }
            _ => {
                self.error(span, "expected a type");
                TypeExpr::Int
            }
        }
    }

    fn parse_params(&mut self) -> Vec<RawParam> {
        let mut params = Vec::new();
        self.expect(&TokenKind::LParen, "'(' to start parameter list");
        if !self.check(&TokenKind::RParen) {
            loop {
                let Some(name) = self.parse_ident() else {
                    break;
                };
                self.expect(&TokenKind::Colon, "':' before parameter type");
                let ty = self.parse_type();
                params.push(RawParam { name, ty });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(&TokenKind::RParen, "')' to close parameter list");
        params
    }

    fn parse_function(&mut self, specifiers: Specifiers) -> Option<RawFunction> {
        self.bump(); // 'def'
        let name = self.parse_ident()?;
        let params = self.parse_params();
        self.expect(&TokenKind::Minus, "'->' before return type");
        self.expect(&TokenKind::Gt, "'->' before return type");
        let ret = self.parse_type();
        let body = self.parse_block();
        Some(RawFunction {
            specifiers,
            name,
            params,
            ret,
            body,
        })
    }

    /// Parses a local `var` statement into a [`StmtKind::VarDecl`], which
    /// the elaborator later replaces in place with [`StmtKind::Decl`] once
    /// it has allocated the declaration. Unlike top-level variables, no
    /// specifiers are accepted on a local declaration.
    fn parse_local_var_stmt(&mut self, span: Span) -> Stmt {
        self.bump(); // 'var'
        let Some(name) = self.parse_ident() else {
            return Stmt::new(StmtKind::Empty, span);
        };
        self.expect(&TokenKind::Colon, "':' before variable type");
        let ty = self.parse_type();
        let init = if self.eat(&TokenKind::Eq) {
            Some(self.parse_expr())
        } else {
            None
        };
        Stmt::new(
            StmtKind::VarDecl(RawLocalVar {
                specifiers: Specifiers::default(),
                name,
                ty,
                init,
            }),
            span,
        )
    }

    fn parse_variable(&mut self, specifiers: Specifiers) -> Option<RawVariable> {
        self.bump(); // 'var'
        let name = self.parse_ident()?;
        self.expect(&TokenKind::Colon, "':' before variable type");
        let ty = self.parse_type();
        let init = if self.eat(&TokenKind::Eq) {
            Some(self.parse_expr())
        } else {
            None
        };
        Some(RawVariable {
            specifiers,
            name,
            ty,
            init,
        })
    }

    fn parse_record(&mut self, specifiers: Specifiers) -> Option<RawRecord> {
        self.bump(); // 'record'
        let name = self.parse_ident()?;
        let base = if self.eat(&TokenKind::Extends) {
            self.parse_ident()
        } else {
            None
        };
        self.expect(&TokenKind::LBrace, "'{' to start record body");
        let mut fields = Vec::new();
        let mut methods = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_eof() {
            let member_specifiers = self.parse_specifiers();
            if self.check(&TokenKind::Def) {
                if let Some(method) = self.parse_function(member_specifiers) {
                    methods.push(method);
                }
            } else if let Some(name) = self.parse_ident() {
                self.expect(&TokenKind::Colon, "':' before field type");
                let ty = self.parse_type();
                self.expect(&TokenKind::Semi, "';' after field declaration");
                fields.push(RawParam { name, ty });
            } else {
                self.recover_to_stmt_boundary();
            }
        }
        self.expect(&TokenKind::RBrace, "'}' to close record body");
        Some(RawRecord {
            specifiers,
            name,
            base,
            fields,
            methods,
        })
    }

    // -- statements -------------------------------------------------------

    fn parse_block(&mut self) -> Stmt {
        let start = self.peek_span();
        self.expect(&TokenKind::LBrace, "'{' to start a block");
        let mut stmts = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.at_eof() {
            stmts.push(self.parse_stmt());
        }
        let end = self.peek_span();
        self.expect(&TokenKind::RBrace, "'}' to close a block");
        Stmt::new(StmtKind::Block(stmts), start.to(end))
    }

    fn parse_stmt(&mut self) -> Stmt {
        let span = self.peek_span();
        match self.peek() {
            TokenKind::LBrace => self.parse_block(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Return => {
                self.bump();
                let value = if self.check(&TokenKind::Semi) {
                    None
                } else {
                    Some(self.parse_expr())
                };
                self.expect(&TokenKind::Semi, "';' after return statement");
                Stmt::new(StmtKind::Return(value), span)
            }
            TokenKind::Break => {
                self.bump();
                self.expect(&TokenKind::Semi, "';' after 'break'");
                Stmt::new(StmtKind::Break, span)
            }
            TokenKind::Continue => {
                self.bump();
                self.expect(&TokenKind::Semi, "';' after 'continue'");
                Stmt::new(StmtKind::Continue, span)
            }
            TokenKind::Semi => {
                self.bump();
                Stmt::new(StmtKind::Empty, span)
            }
            TokenKind::Var => {
                let stmt = self.parse_local_var_stmt(span);
                self.expect(&TokenKind::Semi, "';' after variable declaration");
                stmt
            }
            _ => self.parse_expr_or_assign_stmt(),
        }
    }

    fn parse_if(&mut self) -> Stmt {
        let span = self.peek_span();
        self.bump(); // 'if'
        self.expect(&TokenKind::LParen, "'(' after 'if'");
        let cond = self.parse_expr();
        self.expect(&TokenKind::RParen, "')' after if condition");
        let then_branch = Box::new(self.parse_stmt());
        let else_branch = if self.eat(&TokenKind::Else) {
            Some(Box::new(self.parse_stmt()))
        } else {
            None
        };
        Stmt::new(StmtKind::If(cond, then_branch, else_branch), span)
    }

    fn parse_while(&mut self) -> Stmt {
        let span = self.peek_span();
        self.bump(); // 'while'
        self.expect(&TokenKind::LParen, "'(' after 'while'");
        let cond = self.parse_expr();
        self.expect(&TokenKind::RParen, "')' after while condition");
        let body = Box::new(self.parse_stmt());
        Stmt::new(StmtKind::While(cond, body), span)
    }

    fn parse_for(&mut self) -> Stmt {
        let span = self.peek_span();
        self.bump(); // 'for'
        self.expect(&TokenKind::LParen, "'(' after 'for'");
        let init = if self.check(&TokenKind::Semi) {
            None
        } else if self.check(&TokenKind::Var) {
            let var_span = self.peek_span();
            let stmt = self.parse_local_var_stmt(var_span);
            self.expect(&TokenKind::Semi, "';' after for-init");
            Some(Box::new(stmt))
        } else {
            Some(Box::new(self.parse_expr_or_assign_stmt()))
        };
        if init.is_none() {
            self.expect(&TokenKind::Semi, "';' after for-init");
        }
        let cond = if self.check(&TokenKind::Semi) {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(&TokenKind::Semi, "';' after for-condition");
        let step = if self.check(&TokenKind::RParen) {
            None
        } else {
            Some(self.parse_expr())
        };
        self.expect(&TokenKind::RParen, "')' after for-step");
        let body = Box::new(self.parse_stmt());
        Stmt::new(
            StmtKind::For {
                init,
                cond,
                step,
                body,
            },
            span,
        )
    }

    fn parse_expr_or_assign_stmt(&mut self) -> Stmt {
        let span = self.peek_span();
        let first = self.parse_expr();
        let stmt = if self.eat(&TokenKind::Eq) {
            let value = self.parse_expr();
            Stmt::new(StmtKind::Assign(first, value), span)
        } else {
            Stmt::new(StmtKind::Expr(first), span)
        };
        self.expect(&TokenKind::Semi, "';' after statement");
        stmt
    }

    // -- expressions (precedence climbing) --------------------------------

    pub fn parse_expr(&mut self) -> Expr {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Expr {
        let mut lhs = self.parse_and();
        while self.eat(&TokenKind::OrOr) {
            let span = lhs.span;
            let rhs = self.parse_and();
            lhs = Expr::new(
                ExprKind::Binary(BinaryOp::Or, Box::new(lhs), Box::new(rhs)),
                span,
            );
        }
        lhs
    }

    fn parse_and(&mut self) -> Expr {
        let mut lhs = self.parse_equality();
        while self.eat(&TokenKind::AndAnd) {
            let span = lhs.span;
            let rhs = self.parse_equality();
            lhs = Expr::new(
                ExprKind::Binary(BinaryOp::And, Box::new(lhs), Box::new(rhs)),
                span,
            );
        }
        lhs
    }

    fn parse_equality(&mut self) -> Expr {
        let mut lhs = self.parse_relational();
        loop {
            let op = match self.peek() {
                TokenKind::EqEq => BinaryOp::Eq,
                TokenKind::BangEq => BinaryOp::Ne,
                _ => break,
            };
            self.bump();
            let span = lhs.span;
            let rhs = self.parse_relational();
            lhs = Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), span);
        }
        lhs
    }

    fn parse_relational(&mut self) -> Expr {
        let mut lhs = self.parse_additive();
        loop {
            let op = match self.peek() {
                TokenKind::Lt => BinaryOp::Lt,
                TokenKind::Gt => BinaryOp::Gt,
                TokenKind::LtEq => BinaryOp::Le,
                TokenKind::GtEq => BinaryOp::Ge,
                _ => break,
            };
            self.bump();
            let span = lhs.span;
            let rhs = self.parse_additive();
            lhs = Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), span);
        }
        lhs
    }

    fn parse_additive(&mut self) -> Expr {
        let mut lhs = self.parse_multiplicative();
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => break,
            };
            self.bump();
            let span = lhs.span;
            let rhs = self.parse_multiplicative();
            lhs = Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), span);
        }
        lhs
    }

    fn parse_multiplicative(&mut self) -> Expr {
        let mut lhs = self.parse_unary();
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::Percent => BinaryOp::Rem,
                _ => break,
            };
            self.bump();
            let span = lhs.span;
            let rhs = self.parse_unary();
            lhs = Expr::new(ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)), span);
        }
        lhs
    }

    fn parse_unary(&mut self) -> Expr {
        let span = self.peek_span();
        let op = match self.peek() {
            TokenKind::Minus => Some(UnaryOp::Neg),
            TokenKind::Plus => Some(UnaryOp::Pos),
            TokenKind::Bang => Some(UnaryOp::Not),
            _ => None,
        };
        if let Some(op) = op {
            self.bump();
            let operand = self.parse_unary();
            Expr::new(ExprKind::Unary(op, Box::new(operand)), span)
        } else {
            self.parse_postfix()
        }
    }

    fn parse_postfix(&mut self) -> Expr {
        let mut expr = self.parse_primary();
        loop {
            match self.peek() {
                TokenKind::Dot => {
                    self.bump();
                    let span = expr.span;
                    let Some(name) = self.parse_ident() else {
                        break;
                    };
                    expr = Expr::new(ExprKind::Member(Box::new(expr), name), span);
                }
                TokenKind::LParen => {
                    self.bump();
                    let span = expr.span;
                    let mut args = Vec::new();
                    if !self.check(&TokenKind::RParen) {
                        loop {
                            args.push(self.parse_expr());
                            if !self.eat(&TokenKind::Comma) {
                                break;
                            }
                        }
                    }
                    self.expect(&TokenKind::RParen, "')' to close call arguments");
                    expr = Expr::new(ExprKind::Call(Box::new(expr), args), span);
                }
                TokenKind::LBrack => {
                    self.bump();
                    let span = expr.span;
                    let index = self.parse_expr();
                    self.expect(&TokenKind::RBrack, "']' to close index expression");
                    expr = Expr::new(ExprKind::Index(Box::new(expr), Box::new(index)), span);
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_primary(&mut self) -> Expr {
        let span = self.peek_span();
        match self.peek().clone() {
            TokenKind::True => {
                self.bump();
                Expr::new(ExprKind::Literal(tinker_core::LiteralValue::Boolean(true)), span)
            }
            TokenKind::False => {
                self.bump();
                Expr::new(
                    ExprKind::Literal(tinker_core::LiteralValue::Boolean(false)),
                    span,
                )
            }
            TokenKind::IntLit(n) => {
                self.bump();
                Expr::new(ExprKind::Literal(tinker_core::LiteralValue::Integer(n)), span)
            }
            TokenKind::FloatLit(f) => {
                self.bump();
                Expr::new(ExprKind::Literal(tinker_core::LiteralValue::Float(f)), span)
            }
            TokenKind::CharLit(c) => {
                self.bump();
                Expr::new(
                    ExprKind::Literal(tinker_core::LiteralValue::Character(c)),
                    span,
                )
            }
            TokenKind::StringLit(s) => {
                self.bump();
                Expr::new(ExprKind::Literal(tinker_core::LiteralValue::String(s)), span)
            }
            TokenKind::Ident(sym) => {
                self.bump();
                Expr::new(ExprKind::Id(sym), span)
            }
            TokenKind::LParen => {
                self.bump();
                let inner = self.parse_expr();
                self.expect(&TokenKind::RParen, "')' to close parenthesized expression");
                inner
            }
            _ => {
                self.error(span, "expected an expression");
                self.bump();
                Expr::new(
                    ExprKind::Literal(tinker_core::LiteralValue::Integer(0)),
                    span,
                )
            }
        }
    }

    /// Returns the source text this parser was constructed from, for
    /// diagnostics rendering.
    pub fn source(&self) -> &'s str {
        self.source
    }
}

/// Parses `source` into a [`RawModule`] plus any syntax/lexical
/// diagnostics collected along the way.
pub fn parse(
    source: &str,
    file: Option<String>,
    interner: &mut Interner,
) -> (RawModule, Diagnostics) {
    let mut parser = Parser::new(source, file, interner);
    let module = parser.parse_module();
    (module, parser.into_diagnostics())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_minimal_function() {
        let mut interner = tinker_core::interner::seed();
        let (module, diags) = parse(
            "def main() -> int { return 1 + 2 * 3; }",
            None,
            &mut interner,
        );
        assert!(diags.is_empty(), "{diags:?}");
        assert_eq!(module.items.len(), 1);
        assert!(matches!(module.items[0], RawItem::Function(_)));
    }

    #[test]
    fn parses_a_local_var_statement_inside_a_block() {
        let mut interner = tinker_core::interner::seed();
        let (module, diags) = parse(
            "def main() -> int { var x: int = 0; while (x < 10) x = x + 1; return x; }",
            None,
            &mut interner,
        );
        assert!(diags.is_empty(), "{diags:?}");
        let RawItem::Function(f) = &module.items[0] else {
            panic!("expected a function item");
        };
        let StmtKind::Block(stmts) = &f.body.kind else {
            panic!("expected a block body");
        };
        assert!(matches!(stmts[0].kind, StmtKind::VarDecl(_)));
    }

    #[test]
    fn parses_record_with_base_and_fields() {
        let mut interner = tinker_core::interner::seed();
        let (module, diags) = parse(
            "record Base { x: int; } record Derived extends Base { y: int; }",
            None,
            &mut interner,
        );
        assert!(diags.is_empty(), "{diags:?}");
        assert_eq!(module.items.len(), 2);
    }

    #[test]
    fn recovers_after_a_syntax_error() {
        let mut interner = tinker_core::interner::seed();
        let (module, diags) = parse(
            "def broken( -> int { return 1; } def ok() -> int { return 2; }",
            None,
            &mut interner,
        );
        assert!(!diags.is_empty());
        assert!(module.items.iter().any(|item| matches!(
            item,
            RawItem::Function(f) if interner.resolve(f.name) == "ok"
        )));
    }
}
