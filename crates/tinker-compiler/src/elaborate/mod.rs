//! The elaborator.
//!
//! Two-phase elaboration of every declaration kind: `declare_*` registers a
//! name and resolves its declared type only, `define_*` elaborates its
//! initializer or body. A module runs phase 1 over every top-level
//! declaration before running phase 2 over any of them (records are even
//! pre-registered ahead of that, by name and self-type, so a function may
//! take a by-reference parameter of a record declared later in the same
//! module); this ordering is what admits mutual recursion between
//! functions, and between a function and a record defined later in the
//! same module. A record's own fields and methods follow the same
//! declare-all-then-define-all shape one level down.
//!
//! A bad subexpression or declaration does not halt its siblings: every
//! checking method has a poisoned fallback (a typed literal for
//! expressions, `None` for unresolved types) so elaboration of the rest of
//! the module continues and every error in the input gets a chance to be
//! reported in one run, per the accumulate-don't-abort design.

pub mod conversion;
pub mod overload;

use tinker_core::decl::{is_derived, member_lookup};
use tinker_core::{
    BinaryOp, ConversionKind, DeclArena, DeclId, DeclKind, Diagnostics, Expr, ExprKind, InitKind,
    Interner, Location, LiteralValue, RawLocalVar, Specifiers, Span, Stmt, StmtKind, Symbol,
    TokenClass, TypeData, TypeExpr, TypeId, TypeStore, UnaryOp,
};

use crate::parser::ast::{RawFunction, RawItem, RawModule, RawRecord, RawVariable};

use overload::Resolution;

/// Everything the elaborator needs to turn one parsed module into a fully
/// typed declaration tree: the shared interner/type-store/arena (also
/// handed to the evaluator afterward), the current lexical scope, an
/// accumulating diagnostics sink, and the source file name for locations.
pub struct Elaborator<'a> {
    interner: &'a mut Interner,
    types: &'a mut TypeStore,
    arena: &'a mut DeclArena,
    scopes: tinker_core::ScopeStack,
    diagnostics: Diagnostics,
    file: Option<String>,
    main: Option<DeclId>,
    this_symbol: Symbol,
}

impl<'a> Elaborator<'a> {
    /// Pushes a scope tagged `tag`, runs `f`, and pops on every exit path
    /// (mirroring `ScopeStack::scoped`, lifted to cover the whole
    /// elaborator rather than just its scope stack, since `f` here also
    /// needs the arena/type-store/diagnostics fields).
    fn with_scope<R>(&mut self, tag: Option<DeclId>, f: impl FnOnce(&mut Self) -> R) -> R {
        struct PopGuard<'b, 'a>(&'b mut Elaborator<'a>);
        impl Drop for PopGuard<'_, '_> {
            fn drop(&mut self) {
                self.0.scopes.pop();
            }
        }
        self.scopes.push(tag);
        let mut guard = PopGuard(self);
        f(guard.0)
    }

    fn error(&mut self, span: Span, message: impl Into<String>) {
        self.diagnostics
            .error(Location::new(self.file.clone(), span), message);
    }

    fn report_admit_error(&mut self, name: Symbol, err: tinker_core::AdmitError) {
        let spelling = self.interner.resolve(name).to_string();
        match err {
            tinker_core::AdmitError::Redefinition(_) => {
                self.error(Span::synthetic(), format!("redefinition of '{spelling}'"))
            }
            tinker_core::AdmitError::DifferentKind(_) => self.error(
                Span::synthetic(),
                format!("'{spelling}' redeclared as a different kind of symbol"),
            ),
            tinker_core::AdmitError::ReturnTypeOnly(_) => self.error(
                Span::synthetic(),
                format!("function '{spelling}' overloads differing only in return type"),
            ),
        }
    }

    fn poison_expr(&mut self, span: Span) -> Expr {
        let ty = self.types.get_integer(tinker_core::IntPrecision::I32, true);
        let expr = Expr::new(ExprKind::Literal(LiteralValue::Integer(0)), span);
        expr.set_ty(ty);
        expr
    }

    // -- type resolution -------------------------------------------------

    /// Resolves a parsed `TypeExpr` to a `TypeId`, folding array extents via
    /// `tinker_eval::reduce` along the way. Takes the `TypeExpr` by value
    /// because `Array`'s extent is a boxed `Expr`, which must be consumed by
    /// `elaborate_expr` (itself by-value, since `Expr` is not `Clone`).
    fn resolve_type_expr(&mut self, ty: TypeExpr) -> TypeId {
        match ty {
            TypeExpr::Bool => self.types.get_boolean(),
            TypeExpr::Char => self.types.get_character(),
            TypeExpr::Int => self.types.get_integer(tinker_core::IntPrecision::I32, true),
            TypeExpr::Float => self.types.get_float(),
            TypeExpr::Double => self.types.get_double(),
            TypeExpr::Named(sym) => match self.resolve_record_ref(sym) {
                Some(decl) => self.types.get_record(decl),
                None => {
                    let spelling = self.interner.resolve(sym).to_string();
                    self.error(
                        Span::synthetic(),
                        format!("unknown type name '{spelling}'"),
                    );
                    self.poison_expr(Span::synthetic()).ty().unwrap()
                }
            },
            TypeExpr::Reference(inner) => {
                let inner_ty = self.resolve_type_expr(*inner);
                self.types.get_reference(inner_ty)
            }
            TypeExpr::Array(elem, extent) => {
                let elem_ty = self.resolve_type_expr(*elem);
                let span = extent.span;
                let extent_expr = self.elaborate_expr(*extent);
                let extent_val = match tinker_eval::reduce(&extent_expr, self.arena, self.types) {
                    Some(folded) => match &folded.kind {
                        ExprKind::Literal(LiteralValue::Integer(n)) if *n >= 0 => *n as u64,
                        _ => {
                            self.error(span, "array extent must be a non-negative integer constant");
                            0
                        }
                    },
                    None => {
                        self.error(span, "array extent is not a constant expression");
                        0
                    }
                };
                self.types.get_array(elem_ty, extent_val)
            }
        }
    }

    /// Looks up `sym` as a record name via unqualified lookup, returning the
    /// record's `DeclId` if found and it really is a record.
    fn resolve_record_ref(&mut self, sym: Symbol) -> Option<DeclId> {
        let found = self.scopes.unqualified_lookup(sym).cloned()?;
        if !found.is_singleton() {
            return None;
        }
        let decl = found.as_slice()[0];
        matches!(self.arena.get(decl).kind, DeclKind::Record { .. }).then_some(decl)
    }

    // -- module driver ----------------------------------------------------

    /// Elaborates one parsed module into a fully typed declaration tree,
    /// returning the module's `DeclId`, the `main` function if one was
    /// found (by the same "function named `main`" convention the reference
    /// elaborator uses), and every diagnostic collected along the way.
    pub fn elaborate_module(
        interner: &mut Interner,
        types: &mut TypeStore,
        arena: &mut DeclArena,
        name: Symbol,
        mut raw: RawModule,
        file: Option<String>,
    ) -> (DeclId, Option<DeclId>, Diagnostics) {
        let this_symbol = interner.intern("this", TokenClass::Identifier);
        let mut elab = Elaborator {
            interner,
            types,
            arena,
            scopes: tinker_core::ScopeStack::new(),
            diagnostics: Diagnostics::new(),
            file,
            main: None,
            this_symbol,
        };

        let module_id = elab.arena.alloc_module(name);
        elab.scopes.push(Some(module_id));

        // Step 1: pre-register every record by name and self-type, so a
        // function declared anywhere in the module may refer to a record
        // declared anywhere else in it.
        let mut record_ids: Vec<Option<DeclId>> = Vec::with_capacity(raw.items.len());
        for item in &raw.items {
            match item {
                RawItem::Record(r) => {
                    let id = elab.arena.alloc_record(r.specifiers, r.name);
                    let ty = elab.types.get_record(id);
                    elab.arena.get(id).set_ty(ty);
                    if let Err(e) = elab.scopes.declare(elab.arena, elab.types, id) {
                        elab.report_admit_error(r.name, e);
                    }
                    record_ids.push(Some(id));
                }
                _ => record_ids.push(None),
            }
        }

        // Step 2: register every function/variable signature, now able to
        // see every record regardless of declaration order.
        let mut decl_ids: Vec<DeclId> = Vec::with_capacity(raw.items.len());
        for (item, rid) in raw.items.iter_mut().zip(record_ids.iter()) {
            let id = match item {
                RawItem::Record(_) => rid.expect("record pre-registered in step 1"),
                RawItem::Function(f) => elab.declare_function(f),
                RawItem::Variable(v) => elab.declare_variable(v),
            };
            decl_ids.push(id);
        }

        // Step 3: define every body/initializer/record shape in file
        // order, now able to see every sibling regardless of declaration
        // order.
        for (item, id) in raw.items.into_iter().zip(decl_ids.iter().copied()) {
            match item {
                RawItem::Function(f) => elab.define_function(id, f),
                RawItem::Variable(v) => elab.define_variable(id, v),
                RawItem::Record(r) => elab.define_record(id, r),
            }
        }

        if let DeclKind::Module { decls } = &elab.arena.get(module_id).kind {
            *decls.borrow_mut() = decl_ids;
        }
        elab.scopes.pop();

        (module_id, elab.main, elab.diagnostics)
    }

    // -- declarations: phase 1 --------------------------------------------

    fn declare_function(&mut self, f: &mut RawFunction) -> DeclId {
        let params: Vec<DeclId> = f
            .params
            .iter_mut()
            .map(|p| {
                let ty = self.resolve_type_expr(std::mem::replace(&mut p.ty, TypeExpr::Bool));
                let id = self.arena.alloc_parameter(p.name);
                self.arena.get(id).set_ty(ty);
                id
            })
            .collect();
        let ret = self.resolve_type_expr(std::mem::replace(&mut f.ret, TypeExpr::Bool));
        let param_tys: Vec<TypeId> = params
            .iter()
            .map(|&p| self.arena.get(p).ty().expect("parameter type just set"))
            .collect();
        let fn_ty = self.types.get_function(param_tys, ret);

        let id = self.arena.alloc_function(f.specifiers, f.name, params);
        self.arena.get(id).set_ty(fn_ty);
        if let Err(e) = self.scopes.declare(self.arena, self.types, id) {
            self.report_admit_error(f.name, e);
        }
        if self.interner.resolve(f.name) == "main" {
            self.main = Some(id);
        }
        id
    }

    fn declare_variable(&mut self, v: &mut RawVariable) -> DeclId {
        let ty = self.resolve_type_expr(std::mem::replace(&mut v.ty, TypeExpr::Bool));
        let id = self.arena.alloc_variable(v.specifiers, v.name);
        self.arena.get(id).set_ty(ty);
        if let Err(e) = self.scopes.declare(self.arena, self.types, id) {
            self.report_admit_error(v.name, e);
        }
        id
    }

    // -- declarations: phase 2 --------------------------------------------

    fn define_function(&mut self, id: DeclId, f: RawFunction) {
        let params = match &self.arena.get(id).kind {
            DeclKind::Function { params, .. } => params.clone(),
            _ => unreachable!("declare_function always allocates a Function decl"),
        };
        let ret_ty = match self.types.data(self.arena.get(id).ty().expect("function has a type")) {
            TypeData::Function { ret, .. } => *ret,
            _ => unreachable!("function decl carries a function type"),
        };

        let body = self.with_scope(Some(id), |elab| {
            for &p in &params {
                if let Err(e) = elab.scopes.declare(elab.arena, elab.types, p) {
                    elab.report_admit_error(elab.arena.get(p).name, e);
                }
            }
            elab.elaborate_function_body(f.body, ret_ty)
        });

        if let DeclKind::Function { body: cell, .. } = &self.arena.get(id).kind {
            *cell.borrow_mut() = Some(body);
        }
    }

    fn define_variable(&mut self, id: DeclId, v: RawVariable) {
        let ty = self.arena.get(id).ty().expect("variable has a type");
        let init = self.elaborate_init(v.init, ty, v.specifiers, Span::synthetic());
        if let DeclKind::Variable { init: cell, .. } = &self.arena.get(id).kind {
            *cell.borrow_mut() = init;
        }
    }

    fn define_record(&mut self, id: DeclId, r: RawRecord) {
        let RawRecord {
            specifiers: _,
            name: _,
            base,
            fields,
            methods,
        } = r;

        let base_decl = base.and_then(|sym| self.resolve_record_ref(sym));
        let base_decl = match base_decl {
            Some(b) if b == id || is_derived(self.arena, b, id) => {
                self.error(Span::synthetic(), "record inheritance forms a cycle");
                None
            }
            other => other,
        };

        let (field_ids, member_ids) = self.with_scope(Some(id), |elab| {
            let field_ids: Vec<DeclId> = fields
                .into_iter()
                .map(|p| {
                    let ty = elab.resolve_type_expr(p.ty);
                    let fid = elab.arena.alloc_field(p.name);
                    elab.arena.get(fid).set_ty(ty);
                    if let Err(e) = elab.scopes.declare(elab.arena, elab.types, fid) {
                        elab.report_admit_error(p.name, e);
                    }
                    fid
                })
                .collect();

            struct Pending {
                id: DeclId,
                body: Stmt,
                params: Vec<DeclId>,
            }
            let mut pending = Vec::with_capacity(methods.len());
            for m in methods {
                let record_ty = elab.arena.get(id).ty().expect("record has a type");
                let this_ty = elab.types.get_reference(record_ty);
                let this_id = elab.arena.alloc_parameter(elab.this_symbol);
                elab.arena.get(this_id).set_ty(this_ty);

                let param_ids: Vec<DeclId> = m
                    .params
                    .into_iter()
                    .map(|p| {
                        let ty = elab.resolve_type_expr(p.ty);
                        let pid = elab.arena.alloc_parameter(p.name);
                        elab.arena.get(pid).set_ty(ty);
                        pid
                    })
                    .collect();
                let ret_ty = elab.resolve_type_expr(m.ret);
                let param_tys: Vec<TypeId> = param_ids
                    .iter()
                    .map(|&p| elab.arena.get(p).ty().expect("parameter type just set"))
                    .collect();
                let fn_ty = elab.types.get_function(param_tys, ret_ty);

                let mid = elab
                    .arena
                    .alloc_method(m.specifiers, m.name, this_id, param_ids.clone());
                elab.arena.get(mid).set_ty(fn_ty);
                if let Err(e) = elab.scopes.declare(elab.arena, elab.types, mid) {
                    elab.report_admit_error(m.name, e);
                }
                pending.push(Pending {
                    id: mid,
                    body: m.body,
                    params: param_ids,
                });
            }

            let member_ids: Vec<DeclId> = pending.iter().map(|p| p.id).collect();

            for p in pending {
                let ret_ty = match elab.types.data(elab.arena.get(p.id).ty().expect("method has a type")) {
                    TypeData::Function { ret, .. } => *ret,
                    _ => unreachable!("method decl carries a function type"),
                };
                let body = elab.with_scope(Some(p.id), |elab| {
                    for &pid in &p.params {
                        if let Err(e) = elab.scopes.declare(elab.arena, elab.types, pid) {
                            elab.report_admit_error(elab.arena.get(pid).name, e);
                        }
                    }
                    elab.elaborate_function_body(p.body, ret_ty)
                });
                if let DeclKind::Method { body: cell, .. } = &elab.arena.get(p.id).kind {
                    *cell.borrow_mut() = Some(body);
                }
            }

            (field_ids, member_ids)
        });

        self.arena.set_record_shape(id, base_decl, field_ids, member_ids);
    }

    // -- statements --------------------------------------------------------

    fn elaborate_function_body(&mut self, body: Stmt, ret_ty: TypeId) -> Stmt {
        self.elaborate_stmt(body, ret_ty)
    }

    fn elaborate_stmt(&mut self, stmt: Stmt, ret_ty: TypeId) -> Stmt {
        let span = stmt.span;
        let kind = match stmt.kind {
            StmtKind::Empty => StmtKind::Empty,
            StmtKind::Block(stmts) => self.with_scope(None, |elab| {
                StmtKind::Block(
                    stmts
                        .into_iter()
                        .map(|s| elab.elaborate_stmt(s, ret_ty))
                        .collect(),
                )
            }),
            StmtKind::Assign(lhs, rhs) => {
                let lhs_span = lhs.span;
                let lhs = self.elaborate_expr(lhs);
                let rhs = self.elaborate_expr(rhs);
                if !self.is_assignable(&lhs) {
                    self.error(lhs_span, "left side of an assignment is not assignable");
                }
                let lhs_ty = lhs.ty().unwrap_or_else(|| self.poison_type_via_int());
                let rhs = match conversion::convert(rhs, lhs_ty, self.types, self.arena) {
                    Ok(rhs) => rhs,
                    Err(rhs) => {
                        self.error(rhs.span, "assigned value's type does not match the target");
                        rhs
                    }
                };
                StmtKind::Assign(lhs, rhs)
            }
            StmtKind::Return(value) => {
                let value = value.map(|v| {
                    let span = v.span;
                    let v = self.elaborate_expr(v);
                    match conversion::convert(v, ret_ty, self.types, self.arena) {
                        Ok(v) => v,
                        Err(v) => {
                            self.error(span, "returned value does not match the function's return type");
                            v
                        }
                    }
                });
                StmtKind::Return(value)
            }
            StmtKind::If(cond, then, otherwise) => {
                let cond = self.require_boolean(cond);
                let then = Box::new(self.elaborate_stmt(*then, ret_ty));
                let otherwise = otherwise.map(|s| Box::new(self.elaborate_stmt(*s, ret_ty)));
                StmtKind::If(cond, then, otherwise)
            }
            StmtKind::While(cond, body) => {
                let cond = self.require_boolean(cond);
                let body = Box::new(self.elaborate_stmt(*body, ret_ty));
                StmtKind::While(cond, body)
            }
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => self.with_scope(None, |elab| {
                let init = init.map(|s| Box::new(elab.elaborate_stmt(*s, ret_ty)));
                let cond = cond.map(|c| elab.require_boolean(c));
                let step = step.map(|s| elab.elaborate_expr(s));
                let body = Box::new(elab.elaborate_stmt(*body, ret_ty));
                StmtKind::For {
                    init,
                    cond,
                    step,
                    body,
                }
            }),
            StmtKind::Break => StmtKind::Break,
            StmtKind::Continue => StmtKind::Continue,
            StmtKind::Expr(e) => StmtKind::Expr(self.elaborate_expr(e)),
            StmtKind::VarDecl(local) => self.elaborate_local_var(local, span),
            StmtKind::Decl(id) => StmtKind::Decl(id),
        };
        Stmt::new(kind, span)
    }

    fn elaborate_local_var(&mut self, local: RawLocalVar, span: Span) -> StmtKind {
        let RawLocalVar {
            specifiers,
            name,
            ty,
            init,
        } = local;
        let ty = self.resolve_type_expr(ty);
        let id = self.arena.alloc_variable(specifiers, name);
        self.arena.get(id).set_ty(ty);
        if let Err(e) = self.scopes.declare(self.arena, self.types, id) {
            self.report_admit_error(name, e);
        }
        let init_expr = self.elaborate_init(init, ty, specifiers, span);
        if let DeclKind::Variable { init: cell } = &self.arena.get(id).kind {
            *cell.borrow_mut() = init_expr;
        }
        StmtKind::Decl(id)
    }

    /// Wraps a declared variable's initializer per its declared type: a
    /// reference type requires a `reference_init` of its initializer (an
    /// error if none was written), any other type gets `copy_init` of its
    /// initializer or, if none was written, `default_init`.
    fn elaborate_init(
        &mut self,
        init: Option<Expr>,
        ty: TypeId,
        _specifiers: Specifiers,
        span: Span,
    ) -> Option<Expr> {
        if self.types.is_reference(ty) {
            let Some(init) = init else {
                self.error(span, "a reference variable requires an initializer");
                return None;
            };
            let init_span = init.span;
            let value = self.elaborate_expr(init);
            let value = match conversion::convert(value, ty, self.types, self.arena) {
                Ok(v) => v,
                Err(v) => {
                    self.error(init_span, "initializer does not match the declared reference type");
                    v
                }
            };
            let wrapped = value.wrap(|e| ExprKind::Init(InitKind::Reference, Some(e)), span);
            wrapped.set_ty(ty);
            Some(wrapped)
        } else {
            match init {
                Some(init) => {
                    let init_span = init.span;
                    let value = self.elaborate_expr(init);
                    let value = match conversion::convert(value, ty, self.types, self.arena) {
                        Ok(v) => v,
                        Err(v) => {
                            self.error(init_span, "initializer does not match the declared type");
                            v
                        }
                    };
                    let wrapped = value.wrap(|e| ExprKind::Init(InitKind::Copy, Some(e)), span);
                    wrapped.set_ty(ty);
                    Some(wrapped)
                }
                None => {
                    let wrapped = Expr::new(ExprKind::Init(InitKind::Default, None), span);
                    wrapped.set_ty(ty);
                    Some(wrapped)
                }
            }
        }
    }

    fn require_boolean(&mut self, cond: Expr) -> Expr {
        let span = cond.span;
        let cond = self.elaborate_expr(cond);
        let boolean = self.types.get_boolean();
        match cond.ty() {
            Some(t) if t == boolean => cond,
            _ => {
                self.error(span, "condition must have type bool");
                cond
            }
        }
    }

    /// Mirrors `tinker_eval::evaluator::eval_place`'s accepted shapes
    /// exactly, so the elaborator never accepts an assignment target the
    /// evaluator would later panic on.
    fn is_assignable(&self, expr: &Expr) -> bool {
        matches!(
            &expr.kind,
            ExprKind::DeclRef(_)
                | ExprKind::Field(..)
                | ExprKind::Index(..)
                | ExprKind::Conversion(ConversionKind::Value, _)
                | ExprKind::Conversion(ConversionKind::Base(_), _)
        )
    }

    fn poison_type_via_int(&mut self) -> TypeId {
        self.types.get_integer(tinker_core::IntPrecision::I32, true)
    }

    // -- expressions --------------------------------------------------------

    fn elaborate_expr(&mut self, expr: Expr) -> Expr {
        let span = expr.span;
        match expr.kind {
            ExprKind::Literal(lit) => self.elaborate_literal(lit, span),
            ExprKind::Id(sym) => self.elaborate_id(sym, span),
            ExprKind::DeclRef(id) => {
                let ty = self.arena.get(id).ty().unwrap_or_else(|| self.poison_type_via_int());
                let e = Expr::new(ExprKind::DeclRef(id), span);
                e.set_ty(ty);
                e
            }
            ExprKind::Unary(op, inner) => self.elaborate_unary(op, *inner, span),
            ExprKind::Binary(op, lhs, rhs) => self.elaborate_binary(op, *lhs, *rhs, span),
            ExprKind::Call(callee, args) => self.elaborate_call(*callee, args, span),
            ExprKind::Field(receiver, field, path) => {
                // Already resolved (only produced by the elaborator itself,
                // never by the parser); re-elaborating would double-set its
                // type, so thread it through unchanged.
                let ty = self.arena.get(field).ty().unwrap_or_else(|| self.poison_type_via_int());
                let e = Expr::new(ExprKind::Field(receiver, field, path), span);
                e.set_ty(ty);
                e
            }
            ExprKind::Member(receiver, member) => self.elaborate_member(*receiver, member, span),
            ExprKind::Index(array, index) => self.elaborate_index(*array, *index, span),
            ExprKind::Conversion(kind, inner) => {
                // Likewise elaborator-only; never parsed directly.
                let inner = self.elaborate_expr(*inner);
                let ty = inner.ty().unwrap_or_else(|| self.poison_type_via_int());
                let e = inner.wrap(|e| ExprKind::Conversion(kind, e), span);
                e.set_ty(ty);
                e
            }
            ExprKind::Init(kind, inner) => {
                let inner = inner.map(|i| Box::new(self.elaborate_expr(*i)));
                let ty = inner
                    .as_ref()
                    .and_then(|i| i.ty())
                    .unwrap_or_else(|| self.poison_type_via_int());
                let e = Expr::new(ExprKind::Init(kind, inner), span);
                e.set_ty(ty);
                e
            }
        }
    }

    fn elaborate_literal(&mut self, lit: LiteralValue, span: Span) -> Expr {
        let ty = match &lit {
            LiteralValue::Boolean(_) => self.types.get_boolean(),
            LiteralValue::Integer(_) => self.types.get_integer(tinker_core::IntPrecision::I32, true),
            LiteralValue::Character(_) => self.types.get_character(),
            LiteralValue::Float(_) => self.types.get_double(),
            LiteralValue::String(s) => {
                let ch = self.types.get_character();
                self.types.get_array(ch, s.chars().count() as u64)
            }
        };
        let e = Expr::new(ExprKind::Literal(lit), span);
        e.set_ty(ty);
        e
    }

    fn elaborate_id(&mut self, sym: Symbol, span: Span) -> Expr {
        let Some(set) = self.scopes.unqualified_lookup(sym).cloned() else {
            let spelling = self.interner.resolve(sym).to_string();
            self.error(span, format!("use of undeclared identifier '{spelling}'"));
            return self.poison_expr(span);
        };
        if !set.is_singleton() {
            let spelling = self.interner.resolve(sym).to_string();
            self.error(
                span,
                format!("'{spelling}' names an overloaded function and cannot be used outside a call"),
            );
            return self.poison_expr(span);
        }
        let decl = set.as_slice()[0];
        match &self.arena.get(decl).kind {
            DeclKind::Field => self.member_access(decl, span),
            DeclKind::Method { .. } => self.member_access(decl, span),
            _ => {
                let ty = self.arena.get(decl).ty().unwrap_or_else(|| self.poison_type_via_int());
                let e = Expr::new(ExprKind::DeclRef(decl), span);
                e.set_ty(ty);
                e
            }
        }
    }

    /// Builds the `Expr` for an implicit `this`, valid only while elaborating
    /// inside a method's own scope.
    fn this_ref(&mut self, span: Span) -> Option<Expr> {
        let fid = self.scopes.function(self.arena)?;
        let this_id = match &self.arena.get(fid).kind {
            DeclKind::Method { implicit_this, .. } => *implicit_this,
            _ => return None,
        };
        let ty = self.arena.get(this_id).ty().expect("implicit this has a type");
        let e = Expr::new(ExprKind::DeclRef(this_id), span);
        e.set_ty(ty);
        Some(e)
    }

    /// Wraps a bare reference to a sibling field or method (found via plain
    /// unqualified lookup, since the record's own scope is still pushed
    /// while its method bodies are being elaborated) as an access through
    /// the implicit `this`.
    fn member_access(&mut self, decl: DeclId, span: Span) -> Expr {
        let Some(this_expr) = self.this_ref(span) else {
            self.error(span, "member reference is only valid inside a method body");
            return self.poison_expr(span);
        };
        match &self.arena.get(decl).kind {
            DeclKind::Field => {
                let record = match self.types.data(self.types.nonref_of(this_expr.ty().unwrap())) {
                    TypeData::Record(r) => *r,
                    _ => unreachable!("implicit this always names a reference to a record"),
                };
                let path = tinker_core::decl::field_access_path(self.arena, record, decl)
                    .unwrap_or_default();
                let ty = self.arena.get(decl).ty().expect("field has a type");
                let e = Expr::new(ExprKind::Field(Box::new(this_expr), decl, path), span);
                e.set_ty(ty);
                e
            }
            DeclKind::Method { .. } => {
                // The evaluator never consults a method callee's path, so
                // this is always empty (see `evaluator::eval_call`).
                let ty = self.arena.get(decl).ty().expect("method has a type");
                let e = Expr::new(ExprKind::Field(Box::new(this_expr), decl, Vec::new()), span);
                e.set_ty(ty);
                e
            }
            _ => unreachable!("member_access called on a non-field, non-method declaration"),
        }
    }

    fn elaborate_unary(&mut self, op: UnaryOp, inner: Expr, span: Span) -> Expr {
        let span_of_inner = inner.span;
        let inner = self.elaborate_expr(inner);
        match op {
            UnaryOp::Neg | UnaryOp::Pos => {
                let int = self.types.get_integer(tinker_core::IntPrecision::I32, true);
                let converted = match conversion::convert(inner, int, self.types, self.arena) {
                    Ok(v) => v,
                    Err(v) => {
                        self.error(span_of_inner, "arithmetic operand must be an integer");
                        v
                    }
                };
                let ty = converted.ty().unwrap_or(int);
                let e = converted.wrap(|e| ExprKind::Unary(op, e), span);
                e.set_ty(ty);
                e
            }
            UnaryOp::Not => {
                let boolean = self.types.get_boolean();
                let converted = match conversion::convert(inner, boolean, self.types, self.arena) {
                    Ok(v) => v,
                    Err(v) => {
                        self.error(span_of_inner, "logical operand must be bool");
                        v
                    }
                };
                let e = converted.wrap(|e| ExprKind::Unary(op, e), span);
                e.set_ty(boolean);
                e
            }
        }
    }

    fn elaborate_binary(&mut self, op: BinaryOp, lhs: Expr, rhs: Expr, span: Span) -> Expr {
        let lhs_span = lhs.span;
        let rhs_span = rhs.span;
        let lhs = self.elaborate_expr(lhs);
        let rhs = self.elaborate_expr(rhs);
        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                let int = self.types.get_integer(tinker_core::IntPrecision::I32, true);
                let lhs = self.require_convert(lhs, int, lhs_span, "arithmetic operand must be an integer");
                let rhs = self.require_convert(rhs, int, rhs_span, "arithmetic operand must be an integer");
                let e = Expr::new(
                    ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)),
                    span,
                );
                e.set_ty(int);
                e
            }
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge
            | BinaryOp::Eq | BinaryOp::Ne => {
                let boolean = self.types.get_boolean();
                let (lhs, rhs) = self.require_same_type(lhs, rhs, lhs_span, rhs_span);
                let e = Expr::new(
                    ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)),
                    span,
                );
                e.set_ty(boolean);
                e
            }
            BinaryOp::And | BinaryOp::Or => {
                let boolean = self.types.get_boolean();
                let lhs = self.require_convert(lhs, boolean, lhs_span, "logical operand must be bool");
                let rhs = self.require_convert(rhs, boolean, rhs_span, "logical operand must be bool");
                let e = Expr::new(
                    ExprKind::Binary(op, Box::new(lhs), Box::new(rhs)),
                    span,
                );
                e.set_ty(boolean);
                e
            }
        }
    }

    fn require_convert(&mut self, expr: Expr, target: TypeId, span: Span, message: &str) -> Expr {
        match conversion::convert(expr, target, self.types, self.arena) {
            Ok(v) => v,
            Err(v) => {
                self.error(span, message);
                v
            }
        }
    }

    /// Converts `rhs` to `lhs`'s type if possible, else the reverse;
    /// reports an error (and leaves both sides unconverted) if neither
    /// direction works.
    fn require_same_type(&mut self, lhs: Expr, rhs: Expr, lhs_span: Span, rhs_span: Span) -> (Expr, Expr) {
        let (Some(lhs_ty), Some(rhs_ty)) = (lhs.ty(), rhs.ty()) else {
            return (lhs, rhs);
        };
        if lhs_ty == rhs_ty {
            return (lhs, rhs);
        }
        match conversion::convert(rhs, lhs_ty, self.types, self.arena) {
            Ok(rhs) => return (lhs, rhs),
            Err(rhs) => match conversion::convert(lhs, rhs_ty, self.types, self.arena) {
                Ok(lhs) => return (lhs, rhs),
                Err(lhs) => {
                    self.error(lhs_span.to(rhs_span), "operand types do not match");
                    (lhs, rhs)
                }
            },
        }
    }

    fn elaborate_index(&mut self, array: Expr, index: Expr, span: Span) -> Expr {
        let array_span = array.span;
        let index_span = index.span;
        let array = self.elaborate_expr(array);
        let index = self.elaborate_expr(index);
        let int = self.types.get_integer(tinker_core::IntPrecision::I32, true);
        let index = self.require_convert(index, int, index_span, "array index must be an integer");

        let elem_ty = match array.ty().map(|t| self.types.nonref_of(t)).map(|t| self.types.data(t).clone()) {
            Some(TypeData::Array { elem, .. }) => Some(elem),
            _ => {
                self.error(array_span, "indexed expression is not an array");
                None
            }
        };
        let ty = elem_ty.unwrap_or(int);
        let e = Expr::new(
            ExprKind::Index(Box::new(array), Box::new(index)),
            span,
        );
        e.set_ty(ty);
        e
    }

    fn elaborate_member(&mut self, receiver: Expr, member: Symbol, span: Span) -> Expr {
        let receiver_span = receiver.span;
        let receiver = self.elaborate_expr(receiver);
        let record = match receiver
            .ty()
            .map(|t| self.types.nonref_of(t))
            .map(|t| self.types.data(t).clone())
        {
            Some(TypeData::Record(r)) => Some(r),
            _ => {
                self.error(receiver_span, "member access requires a record-typed receiver");
                None
            }
        };
        let Some(record) = record else {
            return self.poison_expr(span);
        };
        let spelling = self.interner.resolve(member).to_string();
        let Some(decl) = member_lookup(self.arena, record, member) else {
            self.error(span, format!("no member named '{spelling}' on this record"));
            return self.poison_expr(span);
        };
        match &self.arena.get(decl).kind {
            DeclKind::Field => {
                let path = tinker_core::decl::field_access_path(self.arena, record, decl)
                    .unwrap_or_default();
                let ty = self.arena.get(decl).ty().expect("field has a type");
                let e = Expr::new(ExprKind::Field(Box::new(receiver), decl, path), span);
                e.set_ty(ty);
                e
            }
            DeclKind::Method { .. } => {
                let ty = self.arena.get(decl).ty().expect("method has a type");
                let e = Expr::new(ExprKind::Field(Box::new(receiver), decl, Vec::new()), span);
                e.set_ty(ty);
                e
            }
            _ => unreachable!("member_lookup only ever returns a field or a method"),
        }
    }

    fn elaborate_call(&mut self, callee: Expr, args: Vec<Expr>, span: Span) -> Expr {
        let callee_span = callee.span;
        match callee.kind {
            ExprKind::Id(sym) => self.elaborate_free_call(sym, args, callee_span, span),
            ExprKind::Member(receiver, member) => {
                self.elaborate_method_call(*receiver, member, args, callee_span, span)
            }
            _ => {
                let callee = self.elaborate_expr(callee);
                match callee.ty().map(|t| (*self.types.data(t)).clone()) {
                    Some(TypeData::Function { params, ret }) => {
                        let args = self.elaborate_call_args(args, &params, span);
                        let e = Expr::new(
                            ExprKind::Call(Box::new(callee), args),
                            span,
                        );
                        e.set_ty(ret);
                        e
                    }
                    _ => {
                        self.error(callee_span, "called expression is not callable");
                        self.poison_expr(span)
                    }
                }
            }
        }
    }

    fn elaborate_free_call(&mut self, sym: Symbol, args: Vec<Expr>, callee_span: Span, span: Span) -> Expr {
        let args: Vec<Expr> = args.into_iter().map(|a| self.elaborate_expr(a)).collect();
        let arg_types: Vec<TypeId> = args
            .iter()
            .map(|a| a.ty().unwrap_or_else(|| unreachable!("every argument is elaborated before resolution")))
            .collect();

        let Some(set) = self.scopes.unqualified_lookup(sym).cloned() else {
            let spelling = self.interner.resolve(sym).to_string();
            self.error(callee_span, format!("use of undeclared identifier '{spelling}'"));
            return self.poison_expr(span);
        };
        match overload::resolve_call(&set, &arg_types, self.arena, self.types) {
            Resolution::Resolved(decl) => self.finish_free_call(decl, args, callee_span, span),
            Resolution::NoMatch => {
                self.error(callee_span, "no matching overload for this call");
                self.poison_expr(span)
            }
            Resolution::Ambiguous(_) => {
                self.error(callee_span, "call is ambiguous between multiple overloads");
                self.poison_expr(span)
            }
        }
    }

    fn finish_free_call(&mut self, decl: DeclId, args: Vec<Expr>, callee_span: Span, span: Span) -> Expr {
        let ret = overload::return_type(decl, self.arena, self.types).unwrap_or_else(|| self.poison_type_via_int());
        let params = match self.types.data(self.arena.get(decl).ty().expect("callee has a type")) {
            TypeData::Function { params, .. } => params.clone(),
            _ => Vec::new(),
        };
        let converted = conversion::convert_args(args, &params, self.types, self.arena);
        let args: Vec<Expr> = converted
            .into_iter()
            .map(|a| a.unwrap_or_else(|| self.poison_expr(callee_span)))
            .collect();
        let callee_ty = self.arena.get(decl).ty().expect("callee has a type");
        let callee_expr = Expr::new(ExprKind::DeclRef(decl), callee_span);
        callee_expr.set_ty(callee_ty);
        let e = Expr::new(ExprKind::Call(Box::new(callee_expr), args), span);
        e.set_ty(ret);
        e
    }

    fn elaborate_method_call(
        &mut self,
        receiver: Expr,
        member: Symbol,
        args: Vec<Expr>,
        callee_span: Span,
        span: Span,
    ) -> Expr {
        let receiver_span = receiver.span;
        let receiver = self.elaborate_expr(receiver);
        let record = match receiver
            .ty()
            .map(|t| self.types.nonref_of(t))
            .map(|t| self.types.data(t).clone())
        {
            Some(TypeData::Record(r)) => Some(r),
            _ => {
                self.error(receiver_span, "method call requires a record-typed receiver");
                None
            }
        };
        let args: Vec<Expr> = args.into_iter().map(|a| self.elaborate_expr(a)).collect();
        let Some(record) = record else {
            return self.poison_expr(span);
        };

        let spelling = self.interner.resolve(member).to_string();
        let Some(decl) = member_lookup(self.arena, record, member) else {
            self.error(callee_span, format!("no method named '{spelling}' on this record"));
            return self.poison_expr(span);
        };
        if !matches!(self.arena.get(decl).kind, DeclKind::Method { .. }) {
            self.error(callee_span, format!("'{spelling}' is not a method"));
            return self.poison_expr(span);
        }

        let params = match self.types.data(self.arena.get(decl).ty().expect("method has a type")) {
            TypeData::Function { params, .. } => params.clone(),
            _ => Vec::new(),
        };
        let arg_types: Vec<TypeId> = args.iter().map(|a| a.ty().unwrap()).collect();
        if params.len() != arg_types.len()
            || !params
                .iter()
                .zip(arg_types.iter())
                .all(|(&p, &a)| p == a || conversion::convertible(a, p, self.types, self.arena))
        {
            self.error(callee_span, "no matching overload for this method call");
            return self.poison_expr(span);
        }

        let ret = match self.types.data(self.arena.get(decl).ty().expect("method has a type")) {
            TypeData::Function { ret, .. } => *ret,
            _ => unreachable!(),
        };
        let converted = conversion::convert_args(args, &params, self.types, self.arena);
        let args: Vec<Expr> = converted
            .into_iter()
            .map(|a| a.unwrap_or_else(|| self.poison_expr(callee_span)))
            .collect();

        let method_ty = self.arena.get(decl).ty().expect("method has a type");
        let field_expr = Expr::new(ExprKind::Field(Box::new(receiver), decl, Vec::new()), callee_span);
        field_expr.set_ty(method_ty);

        let e = Expr::new(ExprKind::Call(Box::new(field_expr), args), span);
        e.set_ty(ret);
        e
    }

    fn elaborate_call_args(&mut self, args: Vec<Expr>, params: &[TypeId], span: Span) -> Vec<Expr> {
        let args: Vec<Expr> = args.into_iter().map(|a| self.elaborate_expr(a)).collect();
        let converted = conversion::convert_args(args, params, self.types, self.arena);
        converted
            .into_iter()
            .map(|a| a.unwrap_or_else(|| self.poison_expr(span)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;

    fn elaborate(source: &str) -> (DeclArena, TypeStore, Option<DeclId>, Diagnostics) {
        let mut interner = Interner::new();
        let (raw, parse_diags) = parse(source, None, &mut interner);
        let mut types = TypeStore::new();
        let mut arena = DeclArena::new();
        let module_name = interner.intern("module", TokenClass::Identifier);
        let (_module, main, mut diags) =
            Elaborator::elaborate_module(&mut interner, &mut types, &mut arena, module_name, raw, None);
        diags.extend(parse_diags);
        (arena, types, main, diags)
    }

    #[test]
    fn mutually_recursive_functions_elaborate_without_errors() {
        let source = "
            def is_even(n: int) -> bool { if (n == 0) return true; else return is_odd(n - 1); }
            def is_odd(n: int) -> bool { if (n == 0) return false; else return is_even(n - 1); }
        ";
        let (_, _, _, diags) = elaborate(source);
        assert!(!diags.has_errors(), "{:?}", diags.as_slice());
    }

    #[test]
    fn function_may_take_a_record_declared_later_in_the_module() {
        let source = "
            def make(p: Point) -> int { return p.x; }
            record Point { x: int; y: int; }
        ";
        let (_, _, _, diags) = elaborate(source);
        assert!(!diags.has_errors(), "{:?}", diags.as_slice());
    }

    #[test]
    fn derived_field_access_path_walks_the_base_chain() {
        let source = "
            record Base { x: int; }
            record Derived extends Base { y: int; }
            def read(d: Derived) -> int { return d.x; }
        ";
        let (arena, _, _, diags) = elaborate(source);
        assert!(!diags.has_errors(), "{:?}", diags.as_slice());
        let _ = arena;
    }

    #[test]
    fn functions_differing_only_in_return_type_are_diagnosed() {
        let source = "
            def f() -> int { return 0; }
            def f() -> bool { return true; }
        ";
        let (_, _, _, diags) = elaborate(source);
        assert!(diags.has_errors());
    }

    #[test]
    fn assigning_to_a_non_assignable_expression_is_diagnosed() {
        let source = "def main() -> int { 1 = 2; return 0; }";
        let (_, _, _, diags) = elaborate(source);
        assert!(diags.has_errors());
    }

    #[test]
    fn returning_a_mismatched_type_is_diagnosed() {
        let source = "def f(x: int) -> bool { return x; }";
        let (_, _, _, diags) = elaborate(source);
        assert!(diags.has_errors());
    }

    #[test]
    fn method_call_resolves_through_member_lookup() {
        let source = "
            record Counter {
                value: int;
                def get() -> int { return value; }
            }
            def use_it(c: Counter) -> int { return c.get(); }
        ";
        let (_, _, _, diags) = elaborate(source);
        assert!(!diags.has_errors(), "{:?}", diags.as_slice());
    }

    #[test]
    fn main_is_recorded_when_present() {
        let source = "def main() -> int { return 0; }";
        let (_, _, main, diags) = elaborate(source);
        assert!(!diags.has_errors());
        assert!(main.is_some());
    }
}
