//! The tree-walking evaluator.
//!
//! Implements the stack-of-stores model: one append-only [`Store`] of value
//! slots, and a stack of [`Frame`]s mapping a declaration to the slot
//! holding its current activation's value. `frames[0]` is the persistent
//! module-level frame (bound once, lives for the whole run); every function
//! call pushes one more frame and pops it on return, reclaiming its slots
//! from the store.
//!
//! Every method here that takes an already-elaborated [`Expr`]/[`Stmt`]
//! trusts the elaborator's invariants (every `Id` resolved to a `DeclRef`,
//! every conversion explicit, every call target resolvable) and panics
//! rather than returning an error when one is violated — such a violation
//! is an elaborator bug, not a condition a well-elaborated program can
//! reach. [`RuntimeError`] is reserved for the handful of failures the type
//! system cannot rule out ahead of time: division/remainder by zero, and a
//! function whose control flow falls off the end without returning.

use std::cell::RefCell;
use std::cmp::Ordering;

use tinker_core::decl::{is_global_variable, is_reference};
use tinker_core::{
    BinaryOp, ConversionKind, DeclArena, DeclId, DeclKind, Expr, ExprKind, InitKind, LiteralValue,
    PathStep, Slot, Span, Stmt, StmtKind, TypeData, TypeId, TypeStore, UnaryOp, Value,
};

use crate::control::Control;
use crate::error::{RuntimeError, RuntimeErrorKind};
use crate::frame::Frame;
use crate::place::Place;
use crate::store::Store;

pub struct Evaluator<'a> {
    arena: &'a DeclArena,
    types: &'a TypeStore,
    store: Store,
    frames: Vec<Frame>,
}

impl<'a> Evaluator<'a> {
    pub fn new(arena: &'a DeclArena, types: &'a TypeStore) -> Self {
        Self {
            arena,
            types,
            store: Store::new(),
            frames: vec![Frame::new()],
        }
    }

    /// Binds every global variable in `module`'s declaration list into the
    /// persistent module-level frame. Functions, records, and nested
    /// modules need no runtime binding of their own: they are addressed
    /// directly by `DeclId` wherever they are referenced.
    pub fn eval_module(&mut self, module: DeclId) -> Result<(), RuntimeError> {
        let DeclKind::Module { decls } = &self.arena.get(module).kind else {
            panic!("eval_module called on a non-module declaration");
        };
        for &decl in decls.borrow().iter() {
            if matches!(self.arena.get(decl).kind, DeclKind::Variable { .. }) {
                self.eval_decl(decl)?;
            }
        }
        Ok(())
    }

    /// Re-initializes the module-level store, evaluates every global
    /// variable, then invokes `function` with zero arguments, asserting
    /// that it returns rather than falling off its own end.
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn exec(&mut self, module: DeclId, function: DeclId) -> Result<Value, RuntimeError> {
        self.store = Store::new();
        self.frames = vec![Frame::new()];
        self.eval_module(module)?;
        self.invoke(Span::synthetic(), function, None, &[])
    }

    fn slot_of(&self, decl: DeclId) -> Slot {
        let frame = if is_global_variable(self.arena, decl) {
            &self.frames[0]
        } else {
            self.frames.last().expect("no active frame")
        };
        frame
            .lookup(decl)
            .unwrap_or_else(|| panic!("declaration read before its slot was bound"))
    }

    /// Binds a variable declaration's initializer (or its type's default
    /// value) into a fresh slot in the frame it belongs to: the persistent
    /// module frame for a global, the current call's frame for a local.
    pub fn eval_decl(&mut self, decl: DeclId) -> Result<(), RuntimeError> {
        let DeclKind::Variable { init } = &self.arena.get(decl).kind else {
            panic!("eval_decl called on a non-variable declaration");
        };
        let value = match &*init.borrow() {
            Some(expr) => self.eval_expr(expr)?,
            None => {
                let ty = self
                    .arena
                    .get(decl)
                    .ty()
                    .expect("variable declaration has no elaborated type");
                self.default_value(ty)
            }
        };
        let slot = self.store.alloc(value);
        if is_global_variable(self.arena, decl) {
            self.frames[0].bind(decl, slot);
        } else {
            self.frames.last_mut().expect("no active frame").bind(decl, slot);
        }
        Ok(())
    }

    /// Collapses a [`Place`] to a single [`Slot`]: the place's own slot
    /// when it names a whole object, or a fresh slot holding a snapshot
    /// copy when it names a nested field/element (see the module doc
    /// comment on [`Place`] for why the latter cannot alias).
    fn place_to_slot(&mut self, place: Place) -> Slot {
        if place.steps.is_empty() {
            place.slot
        } else {
            let value = place.get(&self.store);
            self.store.alloc(value)
        }
    }

    pub fn eval_place(&mut self, expr: &Expr) -> Result<Place, RuntimeError> {
        Ok(match &expr.kind {
            ExprKind::DeclRef(decl) => Place {
                slot: self.slot_of(*decl),
                steps: Vec::new(),
            },
            ExprKind::Field(receiver, _field, path) => {
                let mut place = self.eval_place(receiver)?;
                place.steps.extend(path.iter().copied());
                place
            }
            ExprKind::Index(array, index) => {
                let mut place = self.eval_place(array)?;
                let i = self
                    .eval_expr(index)?
                    .as_integer()
                    .expect("index operand was not an integer");
                place.steps.push(PathStep::Index(i as u32));
                place
            }
            ExprKind::Conversion(ConversionKind::Value, inner) => {
                let place = self.eval_place(inner)?;
                let target = place
                    .get(&self.store)
                    .as_reference()
                    .expect("Value conversion source did not hold a reference");
                Place {
                    slot: target,
                    steps: Vec::new(),
                }
            }
            ExprKind::Conversion(ConversionKind::Base(_), inner) => self.eval_place(inner)?,
            _ => panic!("expression does not denote an assignable object"),
        })
    }

    pub fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        Ok(match &expr.kind {
            ExprKind::Literal(lit) => literal_value(lit),
            ExprKind::Id(_) => panic!("unresolved identifier expression reached the evaluator"),
            ExprKind::DeclRef(decl) => match &self.arena.get(*decl).kind {
                DeclKind::Function { .. } | DeclKind::Method { .. } => Value::Function(*decl),
                _ => self.store.read(self.slot_of(*decl)),
            },
            ExprKind::Unary(op, inner) => self.eval_unary(*op, inner)?,
            ExprKind::Binary(op, lhs, rhs) => self.eval_binary(expr.span, *op, lhs, rhs)?,
            ExprKind::Call(callee, args) => self.eval_call(expr.span, callee, args)?,
            ExprKind::Field(..) | ExprKind::Index(..) => self.eval_place(expr)?.get(&self.store),
            ExprKind::Member(..) => panic!("unresolved member expression reached the evaluator"),
            ExprKind::Conversion(kind, inner) => self.eval_conversion(expr, kind, inner)?,
            ExprKind::Init(kind, inner) => self.eval_init(expr, kind, inner.as_deref())?,
        })
    }

    fn eval_unary(&mut self, op: UnaryOp, inner: &Expr) -> Result<Value, RuntimeError> {
        let value = self.eval_expr(inner)?;
        Ok(match op {
            UnaryOp::Neg => Value::Integer(-value.as_integer().expect("unary '-' on non-integer")),
            UnaryOp::Pos => value,
            UnaryOp::Not => {
                Value::Boolean(!value.as_boolean().expect("unary '!' on non-boolean"))
            }
        })
    }

    fn eval_binary(
        &mut self,
        span: Span,
        op: BinaryOp,
        lhs: &Expr,
        rhs: &Expr,
    ) -> Result<Value, RuntimeError> {
        match op {
            BinaryOp::And => {
                if !self.eval_expr(lhs)?.as_boolean().expect("'&&' on non-boolean") {
                    return Ok(Value::Boolean(false));
                }
                let r = self.eval_expr(rhs)?.as_boolean().expect("'&&' on non-boolean");
                return Ok(Value::Boolean(r));
            }
            BinaryOp::Or => {
                if self.eval_expr(lhs)?.as_boolean().expect("'||' on non-boolean") {
                    return Ok(Value::Boolean(true));
                }
                let r = self.eval_expr(rhs)?.as_boolean().expect("'||' on non-boolean");
                return Ok(Value::Boolean(r));
            }
            _ => {}
        }

        let l = self.eval_expr(lhs)?;
        let r = self.eval_expr(rhs)?;
        Ok(match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem => {
                let a = l.as_integer().expect("arithmetic operand was not an integer");
                let b = r.as_integer().expect("arithmetic operand was not an integer");
                Value::Integer(match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => {
                        if b == 0 {
                            return Err(RuntimeError::new(span, RuntimeErrorKind::DivisionByZero));
                        }
                        a / b
                    }
                    BinaryOp::Rem => {
                        if b == 0 {
                            return Err(RuntimeError::new(span, RuntimeErrorKind::RemainderByZero));
                        }
                        a % b
                    }
                    _ => unreachable!(),
                })
            }
            BinaryOp::Eq => Value::Boolean(l == r),
            BinaryOp::Ne => Value::Boolean(l != r),
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Le | BinaryOp::Ge => {
                let ordering = scalar_cmp(&l, &r).expect("ordering operand was not comparable");
                Value::Boolean(match op {
                    BinaryOp::Lt => ordering == Ordering::Less,
                    BinaryOp::Gt => ordering == Ordering::Greater,
                    BinaryOp::Le => ordering != Ordering::Greater,
                    BinaryOp::Ge => ordering != Ordering::Less,
                    _ => unreachable!(),
                })
            }
            BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
        })
    }

    fn eval_call(&mut self, span: Span, callee: &Expr, args: &[Expr]) -> Result<Value, RuntimeError> {
        if let ExprKind::Field(receiver, member, _path) = &callee.kind {
            if matches!(self.arena.get(*member).kind, DeclKind::Method { .. }) {
                return self.invoke(span, *member, Some(receiver.as_ref()), args);
            }
        }
        let target = self.eval_expr(callee)?;
        let Value::Function(decl) = target else {
            panic!("call target did not resolve to a function value");
        };
        self.invoke(span, decl, None, args)
    }

    /// Binds `receiver` (if this is a method call) and `args` to the
    /// callee's parameters in a fresh frame, evaluates its body, and
    /// returns the carried return value. A control token other than
    /// `Return` when the body finishes is a [`RuntimeErrorKind::MissingReturn`].
    #[tracing::instrument(level = "trace", skip(self, receiver, args))]
    fn invoke(
        &mut self,
        span: Span,
        decl: DeclId,
        receiver: Option<&Expr>,
        args: &[Expr],
    ) -> Result<Value, RuntimeError> {
        let (param_decls, body): (Vec<DeclId>, &RefCell<Option<Stmt>>) =
            match &self.arena.get(decl).kind {
                DeclKind::Function { params, body } => (params.clone(), body),
                DeclKind::Method {
                    implicit_this,
                    params,
                    body,
                } => {
                    let mut all = Vec::with_capacity(params.len() + 1);
                    all.push(*implicit_this);
                    all.extend(params.iter().copied());
                    (all, body)
                }
                _ => panic!("call target is not a callable declaration"),
            };

        let mut frame = Frame::new();
        let mark = self.store.len();
        let mut params = param_decls.into_iter();

        if let Some(receiver_expr) = receiver {
            let this_param = params
                .next()
                .expect("method call target has no implicit receiver parameter");
            let slot = self.bind_argument(this_param, ArgumentSource::Place(receiver_expr))?;
            frame.bind(this_param, slot);
        }

        for (param, arg) in params.zip(args) {
            let slot = self.bind_argument(param, ArgumentSource::Expr(arg))?;
            frame.bind(param, slot);
        }

        self.frames.push(frame);
        let control = self.eval_stmt(
            body.borrow()
                .as_ref()
                .expect("callable declaration has no elaborated body"),
        );
        self.frames.pop();
        self.store.truncate(mark);

        match control? {
            Control::Return(value) => Ok(value),
            _ => Err(RuntimeError::new(span, RuntimeErrorKind::MissingReturn)),
        }
    }

    fn bind_argument(&mut self, param: DeclId, source: ArgumentSource<'_>) -> Result<Slot, RuntimeError> {
        if is_reference(self.arena, self.types, param) {
            let place = match source {
                ArgumentSource::Expr(expr) => self.eval_place(expr)?,
                ArgumentSource::Place(expr) => self.eval_place(expr)?,
            };
            let target = self.place_to_slot(place);
            Ok(self.store.alloc(Value::Reference(target)))
        } else {
            let value = match source {
                ArgumentSource::Expr(expr) => self.eval_expr(expr)?,
                ArgumentSource::Place(expr) => self.eval_place(expr)?.get(&self.store),
            };
            Ok(self.store.alloc(value))
        }
    }

    fn eval_conversion(
        &mut self,
        expr: &Expr,
        kind: &ConversionKind,
        inner: &Expr,
    ) -> Result<Value, RuntimeError> {
        Ok(match kind {
            ConversionKind::Value => {
                let target = self
                    .eval_expr(inner)?
                    .as_reference()
                    .expect("Value conversion source did not hold a reference");
                self.store.read(target)
            }
            ConversionKind::Base(_) => self.eval_expr(inner)?,
            ConversionKind::Block => self.eval_expr(inner)?,
            ConversionKind::Promotion => {
                let value = self.eval_expr(inner)?;
                let target_ty = expr.ty().expect("conversion node has no elaborated type");
                self.promote(target_ty, value)
            }
        })
    }

    fn promote(&self, target: TypeId, value: Value) -> Value {
        match (self.types.data(target), value) {
            (TypeData::Integer { .. }, Value::Character(c)) => Value::Integer(c as i128),
            (TypeData::Integer { .. }, Value::Integer(n)) => Value::Integer(n),
            (TypeData::Float, Value::Character(c)) => Value::Float(c as u32 as f32),
            (TypeData::Double, Value::Character(c)) => Value::Double(c as u32 as f64),
            (TypeData::Float, Value::Integer(n)) => Value::Float(n as f32),
            (TypeData::Double, Value::Integer(n)) => Value::Double(n as f64),
            (TypeData::Double, Value::Float(f)) => Value::Double(f as f64),
            (_, v) => v,
        }
    }

    fn eval_init(
        &mut self,
        expr: &Expr,
        kind: &InitKind,
        inner: Option<&Expr>,
    ) -> Result<Value, RuntimeError> {
        Ok(match kind {
            InitKind::Default => {
                let ty = expr.ty().expect("init node has no elaborated type");
                self.default_value(ty)
            }
            InitKind::Copy => {
                self.eval_expr(inner.expect("copy-init node has no source expression"))?
            }
            InitKind::Reference => {
                let place = self.eval_place(inner.expect("reference-init node has no source expression"))?;
                let target = self.place_to_slot(place);
                Value::Reference(target)
            }
        })
    }

    fn default_value(&mut self, ty: TypeId) -> Value {
        match self.types.data(ty) {
            TypeData::Boolean => Value::zero_boolean(),
            TypeData::Character => Value::zero_character(),
            TypeData::Integer { .. } => Value::zero_integer(),
            TypeData::Float => Value::Float(0.0),
            TypeData::Double => Value::Double(0.0),
            TypeData::Array { elem, extent } => {
                let (elem, extent) = (*elem, *extent);
                let items = (0..extent).map(|_| self.default_value(elem)).collect();
                Value::Array(items)
            }
            TypeData::Record(decl) => self.default_record(*decl),
            TypeData::Reference(_) => {
                panic!("a reference-typed declaration requires an initializer")
            }
            TypeData::Block(_) | TypeData::Function { .. } | TypeData::Id(_) => {
                panic!("not a value-producing type")
            }
        }
    }

    fn default_record(&mut self, decl: DeclId) -> Value {
        let DeclKind::Record { base, fields, .. } = &self.arena.get(decl).kind else {
            panic!("default_record called on a non-record declaration");
        };
        let base_value = base.get().map(|b| Box::new(self.default_record(b)));
        let field_decls: Vec<DeclId> = fields.borrow().clone();
        let fields = field_decls
            .into_iter()
            .map(|f| self.field_default(f))
            .collect();
        Value::Record {
            base: base_value,
            fields,
        }
    }

    fn field_default(&mut self, field: DeclId) -> Value {
        let ty = self
            .arena
            .get(field)
            .ty()
            .expect("field declaration has no elaborated type");
        self.default_value(ty)
    }

    pub fn eval_stmt(&mut self, stmt: &Stmt) -> Result<Control, RuntimeError> {
        Ok(match &stmt.kind {
            StmtKind::Empty => Control::Next,
            StmtKind::Block(stmts) => {
                for s in stmts {
                    let control = self.eval_stmt(s)?;
                    if control != Control::Next {
                        return Ok(control);
                    }
                }
                Control::Next
            }
            StmtKind::Assign(lhs, rhs) => {
                let place = self.eval_place(lhs)?;
                let value = self.eval_expr(rhs)?;
                place.set(&self.store, value);
                Control::Next
            }
            StmtKind::Return(expr) => {
                let value = match expr {
                    Some(e) => self.eval_expr(e)?,
                    None => panic!(
                        "a well-elaborated function always returns a value matching its declared return type"
                    ),
                };
                Control::Return(value)
            }
            StmtKind::If(cond, then_branch, else_branch) => {
                let taken = self
                    .eval_expr(cond)?
                    .as_boolean()
                    .expect("if condition was not boolean");
                if taken {
                    self.eval_stmt(then_branch)?
                } else if let Some(else_branch) = else_branch {
                    self.eval_stmt(else_branch)?
                } else {
                    Control::Next
                }
            }
            StmtKind::While(cond, body) => {
                loop {
                    let keep_going = self
                        .eval_expr(cond)?
                        .as_boolean()
                        .expect("while condition was not boolean");
                    if !keep_going {
                        break Control::Next;
                    }
                    match self.eval_stmt(body)? {
                        Control::Next | Control::Continue => continue,
                        Control::Break => break Control::Next,
                        returned @ Control::Return(_) => break returned,
                    }
                }
            }
            StmtKind::For {
                init,
                cond,
                step,
                body,
            } => {
                if let Some(init) = init {
                    self.eval_stmt(init)?;
                }
                loop {
                    if let Some(cond) = cond {
                        let keep_going = self
                            .eval_expr(cond)?
                            .as_boolean()
                            .expect("for condition was not boolean");
                        if !keep_going {
                            break Control::Next;
                        }
                    }
                    match self.eval_stmt(body)? {
                        Control::Next | Control::Continue => {}
                        Control::Break => break Control::Next,
                        returned @ Control::Return(_) => break returned,
                    }
                    if let Some(step) = step {
                        self.eval_expr(step)?;
                    }
                }
            }
            StmtKind::Break => Control::Break,
            StmtKind::Continue => Control::Continue,
            StmtKind::Expr(expr) => {
                self.eval_expr(expr)?;
                Control::Next
            }
            StmtKind::VarDecl(_) => {
                panic!("unelaborated local variable declaration reached the evaluator")
            }
            StmtKind::Decl(decl) => {
                self.eval_decl(*decl)?;
                Control::Next
            }
        })
    }
}

enum ArgumentSource<'e> {
    Expr(&'e Expr),
    Place(&'e Expr),
}

fn literal_value(lit: &LiteralValue) -> Value {
    match lit {
        LiteralValue::Boolean(b) => Value::Boolean(*b),
        LiteralValue::Integer(n) => Value::Integer(*n),
        LiteralValue::Character(c) => Value::Character(*c),
        LiteralValue::Float(f) => Value::Double(*f),
        LiteralValue::String(s) => {
            Value::Array(s.chars().map(Value::Character).collect())
        }
    }
}

fn scalar_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Integer(a), Value::Integer(b)) => a.partial_cmp(b),
        (Value::Character(a), Value::Character(b)) => a.partial_cmp(b),
        (Value::Float(a), Value::Float(b)) => a.partial_cmp(b),
        (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
        (Value::Boolean(a), Value::Boolean(b)) => a.partial_cmp(b),
        _ => None,
    }
}

/// Attempts to fully evaluate `expr`; on success returns a literal node
/// carrying the result (reusing `expr`'s elaborated type), on any runtime
/// error returns `None` rather than propagating it. Used by the elaborator
/// to fold constant expressions (an array type's extent) at compile time.
pub fn reduce(expr: &Expr, arena: &DeclArena, types: &TypeStore) -> Option<Expr> {
    let ty = expr.ty()?;
    let mut evaluator = Evaluator::new(arena, types);
    let value = evaluator.eval_expr(expr).ok()?;
    let literal = value_to_literal(&value)?;
    let folded = Expr::new(ExprKind::Literal(literal), expr.span);
    folded.set_ty(ty);
    Some(folded)
}

fn value_to_literal(value: &Value) -> Option<LiteralValue> {
    match value {
        Value::Boolean(b) => Some(LiteralValue::Boolean(*b)),
        Value::Integer(n) => Some(LiteralValue::Integer(*n)),
        Value::Character(c) => Some(LiteralValue::Character(*c)),
        Value::Float(f) => Some(LiteralValue::Float(*f as f64)),
        Value::Double(d) => Some(LiteralValue::Float(*d)),
        Value::Error | Value::Function(_) | Value::Reference(_) | Value::Array(_) | Value::Record { .. } => None,
    }
}
