//! The canonical type store.
//!
//! Every type in a translation is built through [`TypeStore`], which
//! uniques structurally-equal types to one [`TypeId`] so that type equality
//! anywhere in the compiler is just `TypeId` equality. Canonicalization uses
//! a `BTreeMap` keyed on [`TypeData`] itself: `TypeData`'s derived `Ord`
//! orders first by variant discriminant and then lexicographically over each
//! variant's fields, which is exactly the "total ordering over type
//! structures" the canonicalization scheme needs.

use std::collections::BTreeMap;

use crate::decl::DeclId;
use crate::expr::Expr;
use crate::interner::Symbol;

/// A uniqued type. Two `TypeId`s are equal iff the types they name are
/// structurally equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TypeId(u32);

impl TypeId {
    pub fn as_u32(self) -> u32 {
        self.0
    }
}

/// Integer bit width. The language supports the widths the original's
/// `Integer_type` parametrizes over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum IntPrecision {
    I8,
    I16,
    I32,
    I64,
    I128,
}

impl IntPrecision {
    /// Ordering used for promotion: a precision promotes to any strictly
    /// greater one.
    pub fn bits(self) -> u32 {
        match self {
            IntPrecision::I8 => 8,
            IntPrecision::I16 => 16,
            IntPrecision::I32 => 32,
            IntPrecision::I64 => 64,
            IntPrecision::I128 => 128,
        }
    }
}

/// The structural shape of a type. Variant order here is significant: it is
/// the discriminant `TypeData::Ord` ties break on, and the chosen order
/// (scalars before compounds) has no semantic meaning beyond giving the
/// canonicalization map a stable, deterministic key space.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeData {
    Boolean,
    Character,
    Integer { precision: IntPrecision, signed: bool },
    Float,
    Double,
    /// `function(param_types, return_type)`.
    Function { params: Vec<TypeId>, ret: TypeId },
    /// `array(element, extent)`; extent is a resolved constant, not the
    /// expression that produced it (the expression, if any, stays attached
    /// to the declaration that introduced the array for diagnostics).
    Array { elem: TypeId, extent: u64 },
    /// `block(element)` — an unbounded, pointer-like view produced by
    /// array-to-block decay.
    Block(TypeId),
    /// `reference(referent)`. Never nests: [`TypeStore::get_reference`]
    /// collapses `reference(reference(t))` to `reference(t)`.
    Reference(TypeId),
    /// `record(decl)` — identity is the declaration, not field structure.
    Record(DeclId),
    /// Placeholder for a not-yet-resolved named type, replaced during
    /// elaboration by the type of the declaration the name resolves to.
    Id(Symbol),
}

/// Canonical constructor and cache for every type in a translation.
#[derive(Debug, Default)]
pub struct TypeStore {
    arena: Vec<TypeData>,
    canon: BTreeMap<TypeData, TypeId>,
}

impl TypeStore {
    pub fn new() -> Self {
        Self {
            arena: Vec::new(),
            canon: BTreeMap::new(),
        }
    }

    fn intern(&mut self, data: TypeData) -> TypeId {
        if let Some(&id) = self.canon.get(&data) {
            return id;
        }
        let id = TypeId(self.arena.len() as u32);
        self.arena.push(data.clone());
        self.canon.insert(data, id);
        id
    }

    pub fn data(&self, id: TypeId) -> &TypeData {
        &self.arena[id.as_u32() as usize]
    }

    pub fn get_boolean(&mut self) -> TypeId {
        self.intern(TypeData::Boolean)
    }

    pub fn get_character(&mut self) -> TypeId {
        self.intern(TypeData::Character)
    }

    pub fn get_integer(&mut self, precision: IntPrecision, signed: bool) -> TypeId {
        self.intern(TypeData::Integer { precision, signed })
    }

    pub fn get_float(&mut self) -> TypeId {
        self.intern(TypeData::Float)
    }

    pub fn get_double(&mut self) -> TypeId {
        self.intern(TypeData::Double)
    }

    pub fn get_function(&mut self, params: Vec<TypeId>, ret: TypeId) -> TypeId {
        self.intern(TypeData::Function { params, ret })
    }

    pub fn get_array(&mut self, elem: TypeId, extent: u64) -> TypeId {
        self.intern(TypeData::Array { elem, extent })
    }

    pub fn get_block(&mut self, elem: TypeId) -> TypeId {
        self.intern(TypeData::Block(elem))
    }

    /// Returns `reference(t)`, collapsing nested references so that
    /// `reference(t)` is always exactly one level deep.
    pub fn get_reference(&mut self, t: TypeId) -> TypeId {
        if let TypeData::Reference(_) = self.data(t) {
            return t;
        }
        self.intern(TypeData::Reference(t))
    }

    pub fn get_record(&mut self, decl: DeclId) -> TypeId {
        self.intern(TypeData::Record(decl))
    }

    pub fn get_id(&mut self, sym: Symbol) -> TypeId {
        self.intern(TypeData::Id(sym))
    }

    /// `t.ref()`: `reference(t)` unchanged, anything else wrapped.
    pub fn ref_of(&mut self, t: TypeId) -> TypeId {
        self.get_reference(t)
    }

    /// `t.nonref()`: strips one level of reference, otherwise identity.
    pub fn nonref_of(&self, t: TypeId) -> TypeId {
        match self.data(t) {
            TypeData::Reference(inner) => *inner,
            _ => t,
        }
    }

    pub fn is_reference(&self, t: TypeId) -> bool {
        matches!(self.data(t), TypeData::Reference(_))
    }

    pub fn is_numeric(&self, t: TypeId) -> bool {
        matches!(
            self.data(t),
            TypeData::Integer { .. } | TypeData::Float | TypeData::Double
        )
    }

    /// Record and array types only — a block is a decayed, pointer-like
    /// view of a sequence, not an aggregate itself.
    pub fn is_aggregate(&self, t: TypeId) -> bool {
        matches!(self.data(t), TypeData::Record(_) | TypeData::Array { .. })
    }

    pub fn is_scalar(&self, t: TypeId) -> bool {
        !self.is_aggregate(t)
    }

    pub fn is_string(&self, t: TypeId) -> bool {
        matches!(self.data(t), TypeData::Array { elem, .. } if matches!(self.data(*elem), TypeData::Character))
    }
}

/// A type as written in source, before resolution to a [`TypeId`].
///
/// This is the one piece of the pre-elaboration tree that the parser and
/// the elaborator both need to name: a parameter, field, or local variable
/// carries a `TypeExpr` from parse time, and the elaborator resolves it
/// (via `get_id` lookup, `reduce`-ing the array extent, and so on) into the
/// `TypeId` it caches on the owning declaration.
#[derive(Debug, Clone)]
pub enum TypeExpr {
    Bool,
    Char,
    Int,
    Float,
    Double,
    /// A named type: in practice always a record name, since built-ins
    /// have their own variants above.
    Named(Symbol),
    Reference(Box<TypeExpr>),
    /// `extent` is a constant expression, evaluated by the elaborator via
    /// `reduce` before the array type can be constructed.
    Array(Box<TypeExpr>, Box<Expr>),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_accessors_are_canonical() {
        let mut store = TypeStore::new();
        let a = store.get_boolean();
        let b = store.get_boolean();
        assert_eq!(a, b);
    }

    #[test]
    fn integer_types_are_distinguished_by_precision_and_signedness() {
        let mut store = TypeStore::new();
        let i32s = store.get_integer(IntPrecision::I32, true);
        let i32u = store.get_integer(IntPrecision::I32, false);
        let i64s = store.get_integer(IntPrecision::I64, true);
        assert_ne!(i32s, i32u);
        assert_ne!(i32s, i64s);
        assert_eq!(i32s, store.get_integer(IntPrecision::I32, true));
    }

    #[test]
    fn reference_does_not_nest() {
        let mut store = TypeStore::new();
        let int = store.get_integer(IntPrecision::I32, true);
        let r1 = store.get_reference(int);
        let r2 = store.get_reference(r1);
        assert_eq!(r1, r2);
        assert_eq!(store.nonref_of(r1), int);
        assert_eq!(store.nonref_of(int), int);
    }

    #[test]
    fn function_types_are_canonical_on_structure() {
        let mut store = TypeStore::new();
        let int = store.get_integer(IntPrecision::I32, true);
        let boolean = store.get_boolean();
        let f1 = store.get_function(vec![int], boolean);
        let f2 = store.get_function(vec![int], boolean);
        let f3 = store.get_function(vec![boolean], boolean);
        assert_eq!(f1, f2);
        assert_ne!(f1, f3);
    }

    #[test]
    fn aggregate_excludes_block_and_reference() {
        let mut store = TypeStore::new();
        let ch = store.get_character();
        let arr = store.get_array(ch, 4);
        let block = store.get_block(ch);
        assert!(store.is_aggregate(arr));
        assert!(!store.is_aggregate(block));
        assert!(store.is_scalar(block));
    }

    #[test]
    fn is_string_detects_character_arrays_only() {
        let mut store = TypeStore::new();
        let ch = store.get_character();
        let int = store.get_integer(IntPrecision::I32, true);
        let str_ty = store.get_array(ch, 5);
        let int_arr = store.get_array(int, 5);
        assert!(store.is_string(str_ty));
        assert!(!store.is_string(int_arr));
    }
}
