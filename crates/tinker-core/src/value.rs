//! Runtime values.
//!
//! `Value` is shared between the elaborator's constant-folding helper and
//! the tree-walking evaluator (`tinker-eval`), so it lives in `tinker-core`
//! alongside the other data-model types rather than in the evaluator crate
//! itself. A [`Slot`] is an opaque handle into whatever store owns the
//! referent; `tinker-core` does not know about stores (that's an evaluator
//! concern), it only defines the handle type both sides agree on.

use crate::decl::DeclId;

/// An index into a value store. References never nest, so a `Reference`
/// value's slot always names a non-reference value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Slot(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// The result of a failed constant-fold attempt, or a placeholder for
    /// an as-yet-unevaluated slot. Never produced by a successful `eval`.
    Error,
    Boolean(bool),
    Integer(i128),
    Character(char),
    Float(f32),
    Double(f64),
    /// A handle to a function declaration, produced by evaluating a
    /// function-valued identifier.
    Function(DeclId),
    /// A reference to another value's storage slot.
    Reference(Slot),
    Array(Vec<Value>),
    /// A record value: this record's own fields, plus (if the record has a
    /// base) the base's own value nested one level down. A field-access
    /// path (see `tinker_core::decl::field_access_path`) is a sequence of
    /// "descend into the nested base" hops (always present as a bare `0`,
    /// carrying no information beyond its own presence) followed by one
    /// real index into the field-owning record's own `fields` vector here
    /// — so navigating a path is "unwrap `base` `path.len() - 1` times,
    /// then index `fields` by the last element".
    Record {
        base: Option<Box<Value>>,
        fields: Vec<Value>,
    },
}

/// One step of a path navigating into a composite [`Value`].
///
/// `Base`/`Field` steps are produced by
/// [`crate::decl::field_access_path`] at elaboration time and baked into an
/// [`crate::expr::ExprKind::Field`] node; `Index` steps are produced at
/// evaluation time from an [`crate::expr::ExprKind::Index`]'s runtime index
/// value. Chained field/index access (`a.b[i].c`) is just consecutive
/// `ExprKind` nodes each contributing their own steps to one growing path
/// rooted at the same storage slot, so the two kinds of step compose freely.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathStep {
    /// Descend into a record's nested base value.
    Base,
    /// Index into a record's own field vector.
    Field(u32),
    /// Index into an array's elements.
    Index(u32),
}

impl Value {
    pub fn as_integer(&self) -> Option<i128> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<Slot> {
        match self {
            Value::Reference(slot) => Some(*slot),
            _ => None,
        }
    }

    /// The default ("zero") value for a scalar kind, used by default
    /// initialization.
    pub fn zero_integer() -> Value {
        Value::Integer(0)
    }

    pub fn zero_boolean() -> Value {
        Value::Boolean(false)
    }

    pub fn zero_character() -> Value {
        Value::Character('\0')
    }

    /// Walks a [`PathStep`] sequence into `self`, returning the value it
    /// names. An empty path names `self` itself.
    ///
    /// # Panics
    ///
    /// Panics if a step does not match the shape of the value it is applied
    /// to (e.g. a `Field` step against an `Array`, or an out-of-range
    /// index) — a well-elaborated program never produces such a path.
    pub fn navigate(&self, path: &[PathStep]) -> &Value {
        let Some((step, rest)) = path.split_first() else {
            return self;
        };
        let next = match (step, self) {
            (PathStep::Base, Value::Record { base, .. }) => base
                .as_ref()
                .expect("path hops into a record with no base"),
            (PathStep::Field(i), Value::Record { fields, .. }) => &fields[*i as usize],
            (PathStep::Index(i), Value::Array(items)) => &items[*i as usize],
            _ => panic!("path step does not match the shape of this value"),
        };
        next.navigate(rest)
    }

    pub fn navigate_mut(&mut self, path: &[PathStep]) -> &mut Value {
        let Some((step, rest)) = path.split_first() else {
            return self;
        };
        let next = match (step, self) {
            (PathStep::Base, Value::Record { base, .. }) => base
                .as_mut()
                .expect("path hops into a record with no base"),
            (PathStep::Field(i), Value::Record { fields, .. }) => &mut fields[*i as usize],
            (PathStep::Index(i), Value::Array(items)) => &mut items[*i as usize],
            _ => panic!("path step does not match the shape of this value"),
        };
        next.navigate_mut(rest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_path_navigates_through_one_base_hop() {
        let base = Value::Record {
            base: None,
            fields: vec![Value::Integer(7)],
        };
        let derived = Value::Record {
            base: Some(Box::new(base)),
            fields: vec![Value::Integer(9)],
        };
        let path = [PathStep::Base, PathStep::Field(0)];
        assert_eq!(derived.navigate(&path), &Value::Integer(7));
        assert_eq!(derived.navigate(&[PathStep::Field(0)]), &Value::Integer(9));
    }

    #[test]
    fn field_mut_writes_through_the_path() {
        let base = Value::Record {
            base: None,
            fields: vec![Value::Integer(7)],
        };
        let mut derived = Value::Record {
            base: Some(Box::new(base)),
            fields: vec![Value::Integer(9)],
        };
        let path = [PathStep::Base, PathStep::Field(0)];
        *derived.navigate_mut(&path) = Value::Integer(42);
        assert_eq!(derived.navigate(&path), &Value::Integer(42));
    }
}
