//! The implicit conversion engine.
//!
//! All type-level decisions are factored into [`conversion_path`], which
//! answers "can `current` convert to `target`, and via which steps" without
//! touching any expression node. [`convert`] is the only function that
//! builds the wrapped `Conversion` expression nodes the elaborator actually
//! installs; overload resolution calls [`convertible`] to test candidates
//! without consuming the argument expressions it hasn't committed to yet.

use tinker_core::decl::base_distance;
use tinker_core::{ConversionKind, DeclArena, Expr, ExprKind, TypeData, TypeId, TypeStore};

/// The sequence of conversion steps from `current` to `target`, or `None` if
/// no path exists. An empty vector means `current == target` already.
fn conversion_path(
    current: TypeId,
    target: TypeId,
    types: &TypeStore,
    arena: &DeclArena,
) -> Option<Vec<ConversionKind>> {
    if current == target {
        return Some(Vec::new());
    }

    let mut steps = Vec::new();
    let mut current = current;

    if !types.is_reference(target) {
        if let TypeData::Reference(inner) = types.data(current) {
            current = *inner;
            steps.push(ConversionKind::Value);
            if current == target {
                return Some(steps);
            }
        }
    }

    if let TypeData::Block(block_elem) = types.data(target) {
        let block_elem = *block_elem;
        if let TypeData::Array { elem, .. } = types.data(current) {
            if *elem == block_elem {
                steps.push(ConversionKind::Block);
                return Some(steps);
            }
        }
    }

    if let TypeData::Reference(referent) = types.data(target) {
        if let TypeData::Record(r) = types.data(*referent) {
            let r = *r;
            if let TypeData::Record(d) = types.data(current) {
                let d = *d;
                let path = if d == r {
                    Some(vec![0u32])
                } else {
                    base_distance(arena, d, r).map(|hops| vec![0u32; hops as usize])
                };
                if let Some(path) = path {
                    steps.push(ConversionKind::Base(path));
                    return Some(steps);
                }
            }
        }
    }

    if types.is_numeric(target) {
        let promotes = match (types.data(current), types.data(target)) {
            (TypeData::Character, TypeData::Integer { .. } | TypeData::Float | TypeData::Double) => {
                true
            }
            (
                TypeData::Integer {
                    precision: p1,
                    signed: s1,
                },
                TypeData::Integer {
                    precision: p2,
                    signed: s2,
                },
            ) => p2.bits() > p1.bits() || (p1 == p2 && !*s1 && *s2),
            (TypeData::Float, TypeData::Double) => true,
            _ => false,
        };
        if promotes {
            steps.push(ConversionKind::Promotion);
            return Some(steps);
        }
    }

    None
}

/// True if `current` converts to `target` by some path, without building
/// anything. Used by overload resolution to test a candidate's parameters
/// against already-elaborated argument types.
pub fn convertible(current: TypeId, target: TypeId, types: &TypeStore, arena: &DeclArena) -> bool {
    conversion_path(current, target, types, arena).is_some()
}

/// Converts `expr` to `target`, wrapping it in one `Conversion` node per
/// step in the path. Returns the original expression back on failure so the
/// caller retains its span for diagnostics.
pub fn convert(expr: Expr, target: TypeId, types: &TypeStore, arena: &DeclArena) -> Result<Expr, Expr> {
    let Some(current) = expr.ty() else {
        return Err(expr);
    };
    let Some(steps) = conversion_path(current, target, types, arena) else {
        return Err(expr);
    };

    let mut result = expr;
    let mut current = current;
    for step in steps {
        let span = result.span;
        let next = match &step {
            ConversionKind::Value => match types.data(current) {
                TypeData::Reference(inner) => *inner,
                _ => unreachable!("Value conversion step recorded for a non-reference type"),
            },
            ConversionKind::Block | ConversionKind::Base(_) | ConversionKind::Promotion => target,
        };
        result = result.wrap(|e| ExprKind::Conversion(step, e), span);
        result.set_ty(next);
        current = next;
    }
    Ok(result)
}

/// Converts each argument to the corresponding parameter type. An arity
/// mismatch yields a result the length of `args` (not `params`), every
/// element `None`, so callers can still report one diagnostic per supplied
/// argument.
pub fn convert_args(
    args: Vec<Expr>,
    params: &[TypeId],
    types: &TypeStore,
    arena: &DeclArena,
) -> Vec<Option<Expr>> {
    if args.len() != params.len() {
        return args.into_iter().map(|_| None).collect();
    }
    args.into_iter()
        .zip(params.iter())
        .map(|(arg, &param_ty)| convert(arg, param_ty, types, arena).ok())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinker_core::{DeclArena, ExprKind, IntPrecision, LiteralValue, Span, TypeStore};

    #[test]
    fn identical_types_need_no_conversion() {
        let mut types = TypeStore::new();
        let arena = DeclArena::new();
        let int = types.get_integer(IntPrecision::I32, true);
        let expr = Expr::new(ExprKind::Literal(LiteralValue::Integer(1)), Span::synthetic());
        expr.set_ty(int);
        let converted = convert(expr, int, &types, &arena).unwrap();
        assert!(matches!(converted.kind, ExprKind::Literal(_)));
    }

    #[test]
    fn character_promotes_to_integer() {
        let mut types = TypeStore::new();
        let arena = DeclArena::new();
        let ch = types.get_character();
        let int = types.get_integer(IntPrecision::I32, true);
        let expr = Expr::new(ExprKind::Literal(LiteralValue::Character('a')), Span::synthetic());
        expr.set_ty(ch);
        let converted = convert(expr, int, &types, &arena).unwrap();
        assert_eq!(converted.ty(), Some(int));
        assert!(matches!(
            converted.kind,
            ExprKind::Conversion(ConversionKind::Promotion, _)
        ));
    }

    #[test]
    fn nothing_converts_to_character() {
        let mut types = TypeStore::new();
        let arena = DeclArena::new();
        let ch = types.get_character();
        let int = types.get_integer(IntPrecision::I32, true);
        let expr = Expr::new(ExprKind::Literal(LiteralValue::Integer(1)), Span::synthetic());
        expr.set_ty(int);
        assert!(convert(expr, ch, &types, &arena).is_err());
    }

    #[test]
    fn reference_dereferences_to_its_referent() {
        let mut types = TypeStore::new();
        let arena = DeclArena::new();
        let int = types.get_integer(IntPrecision::I32, true);
        let rint = types.get_reference(int);
        let expr = Expr::new(ExprKind::Literal(LiteralValue::Integer(1)), Span::synthetic());
        expr.set_ty(rint);
        let converted = convert(expr, int, &types, &arena).unwrap();
        assert_eq!(converted.ty(), Some(int));
        assert!(matches!(
            converted.kind,
            ExprKind::Conversion(ConversionKind::Value, _)
        ));
    }

    #[test]
    fn argument_arity_mismatch_yields_all_none_at_argument_length() {
        let types = TypeStore::new();
        let arena = DeclArena::new();
        let expr = Expr::new(ExprKind::Literal(LiteralValue::Integer(1)), Span::synthetic());
        let results = convert_args(vec![expr], &[], &types, &arena);
        assert_eq!(results.len(), 1);
        assert!(results[0].is_none());
    }
}
