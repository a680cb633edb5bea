//! End-to-end scenarios running the whole pipeline: source text through
//! [`tinker_compiler::translate`] into an elaborated tree, then through
//! [`tinker_eval::Evaluator::exec`] to a final value or runtime error.
//!
//! Each test here corresponds to one of the worked scenarios this
//! repository's specification lists as testable properties: a source
//! program and its expected result or diagnostic.

use tinker_compiler::translate;
use tinker_core::{DeclArena, Interner, TypeStore, Value};
use tinker_eval::{Evaluator, RuntimeErrorKind};

fn run(source: &str) -> Result<Value, tinker_eval::RuntimeError> {
    let mut interner = tinker_core::interner::seed();
    let mut types = TypeStore::new();
    let mut arena = DeclArena::new();
    let name = interner.intern("program", tinker_core::TokenClass::Identifier);
    let (module, main, diagnostics) =
        translate(source, Some("program.bkr".to_string()), &mut interner, &mut types, &mut arena, name);
    assert!(!diagnostics.has_errors(), "unexpected diagnostics: {:?}", diagnostics.as_slice());
    let main = main.expect("program declares a main function");
    let mut evaluator = Evaluator::new(&arena, &types);
    evaluator.exec(module, main)
}

fn diagnostics_for(source: &str) -> tinker_core::Diagnostics {
    let mut interner = tinker_core::interner::seed();
    let mut types = TypeStore::new();
    let mut arena = DeclArena::new();
    let name = interner.intern("program", tinker_core::TokenClass::Identifier);
    let (_module, _main, diagnostics) =
        translate(source, None, &mut interner, &mut types, &mut arena, name);
    diagnostics
}

#[test]
fn arithmetic_respects_operator_precedence() {
    let result = run("def main() -> int { return 1 + 2 * 3; }").expect("no runtime error");
    assert_eq!(result, Value::Integer(7));
}

#[test]
fn recursive_factorial() {
    let source = "
        def fact(n: int) -> int {
            if (n == 0) return 1;
            else return n * fact(n - 1);
        }
        def main() -> int { return fact(5); }
    ";
    let result = run(source).expect("no runtime error");
    assert_eq!(result, Value::Integer(120));
}

#[test]
fn while_loop_counts_to_ten() {
    let source = "
        def main() -> int {
            var x: int = 0;
            while (x < 10) x = x + 1;
            return x;
        }
    ";
    let result = run(source).expect("no runtime error");
    assert_eq!(result, Value::Integer(10));
}

#[test]
fn division_by_zero_is_a_runtime_error() {
    let err = run("def main() -> int { return 1 / 0; }").expect_err("division by zero must fail");
    assert_eq!(err.kind, RuntimeErrorKind::DivisionByZero);
}

#[test]
fn returning_an_int_where_bool_is_expected_is_a_type_error() {
    let diagnostics = diagnostics_for("def f(x: int) -> bool { return x; }");
    assert!(diagnostics.has_errors());
}

#[test]
fn overloads_differing_only_in_return_type_are_rejected() {
    let diagnostics = diagnostics_for("def f() -> int { return 0; } def f() -> bool { return true; }");
    assert!(diagnostics.has_errors());
}

#[test]
fn derived_record_reads_a_base_field_through_a_reference() {
    let source = "
        record Base { x: int; }
        record Derived extends Base { y: int; }
        def read(d: Derived) -> int { return d.x; }
        def main() -> int {
            var d: Derived;
            return read(d);
        }
    ";
    let result = run(source).expect("no runtime error");
    assert_eq!(result, Value::Integer(0));
}

#[test]
fn short_circuit_and_skips_the_right_operand() {
    let source = "
        def boom() -> bool { return 1 / 0 == 0; }
        def main() -> int {
            if (false && boom()) return 1;
            return 0;
        }
    ";
    let result = run(source).expect("the right operand must never evaluate");
    assert_eq!(result, Value::Integer(0));
}

#[test]
fn array_elements_default_to_zero_and_are_indexable() {
    let source = "
        def main() -> int {
            var a: int[3];
            a[0] = 10;
            a[1] = 20;
            return a[0] + a[1] + a[2];
        }
    ";
    let result = run(source).expect("no runtime error");
    assert_eq!(result, Value::Integer(30));
}

#[test]
fn short_circuit_or_skips_the_right_operand() {
    let source = "
        def boom() -> bool { return 1 / 0 == 0; }
        def main() -> int {
            if (true || boom()) return 1;
            return 0;
        }
    ";
    let result = run(source).expect("the right operand must never evaluate");
    assert_eq!(result, Value::Integer(1));
}
