//! The compile pipeline: source -> elaborated-and-optionally-evaluated
//! report.
//!
//! No native backend exists, so in place of an object file this reports
//! each top-level declaration's mangled external name
//! (`tinker_compiler::mangle`) and, unless `-c` was given, evaluates `main`
//! and reports its result — the only way a compile invocation can
//! observably do something beyond type-checking without a real linker.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tinker_core::{DeclArena, DeclId, DeclKind, TypeStore};
use tinker_compiler::DiagnosticsExt;
use tinker_eval::Evaluator;

use super::io::load_source;
use crate::cli::DriverParams;

pub fn run(params: &DriverParams) -> i32 {
    let inputs: Vec<Option<PathBuf>> = if params.inputs.is_empty() {
        vec![None]
    } else {
        params.inputs.iter().cloned().map(Some).collect()
    };

    let mut exit_code = 0;
    for input in inputs {
        if !compile_one(input.as_deref(), params) {
            exit_code = 1;
        }
    }
    exit_code
}

#[tracing::instrument(skip(params), fields(input = ?input))]
fn compile_one(input: Option<&std::path::Path>, params: &DriverParams) -> bool {
    let (source, file) = load_source(input);
    let mut interner = tinker_core::interner::seed();
    let mut types = TypeStore::new();
    let mut arena = DeclArena::new();
    let module_name = tinker_compiler::module_name_of(&mut interner, file.as_deref());

    let (module, main, diagnostics) = tinker_compiler::translate(
        &source,
        file.clone(),
        &mut interner,
        &mut types,
        &mut arena,
        module_name,
    );

    if diagnostics.has_errors() {
        let rendered = diagnostics
            .printer()
            .source(&source)
            .colored(params.color.should_colorize())
            .render();
        eprintln!("{rendered}");
        return false;
    }

    let mut report = mangled_report(&arena, &types, &interner, module);

    if !params.compile_only {
        match main {
            Some(main) => match run_main(&arena, &types, module, main) {
                Ok(value) => report.push_str(&format!("main() = {value:?}\n")),
                Err(err) => {
                    eprintln!("error: {err}");
                    return false;
                }
            },
            None => report.push_str("(no main function declared; skipping evaluation)\n"),
        }
    }

    write_report(&report, params.output.as_deref());
    true
}

fn mangled_report(
    arena: &DeclArena,
    types: &TypeStore,
    interner: &tinker_core::Interner,
    module: DeclId,
) -> String {
    let DeclKind::Module { decls } = &arena.get(module).kind else {
        unreachable!("translate() always returns a module declaration");
    };
    let mut report = String::new();
    for decl in decls.borrow().iter() {
        let name = interner.resolve(arena.get(*decl).name);
        let mangled = tinker_compiler::mangle(interner, arena, types, *decl);
        report.push_str(&format!("{name} -> {mangled}\n"));
    }
    report
}

fn run_main(
    arena: &DeclArena,
    types: &TypeStore,
    module: DeclId,
    main: DeclId,
) -> Result<tinker_core::Value, tinker_eval::RuntimeError> {
    let mut evaluator = Evaluator::new(arena, types);
    evaluator.exec(module, main)
}

fn write_report(report: &str, output: Option<&std::path::Path>) {
    match output {
        Some(path) => {
            fs::write(path, report).unwrap_or_else(|e| {
                eprintln!("error: failed to write '{}': {e}", path.display());
                std::process::exit(1);
            });
        }
        None => {
            let _ = std::io::stdout().write_all(report.as_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ColorChoice;

    fn params(compile_only: bool, output: Option<PathBuf>) -> DriverParams {
        DriverParams {
            inputs: Vec::new(),
            output,
            compile_only,
            keep: false,
            verbose: 0,
            color: ColorChoice::Never,
        }
    }

    #[test]
    fn reports_mangled_names_and_evaluates_main_by_default() {
        let dir = std::env::temp_dir();
        let source = dir.join("tinker_compile_test_input.bkr");
        let output = dir.join("tinker_compile_test_output.txt");
        fs::write(&source, "def main() -> int { return 1 + 2 * 3; }").unwrap();

        let ok = compile_one(Some(&source), &params(false, Some(output.clone())));
        assert!(ok);
        let report = fs::read_to_string(&output).unwrap();
        assert!(report.contains("main -> "));
        assert!(report.contains("main() = Integer(7)"));

        let _ = fs::remove_file(&source);
        let _ = fs::remove_file(&output);
    }

    #[test]
    fn compile_only_skips_evaluation() {
        let dir = std::env::temp_dir();
        let source = dir.join("tinker_compile_test_c_only.bkr");
        let output = dir.join("tinker_compile_test_c_only_output.txt");
        fs::write(&source, "def main() -> int { return 0; }").unwrap();

        let ok = compile_one(Some(&source), &params(true, Some(output.clone())));
        assert!(ok);
        let report = fs::read_to_string(&output).unwrap();
        assert!(!report.contains("main() ="));

        let _ = fs::remove_file(&source);
        let _ = fs::remove_file(&output);
    }

    #[test]
    fn division_by_zero_at_runtime_fails_the_pipeline() {
        let dir = std::env::temp_dir();
        let source = dir.join("tinker_compile_test_div_zero.bkr");
        fs::write(&source, "def main() -> int { return 1 / 0; }").unwrap();

        let ok = compile_one(Some(&source), &params(false, None));
        assert!(!ok);

        let _ = fs::remove_file(&source);
    }
}
