//! The translate pipeline: source -> intermediate textual artifact.
//!
//! No real intermediate-representation emitter exists, so the artifact is
//! a pretty-printed dump of the elaborated tree: read each input, run it
//! through the front end, write one artifact per input (or to `--output`
//! when there is exactly one).

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use tinker_core::{DeclArena, TypeStore};
use tinker_compiler::DiagnosticsExt;

use super::io::load_source;
use super::print::print_module;
use crate::cli::DriverParams;

pub fn run(params: &DriverParams) -> i32 {
    let inputs: Vec<Option<PathBuf>> = if params.inputs.is_empty() {
        vec![None]
    } else {
        params.inputs.iter().cloned().map(Some).collect()
    };

    let mut exit_code = 0;
    for input in inputs {
        if !translate_one(input.as_deref(), params) {
            exit_code = 1;
        }
    }
    exit_code
}

#[tracing::instrument(skip(params), fields(input = ?input))]
fn translate_one(input: Option<&std::path::Path>, params: &DriverParams) -> bool {
    let (source, file) = load_source(input);
    let mut interner = tinker_core::interner::seed();
    let mut types = TypeStore::new();
    let mut arena = DeclArena::new();
    let module_name = tinker_compiler::module_name_of(&mut interner, file.as_deref());

    let (module, _main, diagnostics) = tinker_compiler::translate(
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

    let dump = print_module(&arena, &types, &interner, module);
    write_artifact(&dump, params.output.as_deref());
    true
}

fn write_artifact(dump: &str, output: Option<&std::path::Path>) {
    match output {
        Some(path) => {
            fs::write(path, dump).unwrap_or_else(|e| {
                eprintln!("error: failed to write '{}': {e}", path.display());
                std::process::exit(1);
            });
        }
        None => {
            let _ = std::io::stdout().write_all(dump.as_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ColorChoice;

    fn params(output: Option<PathBuf>) -> DriverParams {
        DriverParams {
            inputs: Vec::new(),
            output,
            compile_only: false,
            keep: false,
            verbose: 0,
            color: ColorChoice::Never,
        }
    }

    #[test]
    fn well_formed_source_writes_a_dump_to_the_requested_output() {
        let dir = std::env::temp_dir();
        let source = dir.join("tinker_translate_test_input.bkr");
        let output = dir.join("tinker_translate_test_output.dump");
        fs::write(&source, "def main() -> int { return 0; }").unwrap();

        let ok = translate_one(Some(&source), &params(Some(output.clone())));
        assert!(ok);
        let dump = fs::read_to_string(&output).unwrap();
        assert!(dump.contains("(def main"));

        let _ = fs::remove_file(&source);
        let _ = fs::remove_file(&output);
    }

    #[test]
    fn elaboration_errors_are_reported_and_fail_the_pipeline() {
        let dir = std::env::temp_dir();
        let source = dir.join("tinker_translate_test_bad_input.bkr");
        fs::write(&source, "def f(x: int) -> bool { return x; }").unwrap();

        let ok = translate_one(Some(&source), &params(None));
        assert!(!ok);

        let _ = fs::remove_file(&source);
    }
}
