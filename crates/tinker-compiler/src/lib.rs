//! Front end for Tinker: lexer, parser, elaborator, mangler, and the
//! diagnostics renderer that sits on top of `tinker-core`'s collector.
//!
//! This crate turns source text into a fully elaborated tree
//! (`tinker_core::DeclArena` plus a resolved module `DeclId`) that
//! `tinker-eval` can execute or the CLI driver's mangler can name. It
//! depends on `tinker-eval` only for `reduce`, the constant-folding helper
//! the elaborator calls to evaluate an array type's extent at compile time;
//! it otherwise knows nothing about execution.

pub mod diagnostics;
pub mod elaborate;
pub mod lexer;
pub mod mangle;
pub mod parser;

use tinker_core::{DeclArena, DeclId, Diagnostics, Interner, Symbol, TokenClass, TypeStore};

pub use diagnostics::{DiagnosticsExt, DiagnosticsPrinter};
pub use elaborate::Elaborator;
pub use lexer::{LexError, Lexer};
pub use mangle::mangle;
pub use parser::Parser;

/// Runs the whole front end over one translation unit: lexing, parsing, and
/// two-phase elaboration. Returns the elaborated module, its `main`
/// function if one was declared, and every diagnostic collected along the
/// way (lexical and syntax errors from parsing, semantic errors from
/// elaboration) — the single entry point the CLI driver's translate and
/// compile pipelines both call.
pub fn translate(
    source: &str,
    file: Option<String>,
    interner: &mut Interner,
    types: &mut TypeStore,
    arena: &mut DeclArena,
    module_name: Symbol,
) -> (DeclId, Option<DeclId>, Diagnostics) {
    let (module, mut diagnostics) = parser::parse(source, file.clone(), interner);
    let (module_id, main, elab_diagnostics) =
        Elaborator::elaborate_module(interner, types, arena, module_name, module, file);
    diagnostics.extend(elab_diagnostics);
    (module_id, main, diagnostics)
}

/// Interns a translation unit's module name from its source file stem
/// (`"program.bkr"` -> `"program"`), falling back to `"module"` for
/// inline/stdin sources with no file name of their own.
pub fn module_name_of(interner: &mut Interner, file: Option<&str>) -> Symbol {
    let stem = file
        .and_then(|f| std::path::Path::new(f).file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or("module");
    interner.intern(stem, TokenClass::Identifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translate_runs_the_whole_front_end_in_one_call() {
        let mut interner = tinker_core::interner::seed();
        let mut types = TypeStore::new();
        let mut arena = DeclArena::new();
        let name = module_name_of(&mut interner, Some("program.bkr"));
        let (_module, main, diagnostics) = translate(
            "def main() -> int { return 1 + 2 * 3; }",
            Some("program.bkr".to_string()),
            &mut interner,
            &mut types,
            &mut arena,
            name,
        );
        assert!(diagnostics.is_empty(), "{diagnostics:?}");
        assert!(main.is_some());
    }

    #[test]
    fn translate_collects_lexical_parse_and_elaboration_diagnostics_together() {
        let mut interner = tinker_core::interner::seed();
        let mut types = TypeStore::new();
        let mut arena = DeclArena::new();
        let name = module_name_of(&mut interner, None);
        let (_module, _main, diagnostics) = translate(
            "def f(x: int) -> bool { return x; }",
            None,
            &mut interner,
            &mut types,
            &mut arena,
            name,
        );
        assert!(diagnostics.has_errors());
    }
}
