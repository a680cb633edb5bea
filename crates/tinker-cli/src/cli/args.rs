//! Shared argument builders for the driver's flag set.
//!
//! There is exactly one flat set of flags (no subcommands): which pipeline
//! runs is decided by invocation name, not by a verb on the command line.
//! Each function here returns one `clap::Arg`, so `main.rs` composes them
//! onto a single `clap::Command`.

use std::path::PathBuf;

use clap::{Arg, ArgAction, value_parser};

/// Input source file(s) (-i/--input, repeatable).
pub fn input_arg() -> Arg {
    Arg::new("input")
        .short('i')
        .long("input")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .action(ArgAction::Append)
        .help("Input source file(s); reads stdin if omitted")
}

/// Output path (-o/--output).
pub fn output_arg() -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Output artifact (default: stdout)")
}

/// Stop after semantic analysis; do not evaluate (-c, compile pipeline
/// only — the translate pipeline never evaluates regardless of this flag).
pub fn compile_arg() -> Arg {
    Arg::new("compile")
        .short('c')
        .action(ArgAction::SetTrue)
        .help("Stop after semantic analysis; do not evaluate")
}

/// Retain intermediate diagnostics/dump files instead of cleaning them up
/// (-k/--keep).
pub fn keep_arg() -> Arg {
    Arg::new("keep")
        .short('k')
        .long("keep")
        .action(ArgAction::SetTrue)
        .help("Retain intermediate files instead of deleting them")
}

/// Verbosity level (-v, -vv, ...), forwarded to the tracing subscriber.
pub fn verbose_arg() -> Arg {
    Arg::new("verbose")
        .short('v')
        .long("verbose")
        .action(ArgAction::Count)
        .help("Increase logging verbosity (repeatable)")
}

/// Colorize diagnostics output (--color).
pub fn color_arg() -> Arg {
    Arg::new("color")
        .long("color")
        .value_name("WHEN")
        .default_value("auto")
        .value_parser(["auto", "always", "never"])
        .help("Colorize diagnostics output")
}

