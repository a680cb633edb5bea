//! Ambient operational logging, distinct from the `Diagnostics` pipeline.
//!
//! `tinker-eval` and `tinker-compiler` emit `tracing` spans/events around
//! lexing, parsing, elaborating, and evaluating a translation unit. This
//! installs the one subscriber the whole process shares, gated by
//! `-v`/`--verbose` (repeatable) and/or `RUST_LOG`, with the env filter
//! taking precedence when set.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::FmtSpan;

/// Installs a `tracing-subscriber` formatter writing to stderr. `verbose`
/// is the number of `-v` flags given on the command line; `RUST_LOG`, if
/// set, overrides the level it implies.
pub fn init(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(FmtSpan::CLOSE)
        .with_writer(std::io::stderr)
        .without_time()
        .init();
}
