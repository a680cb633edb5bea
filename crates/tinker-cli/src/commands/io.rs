//! Reads a translation unit's source text and names its module.
//!
//! A single path (or `-`/nothing, for stdin) in, one `(source, file-name)`
//! pair out — both pipelines load their input the same way.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use crate::file_kind::require_source;

/// Reads `path`, or stdin when `path` is `None` or `-`. A named path whose
/// extension isn't recognized as source text is rejected as a
/// configuration error before any read is attempted; an I/O failure exits
/// the process with a diagnostic-shaped message on stderr.
pub fn load_source(path: Option<&Path>) -> (String, Option<String>) {
    match path {
        None => (read_stdin(), None),
        Some(p) if p.as_os_str() == "-" => (read_stdin(), None),
        Some(p) => {
            if let Err(msg) = require_source(p) {
                eprintln!("error: {msg}");
                std::process::exit(1);
            }
            let text = fs::read_to_string(p).unwrap_or_else(|e| {
                eprintln!("error: failed to read '{}': {e}", p.display());
                std::process::exit(1);
            });
            (text, Some(p.display().to_string()))
        }
    }
}

fn read_stdin() -> String {
    let mut buf = String::new();
    io::stdin()
        .read_to_string(&mut buf)
        .unwrap_or_else(|e| {
            eprintln!("error: failed to read stdin: {e}");
            std::process::exit(1);
        });
    buf
}
