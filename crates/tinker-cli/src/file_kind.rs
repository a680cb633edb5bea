//! File-kind dispatch on input/output extensions.
//!
//! Extensions map to a small closed set of kinds so the driver knows, for
//! any path handed to `-i`/`-o`, whether it names source text, one of the
//! (unimplemented) intermediate forms, a linked artifact, or nothing
//! recognized at all.

use std::path::Path;

/// The kind of artifact a path names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    /// Not one of the kinds below — an unrecognized extension, or none.
    Unspecified,
    /// `.bkr` — Tinker source text.
    Source,
    /// `.ll` — intermediate text (no emitter exists; retained as a kind for
    /// completeness of the table).
    IrText,
    /// `.bc` — intermediate binary form.
    IrBitcode,
    /// `.s` — native assembly source text.
    Assembly,
    /// `.o` — native object file.
    Object,
    /// `.a` — static archive.
    Archive,
    /// `.so`/`.dylib`/`.dll` — dynamic library.
    Library,
    /// `.out`/`.exe` — a linked executable program.
    Program,
}

impl FileKind {
    /// True for the file kinds produced by a linker: libraries, archives,
    /// and executables.
    pub fn is_linked(self) -> bool {
        matches!(self, FileKind::Library | FileKind::Archive | FileKind::Program)
    }
}

/// Classifies `path` by its extension. A path with no extension, or one
/// not in the table, is [`FileKind::Unspecified`] — the catch-all default.
pub fn get_file_kind(path: &Path) -> FileKind {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("bkr") => FileKind::Source,
        Some("ll") => FileKind::IrText,
        Some("bc") => FileKind::IrBitcode,
        Some("s") => FileKind::Assembly,
        Some("o") => FileKind::Object,
        Some("a") => FileKind::Archive,
        Some("so") | Some("dylib") | Some("dll") => FileKind::Library,
        Some("out") | Some("exe") => FileKind::Program,
        Some(_) | None => FileKind::Unspecified,
    }
}

/// Rejects an input path whose kind isn't source text, with the
/// configuration-error message the driver reports before ever reading the
/// file — a configuration error, not a translation error, since no source
/// was read.
pub fn require_source(path: &Path) -> Result<(), String> {
    match get_file_kind(path) {
        FileKind::Source => Ok(()),
        other => Err(format!(
            "'{}' is not a recognized Tinker source file (got {other:?})",
            path.display()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_extension_is_recognized() {
        assert_eq!(get_file_kind(Path::new("program.bkr")), FileKind::Source);
        assert!(require_source(Path::new("program.bkr")).is_ok());
    }

    #[test]
    fn unmarked_path_is_unspecified_not_a_program() {
        assert_eq!(get_file_kind(Path::new("a")), FileKind::Unspecified);
        assert!(require_source(Path::new("a")).is_err());
    }

    #[test]
    fn dynamic_library_extensions_are_recognized() {
        for ext in ["so", "dylib", "dll"] {
            let path = Path::new("libfoo").with_extension(ext);
            assert_eq!(get_file_kind(&path), FileKind::Library);
            assert!(get_file_kind(&path).is_linked());
        }
    }

    #[test]
    fn program_extensions_are_linked_but_object_is_not() {
        assert!(get_file_kind(Path::new("a.out")).is_linked());
        assert!(get_file_kind(Path::new("a.exe")).is_linked());
        assert!(!get_file_kind(Path::new("program.o")).is_linked());
    }
}
