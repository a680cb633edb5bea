//! Rendering [`tinker_core::Diagnostics`] to text.
//!
//! Two forms: the single-line `error:<location>: <message>` form (already
//! implemented by `Diagnostic`'s own `Display`) for non-interactive/
//! scripted use, and a richer `annotate-snippets`-based source-annotated
//! form for interactive CLI use. Which form a run produces is a CLI
//! decision (a flag), not something this module decides — it only renders
//! what it's asked to.
//!
//! `Diagnostics` lives in `tinker-core`, so the `.printer()` convenience is
//! an extension trait here rather than an inherent impl on the type itself.

use std::fmt::Write;
use std::ops::Range;

use annotate_snippets::{AnnotationKind, Group, Level, Renderer, Snippet};

use tinker_core::{Diagnostic, Diagnostics, Severity, Span};

pub struct DiagnosticsPrinter<'d, 's> {
    diagnostics: &'d Diagnostics,
    source: Option<&'s str>,
    colored: bool,
}

impl<'d, 's> DiagnosticsPrinter<'d, 's> {
    pub fn new(diagnostics: &'d Diagnostics) -> Self {
        Self {
            diagnostics,
            source: None,
            colored: false,
        }
    }

    /// Supplies the original source text; without it, rendering falls back
    /// to the single-line form regardless of `colored`.
    pub fn source(mut self, source: &'s str) -> Self {
        self.source = Some(source);
        self
    }

    pub fn colored(mut self, value: bool) -> Self {
        self.colored = value;
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        self.format(&mut out).expect("String write never fails");
        out
    }

    pub fn format(&self, w: &mut impl Write) -> std::fmt::Result {
        let Some(source) = self.source else {
            return self.format_plain(w);
        };
        if self.diagnostics.is_empty() {
            return Ok(());
        }

        let renderer = if self.colored {
            Renderer::styled()
        } else {
            Renderer::plain()
        };

        for (i, diag) in self.diagnostics.iter().enumerate() {
            let range = byte_range(diag.location.span, source.len());
            let mut snippet = Snippet::source(source)
                .line_start(1)
                .annotation(AnnotationKind::Primary.span(range).label(&diag.message));
            if let Some(path) = diag.location.file.as_deref() {
                snippet = snippet.path(path);
            }
            for related in &diag.related {
                let related_range = byte_range(related.location.span, source.len());
                snippet = snippet.annotation(
                    AnnotationKind::Context
                        .span(related_range)
                        .label(&related.message),
                );
            }

            let level = severity_to_level(diag.severity);
            let group = level.primary_title(&diag.message).element(snippet);
            let report: Vec<Group> = vec![group];

            if i > 0 {
                w.write_char('\n')?;
            }
            write!(w, "{}", renderer.render(&report))?;
        }

        Ok(())
    }

    fn format_plain(&self, w: &mut impl Write) -> std::fmt::Result {
        for (i, diag) in self.diagnostics.iter().enumerate() {
            if i > 0 {
                w.write_char('\n')?;
            }
            write!(w, "{diag}")?;
        }
        Ok(())
    }
}

fn severity_to_level(severity: Severity) -> Level<'static> {
    match severity {
        Severity::Error => Level::ERROR,
        Severity::Warning => Level::WARNING,
    }
}

fn byte_range(span: Span, limit: usize) -> Range<usize> {
    let start = span.start as usize;
    let end = span.end as usize;
    if start == end {
        start..(start + 1).min(limit)
    } else {
        start..end.min(limit)
    }
}

pub trait DiagnosticsExt {
    fn printer(&self) -> DiagnosticsPrinter<'_, '_>;
}

impl DiagnosticsExt for Diagnostics {
    fn printer(&self) -> DiagnosticsPrinter<'_, '_> {
        DiagnosticsPrinter::new(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tinker_core::Location;

    #[test]
    fn plain_rendering_matches_single_line_format() {
        let mut diags = Diagnostics::new();
        diags.error(Location::synthetic(), "type mismatch");
        let rendered = DiagnosticsPrinter::new(&diags).render();
        assert_eq!(rendered, "error:1:1: type mismatch");
    }

    #[test]
    fn empty_diagnostics_render_to_an_empty_string_with_source() {
        let diags = Diagnostics::new();
        let rendered = DiagnosticsPrinter::new(&diags).source("def main() {}").render();
        assert_eq!(rendered, "");
    }

    #[test]
    fn annotated_rendering_includes_the_message() {
        let mut diags = Diagnostics::new();
        diags.error(
            Location::new(None, Span::new(4, 8, 1, 5)),
            "use of undeclared identifier 'main'",
        );
        let rendered = DiagnosticsPrinter::new(&diags)
            .source("def main() -> int { return 0; }")
            .render();
        assert!(rendered.contains("use of undeclared identifier 'main'"));
    }
}
