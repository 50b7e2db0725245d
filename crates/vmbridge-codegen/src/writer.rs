//! Indentation-aware source text builder.
//!
//! [`SourceWriter`] appends lines at the current indent level (one level is
//! four spaces). [`SourceWriter::indent`] runs a closure one level deeper and
//! restores the previous level when the closure returns, early-returns an
//! error, or panics, so scopes are strictly nested.
//!
//! ```
//! use vmbridge_codegen::writer::SourceWriter;
//!
//! let mut w = SourceWriter::new();
//! w.line("func tick() {");
//! w.indent(|w| w.line("count += 1"));
//! w.line("}");
//! assert_eq!(w.render(), "func tick() {\n    count += 1\n}");
//! ```

const INDENT_UNIT: &str = "    ";

#[derive(Debug, Clone, Default)]
pub struct SourceWriter {
    lines: Vec<String>,
    depth: usize,
}

impl SourceWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one line at the current indent. Empty text yields an empty
    /// line with no trailing whitespace.
    pub fn line(&mut self, text: impl AsRef<str>) {
        let text = text.as_ref();
        if text.is_empty() {
            self.lines.push(String::new());
        } else {
            self.lines
                .push(format!("{}{text}", INDENT_UNIT.repeat(self.depth)));
        }
    }

    /// Append multi-line text, indenting each line. Empty lines are kept.
    pub fn block(&mut self, text: &str) {
        for line in text.split('\n') {
            self.line(line);
        }
    }

    /// Run `body` one level deeper, restoring the current level afterwards
    /// even if `body` panics.
    pub fn indent<R>(&mut self, body: impl FnOnce(&mut Self) -> R) -> R {
        let depth = self.depth;
        self.depth += 1;
        let mut guard = scopeguard::guard(self, move |writer| writer.depth = depth);
        body(&mut **guard)
    }

    /// Current indent level.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// All lines joined with `\n` (no trailing newline).
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic::{catch_unwind, AssertUnwindSafe};

    #[test]
    fn nested_indent() {
        let mut w = SourceWriter::new();
        w.line("a {");
        w.indent(|w| {
            w.line("b {");
            w.indent(|w| w.line("c"));
            w.line("}");
        });
        w.line("}");
        assert_eq!(w.render(), "a {\n    b {\n        c\n    }\n}");
    }

    #[test]
    fn empty_line_has_no_trailing_whitespace() {
        let mut w = SourceWriter::new();
        w.indent(|w| {
            w.line("x");
            w.line("");
            w.line("y");
        });
        assert_eq!(w.lines(), ["    x", "", "    y"]);
    }

    #[test]
    fn block_splits_and_keeps_empty_lines() {
        let mut w = SourceWriter::new();
        w.indent(|w| w.block("first\n\nthird"));
        assert_eq!(w.render(), "    first\n\n    third");
    }

    #[test]
    fn indent_restored_after_error_return() {
        let mut w = SourceWriter::new();
        let result: Result<(), &str> = w.indent(|w| {
            w.line("before");
            w.indent(|_| Err::<(), _>("unsupported"))?;
            w.line("unreachable");
            Ok(())
        });
        assert!(result.is_err());
        assert_eq!(w.depth(), 0);
        w.line("after");
        assert_eq!(w.render(), "    before\nafter");
    }

    #[test]
    fn indent_restored_after_panic() {
        let mut w = SourceWriter::new();
        let outcome = catch_unwind(AssertUnwindSafe(|| {
            w.indent(|w| {
                w.indent(|_| panic!("boom"));
            });
        }));
        assert!(outcome.is_err());
        assert_eq!(w.depth(), 0);
    }

    #[test]
    fn render_of_empty_writer_is_empty() {
        assert_eq!(SourceWriter::new().render(), "");
    }
}
