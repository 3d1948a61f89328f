//! Indentation-scoped line writer for project files.

use std::fmt::Display;
use std::io::{self, Write};

/// Indentation emitted once per nesting level.
const INDENT: &str = "\t";

/// Writes newline-terminated lines indented to the current nesting level.
///
/// Nesting only changes through [`PbxWriter::block`] and
/// [`PbxWriter::indented`], which restore the level when their body returns,
/// so every opened scope is closed again even on error.
///
/// # Examples
///
/// ```
/// use pbxgen::pbxproj::PbxWriter;
///
/// let mut out = PbxWriter::new(Vec::new());
/// out.block("A = {", "};", |w| w.line("isa = PBXGroup;"))?;
/// assert_eq!(String::from_utf8(out.into_inner()).unwrap(), "A = {\n\tisa = PBXGroup;\n};\n");
/// # Ok::<(), std::io::Error>(())
/// ```
#[derive(Debug)]
pub struct PbxWriter<W> {
    out: W,
    level: usize,
}

impl<W: Write> PbxWriter<W> {
    /// Wrap `out`, starting at nesting level zero.
    pub const fn new(out: W) -> Self {
        Self { out, level: 0 }
    }

    /// Current nesting level.
    #[must_use]
    pub const fn level(&self) -> usize {
        self.level
    }

    /// Write one line at the current indentation.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn line(&mut self, text: impl Display) -> io::Result<()> {
        for _ in 0..self.level {
            self.out.write_all(INDENT.as_bytes())?;
        }
        writeln!(self.out, "{text}")
    }

    /// Write `text` verbatim, without indentation or a trailing newline.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn raw(&mut self, text: &str) -> io::Result<()> {
        self.out.write_all(text.as_bytes())
    }

    /// Run `body` one level deeper than the current one.
    ///
    /// # Errors
    ///
    /// Returns the error produced by `body`.
    pub fn indented<T, E>(&mut self, body: impl FnOnce(&mut Self) -> Result<T, E>) -> Result<T, E> {
        self.level += 1;
        let result = body(self);
        self.level -= 1;
        result
    }

    /// Write `open`, the body one level deeper, then `close`.
    ///
    /// # Errors
    ///
    /// Returns the first error from the writer or from `body`.
    pub fn block<E>(
        &mut self,
        open: impl Display,
        close: &str,
        body: impl FnOnce(&mut Self) -> Result<(), E>,
    ) -> Result<(), E>
    where
        E: From<io::Error>,
    {
        self.line(open)?;
        self.indented(body)?;
        self.line(close)?;
        Ok(())
    }

    /// Write a `key = (` … `);` list with one `item,` per line.
    ///
    /// # Errors
    ///
    /// Returns any error from the underlying writer.
    pub fn list<I>(&mut self, key: &str, items: I) -> io::Result<()>
    where
        I: IntoIterator,
        I::Item: Display,
    {
        self.block(format_args!("{key} = ("), ");", |w| {
            items.into_iter().try_for_each(|item| w.line(format_args!("{item},")))
        })
    }

    /// Return the underlying writer.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn text(out: PbxWriter<Vec<u8>>) -> String {
        String::from_utf8(out.into_inner()).expect("utf8")
    }

    #[rstest]
    fn nested_blocks_indent_and_restore() {
        let mut out = PbxWriter::new(Vec::new());
        out.block("a = {", "};", |w| {
            w.line("b = 1;")?;
            w.block("c = {", "};", |inner| inner.line("d = 2;"))
        })
        .expect("write");
        assert_eq!(out.level(), 0);
        assert_eq!(text(out), "a = {\n\tb = 1;\n\tc = {\n\t\td = 2;\n\t};\n};\n");
    }

    #[rstest]
    fn failing_body_restores_the_level() {
        let mut out = PbxWriter::new(Vec::new());
        let result = out.block("a = {", "};", |_| {
            Err(io::Error::other("boom"))
        });
        assert!(result.is_err());
        assert_eq!(out.level(), 0);
    }

    #[rstest]
    fn empty_lists_close_immediately() {
        let mut out = PbxWriter::new(Vec::new());
        out.list("files", Vec::<String>::new()).expect("write");
        out.list("targets", ["A", "B"]).expect("write");
        assert_eq!(text(out), "files = (\n);\ntargets = (\n\tA,\n\tB,\n);\n");
    }
}
