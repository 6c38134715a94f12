//! The Markdown engine capability.

/// Error returned by a [`MarkdownEngine`].
pub type EngineError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A Markdown-to-HTML renderer injected into the parser.
///
/// The parser hands each text block (with interpolations already replaced by
/// placeholder markers and escapes resolved) to the engine exactly once and
/// treats the call as pure and synchronous. An engine failure aborts the
/// whole parse with the engine's own error.
///
/// Any `Fn(&str) -> String` closure is an engine, which keeps tests and
/// one-off callers simple:
///
/// ```
/// use weft_parser::Parser;
///
/// let parser = Parser::builder()
///     .engine(|markdown: &str| markdown.to_owned())
///     .build()
///     .unwrap();
/// ```
///
/// A real renderer lives in the `weft-markdown` crate.
pub trait MarkdownEngine {
    /// Render Markdown-flavored text to HTML.
    ///
    /// The input may contain placeholder markers and HTML-escaped entities;
    /// both must survive rendering byte-for-byte.
    fn render(&self, markdown: &str) -> Result<String, EngineError>;
}

impl<F> MarkdownEngine for F
where
    F: Fn(&str) -> String,
{
    fn render(&self, markdown: &str) -> Result<String, EngineError> {
        Ok(self(markdown))
    }
}
