//! `CommonMark` engine for the weft parser.
//!
//! Implements [`MarkdownEngine`] over pulldown-cmark with GitHub Flavored
//! Markdown extensions enabled by default. Placeholder markers and
//! HTML-escaped entities pass through rendering untouched, which is what
//! the parser's interpolation splicing relies on.
//!
//! # Example
//!
//! ```
//! use weft_markdown::CommonMarkEngine;
//! use weft_parser::Parser;
//!
//! let parser = Parser::builder()
//!     .engine(CommonMarkEngine::new())
//!     .build()
//!     .unwrap();
//!
//! let elements = parser.parse("# Hello").unwrap();
//! assert_eq!(elements.len(), 1);
//! ```

use pulldown_cmark::{Options, html};
use weft_parser::{EngineError, MarkdownEngine};

/// Markdown renderer backed by pulldown-cmark.
#[derive(Debug, Clone)]
pub struct CommonMarkEngine {
    gfm: bool,
}

impl Default for CommonMarkEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl CommonMarkEngine {
    /// Create a new engine with GFM enabled by default.
    #[must_use]
    pub fn new() -> Self {
        Self { gfm: true }
    }

    /// Enable or disable GitHub Flavored Markdown features.
    ///
    /// When enabled, the renderer supports tables, strikethrough
    /// (`~~text~~`), and task lists (`- [ ] item`).
    #[must_use]
    pub fn with_gfm(mut self, enabled: bool) -> Self {
        self.gfm = enabled;
        self
    }

    /// Get parser options based on GFM configuration.
    #[must_use]
    pub fn parser_options(&self) -> Options {
        if self.gfm {
            Options::ENABLE_TABLES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_GFM
        } else {
            Options::empty()
        }
    }
}

impl MarkdownEngine for CommonMarkEngine {
    fn render(&self, markdown: &str) -> Result<String, EngineError> {
        let parser = pulldown_cmark::Parser::new_ext(markdown, self.parser_options());
        let mut output = String::with_capacity(markdown.len() * 2);
        html::push_html(&mut output, parser);
        Ok(output)
    }
}
