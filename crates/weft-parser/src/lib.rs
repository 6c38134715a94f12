//! Parser for component markup embedded in Markdown text.
//!
//! This crate parses a hybrid markup language: XML-like component tags and
//! `{expression}` interpolation points inside Markdown-flavored text. The
//! result is a document tree ([`weft_tree::Element`]) for a separate
//! rendering stage to consume; Markdown itself is delegated to a pluggable
//! [`MarkdownEngine`].
//!
//! # Architecture
//!
//! `parse` makes a single left-to-right pass. Tags are matched with a
//! recursive-descent scan; each contiguous run of non-tag text goes through
//! a four-step pipeline:
//!
//! 1. Indentation normalization (optional, see
//!    [`ParserBuilder::indented_markdown`])
//! 2. Interpolation splitting: `{...}` spans are replaced by a placeholder
//!    marker and recorded as descriptors
//! 3. Markdown rendering via the engine, once per run
//! 4. Block reconstruction: the rendered HTML is split on the marker and
//!    the descriptors threaded back between the fragments
//!
//! # Example
//!
//! ```
//! use weft_parser::Parser;
//! use weft_tree::AttrValue;
//!
//! let parser = Parser::builder()
//!     .engine(|markdown: &str| markdown.to_owned())
//!     .build()
//!     .unwrap();
//!
//! let elements = parser.parse(r#"<greeting to="world">Hi {user.name}!</greeting>"#).unwrap();
//! let tag = elements[0].as_tag().unwrap();
//! assert_eq!(tag.name, "greeting");
//! assert_eq!(tag.attr("to"), Some(&AttrValue::String("world".into())));
//! ```
//!
//! A real Markdown engine lives in the `weft-markdown` crate.

mod engine;
mod error;
mod indent;
mod interpolate;
mod parser;
mod scanner;

pub use engine::{EngineError, MarkdownEngine};
pub use error::ParseError;
pub use parser::{Parser, ParserBuilder};
