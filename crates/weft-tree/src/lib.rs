//! Document tree types for weft.
//!
//! A parsed document is an ordered sequence of [`Element`]s in source order.
//! Tag elements own their children exclusively, so the tree is acyclic by
//! construction. Text elements carry [`Block`]s: rendered HTML fragments
//! interleaved with the interpolations found in the source text.
//!
//! These types are deliberately free of parser machinery so a rendering
//! stage can depend on the tree alone.

use std::collections::HashMap;

/// A node of the parsed document tree.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Element {
    /// A run of Markdown-rendered text, possibly interleaved with
    /// interpolations.
    Text(TextElement),
    /// A component tag with attributes and children.
    Tag(TagElement),
}

impl Element {
    /// Returns the text element, if this is one.
    #[must_use]
    pub fn as_text(&self) -> Option<&TextElement> {
        match self {
            Self::Text(text) => Some(text),
            Self::Tag(_) => None,
        }
    }

    /// Returns the tag element, if this is one.
    #[must_use]
    pub fn as_tag(&self) -> Option<&TagElement> {
        match self {
            Self::Tag(tag) => Some(tag),
            Self::Text(_) => None,
        }
    }
}

/// A text run after Markdown rendering.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TextElement {
    /// Rendered HTML fragments interleaved with interpolations, in source
    /// order. A run with `k` interpolations always carries `k + 1` fragments;
    /// fragments at the ends may be empty.
    pub blocks: Vec<Block>,
}

/// One entry of a [`TextElement`]'s block sequence.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Block {
    /// An opaque fragment of rendered HTML. Contains no placeholder markers.
    Html(String),
    /// An interpolation point awaiting resolution by a later stage.
    Interpolation(Interpolation),
}

/// A component tag: `<name attr=value>children</name>`.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TagElement {
    /// Tag name, lowercase-normalized.
    pub name: String,
    /// Attributes by name.
    pub attrs: HashMap<String, AttrValue>,
    /// Child elements in source order. Empty for self-closing tags.
    pub children: Vec<Element>,
}

impl TagElement {
    /// Get an attribute value by name.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&AttrValue> {
        self.attrs.get(name)
    }
}

/// An attribute value. Exactly one shape per attribute; the parser rejects
/// anything that is not one of these three forms.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttrValue {
    /// A bare numeric literal: `width=560`.
    Number(f64),
    /// A double-quoted string literal: `title="Hello"`.
    String(String),
    /// An interpolation: `src={item.url}`.
    Interpolation(Interpolation),
}

impl AttrValue {
    /// Returns the numeric value, if this is a number literal.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Returns the string value, if this is a string literal.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

/// An unevaluated expression embedded in markup via `{...}`.
///
/// The parser extracts the expression text verbatim (trimmed of surrounding
/// whitespace) and never interprets it; resolution belongs to a downstream
/// rendering stage.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Interpolation {
    /// The raw expression text found between `{` and `}`.
    pub accessor: String,
}

impl Interpolation {
    /// Create an interpolation from raw expression text.
    ///
    /// Surrounding whitespace is trimmed; inner whitespace is preserved.
    #[must_use]
    pub fn new(accessor: &str) -> Self {
        Self {
            accessor: accessor.trim().to_owned(),
        }
    }
}
