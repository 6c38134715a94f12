//! Error types for parsing.

/// Error raised while building a [`Parser`](crate::Parser) or parsing a
/// document.
///
/// All parse errors are fatal: parsing never recovers or collects multiple
/// failures, so callers see exactly one error per `parse` call. Positional
/// variants carry the 1-based line and column where the problem starts.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum ParseError {
    /// Parser built without a Markdown engine.
    #[error("no markdown engine configured")]
    MissingEngine,

    /// Tag opening not terminated by `>` or `/>`.
    #[error("{line}:{column}: tag is not terminated by `>` or `/>`")]
    MalformedTag {
        /// Line of the offending `<`.
        line: usize,
        /// Column of the offending `<`.
        column: usize,
    },

    /// Closing tag name does not match the innermost open tag.
    #[error("{line}:{column}: unexpected closing tag `</{found}>`")]
    UnmatchedCloseTag {
        /// Name of the innermost open tag, if any tag is open at all.
        expected: Option<String>,
        /// Name found in the closing tag.
        found: String,
        /// Line of the closing tag's `<`.
        line: usize,
        /// Column of the closing tag's `<`.
        column: usize,
    },

    /// Input ended with tags still open.
    #[error("{line}:{column}: tag `<{name}>` is never closed")]
    UnclosedTag {
        /// Name of the innermost unclosed tag.
        name: String,
        /// Line where the tag was opened.
        line: usize,
        /// Column where the tag was opened.
        column: usize,
    },

    /// Attribute value is not a number, a double-quoted string, or a
    /// `{...}` interpolation.
    #[error(
        "{line}:{column}: attribute `{name}` must be a number, a double-quoted string, or an interpolation"
    )]
    InvalidAttributeValue {
        /// Attribute name.
        name: String,
        /// Line where the value starts.
        line: usize,
        /// Column where the value starts.
        column: usize,
    },

    /// `{` without a matching `}`, in attribute or text context.
    #[error("{line}:{column}: interpolation `{{` is never closed")]
    UnterminatedInterpolation {
        /// Line of the opening `{`.
        line: usize,
        /// Column of the opening `{`.
        column: usize,
    },

    /// Under-indented line inside an indentation-sensitive block.
    #[error("{line}:{column}: line is indented less than the first line of its block")]
    BadIndentation {
        /// 1-based line of the offending character.
        line: usize,
        /// 1-based column of the first character that breaks the base
        /// indentation.
        column: usize,
    },

    /// Markdown engine failure, propagated as-is.
    #[error(transparent)]
    Engine(crate::engine::EngineError),
}
