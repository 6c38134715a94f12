//! Indentation normalization for text blocks.
//!
//! In indented-Markdown mode, a text block written flush with its
//! surrounding tag indentation is dedented before rendering, so naturally
//! indented markup renders as top-level Markdown instead of a code block.
//! The base indentation is the leading whitespace of the block's first
//! non-blank line; every other non-blank line must start with exactly that
//! prefix. Each text block computes its own base independently of any
//! enclosing tag.

use crate::error::ParseError;

/// Normalize a text block's indentation.
///
/// When `indented` is false the text passes through unchanged, so leading
/// whitespace keeps its ordinary Markdown meaning (four spaces start a code
/// block). When true, the base prefix is validated and stripped from every
/// line; blank lines are exempt from validation. `start_line` is the
/// 1-based line of the block's first line in the source document, used for
/// error positions.
pub(crate) fn normalize(
    text: &str,
    indented: bool,
    start_line: usize,
) -> Result<String, ParseError> {
    if !indented {
        return Ok(text.to_owned());
    }

    let lines: Vec<&str> = text.split('\n').collect();
    let Some(base) = lines
        .iter()
        .find(|line| !line.trim().is_empty())
        .map(|line| leading_whitespace(line))
    else {
        // Nothing but blank lines; nothing to strip.
        return Ok(text.to_owned());
    };

    for (idx, line) in lines.iter().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(column) = mismatch_column(line, base) {
            return Err(ParseError::BadIndentation {
                line: start_line + idx,
                column,
            });
        }
    }

    let dedented: Vec<&str> = lines
        .iter()
        .map(|line| line.get(base.len()..).unwrap_or(""))
        .collect();
    Ok(dedented.join("\n"))
}

fn leading_whitespace(line: &str) -> &str {
    let end = line.find(|c: char| !c.is_whitespace()).unwrap_or(line.len());
    &line[..end]
}

/// 1-based column of the first character where `line` stops matching the
/// base indentation, or `None` when the whole base prefix matches.
fn mismatch_column(line: &str, base: &str) -> Option<usize> {
    line.chars()
        .zip(base.chars())
        .position(|(have, want)| have != want)
        .map(|i| i + 1)
}
