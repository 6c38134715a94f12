//! Interpolation splitting and block reconstruction.
//!
//! The Markdown engine knows nothing about `{...}` interpolations, so a
//! text run is split before delegation: each interpolation span is recorded
//! as a descriptor and replaced in the outgoing text by the parser's
//! placeholder marker. After rendering, the HTML is split back apart on the
//! marker and the descriptors are threaded between the fragments.

use weft_tree::{Block, Interpolation};

use crate::error::ParseError;
use crate::scanner::{Pos, Scanner};

/// Split a dedented text run into placeholder text and interpolations.
///
/// Unescaped `{...}` spans become [`Interpolation`] descriptors; each span
/// is replaced by one occurrence of `marker`, so the returned text contains
/// `k` markers for `k` interpolations with all literal text untouched.
/// Escape sequences are resolved in the same pass: `\<` and `\>` become
/// `&lt;` and `&gt;` (so the engine's own HTML escaping cannot
/// double-process them), `\{` and `\}` become literal braces.
///
/// The marker must never legitimately occur in the text itself or in the
/// engine's rendered output for non-interpolated input — splitting on it is
/// otherwise ambiguous. The per-parser random default makes a collision
/// vanishingly unlikely; a caller overriding the marker takes on that
/// responsibility.
///
/// Error positions are 1-based line/column relative to `text`.
pub(crate) fn split(
    text: &str,
    marker: &str,
) -> Result<(String, Vec<Interpolation>), ParseError> {
    let mut scanner = Scanner::new(text);
    let mut out = String::with_capacity(text.len());
    let mut interpolations = Vec::new();

    while let Some(c) = scanner.peek() {
        match c {
            '\\' => {
                scanner.bump();
                match scanner.peek() {
                    Some('<') => {
                        out.push_str("&lt;");
                        scanner.bump();
                    }
                    Some('>') => {
                        out.push_str("&gt;");
                        scanner.bump();
                    }
                    Some(brace @ ('{' | '}')) => {
                        out.push(brace);
                        scanner.bump();
                    }
                    // Not an escape; the backslash is ordinary text.
                    _ => out.push('\\'),
                }
            }
            '{' => {
                let open = scanner.position();
                scanner.bump();
                let expr = take_braced(&mut scanner, open)?;
                interpolations.push(Interpolation::new(&expr));
                out.push_str(marker);
            }
            _ => {
                out.push(c);
                scanner.bump();
            }
        }
    }

    Ok((out, interpolations))
}

/// Consume expression text up to the `}` matching an already-consumed `{`.
///
/// Balanced inner braces stay part of the expression. `open` is the
/// position of the opening `{`, reported when the input ends first.
pub(crate) fn take_braced(scanner: &mut Scanner<'_>, open: Pos) -> Result<String, ParseError> {
    let mut depth = 1usize;
    let mut expr = String::new();
    loop {
        match scanner.bump() {
            None => {
                return Err(ParseError::UnterminatedInterpolation {
                    line: open.line,
                    column: open.column,
                });
            }
            Some('{') => {
                depth += 1;
                expr.push('{');
            }
            Some('}') => {
                depth -= 1;
                if depth == 0 {
                    return Ok(expr);
                }
                expr.push('}');
            }
            Some(c) => expr.push(c),
        }
    }
}

/// Re-thread interpolations through rendered HTML.
///
/// Splits `html` on every literal occurrence of `marker` — `k + 1`
/// fragments for `k` markers — and interleaves the descriptors in marker
/// order: `f0, i0, f1, i1, ..., fk`. Empty fragments at the ends are kept
/// so the shape is predictable; with no interpolations the result is a
/// single fragment holding the entire rendered HTML.
///
/// An engine that mangles a marker violates the marker invariant; the
/// descriptors left without a split point are appended after the final
/// fragment rather than dropped.
pub(crate) fn reassemble(
    html: &str,
    marker: &str,
    interpolations: Vec<Interpolation>,
) -> Vec<Block> {
    let mut remaining = interpolations.into_iter();
    let mut blocks = Vec::new();

    let mut fragments = html.split(marker).peekable();
    while let Some(fragment) = fragments.next() {
        blocks.push(Block::Html(fragment.to_owned()));
        if fragments.peek().is_some()
            && let Some(interp) = remaining.next()
        {
            blocks.push(Block::Interpolation(interp));
        }
    }
    blocks.extend(remaining.map(Block::Interpolation));

    blocks
}
