//! The parser: configuration, tag/tree grammar, and per-run orchestration.

use std::collections::HashMap;

use rand::RngExt;
use weft_tree::{AttrValue, Element, Interpolation, TagElement, TextElement};

use crate::engine::MarkdownEngine;
use crate::error::ParseError;
use crate::indent;
use crate::interpolate;
use crate::scanner::{Pos, Scanner, is_name_char};

/// Builder for [`Parser`].
///
/// A Markdown engine is required; [`build`](Self::build) fails with
/// [`ParseError::MissingEngine`] without one. The interpolation point and
/// indentation mode are optional.
#[derive(Default)]
pub struct ParserBuilder {
    engine: Option<Box<dyn MarkdownEngine>>,
    interpolation_point: Option<String>,
    indented_markdown: bool,
}

impl ParserBuilder {
    /// Set the Markdown engine.
    #[must_use]
    pub fn engine<E: MarkdownEngine + 'static>(mut self, engine: E) -> Self {
        self.engine = Some(Box::new(engine));
        self
    }

    /// Override the placeholder marker substituted for interpolations.
    ///
    /// The default is a fresh random 64-hex-character string per parser.
    /// An explicit marker is useful for deterministic tests; the caller
    /// guarantees it never occurs in document content or rendered output.
    #[must_use]
    pub fn interpolation_point(mut self, marker: impl Into<String>) -> Self {
        self.interpolation_point = Some(marker.into());
        self
    }

    /// Enable indented-Markdown mode.
    ///
    /// Off by default, leaving leading whitespace its ordinary Markdown
    /// meaning. See [`Parser::parse`] for the mode's semantics.
    #[must_use]
    pub fn indented_markdown(mut self, enabled: bool) -> Self {
        self.indented_markdown = enabled;
        self
    }

    /// Build the parser.
    pub fn build(self) -> Result<Parser, ParseError> {
        let engine = self.engine.ok_or(ParseError::MissingEngine)?;
        Ok(Parser {
            engine,
            marker: self.interpolation_point.unwrap_or_else(generate_marker),
            indented_markdown: self.indented_markdown,
        })
    }
}

/// Generate a random placeholder marker (64 hex characters).
fn generate_marker() -> String {
    let bytes: [u8; 32] = rand::rng().random();
    hex::encode(bytes)
}

/// Parser for component markup embedded in Markdown text.
///
/// Configuration is immutable after construction and one parser may serve
/// any number of independent [`parse`](Self::parse) calls; each call
/// allocates its own cursor and tag stack.
pub struct Parser {
    engine: Box<dyn MarkdownEngine>,
    marker: String,
    indented_markdown: bool,
}

impl std::fmt::Debug for Parser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Parser")
            .field("engine", &"<dyn MarkdownEngine>")
            .field("marker", &self.marker)
            .field("indented_markdown", &self.indented_markdown)
            .finish()
    }
}

/// An open tag awaiting its closing counterpart.
struct OpenTag {
    name: String,
    pos: Pos,
}

impl Parser {
    /// Start building a parser.
    #[must_use]
    pub fn builder() -> ParserBuilder {
        ParserBuilder::default()
    }

    /// The placeholder marker this parser substitutes for interpolations.
    #[must_use]
    pub fn interpolation_point(&self) -> &str {
        &self.marker
    }

    /// Whether indented-Markdown mode is enabled.
    #[must_use]
    pub fn indented_markdown(&self) -> bool {
        self.indented_markdown
    }

    /// Parse a document into a sequence of elements.
    ///
    /// Tags nest arbitrarily and may contain Markdown text; each contiguous
    /// run of non-tag text is dedented (in indented-Markdown mode), split
    /// around its interpolations, rendered by the engine, and reassembled
    /// into the text element's block sequence. The first violation aborts
    /// the call; errors carry 1-based line/column positions.
    ///
    /// Input with no tags at all yields a single text element.
    pub fn parse(&self, text: &str) -> Result<Vec<Element>, ParseError> {
        let mut scanner = Scanner::new(text);
        let mut elements = self.parse_children(&mut scanner, None)?;
        if elements.is_empty() {
            // No tags and nothing but whitespace: still one text element.
            elements.push(self.text_element(text, Pos { line: 1, column: 1 })?);
        }
        tracing::debug!(elements = elements.len(), "parsed document");
        Ok(elements)
    }

    /// Parse sibling elements until end of input or the close tag matching
    /// `open`. The recursion carries the tag stack.
    fn parse_children(
        &self,
        scanner: &mut Scanner<'_>,
        open: Option<&OpenTag>,
    ) -> Result<Vec<Element>, ParseError> {
        let mut elements = Vec::new();
        let mut run = String::new();
        let mut run_start = scanner.position();
        let mut run_has_interpolations = false;

        loop {
            match scanner.peek() {
                None => {
                    if let Some(open) = open {
                        return Err(ParseError::UnclosedTag {
                            name: open.name.clone(),
                            line: open.pos.line,
                            column: open.pos.column,
                        });
                    }
                    self.flush_run(&mut elements, &run, run_start, run_has_interpolations)?;
                    return Ok(elements);
                }
                Some('<') if scanner.peek_second() == Some('/') => {
                    self.flush_run(&mut elements, &run, run_start, run_has_interpolations)?;
                    let close_pos = scanner.position();
                    let found = parse_close_tag(scanner, close_pos)?;
                    return match open {
                        Some(open) if open.name == found => Ok(elements),
                        _ => Err(ParseError::UnmatchedCloseTag {
                            expected: open.map(|o| o.name.clone()),
                            found,
                            line: close_pos.line,
                            column: close_pos.column,
                        }),
                    };
                }
                Some('<') => {
                    self.flush_run(&mut elements, &run, run_start, run_has_interpolations)?;
                    run.clear();
                    run_has_interpolations = false;
                    elements.push(self.parse_tag(scanner)?);
                    run_start = scanner.position();
                }
                Some('\\') => {
                    scanner.bump();
                    // Keep the sequence raw; the splitter resolves escapes.
                    match scanner.peek() {
                        Some(c @ ('{' | '}' | '<' | '>')) => {
                            run.push('\\');
                            run.push(c);
                            scanner.bump();
                        }
                        _ => run.push('\\'),
                    }
                }
                Some('{') => {
                    // Copy the span raw: `<` and `>` inside an expression
                    // are not markup. The splitter re-finds the span after
                    // dedenting.
                    let open_brace = scanner.position();
                    scanner.bump();
                    run.push('{');
                    let expr = interpolate::take_braced(scanner, open_brace)?;
                    run.push_str(&expr);
                    run.push('}');
                    run_has_interpolations = true;
                }
                Some(c) => {
                    run.push(c);
                    scanner.bump();
                }
            }
        }
    }

    /// Emit a text element for a finished run.
    ///
    /// Runs that are pure inter-tag whitespace carry no content and are
    /// dropped; anything with visible text or an interpolation is kept.
    fn flush_run(
        &self,
        elements: &mut Vec<Element>,
        raw: &str,
        start: Pos,
        has_interpolations: bool,
    ) -> Result<(), ParseError> {
        if raw.is_empty() || (!has_interpolations && raw.trim().is_empty()) {
            return Ok(());
        }
        elements.push(self.text_element(raw, start)?);
        Ok(())
    }

    /// Run one text block through the pipeline: normalize, split, render,
    /// reassemble.
    fn text_element(&self, raw: &str, start: Pos) -> Result<Element, ParseError> {
        let dedented = indent::normalize(raw, self.indented_markdown, start.line)?;
        let (placeholder_text, interpolations) = interpolate::split(&dedented, &self.marker)?;
        let html = self
            .engine
            .render(&placeholder_text)
            .map_err(ParseError::Engine)?;
        let blocks = interpolate::reassemble(&html, &self.marker, interpolations);
        tracing::trace!(blocks = blocks.len(), "rendered text block");
        Ok(Element::Text(TextElement { blocks }))
    }

    /// Parse an opening tag (and, unless self-closing, its children through
    /// the matching close tag). The cursor sits on `<`.
    fn parse_tag(&self, scanner: &mut Scanner<'_>) -> Result<Element, ParseError> {
        let tag_pos = scanner.position();
        scanner.bump(); // consume '<'
        let name = scanner.take_name().to_ascii_lowercase();
        if name.is_empty() {
            return Err(malformed(tag_pos));
        }

        let mut attrs = HashMap::new();
        loop {
            scanner.skip_whitespace();
            match scanner.peek() {
                // Another `<` or end of input before the tag is closed.
                None | Some('<') => return Err(malformed(tag_pos)),
                Some('>') => {
                    scanner.bump();
                    let open = OpenTag {
                        name: name.clone(),
                        pos: tag_pos,
                    };
                    let children = self.parse_children(scanner, Some(&open))?;
                    return Ok(Element::Tag(TagElement {
                        name,
                        attrs,
                        children,
                    }));
                }
                Some('/') => {
                    scanner.bump();
                    if !scanner.eat('>') {
                        return Err(malformed(tag_pos));
                    }
                    return Ok(Element::Tag(TagElement {
                        name,
                        attrs,
                        children: Vec::new(),
                    }));
                }
                Some(c) if is_name_char(c) => {
                    let (attr_name, value) = parse_attribute(scanner, tag_pos)?;
                    attrs.insert(attr_name, value);
                }
                Some(_) => return Err(malformed(tag_pos)),
            }
        }
    }
}

/// Parse one `name=value` attribute. The cursor sits on the name.
fn parse_attribute(
    scanner: &mut Scanner<'_>,
    tag_pos: Pos,
) -> Result<(String, AttrValue), ParseError> {
    let name = scanner.take_name();
    scanner.skip_whitespace();
    let eq_pos = scanner.position();
    if !scanner.eat('=') {
        return Err(ParseError::InvalidAttributeValue {
            name,
            line: eq_pos.line,
            column: eq_pos.column,
        });
    }
    scanner.skip_whitespace();
    let value_pos = scanner.position();

    let value = match scanner.peek() {
        Some('"') => {
            scanner.bump();
            let mut value = String::new();
            loop {
                match scanner.bump() {
                    None => return Err(malformed(tag_pos)),
                    Some('"') => break,
                    Some(c) => value.push(c),
                }
            }
            AttrValue::String(value)
        }
        Some('{') => {
            scanner.bump();
            let expr = interpolate::take_braced(scanner, value_pos)?;
            AttrValue::Interpolation(Interpolation::new(&expr))
        }
        Some(c) if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => {
            let mut token = String::new();
            while let Some(c) = scanner.peek() {
                if c.is_whitespace() || c == '>' || c == '/' || c == '<' {
                    break;
                }
                token.push(c);
                scanner.bump();
            }
            let number = token.parse::<f64>().map_err(|_| {
                ParseError::InvalidAttributeValue {
                    name: name.clone(),
                    line: value_pos.line,
                    column: value_pos.column,
                }
            })?;
            AttrValue::Number(number)
        }
        // Single quotes, bracketed lists, bare words: rejected, not coerced.
        _ => {
            return Err(ParseError::InvalidAttributeValue {
                name,
                line: value_pos.line,
                column: value_pos.column,
            });
        }
    };

    Ok((name, value))
}

/// Parse a closing tag and return its lowercase-normalized name. The cursor
/// sits on `<` of `</`.
fn parse_close_tag(scanner: &mut Scanner<'_>, close_pos: Pos) -> Result<String, ParseError> {
    scanner.bump(); // '<'
    scanner.bump(); // '/'
    let name = scanner.take_name().to_ascii_lowercase();
    if name.is_empty() {
        return Err(malformed(close_pos));
    }
    scanner.skip_whitespace();
    if !scanner.eat('>') {
        return Err(malformed(close_pos));
    }
    Ok(name)
}

fn malformed(pos: Pos) -> ParseError {
    ParseError::MalformedTag {
        line: pos.line,
        column: pos.column,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use weft_tree::Block;

    use crate::engine::EngineError;

    const MARKER: &str = "@@marker@@";

    /// Wraps the whole input so tests can see exactly what reached the
    /// engine.
    fn paragraph_engine(markdown: &str) -> String {
        format!("<p>{markdown}</p>")
    }

    fn parser() -> Parser {
        Parser::builder()
            .engine(paragraph_engine)
            .interpolation_point(MARKER)
            .build()
            .unwrap()
    }

    fn indented_parser() -> Parser {
        Parser::builder()
            .engine(paragraph_engine)
            .interpolation_point(MARKER)
            .indented_markdown(true)
            .build()
            .unwrap()
    }

    fn text_blocks(element: &Element) -> &[Block] {
        &element.as_text().expect("expected text element").blocks
    }

    #[test]
    fn test_missing_engine() {
        let err = Parser::builder().build().unwrap_err();
        assert!(matches!(err, ParseError::MissingEngine));
    }

    #[test]
    fn test_plain_text_is_single_element() {
        let elements = parser().parse("just some *markdown*").unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(
            text_blocks(&elements[0]),
            &[Block::Html("<p>just some *markdown*</p>".to_owned())]
        );
    }

    #[test]
    fn test_empty_input_is_single_element() {
        let elements = parser().parse("").unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(text_blocks(&elements[0]), &[Block::Html("<p></p>".to_owned())]);
    }

    #[test]
    fn test_tag_names_are_lowercased() {
        let elements = parser().parse("<Card></CARD>").unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].as_tag().unwrap().name, "card");
    }

    #[test]
    fn test_nested_tags_mirror_source_order() {
        let elements = parser()
            .parse("<outer><first></first><second>hi</second></outer>")
            .unwrap();
        assert_eq!(elements.len(), 1);

        let outer = elements[0].as_tag().unwrap();
        assert_eq!(outer.name, "outer");
        assert_eq!(outer.children.len(), 2);
        assert_eq!(outer.children[0].as_tag().unwrap().name, "first");

        let second = outer.children[1].as_tag().unwrap();
        assert_eq!(second.name, "second");
        assert_eq!(
            text_blocks(&second.children[0]),
            &[Block::Html("<p>hi</p>".to_owned())]
        );
    }

    #[test]
    fn test_self_closing_tag() {
        let elements = parser().parse("before<hr/>after").unwrap();
        assert_eq!(elements.len(), 3);
        let hr = elements[1].as_tag().unwrap();
        assert_eq!(hr.name, "hr");
        assert!(hr.children.is_empty());
    }

    #[test]
    fn test_text_and_tags_are_siblings() {
        let elements = parser().parse("intro<note>inner</note>outro").unwrap();
        assert_eq!(elements.len(), 3);
        assert!(elements[0].as_text().is_some());
        assert!(elements[1].as_tag().is_some());
        assert!(elements[2].as_text().is_some());
    }

    #[test]
    fn test_whitespace_between_tags_is_dropped() {
        let elements = parser().parse("<a></a>\n  <b></b>").unwrap();
        assert_eq!(elements.len(), 2);
        assert!(elements.iter().all(|e| e.as_tag().is_some()));
    }

    #[test]
    fn test_attribute_forms() {
        let elements = parser()
            .parse(r#"<video width=560 title="A fine film" src={ item.url }/>"#)
            .unwrap();
        let tag = elements[0].as_tag().unwrap();
        assert_eq!(tag.attr("width"), Some(&AttrValue::Number(560.0)));
        assert_eq!(
            tag.attr("title"),
            Some(&AttrValue::String("A fine film".to_owned()))
        );
        assert_eq!(
            tag.attr("src"),
            Some(&AttrValue::Interpolation(Interpolation::new("item.url")))
        );
    }

    #[test]
    fn test_negative_and_fractional_numbers() {
        let elements = parser().parse("<box x=-1.5 y=.25></box>").unwrap();
        let tag = elements[0].as_tag().unwrap();
        assert_eq!(tag.attr("x"), Some(&AttrValue::Number(-1.5)));
        assert_eq!(tag.attr("y"), Some(&AttrValue::Number(0.25)));
    }

    #[test]
    fn test_interpolations_interleave_with_fragments() {
        let elements = parser().parse("Hi {a}, meet {b}!").unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(
            text_blocks(&elements[0]),
            &[
                Block::Html("<p>Hi ".to_owned()),
                Block::Interpolation(Interpolation::new("a")),
                Block::Html(", meet ".to_owned()),
                Block::Interpolation(Interpolation::new("b")),
                Block::Html("!</p>".to_owned()),
            ]
        );
    }

    #[test]
    fn test_interpolation_does_not_split_elements() {
        // Literal and interpolation content share one text element.
        let elements = parser().parse("x{a}y").unwrap();
        assert_eq!(elements.len(), 1);
    }

    #[test]
    fn test_angle_brackets_inside_interpolation() {
        let elements = parser().parse("{ a < b }").unwrap();
        assert_eq!(
            text_blocks(&elements[0]),
            &[
                Block::Html("<p>".to_owned()),
                Block::Interpolation(Interpolation::new("a < b")),
                Block::Html("</p>".to_owned()),
            ]
        );
    }

    #[test]
    fn test_escaped_characters_stay_literal() {
        let elements = parser().parse(r"\<note\> \{x\}").unwrap();
        assert_eq!(elements.len(), 1);
        assert_eq!(
            text_blocks(&elements[0]),
            &[Block::Html("<p>&lt;note&gt; {x}</p>".to_owned())]
        );
    }

    #[test]
    fn test_unclosed_tag() {
        let err = parser().parse("<outer><inner></inner>").unwrap_err();
        match err {
            ParseError::UnclosedTag { name, line, column } => {
                assert_eq!(name, "outer");
                assert_eq!((line, column), (1, 1));
            }
            other => panic!("expected UnclosedTag, got {other:?}"),
        }
    }

    #[test]
    fn test_unclosed_tag_names_innermost() {
        let err = parser().parse("<outer><inner>").unwrap_err();
        match err {
            ParseError::UnclosedTag { name, .. } => assert_eq!(name, "inner"),
            other => panic!("expected UnclosedTag, got {other:?}"),
        }
    }

    #[test]
    fn test_unmatched_close_tag() {
        let err = parser().parse("<outer><inner></outer>").unwrap_err();
        match err {
            ParseError::UnmatchedCloseTag {
                expected, found, ..
            } => {
                assert_eq!(expected.as_deref(), Some("inner"));
                assert_eq!(found, "outer");
            }
            other => panic!("expected UnmatchedCloseTag, got {other:?}"),
        }
    }

    #[test]
    fn test_close_tag_without_open() {
        let err = parser().parse("</stray>").unwrap_err();
        match err {
            ParseError::UnmatchedCloseTag {
                expected, found, ..
            } => {
                assert_eq!(expected, None);
                assert_eq!(found, "stray");
            }
            other => panic!("expected UnmatchedCloseTag, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_tag() {
        let err = parser().parse("<tag</tag>").unwrap_err();
        assert!(matches!(err, ParseError::MalformedTag { line: 1, column: 1 }));
    }

    #[test]
    fn test_malformed_tag_at_eof() {
        let err = parser().parse("text <tag a=1").unwrap_err();
        assert!(matches!(err, ParseError::MalformedTag { line: 1, column: 6 }));
    }

    #[test]
    fn test_bracketed_attribute_rejected() {
        let err = parser().parse("<tag a=1 b=[123]></tag>").unwrap_err();
        match err {
            ParseError::InvalidAttributeValue { name, .. } => assert_eq!(name, "b"),
            other => panic!("expected InvalidAttributeValue, got {other:?}"),
        }
    }

    #[test]
    fn test_single_quoted_attribute_rejected() {
        let err = parser().parse("<tag a=1 b='123'></tag>").unwrap_err();
        match err {
            ParseError::InvalidAttributeValue { name, .. } => assert_eq!(name, "b"),
            other => panic!("expected InvalidAttributeValue, got {other:?}"),
        }
    }

    #[test]
    fn test_bare_word_attribute_rejected() {
        let err = parser().parse("<tag kind=word></tag>").unwrap_err();
        assert!(matches!(err, ParseError::InvalidAttributeValue { .. }));
    }

    #[test]
    fn test_unterminated_attribute_interpolation() {
        let err = parser().parse("<tag a={></tag>").unwrap_err();
        match err {
            ParseError::UnterminatedInterpolation { line, column } => {
                assert_eq!((line, column), (1, 8));
            }
            other => panic!("expected UnterminatedInterpolation, got {other:?}"),
        }
    }

    #[test]
    fn test_unterminated_text_interpolation() {
        let err = parser().parse("hello {oops").unwrap_err();
        match err {
            ParseError::UnterminatedInterpolation { line, column } => {
                assert_eq!((line, column), (1, 7));
            }
            other => panic!("expected UnterminatedInterpolation, got {other:?}"),
        }
    }

    #[test]
    fn test_indented_markdown_dedents_before_delegation() {
        let elements = indented_parser()
            .parse("    # Heading\n    Some text\n")
            .unwrap();
        assert_eq!(
            text_blocks(&elements[0]),
            &[Block::Html("<p># Heading\nSome text\n</p>".to_owned())]
        );
    }

    #[test]
    fn test_default_mode_preserves_indentation() {
        let elements = parser().parse("    # Heading\n    Some text\n").unwrap();
        assert_eq!(
            text_blocks(&elements[0]),
            &[Block::Html("<p>    # Heading\n    Some text\n</p>".to_owned())]
        );
    }

    #[test]
    fn test_nested_block_computes_own_base() {
        let input = "<card>\n    ## Title\n    body\n</card>";
        let elements = indented_parser().parse(input).unwrap();
        let card = elements[0].as_tag().unwrap();
        assert_eq!(
            text_blocks(&card.children[0]),
            &[Block::Html("<p>\n## Title\nbody\n</p>".to_owned())]
        );
    }

    #[test]
    fn test_bad_indentation_position() {
        let input = "     line1\n     line2\n   line3\n     line4";
        let err = indented_parser().parse(input).unwrap_err();
        match err {
            ParseError::BadIndentation { line, column } => {
                assert_eq!((line, column), (3, 4));
            }
            other => panic!("expected BadIndentation, got {other:?}"),
        }
    }

    #[test]
    fn test_mixed_indentation_fine_when_mode_off() {
        let input = "     line1\n     line2\n   line3\n     line4";
        assert!(parser().parse(input).is_ok());
    }

    #[test]
    fn test_default_markers_are_unique_and_64_chars() {
        let a = Parser::builder().engine(paragraph_engine).build().unwrap();
        let b = Parser::builder().engine(paragraph_engine).build().unwrap();
        assert_eq!(a.interpolation_point().len(), 64);
        assert_eq!(b.interpolation_point().len(), 64);
        assert_ne!(a.interpolation_point(), b.interpolation_point());
    }

    #[test]
    fn test_parser_is_reusable() {
        let parser = parser();
        let first = parser.parse("one {a}").unwrap();
        let second = parser.parse("two {b}").unwrap();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
    }

    #[test]
    fn test_engine_is_called_once_per_text_run() {
        use std::cell::Cell;
        use std::rc::Rc;

        struct CountingEngine(Rc<Cell<usize>>);

        impl MarkdownEngine for CountingEngine {
            fn render(&self, markdown: &str) -> Result<String, EngineError> {
                self.0.set(self.0.get() + 1);
                Ok(markdown.to_owned())
            }
        }

        let calls = Rc::new(Cell::new(0));
        let parser = Parser::builder()
            .engine(CountingEngine(Rc::clone(&calls)))
            .interpolation_point(MARKER)
            .build()
            .unwrap();

        parser.parse("before {a} after<tag>inner</tag>tail").unwrap();
        // Three text runs: before the tag, inside it, after it. The run
        // with two literal segments and an interpolation is still one call.
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_engine_error_propagates() {
        struct FailingEngine;

        impl MarkdownEngine for FailingEngine {
            fn render(&self, _markdown: &str) -> Result<String, EngineError> {
                Err("renderer exploded".into())
            }
        }

        let parser = Parser::builder().engine(FailingEngine).build().unwrap();
        let err = parser.parse("text").unwrap_err();
        match err {
            ParseError::Engine(source) => {
                assert_eq!(source.to_string(), "renderer exploded");
            }
            other => panic!("expected Engine, got {other:?}"),
        }
    }
}
