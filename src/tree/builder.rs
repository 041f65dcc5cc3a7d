use std::collections::HashMap;

use saphyr_parser::{Event, Parser, ScalarStyle, ScanError, Span};

use super::{Node, NodeKind, Position, Style};
use crate::{
    error::{Error, Result},
    line_index::LineIndex,
};

fn collect_events(source: &str) -> Result<Vec<(Event<'_>, Span)>> {
    Parser::new_from_str(source)
        .map(|result| result.map_err(|error| syntax_error(source, &error)))
        .collect()
}

fn syntax_error(source: &str, error: &ScanError) -> Error {
    let marker = error.marker();
    Error::Syntax {
        line: marker.line(),
        column: marker.col() + 1,
        message: error.info().to_string(),
        text: source.to_string(),
    }
}

/// What a node-opening event carries once it has been copied out of the event buffer.
enum Opening {
    Scalar(String, ScalarStyle, usize),
    Sequence(usize),
    Mapping(usize),
    Alias(usize),
}

pub(super) struct TreeBuilder<'a> {
    source: &'a str,
    lines: &'a LineIndex,
    events: Vec<(Event<'a>, Span)>,
    pos: usize,
    /// Marker indices count chars; slicing needs bytes.
    char_to_byte: Vec<usize>,
    /// The event parser numbers anchors; aliases refer to those numbers.
    anchor_names: HashMap<usize, String>,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(source: &'a str, lines: &'a LineIndex) -> Result<Self> {
        let events = collect_events(source)?;
        let mut char_to_byte: Vec<usize> = source.char_indices().map(|(b, _)| b).collect();
        char_to_byte.push(source.len());

        Ok(Self {
            source,
            lines,
            events,
            pos: 0,
            char_to_byte,
            anchor_names: HashMap::new(),
        })
    }

    fn to_byte(&self, char_idx: usize) -> usize {
        self.char_to_byte
            .get(char_idx)
            .copied()
            .unwrap_or(self.source.len())
    }

    fn position(&self, offset: usize) -> Position {
        self.lines.position(offset)
    }

    fn offset(&self, position: Position) -> usize {
        self.lines.offset(position)
    }

    fn peek(&self) -> Option<&Event<'a>> {
        self.events.get(self.pos).map(|(event, _)| event)
    }

    pub fn build_stream(mut self) -> Result<Node> {
        match self.peek() {
            Some(Event::StreamStart) => self.pos += 1,
            other => {
                return Err(Error::internal(format!(
                    "expected stream start, found {other:?}"
                )))
            }
        }

        let mut documents = Vec::new();
        loop {
            match self.peek() {
                Some(Event::DocumentStart(_)) => documents.push(self.build_document()?),
                Some(Event::StreamEnd) | None => break,
                Some(other) => {
                    return Err(Error::internal(format!(
                        "unexpected {other:?} between documents"
                    )))
                }
            }
        }

        Ok(Node::new(
            NodeKind::Stream,
            Position::default(),
            self.position(self.source.len()),
            None,
            documents,
        ))
    }

    fn build_document(&mut self) -> Result<Node> {
        self.pos += 1;
        let root = self.build_node()?;
        if matches!(self.peek(), Some(Event::DocumentEnd)) {
            self.pos += 1;
        }
        Ok(Node::new(
            NodeKind::Document,
            root.start(),
            root.end(),
            None,
            vec![root],
        ))
    }

    fn build_node(&mut self) -> Result<Node> {
        let Some((event, span)) = self.events.get(self.pos) else {
            return Err(Error::internal("event stream ended inside a document"));
        };
        let span = *span;
        let opening = match event {
            Event::Scalar(value, style, anchor_id, _) => {
                Opening::Scalar(value.to_string(), *style, *anchor_id)
            }
            Event::SequenceStart(anchor_id, _) => Opening::Sequence(*anchor_id),
            Event::MappingStart(anchor_id, _) => Opening::Mapping(*anchor_id),
            Event::Alias(id) => Opening::Alias(*id),
            other => {
                return Err(Error::internal(format!(
                    "unexpected {other:?} where a node was expected"
                )))
            }
        };
        self.pos += 1;

        match opening {
            Opening::Scalar(value, style, anchor_id) => {
                Ok(self.build_scalar(value, style, anchor_id, span))
            }
            Opening::Sequence(anchor_id) => self.build_collection(false, anchor_id, span),
            Opening::Mapping(anchor_id) => self.build_collection(true, anchor_id, span),
            Opening::Alias(id) => Ok(self.build_alias(id, span)),
        }
    }

    fn build_scalar(
        &mut self,
        mut value: String,
        style: ScalarStyle,
        anchor_id: usize,
        span: Span,
    ) -> Node {
        let marked = self.to_byte(span.start.index());
        let mut start = skip_properties(self.source, marked);
        let mut end = self.to_byte(span.end.index()).max(start);

        match style {
            ScalarStyle::SingleQuoted | ScalarStyle::DoubleQuoted => {
                if let Some(close) = quoted_end(self.source, start) {
                    end = close;
                }
            }
            // a missing value: zero width, reported by the scanner as `~`
            ScalarStyle::Plain if start == end => {
                if let Some(after) = indicator_end(self.source, start) {
                    start = after;
                    end = after;
                }
                value.clear();
            }
            ScalarStyle::Literal | ScalarStyle::Folded => {
                end = start + self.source[start..end].trim_end().len();
                if let Some(header) = block_scalar_header(self.source, start) {
                    start = header;
                }
            }
            _ => end = start + self.source[start..end].trim_end().len(),
        }

        let anchor = self.register_anchor(anchor_id, marked.min(start));
        Node::new(
            NodeKind::Scalar(value),
            self.position(start),
            self.position(end),
            anchor,
            Vec::new(),
        )
    }

    fn build_collection(&mut self, mapping: bool, anchor_id: usize, span: Span) -> Result<Node> {
        let marked = self.to_byte(span.start.index());
        let opened = skip_properties(self.source, marked);
        let (opener, closer) = if mapping { (b'{', b'}') } else { (b'[', b']') };
        let style = if self.source.as_bytes().get(opened) == Some(&opener) {
            Style::Flow
        } else {
            Style::Block
        };

        // registered before the children so that nested aliases can name it
        let anchor = self.register_anchor(anchor_id, marked);

        let mut children = Vec::new();
        loop {
            match self.peek() {
                Some(Event::MappingEnd | Event::SequenceEnd) => {
                    self.pos += 1;
                    break;
                }
                Some(_) => children.push(self.build_node()?),
                None => return Err(Error::internal("collection is never closed")),
            }
        }

        if mapping && children.len() % 2 != 0 {
            return Err(Error::internal(format!(
                "mapping at {} has an odd number of children",
                self.position(opened)
            )));
        }

        let first_child = children.first().map(|child| self.offset(child.start()));
        let last_child = children.iter().map(|child| self.offset(child.end())).max();

        let (start, end) = match style {
            Style::Flow => {
                let from = last_child.unwrap_or(opened + 1).max(opened + 1);
                (opened, self.flow_end(from, closer))
            }
            Style::Block => {
                // a sequence is marked at its first item, which may sit past the `-`
                let marker = (!mapping)
                    .then(|| {
                        first_child
                            .and_then(|at| item_marker(self.source, at))
                            .or_else(|| {
                                (self.source.as_bytes().get(opened) == Some(&b'-'))
                                    .then_some(opened)
                            })
                    })
                    .flatten();
                let start = marker.unwrap_or_else(|| first_child.unwrap_or(opened));
                (start, last_child.unwrap_or(start))
            }
        };

        let kind = if mapping {
            NodeKind::Mapping(style)
        } else {
            NodeKind::Sequence(style)
        };

        Ok(Node::new(
            kind,
            self.position(start),
            self.position(end),
            anchor,
            children,
        ))
    }

    fn build_alias(&mut self, id: usize, span: Span) -> Node {
        let start = self.to_byte(span.start.index());
        let end = alias_end(self.source, start).unwrap_or_else(|| self.to_byte(span.end.index()));
        let name = self
            .anchor_names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| self.source[start..end].trim_start_matches('*').to_string());

        Node::new(
            NodeKind::Alias(name),
            self.position(start),
            self.position(end),
            None,
            Vec::new(),
        )
    }

    fn register_anchor(&mut self, anchor_id: usize, start: usize) -> Option<String> {
        if anchor_id == 0 {
            return None;
        }
        let name =
            anchor_label(self.source, start).unwrap_or_else(|| format!("anchor-{anchor_id}"));
        self.anchor_names.insert(anchor_id, name.clone());
        Some(name)
    }

    /// Finds the closing bracket after the last entry of a flow collection and returns the
    /// offset just past it. Only separators and comments may sit in between.
    fn flow_end(&self, from: usize, closer: u8) -> usize {
        let bytes = self.source.as_bytes();
        let mut at = from;
        while let Some(&byte) = bytes.get(at) {
            match byte {
                b' ' | b'\t' | b'\r' | b'\n' | b',' => at += 1,
                b'#' => {
                    while bytes.get(at).is_some_and(|byte| *byte != b'\n') {
                        at += 1;
                    }
                }
                byte if byte == closer => return at + 1,
                _ => break,
            }
        }

        log::debug!(
            "no `{}` found after {}, using the last entry as the end",
            closer as char,
            self.position(from)
        );
        from
    }
}

/// Offset just past the closing quote of a quoted scalar opening at `start`.
fn quoted_end(source: &str, start: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let quote = *bytes.get(start)?;
    if quote != b'\'' && quote != b'"' {
        return None;
    }

    let mut at = start + 1;
    while let Some(&byte) = bytes.get(at) {
        if quote == b'"' && byte == b'\\' {
            at += 2;
            continue;
        }
        if byte == quote {
            if quote == b'\'' && bytes.get(at + 1) == Some(&b'\'') {
                at += 2;
                continue;
            }
            return Some(at + 1);
        }
        at += 1;
    }
    None
}

/// A missing value is reported wherever the scanner happened to be: on the `:` itself,
/// or as far on as the next key. Pin it right after the `:`, `-` or `?` indicator it
/// belongs to.
fn indicator_end(source: &str, at: usize) -> Option<usize> {
    let head = source[..at].trim_end();
    if head.ends_with(|c: char| matches!(c, ':' | '-' | '?')) {
        return Some(head.len());
    }

    let after = source[at..].strip_prefix(':')?;
    after
        .starts_with(|c: char| c.is_whitespace() || is_flow_indicator(c))
        .then_some(at + 1)
        .or_else(|| after.is_empty().then_some(at + 1))
}

/// Offset of the `|` or `>` header of a block scalar whose content starts at `start`.
fn block_scalar_header(source: &str, start: usize) -> Option<usize> {
    let is_indicator = |c: char| c == '|' || c == '>';
    if source[start..].starts_with(is_indicator) {
        return Some(start);
    }

    let head = source[..start].trim_end();
    let line_start = head.rfind('\n').map_or(0, |i| i + 1);
    let line = &head[line_start..];
    let code = line
        .match_indices('#')
        .find(|(i, _)| line[..*i].ends_with(char::is_whitespace))
        .map_or(line, |(i, _)| &line[..i])
        .trim_end();

    let token_start = code.rfind(char::is_whitespace).map_or(0, |i| i + 1);
    let token = &code[token_start..];
    let modifiers = token.strip_prefix(is_indicator)?;
    modifiers
        .chars()
        .all(|c| c == '+' || c == '-' || c.is_ascii_digit())
        .then_some(line_start + token_start)
}

/// Offset of the `-` that introduces the block sequence item starting at `at`, looking
/// back over any `&anchor` or `!tag` written between the two.
pub(crate) fn item_marker(source: &str, mut at: usize) -> Option<usize> {
    loop {
        let head = source[..at].trim_end();
        if head.ends_with('-') {
            return Some(head.len() - 1);
        }
        let token_start = head.rfind(char::is_whitespace).map_or(0, |i| i + 1);
        let property = head[token_start..].starts_with(|c: char| c == '&' || c == '!');
        if token_start < head.len() && property {
            at = token_start;
        } else {
            return None;
        }
    }
}

fn alias_end(source: &str, start: usize) -> Option<usize> {
    let name = source[start..].strip_prefix('*')?;
    let len = name
        .find(|c: char| c.is_whitespace() || is_flow_indicator(c))
        .unwrap_or(name.len());
    Some(start + 1 + len)
}

fn is_flow_indicator(c: char) -> bool {
    matches!(c, ',' | '[' | ']' | '{' | '}')
}

/// Steps over `&anchor` and `!tag` properties (and the blanks after them) when a mark
/// points at the properties instead of the content.
fn skip_properties(source: &str, mut at: usize) -> usize {
    while source[at..].starts_with(|c: char| matches!(c, '&' | '!')) {
        let rest = &source[at..];
        at += rest
            .find(|c: char| c.is_whitespace() || is_flow_indicator(c))
            .unwrap_or(rest.len());
        let rest = &source[at..];
        at += rest.len() - rest.trim_start_matches(|c| c == ' ' || c == '\t').len();
    }
    at
}

/// Reads the `&name` property written at or in front of the node starting at `start`. A
/// tag may sit on either side of the anchor.
fn anchor_label(source: &str, start: usize) -> Option<String> {
    if let Some(rest) = source[start..].strip_prefix('&') {
        let len = rest
            .find(|c: char| c.is_whitespace() || is_flow_indicator(c))
            .unwrap_or(rest.len());
        return (len > 0).then(|| rest[..len].to_string());
    }

    let mut head = &source[..start];
    for _ in 0..2 {
        head = head.trim_end();
        let token_start = head
            .rfind(|c: char| c.is_ascii_whitespace() || matches!(c, '[' | '{' | ','))
            .map_or(0, |i| i + 1);
        let token = &head[token_start..];
        if let Some(name) = token.strip_prefix('&') {
            return (!name.is_empty()).then(|| name.to_string());
        }
        if !token.starts_with('!') {
            return None;
        }
        head = &head[..token_start];
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quoted_scalars_end_after_their_closing_quote() {
        assert_eq!(quoted_end("k: 'it''s' # c", 3), Some(10));
        assert_eq!(quoted_end(r#"k: "a\"b" x"#, 3), Some(9));
        assert_eq!(quoted_end("k: 'open", 3), None);
        assert_eq!(quoted_end("k: plain", 3), None);
    }

    #[test]
    fn missing_values_attach_to_their_indicator() {
        assert_eq!(indicator_end("empty:\nnext: 1", 7), Some(6));
        assert_eq!(indicator_end("empty:\nnext: 1", 5), Some(6));
        assert_eq!(indicator_end("{a: , b: 1}", 2), Some(3));
        assert_eq!(indicator_end("- \n- b", 3), Some(1));
        assert_eq!(indicator_end("key: &a\n", 8), None);
    }

    #[test]
    fn block_scalar_headers_include_modifiers() {
        assert_eq!(block_scalar_header("a: |\n  x\n", 7), Some(3));
        assert_eq!(block_scalar_header("a: >-2 # folded\n\n  x\n", 19), Some(3));
        assert_eq!(block_scalar_header("- |+\n  x\n", 7), Some(2));
        assert_eq!(block_scalar_header("a: |\n  x\n", 3), Some(3));
        assert_eq!(block_scalar_header("a:\n  x\n", 6), None);
    }

    #[test]
    fn item_markers_are_found_behind_properties() {
        assert_eq!(item_marker("l:\n- a\n", 5), Some(3));
        assert_eq!(item_marker("- - a\n", 4), Some(2));
        assert_eq!(item_marker("- - a\n", 2), Some(0));
        assert_eq!(item_marker("- &x !!str a\n", 11), Some(0));
        assert_eq!(item_marker("-\n  a\n", 4), Some(0));
        assert_eq!(item_marker("k: a\n", 3), None);
    }

    #[test]
    fn anchor_labels_skip_tags() {
        assert_eq!(anchor_label("a: &base x", 9).as_deref(), Some("base"));
        assert_eq!(anchor_label("a: &base !!str x", 15).as_deref(), Some("base"));
        assert_eq!(anchor_label("a: !!str &base x", 15).as_deref(), Some("base"));
        assert_eq!(anchor_label("[&first a]", 8).as_deref(), Some("first"));
        assert_eq!(anchor_label("a: x", 3), None);
    }

    #[test]
    fn alias_names_stop_at_flow_indicators() {
        assert_eq!(alias_end("[*a, b]", 1), Some(3));
        assert_eq!(alias_end("k: *anchor\n", 3), Some(10));
        assert_eq!(alias_end("k: v", 3), None);
    }
}
