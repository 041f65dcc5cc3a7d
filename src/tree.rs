//! Positioned YAML node tree.
//!
//! The tree is built from `saphyr-parser` events. The event parser reports spans for
//! scalars reliably, but container spans follow the scanner's token marks (block ends
//! land on the *next* token, flow mapping ends on the last value), so container bounds
//! are derived from their children and the source text instead.

mod builder;

pub(crate) use builder::item_marker;

use std::fmt::{self, Display, Formatter};

use crate::{error::Result, line_index::LineIndex};

/// A zero-based line and byte column in the source buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line + 1, self.column + 1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Style {
    /// Indentation based: `key: value` lines and `- item` lines.
    Block,
    /// Bracketed: `{ key: value }` and `[item, item]`.
    Flow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeKind {
    Stream,
    Document,
    Mapping(Style),
    Sequence(Style),
    /// Decoded scalar text.
    Scalar(String),
    /// Name of the referenced anchor.
    Alias(String),
}

impl NodeKind {
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Stream => "stream",
            NodeKind::Document => "document",
            NodeKind::Mapping(_) => "mapping",
            NodeKind::Sequence(_) => "sequence",
            NodeKind::Scalar(_) => "scalar",
            NodeKind::Alias(_) => "alias",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, fieldwork::Fieldwork)]
#[fieldwork(get)]
pub struct Node {
    kind: NodeKind,
    #[fieldwork(get(copy))]
    start: Position,
    /// End of the node's own content (exclusive).
    #[fieldwork(get(copy))]
    end: Position,
    anchor: Option<String>,
    /// Mapping children alternate key, value.
    children: Vec<Node>,
}

impl Node {
    pub(crate) fn new(
        kind: NodeKind,
        start: Position,
        end: Position,
        anchor: Option<String>,
        children: Vec<Node>,
    ) -> Self {
        Self {
            kind,
            start,
            end,
            anchor,
            children,
        }
    }

    pub fn style(&self) -> Option<Style> {
        match self.kind {
            NodeKind::Mapping(style) | NodeKind::Sequence(style) => Some(style),
            _ => None,
        }
    }

    pub fn is_mapping(&self) -> bool {
        matches!(self.kind, NodeKind::Mapping(_))
    }

    pub fn is_sequence(&self) -> bool {
        matches!(self.kind, NodeKind::Sequence(_))
    }

    pub fn is_flow(&self) -> bool {
        self.style() == Some(Style::Flow)
    }

    pub fn scalar(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Scalar(text) => Some(text),
            _ => None,
        }
    }

    pub fn alias(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::Alias(name) => Some(name),
            _ => None,
        }
    }

    /// Follows a chain of child indices down from this node.
    pub fn descendant(&self, path: &[usize]) -> Option<&Node> {
        path.iter()
            .try_fold(self, |node, &index| node.children.get(index))
    }

    /// Number of entries: key/value pairs for a mapping, children otherwise.
    pub fn entry_count(&self) -> usize {
        if self.is_mapping() {
            self.children.len() / 2
        } else {
            self.children.len()
        }
    }
}

/// Parses `source` into a positioned tree rooted at a [`NodeKind::Stream`] node.
pub fn parse(source: &str, lines: &LineIndex) -> Result<Node> {
    builder::TreeBuilder::new(source, lines)?.build_stream()
}
