use crate::{
    anchors::AnchorTable,
    error::{Error, Result},
    line_index::LineIndex,
    locator::Locator,
    selector::Selector,
    tree::{self, Node, NodeKind, Position},
};

/// One parsed state of the buffer. Every edit produces a new snapshot, so the tree,
/// anchor table and line index always describe `source` exactly.
#[derive(Debug, Clone, fieldwork::Fieldwork)]
#[fieldwork(get)]
pub struct Snapshot {
    source: String,
    lines: LineIndex,
    root: Node,
    anchors: AnchorTable,
}

/// A resolved path: the node, its structural parent and its index there.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Target<'a> {
    pub node: &'a Node,
    pub parent: Option<&'a Node>,
    pub index: Option<usize>,
}

impl<'a> Target<'a> {
    /// Parent and index, for edits that change an entry of a container.
    pub fn entry(&self, action: &str) -> Result<(&'a Node, usize)> {
        match (self.parent, self.index) {
            (Some(parent), Some(index))
                if !matches!(parent.kind(), NodeKind::Stream | NodeKind::Document) =>
            {
                Ok((parent, index))
            }
            _ => Err(Error::TypeMismatch(format!(
                "cannot {action} the document root"
            ))),
        }
    }
}

/// The key paired with the value at `index` of a mapping.
pub(crate) fn paired_key(mapping: &Node, index: usize) -> Result<&Node> {
    if index % 2 == 0 {
        return Err(Error::internal(format!(
            "child {index} of the mapping at {} is a key, not a value",
            mapping.start()
        )));
    }
    Ok(&mapping.children()[index - 1])
}

impl Snapshot {
    pub fn parse(source: String) -> Result<Self> {
        let lines = LineIndex::new(&source);
        let root = tree::parse(&source, &lines)?;
        let anchors = AnchorTable::build(&root);
        Ok(Self {
            source,
            lines,
            root,
            anchors,
        })
    }

    pub fn locator(&self) -> Locator<'_> {
        Locator::new(&self.root, &self.anchors)
    }

    pub(crate) fn resolve(&self, path: &str) -> Result<Target<'_>> {
        let selector = Selector::parse(path)?;
        let locator = self.locator();
        let location = locator
            .locate(&selector)?
            .ok_or_else(|| Error::NotFound {
                path: path.to_string(),
            })?;

        Ok(Target {
            node: locator.node(location.target())?,
            parent: location
                .parent()
                .map(|parent| locator.node(parent))
                .transpose()?,
            index: location.index(),
        })
    }

    pub(crate) fn offset(&self, position: Position) -> usize {
        self.lines.offset(position)
    }

    pub(crate) fn line_start(&self, line: usize) -> usize {
        self.lines.line_start(line)
    }

    /// Byte range of the node's own content.
    pub(crate) fn span(&self, node: &Node) -> std::ops::Range<usize> {
        self.offset(node.start())..self.offset(node.end())
    }

    pub(crate) fn text(&self, node: &Node) -> &str {
        &self.source[self.span(node)]
    }

    /// Text between the start of the line holding `offset` and `offset`.
    pub(crate) fn line_prefix(&self, offset: usize) -> &str {
        let line = self.lines.position(offset).line;
        &self.source[self.line_start(line)..offset]
    }

    /// Where a new line can be inserted after the one holding `position`. At the end of
    /// a buffer without a trailing newline, `content` is moved onto a line of its own.
    pub(crate) fn after_line(&self, position: Position, content: String) -> (usize, String) {
        let at = self.lines.next_line_start(position);
        if at == self.source.len() && !self.source.is_empty() && !self.source.ends_with('\n') {
            (at, format!("\n{}", content.trim_end_matches('\n')))
        } else {
            (at, content)
        }
    }
}
