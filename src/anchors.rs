use std::collections::HashMap;

use crate::{
    error::{Error, Result},
    locator::NodePath,
    tree::{Node, NodeKind},
};

/// Anchor name to the address of the node that defines it.
///
/// Only values are walked: an anchor placed on a mapping key is never recorded, so an
/// alias to it fails with [`Error::UnknownAnchor`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnchorTable {
    anchors: HashMap<String, NodePath>,
}

impl AnchorTable {
    pub fn build(root: &Node) -> Self {
        let mut table = Self::default();
        let mut path = NodePath::new();
        table.visit(root, &mut path);
        log::trace!("anchor table: {:?}", table.anchors);
        table
    }

    fn visit(&mut self, node: &Node, path: &mut NodePath) {
        if let Some(name) = node.anchor() {
            self.anchors.insert(name.to_string(), path.clone());
        }

        let children = node.children().iter().enumerate();
        match node.kind() {
            NodeKind::Stream | NodeKind::Document => {
                for (index, child) in children.take(1) {
                    self.descend(child, index, path);
                }
            }
            NodeKind::Sequence(_) => {
                for (index, child) in children {
                    self.descend(child, index, path);
                }
            }
            NodeKind::Mapping(_) => {
                for (index, child) in children.skip(1).step_by(2) {
                    self.descend(child, index, path);
                }
            }
            NodeKind::Scalar(_) | NodeKind::Alias(_) => {}
        }
    }

    fn descend(&mut self, child: &Node, index: usize, path: &mut NodePath) {
        path.push(index);
        self.visit(child, path);
        path.pop();
    }

    pub fn get(&self, name: &str) -> Option<&NodePath> {
        self.anchors.get(name)
    }

    /// Looks up the node defining `name` in `root`.
    pub fn resolve<'a>(&self, root: &'a Node, name: &str) -> Result<(&'a Node, &NodePath)> {
        let path = self.get(name).ok_or_else(|| Error::UnknownAnchor {
            name: name.to_string(),
        })?;
        let node = root
            .descendant(path)
            .ok_or_else(|| Error::internal(format!("anchor `{name}` points outside the tree")))?;
        Ok((node, path))
    }

    pub fn len(&self) -> usize {
        self.anchors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.anchors.is_empty()
    }
}
