use crate::{
    anchors::AnchorTable,
    error::{Error, Result},
    selector::{Segment, Selector},
    tree::{Node, NodeKind},
};

/// Address of a node: child indices followed from the stream root.
pub type NodePath = Vec<usize>;

/// Where a selector landed in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    target: NodePath,
    /// Structural parent of the target. For a node reached through an alias this is
    /// the parent of the anchored definition, not of the alias.
    parent: Option<NodePath>,
}

impl Location {
    pub fn target(&self) -> &[usize] {
        &self.target
    }

    pub fn parent(&self) -> Option<&[usize]> {
        self.parent.as_deref()
    }

    /// Index of the target among its parent's children.
    pub fn index(&self) -> Option<usize> {
        self.parent.as_ref().and_then(|_| self.target.last().copied())
    }
}

/// Resolves selectors against one parsed tree.
#[derive(Debug, Clone, Copy)]
pub struct Locator<'a> {
    root: &'a Node,
    anchors: &'a AnchorTable,
}

impl<'a> Locator<'a> {
    pub fn new(root: &'a Node, anchors: &'a AnchorTable) -> Self {
        Self { root, anchors }
    }

    pub fn node(&self, path: &[usize]) -> Result<&'a Node> {
        self.root
            .descendant(path)
            .ok_or_else(|| Error::internal(format!("no node at {path:?}")))
    }

    /// Walks `selector` one segment at a time. `Ok(None)` means some segment had nothing
    /// to match; nothing partial is returned.
    pub fn locate(&self, selector: &Selector) -> Result<Option<Location>> {
        let (mut target, mut parent) = self.settle(NodePath::new(), None)?;

        for segment in selector.segments().iter() {
            let node = self.node(&target)?;
            let Some(index) = self.step(node, segment)? else {
                log::debug!("`{segment}` matched nothing under {}", node.kind().name());
                return Ok(None);
            };
            let mut child = target.clone();
            child.push(index);
            (target, parent) = self.settle(child, Some(target))?;
        }

        Ok(Some(Location { target, parent }))
    }

    /// Unwraps stream and document wrappers and follows aliases to their anchor.
    fn settle(
        &self,
        mut path: NodePath,
        mut parent: Option<NodePath>,
    ) -> Result<(NodePath, Option<NodePath>)> {
        loop {
            let node = self.node(&path)?;
            match node.kind() {
                NodeKind::Stream | NodeKind::Document if !node.children().is_empty() => {
                    path.push(0);
                }
                NodeKind::Alias(name) => {
                    let (_, defined_at) = self.anchors.resolve(self.root, name)?;
                    path = defined_at.clone();
                    parent = path.split_last().map(|(_, rest)| rest.to_vec());
                }
                _ => return Ok((path, parent)),
            }
        }
    }

    fn deref(&self, node: &'a Node) -> Result<&'a Node> {
        match node.alias() {
            Some(name) => Ok(self.anchors.resolve(self.root, name)?.0),
            None => Ok(node),
        }
    }

    fn step(&self, node: &'a Node, segment: &Segment) -> Result<Option<usize>> {
        let children = node.children();
        match (segment, node.kind()) {
            (Segment::Key(key), NodeKind::Mapping(_)) => {
                if children.len() % 2 != 0 {
                    return Err(Error::internal(format!(
                        "mapping at {} has an odd number of children",
                        node.start()
                    )));
                }
                Ok(children
                    .chunks(2)
                    .position(|pair| pair[0].scalar() == Some(key.as_str()))
                    .map(|pair| pair * 2 + 1))
            }

            (Segment::Key(key), NodeKind::Sequence(_)) => {
                for (index, child) in children.iter().enumerate() {
                    if self.deref(child)?.scalar() == Some(key.as_str()) {
                        return Ok(Some(index));
                    }
                }
                Ok(None)
            }

            (Segment::Index(index), NodeKind::Sequence(_)) => {
                Ok((*index < children.len()).then_some(*index))
            }

            (Segment::Filter { key, value }, NodeKind::Sequence(_)) => {
                let expected = value.to_string();
                for (index, child) in children.iter().enumerate() {
                    let element = self.deref(child)?;
                    if !element.is_mapping() {
                        continue;
                    }
                    let Some(value_index) = self.step(element, &Segment::Key(key.clone()))? else {
                        continue;
                    };
                    let held = self.deref(&element.children()[value_index])?;
                    if held.scalar() == Some(expected.as_str()) {
                        return Ok(Some(index));
                    }
                }
                Ok(None)
            }

            _ => Ok(None),
        }
    }
}
