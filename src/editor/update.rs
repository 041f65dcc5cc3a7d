use serde_yaml::Value;

use super::{
    edit::Splice,
    snapshot::{paired_key, Snapshot},
};
use crate::{
    error::{Error, Result},
    fragment::Fragment,
    indentation::Indentation,
    tree::{Node, NodeKind, Style},
};

pub(super) fn plan(snapshot: &Snapshot, path: &str, value: &Value) -> Result<Splice> {
    let target = snapshot.resolve(path)?;
    let (parent, index) = target.entry("update")?;
    let fragment = Fragment::render(value)?;
    let node = target.node;

    let splice = match parent.kind() {
        NodeKind::Mapping(Style::Block) => {
            block_mapping_value(snapshot, paired_key(parent, index)?, node, &fragment)
        }
        NodeKind::Mapping(Style::Flow) | NodeKind::Sequence(Style::Flow) => {
            if fragment.is_container() || fragment.is_multiline() {
                return Err(Error::UnsupportedEdit(format!(
                    "`{path}` is inside a flow {}; only single-line scalars fit there",
                    parent.kind().name()
                )));
            }
            (snapshot.span(node), fragment.text().trim().to_string())
        }
        NodeKind::Sequence(Style::Block) => (
            snapshot.span(node),
            fragment.indented(Indentation::at(node.start().column), false),
        ),
        other => {
            return Err(Error::TypeMismatch(format!(
                "cannot update a value inside a {}",
                other.name()
            )))
        }
    };

    let (range, mut content) = splice;
    if range.is_empty()
        && !content.starts_with(char::is_whitespace)
        && snapshot.source()[..range.start]
            .chars()
            .next_back()
            .is_some_and(|c| !c.is_whitespace())
    {
        content.insert(0, ' ');
    }
    Ok(Splice::replace(range, content))
}

fn block_mapping_value(
    snapshot: &Snapshot,
    key: &Node,
    node: &Node,
    fragment: &Fragment,
) -> (std::ops::Range<usize>, String) {
    let level = Indentation::at(key.start().column).nested();
    let span = snapshot.span(node);

    // properties and the `:` indicator stay; whitespace up to the value may go
    let gap_start = snapshot.offset(key.end()).min(span.start);
    let gap = &snapshot.source()[gap_start..span.start];
    let pulled_back = (!gap.contains('#')).then(|| gap_start + gap.trim_end().len());

    if fragment.is_container() {
        return match pulled_back {
            Some(start) => (start..span.end, format!("\n{}", fragment.indented(level, true))),
            None => (
                span,
                fragment.indented(Indentation::at(node.start().column), false),
            ),
        };
    }

    let detached = node.start().line > key.end().line || span.is_empty();
    match pulled_back {
        Some(start) if detached => (
            start..span.end,
            format!(" {}", fragment.indented(level, false)),
        ),
        _ => (span, fragment.indented(level, false)),
    }
}
