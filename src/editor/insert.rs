use serde_yaml::Value;

use super::{edit::Splice, snapshot::Snapshot};
use crate::{
    error::{Error, Result},
    fragment::Fragment,
    indentation::Indentation,
    tree::{item_marker, Node},
};

fn flow_scalar(fragment: &Fragment, container: &Node) -> Result<String> {
    if fragment.is_container() || fragment.is_multiline() {
        return Err(Error::UnsupportedEdit(format!(
            "complex values cannot be added to the flow {} at {}",
            container.kind().name(),
            container.start()
        )));
    }
    Ok(fragment.text().trim().to_string())
}

/// Replaces the inside of an empty `{}` or `[]` with ` content `.
fn fill_empty(snapshot: &Snapshot, container: &Node, content: &str) -> Splice {
    let bounds = snapshot.span(container);
    let inner = bounds.start + 1..bounds.end.saturating_sub(1).max(bounds.start + 1);
    Splice::replace(inner, format!(" {content} "))
}

pub(super) fn map_add(snapshot: &Snapshot, path: &str, key: &str, value: &Value) -> Result<Splice> {
    let target = snapshot.resolve(path)?;
    let mapping = target.node;
    if !mapping.is_mapping() {
        return Err(Error::TypeMismatch(format!(
            "`{path}` is a {}, keys can only be added to a mapping",
            mapping.kind().name()
        )));
    }

    let key = Fragment::render(&key.into())?;
    if key.is_multiline() {
        return Err(Error::UnsupportedEdit(format!(
            "key {:?} does not fit on one line",
            key.text()
        )));
    }
    let fragment = Fragment::render(value)?;

    if mapping.is_flow() {
        let entry = format!("{}: {}", key.text(), flow_scalar(&fragment, mapping)?);
        return Ok(match mapping.children().last() {
            Some(last) => Splice::insert(snapshot.offset(last.end()), format!(", {entry}")),
            None => fill_empty(snapshot, mapping, &entry),
        });
    }

    let (Some(first), Some(last)) = (mapping.children().first(), mapping.children().last()) else {
        return Err(Error::internal(format!(
            "block mapping at {} has no entries",
            mapping.start()
        )));
    };
    let indentation = Indentation::at(first.start().column);
    let line = if fragment.is_container() {
        format!(
            "{indentation}{}:\n{}\n",
            key.text(),
            fragment.indented(indentation.nested(), true)
        )
    } else {
        format!(
            "{indentation}{}: {}\n",
            key.text(),
            fragment.indented(indentation.nested(), false)
        )
    };

    let (at, content) = snapshot.after_line(last.end(), line);
    Ok(Splice::insert(at, content))
}

pub(super) fn seq_add(
    snapshot: &Snapshot,
    path: &str,
    value: &Value,
    index: Option<usize>,
) -> Result<Splice> {
    let target = snapshot.resolve(path)?;
    let sequence = target.node;
    if !sequence.is_sequence() {
        return Err(Error::TypeMismatch(format!(
            "`{path}` is a {}, items can only be added to a sequence",
            sequence.kind().name()
        )));
    }

    let fragment = Fragment::render(value)?;
    let children = sequence.children();
    let before = index.and_then(|index| children.get(index));

    if sequence.is_flow() {
        let item = flow_scalar(&fragment, sequence)?;
        return Ok(match (before, children.last()) {
            (Some(next), _) => Splice::insert(snapshot.offset(next.start()), format!("{item}, ")),
            (None, Some(last)) => Splice::insert(snapshot.offset(last.end()), format!(", {item}")),
            (None, None) => fill_empty(snapshot, sequence, &item),
        });
    }

    let indentation = Indentation::at(sequence.start().column);
    let line = format!(
        "{indentation}- {}\n",
        fragment.indented(indentation.nested(), false)
    );

    match (before, children.last()) {
        (Some(next), _) => {
            let start = snapshot.offset(next.start());
            let marker = item_marker(snapshot.source(), start).unwrap_or(start);
            let prefix = snapshot.line_prefix(marker);
            if prefix.trim().is_empty() {
                return Ok(Splice::insert(marker - prefix.len(), line));
            }
            // `- - a`: the element shares its line with an outer marker
            Ok(Splice::insert(
                marker,
                format!("{}{indentation}", line.trim_start()),
            ))
        }
        (None, Some(last)) => {
            let (at, content) = snapshot.after_line(last.end(), line);
            Ok(Splice::insert(at, content))
        }
        (None, None) => Err(Error::internal(format!(
            "block sequence at {} has no entries",
            sequence.start()
        ))),
    }
}
