use super::{
    edit::Splice,
    snapshot::{paired_key, Snapshot},
};
use crate::{
    error::Result,
    tree::{item_marker, Node},
};

pub(super) fn plan(snapshot: &Snapshot, path: &str) -> Result<Splice> {
    let target = snapshot.resolve(path)?;
    let (parent, index) = target.entry("delete")?;

    let (first, position) = if parent.is_mapping() {
        (paired_key(parent, index)?, index / 2)
    } else {
        (target.node, index)
    };

    if parent.is_flow() {
        Ok(flow(snapshot, parent, first, target.node, position))
    } else {
        Ok(block(snapshot, parent, index, first, target.node))
    }
}

fn flow(snapshot: &Snapshot, parent: &Node, first: &Node, last: &Node, position: usize) -> Splice {
    let source = snapshot.source();
    let bytes = source.as_bytes();
    let start = snapshot.offset(first.start());
    let end = snapshot.offset(last.end());
    let entries = parent.entry_count();

    if entries == 1 {
        let bounds = snapshot.span(parent);
        return Splice::remove(bounds.start + 1..bounds.end.saturating_sub(1).max(bounds.start + 1));
    }

    if position + 1 < entries {
        // take the separator that follows, and one space after it
        let mut cut = end;
        while bytes.get(cut).is_some_and(u8::is_ascii_whitespace) {
            cut += 1;
        }
        if bytes.get(cut) != Some(&b',') {
            return Splice::remove(start..end);
        }
        cut += 1;

        // an entry on a line of its own takes the whole line
        let prefix = snapshot.line_prefix(start);
        if let Some(newline) = source[cut..].find('\n') {
            if prefix.trim().is_empty() && source[cut..cut + newline].trim().is_empty() {
                return Splice::remove(start - prefix.len()..cut + newline + 1);
            }
        }

        if bytes.get(cut) == Some(&b' ') {
            cut += 1;
        }
        Splice::remove(start..cut)
    } else {
        // last entry: take the separator that precedes it
        let before = source[..start].trim_end();
        let cut = if before.ends_with(',') {
            before.len() - 1
        } else {
            start
        };
        Splice::remove(cut..end)
    }
}

fn block(snapshot: &Snapshot, parent: &Node, index: usize, first: &Node, last: &Node) -> Splice {
    let start = entry_start(snapshot, parent, first);
    let end = snapshot.offset(last.end());

    if snapshot.line_prefix(start).trim().is_empty() {
        let line = snapshot.lines().position(start).line;
        let from = snapshot.line_start(line);
        let to = snapshot.lines().next_line_start(last.end());
        return Splice::remove(from..to);
    }

    // the entry shares its line with an enclosing `- ` marker or key
    match parent.children().get(index + 1) {
        Some(next) => Splice::remove(start..entry_start(snapshot, parent, next)),
        None => Splice::replace(start..end, if parent.is_mapping() { "{}" } else { "[]" }),
    }
}

/// Offset where an entry begins: its key for mappings, its `-` marker for sequences.
fn entry_start(snapshot: &Snapshot, parent: &Node, first: &Node) -> usize {
    let start = snapshot.offset(first.start());
    if parent.is_mapping() {
        return start;
    }
    item_marker(snapshot.source(), start).unwrap_or(start)
}
