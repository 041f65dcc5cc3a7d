#![allow(clippy::collapsible_if)]
#![deny(dead_code)]

//! Format-preserving YAML editing.
//!
//! ```
//! let mut editor = yaml_splice::load("e: { a: 1, b: 2 } # keep me\nf: [1, 2, 3]\n")?;
//! editor.delete("e.b").update("f.1", 0);
//! assert_eq!(editor.render()?, "e: { a: 1 } # keep me\nf: [1, 0, 3]\n");
//! # Ok::<(), yaml_splice::Error>(())
//! ```

pub mod anchors;
pub mod editor;
pub mod error;
mod fragment;
mod indentation;
pub mod line_index;
pub mod locator;
pub mod operations;
pub mod selector;
pub mod tree;

use std::path::Path;

pub use editor::{Editor, PipelineState, Snapshot};
pub use error::{Error, Result};
pub use operations::EditOperation;
pub use selector::{FilterValue, Segment, Selector};
pub use serde_yaml::Value;
pub use tree::{Node, NodeKind, Position, Style};

/// Parses `text` and returns an editor over it.
pub fn load(text: impl Into<String>) -> Result<Editor> {
    Editor::new(text.into())
}

/// Reads and parses the file at `path`.
pub fn load_file(path: impl AsRef<Path>) -> Result<Editor> {
    Editor::from_path(path)
}
