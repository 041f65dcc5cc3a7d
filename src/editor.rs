mod delete;
mod edit;
mod insert;
mod rename;
mod snapshot;
mod update;

use std::{collections::VecDeque, path::Path};

use diffy::{DiffOptions, PatchFormatter};
use serde_yaml::Value;

pub use snapshot::Snapshot;

use crate::{
    error::{Error, Result},
    operations::EditOperation,
    tree::Node,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    /// Nothing queued.
    #[default]
    Idle,
    /// Operations are queued or being applied.
    Applying,
}

/// Format-preserving editor for one YAML document.
///
/// Operations are queued and applied in order by [`Editor::render`]. Each one is
/// planned against the current text, spliced in, and the result re-parsed before the
/// next operation runs, so later operations see the effect of earlier ones.
#[derive(Debug)]
pub struct Editor {
    original: String,
    snapshot: Snapshot,
    queue: VecDeque<EditOperation>,
    state: PipelineState,
}

impl Editor {
    pub fn new(source: String) -> Result<Self> {
        let snapshot = Snapshot::parse(source.clone())?;
        Ok(Self {
            original: source,
            snapshot,
            queue: VecDeque::new(),
            state: PipelineState::Idle,
        })
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        log::debug!("loading {}", path.display());
        Self::new(std::fs::read_to_string(path)?)
    }

    pub fn enqueue(&mut self, operation: EditOperation) -> &mut Self {
        log::trace!("queued {operation}");
        self.queue.push_back(operation);
        self.state = PipelineState::Applying;
        self
    }

    pub fn delete(&mut self, path: impl Into<String>) -> &mut Self {
        self.enqueue(EditOperation::Delete { path: path.into() })
    }

    pub fn update(&mut self, path: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.enqueue(EditOperation::Update {
            path: path.into(),
            value: value.into(),
        })
    }

    pub fn rename(&mut self, path: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.enqueue(EditOperation::Rename {
            path: path.into(),
            to: to.into(),
        })
    }

    pub fn map_add(
        &mut self,
        path: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.enqueue(EditOperation::MapAdd {
            path: path.into(),
            key: key.into(),
            value: value.into(),
        })
    }

    pub fn seq_add(
        &mut self,
        path: impl Into<String>,
        value: impl Into<Value>,
        index: Option<usize>,
    ) -> &mut Self {
        self.enqueue(EditOperation::SeqAdd {
            path: path.into(),
            value: value.into(),
            index,
        })
    }

    /// Applies every queued operation and returns the resulting text.
    ///
    /// The first failing operation stops the pipeline: its error is returned, the rest
    /// of the queue is dropped, and the buffer keeps every edit made before it.
    pub fn render(&mut self) -> Result<String> {
        while let Some(operation) = self.queue.pop_front() {
            if let Err(error) = self.apply(&operation) {
                let dropped = self.queue.len();
                self.queue.clear();
                self.state = PipelineState::Idle;
                log::warn!("{operation} failed, dropping {dropped} queued operation(s): {error}");
                return Err(error);
            }
        }

        self.state = PipelineState::Idle;
        Ok(self.snapshot.source().to_string())
    }

    fn apply(&mut self, operation: &EditOperation) -> Result<()> {
        log::debug!("applying {operation}");
        let snapshot = &self.snapshot;
        let splice = match operation {
            EditOperation::Delete { path } => delete::plan(snapshot, path)?,
            EditOperation::Update { path, value } => update::plan(snapshot, path, value)?,
            EditOperation::Rename { path, to } => rename::plan(snapshot, path, to)?,
            EditOperation::MapAdd { path, key, value } => {
                insert::map_add(snapshot, path, key, value)?
            }
            EditOperation::SeqAdd { path, value, index } => {
                insert::seq_add(snapshot, path, value, *index)?
            }
        };

        let output = splice.apply(snapshot.source());
        self.snapshot = Snapshot::parse(output)?;
        Ok(())
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    /// Operations waiting for the next [`Editor::render`].
    pub fn pending(&self) -> impl Iterator<Item = &EditOperation> {
        self.queue.iter()
    }

    pub fn source(&self) -> &str {
        self.snapshot.source()
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// The node at `path` in the current text, with aliases followed.
    pub fn find(&self, path: &str) -> Result<&Node> {
        Ok(self.snapshot.resolve(path)?.node)
    }

    /// Decodes the node at `path` from its source text.
    pub fn value(&self, path: &str) -> Result<Value> {
        let node = self.find(path)?;
        let text = format!(
            "{}{}",
            " ".repeat(node.start().column),
            self.snapshot.text(node)
        );
        Ok(serde_yaml::from_str(&text)?)
    }

    /// Unified diff from the loaded text to the current text.
    pub fn diff(&self) -> String {
        let patch = DiffOptions::new().create_patch(&self.original, self.snapshot.source());
        let diff = PatchFormatter::new()
            .missing_newline_message(false)
            .fmt_patch(&patch)
            .to_string();
        diff
    }

    pub fn is_modified(&self) -> bool {
        self.original != self.snapshot.source()
    }
}

impl std::str::FromStr for Editor {
    type Err = Error;

    fn from_str(source: &str) -> Result<Self> {
        Self::new(source.to_string())
    }
}
