use std::fmt::{self, Display, Formatter};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;

/// One queued edit. Paths use the dotted query syntax (`items[name='bob'].email`).
///
/// In an edit script this is written as a tagged object, for example
/// `{"op": "update", "path": "f.1", "value": 0}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, strum::IntoStaticStr)]
#[serde(tag = "op", rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EditOperation {
    /// Remove the entry at `path`: a key with its value, or a sequence element.
    Delete { path: String },

    /// Replace the value at `path`.
    Update {
        path: String,
        #[schemars(with = "serde_json::Value")]
        value: Value,
    },

    /// Rename the mapping key whose value is at `path`.
    Rename { path: String, to: String },

    /// Append `key: value` to the mapping at `path`.
    MapAdd {
        path: String,
        key: String,
        #[schemars(with = "serde_json::Value")]
        value: Value,
    },

    /// Add `value` to the sequence at `path`, before element `index` when given,
    /// otherwise at the end.
    SeqAdd {
        path: String,
        #[schemars(with = "serde_json::Value")]
        value: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
}

impl EditOperation {
    pub fn name(&self) -> &'static str {
        self.into()
    }

    pub fn path(&self) -> &str {
        match self {
            EditOperation::Delete { path }
            | EditOperation::Update { path, .. }
            | EditOperation::Rename { path, .. }
            | EditOperation::MapAdd { path, .. }
            | EditOperation::SeqAdd { path, .. } => path,
        }
    }
}

impl Display for EditOperation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{} `{}`", self.name(), self.path())
    }
}
