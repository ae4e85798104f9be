use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::FrameError;
use crate::tree::{FrameId, FrameObject, FrameTree};

/// The persisted form of a document: every frame keyed by id, plus the id
/// allocation counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentState {
    pub next_available_id: u32,
    pub frames: BTreeMap<FrameId, FrameObject>,
}

impl DocumentState {
    pub fn from_json(source: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(source)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl Default for DocumentState {
    fn default() -> Self {
        FrameTree::new().to_state()
    }
}

impl FrameTree {
    /// Rebuild a tree from its persisted form, rejecting documents that break
    /// any tree invariant.
    pub fn from_state(state: DocumentState) -> Result<Self, FrameError> {
        let tree = FrameTree::from_parts(state.frames, state.next_available_id);
        tree.check_invariants()?;
        Ok(tree)
    }

    pub fn to_state(&self) -> DocumentState {
        DocumentState {
            next_available_id: self.next_available_id().0,
            frames: self.raw_frames().clone(),
        }
    }
}
