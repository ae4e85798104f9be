use tracing::{debug, warn};

use crate::error::FrameError;
use crate::registry::FrameKind;
use crate::tree::validate::{check_body_child, check_joint_chain};
use crate::tree::{FrameId, FrameObject, FrameTree};

/// Where a new frame goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// Into `parent`'s body at `index`, appended when `None`.
    Body { parent: FrameId, index: Option<usize> },
    /// Into `primary`'s joint chain at `index`, appended when `None`.
    Joint { primary: FrameId, index: Option<usize> },
}

impl Placement {
    pub fn append_to(parent: FrameId) -> Self {
        Placement::Body { parent, index: None }
    }

    pub fn join(primary: FrameId) -> Self {
        Placement::Joint { primary, index: None }
    }
}

fn resolve_index(owner: FrameId, index: Option<usize>, len: usize) -> Result<usize, FrameError> {
    match index {
        None => Ok(len),
        Some(index) if index <= len => Ok(index),
        Some(index) => Err(FrameError::IndexOutOfRange {
            parent: owner,
            index,
            len,
        }),
    }
}

impl FrameTree {
    /// Create a frame of `kind` at `placement` and return its new id.
    ///
    /// The id counter advances exactly once on success and not at all on
    /// failure; a rejected insertion leaves the tree untouched.
    pub fn allocate_and_insert(
        &mut self,
        placement: Placement,
        kind: FrameKind,
    ) -> Result<FrameId, FrameError> {
        let result = match placement {
            Placement::Body { parent, index } => self.insert_in_body(parent, index, kind),
            Placement::Joint { primary, index } => self.insert_in_chain(primary, index, kind),
        };
        match &result {
            Ok(id) => debug!(%id, %kind, ?placement, "frame inserted"),
            Err(error) => warn!(%kind, ?placement, %error, "frame insertion rejected"),
        }
        result
    }

    fn insert_in_body(
        &mut self,
        parent: FrameId,
        index: Option<usize>,
        kind: FrameKind,
    ) -> Result<FrameId, FrameError> {
        let parent_object = self.require(parent)?;
        check_body_child(parent_object, kind)?;
        let index = resolve_index(parent, index, parent_object.children_ids.len())?;

        let id = self.allocate();
        self.frames.insert(id, FrameObject::new(id, kind, Some(parent)));
        if let Some(parent_object) = self.frames.get_mut(&parent) {
            parent_object.children_ids.insert(index, id);
        }
        Ok(id)
    }

    fn insert_in_chain(
        &mut self,
        primary: FrameId,
        index: Option<usize>,
        kind: FrameKind,
    ) -> Result<FrameId, FrameError> {
        let primary_object = self.require(primary)?;
        if primary_object.is_joint() {
            return Err(FrameError::violation(
                primary,
                kind,
                "joint frames chain from the primary frame, not from another joint frame",
            ));
        }
        let index = resolve_index(primary, index, primary_object.joint_frame_ids.len())?;
        let mut chain = self.chain_kinds(primary_object);
        chain.insert(index, kind);
        check_joint_chain(primary_object.kind, &chain)
            .map_err(|reason| FrameError::violation(primary, kind, reason))?;
        let parent_id = primary_object.parent_id;

        let id = self.allocate();
        let mut object = FrameObject::new(id, kind, parent_id);
        object.joint_parent_id = Some(primary);
        self.frames.insert(id, object);
        if let Some(primary_object) = self.frames.get_mut(&primary) {
            primary_object.joint_frame_ids.insert(index, id);
        }
        Ok(id)
    }

    /// Kinds of the frames in `primary`'s chain, skipping stale ids.
    pub(crate) fn chain_kinds(&self, primary: &FrameObject) -> Vec<FrameKind> {
        primary
            .joint_frame_ids
            .iter()
            .filter_map(|id| self.frames.get(id))
            .map(|object| object.kind)
            .collect()
    }
}
