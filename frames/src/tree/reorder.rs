use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::FrameError;
use crate::registry::DraggableGroup;
use crate::tree::validate::check_joint_chain;
use crate::tree::{FrameId, FrameTree};

/// The element a drag change refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragElement {
    pub id: FrameId,
}

/// One change reported by the drag layer for a single body.
///
/// Serialises as `{"added": {"newIndex": .., "element": {"id": ..}}}` and
/// likewise for `moved` and `removed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeEvent {
    #[serde(rename_all = "camelCase")]
    Added { new_index: usize, element: DragElement },
    #[serde(rename_all = "camelCase")]
    Moved {
        old_index: usize,
        new_index: usize,
        element: DragElement,
    },
    #[serde(rename_all = "camelCase")]
    Removed { old_index: usize, element: DragElement },
}

impl ChangeEvent {
    pub fn added(new_index: usize, id: FrameId) -> Self {
        ChangeEvent::Added {
            new_index,
            element: DragElement { id },
        }
    }

    pub fn moved(old_index: usize, new_index: usize, id: FrameId) -> Self {
        ChangeEvent::Moved {
            old_index,
            new_index,
            element: DragElement { id },
        }
    }

    pub fn removed(old_index: usize, id: FrameId) -> Self {
        ChangeEvent::Removed {
            old_index,
            element: DragElement { id },
        }
    }

    pub fn element(&self) -> FrameId {
        match self {
            ChangeEvent::Added { element, .. }
            | ChangeEvent::Moved { element, .. }
            | ChangeEvent::Removed { element, .. } => element.id,
        }
    }
}

/// How much a reorder trusts the drag layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReorderPolicy {
    /// Only bounds, element identity and acyclicity are checked.
    Trust,
    /// Drops are also checked against the nesting rules and drag families.
    #[default]
    Validate,
}

impl FrameTree {
    /// Apply one drag change to `parent`'s body, trusting the drag layer to
    /// only propose legal drops. Returns the ids deleted by the change.
    pub fn reorder(
        &mut self,
        parent: FrameId,
        event: ChangeEvent,
    ) -> Result<Vec<FrameId>, FrameError> {
        self.reorder_with_policy(parent, event, ReorderPolicy::Trust)
    }

    /// Like [`FrameTree::reorder`], re-checking drops against the grammar.
    pub fn reorder_checked(
        &mut self,
        parent: FrameId,
        event: ChangeEvent,
    ) -> Result<Vec<FrameId>, FrameError> {
        self.reorder_with_policy(parent, event, ReorderPolicy::Validate)
    }

    /// Apply one drag change.
    ///
    /// `Added` re-homes the element under `parent`. `Removed` deletes the
    /// element and everything below it unless an earlier `Added` already
    /// re-homed it elsewhere, in which case it is only detached from `parent`.
    pub fn reorder_with_policy(
        &mut self,
        parent: FrameId,
        event: ChangeEvent,
        policy: ReorderPolicy,
    ) -> Result<Vec<FrameId>, FrameError> {
        if let Err(error) = self.validate_change(parent, &event, policy) {
            warn!(%parent, ?event, %error, "reorder rejected");
            return Err(error);
        }
        let deleted = self.commit_change(parent, event);
        debug!(%parent, ?event, deleted = deleted.len(), "frames reordered");
        Ok(deleted)
    }

    /// Move a body frame to `index` in `new_parent`'s body in one step.
    ///
    /// Equivalent to an `Added` on the destination followed by a `Removed` on
    /// the source (or a single `Moved` within one body), always validated.
    pub fn move_frame(
        &mut self,
        id: FrameId,
        new_parent: FrameId,
        index: usize,
    ) -> Result<(), FrameError> {
        let result = self.try_move_frame(id, new_parent, index);
        match &result {
            Ok(()) => debug!(%id, %new_parent, index, "frame moved"),
            Err(error) => warn!(%id, %new_parent, index, %error, "frame move rejected"),
        }
        result
    }

    fn try_move_frame(
        &mut self,
        id: FrameId,
        new_parent: FrameId,
        index: usize,
    ) -> Result<(), FrameError> {
        let object = self.require(id)?;
        let kind = object.kind;
        if object.is_joint() {
            return Err(FrameError::violation(
                new_parent,
                kind,
                "joint frames only move within their chain",
            ));
        }
        let Some(old_parent) = object.parent_id else {
            return Err(FrameError::violation(new_parent, kind, "the root cannot be moved"));
        };
        let old_index = self.index_in_parent(id).ok_or_else(|| {
            FrameError::CorruptDocument(format!("frame {id} is missing from its parent"))
        })?;

        if old_parent == new_parent {
            let event = ChangeEvent::moved(old_index, index, id);
            self.validate_change(new_parent, &event, ReorderPolicy::Validate)?;
            self.commit_change(new_parent, event);
            return Ok(());
        }

        let added = ChangeEvent::added(index, id);
        let removed = ChangeEvent::removed(old_index, id);
        self.validate_change(new_parent, &added, ReorderPolicy::Validate)?;
        self.validate_change(old_parent, &removed, ReorderPolicy::Validate)?;
        self.commit_change(new_parent, added);
        self.commit_change(old_parent, removed);
        Ok(())
    }

    /// Reorder a joint chain.
    ///
    /// The moved frame's drag family must match the primary's inner joint
    /// family, and the reordered chain must still be legal.
    pub fn move_joint_frame(
        &mut self,
        primary: FrameId,
        old_index: usize,
        new_index: usize,
    ) -> Result<(), FrameError> {
        let primary_object = self.require(primary)?;
        let len = primary_object.joint_frame_ids.len();
        for index in [old_index, new_index] {
            if index >= len {
                return Err(FrameError::IndexOutOfRange {
                    parent: primary,
                    index,
                    len,
                });
            }
        }
        let mut ids = primary_object.joint_frame_ids.clone();
        let moved_kind = self.require(ids[old_index])?.kind;
        let family = primary_object.frame_type().inner_joint_draggable_group;
        let group = moved_kind.definition().draggable_group;
        if group != family || group == DraggableGroup::None {
            let reason = format!(
                "`{moved_kind}` cannot be dragged within a `{}` chain",
                primary_object.kind
            );
            return Err(FrameError::violation(primary, moved_kind, reason));
        }
        let moved_id = ids.remove(old_index);
        ids.insert(new_index, moved_id);
        let chain: Vec<_> = ids
            .iter()
            .filter_map(|id| self.frames.get(id))
            .map(|object| object.kind)
            .collect();
        let primary_kind = primary_object.kind;
        check_joint_chain(primary_kind, &chain)
            .map_err(|reason| FrameError::violation(primary, moved_kind, reason))?;

        if let Some(primary_object) = self.frames.get_mut(&primary) {
            primary_object.joint_frame_ids = ids;
        }
        debug!(%primary, old_index, new_index, "joint chain reordered");
        Ok(())
    }

    fn validate_change(
        &self,
        parent: FrameId,
        event: &ChangeEvent,
        policy: ReorderPolicy,
    ) -> Result<(), FrameError> {
        let parent_object = self.require(parent)?;
        let children = &parent_object.children_ids;
        let len = children.len();
        let element_id = event.element();
        let element = self.require(element_id)?;

        let check_slot = |index: usize| -> Result<(), FrameError> {
            match children.get(index) {
                None => Err(FrameError::IndexOutOfRange { parent, index, len }),
                Some(&found) if found != element_id => Err(FrameError::ElementMismatch {
                    parent,
                    index,
                    expected: element_id,
                    found,
                }),
                Some(_) => Ok(()),
            }
        };

        match *event {
            ChangeEvent::Added { new_index, .. } => {
                if new_index > len {
                    return Err(FrameError::IndexOutOfRange {
                        parent,
                        index: new_index,
                        len,
                    });
                }
                self.check_drop_integrity(parent, element)?;
                if children.contains(&element_id) {
                    return Err(FrameError::violation(
                        parent,
                        element.kind,
                        format!("frame {element_id} is already in this body"),
                    ));
                }
                if policy == ReorderPolicy::Validate {
                    self.check_drop_rules(parent_object, element)?;
                }
            }
            ChangeEvent::Moved { old_index, new_index, .. } => {
                check_slot(old_index)?;
                if new_index >= len {
                    return Err(FrameError::IndexOutOfRange {
                        parent,
                        index: new_index,
                        len,
                    });
                }
            }
            ChangeEvent::Removed { old_index, .. } => {
                check_slot(old_index)?;
                if element.parent_id == Some(parent) && element.kind.is_container() {
                    return Err(FrameError::violation(
                        parent,
                        element.kind,
                        "containers cannot be deleted",
                    ));
                }
            }
        }
        Ok(())
    }

    /// Apply a change that passed [`FrameTree::validate_change`].
    fn commit_change(&mut self, parent: FrameId, event: ChangeEvent) -> Vec<FrameId> {
        let element_id = event.element();
        match event {
            ChangeEvent::Added { new_index, .. } => {
                if let Some(parent_object) = self.frames.get_mut(&parent) {
                    parent_object.children_ids.insert(new_index, element_id);
                }
                self.rehome(element_id, parent);
                Vec::new()
            }
            ChangeEvent::Moved { old_index, new_index, .. } => {
                if let Some(parent_object) = self.frames.get_mut(&parent) {
                    let moved = parent_object.children_ids.remove(old_index);
                    parent_object.children_ids.insert(new_index, moved);
                }
                Vec::new()
            }
            ChangeEvent::Removed { old_index, .. } => {
                if let Some(parent_object) = self.frames.get_mut(&parent) {
                    parent_object.children_ids.remove(old_index);
                }
                let still_here = self
                    .frames
                    .get(&element_id)
                    .is_some_and(|element| element.parent_id == Some(parent));
                if still_here { self.purge(element_id) } else { Vec::new() }
            }
        }
    }

    /// Point a frame and its joint chain at a new parent.
    fn rehome(&mut self, id: FrameId, parent: FrameId) {
        let joints = match self.frames.get_mut(&id) {
            Some(object) => {
                object.parent_id = Some(parent);
                object.joint_frame_ids.clone()
            }
            None => return,
        };
        for joint in joints {
            if let Some(joint_object) = self.frames.get_mut(&joint) {
                joint_object.parent_id = Some(parent);
            }
        }
    }
}
