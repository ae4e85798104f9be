use std::collections::{HashMap, HashSet};

use crate::error::FrameError;
use crate::registry::FrameKind;
use crate::tree::{FrameId, FrameObject, FrameTree};

/// Nesting rules for putting a frame of `kind` into `parent`'s body.
pub(crate) fn check_body_child(parent: &FrameObject, kind: FrameKind) -> Result<(), FrameError> {
    let definition = parent.frame_type();
    if !definition.allow_children {
        return Err(FrameError::violation(
            parent.id,
            kind,
            format!("`{}` frames have no body", parent.kind),
        ));
    }
    if kind.definition().is_joint {
        return Err(FrameError::violation(
            parent.id,
            kind,
            "joint frames only exist in a joint chain",
        ));
    }
    if definition.forbids(kind) {
        return Err(FrameError::violation(
            parent.id,
            kind,
            format!("`{}` does not allow `{kind}` children", parent.kind),
        ));
    }
    Ok(())
}

/// Check that `chain` may follow a primary frame of type `primary`.
///
/// Every member must be a joint type the primary accepts, and must be listed
/// by its predecessor (the primary for the first member).
pub(crate) fn check_joint_chain(primary: FrameKind, chain: &[FrameKind]) -> Result<(), String> {
    let primary_definition = primary.definition();
    if !primary_definition.allow_joint_children {
        return Err(format!("`{primary}` frames take no joint frames"));
    }
    let mut previous = primary_definition;
    for &kind in chain {
        if !kind.definition().is_joint {
            return Err(format!("`{kind}` is not a joint frame"));
        }
        if !primary_definition.allows_joint(kind) {
            return Err(format!("`{kind}` cannot appear in a `{primary}` chain"));
        }
        if !previous.allows_joint(kind) {
            return Err(format!("`{kind}` cannot follow `{}`", previous.kind));
        }
        previous = kind.definition();
    }
    Ok(())
}

impl FrameTree {
    /// Checks every drop must pass, whatever the reorder policy: the element
    /// is a movable body frame and dropping it into `parent` keeps the tree
    /// acyclic.
    pub(crate) fn check_drop_integrity(
        &self,
        parent: FrameId,
        element: &FrameObject,
    ) -> Result<(), FrameError> {
        if element.kind.is_container() {
            return Err(FrameError::violation(parent, element.kind, "containers cannot be moved"));
        }
        if element.is_joint() {
            return Err(FrameError::violation(
                parent,
                element.kind,
                "joint frames only move within their chain",
            ));
        }
        if parent == element.id || self.ancestors(parent).contains(&element.id) {
            return Err(FrameError::violation(
                parent,
                element.kind,
                "a frame cannot be dropped inside itself",
            ));
        }
        Ok(())
    }

    /// Grammar checks applied to drops under [`ReorderPolicy::Validate`].
    ///
    /// [`ReorderPolicy::Validate`]: crate::tree::ReorderPolicy::Validate
    pub(crate) fn check_drop_rules(
        &self,
        parent: &FrameObject,
        element: &FrameObject,
    ) -> Result<(), FrameError> {
        check_body_child(parent, element.kind)?;
        let target_group = parent.frame_type().body_group();
        if let Some(source) = element.parent_id.and_then(|id| self.frames.get(&id)) {
            let source_group = source.frame_type().body_group();
            if source_group != target_group {
                let reason = format!(
                    "cannot drag from a `{source_group}` body into a `{target_group}` body"
                );
                return Err(FrameError::violation(parent.id, element.kind, reason));
            }
        }
        Ok(())
    }

    /// Verify every tree invariant. Used when loading persisted documents.
    pub fn check_invariants(&self) -> Result<(), FrameError> {
        let corrupt = |reason: String| Err(FrameError::CorruptDocument(reason));

        let Some(root) = self.frames.get(&FrameId::ROOT) else {
            return corrupt("missing root frame 0".to_string());
        };
        if root.kind != FrameKind::Root || root.parent_id.is_some() || root.is_joint() {
            return corrupt("frame 0 must be a parentless `root` frame".to_string());
        }

        let mut containers: Vec<FrameKind> = root
            .children_ids
            .iter()
            .filter_map(|child| self.frames.get(child).map(|object| object.kind))
            .collect();
        containers.sort();
        let expected = [
            FrameKind::ImportsContainer,
            FrameKind::FuncDefsContainer,
            FrameKind::MainContainer,
        ];
        if root.children_ids.len() != expected.len() || containers != expected {
            return corrupt(
                "the root must hold exactly one of each of the three containers".to_string(),
            );
        }

        let mut references: HashMap<FrameId, usize> = HashMap::new();
        let mut caret_frames = 0;
        let mut focused_slots = 0;

        for (&key, object) in &self.frames {
            let id = object.id;
            if key != id {
                return corrupt(format!("frame stored under {key} has id {id}"));
            }
            if !id.is_root() && id.0 >= self.next_available_id {
                let next = self.next_available_id;
                return corrupt(format!("frame {id} is not below the next id {next}"));
            }
            if !id.is_root() && object.parent_id.is_none() {
                return corrupt(format!("frame {id} has no parent"));
            }
            if object.kind == FrameKind::Root && !id.is_root() {
                return corrupt(format!("frame {id} is a second root"));
            }
            if object.caret_body && object.caret_below {
                return corrupt(format!("frame {id} has both caret markers set"));
            }
            if object.caret_below && object.is_joint() {
                return corrupt(format!("joint frame {id} has a caret below it"));
            }
            if object.caret_body || object.caret_below {
                caret_frames += 1;
            }
            focused_slots += object.content.values().filter(|content| content.focused).count();

            let mut seen = HashSet::new();
            for &child in &object.children_ids {
                if !seen.insert(child) {
                    return corrupt(format!("frame {id} lists child {child} twice"));
                }
                *references.entry(child).or_default() += 1;
                let Some(child_object) = self.frames.get(&child) else {
                    return corrupt(format!("frame {id} lists missing child {child}"));
                };
                if child_object.parent_id != Some(id) {
                    return corrupt(format!("child {child} of frame {id} names another parent"));
                }
                if !id.is_root() {
                    check_body_child(object, child_object.kind)
                        .or_else(|error| corrupt(error.to_string()))?;
                }
            }

            if !object.joint_frame_ids.is_empty() {
                if object.is_joint() {
                    return corrupt(format!("joint frame {id} holds a joint chain"));
                }
                let mut chain = Vec::new();
                for &joint in &object.joint_frame_ids {
                    if !seen.insert(joint) {
                        return corrupt(format!("frame {id} lists joint frame {joint} twice"));
                    }
                    *references.entry(joint).or_default() += 1;
                    let Some(joint_object) = self.frames.get(&joint) else {
                        return corrupt(format!("frame {id} lists missing joint frame {joint}"));
                    };
                    if joint_object.joint_parent_id != Some(id) {
                        return corrupt(format!(
                            "joint frame {joint} does not point back to frame {id}"
                        ));
                    }
                    if joint_object.parent_id != object.parent_id {
                        return corrupt(format!(
                            "joint frame {joint} and its primary {id} have different parents"
                        ));
                    }
                    chain.push(joint_object.kind);
                }
                check_joint_chain(object.kind, &chain)
                    .or_else(|reason| corrupt(format!("frame {id}: {reason}")))?;
            }

            if let Some(primary) = object.joint_parent_id {
                let listed = self
                    .frames
                    .get(&primary)
                    .is_some_and(|primary_object| primary_object.joint_frame_ids.contains(&id));
                if !listed {
                    return corrupt(format!(
                        "joint frame {id} is not in the chain of frame {primary}"
                    ));
                }
            } else if object.kind.definition().is_joint {
                return corrupt(format!("`{}` frame {id} has no primary frame", object.kind));
            }
        }

        for id in self.frames.keys() {
            let count = references.get(id).copied().unwrap_or(0);
            if id.is_root() && count != 0 {
                return corrupt("the root frame is listed as a child".to_string());
            }
            if !id.is_root() && count != 1 {
                return corrupt(format!("frame {id} is referenced {count} times"));
            }
        }

        // Exactly-once references still allow a detached cycle.
        if self.subtree(FrameId::ROOT).len() != self.frames.len() {
            return corrupt("some frames are unreachable from the root".to_string());
        }

        if caret_frames > 1 {
            return corrupt(format!("{caret_frames} frames carry a caret marker"));
        }
        if focused_slots > 1 {
            return corrupt(format!("{focused_slots} slots are focused"));
        }
        Ok(())
    }
}
