mod delete;
mod insert;
mod reorder;
mod validate;

pub use insert::Placement;
pub use reorder::{ChangeEvent, DragElement, ReorderPolicy};

use std::collections::BTreeMap;
use std::fmt;
use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::caret::CaretPosition;
use crate::error::FrameError;
use crate::registry::{FrameKind, FrameTypeDefinition};

/// Identifier of a frame. Allocated from a counter that only grows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FrameId(pub u32);

impl FrameId {
    /// The root container. Reserved: never allocated, never deleted.
    pub const ROOT: FrameId = FrameId(0);

    pub fn is_root(self) -> bool {
        self == FrameId::ROOT
    }
}

impl fmt::Display for FrameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn default_true() -> bool {
    true
}

/// Content of one editable slot of a frame's label template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameSlotContent {
    #[serde(default)]
    pub code: String,
    /// Transient: the slot currently has keyboard focus.
    #[serde(default)]
    pub focused: bool,
    /// Validation message, empty when the slot is valid.
    #[serde(default)]
    pub error: String,
    #[serde(default = "default_true")]
    pub shown_label: bool,
}

impl Default for FrameSlotContent {
    fn default() -> Self {
        FrameSlotContent {
            code: String::new(),
            focused: false,
            error: String::new(),
            shown_label: true,
        }
    }
}

/// One node of the frame tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameObject {
    pub id: FrameId,
    #[serde(rename = "frameType")]
    pub kind: FrameKind,
    /// Structural parent. `None` only for the root. A joint frame shares the
    /// parent of its primary frame.
    #[serde(default)]
    pub parent_id: Option<FrameId>,
    /// The body, in document order.
    #[serde(default)]
    pub children_ids: Vec<FrameId>,
    /// The primary frame of the chain, set only on joint frames.
    #[serde(default)]
    pub joint_parent_id: Option<FrameId>,
    /// The joint chain, held only by the primary frame.
    #[serde(default)]
    pub joint_frame_ids: Vec<FrameId>,
    #[serde(default, rename = "contentDict")]
    pub content: BTreeMap<usize, FrameSlotContent>,
    #[serde(default)]
    pub is_disabled: bool,
    #[serde(default)]
    pub is_selected: bool,
    #[serde(default = "default_true")]
    pub is_visible: bool,
    #[serde(default)]
    pub multi_drag_position: String,
    #[serde(default)]
    pub caret_body: bool,
    #[serde(default)]
    pub caret_below: bool,
}

impl FrameObject {
    /// A fresh frame with empty content for every editable slot.
    pub fn new(id: FrameId, kind: FrameKind, parent_id: Option<FrameId>) -> Self {
        let content = kind
            .definition()
            .labels
            .iter()
            .enumerate()
            .filter(|(_, label)| label.slot)
            .map(|(slot, label)| {
                let content = FrameSlotContent {
                    shown_label: !label.optional_label,
                    ..FrameSlotContent::default()
                };
                (slot, content)
            })
            .collect();
        FrameObject {
            id,
            kind,
            parent_id,
            children_ids: Vec::new(),
            joint_parent_id: None,
            joint_frame_ids: Vec::new(),
            content,
            is_disabled: false,
            is_selected: false,
            is_visible: true,
            multi_drag_position: String::new(),
            caret_body: false,
            caret_below: false,
        }
    }

    pub fn frame_type(&self) -> &'static FrameTypeDefinition {
        self.kind.definition()
    }

    pub fn is_joint(&self) -> bool {
        self.joint_parent_id.is_some()
    }

    pub fn allows_children(&self) -> bool {
        self.frame_type().allow_children
    }
}

/// The mutable document: a flat map of frame id to frame node.
///
/// All writes go through the methods of this type; callers only ever see
/// shared references to nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameTree {
    frames: BTreeMap<FrameId, FrameObject>,
    next_available_id: u32,
}

impl Default for FrameTree {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameTree {
    /// The default document: the root holding the imports, function
    /// definitions and main code containers.
    pub fn new() -> Self {
        let containers = [
            FrameKind::ImportsContainer,
            FrameKind::FuncDefsContainer,
            FrameKind::MainContainer,
        ];
        let mut root = FrameObject::new(FrameId::ROOT, FrameKind::Root, None);
        let mut frames = BTreeMap::new();
        let mut next_available_id = 1;
        for kind in containers {
            let id = FrameId(next_available_id);
            next_available_id += 1;
            root.children_ids.push(id);
            frames.insert(id, FrameObject::new(id, kind, Some(FrameId::ROOT)));
        }
        frames.insert(FrameId::ROOT, root);
        FrameTree {
            frames,
            next_available_id,
        }
    }

    /// Build a tree from raw parts without checking invariants.
    pub(crate) fn from_parts(
        frames: BTreeMap<FrameId, FrameObject>,
        next_available_id: u32,
    ) -> Self {
        FrameTree {
            frames,
            next_available_id,
        }
    }

    pub(crate) fn raw_frames(&self) -> &BTreeMap<FrameId, FrameObject> {
        &self.frames
    }

    fn allocate(&mut self) -> FrameId {
        let id = FrameId(self.next_available_id);
        self.next_available_id += 1;
        id
    }

    pub(crate) fn require(&self, id: FrameId) -> Result<&FrameObject, FrameError> {
        self.frames.get(&id).ok_or(FrameError::UnknownFrame(id))
    }

    fn require_mut(&mut self, id: FrameId) -> Result<&mut FrameObject, FrameError> {
        self.frames.get_mut(&id).ok_or(FrameError::UnknownFrame(id))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn get(&self, id: FrameId) -> Option<&FrameObject> {
        self.frames.get(&id)
    }

    pub fn contains(&self, id: FrameId) -> bool {
        self.frames.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// All frames, in id order.
    pub fn frames(&self) -> impl Iterator<Item = &FrameObject> {
        self.frames.values()
    }

    /// The id the next insertion will receive.
    pub fn next_available_id(&self) -> FrameId {
        FrameId(self.next_available_id)
    }

    /// The body of `parent`, in order. Ids that no longer resolve are skipped;
    /// an unknown parent has no children.
    pub fn children_of(&self, parent: FrameId) -> Vec<&FrameObject> {
        let Some(object) = self.frames.get(&parent) else {
            trace!(%parent, "children requested for unknown frame");
            return Vec::new();
        };
        self.resolve(&object.children_ids)
    }

    /// The joint chain of `primary`, in order, skipping stale ids.
    pub fn joint_frames_of(&self, primary: FrameId) -> Vec<&FrameObject> {
        match self.frames.get(&primary) {
            Some(object) => self.resolve(&object.joint_frame_ids),
            None => Vec::new(),
        }
    }

    fn resolve(&self, ids: &[FrameId]) -> Vec<&FrameObject> {
        ids.iter()
            .filter_map(|id| {
                let object = self.frames.get(id);
                if object.is_none() {
                    trace!(%id, "skipping stale frame id");
                }
                object
            })
            .collect()
    }

    pub fn slot(&self, frame: FrameId, slot: usize) -> Option<&FrameSlotContent> {
        self.frames.get(&frame)?.content.get(&slot)
    }

    /// Code of a slot, or the empty string when the frame or slot is unknown.
    pub fn slot_content(&self, frame: FrameId, slot: usize) -> &str {
        self.slot(frame, slot).map_or("", |content| content.code.as_str())
    }

    /// Whether `kind` is listed as a joint continuation of `parent`'s type.
    pub fn is_joint_continuation(&self, parent: FrameId, kind: FrameKind) -> bool {
        self.frames
            .get(&parent)
            .is_some_and(|object| object.frame_type().allows_joint(kind))
    }

    /// Position of a frame in its parent's body, or in its primary's chain.
    pub fn index_in_parent(&self, id: FrameId) -> Option<usize> {
        let object = self.frames.get(&id)?;
        match object.joint_parent_id {
            Some(primary) => self
                .frames
                .get(&primary)?
                .joint_frame_ids
                .iter()
                .position(|&joint| joint == id),
            None => self
                .frames
                .get(&object.parent_id?)?
                .children_ids
                .iter()
                .position(|&child| child == id),
        }
    }

    /// Frames enclosing `id`, innermost first. A joint frame is enclosed by
    /// its primary frame.
    pub fn ancestors(&self, id: FrameId) -> Vec<FrameId> {
        let mut ancestors = Vec::new();
        let mut current = self.frames.get(&id);
        while let Some(object) = current {
            let Some(next) = object.joint_parent_id.or(object.parent_id) else {
                break;
            };
            // A corrupt tree could loop; never walk more frames than exist.
            if ancestors.len() > self.frames.len() {
                break;
            }
            ancestors.push(next);
            current = self.frames.get(&next);
        }
        ancestors
    }

    /// The root-level container of the given kind.
    pub fn container(&self, kind: FrameKind) -> Option<FrameId> {
        self.children_of(FrameId::ROOT)
            .into_iter()
            .find(|object| object.kind == kind)
            .map(|object| object.id)
    }

    /// The slot holding keyboard focus, if any.
    pub fn focused_slot(&self) -> Option<(FrameId, usize)> {
        self.frames.values().find_map(|object| {
            object
                .content
                .iter()
                .find(|(_, content)| content.focused)
                .map(|(&slot, _)| (object.id, slot))
        })
    }

    /// Frames below `id` (its body, recursively, and its joint chain), with
    /// `id` first.
    pub fn subtree(&self, id: FrameId) -> Vec<FrameId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            let Some(object) = self.frames.get(&next) else {
                continue;
            };
            out.push(next);
            stack.extend(object.joint_frame_ids.iter().rev());
            stack.extend(object.children_ids.iter().rev());
        }
        out
    }

    /// Indented text rendering of the document, one frame per line.
    pub fn outline(&self) -> String {
        let mut out = String::new();
        self.write_outline(&mut out, FrameId::ROOT, 0);
        out
    }

    fn write_outline(&self, out: &mut String, id: FrameId, depth: usize) {
        let Some(object) = self.frames.get(&id) else {
            return;
        };
        let _ = write!(out, "{}{} #{}", "  ".repeat(depth), object.kind, object.id);
        for content in object.content.values() {
            if !content.code.is_empty() {
                let _ = write!(out, " {:?}", content.code);
            }
        }
        if object.is_disabled {
            out.push_str(" (disabled)");
        }
        out.push('\n');
        for &child in &object.children_ids {
            self.write_outline(out, child, depth + 1);
        }
        for &joint in &object.joint_frame_ids {
            self.write_outline(out, joint, depth);
        }
    }

    // -----------------------------------------------------------------------
    // Slot and flag edits
    // -----------------------------------------------------------------------

    fn require_slot(
        &mut self,
        frame: FrameId,
        slot: usize,
    ) -> Result<&mut FrameSlotContent, FrameError> {
        let object = self.require_mut(frame)?;
        if !object.frame_type().is_editable_slot(slot) {
            return Err(FrameError::UnknownSlot { frame, slot });
        }
        Ok(object.content.entry(slot).or_default())
    }

    /// Replace the code of one slot.
    pub fn set_slot_content(
        &mut self,
        frame: FrameId,
        slot: usize,
        code: impl Into<String>,
    ) -> Result<(), FrameError> {
        let content = self.require_slot(frame, slot)?;
        content.code = code.into();
        debug!(%frame, slot, "slot content updated");
        Ok(())
    }

    pub fn set_slot_error(
        &mut self,
        frame: FrameId,
        slot: usize,
        error: impl Into<String>,
    ) -> Result<(), FrameError> {
        self.require_slot(frame, slot)?.error = error.into();
        Ok(())
    }

    /// Give or take keyboard focus. At most one slot in the tree is focused.
    pub fn set_slot_focus(
        &mut self,
        frame: FrameId,
        slot: usize,
        focused: bool,
    ) -> Result<(), FrameError> {
        self.require_slot(frame, slot)?;
        if focused {
            for object in self.frames.values_mut() {
                for content in object.content.values_mut() {
                    content.focused = false;
                }
            }
        }
        self.require_slot(frame, slot)?.focused = focused;
        Ok(())
    }

    /// Show or hide an optional label. Returns whether it is now shown.
    pub fn toggle_slot_label(&mut self, frame: FrameId, slot: usize) -> Result<bool, FrameError> {
        let object = self.require(frame)?;
        let kind = object.kind;
        let optional = object
            .frame_type()
            .labels
            .get(slot)
            .is_some_and(|label| label.slot && label.optional_label);
        if !optional {
            if object.frame_type().is_editable_slot(slot) {
                let reason = format!("label {slot} cannot be hidden");
                return Err(FrameError::violation(frame, kind, reason));
            }
            return Err(FrameError::UnknownSlot { frame, slot });
        }
        let content = self.require_slot(frame, slot)?;
        content.shown_label = !content.shown_label;
        Ok(content.shown_label)
    }

    /// Disable or enable a frame together with everything below it.
    pub fn set_disabled(&mut self, id: FrameId, disabled: bool) -> Result<(), FrameError> {
        let object = self.require(id)?;
        if object.kind.is_container() {
            return Err(FrameError::violation(id, object.kind, "containers cannot be disabled"));
        }
        for frame in self.subtree(id) {
            if let Some(object) = self.frames.get_mut(&frame) {
                object.is_disabled = disabled;
            }
        }
        debug!(%id, disabled, "frame disabled flag changed");
        Ok(())
    }

    pub fn set_selected(&mut self, id: FrameId, selected: bool) -> Result<(), FrameError> {
        self.require_mut(id)?.is_selected = selected;
        Ok(())
    }

    pub fn set_visible(&mut self, id: FrameId, visible: bool) -> Result<(), FrameError> {
        self.require_mut(id)?.is_visible = visible;
        Ok(())
    }

    pub fn set_multi_drag_position(
        &mut self,
        id: FrameId,
        position: impl Into<String>,
    ) -> Result<(), FrameError> {
        self.require_mut(id)?.multi_drag_position = position.into();
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Caret markers (written by the navigator only)
    // -----------------------------------------------------------------------

    pub(crate) fn clear_caret_marker(&mut self, id: FrameId) {
        if let Some(object) = self.frames.get_mut(&id) {
            object.caret_body = false;
            object.caret_below = false;
        }
    }

    pub(crate) fn set_caret_marker(
        &mut self,
        id: FrameId,
        position: CaretPosition,
    ) -> Result<(), FrameError> {
        let object = self.require_mut(id)?;
        object.caret_body = position == CaretPosition::Body;
        object.caret_below = matches!(position, CaretPosition::Below | CaretPosition::Both);
        Ok(())
    }

    /// The frame carrying a caret marker, if any.
    pub fn caret_marker(&self) -> Option<(FrameId, CaretPosition)> {
        self.frames.values().find_map(|object| {
            if object.caret_body {
                Some((object.id, CaretPosition::Body))
            } else if object.caret_below {
                Some((object.id, CaretPosition::Below))
            } else {
                None
            }
        })
    }
}
