use std::fmt;

use frames::caret::{check_stop, first_stop, stop_before};
use frames::{
    CaretPosition, ChangeEvent, CurrentFrame, Direction, DocumentState, FrameError, FrameId,
    FrameKind, FrameTree, Navigator, Placement,
};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::{CaretStart, SessionConfig};
use crate::error::SessionError;
use crate::event::SessionEvent;

/// Horizontal movement between the editable slots of the focused frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SlotDirection {
    Left,
    Right,
}

type Observer = Box<dyn FnMut(&SessionEvent)>;

/// One editing session: a document, its caret, and the editing-mode flag.
///
/// Every mutation goes through `&mut self`, and a rejected mutation leaves
/// the session exactly as it was. Observers are called once the mutation has
/// completed and only ever see the event, never the session.
pub struct Session {
    tree: FrameTree,
    caret: Navigator,
    editing: bool,
    config: SessionConfig,
    observers: Vec<Observer>,
}

impl Session {
    /// A session on the default document.
    pub fn new(config: SessionConfig) -> Self {
        let mut tree = FrameTree::new();
        let caret = initial_caret(&mut tree, config.caret_start);
        Session {
            tree,
            caret,
            editing: false,
            config,
            observers: Vec::new(),
        }
    }

    /// A session on a persisted document.
    ///
    /// The caret resumes at the document's caret marker when it has one. A
    /// focused slot resumes editing mode.
    pub fn from_state(state: DocumentState, config: SessionConfig) -> Result<Self, SessionError> {
        let mut tree = FrameTree::from_state(state)?;
        let editing = tree.focused_slot().is_some();
        let mut caret = match tree.caret_marker() {
            Some((id, position)) => {
                let mut caret = Navigator::new();
                caret.place(&mut tree, id, position)?;
                caret
            }
            None => initial_caret(&mut tree, config.caret_start),
        };
        if editing {
            caret.hide(&mut tree);
        }
        Ok(Session {
            tree,
            caret,
            editing,
            config,
            observers: Vec::new(),
        })
    }

    pub fn tree(&self) -> &FrameTree {
        &self.tree
    }

    pub fn caret(&self) -> CurrentFrame {
        self.caret.current()
    }

    pub fn is_editing(&self) -> bool {
        self.editing
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn to_state(&self) -> DocumentState {
        self.tree.to_state()
    }

    /// Register a change observer.
    pub fn subscribe(&mut self, observer: impl FnMut(&SessionEvent) + 'static) {
        self.observers.push(Box::new(observer));
    }

    fn emit(&mut self, event: SessionEvent) {
        for observer in &mut self.observers {
            observer(&event);
        }
    }

    // -----------------------------------------------------------------------
    // Structure
    // -----------------------------------------------------------------------

    /// Create a frame and put the caret at its first stop.
    pub fn insert_frame(
        &mut self,
        placement: Placement,
        kind: FrameKind,
    ) -> Result<FrameId, SessionError> {
        let id = self.tree.allocate_and_insert(placement, kind)?;
        self.emit(SessionEvent::FrameInserted { id, kind });
        if !self.editing
            && let Some(object) = self.tree.get(id)
        {
            let stop = first_stop(object);
            self.jump_caret(stop)?;
        }
        Ok(id)
    }

    /// Apply one drag change under the configured reorder policy.
    pub fn reorder(
        &mut self,
        parent: FrameId,
        event: ChangeEvent,
    ) -> Result<Vec<FrameId>, SessionError> {
        let element = event.element();
        let relocation = self.relocation_if_deleted(element);
        let removed = self
            .tree
            .reorder_with_policy(parent, event, self.config.reorder_policy)?;
        self.emit(SessionEvent::FramesReordered { parent });
        if !removed.is_empty() {
            self.after_deletion(element, removed.clone(), relocation)?;
        }
        Ok(removed)
    }

    pub fn move_frame(
        &mut self,
        id: FrameId,
        new_parent: FrameId,
        index: usize,
    ) -> Result<(), SessionError> {
        let old_parent = self.tree.get(id).and_then(|object| object.parent_id);
        self.tree.move_frame(id, new_parent, index)?;
        if let Some(old_parent) = old_parent.filter(|&old_parent| old_parent != new_parent) {
            self.emit(SessionEvent::FramesReordered { parent: old_parent });
        }
        self.emit(SessionEvent::FramesReordered { parent: new_parent });
        Ok(())
    }

    pub fn move_joint_frame(
        &mut self,
        primary: FrameId,
        old_index: usize,
        new_index: usize,
    ) -> Result<(), SessionError> {
        self.tree.move_joint_frame(primary, old_index, new_index)?;
        self.emit(SessionEvent::FramesReordered { parent: primary });
        Ok(())
    }

    /// Delete a frame with everything below it. If the caret was inside the
    /// deleted frames it moves to the stop just before them.
    pub fn delete_frame(&mut self, id: FrameId) -> Result<Vec<FrameId>, SessionError> {
        let relocation = self.relocation_if_deleted(id);
        let removed = self.tree.delete_frame(id)?;
        self.after_deletion(id, removed.clone(), relocation)?;
        Ok(removed)
    }

    /// The stop the caret must move to if `id` gets deleted, or `None` when
    /// the caret lies outside `id`'s subtree.
    fn relocation_if_deleted(&self, id: FrameId) -> Option<CurrentFrame> {
        let current = self.caret.current();
        if !self.tree.subtree(id).contains(&current.id) {
            return None;
        }
        stop_before(&self.tree, id).ok()
    }

    fn after_deletion(
        &mut self,
        id: FrameId,
        removed: Vec<FrameId>,
        relocation: Option<CurrentFrame>,
    ) -> Result<(), SessionError> {
        self.emit(SessionEvent::FrameDeleted { id, removed });
        // Relocate first: the hidden caret must not be shown on a deleted frame.
        if let Some(stop) = relocation {
            self.jump_caret(stop)?;
        }
        if self.editing && self.tree.focused_slot().is_none() {
            self.editing = false;
            self.caret.show(&mut self.tree)?;
            debug!(%id, "editing stopped with its frame deleted");
            self.emit(SessionEvent::EditingToggled { editing: false });
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Slots and flags
    // -----------------------------------------------------------------------

    pub fn set_slot_content(
        &mut self,
        frame: FrameId,
        slot: usize,
        code: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.tree.set_slot_content(frame, slot, code)?;
        self.emit(SessionEvent::SlotChanged { frame, slot });
        Ok(())
    }

    pub fn set_slot_error(
        &mut self,
        frame: FrameId,
        slot: usize,
        error: impl Into<String>,
    ) -> Result<(), SessionError> {
        self.tree.set_slot_error(frame, slot, error)?;
        self.emit(SessionEvent::SlotChanged { frame, slot });
        Ok(())
    }

    /// Focus a slot. Enters editing mode, which hides the caret.
    pub fn focus_slot(&mut self, frame: FrameId, slot: usize) -> Result<(), SessionError> {
        self.tree.set_slot_focus(frame, slot, true)?;
        self.emit(SessionEvent::SlotChanged { frame, slot });
        if !self.editing {
            self.editing = true;
            self.caret.hide(&mut self.tree);
            debug!(%frame, slot, "editing started");
            self.emit(SessionEvent::EditingToggled { editing: true });
        }
        Ok(())
    }

    /// Show or hide an optional label. Returns whether it is now shown.
    pub fn toggle_slot_label(&mut self, frame: FrameId, slot: usize) -> Result<bool, SessionError> {
        let shown = self.tree.toggle_slot_label(frame, slot)?;
        self.emit(SessionEvent::SlotChanged { frame, slot });
        Ok(shown)
    }

    pub fn set_disabled(&mut self, frame: FrameId, disabled: bool) -> Result<(), SessionError> {
        self.tree.set_disabled(frame, disabled)?;
        self.emit(SessionEvent::FrameFlagsChanged { frame });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    /// Move the caret one stop. Does nothing while editing.
    pub fn move_caret(&mut self, direction: Direction) -> Result<CurrentFrame, SessionError> {
        if self.editing {
            debug!(?direction, "caret move ignored while editing");
            return Ok(self.caret.current());
        }
        let from = self.caret.current();
        let to = self.caret.move_caret(&mut self.tree, direction)?;
        if from != to {
            self.emit(SessionEvent::CaretMoved { from, to });
        }
        Ok(to)
    }

    /// Put the caret at an explicit stop, leaving editing mode first.
    pub fn place_caret(
        &mut self,
        id: FrameId,
        position: CaretPosition,
    ) -> Result<CurrentFrame, SessionError> {
        check_stop(&self.tree, id, position)?;
        let stop = CurrentFrame::new(id, position);
        if self.editing {
            self.stop_editing(stop)?;
        } else {
            self.jump_caret(stop)?;
        }
        Ok(stop)
    }

    /// Move focus to the neighbouring editable slot of the focused frame.
    ///
    /// Moving left of the first slot ends editing with the caret before the
    /// frame; moving right of the last ends it at the frame's first stop.
    /// Hidden optional slots are skipped. Does nothing unless editing.
    pub fn move_slot_focus(&mut self, direction: SlotDirection) -> Result<(), SessionError> {
        let Some((frame, slot)) = self.tree.focused_slot().filter(|_| self.editing) else {
            return Ok(());
        };
        let object = self.tree.get(frame).ok_or(FrameError::UnknownFrame(frame))?;
        let slots: Vec<usize> = object
            .frame_type()
            .editable_slots()
            .filter(|slot| object.content.get(slot).is_none_or(|content| content.shown_label))
            .collect();
        let index = slots.iter().position(|&candidate| candidate == slot);
        let neighbour = match (direction, index) {
            (SlotDirection::Left, Some(index)) if index > 0 => slots.get(index - 1),
            (SlotDirection::Right, Some(index)) => slots.get(index + 1),
            _ => None,
        };
        if let Some(&next) = neighbour {
            return self.focus_slot(frame, next);
        }

        let stop = match direction {
            SlotDirection::Left => stop_before(&self.tree, frame)?,
            SlotDirection::Right => first_stop(object),
        };
        self.stop_editing(stop)
    }

    /// Flip editing mode.
    ///
    /// Entering edits the first editable slot of the frame under the caret,
    /// if it has one. Leaving drops slot focus and restores the caret.
    pub fn toggle_editing_mode(&mut self) -> Result<bool, SessionError> {
        if self.editing {
            let stop = self.caret.current();
            self.stop_editing(stop)?;
            return Ok(false);
        }

        let current = self.caret.current();
        let first_slot = self
            .tree
            .get(current.id)
            .and_then(|object| object.frame_type().editable_slots().next());
        match first_slot {
            Some(slot) => self.focus_slot(current.id, slot)?,
            None => {
                self.editing = true;
                self.caret.hide(&mut self.tree);
                self.emit(SessionEvent::EditingToggled { editing: true });
            }
        }
        Ok(true)
    }

    fn stop_editing(&mut self, stop: CurrentFrame) -> Result<(), SessionError> {
        if let Some((frame, slot)) = self.tree.focused_slot() {
            self.tree.set_slot_focus(frame, slot, false)?;
        }
        self.editing = false;
        let from = self.caret.current();
        self.caret.place(&mut self.tree, stop.id, stop.position)?;
        self.caret.show(&mut self.tree)?;
        debug!(to = %stop.id, "editing stopped");
        self.emit(SessionEvent::EditingToggled { editing: false });
        if from != stop {
            self.emit(SessionEvent::CaretMoved { from, to: stop });
        }
        Ok(())
    }

    fn jump_caret(&mut self, stop: CurrentFrame) -> Result<(), SessionError> {
        let from = self.caret.current();
        let to = self.caret.place(&mut self.tree, stop.id, stop.position)?;
        if from != to {
            self.emit(SessionEvent::CaretMoved { from, to });
        }
        Ok(())
    }
}

/// Place a fresh caret according to `start`. Falls back to the root body
/// when the main container is missing.
fn initial_caret(tree: &mut FrameTree, start: CaretStart) -> Navigator {
    let target = match start {
        CaretStart::MainBody => tree.container(FrameKind::MainContainer).unwrap_or(FrameId::ROOT),
        CaretStart::RootBody => FrameId::ROOT,
    };
    let mut caret = Navigator::new();
    if let Err(error) = caret.place(tree, target, CaretPosition::Body) {
        warn!(%target, %error, "could not place the initial caret");
    }
    caret
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("tree", &self.tree)
            .field("caret", &self.caret)
            .field("editing", &self.editing)
            .field("config", &self.config)
            .field("observers", &self.observers.len())
            .finish()
    }
}
