//! Keyboard caret over the frame tree.
//!
//! The caret always sits at a *stop*: either at the top of a frame's body or
//! just below a frame. Stops are visited in document order, so for a frame
//! `F` with body `c1..cn` and joint frames `j1..jm` the order is
//!
//! ```text
//! (F, body)  stops of c1..cn  (j1, body) stops of j1's body ..  (F, below)
//! ```
//!
//! Frames without a body only have a `below` stop, and joint frames have no
//! `below` stop of their own.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FrameError;
use crate::tree::{FrameId, FrameObject, FrameTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CaretPosition {
    /// First position inside the frame's own body.
    Body,
    /// Between the frame and its next sibling.
    Below,
    Both,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentFrame {
    pub id: FrameId,
    pub position: CaretPosition,
}

impl CurrentFrame {
    pub fn new(id: FrameId, position: CaretPosition) -> Self {
        CurrentFrame { id, position }
    }

    fn body(id: FrameId) -> Self {
        CurrentFrame::new(id, CaretPosition::Body)
    }

    fn below(id: FrameId) -> Self {
        CurrentFrame::new(id, CaretPosition::Below)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Direction {
    Up,
    Down,
}

/// The caret state machine. Owns the `(frame, position)` cursor and keeps
/// the tree's caret markers in step with it.
#[derive(Debug, Clone)]
pub struct Navigator {
    current: CurrentFrame,
    hidden: bool,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

impl Navigator {
    /// A caret at the top of the root body. No marker is written until the
    /// caret is first placed or moved.
    pub fn new() -> Self {
        Navigator {
            current: CurrentFrame::body(FrameId::ROOT),
            hidden: false,
        }
    }

    pub fn current(&self) -> CurrentFrame {
        self.current
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    /// Put the caret at an explicit stop.
    pub fn place(
        &mut self,
        tree: &mut FrameTree,
        id: FrameId,
        position: CaretPosition,
    ) -> Result<CurrentFrame, FrameError> {
        check_stop(tree, id, position)?;
        self.jump(tree, CurrentFrame::new(id, position))
    }

    /// Move one stop up or down.
    pub fn move_caret(
        &mut self,
        tree: &mut FrameTree,
        direction: Direction,
    ) -> Result<CurrentFrame, FrameError> {
        let next = match direction {
            Direction::Down => next_stop(tree, self.current)?,
            Direction::Up => previous_stop(tree, self.current)?,
        };
        self.jump(tree, next)
    }

    /// Clear the caret marker while keeping the cursor.
    pub fn hide(&mut self, tree: &mut FrameTree) {
        tree.clear_caret_marker(self.current.id);
        self.hidden = true;
    }

    pub fn show(&mut self, tree: &mut FrameTree) -> Result<(), FrameError> {
        self.hidden = false;
        tree.set_caret_marker(self.current.id, self.current.position)
    }

    fn jump(
        &mut self,
        tree: &mut FrameTree,
        next: CurrentFrame,
    ) -> Result<CurrentFrame, FrameError> {
        // Resolve before touching the markers so a failure changes nothing.
        tree.require(next.id)?;
        let previous = self.current;
        tree.clear_caret_marker(previous.id);
        self.current = next;
        if !self.hidden {
            tree.set_caret_marker(next.id, next.position)?;
        }
        debug!(from = %previous.id, to = %next.id, position = ?next.position, "caret moved");
        Ok(next)
    }
}

/// Check that `(id, position)` is a stop the caret can occupy.
pub fn check_stop(
    tree: &FrameTree,
    id: FrameId,
    position: CaretPosition,
) -> Result<(), FrameError> {
    let object = tree.require(id)?;
    let reason = match position {
        CaretPosition::Body if !object.allows_children() => {
            "the caret cannot enter a frame without a body"
        }
        CaretPosition::Below | CaretPosition::Both | CaretPosition::None if object.is_joint() => {
            "joint frames have no stop below them"
        }
        _ => return Ok(()),
    };
    Err(FrameError::violation(id, object.kind, reason))
}

/// The first stop of a body frame: its body if it has one, else below it.
pub fn first_stop(object: &FrameObject) -> CurrentFrame {
    if object.allows_children() {
        CurrentFrame::body(object.id)
    } else {
        CurrentFrame::below(object.id)
    }
}

/// The stop immediately before any stop belonging to frame `id`.
pub fn stop_before(tree: &FrameTree, id: FrameId) -> Result<CurrentFrame, FrameError> {
    let object = tree.require(id)?;
    if let Some(primary) = object.joint_parent_id {
        let primary_object = tree.require(primary)?;
        let position = primary_object.joint_frame_ids.iter().position(|&joint| joint == id);
        let previous_member = match position {
            Some(index) if index > 0 => tree.require(primary_object.joint_frame_ids[index - 1])?,
            _ => primary_object,
        };
        return Ok(end_of_body(previous_member));
    }
    let Some(parent) = object.parent_id else {
        return Ok(CurrentFrame::body(FrameId::ROOT));
    };
    let parent_object = tree.require(parent)?;
    match parent_object.children_ids.iter().position(|&child| child == id) {
        Some(index) if index > 0 => Ok(CurrentFrame::below(parent_object.children_ids[index - 1])),
        _ => Ok(CurrentFrame::body(parent)),
    }
}

fn next_stop(tree: &FrameTree, current: CurrentFrame) -> Result<CurrentFrame, FrameError> {
    let object = tree.require(current.id)?;
    if current.position == CaretPosition::Body {
        return match object.children_ids.first() {
            Some(&first) => Ok(first_stop(tree.require(first)?)),
            None => exit_body(tree, object),
        };
    }

    if object.is_joint() {
        return exit_body(tree, object);
    }
    let Some(parent) = object.parent_id else {
        // Below the root: nothing further down.
        return Ok(current);
    };
    let parent_object = tree.require(parent)?;
    let index = parent_object.children_ids.iter().position(|&child| child == object.id);
    match index.and_then(|index| parent_object.children_ids.get(index + 1)) {
        Some(&sibling) => Ok(first_stop(tree.require(sibling)?)),
        None => exit_body(tree, parent_object),
    }
}

fn previous_stop(tree: &FrameTree, current: CurrentFrame) -> Result<CurrentFrame, FrameError> {
    let object = tree.require(current.id)?;
    if current.position == CaretPosition::Body {
        return stop_before(tree, object.id);
    }

    if object.is_joint() {
        return Ok(end_of_body(object));
    }
    if !object.allows_children() {
        return stop_before(tree, object.id);
    }
    let last_member = match object.joint_frame_ids.last() {
        Some(&joint) => tree.require(joint)?,
        None => object,
    };
    Ok(end_of_body(last_member))
}

/// Where the caret goes after the last stop inside `object`'s body.
fn exit_body(tree: &FrameTree, object: &FrameObject) -> Result<CurrentFrame, FrameError> {
    if let Some(&first_joint) = object.joint_frame_ids.first() {
        return Ok(CurrentFrame::body(first_joint));
    }
    if let Some(primary) = object.joint_parent_id {
        let primary_object = tree.require(primary)?;
        let position = primary_object.joint_frame_ids.iter().position(|&joint| joint == object.id);
        return match position.and_then(|index| primary_object.joint_frame_ids.get(index + 1)) {
            Some(&next) => Ok(CurrentFrame::body(next)),
            None => Ok(CurrentFrame::below(primary)),
        };
    }
    Ok(CurrentFrame::below(object.id))
}

/// The last stop inside `object`'s body: below its last child, or the top of
/// the body when it is empty.
fn end_of_body(object: &FrameObject) -> CurrentFrame {
    match object.children_ids.last() {
        Some(&last) => CurrentFrame::below(last),
        None => CurrentFrame::body(object.id),
    }
}
