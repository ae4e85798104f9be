use codespan_reporting::diagnostic::{Diagnostic, Severity};
use thiserror::Error;

use crate::registry::FrameKind;
use crate::tree::FrameId;

/// Errors reported by frame tree mutations and document loading.
///
/// A mutation that returns an error has not touched the tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// The frame grammar does not allow `kind` at `frame`.
    #[error("cannot place `{kind}` at frame {frame}: {reason}")]
    StructuralViolation {
        frame: FrameId,
        kind: FrameKind,
        reason: String,
    },

    #[error("index {index} is out of range for frame {parent} (length {len})")]
    IndexOutOfRange {
        parent: FrameId,
        index: usize,
        len: usize,
    },

    #[error("unknown frame: {0}")]
    UnknownFrame(FrameId),

    /// A change event names an element that is not at the index it claims.
    #[error("frame {parent} holds {found} at index {index}, not {expected}")]
    ElementMismatch {
        parent: FrameId,
        index: usize,
        expected: FrameId,
        found: FrameId,
    },

    #[error("unknown frame type: `{0}`")]
    UnknownFrameType(String),

    #[error("frame {frame} has no editable slot {slot}")]
    UnknownSlot { frame: FrameId, slot: usize },

    /// A persisted document breaks one of the tree invariants.
    #[error("corrupt document: {0}")]
    CorruptDocument(String),
}

impl FrameError {
    pub(crate) fn violation(frame: FrameId, kind: FrameKind, reason: impl Into<String>) -> Self {
        FrameError::StructuralViolation {
            frame,
            kind,
            reason: reason.into(),
        }
    }

    /// Stable code used when reporting the error.
    pub fn code(&self) -> &'static str {
        match self {
            FrameError::StructuralViolation { .. } => "F0001",
            FrameError::IndexOutOfRange { .. } => "F0002",
            FrameError::UnknownFrame(_) => "F0003",
            FrameError::ElementMismatch { .. } => "F0004",
            FrameError::UnknownFrameType(_) => "F0005",
            FrameError::UnknownSlot { .. } => "F0006",
            FrameError::CorruptDocument(_) => "F0007",
        }
    }

    /// Convert to a codespan-reporting Diagnostic for display.
    ///
    /// Frame errors carry no source span, so the diagnostic has no labels.
    pub fn to_diagnostic<FileId>(&self) -> Diagnostic<FileId> {
        let mut notes = Vec::new();
        match self {
            FrameError::StructuralViolation { kind, .. } => {
                let definition = kind.definition();
                if definition.is_joint {
                    notes.push(format!("`{kind}` frames only exist in a joint chain"));
                }
            }
            FrameError::IndexOutOfRange { len, .. } => {
                notes.push(format!("valid indices are 0..={len}"));
            }
            FrameError::UnknownFrame(_) => {
                notes.push("the id may belong to a frame that was already removed".to_string());
            }
            _ => {}
        }
        Diagnostic::new(Severity::Error)
            .with_code(self.code())
            .with_message(self.to_string())
            .with_notes(notes)
    }
}
