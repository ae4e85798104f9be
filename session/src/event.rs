use frames::{CurrentFrame, FrameId, FrameKind};

/// Change notification sent to session observers after a mutation
/// completes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    FrameInserted { id: FrameId, kind: FrameKind },
    /// The body (or joint chain) of `parent` changed order or membership.
    FramesReordered { parent: FrameId },
    /// `id` was deleted; `removed` lists it and every frame deleted with it.
    FrameDeleted { id: FrameId, removed: Vec<FrameId> },
    SlotChanged { frame: FrameId, slot: usize },
    FrameFlagsChanged { frame: FrameId },
    CaretMoved { from: CurrentFrame, to: CurrentFrame },
    EditingToggled { editing: bool },
}
