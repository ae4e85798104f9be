pub mod caret;
pub mod error;
pub mod registry;
pub mod state;
pub mod tree;

pub use caret::{CaretPosition, CurrentFrame, Direction, Navigator};
pub use error::FrameError;
pub use registry::{DraggableGroup, FrameKind, FrameLabel, FrameTypeDefinition};
pub use state::DocumentState;
pub use tree::{
    ChangeEvent, DragElement, FrameId, FrameObject, FrameSlotContent, FrameTree, Placement,
    ReorderPolicy,
};
