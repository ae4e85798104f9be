pub mod config;
pub mod error;
pub mod event;
pub mod session;

pub use config::{CaretStart, SessionConfig};
pub use error::SessionError;
pub use event::SessionEvent;
pub use session::{Session, SlotDirection};
