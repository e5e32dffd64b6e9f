//! Moderation events from the host platform and the handlers reacting to them.

pub mod bus;
pub mod system_notes;

pub use bus::{DispatchReport, ModerationEventBus, ModerationEventHandler};
pub use system_notes::SystemNoteHandler;
