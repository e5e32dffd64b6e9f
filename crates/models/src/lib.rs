//! Plain records shared by the service and HTTP layers.
//!
//! Nothing here touches storage; persistence lives behind the traits in the
//! `service` crate.

pub mod errors;
pub mod note;
pub mod user;
pub mod content;
pub mod moderation;

pub type UserId = i64;
pub type PostId = i64;
pub type TopicId = i64;

/// Reserved non-human identity that authors system notes.
pub const SYSTEM_USER_ID: UserId = -1;

pub use note::{Note, NoteExtras};
pub use user::{User, UserSummary};
pub use content::{Post, Topic};
pub use moderation::{EventEnvelope, HistoryAction, ModerationEvent};
