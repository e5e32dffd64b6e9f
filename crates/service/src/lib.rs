//! Service layer for staff notes on user accounts.
//! - `notes::NoteStore` owns the per-user note lists and the count cache.
//! - `moderation` turns host moderation events into system notes.
//! - Storage, user/content lookups and translations sit behind traits so the
//!   note logic never depends on a concrete backend.

pub mod errors;
pub mod storage;
pub mod directory;
pub mod i18n;
pub mod settings;
pub mod permissions;
pub mod metrics;
pub mod notes;
pub mod moderation;
pub mod report;
pub mod api_keys;
