//! Per-user note lists and their HTTP-facing projection.

pub mod store;
pub mod presenter;

pub use presenter::{NoteView, NotesPresenter};
pub use store::{key_for, NoteStore, NAMESPACE};
