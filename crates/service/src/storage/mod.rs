//! Storage abstractions for service layer
//!
//! `KvStore` is the seam the note store persists through; `JsonMapStore`
//! is the file-backed map the JSON implementations share.

pub mod json_map_store;
pub mod kv;

pub use kv::{JsonFileKvStore, KvStore, MemoryKvStore};
