//! Snapshot backends for dotstore.
//!
//! - `JsonFileSnapshot`: one JSON file, replaced whole on every save
//! - `InMemorySnapshot`: volatile, shared between clones so tests can
//!   observe what a store wrote

pub mod in_memory;
pub mod local_disk;

pub use dotstore_core::{Error, Snapshot};

pub use in_memory::InMemorySnapshot;
pub use local_disk::JsonFileSnapshot;
