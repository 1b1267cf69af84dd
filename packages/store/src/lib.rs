//! Dot-path key/value store with a document collection layer.
//!
//! Two layers share one JSON root and one snapshot:
//!
//! - `PathStore`: get/set/delete values at key paths like `users[0].name`
//! - `Collection`: arrays of JSON documents with equality queries, reached
//!   through `Database::collection`
//!
//! Every successful mutation rewrites the whole snapshot, so the file on
//! disk always holds the latest state.
//!
//! # Example
//!
//! ```rust
//! use dotstore::{Database, Query, UpdateOptions};
//! use serde_json::json;
//!
//! let mut db = Database::in_memory();
//! db.store().set("app.version", json!(3)).unwrap();
//!
//! let mut users = db.collection("users").unwrap();
//! users.insert(json!({ "name": "Bob", "age": 24 })).unwrap();
//!
//! let bob: Query = json!({ "name": "Bob" }).as_object().cloned().unwrap();
//! let older = json!({ "age": 25 }).as_object().cloned().unwrap();
//! users.update(&bob, older, UpdateOptions::default()).unwrap();
//!
//! assert_eq!(users.find_one(&bob).unwrap()["age"], json!(25));
//! ```

pub mod collection;
pub mod config;
mod database;
mod id;
mod path_store;

pub use collection::{
    matches, Collection, Query, RemoveOptions, UpdateOptions, UpdateResult, ID_FIELD,
};
pub use config::{IdStrategy, ParseIdStrategyError, SnapshotLocation, StoreConfig};
pub use database::Database;
pub use id::generate_id;
pub use path_store::PathStore;

pub use dotstore_core::{path, Document, Error, KeyPath, PathError, Segment, Snapshot, Value};
pub use dotstore_json_store::{InMemorySnapshot, JsonFileSnapshot};
