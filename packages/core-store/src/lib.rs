//! Core dotstore: paths, trees and persistence seams.
//!
//! This layer has no I/O of its own:
//! - `KeyPath`: Parsed dot/bracket path (`users[0].name`)
//! - `tree`: get/set/remove on `serde_json::Value` trees by `KeyPath`
//! - `Snapshot`: Where a store root is loaded from and saved to
//! - `Error`: The error type every other crate returns
//!
//! # Example
//!
//! ```rust
//! use dotstore_core::{path, tree};
//! use serde_json::json;
//!
//! let mut root = json!({});
//! tree::set(&mut root, &path!("a.b"), json!(1)).unwrap();
//! assert_eq!(tree::get(&root, &path!("a.b")), Some(&json!(1)));
//! ```

mod error;
mod path;
mod traits;
pub mod tree;

pub use error::Error;
pub use path::{KeyPath, PathError, Segment, ToKeyPath};
pub use traits::Snapshot;

pub use serde_json::{Map, Value};

/// A stored document: a JSON object.
pub type Document = Map<String, Value>;
