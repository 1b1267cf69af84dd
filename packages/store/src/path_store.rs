//! The path store: a JSON root addressed by dot/bracket key paths.

use dotstore_core::{tree, Error, KeyPath, Map, Snapshot, ToKeyPath, Value};
use dotstore_json_store::{InMemorySnapshot, JsonFileSnapshot};

use crate::config::{SnapshotLocation, StoreConfig};

/// Durable key/value storage addressed by key paths like `users[0].name`.
///
/// The whole root is loaded once when the store is opened and the whole
/// root is written back after every successful mutation. Reads never touch
/// the snapshot.
///
/// # Example
///
/// ```rust
/// use dotstore::PathStore;
/// use serde_json::json;
///
/// let mut store = PathStore::in_memory();
/// store.set("a.b", json!(1)).unwrap();
/// assert_eq!(store.get("a.b").unwrap(), Some(json!(1)));
///
/// // Setting through a scalar is rejected and changes nothing.
/// assert!(store.set("a.b.c", json!(2)).is_err());
/// assert_eq!(store.get_or("a.b.c", json!("none")).unwrap(), json!("none"));
/// assert_eq!(store.get("a.b").unwrap(), Some(json!(1)));
/// ```
pub struct PathStore {
    root: Value,
    snapshot: Box<dyn Snapshot>,
    // Set when the last write failed, so the in-memory root is ahead of the
    // snapshot.
    dirty: bool,
}

impl PathStore {
    /// Open the store described by `config`.
    ///
    /// A missing snapshot starts an empty store. An unreadable or corrupt
    /// snapshot also starts an empty store, with a warning logged.
    pub fn open(config: &StoreConfig) -> Self {
        match &config.snapshot {
            SnapshotLocation::File(path) => {
                Self::with_snapshot(JsonFileSnapshot::new(path).pretty(config.pretty))
            }
            SnapshotLocation::Memory => Self::with_snapshot(InMemorySnapshot::new()),
        }
    }

    /// A volatile store.
    pub fn in_memory() -> Self {
        Self::with_snapshot(InMemorySnapshot::new())
    }

    /// Open a store over any snapshot backend.
    pub fn with_snapshot(snapshot: impl Snapshot + 'static) -> Self {
        let mut snapshot: Box<dyn Snapshot> = Box::new(snapshot);
        let root = match snapshot.load() {
            Ok(Some(root @ Value::Object(_))) => root,
            Ok(Some(other)) => {
                tracing::warn!(
                    location = %snapshot.location(),
                    "snapshot root is {}, not an object; starting empty",
                    tree::kind(&other)
                );
                Value::Object(Map::new())
            }
            Ok(None) => Value::Object(Map::new()),
            Err(error) => {
                tracing::warn!(
                    location = %snapshot.location(),
                    %error,
                    "failed to load snapshot; starting empty"
                );
                Value::Object(Map::new())
            }
        };

        PathStore {
            root,
            snapshot,
            dirty: false,
        }
    }

    /// Deep copy of the value at `path`, or `None` if nothing is there.
    ///
    /// Only a malformed path is an error; absence is a normal outcome.
    pub fn get<P: ToKeyPath + ?Sized>(&self, path: &P) -> Result<Option<Value>, Error> {
        Ok(self.get_ref(path)?.cloned())
    }

    /// Deep copy of the value at `path`, or `default` if nothing is there.
    pub fn get_or<P: ToKeyPath + ?Sized>(&self, path: &P, default: Value) -> Result<Value, Error> {
        Ok(self.get(path)?.unwrap_or(default))
    }

    /// Borrow the value at `path` without copying it.
    pub fn get_ref<P: ToKeyPath + ?Sized>(&self, path: &P) -> Result<Option<&Value>, Error> {
        let path = path.to_key_path()?;
        Ok(tree::get(&self.root, &path))
    }

    pub fn has<P: ToKeyPath + ?Sized>(&self, path: &P) -> Result<bool, Error> {
        Ok(self.get_ref(path)?.is_some())
    }

    /// Store `value` at `path`, creating intermediate objects as needed.
    ///
    /// Rejected sets (`ShapeConflict`, `IndexOutOfBounds`, root path) leave
    /// the store untouched. A persistence error means the value was stored
    /// in memory but the snapshot is stale.
    pub fn set<P: ToKeyPath + ?Sized>(&mut self, path: &P, value: Value) -> Result<(), Error> {
        let path = path.to_key_path()?;
        if let Err(error) = tree::set(&mut self.root, &path, value) {
            tracing::warn!(path = %path, %error, "set rejected");
            return Err(error);
        }
        self.persist()
    }

    /// Remove the value at `path`.
    ///
    /// Returns `Ok(false)` without writing anything if the path doesn't
    /// resolve, so deleting twice is harmless. Only the last element of an
    /// array can be deleted; naming an earlier index is an
    /// `InteriorIndex` error and leaves the store untouched.
    pub fn delete<P: ToKeyPath + ?Sized>(&mut self, path: &P) -> Result<bool, Error> {
        let path = path.to_key_path()?;
        let removed = match tree::remove(&mut self.root, &path) {
            Ok(removed) => removed,
            Err(error) => {
                tracing::warn!(path = %path, %error, "delete rejected");
                return Err(error);
            }
        };
        match removed {
            Some(_) => {
                self.persist()?;
                Ok(true)
            }
            None => {
                tracing::warn!(path = %path, "delete of missing path ignored");
                Ok(false)
            }
        }
    }

    /// Deep copy of the whole root.
    pub fn all(&self) -> Value {
        self.root.clone()
    }

    /// Top-level keys, in insertion order.
    pub fn keys(&self) -> Vec<String> {
        match &self.root {
            Value::Object(map) => map.keys().cloned().collect(),
            _ => Vec::new(),
        }
    }

    /// Write the full root to the snapshot now.
    pub fn persist(&mut self) -> Result<(), Error> {
        match self.snapshot.save(&self.root) {
            Ok(()) => {
                self.dirty = false;
                Ok(())
            }
            Err(error) => {
                self.dirty = true;
                tracing::error!(
                    location = %self.snapshot.location(),
                    %error,
                    "failed to write snapshot"
                );
                Err(error)
            }
        }
    }

    /// Whether the snapshot is behind the in-memory root.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Flush and close the store.
    ///
    /// A failed flush is reported here and not retried on drop.
    pub fn close(mut self) -> Result<(), Error> {
        let result = self.persist();
        self.dirty = false;
        result
    }

    /// Location of the backing snapshot.
    pub fn location(&self) -> String {
        self.snapshot.location()
    }

    pub(crate) fn root(&self) -> &Value {
        &self.root
    }

    /// Make sure `path` holds an array and borrow it.
    ///
    /// A missing slot is created without persisting. A slot holding
    /// anything else is replaced with an empty array.
    pub(crate) fn array_mut(&mut self, path: &KeyPath) -> Result<&mut Vec<Value>, Error> {
        if !matches!(tree::get(&self.root, path), Some(Value::Array(_))) {
            if let Some(other) = tree::get(&self.root, path) {
                tracing::warn!(
                    path = %path,
                    "replacing {} with an empty collection",
                    tree::kind(other)
                );
            }
            tree::set(&mut self.root, path, Value::Array(Vec::new()))?;
        }

        match tree::get_mut(&mut self.root, path) {
            Some(Value::Array(docs)) => Ok(docs),
            Some(other) => Err(Error::ShapeConflict {
                path: path.to_string(),
                found: tree::kind(other),
            }),
            None => Err(Error::ShapeConflict {
                path: path.to_string(),
                found: "nothing",
            }),
        }
    }

    /// Remove the value at `path` without logging a missing path.
    pub(crate) fn take(&mut self, path: &KeyPath) -> Result<Option<Value>, Error> {
        tree::remove(&mut self.root, path)
    }
}

impl Drop for PathStore {
    fn drop(&mut self) {
        if !self.dirty {
            return;
        }
        if let Err(error) = self.snapshot.save(&self.root) {
            tracing::error!(
                location = %self.snapshot.location(),
                %error,
                "failed to flush snapshot on drop; recent changes are lost"
            );
        }
    }
}

impl std::fmt::Debug for PathStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PathStore")
            .field("location", &self.snapshot.location())
            .field("keys", &self.keys())
            .field("dirty", &self.dirty)
            .finish()
    }
}
