//! Volatile snapshot kept in process memory.

use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

use dotstore_core::{Error, Snapshot, Value};

#[derive(Debug, Default)]
struct Inner {
    saved: Option<Value>,
    saves: usize,
    attempts: usize,
    fail_saves: bool,
}

/// A snapshot that lives only as long as the process.
///
/// Clones share the same contents, so a caller can hand one clone to a store
/// and keep another to see what the store has written.
///
/// # Example
///
/// ```rust
/// use dotstore_json_store::{InMemorySnapshot, Snapshot};
/// use serde_json::json;
///
/// let observer = InMemorySnapshot::new();
/// let mut snapshot = observer.clone();
///
/// snapshot.save(&json!({ "name": "Alice" })).unwrap();
/// assert_eq!(observer.saved(), Some(json!({ "name": "Alice" })));
/// assert_eq!(observer.save_count(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemorySnapshot {
    inner: Arc<Mutex<Inner>>,
}

impl InMemorySnapshot {
    /// Create an empty snapshot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a snapshot that already holds `root`, as if saved earlier.
    pub fn with_data(root: Value) -> Self {
        let snapshot = Self::new();
        snapshot.lock().saved = Some(root);
        snapshot
    }

    /// The last saved root.
    pub fn saved(&self) -> Option<Value> {
        self.lock().saved.clone()
    }

    /// Number of successful saves.
    pub fn save_count(&self) -> usize {
        self.lock().saves
    }

    /// Number of save calls, failed ones included.
    pub fn save_attempts(&self) -> usize {
        self.lock().attempts
    }

    /// Make subsequent saves fail (or succeed again), to exercise the
    /// write-failure paths of a store.
    pub fn fail_saves(&self, fail: bool) {
        self.lock().fail_saves = fail;
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Snapshot for InMemorySnapshot {
    fn load(&mut self) -> Result<Option<Value>, Error> {
        Ok(self.lock().saved.clone())
    }

    fn save(&mut self, root: &Value) -> Result<(), Error> {
        let mut inner = self.lock();
        inner.attempts += 1;
        if inner.fail_saves {
            return Err(Error::Persist {
                location: self.location(),
                source: io::Error::other("simulated write failure"),
            });
        }
        inner.saved = Some(root.clone());
        inner.saves += 1;
        Ok(())
    }

    fn location(&self) -> String {
        ":memory:".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_loads_none() {
        let mut snapshot = InMemorySnapshot::new();
        assert!(snapshot.load().unwrap().is_none());
        assert_eq!(snapshot.save_count(), 0);
    }

    #[test]
    fn clones_share_contents() {
        let observer = InMemorySnapshot::new();
        let mut writer = observer.clone();
        writer.save(&json!({ "a": 1 })).unwrap();
        writer.save(&json!({ "a": 2 })).unwrap();

        assert_eq!(observer.saved(), Some(json!({ "a": 2 })));
        assert_eq!(observer.save_count(), 2);
    }

    #[test]
    fn with_data_constructor() {
        let mut snapshot = InMemorySnapshot::with_data(json!({ "key": "value" }));
        assert_eq!(snapshot.load().unwrap(), Some(json!({ "key": "value" })));
    }

    #[test]
    fn failing_saves_keep_previous_contents() {
        let mut snapshot = InMemorySnapshot::with_data(json!({ "v": 1 }));
        snapshot.fail_saves(true);

        let err = snapshot.save(&json!({ "v": 2 })).unwrap_err();
        assert!(matches!(err, Error::Persist { .. }));
        assert_eq!(snapshot.saved(), Some(json!({ "v": 1 })));

        snapshot.fail_saves(false);
        snapshot.save(&json!({ "v": 3 })).unwrap();
        assert_eq!(snapshot.saved(), Some(json!({ "v": 3 })));
        assert_eq!(snapshot.save_count(), 1);
        assert_eq!(snapshot.save_attempts(), 2);
    }
}
