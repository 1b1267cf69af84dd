//! Persistence trait for the store root.

use serde_json::Value;

use crate::Error;

/// Somewhere a store root can be loaded from and written back to.
///
/// Every save is a full replacement of the previous snapshot; there are no
/// partial writes.
///
/// # Object Safety
///
/// This trait is object-safe: you can use `Box<dyn Snapshot>`.
pub trait Snapshot: Send {
    /// Load the last saved root.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - Nothing has been saved yet.
    /// * `Ok(Some(value))` - The saved root.
    /// * `Err(Error)` - The snapshot exists but couldn't be read or parsed.
    fn load(&mut self) -> Result<Option<Value>, Error>;

    /// Replace the snapshot with `root`.
    fn save(&mut self, root: &Value) -> Result<(), Error>;

    /// Human-readable location, used in logs.
    fn location(&self) -> String;
}

impl<S: Snapshot + ?Sized> Snapshot for Box<S> {
    fn load(&mut self) -> Result<Option<Value>, Error> {
        (**self).load()
    }

    fn save(&mut self, root: &Value) -> Result<(), Error> {
        (**self).save(root)
    }

    fn location(&self) -> String {
        (**self).location()
    }
}
