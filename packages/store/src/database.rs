use dotstore_core::{Error, KeyPath, Value};

use crate::collection::{normalize_name, Collection};
use crate::config::StoreConfig;
use crate::path_store::PathStore;

/// A `PathStore` plus the collection layer stored inside it.
///
/// Collections are arrays of documents kept under the configured
/// collections key (`_collections` by default). Plain key paths and
/// collections share one root and one snapshot.
///
/// # Example
///
/// ```rust
/// use dotstore::Database;
/// use serde_json::json;
///
/// let mut db = Database::in_memory();
/// db.store().set("settings.theme", json!("dark")).unwrap();
///
/// let mut posts = db.collection("Posts").unwrap();
/// posts.insert(json!({ "title": "hello" })).unwrap();
///
/// assert_eq!(db.collection_names(), vec!["posts".to_string()]);
/// ```
#[derive(Debug)]
pub struct Database {
    store: PathStore,
    config: StoreConfig,
}

impl Database {
    /// Open the database described by `config`.
    pub fn open(config: StoreConfig) -> Self {
        let store = PathStore::open(&config);
        tracing::debug!(location = %store.location(), "opened database");
        Database { store, config }
    }

    /// A volatile database with default settings.
    pub fn in_memory() -> Self {
        Self::open(StoreConfig::memory())
    }

    /// Wrap an existing store.
    pub fn with_store(store: PathStore, config: StoreConfig) -> Self {
        Database { store, config }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// The underlying key/value store.
    pub fn store(&mut self) -> &mut PathStore {
        &mut self.store
    }

    pub fn store_ref(&self) -> &PathStore {
        &self.store
    }

    /// Get a handle on collection `name`, creating it if needed.
    ///
    /// Names are trimmed and lower-cased, so `"Users"` and `"users"` are the
    /// same collection. Creating a collection does not write the snapshot;
    /// the first mutation does.
    #[doc(alias = "db")]
    pub fn collection(&mut self, name: &str) -> Result<Collection<'_>, Error> {
        Collection::open(
            &mut self.store,
            &self.config.collections_key,
            name,
            self.config.id_strategy,
        )
    }

    /// Names of every existing collection, in creation order.
    pub fn collection_names(&self) -> Vec<String> {
        let path = KeyPath::root().key(self.config.collections_key.as_str());
        match self.store.get_ref(&path) {
            Ok(Some(Value::Object(collections))) => collections
                .iter()
                .filter(|(_, docs)| docs.is_array())
                .map(|(name, _)| name.clone())
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Delete collection `name` and all its documents.
    ///
    /// Returns `Ok(false)` if there was no such collection.
    pub fn drop_collection(&mut self, name: &str) -> Result<bool, Error> {
        let name = normalize_name(name)?;
        let path = KeyPath::root()
            .key(self.config.collections_key.as_str())
            .key(name);
        match self.store.take(&path)? {
            Some(_) => {
                self.store.persist()?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Flush and close the database.
    pub fn close(self) -> Result<(), Error> {
        self.store.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::{Query, RemoveOptions};
    use dotstore_json_store::InMemorySnapshot;
    use serde_json::json;

    #[test]
    fn collection_names_are_case_insensitive() {
        let mut db = Database::in_memory();
        db.collection("Users").unwrap().insert(json!({ "n": 1 })).unwrap();
        db.collection(" users ").unwrap().insert(json!({ "n": 2 })).unwrap();

        assert_eq!(db.collection("USERS").unwrap().count(&Query::new()), 2);
        assert_eq!(db.collection_names(), vec!["users".to_string()]);
    }

    #[test]
    fn empty_collection_name_is_rejected() {
        let mut db = Database::in_memory();
        assert!(matches!(
            db.collection("  "),
            Err(Error::InvalidCollectionName { .. })
        ));
    }

    #[test]
    fn creating_a_collection_does_not_persist() {
        let snapshot = InMemorySnapshot::new();
        let mut db = Database::with_store(
            PathStore::with_snapshot(snapshot.clone()),
            StoreConfig::memory(),
        );
        db.collection("users").unwrap();
        assert_eq!(snapshot.save_count(), 0);
        assert_eq!(db.collection_names(), vec!["users".to_string()]);
    }

    #[test]
    fn collections_and_paths_share_the_root() {
        let mut db = Database::in_memory();
        db.store().set("config.debug", json!(true)).unwrap();
        db.collection("logs")
            .unwrap()
            .insert(json!({ "_id": "x", "msg": "hi" }))
            .unwrap();

        assert_eq!(
            db.store_ref().all(),
            json!({
                "config": { "debug": true },
                "_collections": { "logs": [{ "_id": "x", "msg": "hi" }] }
            })
        );
    }

    #[test]
    fn drop_collection_removes_documents() {
        let mut db = Database::in_memory();
        db.collection("a").unwrap().insert(json!({})).unwrap();
        db.collection("b").unwrap();

        assert!(db.drop_collection("A").unwrap());
        assert!(!db.drop_collection("a").unwrap());
        assert_eq!(db.collection_names(), vec!["b".to_string()]);
        assert_eq!(db.collection("a").unwrap().count(&Query::new()), 0);
    }

    #[test]
    fn custom_collections_key() {
        let mut db = Database::open(StoreConfig::memory().collections_key("tables"));
        let mut t = db.collection("t").unwrap();
        t.insert(json!({ "_id": 1 })).unwrap();
        t.remove(&Query::new(), RemoveOptions::default()).unwrap();
        assert_eq!(db.store_ref().all(), json!({ "tables": { "t": [] } }));
    }

    #[test]
    fn reopen_sees_collections() {
        let dir = tempfile::tempdir().unwrap();
        let config = StoreConfig::default().with_file(dir.path().join("db.json"));

        {
            let mut db = Database::open(config.clone());
            db.collection("users")
                .unwrap()
                .insert(json!([{ "name": "A" }, { "name": "B" }]))
                .unwrap();
            db.close().unwrap();
        }

        let mut db = Database::open(config);
        let users = db.collection("users").unwrap();
        assert_eq!(users.count(&Query::new()), 2);
        assert_eq!(users.find_all()[1]["name"], json!("B"));
    }
}
