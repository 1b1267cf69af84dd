//! Document collections stored inside a `PathStore`.
//!
//! A collection is an array of JSON objects kept under
//! `<collections_key>.<name>` in the store root. Queries are equality-only:
//! a document matches when every query field is present on it and equal.
//!
//! Non-`multi` updates and removals touch the earliest match in insertion
//! order.

use dotstore_core::{Document, Error, KeyPath, Value};

use crate::config::IdStrategy;
use crate::id::generate_id;
use crate::path_store::PathStore;

/// Reserved field holding a document's identity.
pub const ID_FIELD: &str = "_id";

/// Field-equality filter. An empty query matches every document.
pub type Query = Document;

/// Options for `Collection::update` and `Collection::update_with`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    /// Update every match instead of only the first.
    pub multi: bool,
    /// Insert a document built from the query when nothing matches.
    pub upsert: bool,
}

impl UpdateOptions {
    #[must_use]
    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }

    #[must_use]
    pub fn upsert(mut self) -> Self {
        self.upsert = true;
        self
    }
}

/// Options for `Collection::remove`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoveOptions {
    /// Remove every match instead of only the first.
    pub multi: bool,
}

impl RemoveOptions {
    #[must_use]
    pub fn multi(mut self) -> Self {
        self.multi = true;
        self
    }
}

/// Outcome of an update.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateResult {
    /// Number of documents changed or inserted.
    pub count: usize,
    /// Copies of the documents as they are now stored.
    pub documents: Vec<Document>,
    /// Whether the single affected document was inserted by an upsert.
    pub upserted: bool,
}

enum Change<'f> {
    Merge(Document),
    Transform(&'f mut dyn FnMut(Document) -> Document),
}

impl Change<'_> {
    fn apply(&mut self, base: Document) -> Document {
        match self {
            Change::Merge(fields) => {
                let mut merged = base;
                for (key, value) in fields.iter() {
                    merged.insert(key.clone(), value.clone());
                }
                merged
            }
            Change::Transform(f) => (**f)(base),
        }
    }
}

/// Does `doc` carry every field of `query` with an equal value?
pub fn matches(doc: &Value, query: &Query) -> bool {
    match doc {
        Value::Object(fields) => query
            .iter()
            .all(|(key, expected)| fields.get(key) == Some(expected)),
        _ => false,
    }
}

/// Lower-cased, trimmed collection name.
pub(crate) fn normalize_name(name: &str) -> Result<String, Error> {
    let normalized = name.trim().to_lowercase();
    if normalized.is_empty() {
        return Err(Error::InvalidCollectionName {
            name: name.to_string(),
        });
    }
    Ok(normalized)
}

/// A handle on one named collection.
///
/// The handle borrows the store mutably, so it is the only way to change
/// the collection while it is alive. Every mutating call that changes
/// something writes the store snapshot once before returning; reads only
/// look at memory and hand back deep copies.
///
/// # Example
///
/// ```rust
/// use dotstore::{Database, RemoveOptions};
/// use serde_json::json;
///
/// let mut db = Database::in_memory();
/// let mut users = db.collection("users").unwrap();
///
/// users.insert(json!([{ "name": "A" }, { "name": "B" }])).unwrap();
/// assert_eq!(users.count(&Default::default()), 2);
///
/// let query = json!({ "name": "A" }).as_object().cloned().unwrap();
/// users.remove(&query, RemoveOptions::default()).unwrap();
/// assert_eq!(users.count(&Default::default()), 1);
/// ```
pub struct Collection<'s> {
    store: &'s mut PathStore,
    name: String,
    path: KeyPath,
    id_strategy: IdStrategy,
}

impl<'s> Collection<'s> {
    pub(crate) fn open(
        store: &'s mut PathStore,
        collections_key: &str,
        name: &str,
        id_strategy: IdStrategy,
    ) -> Result<Self, Error> {
        let name = normalize_name(name)?;
        let path = KeyPath::root().key(collections_key).key(name.clone());
        store.array_mut(&path)?;
        Ok(Collection {
            store,
            name,
            path,
            id_strategy,
        })
    }

    /// The normalized (lower-case) collection name.
    pub fn name(&self) -> &str {
        &self.name
    }

    fn docs(&self) -> &[Value] {
        match dotstore_core::tree::get(self.store.root(), &self.path) {
            Some(Value::Array(docs)) => docs,
            _ => &[],
        }
    }

    fn docs_mut(&mut self) -> Result<&mut Vec<Value>, Error> {
        self.store.array_mut(&self.path)
    }

    fn matching_indices(&self, query: &Query, multi: bool) -> Vec<usize> {
        let indices = self
            .docs()
            .iter()
            .enumerate()
            .filter(|(_, doc)| matches(doc, query))
            .map(|(i, _)| i);
        if multi {
            indices.collect()
        } else {
            indices.take(1).collect()
        }
    }

    fn with_id(&self, mut doc: Document) -> Document {
        let missing = matches!(doc.get(ID_FIELD), None | Some(Value::Null));
        if missing {
            doc.insert(ID_FIELD.to_string(), Value::String(generate_id(self.id_strategy)));
        }
        doc
    }

    /// Insert one document, generating an `_id` if it has none.
    ///
    /// Returns a copy of the stored document.
    pub fn insert_one(&mut self, doc: Document) -> Result<Document, Error> {
        let doc = self.with_id(doc);
        self.docs_mut()?.push(Value::Object(doc.clone()));
        self.store.persist()?;
        Ok(doc)
    }

    /// Insert several documents, skipping entries that aren't objects.
    ///
    /// Writes the snapshot once if anything was accepted. The result holds
    /// only the accepted documents, in input order.
    pub fn insert_many(&mut self, docs: Vec<Value>) -> Result<Vec<Document>, Error> {
        let mut accepted = Vec::with_capacity(docs.len());
        for (position, doc) in docs.into_iter().enumerate() {
            match doc {
                Value::Object(fields) => accepted.push(self.with_id(fields)),
                other => tracing::warn!(
                    collection = %self.name,
                    position,
                    "skipping {} in insert; documents must be objects",
                    dotstore_core::tree::kind(&other)
                ),
            }
        }

        if accepted.is_empty() {
            return Ok(accepted);
        }

        let stored = self.docs_mut()?;
        stored.extend(accepted.iter().cloned().map(Value::Object));
        self.store.persist()?;
        Ok(accepted)
    }

    /// Insert a document or an array of documents.
    ///
    /// The result has the same shape as the input: an object for an object,
    /// an array of the accepted documents for an array. Any other input is
    /// skipped with a warning and yields `Value::Null`.
    pub fn insert(&mut self, input: Value) -> Result<Value, Error> {
        match input {
            Value::Object(doc) => Ok(Value::Object(self.insert_one(doc)?)),
            Value::Array(docs) => {
                let inserted = self.insert_many(docs)?;
                Ok(Value::Array(inserted.into_iter().map(Value::Object).collect()))
            }
            other => {
                tracing::warn!(
                    collection = %self.name,
                    "skipping {} in insert; documents must be objects",
                    dotstore_core::tree::kind(&other)
                );
                Ok(Value::Null)
            }
        }
    }

    /// Copies of every matching document, in insertion order.
    pub fn find(&self, query: &Query) -> Vec<Document> {
        self.docs()
            .iter()
            .filter(|doc| matches(doc, query))
            .filter_map(|doc| doc.as_object().cloned())
            .collect()
    }

    /// Copy of the first matching document.
    pub fn find_one(&self, query: &Query) -> Option<Document> {
        self.docs()
            .iter()
            .find(|doc| matches(doc, query))
            .and_then(|doc| doc.as_object().cloned())
    }

    /// Copies of every document.
    pub fn find_all(&self) -> Vec<Document> {
        self.find(&Query::new())
    }

    pub fn count(&self, query: &Query) -> usize {
        self.docs().iter().filter(|doc| matches(doc, query)).count()
    }

    /// `_id` values of every document, in insertion order.
    pub fn ids(&self) -> Vec<Value> {
        self.docs()
            .iter()
            .filter_map(|doc| doc.get(ID_FIELD).cloned())
            .collect()
    }

    /// Shallow-merge `fields` into matching documents.
    pub fn update(
        &mut self,
        query: &Query,
        fields: Document,
        options: UpdateOptions,
    ) -> Result<UpdateResult, Error> {
        self.apply_update(query, Change::Merge(fields), options)
    }

    /// Replace matching documents with `transform(copy_of_document)`.
    ///
    /// `_id` is restored afterwards even if the transform drops or changes
    /// it. On upsert the transform receives the query fields.
    pub fn update_with<F>(
        &mut self,
        query: &Query,
        mut transform: F,
        options: UpdateOptions,
    ) -> Result<UpdateResult, Error>
    where
        F: FnMut(Document) -> Document,
    {
        self.apply_update(query, Change::Transform(&mut transform), options)
    }

    fn apply_update(
        &mut self,
        query: &Query,
        mut change: Change<'_>,
        options: UpdateOptions,
    ) -> Result<UpdateResult, Error> {
        let indices = self.matching_indices(query, options.multi);

        if indices.is_empty() {
            if !options.upsert {
                return Ok(UpdateResult::default());
            }
            let doc = change.apply(query.clone());
            let inserted = self.insert_one(doc)?;
            return Ok(UpdateResult {
                count: 1,
                documents: vec![inserted],
                upserted: true,
            });
        }

        let docs = self.docs_mut()?;
        let mut updated = Vec::with_capacity(indices.len());
        for index in indices {
            let Some(current) = docs[index].as_object().cloned() else {
                continue;
            };
            let original_id = current.get(ID_FIELD).cloned();

            let mut next = change.apply(current);
            if let Some(id) = original_id {
                next.insert(ID_FIELD.to_string(), id);
            }

            docs[index] = Value::Object(next.clone());
            updated.push(next);
        }

        if !updated.is_empty() {
            self.store.persist()?;
        }
        Ok(UpdateResult {
            count: updated.len(),
            documents: updated,
            upserted: false,
        })
    }

    /// Remove the first match, or every match with `multi`.
    ///
    /// Returns how many documents were removed.
    pub fn remove(&mut self, query: &Query, options: RemoveOptions) -> Result<usize, Error> {
        let indices = self.matching_indices(query, options.multi);
        if indices.is_empty() {
            return Ok(0);
        }

        let docs = self.docs_mut()?;
        // Back to front so earlier indices stay valid.
        for &index in indices.iter().rev() {
            docs.remove(index);
        }
        self.store.persist()?;
        Ok(indices.len())
    }

    /// Remove every document, keeping the collection itself.
    ///
    /// Returns how many entries were removed.
    pub fn clear(&mut self) -> Result<usize, Error> {
        let docs = self.docs_mut()?;
        let removed = docs.len();
        docs.clear();
        if removed > 0 {
            self.store.persist()?;
        }
        Ok(removed)
    }
}

impl std::fmt::Debug for Collection<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("len", &self.docs().len())
            .finish()
    }
}
