//! The CRUD mutation extension.
//!
//! A route opts in with `"crud": true`. Its GET `staticResponse` array is
//! handed to a [`Collection`] once at startup; from then on the
//! [`Repository`] owns the records and is the only writer of the
//! configuration file. Each mutation persists the *whole* document, with
//! every live collection spliced back into its route.
//!
//! Identifiers are integers assigned as `max(existing) + 1`, so a deleted
//! id is never reused while a larger one exists.

use std::collections::BTreeMap;

use mimic_types::{Config, HttpVerb};
use serde_json::{Map, Value};
use tracing::{debug, error};

use crate::store::ConfigStore;

/// A single collection record.
pub type Record = Map<String, Value>;

/// Errors returned by collection operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RepositoryError {
    /// No record carries the requested id.
    #[error("record {id} not found")]
    NotFound {
        /// The requested id.
        id: i64,
    },

    /// The route index does not name a CRUD collection.
    #[error("route #{0} is not a crud collection")]
    UnknownCollection(usize),

    /// The initial contents are not a list of objects.
    #[error("collection must be an array of objects: {0}")]
    InvalidCollection(String),
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

/// An ordered list of records with integer `id` fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collection {
    records: Vec<Record>,
}

impl Collection {
    /// Build a collection from a route's static response. `None` (or
    /// `null`) yields an empty collection.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::InvalidCollection`] when the value is not
    /// an array of objects.
    pub fn from_value(value: Option<&Value>) -> Result<Self, RepositoryError> {
        let items = match value {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(Value::Array(items)) => items,
            Some(other) => {
                return Err(RepositoryError::InvalidCollection(format!(
                    "found {}",
                    kind_name(other)
                )));
            }
        };

        let records = items
            .iter()
            .enumerate()
            .map(|(i, item)| match item {
                Value::Object(record) => Ok(record.clone()),
                other => Err(RepositoryError::InvalidCollection(format!(
                    "item {i} is {}",
                    kind_name(other)
                ))),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { records })
    }

    /// All records in insertion order.
    pub fn list(&self) -> &[Record] {
        &self.records
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The collection as a JSON array.
    pub fn to_value(&self) -> Value {
        Value::Array(self.records.iter().cloned().map(Value::Object).collect())
    }

    /// First record whose `id` equals `id`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when no record matches.
    pub fn get(&self, id: i64) -> Result<&Record, RepositoryError> {
        self.records
            .iter()
            .find(|r| record_id(r) == Some(id))
            .ok_or(RepositoryError::NotFound { id })
    }

    /// The id the next created record receives: one past the largest
    /// existing integer id, or `1` when there is none.
    pub fn next_id(&self) -> i64 {
        self.records
            .iter()
            .filter_map(record_id)
            .max()
            .map_or(1, |max| max.saturating_add(1))
    }

    /// Append a record built from `payload` with a freshly assigned id.
    /// The assigned id replaces any `id` in the payload.
    pub fn create(&mut self, mut payload: Record) -> Record {
        let id = self.next_id();
        payload.insert("id".to_owned(), Value::from(id));
        self.records.push(payload.clone());
        payload
    }

    /// Shallow-merge `payload` onto the record with `id`. Fields absent
    /// from the payload are kept; the record's `id` never changes.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when no record matches.
    pub fn update(&mut self, id: i64, payload: Record) -> Result<Record, RepositoryError> {
        let record = self
            .records
            .iter_mut()
            .find(|r| record_id(r) == Some(id))
            .ok_or(RepositoryError::NotFound { id })?;

        for (key, value) in payload {
            if key != "id" {
                record.insert(key, value);
            }
        }
        Ok(record.clone())
    }

    /// Remove the first record with `id` and return it.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::NotFound`] when no record matches.
    pub fn delete(&mut self, id: i64) -> Result<Record, RepositoryError> {
        let index = self
            .records
            .iter()
            .position(|r| record_id(r) == Some(id))
            .ok_or(RepositoryError::NotFound { id })?;
        Ok(self.records.remove(index))
    }
}

fn record_id(record: &Record) -> Option<i64> {
    record.get("id").and_then(Value::as_i64)
}

const fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ---------------------------------------------------------------------------
// Repository
// ---------------------------------------------------------------------------

/// Owner of every CRUD collection and of the configuration file.
///
/// Callers must serialize access (the server wraps it in a mutex) so that
/// id assignment, append and persistence happen as one step.
#[derive(Debug)]
pub struct Repository {
    document: Config,
    collections: BTreeMap<usize, Collection>,
    store: Option<ConfigStore>,
}

impl Repository {
    /// Take ownership of the CRUD routes' initial contents.
    ///
    /// `store` is where mutations are persisted; `None` keeps everything
    /// in memory.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::InvalidCollection`] when a CRUD route's
    /// GET `staticResponse` is not an array of objects.
    pub fn new(mut document: Config, store: Option<ConfigStore>) -> Result<Self, RepositoryError> {
        let mut collections = BTreeMap::new();
        for (index, route) in document.routes.iter_mut().enumerate() {
            if !route.crud {
                continue;
            }
            let initial = route
                .methods
                .get_mut(&HttpVerb::Get)
                .and_then(|get| get.static_response.take());
            collections.insert(index, Collection::from_value(initial.as_ref())?);
        }
        Ok(Self {
            document,
            collections,
            store,
        })
    }

    /// The collection of the route at `route`.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::UnknownCollection`] for non-CRUD routes.
    pub fn collection(&self, route: usize) -> Result<&Collection, RepositoryError> {
        self.collections
            .get(&route)
            .ok_or(RepositoryError::UnknownCollection(route))
    }

    fn collection_mut(&mut self, route: usize) -> Result<&mut Collection, RepositoryError> {
        self.collections
            .get_mut(&route)
            .ok_or(RepositoryError::UnknownCollection(route))
    }

    /// Create a record and persist.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::UnknownCollection`] for non-CRUD routes.
    pub async fn create(&mut self, route: usize, payload: Record) -> Result<Record, RepositoryError> {
        let record = self.collection_mut(route)?.create(payload);
        self.persist().await;
        Ok(record)
    }

    /// Update a record and persist.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] for unknown routes or ids.
    pub async fn update(
        &mut self,
        route: usize,
        id: i64,
        payload: Record,
    ) -> Result<Record, RepositoryError> {
        let record = self.collection_mut(route)?.update(id, payload)?;
        self.persist().await;
        Ok(record)
    }

    /// Delete a record and persist.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] for unknown routes or ids.
    pub async fn delete(&mut self, route: usize, id: i64) -> Result<Record, RepositoryError> {
        let record = self.collection_mut(route)?.delete(id)?;
        self.persist().await;
        Ok(record)
    }

    /// The full configuration with live collections spliced in.
    pub fn snapshot(&self) -> Config {
        let mut config = self.document.clone();
        for (index, collection) in &self.collections {
            if let Some(get) = config
                .routes
                .get_mut(*index)
                .and_then(|route| route.methods.get_mut(&HttpVerb::Get))
            {
                get.static_response = Some(collection.to_value());
            }
        }
        config
    }

    /// Write the snapshot back to the store. Failures are logged and
    /// otherwise ignored; memory then holds newer state than the file.
    async fn persist(&self) {
        let Some(store) = &self.store else {
            return;
        };
        match store.save(&self.snapshot()).await {
            Ok(()) => debug!(path = %store.path().display(), "configuration persisted"),
            Err(e) => error!(
                path = %store.path().display(),
                error = %e,
                "failed to persist configuration, in-memory state diverges from disk"
            ),
        }
    }
}
