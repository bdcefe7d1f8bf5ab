//! The seam between the client façade and a backing store.
//!
//! The façade never talks to a store directly. It opens a
//! [DriverSession] through a [StoreDriverProvider] and sends it
//! namespace-scoped requests, one per façade call. A provider is wrapped in
//! a cloneable [StoreDriver] before it is handed to the client builder.
//!
//! # Implementations
//! - [MemoryDriver](memory::MemoryDriver): in-process store shared by every
//!   connection to the same endpoint, with fault injection for tests
//!
//! # Deadlines
//! Every data request carries an optional deadline. A session that cannot
//! complete the request before it fails with
//! [ErrorKind::TimeoutError](crate::errors::ErrorKind::TimeoutError).

pub mod memory;

use crate::client::{ClientConfig, ConnectionString};
use crate::collection::{Document, DocumentId};
use crate::common::INVALID_NAME_CHARS;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::filter::Filter;
use crate::update::UpdateSpec;
use std::fmt::Display;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Instant;

/// The `(database, collection)` pair every data request is scoped to.
///
/// Rendered as `database.collection`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Namespace {
    database: String,
    collection: String,
}

impl Namespace {
    /// Creates a validated namespace.
    ///
    /// # Errors
    ///
    /// Returns a validation error if either name is empty or contains `.`,
    /// `$` or NUL.
    pub fn new(database: &str, collection: &str) -> StoreResult<Namespace> {
        validate_name("Database", database)?;
        validate_name("Collection", collection)?;
        Ok(Namespace {
            database: database.to_string(),
            collection: collection.to_string(),
        })
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

impl Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Checks a database or collection name.
pub fn validate_name(kind: &str, name: &str) -> StoreResult<()> {
    if name.is_empty() {
        log::error!("{} name cannot be empty", kind);
        return Err(StoreError::new(
            &format!("{} name cannot be empty", kind),
            ErrorKind::ValidationError,
        ));
    }

    if let Some(c) = name.chars().find(|c| INVALID_NAME_CHARS.contains(c)) {
        log::error!("{} name {:?} contains invalid character {:?}", kind, name, c);
        return Err(StoreError::new(
            &format!("{} name {:?} contains invalid character {:?}", kind, name, c),
            ErrorKind::ValidationError,
        ));
    }
    Ok(())
}

/// How many matching documents an update touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    /// Only the first match in store order
    One,
    /// Every match
    Many,
}

/// What an update request did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
    pub upserted_id: Option<DocumentId>,
}

/// Opens sessions against a store endpoint.
///
/// # Thread Safety
/// Implementers must be `Send + Sync`; one provider serves every connection
/// a builder opens.
pub trait StoreDriverProvider: Send + Sync {
    /// Name of the driver, used in logs.
    fn name(&self) -> &str;

    /// Opens a session to the endpoint named by `address`.
    ///
    /// # Errors
    /// Returns a connection error if the endpoint cannot be reached.
    fn open(
        &self,
        address: &ConnectionString,
        config: &ClientConfig,
    ) -> StoreResult<Box<dyn DriverSession>>;
}

/// One open channel to a store endpoint.
///
/// A session serves one connection; requests arrive one at a time, in the
/// order the connection issues them. Sessions are `Send` but need not be
/// `Sync`.
///
/// Reads against a database or collection that does not exist succeed with
/// empty results. Writes create what they need.
pub trait DriverSession: Send {
    /// Checks that the channel is usable.
    fn ping(&self) -> StoreResult<()>;

    /// Names of databases holding at least one collection, sorted.
    fn list_database_names(&self) -> StoreResult<Vec<String>>;

    /// Names of the collections of `database`, sorted.
    fn list_collection_names(&self, database: &str) -> StoreResult<Vec<String>>;

    /// Drops a collection, returning whether it existed.
    fn drop_collection(&self, namespace: &Namespace) -> StoreResult<bool>;

    /// Inserts documents in order.
    ///
    /// Documents without `_id` get one. A failure stops the batch and is
    /// reported as a partial write error listing the ids inserted before
    /// it, with the rejection as its cause.
    fn insert(
        &self,
        namespace: &Namespace,
        documents: Vec<Document>,
        deadline: Option<Instant>,
    ) -> StoreResult<Vec<DocumentId>>;

    /// Returns matching documents in store order, at most `limit` of them.
    fn find(
        &self,
        namespace: &Namespace,
        filter: &Filter,
        limit: Option<usize>,
        deadline: Option<Instant>,
    ) -> StoreResult<Vec<Document>>;

    /// Updates matching documents, inserting one when `upsert` is set and
    /// nothing matches.
    fn update(
        &self,
        namespace: &Namespace,
        filter: &Filter,
        update: &UpdateSpec,
        mode: UpdateMode,
        upsert: bool,
        deadline: Option<Instant>,
    ) -> StoreResult<UpdateOutcome>;

    /// Atomically updates the first match and returns its pre-update
    /// snapshot, or the post-update one if `return_updated` is set.
    fn find_and_modify(
        &self,
        namespace: &Namespace,
        filter: &Filter,
        update: &UpdateSpec,
        upsert: bool,
        return_updated: bool,
        deadline: Option<Instant>,
    ) -> StoreResult<Option<Document>>;

    /// Deletes matching documents, at most `limit` of them.
    fn delete(
        &self,
        namespace: &Namespace,
        filter: &Filter,
        limit: Option<usize>,
        deadline: Option<Instant>,
    ) -> StoreResult<u64>;

    /// Counts matching documents.
    fn count(
        &self,
        namespace: &Namespace,
        filter: &Filter,
        deadline: Option<Instant>,
    ) -> StoreResult<u64>;

    /// Releases the session. Called exactly once by the owning connection.
    fn close(&mut self) -> StoreResult<()>;
}

/// Cloneable handle to a [StoreDriverProvider].
///
/// Derefs to the provider. The default driver is a fresh
/// [MemoryDriver](memory::MemoryDriver).
#[derive(Clone)]
pub struct StoreDriver {
    inner: Arc<dyn StoreDriverProvider>,
}

impl StoreDriver {
    pub fn new<T: StoreDriverProvider + 'static>(inner: T) -> Self {
        StoreDriver {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for StoreDriver {
    type Target = Arc<dyn StoreDriverProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl Default for StoreDriver {
    fn default() -> Self {
        StoreDriver::new(memory::MemoryDriver::new())
    }
}

impl<T: StoreDriverProvider + 'static> From<T> for StoreDriver {
    fn from(value: T) -> Self {
        StoreDriver::new(value)
    }
}
