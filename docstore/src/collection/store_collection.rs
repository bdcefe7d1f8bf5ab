use crate::client::Connection;
use crate::collection::{
    Cursor, DeleteResult, Document, FindOneAndUpdateOptions, InsertManyResult,
    InsertOneResult, UpdateOptions, UpdateResult,
};
use crate::driver::{DriverSession, Namespace, UpdateMode};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::filter::IntoFilter;
use crate::update::{has_operator_key, IntoUpdate};
use std::time::{Duration, Instant};

/// A handle to a named collection.
///
/// Every call is a single request to the store through the connection the
/// handle borrows. Errors leaving a call carry the operation name and the
/// `database.collection` namespace. Nothing is retried.
///
/// A collection is created by the first write into it. Reads against a
/// collection that does not exist return empty results.
///
/// # Examples
///
/// ```rust,ignore
/// use docstore::doc;
/// use docstore::collection::{FindOneAndUpdateOptions, UpdateOptions};
///
/// let users = conn.database("usersdb")?.collection("users")?;
///
/// users.insert_many(vec![
///     doc! { name: "Ivan", age: 25 },
///     doc! { name: "Anna", age: 24 },
/// ])?;
///
/// let anna: Vec<_> = users.find(doc! { name: "Anna", age: 24 })?.collect();
/// let result = users.update_one(
///     doc! { age: 34 },
///     doc! { "$set": { age: 35 } },
///     UpdateOptions::upsert(),
/// )?;
/// let updated = users.find_one_and_update(
///     doc! { name: "Taras" },
///     doc! { "$set": { age: 45 } },
///     FindOneAndUpdateOptions::default().return_updated(true),
/// )?;
/// users.delete_many(doc! { name: "Ivan" })?;
/// ```
pub struct Collection<'a> {
    connection: &'a Connection,
    namespace: Namespace,
    timeout: Option<Duration>,
}

impl<'a> Collection<'a> {
    pub(crate) fn new(connection: &'a Connection, namespace: Namespace) -> Self {
        Collection {
            connection,
            namespace,
            timeout: None,
        }
    }

    pub fn name(&self) -> &str {
        self.namespace.collection()
    }

    pub fn database_name(&self) -> &str {
        self.namespace.database()
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Returns a handle whose calls must complete within `timeout`.
    ///
    /// Overrides the connection's default timeout.
    pub fn with_timeout(&self, timeout: Duration) -> Collection<'a> {
        Collection {
            connection: self.connection,
            namespace: self.namespace.clone(),
            timeout: Some(timeout),
        }
    }

    /// The timeout calls on this handle use, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout.or_else(|| self.connection.config().default_timeout())
    }

    /// Inserts a single document, assigning `_id` if absent.
    ///
    /// Calling it twice with the same document content inserts two
    /// documents.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `_id` is present but not a
    /// [DocumentId](crate::collection::DocumentId) or a field name starts
    /// with `$`, and a write error if the store rejects the document.
    pub fn insert_one(&self, document: Document) -> StoreResult<InsertOneResult> {
        self.run("insert_one", |session, deadline| {
            let mut document = document;
            check_field_names(&document)?;
            let id = document.ensure_id()?;
            match session.insert(&self.namespace, vec![document], deadline) {
                Ok(_) => Ok(InsertOneResult::new(id)),
                Err(err) => Err(single_write_error(err)),
            }
        })
    }

    /// Inserts documents in order.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty batch or a document with an
    /// invalid `_id` or a `$` field name (nothing is written then). A rejected document stops
    /// the batch with a [ErrorKind::PartialWriteError] holding the ids of
    /// the documents inserted before it.
    pub fn insert_many(&self, documents: Vec<Document>) -> StoreResult<InsertManyResult> {
        self.run("insert_many", |session, deadline| {
            if documents.is_empty() {
                log::error!("Cannot insert an empty batch of documents");
                return Err(StoreError::new(
                    "Cannot insert an empty batch of documents",
                    ErrorKind::ValidationError,
                ));
            }

            let mut documents = documents;
            for document in documents.iter_mut() {
                check_field_names(document)?;
                document.ensure_id()?;
            }

            let inserted = session.insert(&self.namespace, documents, deadline)?;
            Ok(InsertManyResult::new(inserted))
        })
    }

    /// Returns every matching document, in store order.
    pub fn find<F: IntoFilter>(&self, filter: F) -> StoreResult<Cursor> {
        self.run("find", |session, deadline| {
            let filter = filter.into_filter()?;
            let documents = session.find(&self.namespace, &filter, None, deadline)?;
            Ok(Cursor::new(documents))
        })
    }

    /// Returns the first matching document, or `None`.
    pub fn find_one<F: IntoFilter>(&self, filter: F) -> StoreResult<Option<Document>> {
        self.run("find_one", |session, deadline| {
            let filter = filter.into_filter()?;
            let documents = session.find(&self.namespace, &filter, Some(1), deadline)?;
            Ok(documents.into_iter().next())
        })
    }

    /// Counts matching documents.
    pub fn count_documents<F: IntoFilter>(&self, filter: F) -> StoreResult<u64> {
        self.run("count_documents", |session, deadline| {
            let filter = filter.into_filter()?;
            session.count(&self.namespace, &filter, deadline)
        })
    }

    /// Updates the first matching document.
    ///
    /// With upsert, and nothing matching, inserts a document built from the
    /// filter's fields with the update applied, and reports its id.
    pub fn update_one<F: IntoFilter, U: IntoUpdate>(
        &self,
        filter: F,
        update: U,
        options: UpdateOptions,
    ) -> StoreResult<UpdateResult> {
        self.update("update_one", filter, update, UpdateMode::One, options)
    }

    /// Updates every matching document. An upsert inserts at most one.
    pub fn update_many<F: IntoFilter, U: IntoUpdate>(
        &self,
        filter: F,
        update: U,
        options: UpdateOptions,
    ) -> StoreResult<UpdateResult> {
        self.update("update_many", filter, update, UpdateMode::Many, options)
    }

    /// Atomically updates the first matching document and returns it.
    ///
    /// Returns the document as it was before the update, or after it when
    /// `return_updated` is set. Returns `None` when nothing matches; with
    /// upsert the inserted document is returned only if `return_updated`
    /// is set.
    pub fn find_one_and_update<F: IntoFilter, U: IntoUpdate>(
        &self,
        filter: F,
        update: U,
        options: FindOneAndUpdateOptions,
    ) -> StoreResult<Option<Document>> {
        self.run("find_one_and_update", |session, deadline| {
            let filter = filter.into_filter()?;
            let update = update.into_update()?;
            session.find_and_modify(
                &self.namespace,
                &filter,
                &update,
                options.is_upsert(),
                options.is_return_updated(),
                deadline,
            )
        })
    }

    /// Deletes the first matching document.
    pub fn delete_one<F: IntoFilter>(&self, filter: F) -> StoreResult<DeleteResult> {
        self.run("delete_one", |session, deadline| {
            let filter = filter.into_filter()?;
            let deleted = session.delete(&self.namespace, &filter, Some(1), deadline)?;
            Ok(DeleteResult::new(deleted))
        })
    }

    /// Deletes every matching document. Deleting nothing is not an error.
    pub fn delete_many<F: IntoFilter>(&self, filter: F) -> StoreResult<DeleteResult> {
        self.run("delete_many", |session, deadline| {
            let filter = filter.into_filter()?;
            let deleted = session.delete(&self.namespace, &filter, None, deadline)?;
            Ok(DeleteResult::new(deleted))
        })
    }

    fn update<F: IntoFilter, U: IntoUpdate>(
        &self,
        operation: &str,
        filter: F,
        update: U,
        mode: UpdateMode,
        options: UpdateOptions,
    ) -> StoreResult<UpdateResult> {
        self.run(operation, |session, deadline| {
            let filter = filter.into_filter()?;
            let update = update.into_update()?;
            let outcome = session.update(
                &self.namespace,
                &filter,
                &update,
                mode,
                options.is_upsert(),
                deadline,
            )?;
            Ok(UpdateResult::new(
                outcome.matched,
                outcome.modified,
                outcome.upserted_id,
            ))
        })
    }

    fn run<T>(
        &self,
        operation: &str,
        request: impl FnOnce(&dyn DriverSession, Option<Instant>) -> StoreResult<T>,
    ) -> StoreResult<T> {
        log::debug!("{} on {}", operation, self.namespace);
        // a deadline past what Instant can hold is no deadline
        let deadline = self
            .timeout()
            .and_then(|timeout| Instant::now().checked_add(timeout));
        self.connection
            .session()
            .and_then(|session| request(session, deadline))
            .map_err(|err| err.with_context(operation, &self.namespace.to_string()))
    }
}

fn check_field_names(document: &Document) -> StoreResult<()> {
    if has_operator_key(document) {
        log::error!("Field names starting with '$' cannot be stored");
        return Err(StoreError::new(
            "Field names starting with '$' cannot be stored",
            ErrorKind::ValidationError,
        ));
    }
    Ok(())
}

/// A one-document batch reports its rejection as the partial write's cause.
fn single_write_error(err: StoreError) -> StoreError {
    match err.kind() {
        ErrorKind::PartialWriteError { .. } => match err.cause() {
            Some(cause) => cause.clone(),
            None => StoreError::new(err.message(), ErrorKind::WriteError),
        },
        _ => err,
    }
}
