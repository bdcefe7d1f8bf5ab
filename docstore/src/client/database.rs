use crate::client::Connection;
use crate::collection::Collection;
use crate::driver::Namespace;
use crate::errors::StoreResult;

/// A named database on a connection.
///
/// Created implicitly by the first write into one of its collections.
pub struct Database<'a> {
    connection: &'a Connection,
    name: String,
}

impl<'a> Database<'a> {
    pub(crate) fn new(connection: &'a Connection, name: &str) -> Self {
        Database {
            connection,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Gets a handle to a collection. Nothing is created until a write.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid name.
    pub fn collection(&self, name: &str) -> StoreResult<Collection<'a>> {
        let namespace = Namespace::new(&self.name, name)?;
        Ok(Collection::new(self.connection, namespace))
    }

    /// Names of the collections in this database, sorted.
    pub fn list_collection_names(&self) -> StoreResult<Vec<String>> {
        self.connection
            .session()?
            .list_collection_names(&self.name)
            .map_err(|e| e.with_context("list_collection_names", &self.name))
    }

    /// Drops a collection and its documents.
    ///
    /// Returns whether the collection existed.
    pub fn drop_collection(&self, name: &str) -> StoreResult<bool> {
        let namespace = Namespace::new(&self.name, name)?;
        log::debug!("Dropping collection {}", namespace);
        self.connection
            .session()?
            .drop_collection(&namespace)
            .map_err(|e| e.with_context("drop_collection", &namespace.to_string()))
    }
}
