use super::driver::MemoryDriver;
use super::store::MemoryEndpoint;
use crate::collection::{Document, DocumentId};
use crate::driver::{DriverSession, Namespace, UpdateMode, UpdateOutcome};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use crate::filter::Filter;
use crate::update::UpdateSpec;
use std::sync::Arc;
use std::time::Instant;

/// A session opened by [MemoryDriver].
pub struct MemorySession {
    id: u64,
    driver: MemoryDriver,
    endpoint: Arc<MemoryEndpoint>,
    endpoint_name: String,
    closed: bool,
}

impl MemorySession {
    pub(crate) fn new(
        id: u64,
        driver: MemoryDriver,
        endpoint: Arc<MemoryEndpoint>,
        endpoint_name: String,
    ) -> Self {
        MemorySession {
            id,
            driver,
            endpoint,
            endpoint_name,
            closed: false,
        }
    }

    /// Runs the checks every request goes through: the session is open, the
    /// store is reachable, and the simulated latency fits in the deadline.
    fn begin(&self, request: &str, target: &str, deadline: Option<Instant>) -> StoreResult<()> {
        if self.closed {
            log::error!("Memory session {} is closed", self.id);
            return Err(StoreError::new(
                &format!("Session {} is closed", self.id),
                ErrorKind::ConnectionError,
            ));
        }

        log::debug!("Memory session {}: {} on {}", self.id, request, target);
        self.driver.check_reachable()?;

        let latency = self.driver.latency();
        if !latency.is_zero() {
            let wait = match deadline {
                Some(deadline) => latency.min(deadline.saturating_duration_since(Instant::now())),
                None => latency,
            };
            std::thread::sleep(wait);
            self.driver.check_reachable()?;
        }

        if let Some(deadline) = deadline {
            if Instant::now() >= deadline {
                log::error!("{} on {} exceeded its deadline", request, target);
                return Err(StoreError::new(
                    &format!("{} on {} exceeded its deadline", request, target),
                    ErrorKind::TimeoutError,
                ));
            }
        }
        Ok(())
    }
}

impl DriverSession for MemorySession {
    fn ping(&self) -> StoreResult<()> {
        self.begin("ping", &self.endpoint_name, None)
    }

    fn list_database_names(&self) -> StoreResult<Vec<String>> {
        self.begin("list_database_names", &self.endpoint_name, None)?;
        Ok(self.endpoint.database_names())
    }

    fn list_collection_names(&self, database: &str) -> StoreResult<Vec<String>> {
        self.begin("list_collection_names", database, None)?;
        Ok(self.endpoint.collection_names(database))
    }

    fn drop_collection(&self, namespace: &Namespace) -> StoreResult<bool> {
        self.begin("drop_collection", &namespace.to_string(), None)?;
        Ok(self.endpoint.drop_collection(namespace))
    }

    fn insert(
        &self,
        namespace: &Namespace,
        documents: Vec<Document>,
        deadline: Option<Instant>,
    ) -> StoreResult<Vec<DocumentId>> {
        self.begin("insert", &namespace.to_string(), deadline)?;
        self.endpoint
            .collection_or_create(namespace)
            .insert(documents)
    }

    fn find(
        &self,
        namespace: &Namespace,
        filter: &Filter,
        limit: Option<usize>,
        deadline: Option<Instant>,
    ) -> StoreResult<Vec<Document>> {
        self.begin("find", &namespace.to_string(), deadline)?;
        Ok(self
            .endpoint
            .collection(namespace)
            .map(|collection| collection.find(filter, limit))
            .unwrap_or_default())
    }

    fn update(
        &self,
        namespace: &Namespace,
        filter: &Filter,
        update: &UpdateSpec,
        mode: UpdateMode,
        upsert: bool,
        deadline: Option<Instant>,
    ) -> StoreResult<UpdateOutcome> {
        self.begin("update", &namespace.to_string(), deadline)?;
        let collection = if upsert {
            Some(self.endpoint.collection_or_create(namespace))
        } else {
            self.endpoint.collection(namespace)
        };
        match collection {
            Some(collection) => collection.update(filter, update, mode, upsert),
            None => Ok(UpdateOutcome::default()),
        }
    }

    fn find_and_modify(
        &self,
        namespace: &Namespace,
        filter: &Filter,
        update: &UpdateSpec,
        upsert: bool,
        return_updated: bool,
        deadline: Option<Instant>,
    ) -> StoreResult<Option<Document>> {
        self.begin("find_and_modify", &namespace.to_string(), deadline)?;
        let collection = if upsert {
            Some(self.endpoint.collection_or_create(namespace))
        } else {
            self.endpoint.collection(namespace)
        };
        match collection {
            Some(collection) => collection.find_and_modify(filter, update, upsert, return_updated),
            None => Ok(None),
        }
    }

    fn delete(
        &self,
        namespace: &Namespace,
        filter: &Filter,
        limit: Option<usize>,
        deadline: Option<Instant>,
    ) -> StoreResult<u64> {
        self.begin("delete", &namespace.to_string(), deadline)?;
        Ok(self
            .endpoint
            .collection(namespace)
            .map(|collection| collection.delete(filter, limit))
            .unwrap_or(0))
    }

    fn count(
        &self,
        namespace: &Namespace,
        filter: &Filter,
        deadline: Option<Instant>,
    ) -> StoreResult<u64> {
        self.begin("count", &namespace.to_string(), deadline)?;
        Ok(self
            .endpoint
            .collection(namespace)
            .map(|collection| collection.count(filter))
            .unwrap_or(0))
    }

    fn close(&mut self) -> StoreResult<()> {
        if self.closed {
            log::error!("Memory session {} is already closed", self.id);
            return Err(StoreError::new(
                &format!("Session {} is already closed", self.id),
                ErrorKind::InternalError,
            ));
        }

        self.closed = true;
        self.driver.session_closed();
        log::debug!("Closed memory session {} to {}", self.id, self.endpoint_name);

        // the session is released either way, the error only reports it
        self.driver.check_reachable().map_err(|err| {
            StoreError::new_with_cause(
                &format!("Connection to {} was lost before close", self.endpoint_name),
                ErrorKind::ConnectionError,
                err,
            )
        })
    }
}
