use super::session::MemorySession;
use super::store::MemoryEndpoint;
use crate::client::{ClientConfig, ConnectionString};
use crate::driver::{DriverSession, Namespace, StoreDriverProvider};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// In-memory implementation of [StoreDriverProvider].
///
/// Cheap to clone; clones share endpoints, fault settings and session
/// counters.
#[derive(Clone, Default)]
pub struct MemoryDriver {
    inner: Arc<MemoryDriverInner>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        MemoryDriver::default()
    }

    /// Makes the store reachable or unreachable.
    ///
    /// While unreachable, opening a session and every request on an open
    /// session fail with a connection error.
    pub fn set_reachable(&self, reachable: bool) {
        log::debug!("Memory driver reachable: {}", reachable);
        self.inner.reachable.store(reachable, Ordering::SeqCst);
    }

    pub fn is_reachable(&self) -> bool {
        self.inner.reachable.load(Ordering::SeqCst)
    }

    /// Delays every request by `latency` before it runs.
    pub fn set_latency(&self, latency: Duration) {
        *self.inner.latency.write() = latency;
    }

    pub fn latency(&self) -> Duration {
        *self.inner.latency.read()
    }

    /// Rejects writes that would store a duplicate non-null value at
    /// `field` in the given collection, creating the collection if needed.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a bad address or names, and a write
    /// error if the collection already holds duplicate values.
    pub fn create_unique_index(
        &self,
        address: &str,
        database: &str,
        collection: &str,
        field: &str,
    ) -> StoreResult<()> {
        let address = ConnectionString::parse(address)?;
        let namespace = Namespace::new(database, collection)?;
        self.inner
            .endpoint(&address.endpoint())
            .collection_or_create(&namespace)
            .add_unique_field(field)
    }

    /// Number of sessions opened and not yet closed.
    pub fn open_sessions(&self) -> u64 {
        self.sessions_opened() - self.sessions_closed()
    }

    /// Number of sessions ever opened.
    pub fn sessions_opened(&self) -> u64 {
        self.inner.opened.load(Ordering::SeqCst)
    }

    /// Number of session releases, including failed ones.
    pub fn sessions_closed(&self) -> u64 {
        self.inner.closed.load(Ordering::SeqCst)
    }

    pub(crate) fn session_closed(&self) {
        self.inner.closed.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn check_reachable(&self) -> StoreResult<()> {
        if self.is_reachable() {
            Ok(())
        } else {
            log::error!("Store endpoint is unreachable");
            Err(StoreError::new(
                "Store endpoint is unreachable",
                ErrorKind::ConnectionError,
            ))
        }
    }
}

impl StoreDriverProvider for MemoryDriver {
    fn name(&self) -> &str {
        "memory"
    }

    fn open(
        &self,
        address: &ConnectionString,
        config: &ClientConfig,
    ) -> StoreResult<Box<dyn DriverSession>> {
        self.check_reachable().map_err(|err| {
            StoreError::new_with_cause(
                &format!("Cannot connect to {}", address),
                ErrorKind::ConnectionError,
                err,
            )
        })?;

        let endpoint_name = address.endpoint();
        let endpoint = self.inner.endpoint(&endpoint_name);
        let id = self.inner.opened.fetch_add(1, Ordering::SeqCst) + 1;
        log::debug!(
            "Opened memory session {} to {} for {}",
            id,
            endpoint_name,
            config.app_name().unwrap_or_else(|| "unnamed client".to_string())
        );
        Ok(Box::new(MemorySession::new(
            id,
            self.clone(),
            endpoint,
            endpoint_name,
        )))
    }
}

struct MemoryDriverInner {
    endpoints: DashMap<String, Arc<MemoryEndpoint>>,
    reachable: AtomicBool,
    latency: RwLock<Duration>,
    opened: AtomicU64,
    closed: AtomicU64,
}

impl Default for MemoryDriverInner {
    fn default() -> Self {
        MemoryDriverInner {
            endpoints: DashMap::new(),
            reachable: AtomicBool::new(true),
            latency: RwLock::new(Duration::ZERO),
            opened: AtomicU64::new(0),
            closed: AtomicU64::new(0),
        }
    }
}

impl MemoryDriverInner {
    fn endpoint(&self, name: &str) -> Arc<MemoryEndpoint> {
        self.endpoints
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(MemoryEndpoint::new()))
            .value()
            .clone()
    }
}
