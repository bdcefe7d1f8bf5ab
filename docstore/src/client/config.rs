//! Client configuration.

use crate::driver::StoreDriver;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Settings shared by a client builder and the connections it opens.
///
/// Cloning is cheap and clones share state. Settings can only change until
/// the first connection is opened with them.
///
/// # Examples
///
/// ```rust,ignore
/// use docstore::client::Client;
/// use std::time::Duration;
///
/// let conn = Client::builder()
///     .app_name("users-demo")
///     .default_timeout(Duration::from_secs(5))
///     .connect("mongodb://127.0.0.1:27017/")?;
/// assert_eq!(conn.config().app_name(), Some("users-demo".to_string()));
/// ```
#[derive(Clone)]
pub struct ClientConfig {
    inner: Arc<ClientConfigInner>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientConfig {
    /// Creates a configuration with no app name, no default timeout and the
    /// memory driver.
    pub fn new() -> Self {
        ClientConfig {
            inner: Arc::new(ClientConfigInner::new()),
        }
    }

    /// Name reported to the driver when a session opens.
    pub fn app_name(&self) -> Option<String> {
        self.inner.app_name.read().clone()
    }

    /// Sets the application name.
    ///
    /// # Errors
    ///
    /// Returns error if already configured or if the name is empty.
    pub fn set_app_name(&self, app_name: &str) -> StoreResult<()> {
        self.inner.check_not_configured("App name")?;
        if app_name.trim().is_empty() {
            log::error!("App name cannot be empty");
            return Err(StoreError::new(
                "App name cannot be empty",
                ErrorKind::ValidationError,
            ));
        }
        *self.inner.app_name.write() = Some(app_name.to_string());
        Ok(())
    }

    /// Deadline applied to every collection call without its own timeout.
    pub fn default_timeout(&self) -> Option<Duration> {
        *self.inner.default_timeout.read()
    }

    /// Sets the default per-call timeout.
    ///
    /// # Errors
    ///
    /// Returns error if already configured or if the timeout is zero.
    pub fn set_default_timeout(&self, timeout: Duration) -> StoreResult<()> {
        self.inner.check_not_configured("Default timeout")?;
        if timeout.is_zero() {
            log::error!("Default timeout must be greater than zero");
            return Err(StoreError::new(
                "Default timeout must be greater than zero",
                ErrorKind::ValidationError,
            ));
        }
        *self.inner.default_timeout.write() = Some(timeout);
        Ok(())
    }

    /// The driver connections are opened with.
    pub fn driver(&self) -> StoreDriver {
        self.inner.driver.read().clone()
    }

    /// Sets the driver.
    ///
    /// # Errors
    ///
    /// Returns error if already configured.
    pub fn set_driver(&self, driver: StoreDriver) -> StoreResult<()> {
        self.inner.check_not_configured("Driver")?;
        *self.inner.driver.write() = driver;
        Ok(())
    }

    pub fn is_configured(&self) -> bool {
        self.inner.configured.load(Ordering::Relaxed)
    }

    /// Freezes the configuration. Called when a connection opens.
    pub(crate) fn initialize(&self) {
        self.inner.configured.store(true, Ordering::Relaxed);
    }
}

struct ClientConfigInner {
    configured: AtomicBool,
    app_name: RwLock<Option<String>>,
    default_timeout: RwLock<Option<Duration>>,
    driver: RwLock<StoreDriver>,
}

impl ClientConfigInner {
    fn new() -> Self {
        ClientConfigInner {
            configured: AtomicBool::new(false),
            app_name: RwLock::new(None),
            default_timeout: RwLock::new(None),
            driver: RwLock::new(StoreDriver::default()),
        }
    }

    fn check_not_configured(&self, setting: &str) -> StoreResult<()> {
        if self.configured.load(Ordering::Relaxed) {
            log::error!("{} cannot be changed after a connection is opened", setting);
            return Err(StoreError::new(
                &format!("{} cannot be changed after a connection is opened", setting),
                ErrorKind::ValidationError,
            ));
        }
        Ok(())
    }
}
