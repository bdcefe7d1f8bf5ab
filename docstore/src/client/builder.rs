use crate::client::{ClientConfig, Connection, ConnectionString};
use crate::driver::StoreDriver;
use crate::errors::{StoreError, StoreResult};
use std::time::Duration;

/// Builder for opening a [Connection].
///
/// Configuration errors are captured and returned from
/// [connect](ClientBuilder::connect), so a chain of settings needs only one
/// `?`.
///
/// # Examples
///
/// ```rust,ignore
/// use docstore::client::Client;
/// use docstore::driver::memory::MemoryDriver;
///
/// let driver = MemoryDriver::new();
/// let conn = Client::builder()
///     .driver(driver.clone())
///     .app_name("users-demo")
///     .connect("mongodb://127.0.0.1:27017/usersdb")?;
/// ```
#[derive(Default)]
pub struct ClientBuilder {
    error: Option<StoreError>,
    config: ClientConfig,
}

impl ClientBuilder {
    pub fn new() -> Self {
        ClientBuilder {
            error: None,
            config: ClientConfig::new(),
        }
    }

    /// Sets the application name reported to the driver.
    pub fn app_name(mut self, app_name: &str) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_app_name(app_name) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Sets the timeout applied to collection calls that have none.
    pub fn default_timeout(mut self, timeout: Duration) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_default_timeout(timeout) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Sets the driver connections are opened with.
    ///
    /// Accepts a [StoreDriver] or any provider, such as a
    /// [MemoryDriver](crate::driver::memory::MemoryDriver) clone.
    pub fn driver<D: Into<StoreDriver>>(mut self, driver: D) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_driver(driver.into()) {
                self.error = Some(e);
            }
        }
        self
    }

    /// The configuration built so far.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Opens a connection to `address`.
    ///
    /// # Errors
    ///
    /// Returns the first configuration error, a validation error for a
    /// malformed address, or a connection error if the driver cannot open
    /// a session.
    pub fn connect(self, address: &str) -> StoreResult<Connection> {
        if let Some(error) = self.error {
            return Err(error);
        }

        let address = ConnectionString::parse(address)?;
        self.config.initialize();
        let driver = self.config.driver();
        let session = driver.open(&address, &self.config)?;
        log::info!("Connected to {} using {} driver", address, driver.name());
        Ok(Connection::new(session, address, self.config))
    }
}
