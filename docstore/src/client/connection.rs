use crate::client::{ClientBuilder, ClientConfig, ConnectionString, Database};
use crate::driver::{validate_name, DriverSession};
use crate::errors::{ErrorKind, StoreError, StoreResult};
use std::cell::Cell;
use std::marker::PhantomData;

/// An open channel to a store endpoint.
///
/// A connection owns one driver session. It is released exactly once:
/// either by [close](Connection::close), which consumes it and reports the
/// driver's result, or when it is dropped, which logs any failure. Database
/// and collection handles borrow the connection, so they cannot outlive it.
///
/// A connection is `Send` but not `Sync`: it may move to another thread,
/// but one sequence of calls uses it at a time.
///
/// # Examples
///
/// ```rust,ignore
/// use docstore::doc;
///
/// let conn = docstore::connect("mongodb://127.0.0.1:27017/")?;
/// let users = conn.database("usersdb")?.collection("users")?;
/// users.insert_one(doc! { name: "Ivan", age: 25 })?;
/// conn.close()?;
/// ```
pub struct Connection {
    session: Option<Box<dyn DriverSession>>,
    address: ConnectionString,
    config: ClientConfig,
    _not_sync: PhantomData<Cell<()>>,
}

impl Connection {
    pub(crate) fn new(
        session: Box<dyn DriverSession>,
        address: ConnectionString,
        config: ClientConfig,
    ) -> Self {
        Connection {
            session: Some(session),
            address,
            config,
            _not_sync: PhantomData,
        }
    }

    /// Gets a handle to a database. Nothing is created until a write.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an invalid name.
    pub fn database(&self, name: &str) -> StoreResult<Database<'_>> {
        validate_name("Database", name)?;
        Ok(Database::new(self, name))
    }

    /// Gets a handle to the database named in the connection string.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the address names no database.
    pub fn default_database(&self) -> StoreResult<Database<'_>> {
        match self.address.default_database() {
            Some(name) => self.database(name),
            None => {
                log::error!("Connection string {} names no default database", self.address);
                Err(StoreError::new(
                    &format!("Connection string {} names no default database", self.address),
                    ErrorKind::ValidationError,
                ))
            }
        }
    }

    /// Names of the databases holding data, sorted.
    pub fn list_database_names(&self) -> StoreResult<Vec<String>> {
        self.session()?.list_database_names()
    }

    /// Checks that the channel to the store is usable.
    ///
    /// # Errors
    ///
    /// Returns a connection error if the channel was lost.
    pub fn ping(&self) -> StoreResult<()> {
        self.session()?.ping()
    }

    pub fn address(&self) -> &ConnectionString {
        &self.address
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Releases the connection.
    ///
    /// # Errors
    ///
    /// Returns the driver's error if releasing failed. The connection is
    /// released either way.
    pub fn close(mut self) -> StoreResult<()> {
        self.release()
    }

    pub(crate) fn session(&self) -> StoreResult<&dyn DriverSession> {
        match &self.session {
            Some(session) => Ok(session.as_ref()),
            None => {
                log::error!("Connection to {} is already released", self.address);
                Err(StoreError::new(
                    &format!("Connection to {} is already released", self.address),
                    ErrorKind::InternalError,
                ))
            }
        }
    }

    fn release(&mut self) -> StoreResult<()> {
        match self.session.take() {
            Some(mut session) => {
                log::info!("Closing connection to {}", self.address);
                session.close()
            }
            None => Ok(()),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        if let Err(e) = self.release() {
            log::error!("Error while releasing connection to {}: {}", self.address, e);
        }
    }
}

/// Entry point of the client façade.
///
/// ```rust,ignore
/// use docstore::client::Client;
///
/// let conn = Client::builder()
///     .app_name("users-demo")
///     .connect("mongodb://127.0.0.1:27017/")?;
/// ```
pub struct Client;

impl Client {
    /// Creates a builder with the default configuration.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Opens a connection with the default configuration.
    pub fn connect(address: &str) -> StoreResult<Connection> {
        ClientBuilder::new().connect(address)
    }
}

/// Connects, runs `body` with the connection, then closes it.
///
/// The connection is released on every path, including when `body` panics.
/// Returns the body's result, or the close error if the body succeeded but
/// closing failed. A close error after a failed body is logged and the
/// body's error returned.
///
/// ```rust,ignore
/// use docstore::{doc, with_connection};
/// use docstore::client::Client;
///
/// let result = with_connection(Client::builder(), "mongodb://127.0.0.1:27017/", |conn| {
///     let users = conn.database("usersdb")?.collection("users")?;
///     users.insert_one(doc! { name: "Ivan", age: 25 })
/// })?;
/// ```
pub fn with_connection<T, F>(builder: ClientBuilder, address: &str, body: F) -> StoreResult<T>
where
    F: FnOnce(&Connection) -> StoreResult<T>,
{
    let connection = builder.connect(address)?;
    let result = body(&connection);
    let closed = connection.close();
    match (result, closed) {
        (Ok(value), Ok(())) => Ok(value),
        (Ok(_), Err(close_error)) => Err(close_error),
        (Err(error), Err(close_error)) => {
            log::error!("Error while releasing connection: {}", close_error);
            Err(error)
        }
        (Err(error), Ok(())) => Err(error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::memory::MemoryDriver;

    // runs once per test binary, logging for every unit test in the crate
    #[ctor::ctor]
    fn init() {
        colog::init();
    }

    fn connect(driver: &MemoryDriver, address: &str) -> Connection {
        Client::builder()
            .driver(driver.clone())
            .connect(address)
            .ok()
            .unwrap()
    }

    #[test]
    fn connection_is_send() {
        fn assert_send<T: Send>() {}
        assert_send::<Connection>();
    }

    #[test]
    fn close_releases_once() {
        let driver = MemoryDriver::new();
        let conn = connect(&driver, "mongodb://localhost");
        assert_eq!(driver.open_sessions(), 1);
        conn.close().unwrap();
        assert_eq!(driver.open_sessions(), 0);
        assert_eq!(driver.sessions_closed(), 1);
    }

    #[test]
    fn drop_releases() {
        let driver = MemoryDriver::new();
        {
            let _conn = connect(&driver, "mongodb://localhost");
            assert_eq!(driver.open_sessions(), 1);
        }
        assert_eq!(driver.open_sessions(), 0);
        assert_eq!(driver.sessions_closed(), 1);
    }

    #[test]
    fn close_reports_lost_connection() {
        let driver = MemoryDriver::new();
        let conn = connect(&driver, "mongodb://localhost");
        driver.set_reachable(false);
        let err = conn.close().unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ConnectionError);
        assert_eq!(driver.sessions_closed(), 1);
    }

    #[test]
    fn database_names_are_validated() {
        let driver = MemoryDriver::new();
        let conn = connect(&driver, "mongodb://localhost");
        assert!(conn.database("usersdb").is_ok());
        assert!(conn.database("").is_err());
        assert!(conn.database("a.b").is_err());
    }

    #[test]
    fn default_database_comes_from_address() {
        let driver = MemoryDriver::new();
        let conn = connect(&driver, "mongodb://localhost/usersdb");
        assert_eq!(conn.default_database().unwrap().name(), "usersdb");
        let conn = connect(&driver, "mongodb://localhost/");
        let err = conn.default_database().err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn ping_reports_lost_connection() {
        let driver = MemoryDriver::new();
        let conn = connect(&driver, "mongodb://localhost");
        assert!(conn.ping().is_ok());
        driver.set_reachable(false);
        assert_eq!(conn.ping().unwrap_err().kind(), &ErrorKind::ConnectionError);
        driver.set_reachable(true);
    }

    #[test]
    fn with_connection_closes_after_success() {
        let driver = MemoryDriver::new();
        let value = with_connection(
            Client::builder().driver(driver.clone()),
            "mongodb://localhost",
            |conn| conn.list_database_names().map(|names| names.len()),
        )
        .unwrap();
        assert_eq!(value, 0);
        assert_eq!(driver.open_sessions(), 0);
    }

    #[test]
    fn with_connection_closes_after_failure() {
        let driver = MemoryDriver::new();
        let err = with_connection(
            Client::builder().driver(driver.clone()),
            "mongodb://localhost",
            |conn| conn.database("").map(|_| ()),
        )
        .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
        assert_eq!(driver.sessions_closed(), 1);
    }

    #[test]
    fn with_connection_closes_on_panic() {
        let driver = MemoryDriver::new();
        let clone = driver.clone();
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
            let _ = with_connection(
                Client::builder().driver(clone),
                "mongodb://localhost",
                |_conn| -> StoreResult<()> { panic!("body failed") },
            );
        }));
        assert!(outcome.is_err());
        assert_eq!(driver.open_sessions(), 0);
        assert_eq!(driver.sessions_closed(), 1);
    }

    #[test]
    fn with_connection_reports_close_error() {
        let driver = MemoryDriver::new();
        let err = with_connection(
            Client::builder().driver(driver.clone()),
            "mongodb://localhost",
            |_conn| {
                driver.set_reachable(false);
                Ok(())
            },
        )
        .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ConnectionError);
        assert_eq!(driver.sessions_closed(), 1);
    }
}
