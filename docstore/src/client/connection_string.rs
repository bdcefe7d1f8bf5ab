use crate::common::DEFAULT_PORT;
use crate::driver::validate_name;
use crate::errors::{ErrorKind, StoreError, StoreResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Display;
use std::str::FromStr;

static CONNECTION_STRING: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| {
    Regex::new(
        r"^(?P<scheme>[A-Za-z][A-Za-z0-9+.\-]*)://(?P<host>[^/:?#@\s]+)(?::(?P<port>[0-9]+))?(?:/(?P<database>[^/?#\s]*))?(?:\?(?P<options>[^#\s]*))?$",
    )
});

/// A parsed store address.
///
/// Format: `scheme://host[:port][/database][?options]`. The port defaults to
/// 27017. The optional path segment names the default database. Options are
/// kept as `key=value` pairs but not interpreted.
///
/// ```rust,ignore
/// use docstore::client::ConnectionString;
///
/// let address = ConnectionString::parse("mongodb://127.0.0.1/usersdb")?;
/// assert_eq!(address.port(), 27017);
/// assert_eq!(address.default_database(), Some("usersdb"));
/// assert_eq!(address.to_string(), "mongodb://127.0.0.1:27017/usersdb");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionString {
    scheme: String,
    host: String,
    port: u16,
    default_database: Option<String>,
    options: Vec<(String, String)>,
}

impl ConnectionString {
    /// Parses an address.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the text does not have the expected
    /// shape, the port is outside 1 to 65535, or the database name is
    /// invalid.
    pub fn parse(address: &str) -> StoreResult<ConnectionString> {
        let pattern = CONNECTION_STRING.as_ref().map_err(|err| {
            log::error!("Connection string pattern failed to compile: {}", err);
            StoreError::new(
                &format!("Connection string pattern failed to compile: {}", err),
                ErrorKind::InternalError,
            )
        })?;

        let captures = pattern.captures(address.trim()).ok_or_else(|| {
            log::error!("Invalid connection string {:?}", address);
            StoreError::new(
                &format!(
                    "Invalid connection string {:?}: expected scheme://host[:port][/database]",
                    address
                ),
                ErrorKind::ValidationError,
            )
        })?;

        let port = match captures.name("port") {
            Some(port) => match port.as_str().parse::<u16>() {
                Ok(port) if port > 0 => port,
                _ => {
                    log::error!("Invalid port {} in connection string", port.as_str());
                    return Err(StoreError::new(
                        &format!(
                            "Invalid port {} in connection string: expected 1 to 65535",
                            port.as_str()
                        ),
                        ErrorKind::ValidationError,
                    ));
                }
            },
            None => DEFAULT_PORT,
        };

        let default_database = match captures.name("database").map(|m| m.as_str()) {
            Some(name) if !name.is_empty() => {
                validate_name("Database", name)?;
                Some(name.to_string())
            }
            _ => None,
        };

        let options = captures
            .name("options")
            .map(|m| {
                m.as_str()
                    .split('&')
                    .filter(|pair| !pair.is_empty())
                    .map(|pair| match pair.split_once('=') {
                        Some((key, value)) => (key.to_string(), value.to_string()),
                        None => (pair.to_string(), String::new()),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(ConnectionString {
            scheme: captures["scheme"].to_string(),
            host: captures["host"].to_string(),
            port,
            default_database,
            options,
        })
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn default_database(&self) -> Option<&str> {
        self.default_database.as_deref()
    }

    pub fn options(&self) -> &[(String, String)] {
        &self.options
    }

    /// `host:port`, the key drivers group sessions by.
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Display for ConnectionString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}://{}:{}/", self.scheme, self.host, self.port)?;
        if let Some(database) = &self.default_database {
            write!(f, "{}", database)?;
        }
        Ok(())
    }
}

impl FromStr for ConnectionString {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConnectionString::parse(s)
    }
}
