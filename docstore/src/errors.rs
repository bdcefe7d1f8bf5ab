use backtrace::Backtrace;
use parking_lot::Mutex;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::result::Result;
use std::sync::Arc;

use crate::collection::DocumentId;

/// Error kinds for docstore operations.
///
/// Absence of a match is never an error: reads return `None`, an empty
/// [Cursor](crate::collection::Cursor) or zero counts instead.
///
/// # Examples
///
/// ```rust,ignore
/// use docstore::errors::{StoreError, ErrorKind, StoreResult};
///
/// fn example() -> StoreResult<()> {
///     Err(StoreError::new("Collection name cannot be empty", ErrorKind::ValidationError))
/// }
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// The channel to the store cannot be established or was lost
    ConnectionError,
    /// Malformed document, filter, update specification, name or address
    ValidationError,
    /// The store rejected a single-document write
    WriteError,
    /// An ordered bulk insert stopped partway
    PartialWriteError {
        /// Identifiers of the documents that were inserted before the failure
        inserted_ids: Vec<DocumentId>,
        /// Position in the input of the document that failed
        failed_index: usize,
    },
    /// The call did not complete before its deadline
    TimeoutError,
    /// Error encoding or decoding JSON text
    EncodingError,
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::ConnectionError => write!(f, "Connection error"),
            ErrorKind::ValidationError => write!(f, "Validation error"),
            ErrorKind::WriteError => write!(f, "Write error"),
            ErrorKind::PartialWriteError {
                inserted_ids,
                failed_index,
            } => write!(
                f,
                "Partial write error ({} inserted, failed at index {})",
                inserted_ids.len(),
                failed_index
            ),
            ErrorKind::TimeoutError => write!(f, "Timeout error"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// The façade operation and namespace an error was raised for.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct OperationContext {
    operation: String,
    namespace: String,
}

impl OperationContext {
    pub fn operation(&self) -> &str {
        &self.operation
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }
}

/// Custom docstore error type.
///
/// `StoreError` carries a message, an [ErrorKind], an optional cause and,
/// once it leaves a collection call, the [OperationContext] it was raised in.
/// A backtrace is captured at creation and resolved lazily when the error is
/// printed with `{:?}`.
///
/// # Examples
///
/// ```rust,ignore
/// use docstore::errors::{StoreError, ErrorKind};
///
/// let cause = StoreError::new("Duplicate key on _id", ErrorKind::WriteError);
/// let err = StoreError::new_with_cause("Insert failed", ErrorKind::WriteError, cause)
///     .with_context("insert_one", "usersdb.users");
/// ```
#[derive(Clone)]
pub struct StoreError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<StoreError>>,
    context: Option<OperationContext>,
    backtrace: Arc<Mutex<Backtrace>>,
}

impl StoreError {
    /// Creates a new `StoreError` with the specified message and error kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        StoreError {
            message: message.to_string(),
            error_kind,
            cause: None,
            context: None,
            backtrace: Arc::new(Mutex::new(Backtrace::new_unresolved())),
        }
    }

    /// Creates a new `StoreError` chained to the error that caused it.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: StoreError) -> Self {
        StoreError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            context: None,
            backtrace: Arc::new(Mutex::new(Backtrace::new_unresolved())),
        }
    }

    /// Attaches the operation name and target namespace.
    ///
    /// The first context attached wins, so an error keeps the innermost
    /// operation that raised it.
    pub fn with_context(mut self, operation: &str, namespace: &str) -> Self {
        if self.context.is_none() {
            self.context = Some(OperationContext {
                operation: operation.to_string(),
                namespace: namespace.to_string(),
            });
        }
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&StoreError> {
        self.cause.as_deref()
    }

    pub fn context(&self) -> Option<&OperationContext> {
        self.context.as_ref()
    }

    /// Name of the façade operation that failed, if known.
    pub fn operation(&self) -> Option<&str> {
        self.context.as_ref().map(|ctx| ctx.operation())
    }

    /// `database.collection` the failed operation targeted, if known.
    pub fn namespace(&self) -> Option<&str> {
        self.context.as_ref().map(|ctx| ctx.namespace())
    }

    /// Identifiers inserted before a bulk insert failed.
    ///
    /// `None` unless this is a [ErrorKind::PartialWriteError].
    pub fn inserted_ids(&self) -> Option<&[DocumentId]> {
        match &self.error_kind {
            ErrorKind::PartialWriteError { inserted_ids, .. } => Some(inserted_ids),
            _ => None,
        }
    }

    /// Number of documents inserted before a bulk insert failed.
    pub fn inserted_count(&self) -> Option<usize> {
        self.inserted_ids().map(|ids| ids.len())
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.context {
            Some(ctx) => write!(f, "{} on {}: {}", ctx.operation, ctx.namespace, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl Debug for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        // print error message with stack trace followed by cause
        match &self.cause {
            Some(cause) => write!(f, "{} [{}]\nCaused by: {:?}", self, self.error_kind, cause),
            None => {
                let mut backtrace = self.backtrace.lock();
                backtrace.resolve();
                write!(f, "{} [{}]\n{:?}", self, self.error_kind, *backtrace)
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for docstore operations.
pub type StoreResult<T> = Result<T, StoreError>;

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::new(&format!("JSON error: {}", err), ErrorKind::EncodingError)
    }
}

impl From<std::fmt::Error> for StoreError {
    fn from(err: std::fmt::Error) -> Self {
        StoreError::new(
            &format!("Formatting error: {}", err),
            ErrorKind::InternalError,
        )
    }
}
