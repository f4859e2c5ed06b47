use std::{fmt, io};

use crate::error::mongo::{ErrorInfo, StoreFailure, classify_mongodb_error};

/// Crate-wide `Result` type using [`CatalogError`] as the error.
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Top-level error type for catalog operations.
///
/// Every failure is surfaced to the caller unmodified; nothing in this crate
/// retries or swallows an error.
#[derive(Debug)]
pub enum CatalogError {
    /// The referenced product does not exist.
    NotFound(String),

    /// A caller-supplied parameter violates a stated constraint.
    InvalidArgument(String),

    /// The underlying store could not be reached.
    StoreUnavailable(ErrorInfo),

    /// The store was reachable but the query failed or returned
    /// something unusable.
    Query(QueryError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// Generic error with a free-form message.
    Generic(String),
}

/// Query-specific errors.
#[derive(Debug)]
pub enum QueryError {
    /// The server rejected the command or write.
    Rejected(ErrorInfo),

    /// A returned document does not match the expected record shape.
    MalformedDocument { record: &'static str, reason: String },
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file not found.
    FileNotFound(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Invalid field value.
    InvalidValue { field: String, value: String },
}

impl CatalogError {
    /// Shorthand for a decode failure on the named record type.
    pub fn malformed(record: &'static str, reason: impl fmt::Display) -> Self {
        CatalogError::Query(QueryError::MalformedDocument {
            record,
            reason: reason.to_string(),
        })
    }

    /// Whether this error came from a transport/connectivity failure.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, CatalogError::StoreUnavailable(_))
    }
}

/* ========================= Display & Error impls ========================= */

impl fmt::Display for CatalogError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogError::NotFound(id) => write!(f, "Product not found: {id}"),
            CatalogError::InvalidArgument(msg) => write!(f, "Invalid argument: {msg}"),
            CatalogError::StoreUnavailable(info) => write!(f, "Store unavailable: {info}"),
            CatalogError::Query(e) => write!(f, "Query error: {e}"),
            CatalogError::Config(e) => write!(f, "Configuration error: {e}"),
            CatalogError::Io(e) => write!(f, "I/O error: {e}"),
            CatalogError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryError::Rejected(info) => write!(f, "{info}"),
            QueryError::MalformedDocument { record, reason } => {
                write!(f, "Malformed {record} document: {reason}")
            }
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {path}"),
            ConfigError::InvalidFormat(msg) => write!(f, "Invalid config format: {msg}"),
            ConfigError::InvalidValue { field, value } => {
                write!(f, "Invalid value '{value}' for field '{field}'")
            }
        }
    }
}

impl std::error::Error for CatalogError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CatalogError::Io(e) => Some(e),
            _ => None,
        }
    }
}
impl std::error::Error for QueryError {}
impl std::error::Error for ConfigError {}

/* ========================= Conversions to CatalogError ========================= */

impl From<io::Error> for CatalogError {
    fn from(err: io::Error) -> Self {
        CatalogError::Io(err)
    }
}

impl From<mongodb::error::Error> for CatalogError {
    fn from(err: mongodb::error::Error) -> Self {
        match classify_mongodb_error(&err) {
            StoreFailure::Unavailable(info) => CatalogError::StoreUnavailable(info),
            StoreFailure::Rejected(info) => CatalogError::Query(QueryError::Rejected(info)),
        }
    }
}

impl From<QueryError> for CatalogError {
    fn from(err: QueryError) -> Self {
        CatalogError::Query(err)
    }
}

impl From<ConfigError> for CatalogError {
    fn from(err: ConfigError) -> Self {
        CatalogError::Config(err)
    }
}

impl From<String> for CatalogError {
    fn from(msg: String) -> Self {
        CatalogError::Generic(msg)
    }
}

impl From<&str> for CatalogError {
    fn from(msg: &str) -> Self {
        CatalogError::Generic(msg.to_owned())
    }
}
