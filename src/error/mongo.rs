use std::fmt;

use serde::{Deserialize, Serialize};

/// Structured error information extracted from MongoDB errors.
///
/// Serialized as compact JSON when displayed, so it can be logged and
/// parsed by downstream tooling.
#[derive(Debug, Default, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorInfo {
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub error_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Server-provided error details, such as the duplicated key
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<bson::Document>,
}

/// Outcome of classifying a driver error.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreFailure {
    /// Transport, selection, DNS, pool or authentication failure.
    Unavailable(ErrorInfo),

    /// The server answered, but rejected the operation.
    Rejected(ErrorInfo),
}

impl ErrorInfo {
    /// Build an info record with only a type and message.
    pub fn new(error_type: &str, message: impl Into<String>) -> Self {
        Self {
            error_type: Some(error_type.to_string()),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Convert error info to compact JSON string (single line).
    pub fn to_json_compact(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

impl fmt::Display for ErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = self.to_json_compact().map_err(|_| fmt::Error)?;
        write!(f, "{json}")
    }
}

/// Classify a MongoDB driver error and extract its structured information.
///
/// Uses the driver's typed error kinds directly rather than parsing the
/// rendered message.
pub fn classify_mongodb_error(error: &mongodb::error::Error) -> StoreFailure {
    use mongodb::error::{ErrorKind, WriteFailure};

    match error.kind.as_ref() {
        ErrorKind::Io(io_error) => {
            StoreFailure::Unavailable(ErrorInfo::new("mongo.io_error", io_error.to_string()))
        }
        ErrorKind::ServerSelection { message, .. } => StoreFailure::Unavailable(
            ErrorInfo::new("mongo.server_selection_error", message.clone()),
        ),
        ErrorKind::DnsResolve { message, .. } => {
            StoreFailure::Unavailable(ErrorInfo::new("mongo.dns_error", message.clone()))
        }
        ErrorKind::ConnectionPoolCleared { message, .. } => StoreFailure::Unavailable(
            ErrorInfo::new("mongo.pool_cleared", message.clone()),
        ),
        ErrorKind::Authentication { message, .. } => StoreFailure::Unavailable(
            ErrorInfo::new("mongo.authentication_error", message.clone()),
        ),
        ErrorKind::Command(command_error) => StoreFailure::Rejected(ErrorInfo {
            error_type: Some("mongo.command_error".to_string()),
            code: Some(command_error.code),
            name: get_error_name(command_error.code),
            message: Some(command_error.message.clone()),
            details: None,
        }),
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            StoreFailure::Rejected(ErrorInfo {
                error_type: Some("mongo.write_error".to_string()),
                code: Some(write_error.code),
                name: get_error_name(write_error.code),
                message: Some(write_error.message.clone()),
                details: write_error.details.clone(),
            })
        }
        ErrorKind::Write(WriteFailure::WriteConcernError(wc_error)) => {
            StoreFailure::Rejected(ErrorInfo {
                error_type: Some("mongo.write_concern_error".to_string()),
                code: Some(wc_error.code),
                name: get_error_name(wc_error.code),
                message: Some(wc_error.message.clone()),
                details: wc_error.details.clone(),
            })
        }
        ErrorKind::InsertMany(insert_error) => {
            let mut info = ErrorInfo::new("mongo.insert_many_error", error.to_string());
            if let Some(first_error) = insert_error
                .write_errors
                .as_ref()
                .and_then(|errors| errors.first())
            {
                info.code = Some(first_error.code);
                info.name = get_error_name(first_error.code);
                info.message = Some(first_error.message.clone());
                info.details = first_error.details.clone();
            }
            StoreFailure::Rejected(info)
        }
        ErrorKind::InvalidArgument { message, .. } => {
            StoreFailure::Rejected(ErrorInfo::new("mongo.invalid_argument", message.clone()))
        }
        _ => StoreFailure::Rejected(ErrorInfo::new("mongo.error", error.to_string())),
    }
}

/// Get a human-readable error name from a MongoDB error code.
fn get_error_name(code: i32) -> Option<String> {
    let name = match code {
        11000 | 11001 => "DuplicateKey",
        13 => "Unauthorized",
        18 => "AuthenticationFailed",
        26 => "NamespaceNotFound",
        50 => "MaxTimeMSExpired",
        121 => "DocumentValidationFailure",
        _ => return None,
    };

    Some(name.to_string())
}
