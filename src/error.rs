use serde::Serialize;
use std::fmt;

/// Scheduler error types for better error handling and host feedback.
///
/// Notification permission problems are deliberately not an error: a denied
/// delivery is an expected outcome and is reported through the dispatcher's
/// `Delivery` outcome instead.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "message")]
pub enum Error {
    /// The persistence medium is unavailable or a write failed
    Storage(String),
    /// A reminder or recurrence pattern failed validation
    Validation(String),
    /// A persisted record could not be deserialized
    Corrupt(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Storage(msg) => write!(f, "Storage error: {}", msg),
            Error::Validation(msg) => write!(f, "Validation error: {}", msg),
            Error::Corrupt(msg) => write!(f, "Corrupt store entry: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

// Conversion to String for host command return types
impl From<Error> for String {
    fn from(error: Error) -> Self {
        error.to_string()
    }
}

// Convenience constructors
impl Error {
    pub fn storage<S: Into<String>>(msg: S) -> Self {
        Error::Storage(msg.into())
    }

    pub fn validation<S: Into<String>>(msg: S) -> Self {
        Error::Validation(msg.into())
    }

    pub fn corrupt<S: Into<String>>(msg: S) -> Self {
        Error::Corrupt(msg.into())
    }
}

/// Result type alias for scheduler operations
pub type Result<T> = std::result::Result<T, Error>;
