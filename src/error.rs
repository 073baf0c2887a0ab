//! Error types for building and dispatching descriptor requests.
//!
//! Errors fall into two groups. Declaration defects (bad metadata, values the
//! encoder cannot represent) are programming errors: they surface before any
//! network I/O and propagate to the caller. Runtime failures (transport
//! errors, non-2xx statuses, unparseable bodies) are absorbed by the client,
//! reported through its hooks and converted into an empty result.

use http::{HeaderMap, StatusCode};

/// The error type for descriptor requests.
///
/// # Examples
///
/// ```
/// use restmap::Error;
///
/// let err = Error::ConfigurationError("no route declared".to_string());
/// assert!(err.is_programming_error());
/// assert_eq!(err.status(), None);
/// ```
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The descriptor's declared metadata is invalid, or an instance is
    /// missing a value its route requires.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// A field holds a value that cannot be written into a URL.
    ///
    /// Only scalars and ordered sequences of scalars are encodable.
    #[error("Unsupported value for field {field}: {value}")]
    UnsupportedValue {
        /// The declared field name
        field: String,
        /// The offending value rendered as JSON
        value: String,
    },

    /// A field value or request body could not be serialized to JSON.
    #[error("Failed to serialize request: {0}")]
    SerializationFailed(String),

    /// The assembled URL did not parse.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// A network-level error occurred (connection refused, DNS failure, etc.).
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-2xx status code.
    #[error("HTTP error {status}: {raw_response}")]
    HttpError {
        /// The HTTP status code
        status: StatusCode,
        /// The reason phrase for the status, empty if unknown
        reason: String,
        /// The raw response body
        raw_response: String,
        /// The response headers
        headers: HeaderMap,
    },

    /// A 2xx body did not deserialize into the expected response type.
    #[error("Failed to deserialize response (status {status}): {serde_error}")]
    DeserializationFailed {
        /// The raw response body that failed to deserialize
        raw_response: String,
        /// The serde error message
        serde_error: String,
        /// The HTTP status code
        status: StatusCode,
    },
}

impl Error {
    /// Returns `true` for defects in descriptor declaration or values.
    ///
    /// These errors are raised before the request is sent and are returned
    /// to the caller. Every other variant is absorbed by
    /// [`Client::invoke`](crate::Client::invoke).
    pub fn is_programming_error(&self) -> bool {
        match self {
            Error::ConfigurationError(_) => true,
            Error::UnsupportedValue { .. } => true,
            Error::SerializationFailed(_) => true,
            Error::InvalidUrl(_) => true,
            Error::Network(_) => false,
            Error::HttpError { .. } => false,
            Error::DeserializationFailed { .. } => false,
        }
    }

    /// Returns the HTTP status code if this error has one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Error::HttpError { status, .. } => Some(*status),
            Error::DeserializationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Returns the raw response body if this error has one.
    pub fn raw_response(&self) -> Option<&str> {
        match self {
            Error::HttpError { raw_response, .. } => Some(raw_response),
            Error::DeserializationFailed { raw_response, .. } => Some(raw_response),
            _ => None,
        }
    }
}

/// A specialized `Result` type for descriptor requests.
pub type Result<T> = std::result::Result<T, Error>;
