//! Raw HTTP responses and the status-only response type.

use http::{HeaderMap, StatusCode};
use serde::{Deserialize, Deserializer};
use std::any::Any;
use std::time::Duration;

/// A response as received from the transport, before decoding.
///
/// This is what the response and error hooks see.
///
/// # Examples
///
/// ```
/// # use restmap::HttpResponse;
/// # use http::{HeaderMap, HeaderValue, StatusCode};
/// # use std::time::Duration;
/// let mut headers = HeaderMap::new();
/// headers.insert("content-type", HeaderValue::from_static("application/json"));
///
/// let response = HttpResponse::new(
///     StatusCode::NOT_FOUND,
///     headers,
///     "{}".to_string(),
///     Duration::from_millis(12),
/// );
///
/// assert!(!response.is_success());
/// assert_eq!(response.reason(), "Not Found");
/// assert_eq!(response.header("content-type"), Some("application/json"));
/// ```
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// The HTTP status code of the response.
    pub status: StatusCode,

    /// The response headers.
    pub headers: HeaderMap,

    /// The raw response body as a string.
    pub raw_body: String,

    /// Time from sending the request until the body was read.
    pub latency: Duration,
}

impl HttpResponse {
    pub fn new(status: StatusCode, headers: HeaderMap, raw_body: String, latency: Duration) -> Self {
        Self {
            status,
            headers,
            raw_body,
            latency,
        }
    }

    /// Returns `true` for 2xx statuses.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// The canonical reason phrase for the status, or `""` if it has none.
    pub fn reason(&self) -> &'static str {
        self.status.canonical_reason().unwrap_or("")
    }

    /// Returns a reference to a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }
}

/// Response type for calls where only the status code matters.
///
/// When a descriptor's response type is `RawStatus`, the body is never
/// parsed and the call yields the status of any 2xx response.
///
/// Also deserializes from a bare status number, e.g. `204`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawStatus(pub StatusCode);

impl RawStatus {
    /// Produces `Some(T)` if `T` is `RawStatus`, `None` for any other type.
    pub(crate) fn cast<T: 'static>(status: StatusCode) -> Option<T> {
        let boxed: Box<dyn Any> = Box::new(RawStatus(status));
        boxed.downcast::<T>().ok().map(|b| *b)
    }
}

impl<'de> Deserialize<'de> for RawStatus {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = u16::deserialize(deserializer)?;
        StatusCode::from_u16(code)
            .map(RawStatus)
            .map_err(serde::de::Error::custom)
    }
}

impl std::ops::Deref for RawStatus {
    type Target = StatusCode;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
