//! The transport seam: how built requests reach the network.

use crate::{request::HttpRequest, HttpResponse, Result};
use std::time::Instant;

/// Sends a request and returns the response, blocking until the body is read.
///
/// Implementations must be safe to share between threads with requests in
/// flight concurrently. Any non-2xx status is still `Ok`: only failures to
/// obtain a response at all are errors.
pub trait Transport: Send + Sync {
    /// Sends `request` and reads the whole response.
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse>;
}

/// A [`Transport`] backed by a blocking `reqwest` client.
///
/// The underlying client pools connections, so one instance should be
/// shared for the life of the process.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    http_client: reqwest::blocking::Client,
}

impl ReqwestTransport {
    /// Creates a transport with a default `reqwest` client.
    ///
    /// Must not be called from within an async runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS backend fails to initialize.
    pub fn new() -> Result<Self> {
        let http_client = reqwest::blocking::Client::builder().build()?;
        Ok(Self { http_client })
    }

    /// Wraps an already configured `reqwest` client.
    pub fn with_client(http_client: reqwest::blocking::Client) -> Self {
        Self { http_client }
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        let start_time = Instant::now();

        let mut builder = self
            .http_client
            .request(request.method.clone(), request.url.clone())
            .headers(request.headers.clone());

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send()?;
        let status = response.status();
        let headers = response.headers().clone();
        let raw_body = response.text()?;

        Ok(HttpResponse::new(
            status,
            headers,
            raw_body,
            start_time.elapsed(),
        ))
    }
}
