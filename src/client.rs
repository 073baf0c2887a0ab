//! The descriptor client: builds requests, sends them and decodes responses.
//!
//! [`Client::invoke`] is the single entry point. Declaration defects come
//! back as `Err`. Everything that can go wrong once the request is on the
//! wire (transport failure, non-2xx status, unparseable body) is logged,
//! reported to the error hook, and turned into `Ok(None)`.

use crate::{
    metadata::{Descriptor, DescriptorMetadata, FieldValues, MetadataCache},
    naming::{NamingPolicy, SnakePascal},
    request::{build_request, HttpRequest},
    transport::{ReqwestTransport, Transport},
    Error, HttpResponse, RawStatus, Result,
};
use http::{HeaderMap, HeaderName, HeaderValue};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use url::Url;

/// Called with each request just before it is sent.
pub type RequestHook = Arc<dyn Fn(&HttpRequest) + Send + Sync>;

/// Called after a 2xx response decoded successfully.
pub type ResponseHook = Arc<dyn Fn(&HttpRequest, &HttpResponse) + Send + Sync>;

/// Called for every absorbed failure. The response is `None` when the
/// transport never produced one.
pub type ErrorHook = Arc<dyn Fn(&HttpRequest, Option<&HttpResponse>, &Error) + Send + Sync>;

/// A client that turns descriptors into HTTP calls.
///
/// Cheap to clone; clones share the transport and the metadata cache.
///
/// # Examples
///
/// ```no_run
/// use restmap::metadata::{Descriptor, DescriptorMetadata, FieldValues, MetadataBuilder, Verb};
/// use restmap::Client;
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize)]
/// struct Clue {
///     question: String,
///     answer: String,
/// }
///
/// struct GetRandom {
///     count: Option<u32>,
/// }
///
/// impl Descriptor for GetRandom {
///     type Response = Vec<Clue>;
///
///     fn declare() -> MetadataBuilder {
///         DescriptorMetadata::builder()
///             .route("/random")
///             .verb(Verb::Get)
///             .field("Count")
///     }
///
///     fn write_fields(&self, fields: &mut FieldValues) -> restmap::Result<()> {
///         fields.set("Count", &self.count)?;
///         Ok(())
///     }
/// }
///
/// # fn example() -> Result<(), restmap::Error> {
/// let client = Client::builder()
///     .base_url("https://trivia.example.com/api")?
///     .on_error(|request, _response, error| {
///         eprintln!("{} {} failed: {}", request.method, request.url, error);
///     })
///     .build()?;
///
/// if let Some(clues) = client.invoke(&GetRandom { count: Some(1) })? {
///     for clue in clues {
///         println!("{}|{}", clue.question, clue.answer);
///     }
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Box<dyn Transport>,
    base_url: Url,
    default_headers: HeaderMap,
    naming: Box<dyn NamingPolicy>,
    metadata: MetadataCache,
    on_request: Option<RequestHook>,
    on_response: Option<ResponseHook>,
    on_error: Option<ErrorHook>,
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Returns the base URL requests are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Resolves and caches the metadata for `D`.
    ///
    /// Calling this at startup for every descriptor type surfaces declaration
    /// defects before the first request.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the declaration is invalid.
    pub fn metadata<D: Descriptor>(&self) -> Result<Arc<DescriptorMetadata>> {
        self.inner.metadata.resolve::<D>()
    }

    /// Builds the request for `descriptor` without sending it.
    ///
    /// # Errors
    ///
    /// Returns a configuration, encoding or serialization error; see
    /// [`build_request`](crate::request::build_request).
    pub fn build_request<D: Descriptor>(&self, descriptor: &D) -> Result<HttpRequest> {
        let metadata = self.metadata::<D>()?;

        let mut values = FieldValues::new();
        descriptor.write_fields(&mut values)?;
        values.check_declared(&metadata)?;

        build_request(
            &self.inner.base_url,
            self.inner.naming.as_ref(),
            &metadata,
            &values,
            &self.inner.default_headers,
        )
    }

    /// Sends `descriptor` and decodes the response.
    ///
    /// Returns `Ok(Some(_))` for a 2xx response that decodes into
    /// `D::Response`, and `Ok(None)` if the request failed in transport,
    /// returned a non-2xx status, or returned a body that does not decode.
    /// Those failures are reported through the error hook.
    ///
    /// If `D::Response` is [`RawStatus`], any 2xx status is returned without
    /// reading the body.
    ///
    /// # Errors
    ///
    /// Only declaration defects are returned as errors; they are raised
    /// before anything is sent.
    pub fn invoke<D: Descriptor>(&self, descriptor: &D) -> Result<Option<D::Response>> {
        let request = self.build_request(descriptor)?;

        if let Some(hook) = &self.inner.on_request {
            hook(&request);
        }

        Ok(self.dispatch::<D::Response>(&request))
    }

    fn dispatch<T>(&self, request: &HttpRequest) -> Option<T>
    where
        T: DeserializeOwned + 'static,
    {
        tracing::debug!(
            method = %request.method,
            url = %request.url,
            "Executing HTTP request"
        );

        let response = match self.inner.transport.send(request) {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(
                    error = %e,
                    method = %request.method,
                    url = %request.url,
                    "Request failed"
                );
                self.report_error(request, None, &e);
                return None;
            }
        };

        tracing::info!(
            status = response.status.as_u16(),
            latency_ms = response.latency.as_millis(),
            "Received HTTP response"
        );

        if !response.is_success() {
            if response.status.is_client_error() {
                tracing::error!(
                    status = response.status.as_u16(),
                    response = %response.raw_body,
                    "Client error (4xx)"
                );
            } else {
                tracing::warn!(
                    status = response.status.as_u16(),
                    response = %response.raw_body,
                    "Non-success status"
                );
            }

            let error = Error::HttpError {
                status: response.status,
                reason: response.reason().to_string(),
                raw_response: response.raw_body.clone(),
                headers: response.headers.clone(),
            };
            self.report_error(request, Some(&response), &error);
            return None;
        }

        if let Some(status) = RawStatus::cast::<T>(response.status) {
            self.report_response(request, &response);
            return Some(status);
        }

        match serde_json::from_str::<T>(&response.raw_body) {
            Ok(data) => {
                self.report_response(request, &response);
                Some(data)
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    raw_response = %response.raw_body,
                    "Failed to deserialize response"
                );

                let error = Error::DeserializationFailed {
                    raw_response: response.raw_body.clone(),
                    serde_error: e.to_string(),
                    status: response.status,
                };
                self.report_error(request, Some(&response), &error);
                None
            }
        }
    }

    fn report_response(&self, request: &HttpRequest, response: &HttpResponse) {
        if let Some(hook) = &self.inner.on_response {
            hook(request, response);
        }
    }

    fn report_error(&self, request: &HttpRequest, response: Option<&HttpResponse>, error: &Error) {
        if let Some(hook) = &self.inner.on_error {
            hook(request, response, error);
        }
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// Only the base URL is required. Without an explicit transport the client
/// uses a [`ReqwestTransport`].
///
/// # Examples
///
/// ```no_run
/// use restmap::{ClientBuilder, naming::Verbatim};
///
/// # fn example() -> Result<(), restmap::Error> {
/// let client = ClientBuilder::new()
///     .base_url("https://api.example.com")?
///     .default_header("User-Agent", "trivia-bot/1.0")?
///     .naming_policy(Verbatim)
///     .on_request(|request| println!("-> {} {}", request.method, request.url))
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    base_url: Option<Url>,
    default_headers: HeaderMap,
    naming: Box<dyn NamingPolicy>,
    transport: Option<Box<dyn Transport>>,
    on_request: Option<RequestHook>,
    on_response: Option<ResponseHook>,
    on_error: Option<ErrorHook>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            base_url: None,
            default_headers: HeaderMap::new(),
            naming: Box::new(SnakePascal),
            transport: None,
            on_request: None,
            on_response: None,
            on_error: None,
        }
    }

    /// Sets the base URL that route templates are appended to.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.base_url = Some(Url::parse(url.as_ref())?);
        Ok(self)
    }

    /// Adds a header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let name = HeaderName::try_from(name.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
        let value = HeaderValue::try_from(value.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets how declared field names become query and body keys.
    pub fn naming_policy(mut self, policy: impl NamingPolicy + 'static) -> Self {
        self.naming = Box::new(policy);
        self
    }

    /// Sets the transport requests are sent through.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Sets the hook called before each request is sent.
    pub fn on_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&HttpRequest) + Send + Sync + 'static,
    {
        self.on_request = Some(Arc::new(hook));
        self
    }

    /// Sets the hook called after each successfully decoded response.
    pub fn on_response<F>(mut self, hook: F) -> Self
    where
        F: Fn(&HttpRequest, &HttpResponse) + Send + Sync + 'static,
    {
        self.on_response = Some(Arc::new(hook));
        self
    }

    /// Sets the hook called for transport failures, non-2xx statuses and
    /// undecodable bodies.
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(&HttpRequest, Option<&HttpResponse>, &Error) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(hook));
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if no base URL was provided or the default transport
    /// cannot be created.
    ///
    /// # Panics
    ///
    /// Without an explicit [`transport`](Self::transport), this creates a
    /// [`ReqwestTransport`], which panics if called from within an async
    /// runtime. Build the client outside the runtime, or on
    /// `tokio::task::spawn_blocking`.
    pub fn build(self) -> Result<Client> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::ConfigurationError("Base URL is required".to_string()))?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Box::new(ReqwestTransport::new().map_err(|e| {
                Error::ConfigurationError(format!("Failed to build HTTP client: {}", e))
            })?),
        };

        Ok(Client {
            inner: Arc::new(ClientInner {
                transport,
                base_url,
                default_headers: self.default_headers,
                naming: self.naming,
                metadata: MetadataCache::new(),
                on_request: self.on_request,
                on_response: self.on_response,
                on_error: self.on_error,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
