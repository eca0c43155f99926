//! HTTP transport types and the transport capability.
//!
//! # Design
//! Requests and responses are plain data. `ODataClient` builds `HttpRequest`
//! values and parses `HttpResponse` values without touching the network;
//! whatever implements `HttpClient` performs the round-trip. The provider is
//! handed an `HttpClient` at construction, so tests can swap in an in-memory
//! fake and hosts can bring their own stack.
//!
//! Transports hand back every response as data, including 4xx/5xx. Status
//! interpretation happens in `ODataClient::parse_*`.

use async_trait::async_trait;

use crate::error::ApiError;

/// HTTP method for a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// An HTTP request described as plain data.
///
/// `url` is absolute. `ODataClient` encodes ids and filter values itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

/// An HTTP response described as plain data.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parse the body as JSON. An empty body is `null`.
    pub fn json(&self) -> Result<serde_json::Value, ApiError> {
        if self.body.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        serde_json::from_str(&self.body).map_err(|e| ApiError::DeserializationError(e.to_string()))
    }
}

/// The injected transport: executes one request and returns the raw response.
///
/// Implementations must only fail when no response was obtained; a non-2xx
/// status is returned as an `HttpResponse`.
#[async_trait]
pub trait HttpClient: Send + Sync {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, ApiError>;
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for std::sync::Arc<T> {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        (**self).request(request).await
    }
}
