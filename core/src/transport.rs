//! Default transport: blocking `ureq` calls on tokio's blocking pool.
//!
//! # Design
//! ureq's status-as-error behaviour is disabled so 4xx/5xx responses come
//! back as `HttpResponse` data and `ODataClient` decides what they mean.
//! URLs are validated and re-serialized through `url::Url` first, which also
//! escapes anything a hand-built `HttpRequest` left unencoded.
//!
//! Must be called from within a tokio runtime.

use std::time::Duration;

use async_trait::async_trait;
use tracing::trace;
use ureq::Agent;
use url::Url;

use crate::error::ApiError;
use crate::http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};

#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        Self::with_timeout(None)
    }

    /// `timeout` bounds each whole request, connect to last body byte.
    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .build()
            .new_agent();
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for UreqTransport {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, ApiError> {
        let agent = self.agent.clone();
        tokio::task::spawn_blocking(move || execute(&agent, request))
            .await
            .map_err(|e| ApiError::Transport(e.to_string()))?
    }
}

/// Encode `url` into a form the HTTP stack accepts.
pub fn encode_url(url: &str) -> Result<String, ApiError> {
    Url::parse(url)
        .map(String::from)
        .map_err(|e| ApiError::InvalidUrl(format!("{url}: {e}")))
}

fn execute(agent: &Agent, request: HttpRequest) -> Result<HttpResponse, ApiError> {
    let url = encode_url(&request.url)?;
    let headers = &request.headers;

    let result = match request.method {
        HttpMethod::Get => with_headers(agent.get(&url), headers).call(),
        HttpMethod::Delete => with_headers(agent.delete(&url), headers).call(),
        HttpMethod::Post => {
            let builder = with_headers(agent.post(&url), headers);
            match request.body.as_deref() {
                Some(body) => builder.send(body.as_bytes()),
                None => builder.send_empty(),
            }
        }
        HttpMethod::Put => {
            let builder = with_headers(agent.put(&url), headers);
            match request.body.as_deref() {
                Some(body) => builder.send(body.as_bytes()),
                None => builder.send_empty(),
            }
        }
    };
    let mut response = result.map_err(|e| ApiError::Transport(e.to_string()))?;

    let status = response.status().as_u16();
    let headers = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|value| (name.as_str().to_string(), value.to_string()))
        })
        .collect();
    let body = response
        .body_mut()
        .read_to_string()
        .map_err(|e| ApiError::Transport(e.to_string()))?;
    trace!(status, bytes = body.len(), "response received");

    Ok(HttpResponse { status, headers, body })
}

fn with_headers<B>(mut builder: ureq::RequestBuilder<B>, headers: &[(String, String)]) -> ureq::RequestBuilder<B> {
    for (name, value) in headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    builder
}
