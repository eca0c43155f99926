//! Error types for the data provider.
//!
//! # Design
//! `NotFound` gets a dedicated variant because callers frequently distinguish
//! "the record does not exist" from "the backend returned an unexpected
//! status." All other non-2xx responses land in `HttpError` with the raw
//! status code and body. Nothing here is retried or translated; every failure
//! reaches the caller of the operation that triggered it.

/// Errors returned by `ODataClient` parse methods and `DataProvider`
/// operations.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The backend returned 404.
    #[error("resource not found")]
    NotFound,

    /// The backend returned a non-2xx status other than 404.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The request never produced a response (connection refused, timeout,
    /// runtime shut down).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The assembled request URL could not be parsed.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// The response body was not JSON, or lacked the expected envelope.
    #[error("deserialization failed: {0}")]
    DeserializationError(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    SerializationError(String),

    /// A required configuration value was missing or malformed.
    #[error("configuration error: {0}")]
    Config(String),
}
