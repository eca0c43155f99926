//! Stateless HTTP request builder and response parser for the backend.
//!
//! # Design
//! `ODataClient` holds only a `base_url` and carries no mutable state between
//! calls. Each operation is split into a `build_*` method that produces an
//! `HttpRequest` and a `parse_*` method that consumes an `HttpResponse`.
//! Every `parse_*` that returns records runs them through the identifier
//! normalizer before handing them back, so no caller ever sees a raw `Id`-only
//! record.

use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::error::ApiError;
use crate::filter::{compile_expression, FILTER_PREFIX};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};
use crate::identifier::{NormalizeId, BACKEND_ID_FIELD, ID_FIELD};
use crate::query::{assemble_list_query, encode_path_segment, encode_query_value, stringify};
use crate::types::{GetListParams, Record, RecordId};

const JSON: &str = "application/json";

/// The list envelope: matching records under `value`.
#[derive(Deserialize)]
struct Envelope {
    value: Vec<Record>,
}

#[derive(Debug, Clone)]
pub struct ODataClient {
    base_url: String,
}

impl ODataClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `GET resource?<filters>&_sort=..&_order=..&_start=..&_end=..`
    pub fn build_get_list(&self, resource: &str, params: &GetListParams) -> HttpRequest {
        let query = stringify(&assemble_list_query(params));
        self.get(format!("{}/{resource}?{query}", self.base_url))
    }

    pub fn build_get_one(&self, resource: &str, id: &RecordId) -> HttpRequest {
        self.get(self.record_url(resource, id))
    }

    /// `GET resource?$filter=Id in (ids...)`
    pub fn build_get_many(&self, resource: &str, ids: &[RecordId]) -> HttpRequest {
        let mut filter = Record::new();
        filter.insert(
            BACKEND_ID_FIELD.to_string(),
            Value::Array(ids.iter().map(RecordId::to_value).collect()),
        );
        self.build_filtered(resource, &filter)
    }

    /// `GET resource?$filter=target in (id)`
    pub fn build_get_many_reference(&self, resource: &str, target: &str, id: &RecordId) -> HttpRequest {
        let mut filter = Record::new();
        filter.insert(target.to_string(), id.to_value());
        self.build_filtered(resource, &filter)
    }

    pub fn build_create(&self, resource: &str, data: &Record) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Post, format!("{}/{resource}", self.base_url), data)
    }

    /// `PUT resource/id`. The backend rejects a primary key in the body, so
    /// `id` is skipped while serializing; `data` itself is not copied.
    pub fn build_update(&self, resource: &str, id: &RecordId, data: &Record) -> Result<HttpRequest, ApiError> {
        self.with_body(HttpMethod::Put, self.record_url(resource, id), &WithoutId(data))
    }

    pub fn build_delete(&self, resource: &str, id: &RecordId) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Delete,
            url: self.record_url(resource, id),
            headers: accept_json(),
            body: None,
        }
    }

    /// Parse a `{value: [...]}` envelope into normalized records.
    pub fn parse_list(&self, response: HttpResponse) -> Result<Vec<Record>, ApiError> {
        let json = success_json(&response)?;
        let Envelope { mut value } = serde_json::from_value(json)
            .map_err(|e| ApiError::DeserializationError(format!("list envelope: {e}")))?;
        value.normalize_id();
        Ok(value)
    }

    /// Parse a bare record body into a normalized record.
    pub fn parse_record(&self, response: HttpResponse) -> Result<Record, ApiError> {
        let json = success_json(&response)?;
        let mut record: Record = serde_json::from_value(json)
            .map_err(|e| ApiError::DeserializationError(format!("record: {e}")))?;
        record.normalize_id();
        Ok(record)
    }

    /// The backend's native `Id` from a response body, `Null` when the body is
    /// empty or carries none.
    pub fn parse_identifier(&self, response: HttpResponse) -> Result<Value, ApiError> {
        let json = success_json(&response)?;
        Ok(json.get(BACKEND_ID_FIELD).cloned().unwrap_or(Value::Null))
    }

    /// Check the status and body of a response whose payload is not used.
    pub fn parse_empty(&self, response: HttpResponse) -> Result<(), ApiError> {
        success_json(&response).map(drop)
    }

    /// The id is one encoded path segment, whatever characters it holds.
    fn record_url(&self, resource: &str, id: &RecordId) -> String {
        format!("{}/{resource}/{}", self.base_url, encode_path_segment(&id.to_string()))
    }

    /// The compiled expression is form-encoded so quoted literals survive
    /// `&`, `+` and `#`.
    fn build_filtered(&self, resource: &str, filter: &Record) -> HttpRequest {
        let expr = encode_query_value(&compile_expression(filter));
        self.get(format!("{}/{resource}?{FILTER_PREFIX}{expr}", self.base_url))
    }

    fn get(&self, url: String) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: accept_json(),
            body: None,
        }
    }

    fn with_body<T: Serialize>(&self, method: HttpMethod, url: String, data: &T) -> Result<HttpRequest, ApiError> {
        let body = serde_json::to_string(data).map_err(|e| ApiError::SerializationError(e.to_string()))?;
        let mut headers = accept_json();
        headers.push(("content-type".to_string(), JSON.to_string()));
        Ok(HttpRequest {
            method,
            url,
            headers,
            body: Some(body),
        })
    }
}

/// Serializes a record minus its caller-side `id` field.
struct WithoutId<'a>(&'a Record);

impl Serialize for WithoutId<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.0.iter().filter(|(key, _)| key.as_str() != ID_FIELD))
    }
}

fn accept_json() -> Vec<(String, String)> {
    vec![("accept".to_string(), JSON.to_string())]
}

/// Map non-2xx status codes to the appropriate `ApiError` variant, then parse
/// the body.
fn success_json(response: &HttpResponse) -> Result<Value, ApiError> {
    if response.status == 404 {
        return Err(ApiError::NotFound);
    }
    if !response.is_success() {
        return Err(ApiError::HttpError {
            status: response.status,
            body: response.body.clone(),
        });
    }
    response.json()
}
