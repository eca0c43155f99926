//! Async data provider for a REST/OData-flavored backend.
//!
//! # Overview
//! Translates the generic data-access operations a UI layer speaks (list,
//! get one, get many, get many by reference, create, update, update many,
//! delete, delete many) into HTTP requests, and maps the backend's JSON back
//! into records whose primary key is exposed as `id`.
//!
//! # Design
//! - `ODataClient` is stateless and does no I/O: `build_*` produces an
//!   `HttpRequest`, `parse_*` consumes an `HttpResponse`.
//! - `DataProvider` drives the round-trips through any `HttpClient`;
//!   `UreqTransport` is the default.
//! - Records are schemaless `serde_json` maps. The backend's `Id` field is
//!   copied to `id` at every response boundary by the `identifier` module.
//! - List queries use flat `_sort`/`_order`/`_start`/`_end` parameters;
//!   batched lookups use the OData `$filter=field in (...)` dialect.

pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod http;
pub mod identifier;
pub mod provider;
pub mod query;
pub mod transport;
pub mod types;

pub use client::ODataClient;
pub use config::ProviderConfig;
pub use error::ApiError;
pub use filter::{compile_expression, compile_filter};
pub use http::{HttpClient, HttpMethod, HttpRequest, HttpResponse};
pub use identifier::{normalized, NormalizeId};
pub use provider::DataProvider;
pub use query::{assemble_list_query, flatten_object, stringify};
pub use transport::UreqTransport;
pub use types::{
    CreateParams, DeleteManyParams, DeleteManyResult, DeleteParams, GetListParams, GetManyParams,
    GetManyReferenceParams, GetOneParams, ListResult, ManyResult, Pagination, Record, RecordId, RecordResult, Sort,
    SortOrder, UpdateManyParams, UpdateManyResult, UpdateParams,
};
