//! Request and response shapes shared by every operation.
//!
//! # Design
//! Backend records have no fixed schema, so `Record` is an ordered JSON
//! object and every field access goes through map lookups. Only identifiers,
//! pagination and sorting get dedicated types.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One backend entity: field name to JSON value, in backend field order.
pub type Record = serde_json::Map<String, Value>;

/// A caller-supplied record identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl RecordId {
    pub fn to_value(&self) -> Value {
        match self {
            RecordId::Number(n) => Value::from(*n),
            RecordId::Text(s) => Value::String(s.clone()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Number(n) => write!(f, "{n}"),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Number(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId::Text(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        RecordId::Text(s)
    }
}

/// 1-indexed page window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub field: String,
    pub order: SortOrder,
}

#[derive(Debug, Clone)]
pub struct GetListParams {
    pub pagination: Pagination,
    pub sort: Sort,
    /// Flat (or nested, flattened on send) query-parameter filters.
    pub filter: Record,
}

#[derive(Debug, Clone)]
pub struct GetOneParams {
    pub id: RecordId,
}

#[derive(Debug, Clone)]
pub struct GetManyParams {
    pub ids: Vec<RecordId>,
}

#[derive(Debug, Clone)]
pub struct GetManyReferenceParams {
    /// Field on the referencing resource that holds `id`.
    pub target: String,
    pub id: RecordId,
}

#[derive(Debug, Clone)]
pub struct CreateParams {
    pub data: Record,
}

#[derive(Debug, Clone)]
pub struct UpdateParams {
    pub id: RecordId,
    pub data: Record,
}

#[derive(Debug, Clone)]
pub struct UpdateManyParams {
    pub ids: Vec<RecordId>,
    pub data: Record,
}

#[derive(Debug, Clone)]
pub struct DeleteParams {
    pub id: RecordId,
    pub previous_data: Option<Record>,
}

#[derive(Debug, Clone)]
pub struct DeleteManyParams {
    pub ids: Vec<RecordId>,
}

/// Records plus a count. `total` is the number of records in `data`, not a
/// backend-reported total.
#[derive(Debug, Clone, PartialEq)]
pub struct ListResult {
    pub data: Vec<Record>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordResult {
    pub data: Record,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ManyResult {
    pub data: Vec<Record>,
}

/// The `Id` each PUT response reported, positionally matching the input ids.
/// `Null` where a response carried no `Id`.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateManyResult {
    pub data: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteManyResult {
    pub data: Vec<RecordId>,
}
