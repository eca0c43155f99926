//! Flat query-parameter handling for list requests.
//!
//! List queries do not use the OData filter dialect: the caller's filter is
//! flattened to dotted keys and sent as plain parameters alongside
//! `_sort`, `_order`, `_start` and `_end`.

use serde_json::Value;
use url::form_urlencoded;

use crate::types::{GetListParams, Record};

pub const SORT_PARAM: &str = "_sort";
pub const ORDER_PARAM: &str = "_order";
pub const START_PARAM: &str = "_start";
pub const END_PARAM: &str = "_end";

/// Collapse nested objects into `parent.child` keys. Arrays and scalars are
/// kept as values; empty nested objects contribute nothing.
pub fn flatten_object(object: &Record) -> Record {
    let mut flat = Record::new();
    flatten_into(&mut flat, None, object);
    flat
}

fn flatten_into(flat: &mut Record, prefix: Option<&str>, object: &Record) {
    for (key, value) in object {
        let path = match prefix {
            Some(prefix) => format!("{prefix}.{key}"),
            None => key.clone(),
        };
        match value {
            Value::Object(nested) => flatten_into(flat, Some(path.as_str()), nested),
            other => {
                flat.insert(path, other.clone());
            }
        }
    }
}

/// Serialize a flat mapping to a form-urlencoded query string, in insertion
/// order. Arrays repeat their key; `null` renders as a bare key.
pub fn stringify(params: &Record) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        match value {
            Value::Null => {
                serializer.append_key_only(key);
            }
            Value::Array(items) => {
                for item in items {
                    serializer.append_pair(key, &scalar_text(item));
                }
            }
            other => {
                serializer.append_pair(key, &scalar_text(other));
            }
        }
    }
    serializer.finish()
}

/// Form-urlencode one query value. Every reserved character is escaped and
/// spaces become `+`.
pub fn encode_query_value(value: &str) -> String {
    form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// Percent-encode one path segment, so `/`, `?` and `#` stay inside it.
pub fn encode_path_segment(segment: &str) -> String {
    // byte_serialize escapes a literal `+` as %2B, so any `+` left is a space
    encode_query_value(segment).replace('+', "%20")
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Build the parameter mapping for a paginated, sorted list request.
///
/// Filter entries come first. A filter key that collides with one of the
/// reserved parameters keeps its position but takes the reserved value.
pub fn assemble_list_query(params: &GetListParams) -> Record {
    let GetListParams {
        pagination,
        sort,
        filter,
    } = params;
    let mut query = flatten_object(filter);
    query.insert(SORT_PARAM.to_string(), Value::from(sort.field.clone()));
    query.insert(ORDER_PARAM.to_string(), Value::from(sort.order.as_str()));
    query.insert(
        START_PARAM.to_string(),
        Value::from(pagination.page.saturating_sub(1).saturating_mul(pagination.per_page)),
    );
    query.insert(
        END_PARAM.to_string(),
        Value::from(pagination.page.saturating_mul(pagination.per_page)),
    );
    query
}
