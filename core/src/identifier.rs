//! Reconciles the backend's `Id` primary key with the `id` field callers
//! expect.
//!
//! Normalization mutates in place: after `normalize_id`, `id` holds the value
//! of `Id`, or is removed when the record has no `Id`. Every other field is
//! left untouched, `Id` included.

use serde_json::Value;

use crate::types::Record;

/// Backend primary-key field.
pub const BACKEND_ID_FIELD: &str = "Id";
/// Field name callers read identifiers from.
pub const ID_FIELD: &str = "id";

pub trait NormalizeId {
    fn normalize_id(&mut self);
}

impl NormalizeId for Record {
    fn normalize_id(&mut self) {
        match self.get(BACKEND_ID_FIELD).cloned() {
            Some(id) => {
                self.insert(ID_FIELD.to_string(), id);
            }
            None => {
                self.shift_remove(ID_FIELD);
            }
        }
    }
}

impl NormalizeId for [Record] {
    fn normalize_id(&mut self) {
        self.iter_mut().for_each(NormalizeId::normalize_id);
    }
}

impl NormalizeId for Vec<Record> {
    fn normalize_id(&mut self) {
        self.as_mut_slice().normalize_id();
    }
}

/// Objects are normalized, arrays recursively; other values are left as is.
impl NormalizeId for Value {
    fn normalize_id(&mut self) {
        match self {
            Value::Object(record) => record.normalize_id(),
            Value::Array(items) => items.iter_mut().for_each(NormalizeId::normalize_id),
            _ => {}
        }
    }
}

/// Owned convenience wrapper around [`NormalizeId::normalize_id`].
pub fn normalized<T: NormalizeId>(mut value: T) -> T {
    value.normalize_id();
    value
}
