//! In-memory backend speaking the OData-flavored wire shapes the provider
//! targets: list endpoints wrap records in `{"value": [...]}`, primary keys
//! live in `Id`, batched lookups use `$filter=<field> in (...) or ...`, list
//! windows use `_sort`/`_order`/`_start`/`_end`, and PUT answers with no body.

use std::{
    cmp::Ordering,
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;

pub type Record = Map<String, Value>;

pub const ID_FIELD: &str = "Id";

/// Collections keyed by resource name, records keyed by `Id`.
#[derive(Debug, Default)]
pub struct Store {
    collections: HashMap<String, BTreeMap<i64, Record>>,
    next_id: i64,
}

impl Store {
    /// Insert `record` under a fresh `Id` and return the stored copy.
    pub fn insert(&mut self, resource: &str, mut record: Record) -> Record {
        self.next_id += 1;
        record.insert(ID_FIELD.to_string(), Value::from(self.next_id));
        self.collections
            .entry(resource.to_string())
            .or_default()
            .insert(self.next_id, record.clone());
        record
    }
}

pub type Db = Arc<RwLock<Store>>;

pub fn app() -> Router {
    app_with(Db::default())
}

pub fn app_with(db: Db) -> Router {
    Router::new()
        .route("/{resource}", get(list_records).post(create_record))
        .route(
            "/{resource}/{id}",
            get(get_record).put(update_record).delete(delete_record),
        )
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// One `field in (...)` clause of a `$filter` expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clause {
    pub field: String,
    pub values: Vec<String>,
}

impl Clause {
    fn matches(&self, record: &Record) -> bool {
        record
            .get(&self.field)
            .map(text)
            .is_some_and(|actual| self.values.contains(&actual))
    }
}

/// Parse `A in (1, 'x') or B in (2)` into clauses. Quoted literals lose their
/// quotes; `''` inside quotes is an escaped quote.
pub fn parse_filter(expr: &str) -> Result<Vec<Clause>, String> {
    let mut clauses = Vec::new();
    let mut rest = expr.trim();
    while !rest.is_empty() {
        let (field, after) = rest
            .split_once(" in (")
            .ok_or_else(|| format!("expected `<field> in (` at `{rest}`"))?;
        let (values, after) = parse_values(after)?;
        clauses.push(Clause {
            field: field.trim().to_string(),
            values,
        });
        rest = after.trim_start();
        if !rest.is_empty() {
            rest = rest
                .strip_prefix("or ")
                .ok_or_else(|| format!("expected `or` at `{rest}`"))?
                .trim_start();
        }
    }
    Ok(clauses)
}

/// Parse the inside of `( ... )`, returning the literals and the input after
/// the closing parenthesis.
fn parse_values(input: &str) -> Result<(Vec<String>, &str), String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut pending = false;
    let mut in_quotes = false;
    let mut chars = input.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        if in_quotes {
            if c != '\'' {
                current.push(c);
            } else if matches!(chars.peek(), Some((_, '\''))) {
                chars.next();
                current.push('\'');
            } else {
                in_quotes = false;
            }
            continue;
        }
        match c {
            '\'' => {
                in_quotes = true;
                pending = true;
            }
            ',' => {
                values.push(std::mem::take(&mut current));
                pending = false;
            }
            ')' => {
                if pending || !values.is_empty() {
                    values.push(current);
                }
                return Ok((values, &input[i + 1..]));
            }
            c if c.is_whitespace() => {}
            c => {
                current.push(c);
                pending = true;
            }
        }
    }
    Err("unterminated value list".to_string())
}

/// Parsed list-request parameters.
#[derive(Debug, Default)]
struct ListQuery {
    clauses: Vec<Clause>,
    equals: Vec<(String, String)>,
    sort: Option<String>,
    descending: bool,
    start: Option<usize>,
    end: Option<usize>,
}

impl ListQuery {
    fn parse(params: Vec<(String, String)>) -> Result<Self, String> {
        let mut query = ListQuery::default();
        for (key, value) in params {
            match key.as_str() {
                "$filter" => query.clauses.extend(parse_filter(&value)?),
                "_sort" => query.sort = Some(value),
                "_order" => query.descending = value.eq_ignore_ascii_case("DESC"),
                "_start" => query.start = Some(parse_index(&key, &value)?),
                "_end" => query.end = Some(parse_index(&key, &value)?),
                _ => query.equals.push((key, value)),
            }
        }
        Ok(query)
    }

    fn keeps(&self, record: &Record) -> bool {
        let any_clause = self.clauses.is_empty() || self.clauses.iter().any(|c| c.matches(record));
        let all_equal = self
            .equals
            .iter()
            .all(|(field, expected)| record.get(field).map(text).as_ref() == Some(expected));
        any_clause && all_equal
    }
}

fn parse_index(key: &str, value: &str) -> Result<usize, String> {
    value.parse().map_err(|e| format!("{key}={value}: {e}"))
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn compare_field(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            let x = x.as_f64().unwrap_or(f64::NAN);
            let y = y.as_f64().unwrap_or(f64::NAN);
            x.total_cmp(&y)
        }
        _ => a.map(text).cmp(&b.map(text)),
    }
}

async fn list_records(
    State(db): State<Db>,
    Path(resource): Path<String>,
    Query(params): Query<Vec<(String, String)>>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let query = ListQuery::parse(params).map_err(|e| (StatusCode::BAD_REQUEST, e))?;
    let store = db.read().await;
    let mut records: Vec<Record> = store
        .collections
        .get(&resource)
        .map(|collection| collection.values().filter(|r| query.keeps(r)).cloned().collect())
        .unwrap_or_default();

    if let Some(field) = &query.sort {
        records.sort_by(|a, b| compare_field(a.get(field), b.get(field)));
        if query.descending {
            records.reverse();
        }
    }
    let end = query.end.unwrap_or(records.len()).min(records.len());
    let start = query.start.unwrap_or(0).min(end);
    debug!(%resource, matched = records.len(), start, end, "list");

    Ok(Json(json!({ "value": &records[start..end] })))
}

async fn create_record(
    State(db): State<Db>,
    Path(resource): Path<String>,
    Json(input): Json<Record>,
) -> (StatusCode, Json<Record>) {
    let record = db.write().await.insert(&resource, input);
    debug!(%resource, id = %record[ID_FIELD], "created");
    (StatusCode::CREATED, Json(record))
}

async fn get_record(
    State(db): State<Db>,
    Path((resource, id)): Path<(String, i64)>,
) -> Result<Json<Record>, StatusCode> {
    let store = db.read().await;
    store
        .collections
        .get(&resource)
        .and_then(|collection| collection.get(&id))
        .cloned()
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

/// Merges the body into the stored record. A body carrying `id` is rejected.
async fn update_record(
    State(db): State<Db>,
    Path((resource, id)): Path<(String, i64)>,
    Json(mut input): Json<Record>,
) -> Result<StatusCode, (StatusCode, String)> {
    if input.contains_key("id") {
        return Err((
            StatusCode::BAD_REQUEST,
            "primary key is not allowed in the body".to_string(),
        ));
    }
    input.shift_remove(ID_FIELD);

    let mut store = db.write().await;
    let record = store
        .collections
        .get_mut(&resource)
        .and_then(|collection| collection.get_mut(&id))
        .ok_or((StatusCode::NOT_FOUND, String::new()))?;
    record.extend(input);
    debug!(%resource, id, "updated");
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_record(
    State(db): State<Db>,
    Path((resource, id)): Path<(String, i64)>,
) -> Result<StatusCode, StatusCode> {
    let mut store = db.write().await;
    store
        .collections
        .get_mut(&resource)
        .and_then(|collection| collection.remove(&id))
        .map(|_| StatusCode::NO_CONTENT)
        .ok_or(StatusCode::NOT_FOUND)
}
