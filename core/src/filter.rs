//! Compiles a field → value(s) mapping into an OData `$filter` fragment.
//!
//! Each field becomes `field in (v1, v2, ...)` and fields are joined with
//! `or`, never `and`. Values are ordered deterministically so the same filter
//! always yields the same URL.

use std::cmp::Ordering;

use serde_json::Value;

use crate::types::Record;

pub const FILTER_PREFIX: &str = "$filter=";

/// Compile `filter` into `$filter=<expr>`. An empty mapping yields
/// `$filter=`.
pub fn compile_filter(filter: &Record) -> String {
    format!("{FILTER_PREFIX}{}", compile_expression(filter))
}

/// The `<expr>` part of [`compile_filter`], unencoded.
pub fn compile_expression(filter: &Record) -> String {
    let clauses: Vec<String> = filter
        .iter()
        .map(|(field, values)| compile_clause(field, values))
        .collect();
    clauses.join(" or ")
}

fn compile_clause(field: &str, values: &Value) -> String {
    let mut literals: Vec<Literal> = match values {
        Value::Array(items) => items.iter().map(Literal::from_value).collect(),
        scalar => vec![Literal::from_value(scalar)],
    };
    literals.sort_by(Literal::compare);
    let rendered: Vec<String> = literals.iter().map(Literal::render).collect();
    format!("{field} in ({})", rendered.join(", "))
}

/// A filter value classified by how it renders.
///
/// Declaration order is sort order: quoted text, then numbers, then other
/// bare words. That matches byte order of the rendered tokens (`'` sorts
/// before digits and `-`, which sort before letters) while comparing numbers
/// by magnitude.
#[derive(Debug, Clone)]
enum Literal {
    Quoted(String),
    Numeric { text: String, value: f64 },
    Bare(String),
}

impl Literal {
    fn from_value(value: &Value) -> Self {
        match value {
            Value::Number(n) => Literal::Numeric {
                text: n.to_string(),
                value: n.as_f64().unwrap_or(f64::NAN),
            },
            Value::String(s) => match parse_number(s) {
                Some(value) => Literal::Numeric {
                    text: s.trim().to_string(),
                    value,
                },
                None => Literal::Quoted(s.clone()),
            },
            Value::Bool(b) => Literal::Bare(b.to_string()),
            Value::Null => Literal::Bare("null".to_string()),
            nested => Literal::Quoted(nested.to_string()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Literal::Quoted(_) => 0,
            Literal::Numeric { .. } => 1,
            Literal::Bare(_) => 2,
        }
    }

    fn compare(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Literal::Quoted(a), Literal::Quoted(b)) | (Literal::Bare(a), Literal::Bare(b)) => a.cmp(b),
            (Literal::Numeric { value: a, text: ta }, Literal::Numeric { value: b, text: tb }) => {
                a.total_cmp(b).then_with(|| ta.cmp(tb))
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }

    fn render(&self) -> String {
        match self {
            Literal::Quoted(s) => format!("'{}'", s.replace('\'', "''")),
            Literal::Numeric { text, .. } => text.clone(),
            Literal::Bare(s) => s.clone(),
        }
    }
}

fn parse_number(s: &str) -> Option<f64> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}
