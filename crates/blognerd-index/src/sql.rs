//! `FilterPredicate` → Lance SQL `WHERE` clause.

use anyhow::{anyhow, Result};
use arrow_schema::Schema;

use blognerd_core::{Clause, FilterOp, FilterPredicate, FilterValue};

use crate::table::quote;

/// Translate `filter` against `schema`. Empty predicates give `None`; a field
/// the table does not have is an error rather than a silent no-match.
pub fn to_where_clause(filter: &FilterPredicate, schema: &Schema) -> Result<Option<String>> {
    if filter.is_empty() {
        return Ok(None);
    }
    let mut parts = Vec::with_capacity(filter.len());
    for (field, clause) in filter.iter() {
        schema
            .field_with_name(field)
            .map_err(|_| anyhow!("unknown filter field '{}'", field))?;
        parts.push(clause_sql(field, clause));
    }
    Ok(Some(parts.join(" AND ")))
}

fn clause_sql(field: &str, clause: &Clause) -> String {
    let col = format!("`{}`", field.replace('`', "``"));
    match (clause.op, &clause.value) {
        (FilterOp::In, FilterValue::TextList(items)) if items.is_empty() => "FALSE".to_string(),
        (FilterOp::In | FilterOp::Eq, FilterValue::TextList(items)) => {
            let list: Vec<String> = items.iter().map(|s| quote(s)).collect();
            format!("{col} IN ({})", list.join(", "))
        }
        (FilterOp::In, v) | (FilterOp::Eq, v) => format!("{col} = {}", literal(v)),
        (FilterOp::Ne, v) => format!("{col} <> {}", literal(v)),
        (FilterOp::Gt, v) => format!("{col} > {}", literal(v)),
    }
}

fn literal(value: &FilterValue) -> String {
    match value {
        FilterValue::Text(s) => quote(s),
        FilterValue::Integer(i) => i.to_string(),
        FilterValue::Number(n) => n.to_string(),
        FilterValue::TextList(items) => {
            items.iter().map(|s| quote(s)).collect::<Vec<_>>().join(", ")
        }
    }
}
