//! Conversions between index documents, Arrow record batches and `RawMatch`.

use anyhow::{anyhow, Context, Result};
use arrow_array::types::Float32Type;
use arrow_array::{
    Array, ArrayRef, FixedSizeListArray, Float32Array, Float64Array, Int64Array, RecordBatch,
    StringArray,
};
use serde_json::{Number, Value};
use std::sync::Arc;

use blognerd_core::types::{EmbeddingVector, Metadata, RawMatch, Scope};

use crate::schema::{build_arrow_schema, metadata_columns, ColumnType, DISTANCE, ID, VECTOR};

/// One row to upsert: id, flat metadata and its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexDocument {
    pub id: String,
    pub metadata: Metadata,
    pub vector: EmbeddingVector,
}

pub fn to_record_batch(scope: Scope, dim: usize, docs: &[IndexDocument]) -> Result<RecordBatch> {
    let schema = build_arrow_schema(scope, dim);
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(schema.fields().len());
    let ids: Vec<String> = docs.iter().map(|d| d.id.clone()).collect();
    columns.push(Arc::new(StringArray::from(ids)));
    for (name, ty) in metadata_columns(scope) {
        let values = docs.iter().map(|d| d.metadata.get(*name));
        let column: ArrayRef = match ty {
            ColumnType::Text => {
                Arc::new(StringArray::from(values.map(text_value).collect::<Vec<_>>()))
            }
            ColumnType::Integer => {
                Arc::new(Int64Array::from(values.map(integer_value).collect::<Vec<_>>()))
            }
            ColumnType::Float => {
                Arc::new(Float64Array::from(values.map(float_value).collect::<Vec<_>>()))
            }
        };
        columns.push(column);
    }
    let vectors = docs.iter().map(|d| Some(d.vector.iter().copied().map(Some).collect::<Vec<_>>()));
    columns.push(Arc::new(FixedSizeListArray::from_iter_primitive::<Float32Type, _, _>(
        vectors,
        dim as i32,
    )));
    Ok(RecordBatch::try_new(schema, columns)?)
}

fn text_value(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) => Some(s.clone()),
        Value::Null => None,
        other => Some(other.to_string()),
    }
}

fn integer_value(v: Option<&Value>) -> Option<i64> {
    match v? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn float_value(v: Option<&Value>) -> Option<f64> {
    match v? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn column<'a, T: 'static>(batch: &'a RecordBatch, name: &str) -> Result<&'a T> {
    batch
        .column_by_name(name)
        .and_then(|c| c.as_any().downcast_ref::<T>())
        .ok_or_else(|| anyhow!("column '{}' missing or of unexpected type", name))
}

/// Read every row of a result batch. `_distance` (cosine) becomes
/// `score = 1 - distance`; rows without it (plain scans) score 0.
pub fn batch_to_matches(
    batch: &RecordBatch,
    scope: Scope,
    include_values: bool,
) -> Result<Vec<RawMatch>> {
    let ids = column::<StringArray>(batch, ID)?;
    let distances =
        batch.column_by_name(DISTANCE).and_then(|c| c.as_any().downcast_ref::<Float32Array>());
    let vectors =
        if include_values { Some(column::<FixedSizeListArray>(batch, VECTOR)?) } else { None };

    let mut out = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let mut metadata = Metadata::new();
        for (name, ty) in metadata_columns(scope) {
            let Some(array) = batch.column_by_name(name) else { continue };
            if array.is_null(row) {
                continue;
            }
            let value =
                cell_value(array, *ty, row).with_context(|| format!("reading column '{name}'"))?;
            if let Some(value) = value {
                metadata.insert(name.to_string(), value);
            }
        }
        let score = distances.map_or(0.0, |d| 1.0 - d.value(row));
        let mut m = RawMatch::new(ids.value(row), score, metadata);
        if let Some(list) = vectors {
            m.values = Some(vector_at(list, row)?);
        }
        out.push(m);
    }
    Ok(out)
}

fn cell_value(array: &ArrayRef, ty: ColumnType, row: usize) -> Result<Option<Value>> {
    let any = array.as_any();
    let value = match ty {
        ColumnType::Text => {
            any.downcast_ref::<StringArray>().map(|a| Value::String(a.value(row).to_string()))
        }
        ColumnType::Integer => any.downcast_ref::<Int64Array>().map(|a| Value::from(a.value(row))),
        ColumnType::Float => any
            .downcast_ref::<Float64Array>()
            .map(|a| Number::from_f64(a.value(row)).map_or(Value::Null, Value::Number)),
    };
    match value {
        Some(Value::Null) => Ok(None),
        Some(v) => Ok(Some(v)),
        None => Err(anyhow!("unexpected array type {:?}", array.data_type())),
    }
}

pub fn vector_at(list: &FixedSizeListArray, row: usize) -> Result<EmbeddingVector> {
    let values = list.value(row);
    let floats = values
        .as_any()
        .downcast_ref::<Float32Array>()
        .ok_or_else(|| anyhow!("vector column is not float32"))?;
    Ok(floats.values().to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page(id: &str, meta: Value) -> IndexDocument {
        IndexDocument {
            id: id.into(),
            metadata: meta.as_object().cloned().unwrap(),
            vector: vec![0.5, 0.5, 0.5, 0.5],
        }
    }

    #[test]
    fn metadata_round_trips_through_a_batch() {
        let docs = vec![
            page(
                "https://a.dev/1",
                json!({
                    "title": "One",
                    "unix_time": 1_700_000_000i64,
                    "score": 0.75,
                    "length": "1200",
                }),
            ),
            page("https://a.dev/2", json!({"title": "Two", "ignored": true})),
        ];
        let batch = to_record_batch(Scope::Pages, 4, &docs).unwrap();
        assert_eq!(batch.num_rows(), 2);

        let matches = batch_to_matches(&batch, Scope::Pages, true).unwrap();
        assert_eq!(matches[0].id, "https://a.dev/1");
        assert_eq!(matches[0].text("title"), Some("One"));
        assert_eq!(matches[0].number("unix_time"), Some(1_700_000_000.0));
        assert_eq!(matches[0].number("length"), Some(1200.0), "numeric strings are coerced");
        assert_eq!(matches[0].values.as_deref(), Some(&[0.5f32, 0.5, 0.5, 0.5][..]));
        assert!(matches[1].metadata.get("score").is_none(), "nulls are omitted");
        assert!(matches[1].metadata.get("ignored").is_none(), "unknown keys are not stored");
        assert_eq!(matches[1].score, 0.0);
    }

    #[test]
    fn values_are_skipped_unless_requested() {
        let docs = [page("https://feed.dev/rss", json!({"baseurl": "feed.dev"}))];
        let batch = to_record_batch(Scope::Feeds, 4, &docs).unwrap();
        let matches = batch_to_matches(&batch, Scope::Feeds, false).unwrap();
        assert!(matches[0].values.is_none());
        assert_eq!(matches[0].text("baseurl"), Some("feed.dev"));
    }
}
