use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

use blognerd_core::types::Scope;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Text,
    Integer,
    Float,
}

pub const ID: &str = "id";
pub const VECTOR: &str = "vector";
pub const DISTANCE: &str = "_distance";

const PAGE_COLUMNS: &[(&str, ColumnType)] = &[
    ("title", ColumnType::Text),
    ("subtitle", ColumnType::Text),
    ("base_url", ColumnType::Text),
    ("dt_published", ColumnType::Text),
    ("unix_time", ColumnType::Integer),
    ("rsstype", ColumnType::Text),
    ("site_type", ColumnType::Text),
    ("owner_type", ColumnType::Text),
    ("lang", ColumnType::Text),
    ("score", ColumnType::Float),
    ("length", ColumnType::Float),
];

const FEED_COLUMNS: &[(&str, ColumnType)] = &[
    ("owner_name", ColumnType::Text),
    ("baseurl", ColumnType::Text),
    ("short_summary", ColumnType::Text),
    ("rsstype", ColumnType::Text),
    ("site_type", ColumnType::Text),
    ("owner_type", ColumnType::Text),
    ("lang", ColumnType::Text),
];

/// Metadata columns stored for a scope, between `id` and `vector`.
pub fn metadata_columns(scope: Scope) -> &'static [(&'static str, ColumnType)] {
    match scope {
        Scope::Pages => PAGE_COLUMNS,
        Scope::Feeds => FEED_COLUMNS,
    }
}

pub fn build_arrow_schema(scope: Scope, dim: usize) -> Arc<Schema> {
    let mut fields = vec![Field::new(ID, DataType::Utf8, false)];
    fields.extend(metadata_columns(scope).iter().map(|(name, ty)| {
        let dt = match ty {
            ColumnType::Text => DataType::Utf8,
            ColumnType::Integer => DataType::Int64,
            ColumnType::Float => DataType::Float64,
        };
        Field::new(*name, dt, true)
    }));
    fields.push(Field::new(
        VECTOR,
        DataType::FixedSizeList(Arc::new(Field::new("item", DataType::Float32, true)), dim as i32),
        true,
    ));
    Arc::new(Schema::new(fields))
}
