//! Metadata filter predicate attached to a vector query.
//!
//! A predicate maps a metadata field to exactly one comparison clause. The
//! same predicate is rendered as a Pinecone-style JSON document for logging
//! and translated to SQL by the LanceDB index.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOp {
    Eq,
    Ne,
    In,
    Gt,
}

impl FilterOp {
    pub fn as_operator(self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::In => "$in",
            Self::Gt => "$gt",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Text(String),
    Integer(i64),
    Number(f64),
    TextList(Vec<String>),
}

impl FilterValue {
    fn to_json(&self) -> Value {
        match self {
            Self::Text(s) => json!(s),
            Self::Integer(i) => json!(i),
            Self::Number(n) => json!(n),
            Self::TextList(items) => json!(items),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self { Self::Text(s.to_string()) }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self { Self::Text(s) }
}

impl From<i64> for FilterValue {
    fn from(i: i64) -> Self { Self::Integer(i) }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self { Self::Number(n) }
}

impl From<Vec<String>> for FilterValue {
    fn from(items: Vec<String>) -> Self { Self::TextList(items) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    pub op: FilterOp,
    pub value: FilterValue,
}

impl Clause {
    pub fn eq(value: impl Into<FilterValue>) -> Self {
        Self { op: FilterOp::Eq, value: value.into() }
    }

    pub fn ne(value: impl Into<FilterValue>) -> Self {
        Self { op: FilterOp::Ne, value: value.into() }
    }

    pub fn is_in(values: Vec<String>) -> Self {
        Self { op: FilterOp::In, value: FilterValue::TextList(values) }
    }

    pub fn gt(value: impl Into<FilterValue>) -> Self {
        Self { op: FilterOp::Gt, value: value.into() }
    }
}

/// Field → clause mapping. Ordered by field name so rendering is stable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterPredicate {
    clauses: BTreeMap<String, Clause>,
}

impl FilterPredicate {
    pub fn new() -> Self { Self::default() }

    pub fn is_empty(&self) -> bool { self.clauses.is_empty() }

    pub fn len(&self) -> usize { self.clauses.len() }

    pub fn get(&self, field: &str) -> Option<&Clause> { self.clauses.get(field) }

    /// Set the clause for `field`. Clauses on other fields are untouched;
    /// the previous clause on the same field is returned.
    pub fn insert(&mut self, field: impl Into<String>, clause: Clause) -> Option<Clause> {
        self.clauses.insert(field.into(), clause)
    }

    pub fn with(mut self, field: impl Into<String>, clause: Clause) -> Self {
        self.insert(field, clause);
        self
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Clause)> {
        self.clauses.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// `{"rsstype": {"$eq": "blog"}, "score": {"$gt": 0.5}}`
    pub fn to_json(&self) -> Value {
        let mut doc = Map::new();
        for (field, clause) in &self.clauses {
            let mut cmp = Map::new();
            cmp.insert(clause.op.as_operator().to_string(), clause.value.to_json());
            doc.insert(field.clone(), Value::Object(cmp));
        }
        Value::Object(doc)
    }
}

impl fmt::Display for FilterPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_pinecone_style_document() {
        let filter = FilterPredicate::new()
            .with("rsstype", Clause::eq("blog"))
            .with("score", Clause::gt(0.5))
            .with(
                "site_type",
                Clause::is_in(vec!["blog".into(), "individual / personal blog".into()]),
            );
        assert_eq!(
            filter.to_json(),
            json!({
                "rsstype": {"$eq": "blog"},
                "score": {"$gt": 0.5},
                "site_type": {"$in": ["blog", "individual / personal blog"]},
            })
        );
    }

    #[test]
    fn insert_only_replaces_the_same_field() {
        let mut filter = FilterPredicate::new().with("lang", Clause::eq("en"));
        let previous = filter.insert("owner_type", Clause::ne("individual"));
        assert!(previous.is_none());
        let previous = filter.insert("lang", Clause::eq("de"));
        assert_eq!(previous, Some(Clause::eq("en")));
        assert_eq!(filter.len(), 2);
        assert_eq!(filter.get("owner_type"), Some(&Clause::ne("individual")));
    }

    #[test]
    fn empty_predicate_renders_as_empty_object() {
        assert_eq!(FilterPredicate::new().to_string(), "{}");
    }
}
