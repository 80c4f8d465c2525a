//! Document references and sort specifications
//!
//! A query result item carries the scalar values of its sort-key fields
//! alongside the raw payload, so that cross-partition merging can order
//! items without inspecting payloads. `SortValue` defines a total order
//! across the supported scalar types: null sorts before booleans, which
//! sort before numbers, which sort before text.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Scalar value of a single sort-key field
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SortValue {
    Null,
    Bool(bool),
    Number(f64),
    Text(String),
}

impl SortValue {
    /// Rank of the value's type in the cross-type total order
    fn type_rank(&self) -> u8 {
        match self {
            SortValue::Null => 0,
            SortValue::Bool(_) => 1,
            SortValue::Number(_) => 2,
            SortValue::Text(_) => 3,
        }
    }
}

impl PartialEq for SortValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SortValue {}

impl PartialOrd for SortValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SortValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (SortValue::Null, SortValue::Null) => Ordering::Equal,
            (SortValue::Bool(a), SortValue::Bool(b)) => a.cmp(b),
            // total_cmp keeps NaN comparisons consistent with Eq
            (SortValue::Number(a), SortValue::Number(b)) => a.total_cmp(b),
            (SortValue::Text(a), SortValue::Text(b)) => a.cmp(b),
            _ => self.type_rank().cmp(&other.type_rank()),
        }
    }
}

/// Sort direction for one field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    Ascending,
    Descending,
}

/// One field of a multi-key sort specification
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SortField {
    /// Index into a document's `sort_values`
    pub value_index: usize,

    /// Direction for this field
    pub order: SortOrder,
}

impl SortField {
    pub fn ascending(value_index: usize) -> Self {
        Self {
            value_index,
            order: SortOrder::Ascending,
        }
    }

    pub fn descending(value_index: usize) -> Self {
        Self {
            value_index,
            order: SortOrder::Descending,
        }
    }
}

/// Multi-key sort specification
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SortSpec {
    pub fields: Vec<SortField>,
}

impl SortSpec {
    pub fn new(fields: Vec<SortField>) -> Self {
        Self { fields }
    }

    /// Compare two documents field-by-field per this specification.
    ///
    /// The first field with a non-equal comparison decides, negated for
    /// descending fields. Documents missing a sort value at some index
    /// compare as null there. Equal under every field returns
    /// `Ordering::Equal`; callers needing a total order must break the
    /// tie themselves.
    pub fn compare(&self, a: &DocumentRef, b: &DocumentRef) -> Ordering {
        for field in &self.fields {
            let left = a.sort_values.get(field.value_index).unwrap_or(&SortValue::Null);
            let right = b.sort_values.get(field.value_index).unwrap_or(&SortValue::Null);
            let ordering = match field.order {
                SortOrder::Ascending => left.cmp(right),
                SortOrder::Descending => left.cmp(right).reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// A query result item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRef {
    /// Document identifier
    pub id: String,

    /// Scalar values of the sort-key fields, in spec order
    pub sort_values: Vec<SortValue>,

    /// Raw document payload
    pub payload: serde_json::Value,
}

impl DocumentRef {
    pub fn new(id: impl Into<String>, sort_values: Vec<SortValue>) -> Self {
        Self {
            id: id.into(),
            sort_values,
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }
}
