//! Digestibles: the structured results every façade operation returns.
//!
//! Each result exposes its `content()` as a JSON value and a `to_config()`
//! that pairs the content with [`Meta`] describing how it was produced.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

mod dataset;
mod explanation;
mod results;
mod sensitivity;

pub use dataset::{Dataset, Selection};
pub use explanation::{Explanation, FeatureList, FeatureScore, Prototypes};
pub use results::{Descriptives, LengthStats, Misclassification, Performance, WronglyClassified};
pub use sensitivity::{LabelMetrics, MeanScore, SuccessTest, TestCase};

// ---------------------------------------------------------------------------
// Meta – type tag and call arguments
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meta {
    #[serde(rename = "type")]
    pub kind: String,
    pub subtype: Option<String>,
    /// Arguments of the call that produced the result.
    pub callargs: BTreeMap<String, JsonValue>,
}

impl Meta {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            subtype: None,
            callargs: BTreeMap::new(),
        }
    }

    pub fn with_subtype(mut self, subtype: impl Into<String>) -> Self {
        self.subtype = Some(subtype.into());
        self
    }

    /// Record a call argument. Values that do not serialize are stored as null.
    pub fn with_callarg<T: Serialize>(mut self, name: &str, value: T) -> Self {
        let value = serde_json::to_value(value).unwrap_or(JsonValue::Null);
        self.callargs.insert(name.to_string(), value);
        self
    }
}

// ---------------------------------------------------------------------------
// Digestible
// ---------------------------------------------------------------------------

pub trait Digestible {
    fn meta(&self) -> &Meta;

    /// The result as a plain JSON mapping.
    fn content(&self) -> JsonValue;

    fn to_config(&self) -> JsonValue {
        json!({
            "meta": self.meta(),
            "content": self.content(),
        })
    }
}

// ---------------------------------------------------------------------------
// MultipleReturn – one result per split, label, ...
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MultipleReturn<T> {
    items: Vec<T>,
}

impl<T> MultipleReturn<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn into_inner(self) -> Vec<T> {
        self.items
    }
}

impl<T: Digestible> MultipleReturn<T> {
    /// A single result is returned as its own config, several as a list.
    pub fn to_config(&self) -> JsonValue {
        match self.items.as_slice() {
            [single] => single.to_config(),
            items => JsonValue::Array(items.iter().map(Digestible::to_config).collect()),
        }
    }
}

impl<T> std::ops::Index<usize> for MultipleReturn<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.items[index]
    }
}

impl<T> IntoIterator for MultipleReturn<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<T> FromIterator<T> for MultipleReturn<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
