use serde_json::Value as JsonValue;

use super::model::{Key, LabelSet};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Record – what a one-argument predicate sees
// ---------------------------------------------------------------------------

/// A single instance as handed to a [`Filter::Record`] predicate.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    pub key: &'a Key,
    pub data: &'a str,
    pub label: &'a LabelSet,
}

// ---------------------------------------------------------------------------
// Filter – the accepted indexer shapes
// ---------------------------------------------------------------------------

/// Selection criterion for [`Dataset::filter`](crate::digestibles::Dataset::filter).
pub enum Filter<'f> {
    /// Keep instances whose label set equals this set exactly.
    Label(LabelSet),
    /// One flag per instance, in dataset order.
    Mask(Vec<bool>),
    /// Predicate over the whole record.
    Record(Box<dyn Fn(&Record<'_>) -> bool + 'f>),
    /// Predicate over `(data, label)`.
    Pair(Box<dyn Fn(&str, &LabelSet) -> bool + 'f>),
}

impl<'f> Filter<'f> {
    /// Single label; matches instances labelled with exactly `{label}`.
    pub fn label(label: impl Into<String>) -> Self {
        let mut set = LabelSet::new();
        set.insert(label.into());
        Filter::Label(set)
    }

    pub fn labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Filter::Label(labels.into_iter().map(Into::into).collect())
    }

    pub fn mask(mask: Vec<bool>) -> Self {
        Filter::Mask(mask)
    }

    pub fn record<F>(predicate: F) -> Self
    where
        F: Fn(&Record<'_>) -> bool + 'f,
    {
        Filter::Record(Box::new(predicate))
    }

    pub fn pair<F>(predicate: F) -> Self
    where
        F: Fn(&str, &LabelSet) -> bool + 'f,
    {
        Filter::Pair(Box::new(predicate))
    }

    /// Interpret a dynamically-typed indexer.
    ///
    /// * string / integer → single label
    /// * array of booleans → mask
    /// * array of strings → label set
    ///
    /// Anything else is rejected.
    pub fn from_value(value: &JsonValue) -> Result<Filter<'static>> {
        match value {
            JsonValue::String(s) => Ok(Filter::label(s.clone())),
            JsonValue::Number(n) if n.is_i64() || n.is_u64() => Ok(Filter::label(n.to_string())),
            JsonValue::Array(items) => {
                if let Some(mask) = items.iter().map(JsonValue::as_bool).collect::<Option<Vec<bool>>>() {
                    Ok(Filter::Mask(mask))
                } else if let Some(labels) = items
                    .iter()
                    .map(|v| v.as_str().map(str::to_string))
                    .collect::<Option<LabelSet>>()
                {
                    Ok(Filter::Label(labels))
                } else {
                    Err(Error::InvalidFilterType(format!("mixed array {value}")))
                }
            }
            JsonValue::Null => Err(Error::InvalidFilterType("null".to_string())),
            other => Err(Error::InvalidFilterType(other.to_string())),
        }
    }
}

impl From<&str> for Filter<'static> {
    fn from(label: &str) -> Self {
        Filter::label(label)
    }
}

impl From<String> for Filter<'static> {
    fn from(label: String) -> Self {
        Filter::label(label)
    }
}

impl From<LabelSet> for Filter<'static> {
    fn from(labels: LabelSet) -> Self {
        Filter::Label(labels)
    }
}

impl From<Vec<bool>> for Filter<'static> {
    fn from(mask: Vec<bool>) -> Self {
        Filter::Mask(mask)
    }
}

/// Return positions of records that pass `filter`, in order.
///
/// `len` is the number of records; a mask of any other length is an error.
pub fn filtered_positions<'a, I>(filter: &Filter<'_>, records: I, len: usize) -> Result<Vec<usize>>
where
    I: Iterator<Item = Record<'a>>,
{
    if let Filter::Mask(mask) = filter {
        if mask.len() != len {
            return Err(Error::LengthMismatch {
                expected: len,
                actual: mask.len(),
            });
        }
        return Ok(mask
            .iter()
            .enumerate()
            .filter(|(_, keep)| **keep)
            .map(|(i, _)| i)
            .collect());
    }

    Ok(records
        .enumerate()
        .filter(|(_, record)| match filter {
            Filter::Label(wanted) => record.label == wanted,
            Filter::Record(predicate) => predicate(record),
            Filter::Pair(predicate) => predicate(record.data, record.label),
            Filter::Mask(_) => unreachable!("masks are handled above"),
        })
        .map(|(i, _)| i)
        .collect())
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::data::model::label_set;

    #[test]
    fn from_value_shapes() {
        assert!(matches!(Filter::from_value(&json!("pos")).unwrap(), Filter::Label(l) if l == label_set(["pos"])));
        assert!(matches!(Filter::from_value(&json!(3)).unwrap(), Filter::Label(l) if l == label_set(["3"])));
        assert!(matches!(Filter::from_value(&json!([true, false])).unwrap(), Filter::Mask(m) if m == vec![true, false]));
        assert!(matches!(Filter::from_value(&json!(["a", "b"])).unwrap(), Filter::Label(l) if l.len() == 2));
    }

    #[test]
    fn from_value_rejects_other_shapes() {
        for value in [json!(null), json!({"a": 1}), json!(1.5), json!([true, "a"]), json!(true)] {
            assert!(
                matches!(Filter::from_value(&value), Err(Error::InvalidFilterType(_))),
                "{value} should be rejected"
            );
        }
    }

    #[test]
    fn mask_length_checked() {
        let key = Key::Int(0);
        let labels = label_set(["a"]);
        let records = std::iter::once(Record {
            key: &key,
            data: "x",
            label: &labels,
        });
        let err = filtered_positions(&Filter::mask(vec![true, true]), records, 1).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { expected: 1, actual: 2 }));
    }
}
