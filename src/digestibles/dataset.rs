use std::collections::BTreeSet;
use std::ops::{Range, RangeFrom, RangeFull, RangeInclusive, RangeTo};
use std::sync::Arc;

use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value as JsonValue};

use super::{Digestible, Meta};
use crate::data::filter::filtered_positions;
use crate::data::{Filter, Instance, InstanceProvider, Key, LabelProvider, LabelSet, Record};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Selection – what `Dataset::select` accepts
// ---------------------------------------------------------------------------

/// Index argument of [`Dataset::select`]: one or more keys/positions, or a
/// positional range.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    Items(Vec<Key>),
    Range { start: Option<usize>, end: Option<usize> },
}

impl Selection {
    /// Resolve to a list of keys/positions against a dataset of `len` rows.
    /// Ranges are clamped like slices.
    fn resolve(self, len: usize) -> Vec<Key> {
        match self {
            Selection::Items(items) => items,
            Selection::Range { start, end } => {
                let end = end.unwrap_or(len).min(len);
                let start = start.unwrap_or(0).min(end);
                (start..end).map(Key::from).collect()
            }
        }
    }
}

impl From<i64> for Selection {
    fn from(i: i64) -> Self {
        Selection::Items(vec![Key::Int(i)])
    }
}

impl From<i32> for Selection {
    fn from(i: i32) -> Self {
        Selection::Items(vec![Key::from(i)])
    }
}

impl From<usize> for Selection {
    fn from(i: usize) -> Self {
        Selection::Items(vec![Key::from(i)])
    }
}

impl From<&str> for Selection {
    fn from(key: &str) -> Self {
        Selection::Items(vec![Key::from(key)])
    }
}

impl From<Key> for Selection {
    fn from(key: Key) -> Self {
        Selection::Items(vec![key])
    }
}

impl From<Vec<Key>> for Selection {
    fn from(keys: Vec<Key>) -> Self {
        Selection::Items(keys)
    }
}

impl From<Range<usize>> for Selection {
    fn from(r: Range<usize>) -> Self {
        Selection::Range { start: Some(r.start), end: Some(r.end) }
    }
}

impl From<RangeInclusive<usize>> for Selection {
    fn from(r: RangeInclusive<usize>) -> Self {
        Selection::Range {
            start: Some(*r.start()),
            end: Some(r.end().saturating_add(1)),
        }
    }
}

impl From<RangeTo<usize>> for Selection {
    fn from(r: RangeTo<usize>) -> Self {
        Selection::Range { start: None, end: Some(r.end) }
    }
}

impl From<RangeFrom<usize>> for Selection {
    fn from(r: RangeFrom<usize>) -> Self {
        Selection::Range { start: Some(r.start), end: None }
    }
}

impl From<RangeFull> for Selection {
    fn from(_: RangeFull) -> Self {
        Selection::Range { start: None, end: None }
    }
}

// ---------------------------------------------------------------------------
// Dataset
// ---------------------------------------------------------------------------

/// Ordered view over a split: instances paired one-to-one with label sets.
///
/// The instance store is shared, never copied; every operation returns a new
/// view and leaves the receiver untouched.
#[derive(Debug, Clone)]
pub struct Dataset {
    meta: Meta,
    instances: Arc<InstanceProvider>,
    keys: Vec<Key>,
    labels: Vec<LabelSet>,
}

impl Dataset {
    /// View over every instance of `instances`, labelled from `labels`.
    pub fn new(instances: Arc<InstanceProvider>, labels: &LabelProvider) -> Self {
        let keys: Vec<Key> = instances.keys().cloned().collect();
        let labels = keys.iter().map(|key| labels.labels_of(key)).collect();
        Self {
            meta: Meta::new("dataset"),
            instances,
            keys,
            labels,
        }
    }

    /// Dataset over plain texts; keys are `0..n-1`.
    pub fn from_texts<I, S>(texts: I, labels: Vec<LabelSet>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let provider = Arc::new(InstanceProvider::from_texts(texts));
        let keys: Vec<Key> = provider.keys().cloned().collect();
        Self::from_parts(provider, keys, labels)
    }

    /// View over `keys` of `instances`, with one label set per key.
    pub fn from_parts(instances: Arc<InstanceProvider>, keys: Vec<Key>, labels: Vec<LabelSet>) -> Result<Self> {
        if keys.len() != labels.len() {
            return Err(Error::LengthMismatch {
                expected: keys.len(),
                actual: labels.len(),
            });
        }
        let mut seen = BTreeSet::new();
        for key in &keys {
            if !instances.contains(key) {
                return Err(Error::UnknownKey(key.to_string()));
            }
            if !seen.insert(key) {
                return Err(Error::InvalidArgument(format!("duplicate key {key}")));
            }
        }
        Ok(Self {
            meta: Meta::new("dataset"),
            instances,
            keys,
            labels,
        })
    }

    pub fn with_meta(mut self, meta: Meta) -> Self {
        self.meta = meta;
        self
    }

    /// Same instance store and meta, different rows.
    fn derive(&self, keys: Vec<Key>, labels: Vec<LabelSet>) -> Self {
        Self {
            meta: self.meta.clone(),
            instances: Arc::clone(&self.instances),
            keys,
            labels,
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn labels(&self) -> &[LabelSet] {
        &self.labels
    }

    /// Distinct label values in this view.
    pub fn labelset(&self) -> BTreeSet<String> {
        self.labels.iter().flatten().cloned().collect()
    }

    /// Shared instance store backing this view.
    pub fn provider(&self) -> &Arc<InstanceProvider> {
        &self.instances
    }

    pub fn instances(&self) -> Vec<&Instance> {
        self.keys.iter().filter_map(|key| self.instances.get(key)).collect()
    }

    pub fn data(&self) -> Vec<&str> {
        self.instances().into_iter().map(|instance| instance.data.as_str()).collect()
    }

    /// `(data, label)` pairs in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &LabelSet)> + '_ {
        self.keys
            .iter()
            .zip(&self.labels)
            .filter_map(|(key, label)| self.instances.get(key).map(|i| (i.data.as_str(), label)))
    }

    fn records(&self) -> impl Iterator<Item = Record<'_>> + '_ {
        self.keys
            .iter()
            .zip(&self.labels)
            .filter_map(|(key, label)| {
                self.instances.get(key).map(|instance| Record {
                    key,
                    data: &instance.data,
                    label,
                })
            })
    }

    // -- Indexing --

    /// Select by key when every requested item is a key of this view,
    /// otherwise by position.
    pub fn select(&self, index: impl Into<Selection>) -> Result<Self> {
        let items = index.into().resolve(self.len());
        if items.iter().all(|item| self.keys.contains(item)) {
            self.get_by_key(&items)
        } else {
            let positions = items
                .iter()
                .map(|item| match item {
                    Key::Int(i) => Ok(*i),
                    Key::Str(s) => Err(Error::UnknownKey(format!("{s:?}"))),
                })
                .collect::<Result<Vec<i64>>>()?;
            self.get_by_index(&positions)
        }
    }

    /// Rows at `positions`, in the given order.
    pub fn get_by_index(&self, positions: &[i64]) -> Result<Self> {
        let len = self.len();
        let positions = positions
            .iter()
            .map(|&p| match usize::try_from(p) {
                Ok(i) if i < len => Ok(i),
                _ => Err(Error::IndexOutOfRange { index: p, len }),
            })
            .collect::<Result<Vec<usize>>>()?;
        self.check_distinct(&positions)?;
        Ok(self.take(&positions))
    }

    /// Rows with the given keys, in the given order.
    pub fn get_by_key(&self, keys: &[Key]) -> Result<Self> {
        let positions = keys
            .iter()
            .map(|key| {
                self.keys
                    .iter()
                    .position(|k| k == key)
                    .ok_or_else(|| Error::UnknownKey(key.to_string()))
            })
            .collect::<Result<Vec<usize>>>()?;
        self.check_distinct(&positions)?;
        Ok(self.take(&positions))
    }

    /// A row may be selected once; repeats would duplicate its key.
    fn check_distinct(&self, positions: &[usize]) -> Result<()> {
        let mut seen = BTreeSet::new();
        for &i in positions {
            if !seen.insert(i) {
                return Err(Error::InvalidArgument(format!("duplicate key {}", self.keys[i])));
            }
        }
        Ok(())
    }

    /// Positions are known to be in range and distinct.
    fn take(&self, positions: &[usize]) -> Self {
        let keys = positions.iter().map(|&i| self.keys[i].clone()).collect();
        let labels = positions.iter().map(|&i| self.labels[i].clone()).collect();
        self.derive(keys, labels)
    }

    // -- Truncation and sampling --

    fn check_count(n: i64) -> Result<usize> {
        usize::try_from(n).map_err(|_| Error::InvalidArgument(format!("n={n} should be >= 0")))
    }

    /// First `n` rows.
    pub fn head(&self, n: i64) -> Result<Self> {
        let n = Self::check_count(n)?;
        if n >= self.len() {
            return Ok(self.clone());
        }
        Ok(self.take(&(0..n).collect::<Vec<_>>()))
    }

    /// Last `n` rows. `tail(0)` is empty.
    pub fn tail(&self, n: i64) -> Result<Self> {
        let n = Self::check_count(n)?;
        if n == 0 {
            return self.head(0);
        }
        if n >= self.len() {
            return Ok(self.clone());
        }
        Ok(self.take(&(self.len() - n..self.len()).collect::<Vec<_>>()))
    }

    /// `n` distinct rows drawn uniformly at random. Asking for at least
    /// `len()` rows returns the view unchanged.
    pub fn sample(&self, n: i64, seed: Option<u64>) -> Result<Self> {
        let n = Self::check_count(n)?;
        if n >= self.len() {
            return Ok(self.clone());
        }
        let mut rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let positions = rand::seq::index::sample(&mut rng, self.len(), n).into_vec();
        debug!("sampled {n} of {} rows", self.len());
        Ok(self.take(&positions))
    }

    // -- Filtering --

    /// Rows passing `filter`, in order.
    pub fn filter<'f>(&self, filter: impl Into<Filter<'f>>) -> Result<Self> {
        let filter = filter.into();
        let positions = filtered_positions(&filter, self.records(), self.len())?;
        Ok(self.take(&positions))
    }

    /// Filter with a dynamically-typed indexer, see [`Filter::from_value`].
    pub fn filter_value(&self, indexer: &JsonValue) -> Result<Self> {
        self.filter(Filter::from_value(indexer)?)
    }
}

impl Digestible for Dataset {
    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn content(&self) -> JsonValue {
        json!({
            "instances": self.instances(),
            "labels": self.labels,
        })
    }
}
