use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Key – identifier of a single instance
// ---------------------------------------------------------------------------

/// Opaque instance identifier: dense integers or string ids.
///
/// Integers order before strings so that mixed key sets sort deterministically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Int(i64),
    Str(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{i}"),
            Key::Str(s) => write!(f, "{s:?}"),
        }
    }
}

impl From<i64> for Key {
    fn from(i: i64) -> Self {
        Key::Int(i)
    }
}

impl From<i32> for Key {
    fn from(i: i32) -> Self {
        Key::Int(i as i64)
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Int(i as i64)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// Ground-truth or predicted labels of one instance. Singletons for
/// single-label data, several values for multi-label data.
pub type LabelSet = BTreeSet<String>;

/// Build a [`LabelSet`] from anything string-like.
pub fn label_set<I, S>(labels: I) -> LabelSet
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    labels.into_iter().map(Into::into).collect()
}

// ---------------------------------------------------------------------------
// Instance / InstanceProvider
// ---------------------------------------------------------------------------

/// A single text instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub key: Key,
    pub data: String,
}

impl Instance {
    pub fn new(key: impl Into<Key>, data: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            data: data.into(),
        }
    }
}

/// Insertion-ordered store of instances with a key index.
#[derive(Debug, Clone, Default)]
pub struct InstanceProvider {
    instances: Vec<Instance>,
    index: BTreeMap<Key, usize>,
}

impl InstanceProvider {
    /// Build a provider; keys must be unique.
    pub fn from_instances(instances: Vec<Instance>) -> Result<Self> {
        let mut index = BTreeMap::new();
        for (pos, instance) in instances.iter().enumerate() {
            if index.insert(instance.key.clone(), pos).is_some() {
                return Err(Error::InvalidArgument(format!(
                    "duplicate key {} in instance provider",
                    instance.key
                )));
            }
        }
        Ok(Self { instances, index })
    }

    /// Build a provider from texts without native keys; keys are `0..n-1`.
    pub fn from_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let instances: Vec<Instance> = texts
            .into_iter()
            .enumerate()
            .map(|(i, text)| Instance::new(i, text))
            .collect();
        let index = instances
            .iter()
            .enumerate()
            .map(|(pos, instance)| (instance.key.clone(), pos))
            .collect();
        Self { instances, index }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn get(&self, key: &Key) -> Option<&Instance> {
        self.index.get(key).map(|&pos| &self.instances[pos])
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.index.contains_key(key)
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &Key> + '_ {
        self.instances.iter().map(|instance| &instance.key)
    }

    pub fn key_set(&self) -> BTreeSet<Key> {
        self.index.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instance> + '_ {
        self.instances.iter()
    }
}

// ---------------------------------------------------------------------------
// LabelProvider
// ---------------------------------------------------------------------------

/// Maps instance keys to label sets.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelProvider {
    labels: BTreeMap<Key, LabelSet>,
}

impl LabelProvider {
    pub fn from_tuples<I>(tuples: I) -> Self
    where
        I: IntoIterator<Item = (Key, LabelSet)>,
    {
        Self {
            labels: tuples.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, key: &Key) -> Option<&LabelSet> {
        self.labels.get(key)
    }

    /// Labels of `key`; unlabelled instances yield an empty set.
    pub fn labels_of(&self, key: &Key) -> LabelSet {
        self.labels.get(key).cloned().unwrap_or_default()
    }

    pub fn set_labels(&mut self, key: Key, labels: LabelSet) {
        self.labels.insert(key, labels);
    }

    /// Every distinct label value.
    pub fn labelset(&self) -> BTreeSet<String> {
        self.labels.values().flatten().cloned().collect()
    }

    /// Keys of the instances carrying `label`.
    pub fn instances_by_label(&self, label: &str) -> BTreeSet<Key> {
        self.labels
            .iter()
            .filter(|(_, labels)| labels.contains(label))
            .map(|(key, _)| key.clone())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Key, &LabelSet)> + '_ {
        self.labels.iter()
    }
}

// ---------------------------------------------------------------------------
// Environment – named splits plus ground truth
// ---------------------------------------------------------------------------

/// Instances grouped into named splits, with ground-truth labels for all of them.
#[derive(Debug, Clone, Default)]
pub struct Environment {
    splits: BTreeMap<String, Arc<InstanceProvider>>,
    labels: LabelProvider,
}

impl Environment {
    pub fn new(labels: LabelProvider) -> Self {
        Self {
            splits: BTreeMap::new(),
            labels,
        }
    }

    /// Add (or replace) a split.
    pub fn with_split(mut self, name: impl Into<String>, provider: InstanceProvider) -> Self {
        self.splits.insert(name.into(), Arc::new(provider));
        self
    }

    pub fn split(&self, name: &str) -> Option<&Arc<InstanceProvider>> {
        self.splits.get(name)
    }

    pub fn contains_split(&self, name: &str) -> bool {
        self.splits.contains_key(name)
    }

    pub fn split_names(&self) -> Vec<String> {
        self.splits.keys().cloned().collect()
    }

    pub fn splits(&self) -> impl Iterator<Item = (&String, &Arc<InstanceProvider>)> + '_ {
        self.splits.iter()
    }

    pub fn labels(&self) -> &LabelProvider {
        &self.labels
    }

    /// Shuffle `instances` with a seeded generator and divide them into a
    /// `"train"` and a `"test"` split. `test_size` is the fraction of
    /// instances put in the test split.
    pub fn train_test_split(
        instances: Vec<Instance>,
        labels: LabelProvider,
        test_size: f64,
        seed: u64,
    ) -> Result<Self> {
        if !(0.0..=1.0).contains(&test_size) {
            return Err(Error::InvalidArgument(format!(
                "test_size={test_size} should be between 0 and 1"
            )));
        }
        let mut shuffled = instances;
        let mut rng = StdRng::seed_from_u64(seed);
        shuffled.shuffle(&mut rng);

        let n_test = (shuffled.len() as f64 * test_size).round() as usize;
        let train = shuffled.split_off(n_test);
        Ok(Environment::new(labels)
            .with_split("train", InstanceProvider::from_instances(train)?)
            .with_split("test", InstanceProvider::from_instances(shuffled)?))
    }
}
