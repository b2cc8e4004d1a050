use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use super::{Digestible, Meta};
use crate::data::{Instance, LabelSet};
use crate::examine::metrics::{LabelScores, OverallScores};

// ---------------------------------------------------------------------------
// Performance
// ---------------------------------------------------------------------------

/// Classification metrics, per label and overall.
#[derive(Debug, Clone, PartialEq)]
pub struct Performance {
    pub meta: Meta,
    pub labels: Vec<String>,
    pub label_metrics: BTreeMap<String, LabelScores>,
    pub metrics: OverallScores,
}

impl Performance {
    pub fn new(labels: Vec<String>, label_metrics: BTreeMap<String, LabelScores>, metrics: OverallScores) -> Self {
        Self {
            meta: Meta::new("model_performance").with_subtype("classification"),
            labels,
            label_metrics,
            metrics,
        }
    }

    pub fn label(&self, label: &str) -> Option<&LabelScores> {
        self.label_metrics.get(label)
    }
}

impl Digestible for Performance {
    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn content(&self) -> JsonValue {
        let label_metrics: Vec<JsonValue> = self
            .labels
            .iter()
            .map(|label| json!({ "label": label, "metrics": self.label_metrics.get(label) }))
            .collect();
        json!({
            "labels": self.labels,
            "label_metrics": label_metrics,
            "metrics": self.metrics,
        })
    }
}

// ---------------------------------------------------------------------------
// Descriptives
// ---------------------------------------------------------------------------

/// Summary of tokenized instance lengths in one split.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LengthStats {
    pub mean: f64,
    pub max: usize,
    pub min: usize,
    /// Population standard deviation.
    pub std: f64,
}

impl LengthStats {
    /// Zeros for an empty input.
    pub fn from_lengths(lengths: &[usize]) -> Self {
        if lengths.is_empty() {
            return Self::default();
        }
        let n = lengths.len() as f64;
        let mean = lengths.iter().sum::<usize>() as f64 / n;
        let variance = lengths
            .iter()
            .map(|&l| {
                let d = l as f64 - mean;
                d * d
            })
            .sum::<f64>()
            / n;
        Self {
            mean,
            max: lengths.iter().copied().max().unwrap_or(0),
            min: lengths.iter().copied().min().unwrap_or(0),
            std: variance.sqrt(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Descriptives {
    pub meta: Meta,
    pub labels: Vec<String>,
    /// split → label → number of instances.
    pub label_counts: BTreeMap<String, BTreeMap<String, usize>>,
    /// split → length statistics.
    pub tokenized_lengths: BTreeMap<String, LengthStats>,
}

impl Descriptives {
    pub fn new(
        labels: Vec<String>,
        label_counts: BTreeMap<String, BTreeMap<String, usize>>,
        tokenized_lengths: BTreeMap<String, LengthStats>,
    ) -> Self {
        Self {
            meta: Meta::new("descriptives"),
            labels,
            label_counts,
            tokenized_lengths,
        }
    }
}

impl Digestible for Descriptives {
    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn content(&self) -> JsonValue {
        json!({
            "labels": self.labels,
            "label_counts": self.label_counts,
            "tokenized_lengths": self.tokenized_lengths,
        })
    }
}

// ---------------------------------------------------------------------------
// WronglyClassified
// ---------------------------------------------------------------------------

/// Instances sharing one `(ground truth, predicted)` combination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Misclassification {
    pub ground_truth: LabelSet,
    pub predicted: LabelSet,
    pub instances: Vec<Instance>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WronglyClassified {
    pub meta: Meta,
    pub wrongly_classified: Vec<Misclassification>,
}

impl WronglyClassified {
    pub fn new(wrongly_classified: Vec<Misclassification>) -> Self {
        Self {
            meta: Meta::new("wrongly_classified"),
            wrongly_classified,
        }
    }

    /// Total number of misclassified instances.
    pub fn count(&self) -> usize {
        self.wrongly_classified.iter().map(|m| m.instances.len()).sum()
    }
}

impl Digestible for WronglyClassified {
    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn content(&self) -> JsonValue {
        json!({ "wrongly_classified": self.wrongly_classified })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_stats() {
        let stats = LengthStats::from_lengths(&[2, 4, 4, 4, 5, 5, 7, 9]);
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.std, 2.0);
        assert_eq!((stats.min, stats.max), (2, 9));
        assert_eq!(LengthStats::from_lengths(&[]), LengthStats::default());
    }

    #[test]
    fn performance_content_follows_label_order() {
        let mut per_label = BTreeMap::new();
        per_label.insert("a".to_string(), LabelScores::default());
        per_label.insert("b".to_string(), LabelScores::default());
        let perf = Performance::new(vec!["b".into(), "a".into()], per_label, OverallScores::default());
        let content = perf.content();
        assert_eq!(content["label_metrics"][0]["label"], "b");
        assert_eq!(perf.to_config()["meta"]["subtype"], "classification");
    }
}
