use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::{json, Value as JsonValue};

use super::{Digestible, Meta};
use crate::data::LabelSet;
use crate::examine::metrics::LabelScores;

// ---------------------------------------------------------------------------
// SuccessTest – pass/fail per generated instance
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TestCase {
    pub instance: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<LabelSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl TestCase {
    pub fn predicted(instance: impl Into<String>, prediction: LabelSet) -> Self {
        Self {
            instance: instance.into(),
            prediction: Some(prediction),
            error: None,
        }
    }

    pub fn failed(instance: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
            prediction: None,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuccessTest {
    pub meta: Meta,
    pub successes: Vec<TestCase>,
    pub failures: Vec<TestCase>,
}

impl SuccessTest {
    pub fn new(subtype: &str, successes: Vec<TestCase>, failures: Vec<TestCase>) -> Self {
        Self {
            meta: Meta::new("robustness").with_subtype(subtype),
            successes,
            failures,
        }
    }

    /// Fraction of cases that passed; 1.0 when nothing was tested.
    pub fn success_percentage(&self) -> f64 {
        let total = self.successes.len() + self.failures.len();
        if total == 0 {
            1.0
        } else {
            self.successes.len() as f64 / total as f64
        }
    }
}

impl Digestible for SuccessTest {
    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn content(&self) -> JsonValue {
        json!({
            "success_percentage": self.success_percentage(),
            "successes": self.successes,
            "failures": self.failures,
        })
    }
}

// ---------------------------------------------------------------------------
// MeanScore
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct MeanScore {
    pub meta: Meta,
    pub label: String,
    pub mean_score: f64,
    pub instances: Vec<String>,
}

impl MeanScore {
    pub fn new(label: impl Into<String>, mean_score: f64, instances: Vec<String>) -> Self {
        Self {
            meta: Meta::new("fairness").with_subtype("mean_score"),
            label: label.into(),
            mean_score,
            instances,
        }
    }
}

impl Digestible for MeanScore {
    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn content(&self) -> JsonValue {
        json!({
            "label": self.label,
            "mean_score": self.mean_score,
            "instances": self.instances,
        })
    }
}

// ---------------------------------------------------------------------------
// LabelMetrics – performance before and after a perturbation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct LabelMetrics {
    pub meta: Meta,
    pub split: String,
    pub perturbation: String,
    pub before: BTreeMap<String, LabelScores>,
    pub after: BTreeMap<String, LabelScores>,
}

impl LabelMetrics {
    pub fn new(
        split: impl Into<String>,
        perturbation: impl Into<String>,
        before: BTreeMap<String, LabelScores>,
        after: BTreeMap<String, LabelScores>,
    ) -> Self {
        Self {
            meta: Meta::new("robustness").with_subtype("label_metrics"),
            split: split.into(),
            perturbation: perturbation.into(),
            before,
            after,
        }
    }
}

impl Digestible for LabelMetrics {
    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn content(&self) -> JsonValue {
        let label_metrics: Vec<JsonValue> = self
            .before
            .keys()
            .map(|label| {
                json!({
                    "label": label,
                    "before": self.before.get(label),
                    "after": self.after.get(label),
                })
            })
            .collect();
        json!({
            "split": self.split,
            "perturbation": self.perturbation,
            "label_metrics": label_metrics,
        })
    }
}
