//! Classification metrics over `(ground truth, predicted)` label-set pairs.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::data::{Key, LabelSet};

/// One-vs-rest counts and scores for a single label.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LabelScores {
    pub true_positives: usize,
    pub false_positives: usize,
    pub false_negatives: usize,
    pub true_negatives: usize,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub accuracy: f64,
}

impl LabelScores {
    fn from_counts(tp: usize, fp: usize, fn_: usize, tn: usize) -> Self {
        let precision = ratio(tp, tp + fp);
        let recall = ratio(tp, tp + fn_);
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        Self {
            true_positives: tp,
            false_positives: fp,
            false_negatives: fn_,
            true_negatives: tn,
            precision,
            recall,
            f1,
            accuracy: ratio(tp + tn, tp + fp + fn_ + tn),
        }
    }

    /// Number of instances carrying the label in the ground truth.
    pub fn support(&self) -> usize {
        self.true_positives + self.false_negatives
    }
}

/// Properties over all labels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct OverallScores {
    /// Fraction of instances whose predicted set equals the ground truth.
    pub accuracy: f64,
    pub macro_precision: f64,
    pub macro_recall: f64,
    pub macro_f1: f64,
    pub n_instances: usize,
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}

/// Per-label scores; every label in `labels` gets an entry.
pub fn label_scores(labels: &[String], pairs: &[(&LabelSet, &LabelSet)]) -> BTreeMap<String, LabelScores> {
    labels
        .iter()
        .map(|label| {
            let (mut tp, mut fp, mut fn_, mut tn) = (0, 0, 0, 0);
            for (truth, predicted) in pairs {
                match (truth.contains(label), predicted.contains(label)) {
                    (true, true) => tp += 1,
                    (false, true) => fp += 1,
                    (true, false) => fn_ += 1,
                    (false, false) => tn += 1,
                }
            }
            (label.clone(), LabelScores::from_counts(tp, fp, fn_, tn))
        })
        .collect()
}

pub fn overall_scores(pairs: &[(&LabelSet, &LabelSet)], per_label: &BTreeMap<String, LabelScores>) -> OverallScores {
    let exact = pairs.iter().filter(|(truth, predicted)| truth == predicted).count();
    let n_labels = per_label.len() as f64;
    let mean = |f: fn(&LabelScores) -> f64| {
        if per_label.is_empty() {
            0.0
        } else {
            per_label.values().map(f).sum::<f64>() / n_labels
        }
    };
    OverallScores {
        accuracy: ratio(exact, pairs.len()),
        macro_precision: mean(|s| s.precision),
        macro_recall: mean(|s| s.recall),
        macro_f1: mean(|s| s.f1),
        n_instances: pairs.len(),
    }
}

/// `(ground truth, predicted)` → keys of the instances with that outcome.
pub fn contingency_table<'a, I>(rows: I) -> BTreeMap<(LabelSet, LabelSet), BTreeSet<Key>>
where
    I: IntoIterator<Item = (&'a Key, &'a LabelSet, &'a LabelSet)>,
{
    let mut table: BTreeMap<(LabelSet, LabelSet), BTreeSet<Key>> = BTreeMap::new();
    for (key, truth, predicted) in rows {
        table
            .entry((truth.clone(), predicted.clone()))
            .or_default()
            .insert(key.clone());
    }
    table
}
