//! The Examiner: model performance and misclassifications per split.

pub mod metrics;

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use log::{debug, info};

use crate::classifier::{predict_provider, Model};
use crate::data::{LabelProvider, LabelSet};
use crate::digestibles::{Misclassification, Performance, WronglyClassified};
use crate::error::{Error, Result};
use crate::ingestible::{Ingestible, Requirement};
use metrics::{contingency_table, label_scores, overall_scores};

/// Examines model performance. Requires data and a classifier.
///
/// Predictions are computed once per split and cached for the lifetime of
/// the examiner.
#[derive(Debug)]
pub struct Examiner {
    ingestibles: Arc<Ingestible>,
    predictions: RefCell<BTreeMap<String, Arc<LabelProvider>>>,
}

impl Examiner {
    pub fn new(ingestibles: Arc<Ingestible>) -> Result<Self> {
        ingestibles.check_requirements(&[Requirement::Data, Requirement::Model])?;
        Ok(Self {
            ingestibles,
            predictions: RefCell::new(BTreeMap::new()),
        })
    }

    pub fn ingestibles(&self) -> &Arc<Ingestible> {
        &self.ingestibles
    }

    fn classifier(&self) -> Result<&Arc<dyn Model>> {
        let model = self.ingestibles.require_model()?;
        if !model.kind().is_classifier() {
            return Err(Error::Unsupported(format!(
                "{} is a {} model, only classifiers can be examined",
                model.name(),
                model.kind()
            )));
        }
        Ok(model)
    }

    /// Predicted labels for every instance of `split`, computed on first use.
    pub fn predictions(&self, split: &str) -> Result<Arc<LabelProvider>> {
        let model = self.classifier()?;
        let (name, provider) = self.ingestibles.resolve_split(split)?;

        if let Some(cached) = self.predictions.borrow().get(&name) {
            debug!("using cached predictions for split '{name}'");
            return Ok(Arc::clone(cached));
        }

        info!("predicting {} instances of split '{name}' with {}", provider.len(), model.name());
        let predicted = Arc::new(predict_provider(model.as_ref(), &provider)?);
        self.predictions
            .borrow_mut()
            .insert(name, Arc::clone(&predicted));
        Ok(predicted)
    }

    /// Labels reported in results: ground truth plus model outputs, sorted.
    fn labels(&self) -> Result<Vec<String>> {
        let mut labels: BTreeSet<String> = self.ingestibles.labelset().unwrap_or_default();
        labels.extend(self.classifier()?.labels().iter().cloned());
        Ok(labels.into_iter().collect())
    }

    /// `(ground truth, predicted)` per instance of `split`, in split order.
    fn outcomes(&self, split: &str) -> Result<(Vec<LabelSet>, Arc<LabelProvider>)> {
        let predicted = self.predictions(split)?;
        let (_, provider) = self.ingestibles.resolve_split(split)?;
        let truth = self.ingestibles.ground_truth()?;
        let ground_truth = provider.keys().map(|key| truth.labels_of(key)).collect();
        Ok((ground_truth, predicted))
    }

    /// Per-label and overall classification metrics on `split`.
    pub fn performance(&self, split: &str) -> Result<Performance> {
        let (_, provider) = self.ingestibles.resolve_split(split)?;
        let (ground_truth, predicted) = self.outcomes(split)?;
        let predicted_sets: Vec<LabelSet> = provider.keys().map(|key| predicted.labels_of(key)).collect();
        let pairs: Vec<(&LabelSet, &LabelSet)> = ground_truth.iter().zip(&predicted_sets).collect();

        let labels = self.labels()?;
        let per_label = label_scores(&labels, &pairs);
        let overall = overall_scores(&pairs, &per_label);

        let mut performance = Performance::new(labels, per_label, overall);
        performance.meta = performance.meta.with_callarg("split", split);
        Ok(performance)
    }

    /// Instances whose predicted label set differs from the ground truth,
    /// grouped by `(ground truth, predicted)`.
    pub fn wrongly_classified(&self, split: &str) -> Result<WronglyClassified> {
        let (_, provider) = self.ingestibles.resolve_split(split)?;
        let (ground_truth, predicted) = self.outcomes(split)?;
        let predicted_sets: Vec<LabelSet> = provider.keys().map(|key| predicted.labels_of(key)).collect();

        let rows = provider
            .keys()
            .zip(ground_truth.iter().zip(&predicted_sets))
            .map(|(key, (truth, pred))| (key, truth, pred));
        let table = contingency_table(rows);

        let wrongly_classified = table
            .into_iter()
            .filter(|((truth, pred), _)| truth != pred)
            .map(|((ground_truth, predicted), keys)| Misclassification {
                ground_truth,
                predicted,
                instances: keys.iter().filter_map(|key| provider.get(key).cloned()).collect(),
            })
            .collect();

        let mut result = WronglyClassified::new(wrongly_classified);
        result.meta = result.meta.with_callarg("split", split);
        Ok(result)
    }
}
