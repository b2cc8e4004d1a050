//! The model side of an ingestible: a capability-tagged text classifier.

use std::fmt;

use crate::data::{InstanceProvider, LabelProvider, LabelSet};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// ModelKind – explicit capability tag
// ---------------------------------------------------------------------------

/// What a model predicts. Classifier-only operations check this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ModelKind {
    Classifier,
    Regressor,
    #[default]
    Unknown,
}

impl ModelKind {
    pub fn is_classifier(self) -> bool {
        self == ModelKind::Classifier
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ModelKind::Classifier => "classifier",
            ModelKind::Regressor => "regressor",
            ModelKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Model trait
// ---------------------------------------------------------------------------

/// A trained text model.
pub trait Model: Send + Sync {
    fn kind(&self) -> ModelKind;

    fn name(&self) -> &str;

    /// Output labels, in the column order of [`Model::predict_proba`].
    fn labels(&self) -> &[String];

    /// One probability row per text, one column per label.
    fn predict_proba(&self, texts: &[&str]) -> Result<Vec<Vec<f64>>>;

    /// Arg-max of each probability row as a singleton label set.
    fn predict(&self, texts: &[&str]) -> Result<Vec<LabelSet>> {
        let labels = self.labels();
        self.predict_proba(texts)?
            .into_iter()
            .map(|row| {
                if row.len() != labels.len() {
                    return Err(Error::LengthMismatch {
                        expected: labels.len(),
                        actual: row.len(),
                    });
                }
                Ok(argmax(&row)
                    .map(|i| std::iter::once(labels[i].clone()).collect())
                    .unwrap_or_default())
            })
            .collect()
    }
}

/// Position of the largest value; ties resolve to the first one.
fn argmax(row: &[f64]) -> Option<usize> {
    row.iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (i, &p)| match best {
            Some((_, bp)) if bp >= p => best,
            _ => Some((i, p)),
        })
        .map(|(i, _)| i)
}

/// Fails unless `model` returned one row per input.
pub(crate) fn check_batch(model: &dyn Model, returned: usize, expected: usize) -> Result<()> {
    if returned != expected {
        return Err(Error::Model(format!(
            "{} returned {returned} predictions for {expected} instances",
            model.name()
        )));
    }
    Ok(())
}

/// [`Model::predict`] with exactly one label set per text.
pub fn predict_texts(model: &dyn Model, texts: &[&str]) -> Result<Vec<LabelSet>> {
    let predictions = model.predict(texts)?;
    check_batch(model, predictions.len(), texts.len())?;
    Ok(predictions)
}

/// Predict every instance of a provider; the result is keyed like the provider.
pub fn predict_provider(model: &dyn Model, provider: &InstanceProvider) -> Result<LabelProvider> {
    let texts: Vec<&str> = provider.iter().map(|instance| instance.data.as_str()).collect();
    let predictions = predict_texts(model, &texts)?;
    Ok(LabelProvider::from_tuples(
        provider.keys().cloned().zip(predictions),
    ))
}

// ---------------------------------------------------------------------------
// TextClassifier – closure adapter
// ---------------------------------------------------------------------------

type Scorer = Box<dyn Fn(&[&str]) -> Result<Vec<Vec<f64>>> + Send + Sync>;

/// [`Model`] built from a scoring closure.
pub struct TextClassifier {
    name: String,
    labels: Vec<String>,
    kind: ModelKind,
    scorer: Scorer,
}

impl TextClassifier {
    /// Score texts one at a time.
    pub fn from_fn<F>(name: impl Into<String>, labels: Vec<String>, score: F) -> Self
    where
        F: Fn(&str) -> Vec<f64> + Send + Sync + 'static,
    {
        Self::from_batched_fn(name, labels, move |texts: &[&str]| {
            Ok(texts.iter().map(|&text| score(text)).collect())
        })
    }

    /// Score a whole batch at once; failures propagate to the caller.
    pub fn from_batched_fn<F>(name: impl Into<String>, labels: Vec<String>, score: F) -> Self
    where
        F: Fn(&[&str]) -> Result<Vec<Vec<f64>>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            labels,
            kind: ModelKind::Classifier,
            scorer: Box::new(score),
        }
    }

    pub fn with_kind(mut self, kind: ModelKind) -> Self {
        self.kind = kind;
        self
    }
}

impl fmt::Debug for TextClassifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TextClassifier")
            .field("name", &self.name)
            .field("labels", &self.labels)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

impl Model for TextClassifier {
    fn kind(&self) -> ModelKind {
        self.kind
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn labels(&self) -> &[String] {
        &self.labels
    }

    fn predict_proba(&self, texts: &[&str]) -> Result<Vec<Vec<f64>>> {
        (self.scorer)(texts)
    }
}
