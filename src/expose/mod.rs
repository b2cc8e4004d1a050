//! The Exposer: sensitivity tests for robustness and fairness.

mod generators;
mod pattern;
mod perturbation;

pub use generators::{random_strings, Generator};
pub use pattern::Pattern;
pub use perturbation::Perturbation;

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use log::{debug, info};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::classifier::{check_batch, predict_texts, Model};
use crate::data::LabelSet;
use crate::digestibles::{LabelMetrics, MeanScore, MultipleReturn, SuccessTest, TestCase};
use crate::error::{Error, Result};
use crate::examine::metrics::label_scores;
use crate::ingestible::{Ingestible, Requirement};

fn rng_from(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// How instances are generated from a [`Pattern`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatternOptions {
    /// Values for `{name}` placeholders.
    pub bindings: BTreeMap<String, Vec<String>>,
    /// Draw this many distinct instances instead of all combinations.
    pub n_samples: Option<usize>,
    pub seed: Option<u64>,
}

impl PatternOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bind<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.bindings
            .insert(name.into(), values.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_n_samples(mut self, n_samples: usize) -> Self {
        self.n_samples = Some(n_samples);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    fn generate(&self, pattern: &str) -> Result<Vec<String>> {
        let parsed = Pattern::parse(pattern, &self.bindings)?;
        parsed.generate(self.n_samples, &mut rng_from(self.seed))
    }
}

/// Labels to compute a mean score for.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectedLabels {
    All,
    Labels(Vec<String>),
}

impl From<&str> for SelectedLabels {
    fn from(label: &str) -> Self {
        if label.eq_ignore_ascii_case("all") {
            SelectedLabels::All
        } else {
            SelectedLabels::Labels(vec![label.to_string()])
        }
    }
}

impl From<Vec<String>> for SelectedLabels {
    fn from(labels: Vec<String>) -> Self {
        SelectedLabels::Labels(labels)
    }
}

impl From<Option<&str>> for SelectedLabels {
    fn from(label: Option<&str>) -> Self {
        label.map_or(SelectedLabels::All, SelectedLabels::from)
    }
}

// ---------------------------------------------------------------------------
// Exposer
// ---------------------------------------------------------------------------

/// Exposes model sensitivity. Requires data and a model.
#[derive(Debug)]
pub struct Exposer {
    ingestibles: Arc<Ingestible>,
    seed: Option<u64>,
}

impl Exposer {
    pub fn new(ingestibles: Arc<Ingestible>) -> Result<Self> {
        ingestibles.check_requirements(&[Requirement::Data, Requirement::Model])?;
        Ok(Self {
            ingestibles,
            seed: Some(0),
        })
    }

    /// Seed for random perturbations; `None` draws from entropy.
    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    fn model(&self) -> Result<&Arc<dyn Model>> {
        self.ingestibles.require_model()
    }

    /// Robustness to random strings. A case succeeds when the model returns a
    /// prediction without error.
    pub fn input_space(
        &self,
        generators: &[Generator],
        n_samples: usize,
        min_length: usize,
        max_length: usize,
        seed: Option<u64>,
    ) -> Result<SuccessTest> {
        let model = self.model()?;
        let texts = random_strings(generators, n_samples, min_length, max_length, &mut rng_from(seed))?;
        info!("testing {} on {} random strings", model.name(), texts.len());

        let (mut successes, mut failures) = (Vec::new(), Vec::new());
        for text in texts {
            match model.predict(&[text.as_str()]) {
                Ok(mut predicted) if predicted.len() == 1 => {
                    successes.push(TestCase::predicted(text, predicted.remove(0)));
                }
                Ok(predicted) => failures.push(TestCase::failed(
                    text,
                    format!("expected 1 prediction, got {}", predicted.len()),
                )),
                Err(err) => failures.push(TestCase::failed(text, err.to_string())),
            }
        }

        let names: Vec<String> = generators.iter().map(ToString::to_string).collect();
        let mut result = SuccessTest::new("input_space", successes, failures);
        result.meta = result
            .meta
            .with_callarg("generators", names)
            .with_callarg("n_samples", n_samples)
            .with_callarg("min_length", min_length)
            .with_callarg("max_length", max_length)
            .with_callarg("seed", seed);
        Ok(result)
    }

    /// [`input_space`](Self::input_space) with generators given by name;
    /// `"all"` selects every built-in generator.
    pub fn input_space_by_name<S: AsRef<str>>(
        &self,
        generators: &[S],
        n_samples: usize,
        min_length: usize,
        max_length: usize,
        seed: Option<u64>,
    ) -> Result<SuccessTest> {
        let generators = Generator::parse_list(generators)?;
        self.input_space(&generators, n_samples, min_length, max_length, seed)
    }

    /// Predictions on instances generated from `pattern` should all equal
    /// `expectation`, or the first prediction when no expectation is given.
    pub fn invariance(
        &self,
        pattern: &str,
        expectation: Option<LabelSet>,
        options: &PatternOptions,
    ) -> Result<SuccessTest> {
        let model = self.model()?;
        let texts = options.generate(pattern)?;
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let predictions = predict_texts(model.as_ref(), &refs)?;

        let expected = expectation.or_else(|| predictions.first().cloned());
        let (mut successes, mut failures) = (Vec::new(), Vec::new());
        for (text, predicted) in texts.into_iter().zip(predictions) {
            if Some(&predicted) == expected.as_ref() {
                successes.push(TestCase::predicted(text, predicted));
            } else {
                failures.push(TestCase::predicted(text, predicted));
            }
        }
        debug!("invariance: {} passed, {} failed", successes.len(), failures.len());

        let mut result = SuccessTest::new("invariance", successes, failures);
        result.meta = result
            .meta
            .with_callarg("pattern", pattern)
            .with_callarg("expectation", expected);
        Ok(result)
    }

    /// Mean predicted probability of each selected label on instances
    /// generated from `pattern`.
    pub fn mean_score(
        &self,
        pattern: &str,
        selected_labels: impl Into<SelectedLabels>,
        options: &PatternOptions,
    ) -> Result<MultipleReturn<MeanScore>> {
        let model = self.model()?;
        let model_labels = model.labels();
        let selected = match selected_labels.into() {
            SelectedLabels::All => model_labels.to_vec(),
            SelectedLabels::Labels(labels) => labels,
        };
        let columns = selected
            .iter()
            .map(|label| {
                model_labels
                    .iter()
                    .position(|l| l == label)
                    .ok_or_else(|| Error::unknown_identifier("label", label, model_labels.iter().cloned()))
            })
            .collect::<Result<Vec<usize>>>()?;

        let texts = options.generate(pattern)?;
        let refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let probabilities = model.predict_proba(&refs)?;
        check_batch(model.as_ref(), probabilities.len(), refs.len())?;

        selected
            .into_iter()
            .zip(columns)
            .map(|(label, column)| {
                let scores = probabilities
                    .iter()
                    .map(|row| {
                        row.get(column).copied().ok_or(Error::LengthMismatch {
                            expected: model_labels.len(),
                            actual: row.len(),
                        })
                    })
                    .collect::<Result<Vec<f64>>>()?;
                let mean = if scores.is_empty() {
                    0.0
                } else {
                    scores.iter().sum::<f64>() / scores.len() as f64
                };
                let mut result = MeanScore::new(label, mean, texts.clone());
                result.meta = result.meta.with_callarg("pattern", pattern);
                Ok(result)
            })
            .collect()
    }

    /// Per-label metrics on each split before and after applying `perturbation`
    /// to every instance.
    pub fn compare_metric<S: AsRef<str>>(
        &self,
        perturbation: &Perturbation,
        splits: &[S],
    ) -> Result<MultipleReturn<LabelMetrics>> {
        let model = self.model()?;
        let truth = self.ingestibles.ground_truth()?;
        let mut labels: BTreeSet<String> = self.ingestibles.labelset().unwrap_or_default();
        labels.extend(model.labels().iter().cloned());
        let labels: Vec<String> = labels.into_iter().collect();
        let mut rng = rng_from(self.seed);

        splits
            .iter()
            .map(|split| {
                let split = split.as_ref();
                let (name, provider) = self.ingestibles.resolve_split(split)?;
                info!("comparing metrics on '{name}' under {perturbation}");

                let ground_truth: Vec<LabelSet> = provider.keys().map(|key| truth.labels_of(key)).collect();
                let texts: Vec<&str> = provider.iter().map(|i| i.data.as_str()).collect();
                let perturbed: Vec<String> = texts.iter().map(|t| perturbation.apply(t, &mut rng)).collect();
                let perturbed_refs: Vec<&str> = perturbed.iter().map(String::as_str).collect();

                let before = predict_texts(model.as_ref(), &texts)?;
                let after = predict_texts(model.as_ref(), &perturbed_refs)?;
                let pairs_before: Vec<(&LabelSet, &LabelSet)> = ground_truth.iter().zip(&before).collect();
                let pairs_after: Vec<(&LabelSet, &LabelSet)> = ground_truth.iter().zip(&after).collect();

                let mut result = LabelMetrics::new(
                    name,
                    perturbation.to_string(),
                    label_scores(&labels, &pairs_before),
                    label_scores(&labels, &pairs_after),
                );
                result.meta = result.meta.with_callarg("split", split);
                Ok(result)
            })
            .collect()
    }

    /// [`compare_metric`](Self::compare_metric) with a built-in perturbation
    /// given by name.
    pub fn compare_metric_by_name<S: AsRef<str>>(
        &self,
        perturbation: &str,
        splits: &[S],
    ) -> Result<MultipleReturn<LabelMetrics>> {
        self.compare_metric(&perturbation.parse()?, splits)
    }
}
