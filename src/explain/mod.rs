//! The Explainer: local explanations, prototypes and token statistics.

mod registry;
pub mod tokens;

pub use registry::{ExplanationRegistry, LocalExplainer, PrototypeSelector};

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use log::{info, warn};
use serde::Serialize;

use crate::data::{Instance, InstanceProvider, Key, LabelSet, Tokenizer, WordTokenizer};
use crate::digestibles::{Explanation, FeatureList, MultipleReturn, Prototypes};
use crate::error::{Error, Result};
use crate::ingestible::{Ingestible, Requirement};

// ---------------------------------------------------------------------------
// Method enums
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LocalMethod {
    Lime,
    KernelShap,
    LocalTree,
    LocalRules,
    FoilTree,
}

impl LocalMethod {
    pub const ALL: [LocalMethod; 5] = [
        LocalMethod::Lime,
        LocalMethod::KernelShap,
        LocalMethod::LocalTree,
        LocalMethod::LocalRules,
        LocalMethod::FoilTree,
    ];

    const ALIASES: [&'static str; 16] = [
        "lime",
        "shap",
        "shapley",
        "kernelshap",
        "kernel_shap",
        "localtree",
        "local_tree",
        "tree",
        "localrules",
        "local_rules",
        "rules",
        "foil",
        "foiltree",
        "foil_tree",
        "contrastive",
        "contrastive_explanation",
    ];
}

impl FromStr for LocalMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "lime" => Ok(LocalMethod::Lime),
            "shap" | "shapley" | "kernelshap" | "kernel_shap" => Ok(LocalMethod::KernelShap),
            "localtree" | "local_tree" | "tree" => Ok(LocalMethod::LocalTree),
            "localrules" | "local_rules" | "rules" => Ok(LocalMethod::LocalRules),
            "foil" | "foiltree" | "foil_tree" | "contrastive" | "contrastive_explanation" => {
                Ok(LocalMethod::FoilTree)
            }
            _ => Err(Error::unknown_identifier("method", s, Self::ALIASES)),
        }
    }
}

impl fmt::Display for LocalMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LocalMethod::Lime => "LIME",
            LocalMethod::KernelShap => "KernelSHAP",
            LocalMethod::LocalTree => "LocalTree",
            LocalMethod::LocalRules => "LocalRules",
            LocalMethod::FoilTree => "FoilTree",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PrototypeMethod {
    MmdCritic,
    KMedoids,
}

impl FromStr for PrototypeMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mmdcritic" | "mmd_critic" => Ok(PrototypeMethod::MmdCritic),
            "kmedoids" | "k_medoids" => Ok(PrototypeMethod::KMedoids),
            _ => Err(Error::unknown_identifier("method", s, ["mmdcritic", "kmedoids"])),
        }
    }
}

impl fmt::Display for PrototypeMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PrototypeMethod::MmdCritic => "MMDCritic",
            PrototypeMethod::KMedoids => "KMedoids",
        })
    }
}

// ---------------------------------------------------------------------------
// Arguments
// ---------------------------------------------------------------------------

/// Instance to explain: a key in the train/test split, or raw text.
#[derive(Debug, Clone, PartialEq)]
pub enum Sample {
    Key(Key),
    Text(String),
}

impl From<Key> for Sample {
    fn from(key: Key) -> Self {
        Sample::Key(key)
    }
}

impl From<i64> for Sample {
    fn from(key: i64) -> Self {
        Sample::Key(Key::Int(key))
    }
}

impl From<&str> for Sample {
    fn from(text: &str) -> Self {
        Sample::Text(text.to_string())
    }
}

impl From<String> for Sample {
    fn from(text: String) -> Self {
        Sample::Text(text)
    }
}

/// Arguments passed through to local explanation algorithms.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ExplainOptions {
    /// Labels to explain; defaults to every known label.
    pub labels: Option<Vec<String>>,
    /// Contrast label for rule and foil explanations.
    pub foil: Option<String>,
    pub n_samples: Option<usize>,
    pub seed: Option<u64>,
}

// ---------------------------------------------------------------------------
// Explainer
// ---------------------------------------------------------------------------

/// Explains the model. Requires data and a model.
pub struct Explainer {
    ingestibles: Arc<Ingestible>,
    registry: ExplanationRegistry,
    tokenizer: Box<dyn Tokenizer>,
}

impl fmt::Debug for Explainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Explainer")
            .field("ingestibles", &self.ingestibles)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Explainer {
    pub fn new(ingestibles: Arc<Ingestible>) -> Result<Self> {
        ingestibles.check_requirements(&[Requirement::Data, Requirement::Model])?;
        Ok(Self {
            ingestibles,
            registry: ExplanationRegistry::new(),
            tokenizer: Box::new(WordTokenizer::default()),
        })
    }

    pub fn with_registry(mut self, registry: ExplanationRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
        self.tokenizer = Box::new(tokenizer);
        self
    }

    pub fn registry(&self) -> &ExplanationRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ExplanationRegistry {
        &mut self.registry
    }

    /// Ground-truth labels, or the model's labels when there are none.
    fn labels(&self) -> Result<Vec<String>> {
        match self.ingestibles.labelset() {
            Some(labels) if !labels.is_empty() => Ok(labels.into_iter().collect()),
            _ => Ok(self.ingestibles.require_model()?.labels().to_vec()),
        }
    }

    fn resolve_sample(&self, sample: Sample) -> Result<Instance> {
        match sample {
            Sample::Text(text) => Ok(Instance::new(Key::Int(0), text)),
            Sample::Key(key) => [self.ingestibles.train(), self.ingestibles.test()]
                .into_iter()
                .flatten()
                .find_map(|split| split.get(&key).cloned())
                .ok_or_else(|| Error::UnknownInstance(key.to_string())),
        }
    }

    /// Explain one prediction with each of `methods`, in order.
    pub fn explain_prediction(
        &self,
        sample: impl Into<Sample>,
        methods: &[LocalMethod],
        options: &ExplainOptions,
    ) -> Result<MultipleReturn<Explanation>> {
        let model = self.ingestibles.require_model()?;
        let instance = self.resolve_sample(sample.into())?;
        let labels = match &options.labels {
            Some(labels) => labels.clone(),
            None => self.labels()?,
        };

        methods
            .iter()
            .map(|&method| {
                let mut options = ExplainOptions {
                    labels: Some(labels.clone()),
                    ..options.clone()
                };
                match method {
                    LocalMethod::FoilTree if options.foil.is_none() => {
                        return Err(Error::InvalidArgument(format!(
                            "{method} requires a foil label"
                        )));
                    }
                    LocalMethod::LocalRules if options.foil.is_none() => {
                        let first = labels.first().cloned();
                        warn!("no foil given for {method}, defaulting to {first:?}");
                        options.foil = first;
                    }
                    _ => {}
                }

                let explainer = self.registry.local(method)?;
                let body = explainer.explain(model.as_ref(), &instance, &options)?;
                let mut explanation = Explanation::new(method.to_string(), instance.clone(), labels.clone(), body);
                explanation.meta = explanation.meta.with_callarg("options", &options);
                Ok(explanation)
            })
            .collect()
    }

    /// [`explain_prediction`](Self::explain_prediction) with methods given by name.
    pub fn explain_prediction_by_name<S: AsRef<str>>(
        &self,
        sample: impl Into<Sample>,
        methods: &[S],
        options: &ExplainOptions,
    ) -> Result<MultipleReturn<Explanation>> {
        let methods = methods
            .iter()
            .map(|m| m.as_ref().parse())
            .collect::<Result<Vec<LocalMethod>>>()?;
        self.explain_prediction(sample, &methods, options)
    }

    /// Instances of `provider` grouped by ground-truth label, or all under `"all"`.
    fn groups<'p>(&self, provider: &'p InstanceProvider, labelwise: bool) -> Result<BTreeMap<String, Vec<&'p Instance>>> {
        let mut groups: BTreeMap<String, Vec<&Instance>> = BTreeMap::new();
        if !labelwise {
            groups.insert("all".to_string(), provider.iter().collect());
            return Ok(groups);
        }
        let truth = self.ingestibles.ground_truth()?;
        for instance in provider.iter() {
            for label in truth.labels_of(&instance.key) {
                groups.entry(label).or_default().push(instance);
            }
        }
        Ok(groups)
    }

    fn select(
        &self,
        method: PrototypeMethod,
        split: &str,
        labelwise: bool,
        n_prototypes: usize,
        n_criticisms: usize,
    ) -> Result<(BTreeMap<String, Vec<Instance>>, BTreeMap<String, Vec<Instance>>)> {
        let (_, provider) = self.ingestibles.resolve_split(split)?;
        let selector = self.registry.prototype(method)?;
        let resolve = |keys: Vec<Key>| -> Result<Vec<Instance>> {
            keys.into_iter()
                .map(|key| {
                    provider
                        .get(&key)
                        .cloned()
                        .ok_or_else(|| Error::UnknownKey(key.to_string()))
                })
                .collect()
        };

        let mut prototypes = BTreeMap::new();
        let mut criticisms = BTreeMap::new();
        for (group, instances) in self.groups(&provider, labelwise)? {
            info!("selecting {n_prototypes} prototypes for '{group}' with {method}");
            let (p, c) = selector.select(&instances, n_prototypes, n_criticisms)?;
            prototypes.insert(group.clone(), resolve(p)?);
            criticisms.insert(group, resolve(c)?);
        }
        Ok((prototypes, criticisms))
    }

    /// Representative instances of `split`, per label when `labelwise`.
    pub fn prototypes(&self, method: PrototypeMethod, n: usize, split: &str, labelwise: bool) -> Result<Prototypes> {
        let (prototypes, _) = self.select(method, split, labelwise, n, 0)?;
        let mut result = Prototypes::new(method.to_string(), prototypes);
        result.meta = result
            .meta
            .with_callarg("n", n)
            .with_callarg("split", split)
            .with_callarg("labelwise", labelwise);
        Ok(result)
    }

    /// Prototypes plus criticisms (atypical instances), selected with MMD-critic.
    pub fn prototypes_criticisms(
        &self,
        n_prototypes: usize,
        n_criticisms: usize,
        split: &str,
        labelwise: bool,
    ) -> Result<Prototypes> {
        let method = PrototypeMethod::MmdCritic;
        let (prototypes, criticisms) = self.select(method, split, labelwise, n_prototypes, n_criticisms)?;
        let mut result = Prototypes::new(method.to_string(), prototypes).with_criticisms(criticisms);
        result.meta = result
            .meta
            .with_callarg("n_prototypes", n_prototypes)
            .with_callarg("n_criticisms", n_criticisms)
            .with_callarg("split", split)
            .with_callarg("labelwise", labelwise);
        Ok(result)
    }

    /// Tokenized instances of `splits` with their ground truth.
    fn tokenized<S: AsRef<str>>(&self, splits: &[S]) -> Result<Vec<(Vec<String>, LabelSet)>> {
        let truth = self.ingestibles.ground_truth()?;
        let mut documents = Vec::new();
        for split in splits {
            let (_, provider) = self.ingestibles.resolve_split(split.as_ref())?;
            documents.extend(
                provider
                    .iter()
                    .map(|instance| (self.tokenizer.tokenize(&instance.data), truth.labels_of(&instance.key))),
            );
        }
        Ok(documents)
    }

    /// The `k` most frequent tokens in `splits`, per ground-truth label when
    /// `labelwise`.
    pub fn token_frequency<S: AsRef<str> + Serialize>(
        &self,
        splits: &[S],
        labelwise: bool,
        k: usize,
    ) -> Result<FeatureList> {
        let documents = self.tokenized(splits)?;
        let mut features = BTreeMap::new();
        if labelwise {
            for label in self.labels()? {
                let docs = documents
                    .iter()
                    .filter(|(_, truth)| truth.contains(&label))
                    .map(|(tokens, _)| tokens.as_slice());
                features.insert(label.clone(), tokens::frequency(docs, k));
            }
        } else {
            let docs = documents.iter().map(|(tokens, _)| tokens.as_slice());
            features.insert("all".to_string(), tokens::frequency(docs, k));
        }

        let mut result = FeatureList::new("token_frequency", self.labels()?, features);
        result.meta = result
            .meta
            .with_callarg("splits", splits)
            .with_callarg("labelwise", labelwise)
            .with_callarg("k", k);
        Ok(result)
    }

    /// The `k` tokens with the highest mutual information with the label.
    ///
    /// The class of an instance is its whole ground-truth label set: a
    /// multi-label instance labelled `{a, b}` counts as class `"a,b"`, distinct
    /// from `"a"` and `"b"`.
    pub fn token_information<S: AsRef<str> + Serialize>(&self, splits: &[S], k: usize) -> Result<FeatureList> {
        let documents: Vec<(Vec<String>, String)> = self
            .tokenized(splits)?
            .into_iter()
            .map(|(tokens, truth)| (tokens, truth.into_iter().collect::<Vec<_>>().join(",")))
            .collect();
        let mut features = BTreeMap::new();
        features.insert("all".to_string(), tokens::information(&documents, k));

        let mut result = FeatureList::new("token_information", self.labels()?, features);
        result.meta = result.meta.with_callarg("splits", splits).with_callarg("k", k);
        Ok(result)
    }
}
