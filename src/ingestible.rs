use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::classifier::Model;
use crate::data::{Environment, InstanceProvider, LabelProvider};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Requirement – what a façade needs before it can run
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Requirement {
    Data,
    Model,
    Labels,
}

impl Requirement {
    pub const NAMES: [&'static str; 3] = ["data", "model", "labels"];
}

impl FromStr for Requirement {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "data" => Ok(Requirement::Data),
            "model" => Ok(Requirement::Model),
            "labels" | "labelprovider" => Ok(Requirement::Labels),
            other => Err(Error::unknown_identifier("requirement", other, Self::NAMES)),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Requirement::Data => "data",
            Requirement::Model => "model",
            Requirement::Labels => "labels",
        })
    }
}

// ---------------------------------------------------------------------------
// Ingestible – data, model and the split alias map
// ---------------------------------------------------------------------------

/// The `(data, model)` pair every façade works on.
///
/// `splits` maps logical names (`train`, `test`, `validation`) to the
/// physical split names used in `data`.
#[derive(Clone)]
pub struct Ingestible {
    data: Option<Environment>,
    model: Option<Arc<dyn Model>>,
    labels: Option<LabelProvider>,
    splits: BTreeMap<String, String>,
}

fn default_splits() -> BTreeMap<String, String> {
    ["train", "test", "validation"]
        .into_iter()
        .map(|s| (s.to_string(), s.to_string()))
        .collect()
}

impl Ingestible {
    /// Labels default to the ground truth stored in `data`.
    pub fn new(data: Option<Environment>, model: Option<Arc<dyn Model>>) -> Self {
        let labels = data.as_ref().map(|env| env.labels().clone());
        Self {
            data,
            model,
            labels,
            splits: default_splits(),
        }
    }

    /// Replace the alias map; aliases not given keep their identity mapping.
    pub fn with_splits<I, K, V>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.splits
            .extend(aliases.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn data(&self) -> Option<&Environment> {
        self.data.as_ref()
    }

    pub fn model(&self) -> Option<&Arc<dyn Model>> {
        self.model.as_ref()
    }

    pub fn labels(&self) -> Option<&LabelProvider> {
        self.labels.as_ref()
    }

    pub fn splits(&self) -> &BTreeMap<String, String> {
        &self.splits
    }

    pub fn set_model(&mut self, model: Arc<dyn Model>) {
        self.model = Some(model);
    }

    pub fn set_labels(&mut self, labels: LabelProvider) {
        self.labels = Some(labels);
    }

    /// Physical split names available in `data`.
    pub fn split_names(&self) -> Vec<String> {
        self.data.as_ref().map(Environment::split_names).unwrap_or_default()
    }

    /// Resolve a logical or physical split name.
    ///
    /// Aliases are tried first, then physical names. An unknown name is
    /// `Ok(None)`, or an [`Error::UnknownSplit`] when `validate` is set.
    pub fn get_named_split(&self, name: &str, validate: bool) -> Result<Option<&Arc<InstanceProvider>>> {
        let found = self.data.as_ref().and_then(|env| {
            self.splits
                .get(name)
                .and_then(|physical| env.split(physical))
                .or_else(|| env.split(name))
        });
        match found {
            Some(provider) => Ok(Some(provider)),
            None if validate => Err(Error::UnknownSplit {
                name: name.to_string(),
                choices: self.split_names(),
            }),
            None => Ok(None),
        }
    }

    /// Like [`get_named_split`](Self::get_named_split) with validation, but
    /// also returning the physical name.
    pub(crate) fn resolve_split(&self, name: &str) -> Result<(String, Arc<InstanceProvider>)> {
        let provider = self
            .get_named_split(name, true)?
            .cloned()
            .ok_or_else(|| Error::UnknownSplit {
                name: name.to_string(),
                choices: self.split_names(),
            })?;
        let physical = match self.splits.get(name) {
            Some(p) if self.data.as_ref().is_some_and(|env| env.contains_split(p)) => p.clone(),
            _ => name.to_string(),
        };
        Ok((physical, provider))
    }

    pub fn train(&self) -> Option<&Arc<InstanceProvider>> {
        self.get_named_split("train", false).ok().flatten()
    }

    pub fn test(&self) -> Option<&Arc<InstanceProvider>> {
        self.get_named_split("test", false).ok().flatten()
    }

    pub fn validation(&self) -> Option<&Arc<InstanceProvider>> {
        self.get_named_split("validation", false).ok().flatten()
    }

    /// Fail on the first requirement that is not met.
    pub fn check_requirements(&self, requirements: &[Requirement]) -> Result<()> {
        for requirement in requirements {
            let present = match requirement {
                Requirement::Data => self.data.is_some(),
                Requirement::Model => self.model.is_some(),
                Requirement::Labels => self.labels.is_some(),
            };
            if !present {
                return Err(Error::Configuration(format!("{requirement} is required")));
            }
        }
        Ok(())
    }

    /// String-named variant of [`check_requirements`](Self::check_requirements).
    pub fn check_named_requirements<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        let requirements = names
            .iter()
            .map(|name| name.as_ref().parse())
            .collect::<Result<Vec<Requirement>>>()?;
        self.check_requirements(&requirements)
    }

    /// Distinct label values, `None` without a label provider.
    pub fn labelset(&self) -> Option<BTreeSet<String>> {
        self.labels.as_ref().map(LabelProvider::labelset)
    }

    pub(crate) fn require_data(&self) -> Result<&Environment> {
        self.data
            .as_ref()
            .ok_or_else(|| Error::Configuration("data is required".to_string()))
    }

    pub(crate) fn require_model(&self) -> Result<&Arc<dyn Model>> {
        self.model
            .as_ref()
            .ok_or_else(|| Error::Configuration("model is required".to_string()))
    }

    /// The attached label provider, falling back to the ground truth in `data`.
    pub(crate) fn ground_truth(&self) -> Result<&LabelProvider> {
        match (&self.labels, &self.data) {
            (Some(labels), _) => Ok(labels),
            (None, Some(env)) => Ok(env.labels()),
            (None, None) => Err(Error::Configuration("labels are required".to_string())),
        }
    }
}

impl fmt::Debug for Ingestible {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ingestible")
            .field("splits", &self.split_names())
            .field("model", &self.model.as_ref().map(|m| m.name().to_string()))
            .field("labels", &self.labels.as_ref().map(LabelProvider::len))
            .field("aliases", &self.splits)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::TextClassifier;
    use crate::data::{label_set, Instance, Key};

    fn environment() -> Environment {
        let labels = LabelProvider::from_tuples([
            (Key::Int(0), label_set(["a"])),
            (Key::Int(1), label_set(["b"])),
            (Key::Int(2), label_set(["a"])),
        ]);
        Environment::new(labels)
            .with_split(
                "train",
                InstanceProvider::from_instances(vec![Instance::new(0, "x"), Instance::new(1, "y")]).unwrap(),
            )
            .with_split(
                "holdout",
                InstanceProvider::from_instances(vec![Instance::new(2, "z")]).unwrap(),
            )
    }

    fn model() -> Arc<dyn Model> {
        Arc::new(TextClassifier::from_fn("m", vec!["a".into(), "b".into()], |_| vec![0.5, 0.5]))
    }

    #[test]
    fn alias_then_physical_lookup() {
        let ingestible = Ingestible::new(Some(environment()), None).with_splits([("test", "holdout")]);
        assert_eq!(ingestible.get_named_split("test", true).unwrap().unwrap().len(), 1);
        assert_eq!(ingestible.get_named_split("holdout", true).unwrap().unwrap().len(), 1);
        assert_eq!(ingestible.train().unwrap().len(), 2);
        assert!(ingestible.validation().is_none());
    }

    #[test]
    fn unknown_split_with_and_without_validation() {
        let ingestible = Ingestible::new(Some(environment()), None);
        assert!(ingestible.get_named_split("dev", false).unwrap().is_none());
        match ingestible.get_named_split("dev", true) {
            Err(Error::UnknownSplit { name, choices }) => {
                assert_eq!(name, "dev");
                assert_eq!(choices, vec!["holdout", "train"]);
            }
            other => panic!("expected UnknownSplit, got {other:?}"),
        }
    }

    #[test]
    fn resolve_split_reports_physical_name() {
        let ingestible = Ingestible::new(Some(environment()), None).with_splits([("test", "holdout")]);
        let (name, provider) = ingestible.resolve_split("test").unwrap();
        assert_eq!(name, "holdout");
        assert_eq!(provider.len(), 1);
    }

    #[test]
    fn requirements() {
        let empty = Ingestible::new(None, None);
        assert!(matches!(
            empty.check_requirements(&[Requirement::Data, Requirement::Model]),
            Err(Error::Configuration(_))
        ));
        let full = Ingestible::new(Some(environment()), Some(model()));
        assert!(full.check_named_requirements(&["data", "model", "labelprovider"]).is_ok());
        assert!(matches!(
            full.check_named_requirements(&["gpu"]),
            Err(Error::UnknownIdentifier { .. })
        ));
    }

    #[test]
    fn labelset_follows_label_provider() {
        assert!(Ingestible::new(None, None).labelset().is_none());
        let mut ingestible = Ingestible::new(Some(environment()), None);
        assert_eq!(ingestible.labelset().unwrap(), label_set(["a", "b"]));
        ingestible.set_labels(LabelProvider::from_tuples([(Key::Int(0), label_set(["c"]))]));
        assert_eq!(ingestible.labelset().unwrap(), label_set(["c"]));
    }
}
