use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value as JsonValue};

use super::{Digestible, Meta};
use crate::data::Instance;

/// Output of a local explanation method for one instance.
///
/// The body is produced by the registered algorithm and kept as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct Explanation {
    pub meta: Meta,
    pub method: String,
    pub instance: Instance,
    pub labels: Vec<String>,
    pub explanation: JsonValue,
}

impl Explanation {
    pub fn new(method: impl Into<String>, instance: Instance, labels: Vec<String>, explanation: JsonValue) -> Self {
        let method = method.into();
        Self {
            meta: Meta::new("local_explanation").with_subtype(method.clone()),
            method,
            instance,
            labels,
            explanation,
        }
    }
}

impl Digestible for Explanation {
    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn content(&self) -> JsonValue {
        json!({
            "method": self.method,
            "instance": self.instance,
            "labels": self.labels,
            "explanation": self.explanation,
        })
    }
}

/// Representative (and optionally atypical) instances, grouped per label or
/// under `"all"`.
#[derive(Debug, Clone, PartialEq)]
pub struct Prototypes {
    pub meta: Meta,
    pub method: String,
    pub prototypes: BTreeMap<String, Vec<Instance>>,
    pub criticisms: Option<BTreeMap<String, Vec<Instance>>>,
}

impl Prototypes {
    pub fn new(method: impl Into<String>, prototypes: BTreeMap<String, Vec<Instance>>) -> Self {
        let method = method.into();
        Self {
            meta: Meta::new("global_explanation").with_subtype("prototypes"),
            method,
            prototypes,
            criticisms: None,
        }
    }

    pub fn with_criticisms(mut self, criticisms: BTreeMap<String, Vec<Instance>>) -> Self {
        self.meta.subtype = Some("prototypes_criticisms".to_string());
        self.criticisms = Some(criticisms);
        self
    }
}

impl Digestible for Prototypes {
    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn content(&self) -> JsonValue {
        let mut content = json!({
            "method": self.method,
            "prototypes": self.prototypes,
        });
        if let Some(criticisms) = &self.criticisms {
            content["criticisms"] = json!(criticisms);
        }
        content
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScore {
    pub token: String,
    pub score: f64,
}

/// Ranked tokens, per label or under `"all"`.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureList {
    pub meta: Meta,
    pub labels: Vec<String>,
    pub features: BTreeMap<String, Vec<FeatureScore>>,
}

impl FeatureList {
    pub fn new(subtype: &str, labels: Vec<String>, features: BTreeMap<String, Vec<FeatureScore>>) -> Self {
        Self {
            meta: Meta::new("global_explanation").with_subtype(subtype),
            labels,
            features,
        }
    }

    /// Tokens of one group, best first.
    pub fn tokens(&self, group: &str) -> Vec<&str> {
        self.features
            .get(group)
            .map(|scores| scores.iter().map(|s| s.token.as_str()).collect())
            .unwrap_or_default()
    }
}

impl Digestible for FeatureList {
    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn content(&self) -> JsonValue {
        json!({
            "labels": self.labels,
            "features": self.features,
        })
    }
}
