mod common;

use serde_json::{json, Value as JsonValue};

use explabox::classifier::Model;
use explabox::data::{Instance, Key};
use explabox::explain::{ExplainOptions, LocalExplainer, LocalMethod, PrototypeMethod, PrototypeSelector};
use explabox::{Error, Explabox};

/// Reports the model's probabilities for the explained instance.
struct ProbabilityExplainer;

impl LocalExplainer for ProbabilityExplainer {
    fn explain(&self, model: &dyn Model, instance: &Instance, options: &ExplainOptions) -> explabox::Result<JsonValue> {
        let scores = model.predict_proba(&[instance.data.as_str()])?;
        Ok(json!({ "scores": scores[0], "labels": options.labels, "foil": options.foil }))
    }
}

/// Prototypes from the front, criticisms from the back.
struct Ends;

impl PrototypeSelector for Ends {
    fn select(&self, instances: &[&Instance], n: usize, c: usize) -> explabox::Result<(Vec<Key>, Vec<Key>)> {
        let keys: Vec<Key> = instances.iter().map(|i| i.key.clone()).collect();
        Ok((
            keys.iter().take(n).cloned().collect(),
            keys.iter().rev().take(c).cloned().collect(),
        ))
    }
}

fn explabox() -> Explabox {
    let mut bx = common::explabox();
    let registry = bx.explain_mut().registry_mut();
    for method in LocalMethod::ALL {
        registry.register_local(method, || Ok(ProbabilityExplainer));
    }
    registry.register_prototype(PrototypeMethod::KMedoids, || Ok(Ends));
    registry.register_prototype(PrototypeMethod::MmdCritic, || Ok(Ends));
    bx
}

#[test]
fn explain_instance_by_key() {
    let bx = explabox();
    // key 62 is the first punctuation character
    let explanations = bx
        .explain()
        .explain_prediction(62_i64, &[LocalMethod::Lime], &ExplainOptions::default())
        .unwrap();
    assert_eq!(explanations.len(), 1);
    let explanation = &explanations[0];
    assert_eq!(explanation.instance.data, "!");
    assert_eq!(explanation.explanation["scores"], json!([0.2, 0.8]));

    let config = explanations.to_config();
    assert_eq!(config["meta"]["type"], "local_explanation");
}

#[test]
fn explain_raw_text_with_several_methods() {
    let bx = explabox();
    let explanations = bx
        .explain()
        .explain_prediction_by_name("hello", &["lime", "kernel_shap", "tree"], &ExplainOptions::default())
        .unwrap();
    let methods: Vec<&str> = explanations.iter().map(|e| e.method.as_str()).collect();
    assert_eq!(methods, vec!["LIME", "KernelSHAP", "LocalTree"]);
    assert!(explanations.to_config().is_array());
}

#[test]
fn unknown_method_lists_choices() {
    let bx = explabox();
    match bx
        .explain()
        .explain_prediction_by_name("hello", &["anchors"], &ExplainOptions::default())
    {
        Err(Error::UnknownIdentifier { kind, choices, .. }) => {
            assert_eq!(kind, "method");
            assert!(choices.contains(&"foil_tree".to_string()));
        }
        other => panic!("expected unknown method, got {other:?}"),
    }
}

#[test]
fn contrastive_explanations_need_a_foil() {
    let bx = explabox();
    let options = ExplainOptions::default();
    assert!(matches!(
        bx.explain().explain_prediction("?", &[LocalMethod::FoilTree], &options),
        Err(Error::InvalidArgument(_))
    ));

    let with_foil = ExplainOptions {
        foil: Some(common::NO_PUNCTUATION.to_string()),
        ..ExplainOptions::default()
    };
    let explanation = bx
        .explain()
        .explain_prediction("?", &[LocalMethod::FoilTree], &with_foil)
        .unwrap();
    assert_eq!(explanation[0].explanation["foil"], common::NO_PUNCTUATION);

    // rules fall back to the first label
    let rules = bx.explain().explain_prediction("?", &[LocalMethod::LocalRules], &options).unwrap();
    assert_eq!(rules[0].explanation["foil"], common::NO_PUNCTUATION);
}

#[test]
fn unregistered_algorithms_are_unavailable() {
    let bx = common::explabox();
    assert!(matches!(
        bx.explain().explain_prediction("x", &[LocalMethod::Lime], &ExplainOptions::default()),
        Err(Error::Unavailable(_))
    ));
    assert!(matches!(
        bx.explain().prototypes(PrototypeMethod::KMedoids, 2, "test", false),
        Err(Error::Unavailable(_))
    ));
}

#[test]
fn prototypes_per_label() {
    let bx = explabox();
    let prototypes = bx.explain().prototypes(PrototypeMethod::KMedoids, 2, "test", true).unwrap();
    assert_eq!(prototypes.prototypes.len(), 2);
    let texts: Vec<&str> = prototypes.prototypes[common::NO_PUNCTUATION]
        .iter()
        .map(|i| i.data.as_str())
        .collect();
    assert_eq!(texts, vec!["0", "4"]);
    assert!(prototypes.criticisms.is_none());
}

#[test]
fn prototypes_with_criticisms() {
    let bx = explabox();
    let result = bx.explain().prototypes_criticisms(1, 2, "train", false).unwrap();
    assert_eq!(result.prototypes["all"].len(), 1);
    assert_eq!(result.criticisms.as_ref().unwrap()["all"].len(), 2);
    assert_eq!(result.meta.subtype.as_deref(), Some("prototypes_criticisms"));
}

#[test]
fn token_frequency_per_label() {
    let bx = explabox();
    let frequency = bx
        .explain()
        .token_frequency(&["train", "test"], true, 3)
        .unwrap();
    assert_eq!(frequency.features[common::PUNCTUATION].len(), 3);
    // every character occurs once, so ties are broken alphabetically
    assert_eq!(frequency.tokens(common::NO_PUNCTUATION), vec!["0", "1", "2"]);
}

#[test]
fn token_information_over_splits() {
    let bx = explabox();
    let information = bx.explain().token_information(&["train"], 5).unwrap();
    let scores = &information.features["all"];
    assert_eq!(scores.len(), 5);
    assert!(scores.windows(2).all(|w| w[0].score >= w[1].score));
    assert!(matches!(
        bx.explain().token_information(&["nope"], 5),
        Err(Error::UnknownSplit { .. })
    ));
}
