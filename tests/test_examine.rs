mod common;

use std::sync::Arc;

use explabox::classifier::ModelKind;
use explabox::data::label_set;
use explabox::digestibles::Digestible;
use explabox::examine::Examiner;
use explabox::{Error, Ingestible};

fn examiner() -> Examiner {
    Examiner::new(Arc::new(common::ingestible())).unwrap()
}

#[test]
fn performance_on_test_split() {
    let performance = examiner().performance("test").unwrap();
    assert_eq!(performance.labels, vec![common::NO_PUNCTUATION, common::PUNCTUATION]);
    assert_eq!(performance.metrics.n_instances, 25);
    // digits 0, 4 and 8 are predicted as punctuation
    assert!((performance.metrics.accuracy - 22.0 / 25.0).abs() < 1e-12);

    let punctuation = performance.label(common::PUNCTUATION).unwrap();
    assert_eq!(punctuation.false_positives, 3);
    assert_eq!(punctuation.false_negatives, 0);
    assert_eq!(punctuation.recall, 1.0);

    let config = performance.to_config();
    assert_eq!(config["meta"]["type"], "model_performance");
    assert_eq!(config["content"]["label_metrics"][0]["label"], common::NO_PUNCTUATION);
}

#[test]
fn repeated_calls_reuse_predictions() {
    let examiner = examiner();
    let first = examiner.predictions("test").unwrap();
    let _ = examiner.performance("test").unwrap();
    let second = examiner.predictions("test").unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(examiner.performance("test").unwrap(), examiner.performance("test").unwrap());
}

#[test]
fn wrongly_classified_digits() {
    let wrong = examiner().wrongly_classified("train").unwrap();
    assert_eq!(wrong.wrongly_classified.len(), 1);
    let group = &wrong.wrongly_classified[0];
    assert_eq!(group.ground_truth, label_set([common::NO_PUNCTUATION]));
    assert_eq!(group.predicted, label_set([common::PUNCTUATION]));
    // digits 1, 2, 3, 5, 6, 7, 9 sit in the train split
    assert_eq!(group.instances.len(), 7);
    assert!(group.instances.iter().all(|i| i.data.chars().all(|c| c.is_ascii_digit())));
}

#[test]
fn non_classifiers_are_unsupported() {
    let model = common::model().with_kind(ModelKind::Regressor);
    let ingestible = Ingestible::new(Some(common::environment()), Some(Arc::new(model)));
    let examiner = Examiner::new(Arc::new(ingestible)).unwrap();
    assert!(matches!(examiner.performance("test"), Err(Error::Unsupported(_))));
    assert!(matches!(examiner.wrongly_classified("test"), Err(Error::Unsupported(_))));
}

#[test]
fn unknown_split_lists_choices() {
    match examiner().performance("validation") {
        Err(Error::UnknownSplit { name, choices }) => {
            assert_eq!(name, "validation");
            assert_eq!(choices, vec!["test", "train"]);
        }
        other => panic!("expected unknown split, got {other:?}"),
    }
}

#[test]
fn requires_model() {
    let ingestible = Ingestible::new(Some(common::environment()), None);
    assert!(matches!(Examiner::new(Arc::new(ingestible)), Err(Error::Configuration(_))));
}
