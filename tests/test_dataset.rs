mod common;

use explabox::data::{label_set, Filter, LabelSet};
use explabox::digestibles::Digestible;
use explabox::{Error, Key};

fn texts(dataset: &explabox::Dataset) -> Vec<&str> {
    dataset.data()
}

#[test]
fn sentiment_scenario() {
    let dataset = common::sentiment_dataset();

    let positive = dataset.filter("positive").unwrap();
    assert_eq!(positive.len(), 3);
    assert!(positive.labels().iter().all(|l| *l == label_set(["positive"])));

    assert_eq!(texts(&dataset.head(2).unwrap()), vec!["great", "awful"]);
    assert_eq!(texts(&dataset.select(2..4).unwrap()), vec!["lovely", "fine"]);

    let a = dataset.sample(5, Some(0)).unwrap();
    let b = dataset.sample(5, Some(0)).unwrap();
    assert_eq!(a.keys(), b.keys());
    assert_eq!(a.keys(), dataset.keys());
}

#[test]
fn negative_counts_are_rejected() {
    let dataset = common::sentiment_dataset();
    for n in [-1, -5, i64::MIN] {
        assert!(matches!(dataset.head(n), Err(Error::InvalidArgument(_))));
        assert!(matches!(dataset.tail(n), Err(Error::InvalidArgument(_))));
        assert!(matches!(dataset.sample(n, None), Err(Error::InvalidArgument(_))));
    }
}

#[test]
fn counts_are_clamped_to_length() {
    let dataset = common::sentiment_dataset();
    for n in [5, 6, 100] {
        assert_eq!(dataset.head(n).unwrap().len(), 5);
        assert_eq!(dataset.tail(n).unwrap().len(), 5);
        assert_eq!(dataset.sample(n, None).unwrap().len(), 5);
    }
}

#[test]
fn head_and_tail_lengths() {
    let dataset = common::sentiment_dataset();
    for n in 0..=5 {
        assert_eq!(dataset.head(n).unwrap().len(), n as usize);
        assert_eq!(dataset.tail(n).unwrap().len(), n as usize);
    }
    assert_eq!(texts(&dataset.tail(2).unwrap()), vec!["fine", "superb"]);
    assert!(dataset.tail(0).unwrap().is_empty());
}

#[test]
fn sampling_is_seeded_and_distinct() {
    let dataset = common::sentiment_dataset();
    let a = dataset.sample(3, Some(7)).unwrap();
    let b = dataset.sample(3, Some(7)).unwrap();
    assert_eq!(a.keys(), b.keys());
    let mut keys = a.keys().to_vec();
    keys.sort();
    keys.dedup();
    assert_eq!(keys.len(), 3);
}

#[test]
fn filter_by_label_set_is_exact() {
    let dataset = explabox::Dataset::from_texts(
        ["a", "b", "c"],
        vec![label_set(["x"]), label_set(["x", "y"]), label_set(["y"])],
    )
    .unwrap();
    assert_eq!(texts(&dataset.filter("x").unwrap()), vec!["a"]);
    let both: LabelSet = label_set(["x", "y"]);
    assert_eq!(texts(&dataset.filter(both).unwrap()), vec!["b"]);
}

#[test]
fn filter_by_mask() {
    let dataset = common::sentiment_dataset();
    let mask = vec![true, false, false, true, true];
    assert_eq!(texts(&dataset.filter(mask).unwrap()), vec!["great", "fine", "superb"]);
    assert!(matches!(
        dataset.filter(vec![true, false]),
        Err(Error::LengthMismatch { expected: 5, actual: 2 })
    ));
}

#[test]
fn filter_by_predicates() {
    let dataset = common::sentiment_dataset();
    let long = dataset.filter(Filter::record(|r| r.data.len() > 5)).unwrap();
    assert_eq!(texts(&long), vec!["lovely", "superb"]);

    let positive_short = dataset
        .filter(Filter::pair(|data, label| data.len() <= 5 && label.contains("positive")))
        .unwrap();
    assert_eq!(texts(&positive_short), vec!["great"]);
}

#[test]
fn filter_from_dynamic_values() {
    let dataset = common::sentiment_dataset();
    assert_eq!(dataset.filter_value(&serde_json::json!("neutral")).unwrap().len(), 1);
    assert_eq!(
        dataset
            .filter_value(&serde_json::json!([false, true, false, false, false]))
            .unwrap()
            .len(),
        1
    );
    assert!(matches!(
        dataset.filter_value(&serde_json::json!({ "label": "x" })),
        Err(Error::InvalidFilterType(_))
    ));
}

#[test]
fn filtering_never_mutates() {
    let dataset = common::sentiment_dataset();
    let _ = dataset.filter("negative").unwrap();
    assert_eq!(dataset.len(), 5);
}

#[test]
fn key_and_position_access() {
    let dataset = common::sentiment_dataset();
    assert_eq!(texts(&dataset.get_by_key(&[Key::Int(4), Key::Int(0)]).unwrap()), vec!["superb", "great"]);
    assert_eq!(texts(&dataset.get_by_index(&[1]).unwrap()), vec!["awful"]);
    assert!(matches!(
        dataset.get_by_index(&[5]),
        Err(Error::IndexOutOfRange { index: 5, len: 5 })
    ));
    assert!(matches!(dataset.get_by_key(&[Key::Int(9)]), Err(Error::UnknownKey(_))));
}

#[test]
fn keys_take_precedence_over_positions() {
    let env = common::environment();
    let ingestible = explabox::Ingestible::new(Some(env), None);
    let explorer = explabox::explore::Explorer::new(std::sync::Arc::new(ingestible)).unwrap();
    let test = explorer.instances("test").unwrap();
    // keys of the test split are 0, 4, 8, ... so key 4 is at position 1
    assert_eq!(texts(&test.select(4_i64).unwrap()), vec!["4"]);
    // 1 is not a key of the view, so it is a position
    assert_eq!(texts(&test.select(1_i64).unwrap()), vec!["4"]);
    assert_eq!(texts(&test.select(2_i64).unwrap()), vec!["8"]);
}

#[test]
fn content_projection() {
    let config = common::sentiment_dataset().head(1).unwrap().to_config();
    assert_eq!(config["meta"]["type"], "dataset");
    assert_eq!(config["content"]["instances"].as_array().unwrap().len(), 1);
}
