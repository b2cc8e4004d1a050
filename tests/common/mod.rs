#![allow(dead_code)]

use std::sync::Arc;

use explabox::data::label_set;
use explabox::{Environment, Explabox, Ingestible, Instance, InstanceProvider, Key, LabelProvider, TextClassifier};

pub const PUNCTUATION: &str = "punctuation";
pub const NO_PUNCTUATION: &str = "no_punctuation";

/// 100 printable ASCII characters: digits, letters, punctuation, whitespace.
pub fn printable() -> Vec<char> {
    ('0'..='9')
        .chain('a'..='z')
        .chain('A'..='Z')
        .chain(('!'..='~').filter(char::is_ascii_punctuation))
        .chain([' ', '\t', '\n', '\r', '\u{0B}', '\u{0C}'])
        .collect()
}

pub fn label_of(c: char) -> &'static str {
    if c.is_ascii_punctuation() {
        PUNCTUATION
    } else {
        NO_PUNCTUATION
    }
}

/// Every fourth character goes to `test`, the rest to `train`.
pub fn environment() -> Environment {
    let characters = printable();
    let labels = LabelProvider::from_tuples(
        characters
            .iter()
            .enumerate()
            .map(|(i, &c)| (Key::Int(i as i64), label_set([label_of(c)]))),
    );
    let (mut train, mut test) = (Vec::new(), Vec::new());
    for (i, c) in characters.into_iter().enumerate() {
        let instance = Instance::new(i as i64, c.to_string());
        if i % 4 == 0 {
            test.push(instance);
        } else {
            train.push(instance);
        }
    }
    Environment::new(labels)
        .with_split("train", InstanceProvider::from_instances(train).unwrap())
        .with_split("test", InstanceProvider::from_instances(test).unwrap())
}

/// Predicts `punctuation` for punctuation and digits, so digits are
/// misclassified.
pub fn model() -> TextClassifier {
    TextClassifier::from_fn(
        "punctuation_detector",
        vec![NO_PUNCTUATION.to_string(), PUNCTUATION.to_string()],
        |text| {
            if text.chars().any(|c| c.is_ascii_punctuation() || c.is_ascii_digit()) {
                vec![0.2, 0.8]
            } else {
                vec![0.7, 0.3]
            }
        },
    )
}

pub fn ingestible() -> Ingestible {
    Ingestible::new(Some(environment()), Some(Arc::new(model())))
}

pub fn explabox() -> Explabox {
    Explabox::new(ingestible()).unwrap()
}

/// The five-instance sentiment dataset.
pub fn sentiment_dataset() -> explabox::Dataset {
    let labels = ["positive", "negative", "positive", "neutral", "positive"]
        .into_iter()
        .map(|l| label_set([l]))
        .collect();
    explabox::Dataset::from_texts(["great", "awful", "lovely", "fine", "superb"], labels).unwrap()
}
