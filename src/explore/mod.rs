//! The Explorer: descriptive statistics and raw views of the data.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use log::debug;

use crate::data::{Tokenizer, WordTokenizer};
use crate::digestibles::{Dataset, Descriptives, Digestible, LengthStats};
use crate::error::Result;
use crate::ingestible::{Ingestible, Requirement};

/// Explores the data. Requires data.
pub struct Explorer {
    ingestibles: Arc<Ingestible>,
    tokenizer: Box<dyn Tokenizer>,
}

impl fmt::Debug for Explorer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Explorer")
            .field("ingestibles", &self.ingestibles)
            .finish_non_exhaustive()
    }
}

impl Explorer {
    pub fn new(ingestibles: Arc<Ingestible>) -> Result<Self> {
        ingestibles.check_requirements(&[Requirement::Data])?;
        Ok(Self {
            ingestibles,
            tokenizer: Box::new(WordTokenizer::default()),
        })
    }

    /// Tokenizer used for length statistics.
    pub fn with_tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
        self.tokenizer = Box::new(tokenizer);
        self
    }

    /// Label counts and tokenized lengths for every split.
    pub fn descriptives(&self) -> Result<Descriptives> {
        let env = self.ingestibles.require_data()?;
        let truth = self.ingestibles.ground_truth()?;
        let labels: Vec<String> = self.ingestibles.labelset().unwrap_or_default().into_iter().collect();

        let mut label_counts = BTreeMap::new();
        let mut tokenized_lengths = BTreeMap::new();

        for (split, provider) in env.splits() {
            let keys = provider.key_set();
            let counts: BTreeMap<String, usize> = labels
                .iter()
                .map(|label| {
                    let count = truth.instances_by_label(label).intersection(&keys).count();
                    (label.clone(), count)
                })
                .collect();

            let lengths: Vec<usize> = provider
                .iter()
                .map(|instance| self.tokenizer.tokenize(&instance.data).len())
                .collect();
            debug!("split '{split}': {} instances", lengths.len());

            label_counts.insert(split.clone(), counts);
            tokenized_lengths.insert(split.clone(), LengthStats::from_lengths(&lengths));
        }

        Ok(Descriptives::new(labels, label_counts, tokenized_lengths))
    }

    /// Dataset view over `split` with its ground-truth labels.
    pub fn instances(&self, split: &str) -> Result<Dataset> {
        let (_, provider) = self.ingestibles.resolve_split(split)?;
        let truth = self.ingestibles.ground_truth()?;
        let dataset = Dataset::new(provider, truth);
        let meta = dataset.meta().clone().with_callarg("split", split);
        Ok(dataset.with_meta(meta))
    }
}
