/// Data layer: instance and label stores, loading, filtering and tokenizing.
///
/// Architecture:
/// ```text
///  .json / .csv / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → Environment
///   └──────────┘
///        │
///        ▼
///   ┌─────────────┐
///   │ Environment  │  split name → InstanceProvider, LabelProvider
///   └─────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  label / mask / predicate → selected positions
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod tokenize;

pub use filter::{Filter, Record};
pub use model::{label_set, Environment, Instance, InstanceProvider, Key, LabelProvider, LabelSet};
pub use tokenize::{Tokenizer, WordTokenizer};
