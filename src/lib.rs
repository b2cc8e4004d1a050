//! Explore, examine, explain and expose text classification models.
//!
//! An [`Explabox`] wraps one [`Ingestible`] (labelled data split into named
//! splits, plus a model) and hands out four façades:
//!
//! ```text
//!                 ┌──────────────┐
//!   Environment ─►│              │──► explore()  descriptives, instances
//!                 │  Ingestible  │──► examine()  performance, misclassifications
//!   Model ───────►│              │──► explain()  local explanations, prototypes, tokens
//!                 └──────────────┘──► expose()   patterns, invariance, perturbations
//! ```
//!
//! Every operation returns a [`Digestible`]: a typed result that also renders
//! to a JSON config via [`Digestible::to_config`].

pub mod classifier;
pub mod config;
pub mod data;
pub mod digestibles;
pub mod error;
pub mod examine;
pub mod explabox;
pub mod explain;
pub mod explore;
pub mod expose;
pub mod ingestible;

pub use classifier::{Model, ModelKind, TextClassifier};
pub use config::Config;
pub use data::{Environment, Instance, InstanceProvider, Key, LabelProvider, LabelSet};
pub use digestibles::{Dataset, Digestible, MultipleReturn};
pub use error::{Error, Result};
pub use explabox::Explabox;
pub use ingestible::{Ingestible, Requirement};
