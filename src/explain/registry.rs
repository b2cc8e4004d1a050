use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use log::debug;
use serde_json::Value as JsonValue;

use super::{ExplainOptions, LocalMethod, PrototypeMethod};
use crate::classifier::Model;
use crate::data::{Instance, Key};
use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// Algorithm traits
// ---------------------------------------------------------------------------

/// A local explanation algorithm (LIME, KernelSHAP, ...).
pub trait LocalExplainer {
    /// Explain the prediction of `model` on `instance`. The returned value is
    /// stored verbatim in the resulting [`Explanation`](crate::digestibles::Explanation).
    fn explain(&self, model: &dyn Model, instance: &Instance, options: &ExplainOptions) -> Result<JsonValue>;
}

/// Selects prototypes (and optionally criticisms) from a set of instances.
pub trait PrototypeSelector {
    /// Returns `(prototypes, criticisms)` as keys of `instances`.
    fn select(
        &self,
        instances: &[&Instance],
        n_prototypes: usize,
        n_criticisms: usize,
    ) -> Result<(Vec<Key>, Vec<Key>)>;
}

type LocalFactory = Box<dyn Fn() -> Result<Box<dyn LocalExplainer>>>;
type PrototypeFactory = Box<dyn Fn() -> Result<Box<dyn PrototypeSelector>>>;

// ---------------------------------------------------------------------------
// ExplanationRegistry
// ---------------------------------------------------------------------------

/// Table of explanation algorithms.
///
/// Entries are registered as factories; an algorithm is built the first time
/// it is requested and reused afterwards.
#[derive(Default)]
pub struct ExplanationRegistry {
    local_factories: BTreeMap<LocalMethod, LocalFactory>,
    prototype_factories: BTreeMap<PrototypeMethod, PrototypeFactory>,
    local: RefCell<BTreeMap<LocalMethod, Arc<dyn LocalExplainer>>>,
    prototype: RefCell<BTreeMap<PrototypeMethod, Arc<dyn PrototypeSelector>>>,
}

impl fmt::Debug for ExplanationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExplanationRegistry")
            .field("local", &self.local_factories.keys().collect::<Vec<_>>())
            .field("prototype", &self.prototype_factories.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ExplanationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_local<F, E>(&mut self, method: LocalMethod, factory: F)
    where
        F: Fn() -> Result<E> + 'static,
        E: LocalExplainer + 'static,
    {
        self.local.borrow_mut().remove(&method);
        self.local_factories.insert(
            method,
            Box::new(move || factory().map(|e| Box::new(e) as Box<dyn LocalExplainer>)),
        );
    }

    pub fn register_prototype<F, S>(&mut self, method: PrototypeMethod, factory: F)
    where
        F: Fn() -> Result<S> + 'static,
        S: PrototypeSelector + 'static,
    {
        self.prototype.borrow_mut().remove(&method);
        self.prototype_factories.insert(
            method,
            Box::new(move || factory().map(|s| Box::new(s) as Box<dyn PrototypeSelector>)),
        );
    }

    pub fn has_local(&self, method: LocalMethod) -> bool {
        self.local_factories.contains_key(&method)
    }

    pub fn has_prototype(&self, method: PrototypeMethod) -> bool {
        self.prototype_factories.contains_key(&method)
    }

    pub fn local(&self, method: LocalMethod) -> Result<Arc<dyn LocalExplainer>> {
        if let Some(explainer) = self.local.borrow().get(&method) {
            return Ok(Arc::clone(explainer));
        }
        let factory = self
            .local_factories
            .get(&method)
            .ok_or_else(|| Error::Unavailable(method.to_string()))?;
        debug!("instantiating {method}");
        let explainer: Arc<dyn LocalExplainer> = Arc::from(factory()?);
        self.local.borrow_mut().insert(method, Arc::clone(&explainer));
        Ok(explainer)
    }

    pub fn prototype(&self, method: PrototypeMethod) -> Result<Arc<dyn PrototypeSelector>> {
        if let Some(selector) = self.prototype.borrow().get(&method) {
            return Ok(Arc::clone(selector));
        }
        let factory = self
            .prototype_factories
            .get(&method)
            .ok_or_else(|| Error::Unavailable(method.to_string()))?;
        debug!("instantiating {method}");
        let selector: Arc<dyn PrototypeSelector> = Arc::from(factory()?);
        self.prototype.borrow_mut().insert(method, Arc::clone(&selector));
        Ok(selector)
    }
}
