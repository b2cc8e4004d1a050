use std::sync::Arc;

use log::info;

use crate::config::Config;
use crate::error::Result;
use crate::examine::Examiner;
use crate::explain::Explainer;
use crate::explore::Explorer;
use crate::expose::Exposer;
use crate::ingestible::{Ingestible, Requirement};

// ---------------------------------------------------------------------------
// Explabox – one entry point for the four façades
// ---------------------------------------------------------------------------

/// Explore, examine, explain and expose a model and its data.
///
/// All four façades share one [`Ingestible`].
#[derive(Debug)]
pub struct Explabox {
    ingestibles: Arc<Ingestible>,
    config: Config,
    examine: Examiner,
    explore: Explorer,
    explain: Explainer,
    expose: Exposer,
}

impl Explabox {
    /// Build with default [`Config`]. Requires data and a model.
    pub fn new(ingestibles: Ingestible) -> Result<Self> {
        Self::with_config(ingestibles, Config::default())
    }

    pub fn with_config(ingestibles: Ingestible, config: Config) -> Result<Self> {
        ingestibles.check_requirements(&[Requirement::Data, Requirement::Model])?;
        let ingestibles = Arc::new(ingestibles);
        info!("explabox ready (locale {}, splits {:?})", config.locale, ingestibles.split_names());

        Ok(Self {
            examine: Examiner::new(Arc::clone(&ingestibles))?,
            explore: Explorer::new(Arc::clone(&ingestibles))?,
            explain: Explainer::new(Arc::clone(&ingestibles))?,
            expose: Exposer::new(Arc::clone(&ingestibles))?.with_seed(config.seed),
            ingestibles,
            config,
        })
    }

    pub fn ingestibles(&self) -> &Arc<Ingestible> {
        &self.ingestibles
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn locale(&self) -> &str {
        &self.config.locale
    }

    pub fn examine(&self) -> &Examiner {
        &self.examine
    }

    pub fn explore(&self) -> &Explorer {
        &self.explore
    }

    pub fn explain(&self) -> &Explainer {
        &self.explain
    }

    /// Mutable access, e.g. to register explanation algorithms.
    pub fn explain_mut(&mut self) -> &mut Explainer {
        &mut self.explain
    }

    pub fn expose(&self) -> &Exposer {
        &self.expose
    }
}
