//! Registry of independent trials keyed by study name, using `DashMap`.
//!
//! Distinct trials share no mutable state: each entry owns its own ledger,
//! lock, and random stream. Data is lost on process restart.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use super::Trial;
use crate::config::TrialConfiguration;
use crate::{Error, Result};

/// In-memory registry of trials.
///
/// Thread-safe; lookups and insertions on different studies do not contend.
///
/// # Example
///
/// ```rust
/// use carandom::config::TrialConfiguration;
/// use carandom::trial::TrialRegistry;
///
/// let registry = TrialRegistry::new();
/// let config = TrialConfiguration::builder("HTN-2").strata(["low", "high"]).build()?;
/// let trial = registry.open(config)?;
/// trial.enroll(1, "low")?;
/// assert!(registry.get("HTN-2").is_some());
/// # Ok::<(), carandom::Error>(())
/// ```
#[derive(Debug, Default)]
pub struct TrialRegistry {
    trials: DashMap<String, Arc<Trial>>,
}

impl TrialRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize and register a trial under its study name.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the configuration is invalid or the study
    /// name is already registered.
    pub fn open(&self, config: TrialConfiguration) -> Result<Arc<Trial>> {
        match self.trials.entry(config.study_name.clone()) {
            Entry::Occupied(entry) => Err(Error::Configuration(format!(
                "study '{}' is already registered",
                entry.key()
            ))),
            Entry::Vacant(entry) => {
                let trial = Arc::new(Trial::new(config)?);
                entry.insert(Arc::clone(&trial));
                Ok(trial)
            }
        }
    }

    /// Get a trial by study name.
    #[must_use]
    pub fn get(&self, study_name: &str) -> Option<Arc<Trial>> {
        self.trials.get(study_name).map(|t| Arc::clone(t.value()))
    }

    /// Unregister a trial, returning it.
    pub fn remove(&self, study_name: &str) -> Option<Arc<Trial>> {
        self.trials.remove(study_name).map(|(_, trial)| trial)
    }

    /// Registered study names (unordered).
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.trials.iter().map(|t| t.key().clone()).collect()
    }

    /// Number of registered trials.
    #[must_use]
    pub fn len(&self) -> usize {
        self.trials.len()
    }

    /// Check if no trial is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }
}
