//! Trial configuration
//!
//! A configuration is validated once, when a session is built or
//! reconfigured, so that an unusable strategy or threshold never surfaces
//! lazily in the middle of enrollment.
//!
//! ## JSON form
//!
//! ```json
//! {
//!   "study_name": "HTN-2",
//!   "burn_in_size": 10,
//!   "adaptation_exponent": 2.0,
//!   "target_strategy": "Neyman",
//!   "strategy_threshold": 0.0,
//!   "randomization_method": "CARA",
//!   "strata": ["low", "high"],
//!   "seed": 2024
//! }
//! ```

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::allocation::{AllocationTargetEstimator, TargetStrategy};
use crate::ledger::Stratum;
use crate::{Error, Result};

/// How assignment probabilities are adapted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RandomizationMethod {
    /// Complete randomization: fair coin after the burn-in.
    #[serde(rename = "CR")]
    Complete,
    /// Covariate-adjusted response-adaptive: one sequencer per stratum.
    #[serde(rename = "CARA")]
    Cara,
    /// Covariate-adjusted doubly-adaptive biased coin: one global target.
    #[serde(rename = "CADBCD")]
    Cadbcd,
    /// Response-adaptive randomization over the whole trial, ignoring strata.
    #[serde(rename = "RAR")]
    Rar,
}

impl RandomizationMethod {
    /// Wire name used in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Complete => "CR",
            Self::Cara => "CARA",
            Self::Cadbcd => "CADBCD",
            Self::Rar => "RAR",
        }
    }

    /// Whether decisions are scoped to the arriving patient's stratum.
    #[must_use]
    pub const fn is_stratum_scoped(self) -> bool {
        matches!(self, Self::Cara)
    }
}

impl fmt::Display for RandomizationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RandomizationMethod {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "CR" => Ok(Self::Complete),
            "CARA" => Ok(Self::Cara),
            "CADBCD" => Ok(Self::Cadbcd),
            "RAR" => Ok(Self::Rar),
            other => Err(Error::Configuration(format!(
                "unknown randomization method '{other}' (expected one of CR, CARA, CADBCD, RAR)"
            ))),
        }
    }
}

/// Configuration of one trial.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialConfiguration {
    /// Human-readable study name; also the registry key.
    pub study_name: String,
    /// Burn-in size n0: each scope starts with `n0` patients per arm.
    pub burn_in_size: usize,
    /// Biased-coin exponent γ (≥ 0).
    pub adaptation_exponent: f64,
    /// Optimality criterion for the target allocation.
    pub target_strategy: TargetStrategy,
    /// Threshold `TB` read by the BandBis and New strategies.
    #[serde(default)]
    pub strategy_threshold: f64,
    /// How assignment probabilities are adapted.
    pub randomization_method: RandomizationMethod,
    /// Configured covariate levels.
    pub strata: Vec<Stratum>,
    /// Seed of the trial's random stream; entropy-seeded when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl TrialConfiguration {
    /// Create a builder with the required study name.
    #[must_use]
    pub fn builder(study_name: impl Into<String>) -> TrialConfigurationBuilder {
        TrialConfigurationBuilder::new(study_name)
    }

    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for unknown strategy or method names and for
    /// out-of-range values.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| Error::Configuration(format!("invalid trial configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse, and validate a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `Io` if the file cannot be read, otherwise as [`Self::from_json`].
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `Json` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check every field.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.study_name.trim().is_empty() {
            return Err(Error::Configuration("study name must not be empty".into()));
        }
        if self.burn_in_size == 0 {
            return Err(Error::Configuration("burn-in size must be >= 1".into()));
        }
        if !self.adaptation_exponent.is_finite() || self.adaptation_exponent < 0.0 {
            return Err(Error::Configuration(format!(
                "adaptation exponent must be finite and >= 0, got {}",
                self.adaptation_exponent
            )));
        }
        if self.strata.is_empty() {
            return Err(Error::Configuration(
                "at least one stratum must be configured".into(),
            ));
        }
        let mut seen = HashSet::with_capacity(self.strata.len());
        for stratum in &self.strata {
            if stratum.as_str().is_empty() {
                return Err(Error::Configuration("stratum labels must not be empty".into()));
            }
            if !seen.insert(stratum) {
                return Err(Error::Configuration(format!(
                    "stratum '{stratum}' is configured twice"
                )));
            }
        }
        self.estimator().map(|_| ())
    }

    /// Target estimator for this configuration.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the threshold is unusable for the strategy.
    pub fn estimator(&self) -> Result<AllocationTargetEstimator> {
        AllocationTargetEstimator::new(self.target_strategy, self.strategy_threshold)
    }

    /// Whether `stratum` is one of the configured levels.
    #[must_use]
    pub fn has_stratum(&self, stratum: &Stratum) -> bool {
        self.strata.contains(stratum)
    }
}

/// Builder for `TrialConfiguration`.
///
/// Defaults: n0 = 10, γ = 2, Neyman, TB = 0, CARA, a single stratum `"all"`,
/// entropy seed.
#[derive(Debug)]
pub struct TrialConfigurationBuilder {
    config: TrialConfiguration,
}

impl TrialConfigurationBuilder {
    /// Create a new builder with the required study name.
    #[must_use]
    pub fn new(study_name: impl Into<String>) -> Self {
        Self {
            config: TrialConfiguration {
                study_name: study_name.into(),
                burn_in_size: 10,
                adaptation_exponent: 2.0,
                target_strategy: TargetStrategy::Neyman,
                strategy_threshold: 0.0,
                randomization_method: RandomizationMethod::Cara,
                strata: vec![Stratum::from("all")],
                seed: None,
            },
        }
    }

    /// Set the burn-in size n0.
    #[must_use]
    pub const fn burn_in_size(mut self, n0: usize) -> Self {
        self.config.burn_in_size = n0;
        self
    }

    /// Set the biased-coin exponent γ.
    #[must_use]
    pub const fn adaptation_exponent(mut self, gamma: f64) -> Self {
        self.config.adaptation_exponent = gamma;
        self
    }

    /// Set the target strategy.
    #[must_use]
    pub const fn target_strategy(mut self, strategy: TargetStrategy) -> Self {
        self.config.target_strategy = strategy;
        self
    }

    /// Set the strategy threshold `TB`.
    #[must_use]
    pub const fn strategy_threshold(mut self, threshold: f64) -> Self {
        self.config.strategy_threshold = threshold;
        self
    }

    /// Set the randomization method.
    #[must_use]
    pub const fn randomization_method(mut self, method: RandomizationMethod) -> Self {
        self.config.randomization_method = method;
        self
    }

    /// Set the configured strata.
    #[must_use]
    pub fn strata<I, S>(mut self, strata: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Stratum>,
    {
        self.config.strata = strata.into_iter().map(Into::into).collect();
        self
    }

    /// Seed the trial's random stream.
    #[must_use]
    pub const fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    /// Build and validate the `TrialConfiguration`.
    ///
    /// # Errors
    ///
    /// See [`TrialConfiguration::validate`].
    pub fn build(self) -> Result<TrialConfiguration> {
        self.config.validate()?;
        Ok(self.config)
    }
}
