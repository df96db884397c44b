//! Per-scope sequential decision process
//!
//! ```text
//! BURN_IN ──(scope enrolled == 2·n0)──> ADAPTIVE   (terminal)
//! ```
//!
//! The phase is derived from the scope's enrolled count, which only grows,
//! so a scope never returns to burn-in until the trial is reinitialized.

use rand::Rng;
use serde::Serialize;

use super::Decision;
use crate::allocation::{
    biased_coin, clamp_probability, AllocationTargetEstimator, ArmMoments, BurnInSequencer,
};
use crate::config::TrialConfiguration;
use crate::ledger::{AllocationMethod, Arm, ScopeSummary};
use crate::{Error, Result};

/// Phase of a scope's state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Fewer than `2 * n0` patients enrolled in scope.
    #[serde(rename = "burn-in")]
    BurnIn,
    /// Burn-in complete.
    #[serde(rename = "adaptive")]
    Adaptive,
}

/// Burn-in then biased-coin decisions over one scope.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StratumSequencer {
    burn_in: BurnInSequencer,
    gamma: f64,
    estimator: AllocationTargetEstimator,
}

impl StratumSequencer {
    /// Create a sequencer.
    #[must_use]
    pub const fn new(burn_in_size: usize, gamma: f64, estimator: AllocationTargetEstimator) -> Self {
        Self {
            burn_in: BurnInSequencer::new(burn_in_size),
            gamma,
            estimator,
        }
    }

    /// Create a sequencer from a trial configuration.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the strategy threshold is unusable.
    pub fn from_config(config: &TrialConfiguration) -> Result<Self> {
        Ok(Self::new(
            config.burn_in_size,
            config.adaptation_exponent,
            config.estimator()?,
        ))
    }

    /// Burn-in length `2 * n0`.
    #[must_use]
    pub const fn burn_in_len(&self) -> usize {
        self.burn_in.len()
    }

    /// Biased-coin exponent γ.
    #[must_use]
    pub const fn gamma(&self) -> f64 {
        self.gamma
    }

    /// Target estimator.
    #[must_use]
    pub const fn estimator(&self) -> &AllocationTargetEstimator {
        &self.estimator
    }

    /// Current phase of a scope.
    #[must_use]
    pub const fn phase(&self, summary: &ScopeSummary) -> Phase {
        if summary.enrolled() < self.burn_in.len() {
            Phase::BurnIn
        } else {
            Phase::Adaptive
        }
    }

    /// Whether a scope past burn-in still lacks `2 * n0` outcome-reported patients.
    #[must_use]
    pub const fn lacks_outcomes(&self, summary: &ScopeSummary) -> bool {
        summary.reported() < self.burn_in.len()
    }

    /// Decide the next assignment in a scope.
    ///
    /// # Errors
    ///
    /// Returns `InternalInvariant` if the estimation math degenerates.
    pub fn decide<R: Rng + ?Sized>(&self, summary: &ScopeSummary, rng: &mut R) -> Result<Decision> {
        if self.phase(summary) == Phase::BurnIn {
            return self.burn_in_decision(summary, rng);
        }
        if self.lacks_outcomes(summary) {
            return Ok(Decision::fair_coin(AllocationMethod::InsufficientOutcomes, rng));
        }
        if !summary.is_estimable() {
            return Ok(Decision::fair_coin(AllocationMethod::InsufficientData, rng));
        }

        let rho = self.target(summary)?;
        let x = summary.proportion_a().ok_or_else(|| {
            Error::InternalInvariant("adaptive decision over an empty scope".into())
        })?;
        let p = clamp_probability(biased_coin(x, rho, self.gamma)?);
        Ok(Decision::adaptive(p, rho, rng))
    }

    /// Target ρ estimated from a scope's outcome-bearing patients.
    ///
    /// # Errors
    ///
    /// Returns `InternalInvariant` if the estimation math degenerates.
    pub fn target(&self, summary: &ScopeSummary) -> Result<f64> {
        self.estimator.estimate(
            ArmMoments::from(summary.outcomes(Arm::A)),
            ArmMoments::from(summary.outcomes(Arm::B)),
        )
    }

    /// Next label of the scope's balanced burn-in sequence.
    ///
    /// # Errors
    ///
    /// Returns `InternalInvariant` if the scope already holds `n0` patients on both arms.
    pub fn burn_in_decision<R: Rng + ?Sized>(
        &self,
        summary: &ScopeSummary,
        rng: &mut R,
    ) -> Result<Decision> {
        self.burn_in
            .next_arm(summary.enrolled_on(Arm::A), summary.enrolled_on(Arm::B), rng)
            .map(Decision::burn_in)
            .ok_or_else(|| Error::InternalInvariant("burn-in sequence exhausted".into()))
    }
}
