//! Unstratified policies: RAR and CR
//!
//! Both treat the whole trial as a single scope and ignore the arriving
//! patient's stratum.

use super::{AllocationPolicy, Decision, Phase, StratumSequencer, TrialRng};
use crate::allocation::BurnInSequencer;
use crate::config::RandomizationMethod;
use crate::ledger::{AllocationMethod, Arm, Scope, Stratum, TrialLedger};
use crate::{Error, Result};

/// Response-adaptive randomization over the whole trial.
#[derive(Debug, Clone)]
pub struct TrialWideCoordinator {
    sequencer: StratumSequencer,
}

impl TrialWideCoordinator {
    /// Create a coordinator running `sequencer` over the whole trial.
    #[must_use]
    pub const fn new(sequencer: StratumSequencer) -> Self {
        Self { sequencer }
    }
}

impl AllocationPolicy for TrialWideCoordinator {
    fn decide(&self, ledger: &TrialLedger, _stratum: &Stratum, rng: &mut TrialRng) -> Result<Decision> {
        self.sequencer.decide(&ledger.summary(Scope::Trial), rng)
    }

    fn method(&self) -> RandomizationMethod {
        RandomizationMethod::Rar
    }
}

/// Complete randomization after a balanced burn-in.
///
/// Past burn-in every draw is a fair coin. It is tagged `complete` once
/// `2 * n0` patients carry outcomes, otherwise it takes the same
/// insufficient-outcomes gate as the adaptive policies.
#[derive(Debug, Clone)]
pub struct CompleteRandomization {
    burn_in: BurnInSequencer,
}

impl CompleteRandomization {
    /// Create a policy with `burn_in_size` (n0) balanced assignments per arm.
    #[must_use]
    pub const fn new(burn_in_size: usize) -> Self {
        Self {
            burn_in: BurnInSequencer::new(burn_in_size),
        }
    }

    /// Phase of the trial.
    #[must_use]
    pub const fn phase(&self, ledger_len: usize) -> Phase {
        if ledger_len < self.burn_in.len() {
            Phase::BurnIn
        } else {
            Phase::Adaptive
        }
    }
}

impl AllocationPolicy for CompleteRandomization {
    fn decide(&self, ledger: &TrialLedger, _stratum: &Stratum, rng: &mut TrialRng) -> Result<Decision> {
        let summary = ledger.summary(Scope::Trial);
        if self.phase(ledger.len()) == Phase::Adaptive {
            let method = if summary.reported() < self.burn_in.len() {
                AllocationMethod::InsufficientOutcomes
            } else {
                AllocationMethod::Complete
            };
            return Ok(Decision::fair_coin(method, rng));
        }
        self.burn_in
            .next_arm(summary.enrolled_on(Arm::A), summary.enrolled_on(Arm::B), rng)
            .map(Decision::burn_in)
            .ok_or_else(|| Error::InternalInvariant("burn-in sequence exhausted".into()))
    }

    fn method(&self) -> RandomizationMethod {
        RandomizationMethod::Complete
    }
}
