//! CARA: one independent sequencer per stratum
//!
//! Strata never interact. Each stratum runs its own burn-in, and its
//! adaptive phase starts once that stratum alone holds `2 * n0` patients.

use super::{AllocationPolicy, Decision, StratumSequencer, TrialRng};
use crate::config::RandomizationMethod;
use crate::ledger::{Scope, Stratum, TrialLedger};
use crate::Result;

/// Covariate-adjusted response-adaptive coordinator.
#[derive(Debug, Clone)]
pub struct StratifiedCoordinator {
    sequencer: StratumSequencer,
}

impl StratifiedCoordinator {
    /// Create a coordinator running `sequencer` in every stratum.
    #[must_use]
    pub const fn new(sequencer: StratumSequencer) -> Self {
        Self { sequencer }
    }
}

impl AllocationPolicy for StratifiedCoordinator {
    fn decide(
        &self,
        ledger: &TrialLedger,
        stratum: &Stratum,
        rng: &mut TrialRng,
    ) -> Result<Decision> {
        let summary = ledger.summary(Scope::Stratum(stratum));
        self.sequencer.decide(&summary, rng)
    }

    fn method(&self) -> RandomizationMethod {
        RandomizationMethod::Cara
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::{AllocationTargetEstimator, TargetStrategy};
    use crate::ledger::{AllocationMethod, PatientId, PatientRecord};
    use rand::SeedableRng;

    #[test]
    fn test_strata_burn_in_independently() {
        let estimator = AllocationTargetEstimator::new(TargetStrategy::Neyman, 0.0).unwrap();
        let coordinator = StratifiedCoordinator::new(StratumSequencer::new(1, 2.0, estimator));
        let mut rng = TrialRng::seed_from_u64(11);
        let mut ledger = TrialLedger::new();
        let low = Stratum::from("low");
        let high = Stratum::from("high");

        // fill "low" past its burn-in
        for id in 1..=2 {
            let decision = coordinator.decide(&ledger, &low, &mut rng).unwrap();
            assert_eq!(decision.method, AllocationMethod::BurnIn);
            let record = PatientRecord::new(PatientId::new(id), low.clone(), decision.arm, id);
            ledger.append(record).unwrap();
        }

        let decision = coordinator.decide(&ledger, &low, &mut rng).unwrap();
        assert_eq!(decision.method, AllocationMethod::InsufficientOutcomes);

        // "high" is still at the start of its own burn-in
        let decision = coordinator.decide(&ledger, &high, &mut rng).unwrap();
        assert_eq!(decision.method, AllocationMethod::BurnIn);
    }
}
