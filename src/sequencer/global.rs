//! CADBCD: covariate-adjusted doubly-adaptive biased coin
//!
//! One global burn-in over the first `2 * n0` patients, then a single global
//! target blended from per-stratum estimates:
//!
//! ```text
//! ρ   = Σ_s (n_s / N) · π_s        over strata with outcomes on both arms
//! p   = π_j (ρ/x)^γ / [π_j (ρ/x)^γ + (1-π_j) ((1-ρ)/(1-x))^γ]
//! ```
//!
//! where `N` is the number of patients enrolled so far, `x` the global
//! proportion on A and `π_j` the arriving patient's own stratum target
//! (0.5 when that stratum is not estimable). Weights of skipped strata are
//! not redistributed.
//!
//! References:
//! - Zhang, Hu, Cheung & Chan (2007): asymptotic properties of CARA designs
//! - Hu & Zhang (2004): doubly-adaptive biased coin designs

use super::{AllocationPolicy, Decision, Phase, StratumSequencer, TrialRng};
use crate::allocation::{clamp_probability, weighted_biased_coin};
use crate::config::RandomizationMethod;
use crate::ledger::{AllocationMethod, Scope, Stratum, TrialLedger};
use crate::{Error, Result};

/// Global coordinator blending stratum targets into one balance target.
#[derive(Debug, Clone)]
pub struct GlobalCoordinator {
    sequencer: StratumSequencer,
    strata: Vec<Stratum>,
}

/// Blended global target and the arriving stratum's own estimate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlendedTarget {
    /// Weighted global target ρ
    pub global: f64,
    /// Target of the arriving stratum, if estimable
    pub own: Option<f64>,
    /// Number of strata contributing to `global`
    pub contributing: usize,
}

impl GlobalCoordinator {
    /// Create a coordinator over the configured `strata`.
    #[must_use]
    pub const fn new(sequencer: StratumSequencer, strata: Vec<Stratum>) -> Self {
        Self { sequencer, strata }
    }

    /// Blend per-stratum targets into the global target for a patient of `stratum`.
    ///
    /// # Errors
    ///
    /// Returns `InternalInvariant` if a stratum's estimate degenerates.
    #[allow(clippy::cast_precision_loss)]
    pub fn blended_target(&self, ledger: &TrialLedger, stratum: &Stratum) -> Result<BlendedTarget> {
        let enrolled = ledger.len() as f64;
        let mut blended = BlendedTarget {
            global: 0.0,
            own: None,
            contributing: 0,
        };
        if ledger.is_empty() {
            return Ok(blended);
        }

        for (level, summary) in ledger.stratum_summaries(&self.strata) {
            if !summary.is_estimable() {
                continue;
            }
            let pi = self.sequencer.target(&summary)?;
            tracing::trace!(stratum = %level, pi, n = summary.enrolled(), "stratum target");
            blended.global += summary.enrolled() as f64 / enrolled * pi;
            blended.contributing += 1;
            if level == stratum {
                blended.own = Some(pi);
            }
        }
        Ok(blended)
    }
}

impl AllocationPolicy for GlobalCoordinator {
    fn decide(
        &self,
        ledger: &TrialLedger,
        stratum: &Stratum,
        rng: &mut TrialRng,
    ) -> Result<Decision> {
        let global = ledger.summary(Scope::Trial);
        if self.sequencer.phase(&global) == Phase::BurnIn {
            return self.sequencer.burn_in_decision(&global, rng);
        }
        if self.sequencer.lacks_outcomes(&global) {
            return Ok(Decision::fair_coin(AllocationMethod::InsufficientOutcomes, rng));
        }

        let target = self.blended_target(ledger, stratum)?;
        if target.contributing == 0 {
            return Ok(Decision::fair_coin(AllocationMethod::InsufficientData, rng));
        }

        let x = global.proportion_a().ok_or_else(|| {
            Error::InternalInvariant("adaptive decision over an empty trial".into())
        })?;
        let own = target.own.unwrap_or(0.5);
        let p = clamp_probability(weighted_biased_coin(
            x,
            target.global,
            own,
            self.sequencer.gamma(),
        )?);
        Ok(Decision::adaptive(p, target.global, rng))
    }

    fn method(&self) -> RandomizationMethod {
        RandomizationMethod::Cadbcd
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::{AllocationTargetEstimator, TargetStrategy};
    use crate::ledger::{Arm, PatientId, PatientRecord};
    use rand::SeedableRng;

    fn coordinator(strata: &[&str]) -> GlobalCoordinator {
        let estimator = AllocationTargetEstimator::new(TargetStrategy::Neyman, 0.0).unwrap();
        GlobalCoordinator::new(
            StratumSequencer::new(1, 2.0, estimator),
            strata.iter().map(|&s| Stratum::from(s)).collect(),
        )
    }

    fn push(ledger: &mut TrialLedger, id: u64, stratum: &str, arm: Arm, outcome: Option<f64>) {
        let seq = ledger.next_sequence();
        ledger
            .append(PatientRecord::new(PatientId::new(id), Stratum::from(stratum), arm, seq))
            .unwrap();
        if let Some(v) = outcome {
            ledger.record_outcome(PatientId::new(id), v).unwrap();
        }
    }

    #[test]
    fn test_unestimable_strata_are_skipped_without_renormalizing() {
        let coordinator = coordinator(&["low", "high"]);
        let mut ledger = TrialLedger::new();
        // low: both arms with outcomes -> estimable
        push(&mut ledger, 1, "low", Arm::A, Some(10.0));
        push(&mut ledger, 2, "low", Arm::A, Some(16.0));
        push(&mut ledger, 3, "low", Arm::B, Some(5.0));
        push(&mut ledger, 4, "low", Arm::B, Some(6.0));
        // high: only arm A -> skipped
        push(&mut ledger, 5, "high", Arm::A, Some(1.0));
        push(&mut ledger, 6, "high", Arm::A, Some(2.0));

        let high = Stratum::from("high");
        let target = coordinator.blended_target(&ledger, &high).unwrap();
        let pi_low = 18.0f64.sqrt() / (18.0f64.sqrt() + 0.5f64.sqrt());
        assert_eq!(target.contributing, 1);
        assert!((target.global - 4.0 / 6.0 * pi_low).abs() < 1e-12);
        assert_eq!(target.own, None);
    }

    #[test]
    fn test_global_burn_in_then_gate() {
        let coordinator = coordinator(&["low", "high"]);
        let mut rng = TrialRng::seed_from_u64(5);
        let mut ledger = TrialLedger::new();

        let low = Stratum::from("low");
        let first = coordinator.decide(&ledger, &low, &mut rng).unwrap();
        assert_eq!(first.method, AllocationMethod::BurnIn);
        push(&mut ledger, 1, "low", first.arm, None);
        let second = coordinator.decide(&ledger, &Stratum::from("high"), &mut rng).unwrap();
        assert_eq!(second.method, AllocationMethod::BurnIn);
        assert_eq!(second.arm, first.arm.other());
        push(&mut ledger, 2, "high", second.arm, None);

        let third = coordinator.decide(&ledger, &low, &mut rng).unwrap();
        assert_eq!(third.method, AllocationMethod::InsufficientOutcomes);
    }

    #[test]
    fn test_adaptive_probability_is_clamped() {
        let coordinator = coordinator(&["low"]);
        let mut rng = TrialRng::seed_from_u64(5);
        let mut ledger = TrialLedger::new();
        push(&mut ledger, 1, "low", Arm::A, Some(10.0));
        push(&mut ledger, 2, "low", Arm::A, Some(16.0));
        push(&mut ledger, 3, "low", Arm::B, Some(5.0));
        push(&mut ledger, 4, "low", Arm::B, Some(6.0));

        let decision = coordinator.decide(&ledger, &Stratum::from("low"), &mut rng).unwrap();
        assert_eq!(decision.method, AllocationMethod::Adaptive);
        assert!((0.1..=0.9).contains(&decision.probability));
    }

    #[test]
    fn test_arriving_stratum_target_weights_the_coin() {
        let coordinator = coordinator(&["low", "high"]);
        let mut rng = TrialRng::seed_from_u64(5);
        let mut ledger = TrialLedger::new();
        // low: sdA = sqrt(18), sdB = sqrt(0.5) -> pi_low = 6/7
        push(&mut ledger, 1, "low", Arm::A, Some(10.0));
        push(&mut ledger, 2, "low", Arm::A, Some(16.0));
        push(&mut ledger, 3, "low", Arm::B, Some(5.0));
        push(&mut ledger, 4, "low", Arm::B, Some(6.0));
        // high: sdA = sqrt(2), sdB = sqrt(50) -> pi_high = 1/6
        push(&mut ledger, 5, "high", Arm::A, Some(20.0));
        push(&mut ledger, 6, "high", Arm::A, Some(22.0));
        push(&mut ledger, 7, "high", Arm::B, Some(30.0));
        push(&mut ledger, 8, "high", Arm::B, Some(40.0));
        push(&mut ledger, 9, "high", Arm::A, None);

        let (pi_low, pi_high): (f64, f64) = (6.0 / 7.0, 1.0 / 6.0);
        let rho = 4.0 / 9.0 * pi_low + 5.0 / 9.0 * pi_high;
        let x: f64 = 5.0 / 9.0;
        let t1 = pi_low * (rho / x).powi(2);
        let t2 = (1.0 - pi_low) * ((1.0 - rho) / (1.0 - x)).powi(2);
        let expected = t1 / (t1 + t2);

        let low = Stratum::from("low");
        let target = coordinator.blended_target(&ledger, &low).unwrap();
        assert_eq!(target.contributing, 2);
        assert!((target.global - rho).abs() < 1e-12);
        assert!((target.own.unwrap() - pi_low).abs() < 1e-12);

        let decision = coordinator.decide(&ledger, &low, &mut rng).unwrap();
        assert_eq!(decision.method, AllocationMethod::Adaptive);
        assert!((decision.target.unwrap() - rho).abs() < 1e-12);
        assert!((decision.probability - expected).abs() < 1e-12);
        assert!((decision.probability - 0.7565).abs() < 1e-3);
    }
}
