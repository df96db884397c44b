//! Sequential allocation decisions
//!
//! Every enrollment asks an [`AllocationPolicy`] for one [`Decision`]. The
//! policy reads the ledger (never writes it) and consumes draws from the
//! trial's random stream.
//!
//! | Method | Policy | Scope of burn-in and estimation |
//! |--------|--------|---------------------------------|
//! | CARA   | [`StratifiedCoordinator`] | arriving patient's stratum |
//! | CADBCD | [`GlobalCoordinator`] | whole trial, target blended from strata |
//! | RAR    | [`TrialWideCoordinator`] | whole trial |
//! | CR     | [`CompleteRandomization`] | whole trial, no estimation |

mod global;
mod stratified;
mod stratum;
mod trial_wide;

pub use global::GlobalCoordinator;
pub use stratified::StratifiedCoordinator;
pub use stratum::{Phase, StratumSequencer};
pub use trial_wide::{CompleteRandomization, TrialWideCoordinator};

use std::fmt;

use rand::Rng;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::Serialize;

use crate::config::{RandomizationMethod, TrialConfiguration};
use crate::ledger::{AllocationMethod, Arm, Stratum, TrialLedger};
use crate::Result;

/// Seedable random stream owned by one trial.
pub type TrialRng = Xoshiro256PlusPlus;

/// Outcome of one allocation decision.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Decision {
    /// Arm drawn
    pub arm: Arm,
    /// Probability of arm A used for the draw
    pub probability: f64,
    /// How the probability was obtained
    pub method: AllocationMethod,
    /// Target allocation in effect, when one was estimated
    pub target: Option<f64>,
}

impl Decision {
    /// Burn-in assignment, reported at probability 0.5.
    #[must_use]
    pub const fn burn_in(arm: Arm) -> Self {
        Self {
            arm,
            probability: 0.5,
            method: AllocationMethod::BurnIn,
            target: None,
        }
    }

    /// Fair-coin assignment tagged with `method`.
    pub fn fair_coin<R: Rng + ?Sized>(method: AllocationMethod, rng: &mut R) -> Self {
        Self {
            arm: draw(0.5, rng),
            probability: 0.5,
            method,
            target: None,
        }
    }

    /// Adaptive assignment with probability `probability` of arm A.
    pub fn adaptive<R: Rng + ?Sized>(probability: f64, target: f64, rng: &mut R) -> Self {
        Self {
            arm: draw(probability, rng),
            probability,
            method: AllocationMethod::Adaptive,
            target: Some(target),
        }
    }
}

/// One independent uniform draw: arm A with probability `p_a`.
pub fn draw<R: Rng + ?Sized>(p_a: f64, rng: &mut R) -> Arm {
    if rng.gen::<f64>() < p_a {
        Arm::A
    } else {
        Arm::B
    }
}

/// Decides the arm of an arriving patient.
pub trait AllocationPolicy: Send + Sync + fmt::Debug {
    /// Decide the arm for a patient of `stratum` given the current ledger.
    ///
    /// # Errors
    ///
    /// Returns `InternalInvariant` if the estimation math degenerates.
    fn decide(&self, ledger: &TrialLedger, stratum: &Stratum, rng: &mut TrialRng)
        -> Result<Decision>;

    /// Randomization method implemented by this policy.
    fn method(&self) -> RandomizationMethod;
}

/// Build the policy for a validated configuration.
///
/// # Errors
///
/// Returns `Configuration` if the strategy threshold is unusable.
pub fn policy_for(config: &TrialConfiguration) -> Result<Box<dyn AllocationPolicy>> {
    let sequencer = StratumSequencer::from_config(config)?;
    Ok(match config.randomization_method {
        RandomizationMethod::Cara => Box::new(StratifiedCoordinator::new(sequencer)),
        RandomizationMethod::Cadbcd => {
            Box::new(GlobalCoordinator::new(sequencer, config.strata.clone()))
        }
        RandomizationMethod::Rar => Box::new(TrialWideCoordinator::new(sequencer)),
        RandomizationMethod::Complete => {
            Box::new(CompleteRandomization::new(config.burn_in_size))
        }
    })
}
