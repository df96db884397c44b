//! Allocation primitives
//!
//! Pure building blocks shared by every sequencer:
//!
//! - [`AllocationTargetEstimator`]: arm statistics → target allocation ρ
//! - [`biased_coin`]: current proportion, target, γ → assignment probability
//! - [`BurnInSequencer`]: exchangeable balanced sequence for the initial phase

mod biased_coin;
mod burn_in;
mod target;

pub use biased_coin::{biased_coin, weighted_biased_coin, BOUNDARY_EPSILON};
pub use burn_in::BurnInSequencer;
pub use target::{
    normal_cdf, target_allocation, AllocationTargetEstimator, ArmMoments, TargetStrategy,
    DEGENERATE_SD, MIN_MEAN, MIN_SD,
};

/// Lowest assignment probability an adaptive decision may use.
pub const PROBABILITY_FLOOR: f64 = 0.1;

/// Highest assignment probability an adaptive decision may use.
pub const PROBABILITY_CEILING: f64 = 0.9;

/// Clamp a probability into `[PROBABILITY_FLOOR, PROBABILITY_CEILING]`.
#[inline]
#[must_use]
pub fn clamp_probability(p: f64) -> f64 {
    p.clamp(PROBABILITY_FLOOR, PROBABILITY_CEILING)
}
