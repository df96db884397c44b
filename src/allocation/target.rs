//! Target allocation estimation
//!
//! Maps per-arm outcome moments to the long-run proportion ρ of patients
//! that should receive arm A under a chosen optimality criterion.
//!
//! References:
//! - Neyman (1934): minimum-variance allocation
//! - Rosenberger, Stallard, Ivanova, Harper & Ricks (2001): RSIHR allocation
//! - Bandyopadhyay & Biswas (2001): normal-response adaptive design
//! - Zhang & Rosenberger (2006): response-adaptive designs for continuous responses

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::clamp_probability;
use crate::ledger::OutcomeStats;
use crate::{Error, Result};

/// Standard deviations below this are treated as degenerate.
pub const MIN_SD: f64 = 1e-5;

/// Replacement for a degenerate standard deviation.
pub const DEGENERATE_SD: f64 = 0.1;

/// Means are clamped to at least this before taking square roots.
pub const MIN_MEAN: f64 = 1e-5;

/// Optimality criterion for the target allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetStrategy {
    /// Minimize variance of the mean-difference estimator.
    #[serde(rename = "Neyman")]
    Neyman,
    /// Minimize expected total response for fixed variance.
    #[serde(rename = "RSIHR")]
    Rsihr,
    /// Normal CDF of the standardized mean difference, scaled by the threshold.
    #[serde(rename = "BandBis")]
    BandBis,
    /// RSIHR only when it favors the better arm, otherwise balanced.
    #[serde(rename = "ZR", alias = "ZhangRosenberger")]
    ZhangRosenberger,
    /// Neyman allocation subject to a ceiling on the expected mean response.
    #[serde(rename = "New", alias = "ConstrainedNeyman")]
    ConstrainedNeyman,
}

impl TargetStrategy {
    /// Wire name used in configuration files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Neyman => "Neyman",
            Self::Rsihr => "RSIHR",
            Self::BandBis => "BandBis",
            Self::ZhangRosenberger => "ZR",
            Self::ConstrainedNeyman => "New",
        }
    }

    /// Whether the strategy reads the threshold `TB`.
    #[must_use]
    pub const fn uses_threshold(self) -> bool {
        matches!(self, Self::BandBis | Self::ConstrainedNeyman)
    }
}

impl fmt::Display for TargetStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Neyman" => Ok(Self::Neyman),
            "RSIHR" => Ok(Self::Rsihr),
            "BandBis" => Ok(Self::BandBis),
            "ZR" | "ZhangRosenberger" => Ok(Self::ZhangRosenberger),
            "New" | "ConstrainedNeyman" => Ok(Self::ConstrainedNeyman),
            other => Err(Error::Configuration(format!(
                "unknown target strategy '{other}' (expected one of Neyman, RSIHR, BandBis, ZR, New)"
            ))),
        }
    }
}

/// Mean and standard deviation of one arm's reported outcomes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArmMoments {
    /// Sample mean
    pub mean: f64,
    /// Sample standard deviation
    pub sd: f64,
}

impl ArmMoments {
    /// Create moments from raw values.
    #[must_use]
    pub const fn new(mean: f64, sd: f64) -> Self {
        Self { mean, sd }
    }

    fn guarded_sd(self) -> f64 {
        if self.sd < MIN_SD {
            DEGENERATE_SD
        } else {
            self.sd
        }
    }

    fn guarded_mean(self) -> f64 {
        self.mean.max(MIN_MEAN)
    }
}

impl From<&OutcomeStats> for ArmMoments {
    fn from(stats: &OutcomeStats) -> Self {
        Self::new(stats.mean(), stats.sd())
    }
}

/// Estimator of the target allocation ρ for a fixed strategy and threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationTargetEstimator {
    strategy: TargetStrategy,
    threshold: f64,
}

impl AllocationTargetEstimator {
    /// Create an estimator.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the threshold is not finite, or is not
    /// positive for `BandBis` (it divides the mean difference).
    pub fn new(strategy: TargetStrategy, threshold: f64) -> Result<Self> {
        if !threshold.is_finite() {
            return Err(Error::Configuration(format!(
                "strategy threshold must be finite, got {threshold}"
            )));
        }
        if strategy == TargetStrategy::BandBis && threshold <= 0.0 {
            return Err(Error::Configuration(format!(
                "BandBis requires a positive strategy threshold, got {threshold}"
            )));
        }
        Ok(Self {
            strategy,
            threshold,
        })
    }

    /// Get the strategy.
    #[must_use]
    pub const fn strategy(&self) -> TargetStrategy {
        self.strategy
    }

    /// Get the threshold `TB`.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Estimate ρ, the target proportion on arm A, clamped to `[0.1, 0.9]`.
    ///
    /// # Errors
    ///
    /// Returns `InternalInvariant` if the moments produce a non-finite target
    /// (outcomes are validated finite, so this is always a bug).
    pub fn estimate(&self, a: ArmMoments, b: ArmMoments) -> Result<f64> {
        let sd_a = a.guarded_sd();
        let sd_b = b.guarded_sd();

        let rho = match self.strategy {
            TargetStrategy::Neyman => neyman(sd_a, sd_b),
            TargetStrategy::Rsihr => rsihr(a.guarded_mean(), sd_a, b.guarded_mean(), sd_b),
            TargetStrategy::BandBis => normal_cdf((a.mean - b.mean) / self.threshold),
            TargetStrategy::ZhangRosenberger => {
                let (mean_a, mean_b) = (a.guarded_mean(), b.guarded_mean());
                let r_star = sd_a * mean_b.sqrt() / (sd_b * mean_a.sqrt());
                let favors_better = (a.mean < b.mean && r_star > 1.0)
                    || (a.mean > b.mean && r_star < 1.0);
                if favors_better {
                    rsihr(mean_a, sd_a, mean_b, sd_b)
                } else {
                    0.5
                }
            }
            TargetStrategy::ConstrainedNeyman => {
                let rho_n = neyman(sd_a, sd_b);
                let expected = rho_n.mul_add(a.mean, (1.0 - rho_n) * b.mean);
                if expected <= self.threshold {
                    rho_n
                } else {
                    let rho_tb = (self.threshold - b.mean) / (a.mean - b.mean);
                    if rho_tb.is_finite() && rho_tb > 0.0 {
                        rho_tb
                    } else {
                        rho_n
                    }
                }
            }
        };

        if rho.is_nan() {
            return Err(Error::InternalInvariant(format!(
                "{} target is NaN for moments A={a:?} B={b:?}",
                self.strategy
            )));
        }
        Ok(clamp_probability(rho))
    }
}

/// Estimate ρ from raw moments.
///
/// `target_allocation(25.0, 5.0, 20.0, 3.0, TargetStrategy::Neyman, 0.0)` is `0.625`.
///
/// # Errors
///
/// See [`AllocationTargetEstimator::new`] and [`AllocationTargetEstimator::estimate`].
pub fn target_allocation(
    mean_a: f64,
    sd_a: f64,
    mean_b: f64,
    sd_b: f64,
    strategy: TargetStrategy,
    threshold: f64,
) -> Result<f64> {
    AllocationTargetEstimator::new(strategy, threshold)?
        .estimate(ArmMoments::new(mean_a, sd_a), ArmMoments::new(mean_b, sd_b))
}

fn neyman(sd_a: f64, sd_b: f64) -> f64 {
    sd_a / (sd_a + sd_b)
}

fn rsihr(mean_a: f64, sd_a: f64, mean_b: f64, sd_b: f64) -> f64 {
    let weighted_a = sd_a * mean_b.sqrt();
    let weighted_b = sd_b * mean_a.sqrt();
    weighted_a / (weighted_a + weighted_b)
}

/// Standard normal CDF: Φ(x) = (1 + erf(x/√2)) / 2
#[inline]
#[must_use]
pub fn normal_cdf(x: f64) -> f64 {
    0.5 * (1.0 + libm::erf(x * std::f64::consts::FRAC_1_SQRT_2))
}
