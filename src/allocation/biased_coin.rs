//! Doubly-adaptive biased coin (Hu & Zhang 2004)
//!
//! Pulls the realized proportion `x` toward the target `y`: the larger the
//! exponent γ, the harder the correction. γ = 0 is a fixed coin with
//! probability `y` (no feedback).

use crate::{Error, Result};

/// Proportions closer than this to 0 or 1 are treated as boundary values.
pub const BOUNDARY_EPSILON: f64 = 1e-10;

/// Probability of assigning arm A given current proportion `x`, target `y`, exponent `gamma`.
///
/// # Errors
///
/// Returns `InternalInvariant` if the transform degenerates to 0/0 or a
/// non-finite value.
///
/// # Examples
///
/// ```rust
/// use carandom::allocation::biased_coin;
///
/// let p = biased_coin(0.5, 0.5, 2.0)?;
/// assert!((p - 0.5).abs() < 1e-12);
/// # Ok::<(), carandom::Error>(())
/// ```
pub fn biased_coin(x: f64, y: f64, gamma: f64) -> Result<f64> {
    weighted_biased_coin(x, y, y, gamma)
}

/// Biased coin with a separate prefactor `weight` on arm A.
///
/// `t1 = weight * (y / x)^γ`, `t2 = (1 - weight) * ((1 - y) / (1 - x))^γ`,
/// probability `t1 / (t1 + t2)`. With `weight == y` this is [`biased_coin`];
/// the covariate-adjusted design passes the arriving stratum's own target.
///
/// # Errors
///
/// Returns `InternalInvariant` if both terms vanish (0/0). Overflowing
/// terms saturate to 0 or 1.
pub fn weighted_biased_coin(x: f64, y: f64, weight: f64, gamma: f64) -> Result<f64> {
    if x < BOUNDARY_EPSILON {
        return Ok(1.0);
    }
    if x > 1.0 - BOUNDARY_EPSILON {
        return Ok(0.0);
    }

    // p = t1 / (t1 + t2) = 1 / (1 + t2 / t1), evaluated on log terms so a
    // large gamma saturates toward 0 or 1 instead of overflowing.
    let ln_t1 = ln_term(weight, y / x, gamma);
    let ln_t2 = ln_term(1.0 - weight, (1.0 - y) / (1.0 - x), gamma);
    let ln_ratio = ln_t2 - ln_t1;
    if ln_ratio.is_nan() {
        return Err(Error::InternalInvariant(format!(
            "biased coin terms ln t1={ln_t1}, ln t2={ln_t2} for x={x}, y={y}, weight={weight}, gamma={gamma}"
        )));
    }

    let p = 1.0 / (1.0 + ln_ratio.exp());
    if p.is_finite() {
        Ok(p)
    } else {
        Err(Error::InternalInvariant(format!(
            "biased coin probability {p} for x={x}, y={y}, weight={weight}, gamma={gamma}"
        )))
    }
}

/// `ln(weight * ratio^gamma)`; gamma = 0 drops the ratio entirely.
fn ln_term(weight: f64, ratio: f64, gamma: f64) -> f64 {
    if gamma > 0.0 {
        gamma.mul_add(ratio.ln(), weight.ln())
    } else {
        weight.ln()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balanced_fixed_point() {
        for gamma in [0.0, 0.5, 1.0, 2.0, 8.0] {
            let p = biased_coin(0.5, 0.5, gamma).unwrap();
            assert!((p - 0.5).abs() < 1e-12, "gamma={gamma}");
        }
    }

    #[test]
    fn test_gamma_zero_is_fixed_coin() {
        let p = biased_coin(0.2, 0.7, 0.0).unwrap();
        assert!((p - 0.7).abs() < 1e-12);
    }

    #[test]
    fn test_boundaries_force_correction() {
        assert!((biased_coin(0.0, 0.3, 2.0).unwrap() - 1.0).abs() < f64::EPSILON);
        assert!(biased_coin(1.0, 0.3, 2.0).unwrap().abs() < f64::EPSILON);
    }

    #[test]
    fn test_corrects_toward_target() {
        // under-allocated on A -> probability above the target
        assert!(biased_coin(0.4, 0.6, 2.0).unwrap() > 0.6);
        // over-allocated on A -> probability below the target
        assert!(biased_coin(0.8, 0.6, 2.0).unwrap() < 0.6);
    }

    #[test]
    fn test_degenerate_denominator_is_internal_error() {
        // weight = 0 and y = 1 -> t1 = 0 and t2 = 0
        let err = weighted_biased_coin(0.5, 1.0, 0.0, 2.0).unwrap_err();
        assert!(matches!(err, Error::InternalInvariant(_)));
    }

    #[test]
    fn test_weighted_reduces_to_plain() {
        let plain = biased_coin(0.45, 0.62, 2.0).unwrap();
        let weighted = weighted_biased_coin(0.45, 0.62, 0.62, 2.0).unwrap();
        assert!((plain - weighted).abs() < 1e-15);
    }

    #[test]
    fn test_weighted_prefactor_differs_from_target() {
        let (x, y, weight, gamma) = (0.4_f64, 0.6_f64, 0.3_f64, 2.0_f64);
        let t1 = weight * (y / x).powf(gamma);
        let t2 = (1.0 - weight) * ((1.0 - y) / (1.0 - x)).powf(gamma);
        let expected = t1 / (t1 + t2);

        let p = weighted_biased_coin(x, y, weight, gamma).unwrap();
        assert!((p - expected).abs() < 1e-12);
        assert!((p - 0.684_51).abs() < 1e-4);
        assert!((p - biased_coin(x, y, gamma).unwrap()).abs() > 0.1);
    }

    #[test]
    fn test_large_gamma_saturates() {
        let p = biased_coin(0.3, 0.9, 800.0).unwrap();
        assert!((p - 1.0).abs() < 1e-12);
        let p = biased_coin(0.9, 0.3, 800.0).unwrap();
        assert!(p.abs() < 1e-12);
        let p = weighted_biased_coin(0.3, 0.9, 0.2, 1e6).unwrap();
        assert!((p - 1.0).abs() < 1e-12);
    }
}
