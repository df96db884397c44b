//! Property-based tests for carandom
//!
//! Properties checked:
//! - Test mathematical invariants
//! - Test ledger integrity properties
//! - Run with ProptestConfig::with_cases(100)

use carandom::allocation::{biased_coin, target_allocation, BurnInSequencer, TargetStrategy};
use carandom::config::{RandomizationMethod, TrialConfiguration};
use carandom::ledger::{AllocationMethod, Arm};
use carandom::trial::TrialSession;
use carandom::Error;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

// ============================================================================
// Property Test Generators (Strategies)
// ============================================================================

fn arb_strategy() -> impl Strategy<Value = TargetStrategy> {
    prop_oneof![
        Just(TargetStrategy::Neyman),
        Just(TargetStrategy::Rsihr),
        Just(TargetStrategy::BandBis),
        Just(TargetStrategy::ZhangRosenberger),
        Just(TargetStrategy::ConstrainedNeyman),
    ]
}

fn arb_method() -> impl Strategy<Value = RandomizationMethod> {
    prop_oneof![
        Just(RandomizationMethod::Complete),
        Just(RandomizationMethod::Cara),
        Just(RandomizationMethod::Cadbcd),
        Just(RandomizationMethod::Rar),
    ]
}

fn session(method: RandomizationMethod, n0: usize, seed: u64) -> TrialSession {
    let config = TrialConfiguration::builder("prop")
        .burn_in_size(n0)
        .randomization_method(method)
        .strata(["s1", "s2", "s3"])
        .seed(seed)
        .build()
        .unwrap();
    TrialSession::new(config).unwrap()
}

// ============================================================================
// Property Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // ========================================================================
    // Allocation Primitive Properties
    // ========================================================================

    /// Property: burn-in permutation holds exactly n0 of each label
    #[test]
    fn prop_burn_in_permutation_balanced(n0 in 1usize..200, seed in any::<u64>()) {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let labels = BurnInSequencer::new(n0).permutation(&mut rng);
        prop_assert_eq!(labels.len(), 2 * n0);
        prop_assert_eq!(labels.iter().filter(|&&a| a == Arm::A).count(), n0);
    }

    /// Property: target allocation stays within [0.1, 0.9]
    #[test]
    fn prop_target_within_bounds(
        mean_a in -100.0f64..100.0,
        sd_a in 0.0f64..50.0,
        mean_b in -100.0f64..100.0,
        sd_b in 0.0f64..50.0,
        threshold in 0.01f64..100.0,
        strategy in arb_strategy(),
    ) {
        let rho = target_allocation(mean_a, sd_a, mean_b, sd_b, strategy, threshold).unwrap();
        prop_assert!((0.1..=0.9).contains(&rho), "rho = {}", rho);
    }

    /// Property: balanced proportion on a balanced target is a fair coin
    #[test]
    fn prop_biased_coin_fixed_point(gamma in 0.0f64..10.0) {
        let p = biased_coin(0.5, 0.5, gamma).unwrap();
        prop_assert!((p - 0.5).abs() < 1e-12);
    }

    /// Property: biased coin is monotonically increasing in the target
    #[test]
    fn prop_biased_coin_monotone_in_target(
        x in 0.05f64..0.95,
        y1 in 0.01f64..0.99,
        y2 in 0.01f64..0.99,
        gamma in 0.1f64..5.0,
    ) {
        let (lo, hi) = if y1 <= y2 { (y1, y2) } else { (y2, y1) };
        let p_lo = biased_coin(x, lo, gamma).unwrap();
        let p_hi = biased_coin(x, hi, gamma).unwrap();
        prop_assert!(p_lo <= p_hi + 1e-12, "p({}) = {} > p({}) = {}", lo, p_lo, hi, p_hi);
    }

    /// Property: biased coin returns a probability
    #[test]
    fn prop_biased_coin_is_probability(
        x in 0.0f64..=1.0,
        y in 0.1f64..=0.9,
        gamma in 0.0f64..10.0,
    ) {
        let p = biased_coin(x, y, gamma).unwrap();
        prop_assert!((0.0..=1.0).contains(&p));
    }

    // ========================================================================
    // Enrollment Properties
    // ========================================================================

    /// Property: the first 2 * n0 patients of a global scope are exactly balanced
    #[test]
    fn prop_global_burn_in_balanced(
        n0 in 1usize..30,
        seed in any::<u64>(),
        method in prop_oneof![
            Just(RandomizationMethod::Complete),
            Just(RandomizationMethod::Cadbcd),
            Just(RandomizationMethod::Rar),
        ],
    ) {
        let mut session = session(method, n0, seed);
        let strata = ["s1", "s2", "s3"];
        let mut on_a = 0;
        for id in 1..=(2 * n0 as u64) {
            let response = session.enroll(id, strata[(id % 3) as usize]).unwrap();
            prop_assert_eq!(response.method, AllocationMethod::BurnIn);
            if response.arm == Arm::A {
                on_a += 1;
            }
        }
        prop_assert_eq!(on_a, n0);
    }

    /// Property: every CARA stratum runs its own balanced burn-in
    #[test]
    fn prop_stratum_burn_in_balanced(
        n0 in 1usize..10,
        seed in any::<u64>(),
        picks in proptest::collection::vec(0usize..3, 60),
    ) {
        let mut session = session(RandomizationMethod::Cara, n0, seed);
        let strata = ["s1", "s2", "s3"];
        let mut seen = [0usize; 3];
        let mut on_a = [0usize; 3];
        for (id, &pick) in (1u64..).zip(&picks) {
            let response = session.enroll(id, strata[pick]).unwrap();
            if seen[pick] < 2 * n0 {
                prop_assert_eq!(response.method, AllocationMethod::BurnIn);
                if response.arm == Arm::A {
                    on_a[pick] += 1;
                }
            }
            seen[pick] += 1;
        }
        for s in 0..3 {
            if seen[s] >= 2 * n0 {
                prop_assert_eq!(on_a[s], n0);
            }
        }
    }

    /// Property: adaptive probabilities stay within [0.1, 0.9]
    #[test]
    fn prop_adaptive_probability_bounded(
        seed in any::<u64>(),
        method in arb_method(),
        outcomes in proptest::collection::vec(-50.0f64..50.0, 60),
    ) {
        let mut session = session(method, 3, seed);
        let strata = ["s1", "s2", "s3"];
        for (id, &outcome) in (1u64..).zip(&outcomes) {
            let response = session.enroll(id, strata[(id % 3) as usize]).unwrap();
            if response.method == AllocationMethod::Adaptive {
                prop_assert!((0.1..=0.9).contains(&response.probability));
            }
            session.record_outcome(id, outcome).unwrap();
        }
    }

    /// Property: a rejected duplicate enrollment never changes the ledger
    #[test]
    fn prop_duplicate_rejected_without_mutation(
        seed in any::<u64>(),
        method in arb_method(),
        n in 1u64..40,
        dup in 1u64..40,
    ) {
        let mut session = session(method, 2, seed);
        for id in 1..=n {
            session.enroll(id, "s1").unwrap();
        }
        let dup = dup.min(n);
        let before = session.export().patients;
        let err = session.enroll(dup, "s2").unwrap_err();
        prop_assert!(matches!(err, Error::DuplicateId(_)));
        prop_assert_eq!(session.export().patients, before);
    }
}
