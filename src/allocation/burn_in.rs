//! Balanced burn-in sequence
//!
//! The initial `2 * n0` assignments of a scope are an exchangeable sequence
//! of exactly `n0` A labels and `n0` B labels.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::ledger::Arm;

/// Generator for the balanced burn-in phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BurnInSequencer {
    per_arm: usize,
}

impl BurnInSequencer {
    /// Create a sequencer with `per_arm` (n0) assignments to each arm.
    #[must_use]
    pub const fn new(per_arm: usize) -> Self {
        Self { per_arm }
    }

    /// Total burn-in length (`2 * n0`).
    #[must_use]
    pub const fn len(&self) -> usize {
        2 * self.per_arm
    }

    /// Whether the burn-in phase is empty.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.per_arm == 0
    }

    /// Uniformly random permutation of `n0` A and `n0` B labels.
    pub fn permutation<R: Rng + ?Sized>(&self, rng: &mut R) -> Vec<Arm> {
        let mut labels: Vec<Arm> = std::iter::repeat(Arm::A)
            .take(self.per_arm)
            .chain(std::iter::repeat(Arm::B).take(self.per_arm))
            .collect();
        labels.shuffle(rng);
        labels
    }

    /// Next label of the sequence given how many of each arm were already drawn.
    ///
    /// Draws uniformly among the remaining slots, which yields the same
    /// marginal sequence as consuming [`Self::permutation`] one label at a time.
    /// Returns `None` once both arms are exhausted.
    pub fn next_arm<R: Rng + ?Sized>(
        &self,
        drawn_a: usize,
        drawn_b: usize,
        rng: &mut R,
    ) -> Option<Arm> {
        let remaining_a = self.per_arm.saturating_sub(drawn_a);
        let remaining_b = self.per_arm.saturating_sub(drawn_b);
        match (remaining_a, remaining_b) {
            (0, 0) => None,
            (0, _) => Some(Arm::B),
            (_, 0) => Some(Arm::A),
            (a, b) => {
                if rng.gen_range(0..a + b) < a {
                    Some(Arm::A)
                } else {
                    Some(Arm::B)
                }
            }
        }
    }
}
