//! Derived per-scope statistics
//!
//! Nothing here is persisted: summaries are recomputed from the ledger on
//! every decision so they always reflect outcomes reported since the
//! previous enrollment.

use serde::Serialize;

use super::{Arm, PatientRecord};

/// Running outcome statistics for one arm (Welford's algorithm).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct OutcomeStats {
    count: usize,
    mean: f64,
    m2: f64,
}

impl OutcomeStats {
    /// Add one observation.
    #[allow(clippy::cast_precision_loss)]
    pub fn push(&mut self, value: f64) {
        self.count += 1;
        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// Number of outcome-bearing patients.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.count
    }

    /// Sample mean (0 when empty).
    #[must_use]
    pub const fn mean(&self) -> f64 {
        self.mean
    }

    /// Sample standard deviation with `n - 1` denominator.
    ///
    /// A single observation has standard deviation 0.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn sd(&self) -> f64 {
        if self.count < 2 {
            return 0.0;
        }
        (self.m2 / (self.count - 1) as f64).sqrt()
    }
}

impl FromIterator<f64> for OutcomeStats {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut stats = Self::default();
        for value in iter {
            stats.push(value);
        }
        stats
    }
}

/// Enrollment and outcome state of one scope (whole trial or one stratum).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ScopeSummary {
    enrolled_a: usize,
    enrolled_b: usize,
    outcomes_a: OutcomeStats,
    outcomes_b: OutcomeStats,
}

impl ScopeSummary {
    /// Summarize a set of patient records.
    pub fn from_records<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a PatientRecord>,
    {
        let mut summary = Self::default();
        for record in records {
            summary.observe(record);
        }
        summary
    }

    fn observe(&mut self, record: &PatientRecord) {
        match record.assigned_arm() {
            Arm::A => self.enrolled_a += 1,
            Arm::B => self.enrolled_b += 1,
        }
        if let Some(value) = record.outcome() {
            match record.assigned_arm() {
                Arm::A => self.outcomes_a.push(value),
                Arm::B => self.outcomes_b.push(value),
            }
        }
    }

    /// Patients enrolled on `arm`.
    #[must_use]
    pub const fn enrolled_on(&self, arm: Arm) -> usize {
        match arm {
            Arm::A => self.enrolled_a,
            Arm::B => self.enrolled_b,
        }
    }

    /// Patients enrolled in scope.
    #[must_use]
    pub const fn enrolled(&self) -> usize {
        self.enrolled_a + self.enrolled_b
    }

    /// Outcome statistics for `arm`.
    #[must_use]
    pub const fn outcomes(&self, arm: Arm) -> &OutcomeStats {
        match arm {
            Arm::A => &self.outcomes_a,
            Arm::B => &self.outcomes_b,
        }
    }

    /// Patients in scope with a reported outcome.
    #[must_use]
    pub const fn reported(&self) -> usize {
        self.outcomes_a.count + self.outcomes_b.count
    }

    /// Whether both arms carry at least one outcome.
    #[must_use]
    pub const fn is_estimable(&self) -> bool {
        self.outcomes_a.count > 0 && self.outcomes_b.count > 0
    }

    /// Empirical proportion of enrolled patients on arm A.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn proportion_a(&self) -> Option<f64> {
        match self.enrolled() {
            0 => None,
            n => Some(self.enrolled_a as f64 / n as f64),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{PatientId, Stratum};

    fn record(id: u64, arm: Arm, outcome: Option<f64>) -> PatientRecord {
        let mut record = PatientRecord::new(PatientId::new(id), Stratum::from("s"), arm, id);
        if let Some(value) = outcome {
            record.set_outcome(value);
        }
        record
    }

    #[test]
    fn test_outcome_stats_sample_sd() {
        let stats: OutcomeStats = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0].into_iter().collect();
        assert_eq!(stats.count(), 8);
        assert!((stats.mean() - 5.0).abs() < 1e-12);
        // population sd is 2, sample sd is sqrt(32/7)
        assert!((stats.sd() - (32.0f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_single_observation_sd_is_zero() {
        let stats: OutcomeStats = std::iter::once(3.0).collect();
        assert!(stats.sd().abs() < f64::EPSILON);
    }

    #[test]
    fn test_scope_summary_counts() {
        let records = vec![
            record(1, Arm::A, Some(1.0)),
            record(2, Arm::A, None),
            record(3, Arm::B, Some(2.0)),
        ];
        let summary = ScopeSummary::from_records(&records);
        assert_eq!(summary.enrolled(), 3);
        assert_eq!(summary.enrolled_on(Arm::A), 2);
        assert_eq!(summary.reported(), 2);
        assert!(summary.is_estimable());
        let x = summary.proportion_a().unwrap();
        assert!((x - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_summary() {
        let summary = ScopeSummary::default();
        assert_eq!(summary.proportion_a(), None);
        assert!(!summary.is_estimable());
    }
}
