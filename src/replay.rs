//! Replay of a fully known outcome table through the online engine
//!
//! Batch construction is nothing more than `enroll` followed by
//! `record_outcome` for every row, so a replayed trial is decided by exactly
//! the same code path as a live one. Each row carries the outcome the
//! patient would have under either arm; only the assigned arm's value is
//! reported.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::TrialConfiguration;
use crate::ledger::{Arm, Stratum};
use crate::trial::{TrialExport, TrialSession};
use crate::Result;

/// One arriving patient with both potential outcomes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeRow {
    /// Patient id (positive)
    pub patient_id: u64,
    /// Covariate level
    pub stratum: Stratum,
    /// Outcome if assigned arm A
    pub outcome_a: f64,
    /// Outcome if assigned arm B
    pub outcome_b: f64,
}

impl OutcomeRow {
    /// Create a row.
    #[must_use]
    pub fn new(patient_id: u64, stratum: impl Into<Stratum>, outcome_a: f64, outcome_b: f64) -> Self {
        Self {
            patient_id,
            stratum: stratum.into(),
            outcome_a,
            outcome_b,
        }
    }

    /// Outcome under `arm`.
    #[must_use]
    pub const fn outcome(&self, arm: Arm) -> f64 {
        match arm {
            Arm::A => self.outcome_a,
            Arm::B => self.outcome_b,
        }
    }
}

/// Result of a replay.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplayReport {
    /// Final state of the replayed trial
    pub export: TrialExport,
    /// Realized proportion on arm A over all patients
    pub proportion_a: f64,
    /// Realized proportion on arm A after the first `2 * n0` patients
    pub adaptive_proportion_a: Option<f64>,
}

/// Replay `rows` in order.
///
/// Each outcome is reported once `delay` further patients have enrolled
/// (`0` reports it immediately); outcomes still pending when the table ends
/// are reported last.
///
/// # Errors
///
/// Returns the first error raised by the session (invalid configuration,
/// duplicate ids, unknown strata, non-finite outcomes).
#[allow(clippy::cast_precision_loss)]
pub fn replay(config: TrialConfiguration, rows: &[OutcomeRow], delay: usize) -> Result<ReplayReport> {
    let burn_in_len = 2 * config.burn_in_size;
    let mut session = TrialSession::new(config)?;
    let mut pending: VecDeque<(u64, f64)> = VecDeque::with_capacity(delay + 1);
    let mut arms = Vec::with_capacity(rows.len());

    for row in rows {
        let response = session.enroll(row.patient_id, row.stratum.clone())?;
        arms.push(response.arm);
        pending.push_back((row.patient_id, row.outcome(response.arm)));
        while pending.len() > delay {
            if let Some((patient_id, outcome)) = pending.pop_front() {
                session.record_outcome(patient_id, outcome)?;
            }
        }
    }
    for (patient_id, outcome) in pending {
        session.record_outcome(patient_id, outcome)?;
    }

    let share_a = |arms: &[Arm]| -> Option<f64> {
        if arms.is_empty() {
            return None;
        }
        Some(arms.iter().filter(|&&a| a == Arm::A).count() as f64 / arms.len() as f64)
    };
    let report = ReplayReport {
        export: session.export(),
        proportion_a: share_a(&arms).unwrap_or(0.0),
        adaptive_proportion_a: arms.get(burn_in_len..).and_then(share_a),
    };
    debug!(
        patients = rows.len(),
        proportion_a = report.proportion_a,
        "replay finished"
    );
    Ok(report)
}
