//! Responses and point-in-time reports of a trial session

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::TrialConfiguration;
use crate::ledger::{AllocationMethod, Arm, PatientId, PatientRecord, ScopeSummary, Stratum};
use crate::sequencer::Phase;
use crate::Result;

/// Result of a successful enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnrollmentResponse {
    /// Enrolled patient
    pub patient_id: PatientId,
    /// Arm drawn
    pub arm: Arm,
    /// Probability of arm A used for the draw
    pub probability: f64,
    /// How the probability was obtained
    pub method: AllocationMethod,
    /// Target allocation in effect, when one was estimated
    pub target: Option<f64>,
    /// 1-based enrollment sequence number
    pub sequence_number: u64,
}

/// Acknowledgement of an outcome report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutcomeAck {
    /// Patient the outcome was recorded for
    pub patient_id: PatientId,
    /// Value replaced by this report, if the outcome was already set
    pub overwritten: Option<f64>,
}

/// Per-arm counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ArmCounts {
    /// Count on arm A
    pub a: usize,
    /// Count on arm B
    pub b: usize,
}

impl ArmCounts {
    /// Total over both arms.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.a + self.b
    }

    pub(crate) fn enrolled(summary: &ScopeSummary) -> Self {
        Self {
            a: summary.enrolled_on(Arm::A),
            b: summary.enrolled_on(Arm::B),
        }
    }

    pub(crate) fn reported(summary: &ScopeSummary) -> Self {
        Self {
            a: summary.outcomes(Arm::A).count(),
            b: summary.outcomes(Arm::B).count(),
        }
    }
}

/// Status of one stratum.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StratumStatus {
    /// Covariate level
    pub stratum: Stratum,
    /// Patients enrolled per arm
    pub enrolled: ArmCounts,
    /// Patients with a reported outcome per arm
    pub reported: ArmCounts,
    /// Phase of the scope governing this stratum's decisions
    pub phase: Phase,
}

/// Configuration and counts of a trial.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialStatus {
    /// Active configuration
    pub config: TrialConfiguration,
    /// Effective seed of the random stream
    pub seed: u64,
    /// Patients enrolled per arm over the whole trial
    pub enrolled: ArmCounts,
    /// Patients with a reported outcome per arm over the whole trial
    pub reported: ArmCounts,
    /// Per-stratum breakdown in configuration order
    pub strata: Vec<StratumStatus>,
}

/// Point-in-time copy of a trial for the reporting layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrialExport {
    /// Active configuration
    pub config: TrialConfiguration,
    /// Effective seed of the random stream
    pub seed: u64,
    /// Patients in enrollment order
    pub patients: Vec<PatientRecord>,
    /// When the copy was taken
    pub exported_at: DateTime<Utc>,
}

impl TrialExport {
    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns `Json` if serialization fails.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Proportion of exported patients on arm A.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn proportion_a(&self) -> Option<f64> {
        if self.patients.is_empty() {
            return None;
        }
        let on_a = self
            .patients
            .iter()
            .filter(|p| p.assigned_arm() == Arm::A)
            .count();
        Some(on_a as f64 / self.patients.len() as f64)
    }
}
