//! Patient Record - one enrolled participant and its allocation audit trail

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique patient identifier (positive integer).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(u64);

impl PatientId {
    /// Wrap a raw id. Positivity is checked at enrollment, not here.
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw id.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u64> for PatientId {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Covariate level used to stratify randomization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Stratum(String);

impl Stratum {
    /// Create a stratum label.
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self(label.into())
    }

    /// Get the label.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Stratum {
    fn from(label: &str) -> Self {
        Self(label.to_string())
    }
}

impl From<String> for Stratum {
    fn from(label: String) -> Self {
        Self(label)
    }
}

impl fmt::Display for Stratum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Treatment arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Arm {
    /// Experimental treatment
    A,
    /// Control
    B,
}

impl Arm {
    /// The opposite arm.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::A => Self::B,
            Self::B => Self::A,
        }
    }
}

impl fmt::Display for Arm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::A => f.write_str("A"),
            Self::B => f.write_str("B"),
        }
    }
}

/// How an assignment was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AllocationMethod {
    /// Balanced permuted sequence of the initial phase.
    #[serde(rename = "burn-in")]
    BurnIn,
    /// Biased coin toward the estimated target allocation.
    #[serde(rename = "adaptive")]
    Adaptive,
    /// Fair coin after burn-in (complete randomization).
    #[serde(rename = "complete")]
    Complete,
    /// Fair coin: fewer than `2 * n0` outcome-reported patients in scope.
    #[serde(rename = "fallback:insufficient-outcomes")]
    InsufficientOutcomes,
    /// Fair coin: an arm has no outcome-bearing patients to estimate from.
    #[serde(rename = "fallback:insufficient-data")]
    InsufficientData,
}

impl AllocationMethod {
    /// Audit tag as written to exports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BurnIn => "burn-in",
            Self::Adaptive => "adaptive",
            Self::Complete => "complete",
            Self::InsufficientOutcomes => "fallback:insufficient-outcomes",
            Self::InsufficientData => "fallback:insufficient-data",
        }
    }

    /// Whether this is one of the balanced fallback assignments.
    #[must_use]
    pub const fn is_fallback(self) -> bool {
        matches!(self, Self::InsufficientOutcomes | Self::InsufficientData)
    }
}

impl fmt::Display for AllocationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Patient Record represents one enrolled participant.
///
/// Stratum, arm, and allocation audit values are fixed at enrollment.
/// Only the outcome changes afterwards.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRecord {
    patient_id: PatientId,
    stratum: Stratum,
    assigned_arm: Arm,
    outcome: Option<f64>,
    enrollment_sequence: u64,
    allocation_probability: f64,
    allocation_method: AllocationMethod,
    target_allocation: Option<f64>,
    enrolled_at: DateTime<Utc>,
    outcome_recorded_at: Option<DateTime<Utc>>,
}

impl PatientRecord {
    /// Create a new patient record with no outcome.
    ///
    /// # Arguments
    ///
    /// * `patient_id` - Unique patient identifier
    /// * `stratum` - Covariate level of the patient
    /// * `assigned_arm` - Arm drawn at enrollment
    /// * `enrollment_sequence` - 1-based position in the ledger
    #[must_use]
    pub fn new(
        patient_id: PatientId,
        stratum: Stratum,
        assigned_arm: Arm,
        enrollment_sequence: u64,
    ) -> Self {
        PatientRecordBuilder::new(patient_id, stratum, assigned_arm, enrollment_sequence).build()
    }

    /// Create a builder for constructing a record with allocation audit fields.
    #[must_use]
    pub fn builder(
        patient_id: PatientId,
        stratum: Stratum,
        assigned_arm: Arm,
        enrollment_sequence: u64,
    ) -> PatientRecordBuilder {
        PatientRecordBuilder::new(patient_id, stratum, assigned_arm, enrollment_sequence)
    }

    /// Get the patient ID.
    #[must_use]
    pub const fn patient_id(&self) -> PatientId {
        self.patient_id
    }

    /// Get the stratum.
    #[must_use]
    pub const fn stratum(&self) -> &Stratum {
        &self.stratum
    }

    /// Get the assigned arm.
    #[must_use]
    pub const fn assigned_arm(&self) -> Arm {
        self.assigned_arm
    }

    /// Get the reported outcome, if any.
    #[must_use]
    pub const fn outcome(&self) -> Option<f64> {
        self.outcome
    }

    /// Whether an outcome has been reported.
    #[must_use]
    pub const fn has_outcome(&self) -> bool {
        self.outcome.is_some()
    }

    /// Get the 1-based enrollment sequence number.
    #[must_use]
    pub const fn enrollment_sequence(&self) -> u64 {
        self.enrollment_sequence
    }

    /// Probability of arm A used for the draw.
    #[must_use]
    pub const fn allocation_probability(&self) -> f64 {
        self.allocation_probability
    }

    /// How the assignment was decided.
    #[must_use]
    pub const fn allocation_method(&self) -> AllocationMethod {
        self.allocation_method
    }

    /// Target allocation in effect for the decision, if one was estimated.
    #[must_use]
    pub const fn target_allocation(&self) -> Option<f64> {
        self.target_allocation
    }

    /// Get the enrollment timestamp.
    #[must_use]
    pub const fn enrolled_at(&self) -> DateTime<Utc> {
        self.enrolled_at
    }

    /// Get the timestamp of the latest outcome report.
    #[must_use]
    pub const fn outcome_recorded_at(&self) -> Option<DateTime<Utc>> {
        self.outcome_recorded_at
    }

    /// Set the outcome, returning the value it replaced.
    pub(crate) fn set_outcome(&mut self, value: f64) -> Option<f64> {
        self.outcome_recorded_at = Some(Utc::now());
        self.outcome.replace(value)
    }
}

/// Builder for `PatientRecord`.
#[derive(Debug)]
pub struct PatientRecordBuilder {
    patient_id: PatientId,
    stratum: Stratum,
    assigned_arm: Arm,
    enrollment_sequence: u64,
    allocation_probability: f64,
    allocation_method: AllocationMethod,
    target_allocation: Option<f64>,
    enrolled_at: DateTime<Utc>,
}

impl PatientRecordBuilder {
    /// Create a new builder with required fields.
    ///
    /// Defaults to a burn-in decision at probability 0.5.
    #[must_use]
    pub fn new(
        patient_id: PatientId,
        stratum: Stratum,
        assigned_arm: Arm,
        enrollment_sequence: u64,
    ) -> Self {
        Self {
            patient_id,
            stratum,
            assigned_arm,
            enrollment_sequence,
            allocation_probability: 0.5,
            allocation_method: AllocationMethod::BurnIn,
            target_allocation: None,
            enrolled_at: Utc::now(),
        }
    }

    /// Set the probability of arm A used for the draw.
    #[must_use]
    pub const fn allocation_probability(mut self, probability: f64) -> Self {
        self.allocation_probability = probability;
        self
    }

    /// Set the allocation method tag.
    #[must_use]
    pub const fn allocation_method(mut self, method: AllocationMethod) -> Self {
        self.allocation_method = method;
        self
    }

    /// Set the target allocation used for the decision.
    #[must_use]
    pub const fn target_allocation(mut self, target: Option<f64>) -> Self {
        self.target_allocation = target;
        self
    }

    /// Set a custom enrollment timestamp (useful for deserialization/testing).
    #[must_use]
    pub const fn enrolled_at(mut self, enrolled_at: DateTime<Utc>) -> Self {
        self.enrolled_at = enrolled_at;
        self
    }

    /// Build the `PatientRecord`.
    #[must_use]
    pub fn build(self) -> PatientRecord {
        PatientRecord {
            patient_id: self.patient_id,
            stratum: self.stratum,
            assigned_arm: self.assigned_arm,
            outcome: None,
            enrollment_sequence: self.enrollment_sequence,
            allocation_probability: self.allocation_probability,
            allocation_method: self.allocation_method,
            target_allocation: self.target_allocation,
            enrolled_at: self.enrolled_at,
            outcome_recorded_at: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_record_new() {
        let record = PatientRecord::new(PatientId::new(7), Stratum::from("low"), Arm::A, 1);
        assert_eq!(record.patient_id(), PatientId::new(7));
        assert_eq!(record.stratum().as_str(), "low");
        assert_eq!(record.assigned_arm(), Arm::A);
        assert!(!record.has_outcome());
        assert_eq!(record.allocation_method(), AllocationMethod::BurnIn);
        assert!((record.allocation_probability() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_set_outcome_overwrites() {
        let mut record = PatientRecord::new(PatientId::new(1), Stratum::from("s"), Arm::B, 1);
        assert_eq!(record.set_outcome(2.0), None);
        assert_eq!(record.set_outcome(3.5), Some(2.0));
        assert_eq!(record.outcome(), Some(3.5));
        assert!(record.outcome_recorded_at().is_some());
    }

    #[test]
    fn test_method_tags() {
        let json = serde_json::to_string(&AllocationMethod::InsufficientOutcomes).unwrap();
        assert_eq!(json, "\"fallback:insufficient-outcomes\"");
        assert!(AllocationMethod::InsufficientData.is_fallback());
        assert!(!AllocationMethod::Adaptive.is_fallback());
        assert_eq!(Arm::A.other(), Arm::B);
    }
}
