//! Trial Ledger - in-memory storage for enrolled patients
//!
//! This module provides the single source of truth for allocation decisions.

use rustc_hash::FxHashMap;

use super::{PatientId, PatientRecord, ScopeSummary, Stratum};
use crate::{Error, Result};

/// Ledger subset over which a sequencer computes its state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    /// Every enrolled patient
    Trial,
    /// Patients of one stratum
    Stratum(&'a Stratum),
}

/// In-memory ledger of enrolled patients.
///
/// ## Design
///
/// Records are kept in enrollment order in a vector, with an `FxHashMap`
/// index for O(1) lookup by patient id. Nothing is ever evicted: target
/// estimation depends on the entire outcome history.
///
/// ## Poka-Yoke
///
/// `append` validates before it mutates, so a rejected record leaves the
/// ledger untouched.
#[derive(Debug, Default, Clone)]
pub struct TrialLedger {
    records: Vec<PatientRecord>,
    index: FxHashMap<PatientId, usize>,
}

impl TrialLedger {
    /// Create a new empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Check if no patient is enrolled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of enrolled patients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether `patient_id` is enrolled.
    #[must_use]
    pub fn contains(&self, patient_id: PatientId) -> bool {
        self.index.contains_key(&patient_id)
    }

    /// Sequence number the next appended record must carry.
    #[must_use]
    pub fn next_sequence(&self) -> u64 {
        self.records.last().map_or(1, |r| r.enrollment_sequence() + 1)
    }

    /// Append a record.
    ///
    /// # Errors
    ///
    /// Returns `DuplicateId` if the patient is already enrolled, or
    /// `InternalInvariant` if the record does not carry the next sequence number.
    pub fn append(&mut self, record: PatientRecord) -> Result<()> {
        if self.contains(record.patient_id()) {
            return Err(Error::DuplicateId(record.patient_id()));
        }
        let expected = self.next_sequence();
        if record.enrollment_sequence() != expected {
            return Err(Error::InternalInvariant(format!(
                "enrollment sequence {} appended where {expected} was expected",
                record.enrollment_sequence()
            )));
        }
        self.index.insert(record.patient_id(), self.records.len());
        self.records.push(record);
        Ok(())
    }

    /// Get a record by patient ID.
    #[must_use]
    pub fn get(&self, patient_id: PatientId) -> Option<&PatientRecord> {
        self.index.get(&patient_id).map(|&i| &self.records[i])
    }

    /// Set or overwrite a patient's outcome, returning the replaced value.
    ///
    /// # Errors
    ///
    /// Returns `UnknownId` if the patient was never enrolled.
    pub fn record_outcome(&mut self, patient_id: PatientId, value: f64) -> Result<Option<f64>> {
        let &i = self
            .index
            .get(&patient_id)
            .ok_or(Error::UnknownId(patient_id))?;
        Ok(self.records[i].set_outcome(value))
    }

    /// All records in enrollment order.
    #[must_use]
    pub fn records(&self) -> &[PatientRecord] {
        &self.records
    }

    /// Records belonging to `scope`, in enrollment order.
    pub fn scoped<'a>(&'a self, scope: Scope<'a>) -> impl Iterator<Item = &'a PatientRecord> + 'a {
        self.records.iter().filter(move |r| match scope {
            Scope::Trial => true,
            Scope::Stratum(stratum) => r.stratum() == stratum,
        })
    }

    /// Summarize enrollment and outcome state of `scope`.
    #[must_use]
    pub fn summary(&self, scope: Scope<'_>) -> ScopeSummary {
        ScopeSummary::from_records(self.scoped(scope))
    }

    /// Summaries for every stratum in `strata`, in the given order.
    ///
    /// Single pass over the ledger; strata without patients get an empty summary.
    #[must_use]
    pub fn stratum_summaries<'s>(&self, strata: &'s [Stratum]) -> Vec<(&'s Stratum, ScopeSummary)> {
        let mut grouped: FxHashMap<&Stratum, Vec<&PatientRecord>> = FxHashMap::default();
        for record in &self.records {
            grouped.entry(record.stratum()).or_default().push(record);
        }
        strata
            .iter()
            .map(|stratum| {
                let summary = grouped
                    .get(stratum)
                    .map(|records| ScopeSummary::from_records(records.iter().copied()))
                    .unwrap_or_default();
                (stratum, summary)
            })
            .collect()
    }

    /// Remove every record.
    pub fn clear(&mut self) {
        self.records.clear();
        self.index.clear();
    }
}
