//! Patient ledger
//!
//! The ledger is the authoritative record of a trial: every enrollment
//! decision reads it and every outcome report writes to it.
//!
//! ## Schema Overview
//!
//! ```text
//! TrialLedger (1) ──< PatientRecord (N)   [enrollment order, keyed by PatientId]
//!        │
//!        └── ScopeSummary (derived per scope: whole trial or one stratum)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use carandom::ledger::{Arm, PatientId, PatientRecord, Scope, Stratum, TrialLedger};
//!
//! let mut ledger = TrialLedger::new();
//! let record = PatientRecord::new(PatientId::new(1), Stratum::from("low"), Arm::A, 1);
//! ledger.append(record)?;
//! ledger.record_outcome(PatientId::new(1), 12.5)?;
//!
//! let summary = ledger.summary(Scope::Trial);
//! assert_eq!(summary.reported(), 1);
//! # Ok::<(), carandom::Error>(())
//! ```

mod patient_record;
mod store;
mod summary;

pub use patient_record::{
    AllocationMethod, Arm, PatientId, PatientRecord, PatientRecordBuilder, Stratum,
};
pub use store::{Scope, TrialLedger};
pub use summary::{OutcomeStats, ScopeSummary};
