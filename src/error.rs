//! Error types for carandom
//!
//! Toyota Way: Clear error messages with actionable guidance (Respect for People)
//!
//! Validation and state errors are expected outcomes of the enrollment API and
//! are returned to the caller. Configuration errors surface when a session is
//! built. Internal invariant errors abort one operation and always indicate a bug.

use thiserror::Error;

use crate::ledger::PatientId;

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed input (id, stratum, or outcome shape)
    Validation,
    /// Input conflicts with the ledger (duplicate or unknown id)
    State,
    /// Trial configuration rejected
    Configuration,
    /// Degenerate math reached an unguarded branch
    Internal,
}

/// carandom error types
#[derive(Error, Debug)]
pub enum Error {
    /// Patient ids must be positive integers
    #[error("Invalid patient id {0}: patient ids must be positive integers")]
    InvalidPatientId(u64),

    /// Stratum level not part of the trial configuration
    #[error("Invalid stratum '{0}': level is not configured for this trial")]
    InvalidStratum(String),

    /// Outcome value cannot be used for estimation
    #[error("Invalid outcome {value} for patient {patient_id}: outcomes must be finite")]
    InvalidOutcome {
        /// Patient the outcome was reported for
        patient_id: PatientId,
        /// Rejected value
        value: f64,
    },

    /// Patient already enrolled
    #[error("Duplicate patient id {0}: patient is already enrolled")]
    DuplicateId(PatientId),

    /// Patient not present in the ledger
    #[error("Unknown patient id {0}: patient was never enrolled")]
    UnknownId(PatientId),

    /// Trial configuration rejected
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Internal invariant violated (critical bug)
    #[error("Internal invariant violated: {0}\nThe ledger was not modified. Please report this issue.")]
    InternalInvariant(String),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Classify this error.
    ///
    /// JSON and IO errors only arise while loading a configuration, so they
    /// classify as [`ErrorKind::Configuration`].
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidPatientId(_) | Self::InvalidStratum(_) | Self::InvalidOutcome { .. } => {
                ErrorKind::Validation
            }
            Self::DuplicateId(_) | Self::UnknownId(_) => ErrorKind::State,
            Self::Configuration(_) | Self::Json(_) | Self::Io(_) => ErrorKind::Configuration,
            Self::InternalInvariant(_) => ErrorKind::Internal,
        }
    }

    /// Whether the caller can recover by correcting its request.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self.kind(), ErrorKind::Validation | ErrorKind::State)
    }
}
