//! Thread-safe handle to one trial
//!
//! Every operation runs inside one critical section, so `enroll`,
//! `record_outcome`, and `reconfigure` are serializable and `export` never
//! observes a half-applied change.

use std::sync::{Mutex, MutexGuard};

use super::report::{EnrollmentResponse, OutcomeAck, TrialExport, TrialStatus};
use super::TrialSession;
use crate::config::TrialConfiguration;
use crate::ledger::Stratum;
use crate::{Error, Result};

/// Shared trial: a [`TrialSession`] behind a mutex.
#[derive(Debug)]
pub struct Trial {
    session: Mutex<TrialSession>,
}

impl Trial {
    /// Initialize a trial.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the configuration is invalid.
    pub fn new(config: TrialConfiguration) -> Result<Self> {
        Ok(Self::from_session(TrialSession::new(config)?))
    }

    /// Share an existing session.
    #[must_use]
    pub const fn from_session(session: TrialSession) -> Self {
        Self {
            session: Mutex::new(session),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, TrialSession>> {
        self.session
            .lock()
            .map_err(|_| Error::InternalInvariant("trial lock poisoned by a panicking holder".into()))
    }

    /// See [`TrialSession::enroll`].
    ///
    /// # Errors
    ///
    /// See [`TrialSession::enroll`].
    pub fn enroll(&self, patient_id: u64, stratum: impl Into<Stratum>) -> Result<EnrollmentResponse> {
        self.lock()?.enroll(patient_id, stratum)
    }

    /// See [`TrialSession::record_outcome`].
    ///
    /// # Errors
    ///
    /// See [`TrialSession::record_outcome`].
    pub fn record_outcome(&self, patient_id: u64, outcome: f64) -> Result<OutcomeAck> {
        self.lock()?.record_outcome(patient_id, outcome)
    }

    /// See [`TrialSession::status`].
    ///
    /// # Errors
    ///
    /// Returns `InternalInvariant` if the lock is poisoned.
    pub fn status(&self) -> Result<TrialStatus> {
        Ok(self.lock()?.status())
    }

    /// See [`TrialSession::export`].
    ///
    /// # Errors
    ///
    /// Returns `InternalInvariant` if the lock is poisoned.
    pub fn export(&self) -> Result<TrialExport> {
        Ok(self.lock()?.export())
    }

    /// See [`TrialSession::reconfigure`].
    ///
    /// # Errors
    ///
    /// See [`TrialSession::reconfigure`].
    pub fn reconfigure(&self, config: TrialConfiguration) -> Result<()> {
        self.lock()?.reconfigure(config)
    }

    /// Run `f` with exclusive access to the session.
    ///
    /// # Errors
    ///
    /// Returns `InternalInvariant` if the lock is poisoned, otherwise what `f` returns.
    pub fn with_session<T>(&self, f: impl FnOnce(&mut TrialSession) -> Result<T>) -> Result<T> {
        f(&mut *self.lock()?)
    }
}
