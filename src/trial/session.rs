//! Trial session - one trial's configuration, ledger, and random stream
//!
//! A session is a plain owned value: every mutation takes `&mut self`, so a
//! decision always observes the ledger exactly as the previous operation
//! left it. Wrap it in [`crate::trial::Trial`] to share it across threads.

use chrono::Utc;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use super::report::{ArmCounts, EnrollmentResponse, OutcomeAck, StratumStatus, TrialExport, TrialStatus};
use crate::allocation::{PROBABILITY_CEILING, PROBABILITY_FLOOR};
use crate::config::TrialConfiguration;
use crate::ledger::{AllocationMethod, PatientId, PatientRecord, Scope, Stratum, TrialLedger};
use crate::sequencer::{policy_for, AllocationPolicy, Phase, TrialRng};
use crate::{Error, Result};

/// One trial's engine state.
#[derive(Debug)]
pub struct TrialSession {
    config: TrialConfiguration,
    seed: u64,
    ledger: TrialLedger,
    policy: Box<dyn AllocationPolicy>,
    rng: TrialRng,
}

impl TrialSession {
    /// Initialize a trial with an empty ledger.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the configuration is invalid.
    pub fn new(config: TrialConfiguration) -> Result<Self> {
        config.validate()?;
        let policy = policy_for(&config)?;
        let estimator = config.estimator()?;
        if !estimator.strategy().uses_threshold() && estimator.threshold().abs() > 0.0 {
            warn!(
                strategy = %estimator.strategy(),
                threshold = estimator.threshold(),
                "strategy threshold is ignored by this target strategy"
            );
        }
        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        info!(
            study = %config.study_name,
            method = %policy.method(),
            strategy = %estimator.strategy(),
            n0 = config.burn_in_size,
            gamma = config.adaptation_exponent,
            seed,
            "trial initialized"
        );
        Ok(Self {
            config,
            seed,
            ledger: TrialLedger::new(),
            policy,
            rng: TrialRng::seed_from_u64(seed),
        })
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &TrialConfiguration {
        &self.config
    }

    /// Effective seed of the random stream.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Read access to the ledger.
    #[must_use]
    pub const fn ledger(&self) -> &TrialLedger {
        &self.ledger
    }

    /// Enroll a patient and decide its arm.
    ///
    /// Checks run in a fixed order: patient id shape, duplicate id, stratum.
    /// Nothing is written unless every check and the decision succeed.
    ///
    /// # Errors
    ///
    /// - `InvalidPatientId` if `patient_id` is 0
    /// - `DuplicateId` if the patient is already enrolled
    /// - `InvalidStratum` if the stratum is not configured
    /// - `InternalInvariant` if the decision math degenerates
    pub fn enroll(
        &mut self,
        patient_id: u64,
        stratum: impl Into<Stratum>,
    ) -> Result<EnrollmentResponse> {
        if patient_id == 0 {
            return Err(Error::InvalidPatientId(patient_id));
        }
        let patient_id = PatientId::new(patient_id);
        if self.ledger.contains(patient_id) {
            return Err(Error::DuplicateId(patient_id));
        }
        let stratum = stratum.into();
        if !self.config.has_stratum(&stratum) {
            return Err(Error::InvalidStratum(stratum.to_string()));
        }

        let decision = self.policy.decide(&self.ledger, &stratum, &mut self.rng)?;
        if decision.method == AllocationMethod::Adaptive
            && !(PROBABILITY_FLOOR..=PROBABILITY_CEILING).contains(&decision.probability)
        {
            return Err(Error::InternalInvariant(format!(
                "adaptive probability {} outside [{PROBABILITY_FLOOR}, {PROBABILITY_CEILING}]",
                decision.probability
            )));
        }

        let sequence_number = self.ledger.next_sequence();
        let record = PatientRecord::builder(patient_id, stratum, decision.arm, sequence_number)
            .allocation_probability(decision.probability)
            .allocation_method(decision.method)
            .target_allocation(decision.target)
            .build();
        if decision.method.is_fallback() {
            warn!(
                patient = %patient_id,
                stratum = %record.stratum(),
                method = %decision.method,
                "balanced fallback assignment"
            );
        }
        debug!(
            patient = %patient_id,
            stratum = %record.stratum(),
            arm = %decision.arm,
            probability = decision.probability,
            method = %decision.method,
            sequence_number,
            "patient enrolled"
        );
        self.ledger.append(record)?;

        Ok(EnrollmentResponse {
            patient_id,
            arm: decision.arm,
            probability: decision.probability,
            method: decision.method,
            target: decision.target,
            sequence_number,
        })
    }

    /// Record (or overwrite) a patient's outcome.
    ///
    /// Past decisions are never recomputed; the new value is visible to the
    /// next enrollment.
    ///
    /// # Errors
    ///
    /// - `UnknownId` if the patient was never enrolled
    /// - `InvalidOutcome` if the value is not finite
    pub fn record_outcome(&mut self, patient_id: u64, outcome: f64) -> Result<OutcomeAck> {
        let patient_id = PatientId::new(patient_id);
        if !self.ledger.contains(patient_id) {
            return Err(Error::UnknownId(patient_id));
        }
        if !outcome.is_finite() {
            return Err(Error::InvalidOutcome {
                patient_id,
                value: outcome,
            });
        }

        let overwritten = self.ledger.record_outcome(patient_id, outcome)?;
        if let Some(previous) = overwritten {
            warn!(patient = %patient_id, previous, outcome, "outcome overwritten");
        } else {
            debug!(patient = %patient_id, outcome, "outcome recorded");
        }
        Ok(OutcomeAck {
            patient_id,
            overwritten,
        })
    }

    /// Configuration and per-arm / per-stratum counts.
    #[must_use]
    pub fn status(&self) -> TrialStatus {
        let trial = self.ledger.summary(Scope::Trial);
        let trial_phase = self.phase_of(trial.enrolled());
        let stratum_scoped = self.config.randomization_method.is_stratum_scoped();

        let strata = self
            .ledger
            .stratum_summaries(&self.config.strata)
            .into_iter()
            .map(|(stratum, summary)| StratumStatus {
                stratum: stratum.clone(),
                enrolled: ArmCounts::enrolled(&summary),
                reported: ArmCounts::reported(&summary),
                phase: if stratum_scoped {
                    self.phase_of(summary.enrolled())
                } else {
                    trial_phase
                },
            })
            .collect();

        TrialStatus {
            config: self.config.clone(),
            seed: self.seed,
            enrolled: ArmCounts::enrolled(&trial),
            reported: ArmCounts::reported(&trial),
            strata,
        }
    }

    /// Point-in-time copy of configuration and ledger.
    #[must_use]
    pub fn export(&self) -> TrialExport {
        TrialExport {
            config: self.config.clone(),
            seed: self.seed,
            patients: self.ledger.records().to_vec(),
            exported_at: Utc::now(),
        }
    }

    /// Replace the configuration and clear the ledger.
    ///
    /// The new configuration is validated first; on error the session is
    /// left exactly as it was.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if the new configuration is invalid.
    pub fn reconfigure(&mut self, config: TrialConfiguration) -> Result<()> {
        let fresh = Self::new(config)?;
        info!(
            study = %fresh.config.study_name,
            discarded = self.ledger.len(),
            "trial reconfigured"
        );
        *self = fresh;
        Ok(())
    }

    const fn phase_of(&self, enrolled: usize) -> Phase {
        if enrolled < 2 * self.config.burn_in_size {
            Phase::BurnIn
        } else {
            Phase::Adaptive
        }
    }
}
