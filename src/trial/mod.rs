//! Online enrollment service
//!
//! ```text
//! TrialRegistry ──< Trial (Mutex) ── TrialSession
//!                                      ├── TrialConfiguration
//!                                      ├── TrialLedger
//!                                      ├── AllocationPolicy (CR | CARA | CADBCD | RAR)
//!                                      └── TrialRng (one seedable stream)
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use carandom::config::{RandomizationMethod, TrialConfiguration};
//! use carandom::ledger::AllocationMethod;
//! use carandom::trial::TrialSession;
//!
//! let config = TrialConfiguration::builder("HTN-2")
//!     .burn_in_size(2)
//!     .randomization_method(RandomizationMethod::Rar)
//!     .strata(["low", "high"])
//!     .seed(42)
//!     .build()?;
//! let mut session = TrialSession::new(config)?;
//!
//! let response = session.enroll(1, "low")?;
//! assert_eq!(response.method, AllocationMethod::BurnIn);
//! session.record_outcome(1, 12.5)?;
//! # Ok::<(), carandom::Error>(())
//! ```

mod registry;
mod report;
mod session;
mod shared;

pub use registry::TrialRegistry;
pub use report::{
    ArmCounts, EnrollmentResponse, OutcomeAck, StratumStatus, TrialExport, TrialStatus,
};
pub use session::TrialSession;
pub use shared::Trial;
