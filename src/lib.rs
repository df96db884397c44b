//! # carandom: Covariate-Adjusted Adaptive Randomization Engine
//!
//! **Version**: 0.1.0
//!
//! carandom assigns clinical-trial participants sequentially to one of two
//! arms. After a balanced burn-in it adapts assignment probabilities, per
//! covariate stratum or globally, toward an efficient target allocation
//! estimated from the outcomes reported so far.
//!
//! ## Design Principles (Toyota Way Aligned)
//!
//! - **Jidoka**: Degenerate math stops the operation with an internal error instead of a NaN coin
//! - **Poka-Yoke safety**: Ledger appends are all-or-nothing; configuration is validated up front
//! - **Genchi Genbutsu**: Every decision is recomputed from the full ledger, never from a cache
//!
//! ## Randomization Methods
//!
//! | Method | Scope | Target |
//! |--------|-------|--------|
//! | CR     | trial | fair coin after burn-in |
//! | CARA   | stratum | per-stratum biased coin |
//! | CADBCD | trial | global target blended from stratum estimates |
//! | RAR    | trial | trial-wide biased coin |
//!
//! ## Example Usage
//!
//! ```rust
//! use carandom::allocation::TargetStrategy;
//! use carandom::config::{RandomizationMethod, TrialConfiguration};
//! use carandom::trial::TrialSession;
//!
//! let config = TrialConfiguration::builder("HTN-2")
//!     .burn_in_size(10)
//!     .adaptation_exponent(2.0)
//!     .target_strategy(TargetStrategy::Neyman)
//!     .randomization_method(RandomizationMethod::Cara)
//!     .strata(["low", "high"])
//!     .seed(7)
//!     .build()?;
//! let mut session = TrialSession::new(config)?;
//!
//! let response = session.enroll(1, "low")?;
//! println!("patient 1 -> arm {} (p = {})", response.arm, response.probability);
//! session.record_outcome(1, 140.0)?;
//! # Ok::<(), carandom::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod allocation;
pub mod config;
pub mod error;
pub mod ledger;
pub mod replay;
pub mod sequencer;
pub mod trial;

pub use error::{Error, ErrorKind, Result};
