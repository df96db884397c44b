//! Online Enrollment: CARA Randomization Across Strata
//!
//! This example opens a trial in a shared registry and enrolls patients one
//! at a time, reporting each outcome before the next patient arrives.
//!
//! Algorithm: stratified CARA (Toyota Way: Jidoka - stop on bad input)
//! - Each stratum runs its own balanced burn-in of 2 * n0 patients
//! - Afterwards each decision tilts toward the estimated Neyman target
//! - Malformed requests are rejected before the ledger is touched
//!
//! Run with: RUST_LOG=carandom=debug cargo run --example online_enrollment

use carandom::allocation::TargetStrategy;
use carandom::config::{RandomizationMethod, TrialConfiguration};
use carandom::ledger::Arm;
use carandom::trial::TrialRegistry;
use tracing_subscriber::EnvFilter;

/// Arm B outcomes are tighter than arm A in both strata
#[allow(clippy::cast_precision_loss)]
fn outcome(patient_id: u64, arm: Arm, stratum: &str) -> f64 {
    let base = if stratum == "older" { 30.0 } else { 20.0 };
    let wobble = ((patient_id * 37) % 11) as f64 - 5.0;
    match arm {
        Arm::A => base + 1.5 * wobble,
        Arm::B => base + 2.0 + 0.4 * wobble,
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== carandom Online Enrollment (CARA) ===\n");

    let config = TrialConfiguration::builder("online-demo")
        .burn_in_size(5)
        .adaptation_exponent(2.0)
        .target_strategy(TargetStrategy::Neyman)
        .randomization_method(RandomizationMethod::Cara)
        .strata(["younger", "older"])
        .seed(2024)
        .build()?;

    let registry = TrialRegistry::new();
    let trial = registry.open(config)?;

    for id in 1..=60_u64 {
        let stratum = if id % 3 == 0 { "older" } else { "younger" };
        let response = trial.enroll(id, stratum)?;
        println!(
            "  patient {:>3} [{:<7}] -> {} (p = {:.3}, {})",
            id, stratum, response.arm, response.probability, response.method
        );
        trial.record_outcome(id, outcome(id, response.arm, stratum))?;
    }

    println!("\n=== Rejected Requests ===");
    for (id, stratum) in [(0_u64, "younger"), (7, "older"), (61, "middle")] {
        match trial.enroll(id, stratum) {
            Ok(response) => println!("  patient {id}: unexpectedly enrolled on {}", response.arm),
            Err(err) => println!("  patient {id}: {err}"),
        }
    }

    let status = trial.status()?;
    println!("\n=== Status ===");
    println!(
        "  Enrolled: A = {}, B = {} (seed {})",
        status.enrolled.a, status.enrolled.b, status.seed
    );
    for stratum in &status.strata {
        println!(
            "  {:<7} A = {:>2}, B = {:>2}, phase {:?}",
            stratum.stratum.as_str(),
            stratum.enrolled.a,
            stratum.enrolled.b,
            stratum.phase
        );
    }

    Ok(())
}
