//! Outcome Table Replay: Comparing Randomization Methods
//!
//! This example replays one table of potential outcomes (each patient's
//! response under either arm) through every randomization method and
//! reports the realized allocation.
//!
//! Outcomes arrive with a delay of 10 patients, as in a trial where the
//! endpoint is measured some weeks after enrollment.
//!
//! Run with: cargo run --example outcome_table_replay [config.json]

use carandom::allocation::TargetStrategy;
use carandom::config::{RandomizationMethod, TrialConfiguration};
use carandom::replay::{replay, OutcomeRow};
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_xoshiro::Xoshiro256PlusPlus;
use tracing_subscriber::EnvFilter;

const DELAY: usize = 10;

fn outcome_table(patients: u64) -> anyhow::Result<Vec<OutcomeRow>> {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
    let arm_a = Normal::new(20.0, 6.0)?;
    let arm_b = Normal::new(25.0, 2.0)?;
    Ok((1..=patients)
        .map(|id| {
            let stratum = if id % 4 == 0 { "high" } else { "low" };
            OutcomeRow::new(id, stratum, arm_a.sample(&mut rng), arm_b.sample(&mut rng))
        })
        .collect())
}

fn base_config() -> anyhow::Result<TrialConfiguration> {
    if let Some(path) = std::env::args().nth(1) {
        return Ok(TrialConfiguration::from_path(path)?);
    }
    Ok(TrialConfiguration::builder("replay-demo")
        .burn_in_size(10)
        .adaptation_exponent(2.0)
        .target_strategy(TargetStrategy::Neyman)
        .strata(["low", "high"])
        .seed(11)
        .build()?)
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    println!("=== carandom Outcome Table Replay ===\n");

    let base = base_config()?;
    let rows = outcome_table(400)?;
    println!("  Study: {}", base.study_name);
    println!("  Patients: {}, outcome delay: {DELAY}", rows.len());
    println!("  Strategy: {}\n", base.target_strategy);

    for method in [
        RandomizationMethod::Complete,
        RandomizationMethod::Cara,
        RandomizationMethod::Cadbcd,
        RandomizationMethod::Rar,
    ] {
        let mut config = base.clone();
        config.randomization_method = method;
        let report = replay(config, &rows, DELAY)?;
        let fallbacks = report
            .export
            .patients
            .iter()
            .filter(|p| p.allocation_method().is_fallback())
            .count();
        println!(
            "  {:<6} proportion on A: {:.3} overall, {} after burn-in ({} fallback decisions)",
            method.as_str(),
            report.proportion_a,
            report
                .adaptive_proportion_a
                .map_or_else(|| "n/a".to_string(), |p| format!("{p:.3}")),
            fallbacks
        );
    }

    Ok(())
}
