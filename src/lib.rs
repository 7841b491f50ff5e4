//! Grammatical evolution of linguistic token-matching patterns.
//!
//! Given a handful of annotated example sentences, the engine builds a
//! bounded derivation grammar from the attribute values they actually
//! contain, then evolves bit-string genotypes whose decoded patterns are
//! scored by how many samples they match. Repeated independent runs are
//! aggregated and the fittest patterns are returned, spaCy-Matcher style:
//!
//! ```no_run
//! use lexevo::config::Config;
//!
//! let config = Config {
//!     random_seed: Some(42),
//!     ..Config::default()
//! };
//! let samples = ["I am a raccoon!", "You are a cat!"];
//! let ranked = lexevo::find_patterns(&samples, &config).unwrap();
//! for (pattern, fitness) in ranked {
//!     println!("{:.4}  {}", fitness, pattern);
//! }
//! ```

pub mod config;
pub mod evolution;
pub mod nlp;
pub mod pattern;

use crate::config::{Config, ConfigError};
use crate::evolution::grammar::{build_grammar, GrammarError};
use crate::evolution::population::{EvolutionError, Population};
use crate::evolution::stats::{write_report_to_json, Report, Stats};
use crate::nlp::{annotate, Sample};
use crate::pattern::Pattern;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Instant;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("Grammar error: {0}")]
    Grammar(#[from] GrammarError),
    #[error("Evolution error: {0}")]
    Evolution(#[from] EvolutionError),
    #[error("Failed to persist report: {0}")]
    Report(String),
}

/// Finds optimized token-matching patterns shared by the given samples.
///
/// Validates the configuration, annotates the raw texts, builds the
/// derivation grammar once, and executes `max_runs` independent evolution
/// runs over it. Each run gets its own random generator: with a configured
/// `random_seed` the run `i` generator is seeded with `seed + i`, making
/// the whole execution reproducible bit-for-bit; without one, generators
/// are seeded from OS entropy.
///
/// # Arguments
/// * `texts` - Raw sample texts to find common patterns in
/// * `config` - Engine configuration, constructed once by the caller
///
/// # Returns
/// * `Result<Vec<(Pattern, f64)>, SearchError>` - The accumulated best
///   (pattern, fitness) pairs across all runs, fittest first
pub fn find_patterns(texts: &[&str], config: &Config) -> Result<Vec<(Pattern, f64)>, SearchError> {
    config.validate()?;

    info!("Annotating {} samples...", texts.len());
    let samples: Vec<Sample> = texts.iter().map(|t| annotate(t)).collect();

    let grammar = build_grammar(&samples, config)?;
    info!("Grammar built with {} rules.", grammar.rules.len());

    let mut stats = Stats::new(config);
    for run in 0..config.max_runs {
        let mut rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(run as u64)),
            None => StdRng::from_os_rng(),
        };

        let start = Instant::now();
        let mut population = Population::new(&samples, &grammar, config, &mut rng);
        population.evolve(&mut rng)?;
        let elapsed = start.elapsed();

        if let Some(best) = population.best_individual() {
            info!(
                "Run {}/{}: best fitness {:.4} in {:.3}s",
                run + 1,
                config.max_runs,
                best.fitness().unwrap_or(0.0),
                elapsed.as_secs_f64()
            );
            stats.add_run(best.clone(), elapsed);
        }
    }

    if let Some(path) = &config.report_path {
        let report = Report::new(&stats, config);
        write_report_to_json(&report, path).map_err(|e| SearchError::Report(e.to_string()))?;
        info!("Report persisted to {}.", path.display());
    }

    Ok(stats
        .most_fitted()
        .iter()
        .map(|individual| {
            (
                individual.decoded_phenotype().cloned().unwrap_or_default(),
                individual.fitness().unwrap_or(0.0),
            )
        })
        .collect())
}
