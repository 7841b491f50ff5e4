//! Run aggregation and report persistence.
//!
//! Collects the best individual and elapsed time of every independent run,
//! maintains a bounded accumulator of the fittest individuals observed, and
//! serializes a summary report with enough metadata to reproduce the
//! execution.

use crate::config::Config;
use crate::evolution::genotype_to_bits;
use crate::evolution::individual::Individual;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::path::Path;
use std::time::Duration;

/// Aggregates results across repeated independent runs.
pub struct Stats {
    success_threshold: f64,
    max_top_results: usize,
    run_times: Vec<f64>,
    run_bests: Vec<f64>,
    successes: usize,
    most_fitted: Vec<Individual>,
}

impl Stats {
    /// Creates an empty aggregator.
    ///
    /// # Arguments
    /// * `config` - Source of the success threshold and the top-K bound
    pub fn new(config: &Config) -> Self {
        Self {
            success_threshold: config.success_threshold,
            max_top_results: config.max_top_results,
            run_times: Vec::new(),
            run_bests: Vec::new(),
            successes: 0,
            most_fitted: Vec::new(),
        }
    }

    /// Records one finished run: its best individual and wall time.
    ///
    /// The accumulator stays sorted by descending fitness and capped at K;
    /// the stable sort keeps first-seen order among equal scores.
    pub fn add_run(&mut self, best: Individual, elapsed: Duration) {
        self.run_times.push(elapsed.as_secs_f64());
        let fitness = best.fitness().unwrap_or(0.0);
        self.run_bests.push(fitness);
        if fitness >= self.success_threshold {
            self.successes += 1;
        }

        self.most_fitted.push(best);
        self.most_fitted.sort_by(|a, b| {
            b.fitness_key()
                .partial_cmp(&a.fitness_key())
                .unwrap_or(Ordering::Equal)
        });
        self.most_fitted.truncate(self.max_top_results);
    }

    pub fn runs(&self) -> usize {
        self.run_times.len()
    }

    /// Best individuals across all runs, fittest first.
    pub fn most_fitted(&self) -> &[Individual] {
        &self.most_fitted
    }

    /// Mean of the per-run best fitness values.
    pub fn mean_fitness(&self) -> Option<f64> {
        mean(&self.run_bests)
    }

    pub fn best_fitness(&self) -> Option<f64> {
        self.run_bests
            .iter()
            .copied()
            .fold(None, |acc: Option<f64>, f| Some(acc.map_or(f, |a| a.max(f))))
    }

    pub fn worst_fitness(&self) -> Option<f64> {
        self.run_bests
            .iter()
            .copied()
            .fold(None, |acc: Option<f64>, f| Some(acc.map_or(f, |a| a.min(f))))
    }

    /// Mean wall time per run, in seconds.
    pub fn mean_time(&self) -> Option<f64> {
        mean(&self.run_times)
    }

    /// Fraction of runs whose best fitness reached the success threshold.
    pub fn success_rate(&self) -> Option<f64> {
        if self.run_bests.is_empty() {
            None
        } else {
            Some(self.successes as f64 / self.run_bests.len() as f64)
        }
    }
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// One accumulated individual as it appears in the persisted report.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct RankedPattern {
    /// Rank within the accumulator (1 = best)
    pub rank: usize,
    /// Fitness score from evolution
    pub fitness: f64,
    /// Genotype in literal bit-string form
    pub genotype: String,
    /// Rendered matcher pattern
    pub pattern: String,
}

/// Serializable summary of an execution: configuration snapshot, per-run
/// timings, aggregate metrics, and the accumulated top individuals.
#[derive(Serialize, Deserialize)]
pub struct Report {
    /// Schema version for forward/backward compatibility
    pub schema_version: String,
    /// Unix timestamp when the report was generated
    pub generated_at: u64,
    /// Snapshot of the configuration that produced these results
    pub config: Config,
    pub run_times_secs: Vec<f64>,
    pub mean_time_secs: Option<f64>,
    pub mean_fitness: Option<f64>,
    pub best_fitness: Option<f64>,
    pub worst_fitness: Option<f64>,
    pub success_rate: Option<f64>,
    pub top_individuals: Vec<RankedPattern>,
}

impl Report {
    /// Builds a report snapshot from an aggregator.
    pub fn new(stats: &Stats, config: &Config) -> Self {
        let top_individuals = stats
            .most_fitted()
            .iter()
            .enumerate()
            .map(|(i, ind)| RankedPattern {
                rank: i + 1,
                fitness: ind.fitness().unwrap_or(0.0),
                genotype: genotype_to_bits(ind.genotype()),
                pattern: ind
                    .decoded_phenotype()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "[]".to_string()),
            })
            .collect();

        Self {
            schema_version: "1.0.0".to_string(),
            generated_at: chrono::Utc::now().timestamp() as u64,
            config: config.clone(),
            run_times_secs: stats.run_times.clone(),
            mean_time_secs: stats.mean_time(),
            mean_fitness: stats.mean_fitness(),
            best_fitness: stats.best_fitness(),
            worst_fitness: stats.worst_fitness(),
            success_rate: stats.success_rate(),
            top_individuals,
        }
    }
}

/// Writes a report to a pretty-printed JSON file.
pub fn write_report_to_json(
    report: &Report,
    output_path: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string_pretty(report)?;
    std::fs::write(output_path, json)?;
    Ok(())
}

/// Reads a report back from a JSON file.
pub fn read_report_from_json(input_path: &Path) -> Result<Report, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(input_path)?;
    let report: Report = serde_json::from_str(&content)?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::genotype_from_bits;
    use tempfile::NamedTempFile;

    fn evaluated_individual(bits: &str, fitness: f64) -> Individual {
        let mut individual = Individual::with_genotype(genotype_from_bits(bits).unwrap());
        individual.store_evaluation(None, fitness);
        individual
    }

    #[test]
    fn test_accumulator_is_bounded_and_sorted() {
        let config = Config {
            max_top_results: 3,
            ..Config::default()
        };
        let mut stats = Stats::new(&config);

        for (bits, fitness) in [
            ("0001", 0.25),
            ("0010", 0.75),
            ("0011", 0.5),
            ("0100", 1.0),
            ("0101", 0.1),
        ] {
            stats.add_run(evaluated_individual(bits, fitness), Duration::from_millis(5));
        }

        assert_eq!(stats.runs(), 5);
        let top: Vec<f64> = stats
            .most_fitted()
            .iter()
            .map(|i| i.fitness().unwrap())
            .collect();
        assert_eq!(top, vec![1.0, 0.75, 0.5]);
    }

    #[test]
    fn test_ties_keep_first_seen_order() {
        let config = Config {
            max_top_results: 2,
            ..Config::default()
        };
        let mut stats = Stats::new(&config);
        stats.add_run(evaluated_individual("0001", 0.5), Duration::from_millis(1));
        stats.add_run(evaluated_individual("0010", 0.5), Duration::from_millis(1));
        stats.add_run(evaluated_individual("0011", 0.5), Duration::from_millis(1));

        let genotypes: Vec<String> = stats
            .most_fitted()
            .iter()
            .map(|i| genotype_to_bits(i.genotype()))
            .collect();
        assert_eq!(genotypes, vec!["0001".to_string(), "0010".to_string()]);
    }

    #[test]
    fn test_aggregate_metrics() {
        let config = Config {
            success_threshold: 0.8,
            ..Config::default()
        };
        let mut stats = Stats::new(&config);
        assert_eq!(stats.mean_fitness(), None);
        assert_eq!(stats.success_rate(), None);

        stats.add_run(evaluated_individual("0001", 1.0), Duration::from_millis(10));
        stats.add_run(evaluated_individual("0010", 0.5), Duration::from_millis(30));

        assert_eq!(stats.mean_fitness(), Some(0.75));
        assert_eq!(stats.best_fitness(), Some(1.0));
        assert_eq!(stats.worst_fitness(), Some(0.5));
        assert_eq!(stats.success_rate(), Some(0.5));
        let mean_time = stats.mean_time().unwrap();
        assert!((mean_time - 0.020).abs() < 1e-9);
    }

    #[test]
    fn test_report_round_trip() {
        let config = Config::default();
        let mut stats = Stats::new(&config);
        stats.add_run(evaluated_individual("00101001", 0.75), Duration::from_millis(12));

        let report = Report::new(&stats, &config);
        assert_eq!(report.schema_version, "1.0.0");
        assert_eq!(report.top_individuals.len(), 1);
        assert_eq!(report.top_individuals[0].rank, 1);
        assert_eq!(report.top_individuals[0].genotype, "00101001");

        let temp_file = NamedTempFile::new().unwrap();
        write_report_to_json(&report, temp_file.path()).unwrap();
        let loaded = read_report_from_json(temp_file.path()).unwrap();

        assert_eq!(loaded.schema_version, report.schema_version);
        assert_eq!(loaded.top_individuals, report.top_individuals);
        assert_eq!(loaded.mean_fitness, report.mean_fitness);
        assert_eq!(loaded.config.population_size, config.population_size);
    }
}
