use log::warn;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// How the mating pool is drawn from the current generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionType {
    BinaryTournament,
    /// Declared for forward compatibility; selecting it fails at selection
    /// time with `EvolutionError::UnsupportedSelection`.
    KTournament,
}

/// How offspring genotypes are produced from the mating pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecombinationType {
    RandomOnePointCrossover,
}

/// How the next generation is assembled from parents and offspring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplacementType {
    MuPlusLambda,
    MuLambdaWithElitism,
    MuLambdaWithoutElitism,
}

/// Scoring mode for the fitness evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessType {
    /// Fraction of samples with at least one match anywhere.
    Basic,
    /// Fraction of samples matched end to end.
    FullMatch,
}

/// All engine parameters, constructed once and passed by reference into the
/// grammar builder, population, and stats.
///
/// Mode enums are closed: an unrecognized mode string fails while parsing
/// the TOML, before any evolution starts. `validate` performs the remaining
/// range checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Number of independent evolution runs to aggregate.
    pub max_runs: usize,
    /// Generation cap for each run.
    pub max_generations: usize,
    /// Individuals per generation (N).
    pub population_size: usize,
    /// Genotype length in bits.
    pub dna_length: usize,
    /// Bits consumed per derivation choice.
    pub codon_width: usize,
    /// Per-bit flip probability applied to offspring.
    pub mutation_probability: f64,
    /// Per-pair probability of one-point crossover.
    pub crossover_probability: f64,
    /// A run stops early once the best fitness reaches this value.
    pub success_threshold: f64,
    /// Parents preserved unchanged under mu-lambda-with-elitism.
    pub elite_count: usize,
    /// Tournament size for the k-tournament strategy.
    pub tournament_size: usize,
    /// Derivation step budget guarding against pathological wrap-around.
    pub max_expansions: usize,
    /// Bound on the accumulator of best individuals across runs (K).
    pub max_top_results: usize,
    /// Adds the unconstrained token wildcard to the grammar; wildcard-heavy
    /// patterns are penalized proportionally during evaluation.
    pub use_token_wildcard: bool,
    pub fitness_function: FitnessType,
    pub selection: SelectionType,
    pub recombination: RecombinationType,
    pub replacement: ReplacementType,
    /// Where to persist the JSON run report; `None` skips persistence.
    pub report_path: Option<PathBuf>,
    /// Master seed; run `i` uses `seed + i`. `None` seeds from OS entropy.
    pub random_seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_runs: 4,
            max_generations: 20,
            population_size: 20,
            dna_length: 64,
            codon_width: 7,
            mutation_probability: 0.1,
            crossover_probability: 0.8,
            success_threshold: 1.0,
            elite_count: 2,
            tournament_size: 3,
            max_expansions: 256,
            max_top_results: 5,
            use_token_wildcard: false,
            fitness_function: FitnessType::Basic,
            selection: SelectionType::BinaryTournament,
            recombination: RecombinationType::RandomOnePointCrossover,
            replacement: ReplacementType::MuPlusLambda,
            report_path: None,
            random_seed: None,
        }
    }
}

impl Config {
    /// Loads and parses a configuration from a TOML file. Callers still run
    /// `validate` before using the value.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Checks all numeric parameters for sanity.
    ///
    /// # Returns
    /// * `Result<(), ConfigError>` - Unit in the happy case, a
    ///   `ConfigError::Invalid` naming the offending value otherwise
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.population_size < 2 {
            return Err(ConfigError::Invalid(
                "population_size must be at least 2".to_string(),
            ));
        }
        if self.dna_length < 2 {
            return Err(ConfigError::Invalid(
                "dna_length must be at least 2".to_string(),
            ));
        }
        if self.codon_width == 0 || self.codon_width > 31 {
            return Err(ConfigError::Invalid(
                "codon_width must be between 1 and 31".to_string(),
            ));
        }
        if self.dna_length < self.codon_width {
            return Err(ConfigError::Invalid(
                "dna_length must be at least one codon wide".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_probability) {
            return Err(ConfigError::Invalid(
                "mutation_probability must be between 0 and 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.crossover_probability) {
            return Err(ConfigError::Invalid(
                "crossover_probability must be between 0 and 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.success_threshold) {
            return Err(ConfigError::Invalid(
                "success_threshold must be between 0 and 1".to_string(),
            ));
        }
        if self.elite_count > self.population_size {
            return Err(ConfigError::Invalid(
                "elite_count cannot exceed population_size".to_string(),
            ));
        }
        if self.tournament_size < 2 {
            return Err(ConfigError::Invalid(
                "tournament_size must be at least 2".to_string(),
            ));
        }
        if self.max_generations == 0 || self.max_runs == 0 {
            return Err(ConfigError::Invalid(
                "max_generations and max_runs must be positive".to_string(),
            ));
        }
        if self.max_expansions == 0 {
            return Err(ConfigError::Invalid(
                "max_expansions must be positive".to_string(),
            ));
        }
        if self.max_top_results == 0 {
            return Err(ConfigError::Invalid(
                "max_top_results must be positive".to_string(),
            ));
        }
        if self.population_size % 2 != 0 {
            // Pairwise crossover carries the unpaired individual through
            // unmodified; an even size avoids that asymmetry.
            warn!(
                "population_size {} is odd; the trailing mating-pool individual passes through crossover unchanged",
                self.population_size
            );
        }
        Ok(())
    }
}
