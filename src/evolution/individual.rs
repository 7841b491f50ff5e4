use crate::evolution::decoder::Decoder;
use crate::evolution::fitness::FitnessEvaluator;
use crate::evolution::Genotype;
use crate::pattern::Pattern;
use log::debug;
use rand::Rng;

/// One candidate solution born during the evolution process.
///
/// Owns exactly one genotype, the pattern derived from it, and a cached
/// fitness score. The phenotype and fitness are derived state: replacing the
/// genotype invalidates both, and they are recomputed lazily on the next
/// evaluation. Ordering for selection and replacement purposes is by fitness
/// only; genotype equality is bitwise.
#[derive(Debug, Clone, PartialEq)]
pub struct Individual {
    genotype: Genotype,
    phenotype: Option<Pattern>,
    decoded: bool,
    fitness: Option<f64>,
}

impl Individual {
    /// Creates an individual with a uniformly random genotype of the given
    /// length. Fitness is left unevaluated.
    pub fn random<R: Rng>(dna_length: usize, rng: &mut R) -> Self {
        let genotype = (0..dna_length).map(|_| rng.random::<bool>()).collect();
        Self::with_genotype(genotype)
    }

    /// Creates an individual around an existing genotype.
    pub fn with_genotype(genotype: Genotype) -> Self {
        Self {
            genotype,
            phenotype: None,
            decoded: false,
            fitness: None,
        }
    }

    pub fn genotype(&self) -> &Genotype {
        &self.genotype
    }

    /// Cached fitness; `None` means not yet evaluated.
    pub fn fitness(&self) -> Option<f64> {
        self.fitness
    }

    /// Sort key placing unevaluated individuals below any evaluated score.
    pub(crate) fn fitness_key(&self) -> f64 {
        self.fitness.unwrap_or(f64::NEG_INFINITY)
    }

    /// The decoded pattern, if decoding has happened and succeeded.
    pub fn decoded_phenotype(&self) -> Option<&Pattern> {
        self.phenotype.as_ref()
    }

    /// Replaces the genotype, invalidating the derived phenotype and
    /// fitness; both are recomputed lazily.
    pub fn set_genotype(&mut self, genotype: Genotype) {
        self.genotype = genotype;
        self.phenotype = None;
        self.decoded = false;
        self.fitness = None;
    }

    /// Computes and caches fitness. Idempotent: with an unchanged genotype
    /// the cached value is returned as-is. A genotype whose derivation
    /// exhausts the expansion budget is kept but scored with the worst
    /// possible fitness.
    pub fn evaluate(&mut self, decoder: &Decoder, evaluator: &FitnessEvaluator) -> f64 {
        if let Some(fitness) = self.fitness {
            return fitness;
        }
        if !self.decoded {
            let (phenotype, fitness) = decode_and_score(decoder, evaluator, &self.genotype);
            self.store_evaluation(phenotype, fitness);
        }
        self.fitness.unwrap_or(0.0)
    }

    pub(crate) fn store_evaluation(&mut self, phenotype: Option<Pattern>, fitness: f64) {
        self.phenotype = phenotype;
        self.decoded = true;
        self.fitness = Some(fitness);
    }
}

/// Shared decode-then-score path for sequential and parallel evaluation.
pub(crate) fn decode_and_score(
    decoder: &Decoder,
    evaluator: &FitnessEvaluator,
    genotype: &Genotype,
) -> (Option<Pattern>, f64) {
    match decoder.decode(genotype) {
        Ok(pattern) => {
            let fitness = evaluator.evaluate(&pattern);
            (Some(pattern), fitness)
        }
        Err(e) => {
            debug!("Decoding failed: {}. Assigning worst fitness.", e);
            (None, 0.0)
        }
    }
}
