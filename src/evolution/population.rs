use crate::config::{Config, RecombinationType, ReplacementType, SelectionType};
use crate::evolution::decoder::Decoder;
use crate::evolution::fitness::FitnessEvaluator;
use crate::evolution::grammar::Grammar;
use crate::evolution::individual::{decode_and_score, Individual};
use crate::evolution::Genotype;
use crate::nlp::Sample;
use crate::pattern::Pattern;
use log::info;
use rand::Rng;
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::cmp::Ordering;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum EvolutionError {
    #[error("Selection strategy {0:?} is not implemented")]
    UnsupportedSelection(SelectionType),
}

/// This struct is the beating heart of the engine: it owns one generation of
/// individuals and drives selection, recombination, mutation, and
/// replacement across generations until a termination condition holds.
///
/// Grammar, samples, and configuration are shared read-only state; all
/// randomness flows through the explicit generator handles passed into
/// `new` and `evolve`, so a fixed seed reproduces a run bit-for-bit.
pub struct Population<'a> {
    /// Reference to the user-defined configuration for this run
    config: &'a Config,
    /// Decoder shared by every individual of the run
    decoder: Decoder<'a>,
    /// Evaluator scoring phenotypes against the shared samples
    evaluator: FitnessEvaluator<'a>,
    /// The current generation, fixed size N after every transition
    generation: Vec<Individual>,
    /// Offspring buffer, filled during a transition and cleared by
    /// replacement
    offspring: Vec<Individual>,
    /// Fittest member of the current generation
    best_individual: Option<Individual>,
    /// Number of completed generation transitions
    generation_index: usize,
}

impl<'a> Population<'a> {
    /// Creates generation zero: N randomly generated, evaluated individuals.
    ///
    /// # Arguments
    /// * `samples` - Annotated samples shared by every evaluation
    /// * `grammar` - The derivation grammar shared by every individual
    /// * `config` - Engine configuration
    /// * `rng` - Explicit random generator for genotype initialization
    ///
    /// # Returns
    /// * `Self` - A population ready to `evolve`
    pub fn new<R: Rng>(
        samples: &'a [Sample],
        grammar: &'a Grammar,
        config: &'a Config,
        rng: &mut R,
    ) -> Self {
        let generation = (0..config.population_size)
            .map(|_| Individual::random(config.dna_length, rng))
            .collect();

        let mut population = Self {
            config,
            decoder: Decoder::new(grammar, config),
            evaluator: FitnessEvaluator::new(samples, config),
            generation,
            offspring: Vec::new(),
            best_individual: None,
            generation_index: 0,
        };
        population.evaluate_generation();
        population.update_best();
        population
    }

    pub fn generation(&self) -> &[Individual] {
        &self.generation
    }

    /// Mutable access to the current generation, mainly for seeding known
    /// genotypes before `evolve`.
    pub fn generation_mut(&mut self) -> &mut Vec<Individual> {
        &mut self.generation
    }

    pub fn generation_index(&self) -> usize {
        self.generation_index
    }

    pub fn best_individual(&self) -> Option<&Individual> {
        self.best_individual.as_ref()
    }

    /// Drives the generation loop to its terminal state: either
    /// `max_generations` transitions have run or the best fitness reached
    /// the configured success threshold.
    pub fn evolve<R: Rng>(&mut self, rng: &mut R) -> Result<(), EvolutionError> {
        // Individuals seeded after construction may not be evaluated yet.
        self.evaluate_generation();
        self.update_best();

        while self.generation_index < self.config.max_generations && !self.target_reached() {
            let mating_pool = self.selection(rng)?;
            self.offspring = self.recombination(mating_pool, rng);
            self.mutation(rng);
            self.replacement();

            if let Some(best) = &self.best_individual {
                info!(
                    "Generation {}/{}: best fitness {:.4}",
                    self.generation_index,
                    self.config.max_generations,
                    best.fitness_key()
                );
            }
        }
        Ok(())
    }

    /// Produces a mating pool of size N from the current generation.
    ///
    /// Binary tournament: N times, draw two individuals uniformly at random
    /// with replacement and keep the fitter one, ties going to the first
    /// drawn. The k-tournament strategy is declared in the configuration but
    /// not implemented; choosing it fails here, at selection time, leaving
    /// the population untouched.
    fn selection<R: Rng>(&self, rng: &mut R) -> Result<Vec<Individual>, EvolutionError> {
        match self.config.selection {
            SelectionType::BinaryTournament => {
                let size = self.generation.len();
                let mut mating_pool = Vec::with_capacity(size);
                for _ in 0..size {
                    let first = &self.generation[rng.random_range(0..size)];
                    let second = &self.generation[rng.random_range(0..size)];
                    let winner = if second.fitness_key() > first.fitness_key() {
                        second
                    } else {
                        first
                    };
                    mating_pool.push(winner.clone());
                }
                Ok(mating_pool)
            }
            SelectionType::KTournament => Err(EvolutionError::UnsupportedSelection(
                SelectionType::KTournament,
            )),
        }
    }

    /// Consumes the mating pool pairwise and produces the offspring list.
    fn recombination<R: Rng>(&self, mating_pool: Vec<Individual>, rng: &mut R) -> Vec<Individual> {
        match self.config.recombination {
            RecombinationType::RandomOnePointCrossover => {
                self.one_point_crossover(mating_pool, rng)
            }
        }
    }

    /// Single-point crossover over adjacent pairs: with per-pair probability
    /// `crossover_probability`, split both genotypes at one random index in
    /// `1..dna_length` and swap the suffixes; otherwise the pair passes
    /// through as copies. An unpaired trailing individual (odd pool size) is
    /// carried through unmodified.
    fn one_point_crossover<R: Rng>(
        &self,
        mating_pool: Vec<Individual>,
        rng: &mut R,
    ) -> Vec<Individual> {
        let mut offspring = Vec::with_capacity(mating_pool.len());
        let mut pairs = mating_pool.chunks_exact(2);

        for pair in pairs.by_ref() {
            let first = pair[0].genotype();
            let second = pair[1].genotype();
            if rng.random::<f64>() < self.config.crossover_probability {
                let cut = rng.random_range(1..first.len());
                let child_a: Genotype = first[..cut]
                    .iter()
                    .chain(&second[cut..])
                    .copied()
                    .collect();
                let child_b: Genotype = second[..cut]
                    .iter()
                    .chain(&first[cut..])
                    .copied()
                    .collect();
                offspring.push(Individual::with_genotype(child_a));
                offspring.push(Individual::with_genotype(child_b));
            } else {
                offspring.push(Individual::with_genotype(first.clone()));
                offspring.push(Individual::with_genotype(second.clone()));
            }
        }
        if let [unpaired] = pairs.remainder() {
            offspring.push(Individual::with_genotype(unpaired.genotype().clone()));
        }
        offspring
    }

    /// Flips each bit of each offspring genotype independently with
    /// probability `mutation_probability`.
    fn mutation<R: Rng>(&mut self, rng: &mut R) {
        let probability = self.config.mutation_probability;
        for individual in &mut self.offspring {
            let mut genotype = individual.genotype().clone();
            let mut changed = false;
            for bit in genotype.iter_mut() {
                if rng.random::<f64>() < probability {
                    *bit = !*bit;
                    changed = true;
                }
            }
            if changed {
                individual.set_genotype(genotype);
            }
        }
    }

    /// Builds the next generation from parents and offspring according to
    /// the configured policy, clears the offspring buffer, advances the
    /// generation counter, and recomputes the best individual.
    fn replacement(&mut self) {
        Self::evaluate_individuals(&self.decoder, &self.evaluator, &mut self.offspring);
        let capacity = self.config.population_size;

        let next_generation = match self.config.replacement {
            ReplacementType::MuPlusLambda => {
                let mut pool: Vec<Individual> = self
                    .generation
                    .drain(..)
                    .chain(self.offspring.drain(..))
                    .collect();
                pool.sort_by(Self::by_fitness_desc);
                pool.truncate(capacity);
                pool
            }
            ReplacementType::MuLambdaWithElitism => {
                self.generation.sort_by(Self::by_fitness_desc);
                let elite_count = self.config.elite_count.min(capacity);
                let mut next: Vec<Individual> =
                    self.generation.drain(..).take(elite_count).collect();
                let mut offspring: Vec<Individual> = self.offspring.drain(..).collect();
                offspring.sort_by(Self::by_fitness_desc);
                next.extend(offspring.into_iter().take(capacity - elite_count));
                next
            }
            ReplacementType::MuLambdaWithoutElitism => {
                self.generation.clear();
                let mut next: Vec<Individual> = self.offspring.drain(..).collect();
                next.truncate(capacity);
                next
            }
        };

        self.generation = next_generation;
        self.offspring.clear();
        self.generation_index += 1;
        self.update_best();
    }

    fn evaluate_generation(&mut self) {
        Self::evaluate_individuals(&self.decoder, &self.evaluator, &mut self.generation);
    }

    /// Decodes and scores every not-yet-evaluated individual in parallel.
    /// Results are keyed by index and applied sequentially, so the outcome
    /// is independent of worker scheduling.
    fn evaluate_individuals(
        decoder: &Decoder,
        evaluator: &FitnessEvaluator,
        individuals: &mut [Individual],
    ) {
        let work_items: Vec<(usize, Genotype)> = individuals
            .iter()
            .enumerate()
            .filter(|(_, ind)| ind.fitness().is_none())
            .map(|(i, ind)| (i, ind.genotype().clone()))
            .collect();

        if work_items.is_empty() {
            return;
        }

        let results: Vec<(usize, Option<Pattern>, f64)> = work_items
            .par_iter()
            .map(|(i, genotype)| {
                let (phenotype, fitness) = decode_and_score(decoder, evaluator, genotype);
                (*i, phenotype, fitness)
            })
            .collect();

        for (i, phenotype, fitness) in results {
            individuals[i].store_evaluation(phenotype, fitness);
        }
    }

    fn update_best(&mut self) {
        self.best_individual = self
            .generation
            .iter()
            .max_by(|a, b| {
                a.fitness_key()
                    .partial_cmp(&b.fitness_key())
                    .unwrap_or(Ordering::Equal)
            })
            .cloned();
    }

    fn target_reached(&self) -> bool {
        self.best_individual
            .as_ref()
            .is_some_and(|best| best.fitness_key() >= self.config.success_threshold)
    }

    fn by_fitness_desc(a: &Individual, b: &Individual) -> Ordering {
        b.fitness_key()
            .partial_cmp(&a.fitness_key())
            .unwrap_or(Ordering::Equal)
    }
}
