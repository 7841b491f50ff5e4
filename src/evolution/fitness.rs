use crate::config::{Config, FitnessType};
use crate::nlp::matcher::match_pattern;
use crate::nlp::Sample;
use crate::pattern::Pattern;

/// Scores decoded patterns against the shared sample set.
///
/// Fitness is always in `[0, 1]`: the fraction of samples satisfied under
/// the configured mode, optionally scaled down for wildcard-heavy patterns.
/// A pattern that matches nothing scores 0.0; evaluation never fails.
#[derive(Clone)]
pub struct FitnessEvaluator<'a> {
    samples: &'a [Sample],
    function: FitnessType,
    use_token_wildcard: bool,
}

impl<'a> FitnessEvaluator<'a> {
    pub fn new(samples: &'a [Sample], config: &Config) -> Self {
        Self {
            samples,
            function: config.fitness_function,
            use_token_wildcard: config.use_token_wildcard,
        }
    }

    /// Evaluates one pattern.
    ///
    /// # Arguments
    /// * `pattern` - The decoded phenotype to score
    ///
    /// # Returns
    /// * `f64` - Fitness in `[0, 1]`; 1.0 only when every sample satisfies
    ///   the configured match mode
    pub fn evaluate(&self, pattern: &Pattern) -> f64 {
        if self.samples.is_empty() || pattern.is_empty() {
            return 0.0;
        }

        let satisfied = self
            .samples
            .iter()
            .filter(|sample| {
                let outcome = match_pattern(pattern, sample);
                match self.function {
                    FitnessType::Basic => outcome.any_match,
                    FitnessType::FullMatch => outcome.full_match,
                }
            })
            .count();

        let fitness = satisfied as f64 / self.samples.len() as f64;
        self.wildcard_penalty(pattern, fitness)
    }

    /// Scales fitness by the share of non-wildcard groups, so a pattern of
    /// nothing but wildcards scores 0.0 even though it matches everything.
    fn wildcard_penalty(&self, pattern: &Pattern, fitness: f64) -> f64 {
        if !self.use_token_wildcard {
            return fitness;
        }
        let share = pattern.wildcard_count() as f64 / pattern.len() as f64;
        (fitness * (1.0 - share)).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nlp::annotate;
    use crate::pattern::{Attr, AttrValue, TokenConstraint};

    fn test_samples() -> Vec<Sample> {
        [
            "I am a raccoon!",
            "You are a cat!",
            "Is she a rabbit?",
            "This is a test",
        ]
        .iter()
        .map(|s| annotate(s))
        .collect()
    }

    fn constraint(attr: Attr, value: &str) -> TokenConstraint {
        let mut c = TokenConstraint::default();
        c.attrs.insert(attr, AttrValue::Text(value.to_string()));
        c
    }

    #[test]
    fn test_basic_fitness_counts_partial_matches() {
        let samples = test_samples();
        let evaluator = FitnessEvaluator::new(&samples, &Config::default());

        // Every sample contains a determiner.
        let pattern = Pattern {
            tokens: vec![constraint(Attr::Tag, "DT")],
        };
        assert_eq!(evaluator.evaluate(&pattern), 1.0);

        // Only the first sample contains "raccoon".
        let pattern = Pattern {
            tokens: vec![constraint(Attr::Lower, "raccoon")],
        };
        assert_eq!(evaluator.evaluate(&pattern), 0.25);
    }

    #[test]
    fn test_full_match_fitness_requires_whole_sample() {
        let samples = test_samples();
        let config = Config {
            fitness_function: FitnessType::FullMatch,
            ..Config::default()
        };
        let evaluator = FitnessEvaluator::new(&samples, &config);

        // PRON AUX DET NOUN covers exactly "This is a test"; the other
        // samples carry trailing punctuation.
        let pattern = Pattern {
            tokens: vec![
                constraint(Attr::Pos, "PRON"),
                constraint(Attr::Pos, "AUX"),
                constraint(Attr::Pos, "DET"),
                constraint(Attr::Pos, "NOUN"),
            ],
        };
        assert_eq!(evaluator.evaluate(&pattern), 0.25);

        // Basic matching also credits the two samples where the sequence
        // appears mid-sentence; "Is she a rabbit?" opens with the auxiliary
        // and never lines up.
        let basic = FitnessEvaluator::new(&samples, &Config::default());
        assert_eq!(basic.evaluate(&pattern), 0.75);
    }

    #[test]
    fn test_non_matching_pattern_scores_zero() {
        let samples = test_samples();
        let evaluator = FitnessEvaluator::new(&samples, &Config::default());
        let pattern = Pattern {
            tokens: vec![constraint(Attr::Text, "unobserved")],
        };
        assert_eq!(evaluator.evaluate(&pattern), 0.0);
    }

    #[test]
    fn test_empty_pattern_scores_zero() {
        let samples = test_samples();
        let evaluator = FitnessEvaluator::new(&samples, &Config::default());
        assert_eq!(evaluator.evaluate(&Pattern::default()), 0.0);
    }

    #[test]
    fn test_fitness_stays_in_unit_interval() {
        let samples = test_samples();
        let evaluator = FitnessEvaluator::new(&samples, &Config::default());
        for value in ["a", "am", "!", "nope"] {
            let pattern = Pattern {
                tokens: vec![constraint(Attr::Lower, value)],
            };
            let fitness = evaluator.evaluate(&pattern);
            assert!((0.0..=1.0).contains(&fitness), "fitness {}", fitness);
        }
    }

    #[test]
    fn test_wildcard_penalty_scales_fitness() {
        let samples = test_samples();
        let config = Config {
            use_token_wildcard: true,
            ..Config::default()
        };
        let evaluator = FitnessEvaluator::new(&samples, &config);

        // DT followed by a wildcard matches "a <noun>" in every sample, so
        // the raw score is 1.0; one of the two groups is a wildcard, which
        // halves it.
        let pattern = Pattern {
            tokens: vec![constraint(Attr::Tag, "DT"), TokenConstraint::default()],
        };
        assert_eq!(evaluator.evaluate(&pattern), 0.5);

        // A pure wildcard pattern matches everything yet scores nothing.
        let pattern = Pattern {
            tokens: vec![TokenConstraint::default()],
        };
        assert_eq!(evaluator.evaluate(&pattern), 0.0);
    }
}
