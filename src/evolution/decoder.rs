use crate::config::Config;
use crate::evolution::grammar::{Grammar, START_SYMBOL, TOKEN_SYMBOL, TOKEN_WILDCARD};
use crate::evolution::{genotype_to_bits, Genotype};
use crate::pattern::{Attr, AttrValue, Pattern, Quantifier, TokenConstraint};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum DecodingError {
    #[error("Cannot decode an empty genotype")]
    EmptyGenotype,
    #[error("Expansion budget ({limit}) exceeded while decoding genotype {genotype}")]
    ExpansionBudgetExceeded { limit: usize, genotype: String },
    #[error("Invalid grammar: non-terminal '{non_terminal}' has no production rules")]
    MissingRule { non_terminal: String },
}

/// Tracks codon consumption and the expansion budget for one decode.
struct DecodingContext<'a> {
    genotype: &'a Genotype,
    codons: Vec<u32>,
    codon_idx: usize,
    expansions: usize,
}

impl<'a> DecodingContext<'a> {
    fn new(genotype: &'a Genotype, codon_width: usize) -> Self {
        Self {
            genotype,
            codons: transcribe(genotype, codon_width),
            codon_idx: 0,
            expansions: 0,
        }
    }

    /// The next codon value, wrapping back to the first codon when the
    /// genotype is exhausted before derivation completes.
    fn next_codon(&mut self) -> u32 {
        let codon = self.codons[self.codon_idx];
        self.codon_idx = (self.codon_idx + 1) % self.codons.len();
        codon
    }
}

/// Splits a bit string into fixed-width codon values.
///
/// A shorter trailing chunk is kept as a smaller integer, so an 8-bit
/// genotype with 7-bit codons transcribes to two codons.
fn transcribe(genotype: &Genotype, codon_width: usize) -> Vec<u32> {
    genotype
        .chunks(codon_width)
        .map(|chunk| {
            chunk
                .iter()
                .fold(0u32, |acc, &bit| (acc << 1) | u32::from(bit))
        })
        .collect()
}

/// Maps genotypes to patterns through grammar-driven derivation.
///
/// Starting at the grammar's start rule, each non-terminal expansion
/// consumes one codon and picks among the rule's alternatives by
/// `codon % alternatives`, depth-first. Decoding is a pure function of
/// (genotype, grammar, configuration): identical inputs always produce
/// identical patterns.
#[derive(Clone)]
pub struct Decoder<'a> {
    grammar: &'a Grammar,
    codon_width: usize,
    max_expansions: usize,
}

impl<'a> Decoder<'a> {
    /// Creates a new `Decoder`.
    ///
    /// # Arguments
    /// * `grammar` - Reference to the `Grammar` driving the derivation
    /// * `config` - Source of `codon_width` and the `max_expansions` budget
    ///
    /// # Returns
    /// * `Self` - A decoder borrowing the shared grammar
    pub fn new(grammar: &'a Grammar, config: &Config) -> Self {
        Self {
            grammar,
            codon_width: config.codon_width,
            max_expansions: config.max_expansions,
        }
    }

    /// Decodes a genotype into its pattern.
    ///
    /// # Arguments
    /// * `genotype` - The bit string to derive from
    ///
    /// # Returns
    /// * `Result<Pattern, DecodingError>` - The derived pattern, or an error
    ///   when the genotype is empty or the expansion budget is exhausted
    ///   (pathological wrap-around recursion)
    pub fn decode(&self, genotype: &Genotype) -> Result<Pattern, DecodingError> {
        if genotype.is_empty() {
            return Err(DecodingError::EmptyGenotype);
        }
        let mut context = DecodingContext::new(genotype, self.codon_width);
        let mut pattern = Pattern::default();
        self.expand(START_SYMBOL, &mut context, &mut pattern)?;
        Ok(pattern)
    }

    /// Expands one symbol: non-terminals recurse through a codon-selected
    /// alternative, terminals are applied to the pattern under construction.
    fn expand(
        &self,
        symbol: &str,
        context: &mut DecodingContext,
        pattern: &mut Pattern,
    ) -> Result<(), DecodingError> {
        if context.expansions >= self.max_expansions {
            return Err(DecodingError::ExpansionBudgetExceeded {
                limit: self.max_expansions,
                genotype: genotype_to_bits(context.genotype),
            });
        }
        context.expansions += 1;

        if self.grammar.is_non_terminal(symbol) {
            // Entering the token rule opens the constraint group that the
            // terminals below it will populate.
            if symbol == TOKEN_SYMBOL {
                pattern.tokens.push(TokenConstraint::default());
            }

            let productions =
                self.grammar
                    .rules
                    .get(symbol)
                    .ok_or_else(|| DecodingError::MissingRule {
                        non_terminal: symbol.to_string(),
                    })?;

            let choice = context.next_codon() as usize % productions.len();
            for s in &productions[choice] {
                self.expand(s, context, pattern)?;
            }
        } else {
            apply_terminal(symbol, pattern);
        }

        Ok(())
    }
}

/// Translates one terminal into its effect on the current constraint group.
/// The wildcard leaves the group empty; malformed terminals are ignored.
fn apply_terminal(terminal: &str, pattern: &mut Pattern) {
    if terminal == TOKEN_WILDCARD {
        return;
    }
    let Some((key, value)) = terminal.split_once('=') else {
        return;
    };
    let Some(group) = pattern.tokens.last_mut() else {
        return;
    };

    if key == "OP" {
        if let Some(op) = Quantifier::from_symbol(value) {
            group.op = op;
        }
    } else if let Some(attr) = Attr::from_key(key) {
        let value = if attr.is_flag() {
            AttrValue::Flag(value == "true")
        } else {
            AttrValue::Text(value.to_string())
        };
        group.attrs.insert(attr, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evolution::genotype_from_bits;
    use crate::evolution::grammar::build_grammar;
    use crate::nlp::annotate;
    use crate::nlp::Sample;

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

    #[test]
    fn test_transcription_keeps_short_trailing_codon() {
        let genotype = genotype_from_bits("11111111").unwrap();
        assert_eq!(transcribe(&genotype, 7), vec![127, 1]);

        let genotype = genotype_from_bits("0010100").unwrap();
        assert_eq!(transcribe(&genotype, 7), vec![20]);
    }

    #[test]
    fn test_decode_known_genotype() {
        let samples = test_samples();
        let config = Config::default();
        let grammar = build_grammar(&samples, &config).unwrap();
        let decoder = Decoder::new(&grammar, &config);

        // Codons (width 7): 20, 90, 6, 60, 14. Derivation picks a single
        // token constraining the fine-grained tag, wrapping once to choose
        // the tag value: 20 % 6 tags -> "DT".
        let genotype = genotype_from_bits("00101001011010000011001111001110").unwrap();
        let pattern = decoder.decode(&genotype).unwrap();
        assert_eq!(pattern.to_string(), r#"[{"TAG":"DT"}]"#);
    }

    #[test]
    fn test_decode_is_pure() {
        let samples = test_samples();
        let config = Config::default();
        let grammar = build_grammar(&samples, &config).unwrap();
        let decoder = Decoder::new(&grammar, &config);

        let genotype = genotype_from_bits("00101001011010000011001111001110").unwrap();
        let first = decoder.decode(&genotype).unwrap();
        let second = decoder.decode(&genotype).unwrap();
        let third = decoder.decode(&genotype).unwrap();
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    #[test]
    fn test_empty_genotype_is_rejected() {
        let samples = test_samples();
        let config = Config::default();
        let grammar = build_grammar(&samples, &config).unwrap();
        let decoder = Decoder::new(&grammar, &config);

        assert_eq!(
            decoder.decode(&Vec::new()).unwrap_err(),
            DecodingError::EmptyGenotype
        );
    }

    #[test]
    fn test_expansion_budget_bounds_pathological_wrapping() {
        let samples = test_samples();
        let config = Config::default();
        let grammar = build_grammar(&samples, &config).unwrap();
        let decoder = Decoder::new(&grammar, &config);

        // All-ones codons always pick the recursive alternative of
        // <pattern>, so derivation can never complete.
        let genotype = genotype_from_bits("11111111111111").unwrap();
        let result = decoder.decode(&genotype);
        assert!(matches!(
            result,
            Err(DecodingError::ExpansionBudgetExceeded { .. })
        ));
    }

    #[test]
    fn test_quantifier_terminal_sets_group_op() {
        let samples = test_samples();
        let config = Config::default();
        let grammar = build_grammar(&samples, &config).unwrap();
        let decoder = Decoder::new(&grammar, &config);

        // Codons: 0, 0, 1, 0, 0, 0, 1 — one token taking the <features> <op>
        // alternative, first attribute (TEXT), first value, operator "*".
        let genotype = genotype_from_bits(concat!(
            "0000000", "0000000", "0000001", "0000000", "0000000", "0000000", "0000001"
        ))
        .unwrap();
        let pattern = decoder.decode(&genotype).unwrap();
        assert_eq!(pattern.to_string(), r#"[{"TEXT":"I","OP":"*"}]"#);
        assert_eq!(pattern.tokens[0].op, Quantifier::ZeroOrMore);
    }
}
