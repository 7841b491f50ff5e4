use crate::config::Config;
use crate::nlp::Sample;
use crate::pattern::Attr;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum GrammarError {
    #[error("Cannot build a grammar from an empty sample set")]
    EmptySampleSet,
    #[error("Sample set yields no usable attribute values")]
    NoUsableAttributes,
    #[error("Undefined non-terminal referenced in grammar: '{0}'")]
    UndefinedNonTerminal(String),
    #[error("Unreachable rule in grammar: {0}")]
    UnreachableRule(String),
    #[error("Non-terminating rule in grammar: {0}")]
    NonTerminatingRule(String),
}

/// Derivation entry point.
pub const START_SYMBOL: &str = "<start>";
/// Sequence of one or more tokens.
pub const PATTERN_SYMBOL: &str = "<pattern>";
/// One constraint group; decoding opens a new group when expanding this rule.
pub const TOKEN_SYMBOL: &str = "<token>";
/// One or more attribute constraints within a group.
pub const FEATURES_SYMBOL: &str = "<features>";
/// A single attribute constraint.
pub const FEATURE_SYMBOL: &str = "<feature>";
/// Repetition operator choice.
pub const OP_SYMBOL: &str = "<op>";
/// Terminal standing for the unconstrained token wildcard.
pub const TOKEN_WILDCARD: &str = "{}";

/// A bounded derivation grammar over the attribute vocabulary observed in a
/// sample set, validated for logical consistency.
///
/// Rules map a non-terminal to its ordered alternative expansions; terminals
/// are `ATTR=value` pairs, `OP=x` quantifier tokens, or the token wildcard.
/// Alternative order is deterministic for a given sample sequence, which the
/// codec's reproducibility guarantee builds on.
#[derive(Debug, Clone, PartialEq)]
pub struct Grammar {
    pub rules: HashMap<String, Vec<Vec<String>>>,
}

impl Grammar {
    /// Checks if a given symbol is a non-terminal.
    ///
    /// Non-terminals have the form `<NAME>`; the degenerate `<>` does not
    /// qualify.
    pub fn is_non_terminal(&self, symbol: &str) -> bool {
        symbol.starts_with('<') && symbol.ends_with('>') && symbol.len() > 2
    }

    /// Validates that the rule set is structurally sound: every referenced
    /// non-terminal is defined, every rule is reachable from the start
    /// symbol, and every rule has at least one terminating expansion.
    fn validate(&self) -> Result<(), GrammarError> {
        use std::collections::VecDeque;

        // 1. Undefined non-terminals
        for productions in self.rules.values() {
            for production in productions {
                for symbol in production {
                    if self.is_non_terminal(symbol) && !self.rules.contains_key(symbol) {
                        return Err(GrammarError::UndefinedNonTerminal(symbol.clone()));
                    }
                }
            }
        }

        // 2. Reachability from the start symbol (BFS)
        let mut reachable = HashSet::new();
        let mut queue = VecDeque::new();
        queue.push_back(START_SYMBOL.to_string());
        reachable.insert(START_SYMBOL.to_string());
        while let Some(current) = queue.pop_front() {
            if let Some(productions) = self.rules.get(&current) {
                for production in productions {
                    for symbol in production {
                        if self.is_non_terminal(symbol)
                            && !reachable.contains(symbol)
                            && self.rules.contains_key(symbol)
                        {
                            reachable.insert(symbol.clone());
                            queue.push_back(symbol.clone());
                        }
                    }
                }
            }
        }
        for rule in self.rules.keys() {
            if !reachable.contains(rule) {
                return Err(GrammarError::UnreachableRule(rule.clone()));
            }
        }

        // 3. Termination: grow the terminating set to a fixpoint
        let mut terminating = HashSet::new();
        let mut changed = true;
        while changed {
            changed = false;
            for (lhs, productions) in &self.rules {
                if terminating.contains(lhs) {
                    continue;
                }
                for production in productions {
                    if production
                        .iter()
                        .all(|s| !self.is_non_terminal(s) || terminating.contains(s))
                    {
                        terminating.insert(lhs.clone());
                        changed = true;
                        break;
                    }
                }
            }
        }
        for rule in self.rules.keys() {
            if !terminating.contains(rule) {
                return Err(GrammarError::NonTerminatingRule(rule.clone()));
            }
        }

        Ok(())
    }
}

/// Builds the derivation grammar for a sample set.
///
/// Attribute rules enumerate only values actually observed across the
/// samples (in first-seen order), bounding the search space to vocabulary
/// that can possibly match. Two calls with the same samples in the same
/// order produce structurally identical grammars.
///
/// # Arguments
/// * `samples` - Annotated samples to draw the attribute vocabulary from
/// * `config` - Engine configuration; only `use_token_wildcard` matters here
///
/// # Returns
/// * `Result<Grammar, GrammarError>` - The validated grammar, or an error
///   when the sample set is empty or carries no usable attribute values
pub fn build_grammar(samples: &[Sample], config: &Config) -> Result<Grammar, GrammarError> {
    if samples.is_empty() {
        return Err(GrammarError::EmptySampleSet);
    }

    let mut rules: HashMap<String, Vec<Vec<String>>> = HashMap::new();
    let mut feature_alternatives = Vec::new();

    for attr in Attr::ALL {
        let values = observed_values(samples, attr);
        if values.is_empty() {
            continue;
        }
        let alternatives = values
            .into_iter()
            .map(|v| vec![format!("{}={}", attr.key(), v)])
            .collect();
        rules.insert(attr.rule_symbol(), alternatives);
        feature_alternatives.push(vec![attr.rule_symbol()]);
    }

    if feature_alternatives.is_empty() {
        return Err(GrammarError::NoUsableAttributes);
    }

    rules.insert(
        START_SYMBOL.to_string(),
        vec![vec![PATTERN_SYMBOL.to_string()]],
    );
    rules.insert(
        PATTERN_SYMBOL.to_string(),
        vec![
            vec![TOKEN_SYMBOL.to_string()],
            vec![TOKEN_SYMBOL.to_string(), PATTERN_SYMBOL.to_string()],
        ],
    );

    let mut token_alternatives = vec![
        vec![FEATURES_SYMBOL.to_string()],
        vec![FEATURES_SYMBOL.to_string(), OP_SYMBOL.to_string()],
    ];
    if config.use_token_wildcard {
        token_alternatives.push(vec![TOKEN_WILDCARD.to_string()]);
    }
    rules.insert(TOKEN_SYMBOL.to_string(), token_alternatives);

    rules.insert(
        FEATURES_SYMBOL.to_string(),
        vec![
            vec![FEATURE_SYMBOL.to_string()],
            vec![FEATURE_SYMBOL.to_string(), FEATURES_SYMBOL.to_string()],
        ],
    );
    rules.insert(FEATURE_SYMBOL.to_string(), feature_alternatives);
    rules.insert(
        OP_SYMBOL.to_string(),
        vec![
            vec!["OP=?".to_string()],
            vec!["OP=*".to_string()],
            vec!["OP=+".to_string()],
        ],
    );

    let grammar = Grammar { rules };
    grammar.validate()?;
    Ok(grammar)
}

/// Unique values observed for one attribute, in first-seen order.
/// Empty strings carry no constraint and are skipped.
fn observed_values(samples: &[Sample], attr: Attr) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut values = Vec::new();
    for sample in samples {
        for token in &sample.tokens {
            let value = token.value_of(attr).to_string();
            if value.is_empty() {
                continue;
            }
            if seen.insert(value.clone()) {
                values.push(value);
            }
        }
    }
    values
}
