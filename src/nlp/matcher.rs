//! Rule-based sequence matcher for decoded patterns.
//!
//! Interprets a [`Pattern`] against a [`Sample`]'s token sequence with
//! greedy, backtracking regex-like semantics: each constraint group must
//! match the tokens at its position, repeated according to its quantifier.

use crate::nlp::{AnnotatedToken, Sample};
use crate::pattern::{Pattern, Quantifier, TokenConstraint};

/// Outcome of matching one pattern against one sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MatchOutcome {
    /// The pattern matched a non-empty token span somewhere in the sample.
    pub any_match: bool,
    /// The pattern matched the entire token sequence.
    pub full_match: bool,
}

/// Matches `pattern` against `sample`, reporting partial and full outcomes.
///
/// A zero-length span (possible when every group is optional) does not count
/// as a match; `full_match` additionally requires the span to cover every
/// token of the sample.
pub fn match_pattern(pattern: &Pattern, sample: &Sample) -> MatchOutcome {
    if pattern.is_empty() || sample.is_empty() {
        return MatchOutcome::default();
    }

    let tokens = &sample.tokens;
    let full_match = match_from(&pattern.tokens, 0, tokens, 0, true).is_some();
    let any_match = full_match
        || (0..tokens.len())
            .any(|start| matches!(match_from(&pattern.tokens, 0, tokens, start, false), Some(end) if end > start));

    MatchOutcome {
        any_match,
        full_match,
    }
}

fn constraint_matches(constraint: &TokenConstraint, token: &AnnotatedToken) -> bool {
    constraint
        .attrs
        .iter()
        .all(|(attr, value)| token.value_of(*attr) == *value)
}

/// Tries to match groups `pi..` starting at token `ti`, returning the end of
/// the matched span. Quantified groups consume greedily and backtrack; when
/// `require_end` is set only spans ending exactly at the last token succeed.
fn match_from(
    groups: &[TokenConstraint],
    pi: usize,
    tokens: &[AnnotatedToken],
    ti: usize,
    require_end: bool,
) -> Option<usize> {
    if pi == groups.len() {
        if require_end && ti != tokens.len() {
            return None;
        }
        return Some(ti);
    }

    let group = &groups[pi];
    match group.op {
        Quantifier::One => {
            if ti < tokens.len() && constraint_matches(group, &tokens[ti]) {
                match_from(groups, pi + 1, tokens, ti + 1, require_end)
            } else {
                None
            }
        }
        Quantifier::ZeroOrOne => {
            if ti < tokens.len() && constraint_matches(group, &tokens[ti]) {
                if let Some(end) = match_from(groups, pi + 1, tokens, ti + 1, require_end) {
                    return Some(end);
                }
            }
            match_from(groups, pi + 1, tokens, ti, require_end)
        }
        Quantifier::ZeroOrMore => {
            let longest = greedy_run(group, tokens, ti);
            let mut stop = longest;
            loop {
                if let Some(end) = match_from(groups, pi + 1, tokens, stop, require_end) {
                    return Some(end);
                }
                if stop == ti {
                    return None;
                }
                stop -= 1;
            }
        }
        Quantifier::OneOrMore => {
            if ti >= tokens.len() || !constraint_matches(group, &tokens[ti]) {
                return None;
            }
            let longest = greedy_run(group, tokens, ti);
            let mut stop = longest;
            while stop > ti {
                if let Some(end) = match_from(groups, pi + 1, tokens, stop, require_end) {
                    return Some(end);
                }
                stop -= 1;
            }
            None
        }
    }
}

/// Index just past the longest run of tokens matching `group` from `ti`.
fn greedy_run(group: &TokenConstraint, tokens: &[AnnotatedToken], ti: usize) -> usize {
    let mut end = ti;
    while end < tokens.len() && constraint_matches(group, &tokens[end]) {
        end += 1;
    }
    end
}
