use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Token attribute names a pattern may constrain.
///
/// The engine relies on `ALL` as the single canonical ordering: grammar rule
/// alternatives are emitted in this order, which in turn fixes how codon
/// values map to attribute choices during decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Attr {
    Text,
    Lower,
    Lemma,
    Pos,
    Tag,
    Dep,
    Shape,
    EntType,
    IsAlpha,
    IsStop,
    IsPunct,
}

impl Attr {
    pub const ALL: [Attr; 11] = [
        Attr::Text,
        Attr::Lower,
        Attr::Lemma,
        Attr::Pos,
        Attr::Tag,
        Attr::Dep,
        Attr::Shape,
        Attr::EntType,
        Attr::IsAlpha,
        Attr::IsStop,
        Attr::IsPunct,
    ];

    /// spaCy-style attribute key, also used inside grammar terminals.
    pub fn key(self) -> &'static str {
        match self {
            Attr::Text => "TEXT",
            Attr::Lower => "LOWER",
            Attr::Lemma => "LEMMA",
            Attr::Pos => "POS",
            Attr::Tag => "TAG",
            Attr::Dep => "DEP",
            Attr::Shape => "SHAPE",
            Attr::EntType => "ENT_TYPE",
            Attr::IsAlpha => "IS_ALPHA",
            Attr::IsStop => "IS_STOP",
            Attr::IsPunct => "IS_PUNCT",
        }
    }

    /// The grammar rule symbol that enumerates this attribute's observed values.
    pub fn rule_symbol(self) -> String {
        format!("<{}>", self.key())
    }

    pub fn from_key(key: &str) -> Option<Attr> {
        Attr::ALL.iter().copied().find(|a| a.key() == key)
    }

    /// Boolean-flag attributes carry `true`/`false` values instead of text.
    pub fn is_flag(self) -> bool {
        matches!(self, Attr::IsAlpha | Attr::IsStop | Attr::IsPunct)
    }
}

/// A constrained attribute value: either literal text or a boolean flag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    Text(String),
    Flag(bool),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Text(s) => write!(f, "{}", s),
            AttrValue::Flag(b) => write!(f, "{}", b),
        }
    }
}

/// Repetition operator attached to one constraint group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quantifier {
    /// Match exactly one token (no explicit operator).
    #[default]
    One,
    /// `?` — zero or one token.
    ZeroOrOne,
    /// `*` — any number of tokens, including none.
    ZeroOrMore,
    /// `+` — at least one token.
    OneOrMore,
}

impl Quantifier {
    /// The operator symbol as it appears in rendered patterns, if any.
    pub fn symbol(self) -> Option<&'static str> {
        match self {
            Quantifier::One => None,
            Quantifier::ZeroOrOne => Some("?"),
            Quantifier::ZeroOrMore => Some("*"),
            Quantifier::OneOrMore => Some("+"),
        }
    }

    pub fn from_symbol(symbol: &str) -> Option<Quantifier> {
        match symbol {
            "?" => Some(Quantifier::ZeroOrOne),
            "*" => Some(Quantifier::ZeroOrMore),
            "+" => Some(Quantifier::OneOrMore),
            _ => None,
        }
    }
}

/// One position of a pattern: attribute constraints plus a quantifier.
///
/// An empty constraint map is the token wildcard — it accepts any token.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TokenConstraint {
    pub attrs: BTreeMap<Attr, AttrValue>,
    pub op: Quantifier,
}

impl TokenConstraint {
    pub fn is_wildcard(&self) -> bool {
        self.attrs.is_empty()
    }
}

impl Serialize for TokenConstraint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(self.op.symbol().is_some());
        let mut map = serializer.serialize_map(Some(self.attrs.len() + extra))?;
        for (attr, value) in &self.attrs {
            match value {
                AttrValue::Text(s) => map.serialize_entry(attr.key(), s)?,
                AttrValue::Flag(b) => map.serialize_entry(attr.key(), b)?,
            }
        }
        if let Some(op) = self.op.symbol() {
            map.serialize_entry("OP", op)?;
        }
        map.end()
    }
}

/// A decoded phenotype: the ordered sequence of constraint groups.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
#[serde(transparent)]
pub struct Pattern {
    pub tokens: Vec<TokenConstraint>,
}

impl Pattern {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn wildcard_count(&self) -> usize {
        self.tokens.iter().filter(|t| t.is_wildcard()).count()
    }
}

impl fmt::Display for Pattern {
    /// Renders the pattern in the rule-based-matcher JSON form, e.g.
    /// `[{"TAG":"DT"},{"LOWER":"cat","OP":"+"}]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => write!(f, "[<unrenderable pattern>]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_key_round_trip() {
        for attr in Attr::ALL {
            assert_eq!(Attr::from_key(attr.key()), Some(attr));
        }
        assert_eq!(Attr::from_key("NO_SUCH_ATTR"), None);
    }

    #[test]
    fn test_quantifier_symbols() {
        assert_eq!(Quantifier::One.symbol(), None);
        assert_eq!(Quantifier::from_symbol("*"), Some(Quantifier::ZeroOrMore));
        assert_eq!(Quantifier::from_symbol("x"), None);
    }

    #[test]
    fn test_pattern_renders_as_matcher_json() {
        let mut first = TokenConstraint::default();
        first.attrs.insert(Attr::Tag, AttrValue::Text("DT".to_string()));
        let mut second = TokenConstraint::default();
        second
            .attrs
            .insert(Attr::Lower, AttrValue::Text("cat".to_string()));
        second
            .attrs
            .insert(Attr::IsAlpha, AttrValue::Flag(true));
        second.op = Quantifier::OneOrMore;

        let pattern = Pattern {
            tokens: vec![first, second],
        };
        assert_eq!(
            pattern.to_string(),
            r#"[{"TAG":"DT"},{"LOWER":"cat","IS_ALPHA":true,"OP":"+"}]"#
        );
    }

    #[test]
    fn test_wildcard_detection() {
        let wildcard = TokenConstraint::default();
        assert!(wildcard.is_wildcard());
        assert_eq!(wildcard.attrs.len(), 0);

        let pattern = Pattern {
            tokens: vec![wildcard, TokenConstraint::default()],
        };
        assert_eq!(pattern.wildcard_count(), 2);
        assert_eq!(pattern.to_string(), "[{},{}]");
    }
}
