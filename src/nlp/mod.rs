pub mod matcher;

use crate::pattern::{Attr, AttrValue};

/// Linguistic annotations for one token of a sample.
///
/// The evolution engine treats this record as read-only input: it only ever
/// compares attribute values, so any annotator that fills these fields
/// deterministically can feed the engine. The built-in [`annotate`] function
/// is a small rule-based pipeline; callers with access to a richer tagger can
/// construct `AnnotatedToken`s directly instead.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotatedToken {
    /// Verbatim token text.
    pub text: String,
    /// Lowercased form.
    pub lower: String,
    /// Lemma (base form).
    pub lemma: String,
    /// Coarse part-of-speech tag (PRON, AUX, DET, NOUN, NUM, PUNCT).
    pub pos: String,
    /// Fine-grained tag (PRP, VBZ, DT, NN, ...).
    pub tag: String,
    /// Dependency label.
    pub dep: String,
    /// Orthographic shape signature, runs capped at four (`Xxxx`, `dd`, ...).
    pub shape: String,
    /// Named-entity label; empty when the token is not part of an entity.
    pub ent_type: String,
    pub is_alpha: bool,
    pub is_stop: bool,
    pub is_punct: bool,
}

impl AnnotatedToken {
    /// The value this token carries for a pattern attribute.
    pub fn value_of(&self, attr: Attr) -> AttrValue {
        match attr {
            Attr::Text => AttrValue::Text(self.text.clone()),
            Attr::Lower => AttrValue::Text(self.lower.clone()),
            Attr::Lemma => AttrValue::Text(self.lemma.clone()),
            Attr::Pos => AttrValue::Text(self.pos.clone()),
            Attr::Tag => AttrValue::Text(self.tag.clone()),
            Attr::Dep => AttrValue::Text(self.dep.clone()),
            Attr::Shape => AttrValue::Text(self.shape.clone()),
            Attr::EntType => AttrValue::Text(self.ent_type.clone()),
            Attr::IsAlpha => AttrValue::Flag(self.is_alpha),
            Attr::IsStop => AttrValue::Flag(self.is_stop),
            Attr::IsPunct => AttrValue::Flag(self.is_punct),
        }
    }
}

/// One annotated example sequence, immutable for the duration of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    /// The raw text the sample was built from.
    pub text: String,
    /// Ordered token annotations.
    pub tokens: Vec<AnnotatedToken>,
}

impl Sample {
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

const PRONOUNS: &[&str] = &[
    "i", "you", "he", "she", "it", "we", "they", "this", "that", "these", "those", "who", "what",
];

const DETERMINERS: &[&str] = &["a", "an", "the"];

const AUXILIARIES: &[&str] = &[
    "am", "is", "are", "was", "were", "be", "been", "being", "do", "does", "did", "have", "has",
    "had",
];

const STOP_WORDS: &[&str] = &[
    "a", "an", "the", "i", "you", "he", "she", "it", "we", "they", "this", "that", "these",
    "those", "am", "is", "are", "was", "were", "be", "been", "being", "do", "does", "did", "have",
    "has", "had", "and", "or", "not", "no", "of", "in", "on", "at", "to", "with", "for", "from",
    "by", "as", "so", "if",
];

/// Annotates a raw text into a [`Sample`].
///
/// Deterministic by construction: the same input text always produces the
/// same annotations, which the grammar builder and the reproducibility
/// guarantees of the engine rely on.
pub fn annotate(text: &str) -> Sample {
    let tokens = tokenize(text)
        .into_iter()
        .map(|t| annotate_token(&t))
        .collect();
    Sample {
        text: text.to_string(),
        tokens,
    }
}

/// Splits on whitespace, then peels leading and trailing punctuation into
/// tokens of their own ("raccoon!" -> "raccoon", "!").
fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    for chunk in text.split_whitespace() {
        let chars: Vec<char> = chunk.chars().collect();
        let mut start = 0;
        let mut end = chars.len();

        let mut leading = Vec::new();
        while start < end && chars[start].is_ascii_punctuation() {
            leading.push(chars[start].to_string());
            start += 1;
        }
        let mut trailing = Vec::new();
        while end > start && chars[end - 1].is_ascii_punctuation() {
            trailing.push(chars[end - 1].to_string());
            end -= 1;
        }

        tokens.extend(leading);
        if start < end {
            tokens.push(chars[start..end].iter().collect());
        }
        trailing.reverse();
        tokens.extend(trailing);
    }
    tokens
}

fn annotate_token(text: &str) -> AnnotatedToken {
    let lower: String = text.to_lowercase();
    let is_alpha = !text.is_empty() && text.chars().all(|c| c.is_alphabetic());
    let is_punct = !text.is_empty() && text.chars().all(|c| c.is_ascii_punctuation());
    let is_digit = !text.is_empty() && text.chars().all(|c| c.is_ascii_digit());

    let (pos, tag, dep) = if is_punct {
        ("PUNCT", ".".to_string(), "punct")
    } else if PRONOUNS.contains(&lower.as_str()) {
        ("PRON", "PRP".to_string(), "nsubj")
    } else if AUXILIARIES.contains(&lower.as_str()) {
        ("AUX", verb_tag(&lower), "ROOT")
    } else if DETERMINERS.contains(&lower.as_str()) {
        ("DET", "DT".to_string(), "det")
    } else if is_digit {
        ("NUM", "CD".to_string(), "nummod")
    } else {
        ("NOUN", "NN".to_string(), "obj")
    };

    AnnotatedToken {
        text: text.to_string(),
        lemma: lemma_of(&lower),
        shape: shape_of(text),
        ent_type: String::new(),
        is_alpha,
        is_stop: STOP_WORDS.contains(&lower.as_str()),
        is_punct,
        pos: pos.to_string(),
        tag,
        dep: dep.to_string(),
        lower,
    }
}

fn verb_tag(lower: &str) -> String {
    match lower {
        "am" | "are" | "do" | "have" => "VBP",
        "is" | "does" | "has" => "VBZ",
        "was" | "were" | "did" | "had" => "VBD",
        "been" => "VBN",
        "being" => "VBG",
        _ => "VB",
    }
    .to_string()
}

fn lemma_of(lower: &str) -> String {
    match lower {
        "am" | "is" | "are" | "was" | "were" | "been" | "being" => "be",
        "does" | "did" => "do",
        "has" | "had" => "have",
        other => other,
    }
    .to_string()
}

/// Orthographic shape: uppercase -> `X`, lowercase -> `x`, digit -> `d`,
/// anything else kept as-is. Runs of the same shape character are capped at
/// four, so "raccoon" -> "xxxx" and "12345" -> "dddd".
fn shape_of(text: &str) -> String {
    let mut shape = String::new();
    let mut last = '\0';
    let mut run = 0;
    for c in text.chars() {
        let s = if c.is_uppercase() {
            'X'
        } else if c.is_lowercase() {
            'x'
        } else if c.is_ascii_digit() {
            'd'
        } else {
            c
        };
        if s == last {
            run += 1;
        } else {
            last = s;
            run = 1;
        }
        if run <= 4 {
            shape.push(s);
        }
    }
    shape
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_splits_trailing_punctuation() {
        assert_eq!(tokenize("I am a raccoon!"), vec!["I", "am", "a", "raccoon", "!"]);
        assert_eq!(tokenize("Is she a rabbit?"), vec!["Is", "she", "a", "rabbit", "?"]);
    }

    #[test]
    fn test_tokenize_leading_and_all_punct_chunks() {
        assert_eq!(tokenize("\"hi\""), vec!["\"", "hi", "\""]);
        assert_eq!(tokenize("?!"), vec!["?", "!"]);
        assert_eq!(tokenize("   "), Vec::<String>::new());
    }

    #[test]
    fn test_annotate_is_deterministic() {
        let a = annotate("You are a cat!");
        let b = annotate("You are a cat!");
        assert_eq!(a, b);
    }

    #[test]
    fn test_annotate_tags_determiner() {
        let sample = annotate("I am a raccoon!");
        assert_eq!(sample.len(), 5);

        let det = &sample.tokens[2];
        assert_eq!(det.text, "a");
        assert_eq!(det.pos, "DET");
        assert_eq!(det.tag, "DT");
        assert!(det.is_stop);
        assert!(!det.is_punct);
    }

    #[test]
    fn test_annotate_punctuation_and_flags() {
        let sample = annotate("I am a raccoon!");
        let bang = &sample.tokens[4];
        assert_eq!(bang.text, "!");
        assert_eq!(bang.pos, "PUNCT");
        assert_eq!(bang.tag, ".");
        assert!(bang.is_punct);
        assert!(!bang.is_alpha);
    }

    #[test]
    fn test_lemma_of_copula_forms() {
        let sample = annotate("Is she a rabbit?");
        assert_eq!(sample.tokens[0].lemma, "be");
        assert_eq!(sample.tokens[0].tag, "VBZ");
        assert_eq!(sample.tokens[3].lemma, "rabbit");
    }

    #[test]
    fn test_shape_caps_runs_at_four() {
        assert_eq!(shape_of("I"), "X");
        assert_eq!(shape_of("You"), "Xxx");
        assert_eq!(shape_of("raccoon"), "xxxx");
        assert_eq!(shape_of("A1b!"), "Xdx!");
        assert_eq!(shape_of("12345"), "dddd");
    }

    #[test]
    fn test_value_of_covers_flags() {
        let sample = annotate("This is a test");
        let token = &sample.tokens[3];
        assert_eq!(token.value_of(Attr::Text), AttrValue::Text("test".to_string()));
        assert_eq!(token.value_of(Attr::IsAlpha), AttrValue::Flag(true));
        assert_eq!(token.value_of(Attr::EntType), AttrValue::Text(String::new()));
    }
}
