//! Query and title normalization.
//!
//! Produces the canonical token string that is fed to the embedder: markup
//! stripped, punctuation removed, lowercased, stop words dropped and every
//! token reduced to its noun lemma. The output is a fixed point of
//! [`preprocess`], so normalized text can be normalized again safely.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use scraper::Html;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-zA-Z0-9\s]").expect("constant regex"));

// English stop words (NLTK list). Contraction forms are omitted because
// apostrophes are stripped before filtering.
const STOP_WORDS: &[&str] = &[
    "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
    "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
    "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
    "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
    "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
    "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
    "for", "with", "about", "against", "between", "into", "through", "during", "before",
    "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
    "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
    "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
    "nor", "not", "only", "own", "same", "so", "than", "too", "very", "s", "t", "can", "will",
    "just", "don", "should", "now", "d", "ll", "m", "o", "re", "ve", "y", "ain", "aren",
    "couldn", "didn", "doesn", "hadn", "hasn", "haven", "isn", "ma", "mightn", "mustn",
    "needn", "shan", "shouldn", "wasn", "weren", "won", "wouldn",
];

static STOP_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| STOP_WORDS.iter().copied().collect());

/// Irregular plurals that suffix rules get wrong.
const IRREGULAR: &[(&str, &str)] = &[
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("people", "person"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("vertices", "vertex"),
    ("analyses", "analysis"),
    ("caches", "cache"),
    ("niches", "niche"),
    ("cookies", "cookie"),
    ("movies", "movie"),
    ("ties", "tie"),
    ("lies", "lie"),
    ("pies", "pie"),
    ("dies", "die"),
    ("calories", "calorie"),
];

/// Words ending in `s` that are already singular.
const SINGULAR_S: &[&str] = &[
    "alias", "atlas", "bias", "canvas", "chaos", "css", "does", "gas", "has", "https", "ios",
    "its", "jenkins", "js", "kubernetes", "less", "macos", "news", "perhaps", "physics",
    "postgres", "redis", "series", "species", "this", "was", "whereas", "windows", "yes",
];

/// Normalize raw text into a canonical, space-joined token string.
#[must_use]
pub fn preprocess(text: &str) -> String {
    let plain = strip_markup(text);
    let cleaned = NON_ALNUM.replace_all(&plain, "");
    let lowered = cleaned.to_lowercase();

    lowered
        .split_whitespace()
        .filter(|token| !is_stop_word(token))
        .map(lemmatize)
        .filter(|lemma| !is_stop_word(lemma))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Return the text content of an HTML fragment.
///
/// Parsing is lenient: unclosed or unknown tags still yield their text.
/// Input that cannot contain markup is returned unchanged.
#[must_use]
pub fn strip_markup(text: &str) -> String {
    if !text.contains('<') && !text.contains('&') {
        return text.to_string();
    }
    let fragment = Html::parse_fragment(text);
    fragment.root_element().text().collect::<String>()
}

#[must_use]
pub fn is_stop_word(token: &str) -> bool {
    STOP_SET.contains(token)
}

/// Reduce a lowercase token to its noun lemma.
///
/// Rules are applied until the token stops changing so that the result is
/// stable under repeated lemmatization.
#[must_use]
pub fn lemmatize(token: &str) -> String {
    let mut current = token.to_string();
    // Every rule either shortens the token or maps to a non-key, so a few
    // passes always reach the fixed point.
    for _ in 0..4 {
        let next = lemmatize_once(&current);
        if next == current {
            break;
        }
        current = next;
    }
    current
}

fn lemmatize_once(token: &str) -> String {
    if let Some((_, lemma)) = IRREGULAR.iter().find(|(plural, _)| *plural == token) {
        return (*lemma).to_string();
    }
    if token.len() < 3 || !token.ends_with('s') || SINGULAR_S.contains(&token) {
        return token.to_string();
    }
    if token.ends_with("ss") || token.ends_with("us") || token.ends_with("is") {
        return token.to_string();
    }

    let stem = &token[..token.len() - 1];
    if token.len() > 4 && token.ends_with("ies") {
        return format!("{}y", &token[..token.len() - 3]);
    }
    for suffix in ["sses", "ches", "shes", "xes"] {
        if token.ends_with(suffix) {
            return token[..token.len() - 2].to_string();
        }
    }
    stem.to_string()
}
