//! Lexical and vector similarity primitives.

use std::collections::HashSet;
use std::sync::OnceLock;

use regex::Regex;

fn word_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // \p{L}/\p{N} so accented interview text tokenizes correctly.
    PATTERN.get_or_init(|| Regex::new(r"[\p{L}\p{N}]+").expect("valid word pattern"))
}

/// Lowercased word tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    word_pattern()
        .find_iter(text)
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Jaccard index over word token sets.
pub fn token_jaccard(a: &str, b: &str) -> f64 {
    let set_a: HashSet<String> = tokenize(a).into_iter().collect();
    let set_b: HashSet<String> = tokenize(b).into_iter().collect();
    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    let union = set_a.union(&set_b).count();
    if union == 0 {
        0.0
    } else {
        intersection as f64 / union as f64
    }
}

/// Dice coefficient over character bigrams of the joined token stream.
/// Catches morphological variants token Jaccard misses ("invoicing" vs
/// "invoices").
pub fn bigram_dice(a: &str, b: &str) -> f64 {
    let bigrams = |text: &str| -> HashSet<[char; 2]> {
        let joined: Vec<char> = tokenize(text).join(" ").chars().collect();
        joined.windows(2).map(|w| [w[0], w[1]]).collect()
    };
    let set_a = bigrams(a);
    let set_b = bigrams(b);
    if set_a.is_empty() && set_b.is_empty() {
        return 1.0;
    }
    if set_a.is_empty() || set_b.is_empty() {
        return 0.0;
    }
    let intersection = set_a.intersection(&set_b).count();
    2.0 * intersection as f64 / (set_a.len() + set_b.len()) as f64
}

/// Normalized lexical similarity in [0, 1]: equal-weight blend of token
/// Jaccard and character-bigram Dice.
pub fn lexical_similarity(a: &str, b: &str) -> f64 {
    (0.5 * token_jaccard(a, b) + 0.5 * bigram_dice(a, b)).clamp(0.0, 1.0)
}

/// Cosine similarity between two vectors.
/// Returns 0.0 for zero-length or zero-magnitude vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let (mut dot, mut mag_a, mut mag_b) = (0.0f64, 0.0f64, 0.0f64);
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }
    let denom = mag_a.sqrt() * mag_b.sqrt();
    if denom < f64::EPSILON {
        0.0
    } else {
        (dot / denom).clamp(-1.0, 1.0)
    }
}

/// Salient keywords: tokens of length >= 4 minus a small stopword list.
/// Used by the keyword-overlap relationship rule.
pub fn salient_keywords(text: &str) -> HashSet<String> {
    const STOPWORDS: &[&str] = &[
        "este", "esta", "esto", "that", "this", "with", "para", "cada", "from", "have", "when",
        "donde", "porque", "because", "siempre", "always", "sobre", "entre", "their", "there",
        "cuando", "pero", "very", "much", "como", "them", "they", "todos", "todas",
    ];
    tokenize(text)
        .into_iter()
        .filter(|t| t.chars().count() >= 4 && !STOPWORDS.contains(&t.as_str()))
        .collect()
}

/// Jaccard index over two keyword sets.
pub fn keyword_overlap(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let intersection = a.intersection(b).count();
    let union = a.union(b).count();
    intersection as f64 / union as f64
}
