//! Text normalization for cache keys and lexical comparison.

/// Lowercase, strip punctuation, collapse whitespace. Two mentions that
/// differ only in casing or punctuation share a cache entry.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_space = true;
    for c in text.chars() {
        if c.is_alphanumeric() {
            out.extend(c.to_lowercase());
            last_was_space = false;
        } else if !last_was_space {
            out.push(' ');
            last_was_space = true;
        }
    }
    if out.ends_with(' ') {
        out.pop();
    }
    out
}

/// Cache key: blake3 of the normalized text.
pub fn cache_key(text: &str) -> String {
    blake3::hash(normalize(text).as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn casing_and_punctuation_share_a_key() {
        assert_eq!(cache_key("SAP se cae, seguido!"), cache_key("sap se cae seguido"));
    }

    #[test]
    fn different_texts_differ() {
        assert_ne!(cache_key("late invoicing"), cache_key("early invoicing"));
    }

    #[test]
    fn whitespace_collapses() {
        assert_eq!(normalize("  a   b  "), "a b");
    }
}
