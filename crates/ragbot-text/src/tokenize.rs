use ragbot_core::types::TermFrequencies;

/// Terms of this length or shorter are dropped.
const MIN_TERM_CHARS: usize = 3;

/// Normalize and split text into index terms.
///
/// Lower-cases, turns every character that is neither an ASCII word
/// character (`[a-z0-9_]`) nor whitespace into a space, splits on whitespace
/// runs and drops terms shorter than three characters. Accented letters are
/// separators, so `café` yields `caf`. Ingestion and query scoring must both
/// go through this function.
pub fn tokenize(text: &str) -> Vec<String> {
    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| if is_word_char(c) || c.is_whitespace() { c } else { ' ' })
        .collect();
    normalized
        .split_whitespace()
        .filter(|term| term.chars().count() >= MIN_TERM_CHARS)
        .map(str::to_string)
        .collect()
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Count occurrences of each term of `text`.
pub fn term_frequencies(text: &str) -> TermFrequencies {
    let mut frequencies = TermFrequencies::new();
    for term in tokenize(text) {
        *frequencies.entry(term).or_insert(0) += 1;
    }
    frequencies
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_strips_punctuation_and_short_terms() {
        assert_eq!(
            tokenize("The QUICK, brown fox's den -- isn't it?"),
            vec!["the", "quick", "brown", "fox", "den", "isn"]
        );
    }

    #[test]
    fn underscores_and_digits_are_word_characters() {
        assert_eq!(tokenize("snake_case v2.0 2024-01-05"), vec!["snake_case", "2024"]);
    }

    #[test]
    fn non_ascii_letters_split_terms() {
        assert_eq!(tokenize("naïve café résumé"), vec!["caf", "sum"]);
        assert!(tokenize("Crème brûlée").is_empty());
        assert_eq!(tokenize("straße façade"), vec!["stra", "ade"]);
    }

    #[test]
    fn non_ascii_digits_are_separators() {
        assert_eq!(tokenize("abc٣def 12345"), vec!["abc", "def", "12345"]);
    }

    #[test]
    fn counts_repeated_terms() {
        let tf = term_frequencies("Apple pie, apple tart. APPLE!");
        assert_eq!(tf.get("apple"), Some(&3));
        assert_eq!(tf.get("pie"), Some(&1));
        assert_eq!(tf.get("tart"), Some(&1));
        assert_eq!(tf.len(), 3);
    }

    #[test]
    fn empty_text_has_no_terms() {
        assert!(tokenize("").is_empty());
        assert!(term_frequencies("a an to").is_empty());
    }
}
