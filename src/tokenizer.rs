use std::collections::HashMap;

/// Split text into lower-cased alphanumeric runs. Query text and indexed
/// field text go through the same pipeline so token-containment matching
/// lines up.
pub fn tokenize(text: &str) -> Vec<String> {
    text.chars()
        .fold(vec![String::new()], |mut tokens, c| {
            if c.is_alphanumeric() {
                if let Some(last) = tokens.last_mut() {
                    last.extend(c.to_lowercase());
                }
            } else if tokens.last().map_or(false, |s| !s.is_empty()) {
                tokens.push(String::new());
            }
            tokens
        })
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect()
}

/// Tokenize and count term frequencies
pub fn tokenize_with_frequencies(text: &str) -> HashMap<String, usize> {
    let mut frequencies = HashMap::new();
    for token in tokenize(text) {
        *frequencies.entry(token).or_insert(0) += 1;
    }
    frequencies
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_splits_on_punctuation() {
        let tokens = tokenize("Mountain-bike, 26\" wheels!");
        assert_eq!(tokens, vec!["mountain", "bike", "26", "wheels"]);
    }

    #[test]
    fn test_tokenize_lowercases() {
        assert_eq!(tokenize("Bike BIKE bike"), vec!["bike", "bike", "bike"]);
    }

    #[test]
    fn test_tokenize_empty_and_symbols() {
        assert!(tokenize("").is_empty());
        assert!(tokenize("--- !!! ---").is_empty());
    }

    #[test]
    fn test_frequencies() {
        let freqs = tokenize_with_frequencies("red bike red");
        assert_eq!(freqs.get("red"), Some(&2));
        assert_eq!(freqs.get("bike"), Some(&1));
    }
}
