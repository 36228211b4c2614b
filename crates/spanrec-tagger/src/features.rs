//! Token context features for the tagger.

/// Marker for positions before the start of the sentence.
const BOS: &str = "<s>";
/// Marker for positions after the end of the sentence.
const EOS: &str = "</s>";

/// Maximum prefix/suffix length in characters.
const AFFIX_LEN: usize = 3;

/// Extract feature strings for the token at `pos`.
pub fn token_features(tokens: &[&str], pos: usize) -> Vec<String> {
    let token = tokens[pos];
    let lower = token.to_lowercase();
    let mut features = Vec::with_capacity(24);

    features.push("bias".to_string());
    features.push(format!("w={lower}"));
    features.push(format!("shape={}", word_shape(token)));

    let chars: Vec<char> = lower.chars().collect();
    for n in 1..=AFFIX_LEN.min(chars.len()) {
        let prefix: String = chars[..n].iter().collect();
        let suffix: String = chars[chars.len() - n..].iter().collect();
        features.push(format!("pre{n}={prefix}"));
        features.push(format!("suf{n}={suffix}"));
    }

    if token.chars().next().is_some_and(char::is_uppercase) {
        features.push("cap".to_string());
    }
    if token.chars().any(char::is_alphabetic) && !token.chars().any(char::is_lowercase) {
        features.push("allcap".to_string());
    }
    if token.chars().any(|c| c.is_ascii_digit()) {
        features.push("digit".to_string());
    }
    if !token.chars().any(char::is_alphanumeric) {
        features.push("punct".to_string());
    }
    if pos == 0 {
        features.push("first".to_string());
    }

    let prev = context_word(tokens, pos as isize - 1);
    let prev2 = context_word(tokens, pos as isize - 2);
    let next = context_word(tokens, pos as isize + 1);
    let next2 = context_word(tokens, pos as isize + 2);

    features.push(format!("w-1={prev}"));
    features.push(format!("w-2={prev2}"));
    features.push(format!("w+1={next}"));
    features.push(format!("w+2={next2}"));
    features.push(format!("w-1|w={prev}|{lower}"));
    features.push(format!("w|w+1={lower}|{next}"));

    features
}

/// Feature strings for every token of a sentence.
pub fn sentence_features(tokens: &[&str]) -> Vec<Vec<String>> {
    (0..tokens.len())
        .map(|pos| token_features(tokens, pos))
        .collect()
}

fn context_word(tokens: &[&str], pos: isize) -> String {
    if pos < 0 {
        BOS.to_string()
    } else {
        match tokens.get(pos as usize) {
            Some(t) => t.to_lowercase(),
            None => EOS.to_string(),
        }
    }
}

/// Collapse a token into its character classes, e.g. `Santiago` -> `Xx`, `A-12` -> `X-d`.
fn word_shape(token: &str) -> String {
    let mut shape = String::new();
    let mut last = None;
    for c in token.chars() {
        let class = if c.is_uppercase() {
            'X'
        } else if c.is_lowercase() {
            'x'
        } else if c.is_numeric() {
            'd'
        } else {
            c
        };
        if last != Some(class) {
            shape.push(class);
            last = Some(class);
        }
    }
    shape
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_shape() {
        assert_eq!(word_shape("Santiago"), "Xx");
        assert_eq!(word_shape("A-12"), "X-d");
        assert_eq!(word_shape("iPhone"), "xXx");
        assert_eq!(word_shape("."), ".");
    }

    #[test]
    fn test_features_include_context() {
        let tokens = ["The", "capital", "of", "Galicia"];
        let features = token_features(&tokens, 3);
        assert!(features.contains(&"w=galicia".to_string()));
        assert!(features.contains(&"w-1=of".to_string()));
        assert!(features.contains(&"w+1=</s>".to_string()));
        assert!(features.contains(&"cap".to_string()));
        assert!(features.contains(&"suf3=cia".to_string()));
        assert!(!features.contains(&"first".to_string()));
    }

    #[test]
    fn test_features_at_sentence_start() {
        let tokens = ["Ana"];
        let features = token_features(&tokens, 0);
        assert!(features.contains(&"first".to_string()));
        assert!(features.contains(&"w-2=<s>".to_string()));
        assert!(!features.contains(&"allcap".to_string()));
    }

    #[test]
    fn test_punctuation_features() {
        let features = token_features(&["."], 0);
        assert!(features.contains(&"punct".to_string()));
        assert!(!features.contains(&"cap".to_string()));
    }

    #[test]
    fn test_multibyte_affixes() {
        let features = token_features(&["Cádiz"], 0);
        assert!(features.contains(&"pre2=cá".to_string()));
    }
}
