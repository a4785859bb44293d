use regex::Regex;

/// Loose North American phone number: 3 digits, up to 3 separators,
/// 3 digits, an optional separator, 4 digits
const PHONE_PATTERN: &str = r"[0-9]{3}.{0,3}[0-9]{3}.?[0-9]{4}";

/// Turns document text into normalized terms
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// Whitespace tokenizer with URL and phone number normalization
pub struct DocumentTokenizer {
    phone: Regex,
}

impl DocumentTokenizer {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            phone: Regex::new(PHONE_PATTERN)?,
        })
    }

    /// Whitespace-separated words, normalized, without punctuation-only tokens
    pub fn word_tokens(&self, text: &str) -> Vec<String> {
        text.split_whitespace()
            .map(normalize_token)
            .filter(|t| is_indexable(t))
            .collect()
    }

    /// Digits-only phone numbers, each followed by its area code
    pub fn phone_tokens(&self, text: &str) -> Vec<String> {
        let mut tokens = Vec::new();
        for m in self.phone.find_iter(text) {
            let digits: String = m.as_str().chars().filter(|&c| is_word_char(c)).collect();
            let area: String = digits.chars().take(3).collect();
            tokens.push(digits);
            tokens.push(area);
        }
        tokens
    }
}

impl Tokenizer for DocumentTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let mut tokens = self.word_tokens(text);
        tokens.extend(self.phone_tokens(text));
        tokens
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// Lowercase, drop one non-word character at each end, strip URL prefixes
fn normalize_token(token: &str) -> String {
    let mut t = token.trim().to_lowercase();

    if t.chars().next().is_some_and(|c| !is_word_char(c)) {
        t.remove(0);
    }
    if t.chars().last().is_some_and(|c| !is_word_char(c)) {
        t.pop();
    }

    t.replacen("http://", "", 1).replacen("www.", "", 1)
}

fn is_indexable(token: &str) -> bool {
    let mut chars = token.chars();
    match (chars.next(), chars.next()) {
        (None, _) => false,
        (Some(c), None) => is_word_char(c),
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sorted(mut tokens: Vec<String>) -> Vec<String> {
        tokens.sort();
        tokens
    }

    #[test]
    fn test_splits_on_whitespace() {
        let tokenizer = DocumentTokenizer::new().unwrap();
        assert_eq!(
            sorted(tokenizer.tokenize("Austin Pizza\tLLC")),
            vec!["austin", "llc", "pizza"]
        );
    }

    #[test]
    fn test_lowercases() {
        let tokenizer = DocumentTokenizer::new().unwrap();
        assert_eq!(tokenizer.tokenize("AAA"), vec!["aaa"]);
    }

    #[test]
    fn test_trims_edge_punctuation() {
        let tokenizer = DocumentTokenizer::new().unwrap();
        assert_eq!(sorted(tokenizer.tokenize("!hello! !world!")), vec!["hello", "world"]);
    }

    #[test]
    fn test_drops_punctuation_only_tokens() {
        let tokenizer = DocumentTokenizer::new().unwrap();
        assert_eq!(tokenizer.tokenize("!!! token ?"), vec!["token"]);
    }

    #[test]
    fn test_normalizes_urls() {
        let tokenizer = DocumentTokenizer::new().unwrap();
        assert_eq!(tokenizer.tokenize("http://www.google.com/"), vec!["google.com"]);
    }

    #[test]
    fn test_normalizes_phone_numbers() {
        let tokenizer = DocumentTokenizer::new().unwrap();
        let tokens = tokenizer.tokenize("(915)920-0102");
        assert!(tokens.contains(&"9159200102".to_string()));
        assert!(tokens.contains(&"915".to_string()));
    }
}
