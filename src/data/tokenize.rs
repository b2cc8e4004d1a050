//! Text tokenization used for descriptive statistics and token explanations.

/// Splits a text into tokens.
pub trait Tokenizer {
    fn tokenize(&self, text: &str) -> Vec<String>;
}

impl<F> Tokenizer for F
where
    F: Fn(&str) -> Vec<String>,
{
    fn tokenize(&self, text: &str) -> Vec<String> {
        self(text)
    }
}

/// Default tokenizer: runs of alphanumeric characters form words, every other
/// non-whitespace run is a punctuation token.
#[derive(Debug, Clone, Default)]
pub struct WordTokenizer {
    lowercase: bool,
}

impl WordTokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }
}

#[derive(PartialEq, Clone, Copy)]
enum CharClass {
    Word,
    Punct,
    Space,
}

fn class_of(c: char) -> CharClass {
    if c.is_alphanumeric() || c == '_' {
        CharClass::Word
    } else if c.is_whitespace() {
        CharClass::Space
    } else {
        CharClass::Punct
    }
}

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let processed = if self.lowercase {
            text.to_lowercase()
        } else {
            text.to_string()
        };

        let mut tokens = Vec::new();
        let mut current = String::new();
        let mut current_class = CharClass::Space;
        for c in processed.chars() {
            let class = class_of(c);
            if class != current_class && !current.is_empty() {
                tokens.push(std::mem::take(&mut current));
            }
            if class != CharClass::Space {
                current.push(c);
            }
            current_class = class;
        }
        if !current.is_empty() {
            tokens.push(current);
        }
        tokens
    }
}
