//! Word tokenizer shared by both vectorizers
//!
//! Splits on whitespace and punctuation, keeping runs of two or more word
//! characters (`\b\w\w+\b`). Single-character identifiers and operators are
//! dropped, so `if (x > 10)` yields `["if", "10"]`.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static TOKEN_PATTERN: OnceLock<Regex> = OnceLock::new();

fn token_pattern() -> &'static Regex {
    TOKEN_PATTERN.get_or_init(|| Regex::new(r"\b\w\w+\b").expect("valid token regex"))
}

/// Tokenization settings, persisted with each fitted vectorizer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Tokenizer {
    /// Fold tokens to lowercase before lookup. Off by default: `Foo` and `foo` differ.
    pub lowercase: bool,
}

impl Tokenizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lowercase() -> Self {
        Self { lowercase: true }
    }

    pub fn tokenize<'a>(&self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        let lowercase = self.lowercase;
        token_pattern().find_iter(text).map(move |m| {
            if lowercase {
                m.as_str().to_lowercase()
            } else {
                m.as_str().to_string()
            }
        })
    }
}
