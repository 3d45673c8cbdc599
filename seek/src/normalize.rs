//! Text normalization shared by indexing and querying.
//!
//! Paragraphs and query text go through the same rules so that a query token
//! compares equal to an indexed word exactly when their canonical forms match:
//! ASCII case folding, `&` spelled out as `and`, `-`/`_` removed without
//! breaking the word, and whitespace runs collapsed to single separators.

use crate::interface::SearchError;

/// Raw text together with its canonical form and token sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedText {
    pub original_text: String,
    /// Tokens joined by single spaces
    pub normalized_text: String,
    pub tokens: Vec<String>,
}

/// Normalize `text`, rejecting empty input and input longer than `max_len` bytes.
pub fn normalize(text: &str, max_len: usize) -> Result<NormalizedText, SearchError> {
    if text.is_empty() {
        return Err(SearchError::InvalidInput("text is empty".to_string()));
    }
    if text.len() > max_len {
        return Err(SearchError::InvalidInput(format!(
            "text is {} bytes, limit is {}",
            text.len(),
            max_len
        )));
    }

    let tokens = tokenize(text);
    Ok(NormalizedText {
        original_text: text.to_string(),
        normalized_text: tokens.join(" "),
        tokens,
    })
}

/// Token sequence of `text` without any length validation.
pub fn tokenize(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();

    for c in text.chars() {
        match c {
            '&' => current.push_str("and"),
            '-' | '_' => {}
            c if c.is_ascii_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c.to_ascii_lowercase()),
        }
    }

    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}
