//! Core data models for Seek
//!
//! Identifiers, occurrence records returned by the index store, and the
//! per-token `WordMatch` value held by a search session.

use crate::normalize::NormalizedText;

/// Stable identifier of an indexed word
pub type WordId = i64;

/// Stable identifier of an indexed paragraph (lower = inserted earlier)
pub type ParagraphId = i64;

// ─────────────────────────────────────────────────────────────────────────────
// INDEX RECORDS
// ─────────────────────────────────────────────────────────────────────────────

/// A paragraph that contains a matched word.
///
/// `word_ids` lists every word of the paragraph in position order, not only
/// the matched one, so a caller can tell which terms matched where.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphOccurrence {
    pub paragraph_id: ParagraphId,
    pub original_text: String,
    pub matched_word_id: WordId,
    pub word_ids: Vec<WordId>,
}

/// Paragraph ready for insertion into the index
#[derive(Debug, Clone, PartialEq)]
pub struct StoredParagraph {
    pub text: NormalizedText,
}

impl StoredParagraph {
    /// Normalize raw text into an insertable paragraph
    pub fn new(text: &str, max_len: usize) -> Result<Self, crate::interface::SearchError> {
        let text = crate::normalize::normalize(text, max_len)?;
        if text.tokens.is_empty() {
            return Err(crate::interface::SearchError::InvalidInput(
                "paragraph contains no words".to_string(),
            ));
        }
        Ok(Self { text })
    }

    pub fn original_text(&self) -> &str {
        &self.text.original_text
    }

    pub fn normalized_text(&self) -> &str {
        &self.text.normalized_text
    }

    /// Distinct words paired with the position of their first occurrence
    pub fn word_positions(&self) -> Vec<(&str, usize)> {
        let mut seen = std::collections::HashSet::new();
        self.text
            .tokens
            .iter()
            .enumerate()
            .filter(|(_, word)| seen.insert(word.as_str()))
            .map(|(pos, word)| (word.as_str(), pos))
            .collect()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SESSION STATE
// ─────────────────────────────────────────────────────────────────────────────

/// Matches for a single normalized query token.
///
/// Built once by the resolver and never mutated afterwards; a changed token
/// gets a fresh value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct WordMatch {
    pub token: String,
    pub exact_id: Option<WordId>,
    pub exact_data: Vec<ParagraphOccurrence>,
    /// Partial-match word ids, never containing `exact_id`
    pub partial_ids: Vec<WordId>,
    pub partial_data: Vec<ParagraphOccurrence>,
    /// Produced while the store was unavailable; retried on the next update
    pub degraded: bool,
}

impl WordMatch {
    /// Combine exact and partial lookups, giving the exact word precedence
    pub fn new(
        token: impl Into<String>,
        exact: Option<(WordId, Vec<ParagraphOccurrence>)>,
        mut partial_ids: Vec<WordId>,
        mut partial_data: Vec<ParagraphOccurrence>,
    ) -> Self {
        let (exact_id, exact_data) = match exact {
            Some((id, data)) => {
                partial_ids.retain(|&w| w != id);
                partial_data.retain(|occ| occ.matched_word_id != id);
                (Some(id), data)
            }
            None => (None, Vec::new()),
        };

        Self {
            token: token.into(),
            exact_id,
            exact_data,
            partial_ids,
            partial_data,
            degraded: false,
        }
    }

    /// Empty placeholder for a token that could not be resolved
    pub fn degraded(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            degraded: true,
            ..Self::default()
        }
    }

    pub fn found_exact_match(&self) -> bool {
        self.exact_id.is_some()
    }

    pub fn found_partial_matches(&self) -> bool {
        !self.partial_ids.is_empty()
    }
}
