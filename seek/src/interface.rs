//! Seek Public Interface Definition
//!
//! Types handed to the presentation layer: ranked results, session status and
//! the error taxonomy of the search engine.

use thiserror::Error;

use crate::models::{ParagraphId, WordId};

// ═══════════════════════════════════════════════════════════════════════════════
// ENUMS
// ═══════════════════════════════════════════════════════════════════════════════

/// How a query token is compared against indexed words
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchKind {
    /// Word text equals the token
    Exact,
    /// Word text starts with the token
    BeginsWith,
    /// Word text contains the token anywhere
    Contains,
}

impl MatchKind {
    /// Partial-match strategy for a token.
    /// Single-character tokens only match word prefixes to bound the fan-out.
    pub fn partial_for(token: &str) -> Self {
        if token.chars().count() == 1 {
            MatchKind::BeginsWith
        } else {
            MatchKind::Contains
        }
    }

    /// SQL LIKE pattern for this kind (the token must already be escaped)
    pub(crate) fn like_pattern(&self, escaped_token: &str) -> String {
        match self {
            MatchKind::Exact => escaped_token.to_string(),
            MatchKind::BeginsWith => format!("{}%", escaped_token),
            MatchKind::Contains => format!("%{}%", escaped_token),
        }
    }
}

/// Outcome of the last query update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchStatus {
    /// Results reflect the current query
    #[default]
    Ready,
    /// The index store reported itself unusable; results are empty
    StoreUnavailable,
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDS (Structs)
// ═══════════════════════════════════════════════════════════════════════════════

/// One entry of the ranked result list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedParagraph {
    pub paragraph_id: ParagraphId,
    pub original_text: String,
    /// Number of query tokens matching a word of this paragraph exactly
    pub exact_matches: u32,
    /// Number of partial-match occurrences contributed by the query tokens
    pub partial_matches: u32,
}

/// Bookkeeping for the most recent session update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateStats {
    /// Tokens that went through the resolver
    pub resolved: usize,
    /// Tokens whose previous match was kept
    pub reused: usize,
    /// Trailing tokens dropped from the session
    pub dropped: usize,
}

/// Error type for search operations
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Index store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("Index consistency violation: token {token:?} matched word ids {word_ids:?} exactly")]
    IndexConsistency { token: String, word_ids: Vec<WordId> },
    #[error("Database error: {0}")]
    Database(String),
}

impl SearchError {
    /// Whether the error indicates index corruption rather than a transient condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, SearchError::IndexConsistency { .. })
    }
}

impl From<crate::database::DatabaseError> for SearchError {
    fn from(e: crate::database::DatabaseError) -> Self {
        use crate::database::DatabaseError;
        match e {
            DatabaseError::Unavailable | DatabaseError::Pool(_) => {
                SearchError::StoreUnavailable(e.to_string())
            }
            other => SearchError::Database(other.to_string()),
        }
    }
}
