//! Query contract the search engine requires of an index store.

use crate::interface::{MatchKind, SearchError};
use crate::models::{ParagraphOccurrence, WordId};

/// Word/paragraph/occurrence index.
///
/// Read operations are issued concurrently from the dispatcher worker and the
/// calling thread, so implementations must tolerate parallel readers.
pub trait IndexStore: Send + Sync {
    /// Whether the store can currently answer queries
    fn is_valid(&self) -> bool;

    /// Ids of words matching `token` under `kind`, in ascending id order
    fn find_word_ids(&self, token: &str, kind: MatchKind) -> Result<Vec<WordId>, SearchError>;

    /// One record per (paragraph, matched word) for every paragraph containing
    /// any of `word_ids`, ordered by paragraph id then matched word id
    fn occurrences_for_words(
        &self,
        word_ids: &[WordId],
    ) -> Result<Vec<ParagraphOccurrence>, SearchError>;
}

impl<T: IndexStore + ?Sized> IndexStore for std::sync::Arc<T> {
    fn is_valid(&self) -> bool {
        (**self).is_valid()
    }

    fn find_word_ids(&self, token: &str, kind: MatchKind) -> Result<Vec<WordId>, SearchError> {
        (**self).find_word_ids(token, kind)
    }

    fn occurrences_for_words(
        &self,
        word_ids: &[WordId],
    ) -> Result<Vec<ParagraphOccurrence>, SearchError> {
        (**self).occurrences_for_words(word_ids)
    }
}
