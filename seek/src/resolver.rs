//! Per-token match resolution.
//!
//! Exact and partial lookups are independent reads, so the exact lookup runs
//! on the dispatcher while the partial lookup runs on the caller. The two are
//! combined with the exact word taking precedence.

use crate::dispatcher::TaskDispatcher;
use crate::index::IndexStore;
use crate::interface::{MatchKind, SearchError};
use crate::models::{ParagraphOccurrence, WordId, WordMatch};

type ExactLookup = Result<Option<(WordId, Vec<ParagraphOccurrence>)>, SearchError>;
type PartialLookup = Result<(Vec<WordId>, Vec<ParagraphOccurrence>), SearchError>;

pub struct MatchResolver<'a> {
    store: &'a dyn IndexStore,
    dispatcher: &'a TaskDispatcher,
}

impl<'a> MatchResolver<'a> {
    pub fn new(store: &'a dyn IndexStore, dispatcher: &'a TaskDispatcher) -> Self {
        Self { store, dispatcher }
    }

    /// Resolve a normalized token into its exact and partial matches.
    pub fn resolve(&self, token: &str) -> Result<WordMatch, SearchError> {
        if !self.store.is_valid() {
            return Err(SearchError::StoreUnavailable("index store reported invalid".to_string()));
        }

        #[cfg(feature = "perf-log")]
        let t0 = std::time::Instant::now();

        let store = self.store;
        let (exact, partial) = self.dispatcher.join(
            || lookup_exact(store, token),
            || lookup_partial(store, token),
        );

        let exact = exact.unwrap_or_else(|| {
            Err(SearchError::StoreUnavailable("exact lookup did not complete".to_string()))
        })?;
        let (partial_ids, partial_data) = partial?;
        let word_match = WordMatch::new(token, exact, partial_ids, partial_data);

        #[cfg(feature = "perf-log")]
        tracing::debug!(
            token,
            elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0,
            "[perf] resolve"
        );

        tracing::debug!(
            token,
            exact = word_match.exact_id.is_some(),
            partial_words = word_match.partial_ids.len(),
            exact_paragraphs = word_match.exact_data.len(),
            partial_paragraphs = word_match.partial_data.len(),
            "resolved token"
        );

        Ok(word_match)
    }
}

fn lookup_exact(store: &dyn IndexStore, token: &str) -> ExactLookup {
    let ids = store.find_word_ids(token, MatchKind::Exact)?;
    match ids.as_slice() {
        [] => Ok(None),
        [id] => {
            let data = store.occurrences_for_words(&[*id])?;
            Ok(Some((*id, data)))
        }
        _ => {
            tracing::error!(token, word_ids = ?ids, "more than one word matched exactly; index is corrupt");
            Err(SearchError::IndexConsistency {
                token: token.to_string(),
                word_ids: ids,
            })
        }
    }
}

fn lookup_partial(store: &dyn IndexStore, token: &str) -> PartialLookup {
    let ids = store.find_word_ids(token, MatchKind::partial_for(token))?;
    let data = store.occurrences_for_words(&ids)?;
    Ok((ids, data))
}
