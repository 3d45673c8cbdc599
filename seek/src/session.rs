//! Incremental search session.
//!
//! Holds one `WordMatch` per query token, index-aligned with the token
//! sequence of the previous update. A new token sequence is diffed against it
//! so a keystroke only re-resolves the tokens whose text changed; everything
//! else is reused as-is.

use std::sync::Arc;

use crate::interface::{RankedParagraph, SearchError, SearchStatus, UpdateStats};
use crate::models::WordMatch;
use crate::ranking::rank;

#[derive(Debug, Default)]
pub struct SearchSession {
    matches: Vec<Arc<WordMatch>>,
    results: Vec<RankedParagraph>,
    status: SearchStatus,
    last_update: UpdateStats,
}

/// What happened while resolving the changed tokens of one update
#[derive(Default)]
struct DiffOutcome {
    stats: UpdateStats,
    store_unavailable: bool,
    fatal: Option<SearchError>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current per-token matches, in query order
    pub fn matches(&self) -> &[Arc<WordMatch>] {
        &self.matches
    }

    pub fn tokens(&self) -> impl Iterator<Item = &str> {
        self.matches.iter().map(|m| m.token.as_str())
    }

    /// Ranked results for the current query
    pub fn results(&self) -> &[RankedParagraph] {
        &self.results
    }

    pub fn result_texts(&self) -> Vec<&str> {
        self.results.iter().map(|r| r.original_text.as_str()).collect()
    }

    pub fn status(&self) -> SearchStatus {
        self.status
    }

    pub fn last_update(&self) -> UpdateStats {
        self.last_update
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    /// Drop all matches and results (the query was cleared)
    pub fn reset(&mut self) {
        self.last_update = UpdateStats {
            dropped: self.matches.len(),
            ..UpdateStats::default()
        };
        self.matches.clear();
        self.results.clear();
        self.status = SearchStatus::Ready;
    }

    /// Bring the session in line with `tokens`, resolving only what changed.
    ///
    /// A token that fails to resolve gets an empty degraded match and is
    /// retried on the next update; its siblings are unaffected. A fatal error
    /// is returned after every other token has been processed and ranked.
    pub fn apply<F>(&mut self, tokens: &[String], resolve: F) -> Result<UpdateStats, SearchError>
    where
        F: FnMut(&str) -> Result<WordMatch, SearchError>,
    {
        if tokens.is_empty() {
            self.reset();
            return Ok(self.last_update);
        }

        let outcome = self.diff(tokens, resolve);

        if outcome.store_unavailable {
            tracing::warn!(tokens = tokens.len(), "index store unavailable; results cleared");
            self.results.clear();
            self.status = SearchStatus::StoreUnavailable;
        } else {
            self.results = rank(self.matches.iter().map(|m| m.as_ref()));
            self.status = SearchStatus::Ready;
        }

        self.last_update = outcome.stats;
        match outcome.fatal {
            Some(e) => Err(e),
            None => Ok(outcome.stats),
        }
    }

    /// Track `tokens` without consulting the store. Changed tokens get degraded
    /// placeholders and the result list is emptied.
    pub fn apply_unavailable(&mut self, tokens: &[String]) -> UpdateStats {
        if tokens.is_empty() {
            self.reset();
            return self.last_update;
        }

        let outcome = self.diff(tokens, |token| Ok(WordMatch::degraded(token)));
        self.results.clear();
        self.status = SearchStatus::StoreUnavailable;
        self.last_update = outcome.stats;
        outcome.stats
    }

    fn diff<F>(&mut self, tokens: &[String], mut resolve: F) -> DiffOutcome
    where
        F: FnMut(&str) -> Result<WordMatch, SearchError>,
    {
        let mut outcome = DiffOutcome::default();
        let mut resolve_one = |token: &str| -> Arc<WordMatch> {
            outcome.stats.resolved += 1;
            match resolve(token) {
                Ok(m) => {
                    if m.degraded {
                        outcome.store_unavailable = true;
                    }
                    Arc::new(m)
                }
                Err(e) => {
                    match &e {
                        SearchError::StoreUnavailable(_) => outcome.store_unavailable = true,
                        _ => tracing::warn!(token, error = %e, "token failed to resolve"),
                    }
                    if e.is_fatal() && outcome.fatal.is_none() {
                        outcome.fatal = Some(e);
                    }
                    Arc::new(WordMatch::degraded(token))
                }
            }
        };

        let previous = self.matches.len();
        let shared = previous.min(tokens.len());
        let mut reused = 0;

        for (slot, token) in self.matches.iter_mut().zip(tokens).take(shared) {
            if slot.token != *token || slot.degraded {
                *slot = resolve_one(token.as_str());
            } else {
                reused += 1;
            }
        }

        for token in &tokens[shared..] {
            let m = resolve_one(token.as_str());
            self.matches.push(m);
        }

        outcome.stats.reused = reused;
        if previous > tokens.len() {
            outcome.stats.dropped = previous - tokens.len();
            self.matches.truncate(tokens.len());
        }

        outcome
    }
}
