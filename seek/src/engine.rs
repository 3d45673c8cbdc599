//! SearchEngine - entry point for incremental paragraph search
//!
//! Concurrency Model:
//! - The index store is shared read-only (`Arc<dyn IndexStore>`); the SQLite
//!   implementation hands out pooled connections so lookups never serialize
//! - Each token's exact lookup runs on the dispatcher pool, the partial lookup
//!   on the caller, and both are awaited before the session is updated
//! - Sessions are owned by the caller, so one engine can serve many of them

use std::path::Path;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::database::IndexDatabase;
use crate::dispatcher::TaskDispatcher;
use crate::index::IndexStore;
use crate::interface::{SearchError, SearchStatus};
use crate::normalize::normalize;
use crate::resolver::MatchResolver;
use crate::session::SearchSession;

pub struct SearchEngine {
    store: Arc<dyn IndexStore>,
    dispatcher: TaskDispatcher,
    config: EngineConfig,
}

impl SearchEngine {
    pub fn new(store: Arc<dyn IndexStore>, config: EngineConfig) -> Result<Self, SearchError> {
        let dispatcher = TaskDispatcher::new(&config.dispatcher)
            .map_err(|e| SearchError::StoreUnavailable(format!("dispatcher: {}", e)))?;

        tracing::info!(
            threads = dispatcher.threads(),
            priority = ?config.dispatcher.priority,
            "search engine ready"
        );

        Ok(Self {
            store,
            dispatcher,
            config,
        })
    }

    /// Open (or create) a SQLite index at `path` and build an engine on it
    pub fn open<P: AsRef<Path>>(path: P, config: EngineConfig) -> Result<Self, SearchError> {
        let db = IndexDatabase::open(path)?;
        Self::new(Arc::new(db), config)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn IndexStore> {
        &self.store
    }

    /// Apply the full current query text to `session`.
    ///
    /// Empty text (or text with no searchable words) clears the session. Text
    /// longer than `max_query_len` is rejected and the session is left as it was.
    pub fn query_changed(
        &self,
        session: &mut SearchSession,
        text: &str,
    ) -> Result<SearchStatus, SearchError> {
        if text.is_empty() {
            session.reset();
            return Ok(session.status());
        }

        let normalized = normalize(text, self.config.max_query_len)?;

        #[cfg(feature = "perf-log")]
        let t0 = std::time::Instant::now();

        if !self.store.is_valid() {
            session.apply_unavailable(&normalized.tokens);
            return Ok(session.status());
        }

        let resolver = MatchResolver::new(self.store.as_ref(), &self.dispatcher);
        let stats = session.apply(&normalized.tokens, |token| resolver.resolve(token))?;

        #[cfg(feature = "perf-log")]
        tracing::debug!(
            query = %normalized.normalized_text,
            elapsed_ms = t0.elapsed().as_secs_f64() * 1000.0,
            "[perf] query_changed"
        );

        tracing::debug!(
            query = %normalized.normalized_text,
            resolved = stats.resolved,
            reused = stats.reused,
            dropped = stats.dropped,
            results = session.results().len(),
            "query updated"
        );

        Ok(session.status())
    }
}
