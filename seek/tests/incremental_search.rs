//! End-to-end search behaviour against on-disk indexes.

use seek::models::{ParagraphOccurrence, StoredParagraph, WordId};
use seek::{
    EngineConfig, IndexDatabase, IndexStore, MatchKind, SearchEngine, SearchError, SearchSession,
    SearchStatus,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tempfile::TempDir;

fn sample_seed() -> std::path::PathBuf {
    std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("data/sample_paragraphs.json")
}

/// Database on disk holding `texts` in insertion order
fn disk_db(texts: &[&str]) -> (TempDir, Arc<IndexDatabase>, Vec<i64>) {
    let dir = tempfile::tempdir().unwrap();
    let db = IndexDatabase::open(dir.path().join("index.sqlite")).unwrap();
    let paragraphs: Vec<StoredParagraph> =
        texts.iter().map(|t| StoredParagraph::new(t, 200).unwrap()).collect();
    let ids = db.insert_paragraphs(&paragraphs).unwrap();
    (dir, Arc::new(db), ids)
}

fn result_ids(session: &SearchSession) -> Vec<i64> {
    session.results().iter().map(|r| r.paragraph_id).collect()
}

#[test]
fn test_exact_match_ranks_above_partial() {
    let (_dir, db, ids) = disk_db(&["the catalog", "a cat"]);
    let engine = SearchEngine::new(db, EngineConfig::default()).unwrap();
    let mut session = SearchSession::new();

    engine.query_changed(&mut session, "cat").unwrap();
    assert_eq!(result_ids(&session), vec![ids[1], ids[0]]);
    assert_eq!(session.results()[0].exact_matches, 1);
    assert_eq!(session.results()[1].exact_matches, 0);
    assert_eq!(session.results()[1].partial_matches, 1);
}

#[test]
fn test_single_char_query_matches_prefix_only() {
    let (_dir, db, ids) = disk_db(&["scatter", "cat"]);
    let engine = SearchEngine::new(db, EngineConfig::default()).unwrap();
    let mut session = SearchSession::new();

    engine.query_changed(&mut session, "c").unwrap();
    assert_eq!(result_ids(&session), vec![ids[1]]);
}

#[test]
fn test_typing_a_query_one_keystroke_at_a_time() {
    let (_dir, db, _) = disk_db(&[
        "the quick brown fox",
        "a brown bear",
        "quick thinking",
    ]);
    let engine = SearchEngine::new(db, EngineConfig::default()).unwrap();
    let mut session = SearchSession::new();

    let query = "quick brown";
    for end in 1..=query.len() {
        engine.query_changed(&mut session, &query[..end]).unwrap();
    }

    assert_eq!(session.tokens().collect::<Vec<_>>(), vec!["quick", "brown"]);
    // The final keystroke only touched the second token
    assert_eq!(session.last_update().resolved, 1);
    assert_eq!(session.last_update().reused, 1);
    assert_eq!(session.result_texts()[0], "the quick brown fox");
    assert_eq!(session.results()[0].exact_matches, 2);
}

#[test]
fn test_appending_token_keeps_prior_matches() {
    let (_dir, db, _) = disk_db(&["red fox", "red panda", "arctic fox"]);
    let engine = SearchEngine::new(db, EngineConfig::default()).unwrap();
    let mut session = SearchSession::new();

    engine.query_changed(&mut session, "red").unwrap();
    let before = session.matches()[0].clone();

    engine.query_changed(&mut session, "red fox").unwrap();
    assert!(Arc::ptr_eq(&before, &session.matches()[0]));
    assert_eq!(session.last_update().resolved, 1);
    assert_eq!(session.result_texts()[0], "red fox");
}

#[test]
fn test_normalization_applies_to_queries() {
    let (_dir, db, ids) = disk_db(&["Salt & Pepper", "well-known facts", "black_box"]);
    let engine = SearchEngine::new(db, EngineConfig::default()).unwrap();
    let mut session = SearchSession::new();

    engine.query_changed(&mut session, "SALT and").unwrap();
    assert_eq!(result_ids(&session), vec![ids[0]]);

    engine.query_changed(&mut session, "wellknown").unwrap();
    assert_eq!(result_ids(&session), vec![ids[1]]);

    engine.query_changed(&mut session, "black-box").unwrap();
    assert_eq!(result_ids(&session), vec![ids[2]]);
}

#[test]
fn test_like_wildcards_are_literal() {
    let (_dir, db, _) = disk_db(&["one hundred", "ten%off"]);
    let engine = SearchEngine::new(db, EngineConfig::default()).unwrap();
    let mut session = SearchSession::new();

    // Unescaped, "%o" would also match "one"
    engine.query_changed(&mut session, "%o").unwrap();
    assert_eq!(session.result_texts(), vec!["ten%off"]);
}

#[test]
fn test_seed_file_search() {
    let dir = tempfile::tempdir().unwrap();
    let db = IndexDatabase::open(dir.path().join("seeded.sqlite")).unwrap();
    let loaded = db.load_seed_file(sample_seed(), 200).unwrap();
    assert_eq!(loaded as u64, db.paragraph_count().unwrap());

    let engine = SearchEngine::new(Arc::new(db), EngineConfig::default()).unwrap();
    let mut session = SearchSession::new();
    engine.query_changed(&mut session, "cat").unwrap();

    let texts = session.result_texts();
    assert!(texts.len() >= 3);
    // Exact "cat" paragraphs come first, in insertion order
    assert_eq!(texts[0], "A cat sat on the mat and watched the birds.");
    assert_eq!(texts[1], "The cat and the dog share a bowl of water.");
    assert!(session.results()[2..].iter().all(|r| r.exact_matches == 0));
}

#[test]
fn test_closed_store_degrades_and_clears_results() {
    let (_dir, db, _) = disk_db(&["red fox"]);
    let engine = SearchEngine::new(db.clone(), EngineConfig::default()).unwrap();
    let mut session = SearchSession::new();

    engine.query_changed(&mut session, "red").unwrap();
    assert_eq!(session.results().len(), 1);

    db.close();
    let status = engine.query_changed(&mut session, "red fox").unwrap();
    assert_eq!(status, SearchStatus::StoreUnavailable);
    assert!(session.results().is_empty());
    assert_eq!(session.tokens().collect::<Vec<_>>(), vec!["red", "fox"]);
}

#[test]
fn test_deleted_paragraph_disappears_from_results() {
    let (_dir, db, ids) = disk_db(&["red fox", "red panda"]);
    let engine = SearchEngine::new(db.clone(), EngineConfig::default()).unwrap();

    assert!(db.delete_paragraph(ids[1]).unwrap());
    let mut session = SearchSession::new();
    engine.query_changed(&mut session, "panda").unwrap();
    assert!(session.results().is_empty());

    engine.query_changed(&mut session, "red").unwrap();
    assert_eq!(result_ids(&session), vec![ids[0]]);
}

/// Store whose exact lookup for one word reports two ids, and which can be
/// switched off and on to simulate an outage
struct FaultyStore {
    db: IndexDatabase,
    duplicate: &'static str,
    offline: AtomicUsize,
}

impl IndexStore for FaultyStore {
    fn is_valid(&self) -> bool {
        self.offline.load(Ordering::SeqCst) == 0
    }

    fn find_word_ids(&self, token: &str, kind: MatchKind) -> Result<Vec<WordId>, SearchError> {
        if self.offline.load(Ordering::SeqCst) > 0 {
            return Err(SearchError::StoreUnavailable("offline".into()));
        }
        let mut ids = self.db.find_word_ids(token, kind)?;
        if kind == MatchKind::Exact && token == self.duplicate {
            ids.push(9_999);
        }
        Ok(ids)
    }

    fn occurrences_for_words(&self, ids: &[WordId]) -> Result<Vec<ParagraphOccurrence>, SearchError> {
        self.db.occurrences_for_words(ids)
    }
}

fn faulty_store(texts: &[&str], duplicate: &'static str) -> Arc<FaultyStore> {
    let db = IndexDatabase::open_in_memory().unwrap();
    let paragraphs: Vec<StoredParagraph> =
        texts.iter().map(|t| StoredParagraph::new(t, 200).unwrap()).collect();
    db.insert_paragraphs(&paragraphs).unwrap();
    Arc::new(FaultyStore { db, duplicate, offline: AtomicUsize::new(0) })
}

#[test]
fn test_duplicate_exact_word_is_surfaced() {
    let store = faulty_store(&["red fox", "blue fox"], "fox");
    let engine = SearchEngine::new(store, EngineConfig::default()).unwrap();
    let mut session = SearchSession::new();

    let err = engine.query_changed(&mut session, "red fox blue").unwrap_err();
    match err {
        SearchError::IndexConsistency { token, word_ids } => {
            assert_eq!(token, "fox");
            assert_eq!(word_ids.len(), 2);
        }
        other => panic!("unexpected error: {other}"),
    }

    // Siblings were still resolved and ranked
    assert_eq!(session.matches().len(), 3);
    assert!(session.matches()[0].found_exact_match());
    assert!(session.matches()[2].found_exact_match());
    assert_eq!(session.results().len(), 2);
}

#[test]
fn test_recovery_after_outage() {
    let store = faulty_store(&["red fox"], "");
    let engine = SearchEngine::new(store.clone(), EngineConfig::default()).unwrap();
    let mut session = SearchSession::new();

    store.offline.store(1, Ordering::SeqCst);
    assert_eq!(
        engine.query_changed(&mut session, "red").unwrap(),
        SearchStatus::StoreUnavailable
    );
    assert!(session.matches()[0].degraded);

    store.offline.store(0, Ordering::SeqCst);
    assert_eq!(engine.query_changed(&mut session, "red").unwrap(), SearchStatus::Ready);
    assert!(!session.matches()[0].degraded);
    assert_eq!(session.result_texts(), vec!["red fox"]);
}
