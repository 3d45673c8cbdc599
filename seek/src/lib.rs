//! Seek Core - incremental word search over a paragraph index
//!
//! Paragraphs are normalized into words and stored in a SQLite index. A search
//! session keeps one match set per query token and, on every edit of the query,
//! re-resolves only the tokens that changed before re-ranking the paragraphs.

pub mod config;
pub mod database;
pub mod dispatcher;
mod engine;
pub mod index;
pub mod interface;
pub mod models;
pub mod normalize;
pub mod ranking;
mod resolver;
mod session;

pub use config::EngineConfig;
pub use database::IndexDatabase;
pub use engine::SearchEngine;
pub use index::IndexStore;
pub use interface::*;
pub use resolver::MatchResolver;
pub use session::SearchSession;
