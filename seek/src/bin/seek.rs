//! Interactive search over a paragraph index.
//!
//! Every line read from stdin is treated as the full current query text, the
//! way a search box reports each edit. Results are printed best first.
//!
//! Usage:
//!     cargo run --bin seek -- --db index.sqlite
//!     cargo run --bin seek -- --db :memory: --seed data/sample_paragraphs.json

use anyhow::{Context, Result};
use clap::Parser;
use seek::{EngineConfig, IndexDatabase, MatchKind, SearchEngine, SearchSession, SearchStatus};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(about = "Incremental word search over a paragraph index")]
struct Args {
    /// Index database path; `:memory:` keeps everything in memory
    #[arg(long, default_value = ":memory:")]
    db: String,

    /// JSON seed file (array of paragraph strings) loaded before searching
    #[arg(long)]
    seed: Option<PathBuf>,

    /// JSON engine configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print at most this many results per query
    #[arg(long, default_value_t = 10)]
    limit: usize,

    /// Print the SQLite plans for the word lookups and exit
    #[arg(long)]
    explain: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "seek=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => EngineConfig::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display()))?,
        None => EngineConfig::default(),
    };

    let db = if args.db == ":memory:" {
        IndexDatabase::open_in_memory()
    } else {
        IndexDatabase::open(&args.db)
    }
    .with_context(|| format!("opening index {}", args.db))?;

    if let Some(seed) = &args.seed {
        db.load_seed_file(seed, config.max_paragraph_len)
            .with_context(|| format!("loading {}", seed.display()))?;
    }
    tracing::info!(
        paragraphs = db.paragraph_count()?,
        words = db.word_count()?,
        "index opened"
    );

    if args.explain {
        for kind in [MatchKind::Exact, MatchKind::BeginsWith, MatchKind::Contains] {
            println!("{:?}:", kind);
            for line in db.explain_word_lookup(kind)? {
                println!("  {}", line);
            }
        }
        return Ok(());
    }

    let engine = SearchEngine::new(Arc::new(db), config)?;
    let mut session = SearchSession::new();

    let stdin = std::io::stdin();
    let mut out = std::io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("reading query")?;

        match engine.query_changed(&mut session, &line) {
            Ok(SearchStatus::Ready) => {
                writeln!(out, "{} result(s) for {:?}", session.results().len(), line)?;
                for r in session.results().iter().take(args.limit) {
                    writeln!(
                        out,
                        "  [{}] exact={} partial={}  {}",
                        r.paragraph_id, r.exact_matches, r.partial_matches, r.original_text
                    )?;
                }
            }
            Ok(SearchStatus::StoreUnavailable) => {
                writeln!(out, "index unavailable; no results")?;
            }
            Err(e) if e.is_fatal() => return Err(e).context("index is inconsistent"),
            Err(e) => writeln!(out, "error: {}", e)?,
        }
        out.flush()?;
    }

    Ok(())
}
