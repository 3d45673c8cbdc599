//! Build a paragraph index database.
//!
//! Loads paragraphs from a JSON seed file (an array of strings), or generates
//! synthetic ones for benchmarking.
//!
//! Usage:
//!     cargo run --release --bin generate-seed-db -- --seed data/sample_paragraphs.json out.sqlite
//!     cargo run --release --bin generate-seed-db -- --synthetic 50000 perf.sqlite

use anyhow::{bail, Context, Result};
use clap::{ArgGroup, Parser};
use rand::Rng;
use seek::config::MAX_PARAGRAPH_SIZE;
use seek::models::StoredParagraph;
use seek::IndexDatabase;
use std::path::{Path, PathBuf};

/// Paragraphs inserted per transaction in synthetic mode
const BATCH_SIZE: usize = 1_000;

/// Filler vocabulary for synthetic paragraphs
const LOREM_WORDS: &[&str] = &[
    "lorem", "ipsum", "dolor", "sit", "amet", "consectetur", "adipiscing", "elit",
    "sed", "do", "eiusmod", "tempor", "incididunt", "ut", "labore", "et", "dolore",
    "magna", "aliqua", "enim", "ad", "minim", "veniam", "quis", "nostrud",
    "exercitation", "ullamco", "laboris", "nisi", "aliquip", "ex", "ea", "commodo",
    "consequat", "duis", "aute", "irure", "in", "reprehenderit", "voluptate",
];

/// Words sprinkled in so benchmarks have predictable hits
const KEYWORDS: &[&str] = &[
    "cat", "catalog", "scatter", "river", "riverside", "salt", "pepper", "error",
    "rock-n-roll", "black_box", "fish & chips",
];

#[derive(Parser, Debug)]
#[command(about = "Create a seek index database")]
#[command(group(ArgGroup::new("source").required(true).args(["seed", "synthetic"])))]
struct Args {
    /// Output database path (replaced if it exists)
    output: PathBuf,

    /// JSON file holding an array of paragraph strings
    #[arg(long)]
    seed: Option<PathBuf>,

    /// Generate this many random paragraphs instead of reading a seed file
    #[arg(long)]
    synthetic: Option<usize>,
}

fn synthetic_paragraph(rng: &mut impl Rng) -> String {
    let len = rng.gen_range(4..=24);
    let mut words: Vec<&str> = (0..len)
        .map(|_| LOREM_WORDS[rng.gen_range(0..LOREM_WORDS.len())])
        .collect();

    if rng.gen_bool(0.3) {
        let at = rng.gen_range(0..words.len());
        words.insert(at, KEYWORDS[rng.gen_range(0..KEYWORDS.len())]);
    }

    let mut text = words.join(" ");
    text.truncate(MAX_PARAGRAPH_SIZE);
    if let Some(first) = text.get_mut(0..1) {
        first.make_ascii_uppercase();
    }
    text
}

fn write_synthetic(db: &IndexDatabase, count: usize) -> Result<usize> {
    let mut rng = rand::thread_rng();
    let mut written = 0;

    while written < count {
        let batch: Vec<StoredParagraph> = (0..BATCH_SIZE.min(count - written))
            .filter_map(|_| StoredParagraph::new(&synthetic_paragraph(&mut rng), MAX_PARAGRAPH_SIZE).ok())
            .collect();
        written += db.insert_paragraphs(&batch)?.len();
        println!("  Generated {}/{} paragraphs...", written, count);
    }

    db.analyze()?;
    Ok(written)
}

/// Delete a previous database together with its WAL/SHM/journal sidecars
fn remove_existing(path: &Path) -> Result<()> {
    let mut targets = vec![path.to_path_buf()];
    for suffix in ["-wal", "-shm", "-journal"] {
        let mut sidecar = path.as_os_str().to_owned();
        sidecar.push(suffix);
        targets.push(PathBuf::from(sidecar));
    }

    for target in targets.iter().filter(|t| t.exists()) {
        std::fs::remove_file(target)
            .with_context(|| format!("removing existing {}", target.display()))?;
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    remove_existing(&args.output)?;
    if let Some(parent) = args.output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context("creating output directory")?;
    }

    println!("Generating index database...");
    println!("Output: {}", args.output.display());

    let db = IndexDatabase::open(&args.output).context("creating database")?;

    let inserted = match (&args.seed, args.synthetic) {
        (Some(seed), _) => db
            .load_seed_file(seed, MAX_PARAGRAPH_SIZE)
            .with_context(|| format!("loading {}", seed.display()))?,
        (None, Some(count)) => write_synthetic(&db, count)?,
        (None, None) => bail!("pass either --seed <file> or --synthetic <count>"),
    };

    println!();
    println!("Database created: {}", args.output.display());
    println!("  Paragraphs: {}", inserted);
    println!("  Words: {}", db.word_count()?);
    println!(
        "  Size: {:.2} MB",
        db.database_size()? as f64 / 1024.0 / 1024.0
    );
    Ok(())
}
