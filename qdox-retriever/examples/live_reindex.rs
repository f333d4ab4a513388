//! Watch a temporary folder, add a document and query the republished snapshot

use anyhow::Result;
use qdox_lsi::LsiConfig;
use qdox_retriever::retrieval::{
    corpus::PathPattern,
    reindex::{ReindexConfig, ReindexCoordinator},
    snapshot::{ModelSnapshot, SearchContext},
};
use std::time::Duration;
use tempfile::tempdir;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    println!("🚀 Starting live reindex demo...\n");

    let temp_dir = tempdir()?;
    let root = temp_dir.path().to_path_buf();
    println!("📁 Created document folder at: {}", root.display());

    let documents = [
        ("camping.txt", "A wild weekend of camping in the mountains."),
        ("animals.txt", "Wild animals roam the mountains at night."),
        ("brunch.txt", "Weekend brunch recipes for the whole family."),
        ("report.txt", "The quarterly revenue report shows steady growth."),
        ("sales.txt", "Revenue from weekend sales beat expectations."),
    ];
    for (name, text) in documents {
        std::fs::write(root.join(name), text)?;
    }
    println!("📝 Wrote {} documents", documents.len());

    let pattern = PathPattern::new(r"\.txt$")?;
    let first = ModelSnapshot::build(&root, |p| pattern.matches(p), &LsiConfig::default(), 0)?;
    let context = SearchContext::with_snapshot(first);
    show(&context, "mountain hiking");

    let config = ReindexConfig::new(&root, pattern.into_filter())
        .with_poll_interval(Duration::from_millis(200))
        .with_first_generation(1);
    let mut coordinator = ReindexCoordinator::start(config, context.publisher()).await?;
    let mut updates = context.subscribe();
    tokio::time::sleep(Duration::from_millis(500)).await;

    println!("\n➕ Adding hiking.txt");
    std::fs::write(
        root.join("hiking.txt"),
        "Mountain hiking trails and maps for a weekend trip.",
    )?;

    tokio::time::timeout(Duration::from_secs(10), updates.changed()).await??;
    show(&context, "mountain hiking");

    coordinator.stop().await?;
    let stats = coordinator.stats();
    println!(
        "\n✅ Stopped after {} reloads ({} failures, {} dropped events)",
        stats.reloads, stats.failures, stats.dropped_events
    );
    Ok(())
}

fn show(context: &SearchContext, query: &str) {
    let Some(snapshot) = context.current() else {
        println!("❌ Nothing published");
        return;
    };
    let result = snapshot.query(query, 3, 0.0);
    println!(
        "\n🔎 {query} (snapshot {}, {} documents)",
        snapshot.generation(),
        snapshot.document_count()
    );
    for doc in snapshot.resolve(&result) {
        println!("   {:>5.1}%  {}", doc.similarity * 100.0, doc.path.display());
    }
}
