//! Fit an LSI pipeline on a handful of sentences and rank them against a query

use qdox_lsi::{LsiConfig, LsiPipeline, VectorSpace};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    println!("📚 qdox-lsi - Fit and Query Example");
    println!("===================================");

    let texts = vec![
        "A wild weekend of camping in the mountains.",
        "Wild animals roam the mountains at night.",
        "Weekend brunch recipes for the whole family.",
        "The quarterly revenue report shows steady growth.",
        "Revenue from weekend sales beat expectations.",
        "Camping gear checklist for a mountain trip.",
    ];

    let config = LsiConfig::default().with_rank(3);
    println!("📝 Fitting on {} texts with rank {}", texts.len(), config.rank);

    let mut pipeline = LsiPipeline::new(config);
    let model = pipeline.fit(&texts)?;

    println!("✅ Model fitted");
    println!("   Vocabulary: {} terms", model.vocabulary_len());
    println!("   Singular values: {:?}", model.singular_values().as_slice());

    for query in ["wild weekend", "revenue growth", "mountain camping"] {
        let vector = pipeline.transform(query)?;
        let mut scored: Vec<(usize, f64)> = (0..pipeline.column_count())
            .map(|doc| (doc, pipeline.column_similarity(&vector, doc)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));

        println!("\n🔎 {query}");
        for (doc, similarity) in scored.iter().take(3) {
            println!("   {:>5.1}%  {}", similarity * 100.0, texts[*doc]);
        }
    }

    Ok(())
}
