use std::path::Path;

use console::style;
use tracing::info;

use crate::Result;
use crate::config::Config;
use crate::database::lancedb::GraphVectorStore;
use crate::loader::load_path;
use crate::pipeline::{GraphRagPipeline, RagPipeline};

/// Print the active configuration as TOML.
#[inline]
pub fn show_config(config: &Config) -> Result<()> {
    println!("{}", style("Current configuration").bold());
    println!("Base directory: {}", config.base_dir.display());
    println!();

    let rendered = toml::to_string_pretty(config)
        .map_err(|e| crate::RagError::Config(format!("Failed to render config: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

/// Load a file or directory, then chunk, embed, and store its contents.
#[inline]
pub async fn ingest(config: &Config, path: &Path) -> Result<()> {
    info!("Ingesting from {}", path.display());

    let report = load_path(path)?;
    if report.documents.is_empty() {
        println!("No loadable documents found at {}", path.display());
        return Ok(());
    }

    println!(
        "Loaded {} documents ({} files skipped)",
        report.documents.len(),
        report.skipped.len()
    );

    let added = if config.graph.enabled {
        let mut pipeline = GraphRagPipeline::new(config).await?;
        pipeline.ingest(&report.documents).await?
    } else {
        let mut pipeline = RagPipeline::new(config).await?;
        pipeline.ingest(&report.documents).await?
    };

    println!(
        "{} {} chunks added to collection {}",
        style("✓").green(),
        added,
        style(&config.collection).cyan()
    );

    for skipped in &report.skipped {
        println!("  {} skipped {}", style("-").dim(), skipped);
    }

    Ok(())
}

/// Run a similarity search and print the ranked hits.
#[inline]
pub async fn search(config: &Config, query: &str, top_k: usize) -> Result<()> {
    let pipeline = GraphRagPipeline::new(config).await?;
    let results = pipeline.search(query, top_k).await?;

    if results.is_empty() {
        println!("No results in collection {}", style(&config.collection).cyan());
        return Ok(());
    }

    for (rank, result) in results.iter().enumerate() {
        println!(
            "{} {} {}",
            style(format!("{}.", rank + 1)).bold(),
            style(format!("[{:.3}]", result.score)).green(),
            style(&result.source).cyan()
        );
        println!("   {}", truncated(&result.content, 200));

        if let Some(graph) = &result.graph {
            if !graph.entities.is_empty() {
                println!("   {} {}", style("entities:").dim(), graph.entities.join(", "));
            }
        }
        println!();
    }

    Ok(())
}

/// Answer a question from retrieved context.
#[inline]
pub async fn ask(
    config: &Config,
    question: &str,
    top_k: usize,
    use_graph_context: bool,
) -> Result<()> {
    let answer = if config.graph.enabled {
        let pipeline = GraphRagPipeline::new(config).await?;
        pipeline
            .answer(question, top_k, config.generation.max_tokens, use_graph_context)
            .await?
    } else {
        let pipeline = RagPipeline::new(config).await?;
        pipeline
            .answer(question, top_k, config.generation.max_tokens)
            .await?
    };

    println!("{}", answer);
    Ok(())
}

/// List collections with their catalog metadata.
#[inline]
pub async fn list_collections(config: &Config) -> Result<()> {
    let store = GraphVectorStore::open(config.vector_database_path(), &config.collection).await?;
    let catalog = crate::database::sqlite::Database::new(ensure_catalog_path(config)?).await?;

    let names = store.collections().await?;
    if names.is_empty() {
        println!("No collections yet");
        return Ok(());
    }

    for name in names {
        let marker = if name == config.collection { "*" } else { " " };
        match catalog.get_collection(&name).await? {
            Some(record) => println!(
                "{} {}  ({}, {} dims, created {})",
                marker,
                style(&name).cyan(),
                record.embedding_model,
                record.dimension,
                record.created_at.format("%Y-%m-%d")
            ),
            None => println!("{} {}", marker, style(&name).cyan()),
        }
    }

    Ok(())
}

/// Delete a collection and its catalog records.
#[inline]
pub async fn delete_collection(config: &Config, name: &str) -> Result<()> {
    let mut store =
        GraphVectorStore::open(config.vector_database_path(), &config.collection).await?;
    let catalog = crate::database::sqlite::Database::new(ensure_catalog_path(config)?).await?;

    store.delete_collection(name).await?;
    catalog.forget_collection(name).await?;

    println!("{} deleted collection {}", style("✓").green(), style(name).cyan());
    Ok(())
}

/// Remove all records from the active collection.
#[inline]
pub async fn clear(config: &Config) -> Result<()> {
    let mut store =
        GraphVectorStore::open(config.vector_database_path(), &config.collection).await?;
    let catalog = crate::database::sqlite::Database::new(ensure_catalog_path(config)?).await?;

    store.clear().await?;
    catalog.forget_collection(&config.collection).await?;

    println!(
        "{} cleared collection {}",
        style("✓").green(),
        style(&config.collection).cyan()
    );
    Ok(())
}

/// Print all entities in the knowledge graph with their counts.
#[inline]
pub async fn list_entities(config: &Config) -> Result<()> {
    let store = GraphVectorStore::open(config.vector_database_path(), &config.collection).await?;
    let entities = store.get_all_entities().await?;

    if entities.is_empty() {
        println!("No entities in collection {}", style(&config.collection).cyan());
        return Ok(());
    }

    let mut sorted: Vec<(String, usize)> = entities.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

    for (name, count) in sorted {
        println!("{:5}  {}", count, name);
    }

    Ok(())
}

/// Print all relations in the knowledge graph.
#[inline]
pub async fn list_relations(config: &Config) -> Result<()> {
    let store = GraphVectorStore::open(config.vector_database_path(), &config.collection).await?;
    let relations = store.get_all_relations().await?;

    if relations.is_empty() {
        println!("No relations in collection {}", style(&config.collection).cyan());
        return Ok(());
    }

    for relation in relations {
        println!(
            "{} {} {}",
            style(&relation.source).cyan(),
            style(&relation.label).dim(),
            style(&relation.target).cyan()
        );
    }

    Ok(())
}

/// Traverse the knowledge graph from an entity.
#[inline]
pub async fn traverse(config: &Config, entity: &str, max_hops: usize) -> Result<()> {
    let store = GraphVectorStore::open(config.vector_database_path(), &config.collection).await?;
    let traversal = store.traverse(entity, max_hops).await?;

    println!(
        "Reached {} entities in {} hops from {}",
        traversal.entities.len(),
        traversal.hops,
        style(entity).cyan()
    );
    println!("Entities: {}", traversal.entities.join(", "));

    if !traversal.relations.is_empty() {
        println!("Relations:");
        for relation in &traversal.relations {
            println!("  - {} {} {}", relation.source, relation.label, relation.target);
        }
    }

    Ok(())
}

/// Print collection statistics.
#[inline]
pub async fn show_stats(config: &Config) -> Result<()> {
    let pipeline = GraphRagPipeline::new(config).await?;
    let stats = pipeline.stats().await?;

    println!("{}", style("Collection statistics").bold());
    println!("Collection:          {}", stats.base.collection);
    println!("Chunks:              {}", stats.base.total_chunks);
    println!("Documents:           {}", stats.base.total_documents);
    println!("Embedding model:     {}", stats.base.embedding_model);
    println!("Embedding dimension: {}", stats.base.embedding_dimension);
    println!("Generation model:    {}", stats.base.generation_model);
    println!(
        "Chunking:            {} chars, {} overlap",
        stats.base.chunk_size, stats.base.chunk_overlap
    );
    println!("Entities:            {}", stats.total_entities);
    println!("Relations:           {}", stats.total_relations);

    if !stats.top_entities.is_empty() {
        println!("Top entities:");
        for (name, count) in &stats.top_entities {
            println!("  {:5}  {}", count, name);
        }
    }

    Ok(())
}

fn ensure_catalog_path(config: &Config) -> Result<std::path::PathBuf> {
    std::fs::create_dir_all(&config.base_dir)?;
    Ok(config.catalog_path())
}

fn truncated(text: &str, max_chars: usize) -> String {
    let mut truncated: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        truncated.push('…');
    }
    truncated.replace('\n', " ")
}
