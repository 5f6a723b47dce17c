use std::path::PathBuf;

use clap::{Parser, Subcommand};
use ragkit::Result;
use ragkit::commands::{
    ask, clear, delete_collection, ingest, list_collections, list_entities, list_relations,
    search, show_config, show_stats, traverse,
};
use ragkit::config::{Config, default_base_dir};

#[derive(Parser)]
#[command(name = "ragkit")]
#[command(about = "Retrieval-augmented generation toolkit with a knowledge graph overlay")]
#[command(version)]
struct Cli {
    /// Base directory for configuration and persisted data
    #[arg(long, global = true)]
    dir: Option<PathBuf>,

    /// Collection to operate on (overrides the configured default)
    #[arg(long, global = true)]
    collection: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the active configuration
    Config,
    /// Ingest a file or directory into the vector store
    Ingest {
        /// Path to a .txt, .md, or .csv file, or a directory to walk
        path: PathBuf,
    },
    /// Search the collection for similar chunks
    Search {
        /// Natural-language query
        query: String,
        /// Number of results to return
        #[arg(long, default_value_t = 5)]
        top_k: usize,
    },
    /// Answer a question from retrieved context
    Ask {
        /// The question to answer
        question: String,
        /// Number of chunks to retrieve as context
        #[arg(long, default_value_t = 5)]
        top_k: usize,
        /// Leave knowledge-graph relationships out of the context
        #[arg(long)]
        no_graph_context: bool,
    },
    /// List all collections
    Collections,
    /// Delete a collection
    DeleteCollection {
        /// Name of the collection to delete
        name: String,
    },
    /// Remove all records from the active collection
    Clear,
    /// List knowledge graph entities with occurrence counts
    Entities,
    /// List knowledge graph relations
    Relations,
    /// Traverse the knowledge graph from an entity
    Traverse {
        /// Entity to start from
        entity: String,
        /// Maximum number of hops
        #[arg(long, default_value_t = 2)]
        hops: usize,
    },
    /// Show collection statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let base_dir = cli.dir.clone().unwrap_or_else(default_base_dir);
    let mut config = Config::load(&base_dir)?;
    if let Some(collection) = cli.collection {
        config.collection = collection;
    }

    match cli.command {
        Commands::Config => {
            show_config(&config)?;
        }
        Commands::Ingest { path } => {
            ingest(&config, &path).await?;
        }
        Commands::Search { query, top_k } => {
            search(&config, &query, top_k).await?;
        }
        Commands::Ask {
            question,
            top_k,
            no_graph_context,
        } => {
            ask(&config, &question, top_k, !no_graph_context).await?;
        }
        Commands::Collections => {
            list_collections(&config).await?;
        }
        Commands::DeleteCollection { name } => {
            delete_collection(&config, &name).await?;
        }
        Commands::Clear => {
            clear(&config).await?;
        }
        Commands::Entities => {
            list_entities(&config).await?;
        }
        Commands::Relations => {
            list_relations(&config).await?;
        }
        Commands::Traverse { entity, hops } => {
            traverse(&config, &entity, hops).await?;
        }
        Commands::Stats => {
            show_stats(&config).await?;
        }
    }

    Ok(())
}
