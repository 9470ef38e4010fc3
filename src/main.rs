use rust_doc_qa::api;
use rust_doc_qa::config::PipelineConfig;
use rust_doc_qa::database::VectorStore;
use rust_doc_qa::pipeline::QaPipeline;
use rust_doc_qa::providers::create_provider;
use rust_doc_qa::retrieval::Retriever;

use clap::Parser;
use colored::Colorize;
use dotenv::dotenv;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Port the API server listens on.
    #[arg(long, default_value = "3000")]
    port: u16,

    /// Qdrant URL; falls back to QDRANT_URL, then localhost.
    #[arg(long)]
    qdrant_url: Option<String>,

    /// Collection chunks are indexed into.
    #[arg(long, default_value = "documents")]
    collection: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    colored::control::set_override(true);
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();
    let config = PipelineConfig::from_env();

    let qdrant_url = args
        .qdrant_url
        .clone()
        .or_else(|| env::var("QDRANT_URL").ok())
        .unwrap_or_else(|| "http://localhost:6333".to_string());

    println!("{}", "Document QA pipeline starting...".cyan());
    println!(
        "  embedding provider: {}",
        config.models.embedding_provider.to_string().green()
    );
    println!(
        "  generation provider: {}",
        config.models.generation_provider.to_string().green()
    );
    println!("  collection: {}", args.collection.green());

    let embedding_provider = create_provider(config.models.embedding_provider, &config.models)?;
    let generation_provider = if config.models.generation_provider == config.models.embedding_provider
    {
        embedding_provider.clone()
    } else {
        create_provider(config.models.generation_provider, &config.models)?
    };

    let store = VectorStore::connect(&qdrant_url).await?;
    let retriever = Retriever::new(
        store,
        embedding_provider,
        args.collection.clone(),
        config.retrieval.clone(),
    );
    let pipeline = Arc::new(QaPipeline::new(config, retriever, generation_provider));

    let app = api::create_api(pipeline);

    let addr: SocketAddr = format!("0.0.0.0:{}", args.port).parse()?;
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;

    println!("{} {}", "Server listening on".cyan(), addr.to_string().green());

    axum::serve(listener, app)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    Ok(())
}
