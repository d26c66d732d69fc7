use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;

use crate::chat::{ArxivResponder, ChatLoop, Typewriter};
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::{PremClient, QdrantBackend, RagPipeline, VectorStore};

#[derive(Debug, Args)]
pub struct ArxivArgs {
    #[arg(long, short = 'c', help = "Qdrant collection to chat with (default: first found)")]
    pub collection: Option<String>,
}

pub async fn handle_arxiv(args: ArxivArgs, format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?.config;
    let formatter = get_formatter(format);

    let store = QdrantBackend::new(&config.qdrant).context("failed to create Qdrant client")?;
    let collections = store.list_collections().await.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not list collections");
        Vec::new()
    });

    let collection = match args.collection {
        Some(name) if collections.contains(&name) => name,
        Some(name) => {
            anyhow::bail!("collection not found: {name}");
        }
        None => match collections.into_iter().next() {
            Some(name) => name,
            None => {
                eprint!("{}", formatter.format_error("No collections found"));
                eprintln!("Please set up Qdrant properly. No collections found.");
                return Ok(());
            }
        },
    };

    let prem = Arc::new(PremClient::new(&config).context("failed to create Prem client")?);
    let pipeline = RagPipeline::new(
        prem.clone(),
        prem,
        Arc::new(store),
        &collection,
        config.qdrant.top_k,
    );
    let responder = ArxivResponder::new(pipeline);

    ChatLoop::new(
        format!("ArXiv paper search & QnA ({collection})"),
        &responder,
        Typewriter::from_config(&config.chat),
    )
    .run()
    .await?;

    Ok(())
}

pub async fn handle_collections(format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?.config;
    let formatter = get_formatter(format);

    let store = QdrantBackend::new(&config.qdrant).context("failed to create Qdrant client")?;
    let collections = store
        .list_collections()
        .await
        .context("failed to list collections")?;

    print!("{}", formatter.format_collections(&collections));
    Ok(())
}
