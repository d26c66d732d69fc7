use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};

use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::{MapReduceSummarizer, PremClient, UploadTarget, WebLoader};
use crate::utils::split_url_list;

#[derive(Debug, Args)]
pub struct SummarizeArgs {
    #[arg(help = "Comma-separated list of URLs")]
    pub urls: String,

    #[arg(long, help = "Upload inputs, intermediate steps and summaries to the repository")]
    pub upload: bool,

    #[arg(long, help = "Name prefix for uploaded documents (default: derived from the URL)")]
    pub topic: Option<String>,

    #[arg(long, short = 'r', help = "Repository id (overrides config)")]
    pub repository: Option<u64>,
}

pub async fn handle_summarize(
    args: SummarizeArgs,
    format: OutputFormat,
    _verbose: bool,
) -> Result<()> {
    let config = Config::load()?.config;
    let formatter = get_formatter(format);

    let urls = split_url_list(&args.urls);
    if urls.iter().all(|u| u.is_empty()) {
        anyhow::bail!("no URLs given");
    }

    let prem = Arc::new(PremClient::new(&config).context("failed to create Prem client")?);
    let loader = WebLoader::new(Duration::from_secs(config.prem.timeout_secs))
        .context("failed to create web loader")?;
    let summarizer = MapReduceSummarizer::new(prem.clone(), &config.summarizer);

    let upload = if args.upload {
        let repository_id = args.repository.or(config.repository.id).ok_or_else(|| {
            anyhow::anyhow!("no repository id: pass --repository or set PREMAI_REPOSITORY_ID")
        })?;
        Some(UploadTarget {
            repository: prem.as_ref(),
            repository_id,
            topic: args.topic.as_deref(),
        })
    } else {
        None
    };

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap(),
    );
    spinner.set_message(format!("Summarizing {} URLs ....", urls.len()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let report = summarizer.summarize_urls(&loader, &urls, upload).await;
    spinner.finish_and_clear();

    print!("{}", formatter.format_url_report(&report));
    Ok(())
}
