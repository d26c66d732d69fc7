use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;
use indicatif::{ProgressBar, ProgressStyle};

use crate::chat::{ChatLoop, PdfResponder, Typewriter};
use crate::cli::output::{UploadReport, get_formatter};
use crate::models::{Config, OutputFormat};
use crate::services::{PremClient, RepositoryQuery, upload_pdf};
use crate::utils::clear_staging;

#[derive(Debug, Subcommand)]
pub enum PdfCommand {
    #[command(about = "Upload PDF files to the repository")]
    Upload {
        #[arg(required = true, help = "PDF files to upload")]
        files: Vec<PathBuf>,
        #[arg(long, short = 'r', help = "Repository id (overrides config)")]
        repository: Option<u64>,
    },
    #[command(about = "Chat with the documents of the repository")]
    Chat {
        #[arg(long, short = 'r', help = "Repository id (overrides config)")]
        repository: Option<u64>,
    },
    #[command(about = "Remove staged copies of uploaded files")]
    Clean,
}

pub async fn handle_pdf(cmd: PdfCommand, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?.config;

    match cmd {
        PdfCommand::Upload { files, repository } => {
            let repository_id = repository_id(&config, repository)?;
            handle_upload(&config, repository_id, &files, format, verbose).await
        }
        PdfCommand::Chat { repository } => {
            let repository_id = repository_id(&config, repository)?;
            handle_chat(&config, repository_id).await
        }
        PdfCommand::Clean => {
            let formatter = get_formatter(format);
            let removed = clear_staging(&config.repository.staging_dir).with_context(|| {
                format!("failed to clear {}", config.repository.staging_dir.display())
            })?;
            print!(
                "{}",
                formatter.format_message(&format!("Removed {removed} staged files"))
            );
            Ok(())
        }
    }
}

fn repository_id(config: &Config, flag: Option<u64>) -> Result<u64> {
    flag.or(config.repository.id).ok_or_else(|| {
        anyhow::anyhow!("no repository id: pass --repository or set PREMAI_REPOSITORY_ID")
    })
}

async fn handle_upload(
    config: &Config,
    repository_id: u64,
    files: &[PathBuf],
    format: OutputFormat,
    verbose: bool,
) -> Result<()> {
    let formatter = get_formatter(format);
    let prem = PremClient::new(config).context("failed to create Prem client")?;

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );

    let mut report = UploadReport::default();
    for path in files {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        pb.set_message(name.clone());

        match upload_pdf(&prem, repository_id, &config.repository, path).await {
            Ok((staged, document)) => {
                if verbose {
                    pb.println(format!(
                        "Uploaded {} ({} bytes, id {:?})",
                        staged.name, staged.size_bytes, document.id
                    ));
                }
                report.uploaded.push(name);
            }
            Err(e) => {
                tracing::warn!(file = %name, error = %e, "upload failed");
                report.failed.push((name, e.to_string()));
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    print!("{}", formatter.format_upload_report(&report));
    Ok(())
}

async fn handle_chat(config: &Config, repository_id: u64) -> Result<()> {
    let prem = PremClient::new(config).context("failed to create Prem client")?;
    let responder = PdfResponder::new(
        Arc::new(prem),
        RepositoryQuery {
            ids: vec![repository_id],
            similarity_threshold: config.repository.similarity_threshold,
            limit: config.repository.limit,
        },
    );

    ChatLoop::new(
        format!("Chat with PDF (repository {repository_id})"),
        &responder,
        Typewriter::from_config(&config.chat),
    )
    .run()
    .await?;

    Ok(())
}
