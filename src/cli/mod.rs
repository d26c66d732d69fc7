//! CLI module for premchat.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Chat with papers, PDFs and SQL tables, and summarize web pages, on Prem AI.
#[derive(Debug, Parser)]
#[command(name = "premchat")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Ask questions about arXiv papers stored in Qdrant
    Arxiv(commands::ArxivArgs),

    /// List Qdrant collections
    Collections,

    /// Upload PDFs to a Prem repository and chat with them
    #[command(subcommand)]
    Pdf(commands::PdfCommand),

    /// Chat with PostgreSQL tables
    #[command(subcommand)]
    Sql(commands::SqlCommand),

    /// Summarize web pages, optionally uploading the results
    Summarize(commands::SummarizeArgs),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),

    /// Check reachability of Prem API, Qdrant and PostgreSQL
    Status,
}
