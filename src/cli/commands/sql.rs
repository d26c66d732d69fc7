use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Subcommand;

use crate::chat::{ChatLoop, SqlResponder, Typewriter};
use crate::cli::output::get_formatter;
use crate::models::{Config, OutputFormat};
use crate::services::{NlSqlQueryEngine, PremClient, SqlDatabase, list_tables};

#[derive(Debug, Subcommand)]
pub enum SqlCommand {
    #[command(about = "List tables of the configured database")]
    Tables,
    #[command(about = "Chat with database tables")]
    Chat {
        #[arg(long, short = 't', help = "Table to chat with (default: first table)")]
        table: Option<String>,
        #[arg(long, help = "Use all tables")]
        all_tables: bool,
    },
}

pub async fn handle_sql(cmd: SqlCommand, format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?.config;
    let formatter = get_formatter(format);

    let Some(tables) = list_tables(&config.database).await else {
        eprint!("{}", formatter.format_error("No table found"));
        eprintln!("Please set up the SQL DB connection properly. No tables found.");
        return Ok(());
    };

    match cmd {
        SqlCommand::Tables => {
            print!("{}", formatter.format_tables(&tables));
            Ok(())
        }
        SqlCommand::Chat { table, all_tables } => {
            let selected = select_tables(&tables, table, all_tables)?;
            chat(&config, selected).await
        }
    }
}

fn select_tables(tables: &[String], table: Option<String>, all: bool) -> Result<Vec<String>> {
    if tables.is_empty() {
        anyhow::bail!("No table found");
    }
    if all {
        return Ok(tables.to_vec());
    }
    match table {
        Some(name) if tables.contains(&name) => Ok(vec![name]),
        Some(name) => anyhow::bail!("unknown table: {name}"),
        None => Ok(vec![tables[0].clone()]),
    }
}

async fn chat(config: &Config, tables: Vec<String>) -> Result<()> {
    let database = SqlDatabase::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    let prem = PremClient::new(config).context("failed to create Prem client")?;

    let title = format!("Chat with SQL tables ({})", tables.join(", "));
    let engine = NlSqlQueryEngine::new(
        Arc::new(prem),
        Arc::new(database),
        tables,
        config.database.max_rows,
    )?;
    let responder = SqlResponder::new(engine);

    ChatLoop::new(title, &responder, Typewriter::from_config(&config.chat))
        .run()
        .await?;

    Ok(())
}
