use anyhow::Result;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, OutputFormat};
use crate::services::{PremClient, QdrantBackend, SqlDatabase, VectorStore};

pub async fn handle_status(format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?.config;
    let formatter = get_formatter(format);

    let prem = PremClient::new(&config).ok();
    let prem_configured = prem.is_some();
    let prem_connected = match &prem {
        Some(client) => client.health_check().await.unwrap_or(false),
        None => false,
    };

    let (qdrant_connected, collections) = match QdrantBackend::new(&config.qdrant) {
        Ok(store) => match store.list_collections().await {
            Ok(names) => (true, names.len() as u64),
            Err(_) => (false, 0),
        },
        Err(_) => (false, 0),
    };

    let (database_connected, tables) = match SqlDatabase::connect(&config.database).await {
        Ok(db) => {
            let connected = db.health_check().await.unwrap_or(false);
            let tables = if connected {
                db.table_names().await.map_or(0, |t| t.len() as u64)
            } else {
                0
            };
            (connected, tables)
        }
        Err(_) => (false, 0),
    };

    let status = StatusInfo {
        prem_url: config.prem.base_url.clone(),
        prem_connected,
        prem_configured,
        qdrant_url: config.qdrant.url.clone(),
        qdrant_connected,
        collections,
        database: format!(
            "{}:{}/{}",
            config.database.host, config.database.port, config.database.database
        ),
        database_connected,
        tables,
    };

    print!("{}", formatter.format_status(&status));

    if !prem_configured {
        eprintln!();
        eprintln!("Hint: set PREMAI_API_KEY and PREMAI_PROJECT_ID, or run: premchat config init");
    }
    if !qdrant_connected {
        eprintln!("Warning: Qdrant not reachable at {}", config.qdrant.url);
    }
    if !database_connected {
        eprintln!("Warning: PostgreSQL not accessible. Check PG* settings.");
    }

    Ok(())
}
