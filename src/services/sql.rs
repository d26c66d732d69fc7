//! Natural-language questions over PostgreSQL tables.
//!
//! The model writes one `SELECT` for the question, the query runs inside a
//! read-only transaction, and the model then phrases an answer from the rows.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};

use super::llm::ChatModel;
use crate::error::DatabaseError;
use crate::models::DatabaseConfig;

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

const TEXT_TO_SQL_TEMPLATE: &str = "Given an input question, create a syntactically correct PostgreSQL \
query to run. You can order the results by a relevant column to return the most interesting \
examples in the database.

Never query for all the columns from a specific table, only ask for a few relevant columns given \
the question. Pay attention to use only the column names that you can see in the schema \
description. Qualify column names with the table name when needed.

Only use the tables listed below.
{schema}

Question: {question}
Reply with the SQL query only.
SQLQuery: ";

const SYNTHESIS_TEMPLATE: &str = "Given an input question, synthesize a response from the query results.
Query: {question}
SQL: {sql}
SQL Response: {rows}
Response: ";

static FENCED_SQL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```(?:sql|postgresql)?\s*(.*?)```").expect("valid regex")
});

/// Answer to one question, with what was run to produce it.
#[derive(Debug, Clone, Serialize)]
pub struct SqlResponse {
    pub response: String,
    pub sql_query: String,
    pub rows: Vec<Value>,
}

/// Read access to the database as needed by the query engine.
#[async_trait]
pub trait QueryRunner: Send + Sync {
    /// Human-readable column listing for the given tables.
    async fn describe_tables(&self, tables: &[String]) -> Result<String, DatabaseError>;

    /// Run `sql` read-only and return at most `max_rows` rows as JSON objects.
    async fn fetch_rows(&self, sql: &str, max_rows: u32) -> Result<Vec<Value>, DatabaseError>;
}

pub struct SqlDatabase {
    pool: PgPool,
}

/// Credentials are set field by field, so they need no URL escaping.
fn connect_options(config: &DatabaseConfig) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port)
        .username(&config.username)
        .database(&config.database);

    match config.password.as_deref() {
        Some(password) => options.password(password),
        None => options,
    }
}

impl SqlDatabase {
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, DatabaseError> {
        let pool = PgPoolOptions::new()
            .max_connections(2)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(connect_options(config))
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        tracing::debug!(host = %config.host, database = %config.database, "connected to database");
        Ok(Self { pool })
    }

    pub async fn health_check(&self) -> Result<bool, DatabaseError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| true)
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))
    }

    /// Base tables of the `public` schema, sorted by name.
    pub async fn table_names(&self) -> Result<Vec<String>, DatabaseError> {
        let rows: Vec<(String,)> = sqlx::query_as(
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = 'public' AND table_type = 'BASE TABLE' \
             ORDER BY table_name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(e.to_string()))?;

        Ok(rows.into_iter().map(|(name,)| name).collect())
    }
}

#[async_trait]
impl QueryRunner for SqlDatabase {
    async fn describe_tables(&self, tables: &[String]) -> Result<String, DatabaseError> {
        let rows: Vec<(String, String, String)> = sqlx::query_as(
            "SELECT table_name::text, column_name::text, data_type::text \
             FROM information_schema.columns \
             WHERE table_schema = 'public' AND table_name::text = ANY($1) \
             ORDER BY table_name, ordinal_position",
        )
        .bind(tables)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| DatabaseError::QueryError(e.to_string()))?;

        Ok(format_schema(&rows))
    }

    async fn fetch_rows(&self, sql: &str, max_rows: u32) -> Result<Vec<Value>, DatabaseError> {
        let query_err = |e: sqlx::Error| DatabaseError::QueryError(e.to_string());

        let mut tx = self.pool.begin().await.map_err(query_err)?;
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await
            .map_err(query_err)?;

        let wrapped = format!("SELECT row_to_json(t)::text FROM ({sql}) t LIMIT {max_rows}");
        let rows: Vec<(String,)> = sqlx::query_as(&wrapped)
            .fetch_all(&mut *tx)
            .await
            .map_err(query_err)?;
        tx.rollback().await.map_err(query_err)?;

        rows.into_iter()
            .map(|(json,)| {
                serde_json::from_str(&json).map_err(|e| DatabaseError::QueryError(e.to_string()))
            })
            .collect()
    }
}

/// List the tables of the configured database.
///
/// Any connection or query failure is logged and reported as `None`.
pub async fn list_tables(config: &DatabaseConfig) -> Option<Vec<String>> {
    let result = match SqlDatabase::connect(config).await {
        Ok(db) => db.table_names().await,
        Err(e) => Err(e),
    };

    match result {
        Ok(tables) => Some(tables),
        Err(e) => {
            tracing::warn!(error = %e, "could not list tables");
            None
        }
    }
}

fn format_schema(columns: &[(String, String, String)]) -> String {
    let mut out = String::new();
    let mut current: Option<&str> = None;

    for (table, column, data_type) in columns {
        if current != Some(table.as_str()) {
            if current.is_some() {
                out.push_str(".\n");
            }
            out.push_str(&format!("Table '{table}' has columns: {column} ({data_type})"));
            current = Some(table.as_str());
        } else {
            out.push_str(&format!(", {column} ({data_type})"));
        }
    }
    if current.is_some() {
        out.push('.');
    }
    out
}

/// Pull a single read query out of a model reply.
pub fn extract_sql(reply: &str) -> Result<String, DatabaseError> {
    let body = FENCED_SQL
        .captures(reply)
        .and_then(|c| c.get(1))
        .map_or(reply, |m| m.as_str());

    let body = body.split("SQLResult:").next().unwrap_or(body);
    let body = body.trim();
    let body = body.strip_prefix("SQLQuery:").unwrap_or(body);
    let sql = body.trim().trim_end_matches(';').trim();

    if sql.is_empty() {
        return Err(DatabaseError::InvalidSql("empty reply".to_string()));
    }
    if sql.contains(';') {
        return Err(DatabaseError::InvalidSql(format!(
            "expected a single statement: {sql}"
        )));
    }

    let keyword = sql
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    if keyword != "SELECT" && keyword != "WITH" {
        return Err(DatabaseError::InvalidSql(format!(
            "only SELECT queries are allowed: {sql}"
        )));
    }

    Ok(sql.to_string())
}

pub struct NlSqlQueryEngine {
    model: Arc<dyn ChatModel>,
    runner: Arc<dyn QueryRunner>,
    tables: Vec<String>,
    max_rows: u32,
}

impl NlSqlQueryEngine {
    pub fn new(
        model: Arc<dyn ChatModel>,
        runner: Arc<dyn QueryRunner>,
        tables: Vec<String>,
        max_rows: u32,
    ) -> Result<Self, DatabaseError> {
        if tables.is_empty() {
            return Err(DatabaseError::NoTables);
        }
        Ok(Self {
            model,
            runner,
            tables,
            max_rows: max_rows.max(1),
        })
    }

    pub fn tables(&self) -> &[String] {
        &self.tables
    }

    pub async fn query(&self, question: &str) -> Result<SqlResponse, DatabaseError> {
        let schema = self.runner.describe_tables(&self.tables).await?;
        let prompt = TEXT_TO_SQL_TEMPLATE
            .replace("{schema}", &schema)
            .replace("{question}", question);

        let sql_query = extract_sql(&self.model.complete(&prompt).await?)?;
        tracing::debug!(sql = %sql_query, "generated query");

        let rows = self.runner.fetch_rows(&sql_query, self.max_rows).await?;

        let rows_json = serde_json::to_string(&rows)
            .map_err(|e| DatabaseError::QueryError(e.to_string()))?;
        let prompt = SYNTHESIS_TEMPLATE
            .replace("{question}", question)
            .replace("{sql}", &sql_query)
            .replace("{rows}", &rows_json);
        let response = self.model.complete(&prompt).await?;

        Ok(SqlResponse {
            response,
            sql_query,
            rows,
        })
    }
}
