use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::search::OutputFormat;
use crate::error::ConfigError;

pub const DEFAULT_PREM_BASE_URL: &str = "https://app.premai.io";
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_EMBEDDING_MODEL: &str = "mistral-embed";
pub const DEFAULT_STAGING_DIR: &str = ".tempdir";

const PROJECT_DIR: &str = ".premchat";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub prem: PremConfig,

    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub qdrant: QdrantConfig,

    #[serde(default)]
    pub repository: RepositoryConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub summarizer: SummarizerConfig,

    #[serde(default)]
    pub chat: ChatConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Configuration together with the files it was read from.
#[derive(Debug, Clone, Default)]
pub struct ResolvedConfig {
    pub config: Config,
    pub project_path: Option<PathBuf>,
    pub global_path: Option<PathBuf>,
}

impl Config {
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("premchat").join(CONFIG_FILE))
    }

    pub fn project_config_dir() -> Option<PathBuf> {
        std::env::current_dir().ok().map(|p| p.join(PROJECT_DIR))
    }

    pub fn project_path() -> Option<PathBuf> {
        Self::project_config_dir().map(|p| p.join(CONFIG_FILE))
    }

    /// Load global, then project config, then apply environment overrides.
    pub fn load() -> Result<ResolvedConfig, ConfigError> {
        let global_path = Self::global_path().filter(|p| p.exists());
        let project_path = Self::project_path().filter(|p| p.exists());

        let mut merged = toml::Value::Table(toml::map::Map::new());
        for path in [&global_path, &project_path].into_iter().flatten() {
            let layer: toml::Table = toml::from_str(&std::fs::read_to_string(path)?)?;
            merge_values(&mut merged, toml::Value::Table(layer));
        }

        let mut config: Config = merged.try_into()?;
        config.apply_env(|key| std::env::var(key).ok());

        Ok(ResolvedConfig {
            config,
            project_path,
            global_path,
        })
    }

    /// Apply `PREMAI_*`, `QDRANT_*` and libpq-style `PG*` overrides.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("PREMAI_API_KEY") {
            self.prem.api_key = Some(v);
        }
        if let Some(v) = get("PREMAI_PROJECT_ID").and_then(|v| v.parse().ok()) {
            self.prem.project_id = Some(v);
        }
        if let Some(v) = get("PREMAI_REPOSITORY_ID").and_then(|v| v.parse().ok()) {
            self.repository.id = Some(v);
        }
        if let Some(v) = get("QDRANT_URL") {
            self.qdrant.url = v;
        }
        if let Some(v) = get("QDRANT_API_KEY") {
            self.qdrant.api_key = Some(v);
        }
        if let Some(v) = get("PGUSER") {
            self.database.username = v;
        }
        if let Some(v) = get("PGPASSWORD") {
            self.database.password = Some(v);
        }
        if let Some(v) = get("PGHOST") {
            self.database.host = v;
        }
        if let Some(v) = get("PGPORT").and_then(|v| v.parse().ok()) {
            self.database.port = v;
        }
        if let Some(v) = get("PGDATABASE") {
            self.database.database = v;
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    pub fn init_global() -> Result<PathBuf, ConfigError> {
        let path = Self::global_path().ok_or_else(|| {
            ConfigError::PathError("could not determine config directory".to_string())
        })?;
        Self::default().save(&path)?;
        Ok(path)
    }

    pub fn init_project() -> Result<PathBuf, ConfigError> {
        let path = Self::project_path().ok_or_else(|| {
            ConfigError::PathError("could not determine project directory".to_string())
        })?;
        Self::default().save(&path)?;
        Ok(path)
    }

    /// A copy safe to print: secrets are replaced with a mask.
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.prem.api_key = copy.prem.api_key.as_deref().map(mask_secret);
        copy.qdrant.api_key = copy.qdrant.api_key.as_deref().map(mask_secret);
        copy.database.password = copy.database.password.as_deref().map(mask_secret);
        copy
    }
}

fn mask_secret(secret: &str) -> String {
    let visible: String = secret.chars().take(4).collect();
    if secret.chars().count() <= 8 {
        "********".to_string()
    } else {
        format!("{visible}********")
    }
}

/// Deep-merge `overlay` into `base`; tables merge key by key, anything else replaces.
fn merge_values(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, value) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_table.insert(key, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PremConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<u64>,

    #[serde(default = "default_prem_base_url")]
    pub base_url: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_prem_base_url() -> String {
    DEFAULT_PREM_BASE_URL.to_string()
}

fn default_timeout() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_max_retries() -> u32 {
    3
}

impl Default for PremConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            project_id: None,
            base_url: default_prem_base_url(),
            timeout_secs: default_timeout(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            max_retries: default_max_retries(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QdrantConfig {
    #[serde(default = "default_qdrant_url")]
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Nearest neighbours fetched per retriever.
    #[serde(default = "default_top_k")]
    pub top_k: u64,
}

fn default_qdrant_url() -> String {
    DEFAULT_QDRANT_URL.to_string()
}

fn default_top_k() -> u64 {
    3
}

impl Default for QdrantConfig {
    fn default() -> Self {
        Self {
            url: default_qdrant_url(),
            api_key: None,
            top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f32,

    #[serde(default = "default_chunk_limit")]
    pub limit: u32,

    #[serde(default = "default_staging_dir")]
    pub staging_dir: PathBuf,

    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_similarity_threshold() -> f32 {
    0.25
}

fn default_chunk_limit() -> u32 {
    5
}

fn default_staging_dir() -> PathBuf {
    PathBuf::from(DEFAULT_STAGING_DIR)
}

fn default_max_file_size() -> u64 {
    20 * 1024 * 1024
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            id: None,
            similarity_threshold: default_similarity_threshold(),
            limit: default_chunk_limit(),
            staging_dir: default_staging_dir(),
            max_file_size: default_max_file_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_username")]
    pub username: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default = "default_db_name")]
    pub database: String,

    /// Upper bound on rows returned to the model from a generated query.
    #[serde(default = "default_max_rows")]
    pub max_rows: u32,
}

fn default_db_username() -> String {
    "postgres".to_string()
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_name() -> String {
    "postgres".to_string()
}

fn default_max_rows() -> u32 {
    50
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            username: default_db_username(),
            password: None,
            host: default_db_host(),
            port: default_db_port(),
            database: default_db_name(),
            max_rows: default_max_rows(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    /// Chunk size in tokens.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u32,

    #[serde(default)]
    pub chunk_overlap: u32,

    /// Combined summaries above this many tokens get collapsed first.
    #[serde(default = "default_token_max")]
    pub token_max: u32,

    #[serde(default = "default_max_collapse_rounds")]
    pub max_collapse_rounds: u32,
}

fn default_chunk_size() -> u32 {
    1000
}

fn default_token_max() -> u32 {
    4000
}

fn default_max_collapse_rounds() -> u32 {
    8
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: 0,
            token_max: default_token_max(),
            max_collapse_rounds: default_max_collapse_rounds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Delay between characters when replaying a response.
    #[serde(default = "default_stream_delay_ms")]
    pub stream_delay_ms: u64,
}

fn default_stream_delay_ms() -> u64 {
    10
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            stream_delay_ms: default_stream_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.prem.base_url, DEFAULT_PREM_BASE_URL);
        assert_eq!(config.qdrant.url, DEFAULT_QDRANT_URL);
        assert_eq!(config.qdrant.top_k, 3);
        assert_eq!(config.embedding.model, DEFAULT_EMBEDDING_MODEL);
        assert_eq!(config.repository.similarity_threshold, 0.25);
        assert_eq!(config.repository.limit, 5);
        assert_eq!(config.summarizer.chunk_size, 1000);
        assert_eq!(config.summarizer.token_max, 4000);
        assert_eq!(config.chat.stream_delay_ms, 10);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [prem]
            project_id = 4071

            [repository]
            id = 2100
            "#,
        )
        .unwrap();
        assert_eq!(config.prem.project_id, Some(4071));
        assert_eq!(config.prem.max_tokens, 1024);
        assert_eq!(config.repository.id, Some(2100));
        assert_eq!(config.repository.limit, 5);
    }

    #[test]
    fn test_merge_project_over_global() {
        let base: toml::Table = toml::from_str(
            "[prem]\nproject_id = 1\ntemperature = 0.5\n[qdrant]\nurl = \"http://a:6334\"",
        )
        .unwrap();
        let overlay: toml::Table = toml::from_str("[prem]\nproject_id = 2").unwrap();
        let mut base = toml::Value::Table(base);
        merge_values(&mut base, toml::Value::Table(overlay));

        let config: Config = base.try_into().unwrap();
        assert_eq!(config.prem.project_id, Some(2));
        assert_eq!(config.prem.temperature, 0.5);
        assert_eq!(config.qdrant.url, "http://a:6334");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("PREMAI_API_KEY", "sk-test"),
            ("PREMAI_PROJECT_ID", "123"),
            ("PREMAI_REPOSITORY_ID", "not-a-number"),
            ("PGHOST", "db.internal"),
            ("PGPORT", "6543"),
            ("PGUSER", ""),
        ]
        .into_iter()
        .collect();

        let mut config = Config::default();
        config.apply_env(|k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.prem.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.prem.project_id, Some(123));
        assert_eq!(config.repository.id, None);
        assert_eq!(config.database.host, "db.internal");
        assert_eq!(config.database.port, 6543);
        assert_eq!(config.database.username, "postgres");
    }

    #[test]
    fn test_redacted_masks_secrets() {
        let mut config = Config::default();
        config.prem.api_key = Some("sk-1234567890".into());
        config.database.password = Some("pw".into());

        let redacted = config.redacted();
        assert_eq!(redacted.prem.api_key.as_deref(), Some("sk-1********"));
        assert_eq!(redacted.database.password.as_deref(), Some("********"));
        assert_eq!(config.prem.api_key.as_deref(), Some("sk-1234567890"));
    }

    #[test]
    fn test_config_paths() {
        assert!(Config::global_path().is_some());
        assert!(
            Config::project_path().is_some_and(|p| p.ends_with(".premchat/config.toml"))
        );
    }
}
