
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use url::Url;

use crate::embeddings::ollama::DEFAULT_EMBEDDING_DIMENSION;

const CONFIG_FILE_NAME: &str = "config.toml";
const DEFAULT_CORPUS_FILE: &str = "gdpr_articles.json";
const DEFAULT_INDEX_FILE: &str = "articles.index";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub providers: ProviderConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub conversation: ConversationConfig,
    #[serde(default)]
    pub data: DataConfig,
    #[serde(skip)]
    pub base_dir: PathBuf,
}

/// Connection settings for the Ollama server that hosts the sentence-embedding model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub protocol: String,
    pub host: String,
    pub port: u16,
    pub model: String,
    pub batch_size: u32,
    pub embedding_dimension: u32,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            protocol: "http".to_string(),
            host: "localhost".to_string(),
            port: 11434,
            model: "all-minilm".to_string(),
            batch_size: 64,
            embedding_dimension: DEFAULT_EMBEDDING_DIMENSION,
        }
    }
}

/// Endpoints and model settings for the hosted text-generation providers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    pub gemini_base_url: String,
    pub gemini_model: String,
    pub claude_base_url: String,
    pub anthropic_version: String,
    pub claude_max_tokens: u32,
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            gemini_base_url: "https://generativelanguage.googleapis.com".to_string(),
            gemini_model: "gemini-1.5-pro".to_string(),
            claude_base_url: "https://api.anthropic.com".to_string(),
            anthropic_version: "2023-06-01".to_string(),
            claude_max_tokens: 1000,
            request_timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Seconds a loaded corpus/index pair stays cached before it is reloaded from disk
    pub cache_ttl_secs: u64,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            cache_ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct ConversationConfig {
    /// Number of most recent turns rendered into the prompt. `None` renders the whole history.
    pub history_window: Option<usize>,
    /// Whether a turn whose answer is a provider error is kept in the history
    pub record_failed_turns: bool,
}

/// Locations of the corpus and index files. Relative paths resolve against the base directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct DataConfig {
    pub corpus_path: Option<PathBuf>,
    pub index_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration directory not found or could not be created")]
    DirectoryError,
    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
    #[error("Invalid port: {0} (must be between 1 and 65535)")]
    InvalidPort(u16),
    #[error("Invalid batch size: {0} (must be between 1 and 1000)")]
    InvalidBatchSize(u32),
    #[error("Invalid model name: {0} (cannot be empty)")]
    InvalidModel(String),
    #[error("Invalid protocol: {0} (must be 'http' or 'https')")]
    InvalidProtocol(String),
    #[error("Invalid embedding dimension: {0} (must be between 8 and 4096)")]
    InvalidEmbeddingDimension(u32),
    #[error("Invalid max tokens: {0} (must be between 1 and 8192)")]
    InvalidMaxTokens(u32),
    #[error("Invalid request timeout: {0} (must be between 1 and 600 seconds)")]
    InvalidRequestTimeout(u64),
    #[error("Invalid anthropic version: {0} (cannot be empty)")]
    InvalidApiVersion(String),
    #[error("Invalid top_k: {0} (must be between 1 and 100)")]
    InvalidTopK(usize),
    #[error("Invalid cache TTL: {0} (must be greater than 0 seconds)")]
    InvalidCacheTtl(u64),
    #[error("Invalid history window: {0} (must be at least 1 turn)")]
    InvalidHistoryWindow(usize),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    TomlParse(#[from] toml::de::Error),
    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

impl Config {
    /// Default application directory, `~/.doc-agent`
    #[inline]
    pub fn config_dir() -> Result<PathBuf, ConfigError> {
        dirs::home_dir()
            .map(|home| home.join(".doc-agent"))
            .or({
                #[cfg(windows)]
                {
                    dirs::data_dir().map(|data| data.join("doc-agent"))
                }
                #[cfg(not(windows))]
                {
                    None
                }
            })
            .ok_or(ConfigError::DirectoryError)
    }

    /// Load the configuration from the default application directory
    #[inline]
    pub fn load_default() -> Result<Self> {
        let dir = Self::config_dir().context("Failed to resolve configuration directory")?;
        Self::load(dir)
    }

    #[inline]
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            return Ok(Self {
                base_dir: config_dir.as_ref().to_path_buf(),
                ..Self::default()
            });
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        let mut config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))?;
        config.base_dir = config_dir.as_ref().to_path_buf();

        config
            .validate()
            .with_context(|| "Configuration validation failed")?;

        Ok(config)
    }

    #[inline]
    pub fn save(&self) -> Result<()> {
        self.validate()
            .context("Configuration validation failed before saving")?;

        let config_dir = self.get_base_dir();

        fs::create_dir_all(config_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                config_dir.display()
            )
        })?;

        let config_path = self.config_file_path();
        let content = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;

        fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    /// Get the base directory for the application
    #[inline]
    pub fn get_base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.embedding.validate()?;
        self.providers.validate()?;
        self.retrieval.validate()?;
        self.conversation.validate()?;
        Ok(())
    }

    #[inline]
    pub fn config_file_path(&self) -> PathBuf {
        self.get_base_dir().join(CONFIG_FILE_NAME)
    }

    /// Path of the JSON corpus file
    #[inline]
    pub fn corpus_path(&self) -> PathBuf {
        self.resolve_data_path(self.data.corpus_path.as_deref(), DEFAULT_CORPUS_FILE)
    }

    /// Path of the persisted vector index
    #[inline]
    pub fn index_path(&self) -> PathBuf {
        self.resolve_data_path(self.data.index_path.as_deref(), DEFAULT_INDEX_FILE)
    }

    #[inline]
    pub fn embedding_url(&self) -> Result<Url, ConfigError> {
        self.embedding.ollama_url()
    }

    #[inline]
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.retrieval.cache_ttl_secs)
    }

    fn resolve_data_path(&self, configured: Option<&Path>, default_file: &str) -> PathBuf {
        match configured {
            Some(path) if path.is_absolute() => path.to_path_buf(),
            Some(path) => self.get_base_dir().join(path),
            None => self.get_base_dir().join("data").join(default_file),
        }
    }
}

impl EmbeddingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.protocol != "http" && self.protocol != "https" {
            return Err(ConfigError::InvalidProtocol(self.protocol.clone()));
        }

        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))?;

        if self.port == 0 {
            return Err(ConfigError::InvalidPort(self.port));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.model.clone()));
        }

        if self.batch_size == 0 || self.batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(self.batch_size));
        }

        if !(8..=4096).contains(&self.embedding_dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(
                self.embedding_dimension,
            ));
        }

        Ok(())
    }

    pub fn ollama_url(&self) -> Result<Url, ConfigError> {
        let url_str = format!("{}://{}:{}", self.protocol, self.host, self.port);
        Url::parse(&url_str).map_err(|_| ConfigError::InvalidUrl(url_str))
    }

    pub fn set_protocol(&mut self, protocol: String) -> Result<(), ConfigError> {
        if protocol != "http" && protocol != "https" {
            return Err(ConfigError::InvalidProtocol(protocol));
        }
        self.protocol = protocol;
        Ok(())
    }

    pub fn set_host(&mut self, host: String) -> Result<(), ConfigError> {
        let temp_config = EmbeddingConfig {
            host: host.clone(),
            ..self.clone()
        };
        temp_config.validate()?;
        self.host = host;
        Ok(())
    }

    pub fn set_port(&mut self, port: u16) -> Result<(), ConfigError> {
        if port == 0 {
            return Err(ConfigError::InvalidPort(port));
        }
        self.port = port;
        Ok(())
    }

    pub fn set_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.model = model;
        Ok(())
    }

    pub fn set_batch_size(&mut self, batch_size: u32) -> Result<(), ConfigError> {
        if batch_size == 0 || batch_size > 1000 {
            return Err(ConfigError::InvalidBatchSize(batch_size));
        }
        self.batch_size = batch_size;
        Ok(())
    }

    pub fn set_embedding_dimension(&mut self, dimension: u32) -> Result<(), ConfigError> {
        if !(8..=4096).contains(&dimension) {
            return Err(ConfigError::InvalidEmbeddingDimension(dimension));
        }
        self.embedding_dimension = dimension;
        Ok(())
    }
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        for raw in [&self.gemini_base_url, &self.claude_base_url] {
            base_url(raw)?;
        }

        if self.gemini_model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(self.gemini_model.clone()));
        }

        if self.anthropic_version.trim().is_empty() {
            return Err(ConfigError::InvalidApiVersion(
                self.anthropic_version.clone(),
            ));
        }

        if !(1..=8192).contains(&self.claude_max_tokens) {
            return Err(ConfigError::InvalidMaxTokens(self.claude_max_tokens));
        }

        if !(1..=600).contains(&self.request_timeout_secs) {
            return Err(ConfigError::InvalidRequestTimeout(
                self.request_timeout_secs,
            ));
        }

        Ok(())
    }

    /// Gemini base URL with a trailing `/`, so endpoint paths join below any prefix
    pub fn gemini_url(&self) -> Result<Url, ConfigError> {
        base_url(&self.gemini_base_url)
    }

    /// Claude base URL with a trailing `/`, so endpoint paths join below any prefix
    pub fn claude_url(&self) -> Result<Url, ConfigError> {
        base_url(&self.claude_base_url)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn set_gemini_model(&mut self, model: String) -> Result<(), ConfigError> {
        if model.trim().is_empty() {
            return Err(ConfigError::InvalidModel(model));
        }
        self.gemini_model = model;
        Ok(())
    }

    pub fn set_claude_max_tokens(&mut self, max_tokens: u32) -> Result<(), ConfigError> {
        if !(1..=8192).contains(&max_tokens) {
            return Err(ConfigError::InvalidMaxTokens(max_tokens));
        }
        self.claude_max_tokens = max_tokens;
        Ok(())
    }
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.top_k) {
            return Err(ConfigError::InvalidTopK(self.top_k));
        }

        if self.cache_ttl_secs == 0 {
            return Err(ConfigError::InvalidCacheTtl(self.cache_ttl_secs));
        }

        Ok(())
    }

    pub fn set_top_k(&mut self, top_k: usize) -> Result<(), ConfigError> {
        if !(1..=100).contains(&top_k) {
            return Err(ConfigError::InvalidTopK(top_k));
        }
        self.top_k = top_k;
        Ok(())
    }
}

impl ConversationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.history_window == Some(0) {
            return Err(ConfigError::InvalidHistoryWindow(0));
        }
        Ok(())
    }

    pub fn set_history_window(&mut self, window: Option<usize>) -> Result<(), ConfigError> {
        if window == Some(0) {
            return Err(ConfigError::InvalidHistoryWindow(0));
        }
        self.history_window = window;
        Ok(())
    }
}

fn base_url(raw: &str) -> Result<Url, ConfigError> {
    let raw = raw.trim();
    let with_slash = if raw.ends_with('/') {
        raw.to_string()
    } else {
        format!("{raw}/")
    };
    let url = Url::parse(&with_slash).map_err(|_| ConfigError::InvalidUrl(raw.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidUrl(raw.to_string()));
    }
    Ok(url)
}
