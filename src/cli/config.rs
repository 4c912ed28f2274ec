//! Configuration management for LearnOS Buddy
//!
//! Provides TOML-based configuration with defaults, environment overrides
//! and startup validation.
//! Location: ~/.learnos-buddy/config.toml

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::errors::{BuddyError, Result};

/// Directory under $HOME holding the config file and line history
pub const APP_DIR: &str = ".learnos-buddy";

/// Largest top-k accepted from configuration
pub const MAX_TOP_K: usize = 100;

/// Complete configuration for LearnOS Buddy
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Which embedding service turns queries into vectors
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    #[default]
    Gemini,
    OpenAi,
}

impl FromStr for EmbeddingBackend {
    type Err = BuddyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(EmbeddingBackend::Gemini),
            "openai" => Ok(EmbeddingBackend::OpenAi),
            other => Err(BuddyError::Config(format!(
                "Unknown embedding provider: {}",
                other
            ))),
        }
    }
}

/// Which vector index answers nearest-neighbour queries
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum IndexBackend {
    #[default]
    Pinecone,
    Qdrant,
}

impl FromStr for IndexBackend {
    type Err = BuddyError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "pinecone" => Ok(IndexBackend::Pinecone),
            "qdrant" => Ok(IndexBackend::Qdrant),
            other => Err(BuddyError::Config(format!("Unknown index provider: {}", other))),
        }
    }
}

/// Embedding provider connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingBackend,
    pub api_key: String,
    /// Overrides the provider's public endpoint
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Provider default when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Expected vector length; must match the index
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<usize>,
    pub timeout_secs: u64,
}

/// Vector index connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexConfig {
    pub provider: IndexBackend,
    pub api_key: String,
    /// Pinecone index or Qdrant collection
    pub index_name: String,
    /// Pinecone data-plane host or Qdrant URL
    #[serde(skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    pub top_k: usize,
    pub timeout_secs: u64,
}

/// Chat completion provider connection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CompletionConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    /// Longest silence tolerated while connecting or between streamed
    /// chunks; the answer as a whole may take longer
    pub timeout_secs: u64,
}

/// Listen address of the HTTP shell
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::Gemini,
            api_key: String::new(),
            base_url: None,
            model: None,
            dimensions: None,
            timeout_secs: 30,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            provider: IndexBackend::Pinecone,
            api_key: String::new(),
            index_name: String::new(),
            host: None,
            namespace: None,
            top_k: 3,
            timeout_secs: 30,
        }
    }
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            timeout_secs: 120,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7860,
        }
    }
}

impl EmbeddingConfig {
    /// Configured model or the provider's default
    pub fn model(&self) -> &str {
        match (&self.model, self.provider) {
            (Some(model), _) => model,
            (None, EmbeddingBackend::Gemini) => "text-embedding-004",
            (None, EmbeddingBackend::OpenAi) => "text-embedding-3-small",
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(&config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            BuddyError::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;

        toml::from_str(&contents)
            .map_err(|e| BuddyError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from the standard location, or built-in defaults if absent
    pub fn load_default() -> Result<Self> {
        if let Some(config_path) = Self::default_path() {
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// ~/.learnos-buddy/config.toml
    pub fn default_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(APP_DIR).join("config.toml"))
    }

    /// ~/.learnos-buddy/history
    pub fn history_path() -> Option<PathBuf> {
        dirs::home_dir().map(|home| home.join(APP_DIR).join("history"))
    }

    /// Overlay values found through `lookup`, usually `std::env::var`
    ///
    /// Empty values are ignored so a blank line in `.env` does not erase
    /// a key set in the config file.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OPENAI_API_KEY") {
            self.completion.api_key = v;
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.completion.base_url = v;
        }
        if let Some(v) = get("OPENAI_MODEL") {
            self.completion.model = v;
        }

        if let Some(v) = get("EMBEDDING_PROVIDER") {
            self.embedding.provider = v.parse()?;
        }
        if let Some(v) = get("EMBEDDING_MODEL") {
            self.embedding.model = Some(v);
        }
        match self.embedding.provider {
            EmbeddingBackend::Gemini => {
                if let Some(v) = get("GEMINI_API_KEY").or_else(|| get("GOOGLE_API_KEY")) {
                    self.embedding.api_key = v;
                }
            }
            EmbeddingBackend::OpenAi => {
                if let Some(v) = get("OPENAI_API_KEY") {
                    self.embedding.api_key = v;
                }
                if let Some(v) = get("OPENAI_BASE_URL") {
                    self.embedding.base_url = Some(v);
                }
            }
        }

        if let Some(v) = get("INDEX_PROVIDER") {
            self.index.provider = v.parse()?;
        }
        match self.index.provider {
            IndexBackend::Pinecone => {
                if let Some(v) = get("PINECONE_API_KEY") {
                    self.index.api_key = v;
                }
                if let Some(v) = get("PINECONE_INDEX") {
                    self.index.index_name = v;
                }
                if let Some(v) = get("PINECONE_HOST") {
                    self.index.host = Some(v);
                }
            }
            IndexBackend::Qdrant => {
                if let Some(v) = get("QDRANT_API_KEY") {
                    self.index.api_key = v;
                }
                if let Some(v) = get("QDRANT_URL") {
                    self.index.host = Some(v);
                }
                if let Some(v) = get("QDRANT_COLLECTION") {
                    self.index.index_name = v;
                }
            }
        }
        if let Some(v) = get("RAG_TOP_K") {
            self.index.top_k = v
                .trim()
                .parse()
                .map_err(|_| BuddyError::Config(format!("RAG_TOP_K is not a number: {}", v)))?;
        }

        // Bare HOST is often set by shells and containers for other purposes
        if let Some(v) = get("LEARNOS_HOST") {
            self.server.host = v;
        }
        if let Some(v) = get("PORT") {
            self.server.port = v
                .trim()
                .parse()
                .map_err(|_| BuddyError::Config(format!("PORT is not a valid port: {}", v)))?;
        }

        Ok(())
    }

    /// Validate configuration values
    ///
    /// Missing credentials are fatal here, never per turn.
    pub fn validate(&self) -> Result<()> {
        if self.completion.api_key.trim().is_empty() {
            return Err(BuddyError::Config(
                "completion api_key is missing (set OPENAI_API_KEY)".to_string(),
            ));
        }

        if self.completion.model.trim().is_empty() {
            return Err(BuddyError::Config("completion model must not be empty".to_string()));
        }

        if self.completion.base_url.trim().is_empty() {
            return Err(BuddyError::Config(
                "completion base_url must not be empty".to_string(),
            ));
        }

        if self.embedding.api_key.trim().is_empty() {
            let hint = match self.embedding.provider {
                EmbeddingBackend::Gemini => "GEMINI_API_KEY",
                EmbeddingBackend::OpenAi => "OPENAI_API_KEY",
            };
            return Err(BuddyError::Config(format!(
                "embedding api_key is missing (set {})",
                hint
            )));
        }

        if self.embedding.dimensions == Some(0) {
            return Err(BuddyError::Config(
                "embedding dimensions must be greater than 0".to_string(),
            ));
        }

        match self.index.provider {
            IndexBackend::Pinecone => {
                if self.index.api_key.trim().is_empty() {
                    return Err(BuddyError::Config(
                        "index api_key is missing (set PINECONE_API_KEY)".to_string(),
                    ));
                }
                if self.index.index_name.trim().is_empty() {
                    return Err(BuddyError::Config(
                        "index_name is missing (set PINECONE_INDEX)".to_string(),
                    ));
                }
            }
            IndexBackend::Qdrant => {
                if self.index.index_name.trim().is_empty() {
                    return Err(BuddyError::Config(
                        "index_name is missing (set QDRANT_COLLECTION)".to_string(),
                    ));
                }
            }
        }

        if self.index.top_k > MAX_TOP_K {
            return Err(BuddyError::Config(format!(
                "top_k must be at most {}, got {}",
                MAX_TOP_K, self.index.top_k
            )));
        }

        if self.server.port == 0 {
            return Err(BuddyError::Config("server port must not be 0".to_string()));
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| BuddyError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                BuddyError::Config(format!("Failed to create config dir: {}", e))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| BuddyError::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Copy with every secret masked, for display
    pub fn redacted(&self) -> Self {
        let mut copy = self.clone();
        copy.embedding.api_key = mask_secret(&self.embedding.api_key);
        copy.index.api_key = mask_secret(&self.index.api_key);
        copy.completion.api_key = mask_secret(&self.completion.api_key);
        copy
    }

    /// host:port the HTTP shell binds to; IPv6 hosts are bracketed
    pub fn listen_addr(&self) -> String {
        let host = self.server.host.trim();
        if host.contains(':') && !host.starts_with('[') {
            format!("[{}]:{}", host, self.server.port)
        } else {
            format!("{}:{}", host, self.server.port)
        }
    }
}

/// Keep the first four characters of a secret
pub fn mask_secret(secret: &str) -> String {
    if secret.is_empty() {
        return "<unset>".to_string();
    }
    let prefix: String = secret.chars().take(4).collect();
    format!("{}****", prefix)
}
