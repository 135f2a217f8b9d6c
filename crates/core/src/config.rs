//! Configuration management for Docroute.
//!
//! Configuration is layered, later layers winning:
//! 1. Built-in defaults
//! 2. YAML file (`<workspace>/.docroute/config.yaml` or `DOCROUTE_CONFIG`)
//! 3. Environment variables
//! 4. Command-line flags (`AppConfig::with_overrides`)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{AppError, AppResult};
use crate::logging::LogFormat;

/// Embedding providers that can back a collection.
pub const EMBEDDING_PROVIDERS: [&str; 3] = ["gemini", "ollama", "trigram"];

/// Chat providers that can back the summarizer.
pub const CHAT_PROVIDERS: [&str; 2] = ["gemini", "ollama"];

/// Main application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path to the workspace root (contains .docroute/)
    pub workspace: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Explicit collection directory; defaults to `<workspace>/data/collections`
    pub data_dir: Option<PathBuf>,

    /// Default credential for embedding and chat backends
    pub api_key: Option<String>,

    /// Embedding backend shared by every collection
    pub embedding: EmbeddingConfig,

    /// Chat backend used for conversation summaries
    pub chat: ChatConfig,

    /// Routing and retrieval settings
    pub retrieval: RetrievalConfig,

    /// Index build settings
    pub index: IndexConfig,

    /// Whether conversation summaries are produced
    pub memory_summary: bool,

    /// Log level override
    pub log_level: Option<String>,

    /// Log output format
    pub log_format: LogFormat,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,
}

/// Embedding backend settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Provider name: "gemini", "ollama", "trigram"
    pub provider: String,

    /// Model identifier (provider-specific)
    pub model: String,

    /// Embedding vector dimensions
    pub dimensions: usize,

    /// Custom API endpoint
    pub endpoint: Option<String>,

    /// Maximum texts per embedding request
    pub batch_size: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "models/text-embedding-004".to_string(),
            dimensions: 768,
            endpoint: None,
            batch_size: 100,
        }
    }
}

/// Chat backend settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChatConfig {
    /// Provider name: "gemini", "ollama"
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Custom API endpoint
    pub endpoint: Option<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            provider: "gemini".to_string(),
            model: "gemini-1.5-flash".to_string(),
            endpoint: None,
        }
    }
}

/// Routing and retrieval settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Number of documents returned per request
    pub top_k: usize,

    /// Collection holding the regulatory corpus
    pub regulatory_collection: String,

    /// Collection holding the organization/services corpus
    pub organization_collection: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 6,
            regulatory_collection: "nec".to_string(),
            organization_collection: "wattmonk".to_string(),
        }
    }
}

/// Index build settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexConfig {
    /// Maximum characters per chunk
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    pub chunk_overlap: usize,

    /// Keep only the first N chunks of a collection
    pub max_chunks: Option<usize>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1200,
            chunk_overlap: 200,
            max_chunks: None,
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ConfigFile {
    workspace: Option<WorkspaceSection>,
    data_dir: Option<PathBuf>,
    embedding: Option<EmbeddingConfig>,
    chat: Option<ChatConfig>,
    retrieval: Option<RetrievalConfig>,
    index: Option<IndexConfig>,
    memory: Option<MemorySection>,
    logging: Option<LoggingSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct WorkspaceSection {
    path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct MemorySection {
    enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingSection {
    level: Option<String>,
    color: Option<bool>,
    format: Option<String>,
}

/// Command-line overrides applied on top of the loaded configuration.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub workspace: Option<PathBuf>,
    pub config_file: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
    pub api_key: Option<String>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
    pub verbose: bool,
    pub no_color: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            workspace: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            data_dir: None,
            api_key: None,
            embedding: EmbeddingConfig::default(),
            chat: ChatConfig::default(),
            retrieval: RetrievalConfig::default(),
            index: IndexConfig::default(),
            memory_summary: false,
            log_level: None,
            log_format: LogFormat::Pretty,
            verbose: false,
            no_color: false,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment and the workspace config file.
    ///
    /// Environment variables:
    /// - `DOCROUTE_WORKSPACE`, `DOCROUTE_CONFIG`, `DOCROUTE_DATA_DIR`
    /// - `DOCROUTE_API_KEY` or `GOOGLE_API_KEY`: default backend credential
    /// - `EMBED_PROVIDER`, `EMBED_MODEL`, `CHAT_PROVIDER`, `CHAT_MODEL`
    /// - `CHUNK_SIZE`, `CHUNK_OVERLAP`, `MAX_CHUNKS`
    /// - `ENABLE_MEMORY_SUMMARY`: `1` enables conversation summaries
    /// - `RUST_LOG`, `NO_COLOR`, `DOCROUTE_LOG_FORMAT`
    ///
    /// # Example
    /// ```no_run
    /// use docroute_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Collections: {:?}", config.data_dir());
    /// ```
    pub fn load() -> AppResult<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Load configuration using a custom environment lookup.
    pub fn load_with<F>(env: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(workspace) = env("DOCROUTE_WORKSPACE") {
            config.workspace = PathBuf::from(workspace);
        }

        if let Some(config_file) = env("DOCROUTE_CONFIG") {
            config.config_file = Some(PathBuf::from(config_file));
        }

        if !config.workspace.exists() {
            return Err(AppError::Config(format!(
                "Workspace directory does not exist: {:?}",
                config.workspace
            )));
        }

        let config_path = config.config_path();
        if config_path.exists() {
            config.merge_yaml(&config_path)?;
        }

        // Environment variables override YAML config
        config.apply_env(&env)?;

        Ok(config)
    }

    /// Path of the YAML file consulted by `load`.
    pub fn config_path(&self) -> PathBuf {
        self.config_file
            .clone()
            .unwrap_or_else(|| self.docroute_dir().join("config.yaml"))
    }

    /// Merge a YAML configuration file into this config.
    fn merge_yaml(&mut self, path: &Path) -> AppResult<()> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        if let Some(path) = file.workspace.and_then(|ws| ws.path) {
            self.workspace = PathBuf::from(path);
        }

        if let Some(data_dir) = file.data_dir {
            self.data_dir = Some(data_dir);
        }

        if let Some(embedding) = file.embedding {
            self.embedding = embedding;
        }

        if let Some(chat) = file.chat {
            self.chat = chat;
        }

        if let Some(retrieval) = file.retrieval {
            self.retrieval = retrieval;
        }

        if let Some(index) = file.index {
            self.index = index;
        }

        if let Some(enabled) = file.memory.and_then(|m| m.enabled) {
            self.memory_summary = enabled;
        }

        if let Some(logging) = file.logging {
            if let Some(level) = logging.level {
                self.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                self.no_color = !color;
            }
            if let Some(format) = logging.format {
                self.log_format = format.parse()?;
            }
        }

        tracing::debug!("Merged configuration from {:?}", path);
        Ok(())
    }

    /// Apply environment variables on top of the current values.
    fn apply_env<F>(&mut self, env: &F) -> AppResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        if let Some(dir) = non_empty("DOCROUTE_DATA_DIR") {
            self.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(key) = non_empty("DOCROUTE_API_KEY").or_else(|| non_empty("GOOGLE_API_KEY")) {
            self.api_key = Some(key);
        }

        if let Some(provider) = non_empty("EMBED_PROVIDER") {
            self.embedding.provider = provider;
        }

        if let Some(model) = non_empty("EMBED_MODEL") {
            self.embedding.model = model;
        }

        if let Some(provider) = non_empty("CHAT_PROVIDER") {
            self.chat.provider = provider;
        }

        if let Some(model) = non_empty("CHAT_MODEL") {
            self.chat.model = model;
        }

        if let Some(size) = non_empty("CHUNK_SIZE") {
            self.index.chunk_size = parse_usize("CHUNK_SIZE", &size)?;
        }

        if let Some(overlap) = non_empty("CHUNK_OVERLAP") {
            self.index.chunk_overlap = parse_usize("CHUNK_OVERLAP", &overlap)?;
        }

        // Unparsable or non-positive caps are ignored.
        if let Some(max) = non_empty("MAX_CHUNKS") {
            match max.trim().parse::<i64>() {
                Ok(n) if n > 0 => self.index.max_chunks = Some(n as usize),
                _ => tracing::debug!("Ignoring MAX_CHUNKS value {:?}", max),
            }
        }

        if let Some(flag) = env("ENABLE_MEMORY_SUMMARY") {
            self.memory_summary = flag == "1";
        }

        if let Some(level) = non_empty("RUST_LOG") {
            self.log_level = Some(level);
        }

        if let Some(format) = non_empty("DOCROUTE_LOG_FORMAT") {
            self.log_format = format.parse()?;
        }

        if env("NO_COLOR").is_some() {
            self.no_color = true;
        }

        Ok(())
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Flags take precedence over environment variables and the config file.
    pub fn with_overrides(mut self, overrides: ConfigOverrides) -> Self {
        if let Some(workspace) = overrides.workspace {
            self.workspace = workspace;
        }

        if let Some(config_file) = overrides.config_file {
            self.config_file = Some(config_file);
        }

        if let Some(data_dir) = overrides.data_dir {
            self.data_dir = Some(data_dir);
        }

        if let Some(api_key) = overrides.api_key.filter(|k| !k.is_empty()) {
            self.api_key = Some(api_key);
        }

        if let Some(log_level) = overrides.log_level {
            self.log_level = Some(log_level);
        }

        if let Some(format) = overrides.log_format {
            self.log_format = format;
        }

        if overrides.verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if overrides.no_color {
            self.no_color = true;
        }

        self
    }

    /// Get the path to the .docroute directory.
    pub fn docroute_dir(&self) -> PathBuf {
        self.workspace.join(".docroute")
    }

    /// Directory holding one sub-directory per collection.
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| self.workspace.join("data").join("collections"))
    }

    /// Credential for one request: a non-empty override wins over the configured default.
    pub fn resolve_api_key(&self, request_override: Option<&str>) -> Option<String> {
        request_override
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .or_else(|| self.api_key.clone())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> AppResult<()> {
        if !EMBEDDING_PROVIDERS.contains(&self.embedding.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown embedding provider: {}. Supported: {}",
                self.embedding.provider,
                EMBEDDING_PROVIDERS.join(", ")
            )));
        }

        if !CHAT_PROVIDERS.contains(&self.chat.provider.as_str()) {
            return Err(AppError::Config(format!(
                "Unknown chat provider: {}. Supported: {}",
                self.chat.provider,
                CHAT_PROVIDERS.join(", ")
            )));
        }

        if self.embedding.dimensions == 0 {
            return Err(AppError::Config(
                "Embedding dimensions must be positive".to_string(),
            ));
        }

        if self.retrieval.top_k == 0 {
            return Err(AppError::Config("top_k must be positive".to_string()));
        }

        if self.index.chunk_size == 0 || self.index.chunk_overlap >= self.index.chunk_size {
            return Err(AppError::Config(format!(
                "chunk_overlap ({}) must be smaller than a positive chunk_size ({})",
                self.index.chunk_overlap, self.index.chunk_size
            )));
        }

        Ok(())
    }
}

fn parse_usize(name: &str, value: &str) -> AppResult<usize> {
    value
        .trim()
        .parse()
        .map_err(|e| AppError::Config(format!("Invalid {} value {:?}: {}", name, value, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.embedding.provider, "gemini");
        assert_eq!(config.embedding.model, "models/text-embedding-004");
        assert_eq!(config.chat.model, "gemini-1.5-flash");
        assert_eq!(config.retrieval.top_k, 6);
        assert_eq!(config.index.chunk_size, 1200);
        assert_eq!(config.index.chunk_overlap, 200);
        assert!(!config.memory_summary);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_layer() {
        let temp = TempDir::new().unwrap();
        let workspace = temp.path().to_string_lossy().to_string();
        let config = AppConfig::load_with(env_of(&[
            ("DOCROUTE_WORKSPACE", &workspace),
            ("GOOGLE_API_KEY", "key-123"),
            ("CHAT_MODEL", "gemini-1.5-pro"),
            ("CHUNK_SIZE", "800"),
            ("MAX_CHUNKS", "50"),
            ("ENABLE_MEMORY_SUMMARY", "1"),
        ]))
        .unwrap();

        assert_eq!(config.api_key.as_deref(), Some("key-123"));
        assert_eq!(config.chat.model, "gemini-1.5-pro");
        assert_eq!(config.index.chunk_size, 800);
        assert_eq!(config.index.max_chunks, Some(50));
        assert!(config.memory_summary);
        assert_eq!(config.data_dir(), temp.path().join("data").join("collections"));
    }

    #[test]
    fn test_invalid_max_chunks_ignored() {
        let temp = TempDir::new().unwrap();
        let workspace = temp.path().to_string_lossy().to_string();

        for value in ["abc", "0", "-4"] {
            let config = AppConfig::load_with(env_of(&[
                ("DOCROUTE_WORKSPACE", &workspace),
                ("MAX_CHUNKS", value),
            ]))
            .unwrap();
            assert_eq!(config.index.max_chunks, None, "value {:?}", value);
        }
    }

    #[test]
    fn test_memory_summary_requires_exact_flag() {
        let temp = TempDir::new().unwrap();
        let workspace = temp.path().to_string_lossy().to_string();
        let config = AppConfig::load_with(env_of(&[
            ("DOCROUTE_WORKSPACE", &workspace),
            ("ENABLE_MEMORY_SUMMARY", "true"),
        ]))
        .unwrap();
        assert!(!config.memory_summary);
    }

    #[test]
    fn test_invalid_chunk_size_is_error() {
        let temp = TempDir::new().unwrap();
        let workspace = temp.path().to_string_lossy().to_string();
        let result = AppConfig::load_with(env_of(&[
            ("DOCROUTE_WORKSPACE", &workspace),
            ("CHUNK_SIZE", "big"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_yaml_layer_then_env() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".docroute");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(
            dir.join("config.yaml"),
            "embedding:\n  provider: trigram\n  dimensions: 64\nretrieval:\n  top_k: 3\nmemory:\n  enabled: true\n",
        )
        .unwrap();

        let workspace = temp.path().to_string_lossy().to_string();
        let config = AppConfig::load_with(env_of(&[
            ("DOCROUTE_WORKSPACE", &workspace),
            ("ENABLE_MEMORY_SUMMARY", "0"),
        ]))
        .unwrap();

        assert_eq!(config.embedding.provider, "trigram");
        assert_eq!(config.embedding.dimensions, 64);
        // Unspecified fields keep their defaults
        assert_eq!(config.embedding.batch_size, 100);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.retrieval.regulatory_collection, "nec");
        // Environment wins over YAML
        assert!(!config.memory_summary);
    }

    #[test]
    fn test_missing_workspace() {
        let result = AppConfig::load_with(env_of(&[(
            "DOCROUTE_WORKSPACE",
            "/definitely/not/a/real/workspace",
        )]));
        assert!(result.is_err());
    }

    #[test]
    fn test_with_overrides() {
        let config = AppConfig::default().with_overrides(ConfigOverrides {
            api_key: Some("cli-key".to_string()),
            verbose: true,
            ..Default::default()
        });

        assert_eq!(config.api_key.as_deref(), Some("cli-key"));
        assert!(config.verbose);
        assert_eq!(config.log_level, Some("debug".to_string()));
    }

    #[test]
    fn test_resolve_api_key() {
        let mut config = AppConfig::default();
        assert_eq!(config.resolve_api_key(None), None);

        config.api_key = Some("default".to_string());
        assert_eq!(config.resolve_api_key(None).as_deref(), Some("default"));
        assert_eq!(config.resolve_api_key(Some("")).as_deref(), Some("default"));
        assert_eq!(
            config.resolve_api_key(Some("request")).as_deref(),
            Some("request")
        );
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.embedding.provider = "unknown".to_string();
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.index.chunk_overlap = config.index.chunk_size;
        assert!(config.validate().is_err());

        let mut config = AppConfig::default();
        config.retrieval.top_k = 0;
        assert!(config.validate().is_err());
    }
}
