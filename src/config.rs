//! TOML configuration.
//!
//! Every section and key is optional. When no `--config` flag is given and
//! `./config/paperchat.toml` does not exist, built-in defaults are used.
//!
//! ```toml
//! [index]
//! persist_directory = "./paper_index"
//!
//! [chunking]
//! chunk_size = 1000
//! chunk_overlap = 200
//!
//! [retrieval]
//! k = 4
//!
//! [embedding]
//! provider = "local"          # local | ollama | openai | hash
//! model = "all-minilm-l6-v2"
//!
//! [answer]
//! provider = "ollama"
//! model = "llama3"
//! available_models = ["llama3", "mistral", "llama2", "codellama"]
//! url = "http://localhost:11434"
//! temperature = 0.1
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use paperchat_core::chunk::{DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
use paperchat_core::index::DEFAULT_BATCH_SIZE;
use paperchat_core::search::DEFAULT_K;

pub const DEFAULT_CONFIG_PATH: &str = "./config/paperchat.toml";
pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub answer: AnswerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_persist_directory")]
    pub persist_directory: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            persist_directory: default_persist_directory(),
        }
    }
}

fn default_persist_directory() -> PathBuf {
    PathBuf::from("./paper_index")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

fn default_chunk_size() -> usize {
    DEFAULT_CHUNK_SIZE
}
fn default_chunk_overlap() -> usize {
    DEFAULT_CHUNK_OVERLAP
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_k")]
    pub k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { k: DEFAULT_K }
    }
}

fn default_k() -> usize {
    DEFAULT_K
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: None,
            dims: None,
            url: None,
            batch_size: DEFAULT_BATCH_SIZE,
            max_retries: 5,
            timeout_secs: 30,
        }
    }
}

fn default_embedding_provider() -> String {
    "local".to_string()
}
fn default_batch_size() -> usize {
    DEFAULT_BATCH_SIZE
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct AnswerConfig {
    #[serde(default = "default_answer_provider")]
    pub provider: String,
    #[serde(default = "default_answer_model")]
    pub model: String,
    #[serde(default = "default_available_models")]
    pub available_models: Vec<String>,
    #[serde(default = "default_answer_url")]
    pub url: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_answer_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_answer_max_retries")]
    pub max_retries: u32,
}

impl Default for AnswerConfig {
    fn default() -> Self {
        Self {
            provider: default_answer_provider(),
            model: default_answer_model(),
            available_models: default_available_models(),
            url: default_answer_url(),
            temperature: default_temperature(),
            timeout_secs: default_answer_timeout_secs(),
            max_retries: default_answer_max_retries(),
        }
    }
}

fn default_answer_provider() -> String {
    "ollama".to_string()
}
fn default_answer_model() -> String {
    "llama3".to_string()
}
fn default_available_models() -> Vec<String> {
    ["llama3", "mistral", "llama2", "codellama"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}
fn default_answer_url() -> String {
    DEFAULT_OLLAMA_URL.to_string()
}
fn default_temperature() -> f64 {
    0.1
}
fn default_answer_timeout_secs() -> u64 {
    300
}
fn default_answer_max_retries() -> u32 {
    2
}

/// Load configuration for the CLI.
///
/// An explicit path must exist. Without one, the default path is used when
/// present and built-in defaults otherwise.
pub fn resolve_config(explicit: Option<&Path>) -> Result<Config> {
    match explicit {
        Some(path) => load_config(path),
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                load_config(default_path)
            } else {
                let config = Config::default();
                validate(&config)?;
                Ok(config)
            }
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate chunking
    if config.chunking.chunk_size == 0 {
        bail!("chunking.chunk_size must be > 0");
    }
    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        bail!(
            "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
            config.chunking.chunk_overlap,
            config.chunking.chunk_size
        );
    }

    // Validate retrieval
    if config.retrieval.k < 1 {
        bail!("retrieval.k must be >= 1");
    }

    // Validate embedding
    let embedding = &config.embedding;
    match embedding.provider.as_str() {
        "local" | "hash" => {}
        "ollama" | "openai" => {
            if embedding.dims.is_none() {
                bail!(
                    "embedding.dims must be set when provider is '{}'",
                    embedding.provider
                );
            }
            if embedding.model.is_none() {
                bail!(
                    "embedding.model must be specified when provider is '{}'",
                    embedding.provider
                );
            }
        }
        other => bail!(
            "Unknown embedding provider: '{}'. Must be local, ollama, openai, or hash.",
            other
        ),
    }
    if embedding.dims == Some(0) {
        bail!("embedding.dims must be > 0");
    }
    if embedding.batch_size == 0 {
        bail!("embedding.batch_size must be > 0");
    }

    // Validate answer model
    let answer = &config.answer;
    if answer.provider != "ollama" {
        bail!(
            "Unknown answer provider: '{}'. Must be ollama.",
            answer.provider
        );
    }
    if !answer.available_models.contains(&answer.model) {
        bail!(
            "answer.model '{}' is not one of answer.available_models ({})",
            answer.model,
            answer.available_models.join(", ")
        );
    }
    if !(0.0..=2.0).contains(&answer.temperature) {
        bail!("answer.temperature must be in [0.0, 2.0]");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(body: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.index.persist_directory, PathBuf::from("./paper_index"));
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.retrieval.k, 4);
        assert_eq!(config.embedding.provider, "local");
        assert_eq!(config.answer.model, "llama3");
        assert_eq!(config.answer.available_models.len(), 4);
        assert!((config.answer.temperature - 0.1).abs() < f64::EPSILON);
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let file = write_config(
            r#"
            [chunking]
            chunk_size = 400

            [embedding]
            provider = "hash"
            dims = 128
            "#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.chunking.chunk_size, 400);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.embedding.dims, Some(128));
        assert_eq!(config.embedding.batch_size, 64);
    }

    #[test]
    fn test_rejects_overlap_not_smaller_than_size() {
        let file = write_config("[chunking]\nchunk_size = 100\nchunk_overlap = 100\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("chunk_overlap"));
    }

    #[test]
    fn test_rejects_zero_k() {
        let file = write_config("[retrieval]\nk = 0\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_remote_providers_need_model_and_dims() {
        let file = write_config("[embedding]\nprovider = \"ollama\"\nmodel = \"nomic-embed-text\"\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("embedding.dims"));

        let file = write_config("[embedding]\nprovider = \"openai\"\ndims = 1536\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("embedding.model"));
    }

    #[test]
    fn test_rejects_unknown_providers() {
        let file = write_config("[embedding]\nprovider = \"magic\"\n");
        assert!(load_config(file.path()).is_err());
        let file = write_config("[answer]\nprovider = \"openai\"\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_answer_model_must_be_available() {
        let file = write_config("[answer]\nmodel = \"gpt-4\"\n");
        let err = load_config(file.path()).unwrap_err();
        assert!(err.to_string().contains("available_models"));

        let file = write_config(
            "[answer]\nmodel = \"phi3\"\navailable_models = [\"phi3\", \"llama3\"]\n",
        );
        assert_eq!(load_config(file.path()).unwrap().answer.model, "phi3");
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let file = write_config("[answer]\ntemperature = 3.5\n");
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        assert!(resolve_config(Some(&missing)).is_err());
    }
}
