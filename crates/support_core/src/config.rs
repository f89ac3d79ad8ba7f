//! SupportMax configuration
//!
//! Explicit configuration struct built once at startup and passed by
//! reference into each component constructor. Components never read
//! environment state themselves.
//!
//! Config file: TOML, path supplied by the caller (e.g. supportctl --config).

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Knowledge store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Path to the FAQ entries file (JSON array)
    #[serde(default = "default_knowledge_path")]
    pub path: PathBuf,
}

fn default_knowledge_path() -> PathBuf {
    PathBuf::from("data/faqs.json")
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            path: default_knowledge_path(),
        }
    }
}

/// Ticket log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketConfig {
    /// Path to the persisted ticket log (JSON array)
    #[serde(default = "default_tickets_path")]
    pub path: PathBuf,
}

fn default_tickets_path() -> PathBuf {
    PathBuf::from("data/tickets.json")
}

impl Default for TicketConfig {
    fn default() -> Self {
        Self {
            path: default_tickets_path(),
        }
    }
}

/// External reasoner (LLM backend) configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasonerConfig {
    /// Whether escalation to the external reasoner is enabled at all
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// OpenAI-compatible endpoint base URL
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Model name sent with each completion request
    #[serde(default = "default_model")]
    pub model: String,

    /// Optional bearer token for hosted backends
    #[serde(default)]
    pub api_key: Option<String>,

    /// Hard timeout per request; failures degrade to the fallback answer
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_true() -> bool {
    true
}

fn default_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    "gpt-4-turbo-preview".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

impl Default for ReasonerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: default_endpoint(),
            model: default_model(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Operational limits for query handling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitsConfig {
    /// Maximum accepted query length in characters
    #[serde(default = "default_max_query_len")]
    pub max_query_len: usize,

    /// Maximum FAQ results returned per search
    #[serde(default = "default_max_results")]
    pub max_results: usize,

    /// Minimum relevance score required to answer from the knowledge base
    #[serde(default = "default_min_score")]
    pub min_score: u32,
}

fn default_max_query_len() -> usize {
    1000
}

fn default_max_results() -> usize {
    3
}

fn default_min_score() -> u32 {
    3
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_query_len: default_max_query_len(),
            max_results: default_max_results(),
            min_score: default_min_score(),
        }
    }
}

/// Main SupportMax configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SupportConfig {
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    #[serde(default)]
    pub tickets: TicketConfig,

    #[serde(default)]
    pub reasoner: ReasonerConfig,

    #[serde(default)]
    pub limits: LimitsConfig,
}

impl SupportConfig {
    /// Load configuration from a TOML file.
    ///
    /// A missing file yields the defaults; a file that exists but does not
    /// parse is an error (a half-read config is worse than none).
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config: SupportConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(config)
    }

    /// Save configuration to a TOML file (creating parent directories).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        fs::write(path, toml_string)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(())
    }
}
