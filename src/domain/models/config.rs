use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for the triage pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Ticketing system connection
    #[serde(default)]
    pub ticketing: TicketingConfig,

    /// Policy system connection
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Similarity store connection and retrieval width
    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    /// Text-generation endpoint
    #[serde(default)]
    pub llm: LlmConfig,

    /// Embedding endpoint
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Resolution loop and dispatcher behavior
    #[serde(default)]
    pub resolution: ResolutionConfig,

    /// Run metrics thresholds
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Report and audit output locations
    #[serde(default)]
    pub output: OutputConfig,

    /// Directory with prompt template overrides (`<name>.txt`)
    #[serde(default)]
    pub prompts_dir: Option<PathBuf>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Ticketing system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct TicketingConfig {
    #[serde(default = "default_ticketing_url")]
    pub base_url: String,

    /// Mailbox whose open incidents are triaged
    #[serde(default = "default_mailbox")]
    pub mailbox: String,

    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_ticketing_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_mailbox() -> String {
    "GR_SAL_COMP_AUTORIZACIONES".to_string()
}

const fn default_http_timeout_secs() -> u64 {
    30
}

impl Default for TicketingConfig {
    fn default() -> Self {
        Self {
            base_url: default_ticketing_url(),
            mailbox: default_mailbox(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

/// Policy system configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PolicyConfig {
    #[serde(default = "default_policy_url")]
    pub base_url: String,

    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_policy_url() -> String {
    "http://localhost:3002".to_string()
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            base_url: default_policy_url(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

/// Similarity store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct VectorStoreConfig {
    #[serde(default = "default_vector_url")]
    pub url: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    /// Nearest prior cases fetched per phrasing
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_vector_url() -> String {
    "http://localhost:6333".to_string()
}

fn default_collection() -> String {
    "incidencias".to_string()
}

const fn default_top_k() -> usize {
    2
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            url: default_vector_url(),
            collection: default_collection(),
            top_k: default_top_k(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

/// Text-generation configuration (OpenAI-compatible chat endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LlmConfig {
    #[serde(default = "default_llm_url")]
    pub base_url: String,

    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Falls back to `OPENAI_API_KEY`; local endpoints need none
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default)]
    pub temperature: f32,

    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_llm_url() -> String {
    "http://localhost:11434/v1".to_string()
}

fn default_llm_model() -> String {
    "gemma3".to_string()
}

const fn default_llm_timeout_secs() -> u64 {
    120
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_url(),
            model: default_llm_model(),
            api_key: None,
            temperature: 0.0,
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

/// Embedding configuration (OpenAI-compatible embeddings endpoint)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbeddingConfig {
    #[serde(default = "default_llm_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,

    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    #[serde(default = "default_http_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_embedding_model() -> String {
    "all-minilm".to_string()
}

const fn default_embedding_dimension() -> usize {
    384
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_url(),
            model: default_embedding_model(),
            api_key: None,
            dimension: default_embedding_dimension(),
            timeout_secs: default_http_timeout_secs(),
        }
    }
}

/// How the resolution loop filters candidates after a rejection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectedFilter {
    /// Compare candidates against rejected drafts as-is. The two shapes
    /// never match, so the pool is effectively unfiltered.
    #[default]
    Preserve,
    /// Drop candidates whose solution produced a rejected draft.
    ByOrigin,
}

/// Resolution loop and dispatcher configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ResolutionConfig {
    /// Retries after the first attempt (total attempts = max_retries + 1)
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Tag prefixed to every solution text written to the ticketing system
    #[serde(default = "default_label")]
    pub label: String,

    /// Maximum nested policy re-dispatches before failing over to manual
    #[serde(default = "default_max_chain_depth")]
    pub max_chain_depth: u32,

    #[serde(default)]
    pub rejected_filter: RejectedFilter,
}

const fn default_max_retries() -> u32 {
    2
}

fn default_label() -> String {
    "[SPAI] ".to_string()
}

const fn default_max_chain_depth() -> u32 {
    5
}

impl Default for ResolutionConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            label: default_label(),
            max_chain_depth: default_max_chain_depth(),
            rejected_filter: RejectedFilter::default(),
        }
    }
}

/// Metrics configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct MetricsConfig {
    /// Minimum acceptable critic approval rate, in percent
    #[serde(default = "default_approval_threshold")]
    pub critic_approval_threshold: f64,
}

const fn default_approval_threshold() -> f64 {
    65.0
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            critic_approval_threshold: default_approval_threshold(),
        }
    }
}

/// Output locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct OutputConfig {
    #[serde(default = "default_report_dir")]
    pub report_dir: PathBuf,

    #[serde(default = "default_rejected_dir")]
    pub rejected_dir: PathBuf,
}

fn default_report_dir() -> PathBuf {
    PathBuf::from("resources")
}

fn default_rejected_dir() -> PathBuf {
    PathBuf::from("resources/rejected")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            report_dir: default_report_dir(),
            rejected_dir: default_rejected_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files (stdout only when unset)
    #[serde(default)]
    pub log_dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}
