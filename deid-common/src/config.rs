use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

fn default_output_dir() -> String {
    "./output".to_string()
}

fn default_checkpoint_dir() -> String {
    "./checkpoints".to_string()
}

fn default_chunk_size() -> usize {
    2000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_checkpoint_interval() -> usize {
    1
}

fn default_max_concurrency_per_file() -> usize {
    1
}

fn default_max_parallel_files() -> usize {
    1
}

fn default_llm_timeout_secs() -> u64 {
    120
}

fn default_shutdown_grace_secs() -> u64 {
    10
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_tool_hint_min_confidence() -> f32 {
    0.60
}

/// Process-wide configuration, loaded once from an optional `config.toml`
/// and the environment, following the layering `common::utils::config` uses:
/// file first (optional), environment overrides on top.
#[derive(Clone, Deserialize, Debug)]
pub struct AppConfig {
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default = "default_base_url")]
    pub openai_base_url: String,
    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_output_dir")]
    pub output_dir: String,
    #[serde(default = "default_checkpoint_dir")]
    pub checkpoint_dir: String,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
    #[serde(default = "default_checkpoint_interval")]
    pub checkpoint_interval: usize,

    #[serde(default = "default_max_concurrency_per_file")]
    pub max_concurrency_per_file: usize,
    #[serde(default = "default_max_parallel_files")]
    pub max_parallel_files: usize,

    #[serde(default = "default_llm_timeout_secs")]
    pub llm_timeout_secs: u64,
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,

    #[serde(default = "default_tool_hint_min_confidence")]
    pub tool_hint_min_confidence: f32,

    #[serde(default)]
    pub enable_rag: bool,
    #[serde(default)]
    pub enable_tools: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            openai_api_key: String::new(),
            openai_base_url: default_base_url(),
            model: default_model(),
            output_dir: default_output_dir(),
            checkpoint_dir: default_checkpoint_dir(),
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            checkpoint_interval: default_checkpoint_interval(),
            max_concurrency_per_file: default_max_concurrency_per_file(),
            max_parallel_files: default_max_parallel_files(),
            llm_timeout_secs: default_llm_timeout_secs(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
            tool_hint_min_confidence: default_tool_hint_min_confidence(),
            enable_rag: true,
            enable_tools: true,
        }
    }
}

/// Load configuration from `./config.toml` (if present) overlaid with
/// `DEID_*` environment variables.
pub fn get_config() -> Result<AppConfig, ConfigError> {
    let config = Config::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(Environment::with_prefix("DEID").separator("__"))
        .build()?;

    config.try_deserialize()
}
