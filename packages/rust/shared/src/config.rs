//! Application configuration for the takeaways workflow.
//!
//! User config lives at `~/.takeaways/takeaways.toml`.
//! CLI flags override config file values, which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, TakeawaysError};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "takeaways.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".takeaways";

// ---------------------------------------------------------------------------
// Config structs (matching takeaways.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Text-generation provider settings.
    #[serde(default)]
    pub provider: ProviderConfig,

    /// GitHub repository holding the glossary.
    #[serde(default)]
    pub github: GitHubConfig,

    /// Glossary document layout.
    #[serde(default)]
    pub glossary: GlossaryConfig,

    /// Task retry policy.
    #[serde(default)]
    pub retry: RetryConfig,
}

/// `[provider]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Name of the env var holding the API key (never store the key itself).
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Base URL of an OpenAI-compatible chat completions API.
    #[serde(default = "default_provider_base_url")]
    pub base_url: String,

    /// Model identifier sent with every request.
    #[serde(default = "default_model")]
    pub model: String,

    /// HTTP timeout for a single generation request.
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key_env: default_api_key_env(),
            base_url: default_provider_base_url(),
            model: default_model(),
            timeout_secs: default_provider_timeout(),
        }
    }
}

fn default_api_key_env() -> String {
    "OPENROUTER_API_KEY".into()
}
fn default_provider_base_url() -> String {
    "https://openrouter.ai/api/v1".into()
}
fn default_model() -> String {
    "openai/gpt-4o-mini".into()
}
fn default_provider_timeout() -> u64 {
    120
}

/// `[github]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubConfig {
    /// Name of the env var holding the GitHub token.
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// REST API root.
    #[serde(default = "default_api_base")]
    pub api_base: String,

    /// Repository owner.
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Repository name.
    #[serde(default = "default_repo")]
    pub repo: String,

    /// Main integration branch that change requests target.
    #[serde(default = "default_base_branch")]
    pub base_branch: String,

    /// HTTP timeout for a single API call.
    #[serde(default = "default_github_timeout")]
    pub timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token_env: default_token_env(),
            api_base: default_api_base(),
            owner: default_owner(),
            repo: default_repo(),
            base_branch: default_base_branch(),
            timeout_secs: default_github_timeout(),
        }
    }
}

fn default_token_env() -> String {
    "GITHUB_TOKEN".into()
}
fn default_api_base() -> String {
    "https://api.github.com".into()
}
fn default_owner() -> String {
    "unkeyed".into()
}
fn default_repo() -> String {
    "unkey".into()
}
fn default_base_branch() -> String {
    "main".into()
}
fn default_github_timeout() -> u64 {
    30
}

/// `[glossary]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlossaryConfig {
    /// Repository directory holding one document per term.
    #[serde(default = "default_content_dir")]
    pub content_dir: String,

    /// File extension of glossary documents.
    #[serde(default = "default_extension")]
    pub extension: String,
}

impl Default for GlossaryConfig {
    fn default() -> Self {
        Self {
            content_dir: default_content_dir(),
            extension: default_extension(),
        }
    }
}

fn default_content_dir() -> String {
    "apps/www/content/glossary".into()
}
fn default_extension() -> String {
    "mdx".into()
}

/// `[retry]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum attempts of a whole task, the first one included.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Pause between attempts.
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_backoff_ms() -> u64 {
    1000
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.takeaways/`).
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| TakeawaysError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.takeaways/takeaways.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| TakeawaysError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| TakeawaysError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| TakeawaysError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content =
        toml::to_string_pretty(&config).map_err(|e| TakeawaysError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| TakeawaysError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Read a credential from the env var named in the config.
fn read_secret(var_name: &str, what: &str) -> Result<String> {
    match std::env::var(var_name) {
        Ok(val) if !val.is_empty() => Ok(val),
        _ => Err(TakeawaysError::config(format!(
            "{what} not found. Set the {var_name} environment variable."
        ))),
    }
}

/// Resolve the provider API key from its env var.
pub fn provider_api_key(config: &AppConfig) -> Result<String> {
    read_secret(&config.provider.api_key_env, "provider API key")
}

/// Resolve the GitHub token from its env var.
pub fn github_token(config: &AppConfig) -> Result<String> {
    read_secret(&config.github.token_env, "GitHub token")
}

/// Check that every credential the workflow needs is present.
pub fn validate_credentials(config: &AppConfig) -> Result<()> {
    provider_api_key(config)?;
    github_token(config)?;
    Ok(())
}
