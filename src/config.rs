//! Configuration loader.
//!
//! Loads configuration from:
//! 1. Default values
//! 2. `.plugin-registry/config.yaml` in the working directory
//! 3. `~/.plugin-registry/config.yaml` in the home directory
//! 4. Environment variables with `PLUGIN_REGISTRY_` prefix
//!    (nested keys joined with `__`, e.g. `PLUGIN_REGISTRY_SERVER__PORT=9090`)

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::fetcher::GITHUB_RAW_BASE;

/// Project-local configuration directory
pub const CONFIG_DIR: &str = ".plugin-registry";

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    #[serde(default)]
    pub pages: PagesConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
}

/// HTTP server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    8080
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

/// Where the plugin registry is loaded from
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RegistryConfig {
    /// JSON object file mapping plugin ids to repository URLs
    #[serde(default = "default_registry_path")]
    pub path: PathBuf,
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("registry.json")
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            path: default_registry_path(),
        }
    }
}

/// Static page templates
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PagesConfig {
    #[serde(default = "default_index_page")]
    pub index: PathBuf,
    /// Per-plugin page; `{plugin_name}` is replaced with the requested name
    #[serde(default = "default_plugin_page")]
    pub plugin: PathBuf,
}

fn default_index_page() -> PathBuf {
    PathBuf::from("index.html")
}

fn default_plugin_page() -> PathBuf {
    PathBuf::from("plugin.html")
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self {
            index: default_index_page(),
            plugin: default_plugin_page(),
        }
    }
}

/// Raw-content fetching
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct FetchConfig {
    /// Raw-content host used for GitHub repositories
    #[serde(default = "default_github_raw_base")]
    pub github_raw_base: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_github_raw_base() -> String {
    GITHUB_RAW_BASE.to_string()
}

fn default_user_agent() -> String {
    format!("plugin-registry/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            github_raw_base: default_github_raw_base(),
            user_agent: default_user_agent(),
        }
    }
}

/// Load configuration from all sources
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder()
        .set_default("server.port", i64::from(default_port()))?
        .set_default("server.host", default_host())?
        .set_default("registry.path", "registry.json")?
        .set_default("pages.index", "index.html")?
        .set_default("pages.plugin", "plugin.html")?
        .set_default("fetch.github_raw_base", default_github_raw_base())?
        .set_default("fetch.user_agent", default_user_agent())?;

    // Load from project config file
    let project_config = PathBuf::from(CONFIG_DIR).join("config.yaml");
    if project_config.exists() {
        builder = builder.add_source(File::from(project_config).required(false));
    }

    // Load from home directory config file
    if let Some(home) = dirs::home_dir() {
        let home_config = home.join(CONFIG_DIR).join("config.yaml");
        if home_config.exists() {
            builder = builder.add_source(File::from(home_config).required(false));
        }
    }

    builder = builder.add_source(
        Environment::with_prefix("PLUGIN_REGISTRY")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    builder.build()?.try_deserialize()
}
