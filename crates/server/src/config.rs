use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use common::DEFAULT_IMAGE_URL;
use metadata::Provider;
use recommender::DEFAULT_MAX_CONCURRENCY;
use serde::{Deserialize, Serialize};

pub const CONFIG_VERSION: u32 = 1;

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_RECOMMENDATIONS: usize = 10;
const DEFAULT_HISTORY_SIZE: usize = 3;
const DEFAULT_TIMEOUT_SECS: u64 = 8;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataConfig {
    pub provider: Provider,
    pub client_id: String,
    pub client_secret: String,
    pub timeout_secs: u64,
    pub max_concurrency: usize,
    pub fallback_image_url: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            provider: Provider::Spotify,
            client_id: String::new(),
            client_secret: String::new(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            fallback_image_url: DEFAULT_IMAGE_URL.to_string(),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub version: u32,
    pub port: u16,
    pub catalog_path: String,
    pub similarity_path: String,
    pub default_recommendations: usize,
    pub history_size: usize,
    pub metadata: MetadataConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            port: DEFAULT_PORT,
            catalog_path: "data/catalog.json".to_string(),
            similarity_path: "data/similarity.bin".to_string(),
            default_recommendations: DEFAULT_RECOMMENDATIONS,
            history_size: DEFAULT_HISTORY_SIZE,
            metadata: MetadataConfig::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "io error: {}", err),
            ConfigError::Yaml(err) => write!(f, "yaml error: {}", err),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_yaml::Error> for ConfigError {
    fn from(err: serde_yaml::Error) -> Self {
        ConfigError::Yaml(err)
    }
}

pub fn config_path_from_env() -> PathBuf {
    match env::var("RECOMMENDER_CONFIG") {
        Ok(value) if !value.trim().is_empty() => PathBuf::from(value),
        _ => default_config_path(),
    }
}

fn default_config_path() -> PathBuf {
    match env::current_exe() {
        Ok(exe) => exe
            .parent()
            .map(|dir| dir.join("config.yaml"))
            .unwrap_or_else(|| PathBuf::from("config.yaml")),
        Err(_) => PathBuf::from("config.yaml"),
    }
}

pub fn load_or_create_config(path: &Path) -> Result<(ServerConfig, bool), ConfigError> {
    if path.exists() {
        let contents = fs::read_to_string(path)?;
        let mut config: ServerConfig = serde_yaml::from_str(&contents)?;
        normalize(&mut config);
        return Ok((config, false));
    }

    let config = ServerConfig::default();
    save_config(path, &config)?;
    Ok((config, true))
}

fn normalize(config: &mut ServerConfig) {
    if config.version < CONFIG_VERSION {
        config.version = CONFIG_VERSION;
    }
    if config.port == 0 {
        config.port = DEFAULT_PORT;
    }
    if config.catalog_path.trim().is_empty() {
        config.catalog_path = "data/catalog.json".to_string();
    }
    if config.similarity_path.trim().is_empty() {
        config.similarity_path = "data/similarity.bin".to_string();
    }
    if config.default_recommendations == 0 {
        config.default_recommendations = DEFAULT_RECOMMENDATIONS;
    }
    if config.history_size == 0 {
        config.history_size = DEFAULT_HISTORY_SIZE;
    }
    let metadata = &mut config.metadata;
    if metadata.timeout_secs == 0 {
        metadata.timeout_secs = DEFAULT_TIMEOUT_SECS;
    }
    if metadata.max_concurrency == 0 {
        metadata.max_concurrency = DEFAULT_MAX_CONCURRENCY;
    }
    if metadata.fallback_image_url.trim().is_empty() {
        metadata.fallback_image_url = DEFAULT_IMAGE_URL.to_string();
    }
}

pub fn apply_env_credentials(config: &mut MetadataConfig) {
    if config.client_id.trim().is_empty() {
        if let Ok(value) = env::var("SPOTIFY_CLIENT_ID") {
            config.client_id = value.trim().to_string();
        }
    }
    if config.client_secret.trim().is_empty() {
        if let Ok(value) = env::var("SPOTIFY_CLIENT_SECRET") {
            config.client_secret = value.trim().to_string();
        }
    }
}

pub fn save_config(path: &Path, config: &ServerConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let contents = serde_yaml::to_string(config)?;
    fs::write(path, contents)?;
    Ok(())
}

pub fn resolve_path(config_path: &Path, value: &str) -> PathBuf {
    let raw = PathBuf::from(value);
    if raw.is_absolute() {
        return raw;
    }
    let base = config_path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    base.join(raw)
}
