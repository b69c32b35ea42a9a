use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

/// Which blob store backs uploads
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub local: LocalStoreConfig,
    #[serde(default)]
    pub azure: AzureStoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalStoreConfig {
    #[serde(default = "default_local_path")]
    pub base_path: String,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AzureStoreConfig {
    #[serde(default)]
    pub account: String,
    /// Base64-encoded shared key
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub container: String,
    /// Override for emulators (Azurite); defaults to the public endpoint
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_db_path() -> String {
    "data/arkive.db".to_string()
}

fn default_provider() -> String {
    "local".to_string()
}

fn default_local_path() -> String {
    "data/uploads".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            local: LocalStoreConfig::default(),
            azure: AzureStoreConfig::default(),
        }
    }
}

impl Default for LocalStoreConfig {
    fn default() -> Self {
        Self {
            base_path: default_local_path(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load() -> anyhow::Result<Self> {
        let mut config = Self::load_from_file()?;
        config.apply_env_overrides();
        config.ensure_directories()?;
        Ok(config)
    }

    /// Load configuration from config.toml if present
    fn load_from_file() -> anyhow::Result<Self> {
        let config_paths = ["config.toml", "data/config.toml"];

        for path in config_paths {
            if Path::new(path).exists() {
                let content = fs::read_to_string(path)?;
                let config: Config = toml::from_str(&content)?;
                tracing::info!("Loaded configuration from {}", path);
                return Ok(config);
            }
        }

        tracing::info!("No configuration file found, using defaults");
        Ok(Config::default())
    }

    /// Apply environment variable overrides
    /// Format: ARKIVE_CONF_<SECTION>_<KEY>
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = env::var("ARKIVE_CONF_SERVER_HOST") {
            self.server.host = val;
        }
        if let Ok(val) = env::var("ARKIVE_CONF_SERVER_PORT") {
            if let Ok(port) = val.parse() {
                self.server.port = port;
            }
        }

        if let Ok(val) = env::var("ARKIVE_CONF_DATABASE_PATH") {
            self.database.path = val;
        }

        if let Ok(val) = env::var("ARKIVE_CONF_STORAGE_PROVIDER") {
            self.storage.provider = val;
        }
        if let Ok(val) = env::var("ARKIVE_CONF_STORAGE_LOCAL_BASE_PATH") {
            self.storage.local.base_path = val;
        }
        if let Ok(val) = env::var("ARKIVE_CONF_STORAGE_AZURE_ACCOUNT") {
            self.storage.azure.account = val;
        }
        if let Ok(val) = env::var("ARKIVE_CONF_STORAGE_AZURE_ACCESS_KEY") {
            self.storage.azure.access_key = val;
        }
        if let Ok(val) = env::var("ARKIVE_CONF_STORAGE_AZURE_CONTAINER") {
            self.storage.azure.container = val;
        }
        if let Ok(val) = env::var("ARKIVE_CONF_STORAGE_AZURE_ENDPOINT") {
            if !val.trim().is_empty() {
                self.storage.azure.endpoint = Some(val);
            }
        }
    }

    /// Ensure required directories exist
    fn ensure_directories(&self) -> anyhow::Result<()> {
        if let Some(parent) = Path::new(&self.database.path).parent() {
            fs::create_dir_all(parent)?;
        }

        if self.storage.provider == "local" {
            fs::create_dir_all(&self.storage.local.base_path)?;
        }

        Ok(())
    }
}
