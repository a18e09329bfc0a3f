use menuhub_core::{CloudinaryConfig, Credential, Retention, RetryPolicy, StoreConfig};
use serde::{Deserialize, Serialize, Serializer};
use std::path::PathBuf;

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    fn set(&mut self, value: T, source: ConfigSource) {
        self.value = value;
        self.source = source;
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct ServerSection {
    port: Option<u16>,
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Store project id
    pub project_id: ConfigValue<String>,
    /// Store web API key
    #[serde(serialize_with = "masked_value")]
    pub api_key: ConfigValue<Option<String>>,
    pub database: ConfigValue<String>,
    /// Store endpoint, overridable for the emulator
    pub base_url: ConfigValue<String>,
    /// Restaurant that admin commands act on
    pub restaurant_id: ConfigValue<Option<String>>,
    /// ID token sent with admin requests
    #[serde(serialize_with = "masked_value")]
    pub id_token: ConfigValue<Option<String>>,
    pub retention: ConfigValue<Retention>,
    pub port: ConfigValue<u16>,
    pub retry: RetryPolicy,
    #[serde(serialize_with = "masked_media")]
    pub media: CloudinaryConfig,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    project_id: Option<String>,
    api_key: Option<String>,
    database: Option<String>,
    base_url: Option<String>,
    restaurant_id: Option<String>,
    id_token: Option<String>,
    retention: Option<Retention>,
    retry: Option<RetryPolicy>,
    media: Option<CloudinaryConfig>,
    server: Option<ServerSection>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with_env(config_path, |key| std::env::var(key).ok())
    }

    /// Like [`Config::load`], reading environment variables through `env`.
    pub fn load_with_env(
        config_path: Option<PathBuf>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let defaults = StoreConfig::default();

        // Start with defaults
        let mut project_id = ConfigValue::new(String::new(), ConfigSource::Default);
        let mut api_key = ConfigValue::new(None, ConfigSource::Default);
        let mut database = ConfigValue::new(defaults.database, ConfigSource::Default);
        let mut base_url = ConfigValue::new(defaults.base_url, ConfigSource::Default);
        let mut restaurant_id = ConfigValue::new(None, ConfigSource::Default);
        let mut id_token = ConfigValue::new(None, ConfigSource::Default);
        let mut retention = ConfigValue::new(Retention::default(), ConfigSource::Default);
        let mut port = ConfigValue::new(8080, ConfigSource::Default);
        let mut retry = RetryPolicy::default();
        let mut media = CloudinaryConfig::default();
        let mut config_file = None;

        // Try to load from config file
        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(v) = file.project_id {
                project_id.set(v, ConfigSource::File);
            }
            if let Some(v) = file.api_key {
                api_key.set(Some(v), ConfigSource::File);
            }
            if let Some(v) = file.database {
                database.set(v, ConfigSource::File);
            }
            if let Some(v) = file.base_url {
                base_url.set(v, ConfigSource::File);
            }
            if let Some(v) = file.restaurant_id {
                restaurant_id.set(Some(v), ConfigSource::File);
            }
            if let Some(v) = file.id_token {
                id_token.set(Some(v), ConfigSource::File);
            }
            if let Some(v) = file.retention {
                retention.set(v, ConfigSource::File);
            }
            if let Some(v) = file.server.and_then(|s| s.port) {
                port.set(v, ConfigSource::File);
            }
            if let Some(v) = file.retry {
                retry = v;
            }
            if let Some(v) = file.media {
                media = v;
            }
        }

        // Apply environment variable overrides
        if let Some(v) = env("MENUHUB_PROJECT_ID") {
            project_id.set(v, ConfigSource::Environment);
        }
        if let Some(v) = env("MENUHUB_API_KEY") {
            api_key.set(Some(v), ConfigSource::Environment);
        }
        if let Some(v) = env("MENUHUB_BASE_URL") {
            base_url.set(v, ConfigSource::Environment);
        }
        if let Some(v) = env("MENUHUB_RESTAURANT_ID") {
            restaurant_id.set(Some(v), ConfigSource::Environment);
        }
        if let Some(v) = env("MENUHUB_ID_TOKEN") {
            id_token.set(Some(v), ConfigSource::Environment);
        }
        if let Some(v) = env("MENUHUB_RETENTION") {
            let parsed = Retention::parse(&v).ok_or_else(|| ConfigError::InvalidValue {
                key: "MENUHUB_RETENTION",
                value: v.clone(),
            })?;
            retention.set(parsed, ConfigSource::Environment);
        }
        if let Some(v) = env("MENUHUB_PORT") {
            let parsed = v.parse().map_err(|_| ConfigError::InvalidValue {
                key: "MENUHUB_PORT",
                value: v.clone(),
            })?;
            port.set(parsed, ConfigSource::Environment);
        }
        // Media env var overrides
        if let Some(v) = env("MENUHUB_CLOUD_NAME") {
            media.cloud_name = v;
        }
        if let Some(v) = env("MENUHUB_UPLOAD_PRESET") {
            media.upload_preset = v;
        }

        Ok(Self {
            project_id,
            api_key,
            database,
            base_url,
            restaurant_id,
            id_token,
            retention,
            port,
            retry,
            media,
            config_file,
        })
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/menuhub/
    /// - macOS: ~/Library/Application Support/menuhub/
    /// - Windows: %APPDATA%/menuhub/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("menuhub")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }

    pub fn store_config(&self) -> StoreConfig {
        StoreConfig {
            project_id: self.project_id.value.clone(),
            api_key: self.api_key.value.clone(),
            database: self.database.value.clone(),
            base_url: self.base_url.value.clone(),
            ..StoreConfig::default()
        }
    }

    /// Credential for admin requests; anonymous when no token is set.
    pub fn credential(&self) -> Credential {
        match &self.id_token.value {
            Some(token) => Credential::bearer(token.clone()),
            None => Credential::Anonymous,
        }
    }

    /// Restaurant for admin commands, which cannot run without one.
    pub fn require_restaurant(&self) -> Result<&str, ConfigError> {
        self.restaurant_id
            .value
            .as_deref()
            .ok_or(ConfigError::Missing("restaurant_id"))
    }

    pub fn require_project(&self) -> Result<&str, ConfigError> {
        if self.project_id.value.is_empty() {
            return Err(ConfigError::Missing("project_id"));
        }
        Ok(&self.project_id.value)
    }
}

/// Shows only whether a secret is set.
pub fn mask(secret: Option<&str>) -> &'static str {
    match secret {
        Some(_) => "********",
        None => "(not set)",
    }
}

fn masked_value<S: Serializer>(
    value: &ConfigValue<Option<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    ConfigValue::new(mask(value.value.as_deref()), value.source.clone()).serialize(serializer)
}

fn masked_media<S: Serializer>(media: &CloudinaryConfig, serializer: S) -> Result<S::Ok, S::Error> {
    let mut media = media.clone();
    media.api_key = media.api_key.as_deref().map(|s| mask(Some(s)).to_string());
    media.api_secret = media.api_secret.as_deref().map(|s| mask(Some(s)).to_string());
    media.serialize(serializer)
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
    InvalidValue { key: &'static str, value: String },
    Missing(&'static str),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
            ConfigError::InvalidValue { key, value } => {
                write!(f, "Invalid value for {}: '{}'", key, value)
            }
            ConfigError::Missing(key) => write!(
                f,
                "{} is not configured. Set it in the config file or MENUHUB_{}.",
                key,
                key.to_uppercase()
            ),
        }
    }
}

impl std::error::Error for ConfigError {}
