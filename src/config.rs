use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Environment variables checked, in order, for the Gemini API key
pub const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub gemini: GeminiSettings,
    #[serde(default)]
    pub cors: CorsSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
    #[serde(default = "default_max_audio_bytes")]
    pub max_audio_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
            max_audio_bytes: default_max_audio_bytes(),
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8000 }
fn default_max_audio_bytes() -> usize { 10 * 1024 * 1024 }

#[derive(Debug, Clone, Deserialize)]
pub struct GeminiSettings {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Tried in order at startup; the first one the API recognises is used
    #[serde(default = "default_candidate_models")]
    pub candidate_models: Vec<String>,
    /// Unset means no client-side timeout on model calls
    pub request_timeout_secs: Option<u64>,
}

impl Default for GeminiSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            candidate_models: default_candidate_models(),
            request_timeout_secs: None,
        }
    }
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_candidate_models() -> Vec<String> {
    vec![
        "models/gemini-2.5-flash".to_string(),
        "models/gemini-2.0-flash".to_string(),
        "models/gemini-flash-latest".to_string(),
    ]
}

/// Cross-origin policy. The permissive default is meant for local development.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsSettings {
    #[serde(default = "default_true")]
    pub permissive: bool,
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for CorsSettings {
    fn default() -> Self {
        Self {
            permissive: true,
            allowed_origins: Vec::new(),
        }
    }
}

fn default_true() -> bool { true }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with TRIAGE__)
    /// 5. GEMINI_API_KEY / GOOGLE_API_KEY for the API key
    ///
    /// Fails when no API key is available from any source.
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., TRIAGE__SERVER__PORT -> server.port
            .add_source(environment_source())
            .build()?;

        let api_key = resolve_api_key(|name| std::env::var(name).ok());
        let settings = apply_api_key(settings, api_key)?;

        settings.try_deserialize::<Settings>()?.validated()
    }

    fn validated(self) -> Result<Self, ConfigError> {
        if self.gemini.api_key.trim().is_empty() {
            return Err(ConfigError::Message(format!(
                "{} or {} environment variable is required",
                API_KEY_VARS[0], API_KEY_VARS[1]
            )));
        }
        if self.gemini.candidate_models.is_empty() {
            return Err(ConfigError::Message(
                "gemini.candidate_models must name at least one model".to_string(),
            ));
        }
        Ok(self)
    }
}

fn environment_source() -> Environment {
    Environment::with_prefix("TRIAGE")
        .prefix_separator("__")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("gemini.candidate_models")
        .try_parsing(true)
}

/// Pick the API key from the first recognised variable that is set and non-empty
pub fn resolve_api_key<F>(lookup: F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    API_KEY_VARS
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.trim().is_empty())
}

fn apply_api_key(settings: Config, api_key: Option<String>) -> Result<Config, ConfigError> {
    match api_key {
        Some(key) => Config::builder()
            .add_source(settings)
            .set_override("gemini.api_key", key)?
            .build(),
        None => Ok(settings),
    }
}
