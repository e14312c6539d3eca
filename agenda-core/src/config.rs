//! Configuration at ~/.config/agenda/config.toml
//!
//! Every key has a default, so a missing or empty file is a valid
//! configuration. Environment variables prefixed with `AGENDA_` override the
//! file (`AGENDA_MODE=remote`, `AGENDA_REMOTE__MODEL=grok-3-mini`).

use std::path::{Path, PathBuf};
use std::time::Duration;

use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::breaker::{DEFAULT_COOLDOWN, DEFAULT_FAILURE_THRESHOLD};
use crate::clock::SystemClock;
use crate::conversation::Mode;
use crate::error::{AgendaError, AgendaResult};

static DEFAULT_DATA_DIR: &str = "~/.local/share/agenda";
static DEFAULT_TIMEZONE: &str = "America/Sao_Paulo";
static DEFAULT_ENDPOINT: &str = "https://api.x.ai/v1/chat/completions";
static DEFAULT_MODEL: &str = "grok-3";
static DEFAULT_API_KEY_ENV: &str = "XAI_API_KEY";
static DEFAULT_TIMEOUT: &str = "30s";
const DEFAULT_UTC_OFFSET_HOURS: i32 = -3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgendaConfig {
    /// Which pipeline `agenda chat` starts in.
    pub mode: Mode,
    /// Fixed offset used to decide what "today" is.
    pub utc_offset_hours: i32,
    /// Timezone label sent along with scheduled meetings.
    pub timezone: String,
    /// Where contacts and conversation history are kept.
    pub data_dir: PathBuf,
    pub organizer: OrganizerConfig,
    pub remote: RemoteConfig,
    pub breaker: BreakerConfig,
    pub webhook: WebhookConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrganizerConfig {
    pub name: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteConfig {
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the bearer token.
    pub api_key_env: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BreakerConfig {
    pub failure_threshold: u32,
    pub cooldown: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebhookConfig {
    pub url: Option<String>,
}

impl Default for AgendaConfig {
    fn default() -> Self {
        AgendaConfig {
            mode: Mode::Local,
            utc_offset_hours: DEFAULT_UTC_OFFSET_HOURS,
            timezone: DEFAULT_TIMEZONE.to_string(),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            organizer: OrganizerConfig::default(),
            remote: RemoteConfig::default(),
            breaker: BreakerConfig::default(),
            webhook: WebhookConfig::default(),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        RemoteConfig {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            temperature: 0.6,
            max_tokens: 800,
            timeout: DEFAULT_TIMEOUT.to_string(),
        }
    }
}

impl Default for BreakerConfig {
    fn default() -> Self {
        BreakerConfig {
            failure_threshold: DEFAULT_FAILURE_THRESHOLD,
            cooldown: humantime::format_duration(DEFAULT_COOLDOWN).to_string(),
        }
    }
}

impl AgendaConfig {
    pub fn config_path() -> AgendaResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| AgendaError::Config("Could not determine config directory".into()))?
            .join("agenda");

        Ok(config_dir.join("config.toml"))
    }

    /// Load from the default location, writing the commented template first
    /// if no file exists yet.
    pub fn load() -> AgendaResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load from `path` plus `AGENDA_*` environment overrides, then validate.
    pub fn load_from(path: &Path) -> AgendaResult<Self> {
        let config: AgendaConfig = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(
                Environment::with_prefix("AGENDA")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AgendaError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| AgendaError::Config(e.to_string()))?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AgendaResult<()> {
        if !(-12..=14).contains(&self.utc_offset_hours) {
            return Err(AgendaError::Config(format!(
                "utc_offset_hours must be between -12 and 14, got {}",
                self.utc_offset_hours
            )));
        }
        validate_url("remote.endpoint", &self.remote.endpoint)?;
        if let Some(url) = &self.webhook.url {
            validate_url("webhook.url", url)?;
        }
        if !(0.0..=2.0).contains(&self.remote.temperature) {
            return Err(AgendaError::Config(format!(
                "remote.temperature must be between 0 and 2, got {}",
                self.remote.temperature
            )));
        }
        if self.breaker.failure_threshold == 0 {
            return Err(AgendaError::Config("breaker.failure_threshold must be at least 1".into()));
        }
        self.remote_timeout()?;
        self.breaker_cooldown()?;
        Ok(())
    }

    /// Data directory with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();
        PathBuf::from(full_path_str)
    }

    pub fn clock(&self) -> AgendaResult<SystemClock> {
        SystemClock::with_offset_hours(self.utc_offset_hours)
    }

    pub fn remote_timeout(&self) -> AgendaResult<Duration> {
        parse_duration("remote.timeout", &self.remote.timeout)
    }

    pub fn breaker_cooldown(&self) -> AgendaResult<Duration> {
        parse_duration("breaker.cooldown", &self.breaker.cooldown)
    }

    /// Bearer token for the remote model, if its environment variable is set.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.remote.api_key_env)
            .ok()
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty())
    }

    /// Save the current config to ~/.config/agenda/config.toml
    pub fn save(&self) -> AgendaResult<()> {
        let config_path = Self::config_path()?;

        let content =
            toml::to_string_pretty(self).map_err(|e| AgendaError::Config(e.to_string()))?;

        std::fs::write(&config_path, content)
            .map_err(|e| AgendaError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> AgendaResult<()> {
        let contents = format!(
            "\
# agenda configuration

# Pipeline used by `agenda chat`: \"local\" or \"remote\"
# mode = \"local\"

# Offset from UTC used to resolve \"hoje\", \"amanhã\", weekdays:
# utc_offset_hours = {offset}

# Timezone label sent with scheduled meetings:
# timezone = \"{timezone}\"

# Where contacts and conversation history are stored:
# data_dir = \"{data_dir}\"

# [organizer]
# name = \"Ana Souza\"
# email = \"ana@empresa.com\"

# [remote]
# endpoint = \"{endpoint}\"
# model = \"{model}\"
# api_key_env = \"{api_key_env}\"
# temperature = 0.6
# max_tokens = 800
# timeout = \"{timeout}\"

# [breaker]
# failure_threshold = {threshold}
# cooldown = \"{cooldown}\"

# [webhook]
# url = \"https://automacao.exemplo.com/webhook/agendar\"
",
            offset = DEFAULT_UTC_OFFSET_HOURS,
            timezone = DEFAULT_TIMEZONE,
            data_dir = DEFAULT_DATA_DIR,
            endpoint = DEFAULT_ENDPOINT,
            model = DEFAULT_MODEL,
            api_key_env = DEFAULT_API_KEY_ENV,
            timeout = DEFAULT_TIMEOUT,
            threshold = DEFAULT_FAILURE_THRESHOLD,
            cooldown = humantime::format_duration(DEFAULT_COOLDOWN),
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                AgendaError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| AgendaError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}

fn validate_url(key: &str, value: &str) -> AgendaResult<()> {
    let url = Url::parse(value)
        .map_err(|e| AgendaError::Config(format!("{key} is not a valid URL ({value}): {e}")))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(AgendaError::Config(format!(
            "{key} must use http or https, got {other}"
        ))),
    }
}

fn parse_duration(key: &str, value: &str) -> AgendaResult<Duration> {
    humantime::parse_duration(value)
        .map_err(|e| AgendaError::Config(format!("{key} is not a valid duration ({value}): {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = AgendaConfig::load_from(&dir.path().join("nope.toml")).unwrap();
        assert_eq!(config.remote.model, "grok-3");
        assert_eq!(config.breaker.failure_threshold, 3);
        assert_eq!(config.breaker_cooldown().unwrap(), Duration::from_secs(60));
        assert_eq!(config.remote_timeout().unwrap(), Duration::from_secs(30));
    }

    #[test]
    fn default_template_parses_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agenda").join("config.toml");
        AgendaConfig::create_default_config(&path).unwrap();
        let loaded = AgendaConfig::load_from(&path).unwrap();
        assert_eq!(loaded.timezone, AgendaConfig::default().timezone);
        assert_eq!(loaded.utc_offset_hours, -3);
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            r#"
mode = "remote"
utc_offset_hours = 0

[organizer]
name = "Ana"
email = "ana@x.com"

[breaker]
cooldown = "2m"

[webhook]
url = "https://hooks.example.com/agendar"
"#,
        );
        let config = AgendaConfig::load_from(&path).unwrap();
        assert_eq!(config.mode, Mode::Remote);
        assert_eq!(config.organizer.name.as_deref(), Some("Ana"));
        assert_eq!(config.breaker_cooldown().unwrap(), Duration::from_secs(120));
        assert_eq!(config.breaker.failure_threshold, 3);
        assert_eq!(config.remote.max_tokens, 800);
    }

    #[test]
    fn invalid_url_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "[webhook]\nurl = \"not a url\"\n");
        assert!(matches!(AgendaConfig::load_from(&path), Err(AgendaError::Config(_))));

        let path = write(&dir, "[remote]\nendpoint = \"ftp://x.example.com\"\n");
        assert!(AgendaConfig::load_from(&path).is_err());
    }

    #[test]
    fn invalid_duration_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "[remote]\ntimeout = \"soon\"\n");
        assert!(AgendaConfig::load_from(&path).is_err());
    }

    #[test]
    fn offset_out_of_range() {
        let config = AgendaConfig {
            utc_offset_hours: 20,
            ..AgendaConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn data_path_expands_tilde() {
        let config = AgendaConfig::default();
        assert!(!config.data_path().to_string_lossy().starts_with('~'));
    }
}
