use crate::error::ConfigError;
use crate::types::{AudioFormat, StreamParams};
use regex::Regex;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub audio: AudioConfig,

    #[serde(default)]
    pub pacing: PacingConfig,

    #[serde(default)]
    pub session: SessionConfig,

    /// Per-client tables, keyed by client name (e.g. `[clients.loopback]`).
    #[serde(default)]
    pub clients: Option<toml::Value>,

    #[serde(default)]
    pub handler: Vec<HandlerConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GeneralConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Upper bound on a whole session; unset means no deadline.
    #[serde(default)]
    pub session_deadline_secs: Option<u64>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            session_deadline_secs: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AudioConfig {
    #[serde(default = "default_audio_path")]
    pub path: PathBuf,

    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,

    #[serde(default = "default_bytes_per_sample")]
    pub bytes_per_sample: u16,

    #[serde(default = "default_channels")]
    pub channels: u16,

    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            path: default_audio_path(),
            sample_rate: default_sample_rate(),
            bytes_per_sample: default_bytes_per_sample(),
            channels: default_channels(),
            chunk_size: default_chunk_size(),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PacingConfig {
    /// Per-chunk delays in milliseconds. When present, replaces real-time pacing.
    #[serde(default)]
    pub delay_schedule_ms: Option<Vec<u64>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SessionConfig {
    #[serde(default = "default_client")]
    pub client: String,

    #[serde(default = "default_language_code")]
    pub language_code: String,

    #[serde(default = "default_media_encoding")]
    pub media_encoding: String,

    #[serde(default = "default_true")]
    pub enable_channel_identification: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            client: default_client(),
            language_code: default_language_code(),
            media_encoding: default_media_encoding(),
            enable_channel_identification: default_true(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct HandlerConfig {
    pub plugin: String,

    #[serde(flatten)]
    pub extra: toml::Value,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_audio_path() -> PathBuf {
    PathBuf::from("tests/assets/test.wav")
}

fn default_sample_rate() -> u32 {
    8000
}

fn default_bytes_per_sample() -> u16 {
    2
}

fn default_channels() -> u16 {
    2
}

fn default_chunk_size() -> usize {
    3200
}

fn default_client() -> String {
    "loopback".to_string()
}

fn default_language_code() -> String {
    "en-US".to_string()
}

fn default_media_encoding() -> String {
    "pcm".to_string()
}

fn default_true() -> bool {
    true
}

/// Interpolate `${VAR}` patterns with environment variable values.
fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([^}]+)\}")
        .map_err(|e| ConfigError::Invalid(format!("interpolation pattern: {e}")))?;
    let mut result = input.to_string();

    for cap in re.captures_iter(input) {
        let var_name = &cap[1];
        let val = std::env::var(var_name)
            .map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
        result = result.replace(&cap[0], &val);
    }

    Ok(result)
}

impl AppConfig {
    /// Load configuration from a TOML file, with environment variable interpolation.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let interpolated = interpolate_env_vars(s)?;
        let config: AppConfig = toml::from_str(&interpolated)?;
        Ok(config)
    }

    /// Reject values the pacer cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let audio = &self.audio;
        if audio.sample_rate == 0 {
            return Err(ConfigError::Invalid("audio.sample_rate must be > 0".to_string()));
        }
        if audio.bytes_per_sample == 0 {
            return Err(ConfigError::Invalid(
                "audio.bytes_per_sample must be > 0".to_string(),
            ));
        }
        if audio.channels == 0 {
            return Err(ConfigError::Invalid("audio.channels must be > 0".to_string()));
        }
        if audio.chunk_size == 0 {
            return Err(ConfigError::Invalid("audio.chunk_size must be > 0".to_string()));
        }
        if let Some(schedule) = &self.pacing.delay_schedule_ms {
            if schedule.is_empty() {
                return Err(ConfigError::Invalid(
                    "pacing.delay_schedule_ms must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn audio_format(&self) -> AudioFormat {
        AudioFormat {
            bytes_per_sample: self.audio.bytes_per_sample,
            sample_rate_hz: self.audio.sample_rate,
            channels: self.audio.channels,
        }
    }

    pub fn stream_params(&self) -> StreamParams {
        StreamParams {
            language_code: self.session.language_code.clone(),
            sample_rate_hz: self.audio.sample_rate,
            bytes_per_sample: self.audio.bytes_per_sample,
            media_encoding: self.session.media_encoding.clone(),
            channels: self.audio.channels,
            enable_channel_identification: self.session.enable_channel_identification,
        }
    }

    /// The `[clients.<name>]` table, or an empty table if none is configured.
    pub fn client_config(&self, name: &str) -> toml::Value {
        self.clients
            .as_ref()
            .and_then(|clients| clients.get(name))
            .cloned()
            .unwrap_or_else(|| toml::Value::Table(Default::default()))
    }

    pub fn session_deadline(&self) -> Option<Duration> {
        self.general.session_deadline_secs.map(Duration::from_secs)
    }

    /// Configured handlers, falling back to a single console handler.
    pub fn effective_handlers(&self) -> Vec<HandlerConfig> {
        if self.handler.is_empty() {
            vec![HandlerConfig {
                plugin: "console".to_string(),
                extra: toml::Value::Table(Default::default()),
            }]
        } else {
            self.handler.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_parse_valid_toml() {
        let toml_str = r#"
[general]
log_level = "debug"
session_deadline_secs = 30

[audio]
path = "/data/call.wav"
sample_rate = 16000
bytes_per_sample = 2
channels = 1
chunk_size = 640

[pacing]
delay_schedule_ms = [142, 79, 1880]

[session]
client = "loopback"
language_code = "de-DE"
enable_channel_identification = false

[clients.loopback]
partial_every = 3

[[handler]]
plugin = "file"
path = "out.txt"
"#;
        let config = AppConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.session_deadline(), Some(Duration::from_secs(30)));
        assert_eq!(config.audio.path, PathBuf::from("/data/call.wav"));
        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.audio.channels, 1);
        assert_eq!(config.audio.chunk_size, 640);
        assert_eq!(config.pacing.delay_schedule_ms, Some(vec![142, 79, 1880]));
        assert_eq!(config.session.language_code, "de-DE");
        assert!(!config.session.enable_channel_identification);
        assert_eq!(config.handler.len(), 1);
        assert_eq!(config.handler[0].plugin, "file");
        assert_eq!(
            config.handler[0].extra.get("path").and_then(|v| v.as_str()),
            Some("out.txt")
        );
        assert_eq!(
            config
                .client_config("loopback")
                .get("partial_every")
                .and_then(|v| v.as_integer()),
            Some(3)
        );
    }

    #[test]
    fn test_config_default_values() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.session_deadline(), None);
        assert_eq!(config.audio.sample_rate, 8000);
        assert_eq!(config.audio.bytes_per_sample, 2);
        assert_eq!(config.audio.channels, 2);
        assert_eq!(config.audio.chunk_size, 3200);
        assert!(config.pacing.delay_schedule_ms.is_none());
        assert_eq!(config.session.client, "loopback");
        assert_eq!(config.session.media_encoding, "pcm");
        assert!(config.session.enable_channel_identification);
        assert!(config.handler.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_effective_handlers_defaults_to_console() {
        let config = AppConfig::from_toml_str("").unwrap();
        let handlers = config.effective_handlers();
        assert_eq!(handlers.len(), 1);
        assert_eq!(handlers[0].plugin, "console");
    }

    #[test]
    fn test_config_client_config_missing_is_empty_table() {
        let config = AppConfig::from_toml_str("").unwrap();
        let value = config.client_config("loopback");
        assert!(value.as_table().map(|t| t.is_empty()).unwrap_or(false));
    }

    #[test]
    fn test_config_audio_format_and_stream_params() {
        let config = AppConfig::from_toml_str("").unwrap();
        let format = config.audio_format();
        assert_eq!(format.bytes_per_second(), 32000);

        let params = config.stream_params();
        assert_eq!(params.sample_rate_hz, 8000);
        assert_eq!(params.bytes_per_sample, 2);
        assert_eq!(params.channels, 2);
        assert_eq!(params.language_code, "en-US");
    }

    #[test]
    fn test_config_env_var_interpolation() {
        std::env::set_var("VOXPACE_TEST_AUDIO", "/tmp/from_env.wav");
        let toml_str = r#"
[audio]
path = "${VOXPACE_TEST_AUDIO}"
"#;
        let config = AppConfig::from_toml_str(toml_str).unwrap();
        assert_eq!(config.audio.path, PathBuf::from("/tmp/from_env.wav"));
        std::env::remove_var("VOXPACE_TEST_AUDIO");
    }

    #[test]
    fn test_config_missing_env_var_error() {
        let toml_str = r#"
[general]
log_level = "${DEFINITELY_DOES_NOT_EXIST_12345}"
"#;
        let err = AppConfig::from_toml_str(toml_str).unwrap_err();
        assert!(err.to_string().contains("DEFINITELY_DOES_NOT_EXIST_12345"));
    }

    #[test]
    fn test_config_invalid_toml_error() {
        let result = AppConfig::from_toml_str("this is not valid toml [[[");
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }

    #[test]
    fn test_config_validate_rejects_zero_values() {
        for toml_str in [
            "[audio]\nsample_rate = 0",
            "[audio]\nbytes_per_sample = 0",
            "[audio]\nchannels = 0",
            "[audio]\nchunk_size = 0",
        ] {
            let config = AppConfig::from_toml_str(toml_str).unwrap();
            match config.validate() {
                Err(ConfigError::Invalid(_)) => {}
                other => panic!("expected Invalid for {toml_str:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn test_config_validate_rejects_empty_schedule() {
        let config = AppConfig::from_toml_str("[pacing]\ndelay_schedule_ms = []").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("delay_schedule_ms"));
    }

    #[test]
    fn test_config_load_from_file() {
        let dir = std::env::temp_dir().join("voxpace_test_config");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("test.toml");
        std::fs::write(
            &path,
            r#"
[general]
log_level = "warn"

[audio]
chunk_size = 640
"#,
        )
        .unwrap();

        let config = AppConfig::load_from_file(&path).unwrap();
        assert_eq!(config.general.log_level, "warn");
        assert_eq!(config.audio.chunk_size, 640);

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_config_load_from_file_not_found() {
        let result = AppConfig::load_from_file(Path::new("/nonexistent/path.toml"));
        assert!(result
            .unwrap_err()
            .to_string()
            .contains("failed to read config file"));
    }
}
