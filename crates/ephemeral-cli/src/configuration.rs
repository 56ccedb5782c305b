use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File, FileFormat};
use ephemeral::models::speaker::SpeakerLabels;
use ephemeral::providers::configs::{GeminiProviderConfig, GEMINI_HOST, GEMINI_MODEL};
use serde::Deserialize;

use crate::error::{to_env_var, ConfigError};

/// Honored when no key is configured under the `EPHEMERAL` prefix
pub const GOOGLE_API_KEY: &str = "GOOGLE_API_KEY";

#[derive(Debug, Deserialize)]
pub struct ProviderSettings {
    #[serde(default = "default_host")]
    pub host: String,
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<i32>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

impl ProviderSettings {
    pub fn into_config(self) -> GeminiProviderConfig {
        GeminiProviderConfig {
            host: self.host,
            api_key: self.api_key,
            model: self.model,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            // 0 means no timeout
            timeout: self
                .timeout_secs
                .filter(|secs| *secs > 0)
                .map(Duration::from_secs),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LabelSettings {
    #[serde(default = "default_user_label")]
    pub user: String,
    #[serde(default = "default_assistant_label")]
    pub assistant: String,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            user: default_user_label(),
            assistant: default_assistant_label(),
        }
    }
}

impl From<LabelSettings> for SpeakerLabels {
    fn from(labels: LabelSettings) -> Self {
        SpeakerLabels::new(labels.user, labels.assistant)
    }
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub provider: ProviderSettings,
    #[serde(default)]
    pub labels: LabelSettings,
}

impl Settings {
    /// Layers, lowest first: defaults, the settings file, `EPHEMERAL_*`
    /// variables, then `overrides` (dotted keys, e.g. from the command line).
    ///
    /// An explicit `config_file` must exist; the default one is optional.
    pub fn load(
        config_file: Option<&Path>,
        overrides: &[(&str, String)],
    ) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .set_default("provider.host", default_host())?
            .set_default("provider.model", default_model())?
            .set_default("labels.user", default_user_label())?
            .set_default("labels.assistant", default_assistant_label())?;

        if let Ok(key) = env::var(GOOGLE_API_KEY) {
            builder = builder.set_default("provider.api_key", key)?;
        }

        match config_file {
            Some(path) => {
                builder = builder.add_source(File::from(path).format(FileFormat::Toml));
            }
            None => {
                if let Some(path) = default_config_path() {
                    builder = builder.add_source(
                        File::from(path)
                            .format(FileFormat::Toml)
                            .required(false),
                    );
                }
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("EPHEMERAL")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        for (key, value) in overrides {
            builder = builder.set_override(*key, value.as_str())?;
        }

        let config = builder.build()?;

        // An empty key is as good as none
        match config.get_string("provider.api_key") {
            Ok(key) if !key.trim().is_empty() => {}
            Ok(_) | Err(config::ConfigError::NotFound(_)) => {
                return Err(ConfigError::MissingEnvVar {
                    env_var: to_env_var("provider.api_key"),
                })
            }
            Err(err) => return Err(ConfigError::Other(err)),
        }

        let result: Result<Self, config::ConfigError> = config.try_deserialize();
        match result {
            Ok(settings) => Ok(settings),
            Err(err) => {
                tracing::debug!("Configuration error: {:?}", &err);

                let error_str = err.to_string();
                if error_str.starts_with("missing field") {
                    let field = error_str
                        .trim_start_matches("missing field `")
                        .trim_end_matches('`');
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else if let config::ConfigError::NotFound(field) = &err {
                    Err(ConfigError::MissingEnvVar {
                        env_var: to_env_var(field),
                    })
                } else {
                    Err(ConfigError::Other(err))
                }
            }
        }
    }
}

/// `~/.config/ephemeral/config.toml` on Linux, the platform equivalent elsewhere
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ephemeral").join("config.toml"))
}

fn default_host() -> String {
    GEMINI_HOST.to_string()
}

fn default_model() -> String {
    GEMINI_MODEL.to_string()
}

fn default_user_label() -> String {
    "You".to_string()
}

fn default_assistant_label() -> String {
    "🤖".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::fs;
    use tempfile::TempDir;

    fn clean_env() {
        for (key, _) in env::vars() {
            if key.starts_with("EPHEMERAL_") {
                env::remove_var(&key);
            }
        }
        env::remove_var(GOOGLE_API_KEY);
    }

    fn settings_file(dir: &TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("config.toml");
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    #[serial]
    fn test_default_settings() {
        clean_env();
        let dir = TempDir::new().unwrap();
        let path = settings_file(&dir, "");
        env::set_var("EPHEMERAL_PROVIDER__API_KEY", "test-key");

        let settings = Settings::load(Some(&path), &[]).unwrap();
        assert_eq!(settings.provider.host, GEMINI_HOST);
        assert_eq!(settings.provider.api_key, "test-key");
        assert_eq!(settings.provider.model, GEMINI_MODEL);
        assert_eq!(settings.provider.temperature, None);
        assert_eq!(settings.provider.timeout_secs, None);
        assert_eq!(settings.labels.user, "You");
        assert_eq!(settings.labels.assistant, "🤖");

        env::remove_var("EPHEMERAL_PROVIDER__API_KEY");
    }

    #[test]
    #[serial]
    fn test_missing_api_key() {
        clean_env();
        let dir = TempDir::new().unwrap();
        let path = settings_file(&dir, "");

        match Settings::load(Some(&path), &[]) {
            Err(ConfigError::MissingEnvVar { env_var }) => {
                assert_eq!(env_var, "EPHEMERAL_PROVIDER__API_KEY")
            }
            other => panic!("Expected MissingEnvVar, got {:?}", other),
        }
    }

    #[test]
    #[serial]
    fn test_google_api_key_fallback() {
        clean_env();
        let dir = TempDir::new().unwrap();
        let path = settings_file(&dir, "");
        env::set_var(GOOGLE_API_KEY, "google-key");

        let settings = Settings::load(Some(&path), &[]).unwrap();
        assert_eq!(settings.provider.api_key, "google-key");

        env::set_var("EPHEMERAL_PROVIDER__API_KEY", "prefixed-key");
        let settings = Settings::load(Some(&path), &[]).unwrap();
        assert_eq!(settings.provider.api_key, "prefixed-key");

        clean_env();
    }

    #[test]
    #[serial]
    fn test_file_then_environment_then_overrides() {
        clean_env();
        let dir = TempDir::new().unwrap();
        let path = settings_file(
            &dir,
            r#"
[provider]
api_key = "file-key"
model = "gemini-file"
temperature = 0.2
timeout_secs = 30

[labels]
assistant = "Gemini"
"#,
        );
        env::set_var("EPHEMERAL_PROVIDER__MODEL", "gemini-env");
        env::set_var("EPHEMERAL_PROVIDER__MAX_TOKENS", "2000");

        let settings = Settings::load(Some(&path), &[]).unwrap();
        assert_eq!(settings.provider.api_key, "file-key");
        assert_eq!(settings.provider.model, "gemini-env");
        assert_eq!(settings.provider.temperature, Some(0.2));
        assert_eq!(settings.provider.max_tokens, Some(2000));
        assert_eq!(settings.labels.user, "You");
        assert_eq!(settings.labels.assistant, "Gemini");

        let config = settings.provider.into_config();
        assert_eq!(config.timeout, Some(Duration::from_secs(30)));

        env::set_var("EPHEMERAL_PROVIDER__TIMEOUT_SECS", "0");
        let settings = Settings::load(Some(&path), &[]).unwrap();
        assert_eq!(settings.provider.timeout_secs, Some(0));
        assert_eq!(settings.provider.into_config().timeout, None);

        let settings = Settings::load(
            Some(&path),
            &[("provider.model", "gemini-flag".to_string())],
        )
        .unwrap();
        assert_eq!(settings.provider.model, "gemini-flag");

        clean_env();
    }

    #[test]
    #[serial]
    fn test_explicit_file_must_exist() {
        clean_env();
        env::set_var("EPHEMERAL_PROVIDER__API_KEY", "test-key");
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.toml");

        assert!(matches!(
            Settings::load(Some(&missing), &[]),
            Err(ConfigError::Other(_))
        ));

        clean_env();
    }
}
