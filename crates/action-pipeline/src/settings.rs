//! Pipeline settings: defaults, then an optional YAML file, then
//! `SOUL_ACTIONS__*` environment overrides.

use crate::compiler::DEFAULT_ACCESS_DENIED;
use crate::errors::SettingsError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

pub const ENV_PREFIX: &str = "SOUL_ACTIONS__";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineSettings {
    pub access_denied_message: String,
    pub http: HttpSettings,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            access_denied_message: DEFAULT_ACCESS_DENIED.to_string(),
            http: HttpSettings::default(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub max_body_bytes: usize,
    /// Include the raw error text in unrecovered error responses.
    pub expose_error_details: bool,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            max_body_bytes: 1024 * 1024,
            expose_error_details: false,
        }
    }
}

impl PipelineSettings {
    pub fn from_yaml_str(text: &str) -> Result<Self, SettingsError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(text).map_err(|err| SettingsError::Invalid(err.to_string()))
    }

    pub fn from_file(path: &Path) -> Result<Self, SettingsError> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| SettingsError::Io(format!("{}: {err}", path.display())))?;
        Self::from_yaml_str(&text)
    }

    /// Applies `SOUL_ACTIONS__*` pairs; keys without the prefix are ignored.
    pub fn apply_env<I>(&mut self, vars: I) -> Result<(), SettingsError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        for (key, value) in vars {
            let Some(path) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match path {
                "ACCESS_DENIED_MESSAGE" => self.access_denied_message = value,
                "HTTP__MAX_BODY_BYTES" => {
                    self.http.max_body_bytes = value
                        .trim()
                        .parse()
                        .map_err(|_| SettingsError::InvalidValue(format!("{key}={value}")))?;
                }
                "HTTP__EXPOSE_ERROR_DETAILS" => {
                    self.http.expose_error_details = parse_bool(&value)
                        .ok_or_else(|| SettingsError::InvalidValue(format!("{key}={value}")))?;
                }
                other => return Err(SettingsError::UnsupportedPath(other.to_string())),
            }
            debug!(key = %key, "settings override applied from environment");
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        if self.http.max_body_bytes == 0 {
            return Err(SettingsError::InvalidValue(
                "http.max_body_bytes must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Loads settings. A `path` that does not exist falls back to defaults.
pub fn load_settings(path: Option<&Path>) -> Result<PipelineSettings, SettingsError> {
    let mut settings = match path {
        Some(path) if path.exists() => PipelineSettings::from_file(path)?,
        Some(path) => {
            debug!(path = %path.display(), "settings file not found, using defaults");
            PipelineSettings::default()
        }
        None => PipelineSettings::default(),
    };
    settings.apply_env(std::env::vars())?;
    settings.validate()?;
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn defaults_match_documented_values() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.access_denied_message, "Access denied");
        assert_eq!(settings.http.max_body_bytes, 1_048_576);
        assert!(!settings.http.expose_error_details);
    }

    #[test]
    fn partial_yaml_keeps_other_defaults() {
        let settings = PipelineSettings::from_yaml_str("http:\n  expose_error_details: true\n")
            .expect("parse");
        assert!(settings.http.expose_error_details);
        assert_eq!(settings.http.max_body_bytes, 1_048_576);
        assert_eq!(settings.access_denied_message, "Access denied");
        assert_eq!(
            PipelineSettings::from_yaml_str("  \n").unwrap(),
            PipelineSettings::default()
        );
    }

    #[test]
    fn env_pairs_override_and_reject_unknown_keys() {
        let mut settings = PipelineSettings::default();
        settings
            .apply_env(pairs(&[
                ("PATH", "/usr/bin"),
                ("SOUL_ACTIONS__ACCESS_DENIED_MESSAGE", "Nope"),
                ("SOUL_ACTIONS__HTTP__MAX_BODY_BYTES", "2048"),
                ("SOUL_ACTIONS__HTTP__EXPOSE_ERROR_DETAILS", "yes"),
            ]))
            .unwrap();
        assert_eq!(settings.access_denied_message, "Nope");
        assert_eq!(settings.http.max_body_bytes, 2048);
        assert!(settings.http.expose_error_details);

        let err = settings
            .apply_env(pairs(&[("SOUL_ACTIONS__HTTP__PORT", "80")]))
            .unwrap_err();
        assert!(matches!(err, SettingsError::UnsupportedPath(ref p) if p == "HTTP__PORT"));

        let err = settings
            .apply_env(pairs(&[("SOUL_ACTIONS__HTTP__MAX_BODY_BYTES", "lots")]))
            .unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue(_)));
    }

    #[test]
    #[serial]
    fn load_layers_file_then_environment() {
        let mut file = tempfile::NamedTempFile::new().expect("tmp");
        writeln!(file, "access_denied_message: Forbidden here").unwrap();
        writeln!(file, "http:").unwrap();
        writeln!(file, "  max_body_bytes: 4096").unwrap();

        std::env::set_var("SOUL_ACTIONS__HTTP__MAX_BODY_BYTES", "8192");
        let loaded = load_settings(Some(file.path()));
        std::env::remove_var("SOUL_ACTIONS__HTTP__MAX_BODY_BYTES");

        let settings = loaded.expect("load");
        assert_eq!(settings.access_denied_message, "Forbidden here");
        assert_eq!(settings.http.max_body_bytes, 8192);
    }

    #[test]
    #[serial]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let settings = load_settings(Some(&dir.path().join("absent.yaml"))).expect("load");
        assert_eq!(settings, PipelineSettings::default());
    }

    #[test]
    #[serial]
    fn zero_body_limit_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().expect("tmp");
        writeln!(file, "http: {{ max_body_bytes: 0 }}").unwrap();
        let err = load_settings(Some(file.path())).unwrap_err();
        assert!(matches!(err, SettingsError::InvalidValue(_)));
    }
}
