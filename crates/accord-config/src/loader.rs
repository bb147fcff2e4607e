//! Configuration loader with layered approach.
//!
//! This module provides the [`ConfigLoader`] for loading configuration from
//! multiple sources: defaults, files, and environment variables.

use std::env;
use std::fs;
use std::path::Path;

use serde_json::Value;

use crate::{AccordConfig, ConfigError, ErrorFormat};

/// Configuration loader with layered approach.
///
/// The loader applies configuration in layers, with later layers overriding
/// earlier ones:
/// 1. Default values (or a preset)
/// 2. Configuration files (TOML or JSON), in the order they are added
/// 3. Environment variables
///
/// File layers are merged key by key, so a file only needs to name the
/// values it changes.
///
/// # Example
///
/// ```no_run
/// use accord_config::ConfigLoader;
///
/// # fn main() -> Result<(), accord_config::ConfigError> {
/// let config = ConfigLoader::new()
///     .with_defaults()
///     .with_file("accord.toml")?
///     .with_env_prefix("ACCORD")
///     .load()?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ConfigLoader {
    config: AccordConfig,
    env_prefix: Option<String>,
    env_vars: Option<Vec<(String, String)>>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader starting from the defaults.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: AccordConfig::default(),
            env_prefix: None,
            env_vars: None,
        }
    }

    /// Start with default configuration values.
    ///
    /// This is called automatically by `new()`, but can be chained for clarity.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        self.config = AccordConfig::default();
        self
    }

    /// Start with the development preset.
    ///
    /// ```
    /// use accord_config::ConfigLoader;
    ///
    /// let config = ConfigLoader::new().with_development().load().unwrap();
    /// assert_eq!(config.logging.level, "debug");
    /// ```
    #[must_use]
    pub fn with_development(mut self) -> Self {
        self.config = AccordConfig::development();
        self
    }

    /// Start with the production preset.
    #[must_use]
    pub fn with_production(mut self) -> Self {
        self.config = AccordConfig::production();
        self
    }

    /// Merge a configuration file over the current values.
    ///
    /// The format is chosen by extension: `.toml` or `.json`.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - The file does not exist
    /// - The file cannot be read
    /// - The file contains invalid TOML/JSON
    /// - The file contains unknown fields or values of the wrong type
    pub fn with_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::read_error(path, e))?;

        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_lowercase)
            .unwrap_or_default();
        self.with_string(&content, &extension)
    }

    /// Like [`with_file`](Self::with_file), but a missing file is skipped.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the file exists but cannot be loaded.
    pub fn with_optional_file<P: AsRef<Path>>(self, path: P) -> Result<Self, ConfigError> {
        if path.as_ref().exists() {
            self.with_file(path)
        } else {
            Ok(self)
        }
    }

    /// Merge configuration text in the given format (`"toml"` or `"json"`).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if parsing or merging fails.
    ///
    /// # Example
    ///
    /// ```
    /// use accord_config::ConfigLoader;
    ///
    /// let toml = r#"
    ///     [dispatch]
    ///     base_path = "/api"
    /// "#;
    ///
    /// let config = ConfigLoader::new()
    ///     .with_string(toml, "toml")
    ///     .unwrap()
    ///     .load()
    ///     .unwrap();
    ///
    /// assert_eq!(config.dispatch.base_path, "/api");
    /// assert!(config.logging.json_format);
    /// ```
    pub fn with_string(mut self, content: &str, format: &str) -> Result<Self, ConfigError> {
        let layer: Value = match format.to_lowercase().as_str() {
            "toml" => {
                let parsed: toml::Value = toml::from_str(content)?;
                serde_json::to_value(parsed).map_err(ConfigError::Shape)?
            }
            "json" => serde_json::from_str(content)?,
            other => return Err(ConfigError::UnsupportedFormat(other.to_string())),
        };
        self.merge_layer(layer)?;
        Ok(self)
    }

    /// Set environment variable prefix for overrides.
    ///
    /// Environment variables use the format `PREFIX__SECTION__KEY`.
    /// For example, with prefix "ACCORD":
    /// - `ACCORD__DISPATCH__BASE_PATH=/api`
    /// - `ACCORD__CLIENT__HEADERS__X_API_KEY=secret` (sent as `x-api-key`)
    /// - `ACCORD__LOGGING__LEVEL=debug`
    #[must_use]
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = Some(prefix.to_uppercase());
        self
    }

    /// Read overrides from these variables instead of the process
    /// environment. Only applied when a prefix is set.
    #[must_use]
    pub fn with_env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env_vars = Some(
            vars.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        );
        self
    }

    /// Load a `.env` file into the process environment, if there is one.
    #[must_use]
    pub fn with_dotenv(self) -> Self {
        // a missing .env is not an error
        let _ = dotenvy::dotenv();
        self
    }

    /// Finalize and return the loaded configuration.
    ///
    /// Applies environment variable overrides (if a prefix was set) and
    /// validates the final configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if an environment variable cannot be applied or
    /// validation fails.
    pub fn load(mut self) -> Result<AccordConfig, ConfigError> {
        if let Some(prefix) = self.env_prefix.take() {
            self.apply_env_overrides(&prefix)?;
        }

        self.config.validate()?;

        Ok(self.config)
    }

    /// Finalize without environment overrides or validation.
    #[must_use]
    pub fn load_unvalidated(self) -> AccordConfig {
        self.config
    }

    fn merge_layer(&mut self, layer: Value) -> Result<(), ConfigError> {
        let mut current = serde_json::to_value(&self.config).map_err(ConfigError::Shape)?;
        merge(&mut current, layer);
        self.config = serde_json::from_value(current).map_err(ConfigError::Shape)?;
        Ok(())
    }

    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        let mut vars: Vec<(String, String)> = match self.env_vars.take() {
            Some(vars) => vars,
            None => env::vars().collect(),
        };
        let marker = format!("{prefix}__");
        vars.retain(|(key, _)| key.starts_with(&marker));
        vars.sort();

        for (key, value) in vars {
            self.apply_env_var(&key, &value, &marker)?;
        }

        Ok(())
    }

    fn apply_env_var(&mut self, key: &str, value: &str, marker: &str) -> Result<(), ConfigError> {
        let rest = key
            .strip_prefix(marker)
            .ok_or_else(|| ConfigError::env_parse_error(key, "invalid key format"))?;
        let parts: Vec<&str> = rest.split("__").collect();

        let dispatch = &mut self.config.dispatch;
        let client = &mut self.config.client;
        let logging = &mut self.config.logging;

        match parts.as_slice() {
            ["DISPATCH", "BASE_PATH"] => dispatch.base_path = value.to_string(),
            ["DISPATCH", "JSON_QUERY"] => dispatch.json_query = bool_var(key, value)?,
            ["DISPATCH", "RESPONSE_VALIDATION"] => {
                dispatch.response_validation = bool_var(key, value)?;
            }
            ["DISPATCH", "VALIDATION_ERROR_FORMAT"] => {
                dispatch.validation_error_format = match value.to_lowercase().as_str() {
                    "default" => ErrorFormat::Default,
                    "combined" => ErrorFormat::Combined,
                    _ => {
                        return Err(ConfigError::env_parse_error(
                            key,
                            "expected 'default' or 'combined'",
                        ))
                    }
                };
            }
            ["DISPATCH", "MAX_BODY_SIZE"] => dispatch.max_body_size = optional_var(key, value)?,
            ["DISPATCH", "MULTIPART", "MAX_FIELD_SIZE"] => {
                dispatch.multipart.max_field_size = int_var(key, value)?;
            }
            ["DISPATCH", "MULTIPART", "MAX_FIELDS"] => {
                dispatch.multipart.max_fields = int_var(key, value)?;
            }
            ["DISPATCH", "REQUEST_TIMEOUT_MS"] => {
                dispatch.request_timeout_ms = optional_var(key, value)?;
            }

            ["CLIENT", "BASE_URL"] => client.base_url = value.to_string(),
            ["CLIENT", "JSON_QUERY"] => client.json_query = bool_var(key, value)?,
            ["CLIENT", "THROW_ON_UNKNOWN_STATUS"] => {
                client.throw_on_unknown_status = bool_var(key, value)?;
            }
            ["CLIENT", "VALIDATE_RESPONSE"] => client.validate_response = bool_var(key, value)?,
            ["CLIENT", "TIMEOUT_MS"] => client.timeout_ms = optional_var(key, value)?,
            ["CLIENT", "HEADERS", name] if !name.is_empty() => {
                client
                    .headers
                    .insert(name.to_lowercase().replace('_', "-"), value.to_string());
            }

            ["LOGGING", "ENABLED"] => logging.enabled = bool_var(key, value)?,
            ["LOGGING", "LEVEL"] => logging.level = value.to_string(),
            ["LOGGING", "JSON_FORMAT"] => logging.json_format = bool_var(key, value)?,
            ["LOGGING", "SPAN_EVENTS"] => logging.span_events = bool_var(key, value)?,
            ["LOGGING", "FILE_LINE_INFO"] => logging.file_line_info = bool_var(key, value)?,
            ["LOGGING", "THREAD_IDS"] => logging.thread_ids = bool_var(key, value)?,
            ["LOGGING", "INCLUDE_TARGET"] => logging.include_target = bool_var(key, value)?,
            ["LOGGING", "SERVICE_NAME"] => logging.service_name = value.to_string(),

            _ => {
                return Err(ConfigError::env_parse_error(key, "unknown configuration key"));
            }
        }

        Ok(())
    }
}

/// Deep-merges `layer` into `base`: objects merge key by key, anything else
/// replaces.
fn merge(base: &mut Value, layer: Value) {
    match (base, layer) {
        (Value::Object(base), Value::Object(layer)) => {
            for (key, value) in layer {
                match base.get_mut(&key) {
                    Some(existing) => merge(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (base, layer) => *base = layer,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn bool_var(key: &str, value: &str) -> Result<bool, ConfigError> {
    parse_bool(value).ok_or_else(|| ConfigError::env_parse_error(key, "expected boolean"))
}

fn int_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer"))
}

fn optional_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<Option<T>, ConfigError> {
    if value.is_empty() || value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    value
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::env_parse_error(key, "expected integer or 'none'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn temp_file(suffix: &str, content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_only() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, AccordConfig::default());
    }

    #[test]
    fn test_toml_file_merges_over_defaults() {
        let file = temp_file(
            ".toml",
            r#"
                [dispatch]
                base_path = "/api"
                json_query = true

                [dispatch.multipart]
                max_fields = 5

                [client.headers]
                x-api-key = "k"
            "#,
        );

        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.dispatch.base_path, "/api");
        assert!(config.dispatch.json_query);
        assert_eq!(config.dispatch.multipart.max_fields, 5);
        assert_eq!(
            config.dispatch.multipart.max_field_size,
            crate::DEFAULT_MAX_FIELD_SIZE
        );
        assert_eq!(config.dispatch.max_body_size, Some(crate::DEFAULT_MAX_BODY_SIZE));
        assert_eq!(config.client.headers["x-api-key"], "k");
    }

    #[test]
    fn test_json_file_and_null_clears_option() {
        let file = temp_file(
            ".json",
            r#"{"dispatch": {"max_body_size": null, "validation_error_format": "default"}}"#,
        );
        let config = ConfigLoader::new().with_file(file.path()).unwrap().load().unwrap();
        assert_eq!(config.dispatch.max_body_size, None);
        assert_eq!(config.dispatch.validation_error_format, ErrorFormat::Default);
    }

    #[test]
    fn test_later_files_win() {
        let first = temp_file(".toml", "[client]\nbase_url = \"http://a\"\njson_query = true\n");
        let second = temp_file(".toml", "[client]\nbase_url = \"http://b\"\n");
        let config = ConfigLoader::new()
            .with_file(first.path())
            .unwrap()
            .with_file(second.path())
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.client.base_url, "http://b");
        assert!(config.client.json_query);
    }

    #[test]
    fn test_env_overrides_file() {
        let file = temp_file(".toml", "[dispatch]\nbase_path = \"/api\"\n");
        let config = ConfigLoader::new()
            .with_file(file.path())
            .unwrap()
            .with_env_prefix("accord")
            .with_env_vars([
                ("ACCORD__DISPATCH__BASE_PATH", "/v2"),
                ("ACCORD__DISPATCH__REQUEST_TIMEOUT_MS", "1500"),
                ("ACCORD__CLIENT__HEADERS__X_API_KEY", "secret"),
                ("ACCORD__LOGGING__LEVEL", "warn"),
                ("OTHER__DISPATCH__BASE_PATH", "/ignored"),
            ])
            .load()
            .unwrap();
        assert_eq!(config.dispatch.base_path, "/v2");
        assert_eq!(config.dispatch.request_timeout_ms, Some(1500));
        assert_eq!(config.client.headers["x-api-key"], "secret");
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_env_errors() {
        let err = ConfigLoader::new()
            .with_env_prefix("ACCORD")
            .with_env_vars([("ACCORD__DISPATCH__JSON_QUERY", "maybe")])
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::EnvParseError { .. }));

        let err = ConfigLoader::new()
            .with_env_prefix("ACCORD")
            .with_env_vars([("ACCORD__DISPATCH__NOPE", "1")])
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("ACCORD__DISPATCH__NOPE"));
    }

    #[test]
    fn test_env_none_clears_option() {
        let config = ConfigLoader::new()
            .with_env_prefix("ACCORD")
            .with_env_vars([("ACCORD__DISPATCH__MAX_BODY_SIZE", "none")])
            .load()
            .unwrap();
        assert_eq!(config.dispatch.max_body_size, None);
    }

    #[test]
    fn test_file_errors() {
        assert!(matches!(
            ConfigLoader::new().with_file("/nonexistent/accord.toml"),
            Err(ConfigError::FileNotFound { .. })
        ));

        let file = temp_file(".yaml", "dispatch: {}");
        assert!(matches!(
            ConfigLoader::new().with_file(file.path()),
            Err(ConfigError::UnsupportedFormat(_))
        ));

        let file = temp_file(".toml", "[dispatch]\nunknown = 1\n");
        assert!(matches!(
            ConfigLoader::new().with_file(file.path()),
            Err(ConfigError::Shape(_))
        ));

        let file = temp_file(".toml", "[dispatch\n");
        assert!(matches!(
            ConfigLoader::new().with_file(file.path()),
            Err(ConfigError::TomlError(_))
        ));
    }

    #[test]
    fn test_optional_file_missing() {
        let config = ConfigLoader::new()
            .with_optional_file("/nonexistent/accord.toml")
            .unwrap()
            .load()
            .unwrap();
        assert!(config.dispatch.base_path.is_empty());
    }

    #[test]
    fn test_load_validates() {
        let err = ConfigLoader::new()
            .with_string(r#"{"dispatch": {"base_path": "api"}}"#, "json")
            .unwrap()
            .load()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));
    }

    #[test]
    fn test_presets_as_base_layer() {
        let config = ConfigLoader::new()
            .with_production()
            .with_string("[logging]\nlevel = \"warn\"\n", "toml")
            .unwrap()
            .load()
            .unwrap();
        assert_eq!(config.logging.level, "warn");
        assert!(config.dispatch.response_validation);
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
