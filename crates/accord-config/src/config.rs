//! Root configuration.

use accord_telemetry::{create_env_filter, LogConfig};
use serde::{Deserialize, Serialize};

use crate::{ClientConfig, ConfigError, DispatchConfig};

/// Complete Accord configuration.
///
/// Use [`ConfigLoader`](crate::ConfigLoader) to layer files and environment
/// variables over the defaults.
///
/// ```
/// use accord_config::AccordConfig;
///
/// let config = AccordConfig::default();
/// assert!(config.dispatch.base_path.is_empty());
/// assert_eq!(config.logging.level, "info");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccordConfig {
    /// Server-side dispatch.
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// Client.
    #[serde(default)]
    pub client: ClientConfig,

    /// Logging.
    #[serde(default)]
    pub logging: LogConfig,
}

impl AccordConfig {
    /// Checks values serde cannot.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dispatch = &self.dispatch;
        if !dispatch.base_path.is_empty() && !dispatch.base_path.starts_with('/') {
            return Err(ConfigError::invalid_value(
                "dispatch.base_path",
                format!("must start with '/': {}", dispatch.base_path),
            ));
        }
        if dispatch.max_body_size == Some(0) {
            return Err(ConfigError::invalid_value(
                "dispatch.max_body_size",
                "must be greater than 0",
            ));
        }
        if dispatch.multipart.max_fields == 0 {
            return Err(ConfigError::invalid_value(
                "dispatch.multipart.max_fields",
                "must be greater than 0",
            ));
        }
        if dispatch.multipart.max_field_size == 0 {
            return Err(ConfigError::invalid_value(
                "dispatch.multipart.max_field_size",
                "must be greater than 0",
            ));
        }
        if dispatch.request_timeout_ms == Some(0) {
            return Err(ConfigError::invalid_value(
                "dispatch.request_timeout_ms",
                "must be greater than 0",
            ));
        }

        let client = &self.client;
        if !client.base_url.is_empty()
            && !(client.base_url.starts_with("http://") || client.base_url.starts_with("https://"))
        {
            return Err(ConfigError::invalid_value(
                "client.base_url",
                format!("expected an http(s) URL: {}", client.base_url),
            ));
        }
        if client.timeout_ms == Some(0) {
            return Err(ConfigError::invalid_value(
                "client.timeout_ms",
                "must be greater than 0",
            ));
        }
        if let Some(name) = client
            .headers
            .keys()
            .find(|name| name.is_empty() || !name.bytes().all(is_token_byte))
        {
            return Err(ConfigError::invalid_value(
                format!("client.headers.{name}"),
                "not a valid header name",
            ));
        }

        if self.logging.enabled {
            create_env_filter(&self.logging.level)
                .map_err(|e| ConfigError::invalid_value("logging.level", e.to_string()))?;
        }

        Ok(())
    }

    /// Local development: pretty debug logs, no response validation.
    #[must_use]
    pub fn development() -> Self {
        Self {
            logging: LogConfig::development(),
            ..Self::default()
        }
    }

    /// Production: JSON logs, response validation on.
    #[must_use]
    pub fn production() -> Self {
        let mut config = Self {
            logging: LogConfig::production(),
            ..Self::default()
        };
        config.dispatch.response_validation = true;
        config
    }
}

fn is_token_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorFormat;

    #[test]
    fn test_defaults_are_valid() {
        let config = AccordConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dispatch.validation_error_format, ErrorFormat::Combined);
        assert!(!config.client.throw_on_unknown_status);
    }

    #[test]
    fn test_presets() {
        let dev = AccordConfig::development();
        assert_eq!(dev.logging.level, "debug");
        assert!(!dev.dispatch.response_validation);
        assert!(dev.validate().is_ok());

        let prod = AccordConfig::production();
        assert!(prod.logging.json_format);
        assert!(prod.dispatch.response_validation);
        assert!(prod.validate().is_ok());
    }

    #[test]
    fn test_validation_failures() {
        let mut config = AccordConfig::default();
        config.dispatch.base_path = "api".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "dispatch.base_path"
        ));

        let mut config = AccordConfig::default();
        config.client.base_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());

        let mut config = AccordConfig::default();
        config.client.headers.insert("bad header".to_string(), "v".to_string());
        assert!(config.validate().is_err());

        let mut config = AccordConfig::default();
        config.logging.level = "=[".to_string();
        assert!(config.validate().is_err());

        let mut config = AccordConfig::default();
        config.dispatch.max_body_size = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let result: Result<AccordConfig, _> = toml::from_str("[dispatch]\nbase_paht = \"/api\"\n");
        assert!(result.is_err());
    }
}
