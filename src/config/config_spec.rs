use std::sync::Arc;

use crate::config::EnvironmentProvider;
use crate::config::errors::ConfigError;

/// Specification of one environment-backed setting
///
/// Resolution order is environment variable, then default value.
pub struct ConfigSpec {
    env_provider: Arc<dyn EnvironmentProvider + Send + Sync>,
    env_override: Option<String>,
    default_value: Option<String>,
    required: bool,
    min_length: Option<usize>,
    validator: Option<fn(&str) -> Result<(), String>>,
}

impl ConfigSpec {
    pub fn new(env_provider: Arc<dyn EnvironmentProvider + Send + Sync>) -> Self {
        Self {
            env_provider,
            env_override: None,
            default_value: None,
            required: false,
            min_length: None,
            validator: None,
        }
    }

    pub fn env_override(mut self, name: &str) -> Self {
        self.env_override = Some(name.to_string());
        self
    }

    pub fn default_value(mut self, value: &str) -> Self {
        self.default_value = Some(value.to_string());
        self
    }

    pub fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn min_length(mut self, length: usize) -> Self {
        self.min_length = Some(length);
        self
    }

    pub fn validator(mut self, f: fn(&str) -> Result<(), String>) -> Self {
        self.validator = Some(f);
        self
    }

    fn setting_name(&self) -> String {
        self.env_override.clone().unwrap_or_else(|| "<unnamed>".to_string())
    }

    /// Load the value, or `None` when it is neither set nor defaulted
    pub fn load_optional(&self) -> Result<Option<String>, ConfigError> {
        let setting_name = self.setting_name();

        let value = self
            .env_override
            .as_deref()
            .and_then(|name| self.env_provider.get_var(name))
            .or_else(|| self.default_value.clone());

        match value {
            Some(value) => {
                self.validate_value(&value, &setting_name)?;
                Ok(Some(value))
            }
            None if self.required => Err(ConfigError::MissingRequiredSetting { setting_name }),
            None => Ok(None),
        }
    }

    /// Load the value, failing when it is neither set nor defaulted
    pub fn load(&self) -> Result<String, ConfigError> {
        self.load_optional()?.ok_or_else(|| ConfigError::MissingRequiredSetting {
            setting_name: self.setting_name(),
        })
    }

    /// Validate a setting value according to the ConfigSpec rules
    pub fn validate_value(&self, value: &str, setting_name: &str) -> Result<(), ConfigError> {
        if let Some(min_len) = self.min_length {
            if value.len() < min_len {
                return Err(ConfigError::InvalidSetting {
                    setting_name: setting_name.to_string(),
                    reason: format!("Value must be at least {} characters long", min_len),
                });
            }
        }

        if let Some(validator) = self.validator {
            validator(value).map_err(|reason| ConfigError::InvalidSetting {
                setting_name: setting_name.to_string(),
                reason,
            })?;
        }

        Ok(())
    }
}

impl ConfigSpec {
    /// Parse an integer setting
    pub fn parse_integer(value: &str, setting_name: &str) -> Result<i64, ConfigError> {
        value.trim().parse::<i64>().map_err(|e| ConfigError::ParseError {
            setting_name: setting_name.to_string(),
            error: format!("Expected integer, got '{}': {}", value, e),
        })
    }

    /// Parse a port number; zero is rejected by `validate_port_range` beforehand
    pub fn parse_port(value: &str, setting_name: &str) -> Result<u16, ConfigError> {
        value.trim().parse::<u16>().map_err(|e| ConfigError::ParseError {
            setting_name: setting_name.to_string(),
            error: format!("Expected port number (1-65535), got '{}': {}", value, e),
        })
    }

    /// Validate an integer is within the inclusive range
    pub fn validate_integer_range(value: &str, min: i64, max: i64) -> Result<(), String> {
        let parsed = value
            .trim()
            .parse::<i64>()
            .map_err(|_| format!("Expected integer between {} and {}", min, max))?;

        if parsed < min || parsed > max {
            return Err(format!("Value {} is outside valid range {}-{}", parsed, min, max));
        }

        Ok(())
    }

    /// Validate a port number is within the inclusive range
    pub fn validate_port_range(value: &str, min: u16, max: u16) -> Result<(), String> {
        let parsed = value
            .trim()
            .parse::<u16>()
            .map_err(|_| format!("Expected port number between {} and {}", min, max))?;

        if parsed < min || parsed > max {
            return Err(format!("Port {} is outside valid range {}-{}", parsed, min, max));
        }

        Ok(())
    }

    /// Validate a host address; hostnames are accepted as long as they carry no whitespace
    pub fn validate_host_address(value: &str) -> Result<(), String> {
        if value.is_empty() {
            return Err("Host address cannot be empty".to_string());
        }

        if value.chars().any(char::is_whitespace) {
            return Err("Host address cannot contain whitespace".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MockEnvironment;

    fn env(vars: &[(&str, &str)]) -> Arc<dyn EnvironmentProvider + Send + Sync> {
        Arc::new(MockEnvironment::empty().with_vars(vars))
    }

    #[test]
    fn test_environment_wins_over_default() {
        let value = ConfigSpec::new(env(&[("COLOR", "blue")]))
            .env_override("COLOR")
            .default_value("red")
            .load()
            .unwrap();

        assert_eq!(value, "blue");
    }

    #[test]
    fn test_default_used_when_unset() {
        let value = ConfigSpec::new(env(&[]))
            .env_override("COLOR")
            .default_value("red")
            .load()
            .unwrap();

        assert_eq!(value, "red");
    }

    #[test]
    fn test_required_without_value_fails() {
        let result = ConfigSpec::new(env(&[]))
            .env_override("JWT_SECRET")
            .required(true)
            .load_optional();

        assert_eq!(
            result,
            Err(ConfigError::MissingRequiredSetting {
                setting_name: "JWT_SECRET".to_string()
            })
        );
    }

    #[test]
    fn test_optional_without_value_is_none() {
        let result = ConfigSpec::new(env(&[]))
            .env_override("MAILTRAP_API_TOKEN")
            .load_optional()
            .unwrap();

        assert!(result.is_none());
    }

    #[test]
    fn test_min_length_rejects_short_value() {
        let result = ConfigSpec::new(env(&[("JWT_SECRET", "short")]))
            .env_override("JWT_SECRET")
            .min_length(32)
            .load();

        match result {
            Err(ConfigError::InvalidSetting { setting_name, reason }) => {
                assert_eq!(setting_name, "JWT_SECRET");
                assert!(reason.contains("at least 32 characters"));
            }
            other => panic!("Expected InvalidSetting, got: {:?}", other),
        }
    }

    #[test]
    fn test_range_validators() {
        assert!(ConfigSpec::validate_port_range("8000", 1, 65535).is_ok());
        assert!(ConfigSpec::validate_port_range("0", 1, 65535).is_err());
        assert!(ConfigSpec::validate_integer_range("-1", 0, 10_000).is_err());
        assert!(ConfigSpec::validate_host_address("local host").is_err());
    }
}
