use std::fmt;
use std::sync::Arc;

use crate::config::EnvironmentProvider;
use crate::config::config_spec::ConfigSpec;
use crate::config::errors::ConfigError;

pub const MAILTRAP_SANDBOX_URL: &str = "https://sandbox.api.mailtrap.io/api/send";

/// Business configuration: tokens, mail delivery and membership limits
#[derive(Clone)]
pub struct ApplicationSettings {
    jwt_secret: String,
    token_secret: String,
    jwt_expiration_minutes: i64,
    client_origin: String,
    email_from: String,
    mailtrap_api_token: Option<String>,
    mailtrap_api_url: String,
    free_daily_usage_limit: i32,
    monthly_daily_usage_limit: i32,
}

impl ApplicationSettings {
    /// Load application settings through the given environment provider
    ///
    /// # Errors
    /// * `MissingRequiredSetting` - JWT_SECRET is not set
    /// * `InvalidSetting` / `ParseError` - a value fails validation
    pub fn from_env_provider(env_provider: Arc<dyn EnvironmentProvider + Send + Sync>) -> Result<Self, ConfigError> {
        let jwt_secret = ConfigSpec::new(env_provider.clone())
            .env_override("JWT_SECRET")
            .required(true)
            .min_length(32)
            .load()?;

        let token_secret = ConfigSpec::new(env_provider.clone())
            .env_override("TOKEN_SECRET")
            .min_length(1)
            .load_optional()?
            .unwrap_or_else(|| jwt_secret.clone());

        let jwt_expiration = ConfigSpec::new(env_provider.clone())
            .env_override("TOKEN_EXPIRES_IN_MINUTES")
            .default_value("60")
            .validator(|value| ConfigSpec::validate_integer_range(value, 1, 60 * 24 * 30))
            .load()?;
        let jwt_expiration_minutes = ConfigSpec::parse_integer(&jwt_expiration, "TOKEN_EXPIRES_IN_MINUTES")?;

        let client_origin = ConfigSpec::new(env_provider.clone())
            .env_override("CLIENT_ORIGIN")
            .default_value("http://localhost:3000")
            .min_length(1)
            .load()?;

        let email_from = ConfigSpec::new(env_provider.clone())
            .env_override("EMAIL_FROM")
            .default_value("noreply@ramen.local")
            .min_length(1)
            .load()?;

        let mailtrap_api_token = ConfigSpec::new(env_provider.clone())
            .env_override("MAILTRAP_API_TOKEN")
            .min_length(1)
            .load_optional()?;

        let mailtrap_api_url = ConfigSpec::new(env_provider.clone())
            .env_override("MAILTRAP_API_URL")
            .default_value(MAILTRAP_SANDBOX_URL)
            .min_length(1)
            .load()?;

        let free_limit = ConfigSpec::new(env_provider.clone())
            .env_override("FREE_DAILY_USAGE_LIMIT")
            .default_value("10")
            .validator(|value| ConfigSpec::validate_integer_range(value, 0, i64::from(i32::MAX)))
            .load()?;

        let monthly_limit = ConfigSpec::new(env_provider)
            .env_override("MONTHLY_DAILY_USAGE_LIMIT")
            .default_value("100")
            .validator(|value| ConfigSpec::validate_integer_range(value, 0, i64::from(i32::MAX)))
            .load()?;

        Ok(Self {
            jwt_secret,
            token_secret,
            jwt_expiration_minutes,
            client_origin,
            email_from,
            mailtrap_api_token,
            mailtrap_api_url,
            free_daily_usage_limit: Self::to_limit(&free_limit, "FREE_DAILY_USAGE_LIMIT")?,
            monthly_daily_usage_limit: Self::to_limit(&monthly_limit, "MONTHLY_DAILY_USAGE_LIMIT")?,
        })
    }

    /// Convenience method that uses the system environment provider
    pub fn from_env() -> Result<Self, ConfigError> {
        use crate::config::SystemEnvironment;
        Self::from_env_provider(Arc::new(SystemEnvironment))
    }

    fn to_limit(value: &str, setting_name: &str) -> Result<i32, ConfigError> {
        let parsed = ConfigSpec::parse_integer(value, setting_name)?;
        i32::try_from(parsed).map_err(|e| ConfigError::ParseError {
            setting_name: setting_name.to_string(),
            error: e.to_string(),
        })
    }

    pub fn jwt_secret(&self) -> &str {
        &self.jwt_secret
    }

    /// HMAC key for verification codes and password reset tokens
    pub fn token_secret(&self) -> &str {
        &self.token_secret
    }

    pub fn jwt_expiration_minutes(&self) -> i64 {
        self.jwt_expiration_minutes
    }

    pub fn client_origin(&self) -> &str {
        &self.client_origin
    }

    pub fn email_from(&self) -> &str {
        &self.email_from
    }

    pub fn mailtrap_api_token(&self) -> Option<&str> {
        self.mailtrap_api_token.as_deref()
    }

    pub fn mailtrap_api_url(&self) -> &str {
        &self.mailtrap_api_url
    }

    pub fn free_daily_usage_limit(&self) -> i32 {
        self.free_daily_usage_limit
    }

    pub fn monthly_daily_usage_limit(&self) -> i32 {
        self.monthly_daily_usage_limit
    }
}

impl fmt::Debug for ApplicationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicationSettings")
            .field("jwt_secret", &"[redacted]")
            .field("token_secret", &"[redacted]")
            .field("jwt_expiration_minutes", &self.jwt_expiration_minutes)
            .field("client_origin", &self.client_origin)
            .field("email_from", &self.email_from)
            .field("mailtrap_api_token", &self.mailtrap_api_token.as_ref().map(|_| "[redacted]"))
            .field("mailtrap_api_url", &self.mailtrap_api_url)
            .field("free_daily_usage_limit", &self.free_daily_usage_limit)
            .field("monthly_daily_usage_limit", &self.monthly_daily_usage_limit)
            .finish()
    }
}
