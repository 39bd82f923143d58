use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;

/// Environment variable holding the shared secret, applied last.
pub const AUTH_TOKEN_VAR: &str = "AUTH_TOKEN";

/// Application configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Shared-secret authentication
    pub security: SecurityConfig,
    /// AWS SNS provider configuration
    pub aws_sns: AwsSnsConfig,
    /// Fan-out configuration
    pub dispatch: DispatchConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    /// Server host (default: 0.0.0.0)
    pub host: String,
    /// Server port (default: 3000)
    pub port: u16,
}

/// Security configuration
#[derive(Deserialize, Serialize, Clone)]
pub struct SecurityConfig {
    /// Token every request must present in its `authToken` field
    pub auth_token: String,
    /// Maximum request body size in bytes (default: 1MB)
    pub max_body_size: usize,
}

/// AWS SNS provider configuration
#[derive(Deserialize, Serialize, Clone)]
pub struct AwsSnsConfig {
    /// AWS Region (default: ap-southeast-2)
    pub region: String,
    /// Attempts per publish, including the first (default: 10)
    pub max_attempts: u32,
    /// Static AWS Access Key ID; the default credential chain is used when unset
    pub access_key_id: Option<String>,
    /// Static AWS Secret Access Key
    pub secret_access_key: Option<String>,
    /// Alphanumeric sender id, where the destination country supports it
    pub sender_id: Option<String>,
    /// SMS type attribute (default: Transactional)
    pub sms_type: String,
}

/// Dispatch configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DispatchConfig {
    /// Sends in flight per request (default: 4)
    pub max_concurrency: usize,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level (default: info)
    pub level: String,
    /// Log format: json or pretty (default: json)
    pub format: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            auth_token: String::new(),
            max_body_size: 1024 * 1024, // 1MB
        }
    }
}

impl Default for AwsSnsConfig {
    fn default() -> Self {
        Self {
            region: sms_aws_sns::DEFAULT_REGION.to_string(),
            max_attempts: sms_aws_sns::DEFAULT_MAX_ATTEMPTS,
            access_key_id: None,
            secret_access_key: None,
            sender_id: None,
            sms_type: sms_aws_sns::DEFAULT_SMS_TYPE.to_string(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_concurrency: sms_web_generic::DEFAULT_MAX_CONCURRENCY,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "json".to_string(),
        }
    }
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("auth_token", &redact(Some(&self.auth_token)))
            .field("max_body_size", &self.max_body_size)
            .finish()
    }
}

impl fmt::Debug for AwsSnsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsSnsConfig")
            .field("region", &self.region)
            .field("max_attempts", &self.max_attempts)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &redact(self.secret_access_key.as_ref()))
            .field("sender_id", &self.sender_id)
            .field("sms_type", &self.sms_type)
            .finish()
    }
}

fn redact(secret: Option<&String>) -> &'static str {
    match secret {
        Some(s) if !s.is_empty() => "<redacted>",
        _ => "<unset>",
    }
}

impl AwsSnsConfig {
    /// Static key pair, when both halves are configured.
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) => Some((id.as_str(), secret.as_str())),
            _ => None,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = Config::builder()
            // Start with default configuration
            .add_source(Config::try_from(&AppConfig::default())?)
            // Add configuration file based on environment
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", run_mode)).required(false))
            // Add local configuration file (gitignored)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with SMSRELAY__)
            .add_source(Environment::with_prefix("SMSRELAY").separator("__"))
            .set_override_option("security.auth_token", env::var(AUTH_TOKEN_VAR).ok())?
            .build()?;

        Self::from_config(s)
    }

    /// Deserialize and validate an already assembled configuration.
    pub fn from_config(config: Config) -> Result<Self, ConfigError> {
        let app: AppConfig = config.try_deserialize()?;
        app.validate()?;
        Ok(app)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.security.auth_token.is_empty() {
            return Err(ConfigError::Message(format!(
                "security.auth_token is required (set {})",
                AUTH_TOKEN_VAR
            )));
        }
        if self.aws_sns.max_attempts == 0 {
            return Err(ConfigError::Message(
                "aws_sns.max_attempts must be at least 1".into(),
            ));
        }
        if self.dispatch.max_concurrency == 0 {
            return Err(ConfigError::Message(
                "dispatch.max_concurrency must be at least 1".into(),
            ));
        }
        if self.aws_sns.access_key_id.is_some() != self.aws_sns.secret_access_key.is_some() {
            return Err(ConfigError::Message(
                "aws_sns.access_key_id and aws_sns.secret_access_key must be set together".into(),
            ));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            security: SecurityConfig::default(),
            aws_sns: AwsSnsConfig::default(),
            dispatch: DispatchConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}
