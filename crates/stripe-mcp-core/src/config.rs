use derive_builder::Builder;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const DEFAULT_API_BASE: &str = "https://api.stripe.com";

#[derive(Debug)]
pub enum ConfigError {
    MissingApiKey,
    Invalid(String),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ConfigError::MissingApiKey => write!(f, "STRIPE_API_KEY required"),
            ConfigError::Invalid(e) => write!(f, "invalid configuration: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<derive_builder::UninitializedFieldError> for ConfigError {
    fn from(e: derive_builder::UninitializedFieldError) -> Self {
        if e.field_name() == "api_key" {
            ConfigError::MissingApiKey
        } else {
            ConfigError::Invalid(e.to_string())
        }
    }
}

/// Runtime settings for one server process.
#[derive(Builder, Debug, Clone)]
#[builder(
    setter(into),
    build_fn(validate = "Self::validate", error = "ConfigError")
)]
pub struct Config {
    /// Stripe secret key, sent as a bearer token.
    pub api_key: String,
    #[builder(default = "DEFAULT_API_BASE.to_string()")]
    pub api_base: String,
    #[builder(default = "\"mcp-server-stripe\".to_string()")]
    pub server_name: String,
    #[builder(default = "env!(\"CARGO_PKG_VERSION\").to_string()")]
    pub server_version: String,
    /// Check the key against Stripe before serving.
    #[builder(default = "true")]
    pub verify_credentials: bool,
    #[builder(default = "30")]
    pub request_timeout_secs: u64,
    #[builder(default, setter(into, strip_option))]
    pub audit_db: Option<PathBuf>,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

impl ConfigBuilder {
    fn validate(&self) -> Result<(), ConfigError> {
        match &self.api_key {
            Some(key) if !key.trim().is_empty() => {}
            _ => return Err(ConfigError::MissingApiKey),
        }
        if let Some(base) = &self.api_base {
            if !(base.starts_with("http://") || base.starts_with("https://")) {
                return Err(ConfigError::Invalid(format!(
                    "api base must be an http(s) url: {}",
                    base
                )));
            }
        }
        if self.request_timeout_secs == Some(0) {
            return Err(ConfigError::Invalid("timeout must be positive".into()));
        }
        Ok(())
    }
}
