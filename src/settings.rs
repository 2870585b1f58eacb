use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::{env, fmt, str::FromStr};
use zeroize::Zeroizing;

use crate::entities::image::ImageFolder;

pub const DEFAULT_MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

/// Order of effects when an update replaces an existing remote image.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceOrder {
    /// Delete the old object, then upload the new one.
    #[default]
    DeleteFirst,
    /// Upload the new object and only then delete the old one.
    UploadFirst,
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default)]
    pub database_url: String,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default)]
    pub jwt_secret: String,

    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration_minutes: i64,

    #[serde(default)]
    pub refresh_token_secret: String,

    #[serde(default = "default_refresh_expiration")]
    pub refresh_token_exp_days: i64,

    #[serde(default)]
    pub cloudinary_cloud_name: String,

    #[serde(default)]
    pub cloudinary_api_key: String,

    #[serde(default)]
    pub cloudinary_api_secret: String,

    #[serde(default = "default_cloudinary_api_base")]
    pub cloudinary_api_base: String,

    #[serde(default = "default_media_timeout")]
    pub media_timeout_secs: u64,

    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,

    #[serde(default = "default_post_image_folder")]
    pub post_image_folder: String,

    #[serde(default = "default_project_image_folder")]
    pub project_image_folder: String,

    #[serde(default)]
    pub image_replace_order: ReplaceOrder,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Portfolio-CMS".to_string()
}
fn default_port() -> u16 {
    5000
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_jwt_expiration() -> i64 {
    15
}
fn default_refresh_expiration() -> i64 {
    7
}
fn default_cloudinary_api_base() -> String {
    "https://api.cloudinary.com".to_string()
}
fn default_media_timeout() -> u64 {
    30
}
fn default_max_image_bytes() -> usize {
    DEFAULT_MAX_IMAGE_BYTES
}
fn default_post_image_folder() -> String {
    "blog_images".to_string()
}
fn default_project_image_folder() -> String {
    "project_images".to_string()
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .ignore_empty(true)
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        // Inject critical env values if missing
        config.database_url = fill_or_env(config.database_url, "APP_DATABASE_URL")?;
        config.jwt_secret = fill_or_env(config.jwt_secret, "APP_JWT_SECRET")?;
        config.refresh_token_secret = fill_or_env(config.refresh_token_secret, "APP_REFRESH_TOKEN_SECRET")?;
        config.cloudinary_cloud_name = fill_or_env(config.cloudinary_cloud_name, "CLOUDINARY_CLOUD_NAME")?;
        config.cloudinary_api_key = fill_or_env(config.cloudinary_api_key, "CLOUDINARY_API_KEY")?;
        config.cloudinary_api_secret = fill_or_env(config.cloudinary_api_secret, "CLOUDINARY_API_SECRET")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.database_url.trim().is_empty() {
            errors.push("DATABASE_URL cannot be empty");
        }
        if self.jwt_secret.len() < 32 {
            errors.push("JWT_SECRET must be at least 32 characters");
        }
        if self.refresh_token_secret.len() < 32 {
            errors.push("REFRESH_TOKEN_SECRET must be at least 32 characters");
        }
        if self.cloudinary_cloud_name.trim().is_empty()
            || self.cloudinary_api_key.trim().is_empty()
            || self.cloudinary_api_secret.trim().is_empty()
        {
            errors.push("Cloudinary cloud name, API key and API secret must all be set");
        }
        if self.max_image_bytes == 0 {
            errors.push("MAX_IMAGE_BYTES must be greater than zero");
        }
        if self.post_image_folder.contains('/') || self.project_image_folder.contains('/') {
            errors.push("Image folders must be single path segments");
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn fill_or_env(current: String, env_key: &str) -> Result<String, ConfigError> {
    if current.trim().is_empty() {
        env::var(env_key).map_err(|_| ConfigError::Message(format!("{env_key} must be set")))
    } else {
        Ok(current)
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else if self.len() < 32 {
            "[TOO_SHORT]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("database_url", &self.database_url.redact())
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("jwt_secret", &self.jwt_secret.redact())
            .field("jwt_expiration_minutes", &self.jwt_expiration_minutes)
            .field("refresh_token_secret", &self.refresh_token_secret.redact())
            .field("refresh_token_exp_days", &self.refresh_token_exp_days)
            .field("cloudinary_cloud_name", &self.cloudinary_cloud_name)
            .field("cloudinary_api_key", &"[REDACTED]")
            .field("cloudinary_api_secret", &"[REDACTED]")
            .field("cloudinary_api_base", &self.cloudinary_api_base)
            .field("media_timeout_secs", &self.media_timeout_secs)
            .field("max_image_bytes", &self.max_image_bytes)
            .field("post_image_folder", &self.post_image_folder)
            .field("project_image_folder", &self.project_image_folder)
            .field("image_replace_order", &self.image_replace_order)
            .finish()
    }
}

#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub refresh_encoding: EncodingKey,
    pub refresh_decoding: DecodingKey,
}

impl From<&AppConfig> for JwtKeys {
    fn from(config: &AppConfig) -> Self {
        let jwt_secret = Zeroizing::new(config.jwt_secret.clone());
        let refresh_secret = Zeroizing::new(config.refresh_token_secret.clone());

        JwtKeys {
            encoding: EncodingKey::from_secret(jwt_secret.as_bytes()),
            decoding: DecodingKey::from_secret(jwt_secret.as_bytes()),
            refresh_encoding: EncodingKey::from_secret(refresh_secret.as_bytes()),
            refresh_decoding: DecodingKey::from_secret(refresh_secret.as_bytes()),
        }
    }
}

impl fmt::Debug for JwtKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtKeys")
            .field("encoding", &"[REDACTED]")
            .field("decoding", &"[REDACTED]")
            .field("refresh_encoding", &"[REDACTED]")
            .field("refresh_decoding", &"[REDACTED]")
            .finish()
    }
}

/// Credentials for the Cloudinary upload API.
#[derive(Clone)]
pub struct CloudinaryCredentials {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: Zeroizing<String>,
    pub api_base: String,
    pub timeout_secs: u64,
}

impl From<&AppConfig> for CloudinaryCredentials {
    fn from(config: &AppConfig) -> Self {
        CloudinaryCredentials {
            cloud_name: config.cloudinary_cloud_name.clone(),
            api_key: config.cloudinary_api_key.clone(),
            api_secret: Zeroizing::new(config.cloudinary_api_secret.clone()),
            api_base: config.cloudinary_api_base.trim_end_matches('/').to_string(),
            timeout_secs: config.media_timeout_secs,
        }
    }
}

impl fmt::Debug for CloudinaryCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudinaryCredentials")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &"[REDACTED]")
            .field("api_secret", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Upload ceiling, folder names and replace ordering handed to the entity handlers.
#[derive(Debug, Clone)]
pub struct MediaSettings {
    pub max_image_bytes: usize,
    pub replace_order: ReplaceOrder,
    pub post_folder: ImageFolder,
    pub project_folder: ImageFolder,
}

impl From<&AppConfig> for MediaSettings {
    fn from(config: &AppConfig) -> Self {
        MediaSettings {
            max_image_bytes: config.max_image_bytes,
            replace_order: config.image_replace_order,
            post_folder: ImageFolder::new(config.post_image_folder.clone(), "post"),
            project_folder: ImageFolder::new(config.project_image_folder.clone(), "project"),
        }
    }
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig {
        env: AppEnvironment::Testing,
        name: default_name(),
        port: 0,
        host: default_host(),
        worker_count: 1,
        database_url: "postgres://localhost/portfolio_test".into(),
        cors_allowed_origins: default_cors_origins(),
        jwt_secret: "test-access-secret-that-is-long-enough-0123".into(),
        jwt_expiration_minutes: default_jwt_expiration(),
        refresh_token_secret: "test-refresh-secret-that-is-long-enough-0123".into(),
        refresh_token_exp_days: default_refresh_expiration(),
        cloudinary_cloud_name: "demo".into(),
        cloudinary_api_key: "123456".into(),
        cloudinary_api_secret: "shhh".into(),
        cloudinary_api_base: default_cloudinary_api_base(),
        media_timeout_secs: default_media_timeout(),
        max_image_bytes: DEFAULT_MAX_IMAGE_BYTES,
        post_image_folder: default_post_image_folder(),
        project_image_folder: default_project_image_folder(),
        image_replace_order: ReplaceOrder::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_passes_validation() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn short_secrets_and_missing_cloudinary_are_reported_together() {
        let mut config = test_config();
        config.jwt_secret = "short".into();
        config.cloudinary_api_secret = String::new();

        let message = config.validate().unwrap_err().to_string();
        assert!(message.contains("JWT_SECRET"));
        assert!(message.contains("Cloudinary"));
    }

    #[test]
    fn replace_order_defaults_to_delete_first() {
        assert_eq!(ReplaceOrder::default(), ReplaceOrder::DeleteFirst);
        assert_eq!(MediaSettings::from(&test_config()).post_folder.prefix, "post");
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let rendered = format!("{:?}", test_config());
        assert!(!rendered.contains("test-access-secret"));
        assert!(!rendered.contains("shhh"));
    }
}
