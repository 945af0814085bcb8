//! Configuration module
//!
//! Every knob of the intake pipeline is read from the environment (optionally
//! seeded from a `.env` file) with typed defaults. `Config::validate` rejects
//! inconsistent combinations at startup.

use std::env;

// Common constants
const SERVER_PORT: u16 = 4000;
const MAX_CONNECTIONS: u32 = 10;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const RATE_LIMIT_WINDOW_SECS: u64 = 60;
const RATE_LIMIT_MAX_REQUESTS: u32 = 10;
const REDIS_POOL_SIZE: usize = 8;
const REDIS_TIMEOUT_MS: u64 = 250;
const MAX_UPLOAD_SIZE_MB: usize = 10;
const MIN_UPLOAD_SIZE_MB: usize = 1;
const SPAM_FLAG_THRESHOLD: f64 = 0.5;
const SPAM_NEAR_LIMIT_LENGTH: usize = 500;
const TRUSTED_PROXY_COUNT: usize = 1;
const REQUEST_TIMEOUT_SECS: u64 = 30;
const MIN_SALT_LENGTH: usize = 16;

/// Salt used outside production when `IP_HASH_SALT` is not set. Digests made
/// with it are only as private as this source file.
pub const INSECURE_DEV_SALT: &str = "portal-insecure-development-salt";

/// Rate limiter settings
#[derive(Clone, Debug)]
pub struct RateLimitSettings {
    pub window_seconds: u64,
    pub max_requests: u32,
    /// Set from `RATE_LIMIT_DISABLED`; only honoured outside production.
    pub disabled_requested: bool,
    pub redis_url: Option<String>,
    pub redis_pool_size: usize,
    pub redis_key_prefix: String,
    pub redis_timeout_ms: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            window_seconds: RATE_LIMIT_WINDOW_SECS,
            max_requests: RATE_LIMIT_MAX_REQUESTS,
            disabled_requested: false,
            redis_url: None,
            redis_pool_size: REDIS_POOL_SIZE,
            redis_key_prefix: "portal".to_string(),
            redis_timeout_ms: REDIS_TIMEOUT_MS,
        }
    }
}

/// Attachment upload settings
#[derive(Clone, Debug)]
pub struct UploadSettings {
    pub max_upload_bytes: usize,
    pub upload_dir: String,
    pub public_base_url: String,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            max_upload_bytes: MAX_UPLOAD_SIZE_MB * 1024 * 1024,
            upload_dir: "./uploads".to_string(),
            public_base_url: "/uploads".to_string(),
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    pub database_url: String,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub rate_limit: RateLimitSettings,
    pub upload: UploadSettings,
    pub ip_hash_salt: String,
    /// True when `ip_hash_salt` is the built-in development salt.
    pub insecure_salt: bool,
    pub spam_flag_threshold: f64,
    pub spam_near_limit_length: usize,
    pub trusted_proxy_count: usize,
    pub request_timeout_secs: u64,
    pub default_locale: String,
    pub supported_locales: Vec<String>,
    pub log_format: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: SERVER_PORT,
            environment: "development".to_string(),
            cors_origins: vec!["*".to_string()],
            database_url: String::new(),
            db_max_connections: MAX_CONNECTIONS,
            db_timeout_seconds: CONNECTION_TIMEOUT_SECS,
            rate_limit: RateLimitSettings::default(),
            upload: UploadSettings::default(),
            ip_hash_salt: INSECURE_DEV_SALT.to_string(),
            insecure_salt: true,
            spam_flag_threshold: SPAM_FLAG_THRESHOLD,
            spam_near_limit_length: SPAM_NEAR_LIMIT_LENGTH,
            trusted_proxy_count: TRUSTED_PROXY_COUNT,
            request_timeout_secs: REQUEST_TIMEOUT_SECS,
            default_locale: "en".to_string(),
            supported_locales: vec!["en".to_string(), "ne".to_string()],
            log_format: "text".to_string(),
        }
    }
}

fn is_production_name(environment: &str) -> bool {
    let env = environment.to_lowercase();
    env == "production" || env == "prod"
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Convert a megabyte limit to bytes, enforcing the 1MB floor.
/// Absurdly large values saturate instead of wrapping.
pub fn upload_limit_bytes(megabytes: usize) -> usize {
    megabytes.max(MIN_UPLOAD_SIZE_MB).saturating_mul(1024 * 1024)
}

impl Config {
    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        is_production_name(&self.environment)
    }

    /// Whether rate limiting is bypassed. Never true in production.
    pub fn rate_limit_bypassed(&self) -> bool {
        self.rate_limit.disabled_requested && !self.is_production()
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());
        let is_production = is_production_name(&environment);

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let (ip_hash_salt, insecure_salt) = match env::var("IP_HASH_SALT") {
            Ok(salt) if !salt.trim().is_empty() => (salt, false),
            _ if is_production => {
                return Err(anyhow::anyhow!(
                    "IP_HASH_SALT must be set in production"
                ));
            }
            _ => (INSECURE_DEV_SALT.to_string(), true),
        };

        let max_upload_mb = env::var("MAX_UPLOAD_SIZE_MB")
            .unwrap_or_else(|_| MAX_UPLOAD_SIZE_MB.to_string())
            .parse::<usize>()
            .unwrap_or(MAX_UPLOAD_SIZE_MB);

        let rate_limit = RateLimitSettings {
            window_seconds: env::var("RATE_LIMIT_WINDOW_SECONDS")
                .unwrap_or_else(|_| RATE_LIMIT_WINDOW_SECS.to_string())
                .parse()
                .unwrap_or(RATE_LIMIT_WINDOW_SECS),
            max_requests: env::var("RATE_LIMIT_MAX_REQUESTS")
                .unwrap_or_else(|_| RATE_LIMIT_MAX_REQUESTS.to_string())
                .parse()
                .unwrap_or(RATE_LIMIT_MAX_REQUESTS),
            disabled_requested: env::var("RATE_LIMIT_DISABLED")
                .ok()
                .and_then(|s| parse_bool(&s))
                .unwrap_or(false),
            redis_url: env::var("REDIS_URL").ok().filter(|s| !s.trim().is_empty()),
            redis_pool_size: env::var("REDIS_POOL_SIZE")
                .unwrap_or_else(|_| REDIS_POOL_SIZE.to_string())
                .parse()
                .unwrap_or(REDIS_POOL_SIZE),
            redis_key_prefix: env::var("REDIS_KEY_PREFIX")
                .unwrap_or_else(|_| "portal".to_string()),
            redis_timeout_ms: env::var("REDIS_TIMEOUT_MS")
                .unwrap_or_else(|_| REDIS_TIMEOUT_MS.to_string())
                .parse()
                .unwrap_or(REDIS_TIMEOUT_MS),
        };

        let upload = UploadSettings {
            max_upload_bytes: upload_limit_bytes(max_upload_mb),
            upload_dir: env::var("UPLOAD_DIR").unwrap_or_else(|_| "./uploads".to_string()),
            public_base_url: env::var("UPLOAD_PUBLIC_BASE_URL")
                .unwrap_or_else(|_| "/uploads".to_string()),
        };

        let supported_locales: Vec<String> = env::var("SUPPORTED_LOCALES")
            .unwrap_or_else(|_| "en,ne".to_string())
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        let config = Config {
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            environment,
            cors_origins,
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            rate_limit,
            upload,
            ip_hash_salt,
            insecure_salt,
            spam_flag_threshold: env::var("SPAM_FLAG_THRESHOLD")
                .unwrap_or_else(|_| SPAM_FLAG_THRESHOLD.to_string())
                .parse()
                .unwrap_or(SPAM_FLAG_THRESHOLD),
            spam_near_limit_length: env::var("SPAM_NEAR_LIMIT_LENGTH")
                .unwrap_or_else(|_| SPAM_NEAR_LIMIT_LENGTH.to_string())
                .parse()
                .unwrap_or(SPAM_NEAR_LIMIT_LENGTH),
            trusted_proxy_count: env::var("TRUSTED_PROXY_COUNT")
                .unwrap_or_else(|_| TRUSTED_PROXY_COUNT.to_string())
                .parse()
                .unwrap_or(TRUSTED_PROXY_COUNT),
            request_timeout_secs: env::var("REQUEST_TIMEOUT_SECS")
                .unwrap_or_else(|_| REQUEST_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(REQUEST_TIMEOUT_SECS),
            default_locale: env::var("DEFAULT_LOCALE")
                .unwrap_or_else(|_| "en".to_string())
                .trim()
                .to_lowercase(),
            supported_locales,
            log_format: env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "text".to_string())
                .to_lowercase(),
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.database_url.starts_with("postgres://")
            && !self.database_url.starts_with("postgresql://")
        {
            return Err(anyhow::anyhow!(
                "DATABASE_URL must be a valid PostgreSQL connection string"
            ));
        }

        if self.rate_limit.window_seconds == 0 {
            return Err(anyhow::anyhow!(
                "RATE_LIMIT_WINDOW_SECONDS must be greater than 0"
            ));
        }

        if self.rate_limit.max_requests == 0 {
            return Err(anyhow::anyhow!(
                "RATE_LIMIT_MAX_REQUESTS must be greater than 0"
            ));
        }

        if !(0.0..=1.0).contains(&self.spam_flag_threshold) {
            return Err(anyhow::anyhow!(
                "SPAM_FLAG_THRESHOLD must be between 0.0 and 1.0"
            ));
        }

        if self.is_production() && self.insecure_salt {
            return Err(anyhow::anyhow!("IP_HASH_SALT must be set in production"));
        }

        if self.is_production() && self.ip_hash_salt.len() < MIN_SALT_LENGTH {
            return Err(anyhow::anyhow!(
                "IP_HASH_SALT must be at least {} characters long",
                MIN_SALT_LENGTH
            ));
        }

        if !self.supported_locales.contains(&self.default_locale) {
            return Err(anyhow::anyhow!(
                "DEFAULT_LOCALE '{}' is not listed in SUPPORTED_LOCALES",
                self.default_locale
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> Config {
        Config {
            database_url: "postgresql://localhost/portal".to_string(),
            ..Config::default()
        }
    }

    #[test]
    fn test_default_config_validates() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_upload_limit_floor_and_saturation() {
        assert_eq!(upload_limit_bytes(0), 1024 * 1024);
        assert_eq!(upload_limit_bytes(10), 10 * 1024 * 1024);
        assert_eq!(upload_limit_bytes(usize::MAX), usize::MAX);
        assert_eq!(upload_limit_bytes(usize::MAX / 1024), usize::MAX);
    }

    #[test]
    fn test_production_rejects_insecure_salt() {
        let config = Config {
            environment: "production".to_string(),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_production_rejects_short_salt() {
        let config = Config {
            environment: "prod".to_string(),
            ip_hash_salt: "short".to_string(),
            insecure_salt: false,
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rate_limit_bypass_ignored_in_production() {
        let mut config = valid_config();
        config.rate_limit.disabled_requested = true;
        assert!(config.rate_limit_bypassed());

        config.environment = "production".to_string();
        assert!(!config.rate_limit_bypassed());
    }

    #[test]
    fn test_threshold_out_of_range_rejected() {
        let config = Config {
            spam_flag_threshold: 1.5,
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_default_locale_must_be_supported() {
        let config = Config {
            default_locale: "fr".to_string(),
            ..valid_config()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_bool_variants() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
