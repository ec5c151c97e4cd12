use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schedule::{BookingCalendar, DEFAULT_DAYS_AHEAD, DEFAULT_WINDOWS};
use crate::throttle::QuietHours;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub sms: SmsConfig,
    pub throttle: ThrottleConfig,
    pub booking: BookingConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LlmConfig {
    pub api_key: Option<SecretString>,
    pub base_url: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct SmsConfig {
    pub api_base: Option<String>,
    pub api_token: Option<SecretString>,
    pub from_number: Option<String>,
    pub provider_phone: Option<String>,
    pub webhook_url: Option<String>,
    pub webhook_secret: Option<SecretString>,
}

#[derive(Clone, Debug)]
pub struct ThrottleConfig {
    pub quiet_start_hour: u32,
    pub quiet_end_hour: u32,
    pub utc_offset_minutes: i32,
}

#[derive(Clone, Debug)]
pub struct BookingConfig {
    pub days_ahead: u32,
    pub windows: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_model: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://haulaway.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 8080,
                graceful_shutdown_secs: 15,
            },
            llm: LlmConfig {
                api_key: None,
                base_url: "https://api.anthropic.com".to_string(),
                model: "claude-sonnet-4-20250514".to_string(),
                max_tokens: 256,
                timeout_secs: 30,
            },
            sms: SmsConfig {
                api_base: None,
                api_token: None,
                from_number: None,
                provider_phone: None,
                webhook_url: None,
                webhook_secret: None,
            },
            throttle: ThrottleConfig {
                quiet_start_hour: 21,
                quiet_end_hour: 8,
                utc_offset_minutes: -480,
            },
            booking: BookingConfig {
                days_ahead: DEFAULT_DAYS_AHEAD,
                windows: DEFAULT_WINDOWS.iter().map(|w| w.to_string()).collect(),
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

fn secret_value(value: String) -> SecretString {
    value.into()
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("haulaway.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    pub fn quiet_hours(&self) -> QuietHours {
        QuietHours {
            start_hour: self.throttle.quiet_start_hour,
            end_hour: self.throttle.quiet_end_hour,
            utc_offset_minutes: self.throttle.utc_offset_minutes,
        }
    }

    pub fn booking_calendar(&self) -> BookingCalendar {
        BookingCalendar::new(self.booking.windows.clone(), self.booking.days_ahead)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(llm) = patch.llm {
            if let Some(api_key) = llm.api_key {
                self.llm.api_key = Some(secret_value(api_key));
            }
            if let Some(base_url) = llm.base_url {
                self.llm.base_url = base_url;
            }
            if let Some(model) = llm.model {
                self.llm.model = model;
            }
            if let Some(max_tokens) = llm.max_tokens {
                self.llm.max_tokens = max_tokens;
            }
            if let Some(timeout_secs) = llm.timeout_secs {
                self.llm.timeout_secs = timeout_secs;
            }
        }

        if let Some(sms) = patch.sms {
            if let Some(api_base) = sms.api_base {
                self.sms.api_base = Some(api_base);
            }
            if let Some(api_token) = sms.api_token {
                self.sms.api_token = Some(secret_value(api_token));
            }
            if let Some(from_number) = sms.from_number {
                self.sms.from_number = Some(from_number);
            }
            if let Some(provider_phone) = sms.provider_phone {
                self.sms.provider_phone = Some(provider_phone);
            }
            if let Some(webhook_url) = sms.webhook_url {
                self.sms.webhook_url = Some(webhook_url);
            }
            if let Some(webhook_secret) = sms.webhook_secret {
                self.sms.webhook_secret = Some(secret_value(webhook_secret));
            }
        }

        if let Some(throttle) = patch.throttle {
            if let Some(quiet_start_hour) = throttle.quiet_start_hour {
                self.throttle.quiet_start_hour = quiet_start_hour;
            }
            if let Some(quiet_end_hour) = throttle.quiet_end_hour {
                self.throttle.quiet_end_hour = quiet_end_hour;
            }
            if let Some(utc_offset_minutes) = throttle.utc_offset_minutes {
                self.throttle.utc_offset_minutes = utc_offset_minutes;
            }
        }

        if let Some(booking) = patch.booking {
            if let Some(days_ahead) = booking.days_ahead {
                self.booking.days_ahead = days_ahead;
            }
            if let Some(windows) = booking.windows {
                self.booking.windows = windows;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("HAULAWAY_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("HAULAWAY_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections =
                parse_u32("HAULAWAY_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("HAULAWAY_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("HAULAWAY_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("HAULAWAY_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("HAULAWAY_SERVER_PORT") {
            self.server.port = parse_u16("HAULAWAY_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("HAULAWAY_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("HAULAWAY_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        if let Some(value) = read_env("HAULAWAY_LLM_API_KEY") {
            self.llm.api_key = Some(secret_value(value));
        }
        if let Some(value) = read_env("HAULAWAY_LLM_BASE_URL") {
            self.llm.base_url = value;
        }
        if let Some(value) = read_env("HAULAWAY_LLM_MODEL") {
            self.llm.model = value;
        }
        if let Some(value) = read_env("HAULAWAY_LLM_MAX_TOKENS") {
            self.llm.max_tokens = parse_u32("HAULAWAY_LLM_MAX_TOKENS", &value)?;
        }
        if let Some(value) = read_env("HAULAWAY_LLM_TIMEOUT_SECS") {
            self.llm.timeout_secs = parse_u64("HAULAWAY_LLM_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("HAULAWAY_SMS_API_BASE") {
            self.sms.api_base = Some(value);
        }
        if let Some(value) = read_env("HAULAWAY_SMS_API_TOKEN") {
            self.sms.api_token = Some(secret_value(value));
        }
        if let Some(value) = read_env("HAULAWAY_SMS_FROM_NUMBER") {
            self.sms.from_number = Some(value);
        }
        if let Some(value) = read_env("HAULAWAY_SMS_PROVIDER_PHONE") {
            self.sms.provider_phone = Some(value);
        }
        if let Some(value) = read_env("HAULAWAY_SMS_WEBHOOK_URL") {
            self.sms.webhook_url = Some(value);
        }
        if let Some(value) = read_env("HAULAWAY_SMS_WEBHOOK_SECRET") {
            self.sms.webhook_secret = Some(secret_value(value));
        }

        if let Some(value) = read_env("HAULAWAY_THROTTLE_QUIET_START_HOUR") {
            self.throttle.quiet_start_hour =
                parse_u32("HAULAWAY_THROTTLE_QUIET_START_HOUR", &value)?;
        }
        if let Some(value) = read_env("HAULAWAY_THROTTLE_QUIET_END_HOUR") {
            self.throttle.quiet_end_hour = parse_u32("HAULAWAY_THROTTLE_QUIET_END_HOUR", &value)?;
        }
        if let Some(value) = read_env("HAULAWAY_THROTTLE_UTC_OFFSET_MINUTES") {
            self.throttle.utc_offset_minutes =
                parse_i32("HAULAWAY_THROTTLE_UTC_OFFSET_MINUTES", &value)?;
        }

        if let Some(value) = read_env("HAULAWAY_BOOKING_DAYS_AHEAD") {
            self.booking.days_ahead = parse_u32("HAULAWAY_BOOKING_DAYS_AHEAD", &value)?;
        }
        if let Some(value) = read_env("HAULAWAY_BOOKING_WINDOWS") {
            self.booking.windows = value
                .split(',')
                .map(|window| window.trim().to_string())
                .filter(|window| !window.is_empty())
                .collect();
        }

        let log_level =
            read_env("HAULAWAY_LOGGING_LEVEL").or_else(|| read_env("HAULAWAY_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("HAULAWAY_LOGGING_FORMAT").or_else(|| read_env("HAULAWAY_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(llm_api_key) = overrides.llm_api_key {
            self.llm.api_key = Some(secret_value(llm_api_key));
        }
        if let Some(llm_model) = overrides.llm_model {
            self.llm.model = llm_model;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_server(&self.server)?;
        validate_llm(&self.llm)?;
        validate_sms(&self.sms)?;
        validate_throttle(&self.throttle)?;
        validate_booking(&self.booking)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    if let Some(env_path) = read_env("HAULAWAY_CONFIG") {
        let path = PathBuf::from(env_path);
        return path.exists().then_some(path);
    }

    [PathBuf::from("haulaway.toml"), PathBuf::from("config/haulaway.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation(
            "server.bind_address must not be empty".to_string(),
        ));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_llm(llm: &LlmConfig) -> Result<(), ConfigError> {
    if llm.base_url.trim().is_empty() {
        return Err(ConfigError::Validation("llm.base_url must not be empty".to_string()));
    }

    if llm.model.trim().is_empty() {
        return Err(ConfigError::Validation("llm.model must not be empty".to_string()));
    }

    if llm.max_tokens == 0 {
        return Err(ConfigError::Validation(
            "llm.max_tokens must be greater than zero".to_string(),
        ));
    }

    if llm.timeout_secs == 0 || llm.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "llm.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_sms(sms: &SmsConfig) -> Result<(), ConfigError> {
    if let Some(api_base) = &sms.api_base {
        if !api_base.starts_with("http://") && !api_base.starts_with("https://") {
            return Err(ConfigError::Validation(
                "sms.api_base must start with http:// or https://".to_string(),
            ));
        }
    }

    if let Some(webhook_url) = &sms.webhook_url {
        if !webhook_url.starts_with("http://") && !webhook_url.starts_with("https://") {
            return Err(ConfigError::Validation(
                "sms.webhook_url must start with http:// or https://".to_string(),
            ));
        }
    }

    Ok(())
}

fn validate_throttle(throttle: &ThrottleConfig) -> Result<(), ConfigError> {
    if throttle.quiet_start_hour > 23 || throttle.quiet_end_hour > 23 {
        return Err(ConfigError::Validation(
            "throttle.quiet_start_hour and throttle.quiet_end_hour must be in range 0..=23"
                .to_string(),
        ));
    }

    if throttle.utc_offset_minutes.abs() > 14 * 60 {
        return Err(ConfigError::Validation(
            "throttle.utc_offset_minutes must be within +/- 14 hours".to_string(),
        ));
    }

    Ok(())
}

fn validate_booking(booking: &BookingConfig) -> Result<(), ConfigError> {
    if booking.days_ahead == 0 {
        return Err(ConfigError::Validation(
            "booking.days_ahead must be greater than zero".to_string(),
        ));
    }

    if booking.windows.is_empty() {
        return Err(ConfigError::Validation(
            "booking.windows must list at least one window".to_string(),
        ));
    }

    if booking.windows.iter().any(|window| window.trim().is_empty()) {
        return Err(ConfigError::Validation(
            "booking.windows must not contain empty labels".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_i32(key: &str, value: &str) -> Result<i32, ConfigError> {
    value.parse::<i32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    server: Option<ServerPatch>,
    llm: Option<LlmPatch>,
    sms: Option<SmsPatch>,
    throttle: Option<ThrottlePatch>,
    booking: Option<BookingPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LlmPatch {
    api_key: Option<String>,
    base_url: Option<String>,
    model: Option<String>,
    max_tokens: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct SmsPatch {
    api_base: Option<String>,
    api_token: Option<String>,
    from_number: Option<String>,
    provider_phone: Option<String>,
    webhook_url: Option<String>,
    webhook_secret: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ThrottlePatch {
    quiet_start_hour: Option<u32>,
    quiet_end_hour: Option<u32>,
    utc_offset_minutes: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
struct BookingPatch {
    days_ahead: Option<u32>,
    windows: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
