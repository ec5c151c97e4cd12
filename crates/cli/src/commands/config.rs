use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use haulaway_core::config::{AppConfig, LoadOptions};
use toml::Value;

pub fn run(options: &LoadOptions) -> String {
    let config = match AppConfig::load(options.clone()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let config_file_path = detect_config_path(options);
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let rows: Vec<(&str, String, &str)> = vec![
        ("database.url", config.database.url.clone(), "HAULAWAY_DATABASE_URL"),
        (
            "database.max_connections",
            config.database.max_connections.to_string(),
            "HAULAWAY_DATABASE_MAX_CONNECTIONS",
        ),
        (
            "database.timeout_secs",
            config.database.timeout_secs.to_string(),
            "HAULAWAY_DATABASE_TIMEOUT_SECS",
        ),
        ("server.bind_address", config.server.bind_address.clone(), "HAULAWAY_SERVER_BIND_ADDRESS"),
        ("server.port", config.server.port.to_string(), "HAULAWAY_SERVER_PORT"),
        (
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            "HAULAWAY_SERVER_GRACEFUL_SHUTDOWN_SECS",
        ),
        ("llm.model", config.llm.model.clone(), "HAULAWAY_LLM_MODEL"),
        ("llm.base_url", config.llm.base_url.clone(), "HAULAWAY_LLM_BASE_URL"),
        ("llm.api_key", redact(config.llm.api_key.is_some()), "HAULAWAY_LLM_API_KEY"),
        ("llm.max_tokens", config.llm.max_tokens.to_string(), "HAULAWAY_LLM_MAX_TOKENS"),
        ("llm.timeout_secs", config.llm.timeout_secs.to_string(), "HAULAWAY_LLM_TIMEOUT_SECS"),
        ("sms.api_base", or_unset(config.sms.api_base.as_deref()), "HAULAWAY_SMS_API_BASE"),
        ("sms.api_token", redact(config.sms.api_token.is_some()), "HAULAWAY_SMS_API_TOKEN"),
        ("sms.from_number", or_unset(config.sms.from_number.as_deref()), "HAULAWAY_SMS_FROM_NUMBER"),
        (
            "sms.provider_phone",
            or_unset(config.sms.provider_phone.as_deref()),
            "HAULAWAY_SMS_PROVIDER_PHONE",
        ),
        ("sms.webhook_url", or_unset(config.sms.webhook_url.as_deref()), "HAULAWAY_SMS_WEBHOOK_URL"),
        (
            "sms.webhook_secret",
            redact(config.sms.webhook_secret.is_some()),
            "HAULAWAY_SMS_WEBHOOK_SECRET",
        ),
        (
            "throttle.quiet_start_hour",
            config.throttle.quiet_start_hour.to_string(),
            "HAULAWAY_THROTTLE_QUIET_START_HOUR",
        ),
        (
            "throttle.quiet_end_hour",
            config.throttle.quiet_end_hour.to_string(),
            "HAULAWAY_THROTTLE_QUIET_END_HOUR",
        ),
        (
            "throttle.utc_offset_minutes",
            config.throttle.utc_offset_minutes.to_string(),
            "HAULAWAY_THROTTLE_UTC_OFFSET_MINUTES",
        ),
        ("booking.days_ahead", config.booking.days_ahead.to_string(), "HAULAWAY_BOOKING_DAYS_AHEAD"),
        ("booking.windows", config.booking.windows.join(", "), "HAULAWAY_BOOKING_WINDOWS"),
        ("logging.level", config.logging.level.clone(), "HAULAWAY_LOGGING_LEVEL"),
        ("logging.format", format!("{:?}", config.logging.format), "HAULAWAY_LOGGING_FORMAT"),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_key) in rows {
        lines.push(render_line(
            key,
            &value,
            field_source(key, env_key, config_file_doc.as_ref(), config_file_path.as_deref()),
        ));
    }

    lines.join("\n")
}

/// Mirrors the loader's discovery order: explicit path, then the
/// `HAULAWAY_CONFIG` variable, then the conventional file locations.
fn detect_config_path(options: &LoadOptions) -> Option<PathBuf> {
    if let Some(path) = &options.config_path {
        return Some(path.clone());
    }

    if let Some(env_path) = env::var_os("HAULAWAY_CONFIG") {
        return Some(PathBuf::from(env_path));
    }

    let root = PathBuf::from("haulaway.toml");
    if root.exists() {
        return Some(root);
    }

    let nested = PathBuf::from("config/haulaway.toml");
    if nested.exists() {
        return Some(nested);
    }

    None
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_key: &str,
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if env::var_os(env_key).is_some() {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

fn redact(present: bool) -> String {
    if present { "<redacted>" } else { "<unset>" }.to_string()
}

fn or_unset(value: Option<&str>) -> String {
    value.unwrap_or("<unset>").to_string()
}
