//! Configuration loader
//!
//! Loads [`ClientConfig`] from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If `QUILL_API_BASE_URL` is unset or a value is invalid, falls back to
//!    loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! - `QUILL_API_BASE_URL`: API base URL (required)
//! - `QUILL_MAX_RETRIES`: Retries after the first attempt
//! - `QUILL_BASE_DELAY_MS`: Base backoff delay in milliseconds
//! - `QUILL_TOTAL_TIMEOUT_MS`: Total time budget per call in milliseconds
//! - `QUILL_CIRCUIT_BREAKER_THRESHOLD`: Consecutive failures that open the
//!   breaker
//! - `QUILL_CIRCUIT_BREAKER_TIMEOUT_MS`: Breaker cooldown in milliseconds
//! - `QUILL_USER_AGENT`: User-Agent header sent with every request
//!
//! Unset optional variables keep their defaults.
//!
//! ## File Locations
//! `quill.toml`, `quill.json`, `config.toml`, `config.json`, looked up in the
//! current working directory, then its parent, then its grandparent.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use quill_domain::{QuillError, Result};

use crate::api::config::ClientConfig;

const CONFIG_FILE_NAMES: [&str; 4] = ["quill.toml", "quill.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `QuillError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - The loaded configuration fails validation
pub fn load() -> Result<ClientConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `QuillError::Config` if `QUILL_API_BASE_URL` is missing, a
/// numeric variable does not parse, or validation fails.
pub fn load_from_env() -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder().base_url(env_var("QUILL_API_BASE_URL")?);

    if let Some(retries) = env_parse::<u32>("QUILL_MAX_RETRIES")? {
        builder = builder.max_retries(retries);
    }
    if let Some(millis) = env_parse::<u64>("QUILL_BASE_DELAY_MS")? {
        builder = builder.base_delay(Duration::from_millis(millis));
    }
    if let Some(millis) = env_parse::<u64>("QUILL_TOTAL_TIMEOUT_MS")? {
        builder = builder.total_timeout(Duration::from_millis(millis));
    }
    if let Some(threshold) = env_parse::<u32>("QUILL_CIRCUIT_BREAKER_THRESHOLD")? {
        builder = builder.circuit_breaker_threshold(threshold);
    }
    if let Some(millis) = env_parse::<u64>("QUILL_CIRCUIT_BREAKER_TIMEOUT_MS")? {
        builder = builder.circuit_breaker_timeout(Duration::from_millis(millis));
    }
    if let Ok(agent) = std::env::var("QUILL_USER_AGENT") {
        builder = builder.user_agent(agent);
    }

    builder.build()
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations (see
/// [`probe_config_paths`]). Format is detected by file extension.
///
/// # Errors
/// Returns `QuillError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid or validation fails
pub fn load_from_file(path: Option<PathBuf>) -> Result<ClientConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(QuillError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            QuillError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| QuillError::Config(format!("Failed to read config file: {e}")))?;

    let config = parse_config(&contents, &config_path)?;
    config.validate()?;
    Ok(config)
}

/// Parse configuration from string content, format chosen by extension
fn parse_config(contents: &str, path: &Path) -> Result<ClientConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| QuillError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| QuillError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(QuillError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the working directory and its two parents for a config file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let cwd = std::env::current_dir().ok()?;
    probe_from(&cwd)
}

fn probe_from(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .take(3)
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| QuillError::Config(format!("Missing required environment variable: {key}")))
}

/// Parse an optional environment variable; `Ok(None)` when unset
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| QuillError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tempfile::TempDir;

    use super::*;

    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: [&str; 7] = [
        "QUILL_API_BASE_URL",
        "QUILL_MAX_RETRIES",
        "QUILL_BASE_DELAY_MS",
        "QUILL_TOTAL_TIMEOUT_MS",
        "QUILL_CIRCUIT_BREAKER_THRESHOLD",
        "QUILL_CIRCUIT_BREAKER_TIMEOUT_MS",
        "QUILL_USER_AGENT",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            std::env::remove_var(key);
        }
    }

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).expect("write config file");
        path
    }

    #[test]
    fn test_load_from_env_all_vars_set() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        clear_env();

        std::env::set_var("QUILL_API_BASE_URL", "https://quill.example/api");
        std::env::set_var("QUILL_MAX_RETRIES", "2");
        std::env::set_var("QUILL_BASE_DELAY_MS", "250");
        std::env::set_var("QUILL_TOTAL_TIMEOUT_MS", "5000");
        std::env::set_var("QUILL_CIRCUIT_BREAKER_THRESHOLD", "4");
        std::env::set_var("QUILL_CIRCUIT_BREAKER_TIMEOUT_MS", "10000");
        std::env::set_var("QUILL_USER_AGENT", "quill-cli/1.0");

        let result = load_from_env();
        clear_env();

        let config = result.expect("config from env");
        assert_eq!(config.base_url, "https://quill.example/api");
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.base_delay, Duration::from_millis(250));
        assert_eq!(config.total_timeout, Duration::from_millis(5_000));
        assert_eq!(config.circuit_breaker_threshold, 4);
        assert_eq!(config.circuit_breaker_timeout, Duration::from_millis(10_000));
        assert_eq!(config.user_agent.as_deref(), Some("quill-cli/1.0"));
    }

    #[test]
    fn test_load_from_env_optional_vars_default() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        clear_env();

        std::env::set_var("QUILL_API_BASE_URL", "https://quill.example");
        let result = load_from_env();
        clear_env();

        let config = result.expect("config from env");
        assert_eq!(config, ClientConfig { base_url: "https://quill.example".into(), ..ClientConfig::default() });
    }

    #[test]
    fn test_load_from_env_missing_base_url() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        clear_env();

        let err = load_from_env().unwrap_err();
        assert!(matches!(err, QuillError::Config(_)), "Should be a Config error");
    }

    #[test]
    fn test_load_from_env_invalid_number() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        clear_env();

        std::env::set_var("QUILL_API_BASE_URL", "https://quill.example");
        std::env::set_var("QUILL_MAX_RETRIES", "several");
        let result = load_from_env();
        clear_env();

        assert!(matches!(result, Err(QuillError::Config(msg)) if msg.contains("QUILL_MAX_RETRIES")));
    }

    #[test]
    fn test_load_from_env_rejects_zero_threshold() {
        let _guard = ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        clear_env();

        std::env::set_var("QUILL_API_BASE_URL", "https://quill.example");
        std::env::set_var("QUILL_CIRCUIT_BREAKER_THRESHOLD", "0");
        let result = load_from_env();
        clear_env();

        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file_toml() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "quill.toml",
            r#"
base_url = "https://quill.example/api"
max_retries = 1
base_delay_ms = 500
circuit_breaker_timeout_ms = 2000
"#,
        );

        let config = load_from_file(Some(path)).expect("config from TOML");
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.base_delay, Duration::from_millis(500));
        assert_eq!(config.circuit_breaker_timeout, Duration::from_millis(2_000));
        assert_eq!(config.total_timeout, Duration::from_millis(12_000));
    }

    #[test]
    fn test_load_from_file_json() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "config.json",
            r#"{"base_url": "http://localhost:9000", "total_timeout_ms": 3000, "user_agent": "quill"}"#,
        );

        let config = load_from_file(Some(path)).expect("config from JSON");
        assert_eq!(config.base_url, "http://localhost:9000");
        assert_eq!(config.total_timeout, Duration::from_millis(3_000));
        assert_eq!(config.user_agent.as_deref(), Some("quill"));
    }

    #[test]
    fn test_load_from_file_rejects_invalid_values() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "quill.json", r#"{"base_delay_ms": 0}"#);

        assert!(matches!(load_from_file(Some(path)), Err(QuillError::Config(_))));
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/quill.toml")));
        assert!(matches!(result, Err(QuillError::Config(_))));
    }

    #[test]
    fn test_load_from_file_invalid_json() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "quill.json", r#"{ "this is": "not valid json" "#);

        assert!(load_from_file(Some(path)).is_err());
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "quill.yaml", "base_url: x");

        let err = load_from_file(Some(path)).unwrap_err();
        assert!(err.to_string().contains("Unsupported config format"));
    }

    #[test]
    fn test_probe_prefers_nearest_directory() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(probe_from(&nested), None);

        let parent_file = root.path().join("a").join("config.json");
        std::fs::write(&parent_file, "{}").unwrap();
        assert_eq!(probe_from(&nested), Some(parent_file));

        let local_file = nested.join("quill.toml");
        std::fs::write(&local_file, "").unwrap();
        assert_eq!(probe_from(&nested), Some(local_file));
    }

    #[test]
    fn test_probe_stops_after_two_parents() {
        let root = TempDir::new().unwrap();
        let nested = root.path().join("a").join("b").join("c");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(root.path().join("quill.toml"), "").unwrap();

        assert_eq!(probe_from(&nested), None);
    }
}
