//! Configuration loader
//!
//! Loads application configuration from files and environment variables.
//!
//! ## Loading Strategy
//! 1. Probe the standard locations for a config file
//! 2. If none is found, start from [`Config::default`]
//! 3. Apply `DESKPULSE_*` environment overrides on top
//!
//! ## Environment Variables
//! - `DESKPULSE_INGESTION_PORT`: WebSocket listening port
//! - `DESKPULSE_INGESTION_BIND`: WebSocket bind address
//! - `DESKPULSE_CAPTURE_ENABLED`: Whether input capture runs (true/false)
//! - `DESKPULSE_LOG_LEVEL`: Log filter directive
//! - `DESKPULSE_LOG_JSON`: JSON log output (true/false)
//! - `DESKPULSE_UTC_OFFSET_MINUTES`: Offset used for hourly buckets
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./deskpulse.{toml,json}` then `./config.{toml,json}`
//! 2. The same names one and two directories up
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};

use deskpulse_domain::{Config, DeskPulseError, Result};

const FILE_NAMES: &[&str] = &["deskpulse.toml", "deskpulse.json", "config.toml", "config.json"];

/// Load configuration: probed file (or defaults) plus environment overrides
///
/// # Errors
/// Returns `DeskPulseError::Config` if a found file cannot be parsed or an
/// override has an invalid value.
pub fn load() -> Result<Config> {
    let base = match probe_config_paths() {
        Some(path) => load_from_file(Some(path))?,
        None => {
            tracing::debug!("No config file found, using defaults");
            Config::default()
        }
    };
    apply_env_overrides(base)
}

/// Defaults with environment overrides applied
///
/// # Errors
/// Returns `DeskPulseError::Config` if an override has an invalid value.
pub fn load_from_env() -> Result<Config> {
    apply_env_overrides(Config::default())
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Supports JSON and
/// TOML (detected by file extension); missing fields take their defaults.
///
/// # Errors
/// Returns `DeskPulseError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(DeskPulseError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            DeskPulseError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| DeskPulseError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content
///
/// Format is detected by file extension (`.json` or `.toml`).
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    let config: Config = match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| DeskPulseError::Config(format!("Invalid TOML format: {}", e)))?,
        "json" => serde_json::from_str(contents)
            .map_err(|e| DeskPulseError::Config(format!("Invalid JSON format: {}", e)))?,
        _ => return Err(DeskPulseError::Config(format!("Unsupported config format: {}", extension))),
    };
    config.validate()?;
    Ok(config)
}

/// Probe multiple paths for configuration files
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.push(cwd.join(".."));
        roots.push(cwd.join("../.."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
        }
    }

    roots
        .iter()
        .flat_map(|root| FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

fn apply_env_overrides(mut config: Config) -> Result<Config> {
    if let Some(port) = env_parse::<u16>("DESKPULSE_INGESTION_PORT")? {
        config.ingestion.port = port;
    }
    if let Ok(bind) = std::env::var("DESKPULSE_INGESTION_BIND") {
        config.ingestion.bind_address = bind;
    }
    config.capture.enabled = env_bool("DESKPULSE_CAPTURE_ENABLED", config.capture.enabled);
    if let Ok(level) = std::env::var("DESKPULSE_LOG_LEVEL") {
        config.logging.level = level;
    }
    config.logging.json = env_bool("DESKPULSE_LOG_JSON", config.logging.json);
    if let Some(minutes) = env_parse::<i32>("DESKPULSE_UTC_OFFSET_MINUTES")? {
        config.capture.utc_offset_minutes = Some(minutes);
    }
    config.validate()?;
    Ok(config)
}

/// Parse an optional environment variable
///
/// # Errors
/// Returns `DeskPulseError::Config` if the variable is set but invalid.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| DeskPulseError::Config(format!("Invalid value for {}: {}", key, e))),
        Err(_) => Ok(None),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use once_cell::sync::Lazy;

    use super::*;

    static ENV_LOCK: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

    const OVERRIDES: &[&str] = &[
        "DESKPULSE_INGESTION_PORT",
        "DESKPULSE_INGESTION_BIND",
        "DESKPULSE_CAPTURE_ENABLED",
        "DESKPULSE_LOG_LEVEL",
        "DESKPULSE_LOG_JSON",
        "DESKPULSE_UTC_OFFSET_MINUTES",
    ];

    fn clear_overrides() {
        for key in OVERRIDES {
            std::env::remove_var(key);
        }
    }

    #[test]
    fn test_env_bool_parsing() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");

        std::env::set_var("TEST_DESKPULSE_BOOL_ON", "ON");
        std::env::set_var("TEST_DESKPULSE_BOOL_NO", "no");
        assert!(env_bool("TEST_DESKPULSE_BOOL_ON", false));
        assert!(!env_bool("TEST_DESKPULSE_BOOL_NO", true));

        std::env::remove_var("TEST_DESKPULSE_BOOL_MISSING");
        assert!(env_bool("TEST_DESKPULSE_BOOL_MISSING", true));

        std::env::remove_var("TEST_DESKPULSE_BOOL_ON");
        std::env::remove_var("TEST_DESKPULSE_BOOL_NO");
    }

    #[test]
    fn test_load_from_env_overrides() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_overrides();

        std::env::set_var("DESKPULSE_INGESTION_PORT", "9123");
        std::env::set_var("DESKPULSE_CAPTURE_ENABLED", "false");
        std::env::set_var("DESKPULSE_LOG_LEVEL", "debug");
        std::env::set_var("DESKPULSE_UTC_OFFSET_MINUTES", "-300");

        let config = load_from_env().unwrap();
        assert_eq!(config.ingestion.port, 9123);
        assert_eq!(config.ingestion.bind_address, "127.0.0.1");
        assert!(!config.capture.enabled);
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.capture.utc_offset_minutes, Some(-300));

        clear_overrides();
    }

    #[test]
    fn test_load_from_env_invalid_port() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_overrides();

        std::env::set_var("DESKPULSE_INGESTION_PORT", "not-a-port");
        let err = load_from_env().unwrap_err();
        assert!(matches!(err, DeskPulseError::Config(_)), "Should be a Config error");

        std::env::set_var("DESKPULSE_INGESTION_PORT", "70000");
        assert!(load_from_env().is_err());

        clear_overrides();
    }

    #[test]
    fn test_offset_out_of_range() {
        let _guard = ENV_LOCK.lock().expect("env mutex poisoned");
        clear_overrides();

        std::env::set_var("DESKPULSE_UTC_OFFSET_MINUTES", "1500");
        assert!(matches!(load_from_env(), Err(DeskPulseError::Config(_))));

        clear_overrides();
    }

    #[test]
    fn test_parse_config_formats() {
        let json = parse_config(r#"{"ingestion": {"port": 9001}}"#, Path::new("c.json")).unwrap();
        assert_eq!(json.ingestion.port, 9001);

        let toml = parse_config("[logging]\nlevel = \"warn\"\njson = true\n", Path::new("c.toml")).unwrap();
        assert_eq!(toml.logging.level, "warn");
        assert!(toml.logging.json);
        assert_eq!(toml.ingestion.port, 8765);
    }

    #[test]
    fn test_parse_config_rejects_offset_out_of_range() {
        let json = parse_config(r#"{"capture": {"utc_offset_minutes": 40000000}}"#, Path::new("c.json"));
        assert!(matches!(json, Err(DeskPulseError::Config(ref msg)) if msg.contains("UTC offset")));

        let toml = parse_config("[capture]\nutc_offset_minutes = 2000\n", Path::new("c.toml"));
        assert!(matches!(toml, Err(DeskPulseError::Config(_))));

        let ok = parse_config("[capture]\nutc_offset_minutes = -840\n", Path::new("c.toml")).unwrap();
        assert_eq!(ok.capture.utc_offset_minutes, Some(-840));
    }

    #[test]
    fn test_parse_config_unsupported_format() {
        let result = parse_config("port: 1", Path::new("config.yaml"));
        assert!(matches!(result, Err(DeskPulseError::Config(_))));
    }

    #[test]
    fn test_load_from_file_not_found() {
        let result = load_from_file(Some(PathBuf::from("/nonexistent/deskpulse.toml")));
        assert!(matches!(result, Err(DeskPulseError::Config(_))));
    }
}
