//! Configuration loader
//!
//! Loads the scheduler configuration from a file, then applies environment
//! overrides and validates the result.
//!
//! ## Loading Strategy
//! 1. Use the explicit path if one is given, otherwise probe the standard
//!    locations
//! 2. Fall back to built-in defaults when no file is found
//! 3. Apply environment overrides
//! 4. Validate
//!
//! ## Environment Variables
//! - `CADENCE_ERROR_CAPACITY`: Bound of the registry's merged error queue
//! - `CADENCE_JOB_ERROR_CAPACITY`: Bound of each job's error queue
//! - `CADENCE_LOG_LEVEL`: Default `EnvFilter` directive (`RUST_LOG` still wins)
//! - `CADENCE_LOG_FORMAT`: `pretty` or `json`
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./cadence.toml`, `./cadence.json` (current working directory)
//! 2. `./config.toml`, `./config.json` (current working directory)
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use cadence_domain::{CadenceError, LogFormat, Result, SchedulerConfig};

const CONFIG_FILE_NAMES: [&str; 4] = ["cadence.toml", "cadence.json", "config.toml", "config.json"];

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `CadenceError::Config` if:
/// - An explicit `path` does not exist
/// - The file cannot be read or parsed
/// - An override variable holds an invalid value
///
/// Returns `CadenceError::InvalidInput` if the merged configuration fails
/// validation.
pub fn load(path: Option<PathBuf>) -> Result<SchedulerConfig> {
    let mut config = match path {
        Some(path) => load_from_file(Some(path))?,
        None => match probe_config_paths() {
            Some(found) => load_from_file(Some(found))?,
            None => {
                tracing::info!("No config file found, using defaults");
                SchedulerConfig::default()
            }
        },
    };

    apply_env_overrides(&mut config)?;
    config.validate()?;

    tracing::debug!(
        jobs = config.jobs.len(),
        error_capacity = config.error_capacity,
        "Configuration loaded"
    );
    Ok(config)
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations.
/// Format is detected by file extension (`.toml` or `.json`).
///
/// # Errors
/// Returns `CadenceError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
pub fn load_from_file(path: Option<PathBuf>) -> Result<SchedulerConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CadenceError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CadenceError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CadenceError::Config(format!("Failed to read config file: {}", e)))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, format chosen by extension
fn parse_config(contents: &str, path: &Path) -> Result<SchedulerConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CadenceError::Config(format!("Invalid TOML format: {}", e))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CadenceError::Config(format!("Invalid JSON format: {}", e))),
        _ => Err(CadenceError::Config(format!("Unsupported config format: {}", extension))),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut dirs = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            dirs.push(exe_dir.to_path_buf());
        }
    }

    dirs.iter()
        .flat_map(|dir| CONFIG_FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.is_file())
}

/// Apply `CADENCE_*` environment overrides in place
///
/// # Errors
/// Returns `CadenceError::Config` if a variable is set to an invalid value.
pub fn apply_env_overrides(config: &mut SchedulerConfig) -> Result<()> {
    if let Some(capacity) = env_parse::<usize>("CADENCE_ERROR_CAPACITY")? {
        config.error_capacity = capacity;
    }
    if let Some(capacity) = env_parse::<usize>("CADENCE_JOB_ERROR_CAPACITY")? {
        config.job_error_capacity = capacity;
    }
    if let Some(level) = env_var("CADENCE_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(format) = env_parse::<LogFormat>("CADENCE_LOG_FORMAT")? {
        config.logging.format = format;
    }
    Ok(())
}

/// Get an optional environment variable, treating blank values as unset
fn env_var(key: &str) -> Option<String> {
    std::env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Parse an optional environment variable
///
/// # Errors
/// Returns `CadenceError::Config` naming the variable if parsing fails.
fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_var(key)
        .map(|raw| {
            raw.parse::<T>()
                .map_err(|e| CadenceError::Config(format!("Invalid value for {}: {}", key, e)))
        })
        .transpose()
}
