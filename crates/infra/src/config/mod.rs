//! Configuration loading
//!
//! Loads [`SchedulerConfig`](cadence_domain::SchedulerConfig) from a TOML or
//! JSON file and applies environment overrides.

pub mod loader;

// Re-export commonly used items
pub use loader::{apply_env_overrides, load, load_from_file, probe_config_paths};
