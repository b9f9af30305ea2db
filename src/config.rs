//! Configuration for treesync
//!
//! Priority chain, lowest to highest:
//! 1. Built-in defaults (`Config::default()`)
//! 2. Config file (`--config PATH` or `$TREESYNC_CONFIG`; `.toml`, `.json` or `.json5`)
//! 3. Environment variables (`TREESYNC_*`)
//! 4. CLI flags
//!
//! The execution mode is deliberately absent: only `--force` on the command
//! line leaves dry-run.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{SyncError, SyncResult};
use crate::identity::BUF_SIZE;
use crate::validation::{
	validate_backlog_factor, validate_buffer_size, validate_jobs, ValidationError, Validator,
};
use crate::walker::{default_pool_size, DEFAULT_BACKLOG_FACTOR};

/// Environment variable naming a config file
pub const CONFIG_ENV: &str = "TREESYNC_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	/// Worker pool size (None = number of processing units)
	pub jobs: Option<usize>,

	/// In-flight work items allowed per worker
	pub backlog_factor: usize,

	/// Read buffer for content hashing, in bytes
	pub buffer_size: usize,

	/// Descend into symlinked directories and hash link targets
	pub follow_symlinks: bool,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			jobs: None,
			backlog_factor: DEFAULT_BACKLOG_FACTOR,
			buffer_size: BUF_SIZE,
			follow_symlinks: false,
		}
	}
}

impl Config {
	/// Defaults, overlaid with the config file (explicit path, else
	/// `$TREESYNC_CONFIG`) and the environment
	pub fn load(path: Option<&Path>) -> SyncResult<Self> {
		let file = path.map(Path::to_path_buf).or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));
		let mut config = match file {
			Some(file) => Config::from_file(&file)?,
			None => Config::default(),
		};
		config.apply_env(|key| env::var(key).ok())?;
		Ok(config)
	}

	/// Parse a config file; the format is picked by extension
	pub fn from_file(path: &Path) -> SyncResult<Self> {
		let contents = fs::read_to_string(path).map_err(|e| SyncError::io(path, e))?;
		let ext = path.extension().and_then(|e| e.to_str()).map(str::to_lowercase);
		let parsed = match ext.as_deref() {
			Some("json") | Some("json5") => json5::from_str(&contents).map_err(|e| e.to_string()),
			_ => toml::from_str(&contents).map_err(|e| e.to_string()),
		};
		parsed.map_err(|message| SyncError::Config { path: path.to_path_buf(), message })
	}

	/// Overlay `TREESYNC_*` variables read through `lookup`
	pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ValidationError>
	where
		F: Fn(&str) -> Option<String>,
	{
		if let Some(v) = lookup("TREESYNC_JOBS") {
			self.jobs = Some(parse_env("TREESYNC_JOBS", &v)?);
		}
		if let Some(v) = lookup("TREESYNC_BACKLOG_FACTOR") {
			self.backlog_factor = parse_env("TREESYNC_BACKLOG_FACTOR", &v)?;
		}
		if let Some(v) = lookup("TREESYNC_BUFFER_SIZE") {
			self.buffer_size = parse_env("TREESYNC_BUFFER_SIZE", &v)?;
		}
		if let Some(v) = lookup("TREESYNC_FOLLOW_SYMLINKS") {
			self.follow_symlinks = parse_bool("TREESYNC_FOLLOW_SYMLINKS", &v)?;
		}
		Ok(())
	}

	/// Effective worker count
	pub fn pool_size(&self) -> usize {
		self.jobs.unwrap_or_else(default_pool_size)
	}
}

impl Validator for Config {
	fn validate(&self) -> Result<(), ValidationError> {
		if let Some(jobs) = self.jobs {
			validate_jobs(jobs)?;
		}
		validate_backlog_factor(self.backlog_factor)?;
		validate_buffer_size(self.buffer_size)
	}
}

fn parse_env(key: &str, value: &str) -> Result<usize, ValidationError> {
	value.trim().parse::<usize>().map_err(|_| {
		ValidationError::ConfigError(format!("{} must be a positive integer, got {:?}", key, value))
	})
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ValidationError> {
	match value.trim().to_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" | "" => Ok(false),
		_ => Err(ValidationError::ConfigError(format!("{} must be a boolean, got {:?}", key, value))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;
	use tempfile::TempDir;

	#[test]
	fn test_config_default() {
		let config = Config::default();
		assert_eq!(config.jobs, None);
		assert_eq!(config.backlog_factor, 3);
		assert_eq!(config.buffer_size, 65536);
		assert!(!config.follow_symlinks);
		assert!(config.validate().is_ok());
		assert!(config.pool_size() >= 1);
	}

	#[test]
	fn test_toml_file_overrides_defaults() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("treesync.toml");
		fs::write(&path, "jobs = 4\nbacklogFactor = 5\n").unwrap();

		let config = Config::from_file(&path).unwrap();
		assert_eq!(config.jobs, Some(4));
		assert_eq!(config.backlog_factor, 5);
		assert_eq!(config.buffer_size, BUF_SIZE);
		assert_eq!(config.pool_size(), 4);
	}

	#[test]
	fn test_json5_file() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("treesync.json5");
		fs::write(&path, "{ // comment\n followSymlinks: true, bufferSize: 4096, }").unwrap();

		let config = Config::from_file(&path).unwrap();
		assert!(config.follow_symlinks);
		assert_eq!(config.buffer_size, 4096);
	}

	#[test]
	fn test_malformed_file_reports_path() {
		let tmp = TempDir::new().unwrap();
		let path = tmp.path().join("bad.toml");
		fs::write(&path, "jobs = [").unwrap();

		let err = Config::from_file(&path).unwrap_err();
		assert!(matches!(err, SyncError::Config { .. }));
		assert_eq!(err.path(), Some(path.as_path()));
	}

	#[test]
	fn test_env_overrides() {
		let vars: HashMap<&str, &str> =
			[("TREESYNC_JOBS", "7"), ("TREESYNC_FOLLOW_SYMLINKS", "yes")].iter().cloned().collect();
		let mut config = Config::default();
		config.apply_env(|k| vars.get(k).map(|v| v.to_string())).unwrap();
		assert_eq!(config.jobs, Some(7));
		assert!(config.follow_symlinks);
	}

	#[test]
	fn test_env_rejects_garbage() {
		let mut config = Config::default();
		let result = config.apply_env(|k| if k == "TREESYNC_JOBS" { Some("many".to_string()) } else { None });
		assert!(result.unwrap_err().to_string().contains("TREESYNC_JOBS"));
	}

	#[test]
	fn test_validate_rejects_zero() {
		let config = Config { jobs: Some(0), ..Config::default() };
		assert!(config.validate().is_err());
		let config = Config { backlog_factor: 0, ..Config::default() };
		assert!(config.validate().is_err());
	}
}

// vim: ts=4
