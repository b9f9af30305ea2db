//! Configuration validation functions

use super::ValidationError;

/// Upper bound for an explicit worker count
pub const MAX_JOBS: usize = 1024;

/// Validate an explicit worker pool size
pub fn validate_jobs(jobs: usize) -> Result<(), ValidationError> {
	if jobs == 0 {
		return Err(ValidationError::ConfigError("jobs must be greater than 0".to_string()));
	}
	if jobs > MAX_JOBS {
		return Err(ValidationError::ConfigError(format!(
			"jobs must be at most {}, got {}",
			MAX_JOBS, jobs
		)));
	}
	Ok(())
}

/// Validate the in-flight multiplier applied to the pool size
pub fn validate_backlog_factor(factor: usize) -> Result<(), ValidationError> {
	if factor == 0 {
		return Err(ValidationError::ConfigError(
			"backlogFactor must be greater than 0".to_string(),
		));
	}
	Ok(())
}

/// Validate the read buffer used for hashing
pub fn validate_buffer_size(size: usize) -> Result<(), ValidationError> {
	if size == 0 {
		return Err(ValidationError::ConfigError("bufferSize must be greater than 0".to_string()));
	}
	Ok(())
}


// vim: ts=4
