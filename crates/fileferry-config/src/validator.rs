//! Configuration validation.

use crate::schema::FerryConfig;

#[cfg(test)]
#[path = "validator_tests.rs"]
mod tests;

/// Validation result.
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
    }

    pub fn add_warning(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }
}

/// A validation error.
#[derive(Debug)]
pub struct ValidationError {
    pub path: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// A validation warning.
#[derive(Debug)]
pub struct ValidationWarning {
    pub path: String,
    pub message: String,
}

impl ValidationWarning {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Configuration validator.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration.
    pub fn validate(config: &FerryConfig) -> ValidationResult {
        let mut result = ValidationResult::default();

        Self::validate_store(config, &mut result);
        Self::validate_source(config, &mut result);
        Self::validate_destination(config, &mut result);
        Self::validate_worker(config, &mut result);
        Self::validate_queue(config, &mut result);

        result
    }

    fn validate_store(config: &FerryConfig, result: &mut ValidationResult) {
        if config.store.path.is_empty() {
            result.add_error(ValidationError::new(
                "store.path",
                "Database path cannot be empty",
            ));
        }
    }

    fn validate_source(config: &FerryConfig, result: &mut ValidationResult) {
        if let Err(e) = url::Url::parse(&config.source.endpoint) {
            result.add_error(ValidationError::new(
                "source.endpoint",
                format!("Not a valid URL: {}", e),
            ));
        }

        if config.source.bucket.is_empty() {
            result.add_error(ValidationError::new(
                "source.bucket",
                "Bucket cannot be empty",
            ));
        }

        if config.source.access_key_id.is_empty() {
            result.add_warning(ValidationWarning::new(
                "source.access_key_id",
                "Access key is not set, may need to be set via environment variable",
            ));
        }

        if config.source.prefix.is_empty() {
            result.add_warning(ValidationWarning::new(
                "source.prefix",
                "Empty prefix lists the whole bucket",
            ));
        }
    }

    fn validate_destination(config: &FerryConfig, result: &mut ValidationResult) {
        if config.destination.endpoint.is_empty() {
            result.add_error(ValidationError::new(
                "destination.endpoint",
                "Endpoint cannot be empty",
            ));
        } else if let Err(e) = url::Url::parse(&config.destination.endpoint) {
            result.add_error(ValidationError::new(
                "destination.endpoint",
                format!("Not a valid URL: {}", e),
            ));
        }

        if config.destination.bucket.is_empty() {
            result.add_error(ValidationError::new(
                "destination.bucket",
                "Bucket cannot be empty",
            ));
        }

        if config.destination.access_key_id.is_empty() {
            result.add_error(ValidationError::new(
                "destination.access_key_id",
                "Uploads require an access key",
            ));
        }

        if config.destination.secret_access_key.is_empty() {
            result.add_error(ValidationError::new(
                "destination.secret_access_key",
                "Uploads require a secret key",
            ));
        }
    }

    fn validate_worker(config: &FerryConfig, result: &mut ValidationResult) {
        if config.worker.poll_interval_secs == 0 {
            result.add_error(ValidationError::new(
                "worker.poll_interval_secs",
                "poll_interval_secs must be greater than 0",
            ));
        }

        if config.worker.work_dir.is_empty() {
            result.add_error(ValidationError::new(
                "worker.work_dir",
                "Work directory cannot be empty",
            ));
        }

        if config.worker.stale_after_secs > 0 && config.worker.stale_after_secs < 60 {
            result.add_warning(ValidationWarning::new(
                "worker.stale_after_secs",
                "stale_after_secs is very low (<60), in-flight tasks may be reclaimed while still running",
            ));
        }
    }

    fn validate_queue(config: &FerryConfig, result: &mut ValidationResult) {
        if config.queue.max_attempts == 0 {
            result.add_error(ValidationError::new(
                "queue.max_attempts",
                "max_attempts must be greater than 0",
            ));
        }

        if config.queue.max_attempts > 10 {
            result.add_warning(ValidationWarning::new(
                "queue.max_attempts",
                "max_attempts is very high (>10), failing tasks will be retried many times",
            ));
        }

        if config.queue.claim_retries == 0 {
            result.add_error(ValidationError::new(
                "queue.claim_retries",
                "claim_retries must be greater than 0",
            ));
        }
    }
}
