//! Configuration loader.

use std::fs;
use std::path::Path;

use crate::error::ConfigError;
use crate::schema::FerryConfig;

/// Configuration loader with environment variable substitution.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<FerryConfig, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }
        let content = fs::read_to_string(path)?;
        Self::load_str(&content)
    }

    /// Load configuration from a string.
    pub fn load_str(content: &str) -> Result<FerryConfig, ConfigError> {
        let expanded = Self::expand_env_vars(content)?;
        let config: FerryConfig = toml::from_str(&expanded)?;
        Ok(config)
    }

    /// Expand environment variables in the format `${VAR}`.
    fn expand_env_vars(content: &str) -> Result<String, ConfigError> {
        let mut result = content.to_string();
        let re = regex::Regex::new(r"\$\{([^}]+)\}").unwrap();

        for cap in re.captures_iter(content) {
            let var_name = &cap[1];
            let var_value = std::env::var(var_name)
                .map_err(|_| ConfigError::EnvVarNotSet(var_name.to_string()))?;
            result = result.replace(&cap[0], &var_value);
        }

        Ok(result)
    }

    /// Expand shell-style paths (e.g., `~/.fileferry`).
    pub fn expand_path(path: &str) -> String {
        shellexpand::tilde(path).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_empty_config() {
        let config = ConfigLoader::load_str("").unwrap();
        assert_eq!(config.source.bucket, "flatfiles");
        assert_eq!(config.queue.max_attempts, 3);
    }

    #[test]
    fn test_load_basic_config() {
        let content = r#"
            [store]
            path = "/var/lib/fileferry/tasks.db"

            [worker]
            poll_interval_secs = 2
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.store.path, "/var/lib/fileferry/tasks.db");
        assert_eq!(config.worker.poll_interval_secs, 2);
    }

    #[test]
    fn test_load_full_config() {
        let content = r#"
            [store]
            path = "ferry.db"

            [source]
            endpoint = "http://localhost:9000"
            bucket = "market-data"
            access_key_id = "src-key"
            secret_access_key = "src-secret"
            prefix = "us_options_opra/day_aggs_v1"
            suffix = ".csv.gz"

            [destination]
            endpoint = "http://localhost:9001"
            bucket = "archive"
            access_key_id = "dst-key"
            secret_access_key = "dst-secret"

            [worker]
            id = "ferry-1"
            work_dir = "/tmp/ferry"
            stale_after_secs = 600

            [queue]
            max_attempts = 5
        "#;
        let config = ConfigLoader::load_str(content).unwrap();
        assert_eq!(config.source.bucket, "market-data");
        assert_eq!(config.source.prefix, "us_options_opra/day_aggs_v1");
        assert_eq!(config.destination.endpoint, "http://localhost:9001");
        assert_eq!(config.worker.effective_id(), "ferry-1");
        assert_eq!(config.worker.stale_after_secs, 600);
        assert_eq!(config.queue.max_attempts, 5);

        // Unset sections keep their defaults.
        assert_eq!(config.queue.claim_retries, 5);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "[store]").unwrap();
        writeln!(file, "path = \"from-file.db\"").unwrap();

        let config = ConfigLoader::load(file.path()).unwrap();
        assert_eq!(config.store.path, "from-file.db");
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = ConfigLoader::load(Path::new("/nonexistent/path/fileferry.toml"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_load_invalid_toml() {
        let content = "invalid = [unclosed";
        let result = ConfigLoader::load_str(content);
        assert!(result.is_err());
    }

    #[test]
    fn test_expand_env_vars() {
        // SAFETY: This test runs in isolation and sets a unique test-only env var
        unsafe {
            std::env::set_var("FERRY_TEST_SECRET", "s3cr3t");
        }
        let content = "secret_access_key = \"${FERRY_TEST_SECRET}\"";
        let expanded = ConfigLoader::expand_env_vars(content).unwrap();
        assert!(expanded.contains("s3cr3t"));
        unsafe {
            std::env::remove_var("FERRY_TEST_SECRET");
        }
    }

    #[test]
    fn test_expand_env_vars_not_set() {
        let content = "secret_access_key = \"${FERRY_NONEXISTENT_VAR_12345}\"";
        let result = ConfigLoader::expand_env_vars(content);
        assert!(matches!(result, Err(ConfigError::EnvVarNotSet(_))));
    }

    #[test]
    fn test_expand_env_vars_no_vars() {
        let content = "bucket = \"no variables here\"";
        let expanded = ConfigLoader::expand_env_vars(content).unwrap();
        assert_eq!(expanded, content);
    }

    #[test]
    fn test_expand_path_no_tilde() {
        let path = "/var/lib/fileferry";
        let expanded = ConfigLoader::expand_path(path);
        assert_eq!(expanded, path);
    }

    #[test]
    fn test_expand_path_with_tilde() {
        let expanded = ConfigLoader::expand_path("~/ferry");
        assert!(!expanded.starts_with('~'));
        assert!(expanded.ends_with("/ferry"));
    }
}
