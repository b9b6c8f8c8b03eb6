use std::{env, time::Duration};

use dynorm_core::retry::RetryConfig;

/// The storage service accepts at most this many keys per batch read.
pub const MAX_BATCH_GET_KEYS: usize = 100;

/// Data-access configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// AWS region (default: "us-east-1")
    pub region: String,
    /// Custom endpoint URL, e.g. a local DynamoDB (default: unset)
    pub endpoint_url: Option<String>,
    /// Prefix prepended to collection names to form table names (default: "")
    pub table_prefix: String,
    /// Retries allowed for unprocessed batch keys (default: 8)
    pub batch_max_retries: u32,
    /// First backoff delay in milliseconds (default: 50)
    pub batch_initial_backoff_ms: u64,
    /// Backoff ceiling in milliseconds (default: 5,000)
    pub batch_max_backoff_ms: u64,
    /// Keys per batch read request, 1..=100 (default: 100)
    pub batch_chunk_size: usize,
    /// Deadline for each storage round trip in milliseconds (default: none)
    pub operation_timeout_ms: Option<u64>,
    /// Use strongly consistent reads for get and batch get (default: false)
    pub consistent_reads: bool,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `AWS_REGION` - AWS region (default: "us-east-1")
    /// - `AWS_ENDPOINT_URL` - Custom endpoint URL (optional)
    /// - `DYNORM_TABLE_PREFIX` - Table name prefix (default: "")
    /// - `DYNORM_BATCH_MAX_RETRIES` - Unprocessed-key retries (default: 8)
    /// - `DYNORM_BATCH_INITIAL_BACKOFF_MS` - First retry delay (default: 50)
    /// - `DYNORM_BATCH_MAX_BACKOFF_MS` - Retry delay ceiling (default: 5,000)
    /// - `DYNORM_BATCH_CHUNK_SIZE` - Keys per batch request (default: 100)
    /// - `DYNORM_OPERATION_TIMEOUT_MS` - Per-call deadline, 0 disables (default: unset)
    /// - `DYNORM_CONSISTENT_READS` - "true"/"1" for consistent reads (default: false)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |key: &str| lookup(key).and_then(|v| v.trim().parse::<u64>().ok());

        Self {
            region: lookup("AWS_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            endpoint_url: lookup("AWS_ENDPOINT_URL").filter(|v| !v.trim().is_empty()),
            table_prefix: lookup("DYNORM_TABLE_PREFIX").unwrap_or_default(),
            batch_max_retries: parsed("DYNORM_BATCH_MAX_RETRIES")
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(8),
            batch_initial_backoff_ms: parsed("DYNORM_BATCH_INITIAL_BACKOFF_MS").unwrap_or(50),
            batch_max_backoff_ms: parsed("DYNORM_BATCH_MAX_BACKOFF_MS").unwrap_or(5_000),
            batch_chunk_size: parsed("DYNORM_BATCH_CHUNK_SIZE")
                .map(|v| (v as usize).clamp(1, MAX_BATCH_GET_KEYS))
                .unwrap_or(MAX_BATCH_GET_KEYS),
            operation_timeout_ms: parsed("DYNORM_OPERATION_TIMEOUT_MS").filter(|ms| *ms > 0),
            consistent_reads: lookup("DYNORM_CONSISTENT_READS")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(false),
        }
    }

    /// Get the unprocessed-keys retry policy.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.batch_max_retries,
            initial_delay: Duration::from_millis(self.batch_initial_backoff_ms),
            max_delay: Duration::from_millis(self.batch_max_backoff_ms),
        }
    }

    /// Get the per-call deadline as a Duration.
    pub fn operation_timeout(&self) -> Option<Duration> {
        self.operation_timeout_ms.map(Duration::from_millis)
    }

    /// Table name backing a collection.
    pub fn table_name(&self, collection: &str) -> String {
        format!("{}{}", self.table_prefix, collection)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn from_vars(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_default_values() {
        let config = from_vars(&[]);

        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.endpoint_url, None);
        assert_eq!(config.table_prefix, "");
        assert_eq!(config.batch_max_retries, 8);
        assert_eq!(config.batch_chunk_size, 100);
        assert_eq!(config.operation_timeout(), None);
        assert!(!config.consistent_reads);
    }

    #[test]
    fn test_overrides() {
        let config = from_vars(&[
            ("AWS_REGION", "eu-west-1"),
            ("AWS_ENDPOINT_URL", "http://localhost:8000"),
            ("DYNORM_TABLE_PREFIX", "test_"),
            ("DYNORM_OPERATION_TIMEOUT_MS", "1500"),
            ("DYNORM_CONSISTENT_READS", "true"),
        ]);

        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.endpoint_url.as_deref(), Some("http://localhost:8000"));
        assert_eq!(config.table_name("users"), "test_users");
        assert_eq!(config.operation_timeout(), Some(Duration::from_millis(1500)));
        assert!(config.consistent_reads);
    }

    #[test]
    fn test_zero_timeout_disables_deadline() {
        let config = from_vars(&[("DYNORM_OPERATION_TIMEOUT_MS", "0")]);
        assert_eq!(config.operation_timeout(), None);
    }

    #[test]
    fn test_chunk_size_is_clamped() {
        assert_eq!(from_vars(&[("DYNORM_BATCH_CHUNK_SIZE", "500")]).batch_chunk_size, 100);
        assert_eq!(from_vars(&[("DYNORM_BATCH_CHUNK_SIZE", "0")]).batch_chunk_size, 1);
    }

    #[test]
    fn test_retry_config_conversion() {
        let config = from_vars(&[
            ("DYNORM_BATCH_MAX_RETRIES", "3"),
            ("DYNORM_BATCH_INITIAL_BACKOFF_MS", "10"),
            ("DYNORM_BATCH_MAX_BACKOFF_MS", "40"),
        ]);

        assert_eq!(
            config.retry_config(),
            RetryConfig {
                max_retries: 3,
                initial_delay: Duration::from_millis(10),
                max_delay: Duration::from_millis(40),
            }
        );
    }
}
