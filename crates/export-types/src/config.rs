//! Exporter configuration surface.
//!
//! Configuration file loading lives with the host process; this crate only
//! defines the deserializable structs and their defaults. Everything is
//! plain data so the components can be constructed without a config file.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Delimiter separating the index prefix from the parts the exporter owns.
///
/// Apply/remove retention operations are scoped to `<prefix>_*`. A sibling
/// component whose indices share only the literal prefix (for example
/// `<prefix>-operate-variable-...`) uses a different delimiter and must
/// never be matched.
pub const OWNED_INDEX_DELIMITER: char = '_';

/// Connection settings for the search backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectConfig {
    /// Comma-separated list of backend hosts
    #[serde(default = "default_url")]
    pub url: String,

    /// Basic auth username
    #[serde(default)]
    pub username: Option<String>,

    /// Basic auth password
    #[serde(default)]
    pub password: Option<String>,

    /// Request timeout in milliseconds
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Trust self-signed certificates on the backend
    #[serde(default)]
    pub accept_self_signed_certificates: bool,

    /// Proxy host, if requests must go through one
    #[serde(default)]
    pub proxy_host: Option<String>,

    /// Proxy port
    #[serde(default)]
    pub proxy_port: Option<u16>,

    /// Proxy basic auth username
    #[serde(default)]
    pub proxy_username: Option<String>,

    /// Proxy basic auth password
    #[serde(default)]
    pub proxy_password: Option<String>,

    /// Sign requests with AWS credentials. The signing itself is performed
    /// by the transport plumbing of the host process; the exporter only
    /// carries the settings through.
    #[serde(default)]
    pub aws_enabled: bool,

    /// AWS region used for request signing
    #[serde(default)]
    pub aws_region: Option<String>,

    /// AWS service name used for request signing (usually "es")
    #[serde(default)]
    pub aws_service_name: Option<String>,
}

fn default_url() -> String {
    "http://localhost:9200".to_string()
}

fn default_request_timeout_ms() -> u64 {
    30_000
}

impl Default for ConnectConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            username: None,
            password: None,
            request_timeout_ms: default_request_timeout_ms(),
            accept_self_signed_certificates: false,
            proxy_host: None,
            proxy_port: None,
            proxy_username: None,
            proxy_password: None,
            aws_enabled: false,
            aws_region: None,
            aws_service_name: None,
        }
    }
}

impl ConnectConfig {
    /// Split the comma-separated URL list into individual hosts.
    pub fn hosts(&self) -> Vec<String> {
        self.url
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

/// Batching and flush limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkConfig {
    /// Flush is advisable once the pending batch holds this many records
    #[serde(default = "default_bulk_size")]
    pub size: usize,

    /// Flush is advisable once the pending batch holds this many serialized
    /// bytes; also bounds the size of each outgoing bulk request
    #[serde(default = "default_bulk_memory_limit")]
    pub memory_limit: usize,

    /// How often the external scheduler should call flush, in milliseconds.
    /// Owned by the scheduler; carried here so one struct describes the
    /// whole surface.
    #[serde(default = "default_bulk_delay_ms")]
    pub delay_ms: u64,
}

fn default_bulk_size() -> usize {
    1_000
}

fn default_bulk_memory_limit() -> usize {
    10 * 1024 * 1024
}

fn default_bulk_delay_ms() -> u64 {
    5_000
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            size: default_bulk_size(),
            memory_limit: default_bulk_memory_limit(),
            delay_ms: default_bulk_delay_ms(),
        }
    }
}

/// Index naming and shard settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Prefix for every index, template and alias the exporter creates
    #[serde(default = "default_index_prefix")]
    pub prefix: String,

    /// Number of primary shards for created indices
    #[serde(default = "default_shards")]
    pub number_of_shards: u32,

    /// Number of replicas for created indices
    #[serde(default = "default_replicas")]
    pub number_of_replicas: u32,
}

fn default_index_prefix() -> String {
    "flow-record".to_string()
}

fn default_shards() -> u32 {
    3
}

fn default_replicas() -> u32 {
    0
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            prefix: default_index_prefix(),
            number_of_shards: default_shards(),
            number_of_replicas: default_replicas(),
        }
    }
}

impl IndexConfig {
    /// Pattern matching exactly the indices this exporter owns.
    ///
    /// Uses the owned delimiter so sibling indices that merely share the
    /// literal prefix stay out of scope.
    pub fn owned_index_pattern(&self) -> String {
        format!("{}{}*", self.prefix, OWNED_INDEX_DELIMITER)
    }
}

/// Age-based index deletion settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Retention is opt-in; nothing is deleted unless enabled
    #[serde(default)]
    pub enabled: bool,

    /// Age after which an owned index is deleted, as a backend duration
    /// string (e.g. "30d")
    #[serde(default = "default_minimum_age")]
    pub minimum_age: String,

    /// Name of the managed policy
    #[serde(default = "default_policy_name")]
    pub policy_name: String,

    /// Human-readable policy description
    #[serde(default = "default_policy_description")]
    pub policy_description: String,
}

fn default_minimum_age() -> String {
    "30d".to_string()
}

fn default_policy_name() -> String {
    "flow-record-retention-policy".to_string()
}

fn default_policy_description() -> String {
    "Delete exported stream records after the configured age".to_string()
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            minimum_age: default_minimum_age(),
            policy_name: default_policy_name(),
            policy_description: default_policy_description(),
        }
    }
}

/// Complete configuration consumed by the exporter components.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    #[serde(default)]
    pub connect: ConnectConfig,

    #[serde(default)]
    pub bulk: BulkConfig,

    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub retention: RetentionConfig,
}

impl ExporterConfig {
    /// Validate the configuration before any component is built from it.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connect.hosts().is_empty() {
            return Err(ConfigError::Connection(
                "at least one connection URL is required".to_string(),
            ));
        }
        if self.bulk.size == 0 {
            return Err(ConfigError::Bulk(
                "bulk size limit must be positive".to_string(),
            ));
        }
        if self.bulk.memory_limit == 0 {
            return Err(ConfigError::Bulk(
                "bulk memory limit must be positive".to_string(),
            ));
        }
        if self.index.prefix.is_empty() {
            return Err(ConfigError::Index("prefix must not be empty".to_string()));
        }
        if self.index.prefix.contains(OWNED_INDEX_DELIMITER) {
            return Err(ConfigError::Index(format!(
                "prefix must not contain the owned delimiter '{}'",
                OWNED_INDEX_DELIMITER
            )));
        }
        if self.index.number_of_shards == 0 {
            return Err(ConfigError::Index(
                "number_of_shards must be positive".to_string(),
            ));
        }
        if self.retention.enabled {
            if self.retention.policy_name.is_empty() {
                return Err(ConfigError::Retention(
                    "policy name must not be empty".to_string(),
                ));
            }
            if self.retention.minimum_age.is_empty() {
                return Err(ConfigError::Retention(
                    "minimum age must not be empty".to_string(),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ExporterConfig::default();
        assert!(config.validate().is_ok());
        assert!(!config.retention.enabled);
        assert_eq!(config.bulk.size, 1_000);
        assert_eq!(config.bulk.memory_limit, 10 * 1024 * 1024);
    }

    #[test]
    fn test_hosts_splitting() {
        let connect = ConnectConfig {
            url: "http://a:9200, http://b:9200 ,".to_string(),
            ..Default::default()
        };
        assert_eq!(connect.hosts(), vec!["http://a:9200", "http://b:9200"]);
    }

    #[test]
    fn test_owned_index_pattern() {
        let index = IndexConfig::default();
        assert_eq!(index.owned_index_pattern(), "flow-record_*");
    }

    #[test]
    fn test_zero_limits_rejected() {
        let mut config = ExporterConfig::default();
        config.bulk.size = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Bulk(_))));

        let mut config = ExporterConfig::default();
        config.bulk.memory_limit = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Bulk(_))));
    }

    #[test]
    fn test_empty_prefix_rejected() {
        let mut config = ExporterConfig::default();
        config.index.prefix = String::new();
        assert!(matches!(config.validate(), Err(ConfigError::Index(_))));
    }

    #[test]
    fn test_prefix_with_delimiter_rejected() {
        let mut config = ExporterConfig::default();
        config.index.prefix = "flow_record".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Index(_))));
    }

    #[test]
    fn test_retention_validation_only_when_enabled() {
        let mut config = ExporterConfig::default();
        config.retention.policy_name = String::new();
        assert!(config.validate().is_ok());

        config.retention.enabled = true;
        assert!(matches!(config.validate(), Err(ConfigError::Retention(_))));
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = ExporterConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let decoded: ExporterConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.index.prefix, "flow-record");
        assert_eq!(decoded.retention.minimum_age, "30d");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let decoded: ExporterConfig =
            serde_json::from_str(r#"{"bulk": {"size": 50}}"#).unwrap();
        assert_eq!(decoded.bulk.size, 50);
        assert_eq!(decoded.bulk.memory_limit, 10 * 1024 * 1024);
        assert_eq!(decoded.connect.url, "http://localhost:9200");
    }
}
