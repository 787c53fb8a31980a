//! Configuration validation.

use super::Config;
use crate::error::{Result, SyncError};
use crate::target::tls::SslMode;

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Source validation
    let has_conn_str = config
        .source
        .connection_string
        .as_ref()
        .is_some_and(|s| !s.trim().is_empty());
    if config.source.dsn.trim().is_empty() && !has_conn_str {
        return Err(SyncError::Config(
            "source.dsn or source.connection_string is required".into(),
        ));
    }
    if config.source.fetch_batch_size == 0 {
        return Err(SyncError::Config(
            "source.fetch_batch_size must be at least 1".into(),
        ));
    }
    if config.source.max_text_len == 0 {
        return Err(SyncError::Config(
            "source.max_text_len must be at least 1".into(),
        ));
    }

    // Target validation
    if config.target.host.is_empty() {
        return Err(SyncError::Config("target.host is required".into()));
    }
    if config.target.database.is_empty() {
        return Err(SyncError::Config("target.database is required".into()));
    }
    if config.target.user.is_empty() {
        return Err(SyncError::Config("target.user is required".into()));
    }
    if config.target.schema.is_empty() {
        return Err(SyncError::Config("target.schema cannot be empty".into()));
    }
    SslMode::parse(&config.target.ssl_mode)?;

    // Sync validation
    if config.sync.chunk_size == 0 {
        return Err(SyncError::Config(
            "sync.chunk_size must be at least 1".into(),
        ));
    }
    if config.sync.table_list.as_os_str().is_empty() {
        return Err(SyncError::Config("sync.table_list is required".into()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SourceConfig, SyncConfig, TargetConfig};

    fn valid_config() -> Config {
        Config {
            source: SourceConfig {
                dsn: "QuickBooks Data".to_string(),
                ..SourceConfig::default()
            },
            target: TargetConfig {
                host: "localhost".to_string(),
                database: "Internal".to_string(),
                user: "postgres".to_string(),
                password: "password".to_string(),
                ..TargetConfig::default()
            },
            sync: SyncConfig::default(),
        }
    }

    #[test]
    fn test_valid_config() {
        let config = valid_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_dsn_and_connection_string() {
        let mut config = valid_config();
        config.source.dsn = "".to_string();
        assert!(validate(&config).is_err());

        config.source.connection_string = Some("DSN=Other;".to_string());
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_target_database() {
        let mut config = valid_config();
        config.target.database = "".to_string();
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("target.database"));
    }

    #[test]
    fn test_missing_target_user() {
        let mut config = valid_config();
        config.target.user = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_unknown_ssl_mode() {
        let mut config = valid_config();
        config.target.ssl_mode = "sometimes".to_string();
        assert!(validate(&config).is_err());

        config.target.ssl_mode = "REQUIRE".to_string();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_zero_chunk_size() {
        let mut config = valid_config();
        config.sync.chunk_size = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_zero_fetch_batch_size() {
        let mut config = valid_config();
        config.source.fetch_batch_size = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_debug_output_hides_secrets() {
        let mut config = valid_config();
        config.source.password = Some("qb-pass-123".to_string());
        config.source.connection_string = Some("DSN=QB;PWD=qb-conn-456;".to_string());
        config.target.password = "pg-pass-789".to_string();

        let debug_output = format!("{:?}", config);
        for secret in ["qb-pass-123", "qb-conn-456", "pg-pass-789"] {
            assert!(!debug_output.contains(secret), "leaked {}", secret);
        }
        assert!(debug_output.contains("QuickBooks Data"));
        assert_eq!(debug_output.matches("[REDACTED]").count(), 3);
    }
}
