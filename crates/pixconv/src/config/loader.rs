use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

const SCHEMA_JSON: &str = include_str!("../../schema/config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: Config = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

/// Rejects unknown keys and wrongly typed values before deserializing.
fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(invalid(format!(
            "Unsupported config version: {}",
            config.version
        )));
    }

    if config.worker_count == 0 {
        return Err(invalid("worker_count must be at least 1"));
    }

    if config.max_upload_bytes == 0 {
        return Err(invalid("max_upload_bytes must be at least 1"));
    }

    if config.max_dimension == 0 {
        return Err(invalid("max_dimension must be at least 1"));
    }

    let segmentation = &config.segmentation;
    if segmentation.timeout_secs == 0 {
        return Err(invalid("segmentation.timeout_secs must be at least 1"));
    }

    if let Some(endpoint) = &segmentation.endpoint {
        if !(endpoint.starts_with("http://") || endpoint.starts_with("https://")) {
            return Err(invalid(format!(
                "segmentation.endpoint must be an http(s) URL, got '{}'",
                endpoint
            )));
        }
    }

    if let Some(var) = &segmentation.api_key_env {
        if var.trim().is_empty() {
            return Err(invalid("segmentation.api_key_env must not be empty"));
        }
    }

    Ok(())
}

fn invalid(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogFormat;

    #[test]
    fn test_load_minimal_config() {
        let config = load_config_from_str(r#"{ "version": "1.0" }"#).unwrap();
        assert!(config.worker_count >= 1);
        assert_eq!(config.max_upload_bytes, 10 * 1024 * 1024);
        assert_eq!(config.max_dimension, 16_384);
        assert_eq!(config.segmentation.timeout_secs, 30);
        assert!(config.segmentation.endpoint.is_none());
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.logging.format, LogFormat::Text);
    }

    #[test]
    fn test_load_full_config() {
        let config_json = r#"
        {
            "version": "1.0",
            "worker_count": 3,
            "max_upload_bytes": 2048,
            "max_dimension": 4096,
            "database_path": "/var/lib/pixconv/jobs.db",
            "segmentation": {
                "endpoint": "https://segment.internal/v1/remove",
                "timeout_secs": 5,
                "api_key_env": "SEGMENT_API_KEY"
            },
            "logging": { "level": "pixconv=debug", "format": "json" }
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(config.worker_count, 3);
        assert_eq!(config.max_upload_bytes, 2048);
        assert_eq!(
            config.database_path(),
            std::path::PathBuf::from("/var/lib/pixconv/jobs.db")
        );
        assert_eq!(config.segmentation.timeout_secs, 5);
        assert_eq!(
            config.segmentation.api_key_env.as_deref(),
            Some("SEGMENT_API_KEY")
        );
        assert_eq!(config.logging.format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_version() {
        let result = load_config_from_str(r#"{ "version": "2.0" }"#);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_zero_workers_rejected() {
        let result = load_config_from_str(r#"{ "version": "1.0", "worker_count": 0 }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_non_http_endpoint_rejected() {
        let config_json = r#"
        {
            "version": "1.0",
            "segmentation": { "endpoint": "ftp://example.com/segment" }
        }
        "#;
        let result = load_config_from_str(config_json);
        match result {
            Err(ConfigError::Validation { message }) => assert!(message.contains("http")),
            other => panic!("Expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_misspelled_key_rejected() {
        let config_json = r#"
        {
            "version": "1.0",
            "segmentaton": { "endpoint": "https://segment.internal/v1/remove" }
        }
        "#;
        match load_config_from_str(config_json) {
            Err(ConfigError::SchemaValidation { errors }) => assert!(errors.contains("segmentaton")),
            other => panic!("Expected schema validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_misspelled_nested_key_rejected() {
        let config_json = r#"
        {
            "version": "1.0",
            "logging": { "level": "debug", "fromat": "json" }
        }
        "#;
        assert!(matches!(
            load_config_from_str(config_json),
            Err(ConfigError::SchemaValidation { .. })
        ));
    }

    #[test]
    fn test_wrong_type_rejected_by_schema() {
        let result = load_config_from_str(r#"{ "version": "1.0", "worker_count": "four" }"#);
        assert!(matches!(result, Err(ConfigError::SchemaValidation { .. })));
    }

    #[test]
    fn test_unknown_key_rejected_without_schema() {
        let result: Result<Config, _> =
            serde_json::from_str(r#"{ "version": "1.0", "segmentaton": {} }"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_malformed_json() {
        let result = load_config_from_str("{ not json");
        assert!(matches!(result, Err(ConfigError::ParseJson(_))));
    }

    #[test]
    fn test_load_config_missing_file() {
        let result = load_config("/nonexistent/pixconv.json");
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pixconv.json");
        std::fs::write(&path, r#"{ "version": "1.0", "worker_count": 2 }"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.worker_count, 2);
    }
}
