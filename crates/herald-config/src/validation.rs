// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.

use crate::diagnostic::ConfigError;
use crate::model::HeraldConfig;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns every validation error found, not just the first.
pub fn validate_config(config: &HeraldConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.dispatch.max_notifications_per_pass == Some(0) {
        errors.push(ConfigError::Validation {
            message: "dispatch.max_notifications_per_pass must be at least 1 when set"
                .to_string(),
        });
    }

    let attachments = &config.attachments;
    if attachments.max_size_bytes == 0 {
        errors.push(ConfigError::Validation {
            message: "attachments.max_size_bytes must be greater than 0".to_string(),
        });
    }

    if attachments.download_timeout_secs == 0 {
        errors.push(ConfigError::Validation {
            message: "attachments.download_timeout_secs must be greater than 0".to_string(),
        });
    }

    if attachments.user_agent.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "attachments.user_agent must not be empty".to_string(),
        });
    }

    let endpoints = [
        ("attachments.s3_endpoint", attachments.s3_endpoint.as_deref()),
        ("attachments.gcs_endpoint", Some(attachments.gcs_endpoint.as_str())),
        ("attachments.azure_endpoint", attachments.azure_endpoint.as_deref()),
    ];
    for (key, endpoint) in endpoints {
        if let Some(endpoint) = endpoint
            && !is_http_endpoint(endpoint)
        {
            errors.push(ConfigError::Validation {
                message: format!("{key} `{endpoint}` must be an http:// or https:// URL"),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_http_endpoint(endpoint: &str) -> bool {
    let rest = endpoint
        .strip_prefix("https://")
        .or_else(|| endpoint.strip_prefix("http://"));
    matches!(rest, Some(host) if !host.trim_end_matches('/').is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate_config(&HeraldConfig::default()).is_ok());
    }

    #[test]
    fn collects_all_errors() {
        let mut config = HeraldConfig::default();
        config.attachments.max_size_bytes = 0;
        config.attachments.download_timeout_secs = 0;
        config.attachments.gcs_endpoint = "ftp://storage".into();
        config.dispatch.max_notifications_per_pass = Some(0);
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn empty_user_agent_rejected() {
        let mut config = HeraldConfig::default();
        config.attachments.user_agent = "  ".into();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("user_agent"));
    }

    #[test]
    fn endpoint_requires_host() {
        assert!(is_http_endpoint("http://127.0.0.1:9000"));
        assert!(is_http_endpoint("https://storage.googleapis.com/"));
        assert!(!is_http_endpoint("https://"));
        assert!(!is_http_endpoint("s3://bucket"));
    }
}
