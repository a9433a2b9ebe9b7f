// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mapping of attachment URLs to fetchable HTTP(S) URLs.

use herald_config::AttachmentConfig;
use herald_core::HeraldError;
use reqwest::Url;

/// Rewrite an attachment URL into the HTTP(S) URL it is downloaded from.
///
/// | input | default target |
/// |---|---|
/// | `http(s)://...` | unchanged |
/// | `s3://bucket/key` | `https://bucket.s3.amazonaws.com/key` |
/// | `gs://bucket/key` | `https://storage.googleapis.com/bucket/key` |
/// | `azure://account/container/blob` | `https://account.blob.core.windows.net/container/blob` |
///
/// Configured endpoints replace the defaults with path-style addressing.
pub fn http_url(location: &str, config: &AttachmentConfig) -> Result<Url, HeraldError> {
    let parsed = Url::parse(location).map_err(|e| HeraldError::AttachmentDownload {
        url: location.to_string(),
        message: format!("invalid URL: {e}"),
        status: None,
    })?;

    let rewritten = match parsed.scheme() {
        "http" | "https" => return Ok(parsed),
        "s3" => {
            let (bucket, key) = split_object(&parsed, location)?;
            match config.s3_endpoint.as_deref() {
                Some(endpoint) => format!("{}/{bucket}{key}", endpoint.trim_end_matches('/')),
                None => format!("https://{bucket}.s3.amazonaws.com{key}"),
            }
        }
        "gs" => {
            let (bucket, key) = split_object(&parsed, location)?;
            format!("{}/{bucket}{key}", config.gcs_endpoint.trim_end_matches('/'))
        }
        "azure" => {
            let (account, blob_path) = split_object(&parsed, location)?;
            match config.azure_endpoint.as_deref() {
                Some(endpoint) => {
                    format!("{}/{account}{blob_path}", endpoint.trim_end_matches('/'))
                }
                None => format!("https://{account}.blob.core.windows.net{blob_path}"),
            }
        }
        other => {
            return Err(HeraldError::AttachmentDownload {
                url: location.to_string(),
                message: format!("unsupported URL scheme `{other}`"),
                status: None,
            });
        }
    };

    let with_query = match parsed.query() {
        Some(query) => format!("{rewritten}?{query}"),
        None => rewritten,
    };

    Url::parse(&with_query).map_err(|e| HeraldError::AttachmentDownload {
        url: location.to_string(),
        message: format!("invalid object storage URL: {e}"),
        status: None,
    })
}

/// Host and path (with leading `/`) of an object-storage URL.
fn split_object<'a>(parsed: &'a Url, location: &str) -> Result<(&'a str, &'a str), HeraldError> {
    let host = parsed
        .host_str()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| HeraldError::AttachmentDownload {
            url: location.to_string(),
            message: "missing bucket or account name".to_string(),
            status: None,
        })?;
    let path = parsed.path();
    if path.trim_matches('/').is_empty() {
        return Err(HeraldError::AttachmentDownload {
            url: location.to_string(),
            message: "missing object key".to_string(),
            status: None,
        });
    }
    Ok((host, path))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rewrite(location: &str) -> String {
        http_url(location, &AttachmentConfig::default())
            .unwrap()
            .to_string()
    }

    #[test]
    fn http_urls_pass_through() {
        assert_eq!(
            rewrite("https://cdn.example.com/a/b.pdf?x=1"),
            "https://cdn.example.com/a/b.pdf?x=1"
        );
    }

    #[test]
    fn object_storage_defaults() {
        assert_eq!(
            rewrite("s3://invoices/2024/march.pdf"),
            "https://invoices.s3.amazonaws.com/2024/march.pdf"
        );
        assert_eq!(
            rewrite("gs://assets/logo.png"),
            "https://storage.googleapis.com/assets/logo.png"
        );
        assert_eq!(
            rewrite("azure://acme/public/banner.jpg?sv=2024&sig=abc"),
            "https://acme.blob.core.windows.net/public/banner.jpg?sv=2024&sig=abc"
        );
    }

    #[test]
    fn configured_endpoints_use_path_style() {
        let config = AttachmentConfig {
            s3_endpoint: Some("http://127.0.0.1:9000/".into()),
            azure_endpoint: Some("http://127.0.0.1:10000".into()),
            ..Default::default()
        };
        assert_eq!(
            http_url("s3://bucket/key.txt", &config).unwrap().as_str(),
            "http://127.0.0.1:9000/bucket/key.txt"
        );
        assert_eq!(
            http_url("azure://devstore/c/blob.bin", &config)
                .unwrap()
                .as_str(),
            "http://127.0.0.1:10000/devstore/c/blob.bin"
        );
    }

    #[test]
    fn rejects_unsupported_or_incomplete_urls() {
        let config = AttachmentConfig::default();
        let err = http_url("ftp://files.example.com/a.txt", &config).unwrap_err();
        assert!(
            matches!(err, HeraldError::AttachmentDownload { ref message, .. } if message.contains("ftp"))
        );
        assert!(http_url("s3://bucket", &config).is_err());
        assert!(http_url("s3://bucket/", &config).is_err());
        assert!(http_url("not a url", &config).is_err());
    }
}
