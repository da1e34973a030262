//! Elastic Cloud deployment identifiers.
//!
//! A cloud id looks like `name:BASE64` where the payload decodes to
//! `host$es_uuid$kibana_uuid`, optionally with a `:port` suffix on the host.

use base64::engine::general_purpose::{STANDARD, STANDARD_NO_PAD};
use base64::Engine;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CloudIdError {
    #[error("Cloud id must have the form <name>:<base64 payload>")]
    MissingSeparator,

    #[error("Cloud id payload is not valid base64: {0}")]
    Base64(String),

    #[error("Cloud id payload is not valid UTF-8")]
    Utf8,

    #[error("Cloud id payload must contain host$es_uuid[$kibana_uuid]")]
    Segments,
}

/// Service URLs encoded in a cloud id.
#[derive(Debug, Clone, PartialEq)]
pub struct CloudEndpoints {
    pub deployment_name: String,
    pub elasticsearch_url: String,
    pub kibana_url: Option<String>,
}

pub fn decode_cloud_id(cloud_id: &str) -> Result<CloudEndpoints, CloudIdError> {
    let (name, payload) = cloud_id
        .trim()
        .split_once(':')
        .ok_or(CloudIdError::MissingSeparator)?;

    let bytes = STANDARD
        .decode(payload)
        .or_else(|_| STANDARD_NO_PAD.decode(payload.trim_end_matches('=')))
        .map_err(|e| CloudIdError::Base64(e.to_string()))?;
    let decoded = String::from_utf8(bytes).map_err(|_| CloudIdError::Utf8)?;

    let mut parts = decoded.trim_end().split('$');
    let host = parts.next().filter(|s| !s.is_empty()).ok_or(CloudIdError::Segments)?;
    let es_uuid = parts.next().filter(|s| !s.is_empty()).ok_or(CloudIdError::Segments)?;
    let kibana_uuid = parts.next().filter(|s| !s.is_empty());

    let (host, port) = match host.rsplit_once(':') {
        Some((h, p)) if p.chars().all(|c| c.is_ascii_digit()) && !p.is_empty() => (h, Some(p)),
        _ => (host, None),
    };
    let url_for = |uuid: &str| match port {
        Some(port) => format!("https://{}.{}:{}", uuid, host, port),
        None => format!("https://{}.{}", uuid, host),
    };

    Ok(CloudEndpoints {
        deployment_name: name.to_string(),
        elasticsearch_url: url_for(es_uuid),
        kibana_url: kibana_uuid.map(url_for),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn encode(payload: &str) -> String {
        STANDARD.encode(payload)
    }

    #[test]
    fn test_decode_full_cloud_id() {
        let id = format!("oilfield:{}", encode("us-central1.gcp.cloud.es.io$abc123$def456"));
        let endpoints = decode_cloud_id(&id).unwrap();

        assert_eq!(endpoints.deployment_name, "oilfield");
        assert_eq!(
            endpoints.elasticsearch_url,
            "https://abc123.us-central1.gcp.cloud.es.io"
        );
        assert_eq!(
            endpoints.kibana_url.as_deref(),
            Some("https://def456.us-central1.gcp.cloud.es.io")
        );
    }

    #[test]
    fn test_decode_honours_port() {
        let id = format!("dep:{}", encode("eu-west-1.aws.found.io:9243$es$kb"));
        let endpoints = decode_cloud_id(&id).unwrap();
        assert_eq!(endpoints.elasticsearch_url, "https://es.eu-west-1.aws.found.io:9243");
        assert_eq!(
            endpoints.kibana_url.as_deref(),
            Some("https://kb.eu-west-1.aws.found.io:9243")
        );
    }

    #[test]
    fn test_decode_without_kibana_segment() {
        let id = format!("dep:{}", encode("host.example$es"));
        let endpoints = decode_cloud_id(&id).unwrap();
        assert_eq!(endpoints.elasticsearch_url, "https://es.host.example");
        assert_eq!(endpoints.kibana_url, None);
    }

    #[test]
    fn test_decode_errors() {
        assert_eq!(decode_cloud_id("no-separator"), Err(CloudIdError::MissingSeparator));
        assert!(matches!(
            decode_cloud_id("dep:!!!not base64!!!"),
            Err(CloudIdError::Base64(_))
        ));
        let id = format!("dep:{}", encode("only-host"));
        assert_eq!(decode_cloud_id(&id), Err(CloudIdError::Segments));
    }
}
