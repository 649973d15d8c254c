use async_trait::async_trait;
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

use crate::config::JiraConfig;
use crate::http::{BasicCredentials, RateLimitedHttpClient, RawResponse};
use crate::jira::types::AppliedTransition;
use crate::jira::{IssueKey, JiraError};
use crate::observability::JiraApiMetrics;

const REST_PREFIX: [&str; 3] = ["rest", "api", "3"];

/// Reads the authoritative status of an issue. No retries at this layer.
#[async_trait]
pub trait StatusReader: Send + Sync {
    async fn read_status(&self, key: &IssueKey) -> Result<String, JiraError>;
}

/// Resolves a transition by display name among those currently offered and
/// submits it.
#[async_trait]
pub trait TransitionExecutor: Send + Sync {
    async fn apply_transition(
        &self,
        key: &IssueKey,
        transition_name: &str,
    ) -> Result<AppliedTransition, JiraError>;
}

#[async_trait]
impl<T: StatusReader + ?Sized> StatusReader for Arc<T> {
    async fn read_status(&self, key: &IssueKey) -> Result<String, JiraError> {
        (**self).read_status(key).await
    }
}

#[async_trait]
impl<T: TransitionExecutor + ?Sized> TransitionExecutor for Arc<T> {
    async fn apply_transition(
        &self,
        key: &IssueKey,
        transition_name: &str,
    ) -> Result<AppliedTransition, JiraError> {
        (**self).apply_transition(key, transition_name).await
    }
}

/// Trim whitespace and trailing slashes, then drop a mistaken trailing
/// `/jira` segment.
pub fn normalize_base_url(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    let lower = trimmed.to_ascii_lowercase();
    if lower.ends_with("/jira") {
        trimmed[..trimmed.len() - "/jira".len()].to_string()
    } else {
        trimmed.to_string()
    }
}

/// Which side of the taxonomy a failed request falls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RequestKind {
    Read,
    Write,
}

#[derive(Debug, Clone)]
pub struct JiraClient {
    http: RateLimitedHttpClient,
    base_url: String,
    api_root: Url,
    metrics: Arc<JiraApiMetrics>,
}

impl JiraClient {
    pub fn new(config: &JiraConfig) -> Result<Self, JiraError> {
        let base_url = config.require_base_url()?;
        let (email, token) = config.require_credentials()?;
        let api_root = api_root(&base_url)?;

        let http = RateLimitedHttpClient::new(
            BasicCredentials {
                username: email,
                secret: token,
            },
            config.rate_limit.requests_per_second,
            config.rate_limit.burst_capacity,
            Duration::from_millis(config.request_timeout_ms.max(1)),
        )
        .map_err(|e| JiraError::invalid_config("jira.request_timeout_ms", e.to_string()))?;

        Ok(Self {
            http,
            base_url,
            api_root,
            metrics: Arc::new(JiraApiMetrics::new()),
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<JiraApiMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn metrics(&self) -> Arc<JiraApiMetrics> {
        Arc::clone(&self.metrics)
    }

    pub fn issue_url(&self, key: &IssueKey) -> String {
        format!("{}/browse/{}", self.base_url, key)
    }

    /// REST endpoint for `segments` under `/rest/api/3`. Each segment is
    /// percent-encoded as a single path component.
    pub(crate) fn rest_url(&self, segments: &[&str], query: &[(&str, &str)]) -> Url {
        let mut url = self.api_root.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.extend(segments);
        }
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        url
    }

    /// Issue one request and classify any failure as a read or write error
    /// carrying method, url, status and body.
    pub(crate) async fn request(
        &self,
        kind: RequestKind,
        method: Method,
        url: Url,
        body: Option<&Value>,
    ) -> Result<RawResponse, JiraError> {
        self.metrics.record_request();

        let outcome = self.http.send(method, url.as_str(), body).await;
        let failure = match outcome {
            Ok(response) if response.is_success() => return Ok(response),
            Ok(response) => (response.method, response.url, Some(response.status), response.body),
            Err(fault) => (fault.method, fault.url, None, fault.message),
        };

        let (method, url, status, body) = failure;
        warn!(method = %method, url = %url, status = ?status, "Jira request failed");
        Err(match kind {
            RequestKind::Read => {
                self.metrics.record_read_failure();
                JiraError::RemoteRead {
                    method,
                    url,
                    status,
                    body,
                }
            }
            RequestKind::Write => {
                self.metrics.record_write_failure();
                JiraError::RemoteWrite {
                    method,
                    url,
                    status,
                    body,
                }
            }
        })
    }

    /// Decode a successful response body. Undecodable bodies fall back to the
    /// type's default so that a missing field surfaces as the sentinel
    /// downstream rather than as a transport error.
    pub(crate) fn decode<T: DeserializeOwned + Default>(response: &RawResponse) -> T {
        response
            .json()
            .and_then(|value| serde_json::from_value(value).ok())
            .unwrap_or_default()
    }
}

/// `{base}/rest/api/3` as a URL whose path can take further segments.
fn api_root(base_url: &str) -> Result<Url, JiraError> {
    let invalid = |reason: String| JiraError::invalid_config("JIRA_BASE_URL", reason);
    let mut url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| invalid(format!("{base_url} cannot carry a path")))?
        .pop_if_empty()
        .extend(REST_PREFIX);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url_strips_slashes_and_jira_segment() {
        assert_eq!(
            normalize_base_url(" https://acme.atlassian.net/ "),
            "https://acme.atlassian.net"
        );
        assert_eq!(
            normalize_base_url("https://acme.atlassian.net/jira/"),
            "https://acme.atlassian.net"
        );
        assert_eq!(
            normalize_base_url("https://acme.atlassian.net/JIRA"),
            "https://acme.atlassian.net"
        );
        assert_eq!(
            normalize_base_url("https://acme.atlassian.net/jirasoftware"),
            "https://acme.atlassian.net/jirasoftware"
        );
        assert_eq!(normalize_base_url("  "), "");
    }

    fn client(base_url: &str) -> Result<JiraClient, JiraError> {
        JiraClient::new(&JiraConfig {
            base_url: Some(base_url.to_string()),
            email: Some("bot@acme.test".to_string()),
            api_token: Some("token".to_string()),
            ..Default::default()
        })
    }

    #[test]
    fn test_rest_url_encodes_each_segment() {
        let client = client("https://acme.atlassian.net").unwrap();
        assert_eq!(
            client.rest_url(&["issue", "A B/1", "transitions"], &[]).as_str(),
            "https://acme.atlassian.net/rest/api/3/issue/A%20B%2F1/transitions"
        );
        assert_eq!(
            client.rest_url(&["issue", "KAN-12"], &[("fields", "status")]).as_str(),
            "https://acme.atlassian.net/rest/api/3/issue/KAN-12?fields=status"
        );
    }

    #[test]
    fn test_rest_url_keeps_context_path() {
        let client = client("https://intranet.acme.test/tracker/").unwrap();
        assert_eq!(
            client.rest_url(&["issue"], &[]).as_str(),
            "https://intranet.acme.test/tracker/rest/api/3/issue"
        );
    }

    #[test]
    fn test_unparseable_base_url_is_invalid_config() {
        let err = client("acme.atlassian.net").unwrap_err();
        assert!(matches!(err, JiraError::InvalidConfig { ref key, .. } if key == "JIRA_BASE_URL"));
    }

    #[test]
    fn test_issue_url() {
        let config = JiraConfig {
            base_url: Some("https://acme.atlassian.net/jira".to_string()),
            email: Some("bot@acme.test".to_string()),
            api_token: Some("token".to_string()),
            ..Default::default()
        };
        let client = JiraClient::new(&config).unwrap();
        let key = IssueKey::parse("kan-5").unwrap();
        assert_eq!(client.issue_url(&key), "https://acme.atlassian.net/browse/KAN-5");
        assert_eq!(
            client.rest_url(&["issue", key.as_str()], &[]).as_str(),
            "https://acme.atlassian.net/rest/api/3/issue/KAN-5"
        );
    }

    #[test]
    fn test_missing_credentials_name_the_key() {
        let config = JiraConfig {
            base_url: Some("https://acme.atlassian.net".to_string()),
            email: Some("bot@acme.test".to_string()),
            api_token: None,
            ..Default::default()
        };
        let err = JiraClient::new(&config).unwrap_err();
        assert!(matches!(err, JiraError::Config { ref key } if key == "JIRA_API_TOKEN"));
    }
}
