use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::{Client, Method};
use serde_json::Value;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Basic credential pair sent with every request.
#[derive(Clone)]
pub struct BasicCredentials {
    pub username: String,
    pub secret: String,
}

impl std::fmt::Debug for BasicCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BasicCredentials")
            .field("username", &self.username)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Response captured in full so callers can build diagnostics from it.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub method: String,
    pub url: String,
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Parsed JSON body. Empty bodies read as `{}`.
    pub fn json(&self) -> Option<Value> {
        if self.body.trim().is_empty() {
            return Some(Value::Object(Default::default()));
        }
        serde_json::from_str(&self.body).ok()
    }
}

/// Transport failure before any HTTP status was received.
#[derive(Debug, Clone)]
pub struct TransportFault {
    pub method: String,
    pub url: String,
    pub message: String,
}

/// Rate-limited HTTP client used for every Jira request
#[derive(Debug, Clone)]
pub struct RateLimitedHttpClient {
    http: Client,
    rate_limiter: Arc<DefaultDirectRateLimiter>,
    credentials: BasicCredentials,
}

impl RateLimitedHttpClient {
    pub fn new(
        credentials: BasicCredentials,
        requests_per_second: u32,
        burst_capacity: u32,
        request_timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let per_second = NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(burst_capacity).unwrap_or(per_second);
        let quota = Quota::per_second(per_second).allow_burst(burst);
        let rate_limiter = Arc::new(RateLimiter::direct(quota));

        let http = Client::builder()
            .timeout(request_timeout)
            .user_agent(concat!("jira-flow/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            rate_limiter,
            credentials,
        })
    }

    /// Send one request after waiting for rate limit permission.
    pub async fn send(
        &self,
        method: Method,
        url: &str,
        body: Option<&Value>,
    ) -> Result<RawResponse, TransportFault> {
        self.rate_limiter.until_ready().await;

        let method_name = method.as_str().to_string();
        debug!(method = %method_name, url = %url, "Executing Jira API request");

        let mut request = self
            .http
            .request(method, url)
            .basic_auth(&self.credentials.username, Some(&self.credentials.secret))
            .header(reqwest::header::ACCEPT, "application/json");
        if let Some(body) = body {
            request = request.json(body);
        }

        let fault = |err: reqwest::Error| TransportFault {
            method: method_name.clone(),
            url: url.to_string(),
            message: err.to_string(),
        };

        let response = request.send().await.map_err(fault)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(fault)?;

        Ok(RawResponse {
            method: method_name.clone(),
            url: url.to_string(),
            status,
            body,
        })
    }
}
