//! reqwest-backed [`HttpClient`]

use async_trait::async_trait;
use bridge_traits::{
    error::{BridgeError, Result},
    http::{HttpClient, HttpMethod, HttpRequest, HttpResponse},
};
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// Timeout applied to every request made by a [`ReqwestHttpClient`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    pub connect: Duration,
    pub write: Duration,
    pub read: Duration,
}

impl HttpTimeouts {
    pub const DEFAULT_SECS: u64 = 30;

    /// reqwest has no separate write timeout; the whole exchange is bounded
    /// by the sum of the three phases instead.
    pub fn total(&self) -> Duration {
        self.connect + self.write + self.read
    }
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        let secs = Duration::from_secs(Self::DEFAULT_SECS);
        Self {
            connect: secs,
            write: secs,
            read: secs,
        }
    }
}

/// Reqwest-based HTTP client implementation
///
/// Holds one long-lived connection pool. Requests are never retried.
pub struct ReqwestHttpClient {
    client: Client,
}

impl ReqwestHttpClient {
    /// Create a new HTTP client with the default 30 second timeouts
    pub fn new() -> Result<Self> {
        Self::with_timeouts(HttpTimeouts::default())
    }

    /// Create a new HTTP client with custom timeouts
    pub fn with_timeouts(timeouts: HttpTimeouts) -> Result<Self> {
        Self::with_user_agent(timeouts, concat!("simple-framework/", env!("CARGO_PKG_VERSION")))
    }

    /// Create a new HTTP client with custom timeouts and default user agent
    pub fn with_user_agent(timeouts: HttpTimeouts, user_agent: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(timeouts.connect)
            .read_timeout(timeouts.read)
            .timeout(timeouts.total())
            .pool_max_idle_per_host(10)
            .user_agent(user_agent)
            .build()
            .map_err(|e| {
                BridgeError::OperationFailed(format!("Failed to build HTTP client: {}", e))
            })?;

        debug!(
            connect_secs = timeouts.connect.as_secs(),
            write_secs = timeouts.write.as_secs(),
            read_secs = timeouts.read.as_secs(),
            "Built HTTP client"
        );

        Ok(Self { client })
    }

    /// Create a new HTTP client with custom configuration
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Convert bridge HttpMethod to reqwest Method
    fn convert_method(method: HttpMethod) -> reqwest::Method {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
        }
    }

    /// Build reqwest request from bridge request
    fn build_request(&self, request: HttpRequest) -> reqwest::RequestBuilder {
        let method = Self::convert_method(request.method);
        let mut req = self.client.request(method, &request.url);

        if !request.query.is_empty() {
            req = req.query(&request.query);
        }

        for (key, value) in request.headers {
            req = req.header(key, value);
        }

        if let Some(body) = request.body {
            req = req.body(body);
        }

        if let Some(timeout) = request.timeout {
            req = req.timeout(timeout);
        }

        req
    }

    fn convert_error(error: reqwest::Error) -> BridgeError {
        if error.is_timeout() {
            BridgeError::Timeout(error.to_string())
        } else if error.is_connect() {
            BridgeError::Connection(error.to_string())
        } else {
            BridgeError::OperationFailed(error.to_string())
        }
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!(method = %request.method, url = %request.url, "Executing HTTP request");

        let response = self
            .build_request(request)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "HTTP request failed");
                Self::convert_error(e)
            })?;

        let status = response.status();
        let headers: HashMap<String, String> = response
            .headers()
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|s| (k.to_string(), s.to_string())))
            .collect();

        let body = response.bytes().await.map_err(Self::convert_error)?;

        Ok(HttpResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_string),
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_client_creation() {
        assert!(ReqwestHttpClient::new().is_ok());
    }

    #[test]
    fn test_default_timeouts() {
        let timeouts = HttpTimeouts::default();
        assert_eq!(timeouts.connect, Duration::from_secs(30));
        assert_eq!(timeouts.write, Duration::from_secs(30));
        assert_eq!(timeouts.read, Duration::from_secs(30));
        assert_eq!(timeouts.total(), Duration::from_secs(90));
    }

    #[test]
    fn test_method_conversion() {
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Get),
            reqwest::Method::GET
        );
        assert_eq!(
            ReqwestHttpClient::convert_method(HttpMethod::Post),
            reqwest::Method::POST
        );
    }

    #[test]
    fn test_build_request_encodes_query() {
        let client = ReqwestHttpClient::new().unwrap();
        let request = HttpRequest::get("https://example.com/yoda")
            .query("sentence", "My name is Todor.")
            .accept("text/plain");

        let built = client.build_request(request).build().unwrap();

        assert_eq!(built.method(), reqwest::Method::GET);
        assert_eq!(
            built.url().as_str(),
            "https://example.com/yoda?sentence=My+name+is+Todor."
        );
        assert_eq!(built.headers()["accept"], "text/plain");
    }
}
