//! The physical renewal call.
//!
//! [`HttpRenewalClient`] posts to the fixed renewal path with the current
//! credential as a bearer header and no body. It owns a dedicated HTTP
//! client: renewal traffic never flows through the intercepted request
//! pipeline, so an authorization failure on the renewal call cannot re-enter
//! the refresh cycle.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::error::{Result, SessionError};
use crate::store::Credential;

/// Fixed path of the renewal endpoint, relative to the API base URL.
pub const RENEWAL_PATH: &str = "session/renew";

/// Default timeout for the renewal call. A renewal that exceeds it settles
/// as a failure so it cannot block the pending-request queue indefinitely.
pub const DEFAULT_RENEWAL_TIMEOUT: Duration = Duration::from_secs(30);

/// Issues the physical renewal call.
#[async_trait]
pub trait RenewalClient: Send + Sync {
    /// Exchange the current (possibly stale) credential for a fresh one.
    async fn renew(&self, current: &Credential) -> Result<Credential>;
}

/// Success body of the renewal endpoint.
#[derive(Debug, Deserialize)]
struct RenewalResponse {
    token: String,
}

/// HTTP implementation of [`RenewalClient`].
pub struct HttpRenewalClient {
    http: reqwest::Client,
    renewal_url: Url,
    timeout: Duration,
}

impl HttpRenewalClient {
    /// Create a renewal client for the given API base URL.
    pub fn new(base_url: &str) -> Result<Self> {
        Self::with_timeout(base_url, DEFAULT_RENEWAL_TIMEOUT)
    }

    /// Create a renewal client with a custom call timeout.
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<Self> {
        let mut base = Url::parse(base_url)
            .map_err(|e| SessionError::Config(format!("invalid base URL: {}", e)))?;
        if !base.path().ends_with('/') {
            base.set_path(&format!("{}/", base.path()));
        }
        let renewal_url = base
            .join(RENEWAL_PATH)
            .map_err(|e| SessionError::Config(format!("invalid renewal URL: {}", e)))?;

        Ok(Self {
            http: reqwest::Client::new(),
            renewal_url,
            timeout,
        })
    }

    /// The resolved renewal endpoint URL.
    pub fn renewal_url(&self) -> &Url {
        &self.renewal_url
    }
}

#[async_trait]
impl RenewalClient for HttpRenewalClient {
    async fn renew(&self, current: &Credential) -> Result<Credential> {
        let response = self
            .http
            .post(self.renewal_url.clone())
            .bearer_auth(current.as_str())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| SessionError::Network(format!("renewal request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unreadable response body".to_string());
            return Err(SessionError::Renewal {
                status: status.as_u16(),
                message,
            });
        }

        let body: RenewalResponse = response
            .json()
            .await
            .map_err(|e| SessionError::Network(format!("failed to parse renewal response: {}", e)))?;

        Ok(Credential::new(body.token))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_renewal_url_joins_fixed_path() {
        let client = HttpRenewalClient::new("http://localhost:8080").unwrap();
        assert_eq!(
            client.renewal_url().as_str(),
            "http://localhost:8080/session/renew"
        );

        // Base URLs with a path prefix keep it.
        let client = HttpRenewalClient::new("http://localhost:8080/api").unwrap();
        assert_eq!(
            client.renewal_url().as_str(),
            "http://localhost:8080/api/session/renew"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(HttpRenewalClient::new("not a url").is_err());
    }

    #[tokio::test]
    async fn test_renew_sends_bearer_and_parses_token() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/session/renew"))
            .and(header("Authorization", "Bearer t1"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "token": "t2" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpRenewalClient::new(&server.uri()).unwrap();
        let renewed = client.renew(&Credential::new("t1")).await.unwrap();
        assert_eq!(renewed.as_str(), "t2");
    }

    #[tokio::test]
    async fn test_renew_maps_rejection_to_renewal_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/session/renew"))
            .respond_with(ResponseTemplate::new(401).set_body_string("session expired"))
            .mount(&server)
            .await;

        let client = HttpRenewalClient::new(&server.uri()).unwrap();
        let err = client.renew(&Credential::new("t1")).await.unwrap_err();
        match err {
            SessionError::Renewal { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "session expired");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }
}
