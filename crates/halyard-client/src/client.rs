//! Main client implementation.
//!
//! Every outbound call flows through two layers:
//!
//! - [`Client::send`] — the pipeline: reads the current credential from the
//!   store and attaches it as a bearer header when present.
//! - [`Client::execute`] — the interceptor: passes every non-401 response
//!   through unchanged; on an authorization failure it joins (or starts)
//!   the coordinator's refresh cycle and replays the request exactly once
//!   with the renewed credential.
//!
//! Callers only observe the final resolved value or a terminal error; the
//! refresh/queue mechanics are invisible.

use std::sync::Arc;
use std::time::Duration;

use halyard_session::{
    CredentialStore, HttpRenewalClient, LoginNavigator, MemoryCredentialStore, NoopNavigator,
    RefreshCoordinator, RefreshOutcome, DEFAULT_RENEWAL_TIMEOUT,
};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::error::{Error, ErrorResponse, Result};
use crate::request::ApiRequest;

/// Default timeout for requests.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Halyard API client.
///
/// Cheap to clone; clones share the HTTP connection pool, the credential
/// store, and the refresh coordinator.
///
/// # Example
///
/// ```no_run
/// use halyard_client::Client;
///
/// # async fn example() -> halyard_client::Result<()> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")
///     .build()?;
///
/// #[derive(serde::Deserialize)]
/// struct Profile { name: String }
///
/// let profile: Profile = client.get("me/profile").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http: reqwest::Client,
    base_url: Url,
    timeout: Duration,
    store: Arc<dyn CredentialStore>,
    coordinator: RefreshCoordinator,
}

impl Client {
    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Get the base URL.
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// The refresh coordinator shared by this client.
    pub fn coordinator(&self) -> &RefreshCoordinator {
        &self.inner.coordinator
    }

    /// The credential store shared by this client.
    pub fn credential_store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    /// Build a URL for an API path.
    fn url(&self, path: &str) -> Result<Url> {
        let path = path.trim_start_matches('/');
        self.inner.base_url.join(path).map_err(Error::from)
    }

    /// Issue the request with the current credential attached, if any.
    async fn send(&self, request: &ApiRequest) -> Result<reqwest::Response> {
        let url = self.url(request.path())?;
        let mut builder = self
            .inner
            .http
            .request(request.method().clone(), url)
            .timeout(self.inner.timeout);

        if let Some(credential) = self.inner.store.load().await? {
            builder = builder.bearer_auth(credential.as_str());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        Ok(builder.send().await?)
    }

    /// Execute a request, transparently renewing the credential on an
    /// authorization failure.
    ///
    /// Non-401 responses pass through unchanged, whatever their status.
    /// A 401 joins the coordinator's refresh cycle: on renewal the request
    /// is replayed exactly once with the new credential; on renewal
    /// failure the refresh error is propagated. A replayed request that
    /// fails authorization again is rejected without another cycle.
    pub async fn execute(&self, mut request: ApiRequest) -> Result<reqwest::Response> {
        let response = self.send(&request).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        if request.retried() {
            debug!(path = request.path(), "replayed request failed authorization");
            return Err(replay_rejected(&request));
        }

        debug!(path = request.path(), "authorization failure, joining refresh cycle");
        match self.inner.coordinator.refresh().await {
            RefreshOutcome::Renewed(_) => {
                request.mark_retried();
                debug!(path = request.path(), "replaying with renewed credential");
                let response = self.send(&request).await?;
                if response.status() == StatusCode::UNAUTHORIZED {
                    return Err(replay_rejected(&request));
                }
                Ok(response)
            }
            RefreshOutcome::Failed(err) => Err(Error::Session(err)),
        }
    }

    /// Execute a request and deserialize a JSON response.
    pub async fn request_json<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.execute(request).await?;
        self.handle_response(response).await
    }

    /// Make a GET request.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request_json(ApiRequest::get(path)).await
    }

    /// Make a POST request.
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_json(ApiRequest::post(path).json(body)?).await
    }

    /// Make a PUT request.
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_json(ApiRequest::put(path).json(body)?).await
    }

    /// Make a PATCH request.
    pub async fn patch<T, B>(&self, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request_json(ApiRequest::patch(path).json(body)?).await
    }

    /// Make a DELETE request.
    pub async fn delete(&self, path: &str) -> Result<()> {
        let response = self.execute(ApiRequest::delete(path)).await?;
        if !response.status().is_success() {
            return Err(self.extract_error(response).await);
        }
        Ok(())
    }

    /// Handle a response, extracting the body or error.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T> {
        if response.status().is_success() {
            Ok(response.json().await?)
        } else {
            Err(self.extract_error(response).await)
        }
    }

    /// Extract an error from a failed response.
    async fn extract_error(&self, response: reqwest::Response) -> Error {
        let status = response.status().as_u16();
        match response.json::<ErrorResponse>().await {
            Ok(body) if !body.message.is_empty() => Error::Api {
                status,
                message: body.message,
            },
            _ => Error::Api {
                status,
                message: format!("HTTP {}", status),
            },
        }
    }
}

fn replay_rejected(request: &ApiRequest) -> Error {
    Error::Auth(format!(
        "request to {} failed authorization after credential renewal",
        request.path()
    ))
}

/// Builder for creating a [`Client`].
#[derive(Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    renewal_timeout: Option<Duration>,
    user_agent: Option<String>,
    store: Option<Arc<dyn CredentialStore>>,
    navigator: Option<Arc<dyn LoginNavigator>>,
    coordinator: Option<RefreshCoordinator>,
}

impl ClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the base URL for the API.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the timeout for the credential renewal call.
    pub fn renewal_timeout(mut self, timeout: Duration) -> Self {
        self.renewal_timeout = Some(timeout);
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Set the credential store. Defaults to an in-memory store; embedders
    /// that need the credential to survive restarts supply a
    /// [`halyard_session::FileCredentialStore`].
    pub fn credential_store(mut self, store: Arc<dyn CredentialStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the login-view navigator used when renewal fails.
    pub fn navigator(mut self, navigator: Arc<dyn LoginNavigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Use a prebuilt refresh coordinator, for sharing one across clients
    /// or wiring a custom renewal transport.
    pub fn coordinator(mut self, coordinator: RefreshCoordinator) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Client> {
        let base_url = self
            .base_url
            .ok_or_else(|| Error::Config("base_url is required".to_string()))?;

        // Parse and normalize base URL
        let mut base_url = Url::parse(&base_url)?;
        if !base_url.path().ends_with('/') {
            base_url.set_path(&format!("{}/", base_url.path()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("halyard-client/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(user_agent)
            .build()?;

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryCredentialStore::new()));

        let coordinator = match self.coordinator {
            Some(coordinator) => coordinator,
            None => {
                let renewer = HttpRenewalClient::with_timeout(
                    base_url.as_str(),
                    self.renewal_timeout.unwrap_or(DEFAULT_RENEWAL_TIMEOUT),
                )?;
                let navigator = self.navigator.unwrap_or_else(|| Arc::new(NoopNavigator));
                RefreshCoordinator::new(store.clone(), Arc::new(renewer), navigator)
            }
        };

        Ok(Client {
            inner: Arc::new(ClientInner {
                http,
                base_url,
                timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
                store,
                coordinator,
            }),
        })
    }
}
