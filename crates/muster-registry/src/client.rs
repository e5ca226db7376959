//! Registry client.
//!
//! This module provides the HTTP client that agent and coordinator
//! processes use to talk to the registry. It has two layers:
//!
//! - **Fallible core** (`try_*` methods) returning [`RegistryResult`], for
//!   callers that want to see errors.
//! - **Best-effort surface** ([`register`](RegistryClient::register),
//!   [`unregister`](RegistryClient::unregister),
//!   [`list_agents`](RegistryClient::list_agents),
//!   [`get_agent_urls`](RegistryClient::get_agent_urls),
//!   [`health_check`](RegistryClient::health_check)) where every transport
//!   failure is logged as a warning and converted to a sentinel value.
//!   Registration is an optional enhancement: an agent keeps serving its own
//!   traffic whether or not the registry is reachable, so nothing on this
//!   surface ever propagates an error into the calling process.
//!
//! # Connection Behavior
//!
//! Requests share a pooled `reqwest` client and carry an explicit timeout
//! (default 10 seconds, configurable via
//! [`with_timeout`](RegistryClient::with_timeout)). The client is
//! `Clone`-able and safe to share across tasks.
//!
//! ## Retry Policy
//!
//! The client does **not** automatically retry failed requests. Use
//! [`RegistryError::is_retryable`] to implement your own retry logic over
//! the `try_*` layer if you need one.
//!
//! # Registration Lease
//!
//! A successful [`register`](RegistryClient::register) returns a
//! [`Registration`] handle owning the registry entry. The entry is released
//! by [`Registration::release`], or best-effort on drop. For the full
//! scoped-resource shape, [`run_registered`](RegistryClient::run_registered)
//! registers, runs a future, and releases on every exit path, including an
//! unwind out of the future:
//!
//! ```rust,ignore
//! use muster_registry::{RegisterRequest, RegistryClient};
//! use muster_registry::shutdown::shutdown_signal;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = RegistryClient::new("http://localhost:8000").unwrap();
//!     let request = RegisterRequest::new(
//!         "weather_agent",
//!         "Professional weather expert",
//!         "http://localhost:8080",
//!     )
//!     .with_capability("weather_info");
//!
//!     client
//!         .run_registered(request, async {
//!             // Serve until interrupted; the registry entry is released
//!             // when this future resolves, panics, or the signal fires.
//!             tokio::select! {
//!                 _ = serve_agent() => {}
//!                 _ = shutdown_signal() => {}
//!             }
//!         })
//!         .await;
//! }
//! # async fn serve_agent() {}
//! ```

use futures::FutureExt;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::{RegistryError, RegistryResult};
use crate::types::{AgentInfo, AgentList, HealthStatus, RegisterAck, RegisterRequest, UnregisterAck};

/// Default timeout for registry requests
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Registry address agents fall back to when none is configured
pub const DEFAULT_REGISTRY_URL: &str = "http://localhost:8000";

/// Client for the agent registry.
#[derive(Clone)]
pub struct RegistryClient {
    /// Base URL of the registry
    base_url: Url,
    /// HTTP client
    http: Client,
    /// Request timeout, kept for error reporting
    timeout: Duration,
}

impl std::fmt::Debug for RegistryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryClient")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RegistryClient {
    /// Create a client for the registry at `base_url` with the default
    /// request timeout.
    pub fn new(base_url: impl AsRef<str>) -> RegistryResult<Self> {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    /// Create a client with an explicit request timeout.
    pub fn with_timeout(base_url: impl AsRef<str>, timeout: Duration) -> RegistryResult<Self> {
        let base_url = Url::parse(base_url.as_ref())?;

        let http = Client::builder()
            .timeout(timeout)
            .user_agent(format!("muster-registry/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| {
                RegistryError::connection_error(format!("Failed to create HTTP client: {e}"))
            })?;

        Ok(Self {
            base_url,
            http,
            timeout,
        })
    }

    /// Create a client around a caller-supplied HTTP client.
    pub fn with_http_client(base_url: impl AsRef<str>, http: Client) -> RegistryResult<Self> {
        let base_url = Url::parse(base_url.as_ref())?;

        Ok(Self {
            base_url,
            http,
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Get the base URL
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build a URL for an endpoint
    fn endpoint(&self, path: &str) -> RegistryResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| RegistryError::unexpected_response(format!("Invalid endpoint path: {e}")))
    }

    /// Map a transport-level reqwest failure to a registry error.
    fn transport_error(&self, context: &str, err: reqwest::Error) -> RegistryError {
        if err.is_timeout() {
            RegistryError::Timeout {
                timeout_ms: self.timeout.as_millis() as u64,
            }
        } else {
            RegistryError::connection_error(format!("{context}: {err}"))
        }
    }

    /// Check the status and decode the body of a registry response.
    async fn parse_response<T: DeserializeOwned>(
        response: reqwest::Response,
        agent: Option<&str>,
    ) -> RegistryResult<T> {
        let status = response.status();
        if !status.is_success() {
            return Err(Self::handle_error_response(status, response, agent).await);
        }

        response.json().await.map_err(|e| {
            RegistryError::unexpected_response(format!("Failed to parse response body: {e}"))
        })
    }

    /// Map a non-2xx registry response to an error.
    async fn handle_error_response(
        status: StatusCode,
        response: reqwest::Response,
        agent: Option<&str>,
    ) -> RegistryError {
        let error_text = response.text().await.unwrap_or_default();

        match status {
            StatusCode::NOT_FOUND => RegistryError::agent_not_found(agent.unwrap_or("<unknown>")),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                RegistryError::invalid_registration(error_text)
            }
            StatusCode::INTERNAL_SERVER_ERROR => RegistryError::internal_error(error_text),
            _ => RegistryError::unexpected_response(format!("HTTP {status}: {error_text}")),
        }
    }

    // =========================================================================
    // Fallible core
    // =========================================================================

    /// Register an agent, surfacing any failure.
    pub async fn try_register(&self, request: RegisterRequest) -> RegistryResult<RegisterAck> {
        request.validate()?;
        let url = self.endpoint("/register")?;

        debug!(url = %url, agent = %request.name, "Registering agent");

        let response = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error("Failed to register", e))?;

        Self::parse_response(response, Some(&request.name)).await
    }

    /// Unregister an agent by name, surfacing any failure.
    pub async fn try_unregister(&self, name: &str) -> RegistryResult<UnregisterAck> {
        let url = self.endpoint(&format!("/unregister/{name}"))?;

        debug!(url = %url, agent = %name, "Unregistering agent");

        let response = self
            .http
            .delete(url)
            .send()
            .await
            .map_err(|e| self.transport_error("Failed to unregister", e))?;

        Self::parse_response(response, Some(name)).await
    }

    /// Fetch a snapshot of all registered agents, surfacing any failure.
    pub async fn try_list(&self) -> RegistryResult<Vec<AgentInfo>> {
        let url = self.endpoint("/agents")?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error("Failed to list agents", e))?;

        let list: AgentList = Self::parse_response(response, None).await?;
        Ok(list.agents)
    }

    /// Fetch one agent record, surfacing any failure.
    pub async fn try_get(&self, name: &str) -> RegistryResult<AgentInfo> {
        let url = self.endpoint(&format!("/agents/{name}"))?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error("Failed to fetch agent", e))?;

        Self::parse_response(response, Some(name)).await
    }

    /// Fetch the registry health report, surfacing any failure.
    pub async fn try_health(&self) -> RegistryResult<HealthStatus> {
        let url = self.endpoint("/health")?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| self.transport_error("Failed to check registry health", e))?;

        Self::parse_response(response, None).await
    }

    // =========================================================================
    // Best-effort surface
    // =========================================================================

    /// Register an agent with the registry.
    ///
    /// On success, returns a [`Registration`] lease that unregisters the
    /// agent when released or dropped. On any failure the error is logged
    /// and `None` is returned; the calling process is expected to carry on.
    pub async fn register(&self, request: RegisterRequest) -> Option<Registration> {
        let name = request.name.clone();
        match self.try_register(request).await {
            Ok(ack) => {
                info!(agent = %ack.agent, registry = %self.base_url, "Registered with agent registry");
                Some(Registration::new(self.clone(), ack.agent))
            }
            Err(err) => {
                warn!(agent = %name, error = %err, "Failed to register with agent registry");
                None
            }
        }
    }

    /// Unregister an agent by name.
    ///
    /// Safe to call whether or not the name was ever registered: a
    /// not-found from the registry is swallowed, and transport failures are
    /// only logged.
    pub async fn unregister(&self, name: &str) {
        match self.try_unregister(name).await {
            Ok(ack) => {
                info!(agent = %ack.agent, "Unregistered from agent registry");
            }
            Err(RegistryError::AgentNotFound { .. }) => {
                debug!(agent = %name, "Agent was not registered");
            }
            Err(err) => {
                warn!(agent = %name, error = %err, "Failed to unregister from agent registry");
            }
        }
    }

    /// Snapshot of all registered agents; empty if the registry is
    /// unreachable.
    pub async fn list_agents(&self) -> Vec<AgentInfo> {
        match self.try_list().await {
            Ok(agents) => agents,
            Err(err) => {
                warn!(error = %err, "Failed to list agents from registry");
                Vec::new()
            }
        }
    }

    /// URLs of every currently registered agent.
    ///
    /// Derived from [`list_agents`](Self::list_agents); a coordinator calls
    /// this once at startup to build its routing table.
    pub async fn get_agent_urls(&self) -> Vec<String> {
        self.list_agents()
            .await
            .into_iter()
            .map(|agent| agent.url)
            .collect()
    }

    /// Look up one agent; `None` if unknown or the registry is unreachable.
    pub async fn get_agent(&self, name: &str) -> Option<AgentInfo> {
        match self.try_get(name).await {
            Ok(info) => Some(info),
            Err(RegistryError::AgentNotFound { .. }) => None,
            Err(err) => {
                warn!(agent = %name, error = %err, "Failed to fetch agent from registry");
                None
            }
        }
    }

    /// Registry health report; `None` if the registry is unreachable.
    pub async fn health_check(&self) -> Option<HealthStatus> {
        match self.try_health().await {
            Ok(health) => Some(health),
            Err(err) => {
                warn!(error = %err, "Registry health check failed");
                None
            }
        }
    }

    // =========================================================================
    // Scoped registration
    // =========================================================================

    /// Run `fut` with a registration held for its whole duration.
    ///
    /// Registers best-effort (a failed registration does not stop `fut`
    /// from running), awaits `fut`, and releases the registration on every
    /// exit path: the release runs whether `fut` returns or panics, and a
    /// panic is resumed afterwards.
    pub async fn run_registered<F, T>(&self, request: RegisterRequest, fut: F) -> T
    where
        F: Future<Output = T>,
    {
        let registration = self.register(request).await;

        let result = AssertUnwindSafe(fut).catch_unwind().await;

        if let Some(registration) = registration {
            registration.release().await;
        }

        match result {
            Ok(value) => value,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

// =============================================================================
// Registration lease
// =============================================================================

/// A held registry entry, released on every exit path.
///
/// Returned by [`RegistryClient::register`]. The release runs exactly once:
/// either explicitly through [`release`](Self::release), or best-effort on
/// drop (spawned onto the current tokio runtime, since destructors cannot
/// block on the network). Prefer an explicit release, or the
/// [`RegistryClient::run_registered`] scope, on shutdown paths where the
/// process is about to exit and a spawned task might not get to run.
#[must_use = "dropping a Registration releases the registry entry in the background"]
pub struct Registration {
    client: RegistryClient,
    name: String,
    released: bool,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("released", &self.released)
            .finish()
    }
}

impl Registration {
    fn new(client: RegistryClient, name: String) -> Self {
        Self {
            client,
            name,
            released: false,
        }
    }

    /// Name the lease was registered under
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Unregister now, consuming the lease.
    pub async fn release(mut self) {
        self.released = true;
        self.client.unregister(&self.name).await;
    }
}

impl Drop for Registration {
    fn drop(&mut self) {
        if self.released {
            return;
        }

        let client = self.client.clone();
        let name = std::mem::take(&mut self.name);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    client.unregister(&name).await;
                });
            }
            Err(_) => {
                warn!(agent = %name, "Registration dropped outside a runtime; entry not released");
            }
        }
    }
}
