//! Registry HTTP server.
//!
//! Exposes the [`AgentStore`] over the registry wire protocol. The store is
//! owned by the server and injected into every handler through axum state;
//! handlers stay thin and all registration semantics live in the store.
//!
//! # Example
//!
//! ```rust,ignore
//! use muster_registry::server::RegistryServer;
//! use muster_registry::shutdown::shutdown_signal;
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = RegistryServer::new();
//!     server
//!         .serve_with_shutdown("localhost:8000", shutdown_signal())
//!         .await
//!         .unwrap();
//! }
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info};

use crate::error::{ErrorResponse, RegistryError, RegistryResult};
use crate::store::AgentStore;
use crate::types::{
    AgentInfo, AgentList, HealthStatus, RegisterAck, RegisterRequest, ServiceDescriptor,
    UnregisterAck,
};

/// Registry API server.
///
/// Holds the store and builds the HTTP surface over it. Cheap to construct;
/// nothing happens until [`serve`](Self::serve) binds the listener.
pub struct RegistryServer {
    store: Arc<AgentStore>,
}

impl RegistryServer {
    /// Create a server with a fresh, empty store
    pub fn new() -> Self {
        Self::with_store(Arc::new(AgentStore::new()))
    }

    /// Create a server over an existing store
    pub fn with_store(store: Arc<AgentStore>) -> Self {
        Self { store }
    }

    /// Handle to the underlying store
    pub fn store(&self) -> Arc<AgentStore> {
        Arc::clone(&self.store)
    }

    /// Build the axum router for this server
    pub fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        Router::new()
            .route("/", get(describe))
            .route("/register", post(register_agent))
            .route("/unregister/{name}", delete(unregister_agent))
            .route("/agents", get(list_agents))
            .route("/agents/{name}", get(get_agent))
            .route("/health", get(health_check))
            .with_state(Arc::clone(&self.store))
            .layer(cors)
    }

    /// Serve until the process is terminated.
    ///
    /// Binding failure is fatal and surfaces as [`RegistryError::BindError`].
    pub async fn serve(self, addr: &str) -> RegistryResult<()> {
        self.serve_with_shutdown(addr, std::future::pending()).await
    }

    /// Serve until `signal` resolves, then shut down gracefully.
    pub async fn serve_with_shutdown<F>(self, addr: &str, signal: F) -> RegistryResult<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| RegistryError::bind_error(addr, e.to_string()))?;

        info!(address = %addr, "Agent registry listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(signal)
            .await
            .map_err(|e| RegistryError::internal_error(format!("Server error: {e}")))?;

        info!("Agent registry stopped");
        Ok(())
    }
}

impl Default for RegistryServer {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Route Handlers
// =============================================================================

/// GET / - Service descriptor
async fn describe() -> Json<ServiceDescriptor> {
    Json(ServiceDescriptor::current())
}

/// POST /register - Register or replace an agent
async fn register_agent(
    State(store): State<Arc<AgentStore>>,
    Json(request): Json<RegisterRequest>,
) -> Result<Json<RegisterAck>, RegistryErrorResponse> {
    let (info, previous) = store.put(request)?;

    if previous.is_some() {
        info!(agent = %info.name, url = %info.url, "Re-registered agent");
    } else {
        info!(agent = %info.name, url = %info.url, "Registered agent");
    }

    Ok(Json(RegisterAck::new(info.name)))
}

/// DELETE /unregister/{name} - Remove an agent
async fn unregister_agent(
    State(store): State<Arc<AgentStore>>,
    Path(name): Path<String>,
) -> Result<Json<UnregisterAck>, RegistryErrorResponse> {
    let removed = store.remove(&name)?;
    info!(agent = %removed.name, "Unregistered agent");
    Ok(Json(UnregisterAck::new(removed.name)))
}

/// GET /agents - Snapshot of all registered agents
async fn list_agents(State(store): State<Arc<AgentStore>>) -> Json<AgentList> {
    let agents = store.list();
    debug!(count = agents.len(), "Listing agents");
    Json(AgentList { agents })
}

/// GET /agents/{name} - Look up one agent
async fn get_agent(
    State(store): State<Arc<AgentStore>>,
    Path(name): Path<String>,
) -> Result<Json<AgentInfo>, RegistryErrorResponse> {
    Ok(Json(store.get(&name)?))
}

/// GET /health - Record count and server clock; never fails while alive
async fn health_check(State(store): State<Arc<AgentStore>>) -> Json<HealthStatus> {
    Json(HealthStatus::healthy(store.len()))
}

// =============================================================================
// Error Response
// =============================================================================

/// Wrapper for registry errors that implements IntoResponse
pub struct RegistryErrorResponse(RegistryError);

impl From<RegistryError> for RegistryErrorResponse {
    fn from(err: RegistryError) -> Self {
        Self(err)
    }
}

impl IntoResponse for RegistryErrorResponse {
    fn into_response(self) -> Response {
        let error_response: ErrorResponse = self.0.into();
        let status = match error_response.code {
            400 => StatusCode::BAD_REQUEST,
            404 => StatusCode::NOT_FOUND,
            502 => StatusCode::BAD_GATEWAY,
            504 => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(error_response)).into_response()
    }
}
