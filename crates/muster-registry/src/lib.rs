//! # Muster Registry - Runtime Agent Discovery
//!
//! This crate lets independently started agent processes advertise their
//! network location and capabilities at runtime, and lets a coordinator
//! discover them dynamically instead of hardcoding addresses.
//!
//! ## Features
//!
//! - **Core Types**: [`AgentInfo`] records and the registry wire contract
//! - **Store**: [`AgentStore`], the concurrency-safe in-memory collection
//! - **Server**: [`RegistryServer`], the HTTP API over the store (requires
//!   the `server` feature)
//! - **Client**: [`RegistryClient`], the best-effort client agents and
//!   coordinators use (requires the `client` feature)
//!
//! ## Protocol Overview
//!
//! The registry is a single process holding all registration state in
//! memory; nothing persists across a restart, and entries never expire on
//! their own:
//!
//! 1. An agent registers its name, description, URL, and capabilities at
//!    startup; registering an existing name fully replaces the old record.
//! 2. A coordinator lists the registry once at its own startup and builds a
//!    routing table from the snapshot. Discovery is pull-only.
//! 3. The agent's registration is a lease tied to its process lifetime,
//!    released on every exit path through the [`Registration`] guard.
//!
//! ## Example: Describing an Agent
//!
//! ```rust
//! use muster_registry::RegisterRequest;
//!
//! let request = RegisterRequest::new(
//!     "weather_agent",
//!     "Professional weather expert providing forecasts",
//!     "http://localhost:8080",
//! )
//! .with_capability("weather_info")
//! .with_capability("forecasts");
//!
//! assert!(request.validate().is_ok());
//! ```
//!
//! ## Example: Discovering Agents
//!
//! ```rust,ignore
//! use muster_registry::RegistryClient;
//!
//! #[tokio::main]
//! async fn main() {
//!     let client = RegistryClient::new("http://localhost:8000").unwrap();
//!
//!     // One-shot snapshot; empty if the registry is unreachable.
//!     for url in client.get_agent_urls().await {
//!         println!("discovered agent at {url}");
//!     }
//! }
//! ```

pub mod error;
pub mod shutdown;
pub mod store;
pub mod types;

// Client module (requires client feature)
#[cfg(feature = "client")]
pub mod client;

// Server module (requires server feature)
#[cfg(feature = "server")]
pub mod server;

// Re-export core types
pub use error::{ErrorResponse, RegistryError, RegistryResult};
pub use shutdown::shutdown_signal;
pub use store::AgentStore;
pub use types::{
    AgentInfo, AgentList, HealthStatus, RegisterAck, RegisterRequest, ServiceDescriptor,
    UnregisterAck, unix_timestamp,
};

// Re-export client types
#[cfg(feature = "client")]
pub use client::{DEFAULT_REGISTRY_URL, Registration, RegistryClient};

// Re-export server types
#[cfg(feature = "server")]
pub use server::RegistryServer;
