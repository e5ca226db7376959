//! Wire types for the agent registry protocol.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{RegistryError, RegistryResult};

/// Current server clock as a float unix timestamp in seconds.
///
/// This is the wire representation used for `registered_at` and the health
/// endpoint timestamp.
pub fn unix_timestamp() -> f64 {
    Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// One registration record per discoverable agent.
///
/// `name` is the sole primary key; the store holds at most one record per
/// name. `registered_at` is assigned by the server clock on every successful
/// register and is never taken from the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentInfo {
    /// Unique name of the agent
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Network address at which the agent can be reached
    pub url: String,

    /// Capabilities advertised by the agent; ordering is not significant
    #[serde(default)]
    pub capabilities: Vec<String>,

    /// Server-assigned unix timestamp of the most recent register
    pub registered_at: f64,
}

/// Body of a `POST /register` request.
///
/// Deliberately has no `registered_at` field: a caller-supplied timestamp is
/// ignored and the server stamps its own clock at store time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterRequest {
    /// Unique name of the agent
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Network address at which the agent can be reached
    pub url: String,

    /// Capabilities advertised by the agent
    #[serde(default)]
    pub capabilities: Vec<String>,
}

impl RegisterRequest {
    /// Create a registration request with the required fields
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        url: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            url: url.into(),
            capabilities: Vec::new(),
        }
    }

    /// Add a single capability
    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.capabilities.push(capability.into());
        self
    }

    /// Add a set of capabilities
    pub fn with_capabilities<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.capabilities.extend(capabilities.into_iter().map(Into::into));
        self
    }

    /// Check the required fields before any store mutation.
    pub fn validate(&self) -> RegistryResult<()> {
        if self.name.is_empty() {
            return Err(RegistryError::invalid_registration("name must not be empty"));
        }
        if self.url.is_empty() {
            return Err(RegistryError::invalid_registration("url must not be empty"));
        }
        Ok(())
    }

    /// Turn a validated request into a stored record with the given
    /// server-assigned timestamp.
    pub(crate) fn into_record(self, registered_at: f64) -> AgentInfo {
        AgentInfo {
            name: self.name,
            description: self.description,
            url: self.url,
            capabilities: self.capabilities,
            registered_at,
        }
    }
}

/// Acknowledgement of a successful register
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterAck {
    /// Always `"registered"`
    pub status: String,

    /// Name of the registered agent
    pub agent: String,
}

impl RegisterAck {
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            status: "registered".to_string(),
            agent: agent.into(),
        }
    }
}

/// Acknowledgement of a successful unregister
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnregisterAck {
    /// Always `"unregistered"`
    pub status: String,

    /// Name of the removed agent
    pub agent: String,
}

impl UnregisterAck {
    pub fn new(agent: impl Into<String>) -> Self {
        Self {
            status: "unregistered".to_string(),
            agent: agent.into(),
        }
    }
}

/// Body of a `GET /agents` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentList {
    /// Snapshot of all current records, unspecified order
    pub agents: Vec<AgentInfo>,
}

/// Body of a `GET /health` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    /// Always `"healthy"` while the process is alive
    pub status: String,

    /// Number of records currently in the store
    pub agents_count: usize,

    /// Server clock at the time of the check
    pub timestamp: f64,
}

impl HealthStatus {
    /// Build a healthy response for the given record count
    pub fn healthy(agents_count: usize) -> Self {
        Self {
            status: "healthy".to_string(),
            agents_count,
            timestamp: unix_timestamp(),
        }
    }
}

/// Static service metadata served at `GET /`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Service name
    pub service: String,

    /// Crate version
    pub version: String,

    /// Operation name to `"METHOD /path"`
    pub endpoints: BTreeMap<String, String>,
}

impl ServiceDescriptor {
    /// Descriptor for this build of the registry. No state dependency.
    pub fn current() -> Self {
        let endpoints = [
            ("register", "POST /register"),
            ("unregister", "DELETE /unregister/{name}"),
            ("list_agents", "GET /agents"),
            ("get_agent", "GET /agents/{name}"),
            ("health", "GET /health"),
        ]
        .into_iter()
        .map(|(name, route)| (name.to_string(), route.to_string()))
        .collect();

        Self {
            service: "Muster Agent Registry".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            endpoints,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_request_builder() {
        let request = RegisterRequest::new("weather_agent", "Weather expert", "http://localhost:8080")
            .with_capability("weather_info")
            .with_capabilities(["forecasts", "weather_advice"]);

        assert_eq!(request.name, "weather_agent");
        assert_eq!(
            request.capabilities,
            vec!["weather_info", "forecasts", "weather_advice"]
        );
        assert!(request.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_empty_name() {
        let request = RegisterRequest::new("", "desc", "http://localhost:8080");
        let err = request.validate().unwrap_err();
        assert!(matches!(err, RegistryError::InvalidRegistration { .. }));
    }

    #[test]
    fn test_validation_rejects_empty_url() {
        let request = RegisterRequest::new("agent", "desc", "");
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_caller_timestamp_is_ignored() {
        // A payload carrying registered_at still deserializes, and the field
        // never reaches the request type.
        let request: RegisterRequest = serde_json::from_str(
            r#"{"name":"a","description":"d","url":"http://x","registered_at":1.0}"#,
        )
        .unwrap();
        assert_eq!(request.name, "a");
        assert!(request.capabilities.is_empty());
    }

    #[test]
    fn test_agent_info_wire_format() {
        let info = RegisterRequest::new("a", "d", "http://x")
            .with_capability("c")
            .into_record(42.5);

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["name"], "a");
        assert_eq!(json["capabilities"][0], "c");
        assert_eq!(json["registered_at"], 42.5);
    }

    #[test]
    fn test_unix_timestamp_is_monotonic_enough() {
        let before = unix_timestamp();
        let after = unix_timestamp();
        assert!(after >= before);
        assert!(before > 1_000_000_000.0);
    }

    #[test]
    fn test_service_descriptor_lists_all_endpoints() {
        let descriptor = ServiceDescriptor::current();
        assert_eq!(descriptor.endpoints.len(), 5);
        assert_eq!(descriptor.endpoints["register"], "POST /register");
        assert_eq!(descriptor.endpoints["health"], "GET /health");
    }
}
