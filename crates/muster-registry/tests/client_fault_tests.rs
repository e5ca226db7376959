//! Fault-injection tests for the registry client
//!
//! A mock registry returns error statuses, garbage bodies, and slow
//! responses; the best-effort client surface must absorb all of it without
//! ever propagating an error into the caller.

#![cfg(feature = "client")]

use muster_registry::{RegisterRequest, RegistryClient, RegistryError};
use std::time::Duration;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn request() -> RegisterRequest {
    RegisterRequest::new("weather_agent", "desc", "http://localhost:8080")
}

#[tokio::test]
async fn test_register_returns_none_on_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(ResponseTemplate::new(500).set_body_string("registry exploded"))
        .mount(&server)
        .await;

    let client = RegistryClient::new(server.uri()).unwrap();
    assert!(client.register(request()).await.is_none());
}

#[tokio::test]
async fn test_try_register_maps_bad_request() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(ResponseTemplate::new(400).set_body_string("name must not be empty"))
        .mount(&server)
        .await;

    let client = RegistryClient::new(server.uri()).unwrap();
    let err = client.try_register(request()).await.unwrap_err();
    assert!(matches!(err, RegistryError::InvalidRegistration { .. }));
    assert!(!err.is_retryable());
}

#[tokio::test]
async fn test_list_agents_empty_on_garbage_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/agents"))
        .respond_with(ResponseTemplate::new(200).set_body_string("this is not json"))
        .mount(&server)
        .await;

    let client = RegistryClient::new(server.uri()).unwrap();
    assert!(client.list_agents().await.is_empty());
    assert!(client.get_agent_urls().await.is_empty());
}

#[tokio::test]
async fn test_health_check_none_on_unavailable() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let client = RegistryClient::new(server.uri()).unwrap();
    assert!(client.health_check().await.is_none());
}

#[tokio::test]
async fn test_unregister_swallows_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path_regex("^/unregister/.*$"))
        .respond_with(ResponseTemplate::new(404).set_body_string("Agent not found"))
        .mount(&server)
        .await;

    let client = RegistryClient::new(server.uri()).unwrap();
    // Must complete without panicking; the not-found is logged at debug.
    client.unregister("never_registered").await;

    let err = client.try_unregister("never_registered").await.unwrap_err();
    assert!(matches!(err, RegistryError::AgentNotFound { .. }));
}

#[tokio::test]
async fn test_slow_registry_times_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/register"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
        .mount(&server)
        .await;

    let client = RegistryClient::with_timeout(server.uri(), Duration::from_millis(50)).unwrap();
    let err = client.try_register(request()).await.unwrap_err();
    assert!(matches!(err, RegistryError::Timeout { .. }));
    assert!(err.is_retryable());

    // And the best-effort path turns the same failure into a sentinel.
    assert!(client.register(request()).await.is_none());
}
