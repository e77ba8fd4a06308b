//! Tests for HttpReadinessProbe against wiremock targets

use std::time::{Duration, Instant};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::common::FAST_POLL;
use crate::core::ReadinessPolicy;
use crate::error::ClusterError;
use crate::services::readiness_probe::HttpReadinessProbe;
use crate::traits::ReadinessProbe;

fn health(status: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_string(format!(r#"{{"cluster_name":"test","status":"{status}"}}"#))
}

fn fast_primary(attempts: u32) -> ReadinessPolicy {
    ReadinessPolicy::primary()
        .with_poll_interval(FAST_POLL)
        .with_max_attempts(attempts)
}

#[tokio::test]
async fn test_ready_on_first_attempt() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_cluster/health"))
        .respond_with(health("green"))
        .expect(1)
        .mount(&server)
        .await;

    let probe = HttpReadinessProbe::new().unwrap();
    let attempt = probe.wait_until_ready(&server.uri(), &fast_primary(10)).await.unwrap();

    assert_eq!(attempt, 1);
}

#[tokio::test]
async fn test_yellow_health_is_ready() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_cluster/health"))
        .respond_with(health("yellow"))
        .mount(&server)
        .await;

    let probe = HttpReadinessProbe::new().unwrap();
    assert_eq!(probe.wait_until_ready(&server.uri(), &fast_primary(3)).await.unwrap(), 1);
}

#[tokio::test]
async fn test_ready_after_unavailable_responses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_cluster/health"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/_cluster/health"))
        .respond_with(health("green"))
        .mount(&server)
        .await;

    let probe = HttpReadinessProbe::new().unwrap();
    let attempt = probe.wait_until_ready(&server.uri(), &fast_primary(10)).await.unwrap();

    assert_eq!(attempt, 3);
}

#[tokio::test]
async fn test_red_health_exhausts_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_cluster/health"))
        .respond_with(health("red"))
        .expect(3)
        .mount(&server)
        .await;

    let probe = HttpReadinessProbe::new().unwrap();
    let result = probe.wait_until_ready(&server.uri(), &fast_primary(3)).await;

    match result {
        Err(ClusterError::ClusterNotAvailable { url, attempts }) => {
            assert_eq!(attempts, 3);
            assert_eq!(url, format!("{}/_cluster/health", server.uri()));
        }
        other => panic!("Expected ClusterNotAvailable, got {other:?}"),
    }
}

#[tokio::test]
async fn test_connection_refused_counts_as_not_ready() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let probe = HttpReadinessProbe::new().unwrap();
    let result = probe
        .wait_until_ready(&format!("http://127.0.0.1:{port}"), &fast_primary(2))
        .await;

    assert!(matches!(result, Err(ClusterError::ClusterNotAvailable { attempts: 2, .. })));
}

#[tokio::test]
async fn test_no_sleep_after_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let policy = ReadinessPolicy::companion().with_poll_interval(Duration::from_secs(5));
    let probe = HttpReadinessProbe::new().unwrap();

    let started = Instant::now();
    probe.wait_until_ready(&server.uri(), &policy).await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_companion_status_code_decides() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/status"))
        .respond_with(ResponseTemplate::new(401))
        .expect(2)
        .mount(&server)
        .await;

    let policy = ReadinessPolicy::companion()
        .with_poll_interval(FAST_POLL)
        .with_max_attempts(2);
    let probe = HttpReadinessProbe::new().unwrap();

    assert!(probe.wait_until_ready(&server.uri(), &policy).await.is_err());
}

#[tokio::test]
async fn test_credentials_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/_cluster/health"))
        .and(header("authorization", "Basic YWRtaW46YWRtaW4="))
        .respond_with(health("green"))
        .expect(1)
        .mount(&server)
        .await;

    let probe = HttpReadinessProbe::new().unwrap().with_credentials("admin", "admin");

    // Trailing slash on the base URL must not double up
    let base = format!("{}/", server.uri());
    assert_eq!(probe.wait_until_ready(&base, &fast_primary(1)).await.unwrap(), 1);
}
