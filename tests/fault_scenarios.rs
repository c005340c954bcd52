//! Behavior tests for the simulated endpoints and the probe.
//!
//! Each test uses its own fixed port pair (2901x..2910x) so the suite can
//! run in parallel without bind conflicts.

mod common;

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use fault_harness::endpoint::{EndpointConfig, ProxyEndpoint, TargetEndpoint};
use fault_harness::faults::FailureKind;
use fault_harness::probe::{Probe, ProbeOutcome};

fn local(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

#[tokio::test]
async fn raw_probe_connects_to_listening_target() {
    let config = common::test_config(29011, 29012);
    let target = TargetEndpoint::spawn(&config, EndpointConfig::default())
        .await
        .unwrap();

    let probe = Probe::new(Duration::from_secs(2));
    let outcome = probe.connect_raw(local(29012)).await;
    assert!(outcome.is_success(), "got {:?}", outcome);

    target.shutdown().await.unwrap();
}

#[tokio::test]
async fn refusing_target_terminates_before_any_data() {
    let config = common::test_config(29021, 29022);
    let target = TargetEndpoint::spawn(
        &config,
        EndpointConfig {
            accept_connections: false,
            ..EndpointConfig::default()
        },
    )
    .await
    .unwrap();

    let probe = Probe::new(Duration::from_secs(2));
    let outcome = probe.connect_raw(local(29022)).await;

    match outcome {
        ProbeOutcome::Failed(failure) => {
            assert_eq!(failure.kind, FailureKind::ConnectionRefused);
            assert_eq!(failure.syscall, Some("connect"));
            assert_eq!(failure.addr, local(29022));
        }
        other => panic!("expected a refusal, got {:?}", other),
    }
    assert_eq!(target.handled(), 0, "a refusing target reads no data");

    target.shutdown().await.unwrap();
}

#[tokio::test]
async fn responding_target_answers_after_delay() {
    let config = common::test_config(29031, 29032);
    let target = TargetEndpoint::spawn(&config, EndpointConfig::default())
        .await
        .unwrap();

    let probe = Probe::new(Duration::from_secs(2));
    let outcome = probe.request_http(local(29032)).await;

    match outcome {
        ProbeOutcome::Responded { status, body } => {
            assert_eq!(status, 200);
            assert_eq!(body, "target ok");
        }
        other => panic!("expected a response, got {:?}", other),
    }
    assert_eq!(target.handled(), 1);

    target.shutdown().await.unwrap();
}

#[tokio::test]
async fn silent_target_times_out_the_probe() {
    let config = common::test_config(29041, 29042);
    let target = TargetEndpoint::spawn(
        &config,
        EndpointConfig {
            respond_to_requests: false,
            ..EndpointConfig::default()
        },
    )
    .await
    .unwrap();

    let probe = Probe::new(Duration::from_millis(500));
    let started = Instant::now();
    let outcome = probe.request_http(local(29042)).await;

    assert!(
        matches!(outcome, ProbeOutcome::TimedOut { .. }),
        "got {:?}",
        outcome
    );
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "the probe must resolve at the window, not hang"
    );

    target.shutdown().await.unwrap();
}

#[tokio::test]
async fn dropping_proxy_answers_503_without_forwarding() {
    let config = common::test_config(29051, 29052);
    // A healthy target sits behind the proxy to prove nothing reaches it.
    let target = TargetEndpoint::spawn(&config, EndpointConfig::default())
        .await
        .unwrap();
    let proxy = ProxyEndpoint::spawn(
        &config,
        EndpointConfig {
            forward_traffic: false,
            ..EndpointConfig::default()
        },
    )
    .await
    .unwrap();

    let client = common::test_client();
    let response = client.get("http://127.0.0.1:29051/").send().await.unwrap();
    assert_eq!(response.status(), 503);
    assert_eq!(response.text().await.unwrap(), "Dropping Traffic");
    assert_eq!(target.handled(), 0, "drop mode must not attempt an upstream");
    assert_eq!(proxy.handled(), 1);

    proxy.shutdown().await.unwrap();
    target.shutdown().await.unwrap();
}

#[tokio::test]
async fn refused_backend_surfaces_502_through_proxy() {
    let config = common::test_config(29061, 29062);
    let target = TargetEndpoint::spawn(
        &config,
        EndpointConfig {
            accept_connections: false,
            ..EndpointConfig::default()
        },
    )
    .await
    .unwrap();
    let proxy = ProxyEndpoint::spawn(
        &config,
        EndpointConfig {
            forward_target: Some(local(29062)),
            ..EndpointConfig::default()
        },
    )
    .await
    .unwrap();

    let client = common::test_client();
    let response = client.get("http://127.0.0.1:29061/").send().await.unwrap();
    assert_eq!(response.status(), 502);
    assert_eq!(response.text().await.unwrap(), "Connection Refused");

    proxy.shutdown().await.unwrap();
    target.shutdown().await.unwrap();
}

#[tokio::test]
async fn stale_endpoint_resolves_within_the_window() {
    let config = common::test_config(29071, 29072);
    let proxy = ProxyEndpoint::spawn(
        &config,
        EndpointConfig {
            forward_target: Some(local(29072)),
            simulate_stale_endpoint: true,
            ..EndpointConfig::default()
        },
    )
    .await
    .unwrap();

    let client = common::test_client();
    let started = Instant::now();
    let response = client.get("http://127.0.0.1:29071/").send().await.unwrap();
    let status = response.status().as_u16();
    assert!(status == 502 || status == 504, "got {status}");
    assert!(
        started.elapsed() < Duration::from_secs(2),
        "a stale endpoint must resolve, not hang"
    );

    proxy.shutdown().await.unwrap();
}

#[tokio::test]
async fn healthy_backend_is_mirrored_through_proxy() {
    let config = common::test_config(29081, 29082);
    let target = TargetEndpoint::spawn(&config, EndpointConfig::default())
        .await
        .unwrap();
    let proxy = ProxyEndpoint::spawn(
        &config,
        EndpointConfig {
            forward_target: Some(local(29082)),
            ..EndpointConfig::default()
        },
    )
    .await
    .unwrap();

    let client = common::test_client();
    let response = client.get("http://127.0.0.1:29081/").send().await.unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(response.text().await.unwrap(), "target ok");
    assert_eq!(target.handled(), 1);
    assert_eq!(proxy.handled(), 1);

    proxy.shutdown().await.unwrap();
    target.shutdown().await.unwrap();
}

#[tokio::test]
async fn silent_backend_surfaces_504_through_proxy() {
    let config = common::test_config(29091, 29092);
    let target = TargetEndpoint::spawn(
        &config,
        EndpointConfig {
            respond_to_requests: false,
            ..EndpointConfig::default()
        },
    )
    .await
    .unwrap();
    let proxy = ProxyEndpoint::spawn(
        &config,
        EndpointConfig {
            forward_target: Some(local(29092)),
            ..EndpointConfig::default()
        },
    )
    .await
    .unwrap();

    let client = common::test_client();
    let response = client.get("http://127.0.0.1:29091/").send().await.unwrap();
    assert_eq!(response.status(), 504);
    assert_eq!(response.text().await.unwrap(), "Gateway Timeout");

    proxy.shutdown().await.unwrap();
    target.shutdown().await.unwrap();
}

#[tokio::test]
async fn resetting_backend_surfaces_classified_500() {
    let config = common::test_config(29101, 29102);
    let target = TargetEndpoint::spawn(
        &config,
        EndpointConfig {
            respond_to_requests: false,
            delay_before_reset: Duration::from_millis(100),
            ..EndpointConfig::default()
        },
    )
    .await
    .unwrap();
    let proxy = ProxyEndpoint::spawn(
        &config,
        EndpointConfig {
            forward_target: Some(local(29102)),
            ..EndpointConfig::default()
        },
    )
    .await
    .unwrap();

    let client = common::test_client();
    let response = client.get("http://127.0.0.1:29101/").send().await.unwrap();
    assert_eq!(response.status(), 500);
    let body = response.text().await.unwrap();
    assert!(
        body.starts_with("Error:"),
        "the default branch must name the raw kind, got `{body}`"
    );

    proxy.shutdown().await.unwrap();
    target.shutdown().await.unwrap();
}
