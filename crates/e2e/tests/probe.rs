//! Readiness prober behaviour against real sockets

mod common;

use std::time::{Duration, Instant};

use fresh_e2e::probe::{ProbeConfig, ReadinessProber};
use fresh_e2e::E2eError;

fn probe(port: u16, timeout_ms: u64, interval_ms: u64) -> ReadinessProber {
    ReadinessProber::new(ProbeConfig {
        url: format!("http://127.0.0.1:{}", port),
        timeout: Duration::from_millis(timeout_ms),
        interval: Duration::from_millis(interval_ms),
    })
    .unwrap()
}

#[tokio::test]
async fn timeout_lands_between_deadline_and_one_interval_later() {
    let port = common::find_free_port();
    let timeout = Duration::from_millis(600);
    let interval = Duration::from_millis(200);

    let start = Instant::now();
    let err = probe(port, 600, 200).wait().await.unwrap_err();
    let elapsed = start.elapsed();

    match err {
        E2eError::ServerStartTimeout { timeout: t } => assert_eq!(t, timeout),
        other => panic!("expected timeout, got {other}"),
    }
    assert!(elapsed >= timeout, "returned early: {:?}", elapsed);
    assert!(
        elapsed <= timeout + interval,
        "returned too late: {:?}",
        elapsed
    );
}

#[tokio::test]
async fn single_probe_reports_not_ready_without_error() {
    let port = common::find_free_port();
    assert!(!probe(port, 100, 50).probe_once().await);
}

#[tokio::test]
async fn ready_server_is_detected_immediately() {
    let port = common::find_free_port();
    let _server = common::serve_status(port, "200 OK").await;

    let start = Instant::now();
    probe(port, 5_000, 1_000).wait().await.unwrap();
    assert!(start.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn any_http_status_counts_as_ready() {
    let port = common::find_free_port();
    let _server = common::serve_status(port, "500 Internal Server Error").await;

    assert!(probe(port, 1_000, 100).probe_once().await);
}

#[tokio::test]
async fn server_coming_up_late_is_picked_up_by_polling() {
    let port = common::find_free_port();

    let late = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(300)).await;
        common::serve_status(port, "200 OK").await
    });

    probe(port, 5_000, 100).wait().await.unwrap();
    late.await.unwrap().abort();
}

#[tokio::test]
async fn wait_for_server_uses_localhost() {
    let port = common::find_free_port();
    let _server = common::serve_status(port, "204 No Content").await;

    fresh_e2e::wait_for_server(port, Duration::from_secs(5))
        .await
        .unwrap();
}

#[tokio::test]
async fn http_proxy_reply_does_not_count_as_ready() {
    let proxy_port = common::find_free_port();
    let _proxy = common::serve_status(proxy_port, "502 Bad Gateway").await;
    let proxy = format!("http://127.0.0.1:{}", proxy_port);
    for var in ["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"] {
        std::env::set_var(var, &proxy);
    }
    std::env::remove_var("NO_PROXY");
    std::env::remove_var("no_proxy");

    let port = common::find_free_port();
    let result = fresh_e2e::wait_for_server(port, Duration::from_millis(1_500)).await;

    for var in ["HTTP_PROXY", "http_proxy", "ALL_PROXY", "all_proxy"] {
        std::env::remove_var(var);
    }

    match result {
        Err(E2eError::ServerStartTimeout { timeout }) => {
            assert_eq!(timeout, Duration::from_millis(1_500))
        }
        other => panic!("expected timeout with nothing on {}, got {:?}", port, other),
    }
}
