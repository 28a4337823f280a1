// Lease behaviour under a paused clock — grant waits, timeouts and idempotent close.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;

use hb_network_engine::requester::manual::ManualNetworkRequester;
use hb_network_engine::{HighBandwidthMediator, HighBandwidthRequest, NetworkType, TransportSet};

fn manual_mediator() -> (Arc<ManualNetworkRequester>, HighBandwidthMediator) {
    let requester = Arc::new(ManualNetworkRequester::new());
    let mediator = HighBandwidthMediator::new(requester.clone());
    (requester, mediator)
}

#[tokio::test(start_paused = true)]
async fn test_await_granted_returns_true_on_grant() {
    let (requester, mediator) = manual_mediator();
    let lease = mediator.request_high_bandwidth_network(HighBandwidthRequest::WIFI_ONLY);

    let granter = Arc::clone(&requester);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(500)).await;
        granter.grant(TransportSet::WifiOnly, NetworkType::Wifi);
    });

    let started = Instant::now();
    assert!(lease.await_granted(Duration::from_secs(2)).await);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_millis(500));
    assert!(elapsed < Duration::from_secs(2));
    assert_eq!(mediator.stats().await_timeouts, 0);
}

#[tokio::test(start_paused = true)]
async fn test_await_granted_times_out_without_grant() {
    let (_requester, mediator) = manual_mediator();
    let lease = mediator.request_high_bandwidth_network(HighBandwidthRequest::ANY);

    let started = Instant::now();
    assert!(!lease.await_granted(Duration::from_secs(1)).await);
    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(1));
    assert!(elapsed < Duration::from_millis(1100));
    assert_eq!(mediator.stats().await_timeouts, 1);
}

#[tokio::test(start_paused = true)]
async fn test_await_granted_short_circuits_after_grace_window() {
    let (requester, mediator) = manual_mediator();
    let _first = mediator.request_high_bandwidth_network(HighBandwidthRequest::CELL_ONLY);

    tokio::time::advance(Duration::from_secs(4)).await;
    let second = mediator.request_high_bandwidth_network(HighBandwidthRequest::CELL_ONLY);
    assert_eq!(requester.request_count(), 1);

    let started = Instant::now();
    assert!(!second.await_granted(Duration::from_secs(30)).await);
    assert_eq!(started.elapsed(), Duration::ZERO);
}

#[tokio::test(start_paused = true)]
async fn test_loss_does_not_restart_grace_window() {
    let (requester, mediator) = manual_mediator();
    let _first = mediator.request_high_bandwidth_network(HighBandwidthRequest::CELL_ONLY);

    tokio::time::advance(Duration::from_secs(10)).await;
    requester.grant(TransportSet::CellOnly, NetworkType::Cell);
    requester.lose(TransportSet::CellOnly);

    let second = mediator.request_high_bandwidth_network(HighBandwidthRequest::CELL_ONLY);
    let started = Instant::now();
    assert!(!second.await_granted(Duration::from_secs(30)).await);
    assert_eq!(started.elapsed(), Duration::ZERO);
    assert_eq!(requester.request_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_regrant_after_loss_within_grace_window() {
    let (requester, mediator) = manual_mediator();
    let lease = mediator.request_high_bandwidth_network(HighBandwidthRequest::WIFI_ONLY);
    requester.grant(TransportSet::WifiOnly, NetworkType::Wifi);
    requester.lose(TransportSet::WifiOnly);

    let granter = Arc::clone(&requester);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        granter.grant(TransportSet::WifiOnly, NetworkType::Wifi);
    });
    assert!(lease.await_granted(Duration::from_secs(5)).await);
}

#[tokio::test(start_paused = true)]
async fn test_grant_on_other_bucket_does_not_satisfy_lease() {
    let (requester, mediator) = manual_mediator();
    let wifi = mediator.request_high_bandwidth_network(HighBandwidthRequest::WIFI_ONLY);
    let _cell = mediator.request_high_bandwidth_network(HighBandwidthRequest::CELL_ONLY);

    requester.grant(TransportSet::CellOnly, NetworkType::Cell);
    assert!(mediator.pinned_now().contains(NetworkType::Cell));
    assert!(!wifi.await_granted(Duration::from_secs(1)).await);
}

#[tokio::test]
async fn test_already_granted_returns_immediately() {
    let (requester, mediator) = manual_mediator();
    let lease = mediator.request_high_bandwidth_network(HighBandwidthRequest::ANY);
    requester.grant(TransportSet::Any, NetworkType::Cell);

    assert!(lease.await_granted(Duration::ZERO).await);
}

#[tokio::test]
async fn test_close_is_idempotent() {
    let (requester, mediator) = manual_mediator();
    let lease = mediator.request_high_bandwidth_network(HighBandwidthRequest::WIFI_ONLY);
    let other = mediator.request_high_bandwidth_network(HighBandwidthRequest::WIFI_ONLY);

    lease.close();
    lease.close();
    assert!(lease.is_closed());
    assert_eq!(mediator.stats().leases_closed, 1);
    assert_eq!(mediator.stats().active_leases, 1);
    assert_eq!(requester.active_count(), 1);

    drop(lease);
    assert_eq!(requester.active_count(), 1);

    other.close();
    drop(other);
    assert_eq!(requester.release_count(), 1);
    assert_eq!(mediator.stats().leases_closed, 2);
}

#[tokio::test]
async fn test_closed_lease_never_reports_grant() {
    let requester = Arc::new(ManualNetworkRequester::with_auto_grant(NetworkType::Cell));
    let mediator = HighBandwidthMediator::new(requester.clone());

    let lease = mediator.request_high_bandwidth_network(HighBandwidthRequest::CELL_ONLY);
    lease.close();
    assert!(!lease.await_granted(Duration::from_secs(1)).await);
}

#[tokio::test]
async fn test_close_before_grant_cancels_acquisition() {
    let (requester, mediator) = manual_mediator();
    let lease = mediator.request_high_bandwidth_network(HighBandwidthRequest::ANY);
    lease.close();

    assert_eq!(requester.active_count(), 0);
    assert!(!requester.grant(TransportSet::Any, NetworkType::Wifi));
    assert!(mediator.pinned_now().is_empty());
}

#[test]
fn test_lease_debug_shows_request() {
    let (_requester, mediator) = manual_mediator();
    let lease = mediator.request_high_bandwidth_network(HighBandwidthRequest::WIFI_ONLY);
    let rendered = format!("{:?}", lease);
    assert!(rendered.contains("WifiOnly"));
    assert!(rendered.contains("closed: false"));
}
