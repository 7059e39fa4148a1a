mod common;

use std::sync::Arc;
use std::time::Duration;

use carbon_compass::domain::{Coordinate, PLACEHOLDER_CO2_PPM, ResolutionPolicy, SourceTag};
use carbon_compass::error::FetchError;
use carbon_compass::fetch::FetchOrchestrator;
use common::FakeService;
use serde_json::json;

fn hq() -> Coordinate {
    Coordinate::new(20.27, 85.84).unwrap()
}

fn orchestrator(service: &Arc<FakeService>, policy: ResolutionPolicy) -> Arc<FetchOrchestrator> {
    Arc::new(FetchOrchestrator::with_policy(service.clone(), policy))
}

/// Wait until `n` fetches have been started.
async fn wait_for_issued(orchestrator: &FetchOrchestrator, n: u64) {
    for _ in 0..200 {
        if orchestrator.snapshot().issued >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("fetch {n} never started");
}

#[tokio::test]
async fn live_value_is_kept_exactly() {
    let service = Arc::new(FakeService::new(Ok(json!({"predicted_co2_ppm": 437.2}))));
    let orch = orchestrator(&service, ResolutionPolicy::default());

    let outcome = orch.fetch_for_selection(Some(hq())).await.unwrap();

    assert_eq!(outcome.reading.source, SourceTag::Live);
    assert_eq!(outcome.reading.co2_ppm, 437.2);
    assert_eq!(outcome.reading.location_key.as_deref(), Some("20.2700,85.8400"));
    assert_eq!(outcome.projections.source, SourceTag::Live);
    assert_eq!(outcome.projections.series(), &[410.0, 415.5]);
    assert!(outcome.applied);
}

#[tokio::test]
async fn no_selection_is_an_error_without_side_effects() {
    let service = Arc::new(FakeService::new(Ok(json!({"co2": 1.0}))));
    let orch = orchestrator(&service, ResolutionPolicy::default());

    let err = orch.fetch_for_selection(None).await.unwrap_err();

    assert_eq!(err, FetchError::NoSelection);
    assert_eq!(service.metrics_calls(), 0);
    let snap = orch.snapshot();
    assert_eq!(snap.issued, 0);
    assert!(!snap.ready);
}

#[tokio::test]
async fn omitted_coordinates_make_no_network_calls() {
    let service = Arc::new(FakeService::new(Ok(json!({"co2": 1.0}))));
    let orch = orchestrator(&service, ResolutionPolicy::default());

    let outcome = orch.fetch_location(None).await;

    assert_eq!(outcome.reading.source, SourceTag::DummyNoCoordinates);
    assert_eq!(outcome.reading.co2_ppm, PLACEHOLDER_CO2_PPM);
    assert_eq!(outcome.projections.source, SourceTag::DummyNoCoordinates);
    assert_eq!(service.metrics_calls(), 0);
    assert_eq!(service.projections_calls(), 0);
    assert!(orch.is_ready());
}

#[tokio::test]
async fn upstream_failure_yields_api_error_placeholder() {
    let service = Arc::new(
        FakeService::new(Err(FetchError::Network("connection refused".into())))
            .with_projections(Err(FetchError::Network("connection refused".into()))),
    );
    let orch = orchestrator(&service, ResolutionPolicy::default());

    let outcome = orch.fetch_for_selection(Some(hq())).await.unwrap();

    assert_eq!(outcome.reading.source, SourceTag::DummyApiError);
    assert_eq!(outcome.reading.co2_ppm, PLACEHOLDER_CO2_PPM);
    assert!(outcome.reading.error.as_deref().unwrap().contains("connection refused"));
    assert_eq!(outcome.projections.source, SourceTag::DummyApiError);
    assert!(orch.is_ready());
    assert!(!orch.is_loading());
}

#[tokio::test]
async fn body_without_co2_yields_no_data_placeholder() {
    let service = Arc::new(
        FakeService::new(Ok(json!({"pm10": 78.0, "status": "ok"})))
            .with_projections(Ok(json!({"message": "not available"}))),
    );
    let orch = orchestrator(&service, ResolutionPolicy::default());

    let outcome = orch.fetch_for_selection(Some(hq())).await.unwrap();

    assert_eq!(outcome.reading.source, SourceTag::DummyNoCo2Data);
    assert_eq!(outcome.reading.co2_ppm, PLACEHOLDER_CO2_PPM);
    assert_eq!(outcome.projections.source, SourceTag::DummyNoCo2Data);
    assert!(orch.is_ready());
}

#[tokio::test]
async fn metrics_settle_before_projections_start() {
    let service = Arc::new(FakeService::new(Ok(json!({"co2_ppm": 400.0}))));
    let orch = orchestrator(&service, ResolutionPolicy::default());
    let gate = service.gate(&hq().location_key());

    let task = tokio::spawn({
        let orch = orch.clone();
        async move { orch.fetch_for_selection(Some(hq())).await }
    });
    wait_for_issued(&orch, 1).await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(orch.is_loading());
    assert_eq!(service.metrics_calls(), 1);
    assert_eq!(service.projections_calls(), 0);

    gate.send(()).unwrap();
    task.await.unwrap().unwrap();
    assert_eq!(service.projections_calls(), 1);
    assert!(!orch.is_loading());
}

#[tokio::test]
async fn repeated_fetches_use_distinct_cache_busters() {
    let service = Arc::new(FakeService::new(Ok(json!({"co2_ppm": 390.0}))));
    let orch = orchestrator(&service, ResolutionPolicy::default());

    let (a, b) = tokio::join!(
        orch.fetch_for_selection(Some(hq())),
        orch.fetch_for_selection(Some(hq()))
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    let requests = service.metrics_requests.lock().unwrap().clone();
    assert_eq!(requests.len(), 2);
    assert_ne!(requests[0].cache_bust, requests[1].cache_bust);
    assert_eq!(requests[0].coordinate, requests[1].coordinate);
    assert_ne!(a.reading.fetched_at, b.reading.fetched_at);
    assert_ne!(a.sequence, b.sequence);
    assert!(!orch.is_loading());
}

/// Start fetch #1 (A) and fetch #2 (B), let B finish first, then A.
async fn overlapping_fetches(policy: ResolutionPolicy) -> (Arc<FetchOrchestrator>, Coordinate, Coordinate) {
    let service = Arc::new(FakeService::new(Ok(json!({}))).echoing_latitude());
    let orch = orchestrator(&service, policy);
    let a = Coordinate::new(10.0, 70.0).unwrap();
    let b = Coordinate::new(30.0, 80.0).unwrap();
    let gate_a = service.gate(&a.location_key());
    let gate_b = service.gate(&b.location_key());

    let first = tokio::spawn({
        let orch = orch.clone();
        async move { orch.fetch_for_selection(Some(a)).await }
    });
    wait_for_issued(&orch, 1).await;
    let second = tokio::spawn({
        let orch = orch.clone();
        async move { orch.fetch_for_selection(Some(b)).await }
    });
    wait_for_issued(&orch, 2).await;

    gate_b.send(()).unwrap();
    let second = second.await.unwrap().unwrap();
    assert_eq!(second.sequence, 2);
    assert!(orch.is_loading(), "fetch #1 is still pending");

    gate_a.send(()).unwrap();
    let first = first.await.unwrap().unwrap();
    assert_eq!(first.sequence, 1);
    assert!(!orch.is_loading());
    assert!(orch.is_ready());

    (orch, a, b)
}

#[tokio::test]
async fn later_requested_fetch_wins_regardless_of_arrival() {
    let (orch, _a, b) = overlapping_fetches(ResolutionPolicy::LatestRequested).await;

    let snap = orch.snapshot();
    let reading = snap.reading.unwrap();
    assert_eq!(reading.coordinates, Some(b));
    assert_eq!(reading.co2_ppm, 30.0);
    assert_eq!(snap.reading_sequence, 2);
}

#[tokio::test]
async fn latest_completed_policy_keeps_last_arrival() {
    let (orch, a, _b) = overlapping_fetches(ResolutionPolicy::LatestCompleted).await;

    let snap = orch.snapshot();
    let reading = snap.reading.unwrap();
    assert_eq!(reading.coordinates, Some(a));
    assert_eq!(reading.co2_ppm, 10.0);
    assert_eq!(snap.reading_sequence, 1);
}

/// Wait until `n` projections calls have reached the service.
async fn wait_for_projections(service: &FakeService, n: usize) {
    for _ in 0..200 {
        if service.projections_calls() >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("projections call {n} never started");
}

#[tokio::test]
async fn stale_projections_do_not_join_a_newer_reading() {
    let service = Arc::new(FakeService::new(Ok(json!({}))).echoing_latitude());
    let orch = orchestrator(&service, ResolutionPolicy::LatestRequested);
    let a = Coordinate::new(10.0, 70.0).unwrap();
    let b = Coordinate::new(30.0, 80.0).unwrap();
    let gate_a = service.gate_projections(&a.location_key());
    let gate_b = service.gate_projections(&b.location_key());

    // metrics(1), metrics(2), then projections(1).
    let first = tokio::spawn({
        let orch = orch.clone();
        async move { orch.fetch_for_selection(Some(a)).await }
    });
    wait_for_projections(&service, 1).await;
    let second = tokio::spawn({
        let orch = orch.clone();
        async move { orch.fetch_for_selection(Some(b)).await }
    });
    wait_for_projections(&service, 2).await;

    gate_a.send(()).unwrap();
    let first = first.await.unwrap().unwrap();
    assert!(!first.applied);

    let snap = orch.snapshot();
    assert_eq!(snap.reading.as_ref().unwrap().coordinates, Some(b));
    assert!(snap.projections.is_none());
    assert!(snap.loading);

    gate_b.send(()).unwrap();
    let second = second.await.unwrap().unwrap();
    assert!(second.applied);

    let snap = orch.snapshot();
    assert_eq!(snap.reading_sequence, 2);
    assert_eq!(snap.projections_sequence, 2);
    assert_eq!(snap.reading.unwrap().co2_ppm, 30.0);
    assert!(!snap.loading);
    assert!(snap.ready);
}

#[tokio::test]
async fn dropped_fetch_clears_loading() {
    let service = Arc::new(FakeService::new(Ok(json!({"co2_ppm": 400.0}))));
    let orch = orchestrator(&service, ResolutionPolicy::default());
    let _gate = service.gate(&hq().location_key());

    let task = tokio::spawn({
        let orch = orch.clone();
        async move { orch.fetch_for_selection(Some(hq())).await }
    });
    wait_for_issued(&orch, 1).await;
    assert!(orch.is_loading());

    task.abort();
    let _ = task.await;
    assert!(!orch.is_loading());
    assert!(!orch.is_ready());
}
