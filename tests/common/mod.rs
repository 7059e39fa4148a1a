//! In-process fakes shared by the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use carbon_compass::data::{MetricsRequest, PredictionService, ProjectionsRequest};
use carbon_compass::error::FetchError;
use carbon_compass::policy::TextGenerator;
use serde_json::{Value, json};
use tokio::sync::oneshot;

/// Scripted prediction service.
///
/// Answers with `metrics` / `projections`, records every request, and can hold
/// a metrics or projections call for a given location until its gate is released.
pub struct FakeService {
    pub metrics: Result<Value, FetchError>,
    pub projections: Result<Value, FetchError>,
    /// When set, the metrics body is `{"co2_ppm": <lat>}`, to tell fetches apart.
    pub echo_latitude: bool,
    pub metrics_requests: Mutex<Vec<MetricsRequest>>,
    pub projections_requests: Mutex<Vec<ProjectionsRequest>>,
    gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
    projection_gates: Mutex<HashMap<String, oneshot::Receiver<()>>>,
}

impl FakeService {
    pub fn new(metrics: Result<Value, FetchError>) -> Self {
        Self {
            metrics,
            projections: Ok(json!({"labels": ["Jul", "Aug"], "series": [410.0, 415.5]})),
            echo_latitude: false,
            metrics_requests: Mutex::new(Vec::new()),
            projections_requests: Mutex::new(Vec::new()),
            gates: Mutex::new(HashMap::new()),
            projection_gates: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_projections(mut self, projections: Result<Value, FetchError>) -> Self {
        self.projections = projections;
        self
    }

    pub fn echoing_latitude(mut self) -> Self {
        self.echo_latitude = true;
        self
    }

    /// Hold the metrics call for `location_key` until the returned sender fires.
    pub fn gate(&self, location_key: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().insert(location_key.to_string(), rx);
        tx
    }

    /// Hold the projections call for `location_key` until the returned sender fires.
    pub fn gate_projections(&self, location_key: &str) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.projection_gates
            .lock()
            .unwrap()
            .insert(location_key.to_string(), rx);
        tx
    }

    pub fn metrics_calls(&self) -> usize {
        self.metrics_requests.lock().unwrap().len()
    }

    pub fn projections_calls(&self) -> usize {
        self.projections_requests.lock().unwrap().len()
    }
}

#[async_trait]
impl PredictionService for FakeService {
    async fn fetch_metrics(&self, request: &MetricsRequest) -> Result<Value, FetchError> {
        self.metrics_requests.lock().unwrap().push(request.clone());
        let gate = self
            .gates
            .lock()
            .unwrap()
            .remove(&request.coordinate.location_key());
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if self.echo_latitude {
            return Ok(json!({"co2_ppm": request.coordinate.lat()}));
        }
        self.metrics.clone()
    }

    async fn fetch_projections(&self, request: &ProjectionsRequest) -> Result<Value, FetchError> {
        self.projections_requests.lock().unwrap().push(request.clone());
        let gate = self
            .projection_gates
            .lock()
            .unwrap()
            .remove(&request.coordinate.location_key());
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        self.projections.clone()
    }
}

/// Text generator that replays one answer and records prompts.
pub struct FakeGenerator {
    pub reply: Result<String, FetchError>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn new(reply: Result<&str, FetchError>) -> Self {
        Self {
            reply: reply.map(str::to_string),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, FetchError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone()
    }
}
