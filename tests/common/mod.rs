//! Shared test utilities for discovery-sync integration tests.
//!
//! - `FakeBackend`: scripted in-memory gateway with per-route gates
//! - `RecordingNavigator`: captures host navigation
//! - `harness`: controller wiring with a fake backend

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Semaphore;

use discovery_sync::{
    ApiRequest, AutoConfirm, ClientConfig, DiscoveryController, Gateway, GatewayError, Method,
    Navigator,
};

type Reply = Result<Value, GatewayError>;
type Route = (Method, String);

/// Answers from per-route queues; the last queued reply repeats and
/// unscripted routes answer 404. A gated route blocks until released, and
/// picks its reply only after release.
#[derive(Default)]
pub struct FakeBackend {
    routes: Mutex<HashMap<Route, VecDeque<Reply>>>,
    gates: Mutex<HashMap<Route, Arc<Semaphore>>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl FakeBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    /// Replace everything queued for the route with a single reply.
    pub fn set(&self, method: Method, path: &str, reply: Reply) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .insert((method, path.to_string()), VecDeque::from([reply]));
        self
    }

    pub fn hold(&self, method: Method, path: &str) {
        self.gates
            .lock()
            .unwrap()
            .insert((method, path.to_string()), Arc::new(Semaphore::new(0)));
    }

    pub fn release(&self, method: Method, path: &str) {
        if let Some(gate) = self.gates.lock().unwrap().remove(&(method, path.to_string())) {
            gate.close();
        }
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method == method && r.path == path)
            .count()
    }

    /// Yield until at least `n` requests reached the route.
    pub async fn wait_for(&self, method: Method, path: &str, n: usize) {
        for _ in 0..1_000 {
            if self.count(method, path) >= n {
                return;
            }
            tokio::task::yield_now().await;
        }
        panic!("{:?} {} was requested fewer than {} times", method, path, n);
    }
}

#[async_trait]
impl Gateway for FakeBackend {
    async fn request(&self, request: ApiRequest) -> Result<Value, GatewayError> {
        let route = (request.method, request.path.clone());
        self.requests.lock().unwrap().push(request);

        let gate = self.gates.lock().unwrap().get(&route).cloned();
        if let Some(gate) = gate {
            // Resolves with an error once the gate is closed by `release`.
            let _ = gate.acquire().await;
        }

        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&route) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or(Err(GatewayError::HttpError { status: 404 })),
            None => Err(GatewayError::HttpError { status: 404 }),
        }
    }

    fn name(&self) -> &str {
        "fake"
    }
}

#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<String>>,
}

impl RecordingNavigator {
    pub fn visited(&self) -> Vec<String> {
        self.routes.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: &str) {
        self.routes.lock().unwrap().push(route.to_string());
    }
}

pub const POLL: Duration = Duration::from_millis(5_000);
pub const IDLE: Duration = Duration::from_millis(180_000);

pub fn test_config() -> ClientConfig {
    ClientConfig {
        poll_interval: POLL,
        idle_timeout: IDLE,
        theme_cache_path: None,
        ..ClientConfig::default()
    }
}

pub fn harness(backend: &Arc<FakeBackend>) -> (DiscoveryController, Arc<RecordingNavigator>) {
    let navigator = Arc::new(RecordingNavigator::default());
    let controller = DiscoveryController::new(
        test_config(),
        backend.clone(),
        navigator.clone(),
        Arc::new(AutoConfirm),
    );
    (controller, navigator)
}

pub fn job(id: &str, created_at: &str, status: &str) -> Value {
    json!({
        "id": id,
        "filename": format!("{id}.mp3"),
        "originalname": format!("{id}.mp3"),
        "status": status,
        "createdAt": created_at
    })
}

pub fn plan_detail(id: &str) -> Value {
    json!({
        "id": id,
        "clientName": "Dana",
        "companyName": "Acme Freight",
        "meetingGoal": "sell_service",
        "briefing": { "clientOverview": "Ops lead", "companyOverview": "Logistics", "meetingFocus": "Routing" },
        "checklist": [
            { "id": "q1", "category": "Pain", "question": "What breaks today?", "importance": "must-ask", "source": "core", "checked": true },
            { "id": "q2", "category": "Budget", "question": "Who signs off?", "importance": "nice-to-have", "source": "goal-specific" }
        ]
    })
}
