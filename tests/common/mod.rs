//! Stub audit server for integration tests, bound to an ephemeral port.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;
use serde_json::json;

pub const TOKEN: &str = "s3cr3t";

#[derive(Default)]
pub struct StubState {
    pub nodes: Vec<String>,
    /// Number of "false" answers a node gives before it is ready.
    pub not_ready_for: HashMap<String, u32>,
    pub probes: HashMap<String, u32>,
    pub probe_content_types: Vec<String>,
    pub fetches: Vec<(String, Option<String>)>,
    pub directory_down: bool,
    /// Serve the node list as raw bytes that are not UTF-8.
    pub directory_binary: bool,
}

#[derive(Clone, Default)]
pub struct Stub(pub Arc<Mutex<StubState>>);

impl Stub {
    pub fn new(nodes: &[&str]) -> Self {
        let stub = Self::default();
        stub.0.lock().unwrap().nodes = nodes.iter().map(|n| n.to_string()).collect();
        stub
    }

    pub fn not_ready_for(self, node: &str, answers: u32) -> Self {
        self.0
            .lock()
            .unwrap()
            .not_ready_for
            .insert(node.to_string(), answers);
        self
    }

    pub fn probes(&self, node: &str) -> u32 {
        self.0.lock().unwrap().probes.get(node).copied().unwrap_or(0)
    }

    pub fn fetch_count(&self, node: &str) -> usize {
        self.0
            .lock()
            .unwrap()
            .fetches
            .iter()
            .filter(|(n, _)| n == node)
            .count()
    }

    /// Serve on 127.0.0.1 and return the base URL.
    pub async fn spawn(self) -> String {
        let app = Router::new()
            .route("/getNodeList", get(node_list))
            .route("/getNodes", get(node_list))
            .route("/checkNode", post(check_node))
            .route("/result", get(result))
            .with_state(self);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }
}

async fn node_list(State(stub): State<Stub>) -> Response {
    let state = stub.0.lock().unwrap();
    if state.directory_down {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    if state.directory_binary {
        return vec![0x6e_u8, 0x31, 0x20, 0xff, 0xfe].into_response();
    }
    let mut body = String::new();
    for node in &state.nodes {
        body.push_str(node);
        body.push(' ');
    }
    body.into_response()
}

async fn check_node(State(stub): State<Stub>, headers: HeaderMap, body: String) -> &'static str {
    let mut state = stub.0.lock().unwrap();
    if let Some(ct) = headers.get(header::CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        state.probe_content_types.push(ct.to_string());
    }
    *state.probes.entry(body.clone()).or_default() += 1;

    if !state.nodes.contains(&body) {
        return "false";
    }
    match state.not_ready_for.get_mut(&body) {
        Some(remaining) if *remaining > 0 => {
            *remaining -= 1;
            "false"
        }
        _ => "true",
    }
}

async fn result(
    State(stub): State<Stub>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    let node = params.get("nodeID").cloned().unwrap_or_default();
    let auth = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    stub.0.lock().unwrap().fetches.push((node.clone(), auth.clone()));

    let expected = format!("Bearer {TOKEN}");
    if auth.as_deref() != Some(expected.as_str()) {
        return (StatusCode::UNAUTHORIZED, "invalid token").into_response();
    }

    match node.as_str() {
        "garbled" => "{not json".into_response(),
        "accepted" => (StatusCode::ACCEPTED, "[]").into_response(),
        "failing-node" => axum::Json(json!([
            {"Name": "Content trust", "Status": "WARN", "Output": "DOCKER_CONTENT_TRUST unset"},
            {"Name": "Live restore", "Status": "WARN", "Output": ""},
            {"Name": "Userland proxy", "Status": "PASS", "Output": ""},
        ]))
        .into_response(),
        _ => axum::Json(json!([
            {"Name": "Audit docker daemon", "Status": "PASS", "Output": ""},
            {"Name": "Audit /var/lib/docker", "Status": "PASS", "Output": ""},
            {"Name": "Restrict container traffic", "Status": "WARN", "Output": "icc=true"},
            {"Name": "Separate partition", "Status": "SKIP", "Output": "not supported"},
            {"Name": "Docker version", "Status": "INFO", "Output": "17.03.1-ce"},
        ]))
        .into_response(),
    }
}
