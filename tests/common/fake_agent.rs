//! In-process stand-in for the hosted agent builder
//!
//! Records every converse request verbatim and answers with a canned reply
//! that echoes the input. Agent definitions published to it are kept in
//! memory.

use super::constants::*;
use super::wait_for_ready;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Default)]
struct AgentHostState {
    requests: Vec<Value>,
    agents: BTreeMap<String, Value>,
    /// Answer converse calls with this status instead of a reply.
    fail_with: Option<u16>,
    conversations: usize,
}

type Shared = Arc<Mutex<AgentHostState>>;

pub struct FakeAgentHost {
    pub base_url: String,
    state: Shared,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FakeAgentHost {
    pub async fn spawn() -> Self {
        let state: Shared = Arc::new(Mutex::new(AgentHostState::default()));

        let app = Router::new()
            .route("/api/agent_builder/converse", post(converse))
            .route("/api/agent_builder/agents", post(create_agent))
            .route(
                "/api/agent_builder/agents/{id}",
                get(get_agent).put(update_agent),
            )
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let port = listener
            .local_addr()
            .expect("Failed to get local address")
            .port();
        let base_url = format!("http://127.0.0.1:{}", port);

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .expect("Fake agent host failed");
        });

        wait_for_ready(&base_url).await;

        Self {
            base_url,
            state,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn fail_with(&self, status: u16) {
        self.state.lock().unwrap().fail_with = Some(status);
    }

    pub fn recover(&self) {
        self.state.lock().unwrap().fail_with = None;
    }

    /// Converse request bodies, in arrival order.
    pub fn requests(&self) -> Vec<Value> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn agent(&self, id: &str) -> Option<Value> {
        self.state.lock().unwrap().agents.get(id).cloned()
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    let key_ok = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("ApiKey {}", TEST_API_KEY))
        .unwrap_or(false);
    key_ok && headers.contains_key("kbn-xsrf")
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"statusCode": 401, "error": "Unauthorized", "message": "Unauthorized"})),
    )
        .into_response()
}

async fn converse(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    state.requests.push(body.clone());

    if let Some(status) = state.fail_with {
        let status = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        return (
            status,
            Json(json!({"statusCode": status.as_u16(), "error": "Upstream", "message": "model unavailable"})),
        )
            .into_response();
    }

    let conversation_id = match body["conversation_id"].as_str() {
        Some(id) => id.to_string(),
        None => {
            state.conversations += 1;
            format!("conv-{}", state.conversations)
        }
    };
    let input = body["input"].as_str().unwrap_or_default();

    Json(json!({
        "conversation_id": conversation_id,
        "steps": [
            {"type": "reasoning", "reasoning": "Looking for similar incidents."},
            {"type": "tool_call", "tool_id": "platform.core.search", "params": {"query": input}, "results": []}
        ],
        "response": {"message": format!("echo: {}", input)}
    }))
    .into_response()
}

async fn get_agent(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    match state.lock().unwrap().agents.get(&id) {
        Some(agent) => Json(agent.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn create_agent(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let Some(id) = body["id"].as_str().map(str::to_string) else {
        return StatusCode::BAD_REQUEST.into_response();
    };
    state.lock().unwrap().agents.insert(id, body.clone());
    Json(body).into_response()
}

async fn update_agent(
    State(state): State<Shared>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if body.get("id").is_some() {
        return StatusCode::BAD_REQUEST.into_response();
    }
    let mut state = state.lock().unwrap();
    let Some(agent) = state.agents.get_mut(&id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let mut updated = body;
    updated["id"] = json!(id);
    *agent = updated.clone();
    Json(updated).into_response()
}
