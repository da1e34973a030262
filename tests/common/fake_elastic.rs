//! In-process stand-in for the search cluster
//!
//! Serves the handful of endpoints the ingestion client uses, keeps
//! documents in memory and can be told to refuse specific fields or to
//! revoke bulk permissions.

use super::constants::*;
use super::wait_for_ready;
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, head, post},
    Json, Router,
};
use serde_json::{json, Map, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Default)]
struct FakeState {
    index_exists: bool,
    properties: Map<String, Value>,
    documents: BTreeMap<String, Value>,
    rejected_fields: BTreeSet<String>,
    value_limits: BTreeMap<String, f64>,
    deny_bulk: bool,
    bulk_requests: usize,
    esql_answers: Vec<(String, Value)>,
    esql_failures: BTreeSet<String>,
    esql_queries: Vec<String>,
}

type Shared = Arc<Mutex<FakeState>>;

/// Fake cluster listening on a random local port.
///
/// When dropped, the server shuts down.
pub struct FakeElastic {
    pub base_url: String,
    state: Shared,
    _shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl FakeElastic {
    pub async fn spawn() -> Self {
        Self::spawn_with(FakeState::default()).await
    }

    /// Spawn with `index` already present and mapped with `properties`.
    pub async fn spawn_with_mapping(properties: Value) -> Self {
        let properties = properties
            .as_object()
            .cloned()
            .expect("properties must be an object");
        Self::spawn_with(FakeState {
            index_exists: true,
            properties,
            ..Default::default()
        })
        .await
    }

    async fn spawn_with(state: FakeState) -> Self {
        let state: Shared = Arc::new(Mutex::new(state));

        let app = Router::new()
            .route("/", get(cluster_info))
            .route("/_bulk", post(bulk))
            .route("/{index}", head(index_exists).put(create_index))
            .route("/{index}/_mapping", get(get_mapping))
            .route("/{index}/_doc/{id}", get(get_document))
            .route("/{index}/_search", post(search))
            .route("/_query", post(esql))
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
                .expect("Fake cluster failed");
        });

        wait_for_ready(&base_url).await;

        Self {
            base_url,
            state,
            _shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Refuse documents carrying `field`, the way a cluster does when the
    /// stored mapping cannot parse the value.
    pub fn reject_field(&self, field: &str) {
        self.state
            .lock()
            .unwrap()
            .rejected_fields
            .insert(field.to_string());
    }

    /// Refuse documents whose `field` exceeds `limit`, the way a cluster
    /// refuses a number its field type cannot hold.
    pub fn refuse_above(&self, field: &str, limit: f64) {
        self.state
            .lock()
            .unwrap()
            .value_limits
            .insert(field.to_string(), limit);
    }

    /// Answer ES|QL queries containing `marker` with `table`. Unmatched
    /// queries get an empty table.
    pub fn answer_esql(&self, marker: &str, table: Value) {
        self.state
            .lock()
            .unwrap()
            .esql_answers
            .push((marker.to_string(), table));
    }

    /// Fail ES|QL queries containing `marker` with a 400 verification error.
    pub fn fail_esql(&self, marker: &str) {
        self.state
            .lock()
            .unwrap()
            .esql_failures
            .insert(marker.to_string());
    }

    pub fn esql_queries(&self) -> Vec<String> {
        self.state.lock().unwrap().esql_queries.clone()
    }

    /// Answer bulk requests with 403, as if the key lost write privileges.
    pub fn deny_bulk(&self) {
        self.state.lock().unwrap().deny_bulk = true;
    }

    pub fn document_count(&self) -> usize {
        self.state.lock().unwrap().documents.len()
    }

    pub fn document(&self, id: &str) -> Option<Value> {
        self.state.lock().unwrap().documents.get(id).cloned()
    }

    pub fn bulk_requests(&self) -> usize {
        self.state.lock().unwrap().bulk_requests
    }

    /// Mapping properties the index was created with.
    pub fn properties(&self) -> Map<String, Value> {
        self.state.lock().unwrap().properties.clone()
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({
            "error": {"type": "security_exception", "reason": "unable to authenticate with provided credentials"},
            "status": 401
        })),
    )
        .into_response()
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == format!("ApiKey {}", TEST_API_KEY))
        .unwrap_or(false)
}

async fn cluster_info(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    Json(json!({
        "name": "node-1",
        "cluster_name": TEST_CLUSTER_NAME,
        "version": {"number": "9.1.0"},
        "tagline": "You Know, for Search"
    }))
    .into_response()
}

async fn index_exists(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    if state.lock().unwrap().index_exists {
        StatusCode::OK.into_response()
    } else {
        StatusCode::NOT_FOUND.into_response()
    }
}

async fn create_index(
    State(state): State<Shared>,
    Path(index): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    if state.index_exists {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": {"type": "resource_already_exists_exception", "reason": format!("index [{}] already exists", index)},
                "status": 400
            })),
        )
            .into_response();
    }
    state.index_exists = true;
    state.properties = body["mappings"]["properties"]
        .as_object()
        .cloned()
        .unwrap_or_default();
    Json(json!({"acknowledged": true, "shards_acknowledged": true, "index": index})).into_response()
}

async fn get_mapping(
    State(state): State<Shared>,
    Path(index): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let state = state.lock().unwrap();
    if !state.index_exists {
        return StatusCode::NOT_FOUND.into_response();
    }
    let mut body = Map::new();
    body.insert(
        index,
        json!({"mappings": {"properties": state.properties.clone()}}),
    );
    Json(Value::Object(body)).into_response()
}

async fn bulk(State(state): State<Shared>, headers: HeaderMap, body: Bytes) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let mut state = state.lock().unwrap();
    state.bulk_requests += 1;
    if state.deny_bulk {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": {"type": "security_exception", "reason": "action [indices:data/write/bulk] is unauthorized"},
                "status": 403
            })),
        )
            .into_response();
    }

    let text = String::from_utf8_lossy(&body);
    let lines: Vec<Value> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("bulk line is JSON"))
        .collect();

    let mut items = Vec::new();
    for pair in lines.chunks(2) {
        let id = pair[0]["index"]["_id"]
            .as_str()
            .expect("index action carries _id")
            .to_string();
        let doc = pair[1].clone();

        let refused = state
            .rejected_fields
            .iter()
            .find(|f| doc.get(f.as_str()).is_some())
            .cloned();
        let too_large = state
            .value_limits
            .iter()
            .find(|(f, limit)| doc[f.as_str()].as_f64().is_some_and(|v| v > **limit))
            .map(|(f, _)| f.clone());
        let item = match (refused, too_large) {
            (_, Some(field)) => json!({"index": {
                "_id": id,
                "status": 400,
                "error": {
                    "type": "document_parsing_exception",
                    "reason": format!("[1:80] failed to parse field [{}] of type [integer] in document with id '{}'", field, id),
                    "caused_by": {"type": "illegal_argument_exception", "reason": format!("Value [{}] is out of range for an integer", doc[field.as_str()])}
                }
            }}),
            (Some(field), None) => json!({"index": {
                "_id": id,
                "status": 400,
                "error": {
                    "type": "document_parsing_exception",
                    "reason": format!("[1:42] failed to parse field [{}] of type [float] in document with id '{}'", field, id),
                    "caused_by": {"type": "number_format_exception", "reason": "For input string: \"n/a\""}
                }
            }}),
            (None, None) => {
                let existed = state.documents.insert(id.clone(), doc).is_some();
                if existed {
                    json!({"index": {"_id": id, "status": 200, "result": "updated"}})
                } else {
                    json!({"index": {"_id": id, "status": 201, "result": "created"}})
                }
            }
        };
        items.push(item);
    }

    let errors = items.iter().any(|i| i["index"].get("error").is_some());
    Json(json!({"took": 3, "errors": errors, "items": items})).into_response()
}

async fn get_document(
    State(state): State<Shared>,
    Path((index, id)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let state = state.lock().unwrap();
    match state.documents.get(&id) {
        Some(doc) => Json(json!({
            "_index": index,
            "_id": id,
            "found": true,
            "_source": doc
        }))
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({"_index": index, "_id": id, "found": false})),
        )
            .into_response(),
    }
}

fn terms(docs: &BTreeMap<String, Value>, field: &str) -> Vec<Value> {
    let mut counts: HashMap<String, u64> = HashMap::new();
    for doc in docs.values() {
        if let Some(key) = doc[field].as_str() {
            *counts.entry(key.to_string()).or_default() += 1;
        }
    }
    let mut buckets: Vec<(String, u64)> = counts.into_iter().collect();
    buckets.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    buckets
        .into_iter()
        .map(|(key, count)| json!({"key": key, "doc_count": count}))
        .collect()
}

async fn search(State(state): State<Shared>, headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let state = state.lock().unwrap();
    let docs = &state.documents;
    let downtimes: Vec<f64> = docs
        .values()
        .filter_map(|d| d["downtime_hours"].as_f64())
        .collect();
    let total_cost: f64 = docs.values().filter_map(|d| d["cost_usd"].as_f64()).sum();
    let total_downtime: f64 = downtimes.iter().sum();
    let avg_downtime = if downtimes.is_empty() {
        Value::Null
    } else {
        json!(total_downtime / downtimes.len() as f64)
    };

    Json(json!({
        "hits": {"total": {"value": docs.len(), "relation": "eq"}, "hits": []},
        "aggregations": {
            "by_severity": {"buckets": terms(docs, "severity")},
            "by_type": {"buckets": terms(docs, "incident_type")},
            "total_cost_usd": {"value": total_cost},
            "total_downtime_hours": {"value": total_downtime},
            "avg_downtime_hours": {"value": avg_downtime}
        }
    }))
    .into_response()
}

async fn esql(State(state): State<Shared>, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    if !authorized(&headers) {
        return unauthorized();
    }
    let query = body["query"].as_str().unwrap_or_default().to_string();
    let mut state = state.lock().unwrap();
    state.esql_queries.push(query.clone());

    if state.esql_failures.iter().any(|m| query.contains(m.as_str())) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({
                "error": {"type": "verification_exception", "reason": "Found 1 problem: Unknown column"},
                "status": 400
            })),
        )
            .into_response();
    }
    let table = state
        .esql_answers
        .iter()
        .find(|(marker, _)| query.contains(marker.as_str()))
        .map(|(_, table)| table.clone())
        .unwrap_or_else(|| json!({"columns": [], "values": []}));
    Json(table).into_response()
}
