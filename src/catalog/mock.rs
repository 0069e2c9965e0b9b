//! In-process stand-in for the catalog's REST ingestion endpoint, used by
//! tests to capture what the emitter sends.

use axum::{
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;

#[derive(Debug, Clone)]
pub struct CapturedRequest {
    pub action: Option<String>,
    pub protocol_version: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct MockState {
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
    status: StatusCode,
}

pub struct MockCatalog {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<CapturedRequest>>>,
}

impl MockCatalog {
    /// Catalog that accepts every event
    pub async fn start() -> Self {
        Self::start_with(StatusCode::OK).await
    }

    /// Catalog that rejects every event with a 500
    pub async fn start_failing() -> Self {
        Self::start_with(StatusCode::INTERNAL_SERVER_ERROR).await
    }

    async fn start_with(status: StatusCode) -> Self {
        let requests = Arc::new(Mutex::new(Vec::new()));
        let state = MockState {
            requests: requests.clone(),
            status,
        };

        let app = Router::new()
            .route("/entities", post(ingest))
            .with_state(state);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, requests }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

async fn ingest(
    State(state): State<MockState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, String) {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    state.requests.lock().unwrap().push(CapturedRequest {
        action: query.get("action").cloned(),
        protocol_version: header("x-restli-protocol-version"),
        authorization: header("authorization"),
        body,
    });

    let message = if state.status.is_success() {
        String::new()
    } else {
        "ingestion failed".to_string()
    };
    (state.status, message)
}
