// ──────────────────────────────────────────────────────────────────────────────
// sorng-ocs · testing
// ──────────────────────────────────────────────────────────────────────────────
// Scripted `HttpExecutor` for unit tests. Records every request so tests can
// assert on method / URL / headers / body, or that no call was made at all.
// ──────────────────────────────────────────────────────────────────────────────

use crate::client::OcsClient;
use crate::error::OcsError;
use crate::transport::{HttpExecutor, HttpRequest, RawResponse};
use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::io::Write;
use std::sync::{Arc, Mutex};
use tempfile::NamedTempFile;

pub(crate) const BASE: &str = "https://cloud.test";

/// Self-signed P-256 CA, valid until 2125.
const TEST_CA_PEM: &str = include_str!("../tests/fixtures/ca.pem");

struct Route {
    method: Method,
    path: String,
    status: u16,
    body: String,
}

pub(crate) struct MockExecutor {
    routes: Vec<Route>,
    fallback: Option<(u16, String)>,
    refuse: bool,
    queue: Mutex<VecDeque<RawResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            fallback: None,
            refuse: false,
            queue: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Reply to `method` + server-relative `path` (including query string).
    pub fn route(mut self, method: Method, path: &str, status: u16, body: impl Into<String>) -> Self {
        self.routes.push(Route {
            method,
            path: path.to_string(),
            status,
            body: body.into(),
        });
        self
    }

    /// Reply used when no route matches. Defaults to an empty 404.
    pub fn fallback(mut self, status: u16, body: impl Into<String>) -> Self {
        self.fallback = Some((status, body.into()));
        self
    }

    /// Every call fails like a refused TCP connection.
    pub fn refuse_connections(mut self) -> Self {
        self.refuse = true;
        self
    }

    /// One-shot replies consumed in order before routes are consulted.
    pub fn push_reply(&self, resp: RawResponse) {
        self.queue.lock().unwrap().push_back(resp);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was recorded")
    }
}

#[async_trait]
impl HttpExecutor for MockExecutor {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, OcsError> {
        self.requests.lock().unwrap().push(request.clone());

        if self.refuse {
            return Err(OcsError::Transport("connection refused".into()));
        }
        if let Some(resp) = self.queue.lock().unwrap().pop_front() {
            return Ok(resp);
        }

        let path = request.url.strip_prefix(BASE).unwrap_or(&request.url);
        if let Some(r) = self
            .routes
            .iter()
            .find(|r| r.method == request.method && r.path == path)
        {
            return Ok(RawResponse::new(r.status, r.body.clone()));
        }

        Ok(match &self.fallback {
            Some((status, body)) => RawResponse::new(*status, body.clone()),
            None => RawResponse::new(404, ""),
        })
    }
}

/// OCS v2 envelope with the given status code and payload.
pub(crate) fn envelope(statuscode: i64, data: Value) -> String {
    let status = if statuscode == 200 { "ok" } else { "failure" };
    json!({
        "ocs": {
            "meta": { "status": status, "statuscode": statuscode, "message": "" },
            "data": data
        }
    })
    .to_string()
}

/// Connected + logged-in client backed by `mock`.
pub(crate) fn client(mock: &Arc<MockExecutor>) -> OcsClient {
    let mut c = OcsClient::with_executor(mock.clone());
    c.connect(BASE);
    c.login("admin", "admin");
    c
}

pub(crate) fn body_json(req: &HttpRequest) -> Value {
    serde_json::from_slice(req.body.as_deref().expect("request had no body")).unwrap()
}

/// `TEST_CA_PEM` written to a temp file that lives as long as the handle.
pub(crate) fn trust_root_file() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(TEST_CA_PEM.as_bytes()).unwrap();
    file
}
