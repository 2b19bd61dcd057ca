//! Blocking HTTP surface: a fixed pool of workers pulling requests off one
//! `tiny_http` listener and sharing a read-only `AppState`.

use std::io::Read;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use anyhow::{anyhow, Result};
use factstrip_contracts::api::{
    ErrorResponse, ExplanationRequest, ExplanationResponse, GenerateRequest, HealthResponse,
};
use factstrip_contracts::Style;
use factstrip_engine::{CheckError, FactChecker};
use serde::Serialize;
use serde_json::json;
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use uuid::Uuid;

const MAX_BODY_BYTES: u64 = 64 * 1024;

const CORS_HEADERS: [(&str, &str); 3] = [
    ("Access-Control-Allow-Origin", "*"),
    ("Access-Control-Allow-Methods", "GET, POST, OPTIONS"),
    ("Access-Control-Allow-Headers", "Content-Type"),
];

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

pub struct AppState {
    checker: FactChecker,
    replicate_configured: bool,
}

impl AppState {
    pub fn new(checker: FactChecker, replicate_configured: bool) -> Self {
        Self {
            checker,
            replicate_configured,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Reply {
    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => Self { status, body },
            Err(err) => {
                tracing::error!(error = %err, "response serialization failed");
                Self {
                    status: 500,
                    body: br#"{"error":"Internal server error","success":false}"#.to_vec(),
                }
            }
        }
    }

    fn error(status: u16, message: &str) -> Self {
        Self::json(status, &ErrorResponse::new(message))
    }

    fn no_content() -> Self {
        Self {
            status: 204,
            body: Vec::new(),
        }
    }

    fn into_response(self, request_id: &Uuid) -> Response<std::io::Cursor<Vec<u8>>> {
        let has_body = !self.body.is_empty();
        let mut response = Response::from_data(self.body).with_status_code(StatusCode(self.status));
        let request_id = request_id.to_string();
        let mut headers: Vec<(&str, &str)> = CORS_HEADERS.to_vec();
        headers.push(("X-Request-Id", request_id.as_str()));
        if has_body {
            headers.push(("Content-Type", "application/json"));
        }
        for (name, value) in headers {
            if let Ok(header) = Header::from_bytes(name.as_bytes(), value.as_bytes()) {
                response.add_header(header);
            }
        }
        response
    }
}

/// Maps one request to its reply. Pure apart from the calls into the checker.
pub fn route(state: &AppState, method: &Method, url: &str, body: &[u8]) -> Reply {
    let path = url.split('?').next().unwrap_or(url);
    match (method, path) {
        (Method::Options, _) => Reply::no_content(),
        (Method::Get, "/") => Reply::json(
            200,
            &json!({
                "message": "Fact-Strip Backend API",
                "status": "running",
                "endpoints": {
                    "POST /api/generate": "Check facts and generate comics",
                    "POST /api/generate-explanation": "Generate scientific explanations for facts",
                    "GET /health": "Health check",
                },
            }),
        ),
        (Method::Get, "/health") => Reply::json(
            200,
            &HealthResponse {
                status: "healthy",
                openai_configured: state.checker.text_configured(),
                replicate_configured: state.replicate_configured,
                ts: chrono::Utc::now().to_rfc3339(),
            },
        ),
        (Method::Post, "/api/generate") => guarded(|| generate(state, body)),
        (Method::Post, "/api/generate-explanation") => guarded(|| explain(state, body)),
        (_, "/" | "/health" | "/api/generate" | "/api/generate-explanation") => {
            Reply::error(405, "Method not allowed")
        }
        _ => Reply::error(404, "Not found"),
    }
}

fn guarded(handler: impl FnOnce() -> Reply) -> Reply {
    panic::catch_unwind(AssertUnwindSafe(handler)).unwrap_or_else(|_| {
        tracing::error!("request handler panicked");
        Reply::error(500, "Internal server error")
    })
}

fn generate(state: &AppState, body: &[u8]) -> Reply {
    let request: GenerateRequest = match serde_json::from_slice(body) {
        Ok(request) => request,
        Err(err) => {
            tracing::debug!(error = %err, "generate body is not valid JSON");
            return Reply::error(400, "Statement is required");
        }
    };
    let style = Style::parse(request.style.as_deref());
    match state.checker.check(&request.statement, style) {
        Ok(report) => Reply::json(200, &report.into_response()),
        Err(CheckError::EmptyStatement) => Reply::error(400, "Statement is required"),
    }
}

fn explain(state: &AppState, body: &[u8]) -> Reply {
    let request: ExplanationRequest = serde_json::from_slice(body).unwrap_or_default();
    let fact = request.fact.trim();
    if fact.is_empty() {
        return Reply::error(400, "No fact provided");
    }
    match state.checker.explain(fact) {
        Some(explanation) => Reply::json(
            200,
            &ExplanationResponse {
                success: true,
                fact: fact.to_string(),
                explanation,
            },
        ),
        None => Reply::error(500, "Failed to generate explanation"),
    }
}

fn read_body(request: &mut Request) -> Result<Vec<u8>, Reply> {
    let mut body = Vec::new();
    request
        .as_reader()
        .take(MAX_BODY_BYTES + 1)
        .read_to_end(&mut body)
        .map_err(|err| {
            tracing::warn!(error = %err, "failed reading request body");
            Reply::error(400, "Unreadable request body")
        })?;
    if body.len() as u64 > MAX_BODY_BYTES {
        return Err(Reply::error(413, "Request body too large"));
    }
    Ok(body)
}

fn handle(state: &AppState, mut request: Request) {
    let request_id = Uuid::new_v4();
    let span = tracing::info_span!(
        "http",
        request_id = %request_id,
        method = %request.method(),
        path = %request.url()
    );
    let _guard = span.enter();
    let started = Instant::now();

    let reply = match read_body(&mut request) {
        Ok(body) => route(state, request.method(), request.url(), &body),
        Err(reply) => reply,
    };
    tracing::info!(
        status = reply.status,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "request handled"
    );
    if let Err(err) = request.respond(reply.into_response(&request_id)) {
        tracing::warn!(error = %err, "failed writing response");
    }
}

pub fn serve(state: AppState, config: &ServerConfig) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let server = Server::http(addr.as_str())
        .map_err(|err| anyhow!("failed to bind {addr}: {err}"))?;
    let server = Arc::new(server);
    let state = Arc::new(state);
    let workers = config.workers.max(1);
    tracing::info!(%addr, workers, "listening");

    let handles: Vec<_> = (0..workers)
        .map(|worker| {
            let server = Arc::clone(&server);
            let state = Arc::clone(&state);
            thread::spawn(move || loop {
                match server.recv() {
                    Ok(request) => handle(&state, request),
                    Err(err) => {
                        tracing::warn!(worker, error = %err, "listener closed");
                        break;
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        if handle.join().is_err() {
            tracing::error!("server worker panicked");
        }
    }
    Ok(())
}
