//! Local control API for parent apps and scripts
//!
//! Listens on localhost and maps JSON requests onto [`Economy`] operations:
//! - `GET /ping`
//! - `/children` (create, get, delete with `?guardian_id=`) and per-child ledger operations
//! - `/children/{id}/riddle` (+ `/solve`, `/hint`)
//! - `POST /gate/{subject}/verify`
//!
//! Requests carry `X-Kidbank-Token` when an auth token is configured.

mod handlers;
mod types;

pub use handlers::{ApiError, HandlerResult, route};

use std::io::Read;
use std::thread;

use anyhow::{Result, anyhow};
use tiny_http::{Response, Server};
use tracing::{debug, error, info, warn};

use crate::economy::Economy;

const AUTH_HEADER: &str = "X-Kidbank-Token";
const MAX_BODY_BYTES: usize = 64 * 1024;

/// Shared state handed to every request
#[derive(Clone)]
pub struct ApiState {
    pub economy: Economy,
    /// Runtime used to drive async riddle generation from the server thread
    pub runtime: tokio::runtime::Handle,
}

impl ApiState {
    pub fn new(economy: Economy, runtime: tokio::runtime::Handle) -> Self {
        Self { economy, runtime }
    }
}

/// Bind the server and serve requests on a background thread.
///
/// Binding happens before this returns so a busy port is reported to the caller.
pub fn start_server(
    state: ApiState,
    port: u16,
    auth_token: Option<String>,
) -> Result<thread::JoinHandle<()>> {
    let bind_addr = format!("127.0.0.1:{}", port);
    let server = Server::http(&bind_addr)
        .map_err(|e| anyhow!("Failed to start server on {}: {}", bind_addr, e))?;

    let auth_token = auth_token.filter(|t| !t.trim().is_empty());
    info!(
        "[kidbank:http] Server listening on http://{} (auth: {})",
        bind_addr,
        if auth_token.is_some() { "enabled" } else { "disabled" }
    );

    Ok(thread::spawn(move || serve(server, state, auth_token)))
}

fn serve(server: Server, state: ApiState, auth_token: Option<String>) {
    for mut request in server.incoming_requests() {
        let method = request.method().to_string();
        let url = request.url().to_string();

        if !is_authorized(&request, auth_token.as_deref()) {
            warn!("[kidbank:http] Unauthorized {} {}", method, url);
            respond_json(request, 401, serde_json::json!({ "error": "unauthorized" }));
            continue;
        }

        let body = match read_request_body(&mut request) {
            Ok(body) => body,
            Err((status, value)) => {
                respond_json(request, status, value);
                continue;
            }
        };

        match route(&state, &method, &url, &body) {
            Ok((status, value)) => {
                debug!("[kidbank:http] {} {} -> {}", method, url, status);
                respond_json(request, status, value);
            }
            Err(e) => {
                let status = e.status();
                if status >= 500 {
                    error!("[kidbank:http] {} {} failed: {}", method, url, e);
                } else {
                    debug!("[kidbank:http] {} {} -> {} ({})", method, url, status, e);
                }
                respond_json(request, status, e.body());
            }
        }
    }
}

fn is_authorized(request: &tiny_http::Request, expected: Option<&str>) -> bool {
    let Some(expected) = expected else {
        return true;
    };

    request
        .headers()
        .iter()
        .find(|h| h.field.equiv(AUTH_HEADER))
        .map(|h| h.value.as_str() == expected)
        .unwrap_or(false)
}

fn json_content_type() -> Option<tiny_http::Header> {
    tiny_http::Header::from_bytes(&b"Content-Type"[..], &b"application/json"[..]).ok()
}

fn read_request_body(
    request: &mut tiny_http::Request,
) -> std::result::Result<String, (u16, serde_json::Value)> {
    let mut body = String::new();
    let mut reader = request.as_reader().take((MAX_BODY_BYTES + 1) as u64);
    if let Err(e) = reader.read_to_string(&mut body) {
        error!("[kidbank:http] Failed to read body: {}", e);
        return Err((400, serde_json::json!({ "error": "bad_request" })));
    }

    if body.len() > MAX_BODY_BYTES {
        return Err((413, serde_json::json!({ "error": "payload_too_large" })));
    }

    Ok(body)
}

fn respond_json(request: tiny_http::Request, status_code: u16, value: serde_json::Value) {
    let body =
        serde_json::to_string(&value).unwrap_or_else(|_| "{\"error\":\"serialize\"}".to_string());
    let mut response = Response::from_string(body).with_status_code(status_code);
    if let Some(header) = json_content_type() {
        response = response.with_header(header);
    }
    let _ = request.respond(response);
}
