//! HTTP transport: JSON-RPC over `POST /mcp`.
//!
//! Also answers `GET /health` for load balancers and CORS preflights for
//! browser-hosted clients.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use http_body_util::{BodyExt, Full, Limited};
use hyper::body::{Bytes, Incoming};
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE,
};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use super::McpServer;

/// Path the JSON-RPC endpoint is mounted on.
pub const MCP_PATH: &str = "/mcp";

/// Largest request body accepted.
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// Bind the listener for [`serve`].
pub async fn bind(host: &str, port: u16) -> std::io::Result<TcpListener> {
    let listener = TcpListener::bind((host, port)).await?;
    if let Ok(addr) = listener.local_addr() {
        info!(%addr, path = MCP_PATH, "Listening");
    }
    Ok(listener)
}

/// Accept connections until the listener fails.
pub async fn serve(listener: TcpListener, server: Arc<McpServer>) -> std::io::Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let io = TokioIo::new(stream);
        let server = server.clone();

        tokio::spawn(async move {
            let service = service_fn(move |req: Request<Incoming>| {
                let server = server.clone();
                async move { handle_request(req, &server, peer).await }
            });

            if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
                debug!(%peer, error = %e, "Connection closed with error");
            }
        });
    }
}

async fn handle_request(
    req: Request<Incoming>,
    server: &McpServer,
    peer: SocketAddr,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let response = match (&method, path.as_str()) {
        (&Method::OPTIONS, _) => response(StatusCode::NO_CONTENT, None, Bytes::new()),
        (&Method::GET, "/health" | "/healthz") => {
            response(StatusCode::OK, Some("text/plain"), Bytes::from("OK"))
        }
        (&Method::POST, MCP_PATH) => {
            let body = match Limited::new(req.into_body(), MAX_BODY_BYTES).collect().await {
                Ok(collected) => collected.to_bytes(),
                Err(e) => {
                    warn!(%peer, error = %e, "Failed to read request body");
                    return Ok(response(
                        StatusCode::BAD_REQUEST,
                        Some("text/plain"),
                        Bytes::from("Bad Request"),
                    ));
                }
            };
            let raw = String::from_utf8_lossy(&body);
            match server.handle_message(&raw).await {
                Some(reply) => response(StatusCode::OK, Some("application/json"), Bytes::from(reply)),
                None => response(StatusCode::ACCEPTED, None, Bytes::new()),
            }
        }
        (_, MCP_PATH) => response(
            StatusCode::METHOD_NOT_ALLOWED,
            Some("text/plain"),
            Bytes::from("Method Not Allowed"),
        ),
        _ => response(
            StatusCode::NOT_FOUND,
            Some("text/plain"),
            Bytes::from("Not Found"),
        ),
    };
    Ok(response)
}

fn response(status: StatusCode, content_type: Option<&'static str>, body: Bytes) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(body));
    *response.status_mut() = status;

    let headers = response.headers_mut();
    if let Some(content_type) = content_type {
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    }
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, OPTIONS"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("content-type, mcp-protocol-version, mcp-session-id"),
    );
    response
}
