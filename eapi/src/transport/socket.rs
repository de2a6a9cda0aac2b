//! Unix domain socket transport.
//!
//! On-box clients reach the eAPI server through `/var/run/command-api.sock`.
//! The server speaks plain HTTP/1.1 on the stream and ignores the authority,
//! so requests go to `/command-api` with a dummy `Host: localhost`.

use async_trait::async_trait;
use bytes::Bytes;
use hyper::header::{CONTENT_LENGTH, CONTENT_TYPE, HOST};
use hyper::{Body, Method, Request, StatusCode};
use log::{debug, trace};
use tokio::net::UnixStream;

use super::config::{COMMAND_API_PATH, TransportConfig, TransportKind};
use super::{Transport, latch};
use crate::envelope::{self, Command, Encoding, Response};
use crate::error::{Result, TransportError};

/// Host header sent over the socket.
const SOCKET_ORIGIN: &str = "localhost";

/// eAPI over the local Unix socket. No authentication; the socket's
/// filesystem permissions are the gate.
pub struct SocketTransport {
    config: TransportConfig,
    last_error: Option<String>,
}

impl SocketTransport {
    /// Create a socket transport. Only `socket_path` and `timeout` are used.
    pub fn new(config: TransportConfig) -> Self {
        Self {
            config,
            last_error: None,
        }
    }

    /// Full URL of the endpoint as seen by the server.
    pub fn url(&self) -> Result<String> {
        self.config.url(TransportKind::Socket)
    }

    /// The configuration this transport was built from.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    async fn post(&self, body: Bytes) -> Result<Response> {
        let path = &self.config.socket_path;
        let stream =
            UnixStream::connect(path)
                .await
                .map_err(|source| TransportError::ConnectionFailed {
                    target: path.display().to_string(),
                    source,
                })?;

        let (mut sender, connection) = hyper::client::conn::handshake(stream)
            .await
            .map_err(TransportError::Hyper)?;

        tokio::spawn(async move {
            if let Err(e) = connection.await {
                debug!("command-api socket connection ended: {}", e);
            }
        });

        let request = Request::builder()
            .method(Method::POST)
            .uri(COMMAND_API_PATH)
            .header(HOST, SOCKET_ORIGIN)
            .header(CONTENT_TYPE, "application/json")
            .header(CONTENT_LENGTH, body.len())
            .body(Body::from(body))
            .map_err(TransportError::InvalidRequest)?;

        let response = sender
            .send_request(request)
            .await
            .map_err(TransportError::Hyper)?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(TransportError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            }
            .into());
        }

        let body = hyper::body::to_bytes(response.into_body())
            .await
            .map_err(TransportError::Hyper)?;
        trace!("received {} bytes from {}", body.len(), path.display());

        envelope::decode(&body)?.into_result()
    }
}

#[async_trait]
impl Transport for SocketTransport {
    async fn execute(&mut self, commands: &[Command], encoding: Encoding) -> Result<Response> {
        debug!(
            "runCmds unix:{} ({} commands, format {})",
            self.config.socket_path.display(),
            commands.len(),
            encoding
        );

        let timeout = self.config.timeout;
        let result = match envelope::encode(commands, encoding, &envelope::request_id()) {
            Ok(body) => match tokio::time::timeout(timeout, self.post(body)).await {
                Ok(result) => result,
                Err(_) => Err(TransportError::Timeout(timeout).into()),
            },
            Err(e) => Err(e),
        };
        latch(&mut self.last_error, result)
    }

    fn endpoint(&self) -> String {
        format!("unix:{}", self.config.socket_path.display())
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn clear_error(&mut self) {
        self.last_error = None;
    }
}
