//! HTTP and HTTPS transports using reqwest.

use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, trace};
use reqwest::StatusCode;
use reqwest::header::CONTENT_TYPE;
use secrecy::ExposeSecret;
use url::Url;

use super::config::{TlsVerification, TransportConfig, TransportKind};
use super::{Transport, latch};
use crate::envelope::{self, Command, Encoding, Response};
use crate::error::{Result, TransportError};

/// eAPI over HTTP(S).
///
/// Covers the `http`, `https` and `http_local` transports. They differ
/// only in scheme, default port, target host and whether Basic
/// authentication is sent.
pub struct HttpTransport {
    kind: TransportKind,
    config: TransportConfig,
    client: reqwest::Client,
    endpoint: Url,
    last_error: Option<String>,
}

impl HttpTransport {
    /// Plain HTTP with Basic authentication (default port 80).
    pub fn http(config: TransportConfig) -> Result<Self> {
        Self::new(TransportKind::Http, config)
    }

    /// HTTPS with Basic authentication (default port 443).
    pub fn https(config: TransportConfig) -> Result<Self> {
        Self::new(TransportKind::Https, config)
    }

    /// Plain HTTP to `localhost` without authentication (default port 8080).
    pub fn http_local(config: TransportConfig) -> Result<Self> {
        Self::new(TransportKind::HttpLocal, config)
    }

    fn new(kind: TransportKind, config: TransportConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("eapi/", env!("CARGO_PKG_VERSION")));

        if kind == TransportKind::Https && config.tls_verification == TlsVerification::Disabled {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let client = builder.build().map_err(TransportError::Http)?;
        let endpoint = config.endpoint(kind)?;

        Ok(Self {
            kind,
            config,
            client,
            endpoint,
            last_error: None,
        })
    }

    /// Which of the HTTP flavours this is.
    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// The configuration this transport was built from.
    pub fn config(&self) -> &TransportConfig {
        &self.config
    }

    /// Full URL including percent-encoded user-info. Contains the password.
    pub fn url(&self) -> Result<String> {
        self.config.url(self.kind)
    }

    fn map_reqwest(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.config.timeout)
        } else {
            TransportError::Http(e)
        }
    }

    async fn post(&self, body: Bytes) -> Result<Response> {
        let mut request = self
            .client
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(body);

        if self.kind.requires_auth() {
            request = request.basic_auth(
                &self.config.username,
                Some(self.config.password.expose_secret()),
            );
        }

        let response = request.send().await.map_err(|e| self.map_reqwest(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(TransportError::Status {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or_default().to_string(),
            }
            .into());
        }

        let body = response.bytes().await.map_err(|e| self.map_reqwest(e))?;
        trace!("received {} bytes from {}", body.len(), self.endpoint);

        envelope::decode(&body)?.into_result()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&mut self, commands: &[Command], encoding: Encoding) -> Result<Response> {
        debug!(
            "runCmds {} ({} commands, format {})",
            self.endpoint,
            commands.len(),
            encoding
        );

        let result = match envelope::encode(commands, encoding, &envelope::request_id()) {
            Ok(body) => self.post(body).await,
            Err(e) => Err(e),
        };
        latch(&mut self.last_error, result)
    }

    fn endpoint(&self) -> String {
        self.endpoint.to_string()
    }

    fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    fn clear_error(&mut self) {
        self.last_error = None;
    }
}
