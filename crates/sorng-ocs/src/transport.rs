// ──────────────────────────────────────────────────────────────────────────────
// sorng-ocs · transport
// ──────────────────────────────────────────────────────────────────────────────
// The only network-facing seam of the crate:
//  • `HttpExecutor` trait (one request in, raw status + body out)
//  • `ReqwestExecutor`, the rustls-backed implementation
//  • Pinned trust-root loading (replaces the system store, never augments it)
// ──────────────────────────────────────────────────────────────────────────────

use crate::error::OcsError;
use crate::session::Credentials;
use async_trait::async_trait;
use log::debug;
use reqwest::header::HeaderMap;
use reqwest::{Certificate, Client, Method};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// A fully resolved request handed to an [`HttpExecutor`].
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(&'static str, String)>,
    /// Attached as HTTP Basic auth when present.
    pub credentials: Option<Credentials>,
    pub body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw reply: status, headers and the unparsed body.
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }
}

/// Executes one HTTP request. Implementations must not retry on their own;
/// resilience is layered on top via [`crate::retry::RetryExecutor`].
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, OcsError>;
}

#[async_trait]
impl<T: HttpExecutor + ?Sized> HttpExecutor for Arc<T> {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, OcsError> {
        (**self).send(request).await
    }
}

/// `reqwest`-backed executor.
#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    http: Client,
}

impl Default for ReqwestExecutor {
    fn default() -> Self {
        Self { http: Client::new() }
    }
}

impl ReqwestExecutor {
    /// Build an executor, optionally pinned to a PEM trust root and bounded
    /// by a per-request timeout.
    pub fn new(trust_root: Option<&Path>, timeout: Option<Duration>) -> Result<Self, OcsError> {
        let mut builder = Client::builder();

        if let Some(path) = trust_root {
            builder = builder.tls_built_in_root_certs(false);
            for cert in load_trust_root(path)? {
                builder = builder.add_root_certificate(cert);
            }
        }
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }

        let http = builder
            .build()
            .map_err(|e| OcsError::HttpClient(e.to_string()))?;
        Ok(Self { http })
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn send(&self, request: HttpRequest) -> Result<RawResponse, OcsError> {
        let mut req = self.http.request(request.method, &request.url);
        for (name, value) in &request.headers {
            req = req.header(*name, value.as_str());
        }
        if let Some(ref c) = request.credentials {
            req = req.basic_auth(&c.user, Some(&c.password));
        }
        if let Some(body) = request.body {
            req = req.body(body);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| OcsError::Transport(e.to_string()))?;
        let status = resp.status().as_u16();
        let headers = resp.headers().clone();
        let body = resp
            .bytes()
            .await
            .map_err(|e| OcsError::Transport(format!("read body: {}", e)))?;

        debug!("{} → {} ({} bytes)", request.url, status, body.len());
        Ok(RawResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

/// Read a PEM bundle from disk. An unreadable file, an unparseable bundle or
/// a bundle without certificates is a configuration error.
pub fn load_trust_root(path: &Path) -> Result<Vec<Certificate>, OcsError> {
    let trust_err = |reason: String| OcsError::TrustRoot {
        path: path.to_path_buf(),
        reason,
    };

    let pem = std::fs::read(path).map_err(|e| trust_err(e.to_string()))?;
    let certs = Certificate::from_pem_bundle(&pem).map_err(|e| trust_err(e.to_string()))?;
    if certs.is_empty() {
        return Err(trust_err("no certificates found in bundle".into()));
    }
    Ok(certs)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
