// ──────────────────────────────────────────────────────────────────────────────
// sorng-ocs · client
// ──────────────────────────────────────────────────────────────────────────────
// `OcsClient` owns the session and the HTTP executor:
//  • Session lifecycle (connect / login / logout / disconnect)
//  • Request execution with the OCS marker headers and basic auth
//  • Endpoint prefixes and path / query encoding
//  • Server probes (status.php, capabilities)
//  • Resource manager accessors
// ──────────────────────────────────────────────────────────────────────────────

use crate::apps::Apps;
use crate::envelope::OcsReply;
use crate::error::{DecodeError, OcsError, Rejection};
use crate::groups::Groups;
use crate::retry::RetryExecutor;
use crate::session::Session;
use crate::sharing::Shares;
use crate::transport::{HttpExecutor, HttpRequest, RawResponse, ReqwestExecutor};
use crate::types::{Capabilities, OcsConfig, ServerStatus};
use crate::users::Users;
use log::{debug, info};
use reqwest::Method;
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// OCS API families and their endpoint prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Api {
    /// Provisioning API (apps, groups, users) and capabilities.
    Cloud,
    /// files_sharing Share API v1.
    Sharing,
}

impl Api {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Cloud => "ocs/v2.php/cloud",
            Self::Sharing => "ocs/v2.php/apps/files_sharing/api/v1",
        }
    }
}

/// Entry point of the crate. Borrow it immutably to reach the resource
/// managers; session changes need `&mut`.
pub struct OcsClient {
    session: Session,
    executor: Arc<dyn HttpExecutor>,
    timeout: Option<Duration>,
    retry_attempts: u32,
}

impl fmt::Debug for OcsClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcsClient")
            .field("session", &self.session)
            .field("timeout", &self.timeout)
            .field("retry_attempts", &self.retry_attempts)
            .finish_non_exhaustive()
    }
}

impl Default for OcsClient {
    fn default() -> Self {
        Self::new()
    }
}

impl OcsClient {
    // ── Constructors ─────────────────────────────────────────────────────

    /// Disconnected client backed by a default [`ReqwestExecutor`].
    pub fn new() -> Self {
        Self::with_executor(Arc::new(ReqwestExecutor::default()))
    }

    /// Disconnected client backed by a caller-supplied executor.
    pub fn with_executor(executor: Arc<dyn HttpExecutor>) -> Self {
        Self {
            session: Session::default(),
            executor,
            timeout: None,
            retry_attempts: 0,
        }
    }

    /// Build, connect and (when both credentials are set) log in from an
    /// account configuration.
    pub fn from_config(config: &OcsConfig) -> Result<Self, OcsError> {
        let timeout = config.request_timeout_secs.map(Duration::from_secs);
        let executor = build_executor(config.trust_root.as_deref(), timeout, config.retry_attempts)?;

        let mut client = Self {
            session: Session::default(),
            executor,
            timeout,
            retry_attempts: config.retry_attempts,
        };
        client
            .session
            .connect(&config.server_url, config.trust_root.clone());
        info!("OCS client configured for {}", config.server_url);

        if !config.username.is_empty() && !config.app_password.is_empty() {
            client.login(&config.username, &config.app_password);
        }
        Ok(client)
    }

    // ── Session ──────────────────────────────────────────────────────────

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn connect(&mut self, base_url: &str) {
        if self.session.trust_root().is_some() {
            self.executor = self.system_trust_executor();
        }
        self.session.connect(base_url, None);
        info!("connected to {}", base_url);
    }

    /// Connect and pin every TLS connection to the PEM bundle at `trust_root`.
    /// On failure the session and executor are left untouched.
    pub fn connect_with_trust_root(
        &mut self,
        base_url: &str,
        trust_root: impl AsRef<Path>,
    ) -> Result<(), OcsError> {
        let path = trust_root.as_ref();
        self.executor = build_executor(Some(path), self.timeout, self.retry_attempts)?;
        self.session.connect(base_url, Some(PathBuf::from(path)));
        info!("connected to {} (trust root {})", base_url, path.display());
        Ok(())
    }

    pub fn login(&mut self, user: &str, password: &str) {
        self.session.login(user, password);
        info!("logged in as {}", user);
    }

    pub fn logout(&mut self) {
        self.session.logout();
        info!("logged out");
    }

    /// Forget the server address and trust root. Credentials are kept.
    pub fn disconnect(&mut self) {
        if self.session.trust_root().is_some() {
            self.executor = self.system_trust_executor();
        }
        self.session.disconnect();
        info!("disconnected");
    }

    fn system_trust_executor(&self) -> Arc<dyn HttpExecutor> {
        build_executor(None, self.timeout, self.retry_attempts)
            .unwrap_or_else(|_| Arc::new(ReqwestExecutor::default()))
    }

    // ── Request execution ────────────────────────────────────────────────

    /// Run one request against a server-relative `path`.
    ///
    /// Missing credentials (when `requires_auth`) and a missing base URL are
    /// reported before anything reaches the executor.
    pub async fn execute(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        requires_auth: bool,
    ) -> Result<RawResponse, OcsError> {
        let credentials = if requires_auth {
            Some(self.session.require_credentials()?.clone())
        } else {
            None
        };
        let url = self.session.url(path)?;

        let mut headers = vec![
            ("OCS-APIRequest", "true".to_string()),
            ("Accept", "application/json".to_string()),
        ];
        if body.is_some() {
            headers.push(("Content-Type", "application/json".to_string()));
        }

        debug!("{} {}", method, url);
        self.executor
            .send(HttpRequest {
                method,
                url,
                headers,
                credentials,
                body,
            })
            .await
    }

    /// Authenticated OCS call. `tail` is appended to the API prefix and may
    /// carry a query string.
    pub(crate) async fn ocs(
        &self,
        method: Method,
        api: Api,
        tail: &str,
        body: Option<Value>,
    ) -> Result<OcsReply, OcsError> {
        let path = if tail.is_empty() {
            api.prefix().to_string()
        } else {
            format!("{}/{}", api.prefix(), tail)
        };
        let body = body.map(|b| b.to_string().into_bytes());
        let raw = self.execute(method, &path, body, true).await?;
        Ok(OcsReply::from_raw(raw))
    }

    // ── Probes ───────────────────────────────────────────────────────────

    /// Unauthenticated `GET /status.php`.
    pub async fn status(&self) -> Result<ServerStatus, OcsError> {
        let raw = self.execute(Method::GET, "status.php", None, false).await?;
        if raw.status != 200 {
            return Err(OcsError::Rejected(Rejection {
                http_status: raw.status,
                ocs_status: None,
            }));
        }
        let value: Value = serde_json::from_slice(&raw.body)
            .map_err(|e| DecodeError::NotJson(e.to_string()))?;
        serde_json::from_value(value).map_err(|e| {
            debug!("status.php did not match the expected shape: {}", e);
            OcsError::Decode(DecodeError::bad_shape(&["status"]))
        })
    }

    /// Authenticated `GET /ocs/v2.php/cloud/capabilities`.
    pub async fn capabilities(&self) -> Result<Capabilities, OcsError> {
        let reply = self.ocs(Method::GET, Api::Cloud, "capabilities", None).await?;
        if !reply.is_success() {
            return Err(OcsError::Rejected(reply.rejection()));
        }
        Ok(Capabilities(reply.data()?.clone()))
    }

    // ── Managers ─────────────────────────────────────────────────────────

    pub fn apps(&self) -> Apps<'_> {
        Apps::new(self)
    }

    pub fn groups(&self) -> Groups<'_> {
        Groups::new(self)
    }

    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    pub fn shares(&self) -> Shares<'_> {
        Shares::new(self)
    }
}

fn build_executor(
    trust_root: Option<&Path>,
    timeout: Option<Duration>,
    retry_attempts: u32,
) -> Result<Arc<dyn HttpExecutor>, OcsError> {
    let base = ReqwestExecutor::new(trust_root, timeout)?;
    let executor: Arc<dyn HttpExecutor> = if retry_attempts > 0 {
        Arc::new(RetryExecutor::new(base, retry_attempts))
    } else {
        Arc::new(base)
    };
    Ok(executor)
}

// ── Encoding helpers ─────────────────────────────────────────────────────────

/// Percent-encode one path segment. Spaces become `%20`, not `+`.
pub(crate) fn encode_segment(s: &str) -> String {
    url::form_urlencoded::byte_serialize(s.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}

/// Append a query string built from `params`. No `?` is added when empty.
pub(crate) fn with_query(path: String, params: &[(&str, String)]) -> String {
    if params.is_empty() {
        return path;
    }
    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(params.iter().map(|(k, v)| (*k, v.as_str())))
        .finish();
    format!("{}?{}", path, query)
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
