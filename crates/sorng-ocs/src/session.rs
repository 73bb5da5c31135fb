// ──────────────────────────────────────────────────────────────────────────────
// sorng-ocs · session
// ──────────────────────────────────────────────────────────────────────────────
// Connection + credential state shared read-only by every resource manager.
// Mutated only through `OcsClient::{connect, login, logout, disconnect}`.
// ──────────────────────────────────────────────────────────────────────────────

use crate::error::OcsError;
use std::fmt;
use std::path::{Path, PathBuf};

/// Basic-auth credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    pub password: String,
}

impl Credentials {
    pub fn new(user: &str, password: &str) -> Self {
        Self {
            user: user.to_string(),
            password: password.to_string(),
        }
    }

    /// Both halves are required for an authenticated call.
    pub fn is_complete(&self) -> bool {
        !self.user.is_empty() && !self.password.is_empty()
    }

    pub fn masked_password(&self) -> String {
        if self.password.chars().count() <= 4 {
            return "****".to_string();
        }
        let prefix: String = self.password.chars().take(4).collect();
        format!("{}****", prefix)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("password", &self.masked_password())
            .finish()
    }
}

/// Server address, optional pinned trust root and credentials.
#[derive(Debug, Clone, Default)]
pub struct Session {
    base_url: Option<String>,
    trust_root: Option<PathBuf>,
    credentials: Option<Credentials>,
}

impl Session {
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn trust_root(&self) -> Option<&Path> {
        self.trust_root.as_deref()
    }

    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.base_url.is_some()
    }

    pub fn is_logged_in(&self) -> bool {
        self.credentials.as_ref().is_some_and(Credentials::is_complete)
    }

    /// Absolute URL for a server-relative path.
    pub fn url(&self, path: &str) -> Result<String, OcsError> {
        let base = self.base_url.as_deref().ok_or(OcsError::NotConnected)?;
        Ok(format!("{}/{}", base, path.trim_start_matches('/')))
    }

    /// Credentials for an authenticated call, or `AuthNotConfigured`.
    pub(crate) fn require_credentials(&self) -> Result<&Credentials, OcsError> {
        self.credentials
            .as_ref()
            .filter(|c| c.is_complete())
            .ok_or(OcsError::AuthNotConfigured)
    }

    pub(crate) fn connect(&mut self, base_url: &str, trust_root: Option<PathBuf>) {
        let trimmed = base_url.trim().trim_end_matches('/');
        self.base_url = if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        };
        self.trust_root = trust_root;
    }

    pub(crate) fn disconnect(&mut self) {
        self.base_url = None;
        self.trust_root = None;
    }

    pub(crate) fn login(&mut self, user: &str, password: &str) {
        self.credentials = Some(Credentials::new(user, password));
    }

    pub(crate) fn logout(&mut self) {
        self.credentials = None;
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
