// ──────────────────────────────────────────────────────────────────────────────
// sorng-ocs · error
// ──────────────────────────────────────────────────────────────────────────────
// Crate-wide error taxonomy shared by every resource manager:
//  • Configuration errors (raised before any network activity)
//  • Transport failures (passed through verbatim, never retried)
//  • Envelope decode failures
//  • Share record mapping failures
// Domain errors live next to their manager (`AppError`, `GroupError`, …) and
// wrap `OcsError` transparently.
// ──────────────────────────────────────────────────────────────────────────────

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// HTTP + OCS status pair describing a reply the server did not accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rejection {
    pub http_status: u16,
    /// `None` when the body did not decode to an OCS envelope.
    pub ocs_status: Option<i64>,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.ocs_status {
            Some(code) => write!(f, "HTTP {}, OCS status {}", self.http_status, code),
            None => write!(f, "HTTP {}", self.http_status),
        }
    }
}

/// The response body did not have the expected envelope structure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("response is not a JSON object: {0}")]
    NotJson(String),

    #[error("unexpected OCS response shape at `{path}`")]
    BadShape { path: String },
}

impl DecodeError {
    pub(crate) fn bad_shape(path: &[&str]) -> Self {
        Self::BadShape {
            path: path.join("."),
        }
    }
}

/// Errors common to every OCS call.
#[derive(Debug, Error)]
pub enum OcsError {
    #[error("not connected to any server")]
    NotConnected,

    #[error("no user/password configured")]
    AuthNotConfigured,

    #[error("cannot load trust root {}: {reason}", path.display())]
    TrustRoot { path: PathBuf, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("request rejected by server ({0})")]
    Rejected(Rejection),
}

impl OcsError {
    /// True for errors a caller fixes by supplying missing configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::NotConnected | Self::AuthNotConfigured | Self::TrustRoot { .. } | Self::HttpClient(_)
        )
    }
}

/// A share record could not be converted into a [`crate::types::Share`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    #[error("share field `{field}` is missing or has the wrong type")]
    MissingField { field: &'static str },

    #[error("unknown share type {0}")]
    UnknownShareType(i64),
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
