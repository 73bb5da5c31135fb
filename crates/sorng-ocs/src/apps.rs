// ──────────────────────────────────────────────────────────────────────────────
// sorng-ocs · apps
// ──────────────────────────────────────────────────────────────────────────────
// OCS Provisioning API – app listing, lookup and enable / disable.
// ──────────────────────────────────────────────────────────────────────────────

use crate::client::{encode_segment, with_query, Api, OcsClient};
use crate::error::{DecodeError, OcsError, Rejection};
use crate::types::{AppFilter, StateAction};
use reqwest::Method;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid app filter `{0}` (expected enabled, disabled or all)")]
    InvalidFilter(String),

    #[error("app `{0}` not found")]
    AppNotFound(String),

    #[error("listing apps failed ({0})")]
    AppListFailed(Rejection),

    #[error("an error occurred while {action} app `{app}` ({rejection})")]
    AppStateChangeFailed {
        app: String,
        action: StateAction,
        rejection: Rejection,
    },

    #[error("fetching info for app `{app}` failed ({rejection})")]
    AppInfoFailed { app: String, rejection: Rejection },

    #[error(transparent)]
    Ocs(#[from] OcsError),
}

impl From<DecodeError> for AppError {
    fn from(e: DecodeError) -> Self {
        Self::Ocs(OcsError::Decode(e))
    }
}

/// App manager, borrowed from [`OcsClient::apps`].
pub struct Apps<'a> {
    client: &'a OcsClient,
}

impl<'a> Apps<'a> {
    pub(crate) fn new(client: &'a OcsClient) -> Self {
        Self { client }
    }

    /// List app ids for a textual filter (`enabled`, `disabled` or `all`).
    pub async fn list(&self, filter: &str) -> Result<Vec<String>, AppError> {
        let filter: AppFilter = filter.parse()?;
        self.list_by(filter).await
    }

    pub async fn list_by(&self, filter: AppFilter) -> Result<Vec<String>, AppError> {
        let params = match filter {
            AppFilter::All => Vec::new(),
            f => vec![("filter", f.as_str().to_string())],
        };
        let tail = with_query("apps".to_string(), &params);
        let reply = self.client.ocs(Method::GET, Api::Cloud, &tail, None).await?;
        if !reply.is_success() {
            return Err(AppError::AppListFailed(reply.rejection()));
        }
        Ok(reply.string_list(&["ocs", "data", "apps"])?)
    }

    pub async fn is_enabled(&self, id: &str) -> Result<bool, AppError> {
        self.contains(AppFilter::Enabled, id).await
    }

    /// Installed but not enabled.
    pub async fn is_disabled(&self, id: &str) -> Result<bool, AppError> {
        self.contains(AppFilter::Disabled, id).await
    }

    pub async fn is_available(&self, id: &str) -> Result<bool, AppError> {
        self.contains(AppFilter::All, id).await
    }

    async fn contains(&self, filter: AppFilter, id: &str) -> Result<bool, AppError> {
        Ok(self.list_by(filter).await?.iter().any(|app| app == id))
    }

    pub async fn enable(&self, id: &str) -> Result<(), AppError> {
        self.change_state(id, StateAction::Enable).await
    }

    pub async fn disable(&self, id: &str) -> Result<(), AppError> {
        self.change_state(id, StateAction::Disable).await
    }

    async fn change_state(&self, id: &str, action: StateAction) -> Result<(), AppError> {
        let method = match action {
            StateAction::Enable => Method::POST,
            StateAction::Disable => Method::DELETE,
        };
        let tail = format!("apps/{}", encode_segment(id));
        let reply = self.client.ocs(method, Api::Cloud, &tail, None).await?;

        if reply.is_success() {
            return Ok(());
        }
        if reply.http_status == 404 {
            return Err(AppError::AppNotFound(id.to_string()));
        }
        Err(AppError::AppStateChangeFailed {
            app: id.to_string(),
            action,
            rejection: reply.rejection(),
        })
    }

    /// The app-info record (`ocs.data`) of one app.
    pub async fn info(&self, id: &str) -> Result<Value, AppError> {
        let tail = format!("apps/{}", encode_segment(id));
        let reply = self.client.ocs(Method::GET, Api::Cloud, &tail, None).await?;

        if reply.is_not_found() {
            return Err(AppError::AppNotFound(id.to_string()));
        }
        if !reply.is_success() {
            return Err(AppError::AppInfoFailed {
                app: id.to_string(),
                rejection: reply.rejection(),
            });
        }
        Ok(reply.data()?.clone())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
