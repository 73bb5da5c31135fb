// ──────────────────────────────────────────────────────────────────────────────
// sorng-ocs · users
// ──────────────────────────────────────────────────────────────────────────────
// OCS Provisioning API – user lifecycle:
//  • create / delete / enable / disable
//  • search with offset + limit paging
//  • group membership changes and lookup
//  • user details and field edits
// ──────────────────────────────────────────────────────────────────────────────

use crate::client::{encode_segment, with_query, Api, OcsClient};
use crate::envelope::Envelope;
use crate::error::{DecodeError, OcsError, Rejection};
use crate::types::{MembershipAction, StateAction, UserDetails, UserQuota};
use reqwest::Method;
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("user `{0}` already exists")]
    UserAlreadyExists(String),

    #[error("user `{0}` does not exist")]
    UserNotFound(String),

    #[error("group `{0}` does not exist")]
    GroupNotFound(String),

    #[error("field `{field}` can not be set to the given value ({rejection})")]
    InvalidUserField { field: String, rejection: Rejection },

    #[error("an error occurred while creating the user ({0})")]
    UserCreateFailed(Rejection),

    #[error("an error occurred while deleting the user ({0})")]
    UserDeleteFailed(Rejection),

    #[error("an error occurred while searching for users ({0})")]
    UserListFailed(Rejection),

    #[error("an error occurred while {action} user `{user}` ({rejection})")]
    UserStateChangeFailed {
        user: String,
        action: StateAction,
        rejection: Rejection,
    },

    #[error(
        "an error occurred while {} user `{user}` {} group `{group}` ({rejection})",
        .action.verb(),
        .action.preposition()
    )]
    MembershipChangeFailed {
        user: String,
        group: String,
        action: MembershipAction,
        rejection: Rejection,
    },

    #[error("an error occurred while getting the groups of the user ({0})")]
    UserGroupsFailed(Rejection),

    #[error("an error occurred while getting the user ({0})")]
    UserFetchFailed(Rejection),

    #[error("an error occurred while editing the user ({0})")]
    UserEditFailed(Rejection),

    #[error(transparent)]
    Ocs(#[from] OcsError),
}

impl From<DecodeError> for UserError {
    fn from(e: DecodeError) -> Self {
        Self::Ocs(OcsError::Decode(e))
    }
}

/// User manager, borrowed from [`OcsClient::users`].
pub struct Users<'a> {
    client: &'a OcsClient,
}

impl<'a> Users<'a> {
    pub(crate) fn new(client: &'a OcsClient) -> Self {
        Self { client }
    }

    fn user_path(id: &str) -> String {
        format!("users/{}", encode_segment(id))
    }

    // ── Lifecycle ────────────────────────────────────────────────────────

    pub async fn create(&self, id: &str, password: &str) -> Result<(), UserError> {
        let body = json!({ "userid": id, "password": password });
        let reply = self
            .client
            .ocs(Method::POST, Api::Cloud, "users", Some(body))
            .await?;

        if reply.is_success() {
            return Ok(());
        }
        if reply.has_ocs_status(102) {
            return Err(UserError::UserAlreadyExists(id.to_string()));
        }
        Err(UserError::UserCreateFailed(reply.rejection()))
    }

    pub async fn delete(&self, id: &str) -> Result<(), UserError> {
        let reply = self
            .client
            .ocs(Method::DELETE, Api::Cloud, &Self::user_path(id), None)
            .await?;

        if reply.is_success() {
            return Ok(());
        }
        if reply.http_status == 404 || reply.has_ocs_status(101) {
            return Err(UserError::UserNotFound(id.to_string()));
        }
        Err(UserError::UserDeleteFailed(reply.rejection()))
    }

    pub async fn enable(&self, id: &str) -> Result<(), UserError> {
        self.change_state(id, StateAction::Enable).await
    }

    pub async fn disable(&self, id: &str) -> Result<(), UserError> {
        self.change_state(id, StateAction::Disable).await
    }

    async fn change_state(&self, id: &str, action: StateAction) -> Result<(), UserError> {
        let tail = format!("{}/{}", Self::user_path(id), action.as_str());
        let reply = self.client.ocs(Method::PUT, Api::Cloud, &tail, None).await?;

        if reply.is_success() {
            return Ok(());
        }
        if reply.http_status == 404 || reply.has_ocs_status(101) {
            return Err(UserError::UserNotFound(id.to_string()));
        }
        Err(UserError::UserStateChangeFailed {
            user: id.to_string(),
            action,
            rejection: reply.rejection(),
        })
    }

    // ── Search ───────────────────────────────────────────────────────────

    /// User ids matching `search`. A `start` or `limit` of 0 leaves that
    /// bound off; an empty search lists every user.
    pub async fn list(&self, search: &str, start: u32, limit: u32) -> Result<Vec<String>, UserError> {
        let mut params = Vec::new();
        if !search.is_empty() {
            params.push(("search", search.to_string()));
        }
        if limit > 0 {
            params.push(("limit", limit.to_string()));
        }
        if start > 0 {
            params.push(("offset", start.to_string()));
        }
        let tail = with_query("users".to_string(), &params);
        let reply = self.client.ocs(Method::GET, Api::Cloud, &tail, None).await?;

        if !reply.is_success() {
            return Err(UserError::UserListFailed(reply.rejection()));
        }
        Ok(reply.string_list(&["ocs", "data", "users"])?)
    }

    /// Exact-match check over a search for `id`.
    pub async fn exists(&self, id: &str) -> Result<bool, UserError> {
        Ok(self.list(id, 0, 0).await?.iter().any(|u| u == id))
    }

    // ── Group membership ─────────────────────────────────────────────────

    pub async fn add_to_group(&self, user: &str, group: &str) -> Result<(), UserError> {
        self.change_membership(user, group, MembershipAction::Add).await
    }

    pub async fn remove_from_group(&self, user: &str, group: &str) -> Result<(), UserError> {
        self.change_membership(user, group, MembershipAction::Remove)
            .await
    }

    async fn change_membership(
        &self,
        user: &str,
        group: &str,
        action: MembershipAction,
    ) -> Result<(), UserError> {
        let method = match action {
            MembershipAction::Add => Method::POST,
            MembershipAction::Remove => Method::DELETE,
        };
        let tail = format!("{}/groups", Self::user_path(user));
        let reply = self
            .client
            .ocs(method, Api::Cloud, &tail, Some(json!({ "groupid": group })))
            .await?;

        if reply.is_success() {
            return Ok(());
        }
        Err(match reply.ocs_status() {
            Some(102) => UserError::GroupNotFound(group.to_string()),
            Some(103) => UserError::UserNotFound(user.to_string()),
            _ => UserError::MembershipChangeFailed {
                user: user.to_string(),
                group: group.to_string(),
                action,
                rejection: reply.rejection(),
            },
        })
    }

    /// Group ids the user belongs to.
    pub async fn groups(&self, id: &str) -> Result<Vec<String>, UserError> {
        let tail = format!("{}/groups", Self::user_path(id));
        let reply = self.client.ocs(Method::GET, Api::Cloud, &tail, None).await?;

        if reply.http_status == 404 {
            return Err(UserError::UserNotFound(id.to_string()));
        }
        if !reply.is_success() {
            return Err(UserError::UserGroupsFailed(reply.rejection()));
        }
        Ok(reply.string_list(&["ocs", "data", "groups"])?)
    }

    // ── Details ──────────────────────────────────────────────────────────

    pub async fn get(&self, id: &str) -> Result<UserDetails, UserError> {
        let reply = self
            .client
            .ocs(Method::GET, Api::Cloud, &Self::user_path(id), None)
            .await?;

        if reply.is_not_found() {
            return Err(UserError::UserNotFound(id.to_string()));
        }
        if !reply.is_success() {
            return Err(UserError::UserFetchFailed(reply.rejection()));
        }
        Ok(parse_details(reply.envelope()?)?)
    }

    /// Set one user field (`email`, `displayname`, `quota`, `password`, …).
    pub async fn edit(&self, id: &str, field: &str, value: &str) -> Result<(), UserError> {
        let body = json!({ "key": field, "value": value });
        let reply = self
            .client
            .ocs(Method::PUT, Api::Cloud, &Self::user_path(id), Some(body))
            .await?;

        if reply.is_success() {
            return Ok(());
        }
        if reply.http_status == 404 || reply.has_ocs_status(101) {
            return Err(UserError::UserNotFound(id.to_string()));
        }
        if reply.has_ocs_status(102) || reply.has_ocs_status(103) {
            return Err(UserError::InvalidUserField {
                field: field.to_string(),
                rejection: reply.rejection(),
            });
        }
        Err(UserError::UserEditFailed(reply.rejection()))
    }
}

fn parse_details(envelope: &Envelope) -> Result<UserDetails, DecodeError> {
    let data = envelope.data()?;
    let id = data
        .get("id")
        .and_then(Value::as_str)
        .ok_or_else(|| DecodeError::bad_shape(&["ocs", "data", "id"]))?
        .to_string();
    let display_name = data
        .get("displayname")
        .or_else(|| data.get("display-name"))
        .and_then(Value::as_str)
        .unwrap_or(&id)
        .to_string();

    Ok(UserDetails {
        email: data
            .get("email")
            .and_then(Value::as_str)
            .filter(|e| !e.is_empty())
            .map(str::to_string),
        enabled: data.get("enabled").and_then(Value::as_bool).unwrap_or(false),
        groups: envelope.extract_string_list(&["ocs", "data", "groups"])?,
        quota: data
            .get("quota")
            .and_then(|q| serde_json::from_value::<UserQuota>(q.clone()).ok()),
        id,
        display_name,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
