// ──────────────────────────────────────────────────────────────────────────────
// sorng-ocs · sharing
// ──────────────────────────────────────────────────────────────────────────────
// OCS Share API v1 operations:
//  • Get single share / list shares (all, per path, shared with me)
//  • Create, update, delete
//  • Share record mapper (raw envelope record → `Share`)
//  • Public share URL helpers
// ──────────────────────────────────────────────────────────────────────────────

use crate::client::{encode_segment, with_query, Api, OcsClient};
use crate::envelope::OcsReply;
use crate::error::{DecodeError, MappingError, OcsError, Rejection};
use crate::types::{CreateShare, Identity, Share, SharePermissions, ShareType, UpdateShare};
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::Method;
use serde_json::{Map, Value};
use thiserror::Error;

const EXPIRATION_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum ShareError {
    #[error("share {0} not found")]
    ShareNotFound(u64),

    #[error("path `{0}` not found")]
    PathNotFound(String),

    #[error("share request rejected ({0})")]
    ShareRejected(Rejection),

    #[error("update carries no fields to change")]
    EmptyUpdate,

    #[error("an error occurred while fetching the share ({0})")]
    ShareFetchFailed(Rejection),

    #[error("an error occurred while listing shares ({0})")]
    ShareListFailed(Rejection),

    #[error("an error occurred while creating the share ({0})")]
    ShareCreateFailed(Rejection),

    #[error("an error occurred while updating the share ({0})")]
    ShareUpdateFailed(Rejection),

    #[error("an error occurred while deleting the share ({0})")]
    ShareDeleteFailed(Rejection),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error(transparent)]
    Ocs(#[from] OcsError),
}

impl From<DecodeError> for ShareError {
    fn from(e: DecodeError) -> Self {
        Self::Ocs(OcsError::Decode(e))
    }
}

/// Share manager, borrowed from [`OcsClient::shares`].
pub struct Shares<'a> {
    client: &'a OcsClient,
}

impl<'a> Shares<'a> {
    pub(crate) fn new(client: &'a OcsClient) -> Self {
        Self { client }
    }

    // ── Read ─────────────────────────────────────────────────────────────

    pub async fn get(&self, id: u64) -> Result<Share, ShareError> {
        let reply = self
            .client
            .ocs(Method::GET, Api::Sharing, &format!("shares/{}", id), None)
            .await?;

        if reply.is_not_found() {
            return Err(ShareError::ShareNotFound(id));
        }
        if !reply.is_success() {
            return Err(ShareError::ShareFetchFailed(reply.rejection()));
        }
        // Single shares come wrapped in a one-element array.
        let record = records(&reply)?
            .first()
            .ok_or(ShareError::ShareNotFound(id))?;
        Ok(Share::from_record(record)?)
    }

    /// Every share created by the current user.
    pub async fn list(&self) -> Result<Vec<Share>, ShareError> {
        self.list_with(Vec::new()).await
    }

    /// Shares on `path`, optionally including reshares by others and the
    /// shares of a folder's direct children.
    pub async fn list_for_path(
        &self,
        path: &str,
        reshares: bool,
        subfiles: bool,
    ) -> Result<Vec<Share>, ShareError> {
        let mut params = vec![("path", path.to_string())];
        if reshares {
            params.push(("reshares", "true".to_string()));
        }
        if subfiles {
            params.push(("subfiles", "true".to_string()));
        }
        match self.list_with(params).await {
            Err(ShareError::ShareListFailed(r)) if r.ocs_status == Some(404) => {
                Err(ShareError::PathNotFound(path.to_string()))
            }
            other => other,
        }
    }

    /// Shares other accounts granted to the current user.
    pub async fn list_shared_with_me(&self) -> Result<Vec<Share>, ShareError> {
        self.list_with(vec![("shared_with_me", "true".to_string())])
            .await
    }

    async fn list_with(&self, params: Vec<(&str, String)>) -> Result<Vec<Share>, ShareError> {
        let tail = with_query("shares".to_string(), &params);
        let reply = self.client.ocs(Method::GET, Api::Sharing, &tail, None).await?;

        if !reply.is_success() {
            return Err(ShareError::ShareListFailed(reply.rejection()));
        }
        Ok(records(&reply)?
            .iter()
            .map(Share::from_record)
            .collect::<Result<Vec<_>, _>>()?)
    }

    // ── Write ────────────────────────────────────────────────────────────

    pub async fn create(&self, args: &CreateShare) -> Result<Share, ShareError> {
        let mut body = Map::new();
        body.insert("path".into(), args.path.clone().into());
        body.insert("shareType".into(), args.share_type.code().into());
        if let Some(ref with) = args.share_with {
            body.insert("shareWith".into(), with.clone().into());
        }
        if let Some(p) = args.permissions {
            body.insert("permissions".into(), p.0.into());
        }
        if let Some(ref pw) = args.password {
            body.insert("password".into(), pw.clone().into());
        }
        if let Some(ref exp) = args.expire_date {
            body.insert("expireDate".into(), exp.clone().into());
        }

        let reply = self
            .client
            .ocs(Method::POST, Api::Sharing, "shares", Some(Value::Object(body)))
            .await?;

        if !reply.is_success() {
            return Err(match reply.ocs_status() {
                Some(404) => ShareError::PathNotFound(args.path.clone()),
                Some(400) | Some(403) => ShareError::ShareRejected(reply.rejection()),
                _ => ShareError::ShareCreateFailed(reply.rejection()),
            });
        }
        Ok(Share::from_record(reply.data()?)?)
    }

    pub async fn update(&self, id: u64, changes: &UpdateShare) -> Result<Share, ShareError> {
        if changes.is_empty() {
            return Err(ShareError::EmptyUpdate);
        }

        let mut body = Map::new();
        if let Some(p) = changes.permissions {
            body.insert("permissions".into(), p.0.into());
        }
        if let Some(ref pw) = changes.password {
            body.insert("password".into(), pw.clone().into());
        }
        if let Some(ref exp) = changes.expire_date {
            body.insert("expireDate".into(), exp.clone().into());
        }
        if let Some(ref note) = changes.note {
            body.insert("note".into(), note.clone().into());
        }

        let tail = format!("shares/{}", id);
        let reply = self
            .client
            .ocs(Method::PUT, Api::Sharing, &tail, Some(Value::Object(body)))
            .await?;

        if reply.is_not_found() {
            return Err(ShareError::ShareNotFound(id));
        }
        if !reply.is_success() {
            return Err(match reply.ocs_status() {
                Some(400) | Some(403) => ShareError::ShareRejected(reply.rejection()),
                _ => ShareError::ShareUpdateFailed(reply.rejection()),
            });
        }
        Ok(Share::from_record(reply.data()?)?)
    }

    pub async fn delete(&self, id: u64) -> Result<(), ShareError> {
        let tail = format!("shares/{}", id);
        let reply = self.client.ocs(Method::DELETE, Api::Sharing, &tail, None).await?;

        if reply.is_success() {
            return Ok(());
        }
        if reply.is_not_found() {
            return Err(ShareError::ShareNotFound(id));
        }
        Err(ShareError::ShareDeleteFailed(reply.rejection()))
    }
}

/// `ocs.data` as an array of share records.
fn records(reply: &OcsReply) -> Result<&Vec<Value>, DecodeError> {
    reply
        .data()?
        .as_array()
        .ok_or_else(|| DecodeError::bad_shape(&["ocs", "data"]))
}

// ── Record mapper ────────────────────────────────────────────────────────────

impl Share {
    /// Map one raw share record. Every required field must be present with
    /// the right type, `permissions` included.
    pub fn from_record(record: &Value) -> Result<Self, MappingError> {
        let code = record
            .get("share_type")
            .and_then(Value::as_i64)
            .ok_or(MappingError::MissingField { field: "share_type" })?;
        let share_type = ShareType::from_code(code).ok_or(MappingError::UnknownShareType(code))?;

        let share_with = if share_type == ShareType::Link {
            // Link shares have no recipient.
            Identity {
                id: opt_str(record, "share_with").unwrap_or_default(),
                display_name: opt_str(record, "share_with_displayname").unwrap_or_default(),
            }
        } else {
            identity(record, "share_with", "share_with_displayname")?
        };

        let permissions = record
            .get("permissions")
            .and_then(Value::as_u64)
            .and_then(|p| u32::try_from(p).ok())
            .ok_or(MappingError::MissingField {
                field: "permissions",
            })?;

        let created = record
            .get("stime")
            .and_then(epoch)
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
            .ok_or(MappingError::MissingField { field: "stime" })?;

        let token = if share_type.has_token() {
            opt_str(record, "token")
        } else {
            None
        };

        let expiration = match record.get("expiration") {
            Some(v) if share_type == ShareType::Link && !v.is_null() => Some(
                parse_time(v).ok_or(MappingError::MissingField {
                    field: "expiration",
                })?,
            ),
            _ => None,
        };

        Ok(Share {
            id: share_id(record)?,
            share_type,
            owner: identity(record, "uid_file_owner", "displayname_file_owner")?,
            initiator: identity(record, "uid_owner", "displayname_owner")?,
            share_with,
            path: req_str(record, "path")?,
            permissions: SharePermissions(permissions),
            created,
            token,
            expiration,
        })
    }
}

fn share_id(record: &Value) -> Result<u64, MappingError> {
    let missing = MappingError::MissingField { field: "id" };
    match record.get("id") {
        Some(Value::Number(n)) => n.as_u64().ok_or(missing),
        Some(Value::String(s)) => s.parse().map_err(|_| missing),
        _ => Err(missing),
    }
}

fn req_str(record: &Value, field: &'static str) -> Result<String, MappingError> {
    record
        .get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(MappingError::MissingField { field })
}

fn opt_str(record: &Value, field: &str) -> Option<String> {
    record.get(field).and_then(Value::as_str).map(str::to_string)
}

fn identity(
    record: &Value,
    id_field: &'static str,
    name_field: &'static str,
) -> Result<Identity, MappingError> {
    Ok(Identity {
        id: req_str(record, id_field)?,
        display_name: req_str(record, name_field)?,
    })
}

fn epoch(v: &Value) -> Option<i64> {
    v.as_i64().or_else(|| v.as_f64().map(|f| f as i64))
}

/// Numeric epoch, or `YYYY-MM-DD HH:MM:SS` read as UTC.
fn parse_time(v: &Value) -> Option<DateTime<Utc>> {
    match v {
        Value::Number(_) => epoch(v).and_then(|secs| DateTime::from_timestamp(secs, 0)),
        Value::String(s) => NaiveDateTime::parse_from_str(s, EXPIRATION_FORMAT)
            .ok()
            .map(|t| t.and_utc()),
        _ => None,
    }
}

// ── Share URL helpers ────────────────────────────────────────────────────────

/// Public share URL for a link token.
pub fn share_url(base_url: &str, token: &str) -> String {
    format!(
        "{}/s/{}",
        base_url.trim_end_matches('/'),
        encode_segment(token)
    )
}

/// Direct download URL for a public link share.
pub fn share_download_url(base_url: &str, token: &str) -> String {
    format!("{}/download", share_url(base_url, token))
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════
