// ──────────────────────────────────────────────────────────────────────────────
// sorng-ocs · types
// ──────────────────────────────────────────────────────────────────────────────
// Type catalogue for the OCS client:
//  • Account configuration
//  • Server status / capabilities
//  • App filters and lifecycle actions
//  • Sharing types (share type, permissions, share record, create / update args)
//  • User details
// ──────────────────────────────────────────────────────────────────────────────

use crate::apps::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

// ── Configuration ────────────────────────────────────────────────────────────

/// Account-level OCS configuration, typically deserialized by the host
/// application from its own settings store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OcsConfig {
    /// Full base URL of the Nextcloud instance, e.g. `https://cloud.example.com`.
    pub server_url: String,
    /// Username used for authentication.
    #[serde(default)]
    pub username: String,
    /// App password (preferred) or regular password.
    #[serde(default)]
    pub app_password: String,
    /// PEM bundle that replaces the system trust store.
    #[serde(default)]
    pub trust_root: Option<PathBuf>,
    /// Per-request timeout enforced by the HTTP executor.
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    /// Wrap the executor in a retry decorator with this many extra attempts.
    /// Only GET and HEAD are resent after a transport failure or a 5xx reply.
    #[serde(default)]
    pub retry_attempts: u32,
}

// ── Server status / capabilities ─────────────────────────────────────────────

/// Server status (`/status.php`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerStatus {
    pub installed: bool,
    pub maintenance: bool,
    pub version: String,
    #[serde(rename = "versionstring")]
    pub version_string: String,
    #[serde(rename = "needsDbUpgrade", default)]
    pub needs_db_upgrade: bool,
    #[serde(default)]
    pub edition: String,
    #[serde(rename = "productname", default)]
    pub product_name: String,
    #[serde(rename = "extendedSupport", default)]
    pub extended_support: Option<bool>,
}

/// The `ocs.data` tree of `/cloud/capabilities`.
#[derive(Debug, Clone, PartialEq)]
pub struct Capabilities(pub Value);

impl Capabilities {
    fn lookup(&self, path: &str) -> Option<&Value> {
        let mut current = self.0.get("capabilities")?;
        for key in path.split('.') {
            current = current.get(key)?;
        }
        Some(current)
    }

    /// Whether a dotted capability path (e.g. `files_sharing.api_enabled`) exists.
    pub fn has(&self, path: &str) -> bool {
        self.lookup(path).is_some()
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.lookup(path)?.as_str()
    }

    pub fn get_bool(&self, path: &str) -> Option<bool> {
        self.lookup(path)?.as_bool()
    }

    /// `version.string`, e.g. `"28.0.1"`.
    pub fn version_string(&self) -> Option<&str> {
        self.0.get("version")?.get("string")?.as_str()
    }
}

// ── Apps ─────────────────────────────────────────────────────────────────────

/// App listing filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppFilter {
    Enabled,
    Disabled,
    All,
}

impl AppFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
            Self::All => "all",
        }
    }
}

impl FromStr for AppFilter {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "enabled" => Ok(Self::Enabled),
            "disabled" => Ok(Self::Disabled),
            "all" => Ok(Self::All),
            other => Err(AppError::InvalidFilter(other.to_string())),
        }
    }
}

/// Enable / disable transition applied to an app or a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateAction {
    Enable,
    Disable,
}

impl StateAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Enable => "enable",
            Self::Disable => "disable",
        }
    }
}

impl fmt::Display for StateAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Enable => "enabling",
            Self::Disable => "disabling",
        })
    }
}

/// Group membership change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MembershipAction {
    Add,
    Remove,
}

impl MembershipAction {
    pub fn verb(&self) -> &'static str {
        match self {
            Self::Add => "adding",
            Self::Remove => "removing",
        }
    }

    pub fn preposition(&self) -> &'static str {
        match self {
            Self::Add => "to",
            Self::Remove => "from",
        }
    }
}

// ── Sharing (files_sharing Share API v1) ─────────────────────────────────────

/// Nextcloud share types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShareType {
    User,
    Group,
    Link,
    Mail,
    Remote,
}

impl ShareType {
    pub fn from_code(v: i64) -> Option<Self> {
        match v {
            0 => Some(Self::User),
            1 => Some(Self::Group),
            3 => Some(Self::Link),
            4 => Some(Self::Mail),
            6 => Some(Self::Remote),
            _ => None,
        }
    }

    pub fn code(&self) -> i64 {
        match self {
            Self::User => 0,
            Self::Group => 1,
            Self::Link => 3,
            Self::Mail => 4,
            Self::Remote => 6,
        }
    }

    /// Share types that carry a `token`.
    pub fn has_token(&self) -> bool {
        matches!(self, Self::Link | Self::Mail | Self::Remote)
    }
}

/// OCS share permissions bitmap.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharePermissions(pub u32);

impl SharePermissions {
    pub const READ: u32 = 1;
    pub const UPDATE: u32 = 2;
    pub const CREATE: u32 = 4;
    pub const DELETE: u32 = 8;
    pub const SHARE: u32 = 16;
    pub const ALL: u32 = 31;

    pub fn can_read(&self) -> bool {
        self.0 & Self::READ != 0
    }
    pub fn can_update(&self) -> bool {
        self.0 & Self::UPDATE != 0
    }
    pub fn can_create(&self) -> bool {
        self.0 & Self::CREATE != 0
    }
    pub fn can_delete(&self) -> bool {
        self.0 & Self::DELETE != 0
    }
    pub fn can_share(&self) -> bool {
        self.0 & Self::SHARE != 0
    }
}

/// Account id plus its display name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: String,
    pub display_name: String,
}

/// A share record, mapped by [`Share::from_record`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Share {
    pub id: u64,
    pub share_type: ShareType,
    /// Owner of the shared file.
    pub owner: Identity,
    /// Account that created the share.
    pub initiator: Identity,
    pub share_with: Identity,
    pub path: String,
    pub permissions: SharePermissions,
    pub created: DateTime<Utc>,
    /// Link / mail / federated shares only.
    pub token: Option<String>,
    /// Link shares only.
    pub expiration: Option<DateTime<Utc>>,
}

/// Arguments for creating a new share.
#[derive(Debug, Clone, PartialEq)]
pub struct CreateShare {
    pub path: String,
    pub share_type: ShareType,
    /// Username, group id, email address or federated cloud id.
    pub share_with: Option<String>,
    pub permissions: Option<SharePermissions>,
    /// Link shares only.
    pub password: Option<String>,
    /// `YYYY-MM-DD`
    pub expire_date: Option<String>,
}

impl CreateShare {
    fn new(path: &str, share_type: ShareType, share_with: Option<&str>) -> Self {
        Self {
            path: path.to_string(),
            share_type,
            share_with: share_with.map(str::to_string),
            permissions: None,
            password: None,
            expire_date: None,
        }
    }

    pub fn user(path: &str, user: &str) -> Self {
        Self::new(path, ShareType::User, Some(user))
    }

    pub fn group(path: &str, group: &str) -> Self {
        Self::new(path, ShareType::Group, Some(group))
    }

    pub fn link(path: &str) -> Self {
        Self::new(path, ShareType::Link, None)
    }

    pub fn mail(path: &str, email: &str) -> Self {
        Self::new(path, ShareType::Mail, Some(email))
    }

    pub fn remote(path: &str, federated_id: &str) -> Self {
        Self::new(path, ShareType::Remote, Some(federated_id))
    }

    pub fn with_permissions(mut self, permissions: u32) -> Self {
        self.permissions = Some(SharePermissions(permissions));
        self
    }

    pub fn with_password(mut self, password: &str) -> Self {
        self.password = Some(password.to_string());
        self
    }

    pub fn with_expire_date(mut self, date: &str) -> Self {
        self.expire_date = Some(date.to_string());
        self
    }
}

/// Fields to change on an existing share. Unset fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateShare {
    pub permissions: Option<SharePermissions>,
    pub password: Option<String>,
    /// `YYYY-MM-DD`; an empty string clears the expiration.
    pub expire_date: Option<String>,
    pub note: Option<String>,
}

impl UpdateShare {
    pub fn is_empty(&self) -> bool {
        self.permissions.is_none()
            && self.password.is_none()
            && self.expire_date.is_none()
            && self.note.is_none()
    }
}

// ── Users ────────────────────────────────────────────────────────────────────

/// Quota block of a user record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserQuota {
    pub free: Option<i64>,
    pub used: Option<i64>,
    pub total: Option<i64>,
    pub relative: Option<f64>,
}

/// User record from `/cloud/users/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserDetails {
    pub id: String,
    pub display_name: String,
    pub email: Option<String>,
    pub enabled: bool,
    pub groups: Vec<String>,
    pub quota: Option<UserQuota>,
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn app_filter_parse() {
        assert_eq!("enabled".parse::<AppFilter>().unwrap(), AppFilter::Enabled);
        assert_eq!("disabled".parse::<AppFilter>().unwrap(), AppFilter::Disabled);
        assert_eq!("all".parse::<AppFilter>().unwrap(), AppFilter::All);
        assert!(matches!(
            "Enabled".parse::<AppFilter>(),
            Err(AppError::InvalidFilter(f)) if f == "Enabled"
        ));
    }

    #[test]
    fn share_type_codes() {
        for t in [
            ShareType::User,
            ShareType::Group,
            ShareType::Link,
            ShareType::Mail,
            ShareType::Remote,
        ] {
            assert_eq!(ShareType::from_code(t.code()), Some(t));
        }
        assert_eq!(ShareType::from_code(2), None);
        assert_eq!(ShareType::from_code(7), None);
    }

    #[test]
    fn token_bearing_share_types() {
        assert!(ShareType::Link.has_token());
        assert!(ShareType::Mail.has_token());
        assert!(ShareType::Remote.has_token());
        assert!(!ShareType::User.has_token());
        assert!(!ShareType::Group.has_token());
    }

    #[test]
    fn permissions_bits() {
        let p = SharePermissions(SharePermissions::READ | SharePermissions::SHARE);
        assert!(p.can_read());
        assert!(p.can_share());
        assert!(!p.can_update());
        assert!(!p.can_create());
        assert!(!p.can_delete());

        let all = SharePermissions(SharePermissions::ALL);
        assert!(all.can_read() && all.can_update() && all.can_create());
        assert!(all.can_delete() && all.can_share());
    }

    #[test]
    fn create_share_builders() {
        let s = CreateShare::link("/Documents/report.pdf")
            .with_password("secret")
            .with_expire_date("2030-01-01");
        assert_eq!(s.share_type, ShareType::Link);
        assert!(s.share_with.is_none());
        assert_eq!(s.password.as_deref(), Some("secret"));

        let s = CreateShare::user("/file.txt", "bob").with_permissions(SharePermissions::ALL);
        assert_eq!(s.share_with.as_deref(), Some("bob"));
        assert_eq!(s.permissions, Some(SharePermissions(31)));

        assert_eq!(CreateShare::group("/shared", "devs").share_type, ShareType::Group);
        assert_eq!(CreateShare::mail("/d.pdf", "a@b.c").share_type, ShareType::Mail);
        assert_eq!(CreateShare::remote("/f", "u@remote").share_type, ShareType::Remote);
    }

    #[test]
    fn update_share_emptiness() {
        assert!(UpdateShare::default().is_empty());
        let u = UpdateShare {
            note: Some("hi".into()),
            ..Default::default()
        };
        assert!(!u.is_empty());
    }

    #[test]
    fn state_action_wording() {
        assert_eq!(StateAction::Enable.as_str(), "enable");
        assert_eq!(StateAction::Disable.to_string(), "disabling");
    }

    #[test]
    fn server_status_from_status_php() {
        let s: ServerStatus = serde_json::from_value(json!({
            "installed": true,
            "maintenance": false,
            "needsDbUpgrade": false,
            "version": "13.0.0.6",
            "versionstring": "13.0.0 Beta 1",
            "edition": "",
            "productname": "Nextcloud"
        }))
        .unwrap();
        assert!(s.installed);
        assert!(!s.maintenance);
        assert_eq!(s.version, "13.0.0.6");
        assert_eq!(s.version_string, "13.0.0 Beta 1");
        assert_eq!(s.extended_support, None);
    }

    #[test]
    fn capabilities_lookup() {
        let caps = Capabilities(json!({
            "version": {"major": 28, "string": "28.0.1"},
            "capabilities": {
                "files_sharing": {"api_enabled": true},
                "theming": {"name": "Nextcloud"}
            }
        }));
        assert!(caps.has("files_sharing.api_enabled"));
        assert!(!caps.has("files_sharing.missing"));
        assert_eq!(caps.get_bool("files_sharing.api_enabled"), Some(true));
        assert_eq!(caps.get_str("theming.name"), Some("Nextcloud"));
        assert_eq!(caps.version_string(), Some("28.0.1"));
    }

    #[test]
    fn config_defaults() {
        let c: OcsConfig = serde_json::from_value(json!({
            "server_url": "https://nc.test"
        }))
        .unwrap();
        assert!(c.username.is_empty());
        assert!(c.trust_root.is_none());
        assert_eq!(c.retry_attempts, 0);
    }
}
