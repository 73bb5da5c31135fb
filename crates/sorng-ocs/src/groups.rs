// ──────────────────────────────────────────────────────────────────────────────
// sorng-ocs · groups
// ──────────────────────────────────────────────────────────────────────────────
// OCS Provisioning API – group creation, deletion, search, members and
// subadmins.
// ──────────────────────────────────────────────────────────────────────────────

use crate::client::{encode_segment, with_query, Api, OcsClient};
use crate::error::{DecodeError, OcsError, Rejection};
use reqwest::Method;
use serde_json::json;
use thiserror::Error;

/// The server refuses to delete this group; the client refuses first.
pub const PROTECTED_GROUP: &str = "admin";

#[derive(Debug, Error)]
pub enum GroupError {
    #[error("provided group name `{0}` is invalid")]
    InvalidGroupName(String),

    #[error("group `{0}` already exists")]
    GroupAlreadyExists(String),

    #[error("group `{0}` does not exist")]
    GroupNotFound(String),

    #[error("the `{0}` group can not be deleted")]
    ProtectedGroup(String),

    #[error("an error occurred while creating the group ({0})")]
    GroupCreateFailed(Rejection),

    #[error("an error occurred while deleting the group ({0})")]
    GroupDeleteFailed(Rejection),

    #[error("an error occurred while searching for groups ({0})")]
    GroupListFailed(Rejection),

    #[error("an error occurred while getting the members of the group ({0})")]
    GroupMembersFailed(Rejection),

    #[error("an error occurred while getting the subadmins of the group ({0})")]
    SubadminsFailed(Rejection),

    #[error(transparent)]
    Ocs(#[from] OcsError),
}

impl From<DecodeError> for GroupError {
    fn from(e: DecodeError) -> Self {
        Self::Ocs(OcsError::Decode(e))
    }
}

/// Group manager, borrowed from [`OcsClient::groups`].
pub struct Groups<'a> {
    client: &'a OcsClient,
}

impl<'a> Groups<'a> {
    pub(crate) fn new(client: &'a OcsClient) -> Self {
        Self { client }
    }

    pub async fn create(&self, id: &str) -> Result<(), GroupError> {
        let reply = self
            .client
            .ocs(Method::POST, Api::Cloud, "groups", Some(json!({ "groupid": id })))
            .await?;

        if reply.is_success() {
            return Ok(());
        }
        Err(match reply.ocs_status() {
            Some(101) => GroupError::InvalidGroupName(id.to_string()),
            Some(102) => GroupError::GroupAlreadyExists(id.to_string()),
            _ => GroupError::GroupCreateFailed(reply.rejection()),
        })
    }

    pub async fn delete(&self, id: &str) -> Result<(), GroupError> {
        if id == PROTECTED_GROUP {
            return Err(GroupError::ProtectedGroup(id.to_string()));
        }

        let tail = format!("groups/{}", encode_segment(id));
        let reply = self.client.ocs(Method::DELETE, Api::Cloud, &tail, None).await?;

        if reply.is_success() {
            return Ok(());
        }
        if reply.has_ocs_status(101) {
            return Err(GroupError::GroupNotFound(id.to_string()));
        }
        Err(GroupError::GroupDeleteFailed(reply.rejection()))
    }

    /// Group ids matching `search` (substring match). An empty search lists
    /// every group.
    pub async fn list(&self, search: &str) -> Result<Vec<String>, GroupError> {
        let params = if search.is_empty() {
            Vec::new()
        } else {
            vec![("search", search.to_string())]
        };
        let tail = with_query("groups".to_string(), &params);
        let reply = self.client.ocs(Method::GET, Api::Cloud, &tail, None).await?;

        if !reply.is_success() {
            return Err(GroupError::GroupListFailed(reply.rejection()));
        }
        Ok(reply.string_list(&["ocs", "data", "groups"])?)
    }

    /// User ids in group `id`.
    pub async fn members(&self, id: &str) -> Result<Vec<String>, GroupError> {
        let tail = format!("groups/{}", encode_segment(id));
        let reply = self.client.ocs(Method::GET, Api::Cloud, &tail, None).await?;

        if reply.http_status == 404 {
            return Err(GroupError::GroupNotFound(id.to_string()));
        }
        if !reply.is_success() {
            return Err(GroupError::GroupMembersFailed(reply.rejection()));
        }
        Ok(reply.string_list(&["ocs", "data", "users"])?)
    }

    /// Exact-match check over a search for `id`.
    pub async fn exists(&self, id: &str) -> Result<bool, GroupError> {
        Ok(self.list(id).await?.iter().any(|g| g == id))
    }

    /// User ids holding subadmin rights over group `id`.
    pub async fn subadmins(&self, id: &str) -> Result<Vec<String>, GroupError> {
        let tail = format!("groups/{}/subadmins", encode_segment(id));
        let reply = self.client.ocs(Method::GET, Api::Cloud, &tail, None).await?;

        if reply.http_status == 404 || reply.has_ocs_status(101) {
            return Err(GroupError::GroupNotFound(id.to_string()));
        }
        if !reply.is_success() {
            return Err(GroupError::SubadminsFailed(reply.rejection()));
        }
        Ok(reply.string_list(&["ocs", "data"])?)
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, envelope, MockExecutor};
    use std::sync::Arc;

    #[tokio::test]
    async fn create_posts_group_id() {
        let mock = Arc::new(MockExecutor::new().route(
            Method::POST,
            "/ocs/v2.php/cloud/groups",
            200,
            envelope(200, json!([])),
        ));
        let c = testing::client(&mock);
        c.groups().create("g").await.unwrap();

        let req = mock.last_request();
        assert_eq!(req.method, Method::POST);
        assert_eq!(testing::body_json(&req), json!({"groupid": "g"}));
    }

    #[tokio::test]
    async fn create_maps_ocs_codes() {
        let mock = Arc::new(MockExecutor::new());
        let c = testing::client(&mock);

        mock.push_reply(crate::RawResponse::new(400, envelope(101, json!([]))));
        assert!(matches!(
            c.groups().create("").await,
            Err(GroupError::InvalidGroupName(_))
        ));

        mock.push_reply(crate::RawResponse::new(400, envelope(102, json!([]))));
        assert!(matches!(
            c.groups().create("devs").await,
            Err(GroupError::GroupAlreadyExists(g)) if g == "devs"
        ));

        mock.push_reply(crate::RawResponse::new(400, envelope(103, json!([]))));
        assert!(matches!(
            c.groups().create("devs").await,
            Err(GroupError::GroupCreateFailed(r)) if r.ocs_status == Some(103)
        ));
    }

    #[tokio::test]
    async fn create_needs_ocs_success_too() {
        let mock = Arc::new(MockExecutor::new().fallback(200, envelope(997, json!([]))));
        let c = testing::client(&mock);
        assert!(matches!(
            c.groups().create("g").await,
            Err(GroupError::GroupCreateFailed(_))
        ));
    }

    #[tokio::test]
    async fn admin_group_is_protected() {
        let mock = Arc::new(MockExecutor::new().fallback(200, envelope(200, json!([]))));
        let c = testing::client(&mock);
        assert!(matches!(
            c.groups().delete("admin").await,
            Err(GroupError::ProtectedGroup(_))
        ));
        assert_eq!(mock.request_count(), 0);
    }

    #[tokio::test]
    async fn delete_encodes_id() {
        let mock = Arc::new(MockExecutor::new().route(
            Method::DELETE,
            "/ocs/v2.php/cloud/groups/team%20a",
            200,
            envelope(200, json!([])),
        ));
        let c = testing::client(&mock);
        c.groups().delete("team a").await.unwrap();
    }

    #[tokio::test]
    async fn delete_missing_group() {
        let mock = Arc::new(MockExecutor::new().fallback(400, envelope(101, json!([]))));
        let c = testing::client(&mock);
        assert!(matches!(
            c.groups().delete("ghost").await,
            Err(GroupError::GroupNotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_other_failure() {
        let mock = Arc::new(MockExecutor::new().fallback(400, envelope(102, json!([]))));
        let c = testing::client(&mock);
        assert!(matches!(
            c.groups().delete("g").await,
            Err(GroupError::GroupDeleteFailed(_))
        ));
    }

    #[tokio::test]
    async fn list_with_and_without_search() {
        let mock = Arc::new(
            MockExecutor::new()
                .route(
                    Method::GET,
                    "/ocs/v2.php/cloud/groups",
                    200,
                    envelope(200, json!({"groups": ["admin", "devs", "devops"]})),
                )
                .route(
                    Method::GET,
                    "/ocs/v2.php/cloud/groups?search=dev",
                    200,
                    envelope(200, json!({"groups": ["devs", "devops"]})),
                ),
        );
        let c = testing::client(&mock);
        assert_eq!(c.groups().list("").await.unwrap().len(), 3);
        assert_eq!(c.groups().list("dev").await.unwrap(), vec!["devs", "devops"]);
    }

    #[tokio::test]
    async fn list_empty_php_map() {
        let mock = Arc::new(MockExecutor::new().fallback(200, envelope(200, json!([]))));
        let c = testing::client(&mock);
        assert!(c.groups().list("").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn list_failure() {
        let mock = Arc::new(MockExecutor::new().fallback(401, envelope(997, json!([]))));
        let c = testing::client(&mock);
        assert!(matches!(
            c.groups().list("").await,
            Err(GroupError::GroupListFailed(_))
        ));
    }

    #[tokio::test]
    async fn exists_is_exact_match() {
        let mock = Arc::new(MockExecutor::new().fallback(
            200,
            envelope(200, json!({"groups": ["devs", "devops"]})),
        ));
        let c = testing::client(&mock);
        assert!(c.groups().exists("devs").await.unwrap());
        assert!(!c.groups().exists("dev").await.unwrap());
    }

    #[tokio::test]
    async fn members_and_missing_group() {
        let mock = Arc::new(MockExecutor::new().route(
            Method::GET,
            "/ocs/v2.php/cloud/groups/devs",
            200,
            envelope(200, json!({"users": ["alice", "bob"]})),
        ));
        let c = testing::client(&mock);
        assert_eq!(c.groups().members("devs").await.unwrap(), vec!["alice", "bob"]);
        assert!(matches!(
            c.groups().members("ghost").await,
            Err(GroupError::GroupNotFound(_))
        ));
    }

    #[tokio::test]
    async fn members_other_failure() {
        let mock = Arc::new(MockExecutor::new().fallback(500, ""));
        let c = testing::client(&mock);
        assert!(matches!(
            c.groups().members("devs").await,
            Err(GroupError::GroupMembersFailed(_))
        ));
    }

    #[tokio::test]
    async fn subadmins_plain_array() {
        let mock = Arc::new(
            MockExecutor::new()
                .route(
                    Method::GET,
                    "/ocs/v2.php/cloud/groups/devs/subadmins",
                    200,
                    envelope(200, json!(["carol"])),
                )
                .fallback(400, envelope(101, json!([]))),
        );
        let c = testing::client(&mock);
        assert_eq!(c.groups().subadmins("devs").await.unwrap(), vec!["carol"]);
        assert!(matches!(
            c.groups().subadmins("ghost").await,
            Err(GroupError::GroupNotFound(_))
        ));
    }
}
