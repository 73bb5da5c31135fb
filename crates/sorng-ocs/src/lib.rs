//! # SortOfRemote NG: Nextcloud OCS client
//!
//! Typed access to the Nextcloud OCS REST surface:
//!
//! - **Session**: base URL, optional pinned trust root, basic-auth credentials
//! - **Transport**: pluggable [`HttpExecutor`] with a `reqwest` implementation
//!   and an opt-in retry decorator
//! - **Envelope**: `{ocs: {meta, data}}` decoding and key-path extraction
//! - **Apps / Groups / Users**: Provisioning API lifecycle operations
//! - **Sharing**: files_sharing Share API v1 with a strict record mapper
//!
//! ```no_run
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! use sorng_ocs::OcsClient;
//!
//! let mut ocs = OcsClient::new();
//! ocs.connect("https://cloud.example.com");
//! ocs.login("admin", "app-password");
//!
//! ocs.groups().create("editors").await?;
//! ocs.users().add_to_group("alice", "editors").await?;
//! let enabled = ocs.apps().is_enabled("calendar").await?;
//! # let _ = enabled;
//! # Ok(())
//! # }
//! ```

pub mod apps;
pub mod client;
pub mod envelope;
pub mod error;
pub mod groups;
pub mod retry;
pub mod session;
pub mod sharing;
pub mod transport;
pub mod types;
pub mod users;

#[cfg(test)]
pub(crate) mod testing;

pub use apps::{AppError, Apps};
pub use client::{Api, OcsClient};
pub use envelope::{Envelope, OcsReply};
pub use error::{DecodeError, MappingError, OcsError, Rejection};
pub use groups::{GroupError, Groups};
pub use retry::RetryExecutor;
pub use session::{Credentials, Session};
pub use sharing::{share_download_url, share_url, ShareError, Shares};
pub use transport::{HttpExecutor, HttpRequest, RawResponse, ReqwestExecutor};
pub use types::*;
pub use users::{UserError, Users};
