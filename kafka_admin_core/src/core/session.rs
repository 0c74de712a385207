use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use log::debug;

use crate::admin::{
    AclBinding, AdminClient, ApiError, ClusterNode, ConfigEntry, NewTopic, PartitionInfo,
    TopicSummary,
};
use crate::core::errors::AdminError;

/// The live client plus the profile it was opened from.
struct Session {
    profile_id: String,
    profile_name: String,
    client: Box<dyn AdminClient>,
    closed: AtomicBool,
}

/// An opaque handle to the session currently owned by the `ConnectionManager`.
///
/// Cloning only bumps a reference count. Once the manager closes the session
/// (disconnect, reconnect, profile removal, shutdown) every clone answers
/// [`AdminError::NotConnected`], so a handle kept across a reconnect can never
/// reach the old client.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<Session>,
}

impl SessionHandle {
    pub(crate) fn new(
        profile_id: impl Into<String>,
        profile_name: impl Into<String>,
        client: Box<dyn AdminClient>,
    ) -> Self {
        Self {
            inner: Arc::new(Session {
                profile_id: profile_id.into(),
                profile_name: profile_name.into(),
                client,
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn profile_id(&self) -> &str {
        &self.inner.profile_id
    }

    pub fn profile_name(&self) -> &str {
        &self.inner.profile_name
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// True if both handles refer to the same session.
    pub fn same_session(&self, other: &SessionHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Marks the session closed and closes the client. Only the first call
    /// reaches the Admin API.
    pub(crate) async fn close(&self) -> Result<(), ApiError> {
        if self.inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        debug!("Closing session for profile '{}'", self.inner.profile_id);
        self.inner.client.close().await
    }

    fn client(&self) -> Result<&dyn AdminClient, AdminError> {
        if self.is_closed() {
            return Err(AdminError::NotConnected);
        }
        Ok(self.inner.client.as_ref())
    }

    pub async fn list_cluster_nodes(&self) -> Result<Vec<ClusterNode>, AdminError> {
        self.client()?
            .list_cluster_nodes()
            .await
            .map_err(|e| AdminError::operation("list cluster nodes", e))
    }

    pub async fn list_topics(&self) -> Result<Vec<TopicSummary>, AdminError> {
        self.client()?
            .list_topics()
            .await
            .map_err(|e| AdminError::operation("list topics", e))
    }

    pub async fn describe_topic(&self, name: &str) -> Result<Vec<PartitionInfo>, AdminError> {
        self.client()?
            .describe_topic(name)
            .await
            .map_err(|e| AdminError::operation("describe topic", e))
    }

    pub async fn describe_topic_config(&self, name: &str) -> Result<Vec<ConfigEntry>, AdminError> {
        self.client()?
            .describe_topic_config(name)
            .await
            .map_err(|e| AdminError::operation("describe topic config", e))
    }

    pub async fn alter_topic_config(
        &self,
        name: &str,
        changes: &BTreeMap<String, String>,
    ) -> Result<(), AdminError> {
        self.client()?
            .alter_topic_config(name, changes)
            .await
            .map_err(|e| AdminError::operation("alter topic config", e))
    }

    pub async fn create_topic(&self, topic: &NewTopic) -> Result<(), AdminError> {
        if topic.name.trim().is_empty() {
            return Err(AdminError::validation("topic name", "must not be empty"));
        }
        self.client()?
            .create_topic(topic)
            .await
            .map_err(|e| AdminError::operation("create topic", e))
    }

    pub async fn delete_topic(&self, name: &str) -> Result<(), AdminError> {
        self.client()?
            .delete_topic(name)
            .await
            .map_err(|e| AdminError::operation("delete topic", e))
    }

    pub async fn describe_acls(&self) -> Result<Vec<AclBinding>, AdminError> {
        self.client()?
            .describe_acls()
            .await
            .map_err(|e| AdminError::operation("describe ACLs", e))
    }

    pub async fn create_acls(&self, bindings: &[AclBinding]) -> Result<(), AdminError> {
        self.client()?
            .create_acls(bindings)
            .await
            .map_err(|e| AdminError::operation("create ACLs", e))
    }

    pub async fn delete_acls(&self, bindings: &[AclBinding]) -> Result<(), AdminError> {
        if bindings.is_empty() {
            return Ok(());
        }
        self.client()?
            .delete_acls(bindings)
            .await
            .map_err(|e| AdminError::operation("delete ACLs", e))
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("profile_id", &self.inner.profile_id)
            .field("profile_name", &self.inner.profile_name)
            .field("closed", &self.is_closed())
            .finish()
    }
}
