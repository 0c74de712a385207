use std::collections::BTreeMap;

use async_trait::async_trait;

use super::errors::ApiError;
use super::types::{
    AclBinding, ClusterNode, ConfigEntry, NewTopic, PartitionInfo, TopicSummary,
};

/// Entry point of the Cluster Admin API: turns connection properties into a
/// live client.
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn open(
        &self,
        properties: &BTreeMap<String, String>,
    ) -> Result<Box<dyn AdminClient>, ApiError>;
}

/// One open administrative client.
///
/// Every method takes `&self` so a client can serve concurrent fetches; only
/// the `ConnectionManager` ever calls `close`.
#[async_trait]
pub trait AdminClient: Send + Sync {
    async fn close(&self) -> Result<(), ApiError>;

    /// Cluster-membership query, also used as the liveness probe.
    async fn list_cluster_nodes(&self) -> Result<Vec<ClusterNode>, ApiError>;

    async fn list_topics(&self) -> Result<Vec<TopicSummary>, ApiError>;
    async fn describe_topic(&self, name: &str) -> Result<Vec<PartitionInfo>, ApiError>;
    async fn describe_topic_config(&self, name: &str) -> Result<Vec<ConfigEntry>, ApiError>;
    async fn alter_topic_config(
        &self,
        name: &str,
        changes: &BTreeMap<String, String>,
    ) -> Result<(), ApiError>;
    async fn create_topic(&self, topic: &NewTopic) -> Result<(), ApiError>;
    async fn delete_topic(&self, name: &str) -> Result<(), ApiError>;

    async fn describe_acls(&self) -> Result<Vec<AclBinding>, ApiError>;
    async fn create_acls(&self, bindings: &[AclBinding]) -> Result<(), ApiError>;
    async fn delete_acls(&self, bindings: &[AclBinding]) -> Result<(), ApiError>;
}
