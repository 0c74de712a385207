//! Resource records exchanged with the Cluster Admin API.
//!
//! The enumerations mirror the broker's ACL vocabulary. Each carries an `Any`
//! variant, which the filter engine treats as "no constraint".

use std::collections::BTreeMap;
use std::fmt;

/// Declares a closed, upper-case-named enumeration with `as_str`,
/// `ALL` and `Display`.
macro_rules! kafka_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

kafka_enum!(
    /// Operation an ACL entry grants or denies.
    AclOperation {
        Any => "ANY",
        All => "ALL",
        Read => "READ",
        Write => "WRITE",
        Create => "CREATE",
        Delete => "DELETE",
        Alter => "ALTER",
        Describe => "DESCRIBE",
        ClusterAction => "CLUSTER_ACTION",
        DescribeConfigs => "DESCRIBE_CONFIGS",
        AlterConfigs => "ALTER_CONFIGS",
        IdempotentWrite => "IDEMPOTENT_WRITE",
        CreateTokens => "CREATE_TOKENS",
        DescribeTokens => "DESCRIBE_TOKENS",
    }
);

kafka_enum!(
    AclPermissionType {
        Any => "ANY",
        Deny => "DENY",
        Allow => "ALLOW",
    }
);

kafka_enum!(
    ResourceType {
        Any => "ANY",
        Topic => "TOPIC",
        Group => "GROUP",
        Cluster => "CLUSTER",
        TransactionalId => "TRANSACTIONAL_ID",
        DelegationToken => "DELEGATION_TOKEN",
        User => "USER",
    }
);

kafka_enum!(
    /// How `resource_name` is matched by the broker.
    PatternType {
        Any => "ANY",
        Match => "MATCH",
        Literal => "LITERAL",
        Prefixed => "PREFIXED",
    }
);

/// One broker as reported by the cluster-membership query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterNode {
    pub id: i32,
    pub host: String,
    pub port: u16,
    pub rack: Option<String>,
}

/// One row of the topic listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicSummary {
    pub name: String,
    pub partitions: usize,
    /// Replica count of the first partition, 0 for a topic without partitions.
    pub replication_factor: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionInfo {
    pub partition: i32,
    pub leader: Option<i32>,
    pub replicas: Vec<i32>,
    pub in_sync_replicas: Vec<i32>,
}

/// Request to create a topic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTopic {
    pub name: String,
    pub partitions: i32,
    pub replication_factor: i16,
    pub configs: BTreeMap<String, String>,
}

impl NewTopic {
    pub fn new(name: impl Into<String>, partitions: i32, replication_factor: i16) -> Self {
        Self {
            name: name.into(),
            partitions,
            replication_factor,
            configs: BTreeMap::new(),
        }
    }
}

/// A topic configuration value. `value` is `None` for unset sensitive entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigEntry {
    pub name: String,
    pub value: Option<String>,
    pub is_default: bool,
    pub read_only: bool,
}

/// An access-control entry bound to a resource pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AclBinding {
    pub principal: String,
    pub host: String,
    pub operation: AclOperation,
    pub permission: AclPermissionType,
    pub resource_type: ResourceType,
    pub resource_name: String,
    pub pattern_type: PatternType,
}
