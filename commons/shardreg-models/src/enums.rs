use serde::{Deserialize, Serialize};

/// How documents are assigned to the shards of a floc.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ShardMethod {
    #[serde(rename = "MOD_ACL_ID")]
    ModAclId,
    #[serde(rename = "ACL_ID")]
    AclId,
    #[serde(rename = "DB_ID")]
    DbId,
    #[serde(rename = "DB_ID_RANGE")]
    DbIdRange,
    #[serde(rename = "DATE")]
    Date,
    #[serde(rename = "PROPERTY")]
    Property,
    #[serde(rename = "EXPLICIT_ID")]
    ExplicitId,
    #[serde(rename = "LAST_REGISTERED_INDEXING_SHARD")]
    LastRegisteredIndexingShard,
    #[serde(rename = "UNKNOWN")]
    Unknown,
}

impl Default for ShardMethod {
    fn default() -> Self {
        Self::ModAclId
    }
}

impl ShardMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShardMethod::ModAclId => "MOD_ACL_ID",
            ShardMethod::AclId => "ACL_ID",
            ShardMethod::DbId => "DB_ID",
            ShardMethod::DbIdRange => "DB_ID_RANGE",
            ShardMethod::Date => "DATE",
            ShardMethod::Property => "PROPERTY",
            ShardMethod::ExplicitId => "EXPLICIT_ID",
            ShardMethod::LastRegisteredIndexingShard => {
                "LAST_REGISTERED_INDEXING_SHARD"
            }
            ShardMethod::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for ShardMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
