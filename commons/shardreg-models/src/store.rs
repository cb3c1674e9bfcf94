use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseStoreRefError {
    #[error("Invalid format. Expected '<protocol>://<identifier>'.")]
    InvalidFormat,
    #[error("empty protocol")]
    EmptyProtocol,
    #[error("empty identifier")]
    EmptyIdentifier,
}

/// Reference to a content store, written `protocol://identifier`.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct StoreRef {
    pub protocol: String,
    pub identifier: String,
}

impl StoreRef {
    pub const PROTOCOL_WORKSPACE: &'static str = "workspace";
    pub const PROTOCOL_ARCHIVE: &'static str = "archive";

    pub fn new(
        protocol: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            protocol: protocol.into(),
            identifier: identifier.into(),
        }
    }

    /// `workspace://SpacesStore`
    pub fn workspace_spaces_store() -> Self {
        Self::new(Self::PROTOCOL_WORKSPACE, "SpacesStore")
    }

    /// `archive://SpacesStore`
    pub fn archive_spaces_store() -> Self {
        Self::new(Self::PROTOCOL_ARCHIVE, "SpacesStore")
    }
}

impl fmt::Display for StoreRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}", self.protocol, self.identifier)
    }
}

impl FromStr for StoreRef {
    type Err = ParseStoreRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (protocol, identifier) = s
            .split_once("://")
            .ok_or(ParseStoreRefError::InvalidFormat)?;
        if protocol.is_empty() {
            return Err(ParseStoreRefError::EmptyProtocol);
        }
        if identifier.is_empty() {
            return Err(ParseStoreRefError::EmptyIdentifier);
        }
        Ok(StoreRef::new(protocol, identifier))
    }
}

impl TryFrom<String> for StoreRef {
    type Error = ParseStoreRefError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StoreRef> for String {
    fn from(value: StoreRef) -> Self {
        value.to_string()
    }
}
