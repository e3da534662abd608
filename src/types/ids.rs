use super::{ServerUrl, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// File name of an input image, used as the per-server cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKey(String);

impl ItemKey {
    pub fn new(key: impl Into<String>) -> Result<Self, ValidationError> {
        let key = key.into();

        if key.is_empty() {
            return Err(ValidationError::EmptyField("item key"));
        }

        if key.contains('/') || key.contains('\\') {
            return Err(ValidationError::InvalidItemKey {
                key,
                reason: "Item key must be a bare file name".to_string(),
            });
        }

        Ok(Self(key))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Partition key of the import cache for one server.
///
/// Derived as a name-based (v3) UUID of the server URL in the OID namespace,
/// so the same address always lands in the same partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ServerIdentity(String);

impl ServerIdentity {
    pub fn for_server(url: &ServerUrl) -> Self {
        Self::from_address(url.as_str())
    }

    pub fn from_address(address: &str) -> Self {
        let uuid = Uuid::new_v3(&Uuid::NAMESPACE_OID, address.as_bytes());
        Self(uuid.hyphenated().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServerIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
