use crate::error::BrokerDbError;
use serde::{Deserialize, Serialize, de::DeserializeOwned};

/// Opaque serialized domain object stored in a TEXT column.
///
/// Encoding contract: the owner of the value decides the type, the blob is
/// always its JSON serialization. This layer never looks inside.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(transparent)]
#[sqlx(transparent)]
pub struct DetailBlob(String);

impl DetailBlob {
    pub fn encode<T: Serialize>(value: &T) -> Result<Self, BrokerDbError> {
        Ok(Self(serde_json::to_string(value)?))
    }

    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, BrokerDbError> {
        Ok(serde_json::from_str(&self.0)?)
    }

    /// Wrap text that is already serialized, e.g. read back from an export.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}
