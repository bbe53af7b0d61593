use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

/// One service binding advertised by the platform in `VCAP_SERVICES`.
///
/// Missing and `null` fields both read as empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceDescriptor {
    /// Name the user gave the binding.
    #[serde(deserialize_with = "null_as_default")]
    pub binding_name: String,
    /// Name the user gave the service instance.
    #[serde(deserialize_with = "null_as_default")]
    pub instance_name: String,
    /// `binding_name` if set, otherwise `instance_name`.
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    /// Service offering.
    #[serde(deserialize_with = "null_as_default")]
    pub label: String,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub plan: String,
    /// Case-sensitive credential fields, e.g. `uri`, `Username`.
    #[serde(deserialize_with = "null_as_default")]
    pub credentials: HashMap<String, String>,
}

impl ServiceDescriptor {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    pub fn credential(&self, key: &str) -> Option<&str> {
        self.credentials.get(key).map(String::as_str)
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
