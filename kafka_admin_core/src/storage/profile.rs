use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Well-known connection property keys.
pub mod keys {
    pub const BOOTSTRAP_SERVERS: &str = "bootstrap.servers";
    pub const SECURITY_PROTOCOL: &str = "security.protocol";
    pub const SASL_MECHANISM: &str = "sasl.mechanism";
    pub const SASL_USERNAME: &str = "sasl.username";
    pub const SASL_PASSWORD: &str = "sasl.password";
    pub const SASL_JAAS_CONFIG: &str = "sasl.jaas.config";
    pub const SSL_TRUSTSTORE_LOCATION: &str = "ssl.truststore.location";
    pub const SSL_TRUSTSTORE_PASSWORD: &str = "ssl.truststore.password";
    pub const SSL_KEYSTORE_LOCATION: &str = "ssl.keystore.location";
    pub const SSL_KEYSTORE_PASSWORD: &str = "ssl.keystore.password";
}

/// A user-named cluster connection preset.
///
/// JSON looks like:
/// `{ "id":"5f0c…", "name":"local", "properties":{ "bootstrap.servers":"localhost:9092" } }`
///
/// Passwords live in `properties` in plaintext, next to everything else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterProfile {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl ClusterProfile {
    /// A profile without an id; the store assigns one on `add`.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn bootstrap_servers(&self) -> Option<&str> {
        self.property(keys::BOOTSTRAP_SERVERS)
    }

    /// The configured protocol name, `PLAINTEXT` when unset.
    pub fn security_protocol(&self) -> &str {
        match self.property(keys::SECURITY_PROTOCOL) {
            Some(p) if !p.trim().is_empty() => p,
            _ => "PLAINTEXT",
        }
    }

    pub(crate) fn assign_id_if_missing(&mut self) {
        if self.id.trim().is_empty() {
            self.id = uuid::Uuid::new_v4().to_string();
        }
    }
}
