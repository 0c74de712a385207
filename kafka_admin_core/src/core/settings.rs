//! Validation of a [`ClusterProfile`] into typed connection settings.
//!
//! Everything here runs before any network activity. The only I/O is opening
//! the truststore / keystore files to prove they are readable.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};

use crate::core::errors::AdminError;
use crate::storage::profile::{keys, ClusterProfile};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecurityProtocol {
    Plaintext,
    SaslPlaintext,
    SaslSsl,
    Ssl,
}

impl SecurityProtocol {
    pub const ALL: [SecurityProtocol; 4] = [
        SecurityProtocol::Plaintext,
        SecurityProtocol::SaslPlaintext,
        SecurityProtocol::SaslSsl,
        SecurityProtocol::Ssl,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityProtocol::Plaintext => "PLAINTEXT",
            SecurityProtocol::SaslPlaintext => "SASL_PLAINTEXT",
            SecurityProtocol::SaslSsl => "SASL_SSL",
            SecurityProtocol::Ssl => "SSL",
        }
    }

    /// Parses a protocol name, ignoring case. Empty means `PLAINTEXT`.
    pub fn parse(value: &str) -> Result<Self, AdminError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(SecurityProtocol::Plaintext);
        }
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(value))
            .ok_or_else(|| {
                AdminError::validation(
                    keys::SECURITY_PROTOCOL,
                    format!("unsupported protocol '{value}'"),
                )
            })
    }

    pub fn is_sasl(&self) -> bool {
        matches!(self, SecurityProtocol::SaslPlaintext | SecurityProtocol::SaslSsl)
    }

    pub fn is_ssl(&self) -> bool {
        matches!(self, SecurityProtocol::SaslSsl | SecurityProtocol::Ssl)
    }
}

impl fmt::Display for SecurityProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaslMechanism {
    Plain,
    ScramSha256,
    ScramSha512,
}

impl SaslMechanism {
    pub fn as_str(&self) -> &'static str {
        match self {
            SaslMechanism::Plain => "PLAIN",
            SaslMechanism::ScramSha256 => "SCRAM-SHA-256",
            SaslMechanism::ScramSha512 => "SCRAM-SHA-512",
        }
    }

    /// Empty means `PLAIN`.
    pub fn parse(value: &str) -> Result<Self, AdminError> {
        let value = value.trim();
        if value.is_empty() {
            return Ok(SaslMechanism::Plain);
        }
        [
            SaslMechanism::Plain,
            SaslMechanism::ScramSha256,
            SaslMechanism::ScramSha512,
        ]
        .into_iter()
        .find(|m| m.as_str().eq_ignore_ascii_case(value))
        .ok_or_else(|| {
            AdminError::validation(
                keys::SASL_MECHANISM,
                format!("unsupported mechanism '{value}'"),
            )
        })
    }

    fn login_module(&self) -> &'static str {
        match self {
            SaslMechanism::Plain => "org.apache.kafka.common.security.plain.PlainLoginModule",
            SaslMechanism::ScramSha256 | SaslMechanism::ScramSha512 => {
                "org.apache.kafka.common.security.scram.ScramLoginModule"
            }
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct SaslCredentials {
    pub mechanism: SaslMechanism,
    pub username: String,
    pub password: String,
}

impl SaslCredentials {
    /// The login line the cluster client expects in `sasl.jaas.config`.
    pub fn jaas_config(&self) -> String {
        format!(
            "{} required username=\"{}\" password=\"{}\";",
            self.mechanism.login_module(),
            self.username,
            self.password
        )
    }
}

impl fmt::Debug for SaslCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SaslCredentials")
            .field("mechanism", &self.mechanism)
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct TlsSettings {
    pub truststore_location: PathBuf,
    pub truststore_password: Option<String>,
    pub keystore_location: Option<PathBuf>,
    pub keystore_password: Option<String>,
}

impl fmt::Debug for TlsSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsSettings")
            .field("truststore_location", &self.truststore_location)
            .field("keystore_location", &self.keystore_location)
            .finish_non_exhaustive()
    }
}

/// A profile that passed validation and is ready to be handed to the Admin API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionSettings {
    pub bootstrap_servers: String,
    pub protocol: SecurityProtocol,
    pub sasl: Option<SaslCredentials>,
    pub tls: Option<TlsSettings>,
    /// Properties this layer does not interpret, passed through untouched.
    pub extra: BTreeMap<String, String>,
}

const MANAGED_KEYS: [&str; 10] = [
    keys::BOOTSTRAP_SERVERS,
    keys::SECURITY_PROTOCOL,
    keys::SASL_MECHANISM,
    keys::SASL_USERNAME,
    keys::SASL_PASSWORD,
    keys::SASL_JAAS_CONFIG,
    keys::SSL_TRUSTSTORE_LOCATION,
    keys::SSL_TRUSTSTORE_PASSWORD,
    keys::SSL_KEYSTORE_LOCATION,
    keys::SSL_KEYSTORE_PASSWORD,
];

impl ConnectionSettings {
    pub fn from_profile(profile: &ClusterProfile) -> Result<Self, AdminError> {
        let bootstrap_servers = non_empty(profile, keys::BOOTSTRAP_SERVERS)
            .ok_or_else(|| AdminError::validation(keys::BOOTSTRAP_SERVERS, "must not be empty"))?;

        let protocol =
            SecurityProtocol::parse(profile.property(keys::SECURITY_PROTOCOL).unwrap_or(""))?;

        let sasl = if protocol.is_sasl() {
            let mechanism =
                SaslMechanism::parse(profile.property(keys::SASL_MECHANISM).unwrap_or(""))?;
            let username = non_empty(profile, keys::SASL_USERNAME).ok_or_else(|| {
                AdminError::validation(keys::SASL_USERNAME, format!("required for {protocol}"))
            })?;
            let password = non_empty(profile, keys::SASL_PASSWORD).ok_or_else(|| {
                AdminError::validation(keys::SASL_PASSWORD, format!("required for {protocol}"))
            })?;
            Some(SaslCredentials {
                mechanism,
                username,
                password,
            })
        } else {
            None
        };

        let tls = if protocol.is_ssl() {
            let truststore_location = non_empty(profile, keys::SSL_TRUSTSTORE_LOCATION)
                .map(PathBuf::from)
                .ok_or_else(|| {
                    AdminError::validation(
                        keys::SSL_TRUSTSTORE_LOCATION,
                        format!("required for {protocol}"),
                    )
                })?;
            ensure_readable(keys::SSL_TRUSTSTORE_LOCATION, &truststore_location)?;

            let keystore_location = non_empty(profile, keys::SSL_KEYSTORE_LOCATION).map(PathBuf::from);
            if let Some(path) = &keystore_location {
                ensure_readable(keys::SSL_KEYSTORE_LOCATION, path)?;
            }

            Some(TlsSettings {
                truststore_location,
                truststore_password: non_empty(profile, keys::SSL_TRUSTSTORE_PASSWORD),
                keystore_location,
                keystore_password: non_empty(profile, keys::SSL_KEYSTORE_PASSWORD),
            })
        } else {
            None
        };

        let extra = profile
            .properties
            .iter()
            .filter(|(k, _)| !MANAGED_KEYS.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        Ok(Self {
            bootstrap_servers,
            protocol,
            sasl,
            tls,
            extra,
        })
    }

    /// The property map handed to `AdminApi::open`.
    pub fn to_properties(&self) -> BTreeMap<String, String> {
        let mut props = self.extra.clone();
        props.insert(keys::BOOTSTRAP_SERVERS.into(), self.bootstrap_servers.clone());
        props.insert(keys::SECURITY_PROTOCOL.into(), self.protocol.as_str().into());

        if let Some(sasl) = &self.sasl {
            props.insert(keys::SASL_MECHANISM.into(), sasl.mechanism.as_str().into());
            props.insert(keys::SASL_JAAS_CONFIG.into(), sasl.jaas_config());
        }

        if let Some(tls) = &self.tls {
            props.insert(
                keys::SSL_TRUSTSTORE_LOCATION.into(),
                tls.truststore_location.display().to_string(),
            );
            if let Some(pw) = &tls.truststore_password {
                props.insert(keys::SSL_TRUSTSTORE_PASSWORD.into(), pw.clone());
            }
            if let Some(path) = &tls.keystore_location {
                props.insert(keys::SSL_KEYSTORE_LOCATION.into(), path.display().to_string());
            }
            if let Some(pw) = &tls.keystore_password {
                props.insert(keys::SSL_KEYSTORE_PASSWORD.into(), pw.clone());
            }
        }
        props
    }
}

fn non_empty(profile: &ClusterProfile, key: &str) -> Option<String> {
    profile
        .property(key)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Opening alone is not enough: on Unix a directory opens fine.
fn ensure_readable(field: &str, path: &Path) -> Result<(), AdminError> {
    let cannot_open =
        |e: std::io::Error| AdminError::validation(field, format!("cannot open {}: {e}", path.display()));
    let file = File::open(path).map_err(cannot_open)?;
    if !file.metadata().map_err(cannot_open)?.is_file() {
        return Err(AdminError::validation(
            field,
            format!("{} is not a regular file", path.display()),
        ));
    }
    Ok(())
}
