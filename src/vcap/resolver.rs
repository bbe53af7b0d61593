use crate::config::{
    ConfigStore, DB_CA_CERT, DB_CLIENT_CERT, DB_CLIENT_KEY, DB_HOST, DB_NAME, DB_PASSWORD,
    DB_PATH, DB_TYPE, DB_USER, DbType,
};
use crate::error::{ParseStage, VcapError};
use crate::vcap::descriptor::ServiceDescriptor;
use percent_encoding::percent_decode_str;
use serde_json::Value;
use std::collections::BTreeMap;
use std::env::{self, VarError};
use std::fmt;
use tracing::{debug, info, warn};
use url::Url;

pub const VCAP_SERVICES: &str = "VCAP_SERVICES";
/// Tag that marks the broker's own database among the bindings.
pub const MYSQL_TAG: &str = "mysql";
/// Bindings created by the GCP broker carry client TLS material.
pub const GCP_TAG: &str = "gcp";

const CA_CERT_KEY: &str = "CaCert";
const CLIENT_CERT_KEY: &str = "ClientCert";
const CLIENT_KEY_KEY: &str = "ClientKey";

/// Resolve the database from `VCAP_SERVICES` if the variable is set.
///
/// Returns `Ok(None)` without touching `store` when it is absent; static
/// configuration applies in that case.
pub fn use_vcap_services(
    store: &mut impl ConfigStore,
) -> Result<Option<ResolvedDatabase>, VcapError> {
    let payload = match env::var(VCAP_SERVICES) {
        Ok(payload) => Some(payload),
        Err(VarError::NotPresent) => None,
        Err(e @ VarError::NotUnicode(_)) => return Err(VcapError::parse(ParseStage::Payload, e)),
    };
    resolve(payload.as_deref(), store)
}

/// Parse `payload`, select the single `mysql` binding and publish it.
///
/// Nothing is written to `store` unless every step succeeds.
pub fn resolve(
    payload: Option<&str>,
    store: &mut impl ConfigStore,
) -> Result<Option<ResolvedDatabase>, VcapError> {
    let Some(payload) = payload else {
        debug!("{VCAP_SERVICES} not set; using static database configuration");
        return Ok(None);
    };

    let services = parse_vcap_services(payload)?;
    let service = select_by_tag(&services, MYSQL_TAG)?;
    let resolved = ResolvedDatabase::from_descriptor(service)?;

    info!(
        binding = %service.name,
        label = %service.label,
        host = %resolved.host,
        database = %resolved.name,
        tls = resolved.tls.is_some(),
        "Using MySQL database injected via VCAP_SERVICES environment variable"
    );
    resolved.publish(store);
    Ok(Some(resolved))
}

/// Flatten `{ label: [descriptor, ...], ... }` into one list.
pub fn parse_vcap_services(payload: &str) -> Result<Vec<ServiceDescriptor>, VcapError> {
    let by_label: BTreeMap<String, Value> =
        serde_json::from_str(payload).map_err(|e| VcapError::parse(ParseStage::Payload, e))?;

    by_label
        .into_iter()
        .try_fold(Vec::new(), |mut services, (label, raw)| {
            let batch: Vec<ServiceDescriptor> = serde_json::from_value(raw)
                .map_err(|e| VcapError::parse(ParseStage::Descriptors { label }, e))?;
            services.extend(batch);
            Ok(services)
        })
}

/// The one descriptor tagged `tag`. Zero or several matches are an error.
pub fn select_by_tag<'a>(
    services: &'a [ServiceDescriptor],
    tag: &'static str,
) -> Result<&'a ServiceDescriptor, VcapError> {
    let matches: Vec<&ServiceDescriptor> = services.iter().filter(|s| s.has_tag(tag)).collect();
    match matches.as_slice() {
        [only] => Ok(*only),
        _ => Err(VcapError::Selection {
            tag,
            count: matches.len(),
        }),
    }
}

/// Connection parameters extracted from the selected binding.
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedDatabase {
    /// Path component of the credentials URI.
    pub path: String,
    pub host: String,
    pub user: String,
    pub password: String,
    pub name: String,
    pub tls: Option<TlsMaterial>,
}

impl ResolvedDatabase {
    /// Build the connection parameters of `service`.
    ///
    /// The `uri` credential is required and must be absolute; a missing or
    /// relative URI is a parse error at [`ParseStage::CredentialsUri`].
    pub fn from_descriptor(service: &ServiceDescriptor) -> Result<Self, VcapError> {
        let uri = service.credential("uri").unwrap_or_default();
        let url = Url::parse(uri).map_err(|e| VcapError::parse(ParseStage::CredentialsUri, e))?;

        // explicit credential fields win, the URI fills the gaps
        let host = service
            .credential("host")
            .or_else(|| url.host_str())
            .unwrap_or_default()
            .to_string();
        let user = match service.credential("Username") {
            Some(user) => user.to_string(),
            None => decode_userinfo(url.username())?,
        };
        let password = match service.credential("Password") {
            Some(password) => password.to_string(),
            None => decode_userinfo(url.password().unwrap_or_default())?,
        };

        let tls = service
            .has_tag(GCP_TAG)
            .then(|| TlsMaterial::from_descriptor(service));

        Ok(Self {
            path: url.path().to_string(),
            host,
            user,
            password,
            name: service.credential("database_name").unwrap_or_default().to_string(),
            tls,
        })
    }

    pub fn publish(&self, store: &mut impl ConfigStore) {
        store.set(DB_PATH, self.path.clone());
        store.set(DB_TYPE, DbType::Mysql.as_str().to_string());
        store.set(DB_HOST, self.host.clone());
        store.set(DB_USER, self.user.clone());
        store.set(DB_PASSWORD, self.password.clone());
        store.set(DB_NAME, self.name.clone());

        if let Some(tls) = &self.tls {
            store.set(DB_CA_CERT, tls.ca_cert.clone());
            store.set(DB_CLIENT_CERT, tls.client_cert.clone());
            store.set(DB_CLIENT_KEY, tls.client_key.clone());
        }
    }
}

/// `url` keeps userinfo percent-encoded.
fn decode_userinfo(raw: &str) -> Result<String, VcapError> {
    percent_decode_str(raw)
        .decode_utf8()
        .map(|decoded| decoded.into_owned())
        .map_err(|e| VcapError::parse(ParseStage::CredentialsUri, e))
}

impl fmt::Debug for ResolvedDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedDatabase")
            .field("path", &self.path)
            .field("host", &self.host)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("name", &self.name)
            .field("tls", &self.tls)
            .finish()
    }
}

/// Client TLS material of a `gcp`-tagged binding.
#[derive(Clone, PartialEq, Eq)]
pub struct TlsMaterial {
    pub ca_cert: String,
    pub client_cert: String,
    pub client_key: String,
}

impl TlsMaterial {
    /// Missing fields become empty strings.
    fn from_descriptor(service: &ServiceDescriptor) -> Self {
        let missing: Vec<&str> = [CA_CERT_KEY, CLIENT_CERT_KEY, CLIENT_KEY_KEY]
            .into_iter()
            .filter(|key| service.credential(key).is_none())
            .collect();
        if !missing.is_empty() {
            warn!(
                binding = %service.name,
                missing = ?missing,
                "gcp-tagged binding lacks TLS credential fields; publishing them empty"
            );
        }

        let field = |key: &str| service.credential(key).unwrap_or_default().to_string();
        Self {
            ca_cert: field(CA_CERT_KEY),
            client_cert: field(CLIENT_CERT_KEY),
            client_key: field(CLIENT_KEY_KEY),
        }
    }
}

impl fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsMaterial")
            .field("ca_cert", &self.ca_cert.len())
            .field("client_cert", &self.client_cert.len())
            .field("client_key", &"<redacted>")
            .finish()
    }
}
