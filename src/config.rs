//! Layered configuration.
//!
//! Precedence, lowest first:
//! - built-in defaults
//! - `broker.toml` in the working directory
//! - `BROKER_`-prefixed environment variables (`BROKER_DB__HOST` -> `db.host`)
//! - [`ConfigOverrides`] published at startup (e.g. from `VCAP_SERVICES`)

use crate::error::BrokerDbError;
use figment::{
    Figment, Metadata, Profile, Provider,
    providers::{Env, Format, Serialized, Toml},
    value::{Dict, Map},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

pub const CONFIG_FILE: &str = "broker.toml";
pub const ENV_PREFIX: &str = "BROKER_";

pub const DB_PATH: &str = "db.path";
pub const DB_TYPE: &str = "db.type";
pub const DB_HOST: &str = "db.host";
pub const DB_USER: &str = "db.user";
pub const DB_PASSWORD: &str = "db.password";
pub const DB_NAME: &str = "db.name";
pub const DB_CA_CERT: &str = "db.ca_cert";
pub const DB_CLIENT_CERT: &str = "db.client_cert";
pub const DB_CLIENT_KEY: &str = "db.client_key";

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Database backend selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DbType {
    #[default]
    Mysql,
    Sqlite3,
}

impl DbType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DbType::Mysql => "mysql",
            DbType::Sqlite3 => "sqlite3",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    #[serde(rename = "type")]
    pub db_type: DbType,
    pub path: String,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub name: String,
    pub ca_cert: String,
    pub client_cert: String,
    pub client_key: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            db_type: DbType::Mysql,
            path: String::new(),
            host: "localhost".to_string(),
            port: 3306,
            user: String::new(),
            password: String::new(),
            name: "servicebroker".to_string(),
            ca_cert: String::new(),
            client_cert: String::new(),
            client_key: String::new(),
        }
    }
}

impl DatabaseConfig {
    /// Whether client TLS material was supplied.
    pub fn has_tls(&self) -> bool {
        !self.ca_cert.is_empty() || !self.client_cert.is_empty() || !self.client_key.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub loglevel: String,
    pub db: DatabaseConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            loglevel: "info".to_string(),
            db: DatabaseConfig::default(),
        }
    }
}

impl Config {
    /// Base figment without startup overrides.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn load(overrides: &ConfigOverrides) -> Result<Self, BrokerDbError> {
        Ok(Self::figment().merge(overrides.clone()).extract()?)
    }
}

/// Install the process-wide configuration. Allowed once.
pub fn install(cfg: Config) -> Result<&'static Config, BrokerDbError> {
    CONFIG
        .set(cfg)
        .map_err(|_| BrokerDbError::ConfigAlreadyInstalled)?;
    CONFIG.get().ok_or(BrokerDbError::ConfigAlreadyInstalled)
}

pub fn get() -> Option<&'static Config> {
    CONFIG.get()
}

/// Write side of the configuration store. Keys are the dotted paths above.
pub trait ConfigStore {
    fn set(&mut self, key: &'static str, value: String);
}

/// In-memory key/value overrides merged on top of every other source.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigOverrides {
    values: BTreeMap<&'static str, String>,
}

impl ConfigOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl ConfigStore for ConfigOverrides {
    fn set(&mut self, key: &'static str, value: String) {
        self.values.insert(key, value);
    }
}

impl Provider for ConfigOverrides {
    fn metadata(&self) -> Metadata {
        Metadata::named("startup overrides")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, figment::Error> {
        self.values
            .iter()
            .fold(Figment::new(), |fig, (key, value)| {
                fig.merge(Serialized::default(key, value))
            })
            .data()
    }
}
