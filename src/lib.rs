pub mod config;
pub mod db;
pub mod error;
pub mod vcap;

pub use config::{Config, ConfigOverrides, ConfigStore, DatabaseConfig, DbType};
pub use error::{BrokerDbError, ParseStage, VcapError};
pub use vcap::{ResolvedDatabase, ServiceDescriptor};
