//! Backing database discovery from the platform's `VCAP_SERVICES` variable.

pub mod descriptor;
pub mod resolver;

pub use descriptor::ServiceDescriptor;
pub use resolver::{
    GCP_TAG, MYSQL_TAG, ResolvedDatabase, TlsMaterial, VCAP_SERVICES, parse_vcap_services,
    resolve, select_by_tag, use_vcap_services,
};
