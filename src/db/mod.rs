//! Database module: versioned row shapes and the migration counter.
//!
//! Layout:
//! - `models.rs`: one Rust struct per table revision
//! - `schema.rs`: column layouts and SQLite DDL
//! - `registry.rs`: (table, revision) lookup with the additive-only rule
//! - `migration.rs`: the `migrations` counter (SQLite)
//! - `blob.rs`: opaque serialized detail fields

pub mod blob;
pub mod migration;
pub mod models;
pub mod registry;
pub mod schema;

pub use blob::DetailBlob;
pub use migration::{MigrationCounter, SqlitePool};
pub use registry::SchemaRegistry;
pub use schema::{Column, ColumnKind, TableLayout, VersionedTable, table_name};
