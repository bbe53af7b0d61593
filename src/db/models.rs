//! Versioned row shapes.
//!
//! If a table changes, copy its struct here as the next revision (e.g.
//! `CloudOperationV2`) with the same `TABLE_NAME`, register it in
//! [`SchemaRegistry::builtin`](crate::db::SchemaRegistry::builtin) and keep
//! the previous revision around for the migration path.

use crate::db::blob::DetailBlob;
use crate::db::schema::{Column, ColumnKind, VersionedTable};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Auto id, timestamps and soft-delete marker shared by most tables.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct Model {
    pub id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Model {
    /// Header for a row that has not been inserted yet.
    pub fn new_at(now: DateTime<Utc>) -> Self {
        Self {
            id: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

const MODEL_ID: Column = Column::new("id", ColumnKind::AutoId);
const STRING_ID: Column = Column::new("id", ColumnKind::StringKey);
const CREATED_AT: Column = Column::new("created_at", ColumnKind::Timestamp);
const UPDATED_AT: Column = Column::new("updated_at", ColumnKind::Timestamp);
const DELETED_AT: Column = Column::nullable("deleted_at", ColumnKind::Timestamp);

const fn varchar(name: &'static str) -> Column {
    Column::new(name, ColumnKind::Varchar)
}

const fn text(name: &'static str) -> Column {
    Column::new(name, ColumnKind::Text)
}

/// Credentials returned to users after binding to a service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct ServiceBindingCredentialsV1 {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub model: Model,
    pub other_details: DetailBlob,
    pub service_id: String,
    pub service_instance_id: String,
    pub binding_id: String,
}

impl VersionedTable for ServiceBindingCredentialsV1 {
    const TABLE_NAME: &'static str = "service_binding_credentials";
    const REVISION: u32 = 1;
    const COLUMNS: &'static [Column] = &[
        MODEL_ID,
        CREATED_AT,
        UPDATED_AT,
        DELETED_AT,
        text("other_details"),
        varchar("service_id"),
        varchar("service_instance_id"),
        varchar("binding_id"),
    ];
}

/// Provisioned service instances. The id is supplied by the platform.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct ServiceInstanceDetailsV1 {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,

    pub name: String,
    pub location: String,
    pub url: String,
    pub other_details: DetailBlob,

    pub service_id: String,
    pub plan_id: String,
    pub space_guid: String,
    pub organization_guid: String,
}

impl VersionedTable for ServiceInstanceDetailsV1 {
    const TABLE_NAME: &'static str = "service_instance_details";
    const REVISION: u32 = 1;
    const COLUMNS: &'static [Column] = &[
        STRING_ID,
        CREATED_AT,
        UPDATED_AT,
        DELETED_AT,
        varchar("name"),
        varchar("location"),
        varchar("url"),
        text("other_details"),
        varchar("service_id"),
        varchar("plan_id"),
        varchar("space_guid"),
        varchar("organization_guid"),
    ];
}

/// User-defined parameters passed to a provision call.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct ProvisionRequestDetailsV1 {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub model: Model,
    pub service_instance_id: String,
    /// JSON of the provision request parameters.
    pub request_details: DetailBlob,
}

impl VersionedTable for ProvisionRequestDetailsV1 {
    const TABLE_NAME: &'static str = "provision_request_details";
    const REVISION: u32 = 1;
    const COLUMNS: &'static [Column] = &[
        MODEL_ID,
        CREATED_AT,
        UPDATED_AT,
        DELETED_AT,
        varchar("service_instance_id"),
        text("request_details"),
    ];
}

/// The `migrations` table: the latest applied schema revision.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct MigrationV1 {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub model: Model,
    pub migration_id: i32,
}

impl VersionedTable for MigrationV1 {
    const TABLE_NAME: &'static str = "migrations";
    const REVISION: u32 = 1;
    const COLUMNS: &'static [Column] = &[
        MODEL_ID,
        CREATED_AT,
        UPDATED_AT,
        DELETED_AT,
        Column::new("migration_id", ColumnKind::Integer),
    ];
}

/// Status of a long-running cloud operation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct CloudOperationV1 {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub model: Model,

    pub name: String,
    pub status: String,
    pub operation_type: String,
    pub error_message: String,
    pub insert_time: String,
    pub start_time: String,
    pub target_id: String,
    pub target_link: String,

    pub service_id: String,
    pub service_instance_id: String,
}

impl VersionedTable for CloudOperationV1 {
    const TABLE_NAME: &'static str = "cloud_operations";
    const REVISION: u32 = 1;
    const COLUMNS: &'static [Column] = &[
        MODEL_ID,
        CREATED_AT,
        UPDATED_AT,
        DELETED_AT,
        varchar("name"),
        varchar("status"),
        varchar("operation_type"),
        text("error_message"),
        varchar("insert_time"),
        varchar("start_time"),
        varchar("target_id"),
        varchar("target_link"),
        varchar("service_id"),
        varchar("service_instance_id"),
    ];
}

/// Plans now come from the environment. Kept for migrations and for exporting
/// plans written by older brokers; nothing writes new rows.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, FromRow)]
pub struct PlanDetailsV1 {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,

    pub service_id: String,
    pub name: String,
    pub features: DetailBlob,
}

impl VersionedTable for PlanDetailsV1 {
    const TABLE_NAME: &'static str = "plan_details";
    const REVISION: u32 = 1;
    const DEPRECATED: bool = true;
    const COLUMNS: &'static [Column] = &[
        STRING_ID,
        CREATED_AT,
        UPDATED_AT,
        DELETED_AT,
        varchar("service_id"),
        varchar("name"),
        text("features"),
    ];
}
