use broker_db::BrokerDbError;
use broker_db::db::models::{
    CloudOperationV1, MigrationV1, PlanDetailsV1, ProvisionRequestDetailsV1,
    ServiceBindingCredentialsV1, ServiceInstanceDetailsV1,
};
use broker_db::db::schema::sqlite_init;
use broker_db::db::{Column, ColumnKind, DetailBlob, SchemaRegistry, VersionedTable, table_name};
use serde::{Deserialize, Serialize};

/// A hypothetical next revision that adds one column.
struct CloudOperationV2;

impl VersionedTable for CloudOperationV2 {
    const TABLE_NAME: &'static str = "cloud_operations";
    const REVISION: u32 = 2;
    const COLUMNS: &'static [Column] = &[
        Column::new("id", ColumnKind::AutoId),
        Column::new("created_at", ColumnKind::Timestamp),
        Column::new("updated_at", ColumnKind::Timestamp),
        Column::nullable("deleted_at", ColumnKind::Timestamp),
        Column::new("name", ColumnKind::Varchar),
        Column::new("status", ColumnKind::Varchar),
        Column::new("operation_type", ColumnKind::Varchar),
        Column::new("error_message", ColumnKind::Text),
        Column::new("insert_time", ColumnKind::Varchar),
        Column::new("start_time", ColumnKind::Varchar),
        Column::new("target_id", ColumnKind::Varchar),
        Column::new("target_link", ColumnKind::Varchar),
        Column::new("service_id", ColumnKind::Varchar),
        Column::new("service_instance_id", ColumnKind::Varchar),
        Column::nullable("zone", ColumnKind::Varchar),
    ];
}

/// A broken next revision that drops `error_message`.
struct CloudOperationDropsColumn;

impl VersionedTable for CloudOperationDropsColumn {
    const TABLE_NAME: &'static str = "cloud_operations";
    const REVISION: u32 = 2;
    const COLUMNS: &'static [Column] = &[
        Column::new("id", ColumnKind::AutoId),
        Column::new("created_at", ColumnKind::Timestamp),
        Column::new("updated_at", ColumnKind::Timestamp),
        Column::nullable("deleted_at", ColumnKind::Timestamp),
        Column::new("name", ColumnKind::Varchar),
    ];
}

#[test]
fn storage_names_match_the_persisted_tables() {
    assert_eq!(
        table_name::<ServiceBindingCredentialsV1>(),
        "service_binding_credentials"
    );
    assert_eq!(
        table_name::<ServiceInstanceDetailsV1>(),
        "service_instance_details"
    );
    assert_eq!(
        table_name::<ProvisionRequestDetailsV1>(),
        "provision_request_details"
    );
    assert_eq!(table_name::<MigrationV1>(), "migrations");
    assert_eq!(table_name::<CloudOperationV1>(), "cloud_operations");
    assert_eq!(table_name::<PlanDetailsV1>(), "plan_details");
}

#[test]
fn builtin_registry_holds_every_first_revision() {
    let registry = SchemaRegistry::builtin().expect("builtin registry");
    let tables: Vec<_> = registry.tables().collect();

    assert_eq!(tables.len(), 6);
    for table in tables {
        assert_eq!(registry.revisions(table), vec![1], "{table}");
    }
    let layout = registry
        .layout("service_instance_details", 1)
        .expect("rev 1 registered");
    assert!(layout.type_name.ends_with("ServiceInstanceDetailsV1"));
    assert!(layout.column("id").is_some_and(|c| c.kind == ColumnKind::StringKey));
}

#[test]
fn new_revision_keeps_the_storage_name_and_old_layout() {
    let mut registry = SchemaRegistry::builtin().expect("builtin registry");
    registry
        .register::<CloudOperationV2>()
        .expect("additive revision");

    assert_eq!(table_name::<CloudOperationV2>(), table_name::<CloudOperationV1>());
    assert_eq!(registry.revisions("cloud_operations"), vec![1, 2]);

    let latest = registry.latest("cloud_operations").expect("latest");
    assert_eq!(latest.revision, 2);
    assert!(latest.column("zone").is_some());

    let v1 = registry.layout("cloud_operations", 1).expect("rev 1 still readable");
    assert!(v1.column("zone").is_none());
    assert_eq!(registry.tables().count(), 6);
}

#[test]
fn non_additive_revision_is_rejected() {
    let mut registry = SchemaRegistry::builtin().expect("builtin registry");
    let err = registry
        .register::<CloudOperationDropsColumn>()
        .expect_err("drops columns");

    assert!(matches!(
        err,
        BrokerDbError::NonAdditiveRevision {
            table: "cloud_operations",
            revision: 2,
            previous: 1,
            column: "status",
        }
    ));
    assert_eq!(registry.revisions("cloud_operations"), vec![1]);
}

#[test]
fn duplicate_and_stale_revisions_are_rejected() {
    let mut registry = SchemaRegistry::builtin().expect("builtin registry");
    let err = registry
        .register::<MigrationV1>()
        .expect_err("already registered");
    assert!(matches!(
        err,
        BrokerDbError::DuplicateRevision {
            table: "migrations",
            revision: 1
        }
    ));

    let mut registry = SchemaRegistry::new();
    registry.register::<CloudOperationV2>().expect("first revision");
    let err = registry
        .register::<CloudOperationV1>()
        .expect_err("older than latest");
    assert!(matches!(
        err,
        BrokerDbError::StaleRevision {
            revision: 1,
            latest: 2,
            ..
        }
    ));
}

#[test]
fn deprecated_plan_details_is_not_writable() {
    let registry = SchemaRegistry::builtin().expect("builtin registry");
    let writable: Vec<_> = registry.writable_tables().collect();

    assert!(PlanDetailsV1::DEPRECATED);
    assert!(!writable.contains(&"plan_details"));
    assert!(writable.contains(&"migrations"));
    assert_eq!(writable.len(), 5);
}

#[test]
fn ddl_uses_storage_names_and_key_kinds() {
    let registry = SchemaRegistry::builtin().expect("builtin registry");
    let ddl = sqlite_init(&registry);

    assert!(ddl.contains("CREATE TABLE IF NOT EXISTS service_instance_details ("));
    assert!(ddl.contains("id VARCHAR(255) NOT NULL PRIMARY KEY"));
    assert!(ddl.contains("CREATE TABLE IF NOT EXISTS migrations ("));
    assert!(ddl.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
    assert!(ddl.contains("deleted_at DATETIME NULL"));
    assert!(ddl.contains("idx_cloud_operations_deleted_at"));
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct ProvisionParams {
    tier: String,
    replicas: u8,
}

#[test]
fn detail_blob_decodes_what_the_owner_encoded() {
    let params = ProvisionParams {
        tier: "db-n1-standard-1".to_string(),
        replicas: 2,
    };
    let blob = DetailBlob::encode(&params).expect("encode");
    assert!(blob.as_str().contains("\"replicas\":2"));

    let back: ProvisionParams = blob.decode().expect("decode");
    assert_eq!(back, params);

    let err = DetailBlob::from_raw("{").decode::<ProvisionParams>();
    assert!(matches!(err, Err(BrokerDbError::Blob(_))));
}
