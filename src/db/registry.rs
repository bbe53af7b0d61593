use crate::db::models::{
    CloudOperationV1, MigrationV1, PlanDetailsV1, ProvisionRequestDetailsV1,
    ServiceBindingCredentialsV1, ServiceInstanceDetailsV1,
};
use crate::db::schema::{TableLayout, VersionedTable};
use crate::error::BrokerDbError;
use std::collections::BTreeMap;

/// (storage name, revision) -> column layout.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    tables: BTreeMap<&'static str, BTreeMap<u32, TableLayout>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every revision this broker knows how to read.
    pub fn builtin() -> Result<Self, BrokerDbError> {
        let mut registry = Self::new();
        registry.register::<ServiceBindingCredentialsV1>()?;
        registry.register::<ServiceInstanceDetailsV1>()?;
        registry.register::<ProvisionRequestDetailsV1>()?;
        registry.register::<MigrationV1>()?;
        registry.register::<CloudOperationV1>()?;
        registry.register::<PlanDetailsV1>()?;
        Ok(registry)
    }

    /// Add a revision. It must be newer than every registered revision of the
    /// same table and keep all of the latest revision's columns unchanged.
    pub fn register<T: VersionedTable>(&mut self) -> Result<(), BrokerDbError> {
        let layout = T::layout();
        let revisions = self.tables.entry(layout.table).or_default();

        if revisions.contains_key(&layout.revision) {
            return Err(BrokerDbError::DuplicateRevision {
                table: layout.table,
                revision: layout.revision,
            });
        }
        if let Some((&latest, previous)) = revisions.last_key_value() {
            if layout.revision < latest {
                return Err(BrokerDbError::StaleRevision {
                    table: layout.table,
                    revision: layout.revision,
                    latest,
                });
            }
            if let Some(dropped) = previous
                .columns
                .iter()
                .find(|&col| layout.column(col.name) != Some(col))
            {
                return Err(BrokerDbError::NonAdditiveRevision {
                    table: layout.table,
                    revision: layout.revision,
                    previous: latest,
                    column: dropped.name,
                });
            }
        }

        revisions.insert(layout.revision, layout);
        Ok(())
    }

    pub fn layout(&self, table: &str, revision: u32) -> Option<&TableLayout> {
        self.tables.get(table)?.get(&revision)
    }

    pub fn latest(&self, table: &str) -> Option<&TableLayout> {
        self.tables
            .get(table)?
            .last_key_value()
            .map(|(_, layout)| layout)
    }

    pub fn revisions(&self, table: &str) -> Vec<u32> {
        self.tables
            .get(table)
            .map(|revs| revs.keys().copied().collect())
            .unwrap_or_default()
    }

    pub fn tables(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tables.keys().copied()
    }

    /// Tables whose latest revision still accepts new rows.
    pub fn writable_tables(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tables
            .iter()
            .filter(|(_, revs)| {
                revs.last_key_value()
                    .is_some_and(|(_, layout)| !layout.deprecated)
            })
            .map(|(table, _)| *table)
    }
}
