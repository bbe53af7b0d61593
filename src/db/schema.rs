//! Column layouts for the versioned tables and SQLite DDL rendering.
//!
//! Every persisted shape is a [`VersionedTable`]: a type bound to a fixed
//! storage name and a revision number. A schema change adds a new type with
//! the same `TABLE_NAME` and the next `REVISION`; the old type is kept so rows
//! written under it remain readable while a migration runs.

use crate::db::registry::SchemaRegistry;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    /// `INTEGER PRIMARY KEY AUTOINCREMENT`
    AutoId,
    /// Caller-supplied string primary key, `VARCHAR(255)`.
    StringKey,
    /// Short string, `VARCHAR(255)`.
    Varchar,
    /// Unbounded text (detail blobs, error messages).
    Text,
    Integer,
    Timestamp,
}

impl ColumnKind {
    fn sqlite_type(self) -> &'static str {
        match self {
            ColumnKind::AutoId | ColumnKind::Integer => "INTEGER",
            ColumnKind::StringKey | ColumnKind::Varchar => "VARCHAR(255)",
            ColumnKind::Text => "TEXT",
            ColumnKind::Timestamp => "DATETIME",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub kind: ColumnKind,
    pub nullable: bool,
}

impl Column {
    pub const fn new(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            nullable: false,
        }
    }

    pub const fn nullable(name: &'static str, kind: ColumnKind) -> Self {
        Self {
            name,
            kind,
            nullable: true,
        }
    }

    fn sqlite_definition(&self) -> String {
        match self.kind {
            ColumnKind::AutoId => format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", self.name),
            ColumnKind::StringKey => format!("{} VARCHAR(255) NOT NULL PRIMARY KEY", self.name),
            kind => {
                let null = if self.nullable { "NULL" } else { "NOT NULL" };
                format!("{} {} {}", self.name, kind.sqlite_type(), null)
            }
        }
    }
}

/// A persisted record shape at one schema revision.
pub trait VersionedTable {
    /// Storage name. Identical for every revision of the same logical table.
    const TABLE_NAME: &'static str;
    const REVISION: u32;
    const COLUMNS: &'static [Column];
    /// Deprecated tables stay readable for migration and export only.
    const DEPRECATED: bool = false;

    fn layout() -> TableLayout {
        TableLayout {
            table: Self::TABLE_NAME,
            revision: Self::REVISION,
            type_name: std::any::type_name::<Self>(),
            columns: Self::COLUMNS,
            deprecated: Self::DEPRECATED,
        }
    }
}

/// Storage name of `T`.
pub fn table_name<T: VersionedTable>() -> &'static str {
    T::TABLE_NAME
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub table: &'static str,
    pub revision: u32,
    pub type_name: &'static str,
    pub columns: &'static [Column],
    pub deprecated: bool,
}

impl TableLayout {
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Rows carrying a non-null `deleted_at` are soft-deleted.
    pub fn soft_deletes(&self) -> bool {
        self.column("deleted_at").is_some_and(|c| c.nullable)
    }

    pub fn create_table_sql(&self) -> String {
        let columns = self
            .columns
            .iter()
            .map(|c| format!("    {}", c.sqlite_definition()))
            .collect::<Vec<_>>()
            .join(",\n");
        let mut sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (\n{}\n);\n",
            self.table, columns
        );
        if self.soft_deletes() {
            let _ = writeln!(
                sql,
                "CREATE INDEX IF NOT EXISTS idx_{table}_deleted_at ON {table}(deleted_at);",
                table = self.table
            );
        }
        sql
    }
}

/// DDL for the latest revision of every table in `registry`.
pub fn sqlite_init(registry: &SchemaRegistry) -> String {
    registry
        .tables()
        .filter_map(|table| registry.latest(table))
        .map(TableLayout::create_table_sql)
        .collect::<Vec<_>>()
        .join("\n")
}
