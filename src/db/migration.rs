use crate::db::models::{MigrationV1, Model};
use crate::db::schema::VersionedTable;
use crate::error::BrokerDbError;
use chrono::Utc;
use sqlx::{Pool, Sqlite};
use tracing::info;

pub type SqlitePool = Pool<Sqlite>;

/// The single "current schema revision" value kept in `migrations`.
///
/// Every advance inserts a row; the current value is the highest
/// `migration_id` among rows that are not soft-deleted.
#[derive(Clone)]
pub struct MigrationCounter {
    pool: SqlitePool,
}

impl MigrationCounter {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Create the `migrations` table if it does not exist yet.
    pub async fn init_schema(&self) -> Result<(), BrokerDbError> {
        let ddl = MigrationV1::layout().create_table_sql();
        // sqlx::query runs a single statement
        for stmt in ddl.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Current revision, `None` before the first migration.
    pub async fn current(&self) -> Result<Option<i32>, BrokerDbError> {
        Ok(self.current_row().await?.map(|row| row.migration_id))
    }

    pub async fn current_row(&self) -> Result<Option<MigrationV1>, BrokerDbError> {
        let row = sqlx::query_as::<_, MigrationV1>(
            r#"SELECT id, created_at, updated_at, deleted_at, migration_id
               FROM migrations WHERE deleted_at IS NULL
               ORDER BY migration_id DESC, id DESC LIMIT 1"#,
        )
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    /// Record `to` as the applied revision. It must exceed the current one.
    pub async fn advance(&self, to: i32) -> Result<MigrationV1, BrokerDbError> {
        let mut tx = self.pool.begin().await?;

        let (current,): (Option<i32>,) = sqlx::query_as(
            "SELECT MAX(migration_id) FROM migrations WHERE deleted_at IS NULL",
        )
        .fetch_one(&mut *tx)
        .await?;
        if let Some(current) = current
            && to <= current
        {
            return Err(BrokerDbError::MigrationRegression {
                current,
                requested: to,
            });
        }

        let header = Model::new_at(Utc::now());
        let id = sqlx::query(
            r#"INSERT INTO migrations (created_at, updated_at, deleted_at, migration_id)
               VALUES (?, ?, NULL, ?)"#,
        )
        .bind(header.created_at)
        .bind(header.updated_at)
        .bind(to)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        tx.commit().await?;
        info!(migration_id = to, previous = ?current, "migration counter advanced");

        Ok(MigrationV1 {
            model: Model { id, ..header },
            migration_id: to,
        })
    }
}
