use broker_db::config::{self, ConfigOverrides, DbType};
use broker_db::db::{MigrationCounter, SqlitePool};
use mimalloc::MiMalloc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let base: config::Config = config::Config::figment().extract()?;
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base.loglevel.clone()));
    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_level(true)
                .with_target(false),
        )
        .init();

    let mut overrides = ConfigOverrides::new();
    let injected = broker_db::vcap::use_vcap_services(&mut overrides)?;
    let cfg = config::install(config::Config::load(&overrides)?)?;

    let source = if injected.is_some() { "VCAP_SERVICES" } else { "static" };
    info!(
        db_type = cfg.db.db_type.as_str(),
        host = %cfg.db.host,
        port = cfg.db.port,
        database = %cfg.db.name,
        path = %cfg.db.path,
        tls = cfg.db.has_tls(),
        source,
        "database target resolved"
    );

    if cfg.db.db_type == DbType::Sqlite3 {
        let connect_opts =
            SqliteConnectOptions::from_str(&format!("sqlite:{}", cfg.db.path))?.create_if_missing(true);
        let pool: SqlitePool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
        let counter = MigrationCounter::new(pool);
        counter.init_schema().await?;
        match counter.current().await? {
            Some(revision) => info!(revision, "current schema revision"),
            None => info!("no migrations applied yet"),
        }
    }

    Ok(())
}
