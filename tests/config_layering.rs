use broker_db::config::{self, ConfigOverrides, ConfigStore, DB_HOST, DB_TYPE};
use broker_db::{BrokerDbError, Config, DbType};
use figment::Jail;

#[test]
fn defaults_apply_without_any_source() {
    Jail::expect_with(|_jail| {
        let cfg = Config::load(&ConfigOverrides::new()).map_err(|e| e.to_string())?;
        assert_eq!(cfg, Config::default());
        assert_eq!(cfg.db.db_type, DbType::Mysql);
        assert_eq!(cfg.db.port, 3306);
        Ok(())
    });
}

#[test]
fn file_then_env_then_overrides() {
    Jail::expect_with(|jail| {
        jail.create_file(
            config::CONFIG_FILE,
            r#"
            loglevel = "debug"

            [db]
            type = "sqlite3"
            path = "/var/lib/broker/broker.db"
            host = "file-host"
            "#,
        )?;
        jail.set_env("BROKER_DB__HOST", "env-host");
        jail.set_env("BROKER_DB__PORT", "3307");

        let cfg = Config::load(&ConfigOverrides::new()).map_err(|e| e.to_string())?;
        assert_eq!(cfg.loglevel, "debug");
        assert_eq!(cfg.db.db_type, DbType::Sqlite3);
        assert_eq!(cfg.db.path, "/var/lib/broker/broker.db");
        assert_eq!(cfg.db.host, "env-host");
        assert_eq!(cfg.db.port, 3307);

        let mut overrides = ConfigOverrides::new();
        overrides.set(DB_HOST, "vcap-host".to_string());
        overrides.set(DB_TYPE, DbType::Mysql.as_str().to_string());

        let cfg = Config::load(&overrides).map_err(|e| e.to_string())?;
        assert_eq!(cfg.db.host, "vcap-host");
        assert_eq!(cfg.db.db_type, DbType::Mysql);
        assert_eq!(cfg.db.path, "/var/lib/broker/broker.db");
        assert_eq!(cfg.db.port, 3307);
        Ok(())
    });
}

#[test]
fn invalid_db_type_is_a_config_error() {
    Jail::expect_with(|jail| {
        jail.set_env("BROKER_DB__TYPE", "oracle");

        let err = Config::load(&ConfigOverrides::new()).expect_err("unknown db type");
        assert!(matches!(err, BrokerDbError::Config(_)));
        Ok(())
    });
}

#[test]
fn configuration_is_installed_once() {
    assert!(config::get().is_none());

    let installed = config::install(Config::default()).expect("first install");
    assert_eq!(installed.loglevel, "info");
    assert!(config::get().is_some());

    let err = config::install(Config::default()).expect_err("second install");
    assert!(matches!(err, BrokerDbError::ConfigAlreadyInstalled));
}
