//! Environment layering: deployment variables and `LUXE_*` overrides.
//!
//! Uses figment::Jail for sandboxed env var manipulation.

use figment::Jail;
use luxe_config::{ConfigError, LuxeConfig};

#[test]
fn deployment_env_fills_database_and_telegram() {
    Jail::expect_with(|jail| {
        jail.set_env("DB_HOST", "postgres.internal");
        jail.set_env("DB_PORT", "6543");
        jail.set_env("POSTGRES_USER", "catalog");
        jail.set_env("POSTGRES_PASSWORD", "s3cret");
        jail.set_env("POSTGRES_DB", "catalog_db");
        jail.set_env("TELEGRAM_BOT_TOKEN", "123:abc");
        jail.set_env("TELEGRAM_CHAT_ID", "-100987654");

        let config = LuxeConfig::load(None).expect("config loads");
        assert_eq!(config.database.host, "postgres.internal");
        assert_eq!(config.database.port, 6543);
        assert_eq!(config.database.user, "catalog");
        assert_eq!(config.database.password, "s3cret");
        assert_eq!(config.database.name, "catalog_db");
        assert_eq!(config.telegram.bot_token, "123:abc");
        assert_eq!(config.telegram.chat_id, "-100987654");
        assert!(config.telegram.is_configured());
        Ok(())
    });
}

#[test]
fn numeric_password_stays_a_string() {
    Jail::expect_with(|jail| {
        jail.set_env("POSTGRES_PASSWORD", "123456");

        let config = LuxeConfig::load(None).expect("config loads");
        assert_eq!(config.database.password, "123456");
        Ok(())
    });
}

#[test]
fn prefixed_env_beats_deployment_env() {
    Jail::expect_with(|jail| {
        jail.set_env("DB_HOST", "from-compose");
        jail.set_env("LUXE_DATABASE__HOST", "from-luxe");

        let config = LuxeConfig::load(None).expect("config loads");
        assert_eq!(config.database.host, "from-luxe");
        Ok(())
    });
}

#[test]
fn prefixed_env_sets_nested_sections() {
    Jail::expect_with(|jail| {
        jail.set_env("LUXE_STORAGE__DUMP_DIR", "/var/lib/luxe/dumps");
        jail.set_env("LUXE_STORAGE__MAX_UPLOAD_BYTES", "1024");
        jail.set_env("LUXE_TOOLS__PG_RESTORE", "/usr/lib/postgresql/16/bin/pg_restore");
        jail.set_env("LUXE_SERVER__BIND", "127.0.0.1:9000");

        let config = LuxeConfig::load(None).expect("config loads");
        assert_eq!(
            config.storage.dump_dir,
            std::path::PathBuf::from("/var/lib/luxe/dumps")
        );
        assert_eq!(config.storage.max_upload_bytes, 1024);
        assert_eq!(
            config.tools.pg_restore,
            "/usr/lib/postgresql/16/bin/pg_restore"
        );
        assert_eq!(config.server.bind, "127.0.0.1:9000");
        Ok(())
    });
}

#[test]
fn invalid_values_fail_validation() {
    Jail::expect_with(|jail| {
        jail.set_env("LUXE_DATABASE__CONNECT_ATTEMPTS", "0");

        let err = LuxeConfig::load(None).expect_err("zero attempts rejected");
        assert!(err.to_string().contains("connect_attempts"));
        Ok(())
    });
}

#[test]
fn malformed_dotenv_is_reported() {
    Jail::expect_with(|jail| {
        jail.create_file(".env", "BROKEN LINE WITHOUT EQUALS\n")?;

        let err = LuxeConfig::load_with_dotenv(None).expect_err("malformed .env rejected");
        assert!(matches!(err, ConfigError::Dotenv(_)), "got {err:?}");
        Ok(())
    });
}

#[test]
fn missing_dotenv_falls_through_to_load() {
    Jail::expect_with(|jail| {
        jail.set_env("LUXE_SERVER__BIND", "127.0.0.1:7100");

        let config = LuxeConfig::load_with_dotenv(None).expect("config loads without .env");
        assert_eq!(config.server.bind, "127.0.0.1:7100");
        Ok(())
    });
}
