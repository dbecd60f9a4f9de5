#![cfg(feature = "mysql")]

use scratchdb::{BackendConfig, Connect, Database, Driver, Provisioner};
use tests::{init_tracing, migrations_dir, mysql_config};

struct Users {
    db: Database,
}

impl Users {
    async fn insert(&self, id: i64, name: &str) -> scratchdb::Result<()> {
        self.db
            .execute(&format!("INSERT INTO users (id, name) VALUES ({id}, '{name}')"))
            .await?;
        Ok(())
    }

    async fn name(&self, id: i64) -> scratchdb::Result<Option<String>> {
        let rows = self
            .db
            .query(&format!("SELECT name FROM users WHERE id = {id}"))
            .await?;
        Ok(rows
            .first()
            .and_then(|row| row.get_by_name("name"))
            .and_then(|value| value.as_str())
            .map(str::to_string))
    }
}

fn users(db: Database, _: &BackendConfig) -> scratchdb::Result<Users> {
    Ok(Users { db })
}

async fn database_exists(config: &BackendConfig, name: &str) -> bool {
    let mut admin = Connect.connect(config, "mysql").await.unwrap();
    let rows = admin
        .query(&format!("SELECT SCHEMA_NAME FROM information_schema.SCHEMATA WHERE SCHEMA_NAME = '{name}'"))
        .await
        .unwrap();
    admin.close().await.unwrap();
    !rows.is_empty()
}

#[tokio::test]
async fn provision_migrate_and_drop() {
    init_tracing();
    let migrations = migrations_dir(&[(
        "1_create_users.sql",
        "CREATE TABLE users (id BIGINT PRIMARY KEY, name VARCHAR(64) NOT NULL);",
    )]);
    let config = mysql_config().migrations(migrations.path());

    let mut provisioner = Provisioner::new(users, [config.clone()]).unwrap();
    let name = provisioner.scratch_name().to_string();

    provisioner.setup().await.unwrap();
    assert!(database_exists(&config, &name).await);

    let users = provisioner.storage_services()[0];
    users.insert(1, "alice").await.unwrap();
    assert_eq!(users.name(1).await.unwrap().as_deref(), Some("alice"));

    let applied = users
        .db
        .query("SELECT id FROM __scratchdb_migrations")
        .await
        .unwrap();
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].get(0).and_then(|v| v.as_i64()), Some(1));

    provisioner.teardown().await.unwrap();
    assert!(!database_exists(&config, &name).await);
}

#[tokio::test]
async fn unknown_system_database_fails_setup() {
    let config = mysql_config().system_database("scratchdb_missing_system_db");
    let mut provisioner = Provisioner::new(users, [config]).unwrap();

    let err = provisioner.setup().await.unwrap_err();
    assert_eq!(
        err.provision_phase(),
        Some(scratchdb::ProvisionPhase::AdminConnect)
    );

    provisioner.teardown().await.unwrap();
}
