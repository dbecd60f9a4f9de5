mod options;
pub use options::ScratchOptions;

use crate::{
    async_trait,
    migration::{self, AppliedMigration, Migration, MigrationSet, MIGRATIONS_TABLE},
    BackendConfig, Entities, Error, Result, Row,
};

use std::fmt::Debug;

/// Opens connections to a database backend.
///
/// A driver is the provisioner's only way to talk to a database engine. The
/// built-in drivers cover PostgreSQL and MySQL/MariaDB; other engines plug in
/// their own implementation.
#[async_trait]
pub trait Driver: Debug + Send + Sync + 'static {
    /// Connects to `database` on the backend described by `config`.
    async fn connect(&self, config: &BackendConfig, database: &str) -> Result<Box<dyn Connection>>;

    /// Connects to a freshly created scratch database and prepares its
    /// schema according to `options`.
    ///
    /// On failure the connection is closed before the error is returned.
    async fn connect_scratch(
        &self,
        config: &BackendConfig,
        database: &str,
        options: &ScratchOptions,
    ) -> Result<Box<dyn Connection>> {
        options.validate()?;

        let mut connection = self.connect(config, database).await?;

        if let Err(err) = initialize(connection.as_mut(), options).await {
            if let Err(close_err) = connection.close().await {
                tracing::warn!(
                    database,
                    error = %close_err,
                    "failed to close scratch connection after initialization error"
                );
            }
            return Err(err);
        }

        Ok(connection)
    }
}

/// A single open connection.
///
/// Statements are plain SQL text; the provisioner never binds parameters.
#[async_trait]
pub trait Connection: Debug + Send + 'static {
    /// Executes a statement, returning the number of affected rows.
    async fn execute(&mut self, sql: &str) -> Result<u64>;

    /// Executes a query, returning all rows.
    async fn query(&mut self, sql: &str) -> Result<Vec<Row>>;

    /// Creates the database `name`. `name` is a plain identifier.
    async fn create_database(&mut self, name: &str) -> Result<()> {
        self.execute(&format!("CREATE DATABASE {name}")).await?;
        Ok(())
    }

    /// Drops the database `name`. `name` is a plain identifier.
    async fn drop_database(&mut self, name: &str) -> Result<()> {
        self.execute(&format!("DROP DATABASE {name}")).await?;
        Ok(())
    }

    /// Creates the schema straight from entity descriptors.
    async fn push_schema(&mut self, _entities: &Entities) -> Result<()> {
        Err(Error::unsupported_feature(
            "schema synchronization is not supported by this driver",
        ))
    }

    /// Migrations recorded in the migrations table, creating the table on
    /// first use.
    async fn applied_migrations(&mut self) -> Result<Vec<AppliedMigration>> {
        ensure_migrations_table(self).await?;

        let rows = self
            .query(&format!("SELECT id FROM {MIGRATIONS_TABLE} ORDER BY id"))
            .await?;

        rows.iter()
            .map(|row| {
                row.get(0)
                    .and_then(|value| value.as_i64())
                    .and_then(|id| u64::try_from(id).ok())
                    .map(AppliedMigration::new)
                    .ok_or_else(|| {
                        Error::invalid_migration(format!(
                            "unexpected id in {MIGRATIONS_TABLE}: {row:?}"
                        ))
                    })
            })
            .collect()
    }

    /// Runs every statement of `migration` and records it, inside a
    /// transaction.
    async fn apply_migration(&mut self, migration: &Migration) -> Result<()> {
        ensure_migrations_table(self).await?;

        self.execute("BEGIN").await?;

        let mut statements = migration.statements();
        statements.push(format!(
            "INSERT INTO {MIGRATIONS_TABLE} (id, name) VALUES ({}, '{}')",
            migration.id(),
            migration.name()
        ));

        for statement in &statements {
            if let Err(err) = self.execute(statement).await {
                // The statement error is the one reported
                if let Err(rollback_err) = self.execute("ROLLBACK").await {
                    tracing::warn!(
                        migration = migration.name(),
                        error = %rollback_err,
                        "failed to roll back migration"
                    );
                }
                return Err(err);
            }
        }

        self.execute("COMMIT").await?;
        Ok(())
    }

    /// Closes the connection. Dropping a connection also releases it, but
    /// only `close` reports errors.
    async fn close(&mut self) -> Result<()>;
}

async fn ensure_migrations_table<C: Connection + ?Sized>(connection: &mut C) -> Result<()> {
    connection
        .execute(&format!(
            "CREATE TABLE IF NOT EXISTS {MIGRATIONS_TABLE} (
                id BIGINT PRIMARY KEY,
                name VARCHAR(255) NOT NULL,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )"
        ))
        .await?;
    Ok(())
}

async fn initialize(connection: &mut dyn Connection, options: &ScratchOptions) -> Result<()> {
    if options.synchronize {
        connection.push_schema(&options.entities).await?;
    }

    if options.run_migrations {
        if let Some(dir) = &options.migrations {
            let set = MigrationSet::load(dir)?;
            let applied = migration::apply_pending(connection, &set).await?;
            tracing::debug!(applied, dir = %dir.display(), "scratch database migrated");
        }
    }

    Ok(())
}
