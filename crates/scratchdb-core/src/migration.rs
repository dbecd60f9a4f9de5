//! Plain-SQL migrations loaded from a directory.
//!
//! A migrations directory holds one file per migration, named
//! `<id>_<description>.sql` (for example `0001_create_users.sql`). Files are
//! applied in ascending id order. A file may contain several statements
//! separated by a line holding only [`BREAKPOINT`].

use crate::{Connection, Error, Result};
use std::collections::HashSet;
use std::path::Path;

/// Marker line separating statements inside one migration file.
pub const BREAKPOINT: &str = "-- #[scratchdb::breakpoint]";

/// Name of the table recording which migrations were applied.
pub const MIGRATIONS_TABLE: &str = "__scratchdb_migrations";

/// One migration step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    id: u64,
    name: String,
    sql: String,
}

impl Migration {
    /// Creates a migration. `name` may only contain ASCII alphanumerics, `_`,
    /// `-` and `.`.
    pub fn new(id: u64, name: impl Into<String>, sql: impl Into<String>) -> Result<Self> {
        let name = name.into();

        if name.is_empty()
            || !name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        {
            return Err(Error::invalid_migration(format!(
                "migration name `{name}` may only contain ASCII letters, digits, `_`, `-` and `.`"
            )));
        }

        Ok(Self {
            id,
            name,
            sql: sql.into(),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Individual SQL statements, split on [`BREAKPOINT`] lines. Blank
    /// statements are skipped.
    pub fn statements(&self) -> Vec<String> {
        let mut statements = vec![];
        let mut current = String::new();

        for line in self.sql.lines() {
            if line.trim() == BREAKPOINT {
                statements.push(std::mem::take(&mut current));
            } else {
                current.push_str(line);
                current.push('\n');
            }
        }
        statements.push(current);

        statements
            .into_iter()
            .map(|statement| statement.trim().to_string())
            .filter(|statement| !statement.is_empty())
            .collect()
    }
}

/// Metadata about a migration that has already been applied to a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedMigration {
    id: u64,
}

impl AppliedMigration {
    pub fn new(id: u64) -> Self {
        Self { id }
    }

    pub fn id(&self) -> u64 {
        self.id
    }
}

/// An ordered set of migrations with unique ids.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationSet {
    migrations: Vec<Migration>,
}

impl MigrationSet {
    /// Loads every `*.sql` file in `dir`. Other files are ignored.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();

        let entries = std::fs::read_dir(dir).map_err(|err| {
            Error::invalid_migration(format!(
                "cannot read migrations directory {}: {err}",
                dir.display()
            ))
        })?;

        let mut migrations = vec![];

        for entry in entries {
            let path = entry
                .map_err(|err| {
                    Error::invalid_migration(format!(
                        "cannot read migrations directory {}: {err}",
                        dir.display()
                    ))
                })?
                .path();

            if !path.is_file() || path.extension().and_then(|ext| ext.to_str()) != Some("sql") {
                continue;
            }

            let stem = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .ok_or_else(|| {
                    Error::invalid_migration(format!(
                        "migration file name {} is not valid UTF-8",
                        path.display()
                    ))
                })?;

            let id = parse_id(stem)?;
            let sql = std::fs::read_to_string(&path).map_err(|err| {
                Error::invalid_migration(format!(
                    "cannot read migration {}: {err}",
                    path.display()
                ))
            })?;
            migrations.push(Migration::new(id, stem, sql)?);
        }

        Self::from_vec(migrations)
    }

    /// Builds a set from migrations in any order.
    pub fn from_vec(mut migrations: Vec<Migration>) -> Result<Self> {
        migrations.sort_by_key(Migration::id);

        if let Some(pair) = migrations.windows(2).find(|pair| pair[0].id == pair[1].id) {
            return Err(Error::invalid_migration(format!(
                "migrations `{}` and `{}` share id {}",
                pair[0].name, pair[1].name, pair[0].id
            )));
        }

        Ok(Self { migrations })
    }

    pub fn len(&self) -> usize {
        self.migrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.migrations.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Migration> {
        self.migrations.iter()
    }

    /// Migrations not listed in `applied`, in order.
    pub fn pending(&self, applied: &[AppliedMigration]) -> Vec<&Migration> {
        let applied: HashSet<u64> = applied.iter().map(AppliedMigration::id).collect();
        self.migrations
            .iter()
            .filter(|migration| !applied.contains(&migration.id))
            .collect()
    }
}

/// Applies every migration of `set` that `connection` has not recorded yet.
/// Returns how many were applied.
pub async fn apply_pending(connection: &mut dyn Connection, set: &MigrationSet) -> Result<usize> {
    let applied = connection.applied_migrations().await?;
    let pending = set.pending(&applied);

    for migration in &pending {
        tracing::debug!(id = migration.id(), name = migration.name(), "applying migration");
        connection.apply_migration(migration).await.map_err(|err| {
            err.context(Error::invalid_migration(format!(
                "applying `{}` failed",
                migration.name()
            )))
        })?;
    }

    Ok(pending.len())
}

/// Extracts the numeric id from `0001_create_users`.
fn parse_id(stem: &str) -> Result<u64> {
    stem.split('_')
        .next()
        .and_then(|prefix| prefix.parse().ok())
        .ok_or_else(|| {
            Error::invalid_migration(format!(
                "migration file `{stem}.sql` must start with a numeric id, e.g. `0001_{stem}.sql`"
            ))
        })
}
