use crate::{BackendConfig, Entities, Error, Result};
use std::path::PathBuf;

/// How a scratch connection prepares its schema.
#[derive(Debug, Clone)]
pub struct ScratchOptions {
    /// Schema descriptors, passed through untouched.
    pub entities: Entities,

    /// Migrations directory.
    pub migrations: Option<PathBuf>,

    /// Create the schema from `entities`.
    pub synchronize: bool,

    /// Apply pending migrations from `migrations`.
    pub run_migrations: bool,
}

impl ScratchOptions {
    /// Options used by the provisioner: migrations are the only source of
    /// schema and synchronization is off.
    pub fn for_config(config: &BackendConfig) -> Self {
        Self {
            entities: config.entities.clone(),
            migrations: config.migrations.clone(),
            synchronize: false,
            run_migrations: true,
        }
    }

    /// Rejects option combinations that would mutate the schema through two
    /// paths at once.
    pub fn validate(&self) -> Result<()> {
        if self.synchronize && self.run_migrations {
            return Err(Error::config(
                "schema synchronization and migrations cannot both be enabled",
            ));
        }
        Ok(())
    }
}
