use crate::Database;
use scratchdb_core::{async_trait, BackendConfig, Result};

/// Builds the storage service under test from a ready scratch database.
///
/// Any `Fn(Database, &BackendConfig) -> Result<S>` closure is a factory;
/// implement the trait directly when building the service has to await.
#[async_trait]
pub trait ServiceFactory<S>: Send + Sync {
    async fn build(&self, database: Database, config: &BackendConfig) -> Result<S>;
}

#[async_trait]
impl<S, F> ServiceFactory<S> for F
where
    F: Fn(Database, &BackendConfig) -> Result<S> + Send + Sync,
    S: Send + 'static,
{
    async fn build(&self, database: Database, config: &BackendConfig) -> Result<S> {
        self(database, config)
    }
}
