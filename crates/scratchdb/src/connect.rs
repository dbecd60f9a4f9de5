use scratchdb_core::{async_trait, BackendConfig, Connection, Driver, EngineKind, Error, Result};

/// The default driver: dispatches on [`BackendConfig::engine`] to the
/// built-in drivers enabled through cargo features.
#[derive(Debug, Default, Clone, Copy)]
pub struct Connect;

#[async_trait]
impl Driver for Connect {
    async fn connect(&self, config: &BackendConfig, database: &str) -> Result<Box<dyn Connection>> {
        match config.engine {
            EngineKind::Postgres => connect_postgresql(config, database).await,
            EngineKind::Mysql | EngineKind::Mariadb => connect_mysql(config, database).await,
            engine => Err(Error::unsupported_feature(format!(
                "no built-in driver for `{engine}`; register one with `Builder::driver`"
            ))),
        }
    }
}

#[cfg(feature = "postgresql")]
async fn connect_postgresql(config: &BackendConfig, database: &str) -> Result<Box<dyn Connection>> {
    scratchdb_driver_postgresql::PostgreSQL
        .connect(config, database)
        .await
}

#[cfg(not(feature = "postgresql"))]
async fn connect_postgresql(_config: &BackendConfig, _database: &str) -> Result<Box<dyn Connection>> {
    Err(Error::unsupported_feature("`postgresql` feature not enabled"))
}

#[cfg(feature = "mysql")]
async fn connect_mysql(config: &BackendConfig, database: &str) -> Result<Box<dyn Connection>> {
    scratchdb_driver_mysql::MySQL.connect(config, database).await
}

#[cfg(not(feature = "mysql"))]
async fn connect_mysql(_config: &BackendConfig, _database: &str) -> Result<Box<dyn Connection>> {
    Err(Error::unsupported_feature("`mysql` feature not enabled"))
}
