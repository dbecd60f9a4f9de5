//! Disposable, migrated databases for integration tests.
//!
//! A [`Provisioner`] creates one uniquely named scratch database on each
//! configured backend, applies the backend's migrations, and hands a
//! [`Database`] handle to a [`ServiceFactory`] that builds the storage
//! service under test. [`Provisioner::teardown`] drops every scratch
//! database again, continuing past failures on individual backends.
//!
//! ```no_run
//! use scratchdb::{BackendConfig, Database, EngineKind, Provisioner};
//!
//! struct Users {
//!     db: Database,
//! }
//!
//! # async fn run() -> scratchdb::Result<()> {
//! let config = BackendConfig::new(EngineKind::Postgres, "localhost")
//!     .username("postgres")
//!     .migrations("tests/migrations");
//!
//! let mut provisioner: Provisioner<Users> = Provisioner::new(
//!     |db: Database, _: &BackendConfig| -> scratchdb::Result<Users> { Ok(Users { db }) },
//!     [config],
//! )?;
//!
//! provisioner.setup().await?;
//! let users = provisioner.storage_services()[0];
//! users.db.execute("INSERT INTO users (name) VALUES ('alice')").await?;
//! provisioner.teardown().await?;
//! # Ok(())
//! # }
//! ```

mod connect;
pub use connect::Connect;

mod database;
pub use database::Database;

mod factory;
pub use factory::ServiceFactory;

pub mod provisioner;
pub use provisioner::{Builder, InstanceState, Provisioner};

mod scratch_name;
pub use scratch_name::ScratchName;

pub use scratchdb_core::{
    async_trait, bail,
    config::{self, BackendConfig, ConnectionParams, EngineKind, Entities},
    driver::{self, Connection, Driver, ScratchOptions},
    err,
    migration::{self, Migration, MigrationSet},
    Error, ProvisionPhase, Result, Row, TeardownFailure, TeardownPhase, Value,
};
