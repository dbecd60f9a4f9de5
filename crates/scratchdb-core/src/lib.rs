pub mod config;
pub use config::{BackendConfig, ConnectionParams, EngineKind, Entities};

pub mod driver;
pub use driver::{Connection, Driver};

mod error;
pub use error::{Error, ProvisionPhase, TeardownFailure, TeardownPhase};

pub mod migration;
pub use migration::{Migration, MigrationSet};

mod value;
pub use value::{Row, Value};

/// A Result type alias that uses scratchdb's [`Error`] type.
pub type Result<T> = core::result::Result<T, Error>;

pub use async_trait::async_trait;
