use scratchdb_core::{Connection, EngineKind, Entities, Error, Result, Row};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Handle to a scratch database.
///
/// Cloning is cheap and every clone shares one connection; statements are
/// serialized through it. The provisioner closes the connection during
/// teardown, after which every clone fails with a "connection closed" error.
#[derive(Clone)]
pub struct Database {
    shared: Arc<Shared>,
}

struct Shared {
    name: String,
    engine: EngineKind,
    entities: Entities,
    connection: Mutex<Option<Box<dyn Connection>>>,
}

impl Database {
    pub(crate) fn new(
        name: &str,
        engine: EngineKind,
        entities: Entities,
        connection: Box<dyn Connection>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                name: name.to_string(),
                engine,
                entities,
                connection: Mutex::new(Some(connection)),
            }),
        }
    }

    /// Name of the scratch database.
    pub fn name(&self) -> &str {
        &self.shared.name
    }

    pub fn engine(&self) -> EngineKind {
        self.shared.engine
    }

    /// Schema descriptors the backend was configured with.
    pub fn entities(&self) -> &Entities {
        &self.shared.entities
    }

    /// Executes a statement, returning the number of affected rows.
    pub async fn execute(&self, sql: &str) -> Result<u64> {
        let mut connection = self.shared.connection.lock().await;
        let connection = connection
            .as_mut()
            .ok_or_else(|| Error::connection_closed(self.name()))?;
        connection.execute(sql).await
    }

    /// Executes a query, returning all rows.
    pub async fn query(&self, sql: &str) -> Result<Vec<Row>> {
        let mut connection = self.shared.connection.lock().await;
        let connection = connection
            .as_mut()
            .ok_or_else(|| Error::connection_closed(self.name()))?;
        connection.query(sql).await
    }

    pub async fn is_closed(&self) -> bool {
        self.shared.connection.lock().await.is_none()
    }

    /// Closes the connection. The connection is released even when closing
    /// reports an error; closing twice is a no-op.
    pub(crate) async fn close(&self) -> Result<()> {
        let connection = self.shared.connection.lock().await.take();

        match connection {
            Some(mut connection) => connection.close().await,
            None => Ok(()),
        }
    }
}

impl core::fmt::Debug for Database {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.shared.name)
            .field("engine", &self.shared.engine)
            .finish()
    }
}
