mod value;

use scratchdb_core::{async_trait, BackendConfig, Driver, Error, Result, Row};
use tokio::task::JoinHandle;
use tokio_postgres::{Client, Config, NoTls, SimpleQueryMessage};

/// Driver for PostgreSQL, connecting without TLS.
#[derive(Debug, Default, Clone, Copy)]
pub struct PostgreSQL;

impl PostgreSQL {
    fn config(config: &BackendConfig, database: &str) -> Config {
        let params = &config.params;

        let mut pg = Config::new();
        pg.host(&params.host);
        pg.port(config.resolve_port());
        pg.dbname(database);

        if let Some(username) = &params.username {
            pg.user(username);
        }

        if let Some(password) = &params.password {
            pg.password(password);
        }

        pg
    }
}

#[async_trait]
impl Driver for PostgreSQL {
    async fn connect(
        &self,
        config: &BackendConfig,
        database: &str,
    ) -> Result<Box<dyn scratchdb_core::Connection>> {
        let (client, connection) = Self::config(config, database)
            .connect(NoTls)
            .await
            .map_err(Error::driver_operation_failed)?;

        let database = database.to_string();
        let task = {
            let database = database.clone();
            tokio::spawn(async move {
                let result = connection.await;
                if let Err(error) = &result {
                    tracing::warn!(database, %error, "postgresql connection error");
                }
                result
            })
        };

        tracing::debug!(database, host = %config.params.host, "connected to postgresql");

        Ok(Box::new(Connection {
            database,
            client: Some(client),
            task: Some(task),
        }))
    }
}

#[derive(Debug)]
pub struct Connection {
    database: String,
    client: Option<Client>,

    /// Drives the socket; finishes once `client` is dropped.
    task: Option<JoinHandle<core::result::Result<(), tokio_postgres::Error>>>,
}

impl Connection {
    fn client(&self) -> Result<&Client> {
        self.client
            .as_ref()
            .ok_or_else(|| Error::connection_closed(&self.database))
    }
}

#[async_trait]
impl scratchdb_core::Connection for Connection {
    async fn execute(&mut self, sql: &str) -> Result<u64> {
        tracing::debug!(database = self.database, sql, "execute");

        // The simple protocol accepts several `;`-separated statements.
        let messages = self
            .client()?
            .simple_query(sql)
            .await
            .map_err(Error::driver_operation_failed)?;

        Ok(messages
            .iter()
            .map(|message| match message {
                SimpleQueryMessage::CommandComplete(count) => *count,
                _ => 0,
            })
            .sum())
    }

    async fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        tracing::debug!(database = self.database, sql, "query");

        let rows = self
            .client()?
            .query(sql, &[])
            .await
            .map_err(Error::driver_operation_failed)?;

        rows.iter().map(value::row_from_postgres).collect()
    }

    async fn create_database(&mut self, name: &str) -> Result<()> {
        self.execute(&format!("CREATE DATABASE {}", quote(name)))
            .await?;
        Ok(())
    }

    async fn drop_database(&mut self, name: &str) -> Result<()> {
        self.execute(&format!("DROP DATABASE {}", quote(name)))
            .await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        // Dropping the client ends the connection task
        self.client.take();

        if let Some(task) = self.task.take() {
            task.await
                .map_err(Error::driver_operation_failed)?
                .map_err(Error::driver_operation_failed)?;
        }

        tracing::debug!(database = self.database, "closed postgresql connection");
        Ok(())
    }
}

fn quote(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
