mod value;

use mysql_async::{prelude::Queryable, Conn, OptsBuilder};
use scratchdb_core::{async_trait, BackendConfig, Driver, Error, Result, Row};

/// Driver for MySQL and MariaDB.
#[derive(Debug, Default, Clone, Copy)]
pub struct MySQL;

impl MySQL {
    fn opts(config: &BackendConfig, database: &str) -> OptsBuilder {
        let params = &config.params;

        OptsBuilder::default()
            .ip_or_hostname(params.host.clone())
            .tcp_port(config.resolve_port())
            .user(params.username.clone())
            .pass(params.password.clone())
            .db_name(Some(database))
    }
}

#[async_trait]
impl Driver for MySQL {
    async fn connect(
        &self,
        config: &BackendConfig,
        database: &str,
    ) -> Result<Box<dyn scratchdb_core::Connection>> {
        let conn = Conn::new(Self::opts(config, database))
            .await
            .map_err(Error::driver_operation_failed)?;

        tracing::debug!(database, host = %config.params.host, engine = %config.engine, "connected to mysql");

        Ok(Box::new(Connection {
            database: database.to_string(),
            conn: Some(conn),
        }))
    }
}

#[derive(Debug)]
pub struct Connection {
    database: String,
    conn: Option<Conn>,
}

impl Connection {
    fn conn(&mut self) -> Result<&mut Conn> {
        self.conn
            .as_mut()
            .ok_or_else(|| Error::connection_closed(&self.database))
    }
}

#[async_trait]
impl scratchdb_core::Connection for Connection {
    async fn execute(&mut self, sql: &str) -> Result<u64> {
        tracing::debug!(database = self.database, sql, "execute");

        let conn = self.conn()?;
        conn.query_drop(sql)
            .await
            .map_err(Error::driver_operation_failed)?;
        Ok(conn.affected_rows())
    }

    async fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        tracing::debug!(database = self.database, sql, "query");

        // The binary protocol keeps column types; the text protocol would
        // return every value as bytes.
        let rows: Vec<mysql_async::Row> = self
            .conn()?
            .exec(sql, ())
            .await
            .map_err(Error::driver_operation_failed)?;

        Ok(rows.iter().map(value::row_from_mysql).collect())
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
        if let Some(conn) = self.conn.take() {
            conn.disconnect()
                .await
                .map_err(Error::driver_operation_failed)?;
            tracing::debug!(database = self.database, "closed mysql connection");
        }
        Ok(())
    }
}

fn quote(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}
