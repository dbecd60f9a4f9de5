use scratchdb::{async_trait, migration::MIGRATIONS_TABLE, BackendConfig, Connection, Driver};
use scratchdb::{err, Error, Result, Row, Value};

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::io;
use std::sync::{Arc, Mutex, MutexGuard};

/// An in-memory driver standing in for a set of database servers.
///
/// Servers are addressed by [`BackendConfig`] host. Every driver call is
/// recorded in an operation log, and any step can be made to fail with a
/// [`Fault`]. Like PostgreSQL, a server refuses to drop a database while a
/// connection to it is still open.
#[derive(Debug, Clone, Default)]
pub struct FakeDriver {
    state: Arc<Mutex<State>>,
}

#[derive(Debug, Default)]
struct State {
    servers: HashMap<String, Server>,
    faults: Vec<Fault>,
    log: Vec<Op>,
}

#[derive(Debug, Default)]
struct Server {
    databases: BTreeMap<String, Schema>,
    open: HashMap<String, usize>,
}

#[derive(Debug, Default, Clone)]
struct Schema {
    tables: BTreeSet<String>,
    migrations: Vec<u64>,
}

/// A recorded driver call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Op {
    Connect { host: String, database: String },
    CreateDatabase { host: String, name: String },
    DropDatabase { host: String, name: String },
    Execute { host: String, database: String, sql: String },
    Close { host: String, database: String },
}

/// A driver step that fails until the fault is cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fault {
    Connect { host: String, database: String },
    CreateDatabase { host: String },
    DropDatabase { host: String },
    Close { host: String, database: String },

    /// Fails statements containing `pattern`.
    Execute { host: String, pattern: String },
}

impl Fault {
    pub fn connect(host: &str, database: &str) -> Self {
        Fault::Connect {
            host: host.to_string(),
            database: database.to_string(),
        }
    }

    pub fn create_database(host: &str) -> Self {
        Fault::CreateDatabase {
            host: host.to_string(),
        }
    }

    pub fn drop_database(host: &str) -> Self {
        Fault::DropDatabase {
            host: host.to_string(),
        }
    }

    pub fn close(host: &str, database: &str) -> Self {
        Fault::Close {
            host: host.to_string(),
            database: database.to_string(),
        }
    }

    pub fn execute(host: &str, pattern: &str) -> Self {
        Fault::Execute {
            host: host.to_string(),
            pattern: pattern.to_string(),
        }
    }
}

impl FakeDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a server at `host` holding the given system databases.
    pub fn server<'a>(self, host: &str, databases: impl IntoIterator<Item = &'a str>) -> Self {
        {
            let mut state = self.lock();
            let server = state.servers.entry(host.to_string()).or_default();
            for database in databases {
                server
                    .databases
                    .insert(database.to_string(), Schema::default());
            }
        }
        self
    }

    pub fn fail(&self, fault: Fault) {
        self.lock().faults.push(fault);
    }

    pub fn clear_faults(&self) {
        self.lock().faults.clear();
    }

    /// Every operation recorded so far.
    pub fn log(&self) -> Vec<Op> {
        self.lock().log.clone()
    }

    /// Databases currently on `host`.
    pub fn databases(&self, host: &str) -> Vec<String> {
        self.lock()
            .servers
            .get(host)
            .map(|server| server.databases.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Tables created in `database` on `host`.
    pub fn tables(&self, host: &str, database: &str) -> Vec<String> {
        self.schema(host, database)
            .map(|schema| schema.tables.into_iter().collect())
            .unwrap_or_default()
    }

    /// Ids of the migrations recorded in `database` on `host`.
    pub fn migrations(&self, host: &str, database: &str) -> Vec<u64> {
        self.schema(host, database)
            .map(|schema| schema.migrations)
            .unwrap_or_default()
    }

    /// Number of connections not closed yet, across all servers.
    pub fn open_connections(&self) -> usize {
        self.lock()
            .servers
            .values()
            .flat_map(|server| server.open.values())
            .sum()
    }

    fn schema(&self, host: &str, database: &str) -> Option<Schema> {
        self.lock()
            .servers
            .get(host)?
            .databases
            .get(database)
            .cloned()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        // A panicking test may poison the lock; the state is still usable.
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Driver for FakeDriver {
    async fn connect(&self, config: &BackendConfig, database: &str) -> Result<Box<dyn Connection>> {
        let host = config.params.host.clone();
        let mut state = self.lock();

        state.log.push(Op::Connect {
            host: host.clone(),
            database: database.to_string(),
        });

        if state.faults.contains(&Fault::connect(&host, database)) {
            return Err(failure(io::ErrorKind::ConnectionRefused, "connection refused"));
        }

        let Some(server) = state.servers.get_mut(&host) else {
            return Err(failure(
                io::ErrorKind::NotFound,
                format!("unknown host `{host}`"),
            ));
        };

        if !server.databases.contains_key(database) {
            return Err(err!("database `{database}` does not exist"));
        }

        *server.open.entry(database.to_string()).or_default() += 1;

        Ok(Box::new(FakeConnection {
            driver: self.clone(),
            host,
            database: database.to_string(),
            closed: false,
            transaction: None,
        }))
    }
}

/// Connection to one database of a [`FakeDriver`] server.
#[derive(Debug)]
pub struct FakeConnection {
    driver: FakeDriver,
    host: String,
    database: String,
    closed: bool,

    /// Effects buffered between `BEGIN` and `COMMIT`
    transaction: Option<Schema>,
}

impl FakeConnection {
    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::connection_closed(&self.database));
        }
        Ok(())
    }

    fn has_fault(&self, fault: &Fault) -> bool {
        self.driver.lock().faults.contains(fault)
    }
}

#[async_trait]
impl Connection for FakeConnection {
    async fn execute(&mut self, sql: &str) -> Result<u64> {
        self.check_open()?;

        let mut state = self.driver.lock();

        state.log.push(Op::Execute {
            host: self.host.clone(),
            database: self.database.clone(),
            sql: sql.to_string(),
        });

        let faulted = state.faults.iter().any(|fault| {
            matches!(fault, Fault::Execute { host, pattern } if *host == self.host && sql.contains(pattern.as_str()))
        });
        if faulted {
            return Err(failure(
                io::ErrorKind::InvalidInput,
                format!("syntax error in `{sql}`"),
            ));
        }

        let schema = state
            .servers
            .get_mut(&self.host)
            .and_then(|server| server.databases.get_mut(&self.database))
            .ok_or_else(|| err!("database `{}` was dropped", self.database))?;

        let statement = sql.trim().trim_end_matches(';');
        let upper = statement.to_ascii_uppercase();

        match upper.as_str() {
            "BEGIN" => self.transaction = Some(schema.clone()),
            "COMMIT" => {
                if let Some(pending) = self.transaction.take() {
                    *schema = pending;
                }
            }
            "ROLLBACK" => self.transaction = None,
            _ => {
                let target = self.transaction.as_mut().unwrap_or(schema);

                if let Some(rest) = upper.strip_prefix("CREATE TABLE ") {
                    let rest = rest.strip_prefix("IF NOT EXISTS ").unwrap_or(rest);
                    let name = table_name(&statement[statement.len() - rest.len()..]);
                    target.tables.insert(name);
                } else if upper.starts_with(&format!(
                    "INSERT INTO {}",
                    MIGRATIONS_TABLE.to_ascii_uppercase()
                )) {
                    let id = statement
                        .split_once("VALUES (")
                        .and_then(|(_, values)| values.split(',').next())
                        .and_then(|id| id.trim().parse().ok())
                        .ok_or_else(|| err!("malformed migration record: {sql}"))?;
                    target.migrations.push(id);
                }
            }
        }

        Ok(0)
    }

    async fn query(&mut self, sql: &str) -> Result<Vec<Row>> {
        self.check_open()?;

        let mut state = self.driver.lock();

        state.log.push(Op::Execute {
            host: self.host.clone(),
            database: self.database.clone(),
            sql: sql.to_string(),
        });

        if !sql.contains(MIGRATIONS_TABLE) {
            return Ok(vec![]);
        }

        let mut migrations = state
            .servers
            .get(&self.host)
            .and_then(|server| server.databases.get(&self.database))
            .map(|schema| schema.migrations.clone())
            .unwrap_or_default();
        migrations.sort_unstable();

        Ok(migrations
            .into_iter()
            .map(|id| Row::new(vec!["id".to_string()], vec![Value::from(id as i64)]))
            .collect())
    }

    async fn create_database(&mut self, name: &str) -> Result<()> {
        self.check_open()?;

        if self.has_fault(&Fault::create_database(&self.host)) {
            return Err(failure(io::ErrorKind::PermissionDenied, "permission denied to create database"));
        }

        let mut state = self.driver.lock();
        state.log.push(Op::CreateDatabase {
            host: self.host.clone(),
            name: name.to_string(),
        });

        let server = state.servers.entry(self.host.clone()).or_default();
        if server.databases.contains_key(name) {
            return Err(err!("database `{name}` already exists"));
        }
        server.databases.insert(name.to_string(), Schema::default());
        Ok(())
    }

    async fn drop_database(&mut self, name: &str) -> Result<()> {
        self.check_open()?;

        if self.has_fault(&Fault::drop_database(&self.host)) {
            return Err(failure(io::ErrorKind::PermissionDenied, "permission denied to drop database"));
        }

        let mut state = self.driver.lock();
        state.log.push(Op::DropDatabase {
            host: self.host.clone(),
            name: name.to_string(),
        });

        let server = state.servers.entry(self.host.clone()).or_default();
        if server.open.get(name).copied().unwrap_or_default() > 0 {
            return Err(err!("database `{name}` is being accessed by other users"));
        }
        if server.databases.remove(name).is_none() {
            return Err(err!("database `{name}` does not exist"));
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        let mut state = self.driver.lock();
        state.log.push(Op::Close {
            host: self.host.clone(),
            database: self.database.clone(),
        });

        // The connection is released even when closing reports an error
        if let Some(open) = state
            .servers
            .get_mut(&self.host)
            .and_then(|server| server.open.get_mut(&self.database))
        {
            *open = open.saturating_sub(1);
        }

        if state
            .faults
            .contains(&Fault::close(&self.host, &self.database))
        {
            return Err(failure(io::ErrorKind::ConnectionReset, "connection reset by peer"));
        }

        Ok(())
    }
}

fn failure(kind: io::ErrorKind, message: impl Into<String>) -> Error {
    Error::driver_operation_failed(io::Error::new(kind, message.into()))
}

/// Name following `CREATE TABLE [IF NOT EXISTS]`.
fn table_name(rest: &str) -> String {
    rest.trim_start()
        .split(|c: char| c.is_whitespace() || c == '(')
        .next()
        .unwrap_or_default()
        .to_string()
}
