use crate::Error;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Database engines a backend can run on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum EngineKind {
    Postgres,
    Mysql,
    Mariadb,
    Oracle,
    Mssql,
    Sqlite,
}

impl EngineKind {
    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            EngineKind::Postgres => "postgres",
            EngineKind::Mysql => "mysql",
            EngineKind::Mariadb => "mariadb",
            EngineKind::Oracle => "oracle",
            EngineKind::Mssql => "mssql",
            EngineKind::Sqlite => "sqlite",
        }
    }

    /// The administrative database that always exists on this engine, if
    /// there is a conventional one.
    pub fn default_system_database(self) -> Option<&'static str> {
        match self {
            EngineKind::Postgres => Some("postgres"),
            EngineKind::Mysql | EngineKind::Mariadb => Some("mysql"),
            EngineKind::Oracle => Some("sys"),
            EngineKind::Mssql | EngineKind::Sqlite => None,
        }
    }

    pub fn default_port(self) -> u16 {
        match self {
            EngineKind::Postgres => 5432,
            EngineKind::Mysql | EngineKind::Mariadb => 3306,
            EngineKind::Oracle => 1521,
            EngineKind::Mssql => 1433,
            // Not a network engine
            EngineKind::Sqlite => 0,
        }
    }
}

impl FromStr for EngineKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(EngineKind::Postgres),
            "mysql" => Ok(EngineKind::Mysql),
            "mariadb" => Ok(EngineKind::Mariadb),
            "oracle" => Ok(EngineKind::Oracle),
            "mssql" | "sqlserver" => Ok(EngineKind::Mssql),
            "sqlite" => Ok(EngineKind::Sqlite),
            _ => Err(Error::config(format!(
                "unsupported database engine `{s}` \
                 (supported: postgres, mysql, mariadb, oracle, mssql, sqlite)"
            ))),
        }
    }
}

impl TryFrom<String> for EngineKind {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EngineKind> for String {
    fn from(engine: EngineKind) -> String {
        engine.name().to_string()
    }
}

impl core::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(self.name())
    }
}
