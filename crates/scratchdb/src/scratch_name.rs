use scratchdb_core::{Error, Result};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

/// Name of a session's scratch database.
///
/// Generated names have the form `test_{unix_millis}_{process_id}_{counter}`.
/// The fixed `test_` tag keeps them apart from persistent databases; the
/// timestamp, process id and per-process counter keep concurrent test runs
/// apart. Uniqueness is best effort, not guaranteed.
///
/// Names only contain lowercase ASCII letters, digits and `_`, so they can be
/// used unquoted in `CREATE DATABASE` on every engine.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScratchName(String);

/// Prefix of every generated name.
pub const TAG: &str = "test_";

/// Longest identifier accepted by PostgreSQL, the strictest built-in engine.
const MAX_LEN: usize = 63;

// Distinguishes names generated in the same millisecond by one process
static COUNTER: AtomicU32 = AtomicU32::new(0);

impl ScratchName {
    /// Generates a fresh name.
    pub fn generate() -> Self {
        let millis = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();

        Self(format!(
            "{TAG}{millis}_{}_{}",
            std::process::id(),
            COUNTER.fetch_add(1, Ordering::Relaxed)
        ))
    }

    /// Uses a caller-chosen name, for instance to clean up after a run whose
    /// teardown failed.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();

        let valid_start = name
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_lowercase() || c == '_');
        let valid_chars = name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

        if !valid_start || !valid_chars || name.len() > MAX_LEN {
            return Err(Error::config(format!(
                "invalid scratch database name `{name}`; expected at most {MAX_LEN} lowercase \
                 letters, digits or `_`, not starting with a digit"
            )));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ScratchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for ScratchName {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
