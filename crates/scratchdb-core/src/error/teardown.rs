use super::Error;

/// The teardown step an instance was in when it failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeardownPhase {
    /// Closing the scratch connection.
    ScratchClose,

    /// Re-opening the administrative connection to the system database.
    AdminConnect,

    /// Issuing `DROP DATABASE` for the scratch database.
    Drop,

    /// Closing the administrative connection after the drop.
    AdminClose,
}

impl core::fmt::Display for TeardownPhase {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(match self {
            TeardownPhase::ScratchClose => "closing the scratch connection",
            TeardownPhase::AdminConnect => "connecting to the system database",
            TeardownPhase::Drop => "dropping the scratch database",
            TeardownPhase::AdminClose => "closing the system database connection",
        })
    }
}

/// One failed teardown step.
#[derive(Debug, Clone)]
pub struct TeardownFailure {
    index: usize,
    phase: TeardownPhase,
    error: Error,
}

impl TeardownFailure {
    pub fn new(index: usize, phase: TeardownPhase, error: Error) -> Self {
        Self {
            index,
            phase,
            error,
        }
    }

    /// Position of the instance in configuration order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn phase(&self) -> TeardownPhase {
        self.phase
    }

    pub fn error(&self) -> &Error {
        &self.error
    }
}

impl core::fmt::Display for TeardownFailure {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "#{} {}: {}", self.index, self.phase, self.error)
    }
}

/// Error collecting every teardown step that failed across all instances.
#[derive(Debug)]
pub(super) struct TeardownError {
    failures: Vec<TeardownFailure>,
}

impl std::error::Error for TeardownError {}

impl core::fmt::Display for TeardownError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "teardown failed ({} step(s))", self.failures.len())?;
        for (i, failure) in self.failures.iter().enumerate() {
            f.write_str(if i == 0 { ": " } else { "; " })?;
            core::fmt::Display::fmt(failure, f)?;
        }
        Ok(())
    }
}

impl Error {
    /// Creates a teardown error from the failures collected across instances.
    pub fn teardown(failures: Vec<TeardownFailure>) -> Error {
        Error::from(super::ErrorKind::Teardown(TeardownError { failures }))
    }

    /// Returns `true` if this error is a teardown error.
    pub fn is_teardown(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Teardown(_))
    }

    /// The failed teardown steps, in the order they were attempted. Empty for
    /// any other kind of error.
    pub fn teardown_failures(&self) -> &[TeardownFailure] {
        match self.kind() {
            super::ErrorKind::Teardown(err) => &err.failures,
            _ => &[],
        }
    }
}
