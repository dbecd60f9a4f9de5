use super::Error;

/// The setup step a backend was in when provisioning failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvisionPhase {
    /// Opening the administrative connection to the system database.
    AdminConnect,

    /// Issuing `CREATE DATABASE` for the scratch database.
    Create,

    /// Closing the administrative connection after the create.
    AdminClose,

    /// Opening the scratch connection and running migrations.
    Migrate,

    /// Building the caller's storage service.
    Service,
}

impl core::fmt::Display for ProvisionPhase {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str(match self {
            ProvisionPhase::AdminConnect => "connecting to the system database",
            ProvisionPhase::Create => "creating the scratch database",
            ProvisionPhase::AdminClose => "closing the system database connection",
            ProvisionPhase::Migrate => "migrating the scratch database",
            ProvisionPhase::Service => "building the storage service",
        })
    }
}

/// Error when setting up a backend fails. The failure that triggered it is
/// the error's cause.
#[derive(Debug)]
pub(super) struct ProvisionError {
    index: usize,
    phase: ProvisionPhase,
}

impl std::error::Error for ProvisionError {}

impl core::fmt::Display for ProvisionError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "provisioning backend #{} failed while {}",
            self.index, self.phase
        )
    }
}

impl Error {
    /// Creates a provisioning error for the backend at `index`.
    ///
    /// Use it as context for the underlying failure:
    /// `err.context(Error::provision(index, phase))`.
    pub fn provision(index: usize, phase: ProvisionPhase) -> Error {
        Error::from(super::ErrorKind::Provision(ProvisionError { index, phase }))
    }

    /// Returns `true` if this error is a provisioning error.
    pub fn is_provision(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Provision(_))
    }

    /// The setup step that failed, if this is a provisioning error.
    pub fn provision_phase(&self) -> Option<ProvisionPhase> {
        match self.kind() {
            super::ErrorKind::Provision(err) => Some(err.phase),
            _ => None,
        }
    }

    /// Position of the failed backend in configuration order, if this is a
    /// provisioning error.
    pub fn provision_index(&self) -> Option<usize> {
        match self.kind() {
            super::ErrorKind::Provision(err) => Some(err.index),
            _ => None,
        }
    }
}
