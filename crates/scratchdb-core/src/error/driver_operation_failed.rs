use super::Error;

/// A database server or client library refused a provisioning step.
///
/// Covers connecting to the system or scratch database, `CREATE DATABASE`,
/// `DROP DATABASE`, migration statements and closing a connection.
#[derive(Debug)]
pub(super) struct DriverOperationFailed {
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl std::error::Error for DriverOperationFailed {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.source.as_ref())
    }
}

impl core::fmt::Display for DriverOperationFailed {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        // Client libraries often repeat their cause in their own message
        // (`db error: ERROR: ...`); print each cause once.
        let mut rendered = self.source.to_string();
        let mut cause = self.source.source();
        while let Some(err) = cause {
            let message = err.to_string();
            if !message.is_empty() && !rendered.contains(&message) {
                rendered.push_str(": ");
                rendered.push_str(&message);
            }
            cause = err.source();
        }
        write!(f, "database driver error: {rendered}")
    }
}

impl Error {
    /// Wraps an error returned by a database client library.
    pub fn driver_operation_failed(err: impl std::error::Error + Send + Sync + 'static) -> Error {
        Error::from(super::ErrorKind::DriverOperationFailed(
            DriverOperationFailed {
                source: Box::new(err),
            },
        ))
    }

    /// Returns `true` if a database client library reported this error.
    pub fn is_driver_operation_failed(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::DriverOperationFailed(_))
    }
}
